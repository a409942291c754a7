use planwire_common::config::SessionConfiguration;
use planwire_common::error::context::ErrorContext;
use planwire_common::error::{CommonError, Result};
use planwire_common::version::TransportVersion;
use tracing::{trace, warn};

use super::{LOGICAL_PLAN, PHYSICAL_PLAN, wire_config};
use crate::literal::LiteralValue;
use crate::logical_plan::LogicalPlan;
use crate::physical_plan::PhysicalPlan;
use crate::plan_registry::PlanNameRegistry;
use crate::registry::{NamedWriteable, NamedWriteableRegistry};
use crate::source::Source;

/// Deepest nesting of nodes and literal lists a reader accepts before
/// giving up. Reading at this depth fits in a default 2 MiB thread stack.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Reader half of a plan stream.
///
/// Reads strictly in order: every node consumes exactly the bytes its
/// writer produced and nothing is ever looked ahead or rewound.
pub struct PlanStreamInput<'a> {
    buffer: Vec<u8>,
    position: usize,
    depth: usize,
    registry: &'a NamedWriteableRegistry,
    plan_registry: &'a PlanNameRegistry,
    configuration: &'a SessionConfiguration,
}

impl<'a> PlanStreamInput<'a> {
    pub fn new<B: Into<Vec<u8>>>(
        bytes: B,
        registry: &'a NamedWriteableRegistry,
        plan_registry: &'a PlanNameRegistry,
        configuration: &'a SessionConfiguration,
    ) -> Self {
        Self {
            buffer: bytes.into(),
            position: 0,
            depth: 0,
            registry,
            plan_registry,
            configuration,
        }
    }

    pub fn configuration(&self) -> &'a SessionConfiguration {
        self.configuration
    }

    pub fn transport_version(&self) -> TransportVersion {
        self.configuration.transport_version()
    }

    pub fn registry(&self) -> &'a NamedWriteableRegistry {
        self.registry
    }

    pub fn plan_registry(&self) -> &'a PlanNameRegistry {
        self.plan_registry
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Fail if the input holds bytes no reader consumed.
    pub fn finish(&self) -> Result<()> {
        if !self.is_exhausted() {
            return Err(CommonError::decoding_error(format!(
                "{} trailing bytes after offset {}",
                self.remaining(),
                self.position
            )));
        }
        Ok(())
    }

    fn decode<D: bincode::Decode<()>>(&mut self, what: &str) -> Result<D> {
        let (value, consumed) =
            bincode::decode_from_slice(&self.buffer[self.position..], wire_config()).map_err(
                |e| {
                    CommonError::decoding_error_with_source(
                        format!("failed to read {} at offset {}", what, self.position),
                        e,
                    )
                },
            )?;
        self.position += consumed;
        Ok(value)
    }

    /// Read a length prefix and check it against the bytes actually left.
    fn read_length(&mut self, what: &str) -> Result<usize> {
        let offset = self.position;
        let len = self.read_vu64()?;
        match usize::try_from(len) {
            Ok(len) if len <= self.remaining() => Ok(len),
            _ => Err(CommonError::decoding_error(format!(
                "{} length prefix {} at offset {} exceeds the {} remaining bytes",
                what,
                len,
                offset,
                self.remaining()
            ))),
        }
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        if len > self.remaining() {
            return Err(CommonError::decoding_error(format!(
                "unexpected end of input: wanted {} bytes at offset {}, {} remaining",
                len,
                self.position,
                self.remaining()
            )));
        }
        let start = self.position;
        self.position += len;
        Ok(&self.buffer[start..self.position])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.decode("bool")
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a one byte wire enum code.
    pub fn read_enum<E>(&mut self, what: &str) -> Result<E>
    where
        E: TryFrom<u8>,
        E::Error: std::fmt::Display,
    {
        let offset = self.position;
        let code = self.read_u8()?;
        E::try_from(code).map_err(|e| {
            CommonError::decoding_error(format!(
                "invalid {} code {} at offset {}: {}",
                what, code, offset, e
            ))
        })
    }

    pub fn read_vu32(&mut self) -> Result<u32> {
        self.decode("varint")
    }

    pub fn read_vu64(&mut self) -> Result<u64> {
        self.decode("varint")
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.decode("signed varint")
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.decode("double")
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_length("string")?;
        let offset = self.position;
        let bytes = self.read_bytes(len)?.to_vec();
        String::from_utf8(bytes)
            .with_decoding_context(|| format!("invalid UTF-8 string at offset {}", offset))
    }

    pub fn read_optional_string(&mut self) -> Result<Option<String>> {
        self.read_optional(|input| input.read_string())
    }

    pub fn read_optional_vu32(&mut self) -> Result<Option<u32>> {
        self.read_optional(|input| input.read_vu32())
    }

    pub fn read_optional<T, F>(&mut self, read: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if self.read_bool()? {
            Ok(Some(read(self)?))
        } else {
            Ok(None)
        }
    }

    /// Every element occupies at least one byte, so the length prefix is
    /// bounded by the remaining input before anything is allocated.
    pub fn read_collection<T, F>(&mut self, mut read: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let len = self.read_length("collection")?;
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(read(self)?);
        }
        Ok(items)
    }

    pub fn read_string_collection(&mut self) -> Result<Vec<String>> {
        self.read_collection(|input| input.read_string())
    }

    pub fn read_source(&mut self) -> Result<Source> {
        Source::read_from(self)
    }

    /// Mirrors the derived bincode encoding of [`LiteralValue`]: a varint
    /// variant index followed by the payload. Lists count towards
    /// [`MAX_NESTING_DEPTH`].
    pub fn read_literal_value(&mut self) -> Result<LiteralValue> {
        let offset = self.position;
        let value = match self.read_vu32()? {
            0 => LiteralValue::Null,
            1 => LiteralValue::Boolean(self.read_bool()?),
            2 => LiteralValue::Integer(self.decode("integer")?),
            3 => LiteralValue::Long(self.read_i64()?),
            4 => LiteralValue::Double(self.read_f64()?),
            5 => LiteralValue::Keyword(self.read_string()?),
            6 => LiteralValue::Datetime(self.read_i64()?),
            7 => {
                self.enter()?;
                let values = self.read_collection(|input| input.read_literal_value());
                self.depth -= 1;
                LiteralValue::List(values?)
            }
            tag => {
                return Err(CommonError::decoding_error(format!(
                    "invalid literal value tag {} at offset {}",
                    tag, offset
                )));
            }
        };
        Ok(value)
    }

    pub fn read_optional_literal_value(&mut self) -> Result<Option<LiteralValue>> {
        self.read_optional(|input| input.read_literal_value())
    }

    /// The version-gated byte written after every node name.
    fn read_node_header(&mut self, name: &str) -> Result<()> {
        let version = self.transport_version();
        if !version.supports(TransportVersion::NODE_HEADER) {
            return Ok(());
        }
        let offset = self.position;
        let found = self.read_u8()?;
        if found != version.header_byte() {
            warn!(
                node = name,
                offset,
                expected = version.header_byte(),
                found,
                "plan stream written under a different transport version"
            );
            return Err(CommonError::configuration_mismatch(format!(
                "node [{}] at offset {} carries header {} but this reader speaks {} (header {})",
                name,
                offset,
                found,
                version,
                version.header_byte()
            )));
        }
        Ok(())
    }

    /// Read the name of the next node. A node read at the top of the stream
    /// is preceded by the writer's transport version id.
    fn read_node_name(&mut self) -> Result<(String, usize)> {
        let marker = if self.depth == 0 {
            Some((self.position, self.read_vu32()?))
        } else {
            None
        };
        let offset = self.position;
        let name = self.read_string()?;
        if let Some((marker_offset, found)) = marker {
            let version = self.transport_version();
            if found != version.id() {
                warn!(
                    node = %name,
                    offset = marker_offset,
                    expected = version.id(),
                    found,
                    "plan stream written under a different transport version"
                );
                return Err(CommonError::configuration_mismatch(format!(
                    "node [{}] at offset {} was written under transport version v{} but this reader speaks {}",
                    name, marker_offset, found, version
                )));
            }
        }
        Ok((name, offset))
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(CommonError::decoding_error(format!(
                "nesting exceeds {} levels at offset {}",
                MAX_NESTING_DEPTH, self.position
            )));
        }
        self.depth += 1;
        Ok(())
    }

    /// Read a value of an open category: resolve its reader by name, then
    /// let the reader consume the body.
    pub fn read_named_writeable<T: NamedWriteable>(&mut self) -> Result<T> {
        let (name, offset) = self.read_node_name()?;
        let reader = self.registry.lookup::<T>(&name)?;
        self.read_node_header(&name)?;
        trace!(category = %T::CATEGORY, node = %name, offset, "reading named writeable");
        self.enter()?;
        let value = reader(self);
        self.depth -= 1;
        value
    }

    pub fn read_optional_named_writeable<T: NamedWriteable>(&mut self) -> Result<Option<T>> {
        self.read_optional(|input| input.read_named_writeable())
    }

    pub fn read_named_writeable_collection<T: NamedWriteable>(&mut self) -> Result<Vec<T>> {
        self.read_collection(|input| input.read_named_writeable())
    }

    pub fn read_logical_plan_node(&mut self) -> Result<LogicalPlan> {
        let (name, offset) = self.read_node_name()?;
        let reader = self.plan_registry.lookup_logical(&name)?;
        self.read_node_header(&name)?;
        trace!(node = %name, offset, "reading {} node", LOGICAL_PLAN);
        self.enter()?;
        let plan = reader(self);
        self.depth -= 1;
        plan
    }

    pub fn read_physical_plan_node(&mut self) -> Result<PhysicalPlan> {
        let (name, offset) = self.read_node_name()?;
        let reader = self.plan_registry.lookup_physical(&name)?;
        self.read_node_header(&name)?;
        trace!(node = %name, offset, "reading {} node", PHYSICAL_PLAN);
        self.enter()?;
        let plan = reader(self);
        self.depth -= 1;
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::default_registries;
    use crate::stream::PlanStreamOutput;

    #[test]
    fn test_truncated_string() {
        let (registry, plan_registry) = default_registries().unwrap();
        let config = SessionConfiguration::default();
        let mut input = PlanStreamInput::new(b"\x06stat".to_vec(), &registry, &plan_registry, &config);

        let err = input.read_string().unwrap_err();
        assert!(matches!(err, CommonError::DecodingIo { .. }));
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_oversized_collection_prefix() {
        let (registry, plan_registry) = default_registries().unwrap();
        let config = SessionConfiguration::default();
        // 0xFD marks a u64 varint: claims u64::MAX elements
        let mut bytes = vec![0xFD];
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        let mut input = PlanStreamInput::new(bytes, &registry, &plan_registry, &config);

        let err = input.read_string_collection().unwrap_err();
        assert!(matches!(err, CommonError::DecodingIo { .. }));
    }

    #[test]
    fn test_invalid_utf8() {
        let (registry, plan_registry) = default_registries().unwrap();
        let config = SessionConfiguration::default();
        let mut input = PlanStreamInput::new(vec![2, 0xC3, 0x28], &registry, &plan_registry, &config);

        let err = input.read_string().unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8"));
    }

    #[test]
    fn test_primitives_mirror_writer() {
        let (registry, plan_registry) = default_registries().unwrap();
        let config = SessionConfiguration::default();
        let mut out = PlanStreamOutput::new(&registry, &plan_registry, &config);
        out.write_bool(true).unwrap();
        out.write_vu32(300).unwrap();
        out.write_i64(-42).unwrap();
        out.write_f64(2.5).unwrap();
        out.write_optional_vu32(Some(7)).unwrap();
        out.write_string("données").unwrap();

        let bytes = out.into_inner().unwrap();
        let mut input = PlanStreamInput::new(bytes, &registry, &plan_registry, &config);
        assert!(input.read_bool().unwrap());
        assert_eq!(input.read_vu32().unwrap(), 300);
        assert_eq!(input.read_i64().unwrap(), -42);
        assert_eq!(input.read_f64().unwrap(), 2.5);
        assert_eq!(input.read_optional_vu32().unwrap(), Some(7));
        assert_eq!(input.read_string().unwrap(), "données");
        assert!(input.is_exhausted());
        input.finish().unwrap();
    }

    #[test]
    fn test_finish_reports_trailing_bytes() {
        let (registry, plan_registry) = default_registries().unwrap();
        let config = SessionConfiguration::default();
        let mut input = PlanStreamInput::new(vec![1, 0, 0], &registry, &plan_registry, &config);
        assert!(input.read_bool().unwrap());

        let err = input.finish().unwrap_err();
        assert!(err.to_string().contains("2 trailing bytes"));
    }

    #[test]
    fn test_invalid_bool() {
        let (registry, plan_registry) = default_registries().unwrap();
        let config = SessionConfiguration::default();
        let mut input = PlanStreamInput::new(vec![7], &registry, &plan_registry, &config);
        assert!(matches!(
            input.read_bool().unwrap_err(),
            CommonError::DecodingIo { .. }
        ));
    }

    #[test]
    fn test_literal_values_mirror_writer() {
        let (registry, plan_registry) = default_registries().unwrap();
        let config = SessionConfiguration::default();
        let values = vec![
            LiteralValue::Null,
            LiteralValue::Boolean(true),
            LiteralValue::Integer(-7),
            LiteralValue::Long(1 << 40),
            LiteralValue::Double(f64::NAN),
            LiteralValue::Keyword("données".to_string()),
            LiteralValue::Datetime(1_700_000_000_000),
            LiteralValue::List(vec![
                LiteralValue::List(vec![LiteralValue::Integer(1)]),
                LiteralValue::Null,
            ]),
        ];
        let mut out = PlanStreamOutput::new(&registry, &plan_registry, &config);
        for value in &values {
            out.write_literal_value(value).unwrap();
        }

        let bytes = out.into_inner().unwrap();
        let mut input = PlanStreamInput::new(bytes, &registry, &plan_registry, &config);
        for value in &values {
            assert_eq!(&input.read_literal_value().unwrap(), value);
        }
        input.finish().unwrap();
    }

    #[test]
    fn test_invalid_literal_tag() {
        let (registry, plan_registry) = default_registries().unwrap();
        let config = SessionConfiguration::default();
        let mut input = PlanStreamInput::new(vec![9], &registry, &plan_registry, &config);

        let err = input.read_literal_value().unwrap_err();
        assert!(matches!(err, CommonError::DecodingIo { .. }));
        assert!(err.to_string().contains("literal value tag 9"));
    }
}
