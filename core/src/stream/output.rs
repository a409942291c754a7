use std::io::Write;

use planwire_common::config::SessionConfiguration;
use planwire_common::error::{CommonError, Result};
use planwire_common::version::TransportVersion;
use tracing::trace;

use super::{LOGICAL_PLAN, PHYSICAL_PLAN, wire_config};
use crate::literal::LiteralValue;
use crate::logical_plan::LogicalPlan;
use crate::physical_plan::PhysicalPlan;
use crate::plan_registry::PlanNameRegistry;
use crate::registry::{NamedWriteable, NamedWriteableRegistry};
use crate::source::Source;

/// Writer half of a plan stream.
///
/// Owns its sink for its whole lifetime and only ever appends to it. On any
/// error the bytes written so far are meaningless and must be discarded.
pub struct PlanStreamOutput<'a, W: Write = Vec<u8>> {
    sink: W,
    bytes_written: u64,
    depth: usize,
    registry: &'a NamedWriteableRegistry,
    plan_registry: &'a PlanNameRegistry,
    configuration: &'a SessionConfiguration,
}

impl<'a> PlanStreamOutput<'a, Vec<u8>> {
    /// Create a writer over a fresh in-memory buffer.
    pub fn new(
        registry: &'a NamedWriteableRegistry,
        plan_registry: &'a PlanNameRegistry,
        configuration: &'a SessionConfiguration,
    ) -> Self {
        Self::with_sink(Vec::new(), registry, plan_registry, configuration)
    }

    /// The bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.sink
    }
}

impl<'a, W: Write> PlanStreamOutput<'a, W> {
    pub fn with_sink(
        sink: W,
        registry: &'a NamedWriteableRegistry,
        plan_registry: &'a PlanNameRegistry,
        configuration: &'a SessionConfiguration,
    ) -> Self {
        Self {
            sink,
            bytes_written: 0,
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

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush the sink and hand it back.
    pub fn into_inner(mut self) -> Result<W> {
        self.sink
            .flush()
            .map_err(|e| CommonError::encoding_error_with_source("failed to flush sink", e))?;
        Ok(self.sink)
    }

    fn encode<E: bincode::Encode>(&mut self, value: E, what: &str) -> Result<()> {
        let written =
            bincode::encode_into_std_write(value, &mut self.sink, wire_config()).map_err(|e| {
                CommonError::encoding_error_with_source(
                    format!("failed to write {} at offset {}", what, self.bytes_written),
                    e,
                )
            })?;
        self.bytes_written += written as u64;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.write_all(bytes).map_err(|e| {
            CommonError::encoding_error_with_source(
                format!("failed to write raw bytes at offset {}", self.bytes_written),
                e,
            )
        })?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.encode(value, "bool")
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    /// Write a wire enum as its one byte code.
    pub fn write_enum<E: Into<u8>>(&mut self, value: E) -> Result<()> {
        self.write_u8(value.into())
    }

    pub fn write_vu32(&mut self, value: u32) -> Result<()> {
        self.encode(value, "varint")
    }

    pub fn write_vu64(&mut self, value: u64) -> Result<()> {
        self.encode(value, "varint")
    }

    /// Zig-zag varint.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.encode(value, "signed varint")
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.encode(value, "double")
    }

    /// Length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.encode(value, "string")
    }

    pub fn write_optional_string(&mut self, value: Option<&str>) -> Result<()> {
        self.write_optional(value, |out, v| out.write_string(v))
    }

    pub fn write_optional_vu32(&mut self, value: Option<u32>) -> Result<()> {
        self.write_optional(value, |out, v| out.write_vu32(v))
    }

    /// Presence flag followed by the value when present.
    pub fn write_optional<T, F>(&mut self, value: Option<T>, write: F) -> Result<()>
    where
        F: FnOnce(&mut Self, T) -> Result<()>,
    {
        match value {
            Some(v) => {
                self.write_bool(true)?;
                write(self, v)
            }
            None => self.write_bool(false),
        }
    }

    /// Length-prefixed collection written element by element.
    pub fn write_collection<T, F>(&mut self, items: &[T], mut write: F) -> Result<()>
    where
        F: FnMut(&mut Self, &T) -> Result<()>,
    {
        self.write_vu64(items.len() as u64)?;
        for item in items {
            write(self, item)?;
        }
        Ok(())
    }

    pub fn write_string_collection(&mut self, items: &[String]) -> Result<()> {
        self.write_collection(items, |out, s| out.write_string(s))
    }

    pub fn write_source(&mut self, source: &Source) -> Result<()> {
        source.write_to(self)
    }

    pub fn write_literal_value(&mut self, value: &LiteralValue) -> Result<()> {
        self.encode(value, "literal value")
    }

    pub fn write_optional_literal_value(&mut self, value: Option<&LiteralValue>) -> Result<()> {
        self.write_optional(value, |out, v| out.write_literal_value(v))
    }

    /// Version marker for top-level nodes, name, optional version-gated
    /// header, then the payload.
    fn write_node_frame<F>(&mut self, name: &str, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let version = self.transport_version();
        if self.depth == 0 {
            self.write_vu32(version.id())?;
        }
        self.write_string(name)?;
        if version.supports(TransportVersion::NODE_HEADER) {
            self.write_u8(version.header_byte())?;
        }
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }

    /// Write a value of an open category: its registered name, then its body.
    pub fn write_named_writeable<T: NamedWriteable>(&mut self, value: &T) -> Result<()> {
        let name = self.registry.name_for(value)?;
        trace!(
            category = %T::CATEGORY,
            node = name,
            offset = self.bytes_written,
            "writing named writeable"
        );
        self.write_node_frame(name, |out| value.write_to(out))
    }

    pub fn write_optional_named_writeable<T: NamedWriteable>(
        &mut self,
        value: Option<&T>,
    ) -> Result<()> {
        self.write_optional(value, |out, v| out.write_named_writeable(v))
    }

    pub fn write_named_writeable_collection<T: NamedWriteable>(
        &mut self,
        items: &[T],
    ) -> Result<()> {
        self.write_collection(items, |out, item| out.write_named_writeable(item))
    }

    pub fn write_logical_plan_node(&mut self, plan: &LogicalPlan) -> Result<()> {
        let name = plan.node_name();
        if !self.plan_registry.contains_logical(name) {
            return Err(CommonError::unregistered_type(LOGICAL_PLAN, name));
        }
        trace!(node = name, offset = self.bytes_written, "writing logical plan node");
        self.write_node_frame(name, |out| plan.write_node(out))
    }

    pub fn write_physical_plan_node(&mut self, plan: &PhysicalPlan) -> Result<()> {
        let name = plan.node_name();
        if !self.plan_registry.contains_physical(name) {
            return Err(CommonError::unregistered_type(PHYSICAL_PLAN, name));
        }
        trace!(node = name, offset = self.bytes_written, "writing physical plan node");
        self.write_node_frame(name, |out| plan.write_node(out))
    }
}
