//! Location of a node in the query text it was parsed from.

use std::fmt::{self, Display};
use std::io::Write;

use planwire_common::error::context::ErrorContext;
use planwire_common::error::{CommonError, Result};
use planwire_common::version::TransportVersion;

use crate::stream::{PlanStreamInput, PlanStreamOutput};

/// 1-based line and column of a node plus the text it covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Source {
    line: u32,
    column: u32,
    text: String,
}

impl Source {
    pub const EMPTY: Source = Source {
        line: 0,
        column: 0,
        text: String::new(),
    };

    pub fn new<S: Into<String>>(line: u32, column: u32, text: S) -> Self {
        Self {
            line,
            column,
            text: text.into(),
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.line == 0 && self.column == 0 && self.text.is_empty()
    }

    /// Before [`TransportVersion::SOURCE_OFFSETS`] the text always travels
    /// inline. From then on it is left out when the configured query holds
    /// the same text at the same position.
    pub fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_vu32(self.line)?;
        out.write_vu32(self.column)?;
        if !out
            .transport_version()
            .supports(TransportVersion::SOURCE_OFFSETS)
        {
            return out.write_string(&self.text);
        }
        let length = u32::try_from(self.text.len()).with_encoding_context(|| {
            format!("source text of {} bytes is too long", self.text.len())
        })?;
        out.write_vu32(length)?;
        let in_query = byte_offset(out.configuration().query(), self.line, self.column)
            .and_then(|start| out.configuration().query().get(start..start + self.text.len()))
            .is_some_and(|covered| covered == self.text);
        out.write_bool(!in_query)?;
        if !in_query {
            out.write_bytes(self.text.as_bytes())?;
        }
        Ok(())
    }

    pub fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        let line = input.read_vu32()?;
        let column = input.read_vu32()?;
        if !input
            .transport_version()
            .supports(TransportVersion::SOURCE_OFFSETS)
        {
            let text = input.read_string()?;
            return Ok(Self { line, column, text });
        }
        let length = input.read_vu32()? as usize;
        let inline = input.read_bool()?;
        let text = if inline {
            let offset = input.position();
            let bytes = input.read_bytes(length)?.to_vec();
            String::from_utf8(bytes).with_decoding_context(|| {
                format!("invalid UTF-8 source text at offset {}", offset)
            })?
        } else {
            let query = input.configuration().query();
            byte_offset(query, line, column)
                .and_then(|start| query.get(start..start + length))
                .ok_or_else(|| {
                    CommonError::decoding_error(format!(
                        "source {}:{} with length {} is outside the configured query",
                        line, column, length
                    ))
                })?
                .to_string()
        };
        Ok(Self { line, column, text })
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}:{}: {}", self.line, self.column, self.text)
    }
}

/// Byte offset of a 1-based (line, column) position, columns counted in chars.
fn byte_offset(query: &str, line: u32, column: u32) -> Option<usize> {
    if line == 0 || column == 0 {
        return None;
    }
    let mut line_start = 0;
    for _ in 1..line {
        line_start += query[line_start..].find('\n')? + 1;
    }
    let line_text = &query[line_start..];
    let target = (column - 1) as usize;
    line_text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(line_text.len()))
        .nth(target)
        .map(|i| line_start + i)
}
