//! Literal values carried by expressions and query builders.

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::io::Write;

use planwire_common::error::Result;

use crate::registry::NodeBody;
use crate::source::Source;
use crate::stream::{PlanStreamInput, PlanStreamOutput};
use crate::types::DataType;

/// A constant value. Doubles compare and hash by their bit pattern so that a
/// value always equals its own decoded copy.
///
/// Written with the derived bincode encoding and read back by
/// [`PlanStreamInput::read_literal_value`], which bounds list nesting.
#[derive(Debug, Clone, bincode::Encode)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    Keyword(String),
    /// Epoch milliseconds.
    Datetime(i64),
    List(Vec<LiteralValue>),
}

impl LiteralValue {
    /// The type a literal of this value gets when none is given.
    pub fn data_type(&self) -> DataType {
        match self {
            LiteralValue::Null => DataType::Null,
            LiteralValue::Boolean(_) => DataType::Boolean,
            LiteralValue::Integer(_) => DataType::Integer,
            LiteralValue::Long(_) => DataType::Long,
            LiteralValue::Double(_) => DataType::Double,
            LiteralValue::Keyword(_) => DataType::Keyword,
            LiteralValue::Datetime(_) => DataType::Datetime,
            LiteralValue::List(values) => values
                .first()
                .map(LiteralValue::data_type)
                .unwrap_or(DataType::Null),
        }
    }
}

impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LiteralValue::Null, LiteralValue::Null) => true,
            (LiteralValue::Boolean(a), LiteralValue::Boolean(b)) => a == b,
            (LiteralValue::Integer(a), LiteralValue::Integer(b)) => a == b,
            (LiteralValue::Long(a), LiteralValue::Long(b)) => a == b,
            (LiteralValue::Double(a), LiteralValue::Double(b)) => a.to_bits() == b.to_bits(),
            (LiteralValue::Keyword(a), LiteralValue::Keyword(b)) => a == b,
            (LiteralValue::Datetime(a), LiteralValue::Datetime(b)) => a == b,
            (LiteralValue::List(a), LiteralValue::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for LiteralValue {}

impl Hash for LiteralValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            LiteralValue::Null => {}
            LiteralValue::Boolean(v) => v.hash(state),
            LiteralValue::Integer(v) => v.hash(state),
            LiteralValue::Long(v) | LiteralValue::Datetime(v) => v.hash(state),
            LiteralValue::Double(v) => v.to_bits().hash(state),
            LiteralValue::Keyword(v) => v.hash(state),
            LiteralValue::List(values) => values.hash(state),
        }
    }
}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => f.write_str("null"),
            LiteralValue::Boolean(v) => write!(f, "{}", v),
            LiteralValue::Integer(v) => write!(f, "{}", v),
            LiteralValue::Long(v) | LiteralValue::Datetime(v) => write!(f, "{}", v),
            LiteralValue::Double(v) => write!(f, "{}", v),
            LiteralValue::Keyword(v) => write!(f, "\"{}\"", v),
            LiteralValue::List(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::Keyword(value.to_string())
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        LiteralValue::Integer(value)
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        LiteralValue::Long(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        LiteralValue::Double(value)
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Boolean(value)
    }
}

/// A literal expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub source: Source,
    pub value: LiteralValue,
    pub data_type: DataType,
}

impl Literal {
    pub fn new(source: Source, value: LiteralValue, data_type: DataType) -> Self {
        Self {
            source,
            value,
            data_type,
        }
    }

    /// A literal typed after its value.
    pub fn of<V: Into<LiteralValue>>(source: Source, value: V) -> Self {
        let value = value.into();
        let data_type = value.data_type();
        Self::new(source, value, data_type)
    }

    pub(crate) fn write_body<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_literal_value(&self.value)?;
        out.write_enum(self.data_type)
    }
}

impl NodeBody for Literal {
    fn read_body(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            value: input.read_literal_value()?,
            data_type: input.read_enum("data type")?,
        })
    }
}
