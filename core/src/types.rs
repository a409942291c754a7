//! Data types of expressions and fields.

use std::fmt::Display;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Field and expression types, written on the wire as one byte.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(u8)]
pub enum DataType {
    Null = 0,
    Boolean = 1,
    Integer = 2,
    Long = 3,
    Double = 4,
    Keyword = 5,
    Text = 6,
    Datetime = 7,
    Unsupported = 8,
}

impl DataType {
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Long => "long",
            DataType::Double => "double",
            DataType::Keyword => "keyword",
            DataType::Text => "text",
            DataType::Datetime => "datetime",
            DataType::Unsupported => "unsupported",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Long | DataType::Double)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, DataType::Keyword | DataType::Text)
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(u8::from(DataType::Keyword), 5);
        assert_eq!(DataType::try_from(7u8).unwrap(), DataType::Datetime);
        assert!(DataType::try_from(200u8).is_err());
    }

    #[test]
    fn test_classification() {
        assert!(DataType::Long.is_numeric());
        assert!(!DataType::Keyword.is_numeric());
        assert!(DataType::Text.is_string());
        assert_eq!(DataType::Datetime.to_string(), "datetime");
    }
}
