//! Boolean predicates: comparisons, conjunctions and null checks.

use std::io::Write;

use planwire_common::error::Result;

use super::Expression;
use crate::source::Source;
use crate::stream::{PlanStreamInput, PlanStreamOutput};

/// The operator is implied by the registered name, so it is never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 6] = [
        ComparisonOperator::Equals,
        ComparisonOperator::NotEquals,
        ComparisonOperator::GreaterThan,
        ComparisonOperator::GreaterThanOrEqual,
        ComparisonOperator::LessThan,
        ComparisonOperator::LessThanOrEqual,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "Equals",
            ComparisonOperator::NotEquals => "NotEquals",
            ComparisonOperator::GreaterThan => "GreaterThan",
            ComparisonOperator::GreaterThanOrEqual => "GreaterThanOrEqual",
            ComparisonOperator::LessThan => "LessThan",
            ComparisonOperator::LessThanOrEqual => "LessThanOrEqual",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "==",
            ComparisonOperator::NotEquals => "!=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryComparison {
    pub source: Source,
    pub op: ComparisonOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    /// Zone used when either side is a datetime.
    pub zone_id: Option<String>,
}

impl BinaryComparison {
    pub fn new(source: Source, op: ComparisonOperator, left: Expression, right: Expression) -> Self {
        Self {
            source,
            op,
            left: Box::new(left),
            right: Box::new(right),
            zone_id: None,
        }
    }

    pub(crate) fn write_body<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_named_writeable(self.left.as_ref())?;
        out.write_named_writeable(self.right.as_ref())?;
        out.write_optional_string(self.zone_id.as_deref())
    }

    pub(crate) fn read_body(input: &mut PlanStreamInput<'_>, op: ComparisonOperator) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            op,
            left: Box::new(input.read_named_writeable()?),
            right: Box::new(input.read_named_writeable()?),
            zone_id: input.read_optional_string()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOperator {
    And,
    Or,
}

impl LogicOperator {
    pub fn name(&self) -> &'static str {
        match self {
            LogicOperator::And => "And",
            LogicOperator::Or => "Or",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryLogic {
    pub source: Source,
    pub op: LogicOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl BinaryLogic {
    pub fn new(source: Source, op: LogicOperator, left: Expression, right: Expression) -> Self {
        Self {
            source,
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub(crate) fn write_body<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_named_writeable(self.left.as_ref())?;
        out.write_named_writeable(self.right.as_ref())
    }

    pub(crate) fn read_body(input: &mut PlanStreamInput<'_>, op: LogicOperator) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            op,
            left: Box::new(input.read_named_writeable()?),
            right: Box::new(input.read_named_writeable()?),
        })
    }
}

macro_rules! unary_predicate {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash)]
            pub struct $name {
                pub source: Source,
                pub field: Box<Expression>,
            }

            impl $name {
                pub fn new(source: Source, field: Expression) -> Self {
                    Self {
                        source,
                        field: Box::new(field),
                    }
                }

                pub(crate) fn write_body<W: Write>(
                    &self,
                    out: &mut PlanStreamOutput<'_, W>,
                ) -> Result<()> {
                    out.write_source(&self.source)?;
                    out.write_named_writeable(self.field.as_ref())
                }
            }

            impl crate::registry::NodeBody for $name {
                fn read_body(input: &mut PlanStreamInput<'_>) -> Result<Self> {
                    Ok(Self {
                        source: input.read_source()?,
                        field: Box::new(input.read_named_writeable()?),
                    })
                }
            }
        )*
    };
}

unary_predicate!(
    /// Boolean negation.
    Not,
    IsNull,
    IsNotNull,
);
