//! Expression trees.
//!
//! [`Expression`] is the open `Expression` category; [`NamedExpression`] and
//! [`Attribute`] are the narrower categories that plan nodes use for their
//! output columns. An attribute is written the same way in all three, so a
//! reader registered under any of them rebuilds an equal value.

pub mod attribute;
pub mod function;
mod named;
mod predicate;

use std::io::Write;

use planwire_common::error::Result;

pub use attribute::{
    Attribute, EsField, FieldAttribute, MetadataAttribute, ReferenceAttribute,
    UnsupportedAttribute,
};
pub use function::{AggregateFunction, ScalarFunction};
pub use named::{Alias, NamedExpression};
pub use predicate::{
    BinaryComparison, BinaryLogic, ComparisonOperator, IsNotNull, IsNull, LogicOperator, Not,
};

use crate::literal::Literal;
use crate::registry::{NamedWriteable, category_factory};
use crate::source::Source;
use crate::stream::PlanStreamOutput;

/// Identity of a named value, shared by an alias and the attributes that
/// reference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Attribute(Attribute),
    Alias(Alias),
    Literal(Literal),
    Comparison(BinaryComparison),
    Logic(BinaryLogic),
    Not(Not),
    IsNull(IsNull),
    IsNotNull(IsNotNull),
    Scalar(ScalarFunction),
    Aggregate(AggregateFunction),
}

impl Expression {
    pub fn source(&self) -> &Source {
        match self {
            Expression::Attribute(a) => a.source(),
            Expression::Alias(a) => &a.source,
            Expression::Literal(l) => &l.source,
            Expression::Comparison(c) => &c.source,
            Expression::Logic(l) => &l.source,
            Expression::Not(n) => &n.source,
            Expression::IsNull(n) => &n.source,
            Expression::IsNotNull(n) => &n.source,
            Expression::Scalar(f) => f.source(),
            Expression::Aggregate(f) => f.source(),
        }
    }

    /// Direct children in declaration order.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Attribute(_) | Expression::Literal(_) => Vec::new(),
            Expression::Alias(a) => vec![a.child.as_ref()],
            Expression::Comparison(c) => vec![c.left.as_ref(), c.right.as_ref()],
            Expression::Logic(l) => vec![l.left.as_ref(), l.right.as_ref()],
            Expression::Not(n) => vec![n.field.as_ref()],
            Expression::IsNull(n) => vec![n.field.as_ref()],
            Expression::IsNotNull(n) => vec![n.field.as_ref()],
            Expression::Scalar(f) => f.children(),
            Expression::Aggregate(f) => f.children(),
        }
    }
}

impl NamedWriteable for Expression {
    category_factory!(Expression);

    fn writeable_name(&self) -> &'static str {
        match self {
            Expression::Attribute(a) => a.writeable_name(),
            Expression::Alias(_) => Alias::NAME,
            Expression::Literal(_) => "Literal",
            Expression::Comparison(c) => c.op.name(),
            Expression::Logic(l) => l.op.name(),
            Expression::Not(_) => "Not",
            Expression::IsNull(_) => "IsNull",
            Expression::IsNotNull(_) => "IsNotNull",
            Expression::Scalar(f) => f.writeable_name(),
            Expression::Aggregate(f) => f.writeable_name(),
        }
    }

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        match self {
            Expression::Attribute(a) => a.write_to(out),
            Expression::Alias(a) => a.write_body(out),
            Expression::Literal(l) => l.write_body(out),
            Expression::Comparison(c) => c.write_body(out),
            Expression::Logic(l) => l.write_body(out),
            Expression::Not(n) => n.write_body(out),
            Expression::IsNull(n) => n.write_body(out),
            Expression::IsNotNull(n) => n.write_body(out),
            Expression::Scalar(f) => f.write_to(out),
            Expression::Aggregate(f) => f.write_to(out),
        }
    }
}

macro_rules! into_expression {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Expression {
                fn from(value: $ty) -> Self {
                    Expression::$variant(value)
                }
            }
        )*
    };
}

into_expression! {
    Attribute => Attribute,
    Alias => Alias,
    Literal => Literal,
    BinaryComparison => Comparison,
    BinaryLogic => Logic,
    Not => Not,
    IsNull => IsNull,
    IsNotNull => IsNotNull,
    ScalarFunction => Scalar,
    AggregateFunction => Aggregate,
}

macro_rules! attribute_into {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expression {
                fn from(value: $ty) -> Self {
                    Expression::Attribute(value.into())
                }
            }

            impl From<$ty> for NamedExpression {
                fn from(value: $ty) -> Self {
                    NamedExpression::Attribute(value.into())
                }
            }
        )*
    };
}

attribute_into!(
    FieldAttribute,
    ReferenceAttribute,
    MetadataAttribute,
    UnsupportedAttribute
);

impl From<NamedExpression> for Expression {
    fn from(value: NamedExpression) -> Self {
        match value {
            NamedExpression::Attribute(a) => Expression::Attribute(a),
            NamedExpression::Alias(a) => Expression::Alias(a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn field(name: &str, id: u64) -> Expression {
        FieldAttribute::new(
            Source::EMPTY,
            name,
            EsField::new(name, DataType::Keyword, true),
            NameId(id),
        )
        .into()
    }

    #[test]
    fn test_names_follow_variant() {
        let status = field("status", 1);
        assert_eq!(status.writeable_name(), "FieldAttribute");

        let eq = BinaryComparison::new(
            Source::EMPTY,
            ComparisonOperator::Equals,
            status.clone(),
            Literal::of(Source::EMPTY, "active").into(),
        );
        let expr: Expression = eq.into();
        assert_eq!(expr.writeable_name(), "Equals");
        assert_eq!(expr.children().len(), 2);
        assert_eq!(expr.children()[0], &status);
    }

    #[test]
    fn test_named_expression_widens_to_expression() {
        let alias = Alias::new(Source::EMPTY, "s", field("status", 1), NameId(2));
        let named: NamedExpression = alias.clone().into();
        assert_eq!(Expression::from(named), Expression::Alias(alias));
    }
}
