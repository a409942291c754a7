//! Logical query plan operators.
//!
//! Each operator is a struct implementing [`PlanNode`]; [`LogicalPlan`] is the
//! closed set of operators a logical tree can hold.

use std::io::Write;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use planwire_common::error::Result;

use crate::expression::{Attribute, Expression, NamedExpression};
use crate::plan_registry::PlanNode;
use crate::source::Source;
use crate::stream::{PlanStreamInput, PlanStreamOutput};

/// How the documents of an index are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum IndexMode {
    Standard = 0,
    TimeSeries = 1,
    Lookup = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OrderDirection {
    Asc = 0,
    Desc = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum NullsPosition {
    First = 0,
    Last = 1,
}

/// One sort key. Written inline by the operators that sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Order {
    pub source: Source,
    pub child: Expression,
    pub direction: OrderDirection,
    pub nulls: NullsPosition,
}

impl Order {
    pub fn new(source: Source, child: Expression, direction: OrderDirection) -> Self {
        let nulls = match direction {
            OrderDirection::Asc => NullsPosition::Last,
            OrderDirection::Desc => NullsPosition::First,
        };
        Self {
            source,
            child,
            direction,
            nulls,
        }
    }

    pub(crate) fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_named_writeable(&self.child)?;
        out.write_enum(self.direction)?;
        out.write_enum(self.nulls)
    }

    pub(crate) fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            child: input.read_named_writeable()?,
            direction: input.read_enum("order direction")?,
            nulls: input.read_enum("nulls position")?,
        })
    }
}

fn read_child(input: &mut PlanStreamInput<'_>) -> Result<Box<LogicalPlan>> {
    input.read_logical_plan_node().map(Box::new)
}

/// A scan over the indices matching a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EsRelation {
    pub source: Source,
    pub index_pattern: String,
    pub index_mode: IndexMode,
    pub attributes: Vec<Attribute>,
    pub frozen: bool,
}

impl EsRelation {
    pub fn new<S: Into<String>>(source: Source, index_pattern: S, attributes: Vec<Attribute>) -> Self {
        Self {
            source,
            index_pattern: index_pattern.into(),
            index_mode: IndexMode::Standard,
            attributes,
            frozen: false,
        }
    }
}

impl PlanNode for EsRelation {
    const NAME: &'static str = "EsRelation";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_string(&self.index_pattern)?;
        out.write_enum(self.index_mode)?;
        out.write_named_writeable_collection(&self.attributes)?;
        out.write_bool(self.frozen)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            index_pattern: input.read_string()?,
            index_mode: input.read_enum("index mode")?,
            attributes: input.read_named_writeable_collection()?,
            frozen: input.read_bool()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    pub source: Source,
    pub child: Box<LogicalPlan>,
    pub condition: Expression,
}

impl Filter {
    pub fn new(source: Source, child: LogicalPlan, condition: Expression) -> Self {
        Self {
            source,
            child: Box::new(child),
            condition,
        }
    }
}

impl PlanNode for Filter {
    const NAME: &'static str = "Filter";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_logical_plan_node(&self.child)?;
        out.write_named_writeable(&self.condition)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            child: read_child(input)?,
            condition: input.read_named_writeable()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Project {
    pub source: Source,
    pub child: Box<LogicalPlan>,
    pub projections: Vec<NamedExpression>,
}

impl Project {
    pub fn new(source: Source, child: LogicalPlan, projections: Vec<NamedExpression>) -> Self {
        Self {
            source,
            child: Box::new(child),
            projections,
        }
    }
}

impl PlanNode for Project {
    const NAME: &'static str = "Project";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_logical_plan_node(&self.child)?;
        out.write_named_writeable_collection(&self.projections)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            child: read_child(input)?,
            projections: input.read_named_writeable_collection()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Aggregate {
    pub source: Source,
    pub child: Box<LogicalPlan>,
    pub groupings: Vec<Expression>,
    pub aggregates: Vec<NamedExpression>,
}

impl Aggregate {
    pub fn new(
        source: Source,
        child: LogicalPlan,
        groupings: Vec<Expression>,
        aggregates: Vec<NamedExpression>,
    ) -> Self {
        Self {
            source,
            child: Box::new(child),
            groupings,
            aggregates,
        }
    }
}

impl PlanNode for Aggregate {
    const NAME: &'static str = "Aggregate";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_logical_plan_node(&self.child)?;
        out.write_named_writeable_collection(&self.groupings)?;
        out.write_named_writeable_collection(&self.aggregates)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            child: read_child(input)?,
            groupings: input.read_named_writeable_collection()?,
            aggregates: input.read_named_writeable_collection()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Limit {
    pub source: Source,
    pub limit: Expression,
    pub child: Box<LogicalPlan>,
}

impl Limit {
    pub fn new(source: Source, limit: Expression, child: LogicalPlan) -> Self {
        Self {
            source,
            limit,
            child: Box::new(child),
        }
    }
}

impl PlanNode for Limit {
    const NAME: &'static str = "Limit";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_named_writeable(&self.limit)?;
        out.write_logical_plan_node(&self.child)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            limit: input.read_named_writeable()?,
            child: read_child(input)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderBy {
    pub source: Source,
    pub child: Box<LogicalPlan>,
    pub order: Vec<Order>,
}

impl OrderBy {
    pub fn new(source: Source, child: LogicalPlan, order: Vec<Order>) -> Self {
        Self {
            source,
            child: Box::new(child),
            order,
        }
    }
}

impl PlanNode for OrderBy {
    const NAME: &'static str = "OrderBy";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_logical_plan_node(&self.child)?;
        out.write_collection(&self.order, |out, order| order.write_to(out))
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            child: read_child(input)?,
            order: input.read_collection(Order::read_from)?,
        })
    }
}

macro_rules! logical_plan {
    ($($variant:ident),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum LogicalPlan {
            $($variant($variant),)*
        }

        impl LogicalPlan {
            /// The name this operator is registered and written under.
            pub fn node_name(&self) -> &'static str {
                match self {
                    $(LogicalPlan::$variant(_) => <$variant as PlanNode>::NAME,)*
                }
            }

            /// Write the operator payload; the name is written by the stream.
            pub(crate) fn write_node<W: Write>(
                &self,
                out: &mut PlanStreamOutput<'_, W>,
            ) -> Result<()> {
                match self {
                    $(LogicalPlan::$variant(node) => node.write_to(out),)*
                }
            }

            pub fn source(&self) -> &Source {
                match self {
                    $(LogicalPlan::$variant(node) => &node.source,)*
                }
            }
        }

        $(
            impl From<$variant> for LogicalPlan {
                fn from(value: $variant) -> Self {
                    LogicalPlan::$variant(value)
                }
            }
        )*
    };
}

logical_plan!(EsRelation, Filter, Project, Aggregate, Limit, OrderBy);

impl LogicalPlan {
    pub fn children(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::EsRelation(_) => Vec::new(),
            LogicalPlan::Filter(node) => vec![node.child.as_ref()],
            LogicalPlan::Project(node) => vec![node.child.as_ref()],
            LogicalPlan::Aggregate(node) => vec![node.child.as_ref()],
            LogicalPlan::Limit(node) => vec![node.child.as_ref()],
            LogicalPlan::OrderBy(node) => vec![node.child.as_ref()],
        }
    }
}
