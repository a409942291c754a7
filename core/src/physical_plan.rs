//! Physical plan operators, the form a plan takes when shipped to data nodes.

use std::io::Write;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use planwire_common::error::Result;

use crate::expression::{Attribute, Expression, NamedExpression};
use crate::logical_plan::{IndexMode, LogicalPlan, Order};
use crate::plan_registry::PlanNode;
use crate::query::QueryBuilder;
use crate::source::Source;
use crate::stream::{PlanStreamInput, PlanStreamOutput};

/// Which half of a split aggregation an [`AggregateExec`] computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum AggregateMode {
    Initial = 0,
    Intermediate = 1,
    Final = 2,
    Single = 3,
}

fn read_child(input: &mut PlanStreamInput<'_>) -> Result<Box<PhysicalPlan>> {
    input.read_physical_plan_node().map(Box::new)
}

/// A search against the data source, with an optional pushed-down query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EsQueryExec {
    pub source: Source,
    pub index_pattern: String,
    pub index_mode: IndexMode,
    pub attributes: Vec<Attribute>,
    pub query: Option<QueryBuilder>,
    pub limit: Option<Expression>,
    pub estimated_row_size: Option<u32>,
}

impl EsQueryExec {
    pub fn new<S: Into<String>>(
        source: Source,
        index_pattern: S,
        attributes: Vec<Attribute>,
        query: Option<QueryBuilder>,
    ) -> Self {
        Self {
            source,
            index_pattern: index_pattern.into(),
            index_mode: IndexMode::Standard,
            attributes,
            query,
            limit: None,
            estimated_row_size: None,
        }
    }
}

impl PlanNode for EsQueryExec {
    const NAME: &'static str = "EsQueryExec";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_string(&self.index_pattern)?;
        out.write_enum(self.index_mode)?;
        out.write_named_writeable_collection(&self.attributes)?;
        out.write_optional_named_writeable(self.query.as_ref())?;
        out.write_optional_named_writeable(self.limit.as_ref())?;
        out.write_optional_vu32(self.estimated_row_size)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            index_pattern: input.read_string()?,
            index_mode: input.read_enum("index mode")?,
            attributes: input.read_named_writeable_collection()?,
            query: input.read_optional_named_writeable()?,
            limit: input.read_optional_named_writeable()?,
            estimated_row_size: input.read_optional_vu32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterExec {
    pub source: Source,
    pub child: Box<PhysicalPlan>,
    pub condition: Expression,
}

impl FilterExec {
    pub fn new(source: Source, child: PhysicalPlan, condition: Expression) -> Self {
        Self {
            source,
            child: Box::new(child),
            condition,
        }
    }
}

impl PlanNode for FilterExec {
    const NAME: &'static str = "FilterExec";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_physical_plan_node(&self.child)?;
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
pub struct ProjectExec {
    pub source: Source,
    pub child: Box<PhysicalPlan>,
    pub projections: Vec<NamedExpression>,
}

impl ProjectExec {
    pub fn new(source: Source, child: PhysicalPlan, projections: Vec<NamedExpression>) -> Self {
        Self {
            source,
            child: Box::new(child),
            projections,
        }
    }
}

impl PlanNode for ProjectExec {
    const NAME: &'static str = "ProjectExec";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_physical_plan_node(&self.child)?;
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
pub struct LimitExec {
    pub source: Source,
    pub child: Box<PhysicalPlan>,
    pub limit: Expression,
}

impl LimitExec {
    pub fn new(source: Source, child: PhysicalPlan, limit: Expression) -> Self {
        Self {
            source,
            child: Box::new(child),
            limit,
        }
    }
}

impl PlanNode for LimitExec {
    const NAME: &'static str = "LimitExec";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_physical_plan_node(&self.child)?;
        out.write_named_writeable(&self.limit)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            child: read_child(input)?,
            limit: input.read_named_writeable()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateExec {
    pub source: Source,
    pub child: Box<PhysicalPlan>,
    pub groupings: Vec<Expression>,
    pub aggregates: Vec<NamedExpression>,
    pub mode: AggregateMode,
    pub estimated_row_size: Option<u32>,
}

impl AggregateExec {
    pub fn new(
        source: Source,
        child: PhysicalPlan,
        groupings: Vec<Expression>,
        aggregates: Vec<NamedExpression>,
        mode: AggregateMode,
    ) -> Self {
        Self {
            source,
            child: Box::new(child),
            groupings,
            aggregates,
            mode,
            estimated_row_size: None,
        }
    }
}

impl PlanNode for AggregateExec {
    const NAME: &'static str = "AggregateExec";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_physical_plan_node(&self.child)?;
        out.write_named_writeable_collection(&self.groupings)?;
        out.write_named_writeable_collection(&self.aggregates)?;
        out.write_enum(self.mode)?;
        out.write_optional_vu32(self.estimated_row_size)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            child: read_child(input)?,
            groupings: input.read_named_writeable_collection()?,
            aggregates: input.read_named_writeable_collection()?,
            mode: input.read_enum("aggregate mode")?,
            estimated_row_size: input.read_optional_vu32()?,
        })
    }
}

/// Boundary where pages move between drivers or nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExchangeExec {
    pub source: Source,
    pub output: Vec<Attribute>,
    pub in_between_aggs: bool,
    pub child: Box<PhysicalPlan>,
}

impl ExchangeExec {
    pub fn new(source: Source, output: Vec<Attribute>, child: PhysicalPlan) -> Self {
        Self {
            source,
            output,
            in_between_aggs: false,
            child: Box::new(child),
        }
    }
}

impl PlanNode for ExchangeExec {
    const NAME: &'static str = "ExchangeExec";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_named_writeable_collection(&self.output)?;
        out.write_bool(self.in_between_aggs)?;
        out.write_physical_plan_node(&self.child)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            output: input.read_named_writeable_collection()?,
            in_between_aggs: input.read_bool()?,
            child: read_child(input)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopNExec {
    pub source: Source,
    pub child: Box<PhysicalPlan>,
    pub order: Vec<Order>,
    pub limit: Expression,
    pub estimated_row_size: Option<u32>,
}

impl TopNExec {
    pub fn new(source: Source, child: PhysicalPlan, order: Vec<Order>, limit: Expression) -> Self {
        Self {
            source,
            child: Box::new(child),
            order,
            limit,
            estimated_row_size: None,
        }
    }
}

impl PlanNode for TopNExec {
    const NAME: &'static str = "TopNExec";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_physical_plan_node(&self.child)?;
        out.write_collection(&self.order, |out, order| order.write_to(out))?;
        out.write_named_writeable(&self.limit)?;
        out.write_optional_vu32(self.estimated_row_size)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            child: read_child(input)?,
            order: input.read_collection(Order::read_from)?,
            limit: input.read_named_writeable()?,
            estimated_row_size: input.read_optional_vu32()?,
        })
    }
}

/// A logical subtree shipped as-is for the receiving node to plan locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentExec {
    pub source: Source,
    pub fragment: LogicalPlan,
    pub es_filter: Option<QueryBuilder>,
    pub estimated_row_size: u32,
}

impl FragmentExec {
    pub fn new(fragment: LogicalPlan) -> Self {
        Self {
            source: fragment.source().clone(),
            fragment,
            es_filter: None,
            estimated_row_size: 0,
        }
    }
}

impl PlanNode for FragmentExec {
    const NAME: &'static str = "FragmentExec";

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()> {
        out.write_source(&self.source)?;
        out.write_logical_plan_node(&self.fragment)?;
        out.write_optional_named_writeable(self.es_filter.as_ref())?;
        out.write_vu32(self.estimated_row_size)
    }

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self> {
        Ok(Self {
            source: input.read_source()?,
            fragment: input.read_logical_plan_node()?,
            es_filter: input.read_optional_named_writeable()?,
            estimated_row_size: input.read_vu32()?,
        })
    }
}

macro_rules! physical_plan {
    ($($variant:ident),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum PhysicalPlan {
            $($variant($variant),)*
        }

        impl PhysicalPlan {
            pub fn node_name(&self) -> &'static str {
                match self {
                    $(PhysicalPlan::$variant(_) => <$variant as PlanNode>::NAME,)*
                }
            }

            pub(crate) fn write_node<W: Write>(
                &self,
                out: &mut PlanStreamOutput<'_, W>,
            ) -> Result<()> {
                match self {
                    $(PhysicalPlan::$variant(node) => node.write_to(out),)*
                }
            }

            pub fn source(&self) -> &Source {
                match self {
                    $(PhysicalPlan::$variant(node) => &node.source,)*
                }
            }
        }

        $(
            impl From<$variant> for PhysicalPlan {
                fn from(value: $variant) -> Self {
                    PhysicalPlan::$variant(value)
                }
            }
        )*
    };
}

physical_plan!(
    EsQueryExec,
    FilterExec,
    ProjectExec,
    LimitExec,
    AggregateExec,
    ExchangeExec,
    TopNExec,
    FragmentExec,
);

impl PhysicalPlan {
    /// Physical children; a fragment's logical subtree is not one of them.
    pub fn children(&self) -> Vec<&PhysicalPlan> {
        match self {
            PhysicalPlan::EsQueryExec(_) | PhysicalPlan::FragmentExec(_) => Vec::new(),
            PhysicalPlan::FilterExec(node) => vec![node.child.as_ref()],
            PhysicalPlan::ProjectExec(node) => vec![node.child.as_ref()],
            PhysicalPlan::LimitExec(node) => vec![node.child.as_ref()],
            PhysicalPlan::AggregateExec(node) => vec![node.child.as_ref()],
            PhysicalPlan::ExchangeExec(node) => vec![node.child.as_ref()],
            PhysicalPlan::TopNExec(node) => vec![node.child.as_ref()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical_plan::EsRelation;

    #[test]
    fn test_aggregate_mode_codes() {
        assert_eq!(u8::from(AggregateMode::Final), 2);
        assert_eq!(AggregateMode::try_from(3u8).unwrap(), AggregateMode::Single);
        assert!(AggregateMode::try_from(4u8).is_err());
    }

    #[test]
    fn test_fragment_is_a_leaf() {
        let source = Source::new(1, 1, "FROM logs");
        let relation = EsRelation::new(source.clone(), "logs", Vec::new());
        let fragment: PhysicalPlan = FragmentExec::new(relation.into()).into();

        assert_eq!(fragment.node_name(), "FragmentExec");
        assert_eq!(fragment.source(), &source);
        assert!(fragment.children().is_empty());
    }
}
