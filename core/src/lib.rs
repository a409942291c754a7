//! Planwire core: registry-driven serialization of query plans.
//!
//! Plan trees, expressions and search queries are written into a single byte
//! stream by a [`PlanStreamOutput`] and rebuilt by a [`PlanStreamInput`].
//! Polymorphic values are written under a registered name and resolved on
//! read through a [`NamedWriteableRegistry`] (or a [`PlanNameRegistry`] for
//! plan operators). Both streams carry the session configuration, which
//! decides version-dependent parts of the wire shape.

pub mod entries;
pub mod expression;
pub mod literal;
pub mod logical_plan;
pub mod physical_plan;
pub mod plan_registry;
pub mod query;
pub mod registry;
pub mod source;
pub mod stream;
pub mod testing;
pub mod types;

pub use entries::{default_registries, named_writeables, plan_entries};
pub use expression::{Attribute, Expression, NameId, NamedExpression};
pub use literal::{Literal, LiteralValue};
pub use logical_plan::LogicalPlan;
pub use physical_plan::PhysicalPlan;
pub use plan_registry::{PlanEntry, PlanNameRegistry, PlanNode};
pub use query::QueryBuilder;
pub use registry::{Category, Entry, NamedWriteable, NamedWriteableRegistry};
pub use source::Source;
pub use stream::{PlanStreamInput, PlanStreamOutput};
pub use types::DataType;
