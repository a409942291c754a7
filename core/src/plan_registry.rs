//! Name registry for the plan-tree grammar.
//!
//! Plan operators form one grammar, so their names are unique on their own
//! and need no category. Each entry is tagged with the plan family its reader
//! produces.

use std::collections::BTreeMap;
use std::io::Write;

use planwire_common::error::{CommonError, Result};
use tracing::debug;

use crate::logical_plan::LogicalPlan;
use crate::physical_plan::PhysicalPlan;
use crate::registry::Reader;
use crate::stream::{LOGICAL_PLAN, PHYSICAL_PLAN, PlanStreamInput, PlanStreamOutput};

/// Contract for plan operator structs.
pub trait PlanNode: Sized {
    /// Name written in front of the node.
    const NAME: &'static str;

    fn write_to<W: Write>(&self, out: &mut PlanStreamOutput<'_, W>) -> Result<()>;

    fn read_from(input: &mut PlanStreamInput<'_>) -> Result<Self>;
}

fn read_node<N, P>(input: &mut PlanStreamInput<'_>) -> Result<P>
where
    N: PlanNode + Into<P>,
{
    N::read_from(input).map(Into::into)
}

#[derive(Debug, Clone, Copy)]
pub enum PlanReader {
    Logical(Reader<LogicalPlan>),
    Physical(Reader<PhysicalPlan>),
}

impl PlanReader {
    fn family(&self) -> &'static str {
        match self {
            PlanReader::Logical(_) => LOGICAL_PLAN,
            PlanReader::Physical(_) => PHYSICAL_PLAN,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlanEntry {
    name: &'static str,
    reader: PlanReader,
}

impl PlanEntry {
    pub fn logical(name: &'static str, reader: Reader<LogicalPlan>) -> Self {
        Self {
            name,
            reader: PlanReader::Logical(reader),
        }
    }

    pub fn physical(name: &'static str, reader: Reader<PhysicalPlan>) -> Self {
        Self {
            name,
            reader: PlanReader::Physical(reader),
        }
    }

    /// Entry for a logical operator struct, named after [`PlanNode::NAME`].
    pub fn logical_node<N: PlanNode + Into<LogicalPlan>>() -> Self {
        Self::logical(N::NAME, read_node::<N, LogicalPlan>)
    }

    /// Entry for a physical operator struct, named after [`PlanNode::NAME`].
    pub fn physical_node<N: PlanNode + Into<PhysicalPlan>>() -> Self {
        Self::physical(N::NAME, read_node::<N, PhysicalPlan>)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Immutable `name -> reader` map for plan operators.
#[derive(Debug, Default)]
pub struct PlanNameRegistry {
    entries: BTreeMap<&'static str, PlanReader>,
}

impl PlanNameRegistry {
    pub fn try_new<I: IntoIterator<Item = PlanEntry>>(entries: I) -> Result<Self> {
        let mut map = BTreeMap::new();
        for entry in entries {
            if let Some(previous) = map.insert(entry.name, entry.reader) {
                return Err(CommonError::duplicate_name(previous.family(), entry.name));
            }
        }
        debug!(entries = map.len(), "built plan name registry");
        Ok(Self { entries: map })
    }

    /// A name registered for physical plans is unknown to logical reads.
    pub fn lookup_logical(&self, name: &str) -> Result<Reader<LogicalPlan>> {
        match self.entries.get(name) {
            Some(PlanReader::Logical(reader)) => Ok(*reader),
            _ => Err(CommonError::unknown_name(LOGICAL_PLAN, name)),
        }
    }

    pub fn lookup_physical(&self, name: &str) -> Result<Reader<PhysicalPlan>> {
        match self.entries.get(name) {
            Some(PlanReader::Physical(reader)) => Ok(*reader),
            _ => Err(CommonError::unknown_name(PHYSICAL_PLAN, name)),
        }
    }

    pub fn contains_logical(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(PlanReader::Logical(_)))
    }

    pub fn contains_physical(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(PlanReader::Physical(_)))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
