//! Context-carrying plan streams.
//!
//! A [`PlanStreamOutput`] writes plan trees, expressions and query builders
//! into a byte sink; a [`PlanStreamInput`] reads them back. Both carry the
//! two registries and the session configuration for the whole pass, so node
//! codecs can recurse into polymorphic children and branch on the transport
//! version without any ambient state.
//!
//! Wire shape of every polymorphic or plan node:
//!
//! ```text
//! [varint(version id), top-level nodes only]
//! varint(len(name)) name [header byte, from TransportVersion::NODE_HEADER] payload
//! ```
//!
//! The version id in front of a top-level node lets a reader of any version
//! reject a stream written under another one before reading any payload.

mod input;
mod output;

pub use input::{MAX_NESTING_DEPTH, PlanStreamInput};
pub use output::PlanStreamOutput;

use bincode::config::{self, Configuration, Limit, LittleEndian, Varint};

/// Upper bound on the bytes a single primitive decode may claim.
pub const MAX_DECODE_BYTES: usize = 16 * 1024 * 1024;

pub(crate) type WireConfig = Configuration<LittleEndian, Varint, Limit<MAX_DECODE_BYTES>>;

pub(crate) fn wire_config() -> WireConfig {
    config::standard().with_limit::<MAX_DECODE_BYTES>()
}

/// Category label used in errors about plan nodes.
pub(crate) const LOGICAL_PLAN: &str = "LogicalPlan";
pub(crate) const PHYSICAL_PLAN: &str = "PhysicalPlan";
