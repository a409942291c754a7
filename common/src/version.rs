//! Transport versions understood by the plan streams.
//!
//! A transport version decides the wire shape of a plan stream. Writer and
//! reader of one stream must use the same version.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, Result};

/// Protocol version carried by a session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportVersion(u32);

impl TransportVersion {
    /// Node name followed by the node payload.
    pub const INITIAL: TransportVersion = TransportVersion(1);
    /// Adds a header byte after every node name.
    pub const NODE_HEADER: TransportVersion = TransportVersion(2);
    /// Source text is recovered from the configured query when possible.
    pub const SOURCE_OFFSETS: TransportVersion = TransportVersion(3);

    pub const CURRENT: TransportVersion = Self::SOURCE_OFFSETS;

    /// Resolve a known version from its numeric id.
    pub fn from_id(id: u32) -> Result<Self> {
        let version = TransportVersion(id);
        if version < Self::INITIAL || version > Self::CURRENT {
            return Err(CommonError::configuration_error(format!(
                "unknown transport version [{}], supported range is [{}..={}]",
                id,
                Self::INITIAL.id(),
                Self::CURRENT.id()
            )));
        }
        Ok(version)
    }

    pub fn id(&self) -> u32 {
        self.0
    }

    /// Whether this version includes everything introduced by `other`.
    pub fn supports(&self, other: TransportVersion) -> bool {
        *self >= other
    }

    /// The byte written after node names from [`TransportVersion::NODE_HEADER`] on.
    pub fn header_byte(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

impl Default for TransportVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl Display for TransportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}
