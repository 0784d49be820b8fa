//! Global media id composition.
//!
//! Every local media kind shares one 64-bit id space: the kind tag sits in
//! the upper 32 bits and the index row id in the lower 32 bits.

use crate::error::CoreError;
use crate::types::{LocalId, MediaId};

// ---------------------------------------------------------------------------
// Media kinds
// ---------------------------------------------------------------------------

/// Kind tag of a local media object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    LocalImage = 1,
    LocalVideo = 2,
    LocalImageAlbum = 3,
    LocalVideoAlbum = 4,
}

impl MediaKind {
    /// Numeric tag stored in the upper half of a [`MediaId`].
    pub fn tag(self) -> i32 {
        self as i32
    }

    /// Parse a numeric kind tag.
    pub fn from_tag(tag: i32) -> Result<Self, CoreError> {
        match tag {
            1 => Ok(Self::LocalImage),
            2 => Ok(Self::LocalVideo),
            3 => Ok(Self::LocalImageAlbum),
            4 => Ok(Self::LocalVideoAlbum),
            other => Err(CoreError::InvalidArgument(format!(
                "unknown media kind tag {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Compose a global id from a kind tag and an index row id.
///
/// The row id is taken as its raw 32-bit pattern, so negative ids never
/// bleed into the kind tag.
pub fn make_id(kind: MediaKind, local_id: LocalId) -> MediaId {
    (i64::from(kind.tag()) << 32) | i64::from(local_id as u32)
}

/// Split a global id back into its kind and row id.
pub fn split_id(id: MediaId) -> Result<(MediaKind, LocalId), CoreError> {
    let kind = MediaKind::from_tag((id >> 32) as i32)?;
    Ok((kind, id as u32 as i32))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
