//! Coarse capability flags for the host's UI.
//!
//! This is an ownership heuristic, not permission emulation: an entry owned
//! by neither the session uid nor the session gid is hidden outright.

use serde::Serialize;

use crate::nfs3::Attr;

/// Per-entry capability overrides. `None` leaves the host's default in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_see: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_create_file: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_create_directory: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_rename: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_move: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_upload: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_share: Option<bool>,
}

impl Metadata {
    /// Every capability forced off.
    pub const fn hidden() -> Self {
        let off = Some(false);
        Self {
            can_see: off,
            can_create_file: off,
            can_create_directory: off,
            can_rename: off,
            can_move: off,
            can_upload: off,
            can_delete: off,
            can_share: off,
        }
    }

    pub fn is_hidden(&self) -> bool {
        *self == Self::hidden()
    }

    /// Apply the ownership rule to an entry's attributes.
    ///
    /// No attributes (the export root, or a server that sent none) means no
    /// overrides.
    pub fn for_owner(attr: Option<&Attr>, uid: u32, gid: u32) -> Self {
        match attr {
            None => Self::default(),
            Some(attr) if attr.uid == uid || attr.gid == gid => Self::default(),
            Some(_) => Self::hidden(),
        }
    }
}
