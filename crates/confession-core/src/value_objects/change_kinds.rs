//! Change-kind bitflags for change-feed subscriptions

use bitflags::bitflags;

use crate::events::ChangeKind;

bitflags! {
    /// Row-level change kinds a change-feed subscriber is interested in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChangeKinds: u8 {
        /// New rows
        const INSERT = 1 << 0;
        /// Updated rows (likes counter)
        const UPDATE = 1 << 1;

        /// Everything the post table emits
        const ALL = Self::INSERT.bits() | Self::UPDATE.bits();
    }
}

impl ChangeKinds {
    /// Check whether a single change kind is selected
    #[inline]
    pub fn accepts(&self, kind: ChangeKind) -> bool {
        self.contains(Self::from(kind))
    }
}

impl From<ChangeKind> for ChangeKinds {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Insert => Self::INSERT,
            ChangeKind::Update => Self::UPDATE,
        }
    }
}

impl Default for ChangeKinds {
    fn default() -> Self {
        Self::ALL
    }
}
