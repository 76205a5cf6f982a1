//! Identity of one connection
//!
//! Display names are only unique while their owner is online, so group
//! membership and registry removal key on `SessionId` instead.

use uuid::Uuid;

/// Identity of a single connection, from accepted handshake to cleanup
///
/// Minted when a name is claimed and never reused, so a departed session
/// can not be confused with a newcomer that picked the same name. Keys
/// the group table's member sets and its session → group index, and is
/// what `Registry::release` matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Mint the identity for a freshly claimed session
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
