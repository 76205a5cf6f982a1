//! Registry of active sessions
//!
//! Holds every named session in claim order. The set of claimed names is
//! derived from the sessions themselves, so a name is reserved exactly as
//! long as its session is registered.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::AppError;
use crate::session::{Session, Tx};

/// Shared store of active sessions
///
/// Every operation runs under one mutex, so a claim is atomic with respect
/// to other claims and a snapshot never observes a half-added session.
/// The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: Mutex<Vec<Arc<Session>>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `name` and register a new session bound to `sender`
    ///
    /// Fails with `UsernameTaken` when an active session already holds the
    /// exact same name.
    pub fn claim(&self, name: &str, sender: Tx) -> Result<Arc<Session>, AppError> {
        let mut sessions = self.lock();
        if sessions.iter().any(|s| s.name() == name) {
            return Err(AppError::UsernameTaken(name.to_string()));
        }

        let session = Arc::new(Session::new(name.to_string(), sender));
        sessions.push(Arc::clone(&session));
        debug!("Claimed '{}', total sessions: {}", name, sessions.len());
        Ok(session)
    }

    /// Remove `session`, freeing its name
    ///
    /// Idempotent: returns `false` when the session was not registered.
    pub fn release(&self, session: &Session) -> bool {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|s| s.id() != session.id());
        let removed = sessions.len() != before;
        if removed {
            debug!(
                "Released '{}', total sessions: {}",
                session.name(),
                sessions.len()
            );
        }
        removed
    }

    /// Point-in-time copy of the active sessions, in claim order
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.lock().clone()
    }

    /// Names of the active sessions, in claim order
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|s| s.name().to_string()).collect()
    }

    /// Find a session by name, ignoring case
    pub fn find_ignore_case(&self, name: &str) -> Option<Arc<Session>> {
        let wanted = name.to_lowercase();
        self.lock()
            .iter()
            .find(|s| s.name().to_lowercase() == wanted)
            .cloned()
    }

    /// Whether `name` is currently claimed (exact match)
    pub fn contains(&self, name: &str) -> bool {
        self.lock().iter().any(|s| s.name() == name)
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no session is active
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> Tx {
        tokio::sync::mpsc::unbounded_channel().0
    }

    #[test]
    fn test_claim_and_duplicate() {
        let registry = Registry::new();

        let alice = registry.claim("alice", sender()).unwrap();
        assert_eq!(alice.name(), "alice");
        assert!(registry.contains("alice"));

        assert!(matches!(
            registry.claim("alice", sender()),
            Err(AppError::UsernameTaken(name)) if name == "alice"
        ));
        // Storage is case-sensitive
        assert!(registry.claim("Alice", sender()).is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_release_is_idempotent_and_frees_name() {
        let registry = Registry::new();
        let bob = registry.claim("bob", sender()).unwrap();

        assert!(registry.release(&bob));
        assert!(!registry.release(&bob));
        assert!(registry.is_empty());

        // Name is claimable again
        let bob2 = registry.claim("bob", sender()).unwrap();
        // A stale release of the old session must not evict the new one
        assert!(!registry.release(&bob));
        assert!(registry.contains("bob"));
        assert!(registry.release(&bob2));
    }

    #[test]
    fn test_snapshot_and_names_keep_claim_order() {
        let registry = Registry::new();
        for name in ["carol", "alice", "bob"] {
            registry.claim(name, sender()).unwrap();
        }

        assert_eq!(registry.names(), vec!["carol", "alice", "bob"]);
        let snapshot: Vec<String> = registry
            .snapshot()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(snapshot, registry.names());
    }

    #[test]
    fn test_find_ignore_case() {
        let registry = Registry::new();
        let bob = registry.claim("Bob", sender()).unwrap();

        let found = registry.find_ignore_case("bOB").unwrap();
        assert_eq!(found.id(), bob.id());
        assert!(registry.find_ignore_case("bobby").is_none());
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let registry = Arc::new(Registry::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.claim("dup", sender()).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(registry.names(), vec!["dup"]);
    }
}
