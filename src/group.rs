//! Group membership
//!
//! `Group` is a named set of member sessions. `GroupTable` owns every
//! group together with the inverse session → group index, and updates
//! both under one lock so they can never disagree.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::error::AppError;
use crate::message::usage;
use crate::session::Session;
use crate::types::SessionId;

/// Named chat group
///
/// Groups are created empty and persist when their last member leaves.
#[derive(Debug)]
pub struct Group {
    /// Group name
    pub name: String,
    /// Current members
    members: HashMap<SessionId, Arc<Session>>,
}

impl Group {
    /// Create a new empty group
    pub fn new(name: String) -> Self {
        Self {
            name,
            members: HashMap::new(),
        }
    }

    /// Number of members
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    fn add(&mut self, session: &Arc<Session>) {
        self.members.insert(session.id(), Arc::clone(session));
    }

    fn remove(&mut self, id: SessionId) {
        self.members.remove(&id);
    }

    fn members(&self) -> Vec<Arc<Session>> {
        self.members.values().cloned().collect()
    }
}

/// Result of a successful join
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The session was in no group before
    Joined,
    /// The session left `from` and joined the requested group
    Switched { from: String },
    /// The session was already a member of the requested group
    AlreadyMember,
}

#[derive(Debug, Default)]
struct GroupTableInner {
    /// Group name -> group
    groups: BTreeMap<String, Group>,
    /// Session -> name of its single group
    session_groups: HashMap<SessionId, String>,
}

impl GroupTableInner {
    /// Drop `id` from its current group, if any
    fn detach(&mut self, id: SessionId) -> Option<String> {
        let name = self.session_groups.remove(&id)?;
        if let Some(group) = self.groups.get_mut(&name) {
            group.remove(id);
            info!("Group '{}' now has {} member(s)", name, group.member_count());
        }
        Some(name)
    }
}

/// Shared store of groups and per-session membership
#[derive(Debug, Default)]
pub struct GroupTable {
    inner: Mutex<GroupTableInner>,
}

impl GroupTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GroupTableInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an empty group
    pub fn create(&self, name: &str) -> Result<(), AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidFormat {
                usage: usage::GROUP_CREATE,
            });
        }

        let mut inner = self.lock();
        if inner.groups.contains_key(name) {
            return Err(AppError::GroupExists(name.to_string()));
        }
        inner
            .groups
            .insert(name.to_string(), Group::new(name.to_string()));
        info!("Group '{}' created", name);
        Ok(())
    }

    /// Add `session` to group `name`
    ///
    /// A session in another group is moved: it leaves the old group and
    /// joins the new one in the same critical section.
    pub fn join(&self, name: &str, session: &Arc<Session>) -> Result<JoinOutcome, AppError> {
        let mut inner = self.lock();
        if !inner.groups.contains_key(name) {
            return Err(AppError::GroupNotFound(name.to_string()));
        }

        let id = session.id();
        if inner.session_groups.get(&id).map(String::as_str) == Some(name) {
            return Ok(JoinOutcome::AlreadyMember);
        }

        let previous = inner.detach(id);
        let count = match inner.groups.get_mut(name) {
            Some(group) => {
                group.add(session);
                group.member_count()
            }
            None => 0,
        };
        inner.session_groups.insert(id, name.to_string());

        info!(
            "'{}' joined group '{}' ({} member(s))",
            session.name(),
            name,
            count
        );
        Ok(match previous {
            Some(from) => JoinOutcome::Switched { from },
            None => JoinOutcome::Joined,
        })
    }

    /// Remove session `id` from its group, returning the group's name
    pub fn leave(&self, id: SessionId) -> Result<String, AppError> {
        self.lock().detach(id).ok_or(AppError::NotInGroup)
    }

    /// Disconnect cleanup; a no-op for a session in no group
    pub fn remove_session(&self, id: SessionId) -> Option<String> {
        self.lock().detach(id)
    }

    /// Names of all groups, sorted
    pub fn list_names(&self) -> Vec<String> {
        self.lock().groups.keys().cloned().collect()
    }

    /// Members of group `name`, or `None` if it does not exist
    pub fn members_of(&self, name: &str) -> Option<Vec<Arc<Session>>> {
        self.lock().groups.get(name).map(Group::members)
    }

    /// The group of session `id` and its members, read atomically
    pub fn current_members(&self, id: SessionId) -> Result<(String, Vec<Arc<Session>>), AppError> {
        let inner = self.lock();
        let name = inner.session_groups.get(&id).ok_or(AppError::NotInGroup)?;
        let group = inner.groups.get(name).ok_or(AppError::NotInGroup)?;
        Ok((name.clone(), group.members()))
    }

    /// Name of the group session `id` belongs to
    pub fn group_of(&self, id: SessionId) -> Option<String> {
        self.lock().session_groups.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn session(name: &str) -> Arc<Session> {
        Arc::new(Session::new(name.to_string(), mpsc::unbounded_channel().0))
    }

    fn member_names(table: &GroupTable, group: &str) -> Vec<String> {
        let mut names: Vec<String> = table
            .members_of(group)
            .unwrap()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_group_creation() {
        let group = Group::new("team".to_string());
        assert_eq!(group.name, "team");
        assert_eq!(group.member_count(), 0);
    }

    #[test]
    fn test_create_rejects_duplicates_and_empty() {
        let table = GroupTable::new();

        table.create("team").unwrap();
        assert!(matches!(
            table.create("team"),
            Err(AppError::GroupExists(name)) if name == "team"
        ));
        assert!(matches!(
            table.create("  "),
            Err(AppError::InvalidFormat { .. })
        ));
        assert_eq!(table.list_names(), vec!["team"]);
    }

    #[test]
    fn test_join_unknown_group() {
        let table = GroupTable::new();
        let alice = session("alice");

        assert!(matches!(
            table.join("nope", &alice),
            Err(AppError::GroupNotFound(name)) if name == "nope"
        ));
        assert!(table.group_of(alice.id()).is_none());
    }

    #[test]
    fn test_join_and_leave_keep_both_directions() {
        let table = GroupTable::new();
        let bob = session("bob");
        table.create("team").unwrap();

        assert_eq!(table.join("team", &bob).unwrap(), JoinOutcome::Joined);
        assert_eq!(table.group_of(bob.id()).as_deref(), Some("team"));
        assert_eq!(member_names(&table, "team"), vec!["bob"]);

        assert_eq!(table.join("team", &bob).unwrap(), JoinOutcome::AlreadyMember);
        assert_eq!(member_names(&table, "team"), vec!["bob"]);

        assert_eq!(table.leave(bob.id()).unwrap(), "team");
        assert!(table.group_of(bob.id()).is_none());
        assert!(member_names(&table, "team").is_empty());

        // Empty groups persist
        assert_eq!(table.list_names(), vec!["team"]);
        assert!(matches!(table.leave(bob.id()), Err(AppError::NotInGroup)));
    }

    #[test]
    fn test_join_second_group_moves_session() {
        let table = GroupTable::new();
        let carol = session("carol");
        table.create("a").unwrap();
        table.create("b").unwrap();

        table.join("a", &carol).unwrap();
        assert_eq!(
            table.join("b", &carol).unwrap(),
            JoinOutcome::Switched {
                from: "a".to_string()
            }
        );

        assert!(member_names(&table, "a").is_empty());
        assert_eq!(member_names(&table, "b"), vec!["carol"]);
        assert_eq!(table.group_of(carol.id()).as_deref(), Some("b"));
    }

    #[test]
    fn test_current_members() {
        let table = GroupTable::new();
        let alice = session("alice");
        let bob = session("bob");
        table.create("team").unwrap();

        assert!(matches!(
            table.current_members(alice.id()),
            Err(AppError::NotInGroup)
        ));

        table.join("team", &alice).unwrap();
        table.join("team", &bob).unwrap();
        let (name, members) = table.current_members(bob.id()).unwrap();
        assert_eq!(name, "team");
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn test_remove_session_is_idempotent() {
        let table = GroupTable::new();
        let dave = session("dave");
        table.create("team").unwrap();
        table.join("team", &dave).unwrap();

        assert_eq!(table.remove_session(dave.id()).as_deref(), Some("team"));
        assert!(table.remove_session(dave.id()).is_none());
        assert!(member_names(&table, "team").is_empty());
    }

    #[test]
    fn test_concurrent_joins_stay_consistent() {
        let table = Arc::new(GroupTable::new());
        table.create("a").unwrap();
        table.create("b").unwrap();
        let eve = session("eve");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = Arc::clone(&table);
                let eve = Arc::clone(&eve);
                std::thread::spawn(move || {
                    let target = if i % 2 == 0 { "a" } else { "b" };
                    for _ in 0..50 {
                        table.join(target, &eve).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let current = table.group_of(eve.id()).unwrap();
        let total = member_names(&table, "a").len() + member_names(&table, "b").len();
        assert_eq!(total, 1);
        assert_eq!(member_names(&table, &current), vec!["eve"]);
    }
}
