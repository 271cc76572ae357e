//! In-memory store.
//!
//! Each session works on a private copy of the committed tables and keeps a
//! log of what it changed. Commit replays the log onto the shared tables
//! under the lock, so a conflicting commit leaves them untouched.

use super::{MessageRecord, Session, Store, StoreError};
use crate::models::{HealthFacility, Incoming, NewFacility, User};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct Tables {
    messages: BTreeMap<i64, MessageRecord>,
    users: BTreeMap<i64, User>,
    facilities: BTreeMap<i64, HealthFacility>,
    /// user id -> facility id
    memberships: HashMap<i64, i64>,
}

#[derive(Debug, Clone)]
enum Op {
    Message(MessageRecord),
    User(i64, User),
    Facility(HealthFacility),
    Membership { user: i64, facility: i64 },
}

impl Tables {
    fn apply(&mut self, op: Op) -> Result<(), StoreError> {
        match op {
            Op::Message(record) => {
                self.messages.insert(record.id, record);
            }
            Op::User(id, user) => {
                if self
                    .users
                    .values()
                    .any(|other| other.number == user.number && other.id != Some(id))
                {
                    return Err(StoreError::Duplicate(format!("user number {}", user.number)));
                }
                self.users.insert(id, user);
            }
            Op::Facility(facility) => {
                if self
                    .facilities
                    .values()
                    .any(|other| other.hmis == facility.hmis && other.id != facility.id)
                {
                    return Err(StoreError::Duplicate(format!("HMIS code {}", facility.hmis)));
                }
                self.facilities.insert(facility.id, facility);
            }
            Op::Membership { user, facility } => {
                if !self.users.contains_key(&user) {
                    return Err(StoreError::UserNotFound(user));
                }
                if !self.facilities.contains_key(&facility) {
                    return Err(StoreError::FacilityNotFound(facility));
                }
                self.memberships.insert(user, facility);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Sequences {
    messages: AtomicI64,
    users: AtomicI64,
    facilities: AtomicI64,
}

fn next(sequence: &AtomicI64) -> i64 {
    sequence.fetch_add(1, Ordering::Relaxed) + 1
}

/// Store kept entirely in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    sequences: Arc<Sequences>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed users, by id.
    pub fn users(&self) -> Vec<User> {
        self.tables.lock().users.values().cloned().collect()
    }

    /// Committed facilities, by id.
    pub fn facilities(&self) -> Vec<HealthFacility> {
        self.tables.lock().facilities.values().cloned().collect()
    }

    /// Facility id `user` belongs to.
    pub fn membership(&self, user: i64) -> Option<i64> {
        self.tables.lock().memberships.get(&user).copied()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn session(&self) -> Result<Box<dyn Session>, StoreError> {
        let view = self.tables.lock().clone();
        Ok(Box::new(MemorySession {
            store: self.clone(),
            view,
            log: Vec::new(),
            finished: false,
        }))
    }

    async fn messages(&self) -> Result<Vec<MessageRecord>, StoreError> {
        Ok(self.tables.lock().messages.values().cloned().collect())
    }
}

/// Staged work against a [`MemoryStore`].
pub struct MemorySession {
    store: MemoryStore,
    view: Tables,
    log: Vec<Op>,
    finished: bool,
}

impl MemorySession {
    fn stage(&mut self, op: Op) -> Result<(), StoreError> {
        if self.finished {
            return Err(StoreError::Finished);
        }
        self.view.apply(op.clone())?;
        self.log.push(op);
        Ok(())
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn add(&mut self, message: &Incoming) -> Result<i64, StoreError> {
        let id = next(&self.store.sequences.messages);
        self.stage(Op::Message(MessageRecord::pending(id, message)?))?;
        Ok(id)
    }

    async fn set_reply(&mut self, id: i64, reply: &str) -> Result<(), StoreError> {
        let mut record = self
            .view
            .messages
            .get(&id)
            .cloned()
            .ok_or(StoreError::MessageNotFound(id))?;
        record.reply = Some(reply.to_owned());
        self.stage(Op::Message(record))
    }

    async fn find_user(&mut self, number: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .view
            .users
            .values()
            .find(|user| user.number == number)
            .cloned())
    }

    async fn save_user(&mut self, user: &User) -> Result<i64, StoreError> {
        let mut user = user.clone();
        let id = match user.id {
            Some(id) if self.view.users.contains_key(&id) => id,
            Some(id) => return Err(StoreError::UserNotFound(id)),
            None => next(&self.store.sequences.users),
        };
        user.id = Some(id);
        self.stage(Op::User(id, user))?;
        Ok(id)
    }

    async fn find_facility(&mut self, hmis: i64) -> Result<Option<HealthFacility>, StoreError> {
        Ok(self
            .view
            .facilities
            .values()
            .find(|facility| facility.hmis == hmis)
            .cloned())
    }

    async fn add_facility(&mut self, facility: &NewFacility) -> Result<i64, StoreError> {
        let id = next(&self.store.sequences.facilities);
        self.stage(Op::Facility(HealthFacility {
            id,
            hmis: facility.hmis,
            name: facility.name.clone(),
            location: facility.location.clone(),
        }))?;
        Ok(id)
    }

    async fn set_membership(&mut self, user: i64, facility: i64) -> Result<(), StoreError> {
        self.stage(Op::Membership { user, facility })
    }

    async fn facility_members(&mut self, facility: i64) -> Result<Vec<User>, StoreError> {
        Ok(self
            .view
            .users
            .values()
            .filter(|user| {
                user.id
                    .and_then(|id| self.view.memberships.get(&id))
                    .is_some_and(|f| *f == facility)
            })
            .cloned()
            .collect())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if self.finished {
            return Err(StoreError::Finished);
        }
        self.finished = true;
        let log = std::mem::take(&mut self.log);
        let operations = log.len();

        let mut tables = self.store.tables.lock();
        let mut staged = tables.clone();
        for op in log {
            staged.apply(op)?;
        }
        *tables = staged;
        debug!(operations, "memory session committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.finished {
            debug!(operations = self.log.len(), "memory session rolled back");
        }
        self.finished = true;
        self.log.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Command;

    fn facility(hmis: i64) -> NewFacility {
        NewFacility {
            hmis,
            name: format!("Facility {hmis}"),
            location: None,
        }
    }

    #[tokio::test]
    async fn test_commit_publishes() {
        let store = MemoryStore::new();
        let mut session = store.session().await.unwrap();
        let message = Incoming::new("256700000001", "", Command::Empty);
        let id = session.add(&message).await.unwrap();
        session.set_reply(id, "ok").await.unwrap();
        assert!(store.messages().await.unwrap().is_empty());

        session.commit().await.unwrap();
        let messages = store.messages().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].reply.as_deref(), Some("ok"));
        assert_eq!(messages[0].kind, "empty");
    }

    #[tokio::test]
    async fn test_rollback_discards() {
        let store = MemoryStore::new();
        let mut session = store.session().await.unwrap();
        session.save_user(&User::new("1")).await.unwrap();
        session.rollback().await.unwrap();
        assert!(store.users().is_empty());
        assert!(matches!(session.commit().await, Err(StoreError::Finished)));
        session.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_session_sees_own_writes() {
        let store = MemoryStore::new();
        let mut session = store.session().await.unwrap();
        let user = session.save_user(&User::new("1")).await.unwrap();
        let facility = session.add_facility(&facility(12)).await.unwrap();
        session.set_membership(user, facility).await.unwrap();

        assert_eq!(session.find_user("1").await.unwrap().unwrap().id, Some(user));
        assert_eq!(session.find_facility(12).await.unwrap().unwrap().id, facility);
        assert_eq!(session.facility_members(facility).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_conflicting_commit_leaves_tables() {
        let store = MemoryStore::new();
        let mut first = store.session().await.unwrap();
        let mut second = store.session().await.unwrap();
        first.save_user(&User::new("1")).await.unwrap();
        second.save_user(&User::new("1")).await.unwrap();
        second.add_facility(&facility(3)).await.unwrap();

        first.commit().await.unwrap();
        assert!(matches!(
            second.commit().await,
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(store.users().len(), 1);
        assert!(store.facilities().is_empty());
    }

    #[tokio::test]
    async fn test_membership_requires_rows() {
        let store = MemoryStore::new();
        let mut session = store.session().await.unwrap();
        assert!(matches!(
            session.set_membership(9, 9).await,
            Err(StoreError::UserNotFound(9))
        ));
    }
}
