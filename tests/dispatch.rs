//! Dispatcher behaviour across the full handler set.

mod common;

use async_trait::async_trait;
use smsroute::config::FrontEndKind;
use smsroute::models::{HealthFacility, NewFacility, User};
use smsroute::store::{MessageRecord, Session};
use smsroute::transport::FrontEnd;
use smsroute::{
    Command, DispatchError, Dispatcher, Group, Incoming, MemoryStore, Outbox, Registry, Store,
    StoreError,
};
use std::sync::Arc;

/// A store whose sessions refuse to commit.
struct FlakyStore(MemoryStore);

struct FlakySession(Box<dyn Session>);

#[async_trait]
impl Store for FlakyStore {
    async fn session(&self) -> Result<Box<dyn Session>, StoreError> {
        Ok(Box::new(FlakySession(self.0.session().await?)))
    }

    async fn messages(&self) -> Result<Vec<MessageRecord>, StoreError> {
        self.0.messages().await
    }
}

#[async_trait]
impl Session for FlakySession {
    async fn add(&mut self, message: &Incoming) -> Result<i64, StoreError> {
        self.0.add(message).await
    }

    async fn set_reply(&mut self, id: i64, reply: &str) -> Result<(), StoreError> {
        self.0.set_reply(id, reply).await
    }

    async fn find_user(&mut self, number: &str) -> Result<Option<User>, StoreError> {
        self.0.find_user(number).await
    }

    async fn save_user(&mut self, user: &User) -> Result<i64, StoreError> {
        self.0.save_user(user).await
    }

    async fn find_facility(&mut self, hmis: i64) -> Result<Option<HealthFacility>, StoreError> {
        self.0.find_facility(hmis).await
    }

    async fn add_facility(&mut self, facility: &NewFacility) -> Result<i64, StoreError> {
        self.0.add_facility(facility).await
    }

    async fn set_membership(&mut self, user: i64, facility: i64) -> Result<(), StoreError> {
        self.0.set_membership(user, facility).await
    }

    async fn facility_members(&mut self, facility: i64) -> Result<Vec<User>, StoreError> {
        self.0.facility_members(facility).await
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        Err(StoreError::Duplicate("commit refused".into()))
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.0.rollback().await
    }
}

#[tokio::test]
async fn commit_failure_rolls_back_everything() {
    let inner = common::seeded_memory().await;
    // An officer at the facility, so the signup queues a notification.
    let mut session = inner.session().await.unwrap();
    let mut officer = User::new("100");
    officer.join(Group::HCS);
    let officer_id = session.save_user(&officer).await.unwrap();
    session.set_membership(officer_id, 1).await.unwrap();
    session.commit().await.unwrap();

    let (outbox, mut rx) = Outbox::channel(8);
    let dispatcher = Dispatcher::new(
        Arc::new(FlakyStore(inner.clone())),
        Arc::new(Registry::new()),
        outbox,
    );
    let mut message = Incoming::new(
        "200",
        "+vht 1234",
        Command::HealthWorkerSignup {
            group: Group::VHT,
            hmis: common::KISWA,
        },
    );

    let err = dispatcher.dispatch(&mut message).await.unwrap_err();
    assert!(matches!(err, DispatchError::Commit(_)));
    assert_eq!(message.reply, None);
    assert_eq!(message.id, None);
    assert!(inner.messages().await.unwrap().is_empty());
    assert_eq!(inner.users().len(), 1);
    assert!(common::drain(&mut rx).is_empty());
}

#[tokio::test]
async fn signup_notifies_surveillance_officers() {
    let store = common::seeded_memory().await;
    let (transport, mut rx) =
        common::transport(Arc::new(store.clone()), FrontEnd::build(FrontEndKind::Grammar).unwrap());

    transport.incoming("100", "+hcs 1234").await.unwrap();
    assert!(common::drain(&mut rx).is_empty());

    transport.incoming("200", "+register Alice, Kampala").await.unwrap();
    let message = transport.incoming("200", "+vht 1234").await.unwrap();
    assert_eq!(
        message.reply.as_deref(),
        Some("You have joined Kiswa HC III as Village Health Team.")
    );

    let sent = common::drain(&mut rx);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "100");
    assert_eq!(
        sent[0].text,
        "Alice has joined Kiswa HC III as Village Health Team."
    );
}

#[tokio::test]
async fn unknown_facility_is_answered_not_failed() {
    let store = MemoryStore::new();
    let (transport, _rx) =
        common::transport(Arc::new(store.clone()), FrontEnd::build(FrontEndKind::Grammar).unwrap());

    let message = transport.incoming("1", "+hcw 999").await.unwrap();
    assert_eq!(
        message.reply.as_deref(),
        Some("No health facility found with HMIS code 999.")
    );
    assert!(store.users().is_empty());
    assert_eq!(store.messages().await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_dispatches_use_independent_sessions() {
    let store = MemoryStore::new();
    let (transport, _rx) =
        common::transport(Arc::new(store.clone()), FrontEnd::build(FrontEndKind::Grammar).unwrap());
    let transport = Arc::new(transport);

    let names = ["ann", "ben", "cal", "dee", "eve", "fay", "gus", "hal"];
    let tasks: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let transport = Arc::clone(&transport);
            let text = format!("+register {name}");
            tokio::spawn(async move { transport.incoming(&format!("25670{i}"), &text).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut ids: Vec<i64> = store
        .messages()
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.id)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    assert_eq!(store.users().len(), 8);
}
