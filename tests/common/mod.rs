//! Integration test common infrastructure.
//!
//! Builds dispatchers and transports over fresh stores.

#![allow(dead_code)]

use smsroute::models::NewFacility;
use smsroute::store::{MemoryStore, Store};
use smsroute::transport::FrontEnd;
use smsroute::{Delivery, Dispatcher, Outbox, Registry, Transport};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const KISWA: i64 = 1234;

/// A transport named `test` over `store`, with its outbox receiver.
pub fn transport(
    store: Arc<dyn Store>,
    front_end: FrontEnd,
) -> (Transport, mpsc::Receiver<Delivery>) {
    let (outbox, rx) = Outbox::channel(16);
    let dispatcher = Dispatcher::new(store, Arc::new(Registry::new()), outbox);
    (Transport::new("test", front_end, dispatcher), rx)
}

/// Commit one facility into `store`.
pub async fn add_facility(store: &dyn Store, hmis: i64, name: &str) -> i64 {
    let mut session = store.session().await.unwrap();
    let id = session
        .add_facility(&NewFacility {
            hmis,
            name: name.into(),
            location: None,
        })
        .await
        .unwrap();
    session.commit().await.unwrap();
    id
}

/// A memory store holding the Kiswa facility.
pub async fn seeded_memory() -> MemoryStore {
    let store = MemoryStore::new();
    add_facility(&store, KISWA, "Kiswa HC III").await;
    store
}

/// Everything currently waiting in the outbox.
pub fn drain(rx: &mut mpsc::Receiver<Delivery>) -> Vec<Delivery> {
    let mut out = Vec::new();
    while let Ok(delivery) = rx.try_recv() {
        out.push(delivery);
    }
    out
}
