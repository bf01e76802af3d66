//! Shared test utilities for share/open integration tests
#![allow(dead_code)]

use std::sync::Arc;

use common::clock::ManualClock;
use common::crypto::{self, Envelope};
use common::lifecycle::{LifecycleError, NewSecret, SecretManager};
use common::store::MemoryKvStore;
use common::transport::{KeyFragment, ShareLink};
use url::Url;

pub const BASE_URL: &str = "https://drop.example.com";

/// A manager over a fresh in-memory store, driven by a manual clock
pub fn setup_manager() -> (SecretManager, MemoryKvStore, ManualClock) {
    let clock = ManualClock::starting_now();
    let store = MemoryKvStore::with_clock(Arc::new(clock.clone()));
    let manager = SecretManager::new(Arc::new(store.clone())).with_clock(Arc::new(clock.clone()));
    (manager, store, clock)
}

/// What a sharer does: encrypt locally, upload, build the link
pub async fn share(
    manager: &SecretManager,
    plaintext: &str,
    view_limit: u32,
    ttl_seconds: u64,
) -> ShareLink {
    let (envelope, key) = crypto::encrypt(plaintext).unwrap();
    let id = manager
        .create(NewSecret::new(envelope, view_limit, ttl_seconds))
        .await
        .unwrap();
    ShareLink::new(Url::parse(BASE_URL).unwrap(), id, KeyFragment::Key(key))
}

/// What a reader does: parse the link, consume a view, decrypt locally
pub async fn open(manager: &SecretManager, link: &str) -> Result<String, LifecycleError> {
    let link = ShareLink::parse(link).unwrap();
    let envelope: Envelope = manager
        .retrieve_and_consume_view(&link.id.to_string())
        .await?;
    let KeyFragment::Key(key) = &link.fragment else {
        panic!("expected a random-mode link");
    };
    Ok(crypto::decrypt(&envelope, key).unwrap())
}
