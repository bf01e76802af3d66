//! Integration tests for the full share / open flow over an in-memory store

mod common;

use std::time::Duration;

use ::common::crypto;
use ::common::lifecycle::{LifecycleError, NewSecret};
use ::common::transport::{KeyFragment, ShareLink};
use url::Url;

#[tokio::test]
async fn test_single_view_secret_burns() {
    let (manager, store, _clock) = common::setup_manager();

    let link = common::share(&manager, "hunter2", 1, 300).await.to_string();

    assert_eq!(common::open(&manager, &link).await.unwrap(), "hunter2");
    assert!(matches!(
        common::open(&manager, &link).await,
        Err(LifecycleError::NotFound)
    ));
    assert_eq!(store.entry_count(), 0);
}

#[tokio::test]
async fn test_three_views_then_gone() {
    let (manager, _store, _clock) = common::setup_manager();

    let link = common::share(&manager, "correct horse battery staple", 3, 3600)
        .await
        .to_string();

    for _ in 0..3 {
        assert_eq!(
            common::open(&manager, &link).await.unwrap(),
            "correct horse battery staple"
        );
    }
    assert!(matches!(
        common::open(&manager, &link).await,
        Err(LifecycleError::NotFound)
    ));
}

#[tokio::test]
async fn test_expiry_beats_remaining_views() {
    let (manager, _store, clock) = common::setup_manager();

    let link = common::share(&manager, "short lived", 10, 300).await.to_string();
    assert!(common::open(&manager, &link).await.is_ok());

    clock.advance(Duration::from_secs(299));
    assert!(common::open(&manager, &link).await.is_ok());

    clock.advance(Duration::from_secs(1));
    assert!(matches!(
        common::open(&manager, &link).await,
        Err(LifecycleError::NotFound)
    ));
}

#[tokio::test]
async fn test_passphrase_mode_flow() {
    let (manager, _store, _clock) = common::setup_manager();

    let passphrase = crypto::generate_random_password(crypto::DEFAULT_PASSWORD_LENGTH);
    let (envelope, salt) = crypto::encrypt_with_passphrase("launch codes", &passphrase).unwrap();
    let id = manager
        .create(NewSecret::new(envelope, 1, 300))
        .await
        .unwrap();
    let link = ShareLink::new(
        Url::parse(common::BASE_URL).unwrap(),
        id,
        KeyFragment::Passphrase(salt),
    )
    .to_string();

    // the link alone does not carry the key
    let parsed = ShareLink::parse(&link).unwrap();
    assert!(parsed.fragment.requires_passphrase());
    let KeyFragment::Passphrase(salt) = &parsed.fragment else {
        unreachable!()
    };

    let envelope = manager
        .retrieve_and_consume_view(&parsed.id.to_string())
        .await
        .unwrap();
    assert!(crypto::decrypt_with_passphrase(&envelope, salt, "wrong guess").is_err());
    assert_eq!(
        crypto::decrypt_with_passphrase(&envelope, salt, &passphrase).unwrap(),
        "launch codes"
    );
}

#[tokio::test]
async fn test_server_never_sees_key() {
    let (manager, _store, _clock) = common::setup_manager();

    let link = common::share(&manager, "hunter2", 1, 300).await;
    let fragment = link.fragment.to_string();

    let envelope = manager
        .retrieve_and_consume_view(&link.id.to_string())
        .await
        .unwrap();
    assert!(!envelope.ciphertext.contains(&fragment));
    assert!(!envelope.ciphertext.contains("hunter2"));
}
