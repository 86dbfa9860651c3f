use std::{
    env,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::{DistributedLockFactory, RedisLockFactory, RedisStore, TimestampStore};

use super::runtime::{async_sleep, block_on};

fn redis_url() -> Option<String> {
    match env::var("REDIS_URL") {
        Ok(url) if !url.is_empty() => Some(url),
        _ => {
            eprintln!("skipping: REDIS_URL not set");
            None
        }
    }
}

fn unique_key(tag: &str) -> String {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("damper_test:{tag}:{unique}")
}

async fn connection(url: &str) -> redis::aio::ConnectionManager {
    let client = redis::Client::open(url).unwrap();
    client.get_connection_manager().await.unwrap()
}

#[test]
fn store_set_get_delete_roundtrip() {
    let Some(url) = redis_url() else { return };

    block_on(async {
        let store = RedisStore::new(connection(&url).await);
        let key = unique_key("store");

        assert_eq!(store.get(&key).await.unwrap(), None);

        store.set(&key, "1234567890").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some("1234567890".to_string()));

        store.set(&key, "42").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some("42".to_string()));

        store.delete(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);

        // Deleting an absent key is not an error.
        store.delete(&key).await.unwrap();
    });
}

#[test]
fn lock_is_exclusive_until_released() {
    let Some(url) = redis_url() else { return };

    block_on(async {
        let locks = RedisLockFactory::new(connection(&url).await);
        let key = unique_key("lock");

        let lock = locks
            .acquire(&key, Duration::from_secs(10))
            .await
            .unwrap()
            .unwrap();

        let contended = locks.acquire(&key, Duration::from_secs(10)).await.unwrap();
        assert!(contended.is_none(), "held lock must not be re-acquirable");

        lock.release().await.unwrap();

        let reacquired = locks.acquire(&key, Duration::from_secs(10)).await.unwrap();
        assert!(reacquired.is_some());
    });
}

#[test]
fn lock_expires_when_holder_never_releases() {
    let Some(url) = redis_url() else { return };

    block_on(async {
        let locks = RedisLockFactory::new(connection(&url).await);
        let key = unique_key("expiry");

        let _abandoned = locks
            .acquire(&key, Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();

        async_sleep(Duration::from_millis(200)).await;

        let reacquired = locks.acquire(&key, Duration::from_secs(10)).await.unwrap();
        assert!(
            reacquired.is_some(),
            "expired lock should be reclaimed automatically"
        );
    });
}

#[test]
fn stale_release_does_not_evict_new_holder() {
    let Some(url) = redis_url() else { return };

    block_on(async {
        let locks = RedisLockFactory::new(connection(&url).await);
        let key = unique_key("fencing");

        let stale = locks
            .acquire(&key, Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();

        async_sleep(Duration::from_millis(200)).await;

        let _current = locks
            .acquire(&key, Duration::from_secs(10))
            .await
            .unwrap()
            .unwrap();

        // The stale token no longer matches; the compare-and-delete script
        // must leave the new holder in place.
        stale.release().await.unwrap();

        let contended = locks.acquire(&key, Duration::from_secs(10)).await.unwrap();
        assert!(contended.is_none(), "new holder must survive a stale release");
    });
}
