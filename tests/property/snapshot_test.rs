// tests/property/snapshot_test.rs

//! Property-based tests for atomic credential snapshot replacement.
//!
//! Readers racing an arbitrary interleaving of reloads must only ever see a
//! complete registry: root plus the whole user list of exactly one store,
//! never a partially applied one.

use indexfence::core::auth::registry::{RootCredentials, UserRegistry};
use indexfence::core::auth::store::{MemoryUserStore, UserStore};
use indexfence::core::auth::user::AuthUser;
use proptest::prelude::*;
use std::sync::Arc;

async fn store_with_users(prefix: &str, count: usize) -> Arc<MemoryUserStore> {
    let store = Arc::new(MemoryUserStore::new());
    for i in 0..count {
        store
            .put(&AuthUser::new(&format!("{prefix}{i}"), "pw"))
            .await
            .unwrap();
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 16,
        ..ProptestConfig::default()
    })]

    #[test]
    fn concurrent_readers_only_see_complete_snapshots(
        first in 1usize..24,
        second in 1usize..24,
        reloads in 4usize..32,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let registry = Arc::new(UserRegistry::new(RootCredentials::new("rootpw")));
            let store_a = store_with_users("user_a", first).await;
            let store_b = store_with_users("user_b", second).await;

            // +1 for the synthesized root in every snapshot
            let complete_sizes = [1, first + 1, second + 1];

            let mut readers = Vec::new();
            for _ in 0..4 {
                let registry = Arc::clone(&registry);
                readers.push(tokio::spawn(async move {
                    for _ in 0..200 {
                        let snapshot = registry.snapshot();
                        assert!(snapshot.get("root").is_some());
                        assert!(
                            complete_sizes.contains(&snapshot.len()),
                            "partial snapshot observed: {} users",
                            snapshot.len()
                        );
                        tokio::task::yield_now().await;
                    }
                }));
            }

            for _ in 0..reloads {
                registry.reload(store_a.as_ref()).await.unwrap();
                registry.reload(store_b.as_ref()).await.unwrap();
            }

            for reader in readers {
                reader.await.unwrap();
            }
        });
    }

    #[test]
    fn failed_reloads_never_disturb_authentication(
        count in 1usize..16,
        outages in prop::collection::vec(any::<bool>(), 1..24),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let registry = UserRegistry::new(RootCredentials::new("rootpw"));
            let store = store_with_users("user", count).await;
            registry.reload(store.as_ref()).await.unwrap();

            for outage in outages {
                store.set_unavailable(outage);
                let _ = registry.reload(store.as_ref()).await;

                // the registry keeps answering from the last good snapshot
                assert!(registry.is_ready());
                assert!(registry.authenticate("user0", "pw").is_some());
                assert!(registry.authenticate("root", "rootpw").is_some());
                assert_eq!(registry.snapshot().len(), count + 1);
            }
        });
    }
}
