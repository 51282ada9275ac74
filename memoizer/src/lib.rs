//! §4.B Memoizer: a scoped key→value cache, one scope per watched token.
//!
//! Keys are `(name, argument vector)` where arguments are primitives the
//! caller has already stringified — "arrays/maps disallowed" per §4.B, so
//! the API only accepts `Vec<String>`. Values may be any `Clone + Send +
//! Sync` type, including the result of an async call: concurrent callers
//! of `memo` on the same key observe a single in-flight `compute`, never
//! two (§8 "Memoizer singleness").

use anyhow::Result;
use eth::types::Address;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

type BoxedValue = Box<dyn Any + Send + Sync>;
type Key = (String, Vec<String>);

#[derive(Default)]
struct Scope {
    entries: HashMap<Key, Arc<OnceCell<BoxedValue>>>,
}

#[derive(Default)]
pub struct Memoizer {
    scopes: Mutex<HashMap<Address, Scope>>,
}

impl Memoizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// At most one `compute` call per `(token, name, args)` for the
    /// lifetime of the token's scope (§4.B contract). Panics only if the
    /// same key is ever memoized at two different `T`s, which would be a
    /// programmer error (stable module keys imply a stable value type).
    pub async fn memo<T, F, Fut>(&self, token: Address, name: &str, args: Vec<String>, compute: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key: Key = (name.to_string(), args);
        let cell = {
            let mut scopes = self.scopes.lock().await;
            let scope = scopes.entry(token).or_default();
            scope.entries.entry(key).or_insert_with(|| Arc::new(OnceCell::new())).clone()
        };
        let boxed = cell
            .get_or_try_init(|| async { compute().await.map(|value| Box::new(value) as BoxedValue) })
            .await?;
        Ok(boxed
            .downcast_ref::<T>()
            .expect("memoizer: value type changed for an existing key")
            .clone())
    }

    /// Drops all memoized entries for a token, called on removal (§4.B).
    pub async fn delete_scope(&self, token: Address) {
        self.scopes.lock().await.remove(&token);
    }

    #[cfg(test)]
    async fn scope_len(&self, token: Address) -> usize {
        self.scopes.lock().await.get(&token).map(|s| s.entries.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn token() -> Address {
        Address::from(1u64)
    }

    #[tokio::test]
    async fn memoizes_by_name_and_args() {
        let memo = Memoizer::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let calls = calls.clone();
            memo.memo(token(), "balance", vec!["0xabc".into()], || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(42u64)
            })
            .await
            .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_args_are_distinct_keys() {
        let memo = Memoizer::new();
        let a: u64 = memo.memo(token(), "x", vec!["1".into()], || async { Ok(1u64) }).await.unwrap();
        let b: u64 = memo.memo(token(), "x", vec!["2".into()], || async { Ok(2u64) }).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(memo.scope_len(token()).await, 2);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_in_flight_compute() {
        let memo = Arc::new(Memoizer::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let memo = memo.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                memo.memo(token(), "slow", vec![], || async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>(7u64)
                })
                .await
                .unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delete_scope_drops_entries() {
        let memo = Memoizer::new();
        memo.memo(token(), "x", vec![], || async { Ok::<_, anyhow::Error>(1u64) }).await.unwrap();
        assert_eq!(memo.scope_len(token()).await, 1);
        memo.delete_scope(token()).await;
        assert_eq!(memo.scope_len(token()).await, 0);
    }
}
