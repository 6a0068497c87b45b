//! Flight
//!
//! Per-key in-flight table. The first caller for a key runs the work; every
//! caller arriving while it runs awaits the same outcome.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

type Call<T> = Arc<OnceCell<T>>;

/// One in-flight call and the number of callers currently attached to it.
#[derive(Debug)]
struct Entry<T> {
    call: Call<T>,
    callers: usize,
}

// == Flight ==
/// Deduplicates concurrent work keyed by string.
///
/// The table lock only covers attaching to and detaching from calls; the
/// work itself runs outside it, so unrelated keys never contend. A record
/// is removed as soon as its work finishes (successfully or not) or once
/// every attached caller has been dropped, so the next caller starts a
/// fresh execution.
#[derive(Debug)]
pub struct Flight<T> {
    calls: Mutex<HashMap<String, Entry<T>>>,
}

impl<T: Clone> Flight<T> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    // == Work ==
    /// Runs `f` for `key` unless a call for `key` is already in flight, in
    /// which case the caller waits for and returns that call's result.
    ///
    /// If the executing caller is dropped before finishing, one of the
    /// waiters runs its own `f` instead.
    pub async fn work<F, Fut>(&self, key: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let call = {
            let mut calls = self.calls.lock();
            let entry = calls.entry(key.to_string()).or_insert_with(|| Entry {
                call: Arc::new(OnceCell::new()),
                callers: 0,
            });
            entry.callers += 1;
            entry.call.clone()
        };

        // Detaches on completion and on cancellation alike
        let _attached = Attached {
            flight: self,
            key,
            call: &call,
        };

        let value = call.get_or_init(f).await.clone();
        value
    }

    /// Number of keys with a call in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    fn detach(&self, key: &str, call: &Call<T>) {
        let mut calls = self.calls.lock();
        let Some(entry) = calls.get_mut(key) else {
            return;
        };
        // A newer generation under the same key is left alone
        if !Arc::ptr_eq(&entry.call, call) {
            return;
        }
        entry.callers -= 1;
        if entry.callers == 0 || entry.call.initialized() {
            calls.remove(key);
        }
    }
}

impl<T: Clone> Default for Flight<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct Attached<'a, T: Clone> {
    flight: &'a Flight<T>,
    key: &'a str,
    call: &'a Call<T>,
}

impl<T: Clone> Drop for Attached<'_, T> {
    fn drop(&mut self) {
        self.flight.detach(self.key, self.call);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_work_returns_result() {
        let flight: Flight<Result<String, String>> = Flight::new();
        let v = flight.work("key", || async { Ok("bar".to_string()) }).await;

        assert_eq!(v, Ok("bar".to_string()));
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_work_error_is_returned() {
        let flight: Flight<Result<String, String>> = Flight::new();
        let v = flight.work("key", || async { Err("some error".to_string()) }).await;

        assert_eq!(v, Err("some error".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_work_dedups_concurrent_calls() {
        let flight = Arc::new(Flight::<Result<String, String>>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let flight = flight.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    flight
                        .work("key", || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Ok("bar".to_string())
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok("bar".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_waiters_share_the_same_error() {
        let flight = Arc::new(Flight::<Result<String, String>>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let flight = flight.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    flight
                        .work("key", || async move {
                            let n = calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Err(format!("failure #{n}"))
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Err("failure #0".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_next_call() {
        let flight: Flight<Result<u32, String>> = Flight::new();

        let first = flight.work("key", || async { Err("down".to_string()) }).await;
        let second = flight.work("key", || async { Ok(7) }).await;

        assert_eq!(first, Err("down".to_string()));
        assert_eq!(second, Ok(7));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_keys_run_independently() {
        let flight = Arc::new(Flight::<u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4u32)
            .map(|i| {
                let flight = flight.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    flight
                        .work(&format!("key-{i}"), || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            i
                        })
                        .await
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), i as u32);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiter_takes_over_when_runner_is_dropped() {
        let flight = Arc::new(Flight::<u32>::new());

        let runner = {
            let flight = flight.clone();
            tokio::spawn(async move {
                flight
                    .work("key", || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        1
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let waiter = {
            let flight = flight.clone();
            tokio::spawn(async move { flight.work("key", || async { 2 }).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        runner.abort();
        assert_eq!(waiter.await.unwrap(), 2);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_calls_leave_no_record() {
        let flight = Arc::new(Flight::<u32>::new());

        let runners: Vec<_> = (0..100u32)
            .map(|i| {
                let flight = flight.clone();
                tokio::spawn(async move {
                    flight
                        .work(&format!("key-{i}"), || async move {
                            tokio::time::sleep(Duration::from_secs(60)).await;
                            i
                        })
                        .await
                })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(flight.in_flight(), 100);

        for runner in runners {
            runner.abort();
            assert!(runner.await.unwrap_err().is_cancelled());
        }
        assert_eq!(flight.in_flight(), 0);

        // The key is free for a fresh execution
        assert_eq!(flight.work("key-7", || async { 70 }).await, 70);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_record_survives_while_a_waiter_remains() {
        let flight = Arc::new(Flight::<u32>::new());
        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();

        let runner = {
            let flight = flight.clone();
            tokio::spawn(async move {
                flight
                    .work("key", || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        1
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let waiter = {
            let flight = flight.clone();
            tokio::spawn(async move {
                flight
                    .work("key", || async move { rx.await.unwrap_or(0) })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        runner.abort();
        let _ = runner.await;
        // The waiter is now running its own work under the same record
        assert_eq!(flight.in_flight(), 1);

        tx.send(2).unwrap();
        assert_eq!(waiter.await.unwrap(), 2);
        assert_eq!(flight.in_flight(), 0);
    }
}
