//! Bounded scatter-gather over minions.
//!
//! A producer pushes minion ids onto a bounded work channel and closes it.
//! A fixed pool of workers drains the channel, runs one lookup per id and
//! sends successful results to the collector, which is the only owner of
//! the result map. Failed lookups drop the minion from the result; a
//! minion lacking the requested data is the common case, not an error.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{MinionError, Result};

/// Run `lookup` for every id with at most `config.concurrency` in flight.
///
/// Returns the successful results keyed by minion UUID string. Result
/// iteration order is unspecified.
pub async fn fan_out<T, F, Fut>(
    ids: Vec<Uuid>,
    config: &ClientConfig,
    lookup: F,
) -> Result<HashMap<String, T>>
where
    T: Send + 'static,
    F: Fn(Uuid) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let workers = config.concurrency.max(1);
    let capacity = config.queue_capacity.max(1);

    let (work_tx, work_rx) = mpsc::channel::<Uuid>(capacity);
    let (result_tx, mut result_rx) = mpsc::channel::<(Uuid, T)>(capacity);

    let producer = tokio::spawn(async move {
        for id in ids {
            if work_tx.send(id).await.is_err() {
                break;
            }
        }
        // work_tx dropped here: workers see the channel closed once drained
    });

    let work_rx = Arc::new(Mutex::new(work_rx));
    let lookup = Arc::new(lookup);
    let mut handles = Vec::with_capacity(workers);

    for worker in 0..workers {
        let work_rx = Arc::clone(&work_rx);
        let result_tx = result_tx.clone();
        let lookup = Arc::clone(&lookup);

        handles.push(tokio::spawn(async move {
            loop {
                let next = work_rx.lock().await.recv().await;
                let Some(id) = next else {
                    break;
                };

                match lookup(id).await {
                    Ok(value) => {
                        if result_tx.send((id, value)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) if e.is_not_found() => {
                        debug!(worker, minion = %id, "lookup found nothing");
                    }
                    Err(e) => {
                        warn!(worker, minion = %id, error = %e, "lookup failed, skipping minion");
                    }
                }
            }
        }));
    }
    // Only workers hold senders now; the collector ends when they all exit.
    drop(result_tx);

    let mut results = HashMap::new();
    while let Some((id, value)) = result_rx.recv().await {
        results.insert(id.to_string(), value);
    }

    producer
        .await
        .map_err(|e| MinionError::Worker(e.to_string()))?;
    for handle in handles {
        handle
            .await
            .map_err(|e| MinionError::Worker(e.to_string()))?;
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_store::StoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[tokio::test]
    async fn test_small_pool_processes_every_candidate() {
        let candidates = ids(100);
        let config = ClientConfig {
            concurrency: 4,
            queue_capacity: 2,
        };
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&seen);
        let results = fan_out(candidates.clone(), &config, move |id| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, MinionError>(id.to_string())
            }
        })
        .await
        .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 100);
        assert_eq!(results.len(), 100);
        for id in candidates {
            assert_eq!(results[&id.to_string()], id.to_string());
        }
    }

    #[tokio::test]
    async fn test_in_flight_lookups_never_exceed_pool_size() {
        let config = ClientConfig {
            concurrency: 3,
            queue_capacity: 16,
        };
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (current, max) = (Arc::clone(&in_flight), Arc::clone(&peak));
        let results = fan_out(ids(30), &config, move |_| {
            let (current, max) = (Arc::clone(&current), Arc::clone(&max));
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                max.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, MinionError>(())
            }
        })
        .await
        .unwrap();

        assert_eq!(results.len(), 30);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_failed_lookups_are_omitted() {
        let candidates = ids(10);
        let keep: Vec<Uuid> = candidates.iter().step_by(2).copied().collect();
        let allowed = keep.clone();

        let results = fan_out(candidates, &ClientConfig::default(), move |id| {
            let hit = allowed.contains(&id);
            async move {
                if hit {
                    Ok(1u32)
                } else {
                    Err(MinionError::from(StoreError::NotFound(id.to_string())))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(results.len(), keep.len());
        for id in keep {
            assert!(results.contains_key(&id.to_string()));
        }
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty_map() {
        let results = fan_out(Vec::new(), &ClientConfig::default(), |_| async {
            Ok::<_, MinionError>(())
        })
        .await
        .unwrap();
        assert!(results.is_empty());
    }
}
