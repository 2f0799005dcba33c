use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;

type TimerKey = (String, String);

struct TimerEntry {
    generation: u64,
    deadline: Instant,
    handle: AbortHandle,
}

type TimerMap = HashMap<TimerKey, TimerEntry>;

/// One cancellable deadline per (match, participant) pair.
///
/// Cancellation is best effort: a deadline that has already left its sleep
/// may still run its callback. Callbacks must re-check the state they act on.
#[derive(Default)]
pub struct TimerRegistry {
    timers: Arc<Mutex<TimerMap>>,
    next_generation: AtomicU64,
}

fn lock(timers: &Mutex<TimerMap>) -> MutexGuard<'_, TimerMap> {
    timers.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a deadline for the pair, replacing any live one. `on_expire`
    /// runs on its own task once `duration` elapses.
    pub fn arm<F>(&self, match_id: &str, participant_id: &str, duration: Duration, on_expire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key: TimerKey = (match_id.to_string(), participant_id.to_string());
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let timers = Arc::clone(&self.timers);
        let task_key = key.clone();

        // Hold the map while spawning so the task cannot look for its entry before it exists.
        let mut guard = lock(&self.timers);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let still_current = {
                let mut timers = lock(&timers);
                match timers.get(&task_key) {
                    Some(entry) if entry.generation == generation => {
                        timers.remove(&task_key);
                        true
                    }
                    _ => false,
                }
            };
            if still_current {
                debug!(
                    "Turn timer expired for participant {} in match {}",
                    task_key.1, task_key.0
                );
                on_expire.await;
            }
        });

        let entry = TimerEntry {
            generation,
            deadline: Instant::now() + duration,
            handle: handle.abort_handle(),
        };
        if let Some(previous) = guard.insert(key, entry) {
            previous.handle.abort();
            debug!(
                "Replaced turn timer for participant {} in match {}",
                participant_id, match_id
            );
        }
    }

    /// Cancels the pair's deadline. Returns whether one was live.
    pub fn cancel(&self, match_id: &str, participant_id: &str) -> bool {
        let key: TimerKey = (match_id.to_string(), participant_id.to_string());
        match lock(&self.timers).remove(&key) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every deadline belonging to the match. Returns how many were live.
    pub fn cancel_all(&self, match_id: &str) -> usize {
        let mut timers = lock(&self.timers);
        let keys: Vec<TimerKey> = timers
            .keys()
            .filter(|(timer_match_id, _)| timer_match_id == match_id)
            .cloned()
            .collect();
        for key in &keys {
            if let Some(entry) = timers.remove(key) {
                entry.handle.abort();
            }
        }
        keys.len()
    }

    /// Time left on the latest live deadline of the match, if any.
    pub fn remaining(&self, match_id: &str) -> Option<Duration> {
        let now = Instant::now();
        lock(&self.timers)
            .iter()
            .filter(|((timer_match_id, _), _)| timer_match_id == match_id)
            .map(|(_, entry)| entry.deadline.saturating_duration_since(now))
            .max()
    }

    pub fn is_armed(&self, match_id: &str, participant_id: &str) -> bool {
        let key: TimerKey = (match_id.to_string(), participant_id.to_string());
        lock(&self.timers).contains_key(&key)
    }

    pub fn armed_count(&self, match_id: &str) -> usize {
        lock(&self.timers)
            .keys()
            .filter(|(timer_match_id, _)| timer_match_id == match_id)
            .count()
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        for (_, entry) in lock(&self.timers).drain() {
            entry.handle.abort();
        }
    }
}
