//! Countdown registry
//!
//! One live countdown label per scheduled ticket type. Each label is a
//! watch channel refreshed by a spawned one-minute ticker; a type with no
//! computed next distribution gets a static "Ready" label and no ticker.
//! Dropping a timer aborts its task, so cancellation is deterministic:
//! untracking, replacing, or clearing never leaves a ticker behind.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::services::TicketType;
use crate::utils::time::{format_remaining, READY};

/// How often live countdown labels are recomputed
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

struct CountdownTimer {
    due: Option<DateTime<Utc>>,
    label: watch::Receiver<String>,
    task: Option<JoinHandle<()>>,
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Registry of countdown labels keyed by ticket type id
#[derive(Default)]
pub struct CountdownRegistry {
    timers: HashMap<i64, CountdownTimer>,
}

impl CountdownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or replace) the countdown for a ticket type and return a
    /// receiver for its label. Must be called from within a tokio runtime.
    pub fn track(&mut self, type_id: i64, due: Option<DateTime<Utc>>) -> watch::Receiver<String> {
        let timer = match due {
            Some(due) => {
                let (tx, rx) = watch::channel(format_remaining(due - Utc::now()));
                let task = tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
                    // the first tick completes immediately
                    ticker.tick().await;
                    loop {
                        ticker.tick().await;
                        if tx.send(format_remaining(due - Utc::now())).is_err() {
                            break;
                        }
                    }
                });
                log::debug!("Started countdown for ticket type {} (1 minute interval)", type_id);
                CountdownTimer {
                    due: Some(due),
                    label: rx,
                    task: Some(task),
                }
            }
            None => {
                let (_, rx) = watch::channel(READY.to_string());
                CountdownTimer {
                    due: None,
                    label: rx,
                    task: None,
                }
            }
        };
        let label = timer.label.clone();
        // dropping a displaced timer aborts its ticker
        self.timers.insert(type_id, timer);
        label
    }

    /// The current label for a tracked ticket type
    pub fn label(&self, type_id: i64) -> Option<String> {
        self.timers.get(&type_id).map(|t| t.label.borrow().clone())
    }

    /// A receiver following a tracked ticket type's label
    pub fn subscribe(&self, type_id: i64) -> Option<watch::Receiver<String>> {
        self.timers.get(&type_id).map(|t| t.label.clone())
    }

    pub fn is_tracked(&self, type_id: i64) -> bool {
        self.timers.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Stop the countdown for a ticket type, aborting its ticker
    pub fn untrack(&mut self, type_id: i64) {
        if self.timers.remove(&type_id).is_some() {
            log::debug!("Cancelled countdown for ticket type {}", type_id);
        }
    }

    /// Align the registry with a refreshed collection: drop timers for
    /// types that disappeared, start timers for new ones, and replace
    /// timers whose schedule moved. Timers with an unchanged schedule are
    /// left alone so existing subscriptions stay live.
    pub fn sync(&mut self, types: &[TicketType]) {
        let keep: HashSet<i64> = types.iter().map(|t| t.id).collect();
        self.timers.retain(|id, _| keep.contains(id));
        for record in types {
            let unchanged = self
                .timers
                .get(&record.id)
                .is_some_and(|t| t.due == record.next_distribution);
            if !unchanged {
                self.track(record.id, record.next_distribution);
            }
        }
    }

    /// Drop every timer
    pub fn clear(&mut self) {
        let count = self.timers.len();
        self.timers.clear();
        if count > 0 {
            log::debug!("Cancelled {} countdowns", count);
        }
    }
}
