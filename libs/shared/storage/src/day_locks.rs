//! Per-day serialization of queue number assignment.
//!
//! `enqueue` reads the day's highest queue number and then inserts the next
//! one. Two concurrent enqueues racing through that read-then-write would
//! mint the same number, so the whole critical section runs under the day's
//! mutex. Lock scope is one clinic-local calendar day: traffic for different
//! days never contends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::NaiveDate;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
pub struct DayLocks {
    inner: Arc<StdMutex<HashMap<NaiveDate, Arc<Mutex<()>>>>>,
}

impl DayLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutex guarding sequence assignment for `day`. The same `NaiveDate`
    /// always yields the same mutex for the lifetime of this registry.
    pub fn for_day(&self, day: NaiveDate) -> Arc<Mutex<()>> {
        let mut registry = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Past days can no longer receive visits; drop their locks once a
        // newer day shows up so the registry stays bounded.
        registry.retain(|locked_day, lock| {
            *locked_day >= day || Arc::strong_count(lock) > 1
        });

        Arc::clone(registry.entry(day).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_day_yields_same_lock() {
        let locks = DayLocks::new();
        let day = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();

        let a = locks.for_day(day);
        let b = locks.for_day(day);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_days_yield_independent_locks() {
        let locks = DayLocks::new();
        let day = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();

        let a = locks.for_day(day);
        let b = locks.for_day(day.succ_opt().unwrap());
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn lock_serializes_critical_section() {
        let locks = DayLocks::new();
        let day = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let lock = locks.for_day(day);

        let guard = lock.lock().await;
        assert!(locks.for_day(day).try_lock().is_err());
        drop(guard);
        assert!(locks.for_day(day).try_lock().is_ok());
    }

    #[test]
    fn stale_unheld_locks_are_pruned() {
        let locks = DayLocks::new();
        let day = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();

        drop(locks.for_day(day));
        let _next = locks.for_day(day.succ_opt().unwrap());

        let registry = locks.inner.lock().unwrap();
        assert!(!registry.contains_key(&day));
    }
}
