//! Keeps each recurring work order paired with exactly one generated
//! maintenance schedule.
//!
//! Every call re-reads the link from the store (`work_order_id == id`) right
//! before acting, so `sync` and `remove` are idempotent. Store failures are
//! logged and returned as [`SyncOutcome::Failed`]; the work order that
//! triggered the call has already been persisted and stays saved.

use crate::config::SyncConfig;
use crate::error::StrataError;
use crate::schedule::MaintenanceSchedule;
use crate::store::{EntityStore, Filter};
use crate::types::{Collection, RecurrencePattern, ScheduleRecurrence, ScheduleStatus};
use crate::work_order::WorkOrder;
use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// SyncOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncOutcome {
    Created { schedule_id: String },
    Updated { schedule_id: String },
    Deleted { count: usize },
    Unchanged,
    Failed { reason: String },
}

impl SyncOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncOutcome::Failed { .. })
    }

    pub fn schedule_id(&self) -> Option<&str> {
        match self {
            SyncOutcome::Created { schedule_id } | SyncOutcome::Updated { schedule_id } => {
                Some(schedule_id)
            }
            _ => None,
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Created { schedule_id } => write!(f, "created schedule {schedule_id}"),
            SyncOutcome::Updated { schedule_id } => write!(f, "updated schedule {schedule_id}"),
            SyncOutcome::Deleted { count: 1 } => f.write_str("deleted linked schedule"),
            SyncOutcome::Deleted { count } => write!(f, "deleted {count} linked schedules"),
            SyncOutcome::Unchanged => f.write_str("no schedule change"),
            SyncOutcome::Failed { reason } => write!(f, "schedule sync failed: {reason}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Field mapping
// ---------------------------------------------------------------------------

fn linked_filter(work_order_id: &str) -> Filter {
    Filter::new().eq("work_order_id", work_order_id)
}

/// Overwrite every work-order-derived field of `schedule`. Status is reset
/// to active; `work_order_id`, `id` and `created_at` are left alone.
pub fn apply_work_order(
    schedule: &mut MaintenanceSchedule,
    work_order: &WorkOrder,
    pattern: RecurrencePattern,
    today: NaiveDate,
) {
    schedule.building_id = work_order.building_id.clone();
    schedule.subject = work_order.title.clone();
    schedule.description = work_order.description.clone();
    schedule.event_start = work_order.due_date.unwrap_or(today);
    schedule.event_end = work_order.recurrence_end_date;
    schedule.never_expire = work_order.recurrence_end_date.is_none();
    schedule.recurrence = ScheduleRecurrence::from(pattern);
    schedule.contractor_id = work_order.assigned_contractor_id.clone();
    schedule.assigned_to = work_order.assigned_to.clone();
    schedule.status = ScheduleStatus::Active;
}

/// A fresh schedule generated from `work_order`.
pub fn project_schedule(
    work_order_id: &str,
    work_order: &WorkOrder,
    pattern: RecurrencePattern,
    today: NaiveDate,
) -> MaintenanceSchedule {
    let mut schedule = MaintenanceSchedule::new(
        work_order.building_id.clone(),
        work_order.title.clone(),
        today,
        ScheduleRecurrence::from(pattern),
    );
    schedule.work_order_id = Some(work_order_id.to_string());
    apply_work_order(&mut schedule, work_order, pattern, today);
    schedule
}

// ---------------------------------------------------------------------------
// Per-work-order locks
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(map.entry(key.to_string()).or_default())
        };
        let result = {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            f()
        };
        drop(lock);

        // Only the map holds it now: nobody is waiting on this key.
        let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if map.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            map.remove(key);
        }
        result
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

// ---------------------------------------------------------------------------
// RecurrenceSynchronizer
// ---------------------------------------------------------------------------

/// Reconciles generated schedules against work orders.
///
/// Calls for the same work-order id are serialized through an in-process
/// lock, so two saves sharing one synchronizer cannot both observe "no
/// schedule" and create two. Writers in other processes can still race.
#[derive(Debug)]
pub struct RecurrenceSynchronizer {
    enabled: bool,
    today: Option<NaiveDate>,
    locks: KeyedLocks,
}

impl Default for RecurrenceSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecurrenceSynchronizer {
    pub fn new() -> Self {
        Self {
            enabled: true,
            today: None,
            locks: KeyedLocks::default(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::new()
        }
    }

    /// Pin the date used as `event_start` for work orders without a due date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Bring the linked schedule in line with `work_order`: create it, update
    /// it in place, or delete it when the work order is no longer recurring.
    pub fn sync<S: EntityStore>(
        &self,
        store: &S,
        work_order_id: &str,
        work_order: &WorkOrder,
    ) -> SyncOutcome {
        if !self.enabled {
            tracing::debug!(work_order_id, "schedule sync disabled");
            return SyncOutcome::Unchanged;
        }
        self.locks.with_lock(work_order_id, || {
            if !work_order.is_recurring {
                return self.remove_linked(store, work_order_id);
            }
            match work_order.recurrence_pattern {
                Some(pattern) => self.upsert_linked(store, work_order_id, work_order, pattern),
                None => failed(
                    work_order_id,
                    "recurring work order has no recurrence pattern".to_string(),
                ),
            }
        })
    }

    /// Delete the schedule generated from `work_order_id`, if any.
    pub fn remove<S: EntityStore>(&self, store: &S, work_order_id: &str) -> SyncOutcome {
        if !self.enabled {
            tracing::debug!(work_order_id, "schedule sync disabled");
            return SyncOutcome::Unchanged;
        }
        self.locks
            .with_lock(work_order_id, || self.remove_linked(store, work_order_id))
    }

    fn upsert_linked<S: EntityStore>(
        &self,
        store: &S,
        work_order_id: &str,
        work_order: &WorkOrder,
        pattern: RecurrencePattern,
    ) -> SyncOutcome {
        let existing = match store.filter::<MaintenanceSchedule>(&linked_filter(work_order_id)) {
            Ok(found) => found,
            Err(e) => return store_failed(work_order_id, "lookup", &e),
        };
        if existing.len() > 1 {
            tracing::warn!(
                work_order_id,
                count = existing.len(),
                "work order has more than one linked schedule; updating the oldest"
            );
        }

        let today = self.today();
        match existing.into_iter().next() {
            Some(mut schedule) => {
                apply_work_order(&mut schedule, work_order, pattern, today);
                schedule.updated_at = Utc::now();
                match store.update(&schedule) {
                    Ok(updated) => {
                        tracing::debug!(work_order_id, schedule_id = %updated.id, "schedule updated");
                        SyncOutcome::Updated {
                            schedule_id: updated.id,
                        }
                    }
                    Err(e) => store_failed(work_order_id, "update", &e),
                }
            }
            None => {
                let schedule = project_schedule(work_order_id, work_order, pattern, today);
                match store.create(schedule) {
                    Ok(created) => {
                        tracing::debug!(work_order_id, schedule_id = %created.id, "schedule created");
                        SyncOutcome::Created {
                            schedule_id: created.id,
                        }
                    }
                    Err(e) => store_failed(work_order_id, "create", &e),
                }
            }
        }
    }

    fn remove_linked<S: EntityStore>(&self, store: &S, work_order_id: &str) -> SyncOutcome {
        let existing = match store.filter::<MaintenanceSchedule>(&linked_filter(work_order_id)) {
            Ok(found) => found,
            Err(e) => return store_failed(work_order_id, "lookup", &e),
        };
        if existing.is_empty() {
            return SyncOutcome::Unchanged;
        }

        let mut count = 0;
        for schedule in &existing {
            match store.delete(Collection::MaintenanceSchedule, &schedule.id) {
                Ok(()) => count += 1,
                // Already gone: the link no longer exists, which is the goal.
                Err(e) if e.is_not_found() => {}
                Err(e) => return store_failed(work_order_id, "delete", &e),
            }
        }
        tracing::debug!(work_order_id, count, "linked schedules deleted");
        if count == 0 {
            SyncOutcome::Unchanged
        } else {
            SyncOutcome::Deleted { count }
        }
    }
}

fn store_failed(work_order_id: &str, op: &str, err: &StrataError) -> SyncOutcome {
    failed(work_order_id, format!("schedule {op} failed: {err}"))
}

fn failed(work_order_id: &str, reason: String) -> SyncOutcome {
    tracing::warn!(work_order_id, %reason, "schedule sync failed");
    SyncOutcome::Failed { reason }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FlakyStore, MemoryStore};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn synchronizer() -> RecurrenceSynchronizer {
        RecurrenceSynchronizer::new().with_today(date(2025, 2, 10))
    }

    fn recurring(pattern: RecurrencePattern, end: Option<NaiveDate>) -> WorkOrder {
        let mut wo = WorkOrder::new("bldg-7", "Lift service");
        wo.id = "wo-1".to_string();
        wo.description = Some("Annual lift certification".to_string());
        wo.assigned_contractor_id = Some("ctr-3".to_string());
        wo.assigned_to = Some("Sam".to_string());
        wo.make_recurring(pattern, end);
        wo
    }

    fn linked(store: &MemoryStore, id: &str) -> Vec<MaintenanceSchedule> {
        store.filter(&linked_filter(id)).unwrap()
    }

    #[test]
    fn monthly_without_end_never_expires() {
        let store = MemoryStore::new();
        let wo = recurring(RecurrencePattern::Monthly, None);

        let outcome = synchronizer().sync(&store, "wo-1", &wo);
        assert!(matches!(outcome, SyncOutcome::Created { .. }));

        let s = &linked(&store, "wo-1")[0];
        assert_eq!(s.recurrence, ScheduleRecurrence::Monthly);
        assert!(s.never_expire);
        assert_eq!(s.event_end, None);
    }

    #[test]
    fn weekly_with_end_collapses_to_one_time() {
        let store = MemoryStore::new();
        let wo = recurring(RecurrencePattern::Weekly, Some(date(2025, 12, 31)));

        synchronizer().sync(&store, "wo-1", &wo);

        let s = &linked(&store, "wo-1")[0];
        assert_eq!(s.recurrence, ScheduleRecurrence::OneTime);
        assert!(!s.never_expire);
        assert_eq!(s.event_end, Some(date(2025, 12, 31)));
    }

    #[test]
    fn field_mapping_copies_work_order() {
        let store = MemoryStore::new();
        let mut wo = recurring(RecurrencePattern::Yearly, None);
        wo.due_date = Some(date(2025, 4, 1));

        synchronizer().sync(&store, "wo-1", &wo);

        let s = &linked(&store, "wo-1")[0];
        assert_eq!(s.subject, "Lift service");
        assert_eq!(s.description.as_deref(), Some("Annual lift certification"));
        assert_eq!(s.building_id, "bldg-7");
        assert_eq!(s.event_start, date(2025, 4, 1));
        assert_eq!(s.contractor_id.as_deref(), Some("ctr-3"));
        assert_eq!(s.assigned_to.as_deref(), Some("Sam"));
        assert_eq!(s.work_order_id.as_deref(), Some("wo-1"));
        assert_eq!(s.status, ScheduleStatus::Active);
    }

    #[test]
    fn missing_due_date_starts_today() {
        let store = MemoryStore::new();
        let wo = recurring(RecurrencePattern::Quarterly, None);
        synchronizer().sync(&store, "wo-1", &wo);
        assert_eq!(linked(&store, "wo-1")[0].event_start, date(2025, 2, 10));
    }

    #[test]
    fn sync_is_idempotent() {
        let store = MemoryStore::new();
        let sync = synchronizer();
        let wo = recurring(RecurrencePattern::Monthly, None);

        let first = sync.sync(&store, "wo-1", &wo);
        let second = sync.sync(&store, "wo-1", &wo);

        let schedules = linked(&store, "wo-1");
        assert_eq!(schedules.len(), 1);
        assert_eq!(first.schedule_id(), second.schedule_id());
        assert!(matches!(second, SyncOutcome::Updated { .. }));

        let mut expected = project_schedule("wo-1", &wo, RecurrencePattern::Monthly, sync.today());
        expected.id = schedules[0].id.clone();
        expected.created_at = schedules[0].created_at;
        expected.updated_at = schedules[0].updated_at;
        assert_eq!(schedules[0], expected);
    }

    #[test]
    fn update_overwrites_completed_status() {
        let store = MemoryStore::new();
        let sync = synchronizer();
        let mut wo = recurring(RecurrencePattern::Monthly, None);
        sync.sync(&store, "wo-1", &wo);

        let mut s = linked(&store, "wo-1").remove(0);
        s.complete();
        store.update(&s).unwrap();

        wo.title = "Lift service (renamed)".to_string();
        sync.sync(&store, "wo-1", &wo);

        let s = &linked(&store, "wo-1")[0];
        assert_eq!(s.status, ScheduleStatus::Active);
        assert_eq!(s.subject, "Lift service (renamed)");
    }

    #[test]
    fn toggling_recurrence_never_leaves_two_schedules() {
        let store = MemoryStore::new();
        let sync = synchronizer();
        let mut wo = recurring(RecurrencePattern::Monthly, None);

        sync.sync(&store, "wo-1", &wo);
        assert_eq!(linked(&store, "wo-1").len(), 1);

        wo.clear_recurrence();
        assert_eq!(
            sync.sync(&store, "wo-1", &wo),
            SyncOutcome::Deleted { count: 1 }
        );
        assert_eq!(linked(&store, "wo-1").len(), 0);

        wo.make_recurring(RecurrencePattern::Monthly, None);
        sync.sync(&store, "wo-1", &wo);
        assert_eq!(linked(&store, "wo-1").len(), 1);
    }

    #[test]
    fn remove_without_link_is_noop() {
        let store = MemoryStore::new();
        assert_eq!(
            synchronizer().remove(&store, "wo-404"),
            SyncOutcome::Unchanged
        );
    }

    #[test]
    fn manual_schedules_are_untouched() {
        let store = MemoryStore::new();
        store
            .create(MaintenanceSchedule::new(
                "bldg-7",
                "Fire panel test",
                date(2025, 1, 1),
                ScheduleRecurrence::Yearly,
            ))
            .unwrap();

        let sync = synchronizer();
        let wo = recurring(RecurrencePattern::Monthly, None);
        sync.sync(&store, "wo-1", &wo);
        sync.remove(&store, "wo-1");

        let all: Vec<MaintenanceSchedule> = store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].subject, "Fire panel test");
    }

    #[test]
    fn remove_deletes_every_duplicate_link() {
        let store = MemoryStore::new();
        let wo = recurring(RecurrencePattern::Monthly, None);
        let today = date(2025, 2, 10);
        for _ in 0..2 {
            let duplicate = project_schedule("wo-1", &wo, RecurrencePattern::Monthly, today);
            store.create(duplicate).unwrap();
        }

        assert_eq!(
            synchronizer().remove(&store, "wo-1"),
            SyncOutcome::Deleted { count: 2 }
        );
    }

    #[test]
    fn failed_create_is_reported_not_raised() {
        let store = FlakyStore::failing_writes();
        let wo = recurring(RecurrencePattern::Monthly, None);

        let outcome = synchronizer().sync(&store, "wo-1", &wo);
        assert!(outcome.is_failed());
        assert!(outcome.to_string().contains("schedule create failed"));
        assert!(outcome.to_string().contains("backend offline"));
    }

    #[test]
    fn failed_update_is_reported() {
        let store = FlakyStore::failing_writes();
        let wo = recurring(RecurrencePattern::Monthly, None);
        let s = project_schedule("wo-1", &wo, RecurrencePattern::Monthly, date(2025, 1, 1));
        let existing = store.inner.create(s).unwrap();

        let changed = recurring(RecurrencePattern::Yearly, None);
        let outcome = synchronizer().sync(&store, "wo-1", &changed);
        assert!(outcome.to_string().contains("schedule update failed"));

        let kept: MaintenanceSchedule = store.inner.get(&existing.id).unwrap();
        assert_eq!(kept.recurrence, ScheduleRecurrence::Monthly);
    }

    #[test]
    fn failed_delete_is_reported() {
        let store = FlakyStore::failing_writes();
        let wo = recurring(RecurrencePattern::Monthly, None);
        let s = project_schedule("wo-1", &wo, RecurrencePattern::Monthly, date(2025, 1, 1));
        store.inner.create(s).unwrap();

        let outcome = synchronizer().remove(&store, "wo-1");
        assert!(outcome.to_string().contains("schedule delete failed"));
        assert_eq!(store.inner.count(Collection::MaintenanceSchedule), 1);
    }

    #[test]
    fn failed_lookup_is_reported_by_sync_and_remove() {
        let store = FlakyStore::failing_reads();
        let wo = recurring(RecurrencePattern::Quarterly, None);

        let outcome = synchronizer().sync(&store, "wo-1", &wo);
        assert!(outcome.to_string().contains("schedule lookup failed"));

        let outcome = synchronizer().remove(&store, "wo-1");
        assert!(outcome.to_string().contains("schedule lookup failed"));
        assert_eq!(store.inner.count(Collection::MaintenanceSchedule), 0);
    }

    #[test]
    fn disabled_synchronizer_does_nothing() {
        let store = MemoryStore::new();
        let sync = RecurrenceSynchronizer::from_config(&SyncConfig { enabled: false });
        let wo = recurring(RecurrencePattern::Monthly, None);

        assert_eq!(sync.sync(&store, "wo-1", &wo), SyncOutcome::Unchanged);
        assert_eq!(store.count(Collection::MaintenanceSchedule), 0);
    }

    #[test]
    fn concurrent_syncs_create_one_schedule() {
        let store = MemoryStore::new();
        let sync = synchronizer();
        let wo = recurring(RecurrencePattern::Monthly, None);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| sync.sync(&store, "wo-1", &wo));
            }
        });

        assert_eq!(linked(&store, "wo-1").len(), 1);
        assert_eq!(sync.locks.len(), 0);
    }
}
