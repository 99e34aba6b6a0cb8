use crate::error::{Result, StrataError};
use crate::recurrence::{RecurrenceSynchronizer, SyncOutcome};
use crate::store::{EntityStore, Record};
use crate::types::{Collection, Priority, RecurrencePattern, WorkOrderStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WorkOrder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    #[serde(default)]
    pub id: String,
    pub building_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_contractor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub status: WorkOrderStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// Absent means the recurrence never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkOrder {
    pub fn new(building_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            building_id: building_id.into(),
            title: title.into(),
            description: None,
            due_date: None,
            assigned_contractor_id: None,
            assigned_to: None,
            status: WorkOrderStatus::Open,
            priority: Priority::default(),
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The effective pattern: `None` unless the work order is recurring.
    pub fn recurrence(&self) -> Option<RecurrencePattern> {
        if self.is_recurring {
            self.recurrence_pattern
        } else {
            None
        }
    }

    pub fn make_recurring(&mut self, pattern: RecurrencePattern, end: Option<NaiveDate>) {
        self.is_recurring = true;
        self.recurrence_pattern = Some(pattern);
        self.recurrence_end_date = end;
        self.updated_at = Utc::now();
    }

    pub fn clear_recurrence(&mut self) {
        self.is_recurring = false;
        self.recurrence_pattern = None;
        self.recurrence_end_date = None;
        self.updated_at = Utc::now();
    }

    pub fn start(&mut self) {
        self.status = WorkOrderStatus::InProgress;
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self) {
        self.status = WorkOrderStatus::Completed;
        self.updated_at = Utc::now();
    }

    pub fn cancel(&mut self) {
        self.status = WorkOrderStatus::Cancelled;
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(StrataError::InvalidWorkOrder("title is required".into()));
        }
        if self.building_id.trim().is_empty() {
            return Err(StrataError::InvalidWorkOrder("building is required".into()));
        }
        if self.is_recurring && self.recurrence_pattern.is_none() {
            return Err(StrataError::InvalidWorkOrder(
                "recurring work order needs a recurrence pattern".into(),
            ));
        }
        if let (Some(due), Some(end)) = (self.due_date, self.recurrence_end_date) {
            if end < due {
                return Err(StrataError::InvalidWorkOrder(format!(
                    "recurrence end {end} is before due date {due}"
                )));
            }
        }
        Ok(())
    }
}

impl Record for WorkOrder {
    const COLLECTION: Collection = Collection::WorkOrder;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ---------------------------------------------------------------------------
// Write path
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub work_order: WorkOrder,
    pub sync: SyncOutcome,
}

/// Persist a work order (create when its id is empty, update otherwise), then
/// reconcile its generated schedule. A failed reconcile is reported in the
/// outcome; it never fails the save.
pub fn save_work_order<S: EntityStore>(
    store: &S,
    sync: &RecurrenceSynchronizer,
    mut work_order: WorkOrder,
) -> Result<SaveOutcome> {
    work_order.validate()?;

    let saved = if work_order.id.is_empty() {
        store.create(work_order)?
    } else {
        work_order.updated_at = Utc::now();
        store.update(&work_order)?
    };

    let outcome = if saved.is_recurring {
        sync.sync(store, &saved.id, &saved)
    } else {
        sync.remove(store, &saved.id)
    };

    Ok(SaveOutcome {
        work_order: saved,
        sync: outcome,
    })
}

/// Delete a work order and any schedule generated from it.
pub fn delete_work_order<S: EntityStore>(
    store: &S,
    sync: &RecurrenceSynchronizer,
    id: &str,
) -> Result<SyncOutcome> {
    store.delete(Collection::WorkOrder, id)?;
    Ok(sync.remove(store, id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::MaintenanceSchedule;
    use crate::store::{Filter, FlakyStore, MemoryStore};
    use crate::types::ScheduleRecurrence;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn synchronizer() -> RecurrenceSynchronizer {
        RecurrenceSynchronizer::new().with_today(date(2025, 1, 1))
    }

    fn linked(store: &MemoryStore, id: &str) -> Vec<MaintenanceSchedule> {
        store
            .filter(&Filter::new().eq("work_order_id", id))
            .unwrap()
    }

    #[test]
    fn validate_rejects_blank_title() {
        let wo = WorkOrder::new("bldg-1", "  ");
        assert!(matches!(
            wo.validate(),
            Err(StrataError::InvalidWorkOrder(_))
        ));
    }

    #[test]
    fn validate_rejects_end_before_due() {
        let mut wo = WorkOrder::new("bldg-1", "Lift service");
        wo.due_date = Some(date(2025, 6, 1));
        wo.make_recurring(RecurrencePattern::Monthly, Some(date(2025, 1, 1)));
        assert!(wo.validate().is_err());
    }

    #[test]
    fn recurring_flag_without_pattern_is_invalid() {
        let mut wo = WorkOrder::new("bldg-1", "Lift service");
        wo.is_recurring = true;
        assert!(wo.validate().is_err());
    }

    #[test]
    fn create_recurring_work_order_generates_schedule() {
        let store = MemoryStore::new();
        let mut wo = WorkOrder::new("bldg-1", "Lift service");
        wo.make_recurring(RecurrencePattern::Quarterly, None);

        let outcome = save_work_order(&store, &synchronizer(), wo).unwrap();
        assert!(matches!(outcome.sync, SyncOutcome::Created { .. }));

        let schedules = linked(&store, &outcome.work_order.id);
        assert_eq!(schedules.len(), 1);
        assert_eq!(schedules[0].recurrence, ScheduleRecurrence::Quarterly);
        assert_eq!(outcome.sync.schedule_id(), Some(schedules[0].id.as_str()));
    }

    #[test]
    fn non_recurring_work_order_has_no_schedule() {
        let store = MemoryStore::new();
        let wo = WorkOrder::new("bldg-1", "Replace lobby bulb");

        let outcome = save_work_order(&store, &synchronizer(), wo).unwrap();
        assert_eq!(outcome.sync, SyncOutcome::Unchanged);
        assert_eq!(store.count(Collection::MaintenanceSchedule), 0);
    }

    #[test]
    fn unflagging_on_edit_removes_schedule() {
        let store = MemoryStore::new();
        let sync = synchronizer();
        let mut wo = WorkOrder::new("bldg-1", "Gutter clean");
        wo.make_recurring(RecurrencePattern::Yearly, None);
        let mut saved = save_work_order(&store, &sync, wo).unwrap().work_order;

        saved.clear_recurrence();
        let outcome = save_work_order(&store, &sync, saved.clone()).unwrap();
        assert_eq!(outcome.sync, SyncOutcome::Deleted { count: 1 });
        assert!(linked(&store, &saved.id).is_empty());
    }

    #[test]
    fn updating_unknown_work_order_fails() {
        let store = MemoryStore::new();
        let mut wo = WorkOrder::new("bldg-1", "Ghost");
        wo.id = "missing".to_string();
        let err = save_work_order(&store, &synchronizer(), wo).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_removes_generated_schedule() {
        let store = MemoryStore::new();
        let sync = synchronizer();
        let mut wo = WorkOrder::new("bldg-1", "Pump inspection");
        wo.make_recurring(RecurrencePattern::Monthly, None);
        let saved = save_work_order(&store, &sync, wo).unwrap().work_order;

        let outcome = delete_work_order(&store, &sync, &saved.id).unwrap();
        assert_eq!(outcome, SyncOutcome::Deleted { count: 1 });
        assert_eq!(store.count(Collection::WorkOrder), 0);
        assert_eq!(store.count(Collection::MaintenanceSchedule), 0);
    }

    #[test]
    fn failed_schedule_sync_keeps_the_saved_work_order() {
        let store = FlakyStore::failing_writes();
        let sync = synchronizer();
        let mut wo = WorkOrder::new("bldg-1", "Fire panel test");
        wo.make_recurring(RecurrencePattern::Quarterly, None);

        let outcome = save_work_order(&store, &sync, wo).unwrap();
        assert!(outcome.sync.is_failed());
        assert_eq!(store.inner.count(Collection::WorkOrder), 1);
        assert_eq!(store.inner.count(Collection::MaintenanceSchedule), 0);

        let persisted: WorkOrder = store.get(&outcome.work_order.id).unwrap();
        assert_eq!(persisted.title, "Fire panel test");
        assert!(persisted.is_recurring);
    }

    #[test]
    fn failed_schedule_removal_keeps_the_update() {
        let store = FlakyStore::failing_writes();
        let sync = synchronizer();
        let mut wo = WorkOrder::new("bldg-1", "Roof inspection");
        wo.make_recurring(RecurrencePattern::Yearly, None);
        let mut saved = store.inner.create(wo).unwrap();
        let mut generated = MaintenanceSchedule::new(
            "bldg-1",
            "Roof inspection",
            date(2025, 1, 1),
            ScheduleRecurrence::Yearly,
        );
        generated.work_order_id = Some(saved.id.clone());
        store.inner.create(generated).unwrap();

        saved.clear_recurrence();
        let outcome = save_work_order(&store, &sync, saved.clone()).unwrap();
        assert!(outcome.sync.is_failed());

        let persisted: WorkOrder = store.get(&saved.id).unwrap();
        assert!(!persisted.is_recurring);
        assert_eq!(store.inner.count(Collection::MaintenanceSchedule), 1);
    }
}
