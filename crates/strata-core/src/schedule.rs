use crate::store::Record;
use crate::types::{Collection, ScheduleRecurrence, ScheduleStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MaintenanceSchedule
// ---------------------------------------------------------------------------

/// A recurring maintenance event. Schedules carrying a `work_order_id` are
/// generated from that work order and owned by the recurrence synchronizer;
/// schedules without one are entered by hand and never touched by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceSchedule {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_order_id: Option<String>,
    pub building_id: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub event_start: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_end: Option<NaiveDate>,
    pub recurrence: ScheduleRecurrence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contractor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub never_expire: bool,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceSchedule {
    /// A manual, open-ended schedule.
    pub fn new(
        building_id: impl Into<String>,
        subject: impl Into<String>,
        event_start: NaiveDate,
        recurrence: ScheduleRecurrence,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            work_order_id: None,
            building_id: building_id.into(),
            subject: subject.into(),
            description: None,
            event_start,
            event_end: None,
            recurrence,
            contractor_id: None,
            assigned_to: None,
            never_expire: true,
            status: ScheduleStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_generated(&self) -> bool {
        self.work_order_id.is_some()
    }

    /// Set or clear the end date; `never_expire` follows its absence.
    pub fn set_end(&mut self, end: Option<NaiveDate>) {
        self.event_end = end;
        self.never_expire = end.is_none();
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self) {
        self.status = ScheduleStatus::Completed;
        self.updated_at = Utc::now();
    }

    pub fn cancel(&mut self) {
        self.status = ScheduleStatus::Cancelled;
        self.updated_at = Utc::now();
    }
}

impl Record for MaintenanceSchedule {
    const COLLECTION: Collection = Collection::MaintenanceSchedule;

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
// Tests
// ---------------------------------------------------------------------------
