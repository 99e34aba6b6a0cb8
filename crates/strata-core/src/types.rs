use crate::error::StrataError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Named collections in the entity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    WorkOrder,
    MaintenanceSchedule,
    Asset,
    Contractor,
}

impl Collection {
    pub fn all() -> &'static [Collection] {
        &[
            Collection::WorkOrder,
            Collection::MaintenanceSchedule,
            Collection::Asset,
            Collection::Contractor,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::WorkOrder => "work_order",
            Collection::MaintenanceSchedule => "maintenance_schedule",
            Collection::Asset => "asset",
            Collection::Contractor => "contractor",
        }
    }

    /// Directory name under `.strata/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Collection::WorkOrder => "work-orders",
            Collection::MaintenanceSchedule => "schedules",
            Collection::Asset => "assets",
            Collection::Contractor => "contractors",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RecurrencePattern (work order side)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl RecurrencePattern {
    pub fn all() -> &'static [RecurrencePattern] {
        &[
            RecurrencePattern::Daily,
            RecurrencePattern::Weekly,
            RecurrencePattern::Monthly,
            RecurrencePattern::Quarterly,
            RecurrencePattern::Yearly,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Quarterly => "quarterly",
            RecurrencePattern::Yearly => "yearly",
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecurrencePattern {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(RecurrencePattern::Daily),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            "quarterly" => Ok(RecurrencePattern::Quarterly),
            "yearly" | "annually" => Ok(RecurrencePattern::Yearly),
            _ => Err(StrataError::InvalidRecurrence(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ScheduleRecurrence (maintenance schedule side)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleRecurrence {
    OneTime,
    Monthly,
    Quarterly,
    Yearly,
}

impl ScheduleRecurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleRecurrence::OneTime => "one_time",
            ScheduleRecurrence::Monthly => "monthly",
            ScheduleRecurrence::Quarterly => "quarterly",
            ScheduleRecurrence::Yearly => "yearly",
        }
    }
}

/// Schedules have no daily or weekly cadence; both collapse to a single
/// one-time entry.
impl From<RecurrencePattern> for ScheduleRecurrence {
    fn from(pattern: RecurrencePattern) -> Self {
        match pattern {
            RecurrencePattern::Daily | RecurrencePattern::Weekly => ScheduleRecurrence::OneTime,
            RecurrencePattern::Monthly => ScheduleRecurrence::Monthly,
            RecurrencePattern::Quarterly => ScheduleRecurrence::Quarterly,
            RecurrencePattern::Yearly => ScheduleRecurrence::Yearly,
        }
    }
}

impl fmt::Display for ScheduleRecurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScheduleRecurrence {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_time" | "one-time" | "once" => Ok(ScheduleRecurrence::OneTime),
            "monthly" => Ok(ScheduleRecurrence::Monthly),
            "quarterly" => Ok(ScheduleRecurrence::Quarterly),
            "yearly" | "annually" => Ok(ScheduleRecurrence::Yearly),
            _ => Err(StrataError::InvalidRecurrence(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ScheduleStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Active,
    Completed,
    Cancelled,
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScheduleStatus::Active => "active",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// WorkOrderStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkOrderStatus::Open => "open",
            WorkOrderStatus::InProgress => "in_progress",
            WorkOrderStatus::Completed => "completed",
            WorkOrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for WorkOrderStatus {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(WorkOrderStatus::Open),
            "in_progress" | "in-progress" => Ok(WorkOrderStatus::InProgress),
            "completed" => Ok(WorkOrderStatus::Completed),
            "cancelled" => Ok(WorkOrderStatus::Cancelled),
            _ => Err(StrataError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Priority {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(StrataError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ComplianceStatus
// ---------------------------------------------------------------------------

/// Derived expiry state of an asset or contractor. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Unknown,
    Compliant,
    ExpiringSoon,
    NonCompliant,
}

impl ComplianceStatus {
    pub fn all() -> &'static [ComplianceStatus] {
        &[
            ComplianceStatus::Compliant,
            ComplianceStatus::ExpiringSoon,
            ComplianceStatus::NonCompliant,
            ComplianceStatus::Unknown,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComplianceStatus::Unknown => "unknown",
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::ExpiringSoon => "expiring_soon",
            ComplianceStatus::NonCompliant => "non_compliant",
        }
    }

    /// Human-readable label: "expiring soon", "non-compliant".
    pub fn label(self) -> &'static str {
        match self {
            ComplianceStatus::Unknown => "unknown",
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::ExpiringSoon => "expiring soon",
            ComplianceStatus::NonCompliant => "non-compliant",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
