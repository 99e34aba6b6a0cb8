use crate::compliance::{ComplianceSubject, SubjectKind, TrackedDate};
use crate::store::Record;
use crate::types::Collection;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An item in a building's asset register. Its compliance is driven by the
/// next service date alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub id: String,
    pub building_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_service_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_service_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    pub fn new(building_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            building_id: building_id.into(),
            name: name.into(),
            category: None,
            location: None,
            last_service_date: None,
            next_service_date: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a completed service and when the next one falls due.
    pub fn record_service(&mut self, serviced_on: NaiveDate, next_due: Option<NaiveDate>) {
        self.last_service_date = Some(serviced_on);
        self.next_service_date = next_due;
        self.updated_at = Utc::now();
    }
}

impl Record for Asset {
    const COLLECTION: Collection = Collection::Asset;

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

impl ComplianceSubject for Asset {
    fn kind(&self) -> SubjectKind {
        SubjectKind::Asset
    }

    fn subject_id(&self) -> &str {
        &self.id
    }

    fn subject_name(&self) -> &str {
        &self.name
    }

    fn tracked_dates(&self) -> Vec<TrackedDate> {
        let next_service = TrackedDate::new("next_service_date", self.next_service_date);
        vec![next_service]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComplianceStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn untracked_asset_is_unknown() {
        let asset = Asset::new("bldg-1", "Boiler");
        assert_eq!(
            asset.compliance_status(date(2025, 1, 1), 30),
            ComplianceStatus::Unknown
        );
    }

    #[test]
    fn overdue_service_is_non_compliant() {
        let mut asset = Asset::new("bldg-1", "Boiler");
        asset.record_service(date(2024, 1, 1), Some(date(2024, 12, 1)));
        assert_eq!(
            asset.compliance_status(date(2025, 1, 1), 30),
            ComplianceStatus::NonCompliant
        );
    }

    #[test]
    fn last_service_date_is_not_tracked() {
        let mut asset = Asset::new("bldg-1", "Fire pump");
        asset.record_service(date(2020, 1, 1), Some(date(2026, 1, 1)));
        assert_eq!(
            asset.compliance_status(date(2025, 1, 1), 30),
            ComplianceStatus::Compliant
        );
    }
}
