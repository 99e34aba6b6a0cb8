use crate::compliance::{ComplianceSubject, SubjectKind, TrackedDate};
use crate::store::Record;
use crate::types::Collection;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contractor {
    #[serde(default)]
    pub id: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_expiry: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_expiry: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers_comp_expiry: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_liability_expiry: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contractor {
    pub fn new(company_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            company_name: company_name.into(),
            contact_name: None,
            email: None,
            phone: None,
            trade: None,
            license_number: None,
            license_expiry: None,
            insurance_expiry: None,
            workers_comp_expiry: None,
            public_liability_expiry: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Contractor {
    const COLLECTION: Collection = Collection::Contractor;

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

impl ComplianceSubject for Contractor {
    fn kind(&self) -> SubjectKind {
        SubjectKind::Contractor
    }

    fn subject_id(&self) -> &str {
        &self.id
    }

    fn subject_name(&self) -> &str {
        &self.company_name
    }

    fn tracked_dates(&self) -> Vec<TrackedDate> {
        vec![
            TrackedDate::new("license_expiry", self.license_expiry),
            TrackedDate::new("insurance_expiry", self.insurance_expiry),
            TrackedDate::new("workers_comp_expiry", self.workers_comp_expiry),
            TrackedDate::new("public_liability_expiry", self.public_liability_expiry),
        ]
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
    fn expired_insurance_outweighs_valid_license() {
        let mut c = Contractor::new("Apex Electrical");
        c.license_expiry = Some(date(2030, 1, 1));
        c.insurance_expiry = Some(date(2024, 1, 1));
        assert_eq!(
            c.compliance_status(date(2025, 1, 1), 30),
            ComplianceStatus::NonCompliant
        );
        assert_eq!(
            c.attention_fields(date(2025, 1, 1), 30),
            vec!["insurance_expiry"]
        );
    }

    #[test]
    fn partially_tracked_contractor_uses_present_dates() {
        let mut c = Contractor::new("Harbour Plumbing");
        c.public_liability_expiry = Some(date(2025, 1, 20));
        assert_eq!(
            c.compliance_status(date(2025, 1, 1), 30),
            ComplianceStatus::ExpiringSoon
        );
    }

    #[test]
    fn contractor_without_dates_is_unknown() {
        let c = Contractor::new("New Co");
        assert_eq!(
            c.compliance_status(date(2025, 1, 1), 30),
            ComplianceStatus::Unknown
        );
    }
}
