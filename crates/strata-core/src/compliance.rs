use crate::types::ComplianceStatus;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::fmt;

pub const DEFAULT_SOON_WINDOW_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Last day (inclusive) of the soon window starting at `now`. A negative
/// window is treated as zero.
fn window_end(now: NaiveDate, soon_window_days: i64) -> NaiveDate {
    let days = u64::try_from(soon_window_days.max(0)).unwrap_or(0);
    now.checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}

/// Derive a compliance status from every tracked expiry date of one subject.
///
/// Absent dates are untracked and ignored. With nothing tracked the result is
/// `Unknown`. Otherwise any date before `now` makes the subject
/// `NonCompliant`, else any date within `[now, now + soon_window_days]` makes
/// it `ExpiringSoon`, else it is `Compliant`.
pub fn classify(
    dates: &[Option<NaiveDate>],
    now: NaiveDate,
    soon_window_days: i64,
) -> ComplianceStatus {
    let tracked: Vec<NaiveDate> = dates.iter().flatten().copied().collect();
    if tracked.is_empty() {
        return ComplianceStatus::Unknown;
    }
    if tracked.iter().any(|d| *d < now) {
        return ComplianceStatus::NonCompliant;
    }
    let end = window_end(now, soon_window_days);
    if tracked.iter().any(|d| *d <= end) {
        return ComplianceStatus::ExpiringSoon;
    }
    ComplianceStatus::Compliant
}

// ---------------------------------------------------------------------------
// ComplianceSubject
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Asset,
    Contractor,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectKind::Asset => f.write_str("asset"),
            SubjectKind::Contractor => f.write_str("contractor"),
        }
    }
}

/// One named expiry field of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedDate {
    pub field: &'static str,
    pub date: Option<NaiveDate>,
}

impl TrackedDate {
    pub fn new(field: &'static str, date: Option<NaiveDate>) -> Self {
        Self { field, date }
    }
}

pub trait ComplianceSubject {
    fn kind(&self) -> SubjectKind;
    fn subject_id(&self) -> &str;
    fn subject_name(&self) -> &str;
    fn tracked_dates(&self) -> Vec<TrackedDate>;

    fn expiry_dates(&self) -> Vec<Option<NaiveDate>> {
        self.tracked_dates().iter().map(|t| t.date).collect()
    }

    fn compliance_status(&self, now: NaiveDate, soon_window_days: i64) -> ComplianceStatus {
        classify(&self.expiry_dates(), now, soon_window_days)
    }

    /// Earliest tracked date, expired or not.
    fn next_expiry(&self) -> Option<NaiveDate> {
        self.tracked_dates().iter().filter_map(|t| t.date).min()
    }

    /// Fields that are expired or fall inside the soon window.
    fn attention_fields(&self, now: NaiveDate, soon_window_days: i64) -> Vec<&'static str> {
        let end = window_end(now, soon_window_days);
        self.tracked_dates()
            .into_iter()
            .filter(|t| t.date.is_some_and(|d| d <= end))
            .map(|t| t.field)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ComplianceReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceRow {
    pub kind: SubjectKind,
    pub id: String,
    pub name: String,
    pub status: ComplianceStatus,
    pub next_expiry: Option<NaiveDate>,
    pub attention: Vec<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComplianceCounts {
    pub compliant: usize,
    pub expiring_soon: usize,
    pub non_compliant: usize,
    pub unknown: usize,
}

impl ComplianceCounts {
    fn record(&mut self, status: ComplianceStatus) {
        match status {
            ComplianceStatus::Compliant => self.compliant += 1,
            ComplianceStatus::ExpiringSoon => self.expiring_soon += 1,
            ComplianceStatus::NonCompliant => self.non_compliant += 1,
            ComplianceStatus::Unknown => self.unknown += 1,
        }
    }

    pub fn get(&self, status: ComplianceStatus) -> usize {
        match status {
            ComplianceStatus::Compliant => self.compliant,
            ComplianceStatus::ExpiringSoon => self.expiring_soon,
            ComplianceStatus::NonCompliant => self.non_compliant,
            ComplianceStatus::Unknown => self.unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub as_of: NaiveDate,
    pub soon_window_days: i64,
    pub rows: Vec<ComplianceRow>,
    pub counts: ComplianceCounts,
}

impl ComplianceReport {
    pub fn build<'a, I>(subjects: I, now: NaiveDate, soon_window_days: i64) -> Self
    where
        I: IntoIterator<Item = &'a dyn ComplianceSubject>,
    {
        let mut counts = ComplianceCounts::default();
        let rows: Vec<ComplianceRow> = subjects
            .into_iter()
            .map(|s| {
                let status = s.compliance_status(now, soon_window_days);
                counts.record(status);
                ComplianceRow {
                    kind: s.kind(),
                    id: s.subject_id().to_string(),
                    name: s.subject_name().to_string(),
                    status,
                    next_expiry: s.next_expiry(),
                    attention: s.attention_fields(now, soon_window_days),
                }
            })
            .collect();

        Self {
            as_of: now,
            soon_window_days,
            rows,
            counts,
        }
    }

    /// "2 compliant, 1 expiring soon, 1 non-compliant, 0 unknown"
    pub fn summary(&self) -> String {
        ComplianceStatus::all()
            .iter()
            .map(|s| format!("{} {}", self.counts.get(*s), s.label()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Rows that need action: non-compliant or expiring soon.
    pub fn needing_attention(&self) -> impl Iterator<Item = &ComplianceRow> {
        self.rows.iter().filter(|r| {
            matches!(
                r.status,
                ComplianceStatus::NonCompliant | ComplianceStatus::ExpiringSoon
            )
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> NaiveDate {
        date(2025, 1, 1)
    }

    struct Subject(Vec<Option<NaiveDate>>);

    impl ComplianceSubject for Subject {
        fn kind(&self) -> SubjectKind {
            SubjectKind::Contractor
        }
        fn subject_id(&self) -> &str {
            "s1"
        }
        fn subject_name(&self) -> &str {
            "Subject"
        }
        fn tracked_dates(&self) -> Vec<TrackedDate> {
            const FIELDS: [&str; 3] = ["license_expiry", "insurance_expiry", "other_expiry"];
            self.0
                .iter()
                .zip(FIELDS)
                .map(|(d, f)| TrackedDate::new(f, *d))
                .collect()
        }
    }

    #[test]
    fn empty_and_all_absent_are_unknown() {
        assert_eq!(classify(&[], now(), 30), ComplianceStatus::Unknown);
        assert_eq!(
            classify(&[None, None], now(), 30),
            ComplianceStatus::Unknown
        );
    }

    #[test]
    fn expired_date_wins_over_distant_future() {
        let dates = [Some(date(2024, 1, 1)), Some(date(2030, 1, 1))];
        assert_eq!(classify(&dates, now(), 30), ComplianceStatus::NonCompliant);
    }

    #[test]
    fn expired_wins_over_expiring_soon_regardless_of_order() {
        let dates = [Some(date(2025, 1, 10)), None, Some(date(2024, 12, 31))];
        assert_eq!(classify(&dates, now(), 30), ComplianceStatus::NonCompliant);
    }

    #[test]
    fn date_inside_window_is_expiring_soon() {
        let dates = [Some(date(2025, 1, 20))];
        assert_eq!(classify(&dates, now(), 30), ComplianceStatus::ExpiringSoon);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        assert_eq!(
            classify(&[Some(now())], now(), 30),
            ComplianceStatus::ExpiringSoon
        );
        assert_eq!(
            classify(&[Some(date(2025, 1, 31))], now(), 30),
            ComplianceStatus::ExpiringSoon
        );
        assert_eq!(
            classify(&[Some(date(2025, 2, 1))], now(), 30),
            ComplianceStatus::Compliant
        );
    }

    #[test]
    fn all_beyond_window_is_compliant() {
        let dates = [Some(date(2025, 6, 1)), None, Some(date(2026, 1, 1))];
        assert_eq!(classify(&dates, now(), 30), ComplianceStatus::Compliant);
    }

    #[test]
    fn custom_and_negative_windows() {
        let dates = [Some(date(2025, 1, 20))];
        assert_eq!(classify(&dates, now(), 7), ComplianceStatus::Compliant);
        assert_eq!(classify(&dates, now(), -5), ComplianceStatus::Compliant);
        assert_eq!(
            classify(&[Some(now())], now(), -5),
            ComplianceStatus::ExpiringSoon
        );
    }

    #[test]
    fn one_expiring_field_taints_the_subject() {
        for soon in 0..=30 {
            let d = now().checked_add_days(Days::new(soon)).unwrap();
            let dates = [Some(date(2027, 1, 1)), Some(d), Some(date(2028, 1, 1))];
            assert_eq!(
                classify(&dates, now(), 30),
                ComplianceStatus::ExpiringSoon,
                "{d}"
            );
        }
    }

    #[test]
    fn attention_fields_name_the_culprits() {
        let s = Subject(vec![
            Some(date(2024, 12, 1)),
            Some(date(2025, 1, 15)),
            Some(date(2026, 1, 1)),
        ]);
        assert_eq!(
            s.attention_fields(now(), 30),
            vec!["license_expiry", "insurance_expiry"]
        );
        assert_eq!(s.next_expiry(), Some(date(2024, 12, 1)));
    }

    #[test]
    fn report_counts_and_summary() {
        let subjects = [
            Subject(vec![Some(date(2026, 1, 1))]),
            Subject(vec![Some(date(2026, 1, 1)), Some(date(2027, 1, 1))]),
            Subject(vec![Some(date(2025, 1, 5))]),
            Subject(vec![Some(date(2024, 1, 5))]),
            Subject(vec![None]),
        ];
        let report = ComplianceReport::build(
            subjects.iter().map(|s| s as &dyn ComplianceSubject),
            now(),
            30,
        );
        assert_eq!(report.rows.len(), 5);
        assert_eq!(
            report.summary(),
            "2 compliant, 1 expiring soon, 1 non-compliant, 1 unknown"
        );
        assert_eq!(report.needing_attention().count(), 2);
    }
}
