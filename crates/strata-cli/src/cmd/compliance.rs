use crate::output::{date_cell, print_json, print_table};
use anyhow::Context;
use chrono::NaiveDate;
use std::path::Path;
use strata_core::{
    asset::Asset,
    compliance::{ComplianceReport, ComplianceSubject},
    contractor::Contractor,
    store::EntityStore,
};

pub fn run(
    root: &Path,
    at: Option<NaiveDate>,
    window: Option<i64>,
    attention_only: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (store, config) = super::open(root)?;
    let assets: Vec<Asset> = store.list().context("failed to list assets")?;
    let contractors: Vec<Contractor> = store.list().context("failed to list contractors")?;

    let now = at.unwrap_or_else(super::today);
    let window = window.unwrap_or(config.compliance.soon_window_days);

    let subjects = assets
        .iter()
        .map(|a| a as &dyn ComplianceSubject)
        .chain(contractors.iter().map(|c| c as &dyn ComplianceSubject));
    let mut report = ComplianceReport::build(subjects, now, window);
    if attention_only {
        report.rows = report.needing_attention().cloned().collect();
    }

    if json {
        return print_json(&report);
    }

    println!("Compliance as of {now} (soon window: {window} days)");
    println!("{}\n", report.summary());
    if report.rows.is_empty() {
        println!("Nothing to report.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|r| {
            vec![
                r.kind.to_string(),
                r.id.clone(),
                r.name.clone(),
                r.status.label().to_string(),
                date_cell(r.next_expiry),
                r.attention.join(", "),
            ]
        })
        .collect();
    print_table(
        &["KIND", "ID", "NAME", "STATUS", "NEXT EXPIRY", "ATTENTION"],
        rows,
    );
    Ok(())
}
