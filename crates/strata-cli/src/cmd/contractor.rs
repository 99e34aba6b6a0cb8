use crate::output::{date_cell, print_json, print_table, text_cell};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use std::path::Path;
use strata_core::{
    compliance::ComplianceSubject, contractor::Contractor, store::EntityStore, types::Collection,
};

#[derive(Subcommand)]
pub enum ContractorSubcommand {
    /// Add a contractor to the directory
    Add {
        #[arg(required = true)]
        company: Vec<String>,
        #[arg(long)]
        contact: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Trade, e.g. electrical, plumbing
        #[arg(long)]
        trade: Option<String>,
        #[arg(long)]
        license_number: Option<String>,
        #[arg(long, value_name = "DATE")]
        license_expiry: Option<NaiveDate>,
        #[arg(long, value_name = "DATE")]
        insurance_expiry: Option<NaiveDate>,
        #[arg(long, value_name = "DATE")]
        workers_comp_expiry: Option<NaiveDate>,
        #[arg(long, value_name = "DATE")]
        public_liability_expiry: Option<NaiveDate>,
    },
    /// List contractors with their compliance status
    List,
    /// Show a contractor and each tracked credential
    Show { id: String },
    /// Delete a contractor
    Delete { id: String },
}

pub fn run(root: &Path, subcmd: ContractorSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ContractorSubcommand::Add {
            company,
            contact,
            email,
            phone,
            trade,
            license_number,
            license_expiry,
            insurance_expiry,
            workers_comp_expiry,
            public_liability_expiry,
        } => {
            let mut c = Contractor::new(company.join(" "));
            c.contact_name = contact;
            c.email = email;
            c.phone = phone;
            c.trade = trade;
            c.license_number = license_number;
            c.license_expiry = license_expiry;
            c.insurance_expiry = insurance_expiry;
            c.workers_comp_expiry = workers_comp_expiry;
            c.public_liability_expiry = public_liability_expiry;
            add(root, c, json)
        }
        ContractorSubcommand::List => list(root, json),
        ContractorSubcommand::Show { id } => show(root, &id, json),
        ContractorSubcommand::Delete { id } => delete(root, &id, json),
    }
}

fn add(root: &Path, contractor: Contractor, json: bool) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    let c = store
        .create(contractor)
        .context("failed to create contractor")?;
    if json {
        return print_json(&c);
    }
    println!("Added contractor [{}]: {}", c.id, c.company_name);
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let (store, config) = super::open(root)?;
    let contractors: Vec<Contractor> = store.list().context("failed to list contractors")?;
    let today = super::today();
    let window = config.compliance.soon_window_days;

    if json {
        let items: Vec<serde_json::Value> = contractors
            .iter()
            .map(|c| {
                serde_json::json!({
                    "contractor": c,
                    "compliance_status": c.compliance_status(today, window),
                })
            })
            .collect();
        return print_json(&items);
    }
    if contractors.is_empty() {
        println!("No contractors.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = contractors
        .iter()
        .map(|c| {
            vec![
                c.id.clone(),
                c.company_name.clone(),
                text_cell(c.trade.as_deref()),
                date_cell(c.next_expiry()),
                c.compliance_status(today, window).label().to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "COMPANY", "TRADE", "NEXT EXPIRY", "COMPLIANCE"],
        rows,
    );
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (store, config) = super::open(root)?;
    let c: Contractor = store
        .get(id)
        .with_context(|| format!("contractor '{id}' not found"))?;
    let today = super::today();
    let window = config.compliance.soon_window_days;
    let status = c.compliance_status(today, window);

    if json {
        return print_json(&serde_json::json!({
            "contractor": c,
            "compliance_status": status,
            "attention": c.attention_fields(today, window),
        }));
    }
    println!("Contractor: {}", c.id);
    println!("Company:    {}", c.company_name);
    println!("Contact:    {}", text_cell(c.contact_name.as_deref()));
    println!("Trade:      {}", text_cell(c.trade.as_deref()));
    println!("License #:  {}", text_cell(c.license_number.as_deref()));
    println!("Compliance: {}", status.label());
    let attention = c.attention_fields(today, window);
    for tracked in c.tracked_dates() {
        let flag = if attention.contains(&tracked.field) {
            "  !"
        } else {
            ""
        };
        println!("  {:<24} {}{flag}", tracked.field, date_cell(tracked.date));
    }
    Ok(())
}

fn delete(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    store
        .delete(Collection::Contractor, id)
        .with_context(|| format!("failed to delete contractor '{id}'"))?;
    if json {
        return print_json(&serde_json::json!({ "id": id, "deleted": true }));
    }
    println!("Deleted contractor [{id}]");
    Ok(())
}
