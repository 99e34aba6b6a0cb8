use crate::output::{date_cell, print_json, print_table, text_cell};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use std::path::Path;
use strata_core::{
    asset::Asset,
    compliance::ComplianceSubject,
    store::{EntityStore, Filter},
    types::Collection,
};

#[derive(Subcommand)]
pub enum AssetSubcommand {
    /// Add an asset to the register
    Add {
        #[arg(required = true)]
        name: Vec<String>,
        #[arg(long)]
        building: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Date of the most recent service
        #[arg(long, value_name = "DATE")]
        last_service: Option<NaiveDate>,
        /// Date the next service falls due
        #[arg(long, value_name = "DATE")]
        next_service: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List assets with their compliance status
    List {
        #[arg(long)]
        building: Option<String>,
    },
    /// Show an asset
    Show { id: String },
    /// Record a completed service
    Service {
        id: String,
        /// Service date (default: today)
        #[arg(long, value_name = "DATE")]
        on: Option<NaiveDate>,
        /// When the next service falls due
        #[arg(long, value_name = "DATE")]
        next: Option<NaiveDate>,
    },
    /// Delete an asset
    Delete { id: String },
}

pub fn run(root: &Path, subcmd: AssetSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        AssetSubcommand::Add {
            name,
            building,
            category,
            location,
            last_service,
            next_service,
            notes,
        } => {
            let mut asset = Asset::new(building, name.join(" "));
            asset.category = category;
            asset.location = location;
            asset.last_service_date = last_service;
            asset.next_service_date = next_service;
            asset.notes = notes;
            add(root, asset, json)
        }
        AssetSubcommand::List { building } => list(root, building.as_deref(), json),
        AssetSubcommand::Show { id } => show(root, &id, json),
        AssetSubcommand::Service { id, on, next } => service(root, &id, on, next, json),
        AssetSubcommand::Delete { id } => delete(root, &id, json),
    }
}

fn add(root: &Path, asset: Asset, json: bool) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    let asset = store.create(asset).context("failed to create asset")?;
    if json {
        return print_json(&asset);
    }
    println!("Added asset [{}]: {}", asset.id, asset.name);
    Ok(())
}

fn list(root: &Path, building: Option<&str>, json: bool) -> anyhow::Result<()> {
    let (store, config) = super::open(root)?;
    let mut filter = Filter::new();
    if let Some(b) = building {
        filter = filter.eq("building_id", b);
    }
    let assets: Vec<Asset> = store.filter(&filter).context("failed to list assets")?;
    let today = super::today();
    let window = config.compliance.soon_window_days;

    if json {
        let items: Vec<serde_json::Value> = assets
            .iter()
            .map(|a| {
                serde_json::json!({
                    "asset": a,
                    "compliance_status": a.compliance_status(today, window),
                })
            })
            .collect();
        return print_json(&items);
    }
    if assets.is_empty() {
        println!("No assets.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = assets
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.name.clone(),
                a.building_id.clone(),
                text_cell(a.category.as_deref()),
                date_cell(a.next_service_date),
                a.compliance_status(today, window).label().to_string(),
            ]
        })
        .collect();
    print_table(
        &[
            "ID",
            "NAME",
            "BUILDING",
            "CATEGORY",
            "NEXT SERVICE",
            "COMPLIANCE",
        ],
        rows,
    );
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (store, config) = super::open(root)?;
    let a: Asset = store
        .get(id)
        .with_context(|| format!("asset '{id}' not found"))?;
    let status = a.compliance_status(super::today(), config.compliance.soon_window_days);

    if json {
        return print_json(&serde_json::json!({ "asset": a, "compliance_status": status }));
    }
    println!("Asset:        {}", a.id);
    println!("Name:         {}", a.name);
    println!("Building:     {}", a.building_id);
    println!("Category:     {}", text_cell(a.category.as_deref()));
    println!("Location:     {}", text_cell(a.location.as_deref()));
    println!("Last service: {}", date_cell(a.last_service_date));
    println!("Next service: {}", date_cell(a.next_service_date));
    println!("Compliance:   {}", status.label());
    Ok(())
}

fn service(
    root: &Path,
    id: &str,
    on: Option<NaiveDate>,
    next: Option<NaiveDate>,
    json: bool,
) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    let mut a: Asset = store
        .get(id)
        .with_context(|| format!("asset '{id}' not found"))?;
    let on = on.unwrap_or_else(super::today);
    a.record_service(on, next);
    store.update(&a).context("failed to save asset")?;

    if json {
        return print_json(&a);
    }
    println!("Recorded service of [{id}] on {on}");
    println!("  next due: {}", date_cell(a.next_service_date));
    Ok(())
}

fn delete(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    store
        .delete(Collection::Asset, id)
        .with_context(|| format!("failed to delete asset '{id}'"))?;
    if json {
        return print_json(&serde_json::json!({ "id": id, "deleted": true }));
    }
    println!("Deleted asset [{id}]");
    Ok(())
}
