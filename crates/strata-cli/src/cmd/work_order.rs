use crate::output::{date_cell, print_json, print_table, text_cell};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use std::path::Path;
use strata_core::{
    recurrence::{RecurrenceSynchronizer, SyncOutcome},
    schedule::MaintenanceSchedule,
    store::{EntityStore, Filter},
    types::{Priority, RecurrencePattern, WorkOrderStatus},
    work_order::{delete_work_order, save_work_order, SaveOutcome, WorkOrder},
};

#[derive(Subcommand)]
pub enum WorkOrderSubcommand {
    /// Create a work order
    Create {
        #[arg(required = true)]
        title: Vec<String>,
        /// Building the work order belongs to
        #[arg(long)]
        building: String,
        #[command(flatten)]
        fields: WorkOrderFields,
        /// Make the work order recurring: daily, weekly, monthly, quarterly, yearly
        #[arg(long, value_name = "PATTERN")]
        recurring: Option<RecurrencePattern>,
        /// Last date of the recurrence (omit for never expires)
        #[arg(long, value_name = "DATE", requires = "recurring")]
        recurrence_end: Option<NaiveDate>,
    },
    /// Edit work order fields; recurring changes are mirrored to its schedule
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        building: Option<String>,
        #[command(flatten)]
        fields: WorkOrderFields,
        /// Make the work order recurring with this pattern
        #[arg(long, value_name = "PATTERN", conflicts_with = "not_recurring")]
        recurring: Option<RecurrencePattern>,
        /// Stop recurring and drop the generated schedule
        #[arg(long)]
        not_recurring: bool,
        /// Set the recurrence end date
        #[arg(long, value_name = "DATE", conflicts_with_all = ["not_recurring", "no_end"])]
        recurrence_end: Option<NaiveDate>,
        /// Clear the recurrence end date (never expires)
        #[arg(long)]
        no_end: bool,
    },
    /// List work orders
    List {
        #[arg(long)]
        building: Option<String>,
        #[arg(long)]
        status: Option<WorkOrderStatus>,
        /// Only recurring work orders
        #[arg(long)]
        recurring: bool,
    },
    /// Show a work order and its generated schedule
    Show { id: String },
    /// Mark a work order in progress
    Start { id: String },
    /// Mark a work order completed
    Complete { id: String },
    /// Cancel a work order
    Cancel { id: String },
    /// Delete a work order and its generated schedule
    Delete { id: String },
}

#[derive(Args)]
pub struct WorkOrderFields {
    #[arg(long)]
    description: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    due: Option<NaiveDate>,
    /// Assigned contractor id
    #[arg(long)]
    contractor: Option<String>,
    /// Assignee name
    #[arg(long)]
    assigned_to: Option<String>,
    /// low, medium, high, urgent
    #[arg(long)]
    priority: Option<Priority>,
}

impl WorkOrderFields {
    fn apply(self, wo: &mut WorkOrder) {
        if let Some(d) = self.description {
            wo.description = Some(d);
        }
        if let Some(d) = self.due {
            wo.due_date = Some(d);
        }
        if let Some(c) = self.contractor {
            wo.assigned_contractor_id = Some(c);
        }
        if let Some(a) = self.assigned_to {
            wo.assigned_to = Some(a);
        }
        if let Some(p) = self.priority {
            wo.priority = p;
        }
    }
}

pub fn run(root: &Path, subcmd: WorkOrderSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        WorkOrderSubcommand::Create {
            title,
            building,
            fields,
            recurring,
            recurrence_end,
        } => {
            let mut wo = WorkOrder::new(building, title.join(" "));
            fields.apply(&mut wo);
            if let Some(pattern) = recurring {
                wo.make_recurring(pattern, recurrence_end);
            }
            save(root, wo, "Created", json)
        }
        WorkOrderSubcommand::Edit {
            id,
            title,
            building,
            fields,
            recurring,
            not_recurring,
            recurrence_end,
            no_end,
        } => {
            let (store, _) = super::open(root)?;
            let mut wo: WorkOrder = store
                .get(&id)
                .with_context(|| format!("work order '{id}' not found"))?;
            if let Some(t) = title {
                wo.title = t;
            }
            if let Some(b) = building {
                wo.building_id = b;
            }
            fields.apply(&mut wo);

            if not_recurring {
                wo.clear_recurrence();
            } else {
                let end = if no_end {
                    None
                } else {
                    recurrence_end.or(wo.recurrence_end_date)
                };
                match recurring.or(wo.recurrence()) {
                    Some(pattern) => wo.make_recurring(pattern, end),
                    None if recurrence_end.is_some() || no_end => {
                        anyhow::bail!("work order '{id}' is not recurring; pass --recurring")
                    }
                    None => {}
                }
            }
            save(root, wo, "Updated", json)
        }
        WorkOrderSubcommand::List {
            building,
            status,
            recurring,
        } => list(root, building.as_deref(), status, recurring, json),
        WorkOrderSubcommand::Show { id } => show(root, &id, json),
        WorkOrderSubcommand::Start { id } => transition(root, &id, WorkOrder::start, json),
        WorkOrderSubcommand::Complete { id } => transition(root, &id, WorkOrder::complete, json),
        WorkOrderSubcommand::Cancel { id } => transition(root, &id, WorkOrder::cancel, json),
        WorkOrderSubcommand::Delete { id } => delete(root, &id, json),
    }
}

fn save(root: &Path, wo: WorkOrder, verb: &str, json: bool) -> anyhow::Result<()> {
    let (store, config) = super::open(root)?;
    let sync = RecurrenceSynchronizer::from_config(&config.sync);
    let outcome = save_work_order(&store, &sync, wo).context("failed to save work order")?;
    report_save(&outcome, &sync, verb, json)
}

fn report_save(
    outcome: &SaveOutcome,
    sync: &RecurrenceSynchronizer,
    verb: &str,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        return print_json(outcome);
    }
    let wo = &outcome.work_order;
    println!("{verb} work order [{}]: {}", wo.id, wo.title);
    report_sync(&outcome.sync, sync);
    Ok(())
}

fn report_sync(outcome: &SyncOutcome, sync: &RecurrenceSynchronizer) {
    match outcome {
        SyncOutcome::Unchanged if !sync.is_enabled() => {
            println!("  schedule: sync disabled in config, schedules left as they are")
        }
        SyncOutcome::Unchanged => {}
        SyncOutcome::Failed { .. } => eprintln!("warning: {outcome}"),
        _ => println!("  schedule: {outcome}"),
    }
}

fn transition(root: &Path, id: &str, apply: fn(&mut WorkOrder), json: bool) -> anyhow::Result<()> {
    let (store, config) = super::open(root)?;
    let mut wo: WorkOrder = store
        .get(id)
        .with_context(|| format!("work order '{id}' not found"))?;
    apply(&mut wo);

    let sync = RecurrenceSynchronizer::from_config(&config.sync);
    let outcome = save_work_order(&store, &sync, wo).context("failed to save work order")?;
    if json {
        return print_json(&outcome);
    }
    println!(
        "Work order [{}] is now {}",
        outcome.work_order.id, outcome.work_order.status
    );
    report_sync(&outcome.sync, &sync);
    Ok(())
}

fn list(
    root: &Path,
    building: Option<&str>,
    status: Option<WorkOrderStatus>,
    recurring_only: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    let mut filter = Filter::new();
    if let Some(b) = building {
        filter = filter.eq("building_id", b);
    }
    if let Some(s) = status {
        filter = filter.eq("status", s.to_string());
    }
    if recurring_only {
        filter = filter.eq("is_recurring", true);
    }
    let orders: Vec<WorkOrder> = store
        .filter(&filter)
        .context("failed to list work orders")?;

    if json {
        return print_json(&orders);
    }
    if orders.is_empty() {
        println!("No work orders.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = orders
        .iter()
        .map(|wo| {
            vec![
                wo.id.clone(),
                wo.title.clone(),
                wo.building_id.clone(),
                wo.status.to_string(),
                wo.priority.to_string(),
                date_cell(wo.due_date),
                wo.recurrence()
                    .map_or_else(|| "-".to_string(), |p| p.to_string()),
            ]
        })
        .collect();
    print_table(
        &[
            "ID", "TITLE", "BUILDING", "STATUS", "PRIORITY", "DUE", "RECURS",
        ],
        rows,
    );
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    let wo: WorkOrder = store
        .get(id)
        .with_context(|| format!("work order '{id}' not found"))?;
    let schedules: Vec<MaintenanceSchedule> = store
        .filter(&Filter::new().eq("work_order_id", id))
        .context("failed to look up generated schedule")?;

    if json {
        return print_json(&serde_json::json!({
            "work_order": wo,
            "schedules": schedules,
        }));
    }

    println!("Work order: {}", wo.id);
    println!("Title:      {}", wo.title);
    println!("Building:   {}", wo.building_id);
    println!("Status:     {}", wo.status);
    println!("Priority:   {}", wo.priority);
    println!("Due:        {}", date_cell(wo.due_date));
    println!(
        "Contractor: {}",
        text_cell(wo.assigned_contractor_id.as_deref())
    );
    println!("Assignee:   {}", text_cell(wo.assigned_to.as_deref()));
    if let Some(desc) = &wo.description {
        println!("\n{desc}\n");
    }
    match wo.recurrence() {
        Some(pattern) => {
            let until = wo
                .recurrence_end_date
                .map_or_else(|| "never expires".to_string(), |d| format!("until {d}"));
            println!("Recurs:     {pattern} ({until})");
        }
        None => println!("Recurs:     no"),
    }
    for s in &schedules {
        println!(
            "Schedule:   {} [{}] {} from {}",
            s.id, s.status, s.recurrence, s.event_start
        );
    }
    Ok(())
}

fn delete(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (store, config) = super::open(root)?;
    let sync = RecurrenceSynchronizer::from_config(&config.sync);
    let outcome = delete_work_order(&store, &sync, id)
        .with_context(|| format!("failed to delete work order '{id}'"))?;

    if json {
        return print_json(&serde_json::json!({ "id": id, "sync": outcome }));
    }
    println!("Deleted work order [{id}]");
    report_sync(&outcome, &sync);
    Ok(())
}
