use crate::output::{date_cell, print_json, print_table, text_cell};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::Value;
use std::path::Path;
use strata_core::{
    schedule::MaintenanceSchedule,
    store::{EntityStore, Filter},
    types::{Collection, ScheduleRecurrence},
};

#[derive(Subcommand)]
pub enum ScheduleSubcommand {
    /// List maintenance schedules
    List {
        #[arg(long)]
        building: Option<String>,
        /// Only schedules generated from work orders
        #[arg(long, conflicts_with = "manual")]
        generated: bool,
        /// Only hand-entered schedules
        #[arg(long)]
        manual: bool,
    },
    /// Show a schedule
    Show { id: String },
    /// Create a manual schedule
    Create {
        #[arg(required = true)]
        subject: Vec<String>,
        #[arg(long)]
        building: String,
        /// First occurrence (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        start: NaiveDate,
        /// one_time, monthly, quarterly, yearly
        #[arg(long, default_value = "one_time")]
        recurrence: ScheduleRecurrence,
        /// Last occurrence (omit for never expires)
        #[arg(long, value_name = "DATE")]
        end: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        contractor: Option<String>,
        #[arg(long)]
        assigned_to: Option<String>,
    },
    /// Mark a schedule completed
    Complete { id: String },
    /// Cancel a schedule
    Cancel { id: String },
    /// Delete a schedule
    Delete { id: String },
}

pub fn run(root: &Path, subcmd: ScheduleSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ScheduleSubcommand::List {
            building,
            generated,
            manual,
        } => list(root, building.as_deref(), generated, manual, json),
        ScheduleSubcommand::Show { id } => show(root, &id, json),
        ScheduleSubcommand::Create {
            subject,
            building,
            start,
            recurrence,
            end,
            description,
            contractor,
            assigned_to,
        } => {
            let mut s = MaintenanceSchedule::new(building, subject.join(" "), start, recurrence);
            s.set_end(end);
            s.description = description;
            s.contractor_id = contractor;
            s.assigned_to = assigned_to;
            create(root, s, json)
        }
        ScheduleSubcommand::Complete { id } => {
            transition(root, &id, MaintenanceSchedule::complete, json)
        }
        ScheduleSubcommand::Cancel { id } => {
            transition(root, &id, MaintenanceSchedule::cancel, json)
        }
        ScheduleSubcommand::Delete { id } => delete(root, &id, json),
    }
}

fn list(
    root: &Path,
    building: Option<&str>,
    generated: bool,
    manual: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    let mut filter = Filter::new();
    if let Some(b) = building {
        filter = filter.eq("building_id", b);
    }
    if manual {
        filter = filter.eq("work_order_id", Value::Null);
    }
    let mut schedules: Vec<MaintenanceSchedule> =
        store.filter(&filter).context("failed to list schedules")?;
    if generated {
        schedules.retain(MaintenanceSchedule::is_generated);
    }

    if json {
        return print_json(&schedules);
    }
    if schedules.is_empty() {
        println!("No schedules.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = schedules
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.subject.clone(),
                s.building_id.clone(),
                s.recurrence.to_string(),
                s.event_start.to_string(),
                if s.never_expire {
                    "never".to_string()
                } else {
                    date_cell(s.event_end)
                },
                s.status.to_string(),
                text_cell(s.work_order_id.as_deref()),
            ]
        })
        .collect();
    print_table(
        &[
            "ID",
            "SUBJECT",
            "BUILDING",
            "RECURRENCE",
            "START",
            "END",
            "STATUS",
            "WORK ORDER",
        ],
        rows,
    );
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    let s: MaintenanceSchedule = store
        .get(id)
        .with_context(|| format!("schedule '{id}' not found"))?;

    if json {
        return print_json(&s);
    }
    println!("Schedule:   {}", s.id);
    println!("Subject:    {}", s.subject);
    println!("Building:   {}", s.building_id);
    println!("Recurrence: {}", s.recurrence);
    println!("Start:      {}", s.event_start);
    if s.never_expire {
        println!("End:        never expires");
    } else {
        println!("End:        {}", date_cell(s.event_end));
    }
    println!("Status:     {}", s.status);
    println!("Contractor: {}", text_cell(s.contractor_id.as_deref()));
    println!("Assignee:   {}", text_cell(s.assigned_to.as_deref()));
    match &s.work_order_id {
        Some(wo) => println!("Source:     work order {wo}"),
        None => println!("Source:     manual"),
    }
    Ok(())
}

fn create(root: &Path, schedule: MaintenanceSchedule, json: bool) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    let s = store
        .create(schedule)
        .context("failed to create schedule")?;

    if json {
        return print_json(&s);
    }
    println!("Created schedule [{}]: {}", s.id, s.subject);
    Ok(())
}

fn transition(
    root: &Path,
    id: &str,
    apply: fn(&mut MaintenanceSchedule),
    json: bool,
) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    let mut s: MaintenanceSchedule = store
        .get(id)
        .with_context(|| format!("schedule '{id}' not found"))?;
    apply(&mut s);
    store.update(&s).context("failed to save schedule")?;

    if json {
        return print_json(&s);
    }
    println!("Schedule [{id}] is now {}", s.status);
    if let Some(wo) = &s.work_order_id {
        println!("  note: the next save of work order {wo} resets this schedule to active");
    }
    Ok(())
}

fn delete(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (store, _) = super::open(root)?;
    let s: MaintenanceSchedule = store
        .get(id)
        .with_context(|| format!("schedule '{id}' not found"))?;
    store
        .delete(Collection::MaintenanceSchedule, id)
        .context("failed to delete schedule")?;

    if json {
        return print_json(&serde_json::json!({ "id": id, "deleted": true }));
    }
    println!("Deleted schedule [{id}]");
    if let Some(wo) = &s.work_order_id {
        println!("  note: the next save of work order {wo} recreates it");
    }
    Ok(())
}
