use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use strata_core::config::{Config, WarnLevel};

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Change configuration values
    Set {
        /// Days ahead to flag an expiry as expiring soon
        #[arg(long, value_name = "DAYS", allow_hyphen_values = true)]
        soon_window_days: Option<i64>,

        /// Keep generated schedules in sync with recurring work orders
        #[arg(long, value_name = "BOOL")]
        sync_enabled: Option<bool>,
    },
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
        ConfigSubcommand::Set {
            soon_window_days,
            sync_enabled,
        } => set(root, soon_window_days, sync_enabled, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config);
    }
    println!("Project:           {}", config.project);
    println!("Soon window:       {} days", config.compliance.soon_window_days);
    let sync = if config.sync.enabled {
        "enabled"
    } else {
        "disabled"
    };
    println!("Schedule sync:     {sync}");
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

fn set(
    root: &Path,
    soon_window_days: Option<i64>,
    sync_enabled: Option<bool>,
    json: bool,
) -> anyhow::Result<()> {
    if soon_window_days.is_none() && sync_enabled.is_none() {
        anyhow::bail!("nothing to set: pass --soon-window-days or --sync-enabled");
    }
    let mut config = Config::load(root).context("failed to load config")?;
    if let Some(days) = soon_window_days {
        config.compliance.soon_window_days = days;
    }
    if let Some(enabled) = sync_enabled {
        config.sync.enabled = enabled;
    }

    let warnings = config.validate();
    if let Some(err) = warnings.iter().find(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("refusing to save config: {}", err.message);
    }
    config.save(root).context("failed to write config.yaml")?;

    if json {
        return print_json(&config);
    }
    println!("Updated config.");
    for w in warnings {
        println!("[warning] {}", w.message);
    }
    Ok(())
}
