mod cmd;
mod output;
mod root;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cmd::{
    asset::AssetSubcommand, config::ConfigSubcommand, contractor::ContractorSubcommand,
    schedule::ScheduleSubcommand, work_order::WorkOrderSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Strata management console: work orders, schedules and compliance",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .strata/)
    #[arg(long, global = true, env = "STRATA_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a strata store in the current directory
    Init,

    /// Manage work orders (recurring ones keep a maintenance schedule in sync)
    #[command(name = "work-order", alias = "wo")]
    WorkOrder {
        #[command(subcommand)]
        subcommand: WorkOrderSubcommand,
    },

    /// Manage maintenance schedules
    Schedule {
        #[command(subcommand)]
        subcommand: ScheduleSubcommand,
    },

    /// Manage the asset register
    Asset {
        #[command(subcommand)]
        subcommand: AssetSubcommand,
    },

    /// Manage the contractor directory
    Contractor {
        #[command(subcommand)]
        subcommand: ContractorSubcommand,
    },

    /// Compliance report across assets and contractors
    Compliance {
        /// Evaluate as of this date (default: today)
        #[arg(long, value_name = "DATE")]
        at: Option<NaiveDate>,
        /// Days ahead to flag as expiring soon (default: from config)
        #[arg(long, value_name = "DAYS")]
        window: Option<i64>,
        /// Only list expired and expiring subjects
        #[arg(long)]
        attention: bool,
    },

    /// Show or validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::WorkOrder { subcommand } => cmd::work_order::run(&root, subcommand, cli.json),
        Commands::Schedule { subcommand } => cmd::schedule::run(&root, subcommand, cli.json),
        Commands::Asset { subcommand } => cmd::asset::run(&root, subcommand, cli.json),
        Commands::Contractor { subcommand } => cmd::contractor::run(&root, subcommand, cli.json),
        Commands::Compliance {
            at,
            window,
            attention,
        } => cmd::compliance::run(&root, at, window, attention, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
