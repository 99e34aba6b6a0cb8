pub mod asset;
pub mod compliance;
pub mod config;
pub mod contractor;
pub mod init;
pub mod schedule;
pub mod work_order;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use std::path::Path;
use strata_core::config::Config;
use strata_core::store::FileStore;

/// Open the project store and its config.
pub(crate) fn open(root: &Path) -> anyhow::Result<(FileStore, Config)> {
    let config = Config::load(root).context("failed to load config")?;
    let store = FileStore::open(root).context("failed to open store")?;
    Ok((store, config))
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
