use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::application::snapshot::SnapshotSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub seed: bool,
    pub seed_path: Option<PathBuf>,
    pub debug_snapshot: bool,
    pub snapshot_rows: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let server_port = lookup("SERVER_PORT").unwrap_or_else(|| "3000".into());
        let database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());
        let seed = flag(&lookup, "SEED", true)?;
        let seed_path = lookup("SEED_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let debug_snapshot = flag(&lookup, "DEBUG_SNAPSHOT", false)?;
        let snapshot_rows = match lookup("SNAPSHOT_ROWS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("SNAPSHOT_ROWS must be a number, got {v:?}"))?,
            None => SnapshotSettings::DEFAULT_ROWS,
        };
        Ok(Self {
            server_port,
            database_url,
            seed,
            seed_path,
            debug_snapshot,
            snapshot_rows,
        })
    }

    pub fn snapshot_settings(&self) -> Option<SnapshotSettings> {
        self.debug_snapshot.then(|| SnapshotSettings {
            rows: self.snapshot_rows,
            ..SnapshotSettings::default()
        })
    }
}

fn flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> anyhow::Result<bool> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        "" => Ok(default),
        _ => anyhow::bail!("{key} must be a boolean, got {raw:?}"),
    }
}
