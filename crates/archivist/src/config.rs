use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use archivist_engine::ExportWindow;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub attachment_dir: PathBuf,
    pub export_root: PathBuf,
    /// Directory inside the export root that receives this job's output.
    pub export_dir: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let window_start = parse_time(&get, "ARCHIVIST_WINDOW_START")?;
        let window_end = parse_time(&get, "ARCHIVIST_WINDOW_END")?;
        if window_start > window_end {
            bail!(
                "ARCHIVIST_WINDOW_START ({}) is after ARCHIVIST_WINDOW_END ({})",
                window_start,
                window_end
            );
        }

        let export_dir = get("ARCHIVIST_EXPORT_DIR").unwrap_or_else(|| {
            format!("{}-{}", window_start.timestamp(), window_end.timestamp())
        });

        Ok(Self {
            db_path: get("ARCHIVIST_DB_PATH").unwrap_or_else(|| "archivist.db".into()).into(),
            attachment_dir: get("ARCHIVIST_ATTACHMENT_DIR").unwrap_or_else(|| "./data".into()).into(),
            export_root: get("ARCHIVIST_EXPORT_ROOT").unwrap_or_else(|| "./exports".into()).into(),
            export_dir,
            window_start,
            window_end,
        })
    }

    pub fn window(&self) -> ExportWindow {
        ExportWindow::new(self.window_start.timestamp(), self.window_end.timestamp())
    }
}

fn parse_time(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<DateTime<Utc>> {
    let raw = get(key).with_context(|| format!("{} is required (RFC 3339)", key))?;
    let parsed = DateTime::parse_from_rfc3339(&raw)
        .with_context(|| format!("{} is not an RFC 3339 timestamp: {}", key, raw))?;
    Ok(parsed.with_timezone(&Utc))
}
