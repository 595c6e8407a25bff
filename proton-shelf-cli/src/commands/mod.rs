pub(crate) mod config;
pub(crate) mod favorite;
pub(crate) mod launch;
pub(crate) mod list;
pub(crate) mod scan;
pub(crate) mod show;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::TimeZone;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use tokio::sync::mpsc::unbounded_channel;

use proton_shelf_core::{AntiCheatStatus, TimeDetail};
use proton_shelf_engine::{Engine, EngineError, Snapshot};
use proton_shelf_lib::AppDirs;

use crate::CliError;

/// Engine over the real user directories and system adapters.
pub(crate) fn open_engine() -> Result<Engine, CliError> {
    let dirs = AppDirs::resolve().map_err(EngineError::from)?;
    Ok(Engine::new(&dirs))
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new().map_err(|e| CliError::runtime(e.to_string()))
}

/// Run a scan without progress output; events are discarded.
pub(crate) async fn scan_quietly(engine: &Engine) -> Result<Snapshot, CliError> {
    let (events, _inbox) = unbounded_channel();
    engine
        .rescan(events, Arc::new(AtomicBool::new(false)))
        .await
        .ok_or(CliError::Cancelled)
}

pub(crate) fn configured_time_detail(engine: &Engine) -> TimeDetail {
    engine
        .preference("appearance.time_detail")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

/// Colored anti-cheat verdict for terminal output.
pub(crate) fn anti_cheat_label(status: AntiCheatStatus) -> String {
    let text = status.as_str();
    match status {
        AntiCheatStatus::Supported | AntiCheatStatus::Running => {
            format!("{}", text.if_supports_color(Stdout, |t| t.green()))
        }
        AntiCheatStatus::Planned => format!("{}", text.if_supports_color(Stdout, |t| t.cyan())),
        AntiCheatStatus::Broken | AntiCheatStatus::Denied => {
            format!("{}", text.if_supports_color(Stdout, |t| t.red()))
        }
        AntiCheatStatus::Unknown => format!("{}", text.if_supports_color(Stdout, |t| t.dimmed())),
    }
}

/// "never", or a local wall-clock date for a last-launch epoch.
pub(crate) fn format_last_launch(epoch: i64) -> String {
    if epoch == 0 {
        return "never".to_string();
    }
    chrono::Local
        .timestamp_opt(epoch, 0)
        .earliest()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string())
}

/// Play time under the configured verbosity: "4.2 h" brief,
/// "4 h 12 min" detailed.
pub(crate) fn format_play_time(seconds: u64, detail: TimeDetail) -> String {
    if seconds == 0 {
        return "not played".to_string();
    }
    let hours = seconds / 3600;
    match detail {
        TimeDetail::Brief => {
            if hours > 0 {
                format!("{:.1} h", seconds as f64 / 3600.0)
            } else {
                format!("{} min", (seconds % 3600).div_ceil(60))
            }
        }
        TimeDetail::Detailed => {
            let minutes = (seconds % 3600).div_ceil(60);
            match (hours, minutes) {
                (0, m) => format!("{m} min"),
                (h, 0) => format!("{h} h"),
                (h, m) => format!("{h} h {m} min"),
            }
        }
    }
}
