use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use proton_shelf_core::TimeDetail;
use proton_shelf_engine::EngineError;

use super::{format_play_time, open_engine, runtime, scan_quietly};
use crate::CliError;

/// Launch an entry, wait for it to exit and record the session.
pub(crate) fn run_launch(id: &str, print_only: bool) -> Result<(), CliError> {
    let engine = open_engine()?;
    let rt = runtime()?;
    rt.block_on(scan_quietly(&engine))?;

    let entry = engine
        .entry(id)
        .ok_or_else(|| EngineError::not_found(id))?;
    let plan = engine.launch_plan(id)?;

    if print_only {
        log::info!(
            "{}",
            "Launch command:".if_supports_color(Stdout, |t| t.bold()),
        );
        for (key, value) in &plan.env {
            log::info!(
                "  {}={}",
                key.if_supports_color(Stdout, |t| t.cyan()),
                value,
            );
        }
        log::info!("  {} {}", plan.program, plan.args.join(" "));
        return Ok(());
    }

    log::info!(
        "{} Launching {}",
        "\u{25B6}".if_supports_color(Stdout, |t| t.green()),
        entry.display_name.if_supports_color(Stdout, |t| t.bold()),
    );

    let started = chrono::Local::now();
    let status = std::process::Command::new(&plan.program)
        .args(&plan.args)
        .envs(plan.env.iter().cloned())
        .status()?;
    let played = chrono::Local::now()
        .signed_duration_since(started)
        .num_seconds()
        .max(0) as u64;

    engine.record_launch(id, started)?;
    if played > 0 {
        engine.record_playtime_delta(id, played)?;
    }

    if status.success() {
        log::info!(
            "{} Exited cleanly after {}",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            format_play_time(played, TimeDetail::Brief),
        );
    } else {
        log::warn!(
            "{} Game process exited with {}",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            status,
        );
    }
    Ok(())
}
