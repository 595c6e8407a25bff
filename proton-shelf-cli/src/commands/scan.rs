use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use tokio::sync::mpsc::unbounded_channel;

use proton_shelf_core::AntiCheatStatus;
use proton_shelf_engine::ScanEvent;

use super::{open_engine, runtime};
use crate::CliError;

/// Run a full scan with live progress, then print a short summary.
pub(crate) fn run_scan(quiet: bool) -> Result<(), CliError> {
    let engine = open_engine()?;
    let rt = runtime()?;

    rt.block_on(async {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("  {spinner:.cyan} {msg}")
                    .expect("static pattern")
                    .tick_chars("/-\\|"),
            );
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb
        };

        let (events, mut inbox) = unbounded_channel();
        let progress = {
            let pb = pb.clone();
            tokio::spawn(async move {
                while let Some(event) = inbox.recv().await {
                    match event {
                        ScanEvent::AdapterStarted { origin } => {
                            pb.set_message(format!("Scanning {} entries...", origin.badge()));
                        }
                        ScanEvent::AdapterFinished { origin, discovered } => {
                            pb.set_message(format!("{}: {} found", origin.badge(), discovered));
                        }
                        ScanEvent::Resolving { done, total } => {
                            pb.set_message(format!("[{done}/{total}] Resolving metadata"));
                        }
                        ScanEvent::Published { .. } => {}
                    }
                }
            })
        };

        let snapshot = engine.rescan(events, Arc::new(AtomicBool::new(false))).await;
        // The sender is gone once rescan returns, so the drain task finishes.
        let _ = progress.await;
        pb.finish_and_clear();

        let Some(snapshot) = snapshot else {
            return Err(CliError::Cancelled);
        };

        let entries = engine.entries();
        let resolved = entries
            .iter()
            .filter(|e| e.resolution.is_resolved())
            .count();
        let with_verdict = entries
            .iter()
            .filter(|e| e.anti_cheat_status != AntiCheatStatus::Unknown)
            .count();

        log::info!(
            "{} {} entries scanned ({} resolved, {} with an anti-cheat verdict)",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            entries.len(),
            resolved,
            with_verdict,
        );
        log::info!(
            "{}",
            format!(
                "{} cards visible under the current filter; run 'proton-shelf list' to see them",
                snapshot.cards.len()
            )
            .if_supports_color(Stdout, |t| t.dimmed()),
        );
        Ok(())
    })
}
