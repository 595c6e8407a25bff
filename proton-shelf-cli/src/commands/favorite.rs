use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use super::{open_engine, runtime, scan_quietly};
use crate::CliError;

/// Toggle an entry's favorite flag and report the new state.
pub(crate) fn run_favorite(id: &str) -> Result<(), CliError> {
    let engine = open_engine()?;
    let rt = runtime()?;
    rt.block_on(scan_quietly(&engine))?;

    let now_favorite = engine.toggle_favorite(id)?;
    let name = engine
        .entry(id)
        .map(|entry| entry.display_name)
        .unwrap_or_else(|| id.to_string());

    if now_favorite {
        log::info!(
            "{} {} added to favorites",
            "\u{2605}".if_supports_color(Stdout, |t| t.yellow()),
            name.if_supports_color(Stdout, |t| t.bold()),
        );
    } else {
        log::info!(
            "{} {} removed from favorites",
            "\u{2606}".if_supports_color(Stdout, |t| t.dimmed()),
            name.if_supports_color(Stdout, |t| t.bold()),
        );
    }
    Ok(())
}
