use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use proton_shelf_core::{DisplayFilter, SortMethod};
use proton_shelf_engine::build_snapshot;

use super::{
    anti_cheat_label, configured_time_detail, format_last_launch, format_play_time, open_engine,
    runtime, scan_quietly,
};
use crate::CliError;

/// Print the library the way the launcher shell would order it.
pub(crate) fn run_list(
    filter: Option<DisplayFilter>,
    sort: Option<SortMethod>,
) -> Result<(), CliError> {
    let engine = open_engine()?;
    let rt = runtime()?;
    rt.block_on(scan_quietly(&engine))?;

    // Flags override the stored preferences for this invocation only.
    let snapshot = if filter.is_none() && sort.is_none() {
        engine.snapshot()
    } else {
        let stored = engine.snapshot();
        build_snapshot(
            &engine.entries(),
            sort.unwrap_or(stored.sort_method),
            filter.unwrap_or(stored.display_filter),
            configured_time_detail(&engine),
        )
    };

    let total = engine.entries().len();
    log::info!(
        "{} ({} of {} entries, sort: {}, filter: {})",
        "Library".if_supports_color(Stdout, |t| t.bold()),
        snapshot.cards.len(),
        total,
        snapshot.sort_method,
        snapshot.display_filter,
    );
    log::info!("");

    if snapshot.cards.is_empty() {
        log::info!(
            "{}",
            "No entries to show.".if_supports_color(Stdout, |t| t.dimmed()),
        );
        if total == 0 {
            log::info!("");
            log::info!("Tip: add shortcuts to the wrapper, install Steam or Epic titles,");
            log::info!("     then run 'proton-shelf scan'.");
        }
        return Ok(());
    }

    for (i, card) in snapshot.cards.iter().enumerate() {
        log::info!(
            "  {} {} {}",
            format!("{:>3}.", i + 1).if_supports_color(Stdout, |t| t.dimmed()),
            card.display_name.if_supports_color(Stdout, |t| t.bold()),
            format!("[{}]", card.origin_badge).if_supports_color(Stdout, |t| t.cyan()),
        );
        log::info!(
            "       anti-cheat: {}  play time: {}  last launch: {}  id: {}",
            anti_cheat_label(card.anti_cheat),
            format_play_time(card.play_seconds, card.time_detail),
            format_last_launch(card.last_launch_epoch),
            card.id.if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    Ok(())
}
