use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use proton_shelf_core::{CoverSource, Resolution, SourceCatalog};
use proton_shelf_engine::EngineError;

use super::{anti_cheat_label, format_last_launch, format_play_time, open_engine, runtime, scan_quietly};
use crate::CliError;

/// Print one entry in full detail.
pub(crate) fn run_show(id: &str) -> Result<(), CliError> {
    let engine = open_engine()?;
    let rt = runtime()?;
    rt.block_on(scan_quietly(&engine))?;

    let Some(entry) = engine.entry(id) else {
        return Err(EngineError::not_found(id).into());
    };

    let favorite_mark = if entry.is_favorite {
        format!(" {}", "\u{2605}".if_supports_color(Stdout, |t| t.yellow()))
    } else {
        String::new()
    };
    log::info!(
        "{}{}",
        entry.display_name.if_supports_color(Stdout, |t| t.bold()),
        favorite_mark,
    );
    log::info!(
        "  {}          {}",
        "Id:".if_supports_color(Stdout, |t| t.cyan()),
        entry.id,
    );
    log::info!(
        "  {}      {} ({})",
        "Origin:".if_supports_color(Stdout, |t| t.cyan()),
        entry.origin.badge(),
        entry.origin_key,
    );

    match &entry.resolution {
        Resolution::Resolved {
            catalog,
            catalog_id,
            ..
        } => {
            let catalog_name = match catalog {
                SourceCatalog::Steam => "Steam",
                SourceCatalog::Egs => "Epic Games Store",
                SourceCatalog::AntiCheat => "anti-cheat registry",
            };
            log::info!(
                "  {}     {} {}",
                "Catalog:".if_supports_color(Stdout, |t| t.cyan()),
                catalog_name,
                catalog_id.if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
        Resolution::Unresolved { reason } => {
            log::info!(
                "  {}     {} ({})",
                "Catalog:".if_supports_color(Stdout, |t| t.cyan()),
                "unresolved".if_supports_color(Stdout, |t| t.yellow()),
                reason,
            );
        }
    }

    log::info!(
        "  {}  {}",
        "Anti-cheat:".if_supports_color(Stdout, |t| t.cyan()),
        anti_cheat_label(entry.anti_cheat_status),
    );
    log::info!(
        "  {}  {}",
        "Controller:".if_supports_color(Stdout, |t| t.cyan()),
        entry.controller_support.as_str(),
    );
    log::info!(
        "  {}   {}, last launch {}",
        "Play time:".if_supports_color(Stdout, |t| t.cyan()),
        format_play_time(
            entry.play_stats.total_seconds,
            super::configured_time_detail(&engine),
        ),
        format_last_launch(entry.play_stats.last_launch_epoch),
    );

    match &entry.cover {
        CoverSource::Local(path) => {
            log::info!(
                "  {}       {}",
                "Cover:".if_supports_color(Stdout, |t| t.cyan()),
                path.display(),
            );
        }
        CoverSource::Url(url) => {
            log::info!(
                "  {}       {}",
                "Cover:".if_supports_color(Stdout, |t| t.cyan()),
                url,
            );
        }
        CoverSource::Placeholder => {
            log::info!(
                "  {}       {}",
                "Cover:".if_supports_color(Stdout, |t| t.cyan()),
                "placeholder".if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
    }

    if let Some(exe) = &entry.executable {
        log::info!(
            "  {}  {}",
            "Executable:".if_supports_color(Stdout, |t| t.cyan()),
            exe.display(),
        );
    }
    log::info!(
        "  {}     {}",
        "Command:".if_supports_color(Stdout, |t| t.cyan()),
        entry.exec_command.join(" ").if_supports_color(Stdout, |t| t.dimmed()),
    );

    if !entry.description.is_empty() {
        log::info!("");
        log::info!("{}", entry.description);
    }
    Ok(())
}
