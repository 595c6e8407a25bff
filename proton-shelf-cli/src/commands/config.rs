use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use proton_shelf_core::{DisplayFilter, SortMethod, TimeDetail};
use proton_shelf_engine::EngineError;
use proton_shelf_lib::{AppDirs, ConfigStore};

use crate::CliError;

/// Print one preference value.
pub(crate) fn run_config_get(key: &str) -> Result<(), CliError> {
    let store = open_store()?;
    match store.get(key) {
        Some(value) => log::info!("{value}"),
        None => log::info!("{}", "not set".if_supports_color(Stdout, |t| t.dimmed())),
    }
    Ok(())
}

/// Write one preference value.
pub(crate) fn run_config_set(key: &str, value: &str) -> Result<(), CliError> {
    validate_known_key(key, value)?;
    let store = open_store()?;
    store.set(key, value).map_err(EngineError::from)?;
    log::info!(
        "{} {} = {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        key.if_supports_color(Stdout, |t| t.cyan()),
        value,
    );
    Ok(())
}

/// Print the preferences file path.
pub(crate) fn run_config_path() -> Result<(), CliError> {
    let dirs = AppDirs::resolve().map_err(EngineError::from)?;
    log::info!("{}", dirs.config_path().display());
    Ok(())
}

fn open_store() -> Result<ConfigStore, CliError> {
    let dirs = AppDirs::resolve().map_err(EngineError::from)?;
    Ok(ConfigStore::new(dirs.config_path()))
}

/// Keys with a closed value set get checked before anything is written;
/// a typo would otherwise silently fall back to the default on read.
fn validate_known_key(key: &str, value: &str) -> Result<(), CliError> {
    let parsed = match key {
        "library.sort_method" => value.parse::<SortMethod>().map(|_| ()).map_err(|e| e.to_string()),
        "library.display_filter" => value.parse::<DisplayFilter>().map(|_| ()).map_err(|e| e.to_string()),
        "appearance.time_detail" => value.parse::<TimeDetail>().map(|_| ()).map_err(|e| e.to_string()),
        _ => Ok(()),
    };
    parsed.map_err(CliError::config)
}
