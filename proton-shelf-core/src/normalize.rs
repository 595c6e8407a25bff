//! Canonical game-name normalization.
//!
//! Catalog matching never compares raw titles. Both the catalog index and
//! every resolver candidate are passed through [`normalize`] first, so that
//! `"The Witcher® 3: Wild Hunt"`, `"the witcher 3 wild hunt"` and
//! `"The-Witcher-3-Wild-Hunt"` all land on the same key.
//!
//! The transform is deterministic, does no I/O, and is idempotent:
//! `normalize(normalize(x)) == normalize(x)` for any input.

/// Keywords dropped from normalized names wherever they appear.
///
/// Publishers decorate re-releases with these; the store catalog usually
/// lists the base title.
const EDITION_KEYWORDS: &[&str] = &["ultimate", "edition", "definitive", "complete", "remastered"];

/// Tokens dropped from the end of a normalized name.
///
/// Shipping executables often live in `<Game>/bin/` or ship as `GameApp.exe`,
/// which leaks `bin`/`app` into folder- and filename-derived candidates.
const TRAILING_TOKENS: &[&str] = &["bin", "app"];

/// Substrings that disqualify a candidate from catalog lookup entirely.
///
/// These show up in Unreal/Unity shipping-binary names and would otherwise
/// produce junk matches.
const INVALID_MARKERS: &[&str] = &["win32", "win64", "win 64 shipping", "gamelauncher"];

/// Executable metadata values that name a launcher rather than a game.
///
/// `ProductName`/`FileDescription` probes on stub binaries commonly return
/// one of these; they must not become lookup candidates.
const GENERIC_LAUNCHER_NAMES: &[&str] = &[
    "launcher",
    "game launcher",
    "gamelauncher",
    "bootstrapper",
    "setup",
    "installer",
];

/// Normalize a title into its canonical lookup form.
///
/// Steps: lowercase; strip `™`/`®`; turn `-`, `:` and `,` into spaces;
/// collapse whitespace; drop edition keywords; drop trailing `bin`/`app`
/// tokens.
///
/// # Examples
///
/// ```
/// use proton_shelf_core::normalize::normalize;
///
/// assert_eq!(normalize("Half-Life 2"), "half life 2");
/// assert_eq!(normalize("DOOM™ Eternal"), "doom eternal");
/// assert_eq!(
///     normalize("The Witcher 3: Wild Hunt - Game of the Year Edition"),
///     "the witcher 3 wild hunt game of the year"
/// );
/// ```
pub fn normalize(name: &str) -> String {
    let mut text = name.to_lowercase();
    for glyph in ["™", "®"] {
        text = text.replace(glyph, "");
    }
    for separator in ['-', ':', ','] {
        text = text.replace(separator, " ");
    }

    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.retain(|token| !EDITION_KEYWORDS.contains(token));
    while tokens.last().is_some_and(|token| TRAILING_TOKENS.contains(token)) {
        tokens.pop();
    }
    tokens.join(" ")
}

/// Whether a string may be used as a catalog lookup candidate.
///
/// Rejects empty results and anything carrying a shipping-binary marker.
pub fn is_valid_candidate(name: &str) -> bool {
    let normalized = normalize(name);
    if normalized.is_empty() {
        return false;
    }
    !INVALID_MARKERS.iter().any(|marker| normalized.contains(marker))
}

/// Whether a probed executable name is a known generic launcher label.
pub fn is_generic_launcher_name(name: &str) -> bool {
    let normalized = normalize(name);
    GENERIC_LAUNCHER_NAMES.iter().any(|generic| normalized == *generic)
}

/// Capitalize the first character and lowercase the rest.
///
/// Used for the display name of unresolved entries, where only the raw
/// executable basename is available.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_trademark_glyphs() {
        assert_eq!(normalize("DOOM™ Eternal"), "doom eternal");
        assert_eq!(normalize("Tekken® 8"), "tekken 8");
    }

    #[test]
    fn separators_become_spaces_and_runs_collapse() {
        assert_eq!(normalize("Half-Life 2"), "half life 2");
        assert_eq!(normalize("Deus  Ex:  Mankind   Divided"), "deus ex mankind divided");
        assert_eq!(normalize("Crypt of the NecroDancer, Deluxe"), "crypt of the necrodancer deluxe");
    }

    #[test]
    fn edition_keywords_are_dropped() {
        assert_eq!(
            normalize("The Witcher 3: Wild Hunt - Game of the Year Edition"),
            "the witcher 3 wild hunt game of the year"
        );
        assert_eq!(normalize("Skyrim Ultimate Definitive Remastered"), "skyrim");
    }

    #[test]
    fn trailing_bin_and_app_tokens_are_dropped() {
        assert_eq!(normalize("Cyberpunk2077 bin"), "cyberpunk2077");
        assert_eq!(normalize("Celeste App"), "celeste");
        // Only trailing tokens are affected.
        assert_eq!(normalize("bin weevils"), "bin weevils");
    }

    #[test]
    fn normalization_is_idempotent() {
        for name in [
            "The Witcher 3: Wild Hunt - Game of the Year Edition",
            "MyIndieGame",
            "Cyberpunk2077 bin",
            "Game Edition bin",
            "bin edition",
            "",
        ] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once, "not idempotent for {name:?}");
        }
    }

    #[test]
    fn shipping_binary_names_are_invalid_candidates() {
        assert!(!is_valid_candidate("FortniteClient-Win64-Shipping"));
        assert!(!is_valid_candidate("launcher-Win32.exe stub"));
        assert!(!is_valid_candidate("GameLauncher"));
        assert!(!is_valid_candidate("   "));
        assert!(is_valid_candidate("Half-Life 2"));
    }

    #[test]
    fn generic_launcher_names_are_flagged() {
        assert!(is_generic_launcher_name("Launcher"));
        assert!(is_generic_launcher_name("Game Launcher"));
        assert!(is_generic_launcher_name("Setup"));
        assert!(!is_generic_launcher_name("Rocket Launcher Simulator"));
    }

    #[test]
    fn capitalize_matches_fallback_naming() {
        assert_eq!(capitalize("MyIndieGame"), "Myindiegame");
        assert_eq!(capitalize("hl2"), "Hl2");
        assert_eq!(capitalize(""), "");
    }
}
