//! Filtering and ordering of published entries into presentation cards.
//!
//! The view model is pure: it reads the entry list plus the current
//! preferences and emits [`CardDescriptor`]s carrying raw numbers. Turning
//! seconds and epochs into human text is the presentation layer's job.

use std::cmp::Reverse;

use proton_shelf_core::{
    AntiCheatStatus, CatalogEntry, CoverSource, DisplayFilter, SortMethod, TimeDetail,
};

/// One library card, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDescriptor {
    pub id: String,
    pub display_name: String,
    pub cover_source: CoverSource,
    pub anti_cheat: AntiCheatStatus,
    /// Ordinal of `anti_cheat`; higher is better.
    pub anti_cheat_rank: u8,
    pub origin_badge: &'static str,
    pub play_seconds: u64,
    /// 0 when the entry has never been launched.
    pub last_launch_epoch: i64,
    /// How verbose time rendering should be, per the user preference.
    pub time_detail: TimeDetail,
}

/// The ordered card list together with the preferences that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub cards: Vec<CardDescriptor>,
    pub sort_method: SortMethod,
    pub display_filter: DisplayFilter,
}

/// Apply the current filter and sort to the published entries.
///
/// All sorts are stable, so ties keep the deterministic entry-id order the
/// aggregator publishes in.
pub fn build_snapshot(
    entries: &[CatalogEntry],
    sort_method: SortMethod,
    display_filter: DisplayFilter,
    time_detail: TimeDetail,
) -> Snapshot {
    let mut cards: Vec<CardDescriptor> = entries
        .iter()
        .filter(|entry| passes_filter(entry, display_filter))
        .map(|entry| card(entry, time_detail))
        .collect();
    sort_cards(&mut cards, sort_method);
    Snapshot {
        cards,
        sort_method,
        display_filter,
    }
}

fn passes_filter(entry: &CatalogEntry, filter: DisplayFilter) -> bool {
    match filter {
        DisplayFilter::All => true,
        DisplayFilter::Favorites => entry.is_favorite,
        DisplayFilter::Compatible => matches!(
            entry.anti_cheat_status,
            AntiCheatStatus::Supported | AntiCheatStatus::Running | AntiCheatStatus::Planned
        ),
    }
}

fn card(entry: &CatalogEntry, time_detail: TimeDetail) -> CardDescriptor {
    CardDescriptor {
        id: entry.id.clone(),
        display_name: entry.display_name.clone(),
        cover_source: entry.cover.clone(),
        anti_cheat: entry.anti_cheat_status,
        anti_cheat_rank: entry.anti_cheat_status.rank(),
        origin_badge: entry.origin.badge(),
        play_seconds: entry.play_stats.total_seconds,
        last_launch_epoch: entry.play_stats.last_launch_epoch,
        time_detail,
    }
}

fn sort_cards(cards: &mut [CardDescriptor], method: SortMethod) {
    match method {
        // Descending epoch; never-launched entries (epoch 0) land last.
        SortMethod::LastLaunch => cards.sort_by_key(|c| Reverse(c.last_launch_epoch)),
        SortMethod::PlayTime => cards.sort_by_key(|c| Reverse(c.play_seconds)),
        SortMethod::Name => cards.sort_by_key(|c| c.display_name.to_lowercase()),
        SortMethod::AntiCheat => cards.sort_by_key(|c| Reverse(c.anti_cheat_rank)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proton_shelf_core::{ControllerSupport, Origin, PlayStats, Resolution};

    fn entry(
        id: &str,
        name: &str,
        status: AntiCheatStatus,
        seconds: u64,
        epoch: i64,
        favorite: bool,
    ) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            display_name: name.to_string(),
            description: String::new(),
            cover: CoverSource::Placeholder,
            controller_support: ControllerSupport::Unknown,
            anti_cheat_status: status,
            exec_command: vec!["wine".into(), format!("{id}.exe")],
            origin: Origin::DesktopShortcut,
            origin_key: format!("{id}.desktop"),
            executable: None,
            play_stats: PlayStats {
                total_seconds: seconds,
                last_launch_epoch: epoch,
            },
            is_favorite: favorite,
            resolution: Resolution::Unresolved {
                reason: "no catalog match".to_string(),
            },
        }
    }

    fn names(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.cards.iter().map(|c| c.display_name.as_str()).collect()
    }

    #[test]
    fn last_launch_sorts_descending_with_never_launched_last() {
        let entries = vec![
            entry("a", "Never Played", AntiCheatStatus::Unknown, 0, 0, false),
            entry("b", "Played Long Ago", AntiCheatStatus::Unknown, 10, 1_700_000_000, false),
            entry("c", "Played Recently", AntiCheatStatus::Unknown, 10, 1_710_000_000, false),
        ];
        let snapshot = build_snapshot(
            &entries,
            SortMethod::LastLaunch,
            DisplayFilter::All,
            TimeDetail::Detailed,
        );
        assert_eq!(names(&snapshot), vec!["Played Recently", "Played Long Ago", "Never Played"]);
    }

    #[test]
    fn name_sort_is_case_insensitive() {
        let entries = vec![
            entry("a", "zelda-like", AntiCheatStatus::Unknown, 0, 0, false),
            entry("b", "Axiom Verge", AntiCheatStatus::Unknown, 0, 0, false),
            entry("c", "celeste", AntiCheatStatus::Unknown, 0, 0, false),
        ];
        let snapshot = build_snapshot(
            &entries,
            SortMethod::Name,
            DisplayFilter::All,
            TimeDetail::Brief,
        );
        assert_eq!(names(&snapshot), vec!["Axiom Verge", "celeste", "zelda-like"]);
    }

    #[test]
    fn anti_cheat_sort_uses_status_rank() {
        let entries = vec![
            entry("a", "Denied Game", AntiCheatStatus::Denied, 0, 0, false),
            entry("b", "Supported Game", AntiCheatStatus::Supported, 0, 0, false),
            entry("c", "Unknown Game", AntiCheatStatus::Unknown, 0, 0, false),
            entry("d", "Running Game", AntiCheatStatus::Running, 0, 0, false),
        ];
        let snapshot = build_snapshot(
            &entries,
            SortMethod::AntiCheat,
            DisplayFilter::All,
            TimeDetail::Detailed,
        );
        assert_eq!(
            names(&snapshot),
            vec!["Supported Game", "Running Game", "Denied Game", "Unknown Game"]
        );
    }

    #[test]
    fn sorts_are_stable_on_equal_keys() {
        let entries = vec![
            entry("a", "First", AntiCheatStatus::Unknown, 60, 0, false),
            entry("b", "Second", AntiCheatStatus::Unknown, 60, 0, false),
            entry("c", "Third", AntiCheatStatus::Unknown, 60, 0, false),
        ];
        let snapshot = build_snapshot(
            &entries,
            SortMethod::PlayTime,
            DisplayFilter::All,
            TimeDetail::Detailed,
        );
        assert_eq!(names(&snapshot), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn favorites_filter_keeps_only_favorites() {
        let entries = vec![
            entry("a", "Loved", AntiCheatStatus::Unknown, 0, 0, true),
            entry("b", "Meh", AntiCheatStatus::Unknown, 0, 0, false),
        ];
        let snapshot = build_snapshot(
            &entries,
            SortMethod::Name,
            DisplayFilter::Favorites,
            TimeDetail::Detailed,
        );
        assert_eq!(names(&snapshot), vec!["Loved"]);
    }

    #[test]
    fn compatible_filter_admits_supported_running_planned() {
        let entries = vec![
            entry("a", "Supported", AntiCheatStatus::Supported, 0, 0, false),
            entry("b", "Running", AntiCheatStatus::Running, 0, 0, false),
            entry("c", "Planned", AntiCheatStatus::Planned, 0, 0, false),
            entry("d", "Broken", AntiCheatStatus::Broken, 0, 0, false),
            entry("e", "Denied", AntiCheatStatus::Denied, 0, 0, false),
            entry("f", "Unknown", AntiCheatStatus::Unknown, 0, 0, false),
        ];
        let snapshot = build_snapshot(
            &entries,
            SortMethod::Name,
            DisplayFilter::Compatible,
            TimeDetail::Detailed,
        );
        assert_eq!(names(&snapshot), vec!["Planned", "Running", "Supported"]);
    }

    #[test]
    fn filter_then_sort_equals_sort_then_filter() {
        let entries = vec![
            entry("a", "Alpha", AntiCheatStatus::Supported, 30, 5, false),
            entry("b", "Beta", AntiCheatStatus::Denied, 90, 9, false),
            entry("c", "Gamma", AntiCheatStatus::Running, 60, 7, false),
            entry("d", "Delta", AntiCheatStatus::Unknown, 60, 7, false),
        ];
        for method in [
            SortMethod::LastLaunch,
            SortMethod::PlayTime,
            SortMethod::Name,
            SortMethod::AntiCheat,
        ] {
            let filtered_first = build_snapshot(
                &entries,
                method,
                DisplayFilter::Compatible,
                TimeDetail::Detailed,
            );
            let mut sorted_first = build_snapshot(
                &entries,
                method,
                DisplayFilter::All,
                TimeDetail::Detailed,
            );
            sorted_first.cards.retain(|card| {
                matches!(
                    card.anti_cheat,
                    AntiCheatStatus::Supported | AntiCheatStatus::Running | AntiCheatStatus::Planned
                )
            });
            assert_eq!(filtered_first.cards, sorted_first.cards, "{method}");
        }
    }

    #[test]
    fn cards_carry_badge_rank_and_time_detail() {
        let entries = vec![entry("a", "Half-Life 2", AntiCheatStatus::Supported, 3_600, 7, false)];
        let snapshot = build_snapshot(
            &entries,
            SortMethod::Name,
            DisplayFilter::All,
            TimeDetail::Brief,
        );
        let card = &snapshot.cards[0];
        assert_eq!(card.origin_badge, "portproton");
        assert_eq!(card.anti_cheat_rank, 5);
        assert_eq!(card.play_seconds, 3_600);
        assert_eq!(card.time_detail, TimeDetail::Brief);
    }
}
