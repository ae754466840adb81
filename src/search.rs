use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::library::LibrarySnapshot;
use crate::model::TrackList;

/// Fuzzy search over the indexed library 🔍
///
/// Returns a fresh canonical list: repeating the same query is a new search,
/// so playing from it resets the queue, while re-playing rows of one result
/// page keeps continuity.
pub fn search_tracks(snapshot: &LibrarySnapshot, query: &str, limit: usize) -> TrackList {
    if query.trim().is_empty() {
        return TrackList::empty();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, usize)> = snapshot
        .all
        .tracks()
        .iter()
        .enumerate()
        .filter_map(|(i, track)| {
            let haystack = format!("{} {} {}", track.title, track.artist, track.album);
            matcher.fuzzy_match(&haystack, query).map(|score| (score, i))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    TrackList::new(
        scored
            .into_iter()
            .take(limit)
            .map(|(_, i)| snapshot.all.tracks()[i].clone())
            .collect(),
    )
}
