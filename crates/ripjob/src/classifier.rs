use std::collections::HashSet;

use log::debug;
use thiserror::Error;

use crate::probe::Title;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    /// A single-title disc can't be classified heuristically; the user has
    /// to check it out manually.
    #[error("this doesn't look like a TV show disc ({0} title(s), need at least 2)")]
    NotATvShow(usize),
}

/// Keep only the titles that look like real TV episodes.
///
/// Most TV discs hold a handful of similar-length episodes plus short extras
/// (menus, trailers, bonus features), and sometimes one long title that is
/// every episode concatenated. The second-longest title is taken as the
/// baseline so a concatenated play-all title can't anchor the window, and
/// any title within `threshold` of the baseline duration is kept.
///
/// The occasional double-length episode falls outside the window and is not
/// special-cased.
///
/// Survivors come back in title-id order; duration order is internal only.
pub fn filter_episodes(titles: &[Title], threshold: f64) -> Result<Vec<Title>, ClassifyError> {
    if titles.len() < 2 {
        return Err(ClassifyError::NotATvShow(titles.len()));
    }

    let mut by_duration: Vec<Title> = titles.to_vec();
    by_duration.sort_by_key(|t| t.duration);

    let base = by_duration[by_duration.len() - 2].duration;
    let tolerance = (threshold * base as f64) as u64;
    let min_length = base.saturating_sub(tolerance);
    let max_length = base + tolerance;
    debug!("baseline duration is {base} sec, window {min_length}..={max_length}");

    let mut kept = Vec::new();
    for title in by_duration {
        if title.duration >= min_length && title.duration <= max_length {
            kept.push(title);
        } else {
            debug!(
                "skipping title {} because it doesn't appear to be the right length: {} sec",
                title.id, title.duration
            );
        }
    }

    kept.sort_by_key(|t| t.id);
    Ok(kept)
}

/// Flag titles that duplicate an earlier title's duration exactly.
///
/// The first title seen with a given duration is canonical and never
/// flagged; every later title sharing that duration is, in iteration order.
/// Matching is exact, so an encode that ran a second longer is not caught.
pub fn find_duplicates(titles: &[Title]) -> Vec<u32> {
    let mut seen: HashSet<u64> = HashSet::new();
    let mut flagged = Vec::new();
    for title in titles {
        if !seen.insert(title.duration) {
            flagged.push(title.id);
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn title(id: u32, duration: u64) -> Title {
        Title {
            id,
            duration,
            subtitles: BTreeMap::new(),
        }
    }

    fn titles_from(durations: &[u64]) -> Vec<Title> {
        durations
            .iter()
            .enumerate()
            .map(|(i, &d)| title(i as u32 + 1, d))
            .collect()
    }

    #[test]
    fn season_disc_keeps_episodes_and_drops_extras() {
        // Five titles: menu (120), preview reel (300), three episodes around
        // 3550 sec. Baseline is the second-longest (3550), tolerance 355,
        // window 3195..=3905.
        let titles = titles_from(&[300, 3600, 3500, 3550, 120]);
        let kept = filter_episodes(&titles, 0.10).unwrap();
        let durations: Vec<u64> = kept.iter().map(|t| t.duration).collect();
        assert_eq!(durations, vec![3600, 3500, 3550]);
        let ids: Vec<u32> = kept.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn too_few_titles_is_not_a_tv_show() {
        assert_eq!(filter_episodes(&[], 0.10), Err(ClassifyError::NotATvShow(0)));
        assert_eq!(
            filter_episodes(&titles_from(&[1500]), 0.10),
            Err(ClassifyError::NotATvShow(1))
        );
    }

    #[test]
    fn exactly_two_titles_both_pass() {
        // The baseline is the shorter of the two, which always sits inside
        // its own window; the longer passes when it is close enough.
        let kept = filter_episodes(&titles_from(&[1400, 1500]), 0.10).unwrap();
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn zero_threshold_keeps_exact_baseline_only() {
        let kept = filter_episodes(&titles_from(&[1500, 1500, 1501]), 0.0).unwrap();
        let durations: Vec<u64> = kept.iter().map(|t| t.duration).collect();
        assert_eq!(durations, vec![1500, 1500]);
    }

    #[test]
    fn results_are_in_title_id_order() {
        let titles = vec![title(7, 1500), title(2, 1490), title(5, 1510)];
        let kept = filter_episodes(&titles, 0.10).unwrap();
        let ids: Vec<u32> = kept.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 5, 7]);
    }

    #[test]
    fn duplicate_flags_later_title_regardless_of_id() {
        // Higher id comes first in iteration order, so it stays canonical.
        let titles = vec![title(9, 1500), title(1, 1500), title(3, 900)];
        assert_eq!(find_duplicates(&titles), vec![1]);
    }

    #[test]
    fn duplicates_do_not_mutate_input() {
        let titles = titles_from(&[1500, 1500, 1500]);
        let flagged = find_duplicates(&titles);
        assert_eq!(flagged, vec![2, 3]);
        assert_eq!(titles.len(), 3);
    }

    proptest! {
        #[test]
        fn window_always_contains_second_longest(
            durations in prop::collection::vec(0u64..100_000, 2..12),
            threshold in 0.0f64..1.0,
        ) {
            let titles = titles_from(&durations);
            let kept = filter_episodes(&titles, threshold).unwrap();

            let mut sorted = durations.clone();
            sorted.sort_unstable();
            let base = sorted[sorted.len() - 2];

            prop_assert!(
                kept.iter().any(|t| t.duration == base),
                "baseline duration {} must survive its own window", base
            );
        }

        #[test]
        fn survivors_are_a_subset_in_id_order(
            durations in prop::collection::vec(0u64..100_000, 2..12),
        ) {
            let titles = titles_from(&durations);
            let kept = filter_episodes(&titles, 0.10).unwrap();

            let ids: Vec<u32> = kept.iter().map(|t| t.id).collect();
            let mut sorted_ids = ids.clone();
            sorted_ids.sort_unstable();
            prop_assert_eq!(&ids, &sorted_ids);

            for t in &kept {
                prop_assert!(titles.contains(t));
            }
        }

        #[test]
        fn duplicate_detection_is_idempotent(
            durations in prop::collection::vec(0u64..10_000, 0..12),
        ) {
            let titles = titles_from(&durations);
            let flagged = find_duplicates(&titles);

            let deduped: Vec<Title> = titles
                .iter()
                .filter(|t| !flagged.contains(&t.id))
                .cloned()
                .collect();
            prop_assert!(find_duplicates(&deduped).is_empty());
        }
    }
}
