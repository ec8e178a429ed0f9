use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::coerce;
use crate::document::{RankHints, title_id};
use crate::formats::{MovieRecord, RawCandidate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub candidates: usize,
    pub dropped_unranked: usize,
    pub dropped_invalid: usize,
    pub duplicates: usize,
    pub records: usize,
}

enum Placement {
    Placed(MovieRecord),
    Unranked,
    Invalid,
}

pub fn normalize(candidates: &[RawCandidate], rank_hints: &RankHints) -> Vec<MovieRecord> {
    normalize_with_report(candidates, rank_hints).0
}

pub fn normalize_with_report(
    candidates: &[RawCandidate],
    rank_hints: &RankHints,
) -> (Vec<MovieRecord>, NormalizeReport) {
    let mut report = NormalizeReport {
        candidates: candidates.len(),
        ..NormalizeReport::default()
    };
    let mut by_rank: BTreeMap<u32, MovieRecord> = BTreeMap::new();

    for candidate in candidates {
        match place(candidate, rank_hints) {
            Placement::Placed(record) => {
                let rank = record.rank;
                if let Some(previous) = by_rank.insert(rank, record) {
                    report.duplicates += 1;
                    tracing::debug!(rank, replaced = %previous.url, "duplicate rank; keeping later candidate");
                }
            }
            Placement::Unranked => {
                report.dropped_unranked += 1;
                tracing::debug!(
                    url = candidate.get_str("url").unwrap_or_default(),
                    "candidate has no rank hint; dropping"
                );
            }
            Placement::Invalid => report.dropped_invalid += 1,
        }
    }

    let records: Vec<MovieRecord> = by_rank.into_values().collect();
    report.records = records.len();
    (records, report)
}

fn place(candidate: &RawCandidate, rank_hints: &RankHints) -> Placement {
    let Some(url) = candidate.get("url").and_then(coerce::canonical_title_url) else {
        return Placement::Invalid;
    };
    let Some(id) = title_id(url.path()) else {
        return Placement::Invalid;
    };
    let Some(rank) = rank_hints.get(&id) else {
        return Placement::Unranked;
    };
    let Some(name) = candidate.get("name").and_then(coerce::text) else {
        return Placement::Invalid;
    };

    let field = |key: &str| candidate.get(key).and_then(coerce::text);
    let aggregate = candidate.get("aggregateRating").unwrap_or(&Value::Null);

    Placement::Placed(MovieRecord {
        rank,
        url: url.to_string(),
        name,
        alternate_name: field("alternateName"),
        description: field("description"),
        image: candidate.get("image").and_then(coerce::image_url),
        rating_value: coerce::rating_value(aggregate),
        rating_count: coerce::rating_count(aggregate),
        content_rating: field("contentRating"),
        genre: candidate
            .get("genre")
            .map(coerce::genres)
            .unwrap_or_default(),
        duration: candidate.get("duration").and_then(coerce::duration),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn candidate(value: Value) -> RawCandidate {
        match value {
            Value::Object(map) => RawCandidate::new(map),
            other => panic!("expected object, got {other}"),
        }
    }

    fn hints(pairs: &[(&str, u32)]) -> RankHints {
        pairs.iter().map(|(id, r)| ((*id).to_owned(), *r)).collect()
    }

    #[test]
    fn joins_candidates_on_anchor_rank() {
        let candidates = vec![
            candidate(json!({"url": "/title/tt3/", "name": "Third"})),
            candidate(json!({"url": "https://www.imdb.com/title/tt1/", "name": "First"})),
            candidate(json!({"url": "/title/tt2/?ref_=x", "name": "Second"})),
        ];
        let records = normalize(&candidates, &hints(&[("tt1", 1), ("tt2", 2), ("tt3", 3)]));

        let ranks: Vec<u32> = records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(records[0].name, "First");
        assert_eq!(records[1].url, "https://www.imdb.com/title/tt2/");
    }

    #[test]
    fn candidates_without_rank_hint_are_dropped() {
        let candidates = vec![
            candidate(json!({"url": "/title/tt1/", "name": "Ranked"})),
            candidate(json!({"url": "/title/tt9/", "name": "Unranked"})),
        ];
        let (records, report) = normalize_with_report(&candidates, &hints(&[("tt1", 1)]));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Ranked");
        assert_eq!(report.dropped_unranked, 1);
        assert_eq!(report.records, 1);
    }

    #[test]
    fn candidates_without_url_or_name_are_dropped() {
        let candidates = vec![
            candidate(json!({"name": "No url"})),
            candidate(json!({"url": "/title/tt1/"})),
            candidate(json!({"url": "/chart/top/", "name": "Not a title"})),
        ];
        let (records, report) = normalize_with_report(&candidates, &hints(&[("tt1", 1)]));

        assert!(records.is_empty());
        assert_eq!(report.dropped_invalid, 3);
    }

    #[test]
    fn later_candidate_wins_on_rank_collision() {
        let candidates = vec![
            candidate(json!({"url": "/title/tt7/", "name": "Earlier"})),
            candidate(json!({"url": "/title/tt8/", "name": "Later"})),
        ];
        let (records, report) =
            normalize_with_report(&candidates, &hints(&[("tt7", 7), ("tt8", 7)]));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rank, 7);
        assert_eq!(records[0].name, "Later");
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn rank_gaps_are_kept() {
        let candidates = vec![
            candidate(json!({"url": "/title/tt5/", "name": "Five"})),
            candidate(json!({"url": "/title/tt2/", "name": "Two"})),
        ];
        let records = normalize(&candidates, &hints(&[("tt2", 2), ("tt5", 5)]));
        let ranks: Vec<u32> = records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![2, 5]);
    }

    #[test]
    fn bad_fields_degrade_to_absent() {
        let candidates = vec![candidate(json!({
            "url": "/title/tt1/",
            "name": "Shape shifter",
            "aggregateRating": {"ratingValue": "great", "ratingCount": "1,234"},
            "genre": "Drama",
            "duration": {"minutes": 90},
            "image": 42,
            "contentRating": null
        }))];
        let records = normalize(&candidates, &hints(&[("tt1", 1)]));
        let record = &records[0];

        assert_eq!(record.rating_value, None);
        assert_eq!(record.rating_count, Some(1234));
        assert_eq!(record.genre, vec!["Drama"]);
        assert_eq!(record.duration, None);
        assert_eq!(record.image, None);
        assert_eq!(record.content_rating, None);
        assert_eq!(record.alternate_name, None);
    }

    #[test]
    fn output_ranks_are_unique_and_ascending() {
        let candidates: Vec<RawCandidate> = (0..40)
            .map(|i| {
                candidate(json!({
                    "url": format!("/title/tt{}/", i % 25),
                    "name": format!("Movie {i}")
                }))
            })
            .collect();
        let hint_pairs: Vec<(String, u32)> =
            (0..25).rev().enumerate().map(|(pos, i)| (format!("tt{i}"), pos as u32 + 1)).collect();
        let hints: RankHints = hint_pairs.into_iter().collect();

        let records = normalize(&candidates, &hints);
        assert_eq!(records.len(), 25);
        assert!(records.windows(2).all(|w| w[0].rank < w[1].rank));
    }
}
