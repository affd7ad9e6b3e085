//! Picks the registry candidate that best corresponds to an input name.

use std::cmp::Ordering;

use crate::model::{CandidateRecord, MatchResult};
use crate::normalize::{cache_key, company_tokens};

const NAME_WEIGHT: f64 = 0.60;
const STATUS_WEIGHT: f64 = 0.25;
const DATA_WEIGHT: f64 = 0.15;

/// Minimum normalized Levenshtein similarity for two tokens to pair up.
const TOKEN_MATCH_THRESHOLD: f64 = 0.85;

/// Scores closer than this are ties.
const SCORE_EPSILON: f64 = 1e-9;

/// Similarity of two company names in [0, 1].
///
/// Names are compared after [`company_tokens`] normalization. Identical token
/// lists score 1.0; otherwise tokens are paired greedily (each token at most
/// once, pairs need a normalized Levenshtein similarity of at least 0.85) and
/// the score is the Sørensen-Dice coefficient `2·pairs / (|a| + |b|)`.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let left = company_tokens(a);
    let right = company_tokens(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    if left == right {
        return 1.0;
    }

    let mut used = vec![false; right.len()];
    let mut pairs = 0usize;
    for token in &left {
        let partner = right
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .map(|(i, other)| (i, strsim::normalized_levenshtein(token, other)))
            .filter(|(_, score)| *score >= TOKEN_MATCH_THRESHOLD)
            .max_by(|x, y| x.1.partial_cmp(&y.1).unwrap_or(Ordering::Equal));
        if let Some((i, _)) = partner {
            used[i] = true;
            pairs += 1;
        }
    }

    (2 * pairs) as f64 / (left.len() + right.len()) as f64
}

/// Weighted score of one candidate against the input name.
#[cfg(test)]
fn candidate_score(input_name: &str, candidate: &CandidateRecord) -> f64 {
    weighted(name_similarity(input_name, &candidate.name), candidate)
}

fn weighted(similarity: f64, candidate: &CandidateRecord) -> f64 {
    let status = if candidate.active { 1.0 } else { 0.0 };
    let data = if candidate.has_industry_codes() { 1.0 } else { 0.0 };
    NAME_WEIGHT * similarity + STATUS_WEIGHT * status + DATA_WEIGHT * data
}

struct Scored {
    index: usize,
    score: f64,
    similarity: f64,
    exact: bool,
    code_count: usize,
}

impl Scored {
    /// Strictly better than `other`. Candidates are visited in input order,
    /// so a full tie keeps the earlier one.
    fn beats(&self, other: &Scored) -> bool {
        if (self.score - other.score).abs() > SCORE_EPSILON {
            return self.score > other.score;
        }
        if self.exact != other.exact {
            return self.exact;
        }
        self.code_count > other.code_count
    }
}

/// Select the best candidate for `input_name`.
///
/// `exact_name_match` is set only when the selected record's name equals the
/// input after lowercasing and whitespace collapsing; a differing legal suffix
/// is not exact.
///
/// Candidates without a name or registry key are skipped and counted in
/// `skipped_malformed`. An empty (or fully malformed) candidate list yields
/// [`MatchResult::empty`] with the counters filled in.
pub fn select_best_match(input_name: &str, candidates: &[CandidateRecord]) -> MatchResult {
    let input_key = cache_key(input_name);
    let mut skipped_malformed = 0;
    let mut candidate_count = 0;
    let mut best: Option<Scored> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        if !candidate.is_well_formed() {
            tracing::debug!("Skipping malformed candidate at position {}", index);
            skipped_malformed += 1;
            continue;
        }
        candidate_count += 1;

        let similarity = name_similarity(input_name, &candidate.name);
        let exact = !input_key.is_empty() && cache_key(&candidate.name) == input_key;
        let scored = Scored {
            index,
            score: weighted(similarity, candidate),
            similarity,
            exact,
            code_count: candidate.industry_codes.len(),
        };
        tracing::debug!(
            "{:?} vs {:?} ({}): similarity={:.3} active={} codes={} score={:.3}",
            input_name,
            candidate.name,
            candidate.org_number,
            similarity,
            candidate.active,
            scored.code_count,
            scored.score
        );

        if best.as_ref().map_or(true, |current| scored.beats(current)) {
            best = Some(scored);
        }
    }

    match best {
        Some(winner) => MatchResult {
            record: Some(candidates[winner.index].clone()),
            similarity: winner.similarity,
            exact_name_match: winner.exact,
            candidate_count,
            skipped_malformed,
        },
        None => MatchResult {
            candidate_count,
            skipped_malformed,
            ..MatchResult::empty()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IndustryCode;

    fn candidate(org: &str, name: &str, active: bool, codes: &[&str]) -> CandidateRecord {
        CandidateRecord {
            org_number: org.to_string(),
            name: name.to_string(),
            active,
            industry_codes: codes.iter().map(|c| IndustryCode::new(c, "")).collect(),
            org_form: None,
            activities: Vec::new(),
        }
    }

    #[test]
    fn test_similarity_identical_after_normalization() {
        assert_eq!(name_similarity("Equinor ASA", "EQUINOR  asa"), 1.0);
        assert_eq!(name_similarity("Equinor", "Equinor ASA"), 1.0);
    }

    #[test]
    fn test_similarity_partial_overlap() {
        let score = name_similarity("Equinor", "Equinor Energy AS");
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_tolerates_typos() {
        // "equinr" vs "equinor" has normalized Levenshtein 6/7
        let score = name_similarity("Equinr Kantine", "Equinor Kantine AS");
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_disjoint_is_zero() {
        assert_eq!(name_similarity("Rema 1000", "Elkjøp Nordic AS"), 0.0);
        assert_eq!(name_similarity("", "Elkjøp Nordic AS"), 0.0);
    }

    #[test]
    fn test_empty_candidates() {
        let result = select_best_match("Equinor ASA", &[]);
        assert!(result.record.is_none());
        assert_eq!(result.similarity, 0.0);
        assert!(!result.exact_name_match);
        assert_eq!(result.candidate_count, 0);
    }

    #[test]
    fn test_exact_active_candidate_selected() {
        let candidates = vec![
            candidate("990888213", "EQUINOR ENERGY AS", true, &["06.100"]),
            candidate("923609016", "EQUINOR ASA", true, &["06.100", "06.200"]),
            candidate("912345670", "EQUINOR KANTINE AS", false, &[]),
        ];
        let result = select_best_match("Equinor ASA", &candidates);
        let record = result.record.unwrap();
        assert_eq!(record.org_number, "923609016");
        assert!(result.exact_name_match);
        assert_eq!(result.similarity, 1.0);
        assert_eq!(result.candidate_count, 3);
    }

    #[test]
    fn test_active_beats_inactive_with_same_name() {
        let candidates = vec![
            candidate("1", "Nordic Sko AS", false, &["47.72"]),
            candidate("2", "Nordic Sko AS", true, &["47.72"]),
        ];
        let result = select_best_match("Nordic Sko", &candidates);
        assert_eq!(result.record.unwrap().org_number, "2");
    }

    #[test]
    fn test_malformed_candidates_skipped() {
        let candidates = vec![
            candidate("", "Nordic Sko AS", true, &["47.72"]),
            candidate("3", "  ", true, &["47.72"]),
            candidate("4", "Nordic Sko AS", false, &[]),
        ];
        let result = select_best_match("Nordic Sko", &candidates);
        assert_eq!(result.record.unwrap().org_number, "4");
        assert_eq!(result.candidate_count, 1);
        assert_eq!(result.skipped_malformed, 2);
    }

    #[test]
    fn test_all_malformed_is_empty_match() {
        let candidates = vec![candidate("", "", true, &[])];
        let result = select_best_match("Nordic Sko", &candidates);
        assert!(result.record.is_none());
        assert_eq!(result.candidate_count, 0);
        assert_eq!(result.skipped_malformed, 1);
    }

    #[test]
    fn test_tie_prefers_more_codes() {
        // Identical names: same score, second has more codes
        let candidates = vec![
            candidate("1", "Fjord Handel AS", true, &["47.190"]),
            candidate("2", "Fjord Handel AS", true, &["47.190", "46.900"]),
        ];
        let result = select_best_match("Fjord Handel", &candidates);
        assert_eq!(result.record.unwrap().org_number, "2");
    }

    #[test]
    fn test_differing_legal_suffix_is_not_exact() {
        let candidates = vec![candidate("1", "FJORD HANDEL ASA", true, &["06.100"])];
        let result = select_best_match("Fjord Handel AS", &candidates);
        assert_eq!(result.similarity, 1.0);
        assert!(!result.exact_name_match);

        let result = select_best_match("Equinor", &[candidate("2", "EQUINOR ASA", true, &["06.100"])]);
        assert!(!result.exact_name_match);

        let result = select_best_match("  fjord   handel asa", &candidates);
        assert!(result.exact_name_match);
    }

    #[test]
    fn test_exact_name_wins_score_tie() {
        let candidates = vec![
            candidate("1", "Fjord Handel AS", true, &["47.190"]),
            candidate("2", "Fjord Handel", true, &["46.900"]),
        ];
        let result = select_best_match("Fjord Handel", &candidates);
        assert_eq!(result.record.unwrap().org_number, "2");
        assert!(result.exact_name_match);
    }

    #[test]
    fn test_full_tie_keeps_earlier_candidate() {
        let candidates = vec![
            candidate("1", "Fjord Handel AS", true, &["47.190"]),
            candidate("2", "Fjord Handel ASA", true, &["46.900"]),
        ];
        let result = select_best_match("Fjord Handel", &candidates);
        assert_eq!(result.record.unwrap().org_number, "1");
    }

    #[test]
    fn test_selected_score_dominates() {
        let sets = vec![
            vec![
                candidate("1", "Oslo Bakeri AS", true, &[]),
                candidate("2", "Oslo Bakeri Drift AS", true, &["10.710"]),
                candidate("3", "Bergen Bakeri AS", false, &["10.710"]),
            ],
            vec![
                candidate("4", "Sport 1 Oslo", false, &["47.640"]),
                candidate("5", "Sportsklubben Oslo", true, &[]),
            ],
            vec![candidate("6", "Helt Annet Navn AS", true, &["62.010"])],
        ];
        for (input, set) in ["Oslo Bakeri", "Sport 1", "Oslo Bakeri"].iter().zip(&sets) {
            let result = select_best_match(input, set);
            let chosen = result.record.unwrap();
            let chosen_score = candidate_score(input, &chosen);
            for other in set {
                assert!(
                    chosen_score + SCORE_EPSILON >= candidate_score(input, other),
                    "{} should not beat selected {}",
                    other.name,
                    chosen.name
                );
            }
        }
    }
}
