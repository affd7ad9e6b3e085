//! Turns a match result into a category assignment.
//!
//! Rules are tried in order and the first that yields a category wins:
//! exact industry-code prefix, keywords in the code descriptions, keywords in
//! the names and registered activities, and finally Uncategorized.

use crate::category_map::{Category, CategoryMap};
use crate::model::{
    CandidateRecord, CategorizationMethod, CategoryAssignment, Diagnostics, IndustryCode,
    LookupStatus, MatchResult, UNCATEGORIZED,
};
use crate::normalize::tokenize;

const EXACT_CODE_BASE: f64 = 0.95;
const CODE_KEYWORD_BASE: f64 = 0.75;
const NAME_KEYWORD_BASE: f64 = 0.5;
const NAME_KEYWORD_STEP: f64 = 0.05;
const NAME_KEYWORD_CAP: f64 = 0.6;
const NONE_WITH_CODES_BASE: f64 = 0.2;
const NONE_BASE: f64 = 0.1;

/// Multiplier for a selected record whose name is not an exact match.
const NAME_MISMATCH_PENALTY: f64 = 0.9;

struct Decision<'a> {
    category: &'a Category,
    subsegment: Option<String>,
    base: f64,
    method: CategorizationMethod,
    matched_code: Option<&'a IndustryCode>,
    keywords: Vec<String>,
}

/// Categorize `input_name` from its match result.
///
/// The lookup status is derived from the match: `Matched` when a record was
/// selected, `NoCandidates` otherwise.
pub fn categorize(input_name: &str, match_result: &MatchResult, map: &CategoryMap) -> CategoryAssignment {
    let status = if match_result.record.is_some() {
        LookupStatus::Matched
    } else {
        LookupStatus::NoCandidates
    };
    categorize_with_status(input_name, match_result, map, status)
}

/// Like [`categorize`] with an explicit lookup status, used when the registry
/// call itself failed.
pub fn categorize_with_status(
    input_name: &str,
    match_result: &MatchResult,
    map: &CategoryMap,
    lookup_status: LookupStatus,
) -> CategoryAssignment {
    let record = match_result.record.as_ref();

    let decision = record
        .and_then(|r| by_exact_code(r, map))
        .or_else(|| record.and_then(|r| by_code_keyword(r, map)))
        .or_else(|| by_name_keyword(input_name, record, map));

    let penalized = record.is_some() && !match_result.exact_name_match;
    let adjust = |base: f64| {
        let confidence = if penalized {
            base * NAME_MISMATCH_PENALTY
        } else {
            base
        };
        confidence.clamp(0.0, 1.0)
    };

    let mut diagnostics = Diagnostics {
        matched_code: None,
        matched_code_description: None,
        matching_keywords: Vec::new(),
        candidate_count: match_result.candidate_count,
        skipped_malformed: match_result.skipped_malformed,
        exact_name_match: match_result.exact_name_match,
        selected_company: record.map(|r| r.name.clone()),
        org_number: record.map(|r| r.org_number.clone()),
        industry_code_count: record.map_or(0, |r| r.industry_codes.len()),
        name_similarity: match_result.similarity,
        lookup_status,
    };

    let Some(decision) = decision else {
        let base = if record.map_or(false, CandidateRecord::has_industry_codes) {
            NONE_WITH_CODES_BASE
        } else {
            NONE_BASE
        };
        tracing::debug!("{:?}: no category rule matched", input_name);
        return CategoryAssignment {
            category: UNCATEGORIZED.to_string(),
            category_id: 0,
            subsegment: UNCATEGORIZED.to_string(),
            confidence: adjust(base),
            method: CategorizationMethod::None,
            diagnostics,
        };
    };

    let subsegment = match decision.subsegment {
        Some(subsegment) => subsegment,
        None => map.suggest_subsegment(decision.category, &text_segments(input_name, record, true)),
    };

    diagnostics.matched_code = decision.matched_code.map(|c| c.code.clone());
    diagnostics.matched_code_description = decision
        .matched_code
        .map(|c| c.description.clone())
        .filter(|d| !d.is_empty());
    diagnostics.matching_keywords = decision.keywords;

    tracing::debug!(
        "{:?}: {} via {} (base {:.2})",
        input_name,
        decision.category.name,
        decision.method,
        decision.base
    );

    CategoryAssignment {
        category: decision.category.name.clone(),
        category_id: decision.category.id,
        subsegment,
        confidence: adjust(decision.base),
        method: decision.method,
        diagnostics,
    }
}

/// Primary code first, then the remaining codes in order.
fn by_exact_code<'a>(record: &'a CandidateRecord, map: &'a CategoryMap) -> Option<Decision<'a>> {
    record.industry_codes.iter().find_map(|code| {
        map.resolve_code(&code.code).map(|m| Decision {
            category: m.category,
            subsegment: m.subsegment.map(str::to_string),
            base: EXACT_CODE_BASE,
            method: CategorizationMethod::ExactCode,
            matched_code: Some(code),
            keywords: Vec::new(),
        })
    })
}

fn by_code_keyword<'a>(record: &'a CandidateRecord, map: &'a CategoryMap) -> Option<Decision<'a>> {
    let descriptions: Vec<Vec<String>> = record
        .industry_codes
        .iter()
        .map(|c| tokenize(&c.description))
        .collect();
    let hits = map.best_keyword_match(&descriptions)?;

    // The first code whose description carries one of the winning keywords.
    let matched_code = record
        .industry_codes
        .iter()
        .zip(&descriptions)
        .find(|(_, tokens)| {
            hits.category
                .keywords
                .iter()
                .any(|kw| hits.keywords.contains(&kw.text) && kw.matches(tokens))
        })
        .map(|(code, _)| code);

    Some(Decision {
        category: hits.category,
        subsegment: None,
        base: CODE_KEYWORD_BASE,
        method: CategorizationMethod::CodeKeyword,
        matched_code,
        keywords: hits.keywords,
    })
}

fn by_name_keyword<'a>(
    input_name: &str,
    record: Option<&'a CandidateRecord>,
    map: &'a CategoryMap,
) -> Option<Decision<'a>> {
    let hits = map.best_keyword_match(&text_segments(input_name, record, false))?;
    let extra = hits.keywords.len().saturating_sub(1) as f64;
    let base = (NAME_KEYWORD_BASE + NAME_KEYWORD_STEP * extra).min(NAME_KEYWORD_CAP);

    Some(Decision {
        category: hits.category,
        subsegment: None,
        base,
        method: CategorizationMethod::NameKeyword,
        matched_code: None,
        keywords: hits.keywords,
    })
}

/// Tokenized text available for keyword scanning: the input name, the
/// selected record's name and activities, and optionally its code
/// descriptions.
fn text_segments(
    input_name: &str,
    record: Option<&CandidateRecord>,
    include_code_descriptions: bool,
) -> Vec<Vec<String>> {
    let mut segments = vec![tokenize(input_name)];
    if let Some(record) = record {
        segments.push(tokenize(&record.name));
        segments.extend(record.activities.iter().map(|a| tokenize(a)));
        if include_code_descriptions {
            segments.extend(record.industry_codes.iter().map(|c| tokenize(&c.description)));
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::select_best_match;

    fn map() -> CategoryMap {
        CategoryMap::load_default().unwrap()
    }

    fn record(name: &str, codes: &[(&str, &str)], activities: &[&str]) -> CandidateRecord {
        CandidateRecord {
            org_number: "999999999".to_string(),
            name: name.to_string(),
            active: true,
            industry_codes: codes.iter().map(|(c, d)| IndustryCode::new(c, d)).collect(),
            org_form: Some("AS".to_string()),
            activities: activities.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn matched(record: CandidateRecord, exact: bool) -> MatchResult {
        MatchResult {
            similarity: if exact { 1.0 } else { 0.5 },
            exact_name_match: exact,
            candidate_count: 1,
            skipped_malformed: 0,
            record: Some(record),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_equinor_exact_code() {
        let candidates = vec![record(
            "EQUINOR ASA",
            &[("06.100", "Utvinning av råolje"), ("06.200", "Utvinning av naturgass")],
            &[],
        )];
        let m = select_best_match("Equinor ASA", &candidates);
        let a = categorize("Equinor ASA", &m, &map());
        assert_eq!(a.category, "Energy, Utilities & Recycling");
        assert_eq!(a.category_id, 8);
        assert_eq!(a.subsegment, "Energy");
        assert_eq!(a.method, CategorizationMethod::ExactCode);
        assert!(approx(a.confidence, 0.95));
        assert!(a.diagnostics.exact_name_match);
        assert_eq!(a.diagnostics.matched_code.as_deref(), Some("06.100"));
        assert_eq!(a.diagnostics.lookup_status, LookupStatus::Matched);
        assert!(a.categorized_by_code());
    }

    #[test]
    fn test_exact_code_falls_through_to_secondary_code() {
        let r = record("Fjord AS", &[("00.000", "Uoppgitt"), ("47.730", "Apotek")], &[]);
        let a = categorize("Fjord AS", &matched(r, true), &map());
        assert_eq!(a.category, "Beauty, Health & Well-Being");
        assert_eq!(a.subsegment, "Pharmaceuticals and Medical Equipment");
        assert_eq!(a.diagnostics.matched_code.as_deref(), Some("47.730"));
    }

    #[test]
    fn test_category_level_code_suggests_subsegment() {
        // 93 only resolves the category; "kultur" picks the subsegment
        let r = record("Kulturhuset AS", &[("93.290", "Andre fritidsaktiviteter")], &["Drift av kultur arrangement"]);
        let a = categorize("Kulturhuset", &matched(r, true), &map());
        assert_eq!(a.category, "Services, Trade & Institutions");
        assert_eq!(a.subsegment, "Arts & Culture");
    }

    #[test]
    fn test_code_keyword() {
        let r = record("Nordlys Drift AS", &[("00.000", "Handel med klær og sko")], &[]);
        let a = categorize("Nordlys Drift", &matched(r, true), &map());
        assert_eq!(a.category, "Fashion & Personal Accessories");
        assert_eq!(a.method, CategorizationMethod::CodeKeyword);
        assert!(approx(a.confidence, 0.75));
        assert_eq!(a.diagnostics.matched_code.as_deref(), Some("00.000"));
        assert_eq!(a.diagnostics.matching_keywords, vec!["klær", "sko"]);
    }

    #[test]
    fn test_hm_name_keyword() {
        let candidates = vec![record(
            "H&M HENNES & MAURITZ AS",
            &[],
            &["Detaljhandel med klær og tilbehør"],
        )];
        let m = select_best_match("H&M", &candidates);
        let a = categorize("H&M", &m, &map());
        assert_eq!(a.category, "Fashion & Personal Accessories");
        assert_eq!(a.method, CategorizationMethod::NameKeyword);
        assert!(a.confidence <= 0.6);
        // two hits, 0.55, then the name-mismatch penalty
        assert!(approx(a.confidence, 0.55 * 0.9));
        assert!(a.keyword_match());
    }

    #[test]
    fn test_name_keyword_without_record() {
        let a = categorize("Oslo Sko og Klær", &MatchResult::empty(), &map());
        assert_eq!(a.category, "Fashion & Personal Accessories");
        assert_eq!(a.method, CategorizationMethod::NameKeyword);
        assert!(approx(a.confidence, 0.55));
        assert_eq!(a.diagnostics.lookup_status, LookupStatus::NoCandidates);
    }

    #[test]
    fn test_name_keyword_confidence_capped() {
        let a = categorize(
            "Klær Sko Smykker Klokker Vesker Briller",
            &MatchResult::empty(),
            &map(),
        );
        assert_eq!(a.method, CategorizationMethod::NameKeyword);
        assert!(approx(a.confidence, 0.6));
    }

    #[test]
    fn test_uncategorized_without_evidence() {
        let a = categorize("Xyzzy Qwerty", &MatchResult::empty(), &map());
        assert_eq!(a.category, UNCATEGORIZED);
        assert_eq!(a.subsegment, UNCATEGORIZED);
        assert_eq!(a.category_id, 0);
        assert_eq!(a.method, CategorizationMethod::None);
        assert!(a.confidence >= 0.1 && a.confidence <= 0.2);
        assert!(a.is_uncategorized());
    }

    #[test]
    fn test_uncategorized_with_unresolved_codes() {
        let r = record("Xyzzy AS", &[("00.000", "Uoppgitt")], &[]);
        let a = categorize("Xyzzy", &matched(r, true), &map());
        assert_eq!(a.method, CategorizationMethod::None);
        assert!(approx(a.confidence, 0.2));
        assert_eq!(a.diagnostics.industry_code_count, 1);
    }

    #[test]
    fn test_registry_failure_status_is_kept() {
        let status = LookupStatus::RegistryUnavailable("timeout".to_string());
        let a = categorize_with_status("Xyzzy", &MatchResult::empty(), &map(), status.clone());
        assert_eq!(a.diagnostics.lookup_status, status);
        assert!(a.diagnostics.lookup_status.needs_review());
    }

    #[test]
    fn test_skipped_records_reach_diagnostics() {
        let mut broken = record("Fjord Handel AS", &[("06.100", "")], &[]);
        broken.org_number.clear();
        let good = record("FJORD HANDEL ASA", &[("06.100", "")], &[]);
        let m = select_best_match("Fjord Handel AS", &[broken, good]);
        let a = categorize("Fjord Handel AS", &m, &map());
        assert_eq!(a.diagnostics.candidate_count, 1);
        assert_eq!(a.diagnostics.skipped_malformed, 1);
        assert!(a.diagnostics.needs_review());
        // ASA vs AS is a different registered name
        assert!(!a.diagnostics.exact_name_match);
        assert!(approx(a.confidence, 0.95 * 0.9));
    }

    #[test]
    fn test_penalty_only_when_record_not_exact() {
        let r = record("EQUINOR ASA", &[("06.100", "")], &[]);
        let exact = categorize("Equinor ASA", &matched(r.clone(), true), &map());
        let fuzzy = categorize("Equinr", &matched(r, false), &map());
        assert!(approx(exact.confidence, 0.95));
        assert!(approx(fuzzy.confidence, 0.95 * 0.9));

        // no record: no penalty even though exact is false
        let none = categorize("Xyzzy", &MatchResult::empty(), &map());
        assert!(approx(none.confidence, 0.1));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let r = record("EQUINOR ENERGY AS", &[("06.100", "")], &[]);
        let m = matched(r, false);
        let first = categorize("Equinor", &m, &map());
        let second = categorize("Equinor", &m, &map());
        assert_eq!(first, second);
    }

    #[test]
    fn test_confidence_monotonic_by_method() {
        let map = map();
        for exact in [true, false] {
            let by_code = categorize("Alfa", &matched(record("Alfa AS", &[("06.100", "")], &[]), exact), &map);
            let by_code_kw = categorize(
                "Alfa",
                &matched(record("Alfa AS", &[("00.000", "Handel med sko")], &[]), exact),
                &map,
            );
            let by_name_kw = categorize(
                "Alfa",
                &matched(
                    record("Alfa AS", &[], &["Salg av klær sko smykker klokker vesker briller"]),
                    exact,
                ),
                &map,
            );
            let by_none = categorize("Alfa", &matched(record("Alfa AS", &[("00.000", "")], &[]), exact), &map);

            assert_eq!(by_code.method, CategorizationMethod::ExactCode);
            assert_eq!(by_code_kw.method, CategorizationMethod::CodeKeyword);
            assert_eq!(by_name_kw.method, CategorizationMethod::NameKeyword);
            assert_eq!(by_none.method, CategorizationMethod::None);
            assert!(by_code.confidence >= by_code_kw.confidence);
            assert!(by_code_kw.confidence >= by_name_kw.confidence);
            assert!(by_name_kw.confidence >= by_none.confidence);
        }
    }
}
