//! Data shapes shared by the matcher, categorizer, cache and orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category name used when nothing resolves.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A hierarchical industry code such as `"06.100"`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IndustryCode {
    pub code: String,
    pub description: String,
}

impl IndustryCode {
    pub fn new(code: &str, description: &str) -> Self {
        Self {
            code: code.trim().to_string(),
            description: description.trim().to_string(),
        }
    }
}

/// One registry search hit, validated at the registry boundary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    /// Unique registry key (organisation number).
    pub org_number: String,
    /// Registered display name.
    pub name: String,
    /// False when bankrupt, dissolved or under liquidation.
    pub active: bool,
    /// Industry codes; index 0 is the primary code.
    pub industry_codes: Vec<IndustryCode>,
    /// Legal form code (`AS`, `ASA`, ...), informational only.
    pub org_form: Option<String>,
    /// Registered activity and statutory purpose lines.
    pub activities: Vec<String>,
}

impl CandidateRecord {
    /// A record with no name or no registry key cannot be scored.
    pub fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty() && !self.org_number.trim().is_empty()
    }

    pub fn has_industry_codes(&self) -> bool {
        !self.industry_codes.is_empty()
    }
}

/// Outcome of picking the best candidate for one input name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MatchResult {
    pub record: Option<CandidateRecord>,
    /// Name similarity of the selected record, in [0, 1].
    pub similarity: f64,
    pub exact_name_match: bool,
    /// Well-formed candidates that were scored.
    pub candidate_count: usize,
    /// Candidates dropped for missing name or registry key.
    pub skipped_malformed: usize,
}

impl MatchResult {
    /// The "no registry evidence" result.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// How a category was derived.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum CategorizationMethod {
    ExactCode,
    CodeKeyword,
    NameKeyword,
    None,
}

impl fmt::Display for CategorizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactCode => write!(f, "exact-code"),
            Self::CodeKeyword => write!(f, "code-keyword"),
            Self::NameKeyword => write!(f, "name-keyword"),
            Self::None => write!(f, "none"),
        }
    }
}

/// What happened when the registry was asked about a name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum LookupStatus {
    /// A candidate was selected.
    Matched,
    /// The registry answered with zero usable candidates.
    NoCandidates,
    /// The registry call failed; categorization fell back to keywords.
    RegistryUnavailable(String),
}

impl LookupStatus {
    pub fn needs_review(&self) -> bool {
        !matches!(self, Self::Matched)
    }
}

impl fmt::Display for LookupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::NoCandidates => write!(f, "no_candidates"),
            Self::RegistryUnavailable(reason) => write!(f, "registry_unavailable: {}", reason),
        }
    }
}

/// Observability fields carried on every assignment regardless of method.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub matched_code: Option<String>,
    pub matched_code_description: Option<String>,
    pub matching_keywords: Vec<String>,
    pub candidate_count: usize,
    /// Registry records dropped for missing a name or org number.
    #[serde(default)]
    pub skipped_malformed: usize,
    pub exact_name_match: bool,
    pub selected_company: Option<String>,
    pub org_number: Option<String>,
    pub industry_code_count: usize,
    pub name_similarity: f64,
    pub lookup_status: LookupStatus,
}

impl Diagnostics {
    /// Lookups that degraded or had registry records thrown away.
    pub fn needs_review(&self) -> bool {
        self.lookup_status.needs_review() || self.skipped_malformed > 0
    }
}

/// Category, subsegment and confidence for one company.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategoryAssignment {
    pub category: String,
    /// 1-9 for real categories, 0 for Uncategorized.
    pub category_id: u32,
    pub subsegment: String,
    pub confidence: f64,
    pub method: CategorizationMethod,
    pub diagnostics: Diagnostics,
}

impl CategoryAssignment {
    pub fn categorized_by_code(&self) -> bool {
        self.method == CategorizationMethod::ExactCode
    }

    pub fn keyword_match(&self) -> bool {
        matches!(
            self.method,
            CategorizationMethod::CodeKeyword | CategorizationMethod::NameKeyword
        )
    }

    pub fn is_uncategorized(&self) -> bool {
        self.method == CategorizationMethod::None
    }
}

/// Cached value: the assignment plus the match it was derived from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Resolution {
    pub assignment: CategoryAssignment,
    pub match_result: MatchResult,
}

/// One output row, in input order.
#[derive(Serialize, Debug, Clone)]
pub struct CompanyCategorization {
    pub company_name: String,
    #[serde(flatten)]
    pub assignment: CategoryAssignment,
}
