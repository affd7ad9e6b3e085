//! Category table keyed on industry-code prefixes and keyword sets.
//!
//! The table ships as a YAML asset embedded at compile time (see
//! `seed_data/categories.yml`); a replacement file with the same schema can be
//! loaded from disk instead. Either way it is validated once at startup and
//! never mutated afterwards.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::model::UNCATEGORIZED;
use crate::normalize::tokenize;

/// Keywords at least this long also match tokens they prefix
/// (`"sport"` hits `"sportsbutikk"`); shorter ones must equal a token.
const PREFIX_MATCH_MIN_CHARS: usize = 5;

/// Error types for category map loading.
#[derive(Error, Debug)]
pub enum CategoryMapError {
    #[error("Failed to parse category YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Failed to read category file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Category list is empty")]
    Empty,
    #[error("Category at position {0} has an empty name")]
    EmptyName(usize),
    #[error("Duplicate category name: {0}")]
    DuplicateName(String),
    #[error("Duplicate category id: {0}")]
    DuplicateId(u32),
    #[error("Category id 0 is reserved for Uncategorized (used by {0})")]
    ReservedId(String),
    #[error("Empty code prefix in category {0}")]
    EmptyPrefix(String),
    #[error("Keyword {keyword:?} in category {category} has no searchable characters")]
    EmptyKeyword { category: String, keyword: String },
    #[error("Subsegment without a name in category {0}")]
    EmptySubsegment(String),
    #[error("Default subsegment {subsegment:?} is not listed under {category}")]
    UnknownDefaultSubsegment { category: String, subsegment: String },
}

#[derive(Deserialize, Debug)]
struct CategoryFile {
    categories: Vec<CategorySpec>,
}

#[derive(Deserialize, Debug)]
struct CategorySpec {
    id: u32,
    name: String,
    #[serde(default)]
    default_subsegment: Option<String>,
    #[serde(default)]
    codes: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    subsegments: Vec<SubsegmentSpec>,
}

#[derive(Deserialize, Debug)]
struct SubsegmentSpec {
    name: String,
    #[serde(default)]
    codes: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

/// A keyword and its token form.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub text: String,
    tokens: Vec<String>,
}

impl Keyword {
    fn parse(raw: &str) -> Option<Self> {
        let tokens = tokenize(raw);
        if tokens.is_empty() {
            return None;
        }
        Some(Self {
            text: tokens.join(" "),
            tokens,
        })
    }

    /// True if this keyword occurs in the token stream.
    pub fn matches(&self, text_tokens: &[String]) -> bool {
        if text_tokens.len() < self.tokens.len() {
            return false;
        }
        text_tokens.windows(self.tokens.len()).any(|window| {
            window
                .iter()
                .zip(&self.tokens)
                .all(|(token, kw)| token_matches(kw, token))
        })
    }

    /// True if this keyword occurs in any of the segments. Multi-word
    /// keywords never span two segments.
    pub fn matches_any(&self, segments: &[Vec<String>]) -> bool {
        segments.iter().any(|segment| self.matches(segment))
    }
}

fn token_matches(keyword: &str, token: &str) -> bool {
    if keyword.chars().count() >= PREFIX_MATCH_MIN_CHARS {
        token.starts_with(keyword)
    } else {
        token == keyword
    }
}

#[derive(Debug, Clone)]
pub struct Subsegment {
    pub name: String,
    pub keywords: Vec<Keyword>,
}

/// One validated category.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub default_subsegment: String,
    pub subsegments: Vec<Subsegment>,
    /// Category keywords plus every subsegment keyword, deduplicated.
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone)]
struct CodePrefix {
    prefix: String,
    category: usize,
    subsegment: Option<usize>,
}

/// Result of resolving an industry code against the prefix table.
#[derive(Debug, Clone)]
pub struct CodeMatch<'a> {
    pub category: &'a Category,
    /// Set when the winning prefix was declared on a subsegment.
    pub subsegment: Option<&'a str>,
    pub prefix: &'a str,
}

/// Keyword hits for one category.
#[derive(Debug, Clone)]
pub struct KeywordHits<'a> {
    pub category: &'a Category,
    /// Distinct keywords that matched, in table order.
    pub keywords: Vec<String>,
}

impl KeywordHits<'_> {
    fn total_len(&self) -> usize {
        self.keywords.iter().map(|k| k.chars().count()).sum()
    }
}

/// Immutable category lookup table.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    categories: Vec<Category>,
    prefixes: Vec<CodePrefix>,
}

impl CategoryMap {
    /// Load the embedded category table.
    pub fn load_default() -> Result<Self, CategoryMapError> {
        let yaml_content = include_str!("../seed_data/categories.yml");
        Self::from_yaml(yaml_content)
    }

    /// Load a category table from a YAML file on disk.
    pub fn from_path(path: &Path) -> Result<Self, CategoryMapError> {
        let content = std::fs::read_to_string(path).map_err(|source| CategoryMapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a category table.
    pub fn from_yaml(yaml_content: &str) -> Result<Self, CategoryMapError> {
        let file: CategoryFile = serde_yml::from_str(yaml_content)?;
        if file.categories.is_empty() {
            return Err(CategoryMapError::Empty);
        }

        let mut categories = Vec::with_capacity(file.categories.len());
        let mut prefixes = Vec::new();
        let mut seen_names = HashSet::new();
        let mut seen_ids = HashSet::new();

        for (position, entry) in file.categories.into_iter().enumerate() {
            let name = entry.name.trim().to_string();
            if name.is_empty() {
                return Err(CategoryMapError::EmptyName(position));
            }
            if !seen_names.insert(name.to_lowercase()) {
                return Err(CategoryMapError::DuplicateName(name));
            }
            if entry.id == 0 {
                return Err(CategoryMapError::ReservedId(name));
            }
            if !seen_ids.insert(entry.id) {
                return Err(CategoryMapError::DuplicateId(entry.id));
            }

            let index = categories.len();
            let mut keywords = parse_keywords(&name, &entry.keywords)?;

            for code in &entry.codes {
                prefixes.push(CodePrefix {
                    prefix: parse_prefix(&name, code)?,
                    category: index,
                    subsegment: None,
                });
            }

            let mut subsegments = Vec::with_capacity(entry.subsegments.len());
            for (sub_index, sub) in entry.subsegments.into_iter().enumerate() {
                let sub_name = sub.name.trim().to_string();
                if sub_name.is_empty() {
                    return Err(CategoryMapError::EmptySubsegment(name));
                }
                for code in &sub.codes {
                    prefixes.push(CodePrefix {
                        prefix: parse_prefix(&name, code)?,
                        category: index,
                        subsegment: Some(sub_index),
                    });
                }
                let sub_keywords = parse_keywords(&name, &sub.keywords)?;
                for kw in &sub_keywords {
                    if !keywords.contains(kw) {
                        keywords.push(kw.clone());
                    }
                }
                subsegments.push(Subsegment {
                    name: sub_name,
                    keywords: sub_keywords,
                });
            }

            let default_subsegment = match entry.default_subsegment.map(|s| s.trim().to_string()) {
                Some(default) if subsegments.is_empty() || subsegments.iter().any(|s| s.name == default) => {
                    default
                }
                Some(default) => {
                    return Err(CategoryMapError::UnknownDefaultSubsegment {
                        category: name,
                        subsegment: default,
                    })
                }
                None => subsegments
                    .first()
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            };

            categories.push(Category {
                id: entry.id,
                name,
                default_subsegment,
                subsegments,
                keywords,
            });
        }

        tracing::debug!(
            "Loaded {} categories with {} code prefixes",
            categories.len(),
            prefixes.len()
        );

        Ok(Self {
            categories,
            prefixes,
        })
    }

    /// Categories in table order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[cfg(test)]
    fn category(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Longest-prefix match of an industry code. Equal-length prefixes
    /// resolve to the one declared first.
    pub fn resolve_code(&self, code: &str) -> Option<CodeMatch<'_>> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        let mut best: Option<&CodePrefix> = None;
        for entry in &self.prefixes {
            if !code.starts_with(entry.prefix.as_str()) {
                continue;
            }
            if best.map_or(true, |b| entry.prefix.len() > b.prefix.len()) {
                best = Some(entry);
            }
        }
        best.map(|entry| {
            let category = &self.categories[entry.category];
            CodeMatch {
                category,
                subsegment: entry
                    .subsegment
                    .map(|i| category.subsegments[i].name.as_str()),
                prefix: entry.prefix.as_str(),
            }
        })
    }

    /// Keyword hits per category over tokenized text segments, best first.
    ///
    /// Ranking: more distinct keywords, then longer total keyword length,
    /// then table order. Categories without hits are omitted.
    pub fn keyword_hits(&self, segments: &[Vec<String>]) -> Vec<KeywordHits<'_>> {
        let mut hits: Vec<(usize, KeywordHits<'_>)> = self
            .categories
            .iter()
            .enumerate()
            .filter_map(|(index, category)| {
                let keywords: Vec<String> = category
                    .keywords
                    .iter()
                    .filter(|kw| kw.matches_any(segments))
                    .map(|kw| kw.text.clone())
                    .collect();
                if keywords.is_empty() {
                    None
                } else {
                    Some((index, KeywordHits { category, keywords }))
                }
            })
            .collect();

        hits.sort_by(|(ia, a), (ib, b)| {
            b.keywords
                .len()
                .cmp(&a.keywords.len())
                .then_with(|| b.total_len().cmp(&a.total_len()))
                .then_with(|| ia.cmp(ib))
        });
        hits.into_iter().map(|(_, h)| h).collect()
    }

    /// The best keyword category for the text, if any keyword hits.
    pub fn best_keyword_match(&self, segments: &[Vec<String>]) -> Option<KeywordHits<'_>> {
        self.keyword_hits(segments).into_iter().next()
    }

    /// Subsegment of `category` with the most keyword hits in the text,
    /// falling back to the category default.
    pub fn suggest_subsegment(&self, category: &Category, segments: &[Vec<String>]) -> String {
        let mut best: Option<(&Subsegment, usize)> = None;
        for sub in &category.subsegments {
            let count = sub.keywords.iter().filter(|kw| kw.matches_any(segments)).count();
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((sub, count));
            }
        }
        best.map(|(sub, _)| sub.name.clone())
            .unwrap_or_else(|| category.default_subsegment.clone())
    }
}

fn parse_prefix(category: &str, raw: &str) -> Result<String, CategoryMapError> {
    let prefix = raw.trim();
    if prefix.is_empty() {
        return Err(CategoryMapError::EmptyPrefix(category.to_string()));
    }
    Ok(prefix.to_string())
}

fn parse_keywords(category: &str, raw: &[String]) -> Result<Vec<Keyword>, CategoryMapError> {
    let mut out: Vec<Keyword> = Vec::with_capacity(raw.len());
    for keyword in raw {
        let parsed = Keyword::parse(keyword).ok_or_else(|| CategoryMapError::EmptyKeyword {
            category: category.to_string(),
            keyword: keyword.clone(),
        })?;
        if !out.contains(&parsed) {
            out.push(parsed);
        }
    }
    Ok(out)
}
