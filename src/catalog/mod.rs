use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

static CATALOG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/catalog");

/// Preferred display order for implementation languages
pub const LANGUAGE_ORDER: [&str; 5] = ["JavaScript", "TypeScript", "Python", "Java", "C++"];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A single piece of reference text together with what it is an implementation of
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub id: String,
    pub category: String,
    pub topic: String,
    pub language: String,
    pub code: String,
    pub description: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryInfo {
    pub name: String,
    pub description: String,
}

#[derive(Deserialize)]
struct CategoryFile {
    category: String,
    description: String,
    topics: Vec<TopicEntry>,
}

#[derive(Deserialize)]
struct TopicEntry {
    name: String,
    description: String,
    difficulty: Difficulty,
    implementations: HashMap<String, String>,
}

/// Optional category/topic/language constraints. Matching ignores ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetFilter {
    pub category: Option<String>,
    pub topic: Option<String>,
    pub language: Option<String>,
}

impl SnippetFilter {
    pub fn new(category: Option<String>, topic: Option<String>, language: Option<String>) -> Self {
        Self {
            category,
            topic,
            language,
        }
    }

    pub fn matches(&self, snippet: &Snippet) -> bool {
        fn field_matches(want: &Option<String>, have: &str) -> bool {
            want.as_deref()
                .map_or(true, |w| w.eq_ignore_ascii_case(have))
        }

        field_matches(&self.category, &snippet.category)
            && field_matches(&self.topic, &snippet.topic)
            && field_matches(&self.language, &snippet.language)
    }
}

/// Lowercase and collapse whitespace runs into `-`
pub fn slug(s: &str) -> String {
    s.to_lowercase().split_whitespace().join("-")
}

pub fn snippet_id(category: &str, topic: &str, language: &str) -> String {
    format!("{}-{}-{}", slug(category), slug(topic), language.to_lowercase())
}

/// Columns a tab expands to in reference text
pub const TAB_WIDTH: usize = 4;

/// Replace tabs with spaces; the tab key never reaches a session
pub fn expand_tabs(text: &str) -> String {
    text.replace('\t', &" ".repeat(TAB_WIDTH))
}

/// Strip trailing whitespace from every line so blank lines hold nothing to type
fn normalize_code(code: &str) -> String {
    code.lines()
        .map(|line| expand_tabs(line).trim_end().to_string())
        .join("\n")
}

fn language_rank(language: &str) -> usize {
    LANGUAGE_ORDER
        .iter()
        .position(|l| *l == language)
        .unwrap_or(LANGUAGE_ORDER.len())
}

/// Immutable, in-memory snippet catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    snippets: Vec<Snippet>,
    categories: Vec<CategoryInfo>,
}

impl Catalog {
    /// Catalog compiled into the binary from `src/catalog/*.json`
    pub fn bundled() -> Result<Self> {
        let sources = CATALOG_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
            .sorted_by(|a, b| a.path().cmp(b.path()))
            .filter_map(|f| f.contents_utf8())
            .collect::<Vec<&str>>();

        Self::from_json_sources(sources)
    }

    /// Build a catalog from category documents, in the given order
    pub fn from_json_sources<'a>(sources: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut snippets = Vec::new();
        let mut categories = Vec::new();

        for source in sources {
            let file: CategoryFile = serde_json::from_str(source)?;

            for topic in file.topics {
                let implementations = topic
                    .implementations
                    .into_iter()
                    .sorted_by(|(a, _), (b, _)| {
                        language_rank(a).cmp(&language_rank(b)).then_with(|| a.cmp(b))
                    });

                for (language, code) in implementations {
                    snippets.push(Snippet {
                        id: snippet_id(&file.category, &topic.name, &language),
                        category: file.category.clone(),
                        topic: topic.name.clone(),
                        language,
                        code: normalize_code(&code),
                        description: topic.description.clone(),
                        difficulty: topic.difficulty,
                    });
                }
            }

            categories.push(CategoryInfo {
                name: file.category,
                description: file.description,
            });
        }

        if snippets.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        tracing::debug!(
            snippets = snippets.len(),
            categories = categories.len(),
            "catalog loaded"
        );

        Ok(Self {
            snippets,
            categories,
        })
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn categories(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn category_description(&self, category: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(category))
            .map(|c| c.description.as_str())
    }

    pub fn languages(&self) -> Vec<&str> {
        self.snippets
            .iter()
            .map(|s| s.language.as_str())
            .unique()
            .sorted_by_key(|l| language_rank(l))
            .collect()
    }

    pub fn topics(&self, category: &str) -> Vec<&str> {
        self.snippets
            .iter()
            .filter(|s| s.category.eq_ignore_ascii_case(category))
            .map(|s| s.topic.as_str())
            .unique()
            .collect()
    }

    pub fn filter(&self, filter: &SnippetFilter) -> Vec<&Snippet> {
        self.snippets.iter().filter(|s| filter.matches(s)).collect()
    }

    /// Exact category/topic/language match
    pub fn lookup(&self, category: &str, topic: &str, language: &str) -> Option<&Snippet> {
        self.snippets.iter().find(|s| {
            s.category.eq_ignore_ascii_case(category)
                && s.topic.eq_ignore_ascii_case(topic)
                && s.language.eq_ignore_ascii_case(language)
        })
    }

    pub fn by_id(&self, id: &str) -> Result<&Snippet> {
        self.snippets
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::UnknownSnippet { id: id.to_string() })
    }

    /// Random snippet within the filter, or from the whole catalog when nothing matches
    pub fn random<R: Rng + ?Sized>(&self, filter: &SnippetFilter, rng: &mut R) -> &Snippet {
        if let Some(snippet) = self.filter(filter).choose(rng).copied() {
            return snippet;
        }

        tracing::debug!(?filter, "no snippet matches filter, choosing from all");
        // never empty: from_json_sources rejects empty catalogs
        self.snippets.choose(rng).unwrap_or(&self.snippets[0])
    }

    /// Resolve a selection the way the snippet picker does: exact match first, then the
    /// same category/topic in any language, then a random match, then anything.
    pub fn select<R: Rng + ?Sized>(&self, filter: &SnippetFilter, rng: &mut R) -> &Snippet {
        if let (Some(category), Some(topic)) = (&filter.category, &filter.topic) {
            if let Some(language) = &filter.language {
                if let Some(exact) = self.lookup(category, topic, language) {
                    return exact;
                }
            }

            let any_language = self
                .languages()
                .into_iter()
                .find_map(|language| self.lookup(category, topic, language));
            if let Some(snippet) = any_language {
                return snippet;
            }
        }

        self.random(filter, rng)
    }
}
