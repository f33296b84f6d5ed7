//! Persisted search index
//!
//! Features:
//! - Entries grouped per repository, so an incremental update replaces
//!   exactly the repositories that changed
//! - Staleness driven by explicit modification timestamps
//! - Literal full-text search with a regular-expression fallback
//! - Atomic persistence (temporary file + rename)

use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use semver::Version;
use serde::{Deserialize, Serialize};
use specrepo_core::PackageSummary;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{RepoError, Result};

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// Searchable metadata of one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    pub name: String,
    pub version: Version,
    /// Lowercased name, summary and description
    pub normalized_text: String,
}

impl From<PackageSummary> for SearchEntry {
    fn from(summary: PackageSummary) -> Self {
        Self {
            name: summary.name,
            version: summary.version,
            normalized_text: summary.summary_text.to_lowercase(),
        }
    }
}

/// Search index over every repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIndex {
    version: u32,
    built_at: DateTime<Utc>,
    /// Repository name -> package name -> entry
    repositories: BTreeMap<String, BTreeMap<String, SearchEntry>>,
}

impl SearchIndex {
    /// Full rebuild from freshly scanned repositories
    pub fn generate(scanned: BTreeMap<String, Vec<SearchEntry>>, built_at: DateTime<Utc>) -> Self {
        Self {
            version: FORMAT_VERSION,
            built_at,
            repositories: scanned
                .into_iter()
                .map(|(repo, entries)| (repo, by_name(entries)))
                .collect(),
        }
    }

    /// Incremental rebuild.
    ///
    /// `current` names every repository that exists now; `rescanned` holds
    /// fresh entries for the ones that changed. Unchanged repositories keep
    /// their prior entries and repositories no longer present are dropped.
    pub fn update<'a>(
        &self,
        current: impl IntoIterator<Item = &'a String>,
        rescanned: BTreeMap<String, Vec<SearchEntry>>,
        built_at: DateTime<Utc>,
    ) -> Self {
        let mut repositories: BTreeMap<_, _> = current
            .into_iter()
            .filter_map(|name| {
                self.repositories
                    .get(name)
                    .map(|entries| (name.clone(), entries.clone()))
            })
            .collect();

        for (repo, entries) in rescanned {
            repositories.insert(repo, by_name(entries));
        }

        Self {
            version: FORMAT_VERSION,
            built_at,
            repositories,
        }
    }

    /// When the index was built
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Names of the indexed repositories
    pub fn repository_names(&self) -> Vec<&str> {
        self.repositories.keys().map(String::as_str).collect()
    }

    /// Repositories needing a rescan: modified after `built_at`, or unknown to the index
    pub fn modified_since(&self, modified: &BTreeMap<String, DateTime<Utc>>) -> BTreeSet<String> {
        modified
            .iter()
            .filter(|(name, at)| **at > self.built_at || !self.repositories.contains_key(*name))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Whether any repository changed, appeared or disappeared since the build
    pub fn is_stale(&self, modified: &BTreeMap<String, DateTime<Utc>>) -> bool {
        !self.modified_since(modified).is_empty()
            || self.repositories.keys().any(|name| !modified.contains_key(name))
    }

    /// One entry per package name.
    ///
    /// A package found in several repositories keeps its highest version and
    /// the text of every repository that defines it.
    pub fn entries(&self) -> BTreeMap<String, SearchEntry> {
        let mut merged: BTreeMap<String, SearchEntry> = BTreeMap::new();

        for entry in self.repositories.values().flat_map(|entries| entries.values()) {
            match merged.get_mut(&entry.name) {
                Some(existing) => {
                    if entry.version > existing.version {
                        existing.version = entry.version.clone();
                    }
                    if !existing.normalized_text.contains(&entry.normalized_text) {
                        existing.normalized_text.push(' ');
                        existing.normalized_text.push_str(&entry.normalized_text);
                    }
                }
                None => {
                    merged.insert(entry.name.clone(), entry.clone());
                }
            }
        }

        merged
    }

    /// Search entries, sorted by name.
    ///
    /// Without `full_text` the query is a case-insensitive substring of the
    /// name. With `full_text` it is first a literal substring of the
    /// normalized text and, when that finds nothing, a case-insensitive
    /// regular expression. An invalid expression matches nothing.
    pub fn search_by_name(&self, query: &str, full_text: bool) -> Vec<SearchEntry> {
        let entries = self.entries();
        let needle = query.to_lowercase();

        if !full_text {
            return entries
                .into_values()
                .filter(|e| e.name.to_lowercase().contains(&needle))
                .collect();
        }

        let literal: Vec<_> = entries
            .values()
            .filter(|e| e.normalized_text.contains(&needle))
            .cloned()
            .collect();
        if !literal.is_empty() {
            return literal;
        }

        match RegexBuilder::new(query).case_insensitive(true).build() {
            Ok(pattern) => entries
                .into_values()
                .filter(|e| pattern.is_match(&e.normalized_text))
                .collect(),
            Err(e) => {
                tracing::debug!("Query '{}' is not a valid regular expression: {}", query, e);
                Vec::new()
            }
        }
    }

    /// Load the index, distinguishing a missing file from a corrupt one
    pub fn try_load(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RepoError::IndexCorrupt {
                    message: e.to_string(),
                });
            }
        };

        let index: Self = serde_yaml::from_str(&content).map_err(|e| RepoError::IndexCorrupt {
            message: e.to_string(),
        })?;

        if index.version != FORMAT_VERSION {
            return Err(RepoError::IndexCorrupt {
                message: format!("unsupported format version {}", index.version),
            });
        }

        Ok(Some(index))
    }

    /// Load the index; missing and corrupt files both yield `None`
    pub fn load(path: &Path) -> Option<Self> {
        match Self::try_load(path) {
            Ok(index) => index,
            Err(e) => {
                tracing::debug!("Discarding search index at {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Atomically replace the index file
    pub fn persist(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| RepoError::InvalidConfig {
            message: format!("Invalid search index path: {}", path.display()),
        })?;
        std::fs::create_dir_all(parent)?;

        let encoded = serde_yaml::to_string(self)?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(encoded.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)?;
        Ok(())
    }
}

/// Whether `index` needs to be generated or updated
pub fn is_stale(index: Option<&SearchIndex>, modified: &BTreeMap<String, DateTime<Utc>>) -> bool {
    index.is_none_or(|index| index.is_stale(modified))
}

fn by_name(entries: Vec<SearchEntry>) -> BTreeMap<String, SearchEntry> {
    entries.into_iter().map(|e| (e.name.clone(), e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn entry(name: &str, version: &str, text: &str) -> SearchEntry {
        SearchEntry {
            name: name.to_string(),
            version: Version::parse(version).unwrap(),
            normalized_text: text.to_lowercase(),
        }
    }

    fn sample() -> SearchIndex {
        let mut scanned = BTreeMap::new();
        scanned.insert(
            "master".to_string(),
            vec![
                entry("JSONKit", "1.4.0", "JSONKit A very high performance JSON library"),
                entry("AFNetworking", "2.0.0", "AFNetworking A delightful networking framework"),
            ],
        );
        scanned.insert(
            "test_repo".to_string(),
            vec![entry("BananaLib", "1.0.0", "BananaLib Chunky bananas! Full of chunky bananas.")],
        );
        SearchIndex::generate(scanned, at(1_000))
    }

    fn times(pairs: &[(&str, i64)]) -> BTreeMap<String, DateTime<Utc>> {
        pairs.iter().map(|(n, t)| (n.to_string(), at(*t))).collect()
    }

    #[test]
    fn test_generate_is_fresh() {
        let index = sample();
        let modified = times(&[("master", 900), ("test_repo", 1_000)]);

        assert!(!index.is_stale(&modified));
        assert!(!is_stale(Some(&index), &modified));
        assert!(is_stale(None, &modified));
    }

    #[test]
    fn test_staleness() {
        let index = sample();

        let changed = times(&[("master", 900), ("test_repo", 1_001)]);
        assert!(index.is_stale(&changed));
        assert_eq!(
            index.modified_since(&changed),
            BTreeSet::from(["test_repo".to_string()])
        );

        let added = times(&[("master", 900), ("test_repo", 900), ("new", 10)]);
        assert!(index.is_stale(&added));
        assert_eq!(index.modified_since(&added), BTreeSet::from(["new".to_string()]));

        let removed = times(&[("master", 900)]);
        assert!(index.is_stale(&removed));
        assert!(index.modified_since(&removed).is_empty());
    }

    #[test]
    fn test_update_rescans_only_changed() {
        let index = sample();
        let current = ["master".to_string(), "test_repo".to_string()];

        let mut rescanned = BTreeMap::new();
        rescanned.insert(
            "test_repo".to_string(),
            vec![entry("BananaLib", "1.1.0", "BananaLib Chunky bananas!")],
        );

        let updated = index.update(&current, rescanned, at(2_000));
        assert_eq!(updated.built_at(), at(2_000));

        let entries = updated.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries["BananaLib"].version, Version::new(1, 1, 0));
        assert_eq!(entries["JSONKit"], index.entries()["JSONKit"]);
    }

    #[test]
    fn test_update_drops_removed_repositories() {
        let index = sample();
        let updated = index.update(&["master".to_string()], BTreeMap::new(), at(2_000));

        assert_eq!(updated.repository_names(), vec!["master"]);
        assert!(!updated.entries().contains_key("BananaLib"));
    }

    #[test]
    fn test_entries_merge_across_repositories() {
        let mut scanned = BTreeMap::new();
        scanned.insert("a".to_string(), vec![entry("Shared", "1.0.0", "Shared from a")]);
        scanned.insert("b".to_string(), vec![entry("Shared", "2.0.0", "Shared from b")]);
        let index = SearchIndex::generate(scanned, at(0));

        let entries = index.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["Shared"].version, Version::new(2, 0, 0));
        assert_eq!(entries["Shared"].normalized_text, "shared from a shared from b");
    }

    #[test]
    fn test_search_by_name() {
        let index = sample();

        let results = index.search_by_name("BananaLib", false);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "BananaLib");

        let results = index.search_by_name("banana", false);
        assert_eq!(results.len(), 1);

        assert!(index.search_by_name("Windows-Lib", false).is_empty());
        // Summary text is not consulted without full text
        assert!(index.search_by_name("Chunky", false).is_empty());
    }

    #[test]
    fn test_search_results_sorted_by_name() {
        let index = sample();
        let results = index.search_by_name("", false);
        let names: Vec<_> = results.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["AFNetworking", "BananaLib", "JSONKit"]);
    }

    #[test]
    fn test_full_text_literal() {
        let index = sample();
        let results = index.search_by_name("Chunky", true);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "BananaLib");

        // Regex metacharacters are literal first
        assert!(index.search_by_name("bananas!", true).len() == 1);
    }

    #[test]
    fn test_full_text_regex_fallback() {
        let index = sample();
        let results = index.search_by_name("Ch[aeiou]nky", true);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "BananaLib");

        let results = index.search_by_name("high.*json", true);
        assert_eq!(results[0].name, "JSONKit");
    }

    #[test]
    fn test_full_text_invalid_regex() {
        let index = sample();
        assert!(index.search_by_name("Ch[aeiou", true).is_empty());
    }

    #[test]
    fn test_persist_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache").join("search_index.yaml");

        assert!(SearchIndex::load(&path).is_none());

        let index = sample();
        index.persist(&path).unwrap();
        assert_eq!(SearchIndex::load(&path), Some(index.clone()));

        // Replacing leaves no temporary files behind
        index.update(&["master".to_string()], BTreeMap::new(), at(5)).persist(&path).unwrap();
        let files: Vec<_> = std::fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_corrupt_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search_index.yaml");

        std::fs::write(&path, "---\nBananaLib:\n  version: 0.0.1").unwrap();
        assert!(matches!(
            SearchIndex::try_load(&path),
            Err(RepoError::IndexCorrupt { .. })
        ));
        assert!(SearchIndex::load(&path).is_none());

        // Truncated mid-entry
        let encoded = serde_yaml::to_string(&sample()).unwrap();
        let cut = encoded.find("normalizedText").unwrap();
        std::fs::write(&path, &encoded[..cut]).unwrap();
        assert!(SearchIndex::load(&path).is_none());

        let future = encoded.replacen("version: 1", "version: 99", 1);
        std::fs::write(&path, future).unwrap();
        assert!(matches!(
            SearchIndex::try_load(&path),
            Err(RepoError::IndexCorrupt { .. })
        ));
    }
}
