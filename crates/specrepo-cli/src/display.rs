//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Update reports (per-repository outcomes, warnings, notices)
//! - Package sets found by search and info
//! - Compatibility metadata

use console::style;
use semver::Version;
use serde::Serialize;
use specrepo_core::PackageSet;
use specrepo_repo::{CompatibilityMetadata, SyncResult, UpdateReport};

/// One line per repository outcome
pub fn outcome_line(name: &str, result: &SyncResult) -> String {
    let mark = match result {
        SyncResult::UpToDate => style("✓").green(),
        SyncResult::Updated { .. } => style("↑").cyan(),
        SyncResult::Failed { .. } => style("✗").red(),
    };
    format!("{} {}: {}", mark, style(name).bold(), result)
}

pub fn print_update_report(report: &UpdateReport) {
    for line in &report.progress {
        println!("{} {}", style("→").blue(), line);
    }

    if report.outcomes.is_empty() {
        println!("No git spec repositories to update.");
    }
    for outcome in &report.outcomes {
        println!("{}", outcome_line(&outcome.name, &outcome.result));
    }

    for warning in &report.warnings {
        println!("{} {}", style("⚠").yellow().bold(), warning);
    }
    for notice in &report.notices {
        println!("{} {}", style("ℹ").blue(), notice);
    }
}

/// Ascending versions, listed highest first
pub fn version_list<'a>(versions: impl DoubleEndedIterator<Item = &'a Version>) -> String {
    versions
        .rev()
        .map(Version::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn print_search_results(sets: &[PackageSet]) {
    println!("{:<30} {:<12} REPOSITORIES", "NAME", "VERSION");
    println!("{}", "-".repeat(70));

    for set in sets {
        let version = set
            .highest_version()
            .map(Version::to_string)
            .unwrap_or_default();
        println!(
            "{:<30} {:<12} {}",
            set.name,
            version,
            set.repositories().join(", ")
        );
    }
}

pub fn print_package_set(set: &PackageSet) {
    match set.highest_version() {
        Some(version) => println!("{} ({})", style(&set.name).cyan().bold(), version),
        None => println!("{}", style(&set.name).cyan().bold()),
    }

    let versions = set.versions();
    println!("  Versions: {}", version_list(versions.iter().rev()));
    println!("  Repositories:");
    for source in &set.sources {
        println!(
            "    - {} ({})",
            source.repository,
            version_list(source.versions.iter())
        );
    }
}

/// JSON row for a package set
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSetJson<'a> {
    pub name: &'a str,
    pub highest_version: Option<&'a Version>,
    pub versions: Vec<Version>,
    pub repositories: Vec<&'a str>,
}

impl<'a> From<&'a PackageSet> for PackageSetJson<'a> {
    fn from(set: &'a PackageSet) -> Self {
        Self {
            name: &set.name,
            highest_version: set.highest_version(),
            versions: set.versions(),
            repositories: set.repositories(),
        }
    }
}

pub fn print_metadata(metadata: &CompatibilityMetadata) {
    let show = |v: &Option<Version>| {
        v.as_ref()
            .map(Version::to_string)
            .unwrap_or_else(|| "-".to_string())
    };
    println!(
        "    min: {}  max: {}  last: {}",
        show(&metadata.min),
        show(&metadata.max),
        show(&metadata.last)
    );
}
