//! specrepo Core - Core types shared by the specrepo crates
//!
//! This crate provides the foundational types used throughout specrepo:
//! - `PackageSpec`: a single versioned specification document
//! - `SpecStore`: read access to the specifications held by a repository
//! - `PackageSet`: every known version of one package, across repositories
//! - `MergeStrategy`: how same-named sets from several repositories combine
//! - `parse_version`: lenient semantic-version parsing for spec repositories

pub mod error;
pub mod set;
pub mod spec;
pub mod store;
pub mod version;

pub use error::{CoreError, Result};
pub use set::{FirstRepositoryWins, MergeStrategy, PackageSet, SetSource, UnionMerge};
pub use spec::{PackageSpec, SPEC_EXTENSION};
pub use store::{FileSpecStore, PackageSummary, SpecStore, validate_package_name};
pub use version::{parse_version, version_text};
