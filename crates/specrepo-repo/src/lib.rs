//! specrepo Repository Management
//!
//! This crate manages a local collection of git-backed specification
//! repositories:
//!
//! - **Sync**: fetch and fast-forward each repository, never rewriting history
//! - **Compatibility gating**: repositories declare the tool versions they
//!   support in `specrepo-version.yml`
//! - **Search index**: a persisted cache over every repository, regenerated or
//!   incrementally updated as repositories change
//!
//! ## Example
//!
//! ```rust,no_run
//! use specrepo_repo::{ManagerConfig, RepositoryManager};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ManagerConfig::new(
//!     "/home/me/.specrepo/repos",
//!     "/home/me/.cache/specrepo/search_index.yaml",
//!     semver::Version::new(0, 4, 0),
//! );
//! let mut manager = RepositoryManager::new(config);
//!
//! // Sync every git repository, then search across all of them
//! let report = manager.update(None, false)?;
//! for warning in &report.warnings {
//!     eprintln!("{}", warning);
//! }
//! let sets = manager.search_by_name("json", true)?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod compat;
pub mod config;
pub mod error;
pub mod index;
pub mod manager;
pub mod source;
pub mod sync;
pub mod vcs;

// Re-exports for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use compat::{CompatibilityMetadata, VERSION_FILE, VersionCompatibilityChecker};
pub use config::{DEFAULT_MASTER_NAME, ManagerConfig, Settings};
pub use error::{RepoError, Result, VersionBound};
pub use index::{SearchEntry, SearchIndex};
pub use manager::{
    CompatibilityCheck, IndexRefresh, RepositoryManager, RepositoryOutcome, UpdateReport,
};
pub use source::{Backend, Repository, RepositoryAggregate};
pub use sync::{RepositorySyncer, SyncFailure, SyncResult};
pub use vcs::{BackendError, FastForward, GitBackend, VersionControl};
