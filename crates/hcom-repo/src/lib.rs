//! hcom-repo - local Helm repository cache access
//!
//! Reads the Helm cache that `helm repo update` maintains on disk and
//! answers two questions without any network I/O:
//!
//! - **Where did this chart come from?** (`RepoResolver`)
//! - **Is a newer version available?** (`UpdateChecker`)
//!
//! Paths follow Helm's own resolution order (`HELM_REPOSITORY_CACHE`,
//! `HELM_CACHE_HOME`, platform defaults).

pub mod config;
pub mod error;
pub mod index;
pub mod paths;
pub mod resolver;
pub mod updates;

pub use config::HelmRepositories;
pub use error::{RepoError, Result};
pub use index::{ChartEntry, RepoIndex};
pub use paths::{helm_cache_dir, helm_config_dir, repositories_file};
pub use resolver::{RepoResolver, SourceMatch};
pub use updates::{UpdateChecker, UpdateInfo};
