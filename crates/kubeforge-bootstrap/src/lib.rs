//! Node boot agent: turns a boot-configuration manifest into verified local
//! binaries.
//!
//! Runs on every provisioned machine at first boot, before any orchestration
//! exists to retry it. The fetcher therefore never gives up: transfer
//! failures and hash mismatches are retried over every mirror and download
//! strategy, indefinitely. The only terminal state is a file on disk whose
//! SHA-256 matches the boot configuration.

pub mod fetcher;
pub mod paths;
pub mod strategies;

pub use fetcher::{FetchError, Fetcher};
pub use paths::InstallRoot;
pub use strategies::{DownloadStrategy, default_strategies};

/// User agent for artifact downloads.
pub const USER_AGENT: &str = concat!("kubeforge-bootstrap/", env!("CARGO_PKG_VERSION"));
