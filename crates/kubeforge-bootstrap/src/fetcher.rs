//! The verified fetcher: descriptor in, hash-validated local file out.
//!
//! Failure semantics are deliberately one-sided. Transfer errors and hash
//! mismatches are signals to keep going, not errors: the agent runs before
//! anything exists that could retry it, so the only acceptable failure mode
//! is to keep trying. A bounded pass limit exists solely so tests can cap
//! the loop; production construction leaves it unset.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use kubeforge_schema::Sha256Digest;

use crate::strategies::{DownloadStrategy, default_strategies};

/// Single-transfer failures. Internal to the retry loop; never escapes
/// [`Fetcher::fetch`].
#[derive(Error, Debug)]
enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The only error [`Fetcher::fetch`] can return, and only for fetchers
/// constructed with a pass limit. An unbounded fetcher either succeeds or
/// never returns.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The test-only pass limit was exhausted without a verified copy.
    #[error("no verified copy of {} after {passes} full mirror passes", path.display())]
    RetriesExhausted {
        /// Target path that was never verified.
        path: PathBuf,
        /// Number of completed passes.
        passes: u32,
    },
}

/// A retrying, hash-checking artifact downloader.
#[derive(Debug)]
pub struct Fetcher {
    strategies: Vec<(DownloadStrategy, Client)>,
    pass_delay: Duration,
    pass_limit: Option<u32>,
}

impl Fetcher {
    /// Build a fetcher from an explicit strategy list and the delay between
    /// full failed passes over every (URL, strategy) pair.
    pub fn new(strategies: Vec<DownloadStrategy>, pass_delay: Duration) -> reqwest::Result<Self> {
        let strategies = strategies
            .into_iter()
            .map(|s| {
                let client = s.client()?;
                Ok((s, client))
            })
            .collect::<reqwest::Result<Vec<_>>>()?;
        Ok(Self {
            strategies,
            pass_delay,
            pass_limit: None,
        })
    }

    /// The production configuration: default strategies, 10 second pause
    /// between failed passes, no pass limit.
    pub fn standard() -> reqwest::Result<Self> {
        Self::new(default_strategies(), Duration::from_secs(10))
    }

    /// Cap the number of full passes. Test harness use only; the node agent
    /// never sets this.
    pub fn with_pass_limit(mut self, passes: u32) -> Self {
        self.pass_limit = Some(passes);
        self
    }

    /// Current pass limit, `None` when unbounded.
    pub fn pass_limit(&self) -> Option<u32> {
        self.pass_limit
    }

    /// Ensure `dest` holds bytes hashing to `expected`, downloading from
    /// `urls` (in order) as needed.
    ///
    /// Re-running against an already-verified file is a no-op with zero
    /// network activity. A present-but-mismatching file is deleted and
    /// re-fetched from scratch; partial downloads are never repaired.
    ///
    /// # Errors
    ///
    /// Only [`FetchError::RetriesExhausted`], and only when a pass limit was
    /// set via [`with_pass_limit`](Self::with_pass_limit).
    pub async fn fetch(
        &self,
        dest: &Path,
        expected: &Sha256Digest,
        urls: &[String],
    ) -> Result<(), FetchError> {
        if existing_copy_verifies(dest, expected).await {
            tracing::info!(path = %dest.display(), "artifact already present and verified");
            return Ok(());
        }

        let mut passes = 0u32;
        loop {
            for url in urls {
                for (strategy, client) in &self.strategies {
                    match self.attempt(client, strategy, url, dest).await {
                        Ok(actual) if actual == expected.as_str() => {
                            tracing::info!(
                                path = %dest.display(),
                                url = %url,
                                strategy = strategy.label,
                                "artifact downloaded and verified"
                            );
                            return Ok(());
                        }
                        Ok(actual) => {
                            // Never trust a failed verification: delete and
                            // re-fetch from scratch.
                            tracing::warn!(
                                url = %url,
                                strategy = strategy.label,
                                expected = expected.as_str(),
                                actual = %actual,
                                "hash mismatch, discarding download"
                            );
                            tokio::fs::remove_file(dest).await.ok();
                        }
                        Err(err) => {
                            tracing::warn!(
                                url = %url,
                                strategy = strategy.label,
                                error = %err,
                                "transfer failed"
                            );
                        }
                    }
                }
            }

            passes += 1;
            if let Some(limit) = self.pass_limit {
                if passes >= limit {
                    return Err(FetchError::RetriesExhausted {
                        path: dest.to_path_buf(),
                        passes,
                    });
                }
            }
            tracing::warn!(
                path = %dest.display(),
                passes,
                "every mirror and strategy failed, sleeping before next pass"
            );
            tokio::time::sleep(self.pass_delay).await;
        }
    }

    /// One strategy's bounded attempt loop against one URL.
    async fn attempt(
        &self,
        client: &Client,
        strategy: &DownloadStrategy,
        url: &str,
        dest: &Path,
    ) -> Result<String, DownloadError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match transfer(client, url, dest).await {
                Ok(actual) => return Ok(actual),
                Err(err) => {
                    if attempt >= strategy.attempts {
                        return Err(err);
                    }
                    tracing::debug!(
                        url,
                        strategy = strategy.label,
                        attempt,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(strategy.retry_delay).await;
                }
            }
        }
    }
}

/// Stream one transfer into `dest`, hashing as it lands. Returns the actual
/// digest hex; the caller decides whether it matches.
async fn transfer(client: &Client, url: &str, dest: &Path) -> Result<String, DownloadError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
    }

    file.flush().await?;
    Ok(hex::encode(hasher.finalize()))
}

/// True when `dest` already holds the expected bytes. A present but
/// unreadable or mismatching file is deleted so the caller proceeds as if it
/// were absent.
async fn existing_copy_verifies(dest: &Path, expected: &Sha256Digest) -> bool {
    if !dest.exists() {
        return false;
    }
    let path = dest.to_path_buf();
    let hashed = tokio::task::spawn_blocking(move || Sha256Digest::compute_file(&path)).await;
    match hashed {
        Ok(Ok(actual)) if actual == *expected => true,
        Ok(Ok(actual)) => {
            tracing::warn!(
                path = %dest.display(),
                expected = expected.as_str(),
                actual = actual.as_str(),
                "existing artifact fails verification, deleting"
            );
            tokio::fs::remove_file(dest).await.ok();
            false
        }
        _ => {
            tracing::warn!(path = %dest.display(), "existing artifact unreadable, deleting");
            tokio::fs::remove_file(dest).await.ok();
            false
        }
    }
}
