//! Ordered download strategies.
//!
//! Each strategy is one way of performing a transfer: compressed or plain,
//! with its own connect timeout, bounded in-strategy retry count, and fixed
//! inter-retry delay. The fetcher walks every strategy for every mirror URL
//! before declaring a pass failed; at least one compressed and one plain
//! strategy run against each URL.

use std::time::Duration;

use reqwest::Client;

/// One transfer tool configuration.
#[derive(Debug, Clone)]
pub struct DownloadStrategy {
    /// Short name for logs.
    pub label: &'static str,
    /// Request gzip content-coding from the server.
    pub compressed: bool,
    /// Bound on connection establishment per attempt.
    pub connect_timeout: Duration,
    /// Attempts before handing the URL to the next strategy.
    pub attempts: u32,
    /// Fixed delay between in-strategy attempts.
    pub retry_delay: Duration,
}

impl DownloadStrategy {
    /// Build the HTTP client realizing this strategy.
    pub(crate) fn client(&self) -> reqwest::Result<Client> {
        Client::builder()
            .connect_timeout(self.connect_timeout)
            .gzip(self.compressed)
            .build()
    }
}

/// The production strategy order: compressed transfer first, plain second.
pub fn default_strategies() -> Vec<DownloadStrategy> {
    vec![
        DownloadStrategy {
            label: "compressed",
            compressed: true,
            connect_timeout: Duration::from_secs(20),
            attempts: 3,
            retry_delay: Duration::from_secs(2),
        },
        DownloadStrategy {
            label: "plain",
            compressed: false,
            connect_timeout: Duration::from_secs(20),
            attempts: 3,
            retry_delay: Duration::from_secs(2),
        },
    ]
}
