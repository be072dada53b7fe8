//! Resolved asset descriptors: the currency between resolution and fetching.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::hash::Sha256Digest;

/// Errors constructing or parsing an [`AssetDescriptor`].
#[derive(Error, Debug)]
pub enum AssetError {
    /// A descriptor must name at least one download URL.
    #[error("asset descriptor has an empty URL list")]
    EmptyUrls,

    /// The single-line form is `<sha256>@<url>[,<url>...]`.
    #[error("missing '@' separator in asset line: {0:?}")]
    MissingSeparator(String),

    /// The digest portion failed SHA-256 shape validation.
    #[error("invalid digest in asset line: {0}")]
    InvalidDigest(String),
}

/// A resolved, downloadable artifact: an expected digest plus one or more
/// mirror URLs, tried strictly in order.
///
/// Once constructed a descriptor is architecture- and version-agnostic; all
/// URLs are expected to serve byte-identical content matching `sha256`.
///
/// The canonical single-line form is `<64-hex-hash>@<url>[,<url>...]`, which
/// [`Display`](std::fmt::Display) and [`FromStr`](std::str::FromStr)
/// round-trip exactly. The structured (TOML) form carries the same two
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetDescriptor {
    /// Expected SHA-256 digest of the artifact bytes.
    pub sha256: Sha256Digest,
    /// Ordered, non-empty list of download URLs.
    pub urls: Vec<String>,
}

impl AssetDescriptor {
    /// Construct a descriptor, enforcing the non-empty URL invariant.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::EmptyUrls`] if `urls` is empty.
    pub fn new(sha256: Sha256Digest, urls: Vec<String>) -> Result<Self, AssetError> {
        if urls.is_empty() {
            return Err(AssetError::EmptyUrls);
        }
        Ok(Self { sha256, urls })
    }

    /// Construct a single-URL descriptor. Infallible: one URL is non-empty
    /// by construction.
    pub fn single(sha256: Sha256Digest, url: String) -> Self {
        Self {
            sha256,
            urls: vec![url],
        }
    }

    /// Primary (first) download URL.
    pub fn primary_url(&self) -> &str {
        self.urls.first().map(String::as_str).unwrap_or_default()
    }
}

impl std::fmt::Display for AssetDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.sha256, self.urls.join(","))
    }
}

impl std::str::FromStr for AssetDescriptor {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digest, urls) = s
            .split_once('@')
            .ok_or_else(|| AssetError::MissingSeparator(s.to_string()))?;
        let sha256 =
            Sha256Digest::new(digest).map_err(|e| AssetError::InvalidDigest(e.to_string()))?;
        let urls: Vec<String> = urls
            .split(',')
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(sha256, urls)
    }
}

impl<'de> Deserialize<'de> for AssetDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "kebab-case")]
        struct Raw {
            sha256: Sha256Digest,
            urls: Vec<String>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.sha256, raw.urls).map_err(serde::de::Error::custom)
    }
}

/// One entry of a node's boot-configuration artifact list: where the fetched
/// file lands under `bin/`, and the descriptor to fetch it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileAsset {
    /// File name under the install root's `bin/` directory.
    pub file_name: String,
    /// Descriptor for the artifact content.
    #[serde(flatten)]
    pub asset: AssetDescriptor,
}

impl FileAsset {
    /// Pair a descriptor with its on-disk file name.
    pub fn new(file_name: impl Into<String>, asset: AssetDescriptor) -> Self {
        Self {
            file_name: file_name.into(),
            asset,
        }
    }
}
