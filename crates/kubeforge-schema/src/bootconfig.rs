//! Boot-configuration manifest exchanged between the control plane and nodes.
//!
//! The compiler writes `conf/assets.toml` into each node's install root; the
//! bootstrap agent reads it at first boot and fetches every listed artifact
//! into `bin/`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::FileAsset;

/// Errors loading or saving a boot-configuration manifest.
#[derive(Error, Debug)]
pub enum BootConfigError {
    /// Underlying filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest on disk is not valid TOML (or violates an invariant).
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The manifest could not be serialized.
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The ordered artifact list for one node.
///
/// Order matters: the bootstrap agent fetches entries sequentially, and later
/// boot stages assume everything listed is present and verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAssets {
    /// Manifest format version.
    pub version: u32,
    /// Artifacts required by this node, in fetch order.
    #[serde(default)]
    pub assets: Vec<FileAsset>,
}

impl NodeAssets {
    /// Current manifest format version.
    pub const FORMAT_VERSION: u32 = 1;

    /// Create an empty manifest at the current format version.
    pub fn new() -> Self {
        Self {
            version: Self::FORMAT_VERSION,
            assets: Vec::new(),
        }
    }

    /// Append an artifact to the fetch list.
    pub fn push(&mut self, asset: FileAsset) {
        self.assets.push(asset);
    }

    /// Load a manifest from `path`.
    pub fn load(path: &Path) -> Result<Self, BootConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save the manifest to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), BootConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl Default for NodeAssets {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetDescriptor;
    use crate::hash::Sha256Digest;
    use tempfile::tempdir;

    const HASH: &str = "9911479f86012d6eab7e0f532da8f807a8b0f555ee09ef89367d8c31243073bb";

    #[test]
    fn manifest_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("assets.toml");

        let mut manifest = NodeAssets::new();
        manifest.push(FileAsset::new(
            "containerd.tar.gz",
            AssetDescriptor::single(
                Sha256Digest::new(HASH).unwrap(),
                "https://example.com/containerd.tar.gz".to_string(),
            ),
        ));
        manifest.save(&path).unwrap();

        let loaded = NodeAssets::load(&path).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.assets[0].file_name, "containerd.tar.gz");
    }

    #[test]
    fn load_rejects_invalid_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.toml");
        fs::write(
            &path,
            "version = 1\n\n[[assets]]\nfile-name = \"kubelet\"\nsha256 = \"nope\"\nurls = [\"https://example.com/kubelet\"]\n",
        )
        .unwrap();

        assert!(matches!(
            NodeAssets::load(&path),
            Err(BootConfigError::Parse(_))
        ));
    }
}
