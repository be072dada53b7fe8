//! Install root layout on a provisioned node.
//!
//! Everything the agent touches lives under one directory: `conf/` holds the
//! boot configuration written by the control plane, `bin/` receives verified
//! artifacts.

use std::path::{Path, PathBuf};

/// Default install root on provisioned machines.
pub const DEFAULT_ROOT: &str = "/opt/kubeforge";

/// The node-local directory owned by the bootstrap agent.
#[derive(Debug, Clone)]
pub struct InstallRoot {
    root: PathBuf,
}

impl InstallRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Verified artifacts: `<root>/bin`.
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Boot configuration: `<root>/conf`.
    pub fn conf_dir(&self) -> PathBuf {
        self.root.join("conf")
    }

    /// The boot-configuration manifest path: `<root>/conf/assets.toml`.
    pub fn assets_manifest(&self) -> PathBuf {
        self.conf_dir().join("assets.toml")
    }

    /// Target path for a named artifact under `bin/`.
    pub fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.bin_dir().join(file_name)
    }

    /// Create `bin/` and `conf/` if missing.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.bin_dir())?;
        std::fs::create_dir_all(self.conf_dir())?;
        Ok(())
    }

    pub fn as_path(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted() {
        let root = InstallRoot::new("/opt/kubeforge");
        assert_eq!(root.bin_dir(), PathBuf::from("/opt/kubeforge/bin"));
        assert_eq!(
            root.assets_manifest(),
            PathBuf::from("/opt/kubeforge/conf/assets.toml")
        );
        assert_eq!(
            root.artifact_path("kubelet"),
            PathBuf::from("/opt/kubeforge/bin/kubelet")
        );
    }

    #[test]
    fn ensure_layout_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path().join("kf"));
        root.ensure_layout().unwrap();
        assert!(root.bin_dir().is_dir());
        assert!(root.conf_dir().is_dir());
    }
}
