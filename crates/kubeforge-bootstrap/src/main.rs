//! kubeforge-bootstrap - node boot agent entry point.
//!
//! Reads the boot-configuration manifest from `conf/assets.toml` under the
//! install root and fetches every listed artifact into `bin/`, blocking
//! until each is present and hash-verified. Later boot stages depend on this
//! ordering: nothing that needs a binary runs before the fetch loop has
//! finished with it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kubeforge_bootstrap::{Fetcher, InstallRoot};
use kubeforge_schema::NodeAssets;

#[derive(Parser)]
#[command(name = "kubeforge-bootstrap")]
#[command(author, version, about = "kubeforge node boot agent")]
struct Cli {
    /// Install root containing conf/assets.toml and receiving bin/
    #[arg(long, env = "KUBEFORGE_ROOT", default_value = kubeforge_bootstrap::paths::DEFAULT_ROOT)]
    root: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let root = InstallRoot::new(cli.root);
    root.ensure_layout()
        .with_context(|| format!("creating install layout under {}", root.as_path().display()))?;

    let manifest_path = root.assets_manifest();
    let manifest = NodeAssets::load(&manifest_path)
        .with_context(|| format!("loading boot configuration {}", manifest_path.display()))?;

    let fetcher = Fetcher::standard().context("building download clients")?;

    for asset in &manifest.assets {
        let dest = root.artifact_path(&asset.file_name);
        fetcher
            .fetch(&dest, &asset.asset.sha256, &asset.asset.urls)
            .await?;
        make_executable(&dest)
            .with_context(|| format!("marking {} executable", dest.display()))?;
    }

    tracing::info!(count = manifest.assets.len(), "all boot artifacts verified");
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
