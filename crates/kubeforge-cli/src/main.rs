//! kubeforge - control-side CLI.
//!
//! Compiles a declarative cluster spec into per-instance-group boot
//! configuration, resolving every required component to an integrity-checked
//! asset descriptor before any machine exists.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kubeforge_core::{ClusterSpec, Component, compile_instance_group, resolve_asset};
use kubeforge_schema::Architecture;

#[derive(Parser)]
#[command(name = "kubeforge")]
#[command(author, version, about = "kubeforge - cluster asset supply chain compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a cluster spec into per-instance-group boot configuration
    Compile {
        /// Cluster spec file (TOML)
        #[arg(long)]
        spec: PathBuf,
        /// Output directory; one install-root image per instance group
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Resolve a single component to its asset descriptor
    Resolve {
        /// Component key (containerd, docker, kubelet, kubectl, cni-plugins, bootstrap)
        component: String,
        /// Target architecture (amd64 or arm64)
        arch: String,
        /// Requested version
        version: String,
        /// Emit the descriptor as JSON instead of the single-line form
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile { spec, out } => compile(&spec, &out),
        Commands::Resolve {
            component,
            arch,
            version,
            json,
        } => resolve(&component, &arch, &version, json),
    }
}

fn compile(spec_path: &Path, out: &Path) -> Result<()> {
    let spec = ClusterSpec::load(spec_path)
        .with_context(|| format!("loading cluster spec {}", spec_path.display()))?;
    if spec.instance_groups.is_empty() {
        anyhow::bail!("cluster spec declares no instance groups");
    }

    for group in &spec.instance_groups {
        let manifest = compile_instance_group(&spec, group)
            .with_context(|| format!("compiling assets for instance group {:?}", group.name))?;
        let path = out.join(&group.name).join("conf").join("assets.toml");
        manifest
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!(
            "{}: {} assets -> {}",
            group.name,
            manifest.assets.len(),
            path.display()
        );
    }
    Ok(())
}

fn resolve(component: &str, arch: &str, version: &str, json: bool) -> Result<()> {
    let component: Component = component.parse()?;
    let arch: Architecture = arch.parse()?;
    let descriptor = resolve_asset(component, arch, version, None)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        println!("{descriptor}");
    }
    Ok(())
}
