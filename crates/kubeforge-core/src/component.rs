//! The closed set of components the provisioner supplies to nodes, plus the
//! per-component release constants: minimum supported version, URL templates,
//! and the bundler fallback chain.

use semver::Version;
use thiserror::Error;

use kubeforge_schema::Architecture;

/// A component whose binary must be present on a node before the kubelet can
/// start.
///
/// The set is closed and known at compile time; version tables and URL
/// templates are keyed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// Container runtime archive (cri-containerd bundle).
    Containerd,
    /// Docker static bundle. Not installed directly: it is the bundler that
    /// carries containerd builds for architectures without native archives.
    Docker,
    /// The node agent binary.
    Kubelet,
    /// Cluster CLI, kept on nodes for debugging.
    Kubectl,
    /// CNI plugin bundle.
    CniPlugins,
    /// The kubeforge bootstrap agent itself.
    Bootstrap,
}

/// Error for a component name outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown component: {0:?}")]
pub struct UnknownComponent(pub String);

/// One level of bundler indirection: which component to resolve instead when
/// no native build exists, and the version to assume when the mapping has no
/// entry for the requested one.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FallbackChain {
    pub bundler: Component,
    pub default_version: &'static str,
}

impl Component {
    /// Key used in the embedded asset tables and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Containerd => "containerd",
            Self::Docker => "docker",
            Self::Kubelet => "kubelet",
            Self::Kubectl => "kubectl",
            Self::CniPlugins => "cni-plugins",
            Self::Bootstrap => "bootstrap",
        }
    }

    /// Oldest version this provisioner knows how to lay down. Anything below
    /// is rejected before any table lookup.
    pub fn minimum_version(&self) -> Version {
        match self {
            Self::Containerd => Version::new(1, 3, 4),
            Self::Docker => Version::new(18, 9, 0),
            Self::Kubelet | Self::Kubectl => Version::new(1, 17, 0),
            Self::CniPlugins => Version::new(0, 8, 0),
            Self::Bootstrap => Version::new(0, 3, 0),
        }
    }

    /// Download URL for a native build.
    ///
    /// `version` is the exact requested string (it appears verbatim in the
    /// URL); `parsed` selects between the current and legacy template for
    /// components whose hosting moved between releases.
    pub(crate) fn url_for(&self, arch: Architecture, version: &str, parsed: &Version) -> String {
        match self {
            Self::Containerd => {
                if *parsed >= Version::new(1, 3, 8) {
                    format!(
                        "https://github.com/containerd/containerd/releases/download/v{version}/cri-containerd-cni-{version}-linux-{arch}.tar.gz"
                    )
                } else {
                    // Pre-1.3.8 bundles only ever existed on the GCS release bucket.
                    format!(
                        "https://storage.googleapis.com/cri-containerd-release/cri-containerd-{version}.linux-{arch}.tar.gz"
                    )
                }
            }
            Self::Docker => format!(
                "https://download.docker.com/linux/static/stable/{}/docker-{version}.tgz",
                arch.uname_str()
            ),
            Self::Kubelet | Self::Kubectl => {
                let bin = self.key();
                if *parsed >= Version::new(1, 19, 0) {
                    format!("https://dl.k8s.io/release/v{version}/bin/linux/{arch}/{bin}")
                } else {
                    format!(
                        "https://storage.googleapis.com/kubernetes-release/release/v{version}/bin/linux/{arch}/{bin}"
                    )
                }
            }
            Self::CniPlugins => format!(
                "https://github.com/containernetworking/plugins/releases/download/v{version}/cni-plugins-linux-{arch}-v{version}.tgz"
            ),
            Self::Bootstrap => {
                format!("https://artifacts.kubeforge.dev/bootstrap/v{version}/linux/{arch}/kubeforge-bootstrap")
            }
        }
    }

    /// The bundler chain for components without native builds everywhere.
    /// Bounded at one level: a bundler never has a chain of its own.
    pub(crate) fn fallback_chain(&self) -> Option<FallbackChain> {
        match self {
            Self::Containerd => Some(FallbackChain {
                bundler: Self::Docker,
                default_version: "1.4.6",
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Component {
    type Err = UnknownComponent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "containerd" => Ok(Self::Containerd),
            "docker" => Ok(Self::Docker),
            "kubelet" => Ok(Self::Kubelet),
            "kubectl" => Ok(Self::Kubectl),
            "cni-plugins" => Ok(Self::CniPlugins),
            "bootstrap" => Ok(Self::Bootstrap),
            _ => Err(UnknownComponent(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trips_through_from_str() {
        for component in [
            Component::Containerd,
            Component::Docker,
            Component::Kubelet,
            Component::Kubectl,
            Component::CniPlugins,
            Component::Bootstrap,
        ] {
            assert_eq!(component.key().parse::<Component>(), Ok(component));
        }
        assert!("systemd".parse::<Component>().is_err());
    }

    #[test]
    fn bundlers_have_no_chain_of_their_own() {
        // The one-level recursion bound is structural: every component that
        // appears as a bundler must itself resolve natively only.
        let bundlers: Vec<Component> = [
            Component::Containerd,
            Component::Docker,
            Component::Kubelet,
            Component::Kubectl,
            Component::CniPlugins,
            Component::Bootstrap,
        ]
        .iter()
        .filter_map(|c| c.fallback_chain())
        .map(|chain| chain.bundler)
        .collect();

        for bundler in bundlers {
            assert!(bundler.fallback_chain().is_none());
        }
    }

    #[test]
    fn docker_urls_use_uname_arch_names() {
        let v = Version::new(20, 10, 0);
        let amd = Component::Docker.url_for(Architecture::Amd64, "20.10.0", &v);
        let arm = Component::Docker.url_for(Architecture::Arm64, "20.10.0", &v);
        assert!(amd.contains("/x86_64/docker-20.10.0.tgz"));
        assert!(arm.contains("/aarch64/docker-20.10.0.tgz"));
    }
}
