//! Embedded version tables: immutable, process-wide data, not state.
//!
//! The table document lives in `data/wellknown_assets.toml` and is parsed
//! once on first access. Digest values are validated at parse time (they
//! deserialize into [`Sha256Digest`]), so resolution never sees a malformed
//! entry.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use serde::Deserialize;

use kubeforge_schema::{Architecture, Sha256Digest};

use crate::component::Component;

#[derive(Debug, Deserialize)]
struct AssetTables {
    #[serde(rename = "schema-version")]
    #[allow(dead_code)]
    schema_version: u32,
    #[serde(flatten)]
    components: HashMap<String, ComponentTable>,
}

#[derive(Debug, Default, Deserialize)]
struct ComponentTable {
    #[serde(default)]
    amd64: BTreeMap<String, Sha256Digest>,
    #[serde(default)]
    arm64: BTreeMap<String, Sha256Digest>,
    #[serde(default)]
    fallback: BTreeMap<String, String>,
}

impl ComponentTable {
    fn for_arch(&self, arch: Architecture) -> &BTreeMap<String, Sha256Digest> {
        match arch {
            Architecture::Amd64 => &self.amd64,
            Architecture::Arm64 => &self.arm64,
        }
    }
}

static TABLES: LazyLock<AssetTables> = LazyLock::new(|| {
    toml::from_str(include_str!("../data/wellknown_assets.toml"))
        .expect("embedded asset table is valid")
});

fn component_table(component: Component) -> Option<&'static ComponentTable> {
    TABLES.components.get(component.key())
}

/// Digest of a native build, looked up by the exact original version string.
pub(crate) fn native_digest(
    component: Component,
    arch: Architecture,
    version: &str,
) -> Option<&'static Sha256Digest> {
    component_table(component)?.for_arch(arch).get(version)
}

/// Bundler version mapped from a component's native version string.
pub(crate) fn fallback_version(component: Component, version: &str) -> Option<&'static str> {
    component_table(component)?
        .fallback
        .get(version)
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_tables_parse() {
        assert_eq!(TABLES.schema_version, 1);
        assert!(TABLES.components.contains_key("containerd"));
    }

    #[test]
    fn lookup_is_by_exact_string() {
        assert!(native_digest(Component::Containerd, Architecture::Amd64, "1.4.9").is_some());
        // "v1.4.9" and "1.4.09" parse to the same semantic version, but
        // exact-string lookup treats them as distinct keys.
        assert!(native_digest(Component::Containerd, Architecture::Amd64, "v1.4.9").is_none());
        assert!(native_digest(Component::Containerd, Architecture::Amd64, "1.4.09").is_none());
    }

    #[test]
    fn containerd_has_no_native_arm64_builds() {
        let table = component_table(Component::Containerd).unwrap();
        assert!(table.arm64.is_empty());
        assert!(!table.amd64.is_empty());
    }

    #[test]
    fn every_fallback_target_resolves_natively_on_both_architectures() {
        let containerd = component_table(Component::Containerd).unwrap();
        assert!(!containerd.fallback.is_empty());
        for docker_version in containerd.fallback.values() {
            for arch in [Architecture::Amd64, Architecture::Arm64] {
                assert!(
                    native_digest(Component::Docker, arch, docker_version).is_some(),
                    "docker {docker_version} missing for {arch}"
                );
            }
        }
    }

    #[test]
    fn default_fallback_version_is_mapped() {
        // The degrade-to-default path depends on this entry existing; without
        // it, new architectures would have no boot path at all.
        let chain = Component::Containerd.fallback_chain().unwrap();
        assert!(fallback_version(Component::Containerd, chain.default_version).is_some());
    }
}
