//! Version resolution: `{component, architecture, version, overrides}` to a
//! concrete asset descriptor.
//!
//! Resolution order is a total order and the core contract of this module:
//! operator override, then native table lookup, then the exact-version
//! bundler mapping, then the fixed default bundler version. Pure function
//! over embedded tables; errors are values.

use semver::Version;
use serde::Deserialize;
use thiserror::Error;

use kubeforge_schema::{Architecture, AssetDescriptor, Sha256Digest, UnknownArchitecture};

use crate::component::Component;
use crate::tables;
use crate::version::parse_tolerant;

/// Typed resolution failures, carrying the exact combination that failed so
/// the caller can abort spec compilation with an actionable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The requested version string could not be parsed even tolerantly.
    #[error("unable to parse {component} version string: {version:?}")]
    InvalidVersion {
        /// Component being resolved.
        component: Component,
        /// Offending version string.
        version: String,
    },

    /// The version parses but predates the oldest supported release.
    #[error("unsupported legacy {component} version: {version:?} (minimum {minimum})")]
    UnsupportedLegacyVersion {
        /// Component being resolved.
        component: Component,
        /// Offending version string.
        version: String,
        /// The component's minimum supported version.
        minimum: Version,
    },

    /// No override, no native entry, and no usable bundler mapping.
    #[error("unknown asset for {component} version: {arch} - {version}")]
    UnknownAssetForVersion {
        /// Component being resolved.
        component: Component,
        /// Requested architecture.
        arch: Architecture,
        /// Requested version string.
        version: String,
    },

    /// An architecture value outside the closed set.
    #[error("unknown architecture: {value:?}")]
    UnknownArchitecture {
        /// The rejected value.
        value: String,
    },
}

impl From<UnknownArchitecture> for ResolveError {
    fn from(err: UnknownArchitecture) -> Self {
        Self::UnknownArchitecture { value: err.value }
    }
}

/// Operator-supplied package override, one `{url, hash}` pair per
/// architecture. A pair that is complete for the requested architecture wins
/// over all computed resolution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PackageOverride {
    /// Override URL for amd64.
    #[serde(default)]
    pub url_amd64: Option<String>,
    /// Override digest for amd64.
    #[serde(default)]
    pub hash_amd64: Option<Sha256Digest>,
    /// Override URL for arm64.
    #[serde(default)]
    pub url_arm64: Option<String>,
    /// Override digest for arm64.
    #[serde(default)]
    pub hash_arm64: Option<Sha256Digest>,
}

impl PackageOverride {
    /// The `{url, hash}` pair for `arch`, if both halves are present and the
    /// URL is non-empty.
    pub fn for_arch(&self, arch: Architecture) -> Option<(&str, &Sha256Digest)> {
        let (url, hash) = match arch {
            Architecture::Amd64 => (self.url_amd64.as_deref(), self.hash_amd64.as_ref()),
            Architecture::Arm64 => (self.url_arm64.as_deref(), self.hash_arm64.as_ref()),
        };
        match (url, hash) {
            (Some(url), Some(hash)) if !url.is_empty() => Some((url, hash)),
            _ => None,
        }
    }
}

/// Resolve one component to a downloadable, integrity-checked artifact.
///
/// Resolution order: a complete operator override for `arch` is returned
/// verbatim; otherwise the version is parsed tolerantly, gated against the
/// component's minimum, and looked up by exact string in the native table
/// for `arch`. On a native miss, components with a bundler chain resolve the
/// mapped bundler version instead (or the fixed default version's mapping
/// when the requested version has no entry).
///
/// # Errors
///
/// See [`ResolveError`]; every variant names the exact
/// component/architecture/version combination that failed.
pub fn resolve_asset(
    component: Component,
    arch: Architecture,
    version: &str,
    overrides: Option<&PackageOverride>,
) -> Result<AssetDescriptor, ResolveError> {
    if let Some((url, hash)) = overrides.and_then(|o| o.for_arch(arch)) {
        // Operator overrides are trusted verbatim; the version string is not
        // even parsed on this path.
        tracing::debug!(%component, %arch, url, "using operator override");
        return Ok(AssetDescriptor::single(hash.clone(), url.to_string()));
    }

    let parsed = parse_and_gate(component, version)?;

    if let Some(digest) = tables::native_digest(component, arch, version) {
        let url = component.url_for(arch, version, &parsed);
        return Ok(AssetDescriptor::single(digest.clone(), url));
    }

    if let Some(chain) = component.fallback_chain() {
        // Degrading to the default version when the mapping has no entry is
        // a compatibility compromise, not a correctness guarantee: it keeps
        // a boot path alive for architectures upstream does not build for
        // yet, at the cost of silently substituting a different runtime
        // version.
        let bundler_version = tables::fallback_version(component, version)
            .or_else(|| tables::fallback_version(component, chain.default_version));
        if let Some(bundler_version) = bundler_version {
            tracing::debug!(
                %component,
                %arch,
                version,
                bundler = %chain.bundler,
                bundler_version,
                "no native build, resolving via bundler"
            );
            return resolve_native(chain.bundler, arch, bundler_version);
        }
    }

    Err(ResolveError::UnknownAssetForVersion {
        component,
        arch,
        version: version.to_string(),
    })
}

/// Native-only resolution, used for the bundler leg of a fallback chain.
/// Deliberately never consults a fallback chain, so bundler indirection is
/// bounded at one level.
fn resolve_native(
    component: Component,
    arch: Architecture,
    version: &str,
) -> Result<AssetDescriptor, ResolveError> {
    let parsed = parse_and_gate(component, version)?;

    match tables::native_digest(component, arch, version) {
        Some(digest) => {
            let url = component.url_for(arch, version, &parsed);
            Ok(AssetDescriptor::single(digest.clone(), url))
        }
        None => Err(ResolveError::UnknownAssetForVersion {
            component,
            arch,
            version: version.to_string(),
        }),
    }
}

fn parse_and_gate(component: Component, version: &str) -> Result<Version, ResolveError> {
    let parsed = parse_tolerant(version).map_err(|_| ResolveError::InvalidVersion {
        component,
        version: version.to_string(),
    })?;

    let minimum = component.minimum_version();
    if parsed < minimum {
        return Err(ResolveError::UnsupportedLegacyVersion {
            component,
            version: version.to_string(),
            minimum,
        });
    }

    Ok(parsed)
}
