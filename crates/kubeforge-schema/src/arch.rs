//! Target CPU architectures for provisioned nodes.

use thiserror::Error;

/// CPU architecture of a provisioned machine.
///
/// This is a closed set: every component asset is resolved per architecture,
/// and a value outside the set is a hard resolution error, never silently
/// ignored.
///
/// # Example
///
/// ```
/// use kubeforge_schema::Architecture;
///
/// let arch: Architecture = "arm64".parse().unwrap();
/// assert_eq!(arch.as_str(), "arm64");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// Intel/AMD 64-bit, the default for most instance types.
    #[default]
    Amd64,
    /// ARM 64-bit (Graviton and similar).
    Arm64,
}

/// Error for an architecture string outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown architecture: {value:?}")]
pub struct UnknownArchitecture {
    /// The rejected value.
    pub value: String,
}

impl Architecture {
    /// Kubernetes-convention name (`amd64` / `arm64`), used in release URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }

    /// Docker static-binary convention (`x86_64` / `aarch64`).
    ///
    /// Distinct from [`as_str()`](Self::as_str): download.docker.com keys its
    /// directory layout on the uname machine name, not the Go arch name.
    pub fn uname_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "x86_64",
            Self::Arm64 => "aarch64",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Architecture {
    type Err = UnknownArchitecture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "amd64" | "x86_64" => Ok(Self::Amd64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            _ => Err(UnknownArchitecture {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_naming_conventions() {
        assert_eq!("amd64".parse::<Architecture>(), Ok(Architecture::Amd64));
        assert_eq!("x86_64".parse::<Architecture>(), Ok(Architecture::Amd64));
        assert_eq!("arm64".parse::<Architecture>(), Ok(Architecture::Arm64));
        assert_eq!("AARCH64".parse::<Architecture>(), Ok(Architecture::Arm64));
    }

    #[test]
    fn rejects_values_outside_the_closed_set() {
        let err = "ppc64le".parse::<Architecture>().unwrap_err();
        assert_eq!(
            err,
            UnknownArchitecture {
                value: "ppc64le".to_string(),
            }
        );
    }
}
