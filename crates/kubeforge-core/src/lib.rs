//! Control-side asset resolution for kubeforge.
//!
//! Maps `{component, architecture, requested version}` to a concrete,
//! integrity-checked [`AssetDescriptor`](kubeforge_schema::AssetDescriptor)
//! using immutable, compiled-in version tables, operator overrides, and a
//! cross-architecture bundler fallback chain, then assembles per-node boot
//! configuration from a cluster spec.
//!
//! Resolution is a pure function over embedded data; it runs once per
//! {component, architecture} pair during cluster-spec compilation and has no
//! side effects. All failures are typed [`ResolveError`] values.

pub mod bootconfig;
pub mod component;
pub mod resolver;
pub mod version;

mod tables;

// Re-exports
pub use bootconfig::{ClusterSpec, SpecError, compile_instance_group, compile_node_assets};
pub use component::{Component, UnknownComponent};
pub use resolver::{PackageOverride, ResolveError, resolve_asset};
