//! Build target value objects.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Identifier of a build target, e.g. `src/java/com/acme/lib:lib`.
///
/// Cheap to clone: backed by a shared string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(Arc<str>);

impl TargetId {
    /// Create a target id from an address-like string.
    pub fn new(address: impl AsRef<str>) -> Self {
        Self(Arc::from(address.as_ref()))
    }

    /// The target address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// The kind of a build target, as far as dependency analysis cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// A regular compilable library or binary target.
    Library,
    /// A transparent pass-through with no compile identity of its own.
    /// Aliases never appear in resolved dependency sequences.
    Alias,
    /// A bundle of runtime resource files. Has no compiled output.
    Resources,
    /// An archive unpacked into loose files. Has no compiled output.
    UnpackedJars,
    /// A compiler plugin: its code runs during compilation of its
    /// dependents, so its whole transitive closure is compile-time
    /// relevant.
    CompilerPlugin,
}

/// One node in the build graph: a compilable/linkable unit.
///
/// Dependency order is declaration order and is preserved by every
/// traversal in this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub kind: TargetKind,
    /// Declared dependencies, in declaration order.
    pub dependencies: Vec<TargetId>,
    /// Subset of `dependencies` that this target re-exports to its own
    /// dependents.
    pub exports: FxHashSet<TargetId>,
    /// The target this one was generated from, if any.
    pub derived_from: Option<TargetId>,
    /// Source files, relative to the build root.
    pub sources: Vec<PathBuf>,
    /// Sibling targets holding generated sources compiled as part of
    /// this target (e.g. a Scala library's companion Java sources).
    pub generated_sources: Vec<TargetId>,
}

impl Target {
    /// Create a target with no dependencies and no sources.
    pub fn new(id: TargetId, kind: TargetKind) -> Self {
        Self {
            id,
            kind,
            dependencies: Vec::new(),
            exports: FxHashSet::default(),
            derived_from: None,
            sources: Vec::new(),
            generated_sources: Vec::new(),
        }
    }

    /// Set the declared dependency list, in declaration order.
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = TargetId>) -> Self {
        self.dependencies = deps.into_iter().collect();
        self
    }

    /// Mark a subset of the declared dependencies as exported.
    pub fn with_exports(mut self, exports: impl IntoIterator<Item = TargetId>) -> Self {
        self.exports = exports.into_iter().collect();
        self
    }

    /// Record the target this one was derived from.
    pub fn with_derived_from(mut self, origin: TargetId) -> Self {
        self.derived_from = Some(origin);
        self
    }

    /// Set the build-root-relative source files.
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = PathBuf>) -> Self {
        self.sources = sources.into_iter().collect();
        self
    }

    /// Attach generated-sources facet targets.
    pub fn with_generated_sources(mut self, facets: impl IntoIterator<Item = TargetId>) -> Self {
        self.generated_sources = facets.into_iter().collect();
        self
    }

    /// True if this target is a transparent alias.
    pub fn is_alias(&self) -> bool {
        self.kind == TargetKind::Alias
    }

    /// True if compiling this target produces classfiles or a jar.
    ///
    /// Resource bundles and unpacked archives have no analyzable
    /// compiled-output footprint and must never be flagged as unused
    /// dependencies.
    pub fn has_compiled_output(&self) -> bool {
        !matches!(self.kind, TargetKind::Resources | TargetKind::UnpackedJars)
    }
}
