//! The dependency analyzer: file indexing, transitive-dependency maps,
//! and unused-dependency detection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use kiln_graph::{BuildGraph, ClosureConfig, TargetId};

use crate::bootstrap::{BootstrapClasspathResolver, SystemProperties};
use crate::classpath::{ClasspathIndex, ClasspathSnapshot};
use crate::error::Result;
use crate::session::{CompileSession, DeclaredDepsOptions, DependencyContext};

const JAR_SUFFIX: &str = ".jar";
const CLASS_SUFFIX: &str = ".class";

/// Product dependencies recorded by the compiler backend: for each
/// target, a map from its source files to the dependency files
/// (sources, classfiles, or jars) actually consumed while compiling
/// that source. Read-only input to unused-dependency detection.
#[derive(Debug, Default)]
pub struct ProductDependencyMap {
    by_target: FxHashMap<TargetId, FxHashMap<PathBuf, FxHashSet<PathBuf>>>,
}

impl ProductDependencyMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the dependencies consumed while compiling one source of a
    /// target.
    pub fn record(
        &mut self,
        target: TargetId,
        source: PathBuf,
        deps: impl IntoIterator<Item = PathBuf>,
    ) {
        self.by_target
            .entry(target)
            .or_default()
            .entry(source)
            .or_default()
            .extend(deps);
    }

    /// The per-source consumed dependencies for a target, if any were
    /// recorded.
    pub fn for_target(
        &self,
        target: &TargetId,
    ) -> Option<&FxHashMap<PathBuf, FxHashSet<PathBuf>>> {
        self.by_target.get(target)
    }
}

/// Externally supplied index from build-root-relative source path to
/// the classfiles emitted from that source.
#[derive(Debug, Default)]
pub struct ClassesBySource {
    by_source: FxHashMap<PathBuf, FxHashSet<PathBuf>>,
}

impl ClassesBySource {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the classfiles emitted from a source file.
    pub fn record(&mut self, source: PathBuf, classfiles: impl IntoIterator<Item = PathBuf>) {
        self.by_source.entry(source).or_default().extend(classfiles);
    }

    /// The classfiles emitted from a source, empty if unknown.
    pub fn classfiles_for(&self, source: &Path) -> FxHashSet<PathBuf> {
        self.by_source.get(source).cloned().unwrap_or_default()
    }
}

/// Helper for analysis passes that need to reason about source
/// dependencies.
///
/// Its primary purpose is a file → owning-targets mapping that callers
/// use to determine which targets correspond to the actual source
/// dependencies of any given target, plus the unused-dependency
/// detection built on top of it. Build one per batch of targets, after
/// their classpath has been finalized.
#[derive(Debug)]
pub struct DependencyAnalyzer {
    graph: Arc<BuildGraph>,
    buildroot: PathBuf,
    index: ClasspathIndex,
    bootstrap: BootstrapClasspathResolver,
}

impl DependencyAnalyzer {
    /// Create an analyzer over a finalized classpath snapshot.
    pub fn new(
        graph: Arc<BuildGraph>,
        buildroot: impl Into<PathBuf>,
        snapshot: ClasspathSnapshot,
        properties: SystemProperties,
    ) -> Self {
        let buildroot = buildroot.into();
        let index = ClasspathIndex::new(Arc::clone(&graph), buildroot.clone(), snapshot);
        Self {
            graph,
            buildroot,
            index,
            bootstrap: BootstrapClasspathResolver::new(properties),
        }
    }

    /// The build graph this analyzer reads.
    pub fn graph(&self) -> &Arc<BuildGraph> {
        &self.graph
    }

    /// The files a target provides. See
    /// [`ClasspathIndex::files_for_target`].
    pub fn files_for_target(&self, target: &TargetId) -> Result<Arc<FxHashSet<PathBuf>>> {
        self.index.files_for_target(target)
    }

    /// The file → owning-targets index over a set of targets. See
    /// [`ClasspathIndex::targets_by_file`].
    pub fn targets_by_file<'a>(
        &self,
        targets: impl IntoIterator<Item = &'a TargetId>,
    ) -> Result<IndexMap<PathBuf, IndexSet<TargetId>>> {
        self.index.targets_by_file(targets)
    }

    /// The classfile entry names supplied by the JVM itself. See
    /// [`BootstrapClasspathResolver::classfiles`].
    pub fn bootstrap_classfiles(&self) -> Result<Arc<FxHashSet<String>>> {
        self.bootstrap.classfiles()
    }

    /// Map each target (and everything in its closure) to its complete
    /// transitive dependency set.
    ///
    /// One accumulation pass over the topological order, so the cost is
    /// proportional to the edge count rather than a closure walk per
    /// target: dependencies are processed before their dependents, so
    /// each dependency's transitive set is a constant-time lookup when
    /// its dependents need it.
    pub fn compute_transitive_deps_by_target(
        &self,
        targets: &[TargetId],
    ) -> Result<FxHashMap<TargetId, FxHashSet<TargetId>>> {
        let sorted = self.graph.sort_targets(targets)?;
        let mut by_target: FxHashMap<TargetId, FxHashSet<TargetId>> = FxHashMap::default();

        // Least dependent first.
        for id in sorted.iter().rev() {
            let target = self.graph.target(id)?;
            let mut transitive: FxHashSet<TargetId> = FxHashSet::default();
            for dep in &target.dependencies {
                if let Some(dep_transitive) = by_target.get(dep) {
                    transitive.extend(dep_transitive.iter().cloned());
                }
                transitive.insert(dep.clone());
            }

            // Generated-sources facets are not first-class nodes of the
            // traversal; register their own direct deps here, including
            // a possible back-edge to the original target.
            for facet in &target.generated_sources {
                let facet_target = self.graph.target(facet)?;
                by_target
                    .entry(facet.clone())
                    .or_default()
                    .extend(facet_target.dependencies.iter().cloned());
            }

            by_target.insert(id.clone(), transitive);
        }
        Ok(by_target)
    }

    /// Normalize one consumed-dependency path, as reported by the
    /// compiler backend, to the unit set it is compared under.
    ///
    /// Jars are preserved whole — the backend does not support finer
    /// granularity — and classfiles map to themselves. Anything else is
    /// assumed to be a source file: it is relativized against the build
    /// root and looked up in the per-source classfile index, yielding
    /// the classfiles actually emitted from it (empty if the index has
    /// no entry).
    pub fn normalize_product_dep(
        &self,
        classes_by_source: &ClassesBySource,
        dep: &Path,
    ) -> FxHashSet<PathBuf> {
        let name = dep.to_string_lossy();
        if name.ends_with(JAR_SUFFIX) || name.ends_with(CLASS_SUFFIX) {
            return std::iter::once(dep.to_path_buf()).collect();
        }
        let relative = dep.strip_prefix(&self.buildroot).unwrap_or(dep);
        classes_by_source.classfiles_for(relative)
    }

    /// Determine which declared dependencies of the session's target
    /// went unused, and suggest replacements for them.
    ///
    /// A declared dependency is used iff the consumed product
    /// dependencies intersect the files it provides. Resource bundles
    /// and unpacked archives have no analyzable footprint and are never
    /// flagged. A used generated target also counts its derivation
    /// ancestors as used, and an unused original is not double-reported
    /// alongside its unused generated copy. For each confirmed-unused
    /// dependency, its transitive closure is searched for targets whose
    /// files were consumed; their concrete derived-from targets are the
    /// suggested replacements (possibly none).
    ///
    /// Holds no state across invocations: identical inputs yield
    /// identical output.
    pub fn compute_unused_deps(
        &self,
        product_deps: &ProductDependencyMap,
        ctx: &DependencyContext,
        session: &CompileSession,
    ) -> Result<FxHashMap<TargetId, FxHashSet<TargetId>>> {
        // Flatten the product deps of this target across its sources.
        let mut consumed: FxHashSet<PathBuf> = FxHashSet::default();
        if let Some(by_source) = product_deps.for_target(&session.target) {
            for deps in by_source.values() {
                consumed.extend(deps.iter().cloned());
            }
        }

        // Classify each declared dep (sans plugins and exported deps)
        // by whether any of its files were consumed.
        let mut used: FxHashSet<TargetId> = FxHashSet::default();
        let mut unused: FxHashSet<TargetId> = FxHashSet::default();
        for dep in
            session.declared_dependencies(&self.graph, ctx, DeclaredDepsOptions::default())?
        {
            if used.contains(&dep) || unused.contains(&dep) {
                continue;
            }
            if !self.graph.target(&dep)?.has_compiled_output() {
                continue;
            }
            let files = self.index.files_for_target(&dep)?;
            if files.iter().any(|f| consumed.contains(f)) {
                used.insert(dep);
            } else {
                unused.insert(dep);
            }
        }

        if unused.is_empty() {
            return Ok(FxHashMap::default());
        }

        // A used generated target implies reliance on its origin: move
        // any derivation ancestor of a used dep out of the unused set.
        for dep in used.iter().cloned().collect::<Vec<_>>() {
            for ancestor in self.graph.derived_from_chain(&dep)? {
                if unused.remove(&ancestor) {
                    debug!(target_id = %ancestor, derived = %dep, "promoted via derivation chain");
                    used.insert(ancestor);
                }
            }
        }

        // Avoid reporting both an original and its generated copy.
        for dep in unused.iter().cloned().collect::<Vec<_>>() {
            let chain = self.graph.derived_from_chain(&dep)?;
            if chain.iter().any(|ancestor| unused.contains(ancestor)) {
                unused.remove(&dep);
            }
        }

        if unused.is_empty() {
            return Ok(FxHashMap::default());
        }

        // For each unused dep, search its closure (excluding itself)
        // for unclassified targets whose files were consumed, and
        // suggest their concrete derived-from targets as replacements.
        let mut replacements: FxHashMap<TargetId, FxHashSet<TargetId>> = FxHashMap::default();
        let search_config = ClosureConfig {
            include_roots: false,
            ..ctx.closure_config().clone()
        };
        for dep in &unused {
            let mut suggested: FxHashSet<TargetId> = FxHashSet::default();
            for candidate in self.graph.closure(std::slice::from_ref(dep), &search_config)? {
                if used.contains(&candidate) || unused.contains(&candidate) {
                    continue;
                }
                let files = self.index.files_for_target(&candidate)?;
                if files.iter().any(|f| consumed.contains(f)) {
                    suggested.insert(self.graph.concrete_derived_from(&candidate)?);
                }
            }
            debug!(
                target_id = %dep,
                suggestions = suggested.len(),
                "declared dependency is unused"
            );
            replacements.insert(dep.clone(), suggested);
        }

        Ok(replacements)
    }
}
