//! Finalized classpath snapshots and the file → target index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use kiln_graph::{BuildGraph, TargetId};

use crate::error::{AnalysisError, Result};

/// True if the path names a jar archive.
pub fn is_jar_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "jar")
}

/// An externally finalized, ordered list of classpath contributions per
/// target.
///
/// Entries are absolute paths to classfiles or jars. Jars are kept as
/// whole units; their finer-grained membership is not resolved, which
/// matches the granularity the compiler backend itself can report.
/// Read-only once [`finalize`](Self::finalize) has been called.
#[derive(Debug, Default)]
pub struct ClasspathSnapshot {
    contributions: FxHashMap<TargetId, Vec<PathBuf>>,
    finalized: bool,
}

impl ClasspathSnapshot {
    /// Create an empty, unfinalized snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append classpath entries attributed to a target, preserving
    /// order. Registering after finalization is a caller bug.
    pub fn register(
        &mut self,
        target: TargetId,
        entries: impl IntoIterator<Item = PathBuf>,
    ) {
        debug_assert!(!self.finalized, "classpath snapshot already finalized");
        self.contributions.entry(target).or_default().extend(entries);
    }

    /// Mark the snapshot complete. Reads are only valid afterwards.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    /// True once [`finalize`](Self::finalize) has been called.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The entries registered for a target, in registration order.
    /// Fails fast if the snapshot has not been finalized.
    pub fn entries_for_target(&self, target: &TargetId) -> Result<&[PathBuf]> {
        if !self.finalized {
            return Err(AnalysisError::ClasspathNotFinalized);
        }
        Ok(self
            .contributions
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }
}

/// Answers "which files does this target provide", memoized per target
/// for the lifetime of the index.
///
/// The cache is populate-once, read-many: population is idempotent, so
/// two racing readers computing the same entry overwrite each other
/// with identical results.
#[derive(Debug)]
pub struct ClasspathIndex {
    graph: Arc<BuildGraph>,
    buildroot: PathBuf,
    snapshot: ClasspathSnapshot,
    cache: RwLock<FxHashMap<TargetId, Arc<FxHashSet<PathBuf>>>>,
}

impl ClasspathIndex {
    /// Create an index over a finalized snapshot.
    pub fn new(
        graph: Arc<BuildGraph>,
        buildroot: impl Into<PathBuf>,
        snapshot: ClasspathSnapshot,
    ) -> Self {
        Self {
            graph,
            buildroot: buildroot.into(),
            snapshot,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// The snapshot backing this index.
    pub fn snapshot(&self) -> &ClasspathSnapshot {
        &self.snapshot
    }

    /// The set of absolute paths of source, class, and jar files the
    /// target provides.
    ///
    /// Composition: the target's own sources, the sources of each of
    /// its generated-sources facet targets, and the classfiles and jars
    /// attributed to it by the finalized classpath.
    pub fn files_for_target(&self, target: &TargetId) -> Result<Arc<FxHashSet<PathBuf>>> {
        if let Some(files) = self.cache.read().get(target) {
            return Ok(Arc::clone(files));
        }

        let node = self.graph.target(target)?;
        let mut files: FxHashSet<PathBuf> = FxHashSet::default();

        for src in &node.sources {
            files.insert(self.buildroot.join(src));
        }
        for facet in &node.generated_sources {
            let facet_node = self.graph.target(facet)?;
            for src in &facet_node.sources {
                files.insert(self.buildroot.join(src));
            }
        }
        for entry in self.snapshot.entries_for_target(target)? {
            files.insert(entry.clone());
        }

        let files = Arc::new(files);
        self.cache
            .write()
            .insert(target.clone(), Arc::clone(&files));
        Ok(files)
    }

    /// Invert [`files_for_target`](Self::files_for_target) over a set
    /// of targets into a file → ordered-target-set multimap.
    ///
    /// The value is usually a singleton: a source or class file belongs
    /// to one target. A jar, however, may be provided by several
    /// targets, and insertion order is preserved so the first target —
    /// the one that depends on the jar directly rather than receiving
    /// it transitively — is the canonical declarer.
    pub fn targets_by_file<'a>(
        &self,
        targets: impl IntoIterator<Item = &'a TargetId>,
    ) -> Result<IndexMap<PathBuf, IndexSet<TargetId>>> {
        let mut by_file: IndexMap<PathBuf, IndexSet<TargetId>> = IndexMap::new();
        for target in targets {
            for file in self.files_for_target(target)?.iter() {
                by_file
                    .entry(file.clone())
                    .or_default()
                    .insert(target.clone());
            }
        }
        Ok(by_file)
    }
}
