//! Per-target compile sessions and strict-dependency resolution.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use kiln_graph::{BuildGraph, ClosureConfig, Target, TargetId};

use crate::error::Result;

/// Capability predicate identifying compiler-plugin targets.
pub type PluginPredicate = Arc<dyn Fn(&Target) -> bool + Send + Sync>;

/// Configuration for strict-dependency resolution, constructed once per
/// analysis batch.
///
/// The plugin predicate decides which dependency targets are compiler
/// plugins — their code runs during compilation of the dependent, so
/// their entire transitive closure is compile-time relevant. The
/// closure configuration is forwarded verbatim to every closure
/// traversal performed on the context's behalf.
#[derive(Clone)]
pub struct DependencyContext {
    closure_config: ClosureConfig,
    plugin_predicate: PluginPredicate,
}

impl DependencyContext {
    /// Create a context that recognizes plugins by their target kind.
    pub fn new(closure_config: ClosureConfig) -> Self {
        Self {
            closure_config,
            plugin_predicate: Arc::new(|t: &Target| {
                t.kind == kiln_graph::TargetKind::CompilerPlugin
            }),
        }
    }

    /// Replace the plugin capability predicate.
    pub fn with_plugin_predicate(mut self, predicate: PluginPredicate) -> Self {
        self.plugin_predicate = predicate;
        self
    }

    /// True if the target satisfies the plugin capability predicate.
    pub fn is_compiler_plugin(&self, target: &Target) -> bool {
        (self.plugin_predicate)(target)
    }

    /// The closure traversal configuration.
    pub fn closure_config(&self) -> &ClosureConfig {
        &self.closure_config
    }
}

impl fmt::Debug for DependencyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyContext")
            .field("closure_config", &self.closure_config)
            .finish_non_exhaustive()
    }
}

/// Filtering options for [`CompileSession::declared_dependencies`].
///
/// The defaults match what unused-dependency detection wants: compiler
/// plugins and exported dependencies are both excluded.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredDepsOptions {
    /// Keep compiler-plugin dependencies in the result.
    pub include_compiler_plugins: bool,
    /// Keep dependencies the target re-exports in the result.
    pub include_exported: bool,
}

/// A context for the compilation of one target.
///
/// Bundles the compile artifact locations with the strict-deps policy.
/// This can be used to differentiate a partially completed compile in a
/// temporary location from a finalized compile in its permanent
/// location; identity is (target, analysis file, classes dir) — two
/// sessions are the same compile unit iff those three coincide, even if
/// the other fields differ.
#[derive(Debug, Clone)]
pub struct CompileSession {
    pub target: TargetId,
    pub analysis_file: PathBuf,
    pub portable_analysis_file: PathBuf,
    pub classes_dir: PathBuf,
    pub jar_file: PathBuf,
    pub log_file: PathBuf,
    /// Resolved source files of the target, relative to the build root.
    pub sources: Vec<PathBuf>,
    /// Whether this target compiles against only its declared
    /// dependencies (plus plugin closures) rather than its full
    /// transitive closure.
    pub strict_deps: bool,
}

impl CompileSession {
    fn identity(&self) -> (&TargetId, &PathBuf, &PathBuf) {
        (&self.target, &self.analysis_file, &self.classes_dir)
    }

    /// The compile-time dependencies of this session's target, under
    /// the given context.
    ///
    /// Non-strict sessions see the full transitive closure; strict
    /// sessions see the resolved declared dependency sequence, self
    /// first.
    pub fn dependencies(
        &self,
        graph: &BuildGraph,
        ctx: &DependencyContext,
    ) -> Result<Vec<TargetId>> {
        if self.strict_deps {
            self.strict_dependencies(graph, ctx)
        } else {
            self.all_dependencies(graph, ctx)
        }
    }

    /// The full transitive closure of the session's target.
    pub fn all_dependencies(
        &self,
        graph: &BuildGraph,
        ctx: &DependencyContext,
    ) -> Result<Vec<TargetId>> {
        Ok(graph.closure(std::slice::from_ref(&self.target), ctx.closure_config())?)
    }

    /// The 'strict' compile-time dependencies of the session's target.
    ///
    /// Resolves the declared dependency sequence in declaration order:
    /// aliases are collapsed recursively and never appear in the
    /// result; compiler plugins are replaced by their entire transitive
    /// closure, since compile time is runtime for them; anything else
    /// is yielded as-is. The target itself always comes first, so a
    /// target with zero dependencies yields just itself.
    pub fn strict_dependencies(
        &self,
        graph: &BuildGraph,
        ctx: &DependencyContext,
    ) -> Result<Vec<TargetId>> {
        let mut out = vec![self.target.clone()];
        let target = graph.target(&self.target)?;

        // Explicit work stack rather than recursion, with a visited set
        // on alias expansion so a pathological alias cycle terminates.
        let mut stack: Vec<TargetId> = target.dependencies.iter().rev().cloned().collect();
        let mut expanded_aliases: FxHashSet<TargetId> = FxHashSet::default();
        while let Some(id) = stack.pop() {
            let node = graph.target(&id)?;
            if node.is_alias() {
                if expanded_aliases.insert(id) {
                    for dep in node.dependencies.iter().rev() {
                        stack.push(dep.clone());
                    }
                }
            } else if ctx.is_compiler_plugin(node) {
                out.extend(graph.closure(std::slice::from_ref(&id), ctx.closure_config())?);
            } else {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// The alias-collapsed declared dependencies of the session's
    /// target, without plugin closure expansion and without the target
    /// itself.
    ///
    /// Unlike [`strict_dependencies`](Self::strict_dependencies), this
    /// answers "what did the author declare" rather than "what is
    /// compile-time relevant": plugins and exported dependencies are
    /// filtered out unless the options keep them.
    pub fn declared_dependencies(
        &self,
        graph: &BuildGraph,
        ctx: &DependencyContext,
        options: DeclaredDepsOptions,
    ) -> Result<Vec<TargetId>> {
        let target = graph.target(&self.target)?;
        let mut out = Vec::new();
        let mut stack: Vec<TargetId> = target
            .dependencies
            .iter()
            .rev()
            .filter(|dep| options.include_exported || !target.exports.contains(*dep))
            .cloned()
            .collect();
        let mut expanded_aliases: FxHashSet<TargetId> = FxHashSet::default();
        while let Some(id) = stack.pop() {
            let node = graph.target(&id)?;
            if node.is_alias() {
                if expanded_aliases.insert(id) {
                    for dep in node.dependencies.iter().rev() {
                        stack.push(dep.clone());
                    }
                }
            } else if !options.include_compiler_plugins && ctx.is_compiler_plugin(node) {
                continue;
            } else {
                out.push(id);
            }
        }
        Ok(out)
    }
}

impl PartialEq for CompileSession {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for CompileSession {}

impl Hash for CompileSession {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}
