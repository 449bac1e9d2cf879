//! # kiln-graph
//!
//! Pure graph data structures for JVM build target graphs.
//!
//! This crate provides the build graph primitives consumed by
//! `kiln-analysis`: target nodes with ordered dependency lists, alias
//! resolution, derivation chains, closure traversal, and topological
//! sorting. It performs no I/O and holds no compile state.
//!
//! ## Overview
//!
//! - **[`Target`]**: one compilable/linkable unit, with its declared
//!   dependencies in declaration order, an optional derived-from
//!   back-reference (for codegen'd targets), and its source files.
//! - **[`BuildGraph`]**: owns all targets, answers closure and
//!   topological-sort queries, and walks derivation chains.
//! - **[`ClosureConfig`]**: traversal configuration forwarded verbatim
//!   through closure queries.
//!
//! ## Quick Start
//!
//! ```rust
//! use kiln_graph::{BuildGraph, ClosureConfig, Target, TargetId, TargetKind};
//!
//! # fn main() -> kiln_graph::Result<()> {
//! let mut graph = BuildGraph::new();
//! let util = TargetId::new("src/util:util");
//! let lib = TargetId::new("src/lib:lib");
//!
//! graph.insert(Target::new(util.clone(), TargetKind::Library))?;
//! graph.insert(Target::new(lib.clone(), TargetKind::Library).with_dependencies([util.clone()]))?;
//!
//! let closure = graph.closure(&[lib.clone()], &ClosureConfig::default())?;
//! assert_eq!(closure, vec![lib, util]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! `BuildGraph` is immutable after construction; wrap it in an `Arc` and
//! share it freely across threads.

pub mod graph;
pub mod target;

pub use graph::{BuildGraph, ClosureConfig};
pub use target::{Target, TargetId, TargetKind};


/// Error types for build graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A target id was referenced that the graph does not contain.
    #[error("unknown target: {0}")]
    UnknownTarget(TargetId),

    /// A target with the same id was inserted twice.
    #[error("duplicate target: {0}")]
    DuplicateTarget(TargetId),

    /// The dependency edges of the given target participate in a cycle.
    #[error("dependency cycle involving target: {0}")]
    DependencyCycle(TargetId),

    /// A derived-from chain loops back on itself. The build graph is
    /// expected to keep derivation acyclic; this indicates an internal
    /// consistency violation, not a user error.
    #[error("derived-from cycle detected at target: {0}")]
    DerivationCycle(TargetId),
}

/// Result type alias for build graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
