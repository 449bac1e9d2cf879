//! # kiln-analysis
//!
//! Compile-time dependency analysis for JVM build targets.
//!
//! Given a finalized classpath and the product dependencies recorded by
//! the compiler backend, this crate determines which declared
//! dependencies of a target were *actually* required at compile time,
//! and suggests replacements for the ones that were not.
//!
//! ## Overview
//!
//! - **[`ClasspathIndex`]**: maps targets to the source files,
//!   classfiles, and jars they provide, and inverts that mapping into a
//!   file → owning-targets index.
//! - **[`BootstrapClasspathResolver`]**: enumerates the classfiles the
//!   JVM itself supplies, so JDK internals are excluded from
//!   unused-dependency reasoning.
//! - **[`CompileSession`]** / **[`DependencyContext`]**: per-target
//!   compile state and the strict-dependency resolution policy (alias
//!   collapsing, compiler-plugin closure expansion).
//! - **[`DependencyAnalyzer`]**: ties the above together and implements
//!   unused-dependency detection over empirically observed product
//!   dependencies.
//!
//! ## Control flow
//!
//! Build one [`DependencyAnalyzer`] per batch of targets once their
//! classpath has been finalized, let the compiler record product
//! dependencies, then ask for unused-dependency reports per
//! [`CompileSession`]:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kiln_analysis::{
//!     ClasspathSnapshot, DependencyAnalyzer, DependencyContext, ProductDependencyMap,
//!     SystemProperties,
//! };
//! use kiln_graph::BuildGraph;
//!
//! # fn main() -> kiln_analysis::Result<()> {
//! # let graph = Arc::new(BuildGraph::new());
//! # let session = unimplemented!();
//! let mut snapshot = ClasspathSnapshot::new();
//! // ... register per-target classpath contributions ...
//! snapshot.finalize();
//!
//! let analyzer = DependencyAnalyzer::new(
//!     Arc::clone(&graph),
//!     "/workspace/repo",
//!     snapshot,
//!     SystemProperties::default(),
//! );
//!
//! let product_deps = ProductDependencyMap::new();
//! let ctx = DependencyContext::new(Default::default());
//! let unused = analyzer.compute_unused_deps(&product_deps, &ctx, &session)?;
//! # Ok(())
//! # }
//! ```
//!
//! All computation is synchronous; jar scanning is the only I/O.
//! Callers may parallelize across independent target batches — the
//! per-analyzer caches are populate-once and safe for concurrent
//! readers.

pub mod analyzer;
pub mod bootstrap;
pub mod classpath;
pub mod error;
pub mod report;
pub mod session;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(test)]
mod tests;

pub use analyzer::{ClassesBySource, DependencyAnalyzer, ProductDependencyMap};
pub use bootstrap::{BootstrapClasspathResolver, SystemProperties};
pub use classpath::{ClasspathIndex, ClasspathSnapshot, is_jar_path};
pub use error::{AnalysisError, Result};
pub use report::{UnusedDepEntry, UnusedDepReport};
pub use session::{CompileSession, DeclaredDepsOptions, DependencyContext};
