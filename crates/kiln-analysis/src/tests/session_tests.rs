//! Strict-dependency resolution and session identity tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use kiln_graph::{ClosureConfig, Target, TargetKind};

use super::test_helpers::{graph_of, id, library, session_for};
use crate::session::{DeclaredDepsOptions, DependencyContext};

fn ctx() -> DependencyContext {
    DependencyContext::new(ClosureConfig::default())
}

#[test]
fn strict_resolution_is_direct_deps_plus_self() {
    // No aliases, no plugins: strict mode yields the declared list with
    // the target itself prepended.
    let graph = graph_of([
        library("c", &[]),
        library("b", &["c"]),
        library("a", &["b", "c"]),
    ]);
    let session = session_for("a", true);

    let deps = session.dependencies(&graph, &ctx()).expect("resolve");
    assert_eq!(deps, vec![id("a"), id("b"), id("c")]);
}

#[test]
fn non_strict_resolution_is_the_full_closure() {
    let graph = graph_of([
        library("d", &[]),
        library("c", &["d"]),
        library("b", &["c"]),
        library("a", &["b"]),
    ]);
    let session = session_for("a", false);

    let deps = session.dependencies(&graph, &ctx()).expect("resolve");
    assert_eq!(deps, vec![id("a"), id("b"), id("c"), id("d")]);
}

#[test]
fn zero_dependency_target_yields_just_itself() {
    let graph = graph_of([library("solo", &[])]);
    let session = session_for("solo", true);

    let deps = session.strict_dependencies(&graph, &ctx()).expect("resolve");
    assert_eq!(deps, vec![id("solo")]);
}

#[test]
fn aliases_are_transparent() {
    // Resolution output is identical whether or not an alias sits
    // between the target and its real dependency.
    let direct = graph_of([library("real", &[]), library("lib", &["real"])]);
    let aliased = graph_of([
        library("real", &[]),
        Target::new(id("alias"), TargetKind::Alias).with_dependencies([id("real")]),
        library("lib", &["alias"]),
    ]);
    let session = session_for("lib", true);

    let via_direct = session.strict_dependencies(&direct, &ctx()).expect("resolve");
    let via_alias = session.strict_dependencies(&aliased, &ctx()).expect("resolve");
    assert_eq!(via_direct, via_alias);
    assert_eq!(via_direct, vec![id("lib"), id("real")]);
}

#[test]
fn nested_aliases_collapse_recursively() {
    let graph = graph_of([
        library("real", &[]),
        Target::new(id("inner"), TargetKind::Alias).with_dependencies([id("real")]),
        Target::new(id("outer"), TargetKind::Alias).with_dependencies([id("inner")]),
        library("lib", &["outer"]),
    ]);
    let session = session_for("lib", true);

    let deps = session.strict_dependencies(&graph, &ctx()).expect("resolve");
    assert_eq!(deps, vec![id("lib"), id("real")]);
}

#[test]
fn plugin_dependencies_expand_to_their_whole_closure() {
    // Compile time is runtime for plugins: P1's transitive deps P2 and
    // P3 are compile-time relevant, not just P1.
    let graph = graph_of([
        library("p3", &[]),
        library("p2", &["p3"]),
        Target::new(id("p1"), TargetKind::CompilerPlugin).with_dependencies([id("p2")]),
        library("other", &[]),
        library("lib", &["p1", "other"]),
    ]);
    let session = session_for("lib", true);

    let deps = session.strict_dependencies(&graph, &ctx()).expect("resolve");
    assert_eq!(
        deps,
        vec![id("lib"), id("p1"), id("p2"), id("p3"), id("other")]
    );
}

#[test]
fn declared_dependencies_filter_plugins_and_exported() {
    let graph = graph_of([
        library("exported", &[]),
        library("plain", &[]),
        Target::new(id("plugin"), TargetKind::CompilerPlugin),
        library("lib", &["exported", "plain", "plugin"])
            .with_exports([id("exported")]),
    ]);
    let session = session_for("lib", true);

    let declared = session
        .declared_dependencies(&graph, &ctx(), DeclaredDepsOptions::default())
        .expect("resolve");
    assert_eq!(declared, vec![id("plain")]);

    let everything = session
        .declared_dependencies(
            &graph,
            &ctx(),
            DeclaredDepsOptions {
                include_compiler_plugins: true,
                include_exported: true,
            },
        )
        .expect("resolve");
    assert_eq!(everything, vec![id("exported"), id("plain"), id("plugin")]);
}

#[test]
fn resolution_is_idempotent() {
    let graph = graph_of([
        library("b", &[]),
        Target::new(id("plugin"), TargetKind::CompilerPlugin).with_dependencies([id("b")]),
        library("a", &["plugin", "b"]),
    ]);
    let session = session_for("a", true);

    let first = session.strict_dependencies(&graph, &ctx()).expect("resolve");
    let second = session.strict_dependencies(&graph, &ctx()).expect("resolve");
    assert_eq!(first, second);
}

#[test]
fn session_identity_is_target_analysis_and_classes_dir() {
    let a = session_for("lib", true);
    let mut b = a.clone();
    // Differ in fields outside the identity triple.
    b.jar_file = PathBuf::from("/elsewhere/z.jar");
    b.log_file = PathBuf::from("/elsewhere/compile.log");
    b.strict_deps = false;
    assert_eq!(a, b);

    let hash = |session: &crate::CompileSession| {
        let mut hasher = DefaultHasher::new();
        session.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(hash(&a), hash(&b));

    let mut c = a.clone();
    c.classes_dir = PathBuf::from("/elsewhere/classes");
    assert_ne!(a, c);
}
