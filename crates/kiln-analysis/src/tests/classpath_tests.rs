//! Classpath snapshot and file-index tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_graph::{Target, TargetKind};

use super::test_helpers::{graph_of, id, library, snapshot_of, BUILDROOT};
use crate::classpath::{is_jar_path, ClasspathIndex, ClasspathSnapshot};
use crate::error::AnalysisError;

#[test]
fn jar_paths_are_recognized_by_extension() {
    assert!(is_jar_path(Path::new("/repo/3rdparty/guava.jar")));
    assert!(!is_jar_path(Path::new("/repo/classes/com/acme/Foo.class")));
    assert!(!is_jar_path(Path::new("/repo/src/Foo.java")));
}

#[test]
fn reading_before_finalization_fails_fast() {
    let graph = graph_of([library("a", &[])]);
    let snapshot = ClasspathSnapshot::new();
    let index = ClasspathIndex::new(Arc::new(graph), BUILDROOT, snapshot);

    let err = index.files_for_target(&id("a")).unwrap_err();
    assert!(matches!(err, AnalysisError::ClasspathNotFinalized));
}

#[test]
fn files_for_target_unions_sources_facets_and_classpath() {
    let scala = library("scala", &[])
        .with_sources([PathBuf::from("src/scala/Main.scala")])
        .with_generated_sources([id("javasrc")]);
    let javasrc = library("javasrc", &[]).with_sources([PathBuf::from("src/java/Helper.java")]);
    let graph = graph_of([scala, javasrc]);

    let snapshot = snapshot_of(&[(
        "scala",
        &[
            "/workspace/.kiln/classes/scala/Main.class",
            "/workspace/repo/3rdparty/dep.jar",
        ],
    )]);
    let index = ClasspathIndex::new(Arc::new(graph), BUILDROOT, snapshot);

    let files = index.files_for_target(&id("scala")).expect("files");
    assert!(files.contains(Path::new("/workspace/repo/src/scala/Main.scala")));
    // Sources of the generated-sources facet count as this target's.
    assert!(files.contains(Path::new("/workspace/repo/src/java/Helper.java")));
    assert!(files.contains(Path::new("/workspace/.kiln/classes/scala/Main.class")));
    assert!(files.contains(Path::new("/workspace/repo/3rdparty/dep.jar")));
    assert_eq!(files.len(), 4);
}

#[test]
fn targets_by_file_inverts_files_for_target() {
    let graph = graph_of([
        library("a", &[]).with_sources([PathBuf::from("src/a/A.java")]),
        library("b", &[]).with_sources([PathBuf::from("src/b/B.java")]),
    ]);
    let snapshot = snapshot_of(&[
        ("a", &["/workspace/.kiln/classes/a/A.class"]),
        ("b", &["/workspace/.kiln/classes/b/B.class"]),
    ]);
    let index = ClasspathIndex::new(Arc::new(graph), BUILDROOT, snapshot);

    let targets = [id("a"), id("b")];
    let by_file = index.targets_by_file(targets.iter()).expect("invert");

    // Round trip: every file maps to targets that provide it, and every
    // provided file appears in the mapping.
    for (file, owners) in &by_file {
        for owner in owners {
            let files = index.files_for_target(owner).expect("files");
            assert!(files.contains(file), "{owner} should provide {file:?}");
        }
    }
    for target in &targets {
        for file in index.files_for_target(target).expect("files").iter() {
            assert!(by_file
                .get(file)
                .is_some_and(|owners| owners.contains(target)));
        }
    }
}

#[test]
fn canonical_jar_declarer_is_ordered_first() {
    // The same jar may reach several targets; the direct declarer must
    // surface first in the value set.
    let jar = "/workspace/repo/3rdparty/guava.jar";
    let graph = graph_of([library("direct", &[]), library("transitive", &["direct"])]);
    let snapshot = snapshot_of(&[("direct", &[jar]), ("transitive", &[jar])]);
    let index = ClasspathIndex::new(Arc::new(graph), BUILDROOT, snapshot);

    let targets = [id("direct"), id("transitive")];
    let by_file = index.targets_by_file(targets.iter()).expect("invert");

    let owners = by_file.get(Path::new(jar)).expect("jar is indexed");
    assert_eq!(owners.get_index(0), Some(&id("direct")));
    assert_eq!(owners.len(), 2);
}

#[test]
fn files_for_target_is_memoized_per_target() {
    let graph = graph_of([library("a", &[]).with_sources([PathBuf::from("src/a/A.java")])]);
    let snapshot = snapshot_of(&[("a", &["/workspace/.kiln/classes/a/A.class"])]);
    let index = ClasspathIndex::new(Arc::new(graph), BUILDROOT, snapshot);

    let first = index.files_for_target(&id("a")).expect("files");
    let second = index.files_for_target(&id("a")).expect("files");
    // Same cached allocation, not merely an equal set.
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn resources_targets_can_still_provide_files() {
    // Resource bundles are excluded from unused-dep judgments, but the
    // index itself reports their files like any other target's.
    let graph = graph_of([Target::new(id("res"), TargetKind::Resources)
        .with_sources([PathBuf::from("src/res/log4j.properties")])]);
    let snapshot = snapshot_of(&[]);
    let index = ClasspathIndex::new(Arc::new(graph), BUILDROOT, snapshot);

    let files = index.files_for_target(&id("res")).expect("files");
    assert!(files.contains(Path::new("/workspace/repo/src/res/log4j.properties")));
}
