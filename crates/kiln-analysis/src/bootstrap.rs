//! Bootstrap classpath resolution: which classfiles does the JVM
//! itself supply?
//!
//! Classes provided by the runtime (rather than the project) must be
//! excluded from unused-dependency reasoning, so the resolver
//! enumerates the classfile entry names of every JVM-provided jar once
//! and caches the result.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::debug;
use zip::read::ZipArchive;

use crate::error::{AnalysisError, Result};

/// System property naming the endorsed-standards override directories.
pub const OVERRIDE_DIRS_PROP: &str = "java.endorsed.dirs";
/// System property naming the boot classpath entries.
///
/// Assumes HotSpot, or any JVM that exposes `sun.boot.class.path`.
pub const BOOT_CLASSPATH_PROP: &str = "sun.boot.class.path";
/// System property naming the extension directories.
pub const EXTENSION_DIRS_PROP: &str = "java.ext.dirs";

const CLASS_SUFFIX: &str = ".class";

/// A read-only view of a JVM's system properties.
///
/// Absent keys read as empty path lists, never as errors.
#[derive(Debug, Clone, Default)]
pub struct SystemProperties {
    values: rustc_hash::FxHashMap<String, String>,
}

impl SystemProperties {
    /// Build from key/value pairs as reported by the distribution.
    pub fn new(values: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Raw property value, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// A property interpreted as a platform path list. Absent or empty
    /// values yield an empty list.
    pub fn path_list(&self, key: &str) -> Vec<PathBuf> {
        match self.get(key) {
            Some(value) if !value.is_empty() => std::env::split_paths(value).collect(),
            _ => Vec::new(),
        }
    }
}

/// Computes, once, the set of classfile entry names supplied by the JVM
/// itself.
///
/// The cache is an optimization, not a correctness requirement:
/// recomputation would produce the identical set, so population is
/// idempotent and needs no coordination beyond the interior mutex.
#[derive(Debug)]
pub struct BootstrapClasspathResolver {
    properties: SystemProperties,
    classfiles: Mutex<Option<Arc<FxHashSet<String>>>>,
}

impl BootstrapClasspathResolver {
    /// Create a resolver over the given system properties.
    pub fn new(properties: SystemProperties) -> Self {
        Self {
            properties,
            classfiles: Mutex::new(None),
        }
    }

    /// The set of classfile entry names found inside the JVM-provided
    /// jars. Computed on first call and cached for the lifetime of the
    /// resolver.
    pub fn classfiles(&self) -> Result<Arc<FxHashSet<String>>> {
        if let Some(cached) = self.classfiles.lock().as_ref() {
            return Ok(Arc::clone(cached));
        }

        let mut classfiles: FxHashSet<String> = FxHashSet::default();
        for jar in self.bootstrap_jars()? {
            classfiles.extend(jar_classfiles(&jar)?);
        }
        debug!(
            count = classfiles.len(),
            "collected bootstrap classfile entries"
        );

        let classfiles = Arc::new(classfiles);
        *self.classfiles.lock() = Some(Arc::clone(&classfiles));
        Ok(classfiles)
    }

    /// The jars (and possibly loose boot-classpath directories) the JVM
    /// loads its own classes from, in classloading order: endorsed
    /// overrides, then the boot classpath, then extensions. Filtered to
    /// existing regular files.
    pub fn bootstrap_jars(&self) -> Result<Vec<PathBuf>> {
        // Per the specs, overrides and extensions must be jars; loose
        // class files there are invisible to the JVM. Boot classpath
        // entries may be loose directories and are passed through
        // unchanged, best-effort.
        let override_jars = jars_in_dirs(&self.properties.path_list(OVERRIDE_DIRS_PROP))?;
        let boot_entries = self.properties.path_list(BOOT_CLASSPATH_PROP);
        let extension_jars = jars_in_dirs(&self.properties.path_list(EXTENSION_DIRS_PROP))?;

        Ok(override_jars
            .into_iter()
            .chain(boot_entries)
            .chain(extension_jars)
            .filter(|p| p.is_file())
            .collect())
    }
}

/// The `.jar` files directly inside each existing directory, in
/// deterministic order.
fn jars_in_dirs(dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut jars = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            continue;
        }
        let entries = std::fs::read_dir(dir).map_err(|source| AnalysisError::Io {
            path: dir.clone(),
            source,
        })?;
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| AnalysisError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if crate::classpath::is_jar_path(&path) {
                found.push(path);
            }
        }
        found.sort();
        jars.extend(found);
    }
    Ok(jars)
}

/// The classfile entry names inside a jar. The archive handle is scoped
/// to this call and released on every exit path.
pub fn jar_classfiles(jar: &Path) -> Result<Vec<String>> {
    let file = File::open(jar).map_err(|source| AnalysisError::Io {
        path: jar.to_path_buf(),
        source,
    })?;
    let archive = ZipArchive::new(file).map_err(|source| AnalysisError::Archive {
        path: jar.to_path_buf(),
        source,
    })?;
    Ok(archive
        .file_names()
        .filter(|name| name.ends_with(CLASS_SUFFIX))
        .map(str::to_owned)
        .collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn write_jar(path: &Path, entries: &[&str]) {
        let file = File::create(path).expect("create jar");
        let mut writer = zip::ZipWriter::new(file);
        for entry in entries {
            writer
                .start_file(*entry, SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(b"\xca\xfe\xba\xbe").expect("write entry");
        }
        writer.finish().expect("finish jar");
    }

    #[test]
    fn collects_class_entries_from_all_bootstrap_locations_in_order() {
        let root = tempfile::tempdir().expect("tempdir");
        let endorsed = root.path().join("endorsed");
        let ext = root.path().join("ext");
        std::fs::create_dir_all(&endorsed).expect("mkdir");
        std::fs::create_dir_all(&ext).expect("mkdir");

        write_jar(
            &endorsed.join("override.jar"),
            &["javax/xml/Override.class", "META-INF/MANIFEST.MF"],
        );
        let rt_jar = root.path().join("rt.jar");
        write_jar(&rt_jar, &["java/lang/Object.class", "java/lang/String.class"]);
        write_jar(&ext.join("zipfs.jar"), &["jdk/nio/zipfs/ZipPath.class"]);

        let properties = SystemProperties::new([
            (
                OVERRIDE_DIRS_PROP.to_string(),
                endorsed.display().to_string(),
            ),
            (BOOT_CLASSPATH_PROP.to_string(), rt_jar.display().to_string()),
            (EXTENSION_DIRS_PROP.to_string(), ext.display().to_string()),
        ]);
        let resolver = BootstrapClasspathResolver::new(properties);

        let jars = resolver.bootstrap_jars().expect("jars");
        assert_eq!(
            jars,
            vec![endorsed.join("override.jar"), rt_jar.clone(), ext.join("zipfs.jar")]
        );

        let classfiles = resolver.classfiles().expect("classfiles");
        assert_eq!(classfiles.len(), 4);
        assert!(classfiles.contains("java/lang/Object.class"));
        assert!(classfiles.contains("javax/xml/Override.class"));
        assert!(classfiles.contains("jdk/nio/zipfs/ZipPath.class"));
        // Non-class entries are ignored.
        assert!(!classfiles.contains("META-INF/MANIFEST.MF"));

        // Second call serves the cache and agrees with the first.
        let again = resolver.classfiles().expect("classfiles");
        assert_eq!(*again, *classfiles);
    }

    #[test]
    fn absent_properties_mean_empty_path_lists() {
        let resolver = BootstrapClasspathResolver::new(SystemProperties::default());
        assert!(resolver.bootstrap_jars().expect("jars").is_empty());
        assert!(resolver.classfiles().expect("classfiles").is_empty());
    }

    #[test]
    fn corrupt_archive_aborts_with_an_archive_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let bogus = root.path().join("bogus.jar");
        std::fs::write(&bogus, b"not a zip archive").expect("write");

        let err = jar_classfiles(&bogus).unwrap_err();
        assert!(matches!(err, AnalysisError::Archive { path, .. } if path == bogus));
    }

    #[test]
    fn missing_boot_entries_are_filtered_out() {
        let properties = SystemProperties::new([(
            BOOT_CLASSPATH_PROP.to_string(),
            "/nonexistent/rt.jar".to_string(),
        )]);
        let resolver = BootstrapClasspathResolver::new(properties);
        assert!(resolver.bootstrap_jars().expect("jars").is_empty());
    }
}
