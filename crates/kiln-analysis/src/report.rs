//! Human-readable rendering of unused-dependency findings.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use kiln_graph::TargetId;

/// One unused declared dependency and its suggested replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedDepEntry {
    /// The dependency that was declared but never compiled against.
    pub declared: TargetId,
    /// Suggested replacement targets, possibly empty.
    pub replacements: Vec<TargetId>,
}

/// The unused-dependency findings for one compiled target, ordered
/// deterministically for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedDepReport {
    /// The target whose declared dependencies were analyzed.
    pub target: TargetId,
    /// One entry per confirmed-unused declared dependency.
    pub entries: Vec<UnusedDepEntry>,
}

impl UnusedDepReport {
    /// Build a report from detector output, sorting entries and
    /// replacement lists so equal findings render identically.
    pub fn from_unused_deps(
        target: TargetId,
        unused: &FxHashMap<TargetId, FxHashSet<TargetId>>,
    ) -> Self {
        let mut entries: Vec<UnusedDepEntry> = unused
            .iter()
            .map(|(declared, replacements)| {
                let mut replacements: Vec<TargetId> = replacements.iter().cloned().collect();
                replacements.sort();
                UnusedDepEntry {
                    declared: declared.clone(),
                    replacements,
                }
            })
            .collect();
        entries.sort_by(|a, b| a.declared.cmp(&b.declared));
        Self { target, entries }
    }

    /// True if every declared dependency was used.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for UnusedDepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(
                f,
                "{} declares {} but it is unused",
                self.target, entry.declared
            )?;
            if !entry.replacements.is_empty() {
                let suggestions: Vec<&str> =
                    entry.replacements.iter().map(TargetId::as_str).collect();
                writeln!(f, "  consider: {}", suggestions.join(", "))?;
            }
        }
        Ok(())
    }
}
