//! Dependency ordering for interdependent definitions.
//!
//! Text values may reference other fields with `${name}` placeholders.
//! [`sort_definitions`] reorders a registry so every definition comes after
//! the fields it references, using repeated first-fit passes over the
//! remaining entries in their original order. Ties therefore keep the
//! author's ordering, and fields with no references never move relative to
//! each other.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Diagnostic, Error};
use crate::funcs;
use crate::registry::Registry;
use crate::value::Value;

/// Unescaped `${name}` occurrences. A leading backslash marks the
/// placeholder as literal text and is captured so it can be skipped.
static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\\)?\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap()
});

/// Names referenced by `text`, in first-appearance order, without
/// duplicates. Escaped placeholders (`\${name}`) do not count.
pub fn references(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in REFERENCE.captures_iter(text) {
        if caps.get(1).is_some() {
            continue;
        }
        let name = &caps[2];
        if !seen.iter().any(|s| s == name) {
            seen.push(name.to_owned());
        }
    }
    seen
}

/// True when `text` contains at least one unescaped placeholder.
pub fn has_references(text: &str) -> bool {
    REFERENCE
        .captures_iter(text)
        .any(|caps| caps.get(1).is_none())
}

/// Names a field's value depends on.
fn dependencies(value: &Value) -> Vec<String> {
    match value {
        Value::Text(s) => references(s),
        Value::Seq(items) => {
            let mut all = Vec::new();
            for item in items {
                if let Value::Text(s) = item {
                    for r in references(s) {
                        if !all.iter().any(|a| a == &r) {
                            all.push(r);
                        }
                    }
                }
            }
            all
        }
        _ => Vec::new(),
    }
}

/// How to react when definitions cannot be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Fail with [`Error::UnresolvableDependencies`].
    Strict,
    /// Keep going: accept the first stuck definition as-is and report it.
    Lenient,
}

/// Reorder `reg` so definitions follow their dependencies.
///
/// Returns the sorted registry plus any diagnostics from lenient
/// force-placements. References to names that are neither fields nor
/// allow-listed constants leave a definition unplaceable.
pub fn sort_definitions(
    reg: &Registry,
    mode: ResolveMode,
) -> Result<(Registry, Vec<Diagnostic>), Error> {
    let mut pending: Vec<(String, Vec<String>)> = reg
        .iter()
        .map(|(k, v)| (k.to_owned(), dependencies(v)))
        .collect();
    let total = pending.len();

    let mut out = reg.empty_like();
    let mut diags = Vec::new();
    let mut forced = 0usize;

    while !pending.is_empty() {
        let satisfied = |dep: &String| {
            out.contains(dep) || (!reg.contains(dep) && funcs::constant(dep).is_some())
        };
        let next = pending
            .iter()
            .position(|(_, deps)| deps.iter().all(satisfied));
        match next {
            Some(i) => {
                let (name, _) = pending.remove(i);
                if let Some(v) = reg.get_opt(&name) {
                    out.set(name, v.clone());
                }
            }
            None => {
                if mode == ResolveMode::Strict {
                    return Err(Error::UnresolvableDependencies(pending.len()));
                }
                // Force-place the first stuck definition and report what
                // was missing for it.
                let (name, deps) = pending.remove(0);
                for dep in &deps {
                    if !out.contains(dep) && funcs::constant(dep).is_none() {
                        diags.push(Diagnostic::new(
                            name.clone(),
                            format!("reference to \"{dep}\" is unresolved"),
                        ));
                    }
                }
                forced += 1;
                if let Some(v) = reg.get_opt(&name) {
                    out.set(name, v.clone());
                }
            }
        }
    }

    if forced > 0 {
        diags.push(Diagnostic::new(
            "",
            format!("{forced}/{total} definitions unresolved"),
        ));
    }
    Ok((out, diags))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
