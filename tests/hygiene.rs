//! Hygiene: source-level rules checked at test time.
//!
//! Scans the production sources under `src/` (sibling `_test.rs` files are
//! excluded) and fails when a pattern exceeds its budget. Budgets only go
//! down. A second pass checks that every `_test.rs` file is actually wired
//! into its module.

use std::fs;
use std::path::{Path, PathBuf};

struct SourceFile {
    path: PathBuf,
    content: String,
}

struct Budget {
    pattern: &'static str,
    max: usize,
    why: &'static str,
    /// Restrict the rule to library files (skip `main.rs`).
    library_only: bool,
}

const BUDGETS: &[Budget] = &[
    Budget { pattern: ".unwrap()", max: 0, why: "panics on None/Err", library_only: false },
    Budget { pattern: ".expect(", max: 0, why: "panics on None/Err", library_only: false },
    Budget { pattern: "panic!(", max: 0, why: "crashes the host", library_only: false },
    Budget { pattern: "unreachable!(", max: 0, why: "crashes the host", library_only: false },
    Budget { pattern: "todo!(", max: 0, why: "unfinished stub", library_only: false },
    Budget { pattern: "unimplemented!(", max: 0, why: "unfinished stub", library_only: false },
    Budget { pattern: "let _ =", max: 0, why: "discards a value unseen", library_only: false },
    Budget { pattern: ".ok()", max: 0, why: "swallows an error", library_only: false },
    Budget { pattern: "#[allow(dead_code)]", max: 0, why: "hides unused code", library_only: false },
    Budget { pattern: "println!(", max: 0, why: "library output goes through tracing", library_only: true },
    Budget { pattern: "eprintln!(", max: 0, why: "library output goes through tracing", library_only: true },
];

fn is_test_file(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n.to_string_lossy().ends_with("_test.rs"))
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            out.push(path);
        }
    }
}

fn all_files() -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(Path::new("src"), &mut files);
    files.sort();
    files
}

fn production_files() -> Vec<SourceFile> {
    all_files()
        .into_iter()
        .filter(|p| !is_test_file(p))
        .filter_map(|path| fs::read_to_string(&path).map(|content| SourceFile { path, content }).ok())
        .collect()
}

fn hits(files: &[SourceFile], budget: &Budget) -> Vec<(String, usize)> {
    files
        .iter()
        .filter(|f| !(budget.library_only && f.path.ends_with("main.rs")))
        .map(|f| (f.path.display().to_string(), f.content.lines().filter(|l| l.contains(budget.pattern)).count()))
        .filter(|(_, n)| *n > 0)
        .collect()
}

#[test]
fn sources_are_found() {
    assert!(!production_files().is_empty(), "no sources under src/; run from the crate root");
}

#[test]
fn pattern_budgets() {
    let files = production_files();
    let mut failures = Vec::new();
    for budget in BUDGETS {
        let found = hits(&files, budget);
        let total: usize = found.iter().map(|(_, n)| n).sum();
        if total > budget.max {
            let listing: Vec<String> = found.iter().map(|(p, n)| format!("    {p}: {n}")).collect();
            failures.push(format!(
                "`{}` ({}): found {total}, max {}\n{}",
                budget.pattern,
                budget.why,
                budget.max,
                listing.join("\n")
            ));
        }
    }
    assert!(failures.is_empty(), "hygiene budgets exceeded:\n{}", failures.join("\n"));
}

#[test]
fn every_test_file_is_wired_into_its_module() {
    let mut orphans = Vec::new();
    for test_path in all_files().into_iter().filter(|p| is_test_file(p)) {
        let name = test_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let module = test_path.with_file_name(name.replace("_test.rs", ".rs"));
        let wired = fs::read_to_string(&module).is_ok_and(|src| src.contains(&format!("#[path = \"{name}\"]")));
        if !wired {
            orphans.push(test_path.display().to_string());
        }
    }
    assert!(orphans.is_empty(), "test files not attached to a module:\n  {}", orphans.join("\n  "));
}
