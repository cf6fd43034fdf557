use anyhow::{Context, Result};
use ignore::overrides::{Override, OverrideBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::profile::profile_for_path;

fn default_overrides(root: &Path, exclude_dir_names: &[String]) -> Result<Override> {
    let mut ob = OverrideBuilder::new(root);

    // Note: For directories, include patterns for both the directory entry and its descendants,
    // otherwise walkers may still descend into the directory.
    for d in [
        ".git",
        "node_modules",
        "target",
        "dist",
        "build",
        "coverage",
        ".next",
        "__pycache__",
        ".venv",
        "venv",
        "obj",
        ".chunkreview",
    ] {
        ob.add(&format!("!**/{d}"))?;
        ob.add(&format!("!**/{d}/**"))?;
    }

    // Project-specific excluded dirs
    for d in exclude_dir_names {
        let d = d.trim().trim_matches('/');
        if d.is_empty() {
            continue;
        }
        ob.add(&format!("!**/{d}"))?;
        ob.add(&format!("!**/{d}/**"))?;
    }

    Ok(ob.build()?)
}

#[derive(Debug, Clone)]
pub struct FileEntry {
    pub abs_path: PathBuf,
    /// Relative to the scan root; a single-file target keeps just its name.
    pub rel_path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub max_file_bytes: u64,
    pub exclude_dir_names: Vec<String>,
}

/// Collect chunkable source files under `opts.root`, sorted by relative path.
///
/// Only files whose extension has a language profile are returned; empty and
/// oversized files are skipped.
pub fn scan_workspace(opts: &ScanOptions) -> Result<Vec<FileEntry>> {
    let meta = std::fs::metadata(&opts.root)
        .with_context(|| format!("Target does not exist: {}", opts.root.display()))?;

    if meta.is_file() {
        return scan_single_file(&opts.root, opts.max_file_bytes);
    }

    let mut entries = Vec::new();
    let overrides = default_overrides(&opts.root, &opts.exclude_dir_names)?;
    let walker = WalkBuilder::new(&opts.root)
        .standard_filters(true) // .gitignore, .ignore, hidden, etc.
        .overrides(overrides)
        .build();

    for item in walker {
        let dent = match item {
            Ok(d) => d,
            Err(e) => {
                eprintln!("[scan] WARN: {e}");
                continue;
            }
        };

        if !dent.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let abs_path = dent.into_path();
        if profile_for_path(&abs_path).is_none() {
            continue;
        }

        let bytes = match std::fs::metadata(&abs_path).map(|m| m.len()) {
            Ok(b) => b,
            Err(_) => continue,
        };

        if bytes == 0 || bytes > opts.max_file_bytes {
            crate::debug_log!("[scan] skipping {} ({} bytes)", abs_path.display(), bytes);
            continue;
        }

        let rel_path = abs_path
            .strip_prefix(&opts.root)
            .with_context(|| {
                format!("{} is not under {}", abs_path.display(), opts.root.display())
            })?
            .to_path_buf();

        entries.push(FileEntry {
            abs_path,
            rel_path,
            bytes,
        });
    }

    entries.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(entries)
}

fn scan_single_file(abs_path: &Path, max_file_bytes: u64) -> Result<Vec<FileEntry>> {
    if profile_for_path(abs_path).is_none() {
        return Ok(vec![]);
    }

    let bytes = std::fs::metadata(abs_path)?.len();
    if bytes == 0 || bytes > max_file_bytes {
        return Ok(vec![]);
    }

    let rel_path = abs_path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| abs_path.to_path_buf());
    Ok(vec![FileEntry {
        abs_path: abs_path.to_path_buf(),
        rel_path,
        bytes,
    }])
}
