use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::walker::ChunkedFile;

/// Default file stem of the whole-file skeleton chunk.
pub const BASE_CHUNK_NAME: &str = "__base__";

/// On-disk form of one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFile {
    pub start_line: usize,
    pub code: String,
}

/// Write `chunked` as JSON chunks under `out_dir/<rel_path>/`.
///
/// One `<identifier>.json` per declaration holding the full declaration
/// text, plus `<base_name>.json` holding the skeleton. A later declaration
/// with a duplicate identifier overwrites the earlier file. A declaration
/// named `base_name` is written as `<base_name>.decl.json`. Returns the
/// written paths.
pub fn write_chunks(
    chunked: &ChunkedFile,
    out_dir: &Path,
    rel_path: &Path,
    base_name: &str,
) -> Result<Vec<PathBuf>> {
    let dir = out_dir.join(rel_path);
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::with_capacity(chunked.declarations.records().len() + 1);

    let base_path = dir.join(format!("{base_name}.json"));
    write_chunk(
        &base_path,
        &ChunkFile {
            start_line: 0,
            code: chunked.skeleton.clone(),
        },
    )?;
    written.push(base_path);

    for record in chunked.declarations.records() {
        let path = dir.join(format!("{}.json", file_stem_for(&record.identifier, base_name)));
        write_chunk(
            &path,
            &ChunkFile {
                start_line: record.start_line(),
                code: record.source(),
            },
        )?;
        written.push(path);
    }

    Ok(written)
}

pub fn write_chunk(path: &Path, chunk: &ChunkFile) -> Result<()> {
    let json = serde_json::to_string(chunk)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn read_chunk(path: &Path) -> Result<ChunkFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid chunk file {}", path.display()))
}

/// Identifiers are used as file names; path separators would escape the
/// chunk directory. `base_name` is reserved for the skeleton chunk, and no
/// supported language allows `.` in an identifier.
fn file_stem_for(identifier: &str, base_name: &str) -> String {
    let stem: String = identifier
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '\0') { '_' } else { c })
        .collect();
    if stem == base_name {
        format!("{stem}.decl")
    } else {
        stem
    }
}
