use anyhow::{Context, Result};
use std::path::Path;

use crate::cursor::Cursor;
use crate::extractor::extract_declaration;
use crate::profile::{path_ext_lower, profile_for_extension, LanguageProfile, Visit};
use crate::source::SourceBuffer;
use crate::store::DeclarationStore;
use crate::syntax::{parse_source, SyntaxNode};

/// Result of chunking one file.
#[derive(Debug, Clone, Default)]
pub struct ChunkedFile {
    /// Extension the file was chunked as (lowercase, no dot).
    pub extension: String,
    /// Whole file with every declaration body replaced by a placeholder.
    pub skeleton: String,
    pub declarations: DeclarationStore,
}

impl ChunkedFile {
    /// Put every body back into the skeleton.
    pub fn reassemble(&self) -> String {
        self.declarations.reassemble(&self.skeleton)
    }

    /// True when the extension had no language profile.
    pub fn is_unsupported(&self) -> bool {
        profile_for_extension(&self.extension).is_none()
    }
}

/// Walk `root` over `buffer`, splitting declarations out of the skeleton.
///
/// Text outside the root node's span (leading or trailing) is kept in the
/// skeleton too, so the skeleton plus bodies always cover the whole buffer.
pub fn chunk_tree<N: SyntaxNode>(
    buffer: &SourceBuffer,
    profile: &LanguageProfile,
    root: &N,
) -> (String, DeclarationStore) {
    let mut base = Cursor::new(buffer);
    let mut declarations = DeclarationStore::new();

    walk(profile, root, &mut base, &mut declarations);
    base.consume(buffer.end());

    (base.into_text(), declarations)
}

fn walk<N: SyntaxNode>(
    profile: &LanguageProfile,
    node: &N,
    base: &mut Cursor<'_>,
    declarations: &mut DeclarationStore,
) {
    base.consume(node.start_pos());

    match profile.classify(node) {
        Visit::Extract => {
            let record = extract_declaration(profile, node, base);
            declarations.insert(record);
        }
        Visit::Literal => base.consume(node.end_pos()),
        Visit::Recurse => {
            for child in node.child_nodes() {
                walk(profile, &child, base, declarations);
            }
        }
    }
}

/// Chunk source text as the language registered for `extension`.
///
/// An extension without a profile yields an empty skeleton and no
/// declarations; that is not an error.
pub fn chunk_source(source_text: &str, extension: &str) -> Result<ChunkedFile> {
    let extension = extension.trim_start_matches('.').to_lowercase();
    let Some(profile) = profile_for_extension(&extension) else {
        crate::debug_log!("[chunk] no language profile for .{extension}, skipping");
        return Ok(ChunkedFile {
            extension,
            ..ChunkedFile::default()
        });
    };

    let tree = parse_source(source_text, profile)?;
    let buffer = SourceBuffer::new(source_text);
    let (skeleton, declarations) = chunk_tree(&buffer, profile, &tree.root_node());

    crate::debug_log!(
        "[chunk] {} declarations, skeleton {} of {} bytes",
        declarations.records().len(),
        skeleton.len(),
        source_text.len()
    );

    Ok(ChunkedFile {
        extension,
        skeleton,
        declarations,
    })
}

pub fn chunk_file(path: &Path) -> Result<ChunkedFile> {
    let extension = path_ext_lower(path);
    if profile_for_extension(&extension).is_none() {
        return Ok(ChunkedFile {
            extension,
            ..ChunkedFile::default()
        });
    }

    let source_text = read_source(path)?;
    chunk_source(&source_text, &extension)
        .with_context(|| format!("Failed to chunk {}", path.display()))
}

/// Read a source file, replacing invalid UTF-8 sequences.
pub fn read_source(path: &Path) -> Result<String> {
    let raw = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}
