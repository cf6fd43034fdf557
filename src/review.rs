//! Consumer side of chunking: turning declarations into review requests and
//! putting the returned comments back into the source file.

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::batch::{run_batch, BatchReport};
use crate::profile::{path_ext_lower, profile_for_extension};
use crate::scanner::FileEntry;
use crate::store::DeclarationRecord;
use crate::walker::{chunk_source, read_source};

/// Review comments keyed by 1-based line number.
pub type LineComments = BTreeMap<usize, String>;

/// Prefix every line of `code` with its 1-based line number in the file.
///
/// `start_line` is the 0-indexed row the code starts on.
pub fn number_lines(code: &str, start_line: usize) -> String {
    code.split('\n')
        .enumerate()
        .map(|(i, line)| format!("{} {}", start_line + i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn leading_line_number(key: &str) -> usize {
    let digits: String = key.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 1;
    }
    // Too many digits for usize still means "past the end".
    digits.parse().unwrap_or(usize::MAX)
}

/// Parse a model reply holding a JSON object of `line -> comment`.
///
/// Anything before the first `{` or after the last `}` is ignored. Keys are
/// cut down to their leading digits ("12-14" targets line 12); keys without
/// digits target line 1.
pub fn parse_review_response(raw: &str) -> Result<LineComments> {
    let (Some(open), Some(close)) = (raw.find('{'), raw.rfind('}')) else {
        return Err(anyhow!("response contains no JSON object"));
    };
    if close < open {
        return Err(anyhow!("response contains no JSON object"));
    }

    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&raw[open..=close]).context("response is not a JSON object")?;

    let mut comments = LineComments::new();
    for (key, value) in object {
        let text = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        append_comment(&mut comments, leading_line_number(&key), &text);
    }
    Ok(comments)
}

fn append_comment(comments: &mut LineComments, line: usize, text: &str) {
    comments
        .entry(line)
        .and_modify(|existing| {
            existing.push(' ');
            existing.push_str(text);
        })
        .or_insert_with(|| text.to_string());
}

/// Merge several responses; comments on the same line are concatenated.
pub fn merge_reviews<I>(responses: I) -> LineComments
where
    I: IntoIterator<Item = LineComments>,
{
    let mut merged = LineComments::new();
    for response in responses {
        for (line, text) in response {
            append_comment(&mut merged, line, &text);
        }
    }
    merged
}

/// Insert each comment as `<sign> <REVIEW>...</REVIEW>` on a new line directly
/// above its target line.
///
/// Line numbers are 1-based; numbers past the end target the last line.
/// Newlines inside a comment are flattened so it stays on one line.
pub fn annotate_source(source: &str, comments: &LineComments, comment_sign: &str) -> String {
    let mut lines: Vec<&str> = source.split_inclusive('\n').collect();
    if lines.is_empty() {
        lines.push("");
    }
    let last = lines.len() - 1;

    let mut above: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (&line, text) in comments {
        let idx = line.saturating_sub(1).min(last);
        above.entry(idx).or_default().push(text.as_str());
    }

    let extra: usize = comments.values().map(|c| c.len() + 24).sum();
    let mut out = String::with_capacity(source.len() + extra);
    for (idx, line) in lines.iter().enumerate() {
        if let Some(texts) = above.get(&idx) {
            let newline = if line.ends_with("\r\n") { "\r\n" } else { "\n" };
            for text in texts {
                let flat = text.replace("\r\n", " ").replace('\n', " ");
                out.push_str(&format!("{comment_sign} <REVIEW>{flat}</REVIEW>{newline}"));
            }
        }
        out.push_str(line);
    }
    out
}

/// A review comment found in an annotated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewTag {
    /// 1-based line of the comment itself in the annotated text.
    pub line: usize,
    pub comment: String,
    /// The line the comment sits above, trimmed.
    pub code: String,
}

fn review_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[ \t]*(?:#|//)[ \t]*<REVIEW>(.*)</REVIEW>[ \t]*$").unwrap())
}

/// Recover the review comments from text produced by [`annotate_source`].
///
/// Stacked comments all belong to the first non-comment line below them.
pub fn collect_review_tags(text: &str) -> Vec<ReviewTag> {
    let mut tags = Vec::new();
    let mut pending: Vec<(usize, String)> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if let Some(comment) = review_tag_regex().captures(line).and_then(|caps| caps.get(1)) {
            pending.push((idx + 1, comment.as_str().trim().to_string()));
            continue;
        }
        let code = line.trim();
        tags.extend(pending.drain(..).map(|(line, comment)| ReviewTag {
            line,
            comment,
            code: code.to_string(),
        }));
    }
    tags.extend(pending.into_iter().map(|(line, comment)| ReviewTag {
        line,
        comment,
        code: String::new(),
    }));
    tags
}

/// One declaration handed to a [`Reviewer`].
#[derive(Debug, Clone)]
pub struct ReviewRequest<'a> {
    /// Language name of the file (`python`, `typescript`, ...).
    pub language: &'a str,
    pub record: &'a DeclarationRecord,
    /// Declaration source with absolute line numbers.
    pub numbered_code: String,
}

/// The completion service: takes one declaration, returns the raw reply.
pub trait Reviewer: Sync {
    fn review(&self, request: &ReviewRequest<'_>) -> Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct FileReview {
    pub comments: LineComments,
    /// Source with the comments inserted.
    pub annotated: String,
    /// Identifiers whose reply could not be used.
    pub skipped: Vec<String>,
}

/// Review one file declaration by declaration.
///
/// A failed request or unparseable reply only drops that declaration's
/// comments. Files without a language profile come back unchanged.
pub fn review_source(
    source_text: &str,
    extension: &str,
    reviewer: &dyn Reviewer,
) -> Result<FileReview> {
    let Some(profile) = profile_for_extension(extension) else {
        return Ok(FileReview {
            annotated: source_text.to_string(),
            ..FileReview::default()
        });
    };

    let chunked = chunk_source(source_text, extension)?;
    let mut responses = Vec::new();
    let mut skipped = Vec::new();

    for record in chunked.declarations.records() {
        let request = ReviewRequest {
            language: profile.name,
            record,
            numbered_code: number_lines(&record.source(), record.start_line()),
        };
        match reviewer.review(&request).and_then(|raw| parse_review_response(&raw)) {
            Ok(comments) => responses.push(comments),
            Err(e) => {
                eprintln!("[review] WARN: skipping {}: {e:#}", record.identifier);
                skipped.push(record.identifier.clone());
            }
        }
    }

    let comments = merge_reviews(responses);
    let annotated = annotate_source(source_text, &comments, profile.comment_sign);
    Ok(FileReview {
        comments,
        annotated,
        skipped,
    })
}

pub fn review_file(path: &Path, reviewer: &dyn Reviewer) -> Result<FileReview> {
    let source_text = read_source(path)?;
    review_source(&source_text, &path_ext_lower(path), reviewer)
}

/// Review every entry in parallel and write each annotated file to
/// `out_dir/<rel_path>`.
///
/// A file that fails to read, review or write is reported in its own
/// outcome; the rest still get written.
pub fn review_files(
    entries: &[FileEntry],
    out_dir: &Path,
    workers: usize,
    reviewer: &dyn Reviewer,
) -> Result<BatchReport<FileReview>> {
    run_batch(entries, workers, |entry| {
        let review = review_file(&entry.abs_path, reviewer)?;
        let target = out_dir.join(&entry.rel_path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&target, &review.annotated)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        Ok(review)
    })
}
