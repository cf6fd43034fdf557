use serde::Serialize;
use std::collections::HashMap;

use crate::source::Position;

/// One extracted declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationRecord {
    pub identifier: String,
    pub start: Position,
    pub end: Position,
    /// Signature text with the body replaced by [`DeclarationRecord::placeholder`].
    pub skeleton: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Byte offset of the placeholder in `skeleton`.
    #[serde(skip)]
    pub body_offset: Option<usize>,
    /// Byte offset of the placeholder in the whole-file skeleton.
    #[serde(skip)]
    pub base_offset: Option<usize>,
}

pub fn placeholder_for(identifier: &str) -> String {
    format!("<BODY {identifier}>")
}

impl DeclarationRecord {
    pub fn placeholder(&self) -> String {
        placeholder_for(&self.identifier)
    }

    /// 0-indexed row the declaration starts on.
    pub fn start_line(&self) -> usize {
        self.start.row
    }

    /// Full declaration text: skeleton with the body put back.
    ///
    /// The body is spliced in at the recorded offset, so placeholder-like
    /// text elsewhere in the signature is left alone.
    pub fn source(&self) -> String {
        let (Some(body), Some(at)) = (&self.body, self.body_offset) else {
            return self.skeleton.clone();
        };
        let tag = self.placeholder();
        match placeholder_span(&self.skeleton, at, &tag) {
            Some(end) => format!("{}{}{}", &self.skeleton[..at], body, &self.skeleton[end..]),
            None => self.skeleton.clone(),
        }
    }
}

/// End of `tag` when it sits at `at` in `text`.
fn placeholder_span(text: &str, at: usize, tag: &str) -> Option<usize> {
    let end = at.checked_add(tag.len())?;
    (text.get(at..end)? == tag).then_some(end)
}

/// Declarations of one file, in source order.
///
/// Keyed access follows overwrite semantics: a later declaration with the
/// same identifier shadows the earlier one. Every record is still kept so the
/// whole-file skeleton can be reassembled without losing a body.
#[derive(Debug, Clone, Default)]
pub struct DeclarationStore {
    records: Vec<DeclarationRecord>,
    latest: HashMap<String, usize>,
}

impl DeclarationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record; returns the record it shadows, if any.
    pub fn insert(&mut self, record: DeclarationRecord) -> Option<DeclarationRecord> {
        let idx = self.records.len();
        let previous = self.latest.insert(record.identifier.clone(), idx);
        if previous.is_some() {
            crate::debug_log!(
                "[store] identifier collision: {} at {} shadows an earlier declaration",
                record.identifier,
                record.start
            );
        }
        self.records.push(record);
        previous.and_then(|i| self.records.get(i)).cloned()
    }

    pub fn get(&self, identifier: &str) -> Option<&DeclarationRecord> {
        self.latest.get(identifier).and_then(|&i| self.records.get(i))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.latest.contains_key(identifier)
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Latest record per identifier, in source order.
    pub fn iter(&self) -> impl Iterator<Item = &DeclarationRecord> {
        self.records
            .iter()
            .enumerate()
            .filter(|(i, r)| self.latest.get(&r.identifier) == Some(i))
            .map(|(_, r)| r)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|r| r.identifier.as_str())
    }

    /// Every record, shadowed ones included, in source order.
    pub fn records(&self) -> &[DeclarationRecord] {
        &self.records
    }

    /// Substitute each placeholder in `skeleton` with its body.
    ///
    /// Bodies go back at the offsets recorded during extraction, in source
    /// order, so duplicated identifiers still get their own bodies and
    /// placeholder-like text in the source is never mistaken for one.
    pub fn reassemble(&self, skeleton: &str) -> String {
        let mut out = String::with_capacity(skeleton.len());
        let mut copied = 0;
        for record in &self.records {
            let (Some(body), Some(at)) = (&record.body, record.base_offset) else {
                continue;
            };
            if at < copied {
                continue;
            }
            let Some(end) = placeholder_span(skeleton, at, &record.placeholder()) else {
                continue;
            };
            out.push_str(&skeleton[copied..at]);
            out.push_str(body);
            copied = end;
        }
        out.push_str(&skeleton[copied..]);
        out
    }
}
