use crate::cursor::Cursor;
use crate::profile::LanguageProfile;
use crate::store::{placeholder_for, DeclarationRecord};
use crate::syntax::SyntaxNode;

/// Node types containing this substring name the declaration.
pub const IDENTIFIER_MARKER: &str = "identifier";

/// Identifier used when a declaration has no identifier-marked node.
pub const ANONYMOUS: &str = "anonymous";

/// Traversal state threaded through one declaration's subtree.
struct Extraction<'a> {
    identifier: Option<String>,
    decl: Cursor<'a>,
    body: Option<Cursor<'a>>,
    /// Placeholder offsets in the declaration and file skeletons.
    offsets: Option<(usize, usize)>,
}

impl Extraction<'_> {
    fn identifier(&self) -> &str {
        self.identifier.as_deref().unwrap_or(ANONYMOUS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// First identifier-marked node: capture the name.
    Identifier,
    /// First body block: split it out behind a placeholder.
    Body,
    Literal,
    Recurse,
}

fn classify_inner<N: SyntaxNode>(profile: &LanguageProfile, node: &N, state: &Extraction) -> Step {
    if state.identifier.is_none() && node.type_tag().contains(IDENTIFIER_MARKER) {
        Step::Identifier
    } else if state.body.is_none() && profile.is_body_block(node) {
        Step::Body
    } else if node.child_nodes().is_empty() {
        Step::Literal
    } else {
        Step::Recurse
    }
}

/// Split a declaration node into identifier, signature skeleton and body.
///
/// `base` is the file-level skeleton cursor. It ends up at the node's end
/// with the body replaced by a placeholder, exactly like the returned
/// record's skeleton.
pub fn extract_declaration<'a, N: SyntaxNode>(
    profile: &LanguageProfile,
    node: &N,
    base: &mut Cursor<'a>,
) -> DeclarationRecord {
    base.consume(node.start_pos());
    let state = Extraction {
        identifier: None,
        decl: base.fork(),
        body: None,
        offsets: None,
    };

    let mut state = visit(profile, node, base, state);
    base.consume(node.end_pos());
    state.decl.consume(node.end_pos());

    DeclarationRecord {
        identifier: state.identifier.unwrap_or_else(|| ANONYMOUS.to_string()),
        start: node.start_pos(),
        end: node.end_pos(),
        skeleton: state.decl.into_text(),
        body: state.body.map(Cursor::into_text),
        body_offset: state.offsets.map(|(decl, _)| decl),
        base_offset: state.offsets.map(|(_, base)| base),
    }
}

fn visit<'a, N: SyntaxNode>(
    profile: &LanguageProfile,
    node: &N,
    base: &mut Cursor<'a>,
    mut state: Extraction<'a>,
) -> Extraction<'a> {
    let (start, end) = (node.start_pos(), node.end_pos());
    base.consume(start);
    state.decl.consume(start);

    match classify_inner(profile, node, &state) {
        Step::Identifier => {
            let mut name = base.fork();
            name.consume(end);
            base.consume(end);
            state.decl.consume(end);
            state.identifier = Some(name.into_text());
        }
        Step::Body => {
            let mut body = state.decl.fork();
            let tag = placeholder_for(state.identifier());
            let decl_at = state.decl.tag(&tag);
            let base_at = base.tag(&tag);
            state.offsets = Some((decl_at, base_at));
            state.decl.skip(end);
            base.skip(end);
            body.consume(end);
            state.body = Some(body);
        }
        Step::Literal => {
            base.consume(end);
            state.decl.consume(end);
        }
        Step::Recurse => {
            for child in node.child_nodes() {
                state = visit(profile, &child, base, state);
            }
        }
    }

    state
}
