use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use tree_sitter::Language;

use crate::syntax::SyntaxNode;

/// A binding whose initializer is an anonymous function, e.g.
/// `const handler = () => { ... }`, counts as a declaration of its own.
#[derive(Debug, Clone, Copy)]
pub struct AnonymousBinding {
    /// Node types of the binding itself (`variable_declarator`, ...).
    pub bindings: &'static [&'static str],
    /// Node types of anonymous function initializers.
    pub initializers: &'static [&'static str],
}

impl AnonymousBinding {
    pub fn matches<N: SyntaxNode>(&self, node: &N) -> bool {
        self.bindings.contains(&node.type_tag())
            && node
                .child_nodes()
                .iter()
                .any(|child| self.initializers.contains(&child.type_tag()))
    }
}

/// Per-language node classification used while chunking.
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    pub name: &'static str,
    /// Lowercase, without dot.
    pub extensions: &'static [&'static str],
    pub declarations: &'static [&'static str],
    pub body_blocks: &'static [&'static str],
    /// Not used for chunking yet.
    pub imports: &'static [&'static str],
    /// Not used for chunking yet.
    pub exports: &'static [&'static str],
    pub anonymous_binding: Option<AnonymousBinding>,
    /// Line comment prefix used for inserted review comments.
    pub comment_sign: &'static str,
    grammar: fn() -> Language,
}

/// What the tree walker does with a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Hand the whole node to the declaration extractor.
    Extract,
    /// Leaf: copy its text verbatim.
    Literal,
    /// Walk the children.
    Recurse,
}

impl LanguageProfile {
    pub fn grammar(&self) -> Language {
        (self.grammar)()
    }

    pub fn is_declaration<N: SyntaxNode>(&self, node: &N) -> bool {
        self.declarations.contains(&node.type_tag())
            || self.anonymous_binding.is_some_and(|rule| rule.matches(node))
    }

    pub fn is_body_block<N: SyntaxNode>(&self, node: &N) -> bool {
        self.body_blocks.contains(&node.type_tag())
    }

    pub fn is_import<N: SyntaxNode>(&self, node: &N) -> bool {
        self.imports.contains(&node.type_tag())
    }

    pub fn is_export<N: SyntaxNode>(&self, node: &N) -> bool {
        self.exports.contains(&node.type_tag())
    }

    pub fn classify<N: SyntaxNode>(&self, node: &N) -> Visit {
        if self.is_declaration(node) {
            Visit::Extract
        } else if node.child_nodes().is_empty() {
            Visit::Literal
        } else {
            Visit::Recurse
        }
    }
}

fn python_grammar() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

fn typescript_grammar() -> Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

fn tsx_grammar() -> Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

#[cfg(feature = "lang-csharp")]
fn csharp_grammar() -> Language {
    tree_sitter_c_sharp::LANGUAGE.into()
}

#[cfg(feature = "lang-rust")]
fn rust_grammar() -> Language {
    tree_sitter_rust::LANGUAGE.into()
}

const TS_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "function_declaration",
    "interface_declaration",
    "type_alias_declaration",
];
const TS_BODY_BLOCKS: &[&str] = &["statement_block", "interface_body", "class_body"];
const TS_IMPORTS: &[&str] = &["import_statement", "import_as_statement", "import_from_statement"];
const TS_EXPORTS: &[&str] = &["export_statement"];
const TS_ANONYMOUS_BINDING: AnonymousBinding = AnonymousBinding {
    bindings: &["variable_declarator"],
    initializers: &["arrow_function", "function_expression"],
};

fn builtin_profiles() -> Vec<LanguageProfile> {
    let mut profiles = vec![
        LanguageProfile {
            name: "python",
            extensions: &["py"],
            declarations: &["class_definition", "function_definition"],
            body_blocks: &["block"],
            imports: &["import_statement", "import_as_statement", "import_from_statement"],
            exports: &["export_statement"],
            anonymous_binding: None,
            comment_sign: "#",
            grammar: python_grammar,
        },
        LanguageProfile {
            name: "typescript",
            extensions: &["ts", "mts", "cts"],
            declarations: TS_DECLARATIONS,
            body_blocks: TS_BODY_BLOCKS,
            imports: TS_IMPORTS,
            exports: TS_EXPORTS,
            anonymous_binding: Some(TS_ANONYMOUS_BINDING),
            comment_sign: "//",
            grammar: typescript_grammar,
        },
        LanguageProfile {
            name: "tsx",
            extensions: &["tsx"],
            declarations: TS_DECLARATIONS,
            body_blocks: TS_BODY_BLOCKS,
            imports: TS_IMPORTS,
            exports: TS_EXPORTS,
            anonymous_binding: Some(TS_ANONYMOUS_BINDING),
            comment_sign: "//",
            grammar: tsx_grammar,
        },
    ];

    #[cfg(feature = "lang-csharp")]
    profiles.push(LanguageProfile {
        name: "csharp",
        extensions: &["cs"],
        declarations: &[
            "class_declaration",
            "method_declaration",
            "function_declaration",
            "interface_declaration",
        ],
        body_blocks: &["block", "declaration_list"],
        imports: &["using_directive", "using_statement"],
        exports: &[],
        anonymous_binding: None,
        comment_sign: "//",
        grammar: csharp_grammar,
    });

    #[cfg(feature = "lang-rust")]
    profiles.push(LanguageProfile {
        name: "rust",
        extensions: &["rs"],
        declarations: &["function_item", "struct_item", "enum_item", "trait_item"],
        body_blocks: &["block", "field_declaration_list", "enum_variant_list", "declaration_list"],
        imports: &["use_declaration", "extern_crate_declaration"],
        exports: &[],
        anonymous_binding: Some(AnonymousBinding {
            bindings: &["const_item", "static_item"],
            initializers: &["closure_expression"],
        }),
        comment_sign: "//",
        grammar: rust_grammar,
    });

    profiles
}

pub struct ProfileRegistry {
    profiles: Vec<LanguageProfile>,
    by_ext: HashMap<&'static str, usize>,
}

impl ProfileRegistry {
    pub fn for_extension(&self, ext: &str) -> Option<&LanguageProfile> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.by_ext
            .get(ext.as_str())
            .and_then(|&idx| self.profiles.get(idx))
    }

    pub fn profiles(&self) -> &[LanguageProfile] {
        &self.profiles
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        let profiles = builtin_profiles();
        let mut by_ext = HashMap::new();
        for (idx, p) in profiles.iter().enumerate() {
            for ext in p.extensions {
                by_ext.insert(*ext, idx);
            }
        }
        Self { profiles, by_ext }
    }
}

fn registry() -> &'static ProfileRegistry {
    static REGISTRY: OnceLock<ProfileRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ProfileRegistry::default)
}

/// Profile for a file extension (case-insensitive, with or without the dot).
pub fn profile_for_extension(ext: &str) -> Option<&'static LanguageProfile> {
    registry().for_extension(ext)
}

pub fn profile_for_path(path: &Path) -> Option<&'static LanguageProfile> {
    profile_for_extension(&path_ext_lower(path))
}

pub fn supported_extensions() -> Vec<&'static str> {
    let mut exts: Vec<&'static str> = registry()
        .profiles()
        .iter()
        .flat_map(|p| p.extensions.iter().copied())
        .collect();
    exts.sort_unstable();
    exts
}

pub fn path_ext_lower(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
