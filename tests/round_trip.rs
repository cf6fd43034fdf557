use chunkreview::profile::profile_for_extension;
use chunkreview::syntax::{parse_source, TreeNode};
use chunkreview::{chunk_source, chunk_tree, SourceBuffer};

fn assert_round_trip(src: &str, ext: &str) {
    let chunked = chunk_source(src, ext).unwrap();
    assert_eq!(chunked.reassemble(), src, "whole-file round trip failed for .{ext}");

    let buffer = SourceBuffer::new(src);
    for record in chunked.declarations.records() {
        assert_eq!(
            record.source(),
            buffer.slice(record.start, record.end),
            "declaration {} does not reproduce its span",
            record.identifier
        );
        assert!(
            record.body.is_none() || chunked.skeleton.contains(&record.placeholder()),
            "placeholder for {} missing from skeleton",
            record.identifier
        );
    }
}

#[test]
fn python_function_is_split_into_signature_and_body() {
    let src = "def add(a, b):\n    return a + b\n";
    let chunked = chunk_source(src, "py").unwrap();

    let add = chunked.declarations.get("add").expect("add extracted");
    assert_eq!(add.identifier, "add");
    assert!(add.skeleton.starts_with("def add(a, b):"));
    assert!(add.skeleton.ends_with("<BODY add>"));
    assert!(!add.skeleton.contains("return"));
    assert_eq!(add.body.as_deref().map(str::trim), Some("return a + b"));
    assert_eq!(chunked.skeleton, format!("{}\n", add.skeleton));
    assert_round_trip(src, "py");
}

#[test]
fn statements_only_file_is_its_own_skeleton() {
    let src = "import os\n\nx = 1\nprint(os.getcwd(), x)\n";
    let chunked = chunk_source(src, "py").unwrap();
    assert!(chunked.declarations.is_empty());
    assert_eq!(chunked.skeleton, src);
}

#[test]
fn sibling_functions_keep_their_separator() {
    let src = "function a() {\n  return 1;\n}\n\nfunction b() {\n  return 2;\n}\n";
    let chunked = chunk_source(src, "ts").unwrap();

    assert_eq!(chunked.declarations.identifiers().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(chunked.skeleton, "function a() <BODY a>\n\nfunction b() <BODY b>\n");
    assert_round_trip(src, "ts");
}

#[test]
fn arrow_function_binding_is_a_declaration() {
    let src = "export const handler = async (req) => {\n  return req;\n};\n";
    let chunked = chunk_source(src, "ts").unwrap();

    let handler = chunked.declarations.get("handler").expect("handler extracted");
    assert!(handler.skeleton.starts_with("handler = async (req) =>"));
    assert!(handler.body.as_deref().unwrap().contains("return req;"));
    assert!(chunked.skeleton.starts_with("export const handler"));
    assert!(!chunked.skeleton.contains("return req"));
    assert_round_trip(src, "ts");
}

#[test]
fn arrow_function_in_tsx_component() {
    let src = "export const Card = ({ title }: Props) => {\n  return <div>{title}</div>;\n};\n";
    let chunked = chunk_source(src, "tsx").unwrap();
    assert!(chunked.declarations.contains("Card"));
    assert_round_trip(src, "tsx");
}

#[test]
fn interface_and_type_alias() {
    let src = "interface Shape {\n  area(): number;\n}\n\ntype Id = string;\n";
    let chunked = chunk_source(src, "ts").unwrap();

    let shape = chunked.declarations.get("Shape").unwrap();
    assert_eq!(shape.skeleton, "interface Shape <BODY Shape>");
    let id = chunked.declarations.get("Id").unwrap();
    assert!(id.body.is_none());
    assert_eq!(id.skeleton, "type Id = string;");
    assert_round_trip(src, "ts");
}

#[test]
fn class_body_is_split_once_and_methods_stay_inside() {
    let src = "class Counter {\n  count = 0;\n  inc() {\n    this.count++;\n  }\n}\n";
    let chunked = chunk_source(src, "ts").unwrap();

    assert_eq!(chunked.declarations.len(), 1);
    let counter = chunked.declarations.get("Counter").unwrap();
    assert_eq!(counter.skeleton, "class Counter <BODY Counter>");
    assert!(counter.body.as_deref().unwrap().contains("inc()"));
    assert_round_trip(src, "ts");

    let py = "class A:\n    def m(self):\n        return 1\n";
    let chunked = chunk_source(py, "py").unwrap();
    assert_eq!(chunked.declarations.identifiers().collect::<Vec<_>>(), vec!["A"]);
    assert_round_trip(py, "py");
}

#[test]
fn duplicate_names_shadow_but_reassemble_losslessly() {
    let src = "def f():\n    return 1\n\ndef f():\n    return 2\n";
    let chunked = chunk_source(src, "py").unwrap();

    assert_eq!(chunked.declarations.len(), 1);
    assert_eq!(chunked.declarations.records().len(), 2);
    assert_eq!(chunked.declarations.get("f").unwrap().start_line(), 3);
    assert_round_trip(src, "py");
}

#[test]
fn placeholder_text_in_module_code_is_left_alone() {
    let src = "GREETING = \"<BODY main>\"\n\ndef main():\n    return GREETING\n";
    let chunked = chunk_source(src, "py").unwrap();
    assert_eq!(
        chunked.skeleton,
        "GREETING = \"<BODY main>\"\n\ndef main():\n    <BODY main>\n"
    );
    assert_round_trip(src, "py");
}

#[test]
fn placeholder_text_in_a_signature_is_left_alone() {
    let src = "function f(a = \"<BODY f>\") {\n  return a;\n}\n";
    let chunked = chunk_source(src, "ts").unwrap();
    let f = chunked.declarations.get("f").expect("f extracted");
    assert_eq!(f.skeleton, "function f(a = \"<BODY f>\") <BODY f>");
    assert_eq!(f.source(), "function f(a = \"<BODY f>\") {\n  return a;\n}");
    assert_round_trip(src, "ts");
}

#[test]
fn broken_source_is_preserved_verbatim() {
    for src in [
        "def broken(:\n    pass\n\nx = 1\n",
        "class {\n",
        "function (a, b {\n  return\n",
        "))) def f():\n",
    ] {
        let ext = if src.contains("function") { "ts" } else { "py" };
        assert_round_trip(src, ext);
    }
}

#[test]
fn text_encodings_survive() {
    assert_round_trip("def f():\r\n    return 1\r\n", "py");
    assert_round_trip("def café(ß):\n    return 'ü' + ß\n", "py");
    assert_round_trip("\n\n# leading comment\ndef g():\n    pass", "py");
    assert_round_trip("", "py");
}

#[test]
fn chunking_is_deterministic() {
    let src = "import x\n\nclass A:\n    pass\n\ndef b(y):\n    return y * 2\n";
    let first = chunk_source(src, "py").unwrap();
    let second = chunk_source(src, "py").unwrap();
    assert_eq!(first.skeleton, second.skeleton);
    assert_eq!(first.declarations.records(), second.declarations.records());
}

#[test]
fn owned_tree_chunks_like_the_tree_sitter_tree() {
    let src = "def add(a, b):\n    return a + b\n\nz = add(1, 2)\n";
    let profile = profile_for_extension("py").unwrap();
    let tree = parse_source(src, profile).unwrap();
    let owned = TreeNode::from_node(&tree.root_node());

    let buffer = SourceBuffer::new(src);
    let (from_ts, ts_store) = chunk_tree(&buffer, profile, &tree.root_node());
    let (from_owned, owned_store) = chunk_tree(&buffer, profile, &&owned);

    assert_eq!(from_ts, from_owned);
    assert_eq!(ts_store.records(), owned_store.records());
}

#[cfg(feature = "lang-csharp")]
#[test]
fn csharp_class_is_split() {
    let src = concat!(
        "using System;\n\n",
        "class Greeter\n{\n",
        "    public void Hi()\n    {\n        Console.WriteLine(\"hi\");\n    }\n",
        "}\n",
    );
    let chunked = chunk_source(src, "cs").unwrap();
    assert!(chunked.declarations.contains("Greeter"));
    assert!(!chunked.skeleton.contains("WriteLine"));
    assert_round_trip(src, "cs");
}

#[cfg(feature = "lang-rust")]
#[test]
fn rust_items_are_split() {
    let src = concat!(
        "use std::fmt;\n\n",
        "fn main() {\n    println!(\"hi\");\n}\n\n",
        "struct P {\n    x: i32,\n}\n",
    );
    let chunked = chunk_source(src, "rs").unwrap();
    assert_eq!(chunked.declarations.identifiers().collect::<Vec<_>>(), vec!["main", "P"]);
    assert!(chunked.skeleton.starts_with("use std::fmt;\n"));
    assert_round_trip(src, "rs");
}

#[cfg(feature = "lang-rust")]
#[test]
fn rust_const_closure_is_a_declaration() {
    let src = "const DOUBLE: fn(i32) -> i32 = |x| {\n    x * 2\n};\n";
    let chunked = chunk_source(src, "rs").unwrap();
    let double = chunked.declarations.get("DOUBLE").expect("DOUBLE extracted");
    assert!(double.body.as_deref().unwrap().contains("x * 2"));
    assert!(!chunked.skeleton.contains("x * 2"));
    assert_round_trip(src, "rs");
}
