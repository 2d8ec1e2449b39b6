//! Syntax tree dumps for `typeshift print`.

use serde_json::{json, Value};
use typeshift_core::{Forest, NodeId, NodeKind};

fn detail(forest: &Forest, id: NodeId) -> Option<String> {
    match forest.kind(id) {
        NodeKind::Ident { name } => Some(name.clone()),
        NodeKind::BasicLit { value, .. } => Some(value.clone()),
        NodeKind::Selector { sel, .. } => Some(format!(".{}", sel)),
        NodeKind::Unary { op, .. } | NodeKind::Binary { op, .. } | NodeKind::Assign { op, .. } => {
            Some((*op).to_owned())
        }
        NodeKind::FuncDecl { name, .. } | NodeKind::TypeSpec { name, .. } => Some(name.clone()),
        NodeKind::ValueSpec { names, .. } | NodeKind::Field { names, .. } if !names.is_empty() => {
            Some(names.join(", "))
        }
        NodeKind::File { package, .. } => Some(package.clone()),
        _ => None,
    }
}

fn span_text(forest: &Forest, id: NodeId) -> String {
    let span = forest.span(id);
    if span.is_synthetic() {
        "-".to_owned()
    } else {
        format!("{}..{}", span.start, span.end)
    }
}

/// One line per node, indented by depth:
/// `BinaryExpr #12 40..49 <`.
pub fn dump_text(forest: &Forest, root: NodeId) -> String {
    fn go(forest: &Forest, id: NodeId, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(forest.kind(id).name());
        out.push_str(&format!(" #{} {}", id.0, span_text(forest, id)));
        if let Some(d) = detail(forest, id) {
            out.push(' ');
            out.push_str(&d);
        }
        out.push('\n');
        for child in forest.children(id) {
            go(forest, child, depth + 1, out);
        }
    }
    let mut out = String::new();
    go(forest, root, 0, &mut out);
    out
}

/// Nested JSON form of the same dump.
pub fn dump_json(forest: &Forest, id: NodeId) -> Value {
    let span = forest.span(id);
    let mut node = json!({
        "kind": forest.kind(id).name(),
        "id": id.0,
    });
    if !span.is_synthetic() {
        node["start"] = json!(span.start);
        node["end"] = json!(span.end);
    }
    if let Some(d) = detail(forest, id) {
        node["detail"] = json!(d);
    }
    let children: Vec<Value> = forest
        .children(id)
        .into_iter()
        .map(|c| dump_json(forest, c))
        .collect();
    if !children.is_empty() {
        node["children"] = Value::Array(children);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use typeshift_core::parser::parse_file;

    #[test]
    fn text_dump_indents_children() {
        let mut f = Forest::new();
        let root = parse_file("package p\n\nvar x = a < 2\n", "p.go", &mut f).unwrap();
        let text = dump_text(&f, root);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("File #"));
        assert!(lines[0].ends_with(" p"));
        assert!(text.contains("\n      BinaryExpr #"));
        assert!(text.contains(" <\n"));
        assert!(text.contains("Ident #") && text.contains(" a\n"));
    }

    #[test]
    fn json_dump_nests_children() {
        let mut f = Forest::new();
        let root = parse_file("package p\n\nvar x = 1\n", "p.go", &mut f).unwrap();
        let v = dump_json(&f, root);
        assert_eq!(v["kind"], "File");
        assert_eq!(v["detail"], "p");
        assert_eq!(v["children"][0]["kind"], "GenDecl");
        assert_eq!(v["children"][0]["children"][0]["detail"], "x");
    }
}
