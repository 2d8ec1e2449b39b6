//! Deterministic pre-order traversal over a [`Forest`].
//!
//! A [`Visitor`] sees every node in document order together with its
//! ancestor chain and decides whether to descend. Children are read
//! after the visit, so a visitor that rewrites the node it was handed
//! has the rewritten children traversed.

use crate::ast::{Forest, NodeId, NodeKind};
use crate::error::MigrateError;

/// What the walker does after a node has been visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Descend,
    Prune,
}

pub trait Visitor {
    /// `ancestors` runs from the walk root down to the parent of `id`.
    fn visit(
        &mut self,
        forest: &mut Forest,
        id: NodeId,
        ancestors: &[NodeId],
    ) -> Result<Walk, MigrateError>;
}

/// Walk the subtree rooted at `root`. The first error aborts the walk.
pub fn walk<V: Visitor + ?Sized>(
    forest: &mut Forest,
    root: NodeId,
    visitor: &mut V,
) -> Result<(), MigrateError> {
    let mut ancestors = Vec::new();
    walk_node(forest, root, visitor, &mut ancestors)
}

fn walk_node<V: Visitor + ?Sized>(
    forest: &mut Forest,
    id: NodeId,
    visitor: &mut V,
    ancestors: &mut Vec<NodeId>,
) -> Result<(), MigrateError> {
    if visitor.visit(forest, id, ancestors)? == Walk::Prune {
        return Ok(());
    }
    ancestors.push(id);
    for child in forest.children(id) {
        walk_node(forest, child, visitor, ancestors)?;
    }
    ancestors.pop();
    Ok(())
}

/// Chain of nodes whose span covers `offset`, narrowest first, ending at
/// `root`. Synthetic nodes are never entered.
pub fn enclosing_path(forest: &Forest, root: NodeId, offset: u32) -> Vec<NodeId> {
    let mut path = vec![root];
    let mut current = root;
    'descend: loop {
        for child in forest.children(current) {
            if forest.span(child).contains(offset) {
                path.push(child);
                current = child;
                continue 'descend;
            }
        }
        break;
    }
    path.reverse();
    path
}

/// Climb from the narrowest node while the parent starts at the same
/// offset and the child is a leaf-like expression (literal, call,
/// identifier, parentheses, selector). A diagnostic reported at `x`
/// in `x + y` then lands on the binary expression, and one reported at
/// `f` in `f(a)` on the call.
pub fn trim_path(forest: &Forest, path: &[NodeId]) -> Vec<NodeId> {
    let Some(&first) = path.first() else {
        return Vec::new();
    };
    let start = forest.span(first).start;
    let mut keep_from = 0;
    for i in 1..path.len() {
        let leafish = matches!(
            forest.kind(path[i - 1]),
            NodeKind::BasicLit { .. }
                | NodeKind::Call { .. }
                | NodeKind::Ident { .. }
                | NodeKind::Paren { .. }
                | NodeKind::Selector { .. }
        );
        if forest.span(path[i]).start != start || !leafish {
            keep_from = i - 1;
            break;
        }
    }
    path[keep_from..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;

    struct Collect(Vec<&'static str>);

    impl Visitor for Collect {
        fn visit(
            &mut self,
            forest: &mut Forest,
            id: NodeId,
            _ancestors: &[NodeId],
        ) -> Result<Walk, MigrateError> {
            self.0.push(forest.kind(id).name());
            if matches!(forest.kind(id), NodeKind::FuncDecl { .. }) {
                return Ok(Walk::Prune);
            }
            Ok(Walk::Descend)
        }
    }

    #[test]
    fn walk_is_preorder_and_prunes() {
        let mut forest = Forest::new();
        let root = parse_file(
            "package p\n\nvar x = 1\n\nfunc f() { g() }\n",
            "p.go",
            &mut forest,
        )
        .unwrap();
        let mut c = Collect(Vec::new());
        walk(&mut forest, root, &mut c).unwrap();
        assert_eq!(
            c.0,
            vec!["File", "GenDecl", "ValueSpec", "BasicLit", "FuncDecl"]
        );
    }

    #[test]
    fn errors_abort_the_walk() {
        struct Fail(usize);
        impl Visitor for Fail {
            fn visit(
                &mut self,
                _forest: &mut Forest,
                _id: NodeId,
                _ancestors: &[NodeId],
            ) -> Result<Walk, MigrateError> {
                self.0 += 1;
                Err(MigrateError::Directive("stop".into()))
            }
        }
        let mut forest = Forest::new();
        let root = parse_file("package p\n\nvar x = 1\n", "p.go", &mut forest).unwrap();
        let mut v = Fail(0);
        assert!(walk(&mut forest, root, &mut v).is_err());
        assert_eq!(v.0, 1);
    }

    #[test]
    fn rewritten_children_are_traversed() {
        struct Rewrite(Vec<String>);
        impl Visitor for Rewrite {
            fn visit(
                &mut self,
                forest: &mut Forest,
                id: NodeId,
                _ancestors: &[NodeId],
            ) -> Result<Walk, MigrateError> {
                if let Some(name) = forest.ident_name(id) {
                    self.0.push(name.to_owned());
                }
                if let NodeKind::BasicLit { .. } = forest.kind(id) {
                    let inner = forest.ident("inner");
                    *forest.kind_mut(id) = NodeKind::Paren { x: inner };
                }
                Ok(Walk::Descend)
            }
        }
        let mut forest = Forest::new();
        let root = parse_file("package p\n\nvar x = 1\n", "p.go", &mut forest).unwrap();
        let mut v = Rewrite(Vec::new());
        walk(&mut forest, root, &mut v).unwrap();
        assert_eq!(v.0, vec!["inner".to_owned()]);
    }

    #[test]
    fn enclosing_path_is_trimmed_to_the_binary_expression() {
        let src = "package p\n\nfunc f(a, b int) bool {\n\treturn a < b\n}\n";
        let mut forest = Forest::new();
        let root = parse_file(src, "p.go", &mut forest).unwrap();
        let offset = src.find("a < b").unwrap() as u32;
        let path = enclosing_path(&forest, root, offset);
        let names: Vec<_> = path.iter().map(|&id| forest.kind(id).name()).collect();
        assert_eq!(
            names,
            vec!["Ident", "BinaryExpr", "ReturnStmt", "BlockStmt", "FuncDecl", "File"]
        );
        let trimmed = trim_path(&forest, &path);
        assert_eq!(forest.kind(trimmed[0]).name(), "BinaryExpr");
    }
}
