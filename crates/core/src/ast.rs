//! Arena syntax tree for the Go subset.
//!
//! Every node of a unit lives in one [`Forest`] and is addressed by a
//! [`NodeId`]. Parents hold child handles; there are no back pointers, so
//! an "enclosing path" is a handle sequence computed by descending from a
//! file root. Edits replace handles in a parent's fields or overwrite a
//! node's kind in place; either bumps the forest revision so stale type
//! information can be detected.

// ──────────────────────────────────────────────
// Handles and positions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Byte range inside one file. Nodes created by rewrites carry
/// [`Span::SYNTHETIC`] and are never found by position lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const SYNTHETIC: Span = Span {
        start: u32::MAX,
        end: u32::MAX,
    };

    pub fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    pub fn is_synthetic(&self) -> bool {
        self.start == u32::MAX
    }

    /// True if `[offset, offset+1)` lies inside this span.
    pub fn contains(&self, offset: u32) -> bool {
        !self.is_synthetic() && self.start <= offset && offset < self.end
    }
}

/// Comments and blank-line layout attached to a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trivia {
    pub leading: Vec<String>,
    pub trailing: Option<String>,
    pub blank_before: bool,
    /// Comments between the last child and the closing brace (or EOF).
    pub inner_tail: Vec<String>,
}

impl Trivia {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty()
            && self.trailing.is_none()
            && !self.blank_before
            && self.inner_tail.is_empty()
    }
}

// ──────────────────────────────────────────────
// Node kinds
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Char,
    Str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKeyword {
    Import,
    Var,
    Const,
    Type,
}

impl DeclKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKeyword::Import => "import",
            DeclKeyword::Var => "var",
            DeclKeyword::Const => "const",
            DeclKeyword::Type => "type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // -- Files and declarations --
    /// Import declarations are `GenDecl`s with the `Import` keyword.
    File {
        package: String,
        decls: Vec<NodeId>,
    },
    ImportSpec {
        alias: Option<String>,
        /// Raw string literal including quotes
        path: String,
    },
    FuncDecl {
        recv: Option<NodeId>,
        name: String,
        ty: NodeId,
        body: Option<NodeId>,
    },
    GenDecl {
        keyword: DeclKeyword,
        specs: Vec<NodeId>,
        grouped: bool,
    },
    ValueSpec {
        names: Vec<String>,
        ty: Option<NodeId>,
        values: Vec<NodeId>,
    },
    TypeSpec {
        name: String,
        alias: bool,
        ty: NodeId,
    },
    FieldList {
        fields: Vec<NodeId>,
    },
    Field {
        names: Vec<String>,
        ty: NodeId,
    },

    // -- Type expressions --
    /// `[N]T`, `[...]T` (len is an Ellipsis) or `[]T` (no len)
    ArrayType {
        len: Option<NodeId>,
        elt: NodeId,
    },
    MapType {
        key: NodeId,
        value: NodeId,
    },
    ChanType {
        dir: ChanDir,
        elt: NodeId,
    },
    FuncType {
        params: NodeId,
        results: Option<NodeId>,
    },
    StructType {
        fields: NodeId,
    },
    /// Only the empty interface is supported
    InterfaceType,
    /// `...T` in a variadic parameter, or `...` as an array length
    Ellipsis {
        elt: Option<NodeId>,
    },

    // -- Expressions --
    Ident {
        name: String,
    },
    BasicLit {
        kind: LitKind,
        /// Raw source text
        value: String,
    },
    CompositeLit {
        ty: Option<NodeId>,
        elts: Vec<NodeId>,
        /// One element per line
        multiline: bool,
    },
    KeyValue {
        key: NodeId,
        value: NodeId,
    },
    FuncLit {
        ty: NodeId,
        body: NodeId,
    },
    Paren {
        x: NodeId,
    },
    Selector {
        x: NodeId,
        sel: String,
    },
    Index {
        x: NodeId,
        index: NodeId,
    },
    Slice {
        x: NodeId,
        low: Option<NodeId>,
        high: Option<NodeId>,
        max: Option<NodeId>,
    },
    Call {
        fun: NodeId,
        args: Vec<NodeId>,
        /// Trailing `...` on the last argument
        spread: bool,
    },
    /// Pointer type or dereference
    Star {
        x: NodeId,
    },
    Unary {
        op: &'static str,
        x: NodeId,
    },
    Binary {
        op: &'static str,
        x: NodeId,
        y: NodeId,
    },

    // -- Statements --
    Block {
        stmts: Vec<NodeId>,
    },
    ExprStmt {
        x: NodeId,
    },
    Assign {
        lhs: Vec<NodeId>,
        op: &'static str,
        rhs: Vec<NodeId>,
    },
    IncDec {
        x: NodeId,
        op: &'static str,
    },
    DeclStmt {
        decl: NodeId,
    },
    Return {
        results: Vec<NodeId>,
    },
    If {
        init: Option<NodeId>,
        cond: NodeId,
        body: NodeId,
        els: Option<NodeId>,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        post: Option<NodeId>,
        body: NodeId,
    },
    Range {
        key: Option<NodeId>,
        value: Option<NodeId>,
        define: bool,
        x: NodeId,
        body: NodeId,
    },
    Switch {
        init: Option<NodeId>,
        tag: Option<NodeId>,
        clauses: Vec<NodeId>,
    },
    /// `case a, b:` or `default:` (when `default` is set)
    CaseClause {
        list: Vec<NodeId>,
        default: bool,
        body: Vec<NodeId>,
    },
    Send {
        chan: NodeId,
        value: NodeId,
    },
    Go {
        call: NodeId,
    },
    Defer {
        call: NodeId,
    },
    Branch {
        keyword: String,
        label: Option<String>,
    },
    Labeled {
        label: String,
        stmt: NodeId,
    },
    Empty,
}

impl NodeKind {
    /// Stable kind name, used in error paths and tree dumps.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::File { .. } => "File",
            NodeKind::ImportSpec { .. } => "ImportSpec",
            NodeKind::FuncDecl { .. } => "FuncDecl",
            NodeKind::GenDecl { .. } => "GenDecl",
            NodeKind::ValueSpec { .. } => "ValueSpec",
            NodeKind::TypeSpec { .. } => "TypeSpec",
            NodeKind::FieldList { .. } => "FieldList",
            NodeKind::Field { .. } => "Field",
            NodeKind::ArrayType { .. } => "ArrayType",
            NodeKind::MapType { .. } => "MapType",
            NodeKind::ChanType { .. } => "ChanType",
            NodeKind::FuncType { .. } => "FuncType",
            NodeKind::StructType { .. } => "StructType",
            NodeKind::InterfaceType => "InterfaceType",
            NodeKind::Ellipsis { .. } => "Ellipsis",
            NodeKind::Ident { .. } => "Ident",
            NodeKind::BasicLit { .. } => "BasicLit",
            NodeKind::CompositeLit { .. } => "CompositeLit",
            NodeKind::KeyValue { .. } => "KeyValueExpr",
            NodeKind::FuncLit { .. } => "FuncLit",
            NodeKind::Paren { .. } => "ParenExpr",
            NodeKind::Selector { .. } => "SelectorExpr",
            NodeKind::Index { .. } => "IndexExpr",
            NodeKind::Slice { .. } => "SliceExpr",
            NodeKind::Call { .. } => "CallExpr",
            NodeKind::Star { .. } => "StarExpr",
            NodeKind::Unary { .. } => "UnaryExpr",
            NodeKind::Binary { .. } => "BinaryExpr",
            NodeKind::Block { .. } => "BlockStmt",
            NodeKind::ExprStmt { .. } => "ExprStmt",
            NodeKind::Assign { .. } => "AssignStmt",
            NodeKind::IncDec { .. } => "IncDecStmt",
            NodeKind::DeclStmt { .. } => "DeclStmt",
            NodeKind::Return { .. } => "ReturnStmt",
            NodeKind::If { .. } => "IfStmt",
            NodeKind::For { .. } => "ForStmt",
            NodeKind::Range { .. } => "RangeStmt",
            NodeKind::Switch { .. } => "SwitchStmt",
            NodeKind::CaseClause { .. } => "CaseClause",
            NodeKind::Send { .. } => "SendStmt",
            NodeKind::Go { .. } => "GoStmt",
            NodeKind::Defer { .. } => "DeferStmt",
            NodeKind::Branch { .. } => "BranchStmt",
            NodeKind::Labeled { .. } => "LabeledStmt",
            NodeKind::Empty => "EmptyStmt",
        }
    }

    /// Child handles in document order.
    pub fn children(&self) -> Vec<NodeId> {
        fn opt(out: &mut Vec<NodeId>, id: &Option<NodeId>) {
            if let Some(id) = id {
                out.push(*id);
            }
        }
        let mut out = Vec::new();
        match self {
            NodeKind::File { decls, .. } => out.extend(decls),
            NodeKind::FuncDecl { recv, ty, body, .. } => {
                opt(&mut out, recv);
                out.push(*ty);
                opt(&mut out, body);
            }
            NodeKind::GenDecl { specs, .. } => out.extend(specs),
            NodeKind::ValueSpec { ty, values, .. } => {
                opt(&mut out, ty);
                out.extend(values);
            }
            NodeKind::TypeSpec { ty, .. } => out.push(*ty),
            NodeKind::FieldList { fields } => out.extend(fields),
            NodeKind::Field { ty, .. } => out.push(*ty),
            NodeKind::ArrayType { len, elt } => {
                opt(&mut out, len);
                out.push(*elt);
            }
            NodeKind::MapType { key, value } => {
                out.push(*key);
                out.push(*value);
            }
            NodeKind::ChanType { elt, .. } => out.push(*elt),
            NodeKind::FuncType { params, results } => {
                out.push(*params);
                opt(&mut out, results);
            }
            NodeKind::StructType { fields } => out.push(*fields),
            NodeKind::Ellipsis { elt } => opt(&mut out, elt),
            NodeKind::CompositeLit { ty, elts, .. } => {
                opt(&mut out, ty);
                out.extend(elts);
            }
            NodeKind::KeyValue { key, value } => {
                out.push(*key);
                out.push(*value);
            }
            NodeKind::FuncLit { ty, body } => {
                out.push(*ty);
                out.push(*body);
            }
            NodeKind::Paren { x }
            | NodeKind::Selector { x, .. }
            | NodeKind::Star { x }
            | NodeKind::Unary { x, .. }
            | NodeKind::ExprStmt { x }
            | NodeKind::IncDec { x, .. } => out.push(*x),
            NodeKind::Index { x, index } => {
                out.push(*x);
                out.push(*index);
            }
            NodeKind::Slice { x, low, high, max } => {
                out.push(*x);
                opt(&mut out, low);
                opt(&mut out, high);
                opt(&mut out, max);
            }
            NodeKind::Call { fun, args, .. } => {
                out.push(*fun);
                out.extend(args);
            }
            NodeKind::Binary { x, y, .. } => {
                out.push(*x);
                out.push(*y);
            }
            NodeKind::Block { stmts } => out.extend(stmts),
            NodeKind::Assign { lhs, rhs, .. } => {
                out.extend(lhs);
                out.extend(rhs);
            }
            NodeKind::DeclStmt { decl } => out.push(*decl),
            NodeKind::Return { results } => out.extend(results),
            NodeKind::If {
                init,
                cond,
                body,
                els,
            } => {
                opt(&mut out, init);
                out.push(*cond);
                out.push(*body);
                opt(&mut out, els);
            }
            NodeKind::For {
                init,
                cond,
                post,
                body,
            } => {
                opt(&mut out, init);
                opt(&mut out, cond);
                opt(&mut out, post);
                out.push(*body);
            }
            NodeKind::Range {
                key, value, x, body, ..
            } => {
                opt(&mut out, key);
                opt(&mut out, value);
                out.push(*x);
                out.push(*body);
            }
            NodeKind::Switch { init, tag, clauses } => {
                opt(&mut out, init);
                opt(&mut out, tag);
                out.extend(clauses);
            }
            NodeKind::CaseClause { list, body, .. } => {
                out.extend(list);
                out.extend(body);
            }
            NodeKind::Send { chan, value } => {
                out.push(*chan);
                out.push(*value);
            }
            NodeKind::Go { call } | NodeKind::Defer { call } => out.push(*call),
            NodeKind::Labeled { stmt, .. } => out.push(*stmt),
            NodeKind::ImportSpec { .. }
            | NodeKind::InterfaceType
            | NodeKind::Ident { .. }
            | NodeKind::BasicLit { .. }
            | NodeKind::Branch { .. }
            | NodeKind::Empty => {}
        }
        out
    }
}

impl NodeKind {
    /// Mutable child handle slots, in the same order as [`NodeKind::children`].
    pub fn child_slots_mut(&mut self) -> Vec<&mut NodeId> {
        let mut out: Vec<&mut NodeId> = Vec::new();
        match self {
            NodeKind::File { decls, .. } => out.extend(decls.iter_mut()),
            NodeKind::FuncDecl { recv, ty, body, .. } => {
                out.extend(recv.as_mut());
                out.push(ty);
                out.extend(body.as_mut());
            }
            NodeKind::GenDecl { specs, .. } => out.extend(specs.iter_mut()),
            NodeKind::ValueSpec { ty, values, .. } => {
                out.extend(ty.as_mut());
                out.extend(values.iter_mut());
            }
            NodeKind::TypeSpec { ty, .. } | NodeKind::Field { ty, .. } => out.push(ty),
            NodeKind::FieldList { fields } => out.extend(fields.iter_mut()),
            NodeKind::ArrayType { len, elt } => {
                out.extend(len.as_mut());
                out.push(elt);
            }
            NodeKind::MapType { key, value } | NodeKind::KeyValue { key, value } => {
                out.push(key);
                out.push(value);
            }
            NodeKind::ChanType { elt, .. } => out.push(elt),
            NodeKind::FuncType { params, results } => {
                out.push(params);
                out.extend(results.as_mut());
            }
            NodeKind::StructType { fields } => out.push(fields),
            NodeKind::Ellipsis { elt } => out.extend(elt.as_mut()),
            NodeKind::CompositeLit { ty, elts, .. } => {
                out.extend(ty.as_mut());
                out.extend(elts.iter_mut());
            }
            NodeKind::FuncLit { ty, body } => {
                out.push(ty);
                out.push(body);
            }
            NodeKind::Paren { x }
            | NodeKind::Selector { x, .. }
            | NodeKind::Star { x }
            | NodeKind::Unary { x, .. }
            | NodeKind::ExprStmt { x }
            | NodeKind::IncDec { x, .. } => out.push(x),
            NodeKind::Index { x, index } => {
                out.push(x);
                out.push(index);
            }
            NodeKind::Slice { x, low, high, max } => {
                out.push(x);
                out.extend(low.as_mut());
                out.extend(high.as_mut());
                out.extend(max.as_mut());
            }
            NodeKind::Call { fun, args, .. } => {
                out.push(fun);
                out.extend(args.iter_mut());
            }
            NodeKind::Binary { x, y, .. } => {
                out.push(x);
                out.push(y);
            }
            NodeKind::Block { stmts } => out.extend(stmts.iter_mut()),
            NodeKind::Assign { lhs, rhs, .. } => {
                out.extend(lhs.iter_mut());
                out.extend(rhs.iter_mut());
            }
            NodeKind::DeclStmt { decl } => out.push(decl),
            NodeKind::Return { results } => out.extend(results.iter_mut()),
            NodeKind::If {
                init,
                cond,
                body,
                els,
            } => {
                out.extend(init.as_mut());
                out.push(cond);
                out.push(body);
                out.extend(els.as_mut());
            }
            NodeKind::For {
                init,
                cond,
                post,
                body,
            } => {
                out.extend(init.as_mut());
                out.extend(cond.as_mut());
                out.extend(post.as_mut());
                out.push(body);
            }
            NodeKind::Range {
                key, value, x, body, ..
            } => {
                out.extend(key.as_mut());
                out.extend(value.as_mut());
                out.push(x);
                out.push(body);
            }
            NodeKind::Switch { init, tag, clauses } => {
                out.extend(init.as_mut());
                out.extend(tag.as_mut());
                out.extend(clauses.iter_mut());
            }
            NodeKind::CaseClause { list, body, .. } => {
                out.extend(list.iter_mut());
                out.extend(body.iter_mut());
            }
            NodeKind::Send { chan, value } => {
                out.push(chan);
                out.push(value);
            }
            NodeKind::Go { call } | NodeKind::Defer { call } => out.push(call),
            NodeKind::Labeled { stmt, .. } => out.push(stmt),
            NodeKind::ImportSpec { .. }
            | NodeKind::InterfaceType
            | NodeKind::Ident { .. }
            | NodeKind::BasicLit { .. }
            | NodeKind::Branch { .. }
            | NodeKind::Empty => {}
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub trivia: Trivia,
}

// ──────────────────────────────────────────────
// Forest
// ──────────────────────────────────────────────

/// Node arena for all files of one unit.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: Vec<Node>,
    revision: u64,
}

impl Forest {
    pub fn new() -> Self {
        Forest::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bumped on every allocation and every mutable access.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            trivia: Trivia::default(),
        });
        self.revision += 1;
        id
    }

    /// Allocate a node that has no source position.
    pub fn synth(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(kind, Span::SYNTHETIC)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0 as usize].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        self.revision += 1;
        &mut self.nodes[id.0 as usize].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0 as usize].span
    }

    pub fn set_span(&mut self, id: NodeId, span: Span) {
        self.nodes[id.0 as usize].span = span;
    }

    pub fn trivia(&self, id: NodeId) -> &Trivia {
        &self.nodes[id.0 as usize].trivia
    }

    pub fn trivia_mut(&mut self, id: NodeId) -> &mut Trivia {
        &mut self.nodes[id.0 as usize].trivia
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    // -- Small constructors used by the rewrite passes --

    pub fn ident(&mut self, name: &str) -> NodeId {
        self.synth(NodeKind::Ident {
            name: name.to_owned(),
        })
    }

    pub fn call_ident(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let fun = self.ident(name);
        self.synth(NodeKind::Call {
            fun,
            args,
            spread: false,
        })
    }

    pub fn call_selector(&mut self, x: &str, sel: &str, args: Vec<NodeId>) -> NodeId {
        let x = self.ident(x);
        let fun = self.synth(NodeKind::Selector {
            x,
            sel: sel.to_owned(),
        });
        self.synth(NodeKind::Call {
            fun,
            args,
            spread: false,
        })
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Paren { x } = self.kind(id) {
            id = *x;
        }
        id
    }

    pub fn ident_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Ident { name } => Some(name),
            _ => None,
        }
    }

    /// `T(x)` where `T` is a plain identifier: returns `(T, x)`.
    pub fn as_conversion(&self, id: NodeId) -> Option<(&str, NodeId)> {
        match self.kind(id) {
            NodeKind::Call {
                fun, args, spread, ..
            } if args.len() == 1 && !spread => {
                self.ident_name(*fun).map(|name| (name, args[0]))
            }
            _ => None,
        }
    }

    /// Name of the called function: identifier or selector name.
    pub fn callee_name(&self, call: NodeId) -> Option<&str> {
        match self.kind(call) {
            NodeKind::Call { fun, .. } => match self.kind(*fun) {
                NodeKind::Ident { name } => Some(name),
                NodeKind::Selector { sel, .. } => Some(sel),
                _ => None,
            },
            _ => None,
        }
    }

    /// Replace every occurrence of `old` among `parent`'s direct child
    /// handles with `new`. Returns false if `old` is not a child.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> bool {
        let mut hit = false;
        for slot in self.kind_mut(parent).child_slots_mut() {
            if *slot == old {
                *slot = new;
                hit = true;
            }
        }
        hit
    }

    /// Deep-copy a subtree; the copy is synthetic.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let mut kind = self.kind(id).clone();
        for slot in kind.child_slots_mut() {
            *slot = self.deep_clone(*slot);
        }
        let new = self.synth(kind);
        self.nodes[new.0 as usize].trivia = self.nodes[id.0 as usize].trivia.clone();
        new
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_contains_excludes_end_and_synthetic() {
        let s = Span::new(4, 8);
        assert!(s.contains(4));
        assert!(s.contains(7));
        assert!(!s.contains(8));
        assert!(!Span::SYNTHETIC.contains(0));
    }

    #[test]
    fn mutation_bumps_revision() {
        let mut f = Forest::new();
        let id = f.ident("x");
        let before = f.revision();
        if let NodeKind::Ident { name } = f.kind_mut(id) {
            name.push('y');
        }
        assert!(f.revision() > before);
        assert_eq!(f.ident_name(id), Some("xy"));
    }

    #[test]
    fn replace_child_swaps_call_argument() {
        let mut f = Forest::new();
        let a = f.ident("a");
        let b = f.ident("b");
        let call = f.call_ident("g", vec![a]);
        assert!(f.replace_child(call, a, b));
        match f.kind(call) {
            NodeKind::Call { args, .. } => assert_eq!(args, &vec![b]),
            other => panic!("expected call, got {:?}", other),
        }
        assert!(!f.replace_child(call, a, b));
    }

    #[test]
    fn as_conversion_matches_single_argument_ident_calls() {
        let mut f = Forest::new();
        let x = f.ident("x");
        let conv = f.call_ident("int", vec![x]);
        assert_eq!(f.as_conversion(conv), Some(("int", x)));
        let y = f.ident("y");
        let two = f.call_ident("max", vec![x, y]);
        assert_eq!(f.as_conversion(two), None);
    }

    #[test]
    fn deep_clone_copies_children() {
        let mut f = Forest::new();
        let x = f.ident("x");
        let call = f.call_ident("int", vec![x]);
        let copy = f.deep_clone(call);
        assert_ne!(copy, call);
        let (name, arg) = f.as_conversion(copy).unwrap();
        assert_eq!(name, "int");
        assert_ne!(arg, x);
        assert_eq!(f.ident_name(arg), Some("x"));
    }
}
