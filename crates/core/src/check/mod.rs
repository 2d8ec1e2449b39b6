//! Type checker for the supported Go subset.
//!
//! [`check_unit`] type-checks every file of one package together and
//! returns per-expression types plus diagnostics worded the way go/types
//! words them, so that conflicts can be recognised by message shape.
//!
//! The checker never fails: problems become diagnostics, and operands
//! that already produced one turn `Invalid` so a single mistake does not
//! cascade. Declared-but-unused variables and imports are not reported.

mod constant;
mod expr;
mod stmt;
mod types;
mod universe;

pub use constant::{quote, ConstValue};
pub use types::{default_type, BasicKind, NamedId, Signature, StructField, Type, TypeTable};

use std::collections::HashMap;

use crate::ast::{DeclKeyword, Forest, NodeId, NodeKind};
use crate::parser;
use crate::printer::print_expr;
use universe::{Builtin, MemberKind};

/// A diagnostic before it is mapped to a source file and line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDiagnostic {
    /// Index into the file list passed to [`check_unit`]
    pub file: usize,
    pub offset: u32,
    pub message: String,
}

/// Types and constant values recorded for the expressions of one check.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    types: HashMap<NodeId, Type>,
    values: HashMap<NodeId, ConstValue>,
    table: TypeTable,
    revision: u64,
}

impl TypeInfo {
    pub fn type_of(&self, id: NodeId) -> Option<&Type> {
        self.types.get(&id)
    }

    /// `go/types`-style rendering of the expression's type.
    pub fn type_string(&self, id: NodeId) -> Option<String> {
        self.type_of(id).map(|t| self.table.type_string(t))
    }

    pub fn value(&self, id: NodeId) -> Option<&ConstValue> {
        self.values.get(&id)
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    /// Forest revision the information was computed against.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Type-check the files of one package.
pub fn check_unit(forest: &Forest, files: &[NodeId]) -> (TypeInfo, Vec<RawDiagnostic>) {
    let mut checker = Checker::new(forest);
    checker.run(files);
    checker.finish()
}

// ──────────────────────────────────────────────
// Objects and scopes
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) enum Obj {
    Var(Type),
    Const(Type, ConstValue),
    TypeName(Type),
    Func(Type),
    Builtin(Builtin),
    Package(String),
    Nil,
    Iota,
    /// Resolution failed; uses stay silent
    Invalid,
}

#[derive(Debug, Clone)]
enum GlobalDecl {
    Func(NodeId),
    Var(NodeId),
    Const {
        spec: NodeId,
        source: NodeId,
        iota: i128,
    },
    Type(NodeId),
}

#[derive(Debug, Clone)]
enum State {
    Pending,
    Active,
    Done(Obj),
}

#[derive(Debug, Clone)]
struct Global {
    name: String,
    file: usize,
    decl: GlobalDecl,
    state: State,
}

/// Parameter and result lists of a function type, with their names.
#[derive(Debug, Clone)]
pub(crate) struct FuncShape {
    pub sig: Signature,
    pub params: Vec<(Option<String>, Type)>,
    pub results: Vec<(Option<String>, Type)>,
}

pub(crate) struct Checker<'f> {
    forest: &'f Forest,
    table: TypeTable,
    types: HashMap<NodeId, Type>,
    values: HashMap<NodeId, ConstValue>,
    diags: Vec<RawDiagnostic>,
    file: usize,
    imports: Vec<HashMap<String, String>>,
    package: HashMap<String, usize>,
    globals: Vec<Global>,
    methods: HashMap<String, Vec<NodeId>>,
    scopes: Vec<HashMap<String, Obj>>,
    results: Option<Vec<Type>>,
    named_results: bool,
    iota: Option<i128>,
    error_type: NamedId,
    std_objs: HashMap<String, Obj>,
    std_named: HashMap<String, NamedId>,
    /// Parsed standard-library signatures
    scratch: Forest,
    /// Type expressions currently come from `scratch`
    std_mode: bool,
}

impl<'f> Checker<'f> {
    fn new(forest: &'f Forest) -> Self {
        let mut table = TypeTable::new();
        let error_type = table.add_named("error");
        table.named_mut(error_type).underlying = Type::Interface;
        let mut checker = Checker {
            forest,
            table,
            types: HashMap::new(),
            values: HashMap::new(),
            diags: Vec::new(),
            file: 0,
            imports: Vec::new(),
            package: HashMap::new(),
            globals: Vec::new(),
            methods: HashMap::new(),
            scopes: Vec::new(),
            results: None,
            named_results: false,
            iota: None,
            error_type,
            std_objs: HashMap::new(),
            std_named: HashMap::new(),
            scratch: Forest::new(),
            std_mode: false,
        };
        checker.std_named.insert("error".to_owned(), error_type);
        checker.add_std_methods(error_type, "error");
        checker
    }

    fn finish(mut self) -> (TypeInfo, Vec<RawDiagnostic>) {
        self.diags.sort_by(|a, b| (a.file, a.offset).cmp(&(b.file, b.offset)));
        self.diags.dedup();
        let info = TypeInfo {
            types: self.types,
            values: self.values,
            table: self.table,
            revision: self.forest.revision(),
        };
        (info, self.diags)
    }

    fn run(&mut self, files: &[NodeId]) {
        let forest = self.forest;
        self.collect(files);
        for i in 0..self.globals.len() {
            self.resolve_global(i);
        }
        for (fi, &root) in files.iter().enumerate() {
            self.file = fi;
            let NodeKind::File { decls, .. } = forest.kind(root) else {
                continue;
            };
            for &d in decls {
                if let NodeKind::FuncDecl {
                    recv,
                    ty,
                    body: Some(body),
                    ..
                } = forest.kind(d)
                {
                    let shape = self.signature(*ty);
                    let recv = recv.and_then(|r| self.receiver(r));
                    self.func_body(&shape, recv, *body);
                }
            }
        }
    }

    // -- Diagnostics and recording --

    pub(crate) fn error(&mut self, at: NodeId, message: impl Into<String>) {
        if self.std_mode {
            return;
        }
        let span = self.forest.span(at);
        let offset = if span.is_synthetic() { 0 } else { span.start };
        self.error_at(offset, message);
    }

    pub(crate) fn error_at(&mut self, offset: u32, message: impl Into<String>) {
        if self.std_mode {
            return;
        }
        self.diags.push(RawDiagnostic {
            file: self.file,
            offset,
            message: message.into(),
        });
    }

    pub(crate) fn text(&self, id: NodeId) -> String {
        if self.std_mode {
            return print_expr(&self.scratch, id);
        }
        print_expr(self.forest, id)
    }

    pub(crate) fn type_string(&self, t: &Type) -> String {
        self.table.type_string(t)
    }

    /// Kind of `id` from whichever forest type expressions are read from.
    fn src_kind(&self, id: NodeId) -> NodeKind {
        if self.std_mode {
            self.scratch.kind(id).clone()
        } else {
            self.forest.kind(id).clone()
        }
    }

    // -- Scopes --

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub(crate) fn declare(&mut self, name: &str, obj: Obj, at: NodeId) {
        if name == "_" {
            return;
        }
        let dup = match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.to_owned(), obj).is_some(),
            None => false,
        };
        if dup {
            self.error(at, format!("{} redeclared in this block", name));
        }
    }

    /// Innermost binding of `name`: locals, then file imports, then the
    /// package, then the universe.
    pub(crate) fn lookup(&mut self, name: &str) -> Option<Obj> {
        for scope in self.scopes.iter().rev() {
            if let Some(obj) = scope.get(name) {
                return Some(obj.clone());
            }
        }
        if let Some(path) = self.imports.get(self.file).and_then(|m| m.get(name)) {
            return Some(Obj::Package(path.clone()));
        }
        if let Some(&g) = self.package.get(name) {
            return Some(self.resolve_global(g));
        }
        self.universe(name)
    }

    fn universe(&self, name: &str) -> Option<Obj> {
        if let Some(kind) = universe::basic_type(name) {
            return Some(Obj::TypeName(Type::Basic(kind)));
        }
        if let Some(b) = universe::builtin(name) {
            return Some(Obj::Builtin(b));
        }
        Some(match name {
            "error" => Obj::TypeName(Type::Named(self.error_type)),
            "any" => Obj::TypeName(Type::Interface),
            "true" => Obj::Const(Type::Basic(BasicKind::UntypedBool), ConstValue::Bool(true)),
            "false" => Obj::Const(Type::Basic(BasicKind::UntypedBool), ConstValue::Bool(false)),
            "nil" => Obj::Nil,
            "iota" if self.iota.is_some() => Obj::Iota,
            _ => return None,
        })
    }

    // -- Package-level declarations --

    fn collect(&mut self, files: &[NodeId]) {
        let forest = self.forest;
        for (fi, &root) in files.iter().enumerate() {
            self.file = fi;
            let mut imports = HashMap::new();
            let decls = match forest.kind(root) {
                NodeKind::File { decls, .. } => decls.clone(),
                _ => Vec::new(),
            };
            for d in decls {
                match forest.kind(d) {
                    NodeKind::FuncDecl {
                        recv: Some(recv),
                        ..
                    } => {
                        if let Some(base) = receiver_base(forest, *recv) {
                            self.methods.entry(base).or_default().push(d);
                        }
                    }
                    NodeKind::FuncDecl { name, .. } => {
                        if name != "init" {
                            self.add_global(name.clone(), GlobalDecl::Func(d), d);
                        }
                    }
                    NodeKind::GenDecl { keyword, specs, .. } => {
                        self.collect_gen_decl(*keyword, specs, &mut imports);
                    }
                    _ => {}
                }
            }
            self.imports.push(imports);
        }
    }

    fn collect_gen_decl(
        &mut self,
        keyword: DeclKeyword,
        specs: &[NodeId],
        imports: &mut HashMap<String, String>,
    ) {
        let forest = self.forest;
        let mut source = None;
        for (i, &spec) in specs.iter().enumerate() {
            match forest.kind(spec) {
                NodeKind::ImportSpec { alias, path } => {
                    let path = ConstValue::parse_string(path).unwrap_or_default();
                    let name = match alias.as_deref() {
                        Some("_") | Some(".") => continue,
                        Some(a) => a.to_owned(),
                        None => universe::package_name(&path).to_owned(),
                    };
                    imports.insert(name, path);
                }
                NodeKind::ValueSpec { names, values, .. } => {
                    if keyword == DeclKeyword::Const && !values.is_empty() {
                        source = Some(spec);
                    }
                    for name in names {
                        let decl = match keyword {
                            DeclKeyword::Const => GlobalDecl::Const {
                                spec,
                                source: source.unwrap_or(spec),
                                iota: i as i128,
                            },
                            _ => GlobalDecl::Var(spec),
                        };
                        self.add_global(name.clone(), decl, spec);
                    }
                }
                NodeKind::TypeSpec { name, .. } => {
                    self.add_global(name.clone(), GlobalDecl::Type(spec), spec);
                }
                _ => {}
            }
        }
    }

    fn add_global(&mut self, name: String, decl: GlobalDecl, at: NodeId) {
        if name == "_" {
            return;
        }
        if self.package.contains_key(&name) {
            self.error(at, format!("{} redeclared in this block", name));
            return;
        }
        self.package.insert(name.clone(), self.globals.len());
        self.globals.push(Global {
            name,
            file: self.file,
            decl,
            state: State::Pending,
        });
    }

    fn resolve_global(&mut self, i: usize) -> Obj {
        match &self.globals[i].state {
            State::Done(obj) => return obj.clone(),
            State::Active => {
                let name = self.globals[i].name.clone();
                let at = self.global_node(i);
                let saved = std::mem::replace(&mut self.file, self.globals[i].file);
                self.error(at, format!("initialization cycle: {} refers to itself", name));
                self.file = saved;
                return Obj::Invalid;
            }
            State::Pending => {}
        }
        self.globals[i].state = State::Active;

        let saved_scopes = std::mem::take(&mut self.scopes);
        let saved_file = std::mem::replace(&mut self.file, self.globals[i].file);
        let saved_results = self.results.take();
        let saved_iota = self.iota.take();
        self.push_scope();

        let forest = self.forest;
        let obj = match self.globals[i].decl.clone() {
            GlobalDecl::Func(d) => match forest.kind(d) {
                NodeKind::FuncDecl { ty, .. } => {
                    let shape = self.signature(*ty);
                    Obj::Func(Type::Func(Box::new(shape.sig)))
                }
                _ => Obj::Invalid,
            },
            GlobalDecl::Var(spec) => self.resolve_var_spec(i, spec),
            GlobalDecl::Const { spec, source, iota } => {
                let objs = self.const_spec(spec, source, iota);
                let name = self.globals[i].name.clone();
                objs.into_iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, o)| o)
                    .unwrap_or(Obj::Invalid)
            }
            GlobalDecl::Type(spec) => self.resolve_type_spec(i, spec),
        };

        self.scopes = saved_scopes;
        self.file = saved_file;
        self.results = saved_results;
        self.iota = saved_iota;
        self.globals[i].state = State::Done(obj.clone());
        obj
    }

    fn global_node(&self, i: usize) -> NodeId {
        match self.globals[i].decl {
            GlobalDecl::Func(d) | GlobalDecl::Var(d) | GlobalDecl::Type(d) => d,
            GlobalDecl::Const { spec, .. } => spec,
        }
    }

    /// All names of a `var` spec are typed together; siblings are marked
    /// done so a multi-value initializer is checked once.
    fn resolve_var_spec(&mut self, i: usize, spec: NodeId) -> Obj {
        let NodeKind::ValueSpec { names, ty, values } = self.forest.kind(spec).clone() else {
            return Obj::Invalid;
        };
        let declared = ty.map(|t| self.typ(t));
        let types = self.init_vars(names.len(), declared, &values, spec);
        let mut own = Obj::Invalid;
        for (name, t) in names.iter().zip(types) {
            let obj = Obj::Var(t);
            if *name == self.globals[i].name {
                own = obj.clone();
            }
            if let Some(&g) = self.package.get(name) {
                if g != i && matches!(self.globals[g].decl, GlobalDecl::Var(s) if s == spec) {
                    self.globals[g].state = State::Done(obj);
                }
            }
        }
        own
    }

    fn resolve_type_spec(&mut self, i: usize, spec: NodeId) -> Obj {
        let NodeKind::TypeSpec { name, alias, ty } = self.forest.kind(spec).clone() else {
            return Obj::Invalid;
        };
        if alias {
            return Obj::TypeName(self.typ(ty));
        }
        let id = self.table.add_named(name.clone());
        // visible before the underlying type resolves, for recursive types
        self.globals[i].state = State::Done(Obj::TypeName(Type::Named(id)));
        self.define_named(id, ty);
        self.attach_methods(id, &name);
        Obj::TypeName(Type::Named(id))
    }

    pub(crate) fn define_named(&mut self, id: NamedId, ty: NodeId) {
        let t = self.typ(ty);
        let under = self.table.underlying(&t).clone();
        self.table.named_mut(id).underlying = under;
    }

    fn attach_methods(&mut self, id: NamedId, type_name: &str) {
        let decls = self.methods.get(type_name).cloned().unwrap_or_default();
        for d in decls {
            let NodeKind::FuncDecl { name, ty, .. } = self.forest.kind(d).clone() else {
                continue;
            };
            let shape = self.signature(ty);
            let dup = self.table.named(id).methods.iter().any(|m| m.name == name);
            if dup {
                self.error(d, format!("method {}.{} already declared", type_name, name));
                continue;
            }
            self.table.named_mut(id).methods.push(types::Method {
                name,
                sig: shape.sig,
                decl: Some(d),
            });
        }
    }

    fn receiver(&mut self, recv: NodeId) -> Option<(String, Type)> {
        let NodeKind::FieldList { fields } = self.forest.kind(recv) else {
            return None;
        };
        let NodeKind::Field { names, ty } = self.forest.kind(*fields.first()?).clone() else {
            return None;
        };
        let t = self.typ(ty);
        Some((names.into_iter().next().unwrap_or_else(|| "_".to_owned()), t))
    }

    // -- Type expressions --

    /// Resolve a type expression.
    pub(crate) fn typ(&mut self, id: NodeId) -> Type {
        match self.src_kind(id) {
            NodeKind::Ident { name } => {
                let obj = if self.std_mode {
                    self.universe(&name)
                } else {
                    self.lookup(&name)
                };
                match obj {
                    Some(Obj::TypeName(t)) => t,
                    Some(Obj::Invalid) => Type::Invalid,
                    Some(_) => {
                        self.error(id, format!("{} is not a type", name));
                        Type::Invalid
                    }
                    None => {
                        self.error(id, format!("undefined: {}", name));
                        Type::Invalid
                    }
                }
            }
            NodeKind::Selector { x, sel } => {
                let pkg = match self.src_kind(x) {
                    NodeKind::Ident { name } => name,
                    _ => {
                        self.error(id, format!("{} is not a type", self.text(id)));
                        return Type::Invalid;
                    }
                };
                let path = if self.std_mode {
                    Some(pkg.clone())
                } else {
                    match self.lookup(&pkg) {
                        Some(Obj::Package(path)) => Some(path),
                        _ => None,
                    }
                };
                match path {
                    Some(path) => match self.std_member(&path, &sel, id) {
                        Obj::TypeName(t) => t,
                        Obj::Invalid => Type::Invalid,
                        _ => {
                            self.error(id, format!("{}.{} is not a type", pkg, sel));
                            Type::Invalid
                        }
                    },
                    None => {
                        self.error(id, format!("undefined: {}", pkg));
                        Type::Invalid
                    }
                }
            }
            NodeKind::Paren { x } => self.typ(x),
            NodeKind::Star { x } => Type::Pointer(Box::new(self.typ(x))),
            NodeKind::ArrayType { len: None, elt } => Type::Slice(Box::new(self.typ(elt))),
            NodeKind::ArrayType { len: Some(len), elt } => {
                if matches!(self.src_kind(len), NodeKind::Ellipsis { .. }) {
                    self.error(len, "invalid use of [...] array (outside a composite literal)");
                    self.typ(elt);
                    return Type::Invalid;
                }
                let n = self.array_len(len);
                let elem = self.typ(elt);
                match n {
                    Some(n) => Type::Array(n, Box::new(elem)),
                    None => Type::Invalid,
                }
            }
            NodeKind::MapType { key, value } => {
                let k = self.typ(key);
                let v = self.typ(value);
                if !k.is_invalid() && !self.table.is_comparable(&k) {
                    self.error(key, format!("invalid map key type {}", self.type_string(&k)));
                }
                Type::Map(Box::new(k), Box::new(v))
            }
            NodeKind::ChanType { dir, elt } => Type::Chan(dir, Box::new(self.typ(elt))),
            NodeKind::FuncType { .. } => Type::Func(Box::new(self.signature(id).sig)),
            NodeKind::StructType { fields } => Type::Struct(self.struct_fields(fields)),
            NodeKind::InterfaceType => Type::Interface,
            _ => {
                self.error(id, format!("{} is not a type", self.text(id)));
                Type::Invalid
            }
        }
    }

    fn array_len(&mut self, len: NodeId) -> Option<i64> {
        let op = self.expr(len);
        if op.is_invalid() {
            return None;
        }
        match op.constant().and_then(ConstValue::as_int) {
            Some(n) if n >= 0 && n <= i64::MAX as i128 => Some(n as i64),
            Some(_) => {
                self.error(len, format!("invalid array length {}", self.text(len)));
                None
            }
            None => {
                self.error(len, format!("array length {} must be constant", self.describe(&op)));
                None
            }
        }
    }

    fn struct_fields(&mut self, list: NodeId) -> Vec<StructField> {
        let NodeKind::FieldList { fields } = self.src_kind(list) else {
            return Vec::new();
        };
        let mut out: Vec<StructField> = Vec::new();
        for field in fields {
            let NodeKind::Field { names, ty } = self.src_kind(field) else {
                continue;
            };
            let t = self.typ(ty);
            if names.is_empty() {
                let name = self.embedded_name(ty);
                out.push(StructField {
                    name,
                    ty: t,
                    embedded: true,
                });
                continue;
            }
            for name in names {
                if name != "_" && out.iter().any(|f| f.name == name) {
                    self.error(field, format!("{} redeclared", name));
                }
                out.push(StructField {
                    name,
                    ty: t.clone(),
                    embedded: false,
                });
            }
        }
        out
    }

    fn embedded_name(&self, ty: NodeId) -> String {
        match self.src_kind(ty) {
            NodeKind::Ident { name } => name,
            NodeKind::Selector { sel, .. } => sel,
            NodeKind::Star { x } => self.embedded_name(x),
            _ => String::new(),
        }
    }

    pub(crate) fn signature(&mut self, func_type: NodeId) -> FuncShape {
        let (params, results) = match self.src_kind(func_type) {
            NodeKind::FuncType { params, results } => (params, results),
            _ => {
                return FuncShape {
                    sig: Signature {
                        params: Vec::new(),
                        results: Vec::new(),
                        variadic: false,
                    },
                    params: Vec::new(),
                    results: Vec::new(),
                }
            }
        };
        let mut variadic = false;
        let param_fields = self.field_entries(params, Some(&mut variadic));
        let result_fields = match results {
            Some(r) => self.field_entries(r, None),
            None => Vec::new(),
        };
        FuncShape {
            sig: Signature {
                params: param_fields.iter().map(|(_, t)| t.clone()).collect(),
                results: result_fields.iter().map(|(_, t)| t.clone()).collect(),
                variadic,
            },
            params: param_fields,
            results: result_fields,
        }
    }

    fn field_entries(
        &mut self,
        list: NodeId,
        mut variadic: Option<&mut bool>,
    ) -> Vec<(Option<String>, Type)> {
        let NodeKind::FieldList { fields } = self.src_kind(list) else {
            return Vec::new();
        };
        let count = fields.len();
        let mut out = Vec::new();
        for (i, field) in fields.into_iter().enumerate() {
            let NodeKind::Field { names, ty } = self.src_kind(field) else {
                continue;
            };
            let t = match (self.src_kind(ty), variadic.as_deref_mut()) {
                (NodeKind::Ellipsis { elt: Some(elt) }, Some(flag)) => {
                    if i + 1 != count || names.len() > 1 {
                        self.error(ty, "can only use ... with final parameter in list");
                    }
                    *flag = true;
                    Type::Slice(Box::new(self.typ(elt)))
                }
                _ => self.typ(ty),
            };
            if names.is_empty() {
                out.push((None, t));
            } else {
                for name in names {
                    out.push((Some(name), t.clone()));
                }
            }
        }
        out
    }

    // -- Standard library --

    /// Member `name` of the package imported from `path`.
    pub(crate) fn std_member(&mut self, path: &str, name: &str, at: NodeId) -> Obj {
        if !universe::is_std_package(path) {
            return Obj::Invalid;
        }
        let key = format!("{}.{}", path, name);
        if let Some(obj) = self.std_objs.get(&key) {
            return obj.clone();
        }
        let Some((kind, text)) = universe::std_member(path, name) else {
            self.error(
                at,
                format!("undefined: {}.{}", universe::package_name(path), name),
            );
            return Obj::Invalid;
        };
        let obj = match kind {
            MemberKind::Func => Obj::Func(self.std_type_text(text)),
            MemberKind::Var => Obj::Var(self.std_type_text(text)),
            MemberKind::Const => self.std_const(text),
            MemberKind::Type => Obj::TypeName(Type::Named(self.std_named_type(path, name))),
        };
        self.std_objs.insert(key, obj.clone());
        obj
    }

    fn std_type_text(&mut self, text: &str) -> Type {
        let Ok(id) = parser::parse_type(text, &mut self.scratch) else {
            return Type::Invalid;
        };
        let saved = std::mem::replace(&mut self.std_mode, true);
        let t = self.typ(id);
        self.std_mode = saved;
        t
    }

    fn std_const(&mut self, text: &str) -> Obj {
        let (ty, expr) = match text.split_once(" = ") {
            Some((ty, expr)) => (Some(self.std_type_text(ty)), expr),
            None => (None, text),
        };
        let value = parser::parse_expr(expr, &mut self.scratch)
            .ok()
            .and_then(|id| universe::fold_const(&self.scratch, id));
        match (ty, value) {
            (Some(t), Some(v)) => Obj::Const(t, v),
            (None, Some(v @ ConstValue::Float(_))) => {
                Obj::Const(Type::Basic(BasicKind::UntypedFloat), v)
            }
            (None, Some(v)) => Obj::Const(Type::Basic(BasicKind::UntypedInt), v),
            _ => Obj::Invalid,
        }
    }

    fn std_named_type(&mut self, path: &str, name: &str) -> NamedId {
        let qualified = format!("{}.{}", universe::package_name(path), name);
        if let Some(&id) = self.std_named.get(&qualified) {
            return id;
        }
        let id = self.table.add_named(qualified.clone());
        self.std_named.insert(qualified.clone(), id);
        if let Some((MemberKind::Type, text)) = universe::std_member(path, name) {
            let t = self.std_type_text(text);
            self.table.named_mut(id).underlying = t;
        }
        self.add_std_methods(id, &qualified);
        id
    }

    fn add_std_methods(&mut self, id: NamedId, qualified: &str) {
        for (name, text) in universe::std_methods(qualified) {
            if let Type::Func(sig) = self.std_type_text(text) {
                self.table.named_mut(id).methods.push(types::Method {
                    name: (*name).to_owned(),
                    sig: *sig,
                    decl: None,
                });
            }
        }
    }
}

/// Type name a method receiver is declared on: `T` for `(t T)` or `(t *T)`.
fn receiver_base(forest: &Forest, recv: NodeId) -> Option<String> {
    let NodeKind::FieldList { fields } = forest.kind(recv) else {
        return None;
    };
    let NodeKind::Field { ty, .. } = forest.kind(*fields.first()?) else {
        return None;
    };
    let mut t = *ty;
    loop {
        match forest.kind(t) {
            NodeKind::Star { x } | NodeKind::Paren { x } => t = *x,
            NodeKind::Ident { name } => return Some(name.clone()),
            _ => return None,
        }
    }
}
