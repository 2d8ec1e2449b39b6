//! Statement checking, local declarations and termination analysis.

use super::expr::{Context, Mode, Operand};
use super::types::{BasicKind, Type};
use super::universe::Builtin;
use super::{Checker, FuncShape, Obj};
use crate::ast::{ChanDir, DeclKeyword, NodeId, NodeKind};

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

impl<'f> Checker<'f> {
    /// Check a function body with its parameters in scope.
    pub(crate) fn func_body(
        &mut self,
        shape: &FuncShape,
        recv: Option<(String, Type)>,
        body: NodeId,
    ) {
        let saved_results = self.results.replace(shape.results.iter().map(|(_, t)| t.clone()).collect());
        let saved_named = std::mem::replace(
            &mut self.named_results,
            shape.results.iter().any(|(n, _)| n.is_some()),
        );
        let saved_iota = self.iota.take();

        self.push_scope();
        if let Some((name, t)) = recv {
            self.declare(&name, Obj::Var(t), body);
        }
        for (name, t) in shape.params.iter().chain(&shape.results) {
            if let Some(name) = name {
                self.declare(name, Obj::Var(t.clone()), body);
            }
        }
        let stmts = match self.forest.kind(body) {
            NodeKind::Block { stmts } => stmts.clone(),
            _ => Vec::new(),
        };
        for &s in &stmts {
            self.stmt(s);
        }
        if !shape.results.is_empty() && !self.is_terminating_list(&stmts) {
            let end = self.forest.span(body).end;
            if end != u32::MAX {
                self.error_at(end.saturating_sub(1), "missing return");
            }
        }
        self.pop_scope();

        self.results = saved_results;
        self.named_results = saved_named;
        self.iota = saved_iota;
    }

    fn block(&mut self, id: NodeId) {
        let NodeKind::Block { stmts } = self.forest.kind(id).clone() else {
            self.stmt(id);
            return;
        };
        self.push_scope();
        for s in stmts {
            self.stmt(s);
        }
        self.pop_scope();
    }

    pub(crate) fn stmt(&mut self, id: NodeId) {
        match self.forest.kind(id).clone() {
            NodeKind::ExprStmt { x } => self.expr_stmt(x),
            NodeKind::Assign { lhs, op: ":=", rhs } => self.define(id, &lhs, &rhs),
            NodeKind::Assign { lhs, op: "=", rhs } => self.assign_stmt(id, &lhs, &rhs),
            NodeKind::Assign { lhs, op, rhs } => {
                let (Some(&l), Some(&r)) = (lhs.first(), rhs.first()) else {
                    return;
                };
                let bop = op.strip_suffix('=').unwrap_or(op);
                self.op_assign(id, l, bop, r);
            }
            NodeKind::IncDec { x, op } => {
                let v = self.expr(x);
                if v.is_invalid() {
                    return;
                }
                if !self.table.is_numeric(&v.ty) {
                    let msg = format!(
                        "invalid operation: {}{} (non-numeric type {})",
                        self.text(x),
                        op,
                        self.type_string(&v.ty)
                    );
                    self.error(id, msg);
                    return;
                }
                self.check_addressable(&v);
            }
            NodeKind::DeclStmt { decl } => self.local_decl(decl),
            NodeKind::Return { results } => self.return_stmt(id, &results),
            NodeKind::Block { .. } => self.block(id),
            NodeKind::If {
                init,
                cond,
                body,
                els,
            } => {
                self.push_scope();
                if let Some(init) = init {
                    self.stmt(init);
                }
                self.condition(cond, "if");
                self.block(body);
                if let Some(els) = els {
                    self.stmt(els);
                }
                self.pop_scope();
            }
            NodeKind::For {
                init,
                cond,
                post,
                body,
            } => {
                self.push_scope();
                if let Some(init) = init {
                    self.stmt(init);
                }
                if let Some(cond) = cond {
                    self.condition(cond, "for");
                }
                if let Some(post) = post {
                    self.stmt(post);
                }
                self.block(body);
                self.pop_scope();
            }
            NodeKind::Range {
                key,
                value,
                define,
                x,
                body,
            } => self.range_stmt(key, value, define, x, body),
            NodeKind::Switch { init, tag, clauses } => self.switch_stmt(init, tag, &clauses),
            NodeKind::Send { chan, value } => self.send_stmt(id, chan, value),
            NodeKind::Go { call } | NodeKind::Defer { call } => {
                let keyword = if matches!(self.forest.kind(id), NodeKind::Go { .. }) {
                    "go"
                } else {
                    "defer"
                };
                if !matches!(self.forest.kind(self.forest.unparen(call)), NodeKind::Call { .. }) {
                    self.error(call, format!("expression in {} must be function call", keyword));
                }
                self.raw_expr(call, None);
            }
            NodeKind::Labeled { stmt, .. } => self.stmt(stmt),
            NodeKind::CaseClause { body, .. } => {
                for s in body {
                    self.stmt(s);
                }
            }
            _ => {}
        }
    }

    fn expr_stmt(&mut self, x: NodeId) {
        let op = self.raw_expr(x, None);
        if op.is_invalid() || op.mode == Mode::NoValue {
            return;
        }
        let inner = self.forest.unparen(x);
        let used = match self.forest.kind(inner).clone() {
            NodeKind::Call { fun, .. } => !self.is_pure_callee(fun),
            NodeKind::Unary { op: "<-", .. } => true,
            _ => false,
        };
        if !used {
            let op = self.single_value(op);
            if !op.is_invalid() {
                let msg = format!("{} is not used", self.describe(&op));
                self.error(x, msg);
            }
        }
    }

    /// Conversions and value-only built-ins do nothing as statements.
    fn is_pure_callee(&mut self, fun: NodeId) -> bool {
        let fun = self.forest.unparen(fun);
        match self.forest.kind(fun).clone() {
            NodeKind::Ident { name } => matches!(
                self.lookup(&name),
                Some(Obj::TypeName(_))
                    | Some(Obj::Builtin(
                        Builtin::Len | Builtin::Cap | Builtin::Make | Builtin::New | Builtin::Append
                    ))
            ),
            NodeKind::ArrayType { .. } | NodeKind::MapType { .. } | NodeKind::ChanType { .. } => true,
            _ => false,
        }
    }

    fn check_addressable(&mut self, v: &Operand) -> bool {
        if matches!(v.mode, Mode::Variable | Mode::MapIndex) {
            return true;
        }
        let msg = format!(
            "cannot assign to {} (neither addressable nor a map index expression)",
            self.describe(v)
        );
        self.error(v.expr, msg);
        false
    }

    // ──────────────────────────────────────────────
    // Assignments
    // ──────────────────────────────────────────────

    /// Values for `n` destinations: one per expression, or the results of
    /// a single multi-value call or comma-ok expression.
    pub(crate) fn rhs_values(&mut self, n: usize, rhs: &[NodeId], at: NodeId) -> Option<Vec<Operand>> {
        if rhs.len() == n {
            return Some(rhs.iter().map(|&e| self.expr(e)).collect());
        }
        if let [only] = rhs {
            let op = self.raw_expr(*only, None);
            if op.is_invalid() {
                return None;
            }
            match (&op.mode, &op.ty) {
                (Mode::Value, Type::Tuple(list)) if list.len() == n => {
                    return Some(list.iter().map(|t| Operand::value(t.clone(), *only)).collect());
                }
                (Mode::CommaOk | Mode::MapIndex, _) if n == 2 => {
                    let value = Operand::value(op.ty.clone(), *only);
                    let ok = Operand::value(Type::Basic(BasicKind::UntypedBool), *only);
                    return Some(vec![value, ok]);
                }
                (Mode::Value, Type::Tuple(list)) => {
                    let msg = format!(
                        "assignment mismatch: {} but {} returns {}",
                        plural(n, "variable"),
                        self.text(*only),
                        plural(list.len(), "value")
                    );
                    self.error(at, msg);
                    return None;
                }
                _ => {}
            }
        } else {
            for &e in rhs {
                self.raw_expr(e, None);
            }
        }
        let msg = format!(
            "assignment mismatch: {} but {}",
            plural(n, "variable"),
            plural(rhs.len(), "value")
        );
        self.error(at, msg);
        None
    }

    fn define(&mut self, id: NodeId, lhs: &[NodeId], rhs: &[NodeId]) {
        let values = self.rhs_values(lhs.len(), rhs, id);
        let mut fresh = Vec::new();
        let mut any_new = false;
        for (i, &l) in lhs.iter().enumerate() {
            let Some(name) = self.forest.ident_name(l).map(str::to_owned) else {
                self.error(l, format!("non-name {} on left side of :=", self.text(l)));
                continue;
            };
            let existing = if name == "_" {
                None
            } else {
                self.scopes.last().and_then(|s| s.get(&name)).cloned()
            };
            let op = values.as_ref().and_then(|v| v.get(i)).cloned();
            match (existing, op) {
                (Some(Obj::Var(t)), Some(mut op)) => {
                    self.assign(&mut op, &t, Context::Assignment);
                    self.types.insert(l, t);
                }
                (Some(_), _) => {}
                (None, op) => {
                    if name != "_" {
                        any_new = true;
                    }
                    let t = match op {
                        Some(mut op) if !op.is_invalid() => {
                            if op.ty == Type::Basic(BasicKind::UntypedNil) {
                                self.error(op.expr, "use of untyped nil in assignment");
                                Type::Invalid
                            } else {
                                self.default_operand(&mut op);
                                op.ty
                            }
                        }
                        _ => Type::Invalid,
                    };
                    self.types.insert(l, t.clone());
                    fresh.push((name, t, l));
                }
            }
        }
        if !any_new {
            self.error(id, "no new variables on left side of :=");
        }
        for (name, t, at) in fresh {
            self.declare(&name, Obj::Var(t), at);
        }
    }

    fn assign_stmt(&mut self, id: NodeId, lhs: &[NodeId], rhs: &[NodeId]) {
        let targets: Vec<Option<Operand>> = lhs.iter().map(|&l| self.assign_target(l)).collect();
        let Some(values) = self.rhs_values(lhs.len(), rhs, id) else {
            return;
        };
        for (target, mut v) in targets.into_iter().zip(values) {
            match target {
                None => {
                    if v.ty == Type::Basic(BasicKind::UntypedNil) {
                        self.error(v.expr, "use of untyped nil in assignment");
                    } else {
                        self.default_operand(&mut v);
                    }
                }
                Some(t) if t.is_invalid() => {}
                Some(t) => {
                    if self.check_addressable(&t) {
                        self.assign(&mut v, &t.ty, Context::Assignment);
                    }
                }
            }
        }
    }

    /// Left-hand side of `=`; `None` for the blank identifier.
    fn assign_target(&mut self, l: NodeId) -> Option<Operand> {
        if self.forest.ident_name(l) == Some("_") {
            return None;
        }
        Some(self.expr(l))
    }

    fn op_assign(&mut self, id: NodeId, l: NodeId, op: &'static str, r: NodeId) {
        let a = self.expr(l);
        let b = self.expr(r);
        if a.is_invalid() || b.is_invalid() {
            return;
        }
        if !self.check_addressable(&a) {
            return;
        }
        let target = a.ty.clone();
        let mut result = self.binary_operands(id, op, a, b, true);
        if !result.is_invalid() {
            self.assign(&mut result, &target, Context::Assignment);
        }
    }

    // ──────────────────────────────────────────────
    // Declarations
    // ──────────────────────────────────────────────

    fn local_decl(&mut self, decl: NodeId) {
        let NodeKind::GenDecl { keyword, specs, .. } = self.forest.kind(decl).clone() else {
            return;
        };
        let mut source = None;
        for (i, spec) in specs.into_iter().enumerate() {
            match (keyword, self.forest.kind(spec).clone()) {
                (DeclKeyword::Var, NodeKind::ValueSpec { names, ty, values }) => {
                    let declared = ty.map(|t| self.typ(t));
                    let types = self.init_vars(names.len(), declared, &values, spec);
                    for (name, t) in names.iter().zip(types) {
                        self.declare(name, Obj::Var(t), spec);
                    }
                }
                (DeclKeyword::Const, NodeKind::ValueSpec { values, .. }) => {
                    if !values.is_empty() {
                        source = Some(spec);
                    }
                    let objs = self.const_spec(spec, source.unwrap_or(spec), i as i128);
                    for (name, obj) in objs {
                        self.declare(&name, obj, spec);
                    }
                }
                (DeclKeyword::Type, NodeKind::TypeSpec { name, alias, ty }) => {
                    if alias {
                        let t = self.typ(ty);
                        self.declare(&name, Obj::TypeName(t), spec);
                    } else {
                        let id = self.table.add_named(name.clone());
                        self.declare(&name, Obj::TypeName(Type::Named(id)), spec);
                        self.define_named(id, ty);
                    }
                }
                _ => {}
            }
        }
    }

    /// Types of the variables of a `var` spec (or `:=`-like initializer).
    pub(crate) fn init_vars(
        &mut self,
        n: usize,
        declared: Option<Type>,
        values: &[NodeId],
        at: NodeId,
    ) -> Vec<Type> {
        let fallback = declared.clone().unwrap_or(Type::Invalid);
        if values.is_empty() {
            return vec![fallback; n];
        }
        let Some(ops) = self.rhs_values(n, values, at) else {
            return vec![fallback; n];
        };
        ops.into_iter()
            .map(|mut op| match &declared {
                Some(t) => {
                    self.assign(&mut op, t, Context::VarDecl);
                    t.clone()
                }
                None if op.is_invalid() => Type::Invalid,
                None if op.ty == Type::Basic(BasicKind::UntypedNil) => {
                    self.error(op.expr, "use of untyped nil in variable declaration");
                    Type::Invalid
                }
                None => {
                    self.default_operand(&mut op);
                    op.ty
                }
            })
            .collect()
    }

    /// Objects of one `const` spec. A spec without values repeats the
    /// type and values of `source` with its own `iota`.
    pub(crate) fn const_spec(&mut self, spec: NodeId, source: NodeId, iota: i128) -> Vec<(String, Obj)> {
        let NodeKind::ValueSpec { names, .. } = self.forest.kind(spec).clone() else {
            return Vec::new();
        };
        let NodeKind::ValueSpec { ty, values, .. } = self.forest.kind(source).clone() else {
            return Vec::new();
        };
        let saved = self.iota.replace(iota);
        let declared = ty.map(|t| self.typ(t));
        let mut out = Vec::new();
        if values.len() != names.len() {
            let msg = if values.len() < names.len() {
                "missing init expr for const declaration"
            } else {
                "extra init expr"
            };
            self.error(spec, msg);
            for &v in &values {
                self.raw_expr(v, None);
            }
            out.extend(names.into_iter().map(|n| (n, Obj::Invalid)));
            self.iota = saved;
            return out;
        }
        for (name, &v) in names.into_iter().zip(&values) {
            let mut op = self.expr(v);
            if op.is_invalid() {
                out.push((name, Obj::Invalid));
                continue;
            }
            if op.constant().is_none() {
                let msg = format!("{} is not constant", self.describe(&op));
                self.error(v, msg);
                out.push((name, Obj::Invalid));
                continue;
            }
            if let Some(t) = &declared {
                if self.table.basic_of(t).is_none() && !t.is_invalid() {
                    self.error(v, format!("invalid constant type {}", self.type_string(t)));
                    out.push((name, Obj::Invalid));
                    continue;
                }
                if !self.assign(&mut op, t, Context::ConstDecl) {
                    out.push((name, Obj::Invalid));
                    continue;
                }
            }
            let obj = match op.constant() {
                Some(c) => Obj::Const(op.ty.clone(), c.clone()),
                None => Obj::Invalid,
            };
            out.push((name, obj));
        }
        self.iota = saved;
        out
    }

    // ──────────────────────────────────────────────
    // Control flow
    // ──────────────────────────────────────────────

    fn return_stmt(&mut self, id: NodeId, results: &[NodeId]) {
        let Some(expected) = self.results.clone() else {
            return;
        };
        if results.is_empty() {
            if !expected.is_empty() && !self.named_results {
                self.error(id, "not enough return values");
            }
            return;
        }
        let ops: Vec<Operand> = match results {
            [only] if expected.len() > 1 => {
                let op = self.raw_expr(*only, None);
                match &op.ty {
                    Type::Tuple(list) if op.mode == Mode::Value => {
                        list.iter().map(|t| Operand::value(t.clone(), *only)).collect()
                    }
                    _ => vec![self.single_value(op)],
                }
            }
            _ => results.iter().map(|&r| self.expr(r)).collect(),
        };
        if expected.is_empty() {
            self.error(results[0], "too many return values");
            return;
        }
        if ops.len() != expected.len() {
            let msg = if ops.len() < expected.len() {
                "not enough return values"
            } else {
                "too many return values"
            };
            self.error(id, msg);
            return;
        }
        for (mut op, t) in ops.into_iter().zip(&expected) {
            self.assign(&mut op, t, Context::Return);
        }
    }

    fn condition(&mut self, cond: NodeId, what: &str) {
        let mut op = self.expr(cond);
        if op.is_invalid() {
            return;
        }
        if !self.table.is_boolean(&op.ty) {
            self.error(cond, format!("non-boolean condition in {} statement", what));
            return;
        }
        self.default_operand(&mut op);
    }

    fn range_stmt(
        &mut self,
        key: Option<NodeId>,
        value: Option<NodeId>,
        define: bool,
        x: NodeId,
        body: NodeId,
    ) {
        self.push_scope();
        let mut op = self.expr(x);
        let int = Type::Basic(BasicKind::Int);
        let (kt, vt) = if op.is_invalid() {
            (Type::Invalid, Some(Type::Invalid))
        } else {
            let under = match self.table.underlying(&op.ty).clone() {
                Type::Pointer(p) => match self.table.underlying(&p).clone() {
                    a @ Type::Array(..) => a,
                    other => Type::Pointer(Box::new(other)),
                },
                other => other,
            };
            match under {
                Type::Basic(k) if k.is_string() => (int, Some(Type::Basic(BasicKind::Rune))),
                Type::Basic(k) if k.is_integer() => {
                    self.default_operand(&mut op);
                    (op.ty.clone(), None)
                }
                Type::Array(_, elem) | Type::Slice(elem) => (int, Some(*elem)),
                Type::Map(k, v) => (*k, Some(*v)),
                Type::Chan(ChanDir::Send, _) => {
                    let msg = format!(
                        "invalid operation: range {} receive from send-only channel",
                        self.describe(&op)
                    );
                    self.error(x, msg);
                    (Type::Invalid, Some(Type::Invalid))
                }
                Type::Chan(_, elem) => (*elem, None),
                _ => {
                    let msg = format!("cannot range over {}", self.describe(&op));
                    self.error(x, msg);
                    (Type::Invalid, Some(Type::Invalid))
                }
            }
        };
        if value.is_some() && vt.is_none() {
            let msg = format!("range over {} permits only one iteration variable", self.describe(&op));
            if let Some(v) = value {
                self.error(v, msg);
            }
        }
        let slots = [(key, kt), (value, vt.unwrap_or(Type::Invalid))];
        if define {
            let mut fresh = Vec::new();
            for (slot, t) in slots {
                let Some(slot) = slot else { continue };
                match self.forest.ident_name(slot).map(str::to_owned) {
                    Some(name) => {
                        self.types.insert(slot, t.clone());
                        fresh.push((name, t, slot));
                    }
                    None => self.error(slot, format!("non-name {} on left side of :=", self.text(slot))),
                }
            }
            for (name, t, at) in fresh {
                self.declare(&name, Obj::Var(t), at);
            }
        } else {
            for (slot, t) in slots {
                let Some(slot) = slot else { continue };
                if let Some(target) = self.assign_target(slot) {
                    if !target.is_invalid() && self.check_addressable(&target) {
                        let mut v = Operand::value(t, x);
                        self.assign(&mut v, &target.ty, Context::Assignment);
                    }
                }
            }
        }
        self.block(body);
        self.pop_scope();
    }

    fn switch_stmt(&mut self, init: Option<NodeId>, tag: Option<NodeId>, clauses: &[NodeId]) {
        self.push_scope();
        if let Some(init) = init {
            self.stmt(init);
        }
        let tag_op = tag.map(|t| {
            let mut op = self.expr(t);
            self.default_operand(&mut op);
            op
        });
        let mut seen_default = false;
        for &clause in clauses {
            let NodeKind::CaseClause { list, default, body } = self.forest.kind(clause).clone() else {
                continue;
            };
            if default {
                if seen_default {
                    self.error(clause, "multiple defaults in switch");
                }
                seen_default = true;
            }
            for e in list {
                self.case_value(e, tag_op.as_ref());
            }
            self.push_scope();
            for s in body {
                self.stmt(s);
            }
            self.pop_scope();
        }
        self.pop_scope();
    }

    fn case_value(&mut self, e: NodeId, tag: Option<&Operand>) {
        let mut v = self.expr(e);
        if v.is_invalid() {
            return;
        }
        let Some(tag) = tag else {
            if !self.table.is_boolean(&v.ty) {
                let msg = format!(
                    "invalid case {} in switch (mismatched types {} and bool)",
                    self.text(e),
                    self.type_string(&v.ty)
                );
                self.error(e, msg);
            } else {
                self.default_operand(&mut v);
            }
            return;
        };
        if tag.is_invalid() {
            return;
        }
        let mut t = tag.clone();
        if !self.match_types(&mut v, &mut t) {
            return;
        }
        if !(self.assignable(&v.ty, &t.ty) || self.assignable(&t.ty, &v.ty)) {
            let msg = format!(
                "invalid case {} in switch on {} (mismatched types {} and {})",
                self.text(e),
                self.text(t.expr),
                self.type_string(&v.ty),
                self.type_string(&t.ty)
            );
            self.error(e, msg);
        }
    }

    fn send_stmt(&mut self, id: NodeId, chan: NodeId, value: NodeId) {
        let c = self.expr(chan);
        let mut v = self.expr(value);
        if c.is_invalid() || v.is_invalid() {
            return;
        }
        match self.table.underlying(&c.ty).clone() {
            Type::Chan(ChanDir::Recv, _) => {
                let msg = format!(
                    "invalid operation: cannot send to receive-only channel {}",
                    self.describe(&c)
                );
                self.error(id, msg);
            }
            Type::Chan(_, elem) => {
                let chan = self.describe(&c);
                self.assign(&mut v, &elem, Context::Send { stmt: id, chan });
            }
            _ => {
                let msg = format!(
                    "invalid operation: cannot send to non-channel {}",
                    self.describe(&c)
                );
                self.error(id, msg);
            }
        }
    }

    // ──────────────────────────────────────────────
    // Terminating statements
    // ──────────────────────────────────────────────

    pub(crate) fn is_terminating_list(&self, stmts: &[NodeId]) -> bool {
        stmts
            .iter()
            .rev()
            .find(|&&s| !matches!(self.forest.kind(s), NodeKind::Empty))
            .is_some_and(|&s| self.is_terminating(s, None))
    }

    fn is_terminating(&self, id: NodeId, label: Option<&str>) -> bool {
        match self.forest.kind(id) {
            NodeKind::Return { .. } => true,
            NodeKind::Branch { keyword, .. } => keyword == "goto" || keyword == "fallthrough",
            NodeKind::ExprStmt { x } => match self.forest.kind(self.forest.unparen(*x)) {
                NodeKind::Call { fun, .. } => {
                    self.forest.ident_name(*fun) == Some("panic")
                        || matches!(self.forest.kind(*fun), NodeKind::Selector { sel, .. }
                            if matches!(sel.as_str(), "Exit" | "Fatal" | "Fatalf" | "Fatalln" | "Panic" | "Panicf"))
                }
                _ => false,
            },
            NodeKind::Block { stmts } => self.is_terminating_list(stmts),
            NodeKind::If { body, els, .. } => {
                els.is_some_and(|e| self.is_terminating(*body, None) && self.is_terminating(e, None))
            }
            NodeKind::For { cond: None, body, .. } => !self.has_break(*body, label, false),
            NodeKind::Switch { clauses, .. } => {
                let mut has_default = false;
                for &c in clauses {
                    let NodeKind::CaseClause { default, body, .. } = self.forest.kind(c) else {
                        return false;
                    };
                    has_default |= *default;
                    if !self.is_terminating_list(body) || body.iter().any(|&s| self.has_break(s, label, false)) {
                        return false;
                    }
                }
                has_default
            }
            NodeKind::Labeled { label: l, stmt } => self.is_terminating(*stmt, Some(l.as_str())),
            _ => false,
        }
    }

    /// Whether `id` contains a `break` that leaves the enclosing statement.
    /// Inside nested breakable statements only labeled breaks count.
    fn has_break(&self, id: NodeId, label: Option<&str>, nested: bool) -> bool {
        match self.forest.kind(id) {
            NodeKind::Branch { keyword, label: l } if keyword == "break" => match l {
                None => !nested,
                Some(l) => Some(l.as_str()) == label,
            },
            NodeKind::For { body, .. } | NodeKind::Range { body, .. } => self.has_break(*body, label, true),
            NodeKind::Switch { clauses, .. } => clauses.iter().any(|&c| self.has_break(c, label, true)),
            NodeKind::Block { stmts } | NodeKind::CaseClause { body: stmts, .. } => {
                stmts.iter().any(|&s| self.has_break(s, label, nested))
            }
            NodeKind::If { body, els, .. } => {
                self.has_break(*body, label, nested) || els.is_some_and(|e| self.has_break(e, label, nested))
            }
            NodeKind::Labeled { stmt, .. } => self.has_break(*stmt, label, nested),
            _ => false,
        }
    }
}
