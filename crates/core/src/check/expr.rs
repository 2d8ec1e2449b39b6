//! Expression checking: operands, untyped conversion, assignability,
//! calls and built-ins.

use super::constant::ConstValue;
use super::types::{default_type, BasicKind, Signature, Type};
use super::universe::Builtin;
use super::{Checker, Obj};
use crate::ast::{ChanDir, LitKind, NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Mode {
    Invalid,
    NoValue,
    Builtin(Builtin),
    TypeExpr,
    Constant(ConstValue),
    Variable,
    MapIndex,
    Value,
    /// Channel receive; may be used in a two-value assignment
    CommaOk,
}

#[derive(Debug, Clone)]
pub(crate) struct Operand {
    pub mode: Mode,
    pub ty: Type,
    pub expr: NodeId,
}

impl Operand {
    pub fn invalid(expr: NodeId) -> Self {
        Operand {
            mode: Mode::Invalid,
            ty: Type::Invalid,
            expr,
        }
    }

    pub fn value(ty: Type, expr: NodeId) -> Self {
        Operand {
            mode: Mode::Value,
            ty,
            expr,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.mode == Mode::Invalid
            || (self.ty.is_invalid() && !matches!(self.mode, Mode::Builtin(_)))
    }

    pub fn constant(&self) -> Option<&ConstValue> {
        match &self.mode {
            Mode::Constant(v) => Some(v),
            _ => None,
        }
    }
}

/// Where a value is being assigned; selects the diagnostic wording.
#[derive(Debug, Clone)]
pub(crate) enum Context {
    Argument,
    Assignment,
    VarDecl,
    ConstDecl,
    Return,
    MapIndex,
    /// `stmt` is the send statement, `chan` the described channel
    Send { stmt: NodeId, chan: String },
    Literal(&'static str),
}

/// Why an untyped value cannot take a type.
enum Unfit {
    Truncated,
    Overflows,
    Mismatch,
}

pub(crate) fn is_comparison(op: &str) -> bool {
    matches!(op, "==" | "!=" | "<" | "<=" | ">" | ">=")
}

impl<'f> Checker<'f> {
    // ──────────────────────────────────────────────
    // Entry points
    // ──────────────────────────────────────────────

    /// Check an expression. The result may be untyped, a type,
    /// multi-valued or a built-in.
    pub(crate) fn raw_expr(&mut self, id: NodeId, hint: Option<&Type>) -> Operand {
        let op = self.expr_kind(id, hint);
        self.record(&op);
        op
    }

    /// Check an expression that must denote a single value.
    pub(crate) fn expr(&mut self, id: NodeId) -> Operand {
        let op = self.raw_expr(id, None);
        self.single_value(op)
    }

    pub(crate) fn single_value(&mut self, op: Operand) -> Operand {
        let msg = match (&op.mode, &op.ty) {
            (Mode::Invalid, _) => return op,
            (Mode::TypeExpr, _) => format!("{} (type) is not an expression", self.text(op.expr)),
            (Mode::NoValue, _) => format!("{} (no value) used as value", self.text(op.expr)),
            (Mode::Builtin(_), _) => format!("{} (built-in) must be called", self.text(op.expr)),
            (_, Type::Tuple(_)) => format!(
                "multiple-value {} (value of type {}) in single-value context",
                self.text(op.expr),
                self.type_string(&op.ty)
            ),
            _ => return op,
        };
        self.error(op.expr, msg);
        Operand::invalid(op.expr)
    }

    fn record(&mut self, op: &Operand) {
        if matches!(op.mode, Mode::Invalid | Mode::Builtin(_)) {
            return;
        }
        self.types.insert(op.expr, op.ty.clone());
        if let Mode::Constant(v) = &op.mode {
            self.values.insert(op.expr, v.clone());
        }
    }

    /// go/types operand description: `x (variable of type int)`.
    pub(crate) fn describe(&self, op: &Operand) -> String {
        let text = self.text(op.expr);
        let ts = self.type_string(&op.ty);
        let desc = match &op.mode {
            Mode::Invalid => "invalid operand".to_owned(),
            Mode::NoValue => "no value".to_owned(),
            Mode::Builtin(_) => "built-in".to_owned(),
            Mode::TypeExpr => "type".to_owned(),
            Mode::Constant(v) if op.ty.is_untyped() => {
                if text == v.to_string() {
                    format!("{} constant", ts)
                } else {
                    format!("{} constant {}", ts, v)
                }
            }
            Mode::Constant(v) => format!("constant {} of type {}", v, ts),
            _ if op.ty == Type::Basic(BasicKind::UntypedNil) => "untyped nil".to_owned(),
            Mode::Variable | Mode::MapIndex => format!("variable of type {}", ts),
            Mode::Value | Mode::CommaOk => format!("value of type {}", ts),
        };
        format!("{} ({})", text, desc)
    }

    fn obj_operand(&mut self, obj: Obj, id: NodeId, name: &str) -> Operand {
        let (mode, ty) = match obj {
            Obj::Var(t) => (Mode::Variable, t),
            Obj::Const(t, v) => (Mode::Constant(v), t),
            Obj::TypeName(t) => (Mode::TypeExpr, t),
            Obj::Func(t) => (Mode::Value, t),
            Obj::Builtin(b) => (Mode::Builtin(b), Type::Invalid),
            Obj::Nil => (Mode::Value, Type::Basic(BasicKind::UntypedNil)),
            Obj::Iota => (
                Mode::Constant(ConstValue::Int(self.iota.unwrap_or(0))),
                Type::Basic(BasicKind::UntypedInt),
            ),
            Obj::Package(_) => {
                self.error(id, format!("use of package {} without selector", name));
                return Operand::invalid(id);
            }
            Obj::Invalid => return Operand::invalid(id),
        };
        Operand { mode, ty, expr: id }
    }

    fn expr_kind(&mut self, id: NodeId, hint: Option<&Type>) -> Operand {
        match self.forest.kind(id).clone() {
            NodeKind::Ident { name } => {
                if name == "_" {
                    self.error(id, "cannot use _ as value");
                    return Operand::invalid(id);
                }
                match self.lookup(&name) {
                    Some(obj) => self.obj_operand(obj, id, &name),
                    None => {
                        self.error(id, format!("undefined: {}", name));
                        Operand::invalid(id)
                    }
                }
            }
            NodeKind::BasicLit { kind, value } => self.literal(id, kind, &value),
            NodeKind::CompositeLit { ty, elts, .. } => self.composite(id, ty, &elts, hint),
            NodeKind::FuncLit { ty, body } => {
                let shape = self.signature(ty);
                self.func_body(&shape, None, body);
                Operand::value(Type::Func(Box::new(shape.sig)), id)
            }
            NodeKind::Paren { x } => {
                let inner = self.raw_expr(x, hint);
                Operand { expr: id, ..inner }
            }
            NodeKind::Selector { x, sel } => self.selector(id, x, &sel),
            NodeKind::Index { x, index } => self.index_expr(id, x, index),
            NodeKind::Slice { x, low, high, max } => self.slice_expr(id, x, [low, high, max]),
            NodeKind::Call { fun, args, spread } => self.call(id, fun, &args, spread),
            NodeKind::Star { x } => {
                let base = self.raw_expr(x, None);
                match base.mode {
                    Mode::Invalid => Operand::invalid(id),
                    Mode::TypeExpr => Operand {
                        mode: Mode::TypeExpr,
                        ty: Type::Pointer(Box::new(base.ty)),
                        expr: id,
                    },
                    _ => {
                        let base = self.single_value(base);
                        if base.is_invalid() {
                            return Operand::invalid(id);
                        }
                        match self.table.underlying(&base.ty).clone() {
                            Type::Pointer(elem) => Operand {
                                mode: Mode::Variable,
                                ty: *elem,
                                expr: id,
                            },
                            _ => {
                                let msg = format!(
                                    "invalid operation: cannot indirect {}",
                                    self.describe(&base)
                                );
                                self.error(id, msg);
                                Operand::invalid(id)
                            }
                        }
                    }
                }
            }
            NodeKind::Unary { op, x } => self.unary(id, op, x),
            NodeKind::Binary { op, x, y } => {
                let a = self.expr(x);
                let b = self.expr(y);
                if a.is_invalid() || b.is_invalid() {
                    return Operand::invalid(id);
                }
                self.binary_operands(id, op, a, b, false)
            }
            NodeKind::ArrayType { .. }
            | NodeKind::MapType { .. }
            | NodeKind::ChanType { .. }
            | NodeKind::FuncType { .. }
            | NodeKind::StructType { .. }
            | NodeKind::InterfaceType => {
                let ty = self.typ(id);
                Operand {
                    mode: Mode::TypeExpr,
                    ty,
                    expr: id,
                }
            }
            _ => {
                self.error(id, format!("{} is not an expression", self.text(id)));
                Operand::invalid(id)
            }
        }
    }

    fn literal(&mut self, id: NodeId, kind: LitKind, raw: &str) -> Operand {
        let (value, basic) = match kind {
            LitKind::Int => (
                ConstValue::parse_int(raw).map(ConstValue::Int),
                BasicKind::UntypedInt,
            ),
            LitKind::Float => (
                ConstValue::parse_float(raw).map(ConstValue::Float),
                BasicKind::UntypedFloat,
            ),
            LitKind::Char => (
                ConstValue::parse_rune(raw).map(ConstValue::Int),
                BasicKind::UntypedRune,
            ),
            LitKind::Str => (
                ConstValue::parse_string(raw).map(ConstValue::Str),
                BasicKind::UntypedString,
            ),
        };
        match value {
            Some(v) => Operand {
                mode: Mode::Constant(v),
                ty: Type::Basic(basic),
                expr: id,
            },
            None => {
                self.error(id, format!("invalid literal {}", raw));
                Operand::invalid(id)
            }
        }
    }

    // ──────────────────────────────────────────────
    // Untyped values and assignability
    // ──────────────────────────────────────────────

    /// Type (and converted constant) an untyped operand takes in a
    /// context of type `target`.
    fn implicit_type(
        &self,
        op: &Operand,
        target: &Type,
    ) -> Result<(Type, Option<ConstValue>), Unfit> {
        let Some(kind) = op.ty.basic_kind() else {
            return Err(Unfit::Mismatch);
        };
        if target.is_invalid() {
            return Ok((Type::Invalid, None));
        }
        match self.table.underlying(target) {
            Type::Basic(tk) => {
                let compatible = (tk.is_numeric() && kind.is_numeric())
                    || (tk.is_string() && kind.is_string())
                    || (tk.is_boolean() && kind.is_boolean());
                if !compatible {
                    return Err(Unfit::Mismatch);
                }
                match op.constant() {
                    Some(v) => match v.represent(*tk) {
                        Some(nv) => Ok((target.clone(), Some(nv))),
                        None if tk.is_integer() && v.as_int().is_none() => Err(Unfit::Truncated),
                        None => Err(Unfit::Overflows),
                    },
                    None => Ok((target.clone(), None)),
                }
            }
            Type::Interface => {
                if kind == BasicKind::UntypedNil {
                    return Ok((target.clone(), None));
                }
                Ok((default_type(&op.ty), op.constant().cloned()))
            }
            Type::Pointer(_) | Type::Slice(_) | Type::Map(..) | Type::Chan(..) | Type::Func(_)
                if kind == BasicKind::UntypedNil =>
            {
                Ok((target.clone(), None))
            }
            _ => Err(Unfit::Mismatch),
        }
    }

    /// Give an untyped operand its final type and record it on the
    /// expression tree.
    pub(crate) fn set_untyped(&mut self, op: &mut Operand, ty: Type, value: Option<ConstValue>) {
        if let (Some(v), Mode::Constant(_)) = (value, &op.mode) {
            op.mode = Mode::Constant(v);
        }
        op.ty = ty.clone();
        self.update_untyped(op.expr, &ty);
        if let Mode::Constant(v) = &op.mode {
            self.values.insert(op.expr, v.clone());
        }
    }

    fn update_untyped(&mut self, id: NodeId, ty: &Type) {
        match self.types.get(&id) {
            Some(t) if t.is_untyped() => {}
            _ => return,
        }
        self.types.insert(id, ty.clone());
        match self.forest.kind(id).clone() {
            NodeKind::Paren { x } | NodeKind::Unary { x, .. } => self.update_untyped(x, ty),
            NodeKind::Binary { op, x, y } => {
                if is_comparison(op) {
                    return;
                }
                self.update_untyped(x, ty);
                if op != "<<" && op != ">>" {
                    self.update_untyped(y, ty);
                }
            }
            _ => {}
        }
    }

    /// Untyped operand in a context with no target type.
    pub(crate) fn default_operand(&mut self, op: &mut Operand) {
        if !op.ty.is_untyped() {
            return;
        }
        if op.ty == Type::Basic(BasicKind::UntypedNil) {
            return;
        }
        let t = default_type(&op.ty);
        let v = op.constant().and_then(|v| match t.basic_kind() {
            Some(k) => v.represent(k),
            None => Some(v.clone()),
        });
        self.set_untyped(op, t, v);
    }

    /// Check that `op` can be assigned to `target`, converting untyped
    /// values. Reports and returns false otherwise.
    pub(crate) fn assign(&mut self, op: &mut Operand, target: &Type, ctx: Context) -> bool {
        if op.is_invalid() || target.is_invalid() {
            return true;
        }
        if op.ty.is_untyped() {
            match self.implicit_type(op, target) {
                Ok((t, v)) => self.set_untyped(op, t, v),
                Err(Unfit::Truncated) => {
                    let msg = format!(
                        "{} truncated to {}",
                        self.describe(op),
                        self.type_string(target)
                    );
                    self.error(op.expr, msg);
                    return false;
                }
                Err(Unfit::Overflows) => {
                    let msg = format!(
                        "cannot use {} as {} value in {} (overflows)",
                        self.describe(op),
                        self.type_string(target),
                        ctx_words(&ctx)
                    );
                    self.error(op.expr, msg);
                    return false;
                }
                Err(Unfit::Mismatch) => {}
            }
        }
        if self.assignable(&op.ty, target) {
            return true;
        }
        self.assign_error(op, target, ctx);
        false
    }

    fn assign_error(&mut self, op: &Operand, target: &Type, ctx: Context) {
        let d = self.describe(op);
        let t = self.type_string(target);
        let (at, msg) = match ctx {
            Context::Argument => (
                op.expr,
                format!("cannot pass argument {} to parameter of type {}", d, t),
            ),
            Context::Return => (op.expr, format!("cannot return {} as value of type {}", d, t)),
            Context::Send { stmt, chan } => (stmt, format!("cannot send {} to channel {}", d, chan)),
            other => (
                op.expr,
                format!("cannot use {} as {} value in {}", d, t, ctx_words(&other)),
            ),
        };
        self.error(at, msg);
    }

    pub(crate) fn assignable(&self, v: &Type, t: &Type) -> bool {
        if v.is_invalid() || t.is_invalid() || self.table.identical(v, t) {
            return true;
        }
        let vu = self.table.underlying(v);
        let tu = self.table.underlying(t);
        if self.table.identical(vu, tu) && (!self.table.is_named(v) || !self.table.is_named(t)) {
            return true;
        }
        if let Type::Interface = tu {
            return *v != Type::Tuple(Vec::new()) && self.implements(v, t);
        }
        if *v == Type::Basic(BasicKind::UntypedNil) {
            return self.table.has_nil(t);
        }
        if let (Type::Chan(ChanDir::Both, e1), Type::Chan(_, e2)) = (vu, tu) {
            return self.table.identical(e1, e2)
                && (!self.table.is_named(v) || !self.table.is_named(t));
        }
        if let (Some(vk), Some(tk)) = (v.basic_kind(), tu.basic_kind()) {
            return vk.is_untyped()
                && ((vk.is_numeric() && tk.is_numeric())
                    || (vk.is_string() && tk.is_string())
                    || (vk.is_boolean() && tk.is_boolean()));
        }
        false
    }

    /// Method-set check against a named interface; `interface{}` accepts
    /// every value.
    fn implements(&self, v: &Type, iface: &Type) -> bool {
        let Type::Named(id) = iface else {
            return true;
        };
        if self.table.is_interface(v) {
            return true;
        }
        self.table
            .named(*id)
            .methods
            .iter()
            .all(|m| self.table.method(v, &m.name).is_some())
    }

    fn convertible(&self, v: &Type, t: &Type) -> bool {
        if self.assignable(v, t) {
            return true;
        }
        let vu = self.table.underlying(v);
        let tu = self.table.underlying(t);
        if self.table.identical(vu, tu) {
            return true;
        }
        if let (Type::Pointer(a), Type::Pointer(b)) = (vu, tu) {
            if self
                .table
                .identical(self.table.underlying(a), self.table.underlying(b))
            {
                return true;
            }
        }
        if self.table.is_numeric(v) && self.table.is_numeric(t) {
            return true;
        }
        let byte_or_rune_slice = |x: &Type| match self.table.underlying(x) {
            Type::Slice(e) => matches!(
                self.table.basic_of(e).map(BasicKind::canonical),
                Some(BasicKind::Uint8) | Some(BasicKind::Int32)
            ),
            _ => false,
        };
        if self.table.is_string(t) && (self.table.is_integer(v) || byte_or_rune_slice(v)) {
            return true;
        }
        self.table.is_string(v) && byte_or_rune_slice(t)
    }

    // ──────────────────────────────────────────────
    // Operators
    // ──────────────────────────────────────────────

    fn unary(&mut self, id: NodeId, op: &'static str, x: NodeId) -> Operand {
        if op == "&" {
            let inner = self.forest.unparen(x);
            let v = self.expr(x);
            if v.is_invalid() {
                return Operand::invalid(id);
            }
            let addressable = v.mode == Mode::Variable
                || matches!(self.forest.kind(inner), NodeKind::CompositeLit { .. });
            if !addressable {
                let msg = format!(
                    "invalid operation: cannot take address of {}",
                    self.describe(&v)
                );
                self.error(id, msg);
                return Operand::invalid(id);
            }
            return Operand::value(Type::Pointer(Box::new(v.ty)), id);
        }
        if op == "<-" {
            let v = self.expr(x);
            if v.is_invalid() {
                return Operand::invalid(id);
            }
            return match self.table.underlying(&v.ty).clone() {
                Type::Chan(ChanDir::Send, _) => {
                    let msg = format!(
                        "invalid operation: cannot receive from send-only channel {}",
                        self.describe(&v)
                    );
                    self.error(id, msg);
                    Operand::invalid(id)
                }
                Type::Chan(_, elem) => Operand {
                    mode: Mode::CommaOk,
                    ty: *elem,
                    expr: id,
                },
                _ => {
                    let msg = format!(
                        "invalid operation: cannot receive from non-channel {}",
                        self.describe(&v)
                    );
                    self.error(id, msg);
                    Operand::invalid(id)
                }
            };
        }

        let v = self.expr(x);
        if v.is_invalid() {
            return Operand::invalid(id);
        }
        let allowed = match op {
            "+" | "-" => self.table.is_numeric(&v.ty),
            "!" => self.table.is_boolean(&v.ty),
            "^" => self.table.is_integer(&v.ty),
            _ => false,
        };
        if !allowed {
            let msg = format!(
                "invalid operation: operator {} not defined on {}",
                op,
                self.describe(&v)
            );
            self.error(id, msg);
            return Operand::invalid(id);
        }
        if let Some(c) = v.constant() {
            let folded = match (op, self.table.basic_of(&v.ty)) {
                ("^", Some(k)) if k.is_unsigned() => match (c, k.int_range()) {
                    (ConstValue::Int(i), Some((_, max))) => Some(ConstValue::Int(!i & max)),
                    _ => None,
                },
                _ => ConstValue::unary(op, c),
            };
            if let Some(nv) = folded {
                return self.typed_constant(id, nv, v.ty);
            }
        }
        Operand::value(v.ty, id)
    }

    /// Constant result of type `ty`, checked for overflow when typed.
    fn typed_constant(&mut self, id: NodeId, value: ConstValue, ty: Type) -> Operand {
        if let Some(k) = self.table.basic_of(&ty).filter(|k| !k.is_untyped()) {
            match value.represent(k) {
                Some(v) => {
                    return Operand {
                        mode: Mode::Constant(v),
                        ty,
                        expr: id,
                    }
                }
                None => {
                    let msg = format!("constant {} overflows {}", value, self.type_string(&ty));
                    self.error(id, msg);
                    return Operand::invalid(id);
                }
            }
        }
        Operand {
            mode: Mode::Constant(value),
            ty,
            expr: id,
        }
    }

    /// Binary operation on checked operands. `op_assign` selects the
    /// `x op= y` wording for statements.
    pub(crate) fn binary_operands(
        &mut self,
        id: NodeId,
        op: &'static str,
        mut a: Operand,
        mut b: Operand,
        op_assign: bool,
    ) -> Operand {
        if op == "<<" || op == ">>" {
            return self.shift(id, op, a, b);
        }
        let nil = Type::Basic(BasicKind::UntypedNil);
        let against_nil = a.ty == nil || b.ty == nil;
        if !self.match_types(&mut a, &mut b) {
            return Operand::invalid(id);
        }
        if is_comparison(op) {
            return self.comparison(id, op, a, b, against_nil);
        }
        if !self.table.identical(&a.ty, &b.ty) {
            self.mismatch(id, op, &a, &b, op_assign);
            return Operand::invalid(id);
        }
        let defined = match op {
            "+" => self.table.is_numeric(&a.ty) || self.table.is_string(&a.ty),
            "-" | "*" | "/" => self.table.is_numeric(&a.ty),
            "%" | "&" | "|" | "^" | "&^" => self.table.is_integer(&a.ty),
            "&&" | "||" => self.table.is_boolean(&a.ty),
            _ => false,
        };
        if !defined {
            let msg = format!(
                "invalid operation: operator {} not defined on {}",
                op,
                self.describe(&a)
            );
            self.error(a.expr, msg);
            return Operand::invalid(id);
        }
        let integer = self.table.is_integer(&a.ty);
        if (op == "/" || op == "%")
            && b.constant().is_some_and(ConstValue::is_zero)
            && (integer || a.constant().is_some())
        {
            self.error(b.expr, "invalid operation: division by zero");
            return Operand::invalid(id);
        }
        if let (Some(x), Some(y)) = (a.constant(), b.constant()) {
            return match ConstValue::binary(op, x, y, integer) {
                Ok(v) => self.typed_constant(id, v, a.ty),
                Err(reason) => {
                    self.error(id, format!("invalid operation: {}", reason));
                    Operand::invalid(id)
                }
            };
        }
        Operand::value(a.ty, id)
    }

    fn mismatch(&mut self, id: NodeId, op: &str, a: &Operand, b: &Operand, op_assign: bool) {
        let text = if op_assign {
            format!("{} {}= {}", self.text(a.expr), op, self.text(b.expr))
        } else {
            self.text(id)
        };
        let msg = format!(
            "invalid operation: {} (mismatched types {} and {})",
            text,
            self.type_string(&a.ty),
            self.type_string(&b.ty)
        );
        self.error(id, msg);
    }

    /// Bring two operands to a common type where one (or both) is
    /// untyped. False means an error was reported.
    pub(crate) fn match_types(&mut self, a: &mut Operand, b: &mut Operand) -> bool {
        match (a.ty.is_untyped(), b.ty.is_untyped()) {
            (true, false) => {
                let target = b.ty.clone();
                self.implicit_for_binary(a, &target)
            }
            (false, true) => {
                let target = a.ty.clone();
                self.implicit_for_binary(b, &target)
            }
            (true, true) => {
                let (Some(ka), Some(kb)) = (a.ty.basic_kind(), b.ty.basic_kind()) else {
                    return true;
                };
                if ka.is_numeric() && kb.is_numeric() && ka != kb {
                    let k = if ka.untyped_rank() >= kb.untyped_rank() {
                        ka
                    } else {
                        kb
                    };
                    for op in [a, b] {
                        let v = op.constant().and_then(|v| v.represent(k));
                        self.set_untyped(op, Type::Basic(k), v);
                    }
                }
                true
            }
            (false, false) => true,
        }
    }

    fn implicit_for_binary(&mut self, x: &mut Operand, target: &Type) -> bool {
        match self.implicit_type(x, target) {
            Ok((t, v)) => {
                self.set_untyped(x, t, v);
                true
            }
            Err(Unfit::Truncated) => {
                let msg = format!(
                    "{} truncated to {}",
                    self.describe(x),
                    self.type_string(target)
                );
                self.error(x.expr, msg);
                false
            }
            Err(Unfit::Overflows) => {
                let msg = format!(
                    "cannot use {} as {} value in expression (overflows)",
                    self.describe(x),
                    self.type_string(target)
                );
                self.error(x.expr, msg);
                false
            }
            Err(Unfit::Mismatch) => true,
        }
    }

    fn comparison(
        &mut self,
        id: NodeId,
        op: &str,
        mut a: Operand,
        mut b: Operand,
        against_nil: bool,
    ) -> Operand {
        if !(self.assignable(&a.ty, &b.ty) || self.assignable(&b.ty, &a.ty)) {
            self.mismatch(id, op, &a, &b, false);
            return Operand::invalid(id);
        }
        let problem = if op == "==" || op == "!=" {
            let subject = &a.ty;
            match self.table.underlying(subject) {
                Type::Slice(_) | Type::Map(..) | Type::Func(_) if !against_nil => {
                    let what = match self.table.underlying(subject) {
                        Type::Slice(_) => "slice",
                        Type::Map(..) => "map",
                        _ => "func",
                    };
                    Some(format!("{} can only be compared to nil", what))
                }
                _ if !against_nil && !self.table.is_comparable(subject) => Some(format!(
                    "{} cannot be compared",
                    self.type_string(subject)
                )),
                _ => None,
            }
        } else if !self.table.is_ordered(&a.ty) {
            Some(format!(
                "operator {} not defined on {}",
                op,
                self.describe(&a)
            ))
        } else {
            None
        };
        if let Some(p) = problem {
            let msg = format!("invalid operation: {} ({})", self.text(id), p);
            self.error(id, msg);
            return Operand::invalid(id);
        }
        let result = match (a.constant(), b.constant()) {
            (Some(x), Some(y)) => ConstValue::compare(op, x, y).map(ConstValue::Bool),
            _ => None,
        };
        self.default_operand(&mut a);
        self.default_operand(&mut b);
        Operand {
            mode: result.map(Mode::Constant).unwrap_or(Mode::Value),
            ty: Type::Basic(BasicKind::UntypedBool),
            expr: id,
        }
    }

    fn shift(&mut self, id: NodeId, op: &str, mut a: Operand, mut b: Operand) -> Operand {
        // count
        let count = match b.constant() {
            Some(c) if b.ty.is_untyped() => match c.as_int() {
                Some(n) if n >= 0 => {
                    self.set_untyped(&mut b, Type::Basic(BasicKind::Uint), Some(ConstValue::Int(n)));
                    Some(n)
                }
                Some(_) => {
                    let msg = format!("invalid operation: negative shift count {}", self.describe(&b));
                    self.error(b.expr, msg);
                    return Operand::invalid(id);
                }
                None => {
                    let msg = format!(
                        "invalid operation: shift count {} must be integer",
                        self.describe(&b)
                    );
                    self.error(b.expr, msg);
                    return Operand::invalid(id);
                }
            },
            _ if !self.table.is_integer(&b.ty) => {
                let msg = format!(
                    "invalid operation: shift count {} must be integer",
                    self.describe(&b)
                );
                self.error(b.expr, msg);
                return Operand::invalid(id);
            }
            c => c.and_then(ConstValue::as_int),
        };

        // shifted operand
        if a.ty.is_untyped() {
            let Some(v) = a.constant().and_then(ConstValue::as_int) else {
                let msg = format!(
                    "invalid operation: shifted operand {} must be integer",
                    self.describe(&a)
                );
                self.error(a.expr, msg);
                return Operand::invalid(id);
            };
            let int = Type::Basic(BasicKind::UntypedInt);
            self.set_untyped(&mut a, int.clone(), Some(ConstValue::Int(v)));
            return match count.and_then(|n| u32::try_from(n).ok()) {
                Some(n) => match ConstValue::shift(op, &ConstValue::Int(v), n) {
                    Some(r) => Operand {
                        mode: Mode::Constant(r),
                        ty: int,
                        expr: id,
                    },
                    None => {
                        self.error(id, format!("constant shift overflow: {}", self.text(id)));
                        Operand::invalid(id)
                    }
                },
                None => {
                    self.set_untyped(&mut a, Type::Basic(BasicKind::Int), None);
                    Operand::value(Type::Basic(BasicKind::Int), id)
                }
            };
        }
        if !self.table.is_integer(&a.ty) {
            let msg = format!(
                "invalid operation: shifted operand {} must be integer",
                self.describe(&a)
            );
            self.error(a.expr, msg);
            return Operand::invalid(id);
        }
        if let (Some(x), Some(n)) = (a.constant().cloned(), count) {
            if let Some(r) = u32::try_from(n).ok().and_then(|n| ConstValue::shift(op, &x, n)) {
                return self.typed_constant(id, r, a.ty);
            }
        }
        Operand::value(a.ty, id)
    }

    // ──────────────────────────────────────────────
    // Selectors, indexing, slicing
    // ──────────────────────────────────────────────

    fn selector(&mut self, id: NodeId, x: NodeId, sel: &str) -> Operand {
        if let NodeKind::Ident { name } = self.forest.kind(x) {
            let name = name.clone();
            if let Some(Obj::Package(path)) = self.lookup(&name) {
                let obj = self.std_member(&path, sel, id);
                return self.obj_operand(obj, id, sel);
            }
        }
        let base = self.raw_expr(x, None);
        if base.mode == Mode::TypeExpr {
            // method expression: T.m
            let Some(m) = self.table.method(&base.ty, sel).cloned() else {
                let msg = format!(
                    "{}.{} undefined (type {} has no method {})",
                    self.text(x),
                    sel,
                    self.type_string(&base.ty),
                    sel
                );
                self.error(id, msg);
                return Operand::invalid(id);
            };
            let mut params = vec![base.ty.clone()];
            params.extend(m.sig.params);
            let sig = Signature {
                params,
                results: m.sig.results,
                variadic: m.sig.variadic,
            };
            return Operand::value(Type::Func(Box::new(sig)), id);
        }
        let base = self.single_value(base);
        if base.is_invalid() {
            return Operand::invalid(id);
        }
        match self.find_member(&base.ty, sel) {
            Some(Member::Field(ty, via_pointer)) => {
                let mode = if via_pointer || base.mode == Mode::Variable {
                    Mode::Variable
                } else {
                    Mode::Value
                };
                Operand { mode, ty, expr: id }
            }
            Some(Member::Method(sig)) => Operand::value(Type::Func(Box::new(sig)), id),
            None => {
                let msg = format!(
                    "{}.{} undefined (type {} has no field or method {})",
                    self.text(x),
                    sel,
                    self.type_string(&base.ty),
                    sel
                );
                self.error(id, msg);
                Operand::invalid(id)
            }
        }
    }

    fn find_member(&self, t: &Type, name: &str) -> Option<Member> {
        let (base, via_pointer) = match t {
            Type::Pointer(b) => (b.as_ref(), true),
            other => (other, false),
        };
        if let Some(m) = self.table.method(base, name) {
            return Some(Member::Method(m.sig.clone()));
        }
        let Type::Struct(fields) = self.table.underlying(base) else {
            return None;
        };
        if let Some(f) = fields.iter().find(|f| f.name == name) {
            return Some(Member::Field(f.ty.clone(), via_pointer));
        }
        fields
            .iter()
            .filter(|f| f.embedded)
            .find_map(|f| self.find_member(&f.ty, name))
            .map(|m| match m {
                Member::Field(t, p) => Member::Field(t, p || via_pointer),
                other => other,
            })
    }

    fn index_expr(&mut self, id: NodeId, x: NodeId, index: NodeId) -> Operand {
        let base = self.expr(x);
        if base.is_invalid() {
            self.raw_expr(index, None);
            return Operand::invalid(id);
        }
        let variable = base.mode == Mode::Variable;
        match self.table.underlying(&base.ty).clone() {
            Type::Basic(k) if k.is_string() => {
                self.index(index, None);
                Operand::value(Type::Basic(BasicKind::Byte), id)
            }
            Type::Array(n, elem) => {
                self.index(index, Some(n));
                Operand {
                    mode: if variable { Mode::Variable } else { Mode::Value },
                    ty: *elem,
                    expr: id,
                }
            }
            Type::Pointer(p) if matches!(self.table.underlying(&p), Type::Array(..)) => {
                let Type::Array(n, elem) = self.table.underlying(&p).clone() else {
                    return Operand::invalid(id);
                };
                self.index(index, Some(n));
                Operand {
                    mode: Mode::Variable,
                    ty: *elem,
                    expr: id,
                }
            }
            Type::Slice(elem) => {
                self.index(index, None);
                Operand {
                    mode: Mode::Variable,
                    ty: *elem,
                    expr: id,
                }
            }
            Type::Map(key, value) => {
                let mut k = self.expr(index);
                self.assign(&mut k, &key, Context::MapIndex);
                Operand {
                    mode: Mode::MapIndex,
                    ty: *value,
                    expr: id,
                }
            }
            _ => {
                let msg = format!("invalid operation: cannot index {}", self.describe(&base));
                self.error(id, msg);
                self.raw_expr(index, None);
                Operand::invalid(id)
            }
        }
    }

    /// Check an index, slice bound or size argument. Returns its value
    /// when constant.
    pub(crate) fn index(&mut self, id: NodeId, max: Option<i64>) -> Option<i128> {
        let mut x = self.expr(id);
        if x.is_invalid() {
            return None;
        }
        if x.ty.is_untyped() && x.constant().is_some() {
            let int = Type::Basic(BasicKind::Int);
            match self.implicit_type(&x, &int) {
                Ok((t, v)) => self.set_untyped(&mut x, t, v),
                Err(Unfit::Truncated) => {
                    let msg = format!("{} truncated to int", self.describe(&x));
                    self.error(id, msg);
                    return None;
                }
                Err(_) => {
                    let msg = format!("invalid argument: index {} must be integer", self.describe(&x));
                    self.error(id, msg);
                    return None;
                }
            }
        } else if !self.table.is_integer(&x.ty) {
            let msg = format!("invalid argument: index {} must be integer", self.describe(&x));
            self.error(id, msg);
            return None;
        }
        let v = x.constant().and_then(ConstValue::as_int)?;
        if v < 0 {
            let msg = format!(
                "invalid argument: index {} must not be negative",
                self.describe(&x)
            );
            self.error(id, msg);
            return None;
        }
        if let Some(max) = max {
            if v >= max as i128 {
                self.error(
                    id,
                    format!("invalid argument: index {} out of bounds [0:{}]", v, max),
                );
                return None;
            }
        }
        Some(v)
    }

    fn slice_expr(&mut self, id: NodeId, x: NodeId, bounds: [Option<NodeId>; 3]) -> Operand {
        let mut base = self.expr(x);
        if base.is_invalid() {
            for b in bounds.into_iter().flatten() {
                self.raw_expr(b, None);
            }
            return Operand::invalid(id);
        }
        let ty = match self.table.underlying(&base.ty).clone() {
            Type::Basic(k) if k.is_string() => {
                self.default_operand(&mut base);
                if bounds[2].is_some() {
                    self.error(id, "invalid operation: 3-index slice of string");
                }
                base.ty.clone()
            }
            Type::Array(_, elem) => Type::Slice(elem),
            Type::Pointer(p) => match self.table.underlying(&p).clone() {
                Type::Array(_, elem) => Type::Slice(elem),
                _ => Type::Invalid,
            },
            Type::Slice(_) => base.ty.clone(),
            _ => Type::Invalid,
        };
        if ty.is_invalid() {
            let msg = format!("cannot slice {}", self.describe(&base));
            self.error(id, msg);
        }
        for b in bounds.into_iter().flatten() {
            self.index(b, None);
        }
        if ty.is_invalid() {
            return Operand::invalid(id);
        }
        Operand::value(ty, id)
    }

    // ──────────────────────────────────────────────
    // Composite literals
    // ──────────────────────────────────────────────

    fn composite(
        &mut self,
        id: NodeId,
        ty: Option<NodeId>,
        elts: &[NodeId],
        hint: Option<&Type>,
    ) -> Operand {
        let t = match ty {
            Some(tn) => match self.forest.kind(tn).clone() {
                NodeKind::ArrayType {
                    len: Some(len),
                    elt,
                } if matches!(self.forest.kind(len), NodeKind::Ellipsis { .. }) => {
                    let elem = self.typ(elt);
                    Type::Array(elts.len() as i64, Box::new(elem))
                }
                _ => self.typ(tn),
            },
            None => match hint {
                Some(Type::Pointer(base)) => {
                    let inner = (**base).clone();
                    self.composite_elements(id, &inner, elts);
                    return Operand::value(Type::Pointer(Box::new(inner)), id);
                }
                Some(h) => h.clone(),
                None => {
                    self.error(id, "invalid composite literal type: missing type");
                    return Operand::invalid(id);
                }
            },
        };
        if !self.composite_elements(id, &t, elts) {
            return Operand::invalid(id);
        }
        Operand::value(t, id)
    }

    fn composite_elements(&mut self, id: NodeId, t: &Type, elts: &[NodeId]) -> bool {
        match self.table.underlying(t).clone() {
            Type::Struct(fields) => {
                let keyed = elts
                    .first()
                    .is_some_and(|e| matches!(self.forest.kind(*e), NodeKind::KeyValue { .. }));
                if keyed {
                    for &e in elts {
                        let NodeKind::KeyValue { key, value } = self.forest.kind(e).clone() else {
                            self.error(e, "mixture of field:value and value elements in struct literal");
                            continue;
                        };
                        let name = self.forest.ident_name(key).unwrap_or_default().to_owned();
                        match fields.iter().find(|f| f.name == name) {
                            Some(f) => {
                                let mut v = self.element(value, &f.ty);
                                self.assign(&mut v, &f.ty, Context::Literal("struct literal"));
                            }
                            None => {
                                let msg = format!(
                                    "unknown field {} in struct literal of type {}",
                                    name,
                                    self.type_string(t)
                                );
                                self.error(key, msg);
                                self.raw_expr(value, None);
                            }
                        }
                    }
                } else if !elts.is_empty() {
                    for (i, &e) in elts.iter().enumerate() {
                        let Some(f) = fields.get(i) else {
                            let msg =
                                format!("too many values in struct literal of type {}", self.type_string(t));
                            self.error(e, msg);
                            break;
                        };
                        let mut v = self.element(e, &f.ty);
                        self.assign(&mut v, &f.ty, Context::Literal("struct literal"));
                    }
                    if elts.len() < fields.len() {
                        let msg =
                            format!("too few values in struct literal of type {}", self.type_string(t));
                        self.error(id, msg);
                    }
                }
                true
            }
            Type::Array(_, elem) | Type::Slice(elem) => {
                for &e in elts {
                    let value = match self.forest.kind(e).clone() {
                        NodeKind::KeyValue { key, value } => {
                            self.index(key, None);
                            value
                        }
                        _ => e,
                    };
                    let mut v = self.element(value, &elem);
                    self.assign(&mut v, &elem, Context::Literal("array or slice literal"));
                }
                true
            }
            Type::Map(key_ty, value_ty) => {
                for &e in elts {
                    let NodeKind::KeyValue { key, value } = self.forest.kind(e).clone() else {
                        self.error(e, "missing key in map literal");
                        self.raw_expr(e, None);
                        continue;
                    };
                    let mut k = self.element(key, &key_ty);
                    self.assign(&mut k, &key_ty, Context::Literal("map literal"));
                    let mut v = self.element(value, &value_ty);
                    self.assign(&mut v, &value_ty, Context::Literal("map literal"));
                }
                true
            }
            Type::Invalid => {
                for &e in elts {
                    let value = match self.forest.kind(e) {
                        NodeKind::KeyValue { value, .. } => *value,
                        _ => e,
                    };
                    self.raw_expr(value, None);
                }
                false
            }
            _ => {
                let msg = format!("invalid composite literal type {}", self.type_string(t));
                self.error(id, msg);
                false
            }
        }
    }

    /// Element of a composite literal; elided literal types come from `elem`.
    fn element(&mut self, e: NodeId, elem: &Type) -> Operand {
        if matches!(self.forest.kind(e), NodeKind::CompositeLit { ty: None, .. }) {
            let op = self.raw_expr(e, Some(elem));
            return self.single_value(op);
        }
        self.expr(e)
    }

    // ──────────────────────────────────────────────
    // Calls
    // ──────────────────────────────────────────────

    fn call(&mut self, id: NodeId, fun: NodeId, args: &[NodeId], spread: bool) -> Operand {
        let f = self.raw_expr(fun, None);
        match &f.mode {
            Mode::Invalid => {
                for &a in args {
                    self.raw_expr(a, None);
                }
                return Operand::invalid(id);
            }
            Mode::TypeExpr => {
                let target = f.ty.clone();
                return match args {
                    [arg] if !spread => self.conversion(id, target, *arg),
                    [] => {
                        let msg = format!(
                            "missing argument in conversion to {}",
                            self.type_string(&target)
                        );
                        self.error(id, msg);
                        Operand::invalid(id)
                    }
                    _ => {
                        let msg = format!(
                            "too many arguments in conversion to {}",
                            self.type_string(&target)
                        );
                        self.error(args[args.len() - 1], msg);
                        Operand::invalid(id)
                    }
                };
            }
            Mode::Builtin(b) => return self.builtin_call(id, *b, args, spread),
            _ => {}
        }
        let f = self.single_value(f);
        if f.is_invalid() {
            return Operand::invalid(id);
        }
        let sig = match self.table.underlying(&f.ty) {
            Type::Func(sig) => (**sig).clone(),
            _ => {
                let msg = format!(
                    "invalid operation: cannot call non-function {}",
                    self.describe(&f)
                );
                self.error(id, msg);
                for &a in args {
                    self.raw_expr(a, None);
                }
                return Operand::invalid(id);
            }
        };
        self.arguments(id, fun, &sig, args, spread);
        match sig.results.len() {
            0 => Operand {
                mode: Mode::NoValue,
                ty: Type::Tuple(Vec::new()),
                expr: id,
            },
            1 => Operand::value(sig.results[0].clone(), id),
            _ => Operand::value(Type::Tuple(sig.results), id),
        }
    }

    fn arguments(&mut self, call: NodeId, fun: NodeId, sig: &Signature, args: &[NodeId], spread: bool) {
        let mut ops = Vec::new();
        match args {
            [only] if !spread => {
                let op = self.raw_expr(*only, None);
                match (&op.mode, &op.ty) {
                    (Mode::Value, Type::Tuple(list)) if list.len() > 1 => {
                        for t in list {
                            ops.push(Operand::value(t.clone(), *only));
                        }
                    }
                    _ => ops.push(self.single_value(op)),
                }
            }
            _ => {
                for &a in args {
                    ops.push(self.expr(a));
                }
            }
        }

        let n = sig.params.len();
        let fname = self.text(fun);
        if spread && !sig.variadic {
            let msg = format!("have (...) but function is not variadic: {}", fname);
            self.error(call, format!("cannot use ... in call to non-variadic {}: {}", fname, msg));
            return;
        }
        let too_few = if sig.variadic && !spread {
            ops.len() + 1 < n
        } else {
            ops.len() < n
        };
        let too_many = !(sig.variadic && !spread) && ops.len() > n;
        if too_few {
            self.error_at(
                self.forest.span(call).end.saturating_sub(1),
                format!("not enough arguments in call to {}", fname),
            );
            return;
        }
        if too_many {
            let at = ops[n].expr;
            self.error(at, format!("too many arguments in call to {}", fname));
            return;
        }
        for (i, mut op) in ops.into_iter().enumerate() {
            let target = if sig.variadic && !spread && i + 1 >= n {
                match &sig.params[n - 1] {
                    Type::Slice(elem) => (**elem).clone(),
                    other => other.clone(),
                }
            } else {
                sig.params[i].clone()
            };
            self.assign(&mut op, &target, Context::Argument);
        }
    }

    fn conversion(&mut self, id: NodeId, target: Type, arg: NodeId) -> Operand {
        let mut x = self.expr(arg);
        if x.is_invalid() || target.is_invalid() {
            return Operand::value(target, id);
        }
        let target_kind = self.table.basic_of(&target).filter(|k| !k.is_untyped());
        if let (Some(c), Some(tk)) = (x.constant().cloned(), target_kind) {
            let converted = if tk.is_numeric() && self.table.is_numeric(&x.ty) {
                c.represent(tk)
            } else if tk.is_string() {
                match &c {
                    ConstValue::Str(_) => Some(c.clone()),
                    ConstValue::Int(i) if self.table.is_integer(&x.ty) => Some(ConstValue::Str(
                        u32::try_from(*i)
                            .ok()
                            .and_then(char::from_u32)
                            .unwrap_or('\u{fffd}')
                            .to_string(),
                    )),
                    _ => None,
                }
            } else if tk.is_boolean() && self.table.is_boolean(&x.ty) {
                Some(c.clone())
            } else {
                None
            };
            match converted {
                Some(v) => {
                    if x.ty.is_untyped() {
                        self.set_untyped(&mut x, target.clone(), None);
                    }
                    return Operand {
                        mode: Mode::Constant(v),
                        ty: target,
                        expr: id,
                    };
                }
                None if tk.is_integer() && self.table.is_numeric(&x.ty) && c.as_int().is_none() => {
                    let msg = format!(
                        "cannot convert {} to type {} (truncated)",
                        self.describe(&x),
                        self.type_string(&target)
                    );
                    self.error(arg, msg);
                    return Operand::value(target, id);
                }
                None => {}
            }
        }
        if x.ty.is_untyped() {
            let final_ty = match target_kind {
                Some(_) if !self.table.is_interface(&target) => match self.implicit_type(&x, &target) {
                    Ok((t, _)) => t,
                    Err(_) => default_type(&x.ty),
                },
                _ => default_type(&x.ty),
            };
            if x.ty != Type::Basic(BasicKind::UntypedNil) {
                self.set_untyped(&mut x, final_ty, None);
            }
        }
        if !self.convertible(&x.ty, &target) {
            let msg = format!(
                "cannot convert {} to type {}",
                self.describe(&x),
                self.type_string(&target)
            );
            self.error(arg, msg);
        }
        Operand::value(target, id)
    }

    fn builtin_call(&mut self, id: NodeId, b: Builtin, args: &[NodeId], spread: bool) -> Operand {
        let name = b.name();
        let (min, max) = match b {
            Builtin::Len | Builtin::Cap | Builtin::New | Builtin::Panic => (1, Some(1)),
            Builtin::Make => (1, Some(3)),
            Builtin::Append => (1, None),
            Builtin::Copy | Builtin::Delete => (2, Some(2)),
            Builtin::Print | Builtin::Println => (0, None),
        };
        if args.len() < min {
            self.error(id, format!("not enough arguments for {}", self.text(id)));
            return Operand::invalid(id);
        }
        if max.is_some_and(|m| args.len() > m) {
            self.error(id, format!("too many arguments for {}", self.text(id)));
            return Operand::invalid(id);
        }
        if spread && b != Builtin::Append {
            self.error(id, format!("invalid use of ... with built-in {}", name));
            return Operand::invalid(id);
        }
        let int = Type::Basic(BasicKind::Int);
        let no_value = Operand {
            mode: Mode::NoValue,
            ty: Type::Tuple(Vec::new()),
            expr: id,
        };
        match b {
            Builtin::Len | Builtin::Cap => {
                let mut x = self.expr(args[0]);
                if x.is_invalid() {
                    return Operand::invalid(id);
                }
                self.default_operand(&mut x);
                let under = match self.table.underlying(&x.ty).clone() {
                    Type::Pointer(p) => self.table.underlying(&p).clone(),
                    other => other,
                };
                let ok = match (&under, b) {
                    (Type::Basic(k), Builtin::Len) => k.is_string(),
                    (Type::Map(..), Builtin::Len) => true,
                    (Type::Array(..) | Type::Slice(_) | Type::Chan(..), _) => true,
                    _ => false,
                };
                if !ok {
                    let msg = format!("invalid argument: {} for built-in {}", self.describe(&x), name);
                    self.error(args[0], msg);
                    return Operand::invalid(id);
                }
                match (x.constant(), &under) {
                    (Some(ConstValue::Str(s)), _) => Operand {
                        mode: Mode::Constant(ConstValue::Int(s.len() as i128)),
                        ty: int,
                        expr: id,
                    },
                    _ => Operand::value(int, id),
                }
            }
            Builtin::New => {
                let t = self.typ(args[0]);
                Operand::value(Type::Pointer(Box::new(t)), id)
            }
            Builtin::Make => {
                let t = self.typ(args[0]);
                let sizes = &args[1..];
                match self.table.underlying(&t) {
                    Type::Slice(_) if sizes.is_empty() => {
                        let msg = format!(
                            "invalid operation: {} expects 2 or 3 arguments; found 1",
                            self.text(id)
                        );
                        self.error(id, msg);
                        return Operand::invalid(id);
                    }
                    Type::Map(..) | Type::Chan(..) if sizes.len() > 1 => {
                        let msg = format!(
                            "invalid operation: {} expects 1 or 2 arguments; found {}",
                            self.text(id),
                            args.len()
                        );
                        self.error(id, msg);
                        return Operand::invalid(id);
                    }
                    Type::Slice(_) | Type::Map(..) | Type::Chan(..) | Type::Invalid => {}
                    _ => {
                        let msg = format!(
                            "invalid argument: cannot make {}; type must be slice, map, or channel",
                            self.text(args[0])
                        );
                        self.error(args[0], msg);
                        return Operand::invalid(id);
                    }
                }
                for &s in sizes {
                    self.index(s, None);
                }
                Operand::value(t, id)
            }
            Builtin::Append => {
                let s = self.expr(args[0]);
                if s.is_invalid() {
                    for &a in &args[1..] {
                        self.raw_expr(a, None);
                    }
                    return Operand::invalid(id);
                }
                let Type::Slice(elem) = self.table.underlying(&s.ty).clone() else {
                    let msg = format!(
                        "invalid argument: {} (first argument to append must be a slice)",
                        self.describe(&s)
                    );
                    self.error(args[0], msg);
                    return Operand::invalid(id);
                };
                if spread {
                    if let [_, rest] = args {
                        let mut r = self.expr(*rest);
                        let bytes_from_string = self.table.is_string(&r.ty)
                            && self.table.basic_of(&elem).map(BasicKind::canonical)
                                == Some(BasicKind::Uint8);
                        if !bytes_from_string {
                            self.assign(&mut r, &s.ty, Context::Argument);
                        }
                    } else {
                        self.error(id, format!("can only use ... with final argument in {}", self.text(id)));
                    }
                } else {
                    for &a in &args[1..] {
                        let mut v = self.element(a, &elem);
                        self.assign(&mut v, &elem, Context::Argument);
                    }
                }
                Operand::value(s.ty, id)
            }
            Builtin::Copy => {
                self.expr(args[0]);
                self.expr(args[1]);
                Operand::value(int, id)
            }
            Builtin::Delete => {
                let m = self.expr(args[0]);
                let mut k = self.expr(args[1]);
                if m.is_invalid() {
                    return no_value;
                }
                match self.table.underlying(&m.ty).clone() {
                    Type::Map(key, _) => {
                        self.assign(&mut k, &key, Context::Argument);
                    }
                    _ => {
                        let msg = format!("invalid argument: {} is not a map", self.describe(&m));
                        self.error(args[0], msg);
                    }
                }
                no_value
            }
            Builtin::Panic => {
                let mut x = self.expr(args[0]);
                self.assign(&mut x, &Type::Interface, Context::Argument);
                no_value
            }
            Builtin::Print | Builtin::Println => {
                for &a in args {
                    let mut x = self.expr(a);
                    self.default_operand(&mut x);
                }
                no_value
            }
        }
    }
}

enum Member {
    /// Field type and whether it was reached through a pointer
    Field(Type, bool),
    Method(Signature),
}

fn ctx_words(ctx: &Context) -> &'static str {
    match ctx {
        Context::Argument => "argument",
        Context::Assignment => "assignment",
        Context::VarDecl => "variable declaration",
        Context::ConstDecl => "constant declaration",
        Context::Return => "return statement",
        Context::MapIndex => "map index",
        Context::Send { .. } => "send",
        Context::Literal(what) => what,
    }
}
