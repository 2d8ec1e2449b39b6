//! Fix phase: resolve the type conflicts the Convert phase introduced.
//!
//! One pass classifies every diagnostic of a freshly checked collection
//! and applies the matching edit. The caller re-checks between passes and
//! uses [`FixProgress`] to decide whether to go on: the loop ends when
//! no diagnostics are left and fails as soon as the count stops falling.

use crate::ast::{Forest, LitKind, NodeId, NodeKind};
use crate::check::TypeInfo;
use crate::classify::{classify, ConflictShape};
use crate::error::MigrateError;
use crate::snippets::{truncation_helper, SnippetSet};
use crate::unit::{Collection, Diagnostic, Unit};

// ──────────────────────────────────────────────
// Loop control
// ──────────────────────────────────────────────

/// Next step of the fix loop after observing a diagnostic count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// No diagnostics left
    Done,
    /// Fewer diagnostics than last time; run another pass
    Fix,
    /// The count did not fall
    Stalled,
}

/// Tracks diagnostic counts across fix passes.
#[derive(Debug, Clone, Default)]
pub struct FixProgress {
    previous: Option<usize>,
    iterations: usize,
    fixed: usize,
}

impl FixProgress {
    pub fn new() -> Self {
        FixProgress::default()
    }

    pub fn observe(&mut self, count: usize) -> Step {
        if count == 0 {
            return Step::Done;
        }
        if self.previous.is_some_and(|p| count >= p) {
            return Step::Stalled;
        }
        self.previous = Some(count);
        self.iterations += 1;
        self.fixed += count;
        Step::Fix
    }

    /// Passes that applied fixes.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Sum of the diagnostic counts of every pass.
    pub fn fixed(&self) -> usize {
        self.fixed
    }
}

// ──────────────────────────────────────────────
// One pass
// ──────────────────────────────────────────────

/// A diagnostic with its trimmed syntax path, built before any edit of
/// the pass so positions still match the checked source.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub diagnostic: Diagnostic,
    pub path: Vec<NodeId>,
}

/// Fix every diagnostic of every unit once. Edits already applied stay
/// in the forests when a handler fails, so the caller can save them.
pub fn fix_collection(coll: &mut Collection, from: &str, to: &str) -> Result<usize, MigrateError> {
    let mut handled = 0;
    for unit in &mut coll.units {
        handled += fix_unit(unit, from, to)?;
    }
    Ok(handled)
}

pub fn fix_unit(unit: &mut Unit, from: &str, to: &str) -> Result<usize, MigrateError> {
    unit.ensure_fresh()?;
    let conflicts: Vec<Conflict> = unit
        .diagnostics
        .iter()
        .map(|d| Conflict {
            diagnostic: d.clone(),
            path: unit.conflict_path(d),
        })
        .collect();

    for conflict in &conflicts {
        let location = unit.location(&conflict.diagnostic, &conflict.path);
        let message = conflict.diagnostic.message.clone();
        let Some(shape) = classify(&message) else {
            return Err(MigrateError::UnknownConflict { message, location });
        };
        tracing::info!(
            conflict = %conflict.diagnostic,
            handler = shape.handler(),
            "fixing type conflict"
        );
        tracing::debug!(path = %location, "conflict path");
        let Unit {
            forest,
            info,
            snippets,
            ..
        } = unit;
        let mut fixer = Fixer {
            forest,
            info,
            snippets,
            from,
            to,
        };
        if let Err(reason) = fixer.dispatch(&shape, &conflict.path) {
            return Err(MigrateError::FixHandler {
                handler: shape.handler(),
                reason,
                message,
                location,
            });
        }
    }
    Ok(conflicts.len())
}

// ──────────────────────────────────────────────
// Handlers
// ──────────────────────────────────────────────

fn is_numeric_type(name: &str) -> bool {
    matches!(
        name,
        "int"
            | "int8"
            | "int16"
            | "int32"
            | "int64"
            | "uint"
            | "uint8"
            | "uint16"
            | "uint32"
            | "uint64"
            | "uintptr"
            | "byte"
            | "rune"
            | "float32"
            | "float64"
    )
}

struct Fixer<'u> {
    forest: &'u mut Forest,
    info: &'u TypeInfo,
    snippets: &'u mut SnippetSet,
    from: &'u str,
    to: &'u str,
}

type Fix = Result<(), String>;

impl Fixer<'_> {
    fn dispatch(&mut self, shape: &ConflictShape, path: &[NodeId]) -> Fix {
        match shape {
            ConflictShape::Argument { expected, .. } => self.argument(path, expected),
            ConflictShape::ChannelSend { element, .. } => self.channel(path, element),
            ConflictShape::Index => self.index(path),
            ConflictShape::Mismatch { left, right } => self.mismatch(path, left, right),
            ConflictShape::Assignment { expected, .. } => self.assignment(path, expected),
            ConflictShape::Remainder => self.remainder(path),
            ConflictShape::Return { .. } => {
                Err("return type mismatches are not fixed automatically".to_owned())
            }
            ConflictShape::Truncation => self.truncation(path),
        }
    }

    fn type_of(&self, id: NodeId) -> Option<String> {
        self.info.type_string(id)
    }

    /// `ty(e)` with parentheses dropped. A single-argument numeric
    /// conversion is retargeted instead of nested.
    fn convert(&mut self, e: NodeId, ty: &str) -> NodeId {
        let inner = self.forest.unparen(e);
        if let Some((name, _)) = self.forest.as_conversion(inner) {
            if is_numeric_type(name) {
                if let NodeKind::Call { fun, .. } = self.forest.kind(inner).clone() {
                    *self.forest.kind_mut(fun) = NodeKind::Ident {
                        name: ty.to_owned(),
                    };
                }
                return inner;
            }
        }
        self.forest.call_ident(ty, vec![inner])
    }

    /// Replace `child` of `parent` by its conversion to `ty`. A child
    /// that an earlier fix of the same pass already moved is left alone.
    fn wrap(&mut self, parent: NodeId, child: NodeId, ty: &str) {
        if !self.forest.children(parent).contains(&child) {
            tracing::debug!("operand already rewritten in this pass");
            return;
        }
        let new = self.convert(child, ty);
        if new != child {
            self.forest.replace_child(parent, child, new);
        }
    }

    fn call_parent(&self, path: &[NodeId]) -> Result<(NodeId, NodeId, usize), String> {
        let (Some(&arg), Some(&call)) = (path.first(), path.get(1)) else {
            return Err("expects an argument inside a call".to_owned());
        };
        let NodeKind::Call { args, .. } = self.forest.kind(call) else {
            return Err(format!(
                "expects CallExpr, got {}",
                self.forest.kind(call).name()
            ));
        };
        let index = args
            .iter()
            .position(|&a| a == arg)
            .ok_or_else(|| "offending expression is not a call argument".to_owned())?;
        Ok((call, arg, index))
    }

    fn argument(&mut self, path: &[NodeId], expected: &str) -> Fix {
        let (call, arg, _) = self.call_parent(path)?;
        let inner = self.forest.unparen(arg);
        if let Some((name, x)) = self.forest.as_conversion(inner) {
            if name == self.from || name == self.to {
                if self.type_of(x).as_deref() == Some(expected) {
                    self.forest.replace_child(call, arg, x);
                } else {
                    self.wrap(call, arg, expected);
                }
                return Ok(());
            }
        }
        if expected.starts_with('*') {
            return Err(format!("pointer parameter type {} is not supported", expected));
        }
        self.wrap(call, arg, expected);
        Ok(())
    }

    fn channel(&mut self, path: &[NodeId], element: &str) -> Fix {
        for &id in path {
            if let NodeKind::Send { value, .. } = self.forest.kind(id) {
                let value = *value;
                self.wrap(id, value, element);
                return Ok(());
            }
        }
        Err("expects SendStmt on the path".to_owned())
    }

    /// The offending expression may sit deep inside the index, so the
    /// nearest indexing parent on the path is the one rewritten.
    fn index(&mut self, path: &[NodeId]) -> Fix {
        for pair in path.windows(2) {
            let (child, parent) = (pair[0], pair[1]);
            match self.forest.kind(parent).clone() {
                NodeKind::Index { index, .. } if index == child => {
                    self.wrap(parent, index, "int");
                    return Ok(());
                }
                NodeKind::Slice { low, high, max, .. }
                    if [low, high, max].contains(&Some(child)) =>
                {
                    for bound in [low, high, max].into_iter().flatten() {
                        if self.type_of(bound).as_deref() != Some("int") {
                            self.wrap(parent, bound, "int");
                        }
                    }
                    return Ok(());
                }
                NodeKind::Call { args, .. } if args.contains(&child) => {
                    self.wrap(parent, child, "int");
                    return Ok(());
                }
                _ => {}
            }
        }
        let got = path
            .get(1)
            .map(|&id| self.forest.kind(id).name())
            .unwrap_or("nothing");
        Err(format!("expects CallExpr, IndexExpr or SliceExpr, got {}", got))
    }

    fn mismatch(&mut self, path: &[NodeId], left: &str, right: &str) -> Fix {
        for (i, &id) in path.iter().enumerate() {
            match self.forest.kind(id).clone() {
                NodeKind::Assign { rhs, .. } => {
                    if rhs.len() != 1 {
                        return Err("expects a single-value assignment".to_owned());
                    }
                    self.wrap(id, rhs[0], left);
                    return Ok(());
                }
                NodeKind::ValueSpec { ty, values, .. } => {
                    if values.len() != 1 {
                        return Err("expects a single-value declaration".to_owned());
                    }
                    let target = match ty {
                        Some(t) => crate::printer::print_expr(self.forest, t),
                        None => left.to_owned(),
                    };
                    self.wrap(id, values[0], &target);
                    return Ok(());
                }
                NodeKind::Binary { op, x, y } => {
                    if op == "%" {
                        self.int_remainder(id, path.get(i + 1).copied(), x, y);
                        return Ok(());
                    }
                    let to = self.to;
                    if left != to {
                        self.wrap(id, x, to);
                    }
                    if right != to {
                        self.wrap(id, y, to);
                    }
                    return Ok(());
                }
                _ => {}
            }
        }
        Err("expects AssignStmt or BinaryExpr on the path".to_owned())
    }

    fn assignment(&mut self, path: &[NodeId], expected: &str) -> Fix {
        let (Some(&value), Some(&parent)) = (path.first(), path.get(1)) else {
            return Err("expects an assigned value".to_owned());
        };
        match self.forest.kind(parent) {
            NodeKind::Assign { rhs, .. } if rhs.contains(&value) => {}
            NodeKind::ValueSpec { values, .. } if values.contains(&value) => {}
            other => {
                return Err(format!(
                    "expects AssignStmt or ValueSpec, got {}",
                    other.name()
                ))
            }
        }
        self.wrap(parent, value, expected);
        Ok(())
    }

    /// Both operands of `x % y` to `int`. When the left operand was a
    /// float, the result is converted back so the surrounding expression
    /// keeps its type.
    fn int_remainder(&mut self, binary: NodeId, parent: Option<NodeId>, x: NodeId, y: NodeId) {
        let float = self
            .type_of(x)
            .filter(|t| t == "float32" || t == "float64");
        for operand in [x, y] {
            if !self.fits_int(operand) {
                self.wrap(binary, operand, "int");
            }
        }
        let Some(parent) = parent else {
            return;
        };
        let converted = self
            .forest
            .as_conversion(parent)
            .is_some_and(|(name, arg)| arg == binary && is_numeric_type(name));
        if let (Some(t), false) = (float, converted) {
            let wrapped = self.forest.call_ident(&t, vec![binary]);
            self.forest.replace_child(parent, binary, wrapped);
        }
    }

    /// Typed `int` values and untyped integer constants need no conversion.
    fn fits_int(&self, operand: NodeId) -> bool {
        let inner = self.forest.unparen(operand);
        if matches!(
            self.forest.kind(inner),
            NodeKind::BasicLit {
                kind: LitKind::Int | LitKind::Char,
                ..
            }
        ) {
            return true;
        }
        matches!(
            self.type_of(operand).as_deref(),
            Some("int" | "untyped int" | "untyped rune")
        )
    }

    fn remainder(&mut self, path: &[NodeId]) -> Fix {
        for (i, &id) in path.iter().enumerate() {
            match self.forest.kind(id).clone() {
                NodeKind::Binary { op: "%", x, y } => {
                    self.int_remainder(id, path.get(i + 1).copied(), x, y);
                    return Ok(());
                }
                NodeKind::Assign { lhs, op: "%=", rhs } if lhs.len() == 1 && rhs.len() == 1 => {
                    // x %= y  ->  x = T(int(x) % int(y))
                    let target = self.type_of(lhs[0]).unwrap_or_else(|| self.to.to_owned());
                    let left = self.forest.deep_clone(lhs[0]);
                    let left = self.forest.call_ident("int", vec![left]);
                    let right = self.convert(rhs[0], "int");
                    let rem = self.forest.synth(NodeKind::Binary {
                        op: "%",
                        x: left,
                        y: right,
                    });
                    let value = self.forest.call_ident(&target, vec![rem]);
                    *self.forest.kind_mut(id) = NodeKind::Assign {
                        lhs,
                        op: "=",
                        rhs: vec![value],
                    };
                    return Ok(());
                }
                _ => {}
            }
        }
        Err("expects % on the path".to_owned())
    }

    fn truncation(&mut self, path: &[NodeId]) -> Fix {
        let (call, arg, _) = self.call_parent(path)?;
        let mut ty = self.type_of(arg).unwrap_or_default();
        if ty == "untyped float" {
            ty = self.to.to_owned();
        }
        let helper = truncation_helper(&ty).ok_or_else(|| {
            format!(
                "expects type float32 or float64 to truncate to int, got {:?}",
                ty
            )
        })?;
        self.snippets.add(helper);
        let wrapped = self.forest.call_ident(helper, vec![arg]);
        self.forest.replace_child(call, arg, wrapped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_file;
    use std::path::PathBuf;

    fn unit(src: &str) -> Unit {
        let mut u = Unit::parse("p", &[(PathBuf::from("/w/p.go"), src.to_owned())]).unwrap();
        u.check();
        u
    }

    /// Run fix passes, re-checking in memory, until clean or failure.
    fn fix(src: &str) -> Result<String, MigrateError> {
        let mut u = unit(src);
        let mut progress = FixProgress::new();
        loop {
            match progress.observe(u.diagnostics.len()) {
                Step::Done => return Ok(print_file(&u.forest, u.files[0].root)),
                Step::Stalled => panic!("stalled: {:?}", u.diagnostics),
                Step::Fix => {}
            }
            fix_unit(&mut u, "int", "float64")?;
            let text = print_file(&u.forest, u.files[0].root);
            let snippets = u.snippets.clone();
            u = unit(&text);
            u.snippets = snippets;
        }
    }

    #[test]
    fn progress_succeeds_on_falling_counts() {
        let mut p = FixProgress::new();
        let steps: Vec<Step> = [5, 3, 1, 0].iter().map(|&n| p.observe(n)).collect();
        assert_eq!(steps, vec![Step::Fix, Step::Fix, Step::Fix, Step::Done]);
        assert_eq!(p.iterations(), 3);
        assert_eq!(p.fixed(), 9);
    }

    #[test]
    fn progress_stalls_on_equal_counts() {
        let mut p = FixProgress::new();
        assert_eq!(p.observe(5), Step::Fix);
        assert_eq!(p.observe(5), Step::Stalled);
    }

    #[test]
    fn loop_bound_comparison_and_index() {
        let out = fix(
            "package p\n\nfunc sum(xs []float64) float64 {\n\tvar total float64\n\tfor i := 0.0; i < len(xs); i++ {\n\t\ttotal += xs[i]\n\t}\n\treturn total\n}\n",
        )
        .unwrap();
        assert!(out.contains("i < float64(len(xs))"), "{}", out);
        assert!(out.contains("total += xs[int(i)]"), "{}", out);
    }

    #[test]
    fn argument_is_wrapped_in_parameter_type() {
        let out = fix("package p\n\nfunc g(n int) {}\n\nfunc f(x float64) {\n\tg((x))\n}\n").unwrap();
        assert!(out.contains("g(int(x))"), "{}", out);
    }

    #[test]
    fn conversion_argument_is_dropped_when_inner_fits() {
        let out = fix(
            "package p\n\nfunc g(n int) {}\n\nfunc f(n int) {\n\tg(float64(n))\n}\n",
        )
        .unwrap();
        assert!(out.contains("\tg(n)\n"), "{}", out);
    }

    #[test]
    fn conversion_argument_is_retargeted() {
        let out = fix(
            "package p\n\nfunc g(n int) {}\n\nfunc f(x float32) {\n\tg(float64(x))\n}\n",
        )
        .unwrap();
        assert!(out.contains("g(int(x))"), "{}", out);
    }

    #[test]
    fn channel_send_is_converted_to_element_type() {
        let out = fix("package p\n\nfunc f(ch chan int, v float64) {\n\tch <- v\n}\n").unwrap();
        assert!(out.contains("ch <- int(v)"), "{}", out);
    }

    #[test]
    fn slice_bounds_are_converted_independently() {
        let out = fix(
            "package p\n\nfunc f(xs []string, lo float64, hi int) []string {\n\treturn xs[lo:hi]\n}\n",
        )
        .unwrap();
        assert!(out.contains("xs[int(lo):hi]"), "{}", out);
    }

    #[test]
    fn compound_index_is_converted_whole() {
        let out = fix(
            "package p\n\nfunc at(cells []int, w, x, y float64) int {\n\treturn cells[y*w+x]\n}\n",
        )
        .unwrap();
        assert!(out.contains("cells[int(y*w+x)]"), "{}", out);
    }

    #[test]
    fn make_size_is_converted() {
        let out = fix("package p\n\nfunc f(n float64) []int {\n\treturn make([]int, n)\n}\n").unwrap();
        assert!(out.contains("make([]int, int(n))"), "{}", out);
    }

    #[test]
    fn remainder_uses_integers() {
        let out = fix("package p\n\nfunc f(a, b float64) float64 {\n\tc := a % b\n\treturn c\n}\n")
            .unwrap();
        assert!(out.contains("c := float64(int(a) % int(b))"), "{}", out);
    }

    #[test]
    fn remainder_already_converted_is_not_wrapped_again() {
        let out = fix(
            "package p\n\nfunc f(a, b float64) float64 {\n\tc := float64(float64(a) % float64(b))\n\treturn c\n}\n",
        )
        .unwrap();
        assert!(out.contains("\tc := float64(int(a) % int(b))\n"), "{}", out);
    }

    #[test]
    fn remainder_keeps_integer_constants() {
        let out = fix("package p\n\nfunc f(n float64) float64 {\n\treturn n % 3\n}\n").unwrap();
        assert!(out.contains("\treturn float64(int(n) % 3)\n"), "{}", out);
    }

    #[test]
    fn remainder_assignment_is_rewritten() {
        let out = fix("package p\n\nfunc f(a, b float64) float64 {\n\ta %= b\n\treturn a\n}\n")
            .unwrap();
        assert!(out.contains("a = float64(int(a) % int(b))"), "{}", out);
    }

    #[test]
    fn assignment_is_converted_to_destination() {
        let out = fix(
            "package p\n\nfunc f(v float64) int {\n\tvar n int\n\tn = v\n\tvar m int = v\n\treturn n + m\n}\n",
        )
        .unwrap();
        assert!(out.contains("n = int(v)"), "{}", out);
        assert!(out.contains("var m int = int(v)"), "{}", out);
    }

    #[test]
    fn truncation_injects_one_helper() {
        let mut u = unit(
            "package p\n\nfunc g(n int) {}\n\nfunc f() {\n\tg(2.5)\n\tg(3.5)\n}\n",
        );
        assert_eq!(u.diagnostics.len(), 2);
        fix_unit(&mut u, "int", "float64").unwrap();
        let out = print_file(&u.forest, u.files[0].root);
        assert!(out.contains("g(i64(2.5))"), "{}", out);
        assert!(out.contains("g(i64(3.5))"), "{}", out);
        assert_eq!(u.snippets.len(), 1);
        assert!(u.snippets.contains("i64"));
    }

    #[test]
    fn return_mismatch_is_a_handler_failure() {
        let err = fix("package p\n\nfunc f(v float64) int {\n\treturn v\n}\n").unwrap_err();
        match err {
            MigrateError::FixHandler {
                handler, location, ..
            } => {
                assert_eq!(handler, "fix_return");
                assert_eq!(location.position, "/w/p.go:4:9");
            }
            other => panic!("expected handler failure, got {:?}", other),
        }
    }

    #[test]
    fn unknown_conflicts_fail_loudly() {
        let err = fix("package p\n\nfunc f() {\n\t_ = missing\n}\n").unwrap_err();
        match err {
            MigrateError::UnknownConflict { message, location } => {
                assert_eq!(message, "undefined: missing");
                assert_eq!(location.path[0], "Ident");
            }
            other => panic!("expected unknown conflict, got {:?}", other),
        }
    }

    #[test]
    fn stale_units_are_refused() {
        let mut u = unit("package p\n\nvar x = 1\n");
        u.forest.ident("y");
        assert_eq!(
            fix_unit(&mut u, "int", "float64").unwrap_err().kind(),
            "stale_type_info"
        );
    }
}
