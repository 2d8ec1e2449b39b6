//! Convert phase: rewrite every reference to the source type.
//!
//! Walks each hand-written file of a unit and renames type identifiers in
//! declarations, conversions, `make`/`new` and composite literals, turns
//! integer literals in declarations and assignments into float literals,
//! rewrites a few well-known library calls and import paths, and splits
//! declarations whose names have mixed skip status. Type information is
//! not consulted; mistakes surface as diagnostics in the Fix phase.

use std::collections::BTreeMap;

use crate::ast::{DeclKeyword, Forest, LitKind, NodeId, NodeKind, Span};
use crate::error::MigrateError;
use crate::skip::{FileSkip, SkipSet};
use crate::unit::Unit;
use crate::walk::{walk, Visitor, Walk};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Integer,
    Float,
}

fn family(type_name: &str) -> Option<Family> {
    match type_name {
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" => Some(Family::Integer),
        "float32" | "float64" => Some(Family::Float),
        _ => None,
    }
}

/// `float64` -> `Float64`, the way library function names embed types.
fn title(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert every hand-written file of `unit` from `from_type` to
/// `to_type`. Returns the number of edits made.
pub fn convert(
    unit: &mut Unit,
    from_type: &str,
    to_type: &str,
    skip: &SkipSet,
    imports: &BTreeMap<String, String>,
) -> Result<usize, MigrateError> {
    let mut edits = 0;
    let files: Vec<_> = unit
        .files
        .iter()
        .filter(|f| !f.generated)
        .map(|f| (f.root, f.path.clone()))
        .collect();
    for (root, path) in files {
        let mut c = Convertor {
            from: from_type,
            to: to_type,
            skip: skip.for_file(&path),
            imports,
            edits: 0,
        };
        walk(&mut unit.forest, root, &mut c)?;
        tracing::debug!(file = %path.display(), edits = c.edits, "converted file");
        edits += c.edits;
    }
    Ok(edits)
}

struct Convertor<'a> {
    from: &'a str,
    to: &'a str,
    skip: FileSkip<'a>,
    imports: &'a BTreeMap<String, String>,
    edits: usize,
}

impl Visitor for Convertor<'_> {
    fn visit(
        &mut self,
        forest: &mut Forest,
        id: NodeId,
        _ancestors: &[NodeId],
    ) -> Result<Walk, MigrateError> {
        match forest.kind(id) {
            NodeKind::FuncDecl { name, .. } if self.skip.func(name) => return Ok(Walk::Prune),
            NodeKind::TypeSpec { name, .. } if self.skip.type_name(name) => {
                return Ok(Walk::Prune)
            }
            NodeKind::TypeSpec { ty, .. } => {
                let ty = *ty;
                self.rename_type(forest, ty);
            }
            NodeKind::GenDecl { .. } => self.gen_decl(forest, id),
            NodeKind::FieldList { .. } => self.field_list(forest, id),
            NodeKind::Assign { .. } => self.assign(forest, id),
            NodeKind::Call { .. } => self.call(forest, id),
            NodeKind::CompositeLit { ty: Some(ty), .. } => {
                let ty = *ty;
                self.rename_type(forest, ty);
            }
            NodeKind::ImportSpec { .. } => self.import_spec(forest, id),
            _ => {}
        }
        Ok(Walk::Descend)
    }
}

impl Convertor<'_> {
    // -- Type expressions ---------------------------------------------

    /// Identifiers naming the source type inside a type expression.
    /// Struct and function types are left to their own field lists.
    fn type_idents(&self, forest: &Forest, ty: NodeId, out: &mut Vec<NodeId>) {
        match forest.kind(ty) {
            NodeKind::Ident { name } if name == self.from => out.push(ty),
            NodeKind::StructType { .. } | NodeKind::FuncType { .. } => {}
            // An array length is a value, not a type.
            NodeKind::ArrayType { elt, .. } => self.type_idents(forest, *elt, out),
            other => {
                for child in other.children() {
                    self.type_idents(forest, child, out);
                }
            }
        }
    }

    fn mentions(&self, forest: &Forest, ty: NodeId) -> bool {
        let mut ids = Vec::new();
        self.type_idents(forest, ty, &mut ids);
        !ids.is_empty()
    }

    fn rename_type(&mut self, forest: &mut Forest, ty: NodeId) {
        let mut ids = Vec::new();
        self.type_idents(forest, ty, &mut ids);
        for id in ids {
            *forest.kind_mut(id) = NodeKind::Ident {
                name: self.to.to_owned(),
            };
            self.edits += 1;
        }
    }

    // -- Declarations -------------------------------------------------

    /// Split consecutive names into runs with the same skip status.
    fn runs(names: &[String], skipped: impl Fn(&str) -> bool) -> Vec<(Vec<String>, bool)> {
        let mut runs: Vec<(Vec<String>, bool)> = Vec::new();
        for name in names {
            let s = skipped(name);
            match runs.last_mut() {
                Some((group, status)) if *status == s => group.push(name.clone()),
                _ => runs.push((vec![name.clone()], s)),
            }
        }
        runs
    }

    fn field_list(&mut self, forest: &mut Forest, id: NodeId) {
        let NodeKind::FieldList { fields } = forest.kind(id).clone() else {
            return;
        };
        let mut out = Vec::with_capacity(fields.len());
        let mut changed = false;
        for field in fields {
            let NodeKind::Field { names, ty } = forest.kind(field).clone() else {
                out.push(field);
                continue;
            };
            if !self.mentions(forest, ty) {
                out.push(field);
                continue;
            }
            if names.is_empty() {
                self.rename_type(forest, ty);
                out.push(field);
                continue;
            }
            let skip = self.skip;
            let runs = Self::runs(&names, |n| skip.field(n));
            if runs.len() > 1 {
                changed = true;
                tracing::debug!(names = ?names, "splitting field declaration");
            }
            // Clone before renaming so later runs start from the original.
            let types: Vec<NodeId> = (0..runs.len())
                .map(|i| if i == 0 { ty } else { forest.deep_clone(ty) })
                .collect();
            for (i, ((group, skipped), group_ty)) in runs.into_iter().zip(types).enumerate() {
                let node = if i == 0 {
                    field
                } else {
                    forest.alloc(
                        NodeKind::Field {
                            names: Vec::new(),
                            ty: group_ty,
                        },
                        Span::SYNTHETIC,
                    )
                };
                if let NodeKind::Field { names, .. } = forest.kind_mut(node) {
                    *names = group;
                }
                if !skipped {
                    self.rename_type(forest, group_ty);
                }
                out.push(node);
            }
        }
        if changed {
            *forest.kind_mut(id) = NodeKind::FieldList { fields: out };
        }
    }

    fn gen_decl(&mut self, forest: &mut Forest, id: NodeId) {
        let NodeKind::GenDecl { keyword, specs, .. } = forest.kind(id).clone() else {
            return;
        };
        if !matches!(keyword, DeclKeyword::Var | DeclKeyword::Const) {
            return;
        }
        let mut out = Vec::with_capacity(specs.len());
        for spec in &specs {
            out.extend(self.value_spec(forest, *spec));
        }
        if out.len() != specs.len() {
            if let NodeKind::GenDecl { specs, grouped, .. } = forest.kind_mut(id) {
                *specs = out;
                *grouped = true;
            }
        }
    }

    /// Convert one `var`/`const` spec, splitting it when its names have
    /// mixed skip status. Returns the specs that replace it.
    fn value_spec(&mut self, forest: &mut Forest, spec: NodeId) -> Vec<NodeId> {
        let NodeKind::ValueSpec { names, ty, values } = forest.kind(spec).clone() else {
            return vec![spec];
        };
        let literal_target = match ty {
            None => true,
            Some(t) => forest.ident_name(t) == Some(self.from),
        };
        let typed = ty.is_some_and(|t| self.mentions(forest, t));
        let skip = self.skip;
        let mut runs = Self::runs(&names, |n| skip.var(n));
        let splittable = values.is_empty() || values.len() == names.len();
        if runs.len() > 1 && !splittable {
            let all_skipped = runs.iter().all(|(_, s)| *s);
            runs = vec![(names.clone(), all_skipped)];
        }
        if runs.len() > 1 {
            tracing::debug!(names = ?names, "splitting value declaration");
        }

        let types: Vec<Option<NodeId>> = (0..runs.len())
            .map(|i| match (i, ty) {
                (0, t) => t,
                (_, Some(t)) => Some(forest.deep_clone(t)),
                (_, None) => None,
            })
            .collect();
        let mut out = Vec::with_capacity(runs.len());
        let mut next_value = 0;
        for (i, ((group, skipped), group_ty)) in runs.into_iter().zip(types).enumerate() {
            let group_values: Vec<NodeId> = if values.len() == names.len() {
                let v = values[next_value..next_value + group.len()].to_vec();
                next_value += group.len();
                v
            } else {
                values.clone()
            };
            let mut converted = Vec::with_capacity(group_values.len());
            for v in group_values {
                if !skipped && literal_target && self.literal_family_change() {
                    converted.push(self.convert_literal(forest, v));
                } else {
                    converted.push(v);
                }
            }
            if !skipped && typed {
                if let Some(t) = group_ty {
                    self.rename_type(forest, t);
                }
            }
            let kind = NodeKind::ValueSpec {
                names: group,
                ty: group_ty,
                values: converted,
            };
            if i == 0 {
                *forest.kind_mut(spec) = kind;
                out.push(spec);
            } else {
                out.push(forest.alloc(kind, Span::SYNTHETIC));
            }
        }
        out
    }

    // -- Literals -----------------------------------------------------

    fn literal_family_change(&self) -> bool {
        family(self.from) == Some(Family::Integer) && family(self.to) == Some(Family::Float)
    }

    /// Rewrite an integer literal (optionally signed) as a float literal.
    /// Non-decimal literals are wrapped in a conversion instead. Returns
    /// the node that takes the literal's place.
    fn convert_literal(&mut self, forest: &mut Forest, id: NodeId) -> NodeId {
        let lit = match forest.kind(id) {
            NodeKind::BasicLit { .. } => id,
            NodeKind::Unary { op: "-" | "+", x } => *x,
            _ => return id,
        };
        let NodeKind::BasicLit {
            kind: LitKind::Int,
            value,
        } = forest.kind(lit)
        else {
            return id;
        };
        self.edits += 1;
        if is_decimal(value) {
            let value = format!("{}.0", value);
            *forest.kind_mut(lit) = NodeKind::BasicLit {
                kind: LitKind::Float,
                value,
            };
            id
        } else {
            let to = self.to.to_owned();
            forest.call_ident(&to, vec![id])
        }
    }

    fn assign(&mut self, forest: &mut Forest, id: NodeId) {
        let NodeKind::Assign { lhs, op, rhs } = forest.kind(id).clone() else {
            return;
        };
        if !matches!(op, ":=" | "=") || lhs.len() != rhs.len() || !self.literal_family_change()
        {
            return;
        }
        let mut new_rhs = rhs.clone();
        for (i, r) in rhs.iter().enumerate() {
            if let Some(name) = forest.ident_name(lhs[i]) {
                if self.skip.var(name) {
                    continue;
                }
            }
            new_rhs[i] = self.convert_literal(forest, *r);
        }
        if new_rhs != rhs {
            if let NodeKind::Assign { rhs, .. } = forest.kind_mut(id) {
                *rhs = new_rhs;
            }
        }
    }

    // -- Calls and imports --------------------------------------------

    fn call(&mut self, forest: &mut Forest, id: NodeId) {
        let NodeKind::Call { fun, args, .. } = forest.kind(id).clone() else {
            return;
        };
        match forest.kind(fun).clone() {
            NodeKind::Ident { name } if name == self.from && args.len() == 1 => {
                *forest.kind_mut(fun) = NodeKind::Ident {
                    name: self.to.to_owned(),
                };
                self.edits += 1;
            }
            NodeKind::Ident { name } if name == "make" || name == "new" => {
                if let Some(&ty) = args.first() {
                    self.rename_type(forest, ty);
                }
            }
            NodeKind::ArrayType { .. } => self.rename_type(forest, fun),
            NodeKind::Selector { x, sel } => {
                let Some(pkg) = forest.ident_name(x).map(str::to_owned) else {
                    return;
                };
                self.library_call(forest, id, fun, &pkg, &sel, &args);
            }
            _ => {}
        }
    }

    fn library_call(
        &mut self,
        forest: &mut Forest,
        call: NodeId,
        fun: NodeId,
        pkg: &str,
        sel: &str,
        args: &[NodeId],
    ) {
        let from = title(self.from);
        let to = title(self.to);
        let renamed = match (pkg, sel) {
            ("flag" | "rand", s) if s == from => Some(to.clone()),
            ("flag" | "rand", s) if s == format!("{}Var", from) => Some(format!("{}Var", to)),
            _ => None,
        };
        if let Some(new_sel) = renamed {
            if let NodeKind::Selector { sel, .. } = forest.kind_mut(fun) {
                *sel = new_sel;
            }
            self.edits += 1;
            return;
        }
        if self.from != "int" {
            return;
        }
        match (pkg, sel) {
            ("rand", "Intn") if args.len() == 1 => {
                let random = forest.call_selector("rand", &to, Vec::new());
                let bound = forest.synth(NodeKind::Paren { x: args[0] });
                *forest.kind_mut(call) = NodeKind::Binary {
                    op: "*",
                    x: random,
                    y: bound,
                };
                self.edits += 1;
            }
            ("strconv", "Atoi") => {
                let width = match self.to {
                    "float64" => "64",
                    "float32" => "32",
                    _ => return,
                };
                let mut parse_args = args.to_vec();
                parse_args.push(forest.synth(NodeKind::BasicLit {
                    kind: LitKind::Int,
                    value: width.to_owned(),
                }));
                if self.to == "float32" {
                    let parse = forest.call_selector("strconv", "ParseFloat", parse_args);
                    let narrow = forest.ident("float32");
                    *forest.kind_mut(call) = NodeKind::Call {
                        fun: narrow,
                        args: vec![parse],
                        spread: false,
                    };
                } else {
                    if let NodeKind::Selector { sel, .. } = forest.kind_mut(fun) {
                        *sel = "ParseFloat".to_owned();
                    }
                    if let NodeKind::Call { args, .. } = forest.kind_mut(call) {
                        *args = parse_args;
                    }
                }
                self.edits += 1;
            }
            _ => {}
        }
    }

    fn import_spec(&mut self, forest: &mut Forest, id: NodeId) {
        let NodeKind::ImportSpec { path, .. } = forest.kind(id) else {
            return;
        };
        let mut new_path = path.clone();
        for (old, new) in self.imports {
            new_path = new_path.replacen(old.as_str(), new, 1);
        }
        if &new_path != path {
            if let NodeKind::ImportSpec { path, .. } = forest.kind_mut(id) {
                *path = new_path;
            }
            self.edits += 1;
        }
    }
}

/// Plain decimal integer literal (`5`, `1_000`, but not `0x10` or `017`).
fn is_decimal(raw: &str) -> bool {
    let digits = raw.bytes().all(|b| b.is_ascii_digit() || b == b'_');
    digits && (raw == "0" || !raw.starts_with('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_file;
    use std::path::PathBuf;

    fn run(src: &str, skip: &[(&str, &[&str])], imports: &[(&str, &str)], to: &str) -> String {
        let mut unit = Unit::parse("p", &[(PathBuf::from("/src/p.go"), src.to_owned())]).unwrap();
        let skip = SkipSet::new(
            skip.iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
        );
        let imports = imports
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        convert(&mut unit, "int", to, &skip, &imports).unwrap();
        print_file(&unit.forest, unit.files[0].root)
    }

    fn float64(src: &str) -> String {
        run(src, &[], &[], "float64")
    }

    #[test]
    fn declarations_and_literals() {
        let out = float64(
            "package p\n\nvar a int = 5\n\nvar b = -3\n\nconst c = 0x10\n\nvar s = \"x\"\n",
        );
        assert_eq!(
            out,
            "package p\n\nvar a float64 = 5.0\n\nvar b = -3.0\n\nconst c = float64(0x10)\n\nvar s = \"x\"\n"
        );
    }

    #[test]
    fn function_signatures_and_bodies() {
        let out = float64(
            "package p\n\nfunc area(w, h int) int {\n\tn := 2\n\tx := int(w)\n\treturn w * h * n * x\n}\n",
        );
        assert_eq!(
            out,
            "package p\n\nfunc area(w, h float64) float64 {\n\tn := 2.0\n\tx := float64(w)\n\treturn w * h * n * x\n}\n"
        );
    }

    #[test]
    fn make_keeps_size_arguments() {
        let out = float64("package p\n\nfunc f(n int) {\n\txs := make([]int, n)\n\t_ = xs\n}\n");
        assert!(out.contains("xs := make([]float64, n)"), "{}", out);
    }

    #[test]
    fn composite_literals_and_element_types() {
        let out = float64(
            "package p\n\nvar m map[string][]int\n\nfunc f() {\n\tg([]int{1, 2})\n}\n\nfunc g(xs []int) {}\n",
        );
        assert!(out.contains("var m map[string][]float64"), "{}", out);
        assert!(out.contains("g([]float64{1, 2})"), "{}", out);
        assert!(out.contains("func g(xs []float64) {"), "{}", out);
    }

    #[test]
    fn library_calls() {
        let out = float64(
            "package p\n\nimport (\n\t\"flag\"\n\t\"math/rand\"\n\t\"strconv\"\n)\n\nvar n = flag.Int(\"n\", 1, \"count\")\n\nfunc f(s string) {\n\tr := rand.Intn(10)\n\tv, err := strconv.Atoi(s)\n\t_, _, _ = r, v, err\n}\n",
        );
        assert!(out.contains("flag.Float64(\"n\", 1, \"count\")"), "{}", out);
        assert!(out.contains("r := rand.Float64() * (10)"), "{}", out);
        assert!(out.contains("strconv.ParseFloat(s, 64)"), "{}", out);
    }

    #[test]
    fn atoi_to_float32_is_narrowed() {
        let out = run(
            "package p\n\nimport \"strconv\"\n\nfunc f(s string) {\n\tv, err := strconv.Atoi(s)\n\t_, _ = v, err\n}\n",
            &[],
            &[],
            "float32",
        );
        assert!(out.contains("float32(strconv.ParseFloat(s, 32))"), "{}", out);
    }

    #[test]
    fn mixed_fields_split_in_order() {
        let out = run(
            "package p\n\ntype rect struct {\n\tid, w, h int\n}\n",
            &[("*", &["id|field"])],
            &[],
            "float64",
        );
        assert!(out.contains("\tid int\n\tw, h float64\n"), "{}", out);
    }

    #[test]
    fn mixed_array_fields_keep_length() {
        let out = run(
            "package p\n\ntype grid struct {\n\tcells, marks [4]int\n}\n",
            &[("p", &["marks"])],
            &[],
            "float64",
        );
        assert!(out.contains("\tcells [4]float64\n\tmarks [4]int\n"), "{}", out);
    }

    #[test]
    fn mixed_var_spec_splits_values() {
        let out = run(
            "package p\n\nvar a, b int = 1, 2\n",
            &[("*", &["b|var"])],
            &[],
            "float64",
        );
        assert!(out.contains("a float64 = 1.0"), "{}", out);
        assert!(out.contains("b int = 2"), "{}", out);
    }

    #[test]
    fn skipped_func_and_type_keep_their_types() {
        let out = run(
            "package p\n\ntype count int\n\ntype size int\n\nfunc keep(n int) int { return n }\n\nfunc move(n int) int { return n }\n",
            &[("*", &["keep|func", "count|type"])],
            &[],
            "float64",
        );
        assert!(out.contains("type count int"), "{}", out);
        assert!(out.contains("type size float64"), "{}", out);
        assert!(out.contains("func keep(n int) int"), "{}", out);
        assert!(out.contains("func move(n float64) float64"), "{}", out);
    }

    #[test]
    fn imports_are_remapped() {
        let out = run(
            "package p\n\nimport \"example.com/geom/shapes\"\n\nvar _ = shapes.X\n",
            &[],
            &[("example.com/geom", "example.com/geomf")],
            "float64",
        );
        assert!(out.contains("import \"example.com/geomf/shapes\""), "{}", out);
    }

    #[test]
    fn generated_files_are_left_alone() {
        let mut set = crate::snippets::SnippetSet::default();
        set.add("i64");
        let generated = set.render("p");
        let mut unit = Unit::parse(
            "p",
            &[(PathBuf::from("/src/snippets.go"), generated.clone())],
        )
        .unwrap();
        let edits = convert(
            &mut unit,
            "int",
            "float64",
            &SkipSet::default(),
            &BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(edits, 0);
    }

    #[test]
    fn decimal_detection() {
        assert!(is_decimal("5"));
        assert!(is_decimal("0"));
        assert!(is_decimal("1_000"));
        assert!(!is_decimal("0x10"));
        assert!(!is_decimal("017"));
    }
}
