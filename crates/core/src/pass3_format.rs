//! Format phase: keep printf-style directives in step with argument types.
//!
//! After Convert and Fix, a `%d` whose argument became a float prints
//! `%!d(float64=…)`. This phase rewrites such directives to the float
//! letter, or to `%s` around a configured shim call.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Forest, LitKind, NodeId, NodeKind};
use crate::check::{quote, ConstValue, TypeInfo};
use crate::error::MigrateError;
use crate::skip::file_key;
use crate::unit::{SourceFile, Unit};
use crate::walk::{walk, Visitor, Walk};

static VERB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[%][.*+_ 0-9\[\]]*[a-z]").expect("valid regex"));

/// Directive letter for values of a basic type.
pub fn verb_letter(type_name: &str) -> Option<char> {
    match type_name {
        "byte" | "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
        | "uint32" | "uint64" | "rune" | "untyped int" | "untyped rune" => Some('d'),
        "float32" | "float64" | "untyped float" => Some('f'),
        _ => None,
    }
}

/// A directive token in a format string, as byte range plus letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive {
    pub start: usize,
    pub end: usize,
    pub letter: char,
}

/// Directive tokens of `format`. `%%` is a literal percent and a `%`
/// that starts no directive is ignored.
pub fn directives(format: &str) -> Vec<Directive> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(found) = format[pos..].find('%') {
        let start = pos + found;
        if format[start + 1..].starts_with('%') {
            pos = start + 2;
            continue;
        }
        match VERB.find(&format[start..]) {
            Some(m) => {
                let end = start + m.end();
                let letter = format[..end].chars().next_back().unwrap_or('%');
                out.push(Directive { start, end, letter });
                pos = end;
            }
            None => pos = start + 1,
        }
    }
    out
}

/// Reconcile every format call in the hand-written files of `unit`.
/// Returns the number of calls rewritten.
pub fn format_unit(
    unit: &mut Unit,
    from_type: &str,
    format_exempt: &BTreeSet<String>,
    format_shims: &BTreeMap<String, String>,
    printf: &BTreeMap<String, usize>,
) -> Result<usize, MigrateError> {
    unit.ensure_fresh()?;
    let Unit {
        forest,
        files,
        info,
        ..
    } = unit;
    let mut rewritten = 0;
    for file in files.iter().filter(|f| !f.generated) {
        let key = file_key(&file.path);
        let mut formatter = Formatter {
            info,
            file,
            printf,
            from_letter: verb_letter(from_type),
            exempt: format_exempt.contains(&key),
            shim: format_shims.get(&key).map(String::as_str),
            rewritten: 0,
        };
        walk(forest, file.root, &mut formatter)?;
        rewritten += formatter.rewritten;
    }
    if rewritten > 0 {
        tracing::debug!(unit = %unit.name, calls = rewritten, "rewrote format calls");
    }
    Ok(rewritten)
}

struct Formatter<'a> {
    info: &'a TypeInfo,
    file: &'a SourceFile,
    printf: &'a BTreeMap<String, usize>,
    from_letter: Option<char>,
    exempt: bool,
    shim: Option<&'a str>,
    rewritten: usize,
}

impl Visitor for Formatter<'_> {
    fn visit(
        &mut self,
        forest: &mut Forest,
        id: NodeId,
        _ancestors: &[NodeId],
    ) -> Result<Walk, MigrateError> {
        let Some(name) = forest.callee_name(id).map(str::to_owned) else {
            return Ok(Walk::Descend);
        };
        if let Some(&index) = self.printf.get(&name.to_lowercase()) {
            self.call(forest, id, &name, index)?;
        }
        Ok(Walk::Descend)
    }
}

impl Formatter<'_> {
    fn position(&self, forest: &Forest, id: NodeId) -> String {
        let span = forest.span(id);
        if span.is_synthetic() {
            return self.file.path.display().to_string();
        }
        let (line, col) = self.file.line_col(span.start);
        format!("{}:{}:{}", self.file.path.display(), line, col)
    }

    fn error(&self, forest: &Forest, id: NodeId, message: String) -> MigrateError {
        MigrateError::Format {
            position: self.position(forest, id),
            message,
        }
    }

    /// Underlying type of an argument, as its directive letter.
    fn arg_letter(&self, arg: NodeId) -> Result<Option<char>, String> {
        let Some(ty) = self.info.type_of(arg) else {
            return Ok(None);
        };
        let table = self.info.table();
        let rendered = table.type_string(table.underlying(ty));
        verb_letter(&rendered)
            .map(Some)
            .ok_or_else(|| format!("no directive letter for type {:?}", rendered))
    }

    fn call(
        &mut self,
        forest: &mut Forest,
        call: NodeId,
        name: &str,
        index: usize,
    ) -> Result<(), MigrateError> {
        let NodeKind::Call { args, .. } = forest.kind(call).clone() else {
            return Ok(());
        };
        if index >= args.len() {
            return Err(self.error(forest, call, format!("too few arguments in call to {}", name)));
        }
        let format_arg = args[index];
        let format = match self.info.value(format_arg) {
            Some(ConstValue::Str(s)) => s.clone(),
            Some(_) => {
                return Err(self.error(
                    forest,
                    format_arg,
                    format!("format argument of {} is not a string", name),
                ))
            }
            None if self.exempt => return Ok(()),
            None => {
                return Err(MigrateError::NonConstantFormat {
                    position: self.position(forest, format_arg),
                    source_text: crate::printer::print_expr(forest, format_arg),
                    callee: name.to_owned(),
                })
            }
        };

        let first = index + 1;
        let trailing = args.len() - first;
        if !format.contains('%') {
            if trailing > 0 {
                return Err(self.error(
                    forest,
                    call,
                    format!("no formatting directive in {} call", name),
                ));
            }
            return Ok(());
        }
        let verbs = directives(&format);
        if verbs.len() != trailing {
            return Err(self.error(
                forest,
                call,
                format!(
                    "wrong number of args for format in {} call: {} needed but {} args",
                    name,
                    verbs.len(),
                    trailing
                ),
            ));
        }

        let mut new_format = String::with_capacity(format.len());
        let mut new_args = args.clone();
        let mut last = 0;
        let mut changed = false;
        for (verb, &arg) in verbs.iter().zip(&args[first..]) {
            if Some(verb.letter) != self.from_letter {
                continue;
            }
            let letter = match self.arg_letter(arg) {
                Ok(Some(l)) => l,
                Ok(None) => continue,
                Err(message) => return Err(self.error(forest, arg, message)),
            };
            if letter == verb.letter {
                continue;
            }
            changed = true;
            match self.shim {
                None => {
                    new_format.push_str(&format[last..verb.end - 1]);
                    new_format.push(letter);
                }
                Some(shim) => {
                    new_format.push_str(&format[last..verb.start]);
                    new_format.push_str("%s");
                    let slot = new_args.iter().position(|&a| a == arg).unwrap_or(first);
                    new_args[slot] = forest.call_ident(shim, vec![arg]);
                }
            }
            last = verb.end;
        }
        if !changed {
            return Ok(());
        }
        new_format.push_str(&format[last..]);
        new_args[index] = forest.synth(NodeKind::BasicLit {
            kind: LitKind::Str,
            value: quote(&new_format),
        });
        if let NodeKind::Call { args, .. } = forest.kind_mut(call) {
            *args = new_args;
        }
        tracing::debug!(callee = name, format = %new_format, "rewrote format call");
        self.rewritten += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_file;
    use std::path::PathBuf;

    fn default_printf() -> BTreeMap<String, usize> {
        [("printf", 0), ("sprintf", 0), ("fprintf", 1), ("errorf", 0)]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect()
    }

    fn run(
        src: &str,
        exempt: &[&str],
        shims: &[(&str, &str)],
    ) -> (Result<usize, MigrateError>, String) {
        let mut u = Unit::parse("main", &[(PathBuf::from("/w/main.go"), src.to_owned())]).unwrap();
        u.check();
        assert!(u.diagnostics.is_empty(), "{:?}", u.diagnostics);
        let exempt = exempt.iter().map(|s| s.to_string()).collect();
        let shims = shims
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let result = format_unit(&mut u, "int", &exempt, &shims, &default_printf());
        let out = print_file(&u.forest, u.files[0].root);
        (result, out)
    }

    const FLOAT_ARG: &str = "package main\n\nimport \"fmt\"\n\nfunc show(n float64) {\n\tfmt.Printf(\"val=%d\\n\", n)\n}\n";

    #[test]
    fn directives_skip_literal_percent() {
        let verbs = directives("100%% of %5.2f and %[1]d %");
        let letters: Vec<char> = verbs.iter().map(|v| v.letter).collect();
        assert_eq!(letters, vec!['f', 'd']);
        assert_eq!(&"100%% of %5.2f and %[1]d %"[verbs[0].start..verbs[0].end], "%5.2f");
    }

    #[test]
    fn integer_directive_becomes_float() {
        let (result, out) = run(FLOAT_ARG, &[], &[]);
        assert_eq!(result.unwrap(), 1);
        assert!(out.contains("fmt.Printf(\"val=%f\\n\", n)"), "{}", out);
    }

    #[test]
    fn shim_wraps_argument() {
        let (result, out) = run(FLOAT_ARG, &[], &[("main", "toI")]);
        assert_eq!(result.unwrap(), 1);
        assert!(out.contains("fmt.Printf(\"val=%s\\n\", toI(n))"), "{}", out);
    }

    #[test]
    fn matching_types_are_left_alone() {
        let src = "package main\n\nimport \"fmt\"\n\nfunc show(n int, s string) string {\n\treturn fmt.Sprintf(\"%d %s %%\", n, s)\n}\n";
        let (result, out) = run(src, &[], &[]);
        assert_eq!(result.unwrap(), 0);
        assert!(out.contains("fmt.Sprintf(\"%d %s %%\", n, s)"), "{}", out);
    }

    #[test]
    fn only_source_family_directives_change() {
        let src = "package main\n\nimport \"fmt\"\n\nfunc show(a, b float64) {\n\tfmt.Printf(\"%v %d\", a, b)\n}\n";
        let (_, out) = run(src, &[], &[]);
        assert!(out.contains("fmt.Printf(\"%v %f\", a, b)"), "{}", out);
    }

    #[test]
    fn non_constant_format_is_recoverable() {
        let src = "package main\n\nimport \"fmt\"\n\nfunc show(f string, n float64) {\n\tfmt.Printf(f, n)\n}\n";
        let (result, _) = run(src, &[], &[]);
        let err = result.unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "/w/main.go:6:13: can't check non-constant format \"f\" in call to Printf"
        );
    }

    #[test]
    fn exempt_files_allow_non_constant_formats() {
        let src = "package main\n\nimport \"fmt\"\n\nfunc show(f string, n float64) {\n\tfmt.Printf(f, n)\n}\n";
        let (result, _) = run(src, &["main"], &[]);
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let src = "package main\n\nimport \"fmt\"\n\nfunc show(n float64) {\n\tfmt.Printf(\"%d %d\", n)\n}\n";
        let (result, _) = run(src, &[], &[]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), "format");
        assert!(err
            .to_string()
            .ends_with("wrong number of args for format in Printf call: 2 needed but 1 args"));
    }

    #[test]
    fn trailing_args_without_directive_is_an_error() {
        let src = "package main\n\nimport \"fmt\"\n\nfunc show(n float64) {\n\tfmt.Printf(\"plain\", n)\n}\n";
        let (result, _) = run(src, &[], &[]);
        assert!(result
            .unwrap_err()
            .to_string()
            .ends_with("no formatting directive in Printf call"));
    }

    #[test]
    fn type_without_letter_is_an_error() {
        let src = "package main\n\nimport \"fmt\"\n\nfunc show(s string) {\n\tfmt.Printf(\"%d\", s)\n}\n";
        let (result, _) = run(src, &[], &[]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("no directive letter for type \"string\""));
    }
}
