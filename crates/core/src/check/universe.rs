//! Predeclared identifiers and the standard-library surface the checker
//! knows about.
//!
//! Package members are written as Go type or expression text and
//! resolved by the checker on first use. Imports outside this table are
//! opaque: their members type as `Invalid` and never produce diagnostics.

use super::constant::ConstValue;
use super::types::BasicKind;
use crate::ast::{Forest, LitKind, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Append,
    Cap,
    Copy,
    Delete,
    Len,
    Make,
    New,
    Panic,
    Print,
    Println,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Append => "append",
            Builtin::Cap => "cap",
            Builtin::Copy => "copy",
            Builtin::Delete => "delete",
            Builtin::Len => "len",
            Builtin::Make => "make",
            Builtin::New => "new",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
        }
    }
}

pub fn builtin(name: &str) -> Option<Builtin> {
    Some(match name {
        "append" => Builtin::Append,
        "cap" => Builtin::Cap,
        "copy" => Builtin::Copy,
        "delete" => Builtin::Delete,
        "len" => Builtin::Len,
        "make" => Builtin::Make,
        "new" => Builtin::New,
        "panic" => Builtin::Panic,
        "print" => Builtin::Print,
        "println" => Builtin::Println,
        _ => return None,
    })
}

pub fn basic_type(name: &str) -> Option<BasicKind> {
    Some(match name {
        "bool" => BasicKind::Bool,
        "string" => BasicKind::String,
        "int" => BasicKind::Int,
        "int8" => BasicKind::Int8,
        "int16" => BasicKind::Int16,
        "int32" => BasicKind::Int32,
        "int64" => BasicKind::Int64,
        "uint" => BasicKind::Uint,
        "uint8" => BasicKind::Uint8,
        "uint16" => BasicKind::Uint16,
        "uint32" => BasicKind::Uint32,
        "uint64" => BasicKind::Uint64,
        "uintptr" => BasicKind::Uintptr,
        "float32" => BasicKind::Float32,
        "float64" => BasicKind::Float64,
        "byte" => BasicKind::Byte,
        "rune" => BasicKind::Rune,
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Text is a `func(...)` type
    Func,
    /// Text is the variable's type
    Var,
    /// Text is `expr` (untyped) or `T = expr`
    Const,
    /// Text is the underlying type; methods come from [`STD_METHODS`]
    Type,
}

type Member = (&'static str, MemberKind, &'static str);

use MemberKind::{Const, Func, Type, Var};

const PACKAGES: &[(&str, &[Member])] = &[
    (
        "fmt",
        &[
            ("Print", Func, "func(a ...interface{}) (n int, err error)"),
            ("Println", Func, "func(a ...interface{}) (n int, err error)"),
            ("Printf", Func, "func(format string, a ...interface{}) (n int, err error)"),
            ("Sprint", Func, "func(a ...interface{}) string"),
            ("Sprintln", Func, "func(a ...interface{}) string"),
            ("Sprintf", Func, "func(format string, a ...interface{}) string"),
            ("Errorf", Func, "func(format string, a ...interface{}) error"),
            ("Fprint", Func, "func(w io.Writer, a ...interface{}) (n int, err error)"),
            ("Fprintln", Func, "func(w io.Writer, a ...interface{}) (n int, err error)"),
            (
                "Fprintf",
                Func,
                "func(w io.Writer, format string, a ...interface{}) (n int, err error)",
            ),
            ("Sscan", Func, "func(str string, a ...interface{}) (n int, err error)"),
            (
                "Sscanf",
                Func,
                "func(str string, format string, a ...interface{}) (n int, err error)",
            ),
        ],
    ),
    (
        "strconv",
        &[
            ("Itoa", Func, "func(i int) string"),
            ("Atoi", Func, "func(s string) (int, error)"),
            ("ParseInt", Func, "func(s string, base int, bitSize int) (int64, error)"),
            ("ParseFloat", Func, "func(s string, bitSize int) (float64, error)"),
            ("ParseBool", Func, "func(str string) (bool, error)"),
            ("FormatInt", Func, "func(i int64, base int) string"),
            (
                "FormatFloat",
                Func,
                "func(f float64, fmt byte, prec, bitSize int) string",
            ),
            ("FormatBool", Func, "func(b bool) string"),
            ("Quote", Func, "func(s string) string"),
        ],
    ),
    (
        "math",
        &[
            ("Abs", Func, "func(x float64) float64"),
            ("Ceil", Func, "func(x float64) float64"),
            ("Cos", Func, "func(x float64) float64"),
            ("Exp", Func, "func(x float64) float64"),
            ("Floor", Func, "func(x float64) float64"),
            ("Hypot", Func, "func(p, q float64) float64"),
            ("Inf", Func, "func(sign int) float64"),
            ("IsInf", Func, "func(f float64, sign int) bool"),
            ("IsNaN", Func, "func(f float64) bool"),
            ("Log", Func, "func(x float64) float64"),
            ("Max", Func, "func(x, y float64) float64"),
            ("Min", Func, "func(x, y float64) float64"),
            ("Mod", Func, "func(x, y float64) float64"),
            ("NaN", Func, "func() float64"),
            ("Pow", Func, "func(x, y float64) float64"),
            ("Round", Func, "func(x float64) float64"),
            ("Sin", Func, "func(x float64) float64"),
            ("Sqrt", Func, "func(x float64) float64"),
            ("Trunc", Func, "func(x float64) float64"),
            ("E", Const, "2.71828182845904523536028747135266249775724709369995957496696763"),
            ("Pi", Const, "3.14159265358979323846264338327950288419716939937510582097494459"),
            ("MaxInt", Const, "1<<63 - 1"),
            ("MinInt", Const, "-1 << 63"),
            ("MaxInt8", Const, "1<<7 - 1"),
            ("MaxInt16", Const, "1<<15 - 1"),
            ("MaxInt32", Const, "1<<31 - 1"),
            ("MinInt32", Const, "-1 << 31"),
            ("MaxInt64", Const, "1<<63 - 1"),
            ("MinInt64", Const, "-1 << 63"),
            ("MaxUint8", Const, "1<<8 - 1"),
            ("MaxUint16", Const, "1<<16 - 1"),
            ("MaxUint32", Const, "1<<32 - 1"),
            ("MaxFloat32", Const, "3.40282346638528859811704183484516925440e+38"),
            ("MaxFloat64", Const, "1.79769313486231570814527423731704356798070e+308"),
            ("SmallestNonzeroFloat64", Const, "4.9406564584124654417656879286822137236505980e-324"),
        ],
    ),
    (
        "math/rand",
        &[
            ("Float32", Func, "func() float32"),
            ("Float64", Func, "func() float64"),
            ("Int", Func, "func() int"),
            ("Int31", Func, "func() int32"),
            ("Int31n", Func, "func(n int32) int32"),
            ("Int63", Func, "func() int64"),
            ("Int63n", Func, "func(n int64) int64"),
            ("Intn", Func, "func(n int) int"),
            ("Perm", Func, "func(n int) []int"),
            ("Seed", Func, "func(seed int64)"),
            ("Shuffle", Func, "func(n int, swap func(i, j int))"),
        ],
    ),
    (
        "flag",
        &[
            ("Arg", Func, "func(i int) string"),
            ("Args", Func, "func() []string"),
            ("Bool", Func, "func(name string, value bool, usage string) *bool"),
            ("BoolVar", Func, "func(p *bool, name string, value bool, usage string)"),
            ("Float64", Func, "func(name string, value float64, usage string) *float64"),
            (
                "Float64Var",
                Func,
                "func(p *float64, name string, value float64, usage string)",
            ),
            ("Int", Func, "func(name string, value int, usage string) *int"),
            ("IntVar", Func, "func(p *int, name string, value int, usage string)"),
            ("NArg", Func, "func() int"),
            ("Parse", Func, "func()"),
            ("String", Func, "func(name string, value string, usage string) *string"),
            (
                "StringVar",
                Func,
                "func(p *string, name string, value string, usage string)",
            ),
            ("Usage", Var, "func()"),
        ],
    ),
    (
        "os",
        &[
            ("Args", Var, "[]string"),
            ("Exit", Func, "func(code int)"),
            ("Getenv", Func, "func(key string) string"),
            ("Stderr", Var, "*os.File"),
            ("Stdin", Var, "*os.File"),
            ("Stdout", Var, "*os.File"),
            ("File", Type, "struct{}"),
        ],
    ),
    (
        "io",
        &[
            ("Reader", Type, "interface{}"),
            ("Writer", Type, "interface{}"),
            ("EOF", Var, "error"),
        ],
    ),
    (
        "strings",
        &[
            ("Contains", Func, "func(s, substr string) bool"),
            ("Fields", Func, "func(s string) []string"),
            ("HasPrefix", Func, "func(s, prefix string) bool"),
            ("HasSuffix", Func, "func(s, suffix string) bool"),
            ("Index", Func, "func(s, substr string) int"),
            ("Join", Func, "func(elems []string, sep string) string"),
            ("Repeat", Func, "func(s string, count int) string"),
            ("Replace", Func, "func(s, old, new string, n int) string"),
            ("Split", Func, "func(s, sep string) []string"),
            ("ToLower", Func, "func(s string) string"),
            ("ToUpper", Func, "func(s string) string"),
            ("TrimSpace", Func, "func(s string) string"),
            ("Builder", Type, "struct{}"),
        ],
    ),
    ("errors", &[("New", Func, "func(text string) error")]),
    (
        "log",
        &[
            ("Fatal", Func, "func(v ...interface{})"),
            ("Fatalf", Func, "func(format string, v ...interface{})"),
            ("Fatalln", Func, "func(v ...interface{})"),
            ("Panic", Func, "func(v ...interface{})"),
            ("Panicf", Func, "func(format string, v ...interface{})"),
            ("Print", Func, "func(v ...interface{})"),
            ("Printf", Func, "func(format string, v ...interface{})"),
            ("Println", Func, "func(v ...interface{})"),
        ],
    ),
    (
        "sort",
        &[
            ("Float64s", Func, "func(x []float64)"),
            ("Ints", Func, "func(x []int)"),
            ("Strings", Func, "func(x []string)"),
            ("Slice", Func, "func(x interface{}, less func(i, j int) bool)"),
        ],
    ),
    (
        "time",
        &[
            ("Duration", Type, "int64"),
            ("Now", Func, "func() time.Time"),
            ("Since", Func, "func(t time.Time) time.Duration"),
            ("Sleep", Func, "func(d time.Duration)"),
            ("Time", Type, "struct{}"),
            ("Nanosecond", Const, "time.Duration = 1"),
            ("Microsecond", Const, "time.Duration = 1000"),
            ("Millisecond", Const, "time.Duration = 1000000"),
            ("Second", Const, "time.Duration = 1000000000"),
            ("Minute", Const, "time.Duration = 60000000000"),
            ("Hour", Const, "time.Duration = 3600000000000"),
        ],
    ),
];

/// Methods of named standard types, keyed by qualified name.
pub const STD_METHODS: &[(&str, &[(&str, &str)])] = &[
    ("error", &[("Error", "func() string")]),
    ("io.Reader", &[("Read", "func(p []byte) (n int, err error)")]),
    ("io.Writer", &[("Write", "func(p []byte) (n int, err error)")]),
    (
        "os.File",
        &[
            ("Close", "func() error"),
            ("Write", "func(b []byte) (n int, err error)"),
            ("WriteString", "func(s string) (n int, err error)"),
        ],
    ),
    (
        "strings.Builder",
        &[
            ("Len", "func() int"),
            ("String", "func() string"),
            ("WriteByte", "func(c byte) error"),
            ("WriteString", "func(s string) (int, error)"),
        ],
    ),
    (
        "time.Duration",
        &[
            ("Milliseconds", "func() int64"),
            ("Seconds", "func() float64"),
            ("String", "func() string"),
        ],
    ),
    ("time.Time", &[("Sub", "func(u time.Time) time.Duration"), ("Unix", "func() int64")]),
];

pub fn is_std_package(path: &str) -> bool {
    PACKAGES.iter().any(|(p, _)| *p == path)
}

pub fn std_member(path: &str, name: &str) -> Option<(MemberKind, &'static str)> {
    let (_, members) = PACKAGES.iter().find(|(p, _)| *p == path)?;
    members
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, kind, text)| (*kind, *text))
}

pub fn std_methods(qualified: &str) -> &'static [(&'static str, &'static str)] {
    STD_METHODS
        .iter()
        .find(|(n, _)| *n == qualified)
        .map(|(_, m)| *m)
        .unwrap_or(&[])
}

/// Default package name of an import path: its last element.
pub fn package_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Fold a constant expression from the member table: literals, unary
/// minus and the binary operators the table uses.
pub fn fold_const(forest: &Forest, id: NodeId) -> Option<ConstValue> {
    match forest.kind(id) {
        NodeKind::BasicLit {
            kind: LitKind::Int,
            value,
        } => ConstValue::parse_int(value).map(ConstValue::Int),
        NodeKind::BasicLit {
            kind: LitKind::Float,
            value,
        } => ConstValue::parse_float(value).map(ConstValue::Float),
        NodeKind::Paren { x } => fold_const(forest, *x),
        NodeKind::Unary { op, x } => ConstValue::unary(op, &fold_const(forest, *x)?),
        NodeKind::Binary { op, x, y } => {
            let x = fold_const(forest, *x)?;
            let y = fold_const(forest, *y)?;
            match *op {
                "<<" | ">>" => ConstValue::shift(op, &x, u32::try_from(y.as_int()?).ok()?),
                _ => ConstValue::binary(op, &x, &y, true).ok(),
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    #[test]
    fn members_resolve_by_path() {
        assert_eq!(
            std_member("math/rand", "Intn"),
            Some((MemberKind::Func, "func(n int) int"))
        );
        assert!(std_member("fmt", "Nope").is_none());
        assert!(!is_std_package("github.com/x/y"));
    }

    #[test]
    fn package_names_are_the_last_path_element() {
        assert_eq!(package_name("math/rand"), "rand");
        assert_eq!(package_name("fmt"), "fmt");
    }

    #[test]
    fn table_constants_fold() {
        let mut f = Forest::new();
        let e = parse_expr("1<<31 - 1", &mut f).unwrap();
        assert_eq!(fold_const(&f, e), Some(ConstValue::Int(2147483647)));
        let e = parse_expr("-1 << 63", &mut f).unwrap();
        assert_eq!(fold_const(&f, e), Some(ConstValue::Int(i64::MIN as i128)));
    }
}
