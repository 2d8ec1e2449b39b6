//! Type representation for the checker.
//!
//! Named types live in a [`TypeTable`] and are referenced by [`NamedId`];
//! every other type is structural and compared field by field.

use crate::ast::{ChanDir, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    /// Alias of `uint8` that keeps its own name in messages
    Byte,
    /// Alias of `int32` that keeps its own name in messages
    Rune,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::String => "string",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Byte => "byte",
            BasicKind::Rune => "rune",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    /// `byte` and `rune` collapse onto the kinds they alias.
    pub fn canonical(self) -> BasicKind {
        match self {
            BasicKind::Byte => BasicKind::Uint8,
            BasicKind::Rune => BasicKind::Int32,
            k => k,
        }
    }

    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self.canonical(),
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self.canonical(),
            BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            BasicKind::Float32 | BasicKind::Float64 | BasicKind::UntypedFloat
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_string(self) -> bool {
        matches!(self, BasicKind::String | BasicKind::UntypedString)
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, BasicKind::Bool | BasicKind::UntypedBool)
    }

    /// Inclusive value range of a typed integer kind.
    pub fn int_range(self) -> Option<(i128, i128)> {
        Some(match self.canonical() {
            BasicKind::Int8 => (i8::MIN as i128, i8::MAX as i128),
            BasicKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
            BasicKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            BasicKind::Int | BasicKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            BasicKind::Uint8 => (0, u8::MAX as i128),
            BasicKind::Uint16 => (0, u16::MAX as i128),
            BasicKind::Uint32 => (0, u32::MAX as i128),
            BasicKind::Uint | BasicKind::Uint64 | BasicKind::Uintptr => (0, u64::MAX as i128),
            _ => return None,
        })
    }

    /// Rank among untyped numeric kinds; the larger rank wins when two
    /// untyped operands meet.
    pub(crate) fn untyped_rank(self) -> u8 {
        match self {
            BasicKind::UntypedInt => 1,
            BasicKind::UntypedRune => 2,
            BasicKind::UntypedFloat => 3,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Unknown or erroneous; operations on it never report
    Invalid,
    Basic(BasicKind),
    Named(NamedId),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array(i64, Box<Type>),
    Map(Box<Type>, Box<Type>),
    Chan(ChanDir, Box<Type>),
    Func(Box<Signature>),
    Struct(Vec<StructField>),
    /// The empty interface
    Interface,
    /// Result list of a multi-value call
    Tuple(Vec<Type>),
}

impl Type {
    pub fn basic(kind: BasicKind) -> Type {
        Type::Basic(kind)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Type::Basic(k) if k.is_untyped())
    }

    pub fn basic_kind(&self) -> Option<BasicKind> {
        match self {
            Type::Basic(k) => Some(*k),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    /// The last parameter is `...T`, stored as `[]T`
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub embedded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub sig: Signature,
    pub decl: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    /// Display name, package-qualified for standard-library types
    pub name: String,
    /// Never itself a `Named`
    pub underlying: Type,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    named: Vec<NamedType>,
}

impl TypeTable {
    pub fn new() -> Self {
        TypeTable::default()
    }

    pub fn add_named(&mut self, name: impl Into<String>) -> NamedId {
        let id = NamedId(self.named.len() as u32);
        self.named.push(NamedType {
            name: name.into(),
            underlying: Type::Invalid,
            methods: Vec::new(),
        });
        id
    }

    pub fn named(&self, id: NamedId) -> &NamedType {
        &self.named[id.0 as usize]
    }

    pub fn named_mut(&mut self, id: NamedId) -> &mut NamedType {
        &mut self.named[id.0 as usize]
    }

    pub fn underlying<'t>(&'t self, t: &'t Type) -> &'t Type {
        match t {
            Type::Named(id) => &self.named(*id).underlying,
            other => other,
        }
    }

    /// Basic kind of the underlying type, if basic.
    pub fn basic_of(&self, t: &Type) -> Option<BasicKind> {
        self.underlying(t).basic_kind()
    }

    pub fn is_integer(&self, t: &Type) -> bool {
        self.basic_of(t).is_some_and(BasicKind::is_integer)
    }

    pub fn is_float(&self, t: &Type) -> bool {
        self.basic_of(t).is_some_and(BasicKind::is_float)
    }

    pub fn is_numeric(&self, t: &Type) -> bool {
        self.basic_of(t).is_some_and(BasicKind::is_numeric)
    }

    pub fn is_string(&self, t: &Type) -> bool {
        self.basic_of(t).is_some_and(BasicKind::is_string)
    }

    pub fn is_boolean(&self, t: &Type) -> bool {
        self.basic_of(t).is_some_and(BasicKind::is_boolean)
    }

    pub fn is_interface(&self, t: &Type) -> bool {
        matches!(self.underlying(t), Type::Interface)
    }

    /// Types that can be compared with `==` against a value of the same type.
    pub fn is_comparable(&self, t: &Type) -> bool {
        match self.underlying(t) {
            Type::Slice(_) | Type::Map(..) | Type::Func(_) => false,
            Type::Struct(fields) => fields.iter().all(|f| self.is_comparable(&f.ty)),
            Type::Array(_, elem) => self.is_comparable(elem),
            _ => true,
        }
    }

    pub fn is_ordered(&self, t: &Type) -> bool {
        self.basic_of(t)
            .is_some_and(|k| k.is_numeric() || k.is_string())
    }

    /// Types a bare `nil` converts to.
    pub fn has_nil(&self, t: &Type) -> bool {
        matches!(
            self.underlying(t),
            Type::Pointer(_)
                | Type::Slice(_)
                | Type::Map(..)
                | Type::Chan(..)
                | Type::Func(_)
                | Type::Interface
                | Type::Basic(BasicKind::UntypedNil)
        )
    }

    pub fn identical(&self, a: &Type, b: &Type) -> bool {
        match (a, b) {
            (Type::Basic(x), Type::Basic(y)) => x.canonical() == y.canonical(),
            (Type::Named(x), Type::Named(y)) => x == y,
            (Type::Pointer(x), Type::Pointer(y)) | (Type::Slice(x), Type::Slice(y)) => {
                self.identical(x, y)
            }
            (Type::Array(n, x), Type::Array(m, y)) => n == m && self.identical(x, y),
            (Type::Map(k1, v1), Type::Map(k2, v2)) => {
                self.identical(k1, k2) && self.identical(v1, v2)
            }
            (Type::Chan(d1, x), Type::Chan(d2, y)) => d1 == d2 && self.identical(x, y),
            (Type::Func(x), Type::Func(y)) => {
                x.variadic == y.variadic
                    && self.identical_list(&x.params, &y.params)
                    && self.identical_list(&x.results, &y.results)
            }
            (Type::Struct(x), Type::Struct(y)) => {
                x.len() == y.len()
                    && x.iter().zip(y).all(|(f, g)| {
                        f.name == g.name && f.embedded == g.embedded && self.identical(&f.ty, &g.ty)
                    })
            }
            (Type::Interface, Type::Interface) => true,
            (Type::Tuple(x), Type::Tuple(y)) => self.identical_list(x, y),
            _ => false,
        }
    }

    fn identical_list(&self, a: &[Type], b: &[Type]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.identical(x, y))
    }

    /// Predeclared and declared types are both "named" for assignability.
    pub fn is_named(&self, t: &Type) -> bool {
        matches!(t, Type::Named(_) | Type::Basic(_))
    }

    /// Method set lookup on a named type (or a pointer to one).
    pub fn method(&self, t: &Type, name: &str) -> Option<&Method> {
        let t = match t {
            Type::Pointer(base) => base.as_ref(),
            other => other,
        };
        match t {
            Type::Named(id) => self.named(*id).methods.iter().find(|m| m.name == name),
            _ => None,
        }
    }

    pub fn type_string(&self, t: &Type) -> String {
        let mut out = String::new();
        self.write_type(&mut out, t);
        out
    }

    fn write_type(&self, out: &mut String, t: &Type) {
        match t {
            Type::Invalid => out.push_str("invalid type"),
            Type::Basic(k) => out.push_str(k.name()),
            Type::Named(id) => out.push_str(&self.named(*id).name),
            Type::Pointer(x) => {
                out.push('*');
                self.write_type(out, x);
            }
            Type::Slice(x) => {
                out.push_str("[]");
                self.write_type(out, x);
            }
            Type::Array(n, x) => {
                out.push_str(&format!("[{}]", n));
                self.write_type(out, x);
            }
            Type::Map(k, v) => {
                out.push_str("map[");
                self.write_type(out, k);
                out.push(']');
                self.write_type(out, v);
            }
            Type::Chan(dir, x) => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.write_type(out, x);
            }
            Type::Func(sig) => {
                out.push_str("func");
                self.write_signature(out, sig);
            }
            Type::Struct(fields) => {
                out.push_str("struct{");
                for (i, f) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if !f.embedded {
                        out.push_str(&f.name);
                        out.push(' ');
                    }
                    self.write_type(out, &f.ty);
                }
                out.push('}');
            }
            Type::Interface => out.push_str("interface{}"),
            Type::Tuple(list) => {
                out.push('(');
                self.write_list(out, list);
                out.push(')');
            }
        }
    }

    fn write_signature(&self, out: &mut String, sig: &Signature) {
        out.push('(');
        for (i, p) in sig.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            match p {
                Type::Slice(elem) if sig.variadic && i + 1 == sig.params.len() => {
                    out.push_str("...");
                    self.write_type(out, elem);
                }
                _ => self.write_type(out, p),
            }
        }
        out.push(')');
        match sig.results.as_slice() {
            [] => {}
            [one] => {
                out.push(' ');
                self.write_type(out, one);
            }
            many => {
                out.push_str(" (");
                self.write_list(out, many);
                out.push(')');
            }
        }
    }

    fn write_list(&self, out: &mut String, list: &[Type]) {
        for (i, t) in list.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_type(out, t);
        }
    }
}

/// Type an untyped value takes when nothing else decides.
pub fn default_type(t: &Type) -> Type {
    match t {
        Type::Basic(k) => Type::Basic(match k {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Rune,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedString => BasicKind::String,
            other => *other,
        }),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_is_identical_to_uint8_but_prints_as_byte() {
        let table = TypeTable::new();
        let byte = Type::Basic(BasicKind::Byte);
        assert!(table.identical(&byte, &Type::Basic(BasicKind::Uint8)));
        assert_eq!(table.type_string(&Type::Slice(Box::new(byte))), "[]byte");
    }

    #[test]
    fn named_types_are_distinct_from_their_underlying() {
        let mut table = TypeTable::new();
        let id = table.add_named("Celsius");
        table.named_mut(id).underlying = Type::Basic(BasicKind::Float64);
        let named = Type::Named(id);
        assert!(!table.identical(&named, &Type::Basic(BasicKind::Float64)));
        assert!(table.is_float(&named));
        assert_eq!(table.type_string(&named), "Celsius");
    }

    #[test]
    fn signature_strings_show_variadics_and_results() {
        let table = TypeTable::new();
        let sig = Signature {
            params: vec![
                Type::Basic(BasicKind::String),
                Type::Slice(Box::new(Type::Interface)),
            ],
            results: vec![Type::Basic(BasicKind::Int), Type::Basic(BasicKind::Bool)],
            variadic: true,
        };
        assert_eq!(
            table.type_string(&Type::Func(Box::new(sig))),
            "func(string, ...interface{}) (int, bool)"
        );
    }

    #[test]
    fn untyped_defaults() {
        assert_eq!(
            default_type(&Type::Basic(BasicKind::UntypedFloat)),
            Type::Basic(BasicKind::Float64)
        );
        assert_eq!(
            default_type(&Type::Basic(BasicKind::UntypedRune)),
            Type::Basic(BasicKind::Rune)
        );
    }
}
