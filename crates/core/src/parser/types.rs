use super::Parser;
use crate::ast::{ChanDir, NodeId, NodeKind};
use crate::error::SyntaxError;
use crate::lexer::{self, Token};

/// One comma-separated entry of a parameter list before names and types
/// are sorted out: `T`, `name T` or `name ...T`.
struct ParamEntry {
    start: u32,
    name: Option<String>,
    ty: NodeId,
}

impl<'a> Parser<'a> {
    pub(super) fn is_type_start(&self) -> bool {
        match self.peek() {
            Token::Word(w) => {
                !lexer::is_keyword(w)
                    || matches!(w.as_str(), "map" | "chan" | "func" | "struct" | "interface")
            }
            Token::Op(op) => matches!(*op, "*" | "[" | "(" | "<-" | "..."),
            _ => false,
        }
    }

    pub(super) fn parse_type(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        match self.peek().clone() {
            Token::Word(w) if !lexer::is_keyword(&w) => self.parse_type_name(),
            Token::Word(w) => match w.as_str() {
                "map" => {
                    self.advance();
                    self.expect_op("[")?;
                    let key = self.parse_type()?;
                    self.expect_op("]")?;
                    let value = self.parse_type()?;
                    Ok(self.finish(NodeKind::MapType { key, value }, start))
                }
                "chan" => {
                    self.advance();
                    let dir = if self.eat_op("<-") {
                        ChanDir::Send
                    } else {
                        ChanDir::Both
                    };
                    let elt = self.parse_type()?;
                    Ok(self.finish(NodeKind::ChanType { dir, elt }, start))
                }
                "func" => {
                    self.advance();
                    self.parse_signature(start)
                }
                "struct" => self.parse_struct_type(),
                "interface" => {
                    self.advance();
                    self.expect_op("{")?;
                    if !self.is_op("}") {
                        return Err(self.err("only the empty interface is supported"));
                    }
                    self.advance();
                    Ok(self.finish(NodeKind::InterfaceType, start))
                }
                _ => Err(self.unexpected("type")),
            },
            Token::Op("*") => {
                self.advance();
                let x = self.parse_type()?;
                Ok(self.finish(NodeKind::Star { x }, start))
            }
            Token::Op("<-") => {
                self.advance();
                self.expect_word("chan")?;
                let elt = self.parse_type()?;
                Ok(self.finish(
                    NodeKind::ChanType {
                        dir: ChanDir::Recv,
                        elt,
                    },
                    start,
                ))
            }
            Token::Op("[") => {
                self.advance();
                let len = if self.eat_op("]") {
                    None
                } else {
                    let len = if self.is_op("...") {
                        let s = self.start();
                        self.advance();
                        self.finish(NodeKind::Ellipsis { elt: None }, s)
                    } else {
                        self.with_expr_lev(0, |p| p.parse_expr())?
                    };
                    self.expect_op("]")?;
                    Some(len)
                };
                let elt = self.parse_type()?;
                Ok(self.finish(NodeKind::ArrayType { len, elt }, start))
            }
            Token::Op("(") => {
                self.advance();
                let x = self.parse_type()?;
                self.expect_op(")")?;
                Ok(self.finish(NodeKind::Paren { x }, start))
            }
            _ => Err(self.unexpected("type")),
        }
    }

    /// `T` or `pkg.T`
    fn parse_type_name(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        let name = self.take_ident()?;
        let id = self.finish(NodeKind::Ident { name }, start);
        if self.is_op(".") {
            self.advance();
            let sel = self.take_ident()?;
            return Ok(self.finish(NodeKind::Selector { x: id, sel }, start));
        }
        Ok(id)
    }

    pub(super) fn parse_struct_type(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        self.expect_word("struct")?;
        let list_start = self.start();
        self.expect_op("{")?;
        let mut fields = Vec::new();
        while !self.is_op("}") {
            let item = self.begin_item();
            let field_start = self.start();
            // `a, b T` or an embedded `T` / `*T`
            let embedded = matches!(self.peek_at(1), Token::Semi | Token::Op("}") | Token::Op("."))
                || self.is_op("*");
            let field = if embedded {
                let ty = self.parse_type()?;
                self.finish(
                    NodeKind::Field {
                        names: Vec::new(),
                        ty,
                    },
                    field_start,
                )
            } else {
                let names = self.ident_list()?;
                let ty = self.parse_type()?;
                self.finish(NodeKind::Field { names, ty }, field_start)
            };
            self.end_item(field, item);
            self.expect_semi()?;
            fields.push(field);
        }
        let tail = self.tail_comments();
        self.expect_op("}")?;
        let list = self.finish(NodeKind::FieldList { fields }, list_start);
        self.forest.trivia_mut(list).inner_tail = tail;
        Ok(self.finish(NodeKind::StructType { fields: list }, start))
    }

    /// Parameters and optional results, after `func` and any name.
    pub(super) fn parse_signature(&mut self, start: u32) -> Result<NodeId, SyntaxError> {
        let params = self.parse_params()?;
        let results = if self.is_op("(") {
            Some(self.parse_params()?)
        } else if self.is_type_start() && !self.is_op("...") {
            let rs = self.start();
            let ty = self.parse_type()?;
            let field = self.finish(
                NodeKind::Field {
                    names: Vec::new(),
                    ty,
                },
                rs,
            );
            Some(self.finish(NodeKind::FieldList { fields: vec![field] }, rs))
        } else {
            None
        };
        Ok(self.finish(NodeKind::FuncType { params, results }, start))
    }

    /// `( ... )` parameter list, grouped into fields the way Go reads them:
    /// if any entry is named, every bare identifier before a named entry is
    /// another name for that entry's type.
    pub(super) fn parse_params(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        self.expect_op("(")?;
        let mut entries = Vec::new();
        while !self.is_op(")") {
            entries.push(self.parse_param_entry()?);
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(")")?;

        let named = entries.iter().any(|e| e.name.is_some());
        let mut fields = Vec::new();
        if named {
            let mut pending: Vec<(u32, String)> = Vec::new();
            for e in entries {
                match e.name {
                    Some(name) => {
                        let field_start = pending.first().map(|(s, _)| *s).unwrap_or(e.start);
                        let mut names: Vec<String> = pending.drain(..).map(|(_, n)| n).collect();
                        names.push(name);
                        let span_end = self.forest.span(e.ty).end;
                        let field = self.forest.alloc(
                            NodeKind::Field { names, ty: e.ty },
                            crate::ast::Span::new(field_start, span_end),
                        );
                        fields.push(field);
                    }
                    None => match self.forest.kind(e.ty) {
                        NodeKind::Ident { name } => pending.push((e.start, name.clone())),
                        _ => return Err(self.err("mixed named and unnamed parameters")),
                    },
                }
            }
            if !pending.is_empty() {
                return Err(self.err("mixed named and unnamed parameters"));
            }
        } else {
            for e in entries {
                let span = self.forest.span(e.ty);
                let field = self.forest.alloc(
                    NodeKind::Field {
                        names: Vec::new(),
                        ty: e.ty,
                    },
                    span,
                );
                fields.push(field);
            }
        }
        Ok(self.finish(NodeKind::FieldList { fields }, start))
    }

    fn parse_param_entry(&mut self) -> Result<ParamEntry, SyntaxError> {
        let start = self.start();
        if self.is_ident() {
            let next_starts_type = match self.peek_at(1) {
                Token::Word(w) => {
                    !lexer::is_keyword(w)
                        || matches!(w.as_str(), "map" | "chan" | "func" | "struct" | "interface")
                }
                Token::Op(op) => matches!(*op, "*" | "[" | "(" | "<-" | "..."),
                _ => false,
            };
            if next_starts_type {
                let name = self.take_ident()?;
                let ty = self.parse_param_type()?;
                return Ok(ParamEntry {
                    start,
                    name: Some(name),
                    ty,
                });
            }
        }
        let ty = self.parse_param_type()?;
        Ok(ParamEntry {
            start,
            name: None,
            ty,
        })
    }

    fn parse_param_type(&mut self) -> Result<NodeId, SyntaxError> {
        if self.is_op("...") {
            let start = self.start();
            self.advance();
            let elt = self.parse_type()?;
            return Ok(self.finish(NodeKind::Ellipsis { elt: Some(elt) }, start));
        }
        self.parse_type()
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Forest, NodeKind};
    use crate::parser::parse_type;

    fn field_shapes(f: &Forest, list: crate::ast::NodeId) -> Vec<usize> {
        match f.kind(list) {
            NodeKind::FieldList { fields } => fields
                .iter()
                .map(|id| match f.kind(*id) {
                    NodeKind::Field { names, .. } => names.len(),
                    _ => usize::MAX,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn shared_parameter_types_group_names() {
        let mut f = Forest::new();
        let t = parse_type("func(a, b int, s string) (n int, err error)", &mut f).unwrap();
        let NodeKind::FuncType { params, results } = f.kind(t).clone() else {
            panic!("not a func type");
        };
        assert_eq!(field_shapes(&f, params), vec![2, 1]);
        assert_eq!(field_shapes(&f, results.unwrap()), vec![1, 1]);
    }

    #[test]
    fn unnamed_parameters_stay_unnamed() {
        let mut f = Forest::new();
        let t = parse_type("func(int, []string) error", &mut f).unwrap();
        let NodeKind::FuncType { params, results } = f.kind(t).clone() else {
            panic!("not a func type");
        };
        assert_eq!(field_shapes(&f, params), vec![0, 0]);
        assert_eq!(field_shapes(&f, results.unwrap()), vec![0]);
    }

    #[test]
    fn variadic_parameter_is_an_ellipsis() {
        let mut f = Forest::new();
        let t = parse_type("func(format string, args ...interface{})", &mut f).unwrap();
        let NodeKind::FuncType { params, .. } = f.kind(t).clone() else {
            panic!("not a func type");
        };
        let NodeKind::FieldList { fields } = f.kind(params).clone() else {
            panic!("no params");
        };
        assert!(matches!(
            f.kind(fields[1]),
            NodeKind::Field { ty, .. } if matches!(f.kind(*ty), NodeKind::Ellipsis { elt: Some(_) })
        ));
    }

    #[test]
    fn composite_types_nest() {
        let mut f = Forest::new();
        let t = parse_type("map[string][]*chan<- int", &mut f).unwrap();
        assert!(matches!(f.kind(t), NodeKind::MapType { .. }));
        let arr = parse_type("[...]float64", &mut f).unwrap();
        assert!(matches!(
            f.kind(arr),
            NodeKind::ArrayType { len: Some(l), .. } if matches!(f.kind(*l), NodeKind::Ellipsis { elt: None })
        ));
    }
}
