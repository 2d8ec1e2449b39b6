use super::Parser;
use crate::ast::{LitKind, NodeId, NodeKind};
use crate::error::SyntaxError;
use crate::lexer::{self, Token};

/// Go binary operator precedence, 1 (lowest) to 5.
pub(crate) fn binary_prec(op: &str) -> Option<u8> {
    Some(match op {
        "||" => 1,
        "&&" => 2,
        "==" | "!=" | "<" | "<=" | ">" | ">=" => 3,
        "+" | "-" | "|" | "^" => 4,
        "*" | "/" | "%" | "<<" | ">>" | "&" | "&^" => 5,
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    pub(super) fn parse_expr(&mut self) -> Result<NodeId, SyntaxError> {
        self.parse_binary(1)
    }

    pub(super) fn parse_expr_list(&mut self) -> Result<Vec<NodeId>, SyntaxError> {
        let mut list = vec![self.parse_expr()?];
        while self.eat_op(",") {
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        let mut x = self.parse_unary()?;
        loop {
            let (op, prec) = match self.peek() {
                Token::Op(op) => match binary_prec(op) {
                    Some(p) if p >= min_prec => (*op, p),
                    _ => break,
                },
                _ => break,
            };
            self.advance();
            let y = self.parse_binary(prec + 1)?;
            x = self.finish(NodeKind::Binary { op, x, y }, start);
        }
        Ok(x)
    }

    fn parse_unary(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        match self.peek().clone() {
            Token::Op("*") => {
                self.advance();
                let x = self.parse_unary()?;
                Ok(self.finish(NodeKind::Star { x }, start))
            }
            Token::Op(op @ ("+" | "-" | "!" | "^" | "&" | "<-")) => {
                self.advance();
                let x = self.parse_unary()?;
                Ok(self.finish(NodeKind::Unary { op, x }, start))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        let mut x = self.parse_operand()?;
        loop {
            match self.peek() {
                Token::Op(".") => {
                    self.advance();
                    let sel = self.take_ident()?;
                    x = self.finish(NodeKind::Selector { x, sel }, start);
                }
                Token::Op("[") => {
                    self.advance();
                    x = self.with_expr_lev(0, |p| p.parse_index_or_slice(x, start))?;
                }
                Token::Op("(") => {
                    self.advance();
                    let (args, spread) = self.with_expr_lev(0, |p| p.parse_call_args())?;
                    x = self.finish(
                        NodeKind::Call {
                            fun: x,
                            args,
                            spread,
                        },
                        start,
                    );
                }
                Token::Op("{") if self.literal_allowed(x) => {
                    x = self.with_expr_lev(0, |p| p.parse_composite_body(Some(x), start))?;
                }
                _ => break,
            }
        }
        Ok(x)
    }

    fn literal_allowed(&self, ty: NodeId) -> bool {
        let type_name = match self.forest.kind(ty) {
            NodeKind::Ident { .. } => true,
            NodeKind::Selector { x, .. } => matches!(self.forest.kind(*x), NodeKind::Ident { .. }),
            NodeKind::ArrayType { .. } | NodeKind::MapType { .. } | NodeKind::StructType { .. } => {
                false
            }
            _ => return false,
        };
        self.expr_lev >= 0 || !type_name
    }

    fn parse_operand(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        let lit = |kind: LitKind, value: String| NodeKind::BasicLit { kind, value };
        match self.peek().clone() {
            Token::Int(v) => {
                self.advance();
                Ok(self.finish(lit(LitKind::Int, v), start))
            }
            Token::Float(v) => {
                self.advance();
                Ok(self.finish(lit(LitKind::Float, v), start))
            }
            Token::Char(v) => {
                self.advance();
                Ok(self.finish(lit(LitKind::Char, v), start))
            }
            Token::Str(v) => {
                self.advance();
                Ok(self.finish(lit(LitKind::Str, v), start))
            }
            Token::Word(w) if !lexer::is_keyword(&w) => {
                self.advance();
                Ok(self.finish(NodeKind::Ident { name: w }, start))
            }
            Token::Word(w) if w == "func" => {
                self.advance();
                let ty = self.parse_signature(start)?;
                if !self.is_op("{") {
                    return Ok(ty);
                }
                let body = self.with_expr_lev(0, |p| p.parse_block())?;
                Ok(self.finish(NodeKind::FuncLit { ty, body }, start))
            }
            Token::Word(w) if matches!(w.as_str(), "map" | "chan" | "struct" | "interface") => {
                self.parse_type()
            }
            Token::Op("[") => self.parse_type(),
            Token::Op("(") => {
                self.advance();
                let x = self.with_expr_lev(0, |p| p.parse_expr())?;
                self.expect_op(")")?;
                Ok(self.finish(NodeKind::Paren { x }, start))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_index_or_slice(&mut self, x: NodeId, start: u32) -> Result<NodeId, SyntaxError> {
        let low = if self.is_op(":") {
            None
        } else {
            Some(self.parse_expr()?)
        };
        if self.eat_op("]") {
            let index = low.ok_or_else(|| self.err("expected operand"))?;
            return Ok(self.finish(NodeKind::Index { x, index }, start));
        }
        self.expect_op(":")?;
        let high = if self.is_op(":") || self.is_op("]") {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let max = if self.eat_op(":") {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect_op("]")?;
        Ok(self.finish(NodeKind::Slice { x, low, high, max }, start))
    }

    fn parse_call_args(&mut self) -> Result<(Vec<NodeId>, bool), SyntaxError> {
        let mut args = Vec::new();
        let mut spread = false;
        while !self.is_op(")") {
            args.push(self.parse_expr()?);
            if self.eat_op("...") {
                spread = true;
            }
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(")")?;
        Ok((args, spread))
    }

    /// `{ elt, key: value, ... }` after a literal type (or elided type).
    fn parse_composite_body(
        &mut self,
        ty: Option<NodeId>,
        start: u32,
    ) -> Result<NodeId, SyntaxError> {
        let open_line = self.cur().line;
        self.expect_op("{")?;
        let mut elts = Vec::new();
        while !self.is_op("}") {
            let elt_start = self.start();
            let first = self.parse_element()?;
            let elt = if self.eat_op(":") {
                let value = self.parse_element()?;
                self.finish(
                    NodeKind::KeyValue {
                        key: first,
                        value,
                    },
                    elt_start,
                )
            } else {
                first
            };
            elts.push(elt);
            if !self.eat_op(",") {
                break;
            }
        }
        let multiline = self.cur().line > open_line;
        self.expect_op("}")?;
        Ok(self.finish(
            NodeKind::CompositeLit {
                ty,
                elts,
                multiline,
            },
            start,
        ))
    }

    fn parse_element(&mut self) -> Result<NodeId, SyntaxError> {
        if self.is_op("{") {
            let start = self.start();
            return self.parse_composite_body(None, start);
        }
        self.parse_expr()
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Forest, NodeKind};
    use crate::parser::parse_expr;

    #[test]
    fn selector_call_index_chain() {
        let mut f = Forest::new();
        let e = parse_expr("a.b(c)[1]", &mut f).unwrap();
        let NodeKind::Index { x, .. } = f.kind(e).clone() else {
            panic!("expected index");
        };
        let NodeKind::Call { fun, args, .. } = f.kind(x).clone() else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        assert!(matches!(f.kind(fun), NodeKind::Selector { sel, .. } if sel == "b"));
    }

    #[test]
    fn slice_bounds_are_optional() {
        let mut f = Forest::new();
        let e = parse_expr("s[:n]", &mut f).unwrap();
        assert!(matches!(
            f.kind(e),
            NodeKind::Slice {
                low: None,
                high: Some(_),
                max: None,
                ..
            }
        ));
    }

    #[test]
    fn composite_literal_with_keys_and_elided_types() {
        let mut f = Forest::new();
        let e = parse_expr("map[string][]int{\"a\": {1, 2}, \"b\": nil}", &mut f).unwrap();
        let NodeKind::CompositeLit { ty, elts, multiline } = f.kind(e).clone() else {
            panic!("expected literal");
        };
        assert!(ty.is_some());
        assert!(!multiline);
        assert_eq!(elts.len(), 2);
        let NodeKind::KeyValue { value, .. } = f.kind(elts[0]).clone() else {
            panic!("expected key/value");
        };
        assert!(matches!(f.kind(value), NodeKind::CompositeLit { ty: None, .. }));
    }

    #[test]
    fn unary_minus_binds_tighter_than_binary() {
        let mut f = Forest::new();
        let e = parse_expr("-a * b", &mut f).unwrap();
        let NodeKind::Binary { x, .. } = f.kind(e).clone() else {
            panic!("expected binary");
        };
        assert!(matches!(f.kind(x), NodeKind::Unary { op: "-", .. }));
    }

    #[test]
    fn variadic_spread_is_recorded() {
        let mut f = Forest::new();
        let e = parse_expr("append(a, b...)", &mut f).unwrap();
        assert!(matches!(f.kind(e), NodeKind::Call { spread: true, .. }));
    }
}
