use super::Parser;
use crate::ast::{NodeId, NodeKind};
use crate::error::SyntaxError;
use crate::lexer::Token;

const ASSIGN_OPS: &[&str] = &[
    "=", ":=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", "&^=",
];

impl<'a> Parser<'a> {
    pub(super) fn parse_block(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        self.expect_op("{")?;
        let stmts = self.with_expr_lev(0, |p| p.parse_stmt_list())?;
        let tail = self.tail_comments();
        self.expect_op("}")?;
        let id = self.finish(NodeKind::Block { stmts }, start);
        self.forest.trivia_mut(id).inner_tail = tail;
        Ok(id)
    }

    fn parse_stmt_list(&mut self) -> Result<Vec<NodeId>, SyntaxError> {
        let mut stmts = Vec::new();
        loop {
            while self.peek() == &Token::Semi {
                self.advance();
            }
            if self.is_op("}") || self.is_word("case") || self.is_word("default") {
                break;
            }
            if self.peek() == &Token::Eof {
                return Err(self.unexpected("'}'"));
            }
            let item = self.begin_item();
            let stmt = self.parse_stmt()?;
            self.end_item(stmt, item);
            self.expect_semi()?;
            stmts.push(stmt);
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        match self.peek().clone() {
            Token::Word(w) => match w.as_str() {
                "var" | "const" | "type" => {
                    let decl = self.parse_gen_decl()?;
                    Ok(self.finish(NodeKind::DeclStmt { decl }, start))
                }
                "return" => {
                    self.advance();
                    let results = if matches!(self.peek(), Token::Semi | Token::Op("}")) {
                        Vec::new()
                    } else {
                        self.parse_expr_list()?
                    };
                    Ok(self.finish(NodeKind::Return { results }, start))
                }
                "if" => self.parse_if(),
                "for" => self.parse_for(),
                "switch" => self.parse_switch(),
                "go" | "defer" => {
                    self.advance();
                    let call = self.parse_expr()?;
                    if !matches!(self.forest.kind(call), NodeKind::Call { .. }) {
                        return Err(self.err(format!("expression in {} must be function call", w)));
                    }
                    let kind = if w == "go" {
                        NodeKind::Go { call }
                    } else {
                        NodeKind::Defer { call }
                    };
                    Ok(self.finish(kind, start))
                }
                "break" | "continue" | "fallthrough" | "goto" => {
                    self.advance();
                    let label = if self.is_ident() {
                        Some(self.take_ident()?)
                    } else {
                        None
                    };
                    Ok(self.finish(NodeKind::Branch { keyword: w, label }, start))
                }
                "select" => Err(self.err("select statements are not supported")),
                _ => self.parse_simple_stmt(),
            },
            Token::Op("{") => self.parse_block(),
            _ => self.parse_simple_stmt(),
        }
    }

    pub(super) fn parse_simple_stmt(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        let lhs = self.parse_expr_list()?;

        if let Token::Op(op) = self.peek().clone() {
            if ASSIGN_OPS.contains(&op) {
                self.advance();
                let rhs = self.parse_expr_list()?;
                return Ok(self.finish(NodeKind::Assign { lhs, op, rhs }, start));
            }
            match op {
                "++" | "--" if lhs.len() == 1 => {
                    self.advance();
                    return Ok(self.finish(NodeKind::IncDec { x: lhs[0], op }, start));
                }
                "<-" if lhs.len() == 1 => {
                    self.advance();
                    let value = self.parse_expr()?;
                    return Ok(self.finish(
                        NodeKind::Send {
                            chan: lhs[0],
                            value,
                        },
                        start,
                    ));
                }
                ":" if lhs.len() == 1 && self.expr_lev >= 0 => {
                    if let Some(label) = self.forest.ident_name(lhs[0]).map(str::to_owned) {
                        self.advance();
                        while self.peek() == &Token::Semi {
                            self.advance();
                        }
                        let stmt = if self.is_op("}") {
                            self.finish(NodeKind::Empty, self.start())
                        } else {
                            self.parse_stmt()?
                        };
                        return Ok(self.finish(NodeKind::Labeled { label, stmt }, start));
                    }
                }
                _ => {}
            }
        }

        if lhs.len() > 1 {
            return Err(self.unexpected("':=', '=' or op-assignment"));
        }
        Ok(self.finish(NodeKind::ExprStmt { x: lhs[0] }, start))
    }

    fn parse_if(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        self.expect_word("if")?;
        let (init, cond) = self.with_expr_lev(-1, |p| {
            let first = p.parse_simple_stmt()?;
            if p.peek() == &Token::Semi {
                p.advance();
                let cond = p.parse_expr()?;
                Ok((Some(first), cond))
            } else {
                Ok((None, p.stmt_as_expr(first)?))
            }
        })?;
        let body = self.parse_block()?;
        let els = if self.is_word("else") {
            self.advance();
            if self.is_word("if") {
                Some(self.parse_if()?)
            } else if self.is_op("{") {
                Some(self.parse_block()?)
            } else {
                return Err(self.unexpected("'if' or '{' after else"));
            }
        } else {
            None
        };
        Ok(self.finish(
            NodeKind::If {
                init,
                cond,
                body,
                els,
            },
            start,
        ))
    }

    fn stmt_as_expr(&self, stmt: NodeId) -> Result<NodeId, SyntaxError> {
        match self.forest.kind(stmt) {
            NodeKind::ExprStmt { x } => Ok(*x),
            _ => Err(self.err("expected boolean expression, found statement")),
        }
    }

    fn parse_for(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        self.expect_word("for")?;
        if self.is_op("{") {
            let body = self.parse_block()?;
            return Ok(self.finish(
                NodeKind::For {
                    init: None,
                    cond: None,
                    post: None,
                    body,
                },
                start,
            ));
        }

        enum Header {
            Range {
                key: Option<NodeId>,
                value: Option<NodeId>,
                define: bool,
                x: NodeId,
            },
            Clauses(Option<NodeId>, Option<NodeId>, Option<NodeId>),
        }

        let header = self.with_expr_lev(-1, |p| {
            if p.is_word("range") {
                p.advance();
                let x = p.parse_expr()?;
                return Ok(Header::Range {
                    key: None,
                    value: None,
                    define: false,
                    x,
                });
            }
            let init = if p.peek() == &Token::Semi {
                None
            } else {
                let lhs_start = p.pos;
                let lhs = p.parse_expr_list()?;
                if (p.is_op(":=") || p.is_op("=")) && matches!(p.peek_at(1), Token::Word(w) if w == "range")
                {
                    let define = p.is_op(":=");
                    p.advance();
                    p.advance();
                    let x = p.parse_expr()?;
                    if lhs.len() > 2 {
                        return Err(p.err("range clause permits at most two iteration variables"));
                    }
                    return Ok(Header::Range {
                        key: lhs.first().copied(),
                        value: lhs.get(1).copied(),
                        define,
                        x,
                    });
                }
                // Not a range clause: re-read it as a simple statement.
                p.pos = lhs_start;
                Some(p.parse_simple_stmt()?)
            };
            if p.peek() != &Token::Semi {
                let cond = match init {
                    Some(stmt) => Some(p.stmt_as_expr(stmt)?),
                    None => None,
                };
                return Ok(Header::Clauses(None, cond, None));
            }
            p.advance();
            let cond = if p.peek() == &Token::Semi {
                None
            } else {
                Some(p.parse_expr()?)
            };
            if p.peek() != &Token::Semi {
                return Err(p.unexpected("';' in for clause"));
            }
            p.advance();
            let post = if p.is_op("{") {
                None
            } else {
                Some(p.parse_simple_stmt()?)
            };
            Ok(Header::Clauses(init, cond, post))
        })?;

        let body = self.parse_block()?;
        let kind = match header {
            Header::Range {
                key,
                value,
                define,
                x,
            } => NodeKind::Range {
                key,
                value,
                define,
                x,
                body,
            },
            Header::Clauses(init, cond, post) => NodeKind::For {
                init,
                cond,
                post,
                body,
            },
        };
        Ok(self.finish(kind, start))
    }

    fn parse_switch(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        self.expect_word("switch")?;
        let (init, tag) = self.with_expr_lev(-1, |p| {
            if p.is_op("{") {
                return Ok((None, None));
            }
            let init = if p.peek() == &Token::Semi {
                None
            } else {
                Some(p.parse_simple_stmt()?)
            };
            if p.peek() == &Token::Semi {
                p.advance();
                let tag = if p.is_op("{") {
                    None
                } else {
                    Some(p.parse_expr()?)
                };
                return Ok((init, tag));
            }
            let tag = match init {
                Some(stmt) => Some(p.stmt_as_expr(stmt)?),
                None => None,
            };
            Ok((None, tag))
        })?;

        self.expect_op("{")?;
        let mut clauses = Vec::new();
        while self.peek() == &Token::Semi {
            self.advance();
        }
        while !self.is_op("}") {
            let item = self.begin_item();
            let clause_start = self.start();
            let (list, default) = if self.is_word("default") {
                self.advance();
                (Vec::new(), true)
            } else {
                self.expect_word("case")?;
                (self.parse_expr_list()?, false)
            };
            self.expect_op(":")?;
            let body = self.with_expr_lev(0, |p| p.parse_stmt_list())?;
            let clause = self.finish(
                NodeKind::CaseClause {
                    list,
                    default,
                    body,
                },
                clause_start,
            );
            self.end_item(clause, item);
            clauses.push(clause);
        }
        let tail = self.tail_comments();
        self.expect_op("}")?;
        let id = self.finish(NodeKind::Switch { init, tag, clauses }, start);
        self.forest.trivia_mut(id).inner_tail = tail;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Forest, NodeId, NodeKind};
    use crate::parser::parse_file;

    fn body_of_first_func(src: &str) -> (Forest, Vec<NodeId>) {
        let mut f = Forest::new();
        let root = parse_file(src, "s.go", &mut f).unwrap();
        let NodeKind::File { decls, .. } = f.kind(root).clone() else {
            panic!("no file");
        };
        let body = decls
            .iter()
            .find_map(|d| match f.kind(*d) {
                NodeKind::FuncDecl { body: Some(b), .. } => Some(*b),
                _ => None,
            })
            .expect("func with body");
        let NodeKind::Block { stmts } = f.kind(body).clone() else {
            panic!("no block");
        };
        (f, stmts)
    }

    #[test]
    fn three_clause_for_and_range() {
        let (f, stmts) = body_of_first_func(
            "package p\nfunc f(xs []int) {\n\tfor i := 0; i < 3; i++ {\n\t}\n\tfor _, x := range xs {\n\t\t_ = x\n\t}\n\tfor {\n\t\tbreak\n\t}\n}\n",
        );
        assert!(matches!(
            f.kind(stmts[0]),
            NodeKind::For {
                init: Some(_),
                cond: Some(_),
                post: Some(_),
                ..
            }
        ));
        assert!(matches!(
            f.kind(stmts[1]),
            NodeKind::Range {
                key: Some(_),
                value: Some(_),
                define: true,
                ..
            }
        ));
        assert!(matches!(
            f.kind(stmts[2]),
            NodeKind::For {
                init: None,
                cond: None,
                post: None,
                ..
            }
        ));
    }

    #[test]
    fn if_with_init_and_else_chain() {
        let (f, stmts) = body_of_first_func(
            "package p\nfunc f(n int) int {\n\tif m := n * 2; m > 3 {\n\t\treturn m\n\t} else if n > 0 {\n\t\treturn n\n\t} else {\n\t\treturn 0\n\t}\n}\n",
        );
        let NodeKind::If { init, els, .. } = f.kind(stmts[0]).clone() else {
            panic!("expected if");
        };
        assert!(init.is_some());
        assert!(matches!(f.kind(els.unwrap()), NodeKind::If { .. }));
    }

    #[test]
    fn switch_with_cases_and_default() {
        let (f, stmts) = body_of_first_func(
            "package p\nfunc f(n int) {\n\tswitch n {\n\tcase 1, 2:\n\t\tn++\n\tdefault:\n\t}\n}\n",
        );
        let NodeKind::Switch { tag, clauses, .. } = f.kind(stmts[0]).clone() else {
            panic!("expected switch");
        };
        assert!(tag.is_some());
        assert_eq!(clauses.len(), 2);
        assert!(matches!(f.kind(clauses[1]), NodeKind::CaseClause { default: true, .. }));
    }

    #[test]
    fn send_incdec_and_op_assign() {
        let (f, stmts) = body_of_first_func(
            "package p\nfunc f(c chan int, n int) {\n\tc <- n\n\tn++\n\tn %= 3\n\ta, b := 1, 2\n\t_, _ = a, b\n}\n",
        );
        assert!(matches!(f.kind(stmts[0]), NodeKind::Send { .. }));
        assert!(matches!(f.kind(stmts[1]), NodeKind::IncDec { op: "++", .. }));
        assert!(matches!(f.kind(stmts[2]), NodeKind::Assign { op: "%=", .. }));
        assert!(matches!(f.kind(stmts[3]), NodeKind::Assign { op: ":=", lhs, .. } if lhs.len() == 2));
    }

    #[test]
    fn labeled_loop_and_branch() {
        let (f, stmts) = body_of_first_func(
            "package p\nfunc f() {\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n}\n",
        );
        assert!(matches!(f.kind(stmts[0]), NodeKind::Labeled { label, .. } if label == "outer"));
    }
}
