use super::Parser;
use crate::ast::{DeclKeyword, NodeId, NodeKind};
use crate::error::SyntaxError;
use crate::lexer::Token;

impl<'a> Parser<'a> {
    // -- func ----------------------------------------------------

    pub(super) fn parse_func_decl(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        self.expect_word("func")?;
        let recv = if self.is_op("(") {
            Some(self.parse_params()?)
        } else {
            None
        };
        let name = self.take_ident()?;
        let sig_start = self.start();
        let ty = self.parse_signature(sig_start)?;
        let body = if self.is_op("{") {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(self.finish(
            NodeKind::FuncDecl {
                recv,
                name,
                ty,
                body,
            },
            start,
        ))
    }

    // -- import / var / const / type --------------------------------

    pub(super) fn parse_gen_decl(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        let keyword = match self.advance().token {
            Token::Word(w) => match w.as_str() {
                "import" => DeclKeyword::Import,
                "var" => DeclKeyword::Var,
                "const" => DeclKeyword::Const,
                "type" => DeclKeyword::Type,
                _ => return Err(self.err(format!("unexpected '{}'", w))),
            },
            _ => return Err(self.unexpected("declaration keyword")),
        };

        let mut specs = Vec::new();
        let grouped = self.eat_op("(");
        if grouped {
            let mut prev: Option<NodeId> = None;
            while !self.is_op(")") {
                let item = self.begin_item();
                let spec = self.parse_spec(keyword, prev)?;
                self.end_item(spec, item);
                self.expect_semi()?;
                specs.push(spec);
                prev = Some(spec);
            }
            let tail = self.tail_comments();
            self.expect_op(")")?;
            let id = self.finish(
                NodeKind::GenDecl {
                    keyword,
                    specs,
                    grouped,
                },
                start,
            );
            self.forest.trivia_mut(id).inner_tail = tail;
            return Ok(id);
        }

        specs.push(self.parse_spec(keyword, None)?);
        Ok(self.finish(
            NodeKind::GenDecl {
                keyword,
                specs,
                grouped,
            },
            start,
        ))
    }

    fn parse_spec(
        &mut self,
        keyword: DeclKeyword,
        prev: Option<NodeId>,
    ) -> Result<NodeId, SyntaxError> {
        match keyword {
            DeclKeyword::Import => self.parse_import_spec(),
            DeclKeyword::Type => self.parse_type_spec(),
            DeclKeyword::Var | DeclKeyword::Const => self.parse_value_spec(keyword, prev),
        }
    }

    fn parse_import_spec(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        let alias = match self.peek().clone() {
            Token::Word(w) => {
                self.advance();
                Some(w)
            }
            Token::Op(".") => {
                self.advance();
                Some(".".to_owned())
            }
            _ => None,
        };
        let path = match self.peek().clone() {
            Token::Str(s) => {
                self.advance();
                s
            }
            _ => return Err(self.unexpected("import path")),
        };
        Ok(self.finish(NodeKind::ImportSpec { alias, path }, start))
    }

    fn parse_type_spec(&mut self) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        let name = self.take_ident()?;
        let alias = self.eat_op("=");
        let ty = self.parse_type()?;
        Ok(self.finish(NodeKind::TypeSpec { name, alias, ty }, start))
    }

    fn parse_value_spec(
        &mut self,
        keyword: DeclKeyword,
        prev: Option<NodeId>,
    ) -> Result<NodeId, SyntaxError> {
        let start = self.start();
        let names = self.ident_list()?;
        let ty = if !self.is_op("=") && !matches!(self.peek(), Token::Semi | Token::Op(")")) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let values = if self.eat_op("=") {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        if keyword == DeclKeyword::Var && ty.is_none() && values.is_empty() {
            return Err(self.err("missing variable type or initialization"));
        }
        if keyword == DeclKeyword::Const && values.is_empty() && (ty.is_some() || prev.is_none())
        {
            return Err(self.err("missing init expr for const declaration"));
        }
        Ok(self.finish(NodeKind::ValueSpec { names, ty, values }, start))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{DeclKeyword, Forest, NodeKind};
    use crate::parser::parse_file;

    #[test]
    fn grouped_const_allows_implicit_repetition() {
        let mut f = Forest::new();
        let root = parse_file(
            "package p\nconst (\n\tA = iota\n\tB\n\tC\n)\n",
            "c.go",
            &mut f,
        )
        .unwrap();
        let NodeKind::File { decls, .. } = f.kind(root) else {
            panic!("no file");
        };
        match f.kind(decls[0]) {
            NodeKind::GenDecl { keyword, specs, .. } => {
                assert_eq!(*keyword, DeclKeyword::Const);
                assert_eq!(specs.len(), 3);
                assert!(matches!(f.kind(specs[2]), NodeKind::ValueSpec { values, .. } if values.is_empty()));
            }
            other => panic!("expected const decl, got {:?}", other),
        }
    }

    #[test]
    fn var_without_type_or_value_is_rejected() {
        let mut f = Forest::new();
        let err = parse_file("package p\nvar x\n", "v.go", &mut f).unwrap_err();
        assert!(err.message.contains("missing variable type"));
    }

    #[test]
    fn method_receiver_is_a_field_list() {
        let mut f = Forest::new();
        let root = parse_file(
            "package p\ntype T struct{ n int }\nfunc (t *T) Get() int { return t.n }\n",
            "m.go",
            &mut f,
        )
        .unwrap();
        let NodeKind::File { decls, .. } = f.kind(root) else {
            panic!("no file");
        };
        match f.kind(decls[1]) {
            NodeKind::FuncDecl { recv: Some(r), name, .. } => {
                assert_eq!(name, "Get");
                assert!(matches!(f.kind(*r), NodeKind::FieldList { fields } if fields.len() == 1));
            }
            other => panic!("expected method, got {:?}", other),
        }
    }
}
