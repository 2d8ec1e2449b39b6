/// Recursive-descent parser for the Go subset.
/// Nodes are allocated into a caller-supplied `Forest`, so every file of a
/// unit shares one arena. Comments are attached as trivia to the item
/// (declaration, spec, field, statement, case clause) they precede or
/// trail. No resolution is done here -- that is the checker's job.
use crate::ast::{Forest, NodeId, NodeKind, Span};
use crate::error::SyntaxError;
use crate::lexer::{self, Comment, Spanned, Token};

mod decls;
mod exprs;
mod stmts;
mod types;

pub(crate) use exprs::binary_prec;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Spanned],
    comments: &'a [Comment],
    next_comment: usize,
    pos: usize,
    filename: String,
    forest: &'a mut Forest,
    /// Below zero while parsing a control clause header, where a
    /// composite literal of a plain type name is not allowed.
    expr_lev: i32,
}

/// Comment layout collected in front of an item.
struct ItemStart {
    leading: Vec<String>,
    blank_before: bool,
}

impl<'a> Parser<'a> {
    fn new(
        tokens: &'a [Spanned],
        comments: &'a [Comment],
        filename: &str,
        forest: &'a mut Forest,
    ) -> Self {
        Parser {
            tokens,
            comments,
            next_comment: 0,
            pos: 0,
            filename: filename.to_owned(),
            forest,
            expr_lev: 0,
        }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        &self.tokens[(self.pos + ahead).min(self.tokens.len() - 1)].token
    }

    fn advance(&mut self) -> Spanned {
        let t = self.cur().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn start(&self) -> u32 {
        self.cur().offset
    }

    fn prev_end(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].end
        }
    }

    fn prev_line(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].line
        }
    }

    fn err(&self, msg: impl Into<String>) -> SyntaxError {
        SyntaxError::parse(&self.filename, self.cur().line, msg)
    }

    fn unexpected(&self, what: &str) -> SyntaxError {
        self.err(format!("expected {}, found {}", what, describe(self.peek())))
    }

    fn is_op(&self, op: &str) -> bool {
        matches!(self.peek(), Token::Op(o) if *o == op)
    }

    fn is_word(&self, w: &str) -> bool {
        matches!(self.peek(), Token::Word(x) if x == w)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.is_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<(), SyntaxError> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", op)))
        }
    }

    fn expect_word(&mut self, w: &str) -> Result<(), SyntaxError> {
        if self.is_word(w) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", w)))
        }
    }

    fn is_ident(&self) -> bool {
        matches!(self.peek(), Token::Word(w) if !lexer::is_keyword(w))
    }

    fn take_ident(&mut self) -> Result<String, SyntaxError> {
        match self.peek().clone() {
            Token::Word(w) if !lexer::is_keyword(&w) => {
                self.advance();
                Ok(w)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn ident_list(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut names = vec![self.take_ident()?];
        while self.eat_op(",") {
            names.push(self.take_ident()?);
        }
        Ok(names)
    }

    /// A statement or spec terminator: `;`, or nothing before a closing
    /// `)` or `}`.
    fn expect_semi(&mut self) -> Result<(), SyntaxError> {
        match self.peek() {
            Token::Semi => {
                self.advance();
                Ok(())
            }
            Token::Op(")") | Token::Op("}") | Token::Eof => Ok(()),
            _ => Err(self.unexpected("';' or newline")),
        }
    }

    fn finish(&mut self, kind: NodeKind, start: u32) -> NodeId {
        let end = self.prev_end().max(start);
        self.forest.alloc(kind, Span::new(start, end))
    }

    fn with_expr_lev<T>(
        &mut self,
        lev: i32,
        f: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        let saved = self.expr_lev;
        self.expr_lev = lev;
        let out = f(self);
        self.expr_lev = saved;
        out
    }

    // -- Trivia ---------------------------------------------------

    /// Collect the comments in front of the current token. An empty string
    /// in `leading` marks a blank line between comment groups.
    fn begin_item(&mut self) -> ItemStart {
        let start = self.cur().offset;
        let mut last_line = self.prev_line();
        let mut leading = Vec::new();
        let mut blank_before = false;
        while let Some(c) = self.comments.get(self.next_comment) {
            if c.offset >= start {
                break;
            }
            if last_line > 0 && c.line > last_line + 1 {
                if leading.is_empty() {
                    blank_before = true;
                } else {
                    leading.push(String::new());
                }
            }
            leading.push(c.text.clone());
            last_line = c.end_line;
            self.next_comment += 1;
        }
        if last_line > 0 && self.cur().line > last_line + 1 {
            if leading.is_empty() {
                blank_before = true;
            } else {
                leading.push(String::new());
            }
        }
        ItemStart {
            leading,
            blank_before,
        }
    }

    /// Attach collected comments to a finished item. Comments inside the
    /// item move in front of it; a comment on its last line trails it.
    fn end_item(&mut self, id: NodeId, start: ItemStart) {
        let end = self.forest.span(id).end;
        let last_line = self.prev_line();
        let mut leading = start.leading;
        while let Some(c) = self.comments.get(self.next_comment) {
            if c.offset >= end {
                break;
            }
            leading.push(c.text.clone());
            self.next_comment += 1;
        }
        let mut trailing = None;
        if let Some(c) = self.comments.get(self.next_comment) {
            if c.line == last_line && c.end_line == last_line {
                trailing = Some(c.text.clone());
                self.next_comment += 1;
            }
        }
        let trivia = self.forest.trivia_mut(id);
        trivia.leading = leading;
        trivia.blank_before = start.blank_before;
        trivia.trailing = trailing;
    }

    /// Comments between the last item of a list and its closing token.
    fn tail_comments(&mut self) -> Vec<String> {
        let limit = self.cur().offset;
        let mut out = Vec::new();
        while let Some(c) = self.comments.get(self.next_comment) {
            if c.offset >= limit {
                break;
            }
            out.push(c.text.clone());
            self.next_comment += 1;
        }
        out
    }

    // -- File -------------------------------------------------------

    fn parse_file(&mut self) -> Result<NodeId, SyntaxError> {
        let head = self.begin_item();
        self.expect_word("package")?;
        let package = self.take_ident()?;
        self.expect_semi()?;

        let mut decls = Vec::new();
        while self.peek() != &Token::Eof {
            let item = self.begin_item();
            let decl = self.parse_top_decl()?;
            self.end_item(decl, item);
            self.expect_semi()?;
            decls.push(decl);
        }
        let tail = self.tail_comments();

        let end = self.cur().end;
        let file = self
            .forest
            .alloc(NodeKind::File { package, decls }, Span::new(0, end));
        let trivia = self.forest.trivia_mut(file);
        trivia.leading = head.leading;
        trivia.inner_tail = tail;
        Ok(file)
    }

    fn parse_top_decl(&mut self) -> Result<NodeId, SyntaxError> {
        match self.peek().clone() {
            Token::Word(w) => match w.as_str() {
                "func" => self.parse_func_decl(),
                "import" | "var" | "const" | "type" => self.parse_gen_decl(),
                other => Err(self.err(format!(
                    "non-declaration statement outside function body: '{}'",
                    other
                ))),
            },
            other => Err(self.err(format!(
                "expected declaration, found {}",
                describe(&other)
            ))),
        }
    }
}

fn describe(tok: &Token) -> String {
    match tok {
        Token::Word(w) => format!("'{}'", w),
        Token::Int(s) | Token::Float(s) | Token::Char(s) | Token::Str(s) => {
            format!("literal {}", s)
        }
        Token::Op(op) => format!("'{}'", op),
        Token::Semi => "newline".to_owned(),
        Token::Eof => "EOF".to_owned(),
    }
}

/// Parse one source file into `forest`, returning the `File` node.
pub fn parse_file(src: &str, filename: &str, forest: &mut Forest) -> Result<NodeId, SyntaxError> {
    let lexed = lexer::lex(src, filename)?;
    let mut p = Parser::new(&lexed.tokens, &lexed.comments, filename, forest);
    p.parse_file()
}

/// Parse a standalone expression; used by tests and the checker's
/// signature table.
pub fn parse_expr(src: &str, forest: &mut Forest) -> Result<NodeId, SyntaxError> {
    let lexed = lexer::lex(src, "<expr>")?;
    let mut p = Parser::new(&lexed.tokens, &lexed.comments, "<expr>", forest);
    let e = p.parse_expr()?;
    if p.peek() == &Token::Semi {
        p.advance();
    }
    if p.peek() != &Token::Eof {
        return Err(p.unexpected("end of expression"));
    }
    Ok(e)
}

/// Parse a standalone type expression.
pub fn parse_type(src: &str, forest: &mut Forest) -> Result<NodeId, SyntaxError> {
    let lexed = lexer::lex(src, "<type>")?;
    let mut p = Parser::new(&lexed.tokens, &lexed.comments, "<type>", forest);
    let t = p.parse_type()?;
    if p.peek() == &Token::Semi {
        p.advance();
    }
    if p.peek() != &Token::Eof {
        return Err(p.unexpected("end of type"));
    }
    Ok(t)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclKeyword, LitKind};

    fn parse(src: &str) -> (Forest, NodeId) {
        let mut forest = Forest::new();
        let root = parse_file(src, "t.go", &mut forest).expect("parse");
        (forest, root)
    }

    fn decls(f: &Forest, root: NodeId) -> Vec<NodeId> {
        match f.kind(root) {
            NodeKind::File { decls, .. } => decls.clone(),
            other => panic!("expected file, got {:?}", other),
        }
    }

    #[test]
    fn parses_package_imports_and_funcs() {
        let (f, root) = parse(
            "package main\n\nimport (\n\t\"fmt\"\n\tr \"math/rand\"\n)\n\nfunc main() {\n\tfmt.Println(r.Intn(3))\n}\n",
        );
        let ds = decls(&f, root);
        assert_eq!(ds.len(), 2);
        match f.kind(ds[0]) {
            NodeKind::GenDecl {
                keyword,
                specs,
                grouped,
            } => {
                assert_eq!(*keyword, DeclKeyword::Import);
                assert!(*grouped);
                assert_eq!(specs.len(), 2);
                match f.kind(specs[1]) {
                    NodeKind::ImportSpec { alias, path } => {
                        assert_eq!(alias.as_deref(), Some("r"));
                        assert_eq!(path, "\"math/rand\"");
                    }
                    other => panic!("expected import spec, got {:?}", other),
                }
            }
            other => panic!("expected import decl, got {:?}", other),
        }
        assert!(matches!(f.kind(ds[1]), NodeKind::FuncDecl { name, .. } if name == "main"));
    }

    #[test]
    fn attaches_leading_and_trailing_comments() {
        let (f, root) = parse("package p\n\n// Count is a counter.\nvar Count int // trailing\n");
        let ds = decls(&f, root);
        let t = f.trivia(ds[0]);
        assert_eq!(t.leading, vec!["// Count is a counter.".to_owned()]);
        assert_eq!(t.trailing.as_deref(), Some("// trailing"));
        assert!(t.blank_before);
    }

    #[test]
    fn span_covers_declaration_text() {
        let src = "package p\nvar x = 1 + 2\n";
        let (f, root) = parse(src);
        let ds = decls(&f, root);
        let span = f.span(ds[0]);
        assert_eq!(&src[span.start as usize..span.end as usize], "var x = 1 + 2");
    }

    #[test]
    fn composite_literal_not_allowed_in_if_header() {
        // `x == T {` parses the brace as the if body, not a literal.
        let (f, root) = parse(
            "package p\ntype T struct{}\nfunc g(x T) bool {\n\tif x == (T{}) {\n\t\treturn true\n\t}\n\treturn false\n}\n",
        );
        assert_eq!(decls(&f, root).len(), 2);
    }

    #[test]
    fn standalone_expression_parses_with_precedence() {
        let mut f = Forest::new();
        let e = parse_expr("1 + 2*3", &mut f).unwrap();
        match f.kind(e) {
            NodeKind::Binary { op, y, .. } => {
                assert_eq!(*op, "+");
                assert!(matches!(f.kind(*y), NodeKind::Binary { op: "*", .. }));
            }
            other => panic!("expected binary, got {:?}", other),
        }
        let lit = parse_expr("0x1F", &mut f).unwrap();
        assert!(matches!(
            f.kind(lit),
            NodeKind::BasicLit {
                kind: LitKind::Int,
                ..
            }
        ));
    }

    #[test]
    fn reports_line_of_syntax_error() {
        let mut f = Forest::new();
        let err = parse_file("package p\n\nfunc f( {\n}\n", "bad.go", &mut f).unwrap_err();
        assert_eq!(err.file, "bad.go");
        assert_eq!(err.line, 3);
    }

    #[test]
    fn statement_at_top_level_is_rejected() {
        let mut f = Forest::new();
        let err = parse_file("package p\nx := 1\n", "bad.go", &mut f).unwrap_err();
        assert!(err.message.contains("outside function body"));
    }
}
