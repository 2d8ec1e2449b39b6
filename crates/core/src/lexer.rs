//! Go-subset lexer with automatic semicolon insertion.
//!
//! Literals keep their raw source text so the printer can reproduce them
//! exactly. Comments are not tokens; they are collected on the side and
//! attached to syntax nodes by the parser.

use crate::error::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and keywords, distinguished in the parser
    Word(String),
    /// Integer literal, raw text (`42`, `0x2A`, `1_000`)
    Int(String),
    /// Floating-point literal, raw text (`1.5`, `1e3`, `2.`)
    Float(String),
    /// Rune literal including quotes
    Char(String),
    /// String literal including quotes (interpreted or raw)
    Str(String),
    /// Operator or delimiter
    Op(&'static str),
    /// Explicit `;` or one inserted at a line end
    Semi,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
    /// Byte offset of the first character
    pub offset: u32,
    /// Byte offset one past the last character
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Full comment text including `//` or `/* */`
    pub text: String,
    pub line: u32,
    pub end_line: u32,
    pub offset: u32,
}

#[derive(Debug, Clone)]
pub struct Lexed {
    pub tokens: Vec<Spanned>,
    pub comments: Vec<Comment>,
}

pub const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

pub fn is_keyword(w: &str) -> bool {
    KEYWORDS.contains(&w)
}

// Longest first so that maximal munch falls out of a linear scan.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "-", "*", "/", "%", "&", "|",
    "^", "<", ">", "=", "!", "~", "(", ")", "[", "]", "{", "}", ",", ".", ":",
];

fn ends_statement(tok: &Token) -> bool {
    match tok {
        Token::Word(w) => {
            !is_keyword(w) || matches!(w.as_str(), "break" | "continue" | "fallthrough" | "return")
        }
        Token::Int(_) | Token::Float(_) | Token::Char(_) | Token::Str(_) => true,
        Token::Op(op) => matches!(*op, ")" | "]" | "}" | "++" | "--"),
        Token::Semi | Token::Eof => false,
    }
}

struct Lexer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: u32,
    filename: &'a str,
    tokens: Vec<Spanned>,
    comments: Vec<Comment>,
}

impl<'a> Lexer<'a> {
    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn offset(&self) -> u32 {
        self.chars
            .get(self.pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.src.len()) as u32
    }

    fn text_from(&self, start: u32) -> String {
        self.src[start as usize..self.offset() as usize].to_owned()
    }

    fn push(&mut self, token: Token, line: u32, offset: u32) {
        let end = self.offset();
        self.tokens.push(Spanned {
            token,
            line,
            offset,
            end,
        });
    }

    fn insert_semi(&mut self) {
        let needs = self
            .tokens
            .last()
            .map(|t| ends_statement(&t.token))
            .unwrap_or(false);
        if needs {
            let offset = self.offset();
            self.tokens.push(Spanned {
                token: Token::Semi,
                line: self.line,
                offset,
                end: offset,
            });
        }
    }

    fn err(&self, line: u32, msg: impl Into<String>) -> SyntaxError {
        SyntaxError::lex(self.filename, line, msg)
    }

    fn run(mut self) -> Result<Lexed, SyntaxError> {
        while let Some(c) = self.peek_at(0) {
            // Line comment
            if c == '/' && self.peek_at(1) == Some('/') {
                let start = self.offset();
                while self.peek_at(0).is_some_and(|c| c != '\n') {
                    self.pos += 1;
                }
                let text = self.text_from(start);
                self.comments.push(Comment {
                    text: text.trim_end().to_owned(),
                    line: self.line,
                    end_line: self.line,
                    offset: start,
                });
                continue;
            }

            // Block comment
            if c == '/' && self.peek_at(1) == Some('*') {
                let start = self.offset();
                let start_line = self.line;
                self.pos += 2;
                loop {
                    match self.peek_at(0) {
                        None => return Err(self.err(start_line, "comment not terminated")),
                        Some('*') if self.peek_at(1) == Some('/') => {
                            self.pos += 2;
                            break;
                        }
                        Some('\n') => {
                            self.line += 1;
                            self.pos += 1;
                        }
                        Some(_) => self.pos += 1,
                    }
                }
                let text = self.text_from(start);
                if self.line > start_line {
                    // A multi-line general comment acts like a newline.
                    self.insert_semi();
                }
                self.comments.push(Comment {
                    text,
                    line: start_line,
                    end_line: self.line,
                    offset: start,
                });
                continue;
            }

            if c == '\n' {
                self.insert_semi();
                self.line += 1;
                self.pos += 1;
                continue;
            }

            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }

            let line = self.line;
            let start = self.offset();

            if c == '"' {
                self.pos += 1;
                loop {
                    match self.peek_at(0) {
                        None | Some('\n') => {
                            return Err(self.err(line, "string literal not terminated"))
                        }
                        Some('\\') => self.pos += 2,
                        Some('"') => {
                            self.pos += 1;
                            break;
                        }
                        Some(_) => self.pos += 1,
                    }
                }
                let raw = self.text_from(start);
                self.push(Token::Str(raw), line, start);
                continue;
            }

            if c == '`' {
                self.pos += 1;
                loop {
                    match self.peek_at(0) {
                        None => return Err(self.err(line, "raw string literal not terminated")),
                        Some('`') => {
                            self.pos += 1;
                            break;
                        }
                        Some('\n') => {
                            self.line += 1;
                            self.pos += 1;
                        }
                        Some(_) => self.pos += 1,
                    }
                }
                let raw = self.text_from(start);
                self.push(Token::Str(raw), line, start);
                continue;
            }

            if c == '\'' {
                self.pos += 1;
                loop {
                    match self.peek_at(0) {
                        None | Some('\n') => {
                            return Err(self.err(line, "rune literal not terminated"))
                        }
                        Some('\\') => self.pos += 2,
                        Some('\'') => {
                            self.pos += 1;
                            break;
                        }
                        Some(_) => self.pos += 1,
                    }
                }
                let raw = self.text_from(start);
                self.push(Token::Char(raw), line, start);
                continue;
            }

            if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()))
            {
                let token = self.number(start);
                self.push(token, line, start);
                continue;
            }

            if c.is_alphabetic() || c == '_' {
                while self
                    .peek_at(0)
                    .is_some_and(|c| c.is_alphanumeric() || c == '_')
                {
                    self.pos += 1;
                }
                let word = self.text_from(start);
                self.push(Token::Word(word), line, start);
                continue;
            }

            if c == ';' {
                self.pos += 1;
                self.push(Token::Semi, line, start);
                continue;
            }

            let rest = &self.src[start as usize..];
            match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
                Some(&op) => {
                    self.pos += op.len();
                    self.push(Token::Op(op), line, start);
                }
                None => return Err(self.err(line, format!("unexpected character '{}'", c))),
            }
        }

        self.insert_semi();
        let end = self.src.len() as u32;
        self.tokens.push(Spanned {
            token: Token::Eof,
            line: self.line,
            offset: end,
            end,
        });
        Ok(Lexed {
            tokens: self.tokens,
            comments: self.comments,
        })
    }

    fn number(&mut self, start: u32) -> Token {
        let c = self.peek_at(0).unwrap_or('0');
        let prefixed = c == '0'
            && matches!(
                self.peek_at(1),
                Some('x') | Some('X') | Some('b') | Some('B') | Some('o') | Some('O')
            );
        if prefixed {
            self.pos += 2;
            while self
                .peek_at(0)
                .is_some_and(|c| c.is_ascii_hexdigit() || c == '_')
            {
                self.pos += 1;
            }
            return Token::Int(self.text_from(start));
        }
        let mut is_float = false;
        while self
            .peek_at(0)
            .is_some_and(|c| c.is_ascii_digit() || c == '_')
        {
            self.pos += 1;
        }
        if self.peek_at(0) == Some('.') && self.peek_at(1) != Some('.') {
            is_float = true;
            self.pos += 1;
            while self
                .peek_at(0)
                .is_some_and(|c| c.is_ascii_digit() || c == '_')
            {
                self.pos += 1;
            }
        }
        if matches!(self.peek_at(0), Some('e') | Some('E')) {
            let sign = matches!(self.peek_at(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.pos += digit_at;
                while self.peek_at(0).is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }
        let raw = self.text_from(start);
        if is_float {
            Token::Float(raw)
        } else {
            Token::Int(raw)
        }
    }
}

pub fn lex(src: &str, filename: &str) -> Result<Lexed, SyntaxError> {
    Lexer {
        src,
        chars: src.char_indices().collect(),
        pos: 0,
        line: 1,
        filename,
        tokens: Vec::new(),
        comments: Vec::new(),
    }
    .run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        lex(src, "t.go")
            .unwrap()
            .tokens
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn inserts_semicolon_after_identifier_at_line_end() {
        let toks = kinds("x := 5\ny++\n");
        assert_eq!(
            toks,
            vec![
                Token::Word("x".into()),
                Token::Op(":="),
                Token::Int("5".into()),
                Token::Semi,
                Token::Word("y".into()),
                Token::Op("++"),
                Token::Semi,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn no_semicolon_after_open_brace() {
        let toks = kinds("func f() {\n}\n");
        assert!(!toks
            .windows(2)
            .any(|w| w[0] == Token::Op("{") && w[1] == Token::Semi));
    }

    #[test]
    fn float_and_int_literals_keep_raw_text() {
        let toks = kinds("a = 1_000 + 0x1F + 2.5e3 + 3.");
        assert!(toks.contains(&Token::Int("1_000".into())));
        assert!(toks.contains(&Token::Int("0x1F".into())));
        assert!(toks.contains(&Token::Float("2.5e3".into())));
        assert!(toks.contains(&Token::Float("3.".into())));
    }

    #[test]
    fn ellipsis_is_a_single_operator() {
        let toks = kinds("[...]int{1}");
        assert_eq!(toks[1], Token::Op("..."));
    }

    #[test]
    fn comments_are_collected_not_tokenized() {
        let lexed = lex("// head\nx := 1 // tail\n", "t.go").unwrap();
        assert_eq!(lexed.comments.len(), 2);
        assert_eq!(lexed.comments[0].text, "// head");
        assert_eq!(lexed.comments[1].line, 2);
        assert!(lexed
            .tokens
            .iter()
            .all(|t| !matches!(&t.token, Token::Word(w) if w == "tail")));
    }

    #[test]
    fn strings_keep_quotes_and_escapes() {
        let toks = kinds(r#"s := "a\"b""#);
        assert_eq!(toks[2], Token::Str(r#""a\"b""#.into()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex("s := \"abc\n", "bad.go").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("not terminated"));
    }

    #[test]
    fn offsets_are_byte_positions() {
        let lexed = lex("é := 1", "u.go").unwrap();
        assert_eq!(lexed.tokens[0].offset, 0);
        assert_eq!(lexed.tokens[1].offset, 3);
    }
}
