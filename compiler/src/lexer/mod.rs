/// Token kinds produced by the lexer. A closed set: anything the lexer does
/// not recognize is skipped, never tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals and names
    Number,
    Identifier,

    // Keywords
    If,
    Else,
    While,
    Var,
    Print,

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Assign,     // =
    Eq,         // ==
    Ne,         // !=
    Lt,         // <
    Le,         // <=
    Gt,         // >
    Ge,         // >=
    And,        // && or `and`
    Or,         // || or `or`
    Not,        // ! or `not`

    // Punctuation
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    Semicolon,  // ;
    Comma,      // ,

    // End of input
    Eof,
}

/// One lexical unit: kind, payload text (identifiers and numbers only), and
/// the 1-based source line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, line: usize) -> Self {
        Self {
            kind,
            text: text.to_string(),
            line,
        }
    }

    pub fn eof(line: usize) -> Self {
        Self::new(TokenKind::Eof, "", line)
    }
}

/// Turns a source buffer into the token sequence the compiler consumes.
///
/// The lexer never fails: bytes that fit no rule are dropped silently, and
/// the returned sequence always ends with exactly one EOF token.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            let Some(ch) = self.current() else { break };

            if ch.is_ascii_digit() {
                tokens.push(self.number());
            } else if ch.is_ascii_alphabetic() || ch == '_' {
                tokens.push(self.identifier_or_keyword());
            } else if let Some(token) = self.operator_or_punctuation(ch) {
                tokens.push(token);
            } else {
                // Permissive policy: anything else is dropped, not an error.
                self.advance();
            }
        }

        tokens.push(Token::eof(self.line));
        tokens
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        if self.current() == Some('\n') {
            self.line += 1;
        }
        self.pos += 1;
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => self.advance(),
                Some('/') if self.peek() == Some('/') => {
                    while let Some(ch) = self.current() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn number(&mut self) -> Token {
        let line = self.line;
        let mut text = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Number, &text, line)
    }

    fn identifier_or_keyword(&mut self) -> Token {
        let line = self.line;
        let mut text = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match text.as_str() {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "var" => TokenKind::Var,
            "print" => TokenKind::Print,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            _ => TokenKind::Identifier,
        };
        Token::new(kind, &text, line)
    }

    /// Two-character operators are matched greedily before their
    /// one-character prefixes.
    fn operator_or_punctuation(&mut self, ch: char) -> Option<Token> {
        let line = self.line;
        let next = self.peek();

        let (kind, text, width) = match (ch, next) {
            ('=', Some('=')) => (TokenKind::Eq, "==", 2),
            ('!', Some('=')) => (TokenKind::Ne, "!=", 2),
            ('<', Some('=')) => (TokenKind::Le, "<=", 2),
            ('>', Some('=')) => (TokenKind::Ge, ">=", 2),
            ('&', Some('&')) => (TokenKind::And, "&&", 2),
            ('|', Some('|')) => (TokenKind::Or, "||", 2),

            ('=', _) => (TokenKind::Assign, "=", 1),
            ('!', _) => (TokenKind::Not, "!", 1),
            ('<', _) => (TokenKind::Lt, "<", 1),
            ('>', _) => (TokenKind::Gt, ">", 1),

            ('+', _) => (TokenKind::Plus, "+", 1),
            ('-', _) => (TokenKind::Minus, "-", 1),
            ('*', _) => (TokenKind::Star, "*", 1),
            ('/', _) => (TokenKind::Slash, "/", 1),
            ('%', _) => (TokenKind::Percent, "%", 1),

            ('(', _) => (TokenKind::LParen, "(", 1),
            (')', _) => (TokenKind::RParen, ")", 1),
            ('{', _) => (TokenKind::LBrace, "{", 1),
            ('}', _) => (TokenKind::RBrace, "}", 1),
            (';', _) => (TokenKind::Semicolon, ";", 1),
            (',', _) => (TokenKind::Comma, ",", 1),

            _ => return None,
        };

        for _ in 0..width {
            self.advance();
        }
        // Punctuation carries no payload; the token text is for diagnostics.
        Some(Token::new(kind, text, line))
    }
}
