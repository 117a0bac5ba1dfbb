use std::collections::HashMap;
use thiserror::Error;

use cinder::bytecode::{OpCode, Program};

use crate::lexer::{Lexer, Token, TokenKind};

/// Error type for compilation. Malformed syntax is not an error: rules that
/// fail to match simply move on, possibly producing a degenerate program.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("unresolved label '{0}'")]
    UnresolvedLabel(String),

    #[error("program exceeds the 32-bit bytecode offset range")]
    ProgramTooLarge,
}

/// Tokenize and compile a source buffer in one step.
pub fn compile_source(source: &str) -> Result<Program, CompileError> {
    let tokens = Lexer::new(source).tokenize();
    Compiler::new(tokens).compile()
}

/// A jump emitted before its target label is bound. Every placeholder is
/// patched in one pass after the whole program has been compiled.
struct PendingJump {
    position: usize,
    label: String,
}

/// Single-pass recursive-descent compiler: one forward walk over the token
/// sequence with one token of lookahead, emitting bytecode as it parses.
///
/// Statements compile to net-zero stack effect and expressions to exactly
/// one pushed value, so stack depth stays bounded across any loop.
pub struct Compiler {
    tokens: Vec<Token>,
    pos: usize,
    code: Vec<u8>,
    labels: HashMap<String, usize>,
    jumps: Vec<PendingJump>,
    label_counter: u32,
}

impl Compiler {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        // The grammar relies on a trailing end-of-input marker; synthesize
        // one for token sequences built by hand.
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::eof(line));
        }
        Self {
            tokens,
            pos: 0,
            code: Vec::new(),
            labels: HashMap::new(),
            jumps: Vec::new(),
            label_counter: 0,
        }
    }

    /// Compile the whole token sequence into a program ending in HALT, with
    /// every jump placeholder resolved.
    pub fn compile(mut self) -> Result<Program, CompileError> {
        while !self.check(TokenKind::Eof) {
            let before = self.pos;
            self.statement();
            if self.pos == before {
                // A token no rule consumes; drop it and keep going.
                self.advance();
            }
        }

        self.emit_op(OpCode::Halt);
        self.resolve_jumps()?;
        Ok(Program::new(self.code))
    }

    // ---- token cursor ----

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos + 1)
            .unwrap_or_else(|| &self.tokens[self.tokens.len() - 1])
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos - 1]
    }

    /// Saturates at the end-of-input token, which is never consumed.
    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ---- emission ----

    fn emit_op(&mut self, op: OpCode) {
        self.code.push(op.to_byte());
    }

    fn emit_i32(&mut self, value: i32) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    /// Names longer than 255 bytes truncate at emission.
    fn emit_name(&mut self, name: &str) {
        let bytes = name.as_bytes();
        let len = bytes.len().min(255);
        self.code.push(len as u8);
        self.code.extend_from_slice(&bytes[..len]);
    }

    fn make_label(&mut self) -> String {
        let name = format!("L{}", self.label_counter);
        self.label_counter += 1;
        name
    }

    fn bind_label(&mut self, name: &str) {
        let offset = self.code.len();
        self.labels.entry(name.to_string()).or_insert(offset);
    }

    fn emit_jump(&mut self, op: OpCode, label: &str) {
        self.emit_op(op);
        self.jumps.push(PendingJump {
            position: self.code.len(),
            label: label.to_string(),
        });
        self.emit_i32(0);
    }

    fn resolve_jumps(&mut self) -> Result<(), CompileError> {
        for jump in &self.jumps {
            let target = self
                .labels
                .get(&jump.label)
                .copied()
                .ok_or_else(|| CompileError::UnresolvedLabel(jump.label.clone()))?;
            let offset = i32::try_from(target).map_err(|_| CompileError::ProgramTooLarge)?;
            self.code[jump.position..jump.position + 4].copy_from_slice(&offset.to_le_bytes());
        }
        Ok(())
    }

    // ---- statements ----

    fn statement(&mut self) {
        if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else if self.match_token(TokenKind::If) {
            self.if_statement();
        } else if self.match_token(TokenKind::While) {
            self.while_statement();
        } else if self.match_token(TokenKind::Print) {
            self.print_statement();
        } else if self.match_token(TokenKind::LBrace) {
            self.block();
        } else {
            self.expression_statement();
        }
    }

    fn var_declaration(&mut self) {
        let name = self.current().text.clone();
        self.match_token(TokenKind::Identifier);

        if self.match_token(TokenKind::Assign) {
            self.expression();
        } else {
            self.emit_op(OpCode::Push);
            self.emit_i32(0);
        }

        self.emit_op(OpCode::Store);
        self.emit_name(&name);
        self.match_token(TokenKind::Semicolon);
    }

    fn if_statement(&mut self) {
        self.match_token(TokenKind::LParen);
        self.expression();
        self.match_token(TokenKind::RParen);

        let else_label = self.make_label();
        let end_label = self.make_label();

        self.emit_jump(OpCode::JmpNot, &else_label);
        self.statement();

        if self.match_token(TokenKind::Else) {
            self.emit_jump(OpCode::Jmp, &end_label);
            self.bind_label(&else_label);
            self.statement();
            self.bind_label(&end_label);
        } else {
            self.bind_label(&else_label);
        }
    }

    fn while_statement(&mut self) {
        let start_label = self.make_label();
        let end_label = self.make_label();

        self.bind_label(&start_label);
        self.match_token(TokenKind::LParen);
        self.expression();
        self.match_token(TokenKind::RParen);

        self.emit_jump(OpCode::JmpNot, &end_label);
        self.statement();
        self.emit_jump(OpCode::Jmp, &start_label);
        self.bind_label(&end_label);
    }

    fn print_statement(&mut self) {
        self.match_token(TokenKind::LParen);
        self.expression();
        self.match_token(TokenKind::RParen);
        // PRINT only inspects the top of the stack; the statement discards
        // the argument so loops stay stack-neutral.
        self.emit_op(OpCode::Print);
        self.emit_op(OpCode::Pop);
        self.match_token(TokenKind::Semicolon);
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            let before = self.pos;
            self.statement();
            if self.pos == before {
                self.advance();
            }
        }
        self.match_token(TokenKind::RBrace);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.emit_op(OpCode::Pop);
        self.match_token(TokenKind::Semicolon);
    }

    // ---- expressions, lowest to highest precedence ----

    fn expression(&mut self) {
        if self.check(TokenKind::Identifier) && self.peek().kind == TokenKind::Assign {
            let name = self.current().text.clone();
            self.advance();
            self.advance();
            self.expression();
            self.emit_op(OpCode::Store);
            self.emit_name(&name);
            // STORE consumes the value; reload it so the assignment itself
            // yields one, like every other expression.
            self.emit_op(OpCode::Load);
            self.emit_name(&name);
        } else {
            self.logical_or();
        }
    }

    fn logical_or(&mut self) {
        self.logical_and();
        while self.match_token(TokenKind::Or) {
            self.logical_and();
            self.emit_op(OpCode::Or);
        }
    }

    fn logical_and(&mut self) {
        self.equality();
        while self.match_token(TokenKind::And) {
            self.equality();
            self.emit_op(OpCode::And);
        }
    }

    fn equality(&mut self) {
        self.comparison();
        loop {
            if self.match_token(TokenKind::Eq) {
                self.comparison();
                self.emit_op(OpCode::Eq);
            } else if self.match_token(TokenKind::Ne) {
                self.comparison();
                self.emit_op(OpCode::Ne);
            } else {
                break;
            }
        }
    }

    fn comparison(&mut self) {
        self.term();
        loop {
            if self.match_token(TokenKind::Lt) {
                self.term();
                self.emit_op(OpCode::Lt);
            } else if self.match_token(TokenKind::Le) {
                self.term();
                self.emit_op(OpCode::Le);
            } else if self.match_token(TokenKind::Gt) {
                self.term();
                self.emit_op(OpCode::Gt);
            } else if self.match_token(TokenKind::Ge) {
                self.term();
                self.emit_op(OpCode::Ge);
            } else {
                break;
            }
        }
    }

    fn term(&mut self) {
        self.factor();
        loop {
            if self.match_token(TokenKind::Plus) {
                self.factor();
                self.emit_op(OpCode::Add);
            } else if self.match_token(TokenKind::Minus) {
                self.factor();
                self.emit_op(OpCode::Sub);
            } else {
                break;
            }
        }
    }

    fn factor(&mut self) {
        self.unary();
        loop {
            if self.match_token(TokenKind::Star) {
                self.unary();
                self.emit_op(OpCode::Mul);
            } else if self.match_token(TokenKind::Slash) {
                self.unary();
                self.emit_op(OpCode::Div);
            } else if self.match_token(TokenKind::Percent) {
                self.unary();
                self.emit_op(OpCode::Mod);
            } else {
                break;
            }
        }
    }

    fn unary(&mut self) {
        if self.match_token(TokenKind::Minus) {
            self.unary();
            self.emit_op(OpCode::Neg);
        } else if self.match_token(TokenKind::Not) {
            self.unary();
            self.emit_op(OpCode::Not);
        } else {
            self.primary();
        }
    }

    fn primary(&mut self) {
        if self.match_token(TokenKind::Number) {
            let value = parse_int(&self.previous().text);
            self.emit_op(OpCode::Push);
            self.emit_i32(value);
        } else if self.match_token(TokenKind::Identifier) {
            let name = self.previous().text.clone();
            self.emit_op(OpCode::Load);
            self.emit_name(&name);
        } else if self.match_token(TokenKind::LParen) {
            self.expression();
            self.match_token(TokenKind::RParen);
        }
        // Anything else matches no rule and compiles to nothing.
    }
}

/// Decimal digits to i32 with the same wrapping accumulator the bytecode's
/// 32-bit constants use. The grammar never hands this a sign.
fn parse_int(text: &str) -> i32 {
    text.bytes().fold(0i32, |acc, b| {
        acc.wrapping_mul(10).wrapping_add((b as i32) - ('0' as i32))
    })
}
