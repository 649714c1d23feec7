//! Recursive-descent compiler: arithmetic source text to a [`Program`].
//!
//! Precedence, low to high: `+ -`, `* / %`, unary `- !`, `^` (right
//! associative), calls and parens. Comparisons and boolean logic are
//! plain function calls (`gt(a,b)`, `and(a,b)`, ...) rather than infix
//! operators, matching the engine's original expression grammar.

use super::instr::{BinOp, Func, Instr, Program};
use super::lexer::{self, Token};

pub fn compile(src: &str) -> Result<Program, String> {
    let tokens = lexer::lex(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        instrs: Vec::new(),
    };
    parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("unexpected trailing token at {}", parser.pos));
    }
    Ok(Program {
        instrs: parser.instrs,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    instrs: Vec<Instr>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expect(&mut self, want: &Token) -> Result<(), String> {
        match self.bump() {
            Some(ref t) if t == want => Ok(()),
            other => Err(format!("expected {:?}, found {:?}", want, other)),
        }
    }

    fn parse_expr(&mut self) -> Result<(), String> {
        self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.bump();
                    self.parse_term()?;
                    self.instrs.push(Instr::BinOp(BinOp::Add));
                }
                Some(Token::Minus) => {
                    self.bump();
                    self.parse_term()?;
                    self.instrs.push(Instr::BinOp(BinOp::Sub));
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn parse_term(&mut self) -> Result<(), String> {
        self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.bump();
                    self.parse_unary()?;
                    self.instrs.push(Instr::BinOp(BinOp::Mul));
                }
                Some(Token::Slash) => {
                    self.bump();
                    self.parse_unary()?;
                    self.instrs.push(Instr::BinOp(BinOp::Div));
                }
                Some(Token::Percent) => {
                    self.bump();
                    self.parse_unary()?;
                    self.instrs.push(Instr::BinOp(BinOp::Mod));
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> Result<(), String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.bump();
                self.parse_unary()?;
                self.instrs.push(Instr::Neg);
                Ok(())
            }
            Some(Token::Bang) => {
                self.bump();
                self.parse_unary()?;
                self.instrs.push(Instr::Call(Func::Not));
                Ok(())
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<(), String> {
        self.parse_primary()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.bump();
            self.parse_unary()?; // right-assoc
            self.instrs.push(Instr::BinOp(BinOp::Pow));
        }
        Ok(())
    }

    fn parse_primary(&mut self) -> Result<(), String> {
        match self.bump() {
            Some(Token::Number(n)) => {
                self.instrs.push(Instr::Push(n));
                Ok(())
            }
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.parse_call(&name)
                } else {
                    self.instrs.push(Instr::Load(name));
                    Ok(())
                }
            }
            Some(Token::LParen) => {
                self.parse_expr()?;
                self.expect(&Token::RParen)
            }
            other => Err(format!("unexpected token {:?}", other)),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<(), String> {
        let func = Func::from_name(name).ok_or_else(|| format!("unknown function '{}'", name))?;
        self.expect(&Token::LParen)?;
        let mut argc = 0;
        if !matches!(self.peek(), Some(Token::RParen)) {
            self.parse_expr()?;
            argc += 1;
            while matches!(self.peek(), Some(Token::Comma)) {
                self.bump();
                self.parse_expr()?;
                argc += 1;
            }
        }
        self.expect(&Token::RParen)?;
        if argc != func.arity() {
            return Err(format!(
                "'{}' expects {} argument(s), found {}",
                name,
                func.arity(),
                argc
            ));
        }
        self.instrs.push(Instr::Call(func));
        Ok(())
    }
}
