use std::iter::Peekable;

use crate::lexer::{Token, TokenKind};

use super::{AstKind, BasicBlock, ParseError, Program};

pub struct Parser<'a> {
    tokens: Peekable<std::slice::Iter<'a, Token>>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Parser<'a> {
        Parser {
            tokens: tokens.iter().peekable(),
        }
    }

    /// Parse one loop body; `open` is the `[` that started it (None at the
    /// program root). Loops own their child block directly, so the nesting
    /// stack is just the call stack.
    fn parse_block(&mut self, open: Option<&Token>) -> Result<BasicBlock, ParseError> {
        let mut instructions = vec![];

        while let Some(token) = self.tokens.next() {
            instructions.push(match token.kind {
                TokenKind::PointerRight => AstKind::PointerRight,
                TokenKind::PointerLeft => AstKind::PointerLeft,
                TokenKind::Increment => AstKind::Increment,
                TokenKind::Decrement => AstKind::Decrement,
                TokenKind::Output => AstKind::Output,
                TokenKind::Input => AstKind::Input,
                TokenKind::LoopStart => AstKind::Loop(self.parse_block(Some(token))?),
                TokenKind::LoopEnd => {
                    return match open {
                        Some(_) => Ok(BasicBlock { instructions }),
                        None => Err(ParseError::UnmatchedLoopClose {
                            line: token.line,
                            col: token.col,
                        }),
                    }
                }
                // comments never reach the AST
                TokenKind::Comment(_) => continue,
            })
        }

        // ran out of tokens: only fine at the program root
        match open {
            Some(token) => Err(ParseError::UnclosedLoop {
                line: token.line,
                col: token.col,
            }),
            None => Ok(BasicBlock { instructions }),
        }
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        self.parse_block(None)
    }
}

/// Convenience over `Lexer` + `Parser` for one-shot callers.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = crate::lexer::lexer::Lexer::new(source).collect_tokens();
    Parser::new(&tokens).parse_program()
}
