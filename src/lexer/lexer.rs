use super::{Token, TokenKind};

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    /** Human readable positions in file */
    pub cur_line: usize,
    pub cur_col: usize,

    /** 'raw' format / offset within the file (in terms of 'codepoints') */
    pub codepoint_offset: usize,

    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

fn is_instruction(c: char) -> bool {
    matches!(c, '>' | '<' | '+' | '-' | '.' | ',' | '[' | ']')
}

impl<'a> Lexer<'a> {
    pub fn new(chars: &'a str) -> Lexer<'a> {
        Lexer {
            cur_col: 1,
            cur_line: 1,

            codepoint_offset: 0,

            chars: chars.chars().peekable(),
        }
    }

    fn transform_to_type(&mut self, c: char) -> TokenKind {
        match c {
            '>' => TokenKind::PointerRight,
            '<' => TokenKind::PointerLeft,
            '+' => TokenKind::Increment,
            '-' => TokenKind::Decrement,
            '.' => TokenKind::Output,
            ',' => TokenKind::Input,
            '[' => TokenKind::LoopStart,
            ']' => TokenKind::LoopEnd,
            c => {
                // Simplify the comment stream down to strings
                let mut comment = String::from(c);
                while let Some(&next) = self.chars.peek() {
                    if is_instruction(next) {
                        break;
                    }
                    comment.push(next);
                    self.consume_char();
                }

                TokenKind::Comment(comment)
            }
        }
    }

    fn consume_char(&mut self) -> Option<char> {
        match self.chars.next() {
            Some(c) => {
                self.cur_col += 1;
                if c == '\n' {
                    self.cur_line += 1;
                    self.cur_col = 1;
                }
                self.codepoint_offset += 1;
                Some(c)
            }
            None => None,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.consume_char();
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();

        let (line, col) = (self.cur_line, self.cur_col);
        let c = self.consume_char()?;
        Some(Token {
            kind: self.transform_to_type(c),
            line,
            col,
        })
    }

    pub fn collect_tokens(&mut self) -> Vec<Token> {
        let mut v = vec![];
        while let Some(tok) = self.next_token() {
            v.push(tok);
        }
        v
    }
}
