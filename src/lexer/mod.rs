pub mod lexer;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // `>`: Increment the `data pointer` by one
    PointerRight,
    // `<`: Decrement the `data pointer` by one
    PointerLeft,

    // `+`: Increment the byte at the `data pointer` by one
    Increment,
    // `-`: Decrement the byte at the `data pointer` by one
    Decrement,

    // `.`: Write the byte at the `data pointer` to the `output device`
    Output,
    // `,`: Read the next byte from the `input device` and write it to the byte at the `data pointer`
    Input,

    // `[`: If the byte at the `data pointer` is zero, jump forward to the instruction after the matching `]`
    LoopStart,
    // `]`: If the byte at the `data pointer` is non-zero, jump back to the instruction after the matching `[`
    LoopEnd,

    // Comment every other character
    Comment(String),
}

/// A token tagged with the line/column (both 1-based) of its first character.
///
/// The lexer itself is total: bracket balancing is checked by the parser so
/// that both structural errors can point at an exact position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}
