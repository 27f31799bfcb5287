//! # Expression Tokenizer
//!
//! The tokenizer performs lexical analysis of a single embedded expression,
//! such as the body of `$(...)` or the iterable of an `@for(...)` key, and
//! produces the token stream consumed by the [`analyzer`](crate::analyzer).
//!
//! ## Component Structure
//!
//! * [`token`]: Token types, spans and the [`Tokenizer`](token::Tokenizer) driver
//! * [`symbol`]: Operators and delimiters
//! * [`literal`]: String, number, boolean and null literals
//! * [`whitespace`]: Insignificant whitespace
//!
//! ## Token Stream Shape
//!
//! Every successful tokenization ends with [`Token::Eof`](token::Token::Eof).
//! Whitespace is kept as tokens so spans stay exact; use
//! [`significant_tokens`](token::significant_tokens) to obtain the stream the
//! parser works on.
//!
//! ## Negative Numbers
//!
//! A `-` directly followed by a digit is lexed as part of a numeric literal only
//! where an operand is expected (start of input, after an operator, `(`, `[`
//! or `,`). After an operand it is the binary minus operator, so `a -1` and
//! `a-1` both mean subtraction while `f(-1)` passes a negative literal.

pub mod literal;
pub mod symbol;
pub mod token;
pub mod whitespace;
