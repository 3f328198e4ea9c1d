//! Pattern front-end: decoding, charset atoms, tokens and the postfix tree.
//!
//! # Pattern syntax
//!
//! | Token              | Meaning                                        |
//! |--------------------|------------------------------------------------|
//! | `c`                | A literal codepoint (not reserved)             |
//! | `\]`, `\.` …       | An escaped reserved character                  |
//! | `\a \f \t \n \r \v`| Control characters                             |
//! | `\uXXXX`           | Codepoint, exactly 4 hex digits                |
//! | `\UXXXXXXXX`       | Codepoint, exactly 8 hex digits                |
//! | `.`                | Any codepoint except NUL                       |
//! | `\w` `\W`          | Word character (`0-9A-Za-z_`) and complement   |
//! | `\s` `\S`          | ASCII whitespace and complement                |
//! | `\d` `\D`          | ASCII digit and complement                     |
//! | `[…]` `[^…]`       | Set of literals, `lo-hi` ranges and classes    |
//! | `(…)`              | Grouping                                       |
//! | `X\|Y`             | Alternation, left preferred                    |
//! | `X*` `X*?`         | Zero or more, greedy / lazy                    |
//! | `X+` `X+?`         | One or more, greedy / lazy                     |
//! | `X?` `X??`         | Zero or one, greedy / lazy                     |
//!
//! Adjacent operands concatenate. Reserved characters are
//! `] \ + * ? ^ $ . [ { } ( ) | /`.

pub mod ast;
pub mod charset;
pub mod token;
pub mod utf8;

pub use ast::{Ast, DEFAULT_ARENA_CAPACITY, Node, build};
pub use charset::{Charset, CodepointRange, EscapeClass, SetBody, parse_charset};
pub use token::{Greed, Token, Tokens, parse_token};
pub use utf8::{MAX_CODEPOINT, decode};
