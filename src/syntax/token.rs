//! Tokenizer: splits a pattern into charset atoms and operators.

use crate::error::{Error, SyntaxKind};
use crate::span::Span;

use super::charset::parse_charset;

/// Whether a quantifier prefers more (`*`) or fewer (`*?`) repetitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greed {
    Greedy,
    Lazy,
}

/// A grammar token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A charset atom; the span covers its source text.
    Charset(Span),
    LParen,
    RParen,
    Alternation,
    /// Implicit concatenation. Never produced by [`parse_token`]; the AST
    /// builder inserts it between adjacent operands.
    Concat,
    Kleene(Greed),
    Question(Greed),
    Plus(Greed),
}

impl Token {
    /// True for tokens after which an operand is complete.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            Self::Charset(_) | Self::RParen | Self::Kleene(_) | Self::Question(_) | Self::Plus(_)
        )
    }

    /// True for tokens that start a new operand.
    pub fn begins_operand(&self) -> bool {
        matches!(self, Self::Charset(_) | Self::LParen)
    }
}

/// Parse one token at the front of `bytes`, returning it with its length.
///
/// Charset spans are relative to `bytes`; [`Tokens`] rebases them.
pub fn parse_token(bytes: &[u8]) -> Option<(Token, usize)> {
    let quantifier = |token: fn(Greed) -> Token| {
        if bytes.get(1) == Some(&b'?') {
            (token(Greed::Lazy), 2)
        } else {
            (token(Greed::Greedy), 1)
        }
    };
    match bytes.first()? {
        b'(' => Some((Token::LParen, 1)),
        b')' => Some((Token::RParen, 1)),
        b'|' => Some((Token::Alternation, 1)),
        b'*' => Some(quantifier(Token::Kleene)),
        b'+' => Some(quantifier(Token::Plus)),
        b'?' => Some(quantifier(Token::Question)),
        _ => parse_charset(bytes).map(|(_, len)| (Token::Charset(Span::new(0, len)), len)),
    }
}

/// Iterator over the tokens of a pattern, yielding `(offset, token)`.
///
/// Stops after the first error.
pub struct Tokens<'a> {
    src: &'a [u8],
    at: usize,
    failed: bool,
}

impl<'a> Tokens<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            at: 0,
            failed: false,
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<(usize, Token), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.at >= self.src.len() {
            return None;
        }
        let offset = self.at;
        match parse_token(&self.src[offset..]) {
            Some((token, len)) => {
                self.at += len;
                let token = match token {
                    Token::Charset(span) => Token::Charset(Span::new(offset, span.len)),
                    other => other,
                };
                Some(Ok((offset, token)))
            }
            None => {
                self.failed = true;
                Some(Err(Error::syntax(offset, SyntaxKind::InvalidAtom)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<Token> {
        Tokens::new(s.as_bytes())
            .map(|t| t.map(|(_, token)| token))
            .collect::<Result<_, _>>()
            .expect("tokenize should succeed")
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("(|)"),
            vec![Token::LParen, Token::Alternation, Token::RParen]
        );
    }

    #[test]
    fn test_quantifiers() {
        assert_eq!(
            tokens("a*+?"),
            vec![
                Token::Charset(Span::new(0, 1)),
                Token::Kleene(Greed::Greedy),
                Token::Plus(Greed::Lazy),
            ]
        );
        assert_eq!(
            tokens("a??"),
            vec![Token::Charset(Span::new(0, 1)), Token::Question(Greed::Lazy)]
        );
    }

    #[test]
    fn test_charset_spans_are_absolute() {
        assert_eq!(
            tokens(r"é[a-z]\w"),
            vec![
                Token::Charset(Span::new(0, 2)),
                Token::Charset(Span::new(2, 5)),
                Token::Charset(Span::new(7, 2)),
            ]
        );
    }

    #[test]
    fn test_invalid_atom_reports_offset() {
        let mut iter = Tokens::new(b"ab]c");
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_ok());
        assert_eq!(
            iter.next(),
            Some(Err(Error::syntax(2, SyntaxKind::InvalidAtom)))
        );
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_unterminated_set() {
        let err = Tokens::new(b"a[bc").find_map(Result::err);
        assert_eq!(err, Some(Error::syntax(1, SyntaxKind::InvalidAtom)));
    }

    #[test]
    fn test_operand_classification() {
        assert!(Token::Charset(Span::new(0, 1)).ends_operand());
        assert!(Token::RParen.ends_operand());
        assert!(Token::Plus(Greed::Lazy).ends_operand());
        assert!(!Token::Alternation.ends_operand());
        assert!(Token::LParen.begins_operand());
        assert!(!Token::Kleene(Greed::Greedy).begins_operand());
    }
}
