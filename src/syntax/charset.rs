//! Charset atoms: literals, escapes, shorthand classes and bracketed sets.
//!
//! Every parser here takes the remaining pattern bytes and returns the parsed
//! value together with the number of bytes it consumed, or `None` if no atom
//! of that kind starts here.
//!
//! | Syntax        | Meaning                                          |
//! |---------------|--------------------------------------------------|
//! | `c`           | Any codepoint outside the reserved set           |
//! | `\c`          | A reserved character, taken literally            |
//! | `\a \f \t \n \r \v` | Control characters                         |
//! | `\uXXXX`      | Codepoint from exactly 4 hex digits              |
//! | `\UXXXXXXXX`  | Codepoint from exactly 8 hex digits              |
//! | `\w \s \d`    | Word, whitespace and digit classes               |
//! | `\W \S \D`    | Their complements                                |
//! | `.`           | Any codepoint except NUL                         |
//! | `[...]`       | Set of literals, `lo-hi` ranges and classes      |
//! | `[^...]`      | Complement of a set                              |

use itertools::Either;

use super::utf8::{self, MAX_CODEPOINT};

/// An inclusive range of codepoints, `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodepointRange {
    pub lo: u32,
    pub hi: u32,
}

impl CodepointRange {
    pub const fn new(lo: u32, hi: u32) -> Self {
        Self { lo, hi }
    }

    pub const fn single(cp: u32) -> Self {
        Self { lo: cp, hi: cp }
    }

    pub fn contains(&self, cp: u32) -> bool {
        self.lo <= cp && cp <= self.hi
    }

    /// True if this range and `[lo, hi]` share at least one codepoint.
    pub fn intersects(&self, lo: u32, hi: u32) -> bool {
        self.lo.max(lo) <= self.hi.min(hi)
    }

    /// The part of this range inside `[lo, hi]`, if any.
    pub fn clip(&self, lo: u32, hi: u32) -> Option<Self> {
        self.intersects(lo, hi)
            .then(|| Self::new(self.lo.max(lo), self.hi.min(hi)))
    }
}

const RESERVED: &[u8] = b"]\\+*?^$.[{}()|/";

/// True for the ASCII characters that must be escaped to be used literally.
pub fn is_reserved(cp: u32) -> bool {
    cp < 0x80 && RESERVED.contains(&(cp as u8))
}

/// True for the six ASCII whitespace characters matched by `\s`.
pub fn is_whitespace(cp: u32) -> bool {
    matches!(cp, 0x09..=0x0D | 0x20)
}

/// The `\w \W \s \S \d \D` shorthand classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeClass {
    Word,
    NotWord,
    Space,
    NotSpace,
    Digit,
    NotDigit,
}

const WORD: &[CodepointRange] = &[
    CodepointRange::new(0x30, 0x39),
    CodepointRange::new(0x41, 0x5A),
    CodepointRange::single(0x5F),
    CodepointRange::new(0x61, 0x7A),
];
const NOT_WORD: &[CodepointRange] = &[
    CodepointRange::new(0x01, 0x2F),
    CodepointRange::new(0x3A, 0x40),
    CodepointRange::new(0x5B, 0x5E),
    CodepointRange::single(0x60),
    CodepointRange::new(0x7B, MAX_CODEPOINT),
];
const SPACE: &[CodepointRange] = &[
    CodepointRange::new(0x09, 0x0D),
    CodepointRange::single(0x20),
];
const NOT_SPACE: &[CodepointRange] = &[
    CodepointRange::new(0x01, 0x08),
    CodepointRange::new(0x0E, 0x1F),
    CodepointRange::new(0x21, MAX_CODEPOINT),
];
const DIGIT: &[CodepointRange] = &[CodepointRange::new(0x30, 0x39)];
const NOT_DIGIT: &[CodepointRange] = &[
    CodepointRange::new(0x01, 0x2F),
    CodepointRange::new(0x3A, MAX_CODEPOINT),
];

impl EscapeClass {
    fn from_letter(b: u8) -> Option<Self> {
        match b {
            b'w' => Some(Self::Word),
            b'W' => Some(Self::NotWord),
            b's' => Some(Self::Space),
            b'S' => Some(Self::NotSpace),
            b'd' => Some(Self::Digit),
            b'D' => Some(Self::NotDigit),
            _ => None,
        }
    }

    /// The class as ordered, disjoint ranges. Complements exclude NUL.
    pub fn ranges(&self) -> &'static [CodepointRange] {
        match self {
            Self::Word => WORD,
            Self::NotWord => NOT_WORD,
            Self::Space => SPACE,
            Self::NotSpace => NOT_SPACE,
            Self::Digit => DIGIT,
            Self::NotDigit => NOT_DIGIT,
        }
    }
}

/// The contents of a bracketed set, between `[` (or `[^`) and `]`.
///
/// Only produced by [`parse_charset`], so the body is known to be valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBody<'a>(&'a [u8]);

impl<'a> SetBody<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    /// Every range the body names, in source order, with classes expanded.
    /// Ranges may overlap and are not sorted.
    pub fn items(&self) -> impl Iterator<Item = CodepointRange> + 'a {
        let mut rest = self.0;
        std::iter::from_fn(move || {
            let (item, len) = parse_set_item(rest)?;
            rest = &rest[len..];
            Some(item)
        })
        .flat_map(|item| match item {
            SetItem::Range(range) => Either::Left(std::iter::once(range)),
            SetItem::Class(class) => Either::Right(class.ranges().iter().copied()),
        })
    }
}

/// One parsed charset atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset<'a> {
    Literal(u32),
    Any,
    Class(EscapeClass),
    Set { negated: bool, body: SetBody<'a> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetItem {
    Range(CodepointRange),
    Class(EscapeClass),
}

/// Parse one charset atom at the front of `bytes`.
pub fn parse_charset(bytes: &[u8]) -> Option<(Charset<'_>, usize)> {
    match bytes.first()? {
        b'[' => parse_set(bytes),
        b'.' => Some((Charset::Any, 1)),
        b'\\' => parse_escape_class(bytes)
            .map(|(class, len)| (Charset::Class(class), len))
            .or_else(|| parse_single(bytes).map(|(cp, len)| (Charset::Literal(cp), len))),
        _ => parse_single(bytes).map(|(cp, len)| (Charset::Literal(cp), len)),
    }
}

/// Parse a single literal codepoint: a plain non-reserved character or an
/// escape that denotes exactly one codepoint.
pub fn parse_single(bytes: &[u8]) -> Option<(u32, usize)> {
    let (cp, len) = utf8::decode(bytes)?;
    match cp {
        0 => None,
        0x5C => parse_escaped(bytes),
        cp if is_reserved(cp) => None,
        cp => Some((cp, len)),
    }
}

/// Parse `\w`, `\W`, `\s`, `\S`, `\d` or `\D`.
pub fn parse_escape_class(bytes: &[u8]) -> Option<(EscapeClass, usize)> {
    match bytes {
        [b'\\', letter, ..] => EscapeClass::from_letter(*letter).map(|class| (class, 2)),
        _ => None,
    }
}

fn parse_escaped(bytes: &[u8]) -> Option<(u32, usize)> {
    let cp = match *bytes.get(1)? {
        b'a' => 0x07,
        b'f' => 0x0C,
        b't' => 0x09,
        b'n' => 0x0A,
        b'r' => 0x0D,
        b'v' => 0x0B,
        b'u' => return parse_hex(bytes.get(2..)?, 4).map(|cp| (cp, 6)),
        b'U' => return parse_hex(bytes.get(2..)?, 8).map(|cp| (cp, 10)),
        b if is_reserved(b as u32) => b as u32,
        _ => return None,
    };
    Some((cp, 2))
}

/// Exactly `digits` hex digits naming a codepoint in `1..=MAX_CODEPOINT`.
fn parse_hex(bytes: &[u8], digits: usize) -> Option<u32> {
    let cp = bytes
        .get(..digits)?
        .iter()
        .try_fold(0u32, |acc, &b| Some((acc << 4) | (b as char).to_digit(16)?))?;
    (cp != 0 && cp <= MAX_CODEPOINT).then_some(cp)
}

fn parse_set(bytes: &[u8]) -> Option<(Charset<'_>, usize)> {
    let negated = bytes.get(1) == Some(&b'^');
    let start = if negated { 2 } else { 1 };
    let mut at = start;
    while *bytes.get(at)? != b']' {
        let (_, len) = parse_set_item(&bytes[at..])?;
        at += len;
    }
    let body = SetBody(&bytes[start..at]);
    Some((Charset::Set { negated, body }, at + 1))
}

/// A literal, a `lo-hi` range or a shorthand class. A range whose bounds are
/// out of order fails rather than falling back to separate literals.
fn parse_set_item(bytes: &[u8]) -> Option<(SetItem, usize)> {
    if let Some((class, len)) = parse_escape_class(bytes) {
        return Some((SetItem::Class(class), len));
    }
    let (lo, len) = parse_single(bytes)?;
    if bytes.get(len) == Some(&b'-')
        && let Some((hi, hi_len)) = parse_single(&bytes[len + 1..])
    {
        let range = CodepointRange::new(lo, hi);
        return (lo <= hi).then_some((SetItem::Range(range), len + 1 + hi_len));
    }
    Some((SetItem::Range(CodepointRange::single(lo)), len))
}
