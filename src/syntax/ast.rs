//! Shunting-yard AST construction.
//!
//! Operators wait on a stack growing up from the low end of a fixed arena,
//! while finished nodes are written downward from the high end. When the two
//! meet the arena is exhausted. The output region, read from the top of the
//! arena down, is the tree in postfix order: every node follows its operands,
//! and each node's arity is implied by its kind.

use log::debug;

use crate::error::{Error, SyntaxKind};
use crate::span::Span;

use super::token::{Greed, Token, Tokens};

/// Default number of arena cells.
pub const DEFAULT_ARENA_CAPACITY: usize = 4096;

/// A node of the encoded tree, or an operator waiting on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// A charset atom; the span covers its pattern source.
    Atom(Span),
    /// `(` on the operator stack. Never written to the output.
    Open,
    /// A parenthesised sub-expression.
    Group,
    Alternation,
    Concat,
    Kleene(Greed),
    Plus(Greed),
    Question(Greed),
}

impl Node {
    /// Number of operands the node consumes.
    pub fn arity(&self) -> usize {
        match self {
            Self::Atom(_) | Self::Open => 0,
            Self::Group | Self::Kleene(_) | Self::Plus(_) | Self::Question(_) => 1,
            Self::Alternation | Self::Concat => 2,
        }
    }

    /// Binding strength on the operator stack. `Open` is a barrier that only
    /// `)` removes.
    fn precedence(&self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Alternation => 1,
            Self::Concat => 2,
            Self::Kleene(_) | Self::Plus(_) | Self::Question(_) => 3,
            Self::Atom(_) | Self::Group => 4,
        }
    }

    fn from_operator(token: Token) -> Option<Self> {
        match token {
            Token::Alternation => Some(Self::Alternation),
            Token::Concat => Some(Self::Concat),
            Token::Kleene(greed) => Some(Self::Kleene(greed)),
            Token::Plus(greed) => Some(Self::Plus(greed)),
            Token::Question(greed) => Some(Self::Question(greed)),
            Token::Charset(_) | Token::LParen | Token::RParen => None,
        }
    }
}

/// Fixed-size cell buffer shared by the operator stack and the output.
#[derive(Debug)]
pub struct Arena {
    cells: Box<[Node]>,
    /// One past the top of the operator stack.
    low: usize,
    /// Index of the most recently written output node.
    high: usize,
}

impl Arena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: vec![Node::Open; capacity].into_boxed_slice(),
            low: 0,
            high: capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn exhausted(&self) -> Error {
        Error::OutOfMemory {
            needed: self.capacity() + 1,
            available: self.capacity(),
        }
    }

    fn push_op(&mut self, node: Node) -> Result<(), Error> {
        if self.low == self.high {
            return Err(self.exhausted());
        }
        self.cells[self.low] = node;
        self.low += 1;
        Ok(())
    }

    fn pop_op(&mut self) -> Option<Node> {
        if self.low == 0 {
            return None;
        }
        self.low -= 1;
        Some(self.cells[self.low])
    }

    fn top_op(&self) -> Option<Node> {
        self.low.checked_sub(1).map(|i| self.cells[i])
    }

    fn push_out(&mut self, node: Node) -> Result<(), Error> {
        if self.low == self.high {
            return Err(self.exhausted());
        }
        self.high -= 1;
        self.cells[self.high] = node;
        Ok(())
    }

    /// Output nodes in postfix order.
    pub fn output(&self) -> impl ExactSizeIterator<Item = &Node> + DoubleEndedIterator {
        self.cells[self.high..].iter().rev()
    }
}

/// A parsed pattern: the source and its postfix-encoded tree.
#[derive(Debug)]
pub struct Ast<'a> {
    src: &'a [u8],
    arena: Arena,
}

impl<'a> Ast<'a> {
    pub fn src(&self) -> &'a [u8] {
        self.src
    }

    /// Nodes in postfix order; the last one is the root.
    pub fn postfix(&self) -> impl ExactSizeIterator<Item = &Node> + DoubleEndedIterator {
        self.arena.output()
    }

    pub fn len(&self) -> usize {
        self.postfix().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Source text of an atom.
    pub fn atom_source(&self, span: Span) -> &'a [u8] {
        &self.src[span.range()]
    }
}

/// Shunting-yard state over one pattern.
struct Builder {
    arena: Arena,
    /// True when the next token must start an operand.
    expect_operand: bool,
}

impl Builder {
    /// Move `node` to the output.
    fn emit(&mut self, node: Node) -> Result<(), Error> {
        self.arena.push_out(node)
    }

    /// Resolve a binary or postfix operator against the stack, then push it.
    fn operator(&mut self, node: Node) -> Result<(), Error> {
        while let Some(top) = self.arena.top_op()
            && top.precedence() >= node.precedence()
        {
            self.arena.pop_op();
            self.emit(top)?;
        }
        self.arena.push_op(node)
    }

    /// Pop operators down to the matching `(` and close the group.
    fn close_group(&mut self, offset: usize) -> Result<(), Error> {
        loop {
            match self.arena.pop_op() {
                None => return Err(Error::syntax(offset, SyntaxKind::UnbalancedParen)),
                Some(Node::Open) => return self.emit(Node::Group),
                Some(node) => self.emit(node)?,
            }
        }
    }

    fn token(&mut self, offset: usize, token: Token) -> Result<(), Error> {
        let wants_operand = matches!(token, Token::Charset(_) | Token::LParen);
        if wants_operand != self.expect_operand {
            return Err(Error::syntax(offset, SyntaxKind::MissingOperand));
        }
        match token {
            Token::Charset(span) => {
                self.emit(Node::Atom(span))?;
                self.expect_operand = false;
            }
            Token::LParen => self.arena.push_op(Node::Open)?,
            Token::RParen => self.close_group(offset)?,
            Token::Alternation | Token::Concat => {
                self.operator(Node::from_operator(token).ok_or_else(|| malformed(offset))?)?;
                self.expect_operand = true;
            }
            Token::Kleene(_) | Token::Plus(_) | Token::Question(_) => {
                self.operator(Node::from_operator(token).ok_or_else(|| malformed(offset))?)?;
            }
        }
        Ok(())
    }

    fn finish(mut self, end: usize) -> Result<Arena, Error> {
        if self.expect_operand {
            let kind = if self.arena.output().len() == 0 && self.arena.top_op().is_none() {
                SyntaxKind::EmptyPattern
            } else {
                SyntaxKind::MissingOperand
            };
            return Err(Error::syntax(end, kind));
        }
        while let Some(node) = self.arena.pop_op() {
            if node == Node::Open {
                return Err(Error::syntax(end, SyntaxKind::UnbalancedParen));
            }
            self.emit(node)?;
        }
        Ok(self.arena)
    }
}

fn malformed(offset: usize) -> Error {
    Error::syntax(offset, SyntaxKind::MalformedTree)
}

/// Build the postfix tree for `src` in an arena of `capacity` cells.
///
/// A concatenation operator is spliced in wherever a token that ends an
/// operand is directly followed by one that begins another.
pub fn build(src: &[u8], capacity: usize) -> Result<Ast<'_>, Error> {
    let mut builder = Builder {
        arena: Arena::with_capacity(capacity),
        expect_operand: true,
    };
    let mut tokens = Tokens::new(src).peekable();
    while let Some(item) = tokens.next() {
        let (offset, token) = item?;
        builder.token(offset, token)?;
        if token.ends_operand()
            && let Some(Ok((next, following))) = tokens.peek()
            && following.begins_operand()
        {
            builder.token(*next, Token::Concat)?;
        }
    }
    let arena = builder.finish(src.len())?;
    debug!(
        "built tree of {} nodes for {:?}",
        arena.output().len(),
        String::from_utf8_lossy(src)
    );
    Ok(Ast { src, arena })
}
