//! Postfix tree to bytecode.
//!
//! Layouts, with `o` the first pc of the node:
//!
//! | Node    | Code                                         | Size        |
//! |---------|----------------------------------------------|-------------|
//! | `A\|B`  | `B L1; <A>; J L2; L1: <B>; L2:`              | `a + b + 2` |
//! | `AB`    | `<A>; <B>`                                   | `a + b`     |
//! | `X*`    | `o: B L2; <X>; J o; L2:`                     | `x + 2`     |
//! | `X*?`   | `o: BWP L2; <X>; J o; L2:`                   | `x + 2`     |
//! | `X+`    | `o: <X>; BWP o`                              | `x + 1`     |
//! | `X+?`   | `o: <X>; B o`                                | `x + 1`     |
//! | `X?`    | `B L1; <X>; L1:`                             | `x + 1`     |
//! | `X??`   | `BWP L1; <X>; L1:`                           | `x + 1`     |
//!
//! A charset atom compiles to one halt test per gap of its codepoint set,
//! the last one advancing. An atom denoting exactly one codepoint compiles
//! to a single `HNIA`. Every program ends with `M`.

use itertools::{Either, Itertools, Position};
use log::{debug, trace};

use crate::error::{Error, SyntaxKind};
use crate::syntax::{
    Ast, Charset, CodepointRange, DEFAULT_ARENA_CAPACITY, Greed, MAX_CODEPOINT, Node, build,
    parse_charset,
};
use crate::vm::{Instruction, MAX_PROGRAM_LEN, Opcode, Program};

use super::ranges::{inverted_ranges, ranges};

/// Knobs for [`Compiler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    arena_capacity: usize,
    ceiling: u32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            arena_capacity: DEFAULT_ARENA_CAPACITY,
            ceiling: MAX_CODEPOINT,
        }
    }
}

impl CompileOptions {
    /// Cells available to the parser for its operator stack and tree.
    pub fn arena_capacity(mut self, cells: usize) -> Self {
        self.arena_capacity = cells;
        self
    }

    /// Highest codepoint a class may match. Clamped to `1..=MAX_CODEPOINT`.
    pub fn ceiling(mut self, cp: u32) -> Self {
        self.ceiling = cp.clamp(1, MAX_CODEPOINT);
        self
    }

    pub fn get_arena_capacity(&self) -> usize {
        self.arena_capacity
    }

    pub fn get_ceiling(&self) -> u32 {
        self.ceiling
    }
}

/// Receives emitted instructions. Sizing and emission run the same code with
/// different sinks, so a size is always the length of the real output.
trait Sink {
    fn push(&mut self, inst: Instruction);
}

#[derive(Default)]
struct Counter(usize);

impl Sink for Counter {
    fn push(&mut self, _: Instruction) {
        self.0 += 1;
    }
}

struct Writer<'a> {
    out: &'a mut [Instruction],
    at: usize,
}

impl Sink for Writer<'_> {
    fn push(&mut self, inst: Instruction) {
        self.out[self.at] = inst;
        self.at += 1;
    }
}

/// Codepoint set of an atom, clipped to `[1, ceiling]`, ordered and disjoint.
pub fn charset_ranges(charset: Charset<'_>, ceiling: u32) -> Vec<CodepointRange> {
    let ranges = match charset {
        Charset::Literal(cp) => Either::Left(vec![CodepointRange::single(cp)].into_iter()),
        Charset::Any => Either::Left(vec![CodepointRange::new(1, MAX_CODEPOINT)].into_iter()),
        Charset::Class(class) => Either::Left(class.ranges().to_vec().into_iter()),
        Charset::Set {
            negated: false,
            body,
        } => Either::Right(Either::Left(ranges(body))),
        Charset::Set { negated: true, body } => Either::Right(Either::Right(inverted_ranges(body))),
    };
    ranges.filter_map(|range| range.clip(1, ceiling)).collect()
}

/// Codepoints in `[0, MAX_CODEPOINT]` outside `ranges`. Never empty, since
/// `ranges` excludes 0.
fn gaps(ranges: &[CodepointRange]) -> Vec<CodepointRange> {
    let mut gaps = Vec::with_capacity(ranges.len() + 1);
    let mut cursor = 0;
    for range in ranges {
        if range.lo > cursor {
            gaps.push(CodepointRange::new(cursor, range.lo - 1));
        }
        cursor = range.hi + 1;
    }
    if cursor <= MAX_CODEPOINT {
        gaps.push(CodepointRange::new(cursor, MAX_CODEPOINT));
    }
    gaps
}

fn emit_charset(charset: Charset<'_>, ceiling: u32, sink: &mut impl Sink) {
    let ranges = charset_ranges(charset, ceiling);
    if let [only] = ranges.as_slice()
        && only.lo == only.hi
    {
        sink.push(Instruction::new(Opcode::HaltNotImmAdvance, only.lo));
        return;
    }
    for (position, gap) in gaps(&ranges).into_iter().with_position() {
        let advance = matches!(position, Position::Last | Position::Only);
        if gap.lo == gap.hi {
            let op = if advance { Opcode::HaltImmAdvance } else { Opcode::HaltImm };
            sink.push(Instruction::new(op, gap.lo));
        } else {
            let op = if advance { Opcode::HaltRangeAdvance } else { Opcode::HaltRange };
            sink.push(Instruction::new(Opcode::LoadRange, gap.hi));
            sink.push(Instruction::new(op, gap.lo));
        }
    }
}

/// A tree node with its measured size and the indices of its children.
#[derive(Debug, Clone, Copy)]
struct Measured<'a> {
    node: Node,
    charset: Option<Charset<'a>>,
    size: usize,
    children: [usize; 2],
    offset: usize,
}

/// Compiles patterns to [`Program`]s.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile `pattern` to a program ending in `M`.
    pub fn compile(&self, pattern: &[u8]) -> Result<Program, Error> {
        let ast = build(pattern, self.options.arena_capacity)?;
        let mut nodes = self.measure(&ast)?;
        let len = self.program_len(&nodes)?;
        place(&mut nodes);

        let mut insts = vec![Instruction::MATCH; len];
        for node in &nodes {
            self.write(node, &nodes, &mut insts);
        }
        debug!("compiled {} nodes into {} instructions", nodes.len(), len);
        let program = Program::new(insts);
        trace!("program:\n{program}");
        Ok(program)
    }

    /// Number of instructions [`compile`](Self::compile) would produce,
    /// without emitting them.
    pub fn compiled_len(&self, pattern: &[u8]) -> Result<usize, Error> {
        let ast = build(pattern, self.options.arena_capacity)?;
        let nodes = self.measure(&ast)?;
        self.program_len(&nodes)
    }

    fn program_len(&self, nodes: &[Measured<'_>]) -> Result<usize, Error> {
        let len = nodes.last().map_or(0, |root| root.size) + 1;
        if len > MAX_PROGRAM_LEN {
            return Err(Error::OutOfMemory {
                needed: len,
                available: MAX_PROGRAM_LEN,
            });
        }
        Ok(len)
    }

    /// Size every node in postfix order, linking each to its children.
    fn measure<'a>(&self, ast: &Ast<'a>) -> Result<Vec<Measured<'a>>, Error> {
        let mut nodes: Vec<Measured<'a>> = Vec::with_capacity(ast.len());
        let mut stack: Vec<usize> = Vec::new();
        for &node in ast.postfix() {
            let mut sized = Measured {
                node,
                charset: None,
                size: 0,
                children: [0; 2],
                offset: 0,
            };
            match node {
                Node::Atom(span) => {
                    let (charset, _) =
                        parse_charset(ast.atom_source(span)).ok_or_else(|| malformed(span.start))?;
                    let mut counter = Counter::default();
                    emit_charset(charset, self.options.ceiling, &mut counter);
                    sized.charset = Some(charset);
                    sized.size = counter.0;
                }
                Node::Alternation | Node::Concat => {
                    let right = stack.pop().ok_or_else(|| malformed(0))?;
                    let left = stack.pop().ok_or_else(|| malformed(0))?;
                    sized.children = [left, right];
                    let inner = nodes[left].size + nodes[right].size;
                    sized.size = if node == Node::Concat { inner } else { inner + 2 };
                }
                Node::Group | Node::Kleene(_) | Node::Plus(_) | Node::Question(_) => {
                    let body = stack.pop().ok_or_else(|| malformed(0))?;
                    sized.children = [body, body];
                    sized.size = nodes[body].size
                        + match node {
                            Node::Kleene(_) => 2,
                            Node::Plus(_) | Node::Question(_) => 1,
                            _ => 0,
                        };
                }
                Node::Open => return Err(malformed(0)),
            }
            stack.push(nodes.len());
            nodes.push(sized);
        }
        if stack.len() != 1 {
            return Err(malformed(ast.src().len()));
        }
        Ok(nodes)
    }

    /// Emit the instructions a node owns; children write their own.
    fn write(&self, sized: &Measured<'_>, nodes: &[Measured<'_>], out: &mut [Instruction]) {
        let o = sized.offset;
        let [left, right] = sized.children.map(|i| nodes[i].size);
        let lazy = |greed: Greed| greed == Greed::Lazy;
        match sized.node {
            Node::Atom(_) => {
                if let Some(charset) = sized.charset {
                    let mut writer = Writer { out, at: o };
                    emit_charset(charset, self.options.ceiling, &mut writer);
                }
            }
            Node::Alternation => {
                out[o] = Instruction::new(Opcode::Split, (o + 2 + left) as u32);
                out[o + 1 + left] = Instruction::new(Opcode::Jump, (o + 2 + left + right) as u32);
            }
            Node::Kleene(greed) => {
                let op = if lazy(greed) { Opcode::SplitPriority } else { Opcode::Split };
                out[o] = Instruction::new(op, (o + 2 + left) as u32);
                out[o + 1 + left] = Instruction::new(Opcode::Jump, o as u32);
            }
            Node::Plus(greed) => {
                let op = if lazy(greed) { Opcode::Split } else { Opcode::SplitPriority };
                out[o + left] = Instruction::new(op, o as u32);
            }
            Node::Question(greed) => {
                let op = if lazy(greed) { Opcode::SplitPriority } else { Opcode::Split };
                out[o] = Instruction::new(op, (o + 1 + left) as u32);
            }
            Node::Concat | Node::Group | Node::Open => {}
        }
    }
}

/// Assign start pcs top-down: the root starts at 0 and each node places its
/// children inside its own layout.
fn place(nodes: &mut [Measured<'_>]) {
    for i in (0..nodes.len()).rev() {
        let Measured {
            node,
            offset: o,
            children: [left, right],
            ..
        } = nodes[i];
        match node {
            Node::Alternation => {
                nodes[left].offset = o + 1;
                nodes[right].offset = o + 2 + nodes[left].size;
            }
            Node::Concat => {
                nodes[left].offset = o;
                nodes[right].offset = o + nodes[left].size;
            }
            Node::Kleene(_) | Node::Question(_) => nodes[left].offset = o + 1,
            Node::Group | Node::Plus(_) => nodes[left].offset = o,
            Node::Atom(_) | Node::Open => {}
        }
    }
}

fn malformed(offset: usize) -> Error {
    Error::syntax(offset, SyntaxKind::MalformedTree)
}

/// Compile `pattern` with default options.
pub fn compile(pattern: &[u8]) -> Result<Program, Error> {
    Compiler::default().compile(pattern)
}

/// Instruction count [`compile`] would produce for `pattern`.
pub fn compiled_len(pattern: &[u8]) -> Result<usize, Error> {
    Compiler::default().compiled_len(pattern)
}
