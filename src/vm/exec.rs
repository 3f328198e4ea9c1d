//! Pike VM executor.
//!
//! All threads advance in lock step over the input, one codepoint per step.
//! Control instructions are expanded as soon as a thread reaches them, so
//! the threads examined in a step all sit on a test or on `M`. The first
//! thread in priority order to reach `M` ends the step; lower-priority
//! threads are dropped and higher-priority ones carry on for a longer match.

use log::trace;

use crate::error::Error;
use crate::span::Span;
use crate::syntax::decode;

use super::inst::{Instruction, Opcode};
use super::threads::{ThreadList, UNSET, stride};

/// Executes programs in a scratch block of fixed size.
#[derive(Debug, Clone)]
pub struct Vm {
    memory: Vec<usize>,
}

impl Vm {
    /// A VM with a scratch block of `words` words.
    pub fn with_capacity(words: usize) -> Self {
        Self {
            memory: vec![0; words],
        }
    }

    /// A VM sized for `program` with `slots` capture pairs.
    pub fn for_program(program: &[Instruction], slots: usize) -> Self {
        Self::with_capacity(Self::required_words(program.len(), slots))
    }

    /// Scratch words needed to run a program of `len` instructions with
    /// `slots` capture pairs: two lists of `len` threads.
    pub fn required_words(len: usize, slots: usize) -> usize {
        stride(slots) * len * 2
    }

    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    /// Run `program` anchored at the start of `input`.
    ///
    /// `captures[k]` receives the span recorded by slots `2k` and `2k + 1`
    /// of the preferred matching thread. Slot 0 is the match start and
    /// slot 1 its end, so `captures[0]` is the whole match. Entries are left
    /// untouched when nothing matches.
    pub fn exec(
        &mut self,
        program: &[Instruction],
        input: &[u8],
        captures: &mut [Option<Span>],
    ) -> Result<bool, Error> {
        if program.is_empty() {
            return Err(Error::BadParam("program is empty"));
        }
        let stride = stride(captures.len());
        let needed = Self::required_words(program.len(), captures.len());
        if self.memory.len() < needed {
            return Err(Error::OutOfMemory {
                needed,
                available: self.memory.len(),
            });
        }
        let (current, next) = self.memory[..needed].split_at_mut(needed / 2);
        let mut run = Run {
            program,
            clist: ThreadList::new(current, stride),
            nlist: ThreadList::new(next, stride),
            matched: false,
        };
        run.exec(input, captures)
    }
}

struct Run<'p, 'm> {
    program: &'p [Instruction],
    clist: ThreadList<'m>,
    nlist: ThreadList<'m>,
    matched: bool,
}

/// What a thread does after testing the current codepoint.
enum Step {
    Halt,
    Advance(usize),
    Match,
}

impl Run<'_, '_> {
    fn exec(&mut self, input: &[u8], captures: &mut [Option<Span>]) -> Result<bool, Error> {
        self.clist.start(0);
        if let Some(start) = self.clist.slots_mut(0).first_mut() {
            *start = 0;
        }
        expand(self.program, &mut self.clist, 0, 0)?;

        let mut pos = 0;
        loop {
            let (cp, len) = match input.get(pos..).and_then(decode) {
                Some((cp, len)) if cp != 0 => (cp, len),
                _ => (0, 0),
            };
            trace!("pos {pos}: cp {cp:#x}, {} threads", self.clist.len());

            for i in 0..self.clist.len() {
                if self.clist.is_expanded(i) {
                    continue;
                }
                match self.test(self.clist.pc(i), cp)? {
                    Step::Halt => {}
                    Step::Advance(pc) => {
                        if let Some(at) = self.nlist.push(pc, self.clist.slots(i)) {
                            expand(self.program, &mut self.nlist, at, pos + len)?;
                        }
                    }
                    Step::Match => {
                        self.matched = true;
                        if let Some(end) = self.clist.slots_mut(i).get_mut(1) {
                            *end = pos;
                        }
                        record(self.clist.slots(i), captures);
                        trace!("match at pos {pos}");
                        break;
                    }
                }
            }

            if len == 0 || self.nlist.is_empty() {
                break;
            }
            std::mem::swap(&mut self.clist, &mut self.nlist);
            self.nlist.clear();
            pos += len;
        }
        Ok(self.matched)
    }

    /// Run the test chain starting at `pc` against `cp`.
    fn test(&self, mut pc: usize, cp: u32) -> Result<Step, Error> {
        let mut range_max = 0;
        loop {
            let inst = fetch(self.program, pc)?;
            let imm = inst.operand();
            let hit = match inst.opcode() {
                Some(Opcode::HaltImm | Opcode::HaltImmAdvance) => cp == imm,
                Some(Opcode::HaltNotImm | Opcode::HaltNotImmAdvance) => cp != imm,
                Some(Opcode::HaltRange | Opcode::HaltRangeAdvance) => imm <= cp && cp <= range_max,
                Some(Opcode::LoadRange) => {
                    range_max = imm;
                    pc += 1;
                    continue;
                }
                Some(Opcode::Match) => return Ok(Step::Match),
                _ => return Err(bad(pc, inst)),
            };
            if hit {
                return Ok(Step::Halt);
            }
            match inst.opcode() {
                Some(Opcode::HaltImmAdvance | Opcode::HaltNotImmAdvance | Opcode::HaltRangeAdvance) => {
                    return Ok(Step::Advance(pc + 1));
                }
                _ => pc += 1,
            }
        }
    }
}

fn fetch(program: &[Instruction], pc: usize) -> Result<Instruction, Error> {
    program
        .get(pc)
        .copied()
        .ok_or(Error::BadInstruction { pc, word: 0 })
}

fn bad(pc: usize, inst: Instruction) -> Error {
    Error::BadInstruction {
        pc,
        word: inst.word(),
    }
}

/// Follow control instructions from entry `start` onwards until every
/// remaining thread sits on a test or `M`. New threads are inserted right
/// after the thread that spawned them, in priority order.
fn expand(
    program: &[Instruction],
    list: &mut ThreadList,
    start: usize,
    pos: usize,
) -> Result<(), Error> {
    let mut i = start;
    while i < list.len() {
        if list.is_expanded(i) {
            i += 1;
            continue;
        }
        let pc = list.pc(i);
        let inst = fetch(program, pc)?;
        let Some(op) = inst.opcode() else {
            return Err(bad(pc, inst));
        };
        if !op.is_control() {
            i += 1;
            continue;
        }
        let target = inst.operand() as usize;
        let next = pc + 1;
        let target_ok = !op.is_branch() || target < program.len();
        let next_ok = op == Opcode::Jump || next < program.len();
        if !(target_ok && next_ok) {
            return Err(bad(pc, inst));
        }
        list.mark_expanded(i);
        match op {
            Opcode::Jump => {
                list.insert(i + 1, target, i);
            }
            Opcode::Split => {
                let first = list.insert(i + 1, next, i);
                list.insert(i + 1 + first as usize, target, i);
            }
            Opcode::SplitPriority => {
                let first = list.insert(i + 1, target, i);
                list.insert(i + 1 + first as usize, next, i);
            }
            Opcode::Save => {
                if list.insert(i + 1, next, i)
                    && let Some(slot) = list.slots_mut(i + 1).get_mut(target)
                {
                    *slot = pos;
                }
            }
            _ => {}
        }
        i += 1;
    }
    Ok(())
}

/// Copy slot pairs into `captures`.
fn record(slots: &[usize], captures: &mut [Option<Span>]) {
    for (capture, pair) in captures.iter_mut().zip(slots.chunks_exact(2)) {
        *capture = match *pair {
            [start, end] if start != UNSET && end != UNSET && start <= end => {
                Some(Span::new(start, end - start))
            }
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use crate::vm::inst::assemble;

    fn run(program: &[Instruction], input: &str) -> Option<(usize, usize)> {
        let mut vm = Vm::for_program(program, 1);
        let mut captures = [None];
        let matched = vm.exec(program, input.as_bytes(), &mut captures).unwrap();
        matched.then(|| captures[0].map(Span::into)).flatten()
    }

    fn run_pattern(pattern: &str, input: &str) -> Option<(usize, usize)> {
        run(&compile(pattern.as_bytes()).unwrap(), input)
    }

    // ─── Greed ──────────────────────────────────────────────────────────────

    #[test]
    fn greedy_star_takes_longest() {
        assert_eq!(run_pattern("a*", "aaa"), Some((0, 3)));
        assert_eq!(run_pattern("a*", "aab"), Some((0, 2)));
    }

    #[test]
    fn lazy_star_takes_shortest() {
        assert_eq!(run_pattern("a*?", "aaa"), Some((0, 0)));
        assert_eq!(run_pattern("a*?b", "aab"), Some((0, 3)));
    }

    #[test]
    fn plus_greed() {
        assert_eq!(run_pattern("a+", "aaab"), Some((0, 3)));
        assert_eq!(run_pattern("a+?", "aaab"), Some((0, 1)));
        assert_eq!(run_pattern("a+", "baa"), None);
    }

    #[test]
    fn question_greed() {
        assert_eq!(run_pattern("ab?", "abc"), Some((0, 2)));
        assert_eq!(run_pattern("ab??", "abc"), Some((0, 1)));
    }

    #[test]
    fn alternation_prefers_left() {
        assert_eq!(run_pattern("a|ab", "abc"), Some((0, 1)));
        assert_eq!(run_pattern("ab|a", "abc"), Some((0, 2)));
        assert_eq!(run_pattern("x|y", "z"), None);
    }

    #[test]
    fn nested_empty_loop_terminates() {
        assert_eq!(run_pattern("(a*)*", "aa"), Some((0, 2)));
        assert_eq!(run_pattern("(a?)+b", "aab"), Some((0, 3)));
    }

    // ─── Input handling ─────────────────────────────────────────────────────

    #[test]
    fn anchored_at_start() {
        assert_eq!(run_pattern("b", "ab"), None);
    }

    #[test]
    fn multibyte_positions_are_bytes() {
        assert_eq!(run_pattern("é+", "ééx"), Some((0, 4)));
        assert_eq!(run_pattern(".", "☀"), Some((0, 3)));
    }

    #[test]
    fn nul_ends_input() {
        assert_eq!(run_pattern("a*", "aa\0aa"), Some((0, 2)));
        assert_eq!(run_pattern("a+b", "a\0b"), None);
    }

    #[test]
    fn invalid_utf8_ends_input() {
        let program = compile(b"a*").unwrap();
        let mut vm = Vm::for_program(&program, 1);
        let mut captures = [None];
        assert_eq!(vm.exec(&program, &[b'a', 0xFF, b'a'], &mut captures), Ok(true));
        assert_eq!(captures[0], Some(Span::new(0, 1)));
    }

    #[test]
    fn empty_input() {
        assert_eq!(run_pattern("a*", ""), Some((0, 0)));
        assert_eq!(run_pattern("a", ""), None);
    }

    // ─── Captures ───────────────────────────────────────────────────────────

    #[test]
    fn save_slots_record_groups() {
        let program = assemble(
            "HNIA 'x'\n\
             SS 2\n\
             HNIA 'a'\n\
             BWP 2\n\
             SS 3\n\
             M\n",
        )
        .unwrap();
        let mut vm = Vm::for_program(&program, 2);
        let mut captures = [None; 2];
        assert_eq!(vm.exec(&program, b"xaaay", &mut captures), Ok(true));
        assert_eq!(captures, [Some(Span::new(0, 4)), Some(Span::new(1, 3))]);
    }

    #[test]
    fn slots_beyond_captures_are_ignored() {
        let program = assemble("SS 5\nHNIA 'a'\nM").unwrap();
        assert_eq!(run(&program, "a"), Some((0, 1)));
    }

    #[test]
    fn no_captures_still_reports_match() {
        let program = compile(b"ab").unwrap();
        let mut vm = Vm::for_program(&program, 0);
        assert_eq!(vm.exec(&program, b"ab", &mut []), Ok(true));
        assert_eq!(vm.exec(&program, b"ba", &mut []), Ok(false));
    }

    #[test]
    fn captures_untouched_without_match() {
        let program = compile(b"a").unwrap();
        let mut vm = Vm::for_program(&program, 1);
        let mut captures = [Some(Span::new(7, 7))];
        assert_eq!(vm.exec(&program, b"b", &mut captures), Ok(false));
        assert_eq!(captures, [Some(Span::new(7, 7))]);
    }

    // ─── Errors ─────────────────────────────────────────────────────────────

    #[test]
    fn small_memory_is_out_of_memory() {
        let program = compile(br"\w+").unwrap();
        let needed = Vm::required_words(program.len(), 1);
        assert_eq!(needed, 3 * program.len() * 2);
        let mut vm = Vm::with_capacity(needed - 1);
        let mut captures = [None];
        assert_eq!(
            vm.exec(&program, b"abc", &mut captures),
            Err(Error::OutOfMemory {
                needed,
                available: needed - 1
            })
        );
        assert_eq!(captures, [None]);
        let mut vm = Vm::with_capacity(needed);
        assert_eq!(vm.exec(&program, b"abc", &mut captures), Ok(true));
    }

    #[test]
    fn undefined_opcode_is_bad_instruction() {
        let mut program = compile(b"ab").unwrap().into_inner();
        program[1] = Instruction::from_word(0xFF00_0062);
        let mut vm = Vm::for_program(&program, 1);
        assert_eq!(
            vm.exec(&program, b"ab", &mut [None]),
            Err(Error::BadInstruction {
                pc: 1,
                word: 0xFF00_0062
            })
        );
    }

    #[test]
    fn branch_out_of_program_is_bad_instruction() {
        let program = assemble("B 9\nM").unwrap();
        let mut vm = Vm::for_program(&program, 1);
        assert!(matches!(
            vm.exec(&program, b"", &mut [None]),
            Err(Error::BadInstruction { pc: 0, .. })
        ));
    }

    #[test]
    fn falling_off_the_end_is_bad_instruction() {
        let program = assemble("HI 'a'").unwrap();
        let mut vm = Vm::for_program(&program, 1);
        assert_eq!(
            vm.exec(&program, b"b", &mut [None]),
            Err(Error::BadInstruction { pc: 1, word: 0 })
        );
    }

    #[test]
    fn empty_program_is_bad_param() {
        let mut vm = Vm::with_capacity(64);
        assert!(matches!(
            vm.exec(&[], b"a", &mut [None]),
            Err(Error::BadParam(_))
        ));
    }
}
