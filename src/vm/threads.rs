//! Priority-ordered thread lists over caller-owned memory.
//!
//! Each entry is `stride` words: the pc word followed by the capture slots.
//! An entry's index is its priority, lowest first. A list holds at most one
//! entry per pc, so it never needs more entries than the program has
//! instructions.

/// Marks an entry whose control instruction has been expanded. The entry
/// stays in the list so its pc keeps blocking duplicates.
const EXPANDED: usize = 1 << (usize::BITS - 1);

/// Value of a capture slot that was never written.
pub const UNSET: usize = usize::MAX;

/// Words needed per thread for `slots` capture pairs.
pub fn stride(slots: usize) -> usize {
    1 + 2 * slots
}

pub struct ThreadList<'m> {
    cells: &'m mut [usize],
    stride: usize,
    len: usize,
}

impl<'m> ThreadList<'m> {
    /// A list over `cells`, holding `cells.len() / stride` entries.
    pub fn new(cells: &'m mut [usize], stride: usize) -> Self {
        Self {
            cells,
            stride,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn pc(&self, i: usize) -> usize {
        self.cells[i * self.stride] & !EXPANDED
    }

    pub fn is_expanded(&self, i: usize) -> bool {
        self.cells[i * self.stride] & EXPANDED != 0
    }

    pub fn mark_expanded(&mut self, i: usize) {
        self.cells[i * self.stride] |= EXPANDED;
    }

    pub fn slots(&self, i: usize) -> &[usize] {
        let base = i * self.stride;
        &self.cells[base + 1..base + self.stride]
    }

    pub fn slots_mut(&mut self, i: usize) -> &mut [usize] {
        let base = i * self.stride;
        &mut self.cells[base + 1..base + self.stride]
    }

    fn position(&self, pc: usize) -> Option<usize> {
        (0..self.len).find(|&i| self.pc(i) == pc)
    }

    /// Append the first thread of a run: `pc` with every slot unset.
    pub fn start(&mut self, pc: usize) {
        let at = self.len;
        self.len += 1;
        self.cells[at * self.stride] = pc;
        self.slots_mut(at).fill(UNSET);
    }

    /// Append `pc` carrying `slots` from another list, unless an entry for
    /// `pc` is already present. Returns the new entry's index.
    pub fn push(&mut self, pc: usize, slots: &[usize]) -> Option<usize> {
        if self.position(pc).is_some() {
            return None;
        }
        let at = self.len;
        self.len += 1;
        self.cells[at * self.stride] = pc;
        self.slots_mut(at).copy_from_slice(slots);
        Some(at)
    }

    /// Insert `pc` at index `at`, copying the slots of entry `from`, which
    /// must precede `at`.
    ///
    /// An entry for `pc` before `at` belongs to a higher-priority thread and
    /// wins; nothing is inserted and `false` is returned. An entry at or after
    /// `at` is lower priority and is replaced.
    pub fn insert(&mut self, at: usize, pc: usize, from: usize) -> bool {
        let s = self.stride;
        match self.position(pc) {
            Some(existing) if existing < at => return false,
            Some(existing) => {
                self.cells
                    .copy_within((existing + 1) * s..self.len * s, existing * s);
                self.len -= 1;
            }
            None => {}
        }
        self.cells.copy_within(at * s..self.len * s, (at + 1) * s);
        self.len += 1;
        self.cells[at * s] = pc;
        self.cells.copy_within(from * s + 1..(from + 1) * s, at * s + 1);
        true
    }
}
