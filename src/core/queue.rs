//! Bounded circular ready queue.
//!
//! Capacity is fixed at construction to the process population, so an
//! overflowing push can only happen if the engine enqueues a process twice.
//! Such pushes are dropped instead of growing the buffer.

use super::state::ProcId;

#[derive(Debug)]
pub struct ReadyQueue {
    slots: Box<[ProcId]>,
    head: usize,
    len: usize,
}

impl ReadyQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Append `id` at the tail. Returns false (and drops `id`) when full.
    pub fn push(&mut self, id: ProcId) -> bool {
        if self.is_full() {
            return false;
        }
        let tail = (self.head + self.len) % self.capacity();
        self.slots[tail] = id;
        self.len += 1;
        true
    }

    pub fn pop(&mut self) -> Option<ProcId> {
        if self.is_empty() {
            return None;
        }
        let id = self.slots[self.head];
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        Some(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = ProcId> + '_ {
        (0..self.len).map(move |i| self.slots[(self.head + i) % self.capacity()])
    }

    pub fn contains(&self, id: ProcId) -> bool {
        self.iter().any(|queued| queued == id)
    }

    /// Drop every entry for `id`, keeping the order of the rest. Returns
    /// whether anything was removed.
    pub fn remove(&mut self, id: ProcId) -> bool {
        let kept: Vec<ProcId> = self.iter().filter(|&queued| queued != id).collect();
        if kept.len() == self.len {
            return false;
        }
        self.head = 0;
        self.len = kept.len();
        self.slots[..kept.len()].copy_from_slice(&kept);
        true
    }
}
