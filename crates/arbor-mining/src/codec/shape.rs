//! Packed open/close bit sequence describing a pattern's tree shape.
//!
//! Every edge contributes an open bit (0) before the child's subtree and a
//! close bit (1) after it, in DFS order. The root has no edge, so a pattern
//! of `n` nodes has `2 * (n - 1)` bits. Bit `i` lives in `words[i / 64]` at
//! `63 - i % 64` (MSB first).

use serde::{Deserialize, Serialize};

use crate::hierarchy::mask::top_ones;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeBits {
    words: Vec<u64>,
    len: usize,
}

impl ShapeBits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(bits.div_ceil(64)),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// `true` for a close bit.
    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len);
        self.words[i / 64] >> (63 - i % 64) & 1 == 1
    }

    fn set(&mut self, i: usize, value: bool) {
        let bit = 1u64 << (63 - i % 64);
        if value {
            self.words[i / 64] |= bit;
        } else {
            self.words[i / 64] &= !bit;
        }
    }

    pub fn push(&mut self, close: bool) {
        if self.len % 64 == 0 {
            self.words.push(0);
        }
        self.len += 1;
        self.set(self.len - 1, close);
    }

    pub fn push_open(&mut self) {
        self.push(false);
    }

    pub fn push_close(&mut self) {
        self.push(true);
    }

    /// Inserts an empty edge (open, close) so that the open bit lands at `at`.
    /// Every bit at or after `at` moves two positions to the right.
    pub fn insert_edge(&mut self, at: usize) {
        debug_assert!(at <= self.len);
        let new_len = self.len + 2;
        self.words.resize(new_len.div_ceil(64), 0);

        let first = at / 64;
        if first < self.words.len() {
            for w in (first + 1..self.words.len()).rev() {
                self.words[w] = (self.words[w] >> 2) | (self.words[w - 1] << 62);
            }
            let head = top_ones((at % 64) as u32);
            let word = self.words[first];
            self.words[first] = (word & head) | ((word & !head) >> 2);
        }

        self.len = new_len;
        self.set(at, false);
        self.set(at + 1, true);
    }

    /// Decodes parent links and subtree extents for all `len / 2 + 1` nodes.
    pub fn topology(&self) -> Topology {
        let nodes = self.len / 2 + 1;
        let mut topo = Topology {
            parent: vec![None; nodes],
            open_bit: vec![0; nodes],
            close_bit: vec![self.len; nodes],
            subtree_end: vec![nodes; nodes],
        };

        let mut stack = vec![0usize];
        let mut next = 1usize;
        for i in 0..self.len {
            if self.get(i) {
                if let Some(node) = stack.pop() {
                    topo.close_bit[node] = i;
                    topo.subtree_end[node] = next;
                }
            } else {
                topo.parent[next] = stack.last().copied();
                topo.open_bit[next] = i;
                stack.push(next);
                next += 1;
            }
        }
        topo
    }
}

/// Per-node view of a shape, indexed by DFS position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    parent: Vec<Option<usize>>,
    open_bit: Vec<usize>,
    close_bit: Vec<usize>,
    subtree_end: Vec<usize>,
}

impl Topology {
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn parent(&self, pos: usize) -> Option<usize> {
        self.parent[pos]
    }

    /// Bit index of the edge opening `pos`; 0 for the root.
    pub fn open_bit(&self, pos: usize) -> usize {
        self.open_bit[pos]
    }

    /// Bit index of the edge closing `pos`; the shape length for the root.
    pub fn close_bit(&self, pos: usize) -> usize {
        self.close_bit[pos]
    }

    /// First DFS position after the subtree of `pos`.
    pub fn subtree_end(&self, pos: usize) -> usize {
        self.subtree_end[pos]
    }

    pub fn children(&self, pos: usize) -> impl Iterator<Item = usize> + '_ {
        (pos + 1..self.subtree_end[pos]).filter(move |&c| self.parent[c] == Some(pos))
    }

    /// `pos` and its ancestors, innermost first.
    pub fn ancestors(&self, pos: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(pos), move |&p| self.parent[p])
    }

    pub fn depth(&self, pos: usize) -> usize {
        self.ancestors(pos).count() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_shape(bits: &str) -> ShapeBits {
        let mut shape = ShapeBits::new();
        for b in bits.chars() {
            shape.push(b == '1');
        }
        shape
    }

    #[test]
    fn two_children_pack_msb_first() {
        // A(B, C)
        let shape = make_shape("0101");
        assert_eq!(shape.words(), &[0x5000_0000_0000_0000]);
        assert_eq!(shape.len(), 4);
    }

    #[test]
    fn insert_edge_matches_direct_encoding() {
        // A(B) grown by C as last child of A gives A(B, C)
        let mut shape = make_shape("01");
        shape.insert_edge(2);
        assert_eq!(shape, make_shape("0101"));

        // A(B) grown by C below B gives A(B(C))
        let mut shape = make_shape("01");
        shape.insert_edge(1);
        assert_eq!(shape, make_shape("0011"));
    }

    #[test]
    fn insert_edge_carries_across_words() {
        let bits: String = (0..63).map(|i| if i % 2 == 0 { '0' } else { '1' }).collect();
        let mut tail = bits.clone();
        tail.push('1');
        let mut shape = make_shape(&tail);
        shape.insert_edge(63);
        let expected = format!("{bits}011");
        assert_eq!(shape, make_shape(&expected));
        assert_eq!(shape.words().len(), 2);
    }

    #[test]
    fn topology_recovers_parents_and_extents() {
        // A(B(D), C)
        let topo = make_shape("001101").topology();
        assert_eq!(topo.len(), 4);
        assert_eq!(topo.parent(0), None);
        assert_eq!(topo.parent(1), Some(0));
        assert_eq!(topo.parent(2), Some(1));
        assert_eq!(topo.parent(3), Some(0));
        assert_eq!(topo.subtree_end(1), 3);
        assert_eq!(topo.subtree_end(0), 4);
        assert_eq!(topo.close_bit(1), 3);
        assert_eq!(topo.close_bit(0), 6);
        assert_eq!(topo.children(0).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(topo.depth(2), 2);
    }
}
