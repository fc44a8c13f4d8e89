//! Combined assigned/collision vector used while a level is under
//! construction.

use crate::bitvec::BitVector;

/// Tracks, for one level, which bit positions have been claimed by exactly
/// one key (`bits`) and which have been claimed by two or more (`collisions`).
///
/// Both word arrays always have the same length. After the collision pass has
/// unset every collided position, `bits` holds the level's final contents and
/// is handed off through [`finish_level`](BcVector::finish_level).
pub(crate) struct BcVector {
    bits: Vec<u64>,
    collisions: Vec<u64>,
}

impl BcVector {
    /// Returns a zeroed vector pair spanning `words` 64-bit words.
    pub fn new(words: usize) -> Self {
        Self { bits: vec![0; words], collisions: vec![0; words] }
    }

    /// Returns the number of bits each of the two vectors spans.
    #[inline(always)]
    pub fn size(&self) -> u64 {
        (self.bits.len() * 64) as u64
    }

    /// Claims the bit position for hash `h`; if some key already claimed it,
    /// records a collision instead. The position is `h` reduced modulo
    /// [`size`](BcVector::size).
    #[inline(always)]
    pub fn update(&mut self, h: u64) {
        let word = ((h % self.size()) / 64) as usize;
        let mask = 1u64 << (h % 64);
        self.collisions[word] |= self.bits[word] & mask;
        self.bits[word] |= mask;
    }

    /// If the position for hash `h` collided, clears its assigned bit and
    /// returns true; the caller then re-hashes that key at the next level.
    #[inline(always)]
    pub fn unset_collision(&mut self, h: u64) -> bool {
        let word = ((h % self.size()) / 64) as usize;
        let mask = 1u64 << (h % 64);
        if self.collisions[word] & mask != 0 {
            self.bits[word] &= !mask;
            true
        } else {
            false
        }
    }

    /// Hands the assigned bits off as the finished level, leaving this
    /// vector empty until [`next_level`](BcVector::next_level) resizes it.
    pub fn finish_level(&mut self) -> BitVector {
        BitVector::from(std::mem::take(&mut self.bits))
    }

    /// Prepares for the next level: fresh assigned words (the previous ones
    /// now belong to the finished level), collision words zeroed in place so
    /// their allocation is reused while levels shrink.
    pub fn next_level(&mut self, words: usize) {
        self.bits = vec![0; words];
        self.collisions.clear();
        self.collisions.resize(words, 0);
    }

    /// Resizes both vectors to `words` and zeroes them, reusing the existing
    /// allocations. Worker-local vectors go through this once per level.
    pub fn reset(&mut self, words: usize) {
        self.bits.clear();
        self.bits.resize(words, 0);
        self.collisions.clear();
        self.collisions.resize(words, 0);
    }

    /// Folds a worker-local vector into this one. A bit assigned both here
    /// and in `local` is a collision between keys of different shards, on top
    /// of whatever collisions the worker already recorded within its own.
    pub fn merge(&mut self, local: &BcVector) {
        debug_assert_eq!(self.bits.len(), local.bits.len());
        for i in 0..self.bits.len() {
            self.collisions[i] |= (self.bits[i] & local.bits[i]) | local.collisions[i];
            self.bits[i] |= local.bits[i];
        }
    }
}
