//! Single (unpartitioned) minimal perfect hash function and its builder.

use std::io;

use binout::{AsIs, Serializer};
use dyn_size_of::GetSize;

use crate::bcvec::BcVector;
use crate::bitvec::{words, BitVector};
use crate::conf::{BuildConf, MAX_LEVELS};
use crate::error::Error;
use crate::hash::{key_hash, level_hash};
use crate::stats::{AccessStatsCollector, BuildStatsCollector};

/// A minimal perfect hash function over a fixed set of distinct 64-bit keys.
///
/// Maps each of the `N` original keys to a unique index in `[1, N]`.
/// [`find`](Function::find) returns 0 for a key outside the original set, or
/// a false positive in `[1, N]`; the function cannot distinguish members
/// from non-members.
///
/// Immutable after construction and safe to query from any number of
/// threads. Constructed through [`Mphf`](crate::Mphf).
#[derive(Clone)]
pub struct Function {
    levels: Box<[BitVector]>,
    /// `ranks[l]` is 1 plus the number of keys placed at levels before `l`;
    /// index 0 of the output range is reserved for "not found".
    ranks: Box<[u64]>,
    reverse_map: Option<Box<[u64]>>,
}

/// Returns the cumulative rank offset of each level.
fn level_ranks(levels: &[BitVector]) -> Box<[u64]> {
    let mut rank = 1u64;
    levels
        .iter()
        .map(|level| {
            let r = rank;
            rank += level.ones_count();
            r
        })
        .collect()
}

impl Function {
    /// Returns the index of `key` in `[1, len]`, or 0.
    ///
    /// For a key from the construction input the result is its unique index.
    /// For any other key the result is 0 or an arbitrary value in `[1, len]`
    /// (a false positive).
    #[inline]
    pub fn find(&self, key: u64) -> u64 {
        self.find_stats(key, &mut ())
    }

    /// Same as [`find`](Function::find), reporting the visited level depth
    /// to `access_stats`.
    pub fn find_stats<A: AccessStatsCollector>(&self, key: u64, access_stats: &mut A) -> u64 {
        for (level, bv) in self.levels.iter().enumerate() {
            let i = key_hash(level_hash(level as u64), key) % bv.size();
            if bv.is_set(i) {
                access_stats.found_on_level(level);
                return self.ranks[level] + bv.rank(i);
            }
        }
        access_stats.fail_on_level(self.levels.len());
        0
    }

    /// Returns the key mapped to `index`, or 0 when `index` is outside
    /// `[1, len]` or the function was built without a reverse map.
    ///
    /// A key equal to 0 cannot be distinguished from an empty slot and is
    /// never returned.
    pub fn key(&self, index: u64) -> u64 {
        match &self.reverse_map {
            Some(map) => map.get(index as usize).copied().unwrap_or(0),
            None => 0,
        }
    }

    /// Returns the number of keys in the construction input.
    ///
    /// The time is proportional to the total size of the level bit vectors.
    pub fn len(&self) -> usize {
        self.levels.iter().map(|level| level.ones_count() as usize).sum()
    }

    /// Returns the number of levels.
    pub fn levels(&self) -> usize {
        self.levels.len()
    }

    /// Returns the sizes of the successive levels, in 64-bit words.
    pub fn level_sizes(&self) -> impl Iterator<Item = u64> + '_ {
        self.levels.iter().map(|level| level.word_count() as u64)
    }

    /// Returns the number of bytes [`write`](Function::write) will produce.
    pub fn write_bytes(&self) -> usize {
        1 + self.levels.iter().map(BitVector::write_bytes).sum::<usize>()
    }

    /// Writes `self` to `output`: the level count as a single byte, then
    /// each level's bit vector. Rank offsets are not written; they are
    /// recomputed on read. The reverse map, if any, is not written either.
    pub fn write(&self, output: &mut dyn io::Write) -> io::Result<()> {
        AsIs::write(output, self.levels.len() as u8)?;
        self.levels.iter().try_for_each(|level| level.write(output))
    }

    /// Reads a function previously written by [`write`](Function::write).
    pub fn read(input: &mut dyn io::Read) -> Result<Self, Error> {
        let level_count: u8 = AsIs::read(input)?;
        if level_count == 0 {
            return Err(Error::DecodeInvalidHeader { field: "level count", value: 0 });
        }
        let mut levels = Vec::with_capacity(level_count as usize);
        for _ in 0..level_count {
            levels.push(BitVector::read(input)?);
        }
        let levels = levels.into_boxed_slice();
        let ranks = level_ranks(&levels);
        Ok(Self { levels, ranks, reverse_map: None })
    }

    pub(crate) fn has_reverse_map(&self) -> bool {
        self.reverse_map.is_some()
    }
}

impl GetSize for Function {
    fn size_bytes_dyn(&self) -> usize {
        self.levels.size_bytes_dyn()
            + self.ranks.size_bytes_dyn()
            + self.reverse_map.as_ref().map_or(0, |m| m.size_bytes_dyn())
    }
    fn size_bytes_content_dyn(&self) -> usize {
        self.levels.size_bytes_content_dyn()
            + self.ranks.size_bytes_content_dyn()
            + self.reverse_map.as_ref().map_or(0, |m| m.size_bytes_content_dyn())
    }
    const USES_DYN_MEM: bool = true;
}

/// Owns all intermediate construction state: the assigned/collision vector
/// pair, the redo buffer, and (when requested) the reverse-map slots of the
/// level in progress. Dropped as soon as construction finishes, leaving the
/// [`Function`] with only its levels and rank offsets.
pub(crate) struct Builder {
    pub(crate) gamma: f64,
    pub(crate) levels: Vec<BitVector>,
    pub(crate) bc: BcVector,
    pub(crate) redo: Vec<u64>,
    /// Key claiming each bit position of the level in progress; 0 when the
    /// position is unclaimed or collided.
    slots: Option<Vec<u64>>,
    /// Finished part of the reverse map, one entry per placed key, preceded
    /// by the reserved entry for index 0.
    reverse_map: Option<Vec<u64>>,
}

impl Builder {
    pub fn new(conf: &BuildConf, key_count: usize) -> Self {
        let level_words = words(key_count, conf.gamma);
        Self {
            gamma: conf.gamma,
            levels: Vec::with_capacity(conf.initial_levels),
            bc: BcVector::new(level_words),
            // heuristic: about half of the keys collide at the first level
            redo: Vec::with_capacity(key_count / 2),
            slots: conf.reverse_map.then(|| vec![0u64; level_words * 64]),
            reverse_map: conf.reverse_map.then(|| {
                let mut map = Vec::with_capacity(key_count + 1);
                map.push(0);
                map
            }),
        }
    }

    /// Runs the level loop over `keys` with a single thread.
    pub fn build<BS: BuildStatsCollector>(
        &mut self,
        mut keys: Vec<u64>,
        stats: &mut BS,
    ) -> Result<(), Error> {
        for level in 0u32.. {
            let lh = level_hash(level as u64);
            stats.level(keys.len(), self.bc.size() as usize);

            self.assign(lh, &keys);
            self.collide(lh, &keys);
            self.push_level();

            if self.redo.is_empty() {
                break;
            }
            if level > MAX_LEVELS {
                stats.end(self.redo.len());
                return Err(Error::TooManyLevels(level));
            }
            std::mem::swap(&mut keys, &mut self.redo);
            self.redo.clear();
            self.advance(keys.len());
        }
        stats.end(0);
        Ok(())
    }

    /// Assignment pass: claims a bit position for every key, recording
    /// collisions as they are discovered.
    pub(crate) fn assign(&mut self, lh: u64, keys: &[u64]) {
        match &mut self.slots {
            None => {
                for &k in keys {
                    self.bc.update(key_hash(lh, k));
                }
            }
            Some(slots) => {
                for &k in keys {
                    let h = key_hash(lh, k);
                    self.bc.update(h);
                    slots[(h % self.bc.size()) as usize] = k;
                }
            }
        }
    }

    /// Collision pass: moves every key whose position collided into the redo
    /// buffer, clearing the position's assigned bit and slot. Only runs once
    /// the assignment pass has seen every key, since the last key of a
    /// position is the one that reveals the collision.
    pub(crate) fn collide(&mut self, lh: u64, keys: &[u64]) {
        let size = self.bc.size();
        for &k in keys {
            let h = key_hash(lh, k);
            if self.bc.unset_collision(h) {
                self.redo.push(k);
                if let Some(slots) = &mut self.slots {
                    slots[(h % size) as usize] = 0;
                }
            }
        }
    }

    /// Takes the finished level out of the build vector and, when a reverse
    /// map is being built, appends the level's surviving keys in position
    /// order, which is exactly the order their rank offsets assign.
    pub(crate) fn push_level(&mut self) {
        let level = self.bc.finish_level();
        if let (Some(slots), Some(map)) = (&self.slots, &mut self.reverse_map) {
            for &key in slots.iter() {
                if key != 0 {
                    map.push(key);
                }
            }
        }
        self.levels.push(level);
    }

    /// Resizes the build vector and slots for the next level's key count.
    pub(crate) fn advance(&mut self, key_count: usize) {
        let level_words = words(key_count, self.gamma);
        self.bc.next_level(level_words);
        if let Some(slots) = &mut self.slots {
            slots.clear();
            slots.resize(level_words * 64, 0);
        }
    }

    pub fn finish(self) -> Function {
        let levels = self.levels.into_boxed_slice();
        let ranks = level_ranks(&levels);
        Function {
            levels,
            ranks,
            reverse_map: self.reverse_map.map(Vec::into_boxed_slice),
        }
    }
}
