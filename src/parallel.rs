//! Sharded multi-threaded level construction.

use rayon::prelude::*;

use crate::bcvec::BcVector;
use crate::bitvec::words;
use crate::conf::{MAX_LEVELS, PARALLEL_KEY_THRESHOLD};
use crate::error::Error;
use crate::function::Builder;
use crate::hash::{key_hash, level_hash};
use crate::stats::BuildStatsCollector;

/// Splits `keys` into `parts` contiguous shards; the remainder goes to the
/// last shard. A shard may be empty when there are fewer keys than parts.
fn split(keys: &[u64], parts: usize) -> Vec<&[u64]> {
    let chunk = keys.len() / parts;
    let remainder = keys.len() % parts;
    (0..parts)
        .map(|j| {
            let start = chunk * j;
            let mut end = start + chunk;
            if j == parts - 1 {
                end += remainder;
            }
            &keys[start..end]
        })
        .collect()
}

impl Builder {
    /// Runs the level loop over `keys`, fanning the assignment pass out over
    /// the rayon thread pool whenever the level still holds enough keys.
    ///
    /// Each worker fills its own assigned/collision vector over one
    /// contiguous shard; the local vectors are then merged serially into the
    /// global one, which turns same-position claims from different shards
    /// into collisions. The collision pass and all level bookkeeping stay
    /// serial. The resulting levels are identical to a single-threaded
    /// build, since a position's final state only depends on how many keys
    /// claimed it, not on the claim order.
    pub(crate) fn build_parallel<BS: BuildStatsCollector>(
        &mut self,
        mut keys: Vec<u64>,
        stats: &mut BS,
    ) -> Result<(), Error> {
        let workers = rayon::current_num_threads();
        // Worker-local vectors are allocated once, at the first level's size,
        // and reset per level; levels only shrink.
        let mut locals: Vec<BcVector> = if keys.len() >= PARALLEL_KEY_THRESHOLD {
            (0..workers).map(|_| BcVector::new(words(keys.len(), self.gamma))).collect()
        } else {
            Vec::new()
        };

        for level in 0u32.. {
            let lh = level_hash(level as u64);
            stats.level(keys.len(), self.bc.size() as usize);

            if locals.is_empty() || keys.len() < PARALLEL_KEY_THRESHOLD {
                self.assign(lh, &keys);
            } else {
                let level_words = (self.bc.size() / 64) as usize;
                locals
                    .par_iter_mut()
                    .zip(split(&keys, workers))
                    .for_each(|(local, shard)| {
                        local.reset(level_words);
                        for &k in shard {
                            local.update(key_hash(lh, k));
                        }
                    });
                for local in &locals {
                    self.bc.merge(local);
                }
            }

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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::BuildConf;
    use crate::function::tests::{build_sequential, check_permutation, encoded, generate_keys};
    use crate::function::Function;

    fn build_parallel(keys: &[u64], conf: BuildConf) -> Result<Function, Error> {
        let mut builder = Builder::new(&conf, keys.len());
        builder.build_parallel(keys.to_vec(), &mut ())?;
        Ok(builder.finish())
    }

    #[test]
    fn split_is_contiguous_and_complete() {
        let keys: Vec<u64> = (0..10).collect();
        let shards = split(&keys, 4);
        assert_eq!(shards.len(), 4);
        assert_eq!(shards[0], [0, 1]);
        assert_eq!(shards[1], [2, 3]);
        assert_eq!(shards[2], [4, 5]);
        assert_eq!(shards[3], [6, 7, 8, 9]);
        assert!(split(&keys[..2], 4).iter().map(|s| s.len()).eq([0usize, 0, 0, 2]));
    }

    #[test]
    fn matches_sequential_build_above_threshold() {
        // Large enough that the sharded path actually runs.
        let keys = generate_keys(50_000, 123);
        let conf = BuildConf::default();
        let par = build_parallel(&keys, conf).unwrap();
        let seq = build_sequential(&keys, conf).unwrap();
        assert_eq!(encoded(&par), encoded(&seq));
        check_permutation(|k| par.find(k), &keys);
    }

    #[test]
    fn falls_back_to_serial_below_threshold() {
        let keys = generate_keys(2000, 17);
        let conf = BuildConf::default().gamma(1.5);
        let par = build_parallel(&keys, conf).unwrap();
        let seq = build_sequential(&keys, conf).unwrap();
        assert_eq!(encoded(&par), encoded(&seq));
    }
}
