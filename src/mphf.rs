//! Public entry point: a minimal perfect hash function that is either a
//! single [`Function`] or a [`Partitioned`] set of them.

use std::io;

use dyn_size_of::GetSize;

use crate::conf::{BuildConf, MIN_PARTITION_KEYS};
use crate::error::Error;
use crate::function::{Builder, Function};
use crate::partitioned::Partitioned;
use crate::stats::{AccessStatsCollector, BuildStatsCollector};

/// A minimal perfect hash function over a fixed set of distinct 64-bit keys.
///
/// Construction options decide which variant is built: a partition count
/// above 1 (with at least 1000 keys) produces the partitioned variant, and
/// everything else the single one. Lookup dispatches on the variant.
///
/// ```
/// use bbhash::Mphf;
///
/// let keys = [11u64, 22, 33, 44, 55];
/// let mphf = Mphf::new(&keys)?;
/// let mut indices: Vec<u64> = keys.iter().map(|&k| mphf.find(k)).collect();
/// indices.sort();
/// assert_eq!(indices, [1, 2, 3, 4, 5]);
/// # Ok::<(), bbhash::Error>(())
/// ```
#[derive(Clone)]
pub enum Mphf {
    Single(Function),
    Partitioned(Partitioned),
}

impl Mphf {
    /// Builds an [`Mphf`] for `keys` with the default configuration.
    ///
    /// The keys must be distinct; duplicates make construction fail with
    /// [`Error::TooManyLevels`], as two equal keys collide at every level.
    pub fn new(keys: &[u64]) -> Result<Self, Error> {
        Self::with_conf(keys, BuildConf::default())
    }

    /// Builds an [`Mphf`] for `keys` with the given configuration.
    pub fn with_conf(keys: &[u64], conf: BuildConf) -> Result<Self, Error> {
        Self::with_conf_stats(keys, conf, &mut ())
    }

    /// Builds an [`Mphf`] for `keys` with the given configuration, reporting
    /// construction events to `stats`.
    ///
    /// Small key sets are always built as a single sequential partition;
    /// partitioning only pays off once each shard is substantial. Partitioned
    /// builds run their partitions concurrently and report no build stats.
    pub fn with_conf_stats<BS: BuildStatsCollector>(
        keys: &[u64],
        conf: BuildConf,
        stats: &mut BS,
    ) -> Result<Self, Error> {
        if keys.is_empty() {
            return Err(Error::EmptyKeys);
        }
        conf.validate()?;
        if keys.len() < MIN_PARTITION_KEYS || conf.partitions == 1 {
            let mut builder = Builder::new(&conf, keys.len());
            if conf.parallel {
                builder.build_parallel(keys.to_vec(), stats)?;
            } else {
                builder.build(keys.to_vec(), stats)?;
            }
            Ok(Mphf::Single(builder.finish()))
        } else {
            Ok(Mphf::Partitioned(Partitioned::build(keys, &conf)?))
        }
    }

    /// Returns the index of `key` in `[1, len]`, or 0; see
    /// [`Function::find`] for the contract.
    #[inline]
    pub fn find(&self, key: u64) -> u64 {
        match self {
            Mphf::Single(f) => f.find(key),
            Mphf::Partitioned(p) => p.find(key),
        }
    }

    /// Same as [`find`](Mphf::find), reporting the visited level depth to
    /// `access_stats`.
    pub fn find_stats<A: AccessStatsCollector>(&self, key: u64, access_stats: &mut A) -> u64 {
        match self {
            Mphf::Single(f) => f.find_stats(key, access_stats),
            Mphf::Partitioned(p) => p.find_stats(key, access_stats),
        }
    }

    /// Returns the key mapped to `index`, or 0 when `index` is outside
    /// `[1, len]` or no reverse map was built; see [`Function::key`].
    pub fn key(&self, index: u64) -> u64 {
        match self {
            Mphf::Single(f) => f.key(index),
            Mphf::Partitioned(p) => p.key(index),
        }
    }

    /// Returns the number of keys in the construction input.
    pub fn len(&self) -> usize {
        match self {
            Mphf::Single(f) => f.len(),
            Mphf::Partitioned(p) => p.len(),
        }
    }

    /// Returns the number of bytes [`write`](Mphf::write) will produce.
    pub fn write_bytes(&self) -> usize {
        match self {
            Mphf::Single(f) => f.write_bytes(),
            Mphf::Partitioned(p) => p.write_bytes(),
        }
    }

    /// Writes the underlying variant to `output`. The two variants use
    /// different formats; decode with [`Function::read`] or
    /// [`Partitioned::read`] accordingly and convert back with `From`.
    pub fn write(&self, output: &mut dyn io::Write) -> io::Result<()> {
        match self {
            Mphf::Single(f) => f.write(output),
            Mphf::Partitioned(p) => p.write(output),
        }
    }

    /// Returns the single-partition function, if this is the single variant.
    pub fn single(&self) -> Option<&Function> {
        match self {
            Mphf::Single(f) => Some(f),
            Mphf::Partitioned(_) => None,
        }
    }

    /// Returns the partitioned function, if this is the partitioned variant.
    pub fn partitioned(&self) -> Option<&Partitioned> {
        match self {
            Mphf::Single(_) => None,
            Mphf::Partitioned(p) => Some(p),
        }
    }
}

impl From<Function> for Mphf {
    fn from(f: Function) -> Self {
        Mphf::Single(f)
    }
}

impl From<Partitioned> for Mphf {
    fn from(p: Partitioned) -> Self {
        Mphf::Partitioned(p)
    }
}

impl GetSize for Mphf {
    fn size_bytes_dyn(&self) -> usize {
        match self {
            Mphf::Single(f) => f.size_bytes_dyn(),
            Mphf::Partitioned(p) => p.size_bytes_dyn(),
        }
    }
    fn size_bytes_content_dyn(&self) -> usize {
        match self {
            Mphf::Single(f) => f.size_bytes_content_dyn(),
            Mphf::Partitioned(p) => p.size_bytes_content_dyn(),
        }
    }
    const USES_DYN_MEM: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::tests::{check_permutation, generate_keys};
    use std::hash::Hasher;

    fn fnv1a(s: &str) -> u64 {
        let mut hasher = fnv::FnvHasher::default();
        hasher.write(s.as_bytes());
        hasher.finish()
    }

    const STAR_WARS_CHARACTERS: [&str; 30] = [
        "4-LOM", "Admiral Thrawn", "Senator Bail Organa", "Ben Skywalker", "Bib Fortuna",
        "Boba Fett", "C-3PO", "Cad Bane", "Cade Skywalker", "Captain Rex",
        "Chewbacca", "Clone Commander Cody", "Darth Vader", "General Grievous", "General Veers",
        "Greedo", "Han Solo", "IG 88", "Jabba The Hutt", "Luke Skywalker",
        "Mara Jade", "Mission Vao", "Obi-Wan Kenobi", "Princess Leia", "PROXY",
        "Qui-Gon Jinn", "R2-D2", "Revan", "Wedge Antilles", "Yoda",
    ];

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(Mphf::new(&[]), Err(Error::EmptyKeys)));
    }

    #[test]
    fn hashed_names_across_gammas() {
        let keys: Vec<u64> = STAR_WARS_CHARACTERS.iter().map(|s| fnv1a(s)).collect();
        for gamma in [1.0, 1.5, 2.0] {
            let mphf = Mphf::with_conf(&keys, BuildConf::default().gamma(gamma)).unwrap();
            check_permutation(|k| mphf.find(k), &keys);
        }
    }

    #[test]
    fn duplicates_fail_construction() {
        assert!(matches!(
            Mphf::new(&[1, 1]),
            Err(Error::TooManyLevels(_))
        ));
        assert!(matches!(
            Mphf::new(&[1, 2, 3, 1, 4]),
            Err(Error::TooManyLevels(_))
        ));
    }

    #[test]
    fn incompatible_options_are_rejected() {
        let keys = generate_keys(2000, 1);
        assert!(matches!(
            Mphf::with_conf(&keys, BuildConf::default().parallel(true).partitions(2)),
            Err(Error::IncompatibleOptions(_))
        ));
        assert!(matches!(
            Mphf::with_conf(&keys, BuildConf::default().parallel(true).with_reverse_map(true)),
            Err(Error::IncompatibleOptions(_))
        ));
    }

    #[test]
    fn small_inputs_force_a_single_partition() {
        let keys = generate_keys(500, 2);
        let mphf = Mphf::with_conf(&keys, BuildConf::default().partitions(8)).unwrap();
        assert!(mphf.single().is_some());
        check_permutation(|k| mphf.find(k), &keys);
    }

    #[test]
    fn large_inputs_honor_the_partition_count() {
        let keys = generate_keys(100_000, 6);
        let mphf = Mphf::with_conf(&keys, BuildConf::default().partitions(8)).unwrap();
        let p = mphf.partitioned().expect("partitioned variant");
        assert_eq!(p.partition_count(), 8);
        assert_eq!(mphf.len(), keys.len());
        check_permutation(|k| mphf.find(k), &keys);
    }

    #[test]
    fn marshal_unmarshal_equivalence() {
        let keys = generate_keys(100_000, 42);
        let mphf = Mphf::new(&keys).unwrap();
        let mut buf = Vec::new();
        mphf.write(&mut buf).unwrap();
        assert_eq!(buf.len(), mphf.write_bytes());
        let f = mphf.single().unwrap();
        assert_eq!(
            buf.len(),
            1 + f.level_sizes().map(|w| 8 + 8 * w as usize).sum::<usize>()
        );
        let read = Mphf::from(Function::read(&mut &buf[..]).unwrap());
        for &k in &keys {
            assert_eq!(read.find(k), mphf.find(k));
        }
    }

    #[test]
    fn reverse_map_round_trips_every_key() {
        let keys = generate_keys(10_000, 8);
        let mphf = Mphf::with_conf(&keys, BuildConf::default().with_reverse_map(true)).unwrap();
        for &k in &keys {
            assert_eq!(mphf.key(mphf.find(k)), k);
        }
        assert_eq!(mphf.key(0), 0);
        assert_eq!(mphf.key(keys.len() as u64 + 1), 0);
    }

    #[test]
    fn parallel_build_agrees_with_sequential() {
        let keys = generate_keys(60_000, 14);
        let seq = Mphf::new(&keys).unwrap();
        let par = Mphf::with_conf(&keys, BuildConf::default().parallel(true)).unwrap();
        for &k in &keys {
            assert_eq!(par.find(k), seq.find(k));
        }
        check_permutation(|k| par.find(k), &keys);
    }

    #[test]
    fn small_gamma_still_terminates() {
        let keys = generate_keys(1000, 23);
        let mphf = Mphf::with_conf(&keys, BuildConf::default().gamma(0.5)).unwrap();
        check_permutation(|k| mphf.find(k), &keys);
    }

    #[test]
    fn size_report_covers_the_levels() {
        let keys = generate_keys(1000, 29);
        let mphf = Mphf::new(&keys).unwrap();
        // at least the first level's words must be accounted for
        assert!(mphf.size_bytes() > words_lower_bound(keys.len()));
    }

    fn words_lower_bound(keys: usize) -> usize {
        crate::bitvec::words(keys, 2.0) * 8
    }
}
