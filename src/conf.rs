//! Build configuration accepted by the [`Mphf`](crate::Mphf) constructors.

use crate::error::Error;

/// Default expansion factor for level bit vectors.
pub const DEFAULT_GAMMA: f64 = 2.0;

/// Smallest accepted expansion factor. Values below 1.0 shrink the function
/// at the cost of many more levels and may fail construction.
pub const MIN_GAMMA: f64 = 0.5;

/// Default capacity hint for the level vector; 32 levels accommodate very
/// large key sets.
pub(crate) const DEFAULT_INITIAL_LEVELS: usize = 32;

/// Maximum number of levels attempted before construction fails. Each level
/// reduces the surviving key count geometrically, so reaching this bound
/// means the input is pathological (usually: duplicate keys). Must stay
/// below 256 for the single-byte level count on the wire.
pub(crate) const MAX_LEVELS: u32 = 200;

/// Maximum number of partitions, bounded by the single-byte partition count
/// on the wire.
pub(crate) const MAX_PARTITIONS: usize = 255;

/// Key sets smaller than this are always built as a single sequential
/// partition, regardless of the requested partition count.
pub(crate) const MIN_PARTITION_KEYS: usize = 1000;

/// Per-level key count below which the multi-threaded builder runs the
/// assignment pass serially; sharding overhead dominates under this size.
pub(crate) const PARALLEL_KEY_THRESHOLD: usize = 40_000;

/// Build configuration, assembled with chained setters and validated once
/// when construction starts.
///
/// ```
/// use bbhash::BuildConf;
///
/// let conf = BuildConf::default().gamma(1.5).partitions(8);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct BuildConf {
    pub(crate) gamma: f64,
    pub(crate) initial_levels: usize,
    pub(crate) partitions: usize,
    pub(crate) parallel: bool,
    pub(crate) reverse_map: bool,
}

impl Default for BuildConf {
    fn default() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            initial_levels: DEFAULT_INITIAL_LEVELS,
            partitions: 1,
            parallel: false,
            reverse_map: false,
        }
    }
}

impl BuildConf {
    /// Sets the expansion factor for the per-level bit vectors; a level of
    /// `n` keys spans `n * gamma` bits. Larger values use more space but
    /// need fewer levels. Clamped to at least [`MIN_GAMMA`].
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma.max(MIN_GAMMA);
        self
    }

    /// Sets the capacity hint for the number of levels.
    pub fn initial_levels(mut self, levels: usize) -> Self {
        self.initial_levels = levels;
        self
    }

    /// Sets the number of partitions the keys are sharded into (by key
    /// modulo the partition count). Clamped to `1..=255`. Values above 1
    /// build the partitions concurrently; incompatible with
    /// [`parallel`](BuildConf::parallel).
    pub fn partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions.clamp(1, MAX_PARTITIONS);
        self
    }

    /// Enables the sharded multi-threaded builder for the single-partition
    /// path. Incompatible with [`partitions`](BuildConf::partitions) above 1
    /// and with [`with_reverse_map`](BuildConf::with_reverse_map).
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Also builds the index-to-key reverse map. The value 0 is used as the
    /// empty-slot sentinel, so a key equal to 0 cannot be stored in the
    /// reverse map; filter or re-hash such keys upstream. Incompatible with
    /// [`parallel`](BuildConf::parallel).
    pub fn with_reverse_map(mut self, reverse_map: bool) -> Self {
        self.reverse_map = reverse_map;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.parallel && self.partitions > 1 {
            return Err(Error::IncompatibleOptions("parallel with partitions"));
        }
        if self.parallel && self.reverse_map {
            return Err(Error::IncompatibleOptions("parallel with reverse map"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let conf = BuildConf::default();
        assert_eq!(conf.gamma, DEFAULT_GAMMA);
        assert_eq!(conf.initial_levels, DEFAULT_INITIAL_LEVELS);
        assert_eq!(conf.partitions, 1);
        assert!(!conf.parallel);
        assert!(!conf.reverse_map);
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn setters_clamp() {
        assert_eq!(BuildConf::default().gamma(0.1).gamma, MIN_GAMMA);
        assert_eq!(BuildConf::default().gamma(3.0).gamma, 3.0);
        assert_eq!(BuildConf::default().partitions(0).partitions, 1);
        assert_eq!(BuildConf::default().partitions(1000).partitions, MAX_PARTITIONS);
    }

    #[test]
    fn incompatible_combinations_rejected() {
        let conf = BuildConf::default().parallel(true).partitions(4);
        assert!(matches!(conf.validate(), Err(Error::IncompatibleOptions(_))));
        let conf = BuildConf::default().parallel(true).with_reverse_map(true);
        assert!(matches!(conf.validate(), Err(Error::IncompatibleOptions(_))));
        let conf = BuildConf::default().partitions(4).with_reverse_map(true);
        assert!(conf.validate().is_ok());
    }
}
