//! Collecting and reporting construction and lookup events.

use std::io::Write;

/// Trait for collecting events while a minimal perfect hash function is
/// being constructed.
pub trait BuildStatsCollector {
    /// Called once per level with the number of keys entering the level and
    /// the size of its bit vector in bits. Default implementation does nothing.
    #[inline(always)]
    fn level(&mut self, _input_keys: usize, _level_bits: usize) {}

    /// Called once at the end of construction with the number of keys that
    /// could not be placed (0 on success). Default implementation does nothing.
    #[inline(always)]
    fn end(&mut self, _unplaced_keys: usize) {}
}

/// Ignores all events.
impl BuildStatsCollector for () {}

/// Writes construction events to the wrapped writer, one line per level.
pub struct BuildStatsPrinter<W: Write = std::io::Stdout>(W);

impl BuildStatsPrinter<std::io::Stdout> {
    /// Reports construction events to the standard output.
    pub fn stdout() -> Self {
        Self(std::io::stdout())
    }
}

impl<W: Write> BuildStatsPrinter<W> {
    /// Reports construction events to `output`.
    pub fn new(output: W) -> Self {
        Self(output)
    }
}

impl<W: Write> BuildStatsCollector for BuildStatsPrinter<W> {
    fn level(&mut self, input_keys: usize, level_bits: usize) {
        writeln!(self.0, "{} {}", input_keys, level_bits).unwrap();
    }

    fn end(&mut self, unplaced_keys: usize) {
        writeln!(
            self.0,
            "Completed {}. {} keys remaining.",
            if unplaced_keys == 0 { "successfully" } else { "unsuccessfully" },
            unplaced_keys
        )
        .unwrap();
    }
}

/// Trait for collecting events while a minimal perfect hash function is
/// being queried.
pub trait AccessStatsCollector {
    /// Reports that a lookup found its value at the given level (counting from 0).
    #[inline(always)]
    fn found_on_level(&mut self, _level: usize) {}

    /// Reports that a lookup missed, after searching the given number of levels.
    #[inline(always)]
    fn fail_on_level(&mut self, _level: usize) {}
}

/// Ignores all events.
impl AccessStatsCollector for () {}

/// Accumulates the number of levels visited, regardless of lookup outcome.
impl AccessStatsCollector for usize {
    #[inline(always)]
    fn found_on_level(&mut self, level: usize) {
        *self += level + 1;
    }

    #[inline(always)]
    fn fail_on_level(&mut self, level: usize) {
        *self += level;
    }
}
