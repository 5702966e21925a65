use std::fmt::{Display, Formatter};
use serde::Serialize;
use crate::config::{Prefetcher, ReplacementPolicy, SweepConfig};

/// One point of the parameter space, as passed to the simulator
///
/// All sizes are exponents: a block size of `b` means lines of 2^b bytes, an associativity of `s`
/// means 2^s ways
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct Configuration {
    pub block_size: u32,
    pub l1_size: u32,
    pub l1_assoc: u32,
    /// `None` when the L2 cache is disabled
    pub l2: Option<L2Config>,
}

/// The L2 half of a configuration. Either all of it is present or none of it is
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct L2Config {
    pub size: u32,
    pub assoc: u32,
    pub replacement: ReplacementPolicy,
    pub prefetcher: Prefetcher,
}

impl Configuration {
    pub fn l2_enabled(&self) -> bool {
        self.l2.is_some()
    }

    pub fn l2_size(&self) -> Option<u32> {
        self.l2.map(|l2| l2.size)
    }

    pub fn l2_assoc(&self) -> Option<u32> {
        self.l2.map(|l2| l2.assoc)
    }

    pub fn replacement(&self) -> Option<ReplacementPolicy> {
        self.l2.map(|l2| l2.replacement)
    }

    pub fn prefetcher(&self) -> Option<Prefetcher> {
        self.l2.map(|l2| l2.prefetcher)
    }

    /// Checks the geometry is one the simulator accepts
    ///
    /// The L1 associativity can't exceed the number of lines, and an L2 must be strictly larger
    /// and strictly more associative than the L1 while still fitting its own lines
    pub fn is_valid(&self) -> bool {
        let l1_ok = self.l1_size >= self.block_size && self.l1_assoc <= self.l1_size - self.block_size;
        let l2_ok = match self.l2 {
            None => true,
            Some(l2) => l2.size > self.l1_size
                && l2.assoc > self.l1_assoc
                && l2.size >= self.block_size
                && l2.assoc <= l2.size - self.block_size,
        };
        l1_ok && l2_ok
    }
}

impl Display for Configuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "B={} C1={} S1={}", self.block_size, self.l1_size, self.l1_assoc)?;
        match self.l2 {
            None => write!(f, " L2=disabled"),
            Some(l2) => write!(
                f,
                " C2={} S2={} Rep={} Pref={}",
                l2.size, l2.assoc, l2.replacement, l2.prefetcher
            ),
        }
    }
}

/// Generates every legal configuration of the sweep
///
/// The order is the nesting order B, C1, S1, L2 option, C2, S2, replacement policy, prefetcher,
/// each following the order given in the sweep configuration. Geometries which can't hold a
/// single line (C1 < B, or C2 < B) contribute nothing.
///
/// # Arguments
///
/// * `config`: The sweep configuration holding the ranges and options
///
/// returns: Vec<Configuration>
///
/// # Examples
///
/// ```
/// use sweeplib::config::{ExponentRange, SweepConfig};
/// use sweeplib::enumerator::enumerate;
/// let config = SweepConfig {
///     block_sizes: ExponentRange::new(5, 6),
///     l1_sizes: ExponentRange::new(6, 7),
///     l2_enabled: vec![false],
///     ..SweepConfig::default()
/// };
/// // S1 can be 0 or 1
/// assert_eq!(enumerate(&config).len(), 2);
/// ```
pub fn enumerate(config: &SweepConfig) -> Vec<Configuration> {
    let mut out = Vec::new();
    for block_size in config.block_sizes.iter() {
        for l1_size in config.l1_sizes.iter() {
            let Some(max_l1_assoc) = l1_size.checked_sub(block_size) else { continue };
            for l1_assoc in 0..=max_l1_assoc {
                for &l2_enabled in &config.l2_enabled {
                    if !l2_enabled {
                        out.push(Configuration { block_size, l1_size, l1_assoc, l2: None });
                        continue;
                    }
                    for l2_size in config.l2_sizes.iter().filter(|&size| size > l1_size) {
                        let Some(max_l2_assoc) = l2_size.checked_sub(block_size) else { continue };
                        for l2_assoc in (l1_assoc + 1)..=max_l2_assoc {
                            for &replacement in &config.replacement_policies {
                                for &prefetcher in &config.prefetchers {
                                    out.push(Configuration {
                                        block_size,
                                        l1_size,
                                        l1_assoc,
                                        l2: Some(L2Config { size: l2_size, assoc: l2_assoc, replacement, prefetcher }),
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    debug_assert!(out.iter().all(Configuration::is_valid));
    out
}
