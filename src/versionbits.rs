//! BIP9 version-bits deployment tracking.
//!
//! Deployment state only changes on window boundaries: the state of every
//! block in a window is decided by the block that closes the previous window.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::Serialize;

use crate::blockchain::ChainView;
use crate::chainparams::{ConsensusParams, Deployment, DeploymentPos};

/// Block version used by pre-BIP9 software.
pub const VERSIONBITS_LAST_OLD_BLOCK_VERSION: i32 = 4;
/// Version bits that mark a block as taking part in BIP9 signalling.
pub const VERSIONBITS_TOP_BITS: u32 = 0x2000_0000;
pub const VERSIONBITS_TOP_MASK: u32 = 0xe000_0000;
/// Number of bits available for deployments.
pub const VERSIONBITS_NUM_BITS: u8 = 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdState {
    Defined,
    Started,
    LockedIn,
    Active,
    Failed,
}

impl fmt::Display for ThresholdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThresholdState::Defined => "defined",
            ThresholdState::Started => "started",
            ThresholdState::LockedIn => "locked_in",
            ThresholdState::Active => "active",
            ThresholdState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Signalling progress inside the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bip9Stats {
    pub period: u32,
    pub threshold: u32,
    /// Blocks of the current window seen so far.
    pub elapsed: u32,
    /// Signalling blocks among them.
    pub count: u32,
    /// Whether the threshold can still be reached in this window.
    pub possible: bool,
}

/// State per window-closing height (`None` is "before genesis").
pub type ThresholdConditionCache = HashMap<Option<u32>, ThresholdState>;

/// Whether `version` signals for `deployment`.
pub fn condition(deployment: &Deployment, version: i32) -> bool {
    let version = version as u32;
    (version & VERSIONBITS_TOP_MASK) == VERSIONBITS_TOP_BITS && (version & deployment.mask()) != 0
}

/// Last block of the window before the one containing `height + 1`.
fn end_of_previous_window(height: u32, period: u32) -> Option<u32> {
    height.checked_sub((height + 1) % period)
}

/// State of `deployment` for the block after `prev` (`None` for the genesis block).
pub fn state_for(
    pos: DeploymentPos,
    deployment: &Deployment,
    chain: &dyn ChainView,
    prev: Option<u32>,
    cache: &mut ThresholdConditionCache,
) -> ThresholdState {
    let period = deployment.window_size;
    let mut cursor = prev.and_then(|height| end_of_previous_window(height, period));

    // Walk back until a known state, remembering the windows to fill in.
    let mut to_compute = Vec::new();
    let mut state = loop {
        if let Some(state) = cache.get(&cursor) {
            break *state;
        }
        match cursor {
            None => {
                cache.insert(None, ThresholdState::Defined);
                break ThresholdState::Defined;
            }
            Some(height) => {
                if chain.median_time_past(height) < deployment.start_time {
                    cache.insert(cursor, ThresholdState::Defined);
                    break ThresholdState::Defined;
                }
                to_compute.push(height);
                cursor = height.checked_sub(period);
            }
        }
    };

    while let Some(height) = to_compute.pop() {
        let next = match state {
            ThresholdState::Defined => {
                let mtp = chain.median_time_past(height);
                if mtp >= deployment.timeout {
                    ThresholdState::Failed
                } else if mtp >= deployment.start_time {
                    ThresholdState::Started
                } else {
                    ThresholdState::Defined
                }
            }
            ThresholdState::Started => {
                if chain.median_time_past(height) >= deployment.timeout {
                    ThresholdState::Failed
                } else {
                    let count = count_signalling(deployment, chain, height + 1 - period, height);
                    if count >= deployment.threshold {
                        ThresholdState::LockedIn
                    } else {
                        ThresholdState::Started
                    }
                }
            }
            ThresholdState::LockedIn => ThresholdState::Active,
            ThresholdState::Failed | ThresholdState::Active => state,
        };
        if next != state {
            debug!("Deployment {} is {} from height {}", pos, next, height + 1);
        }
        cache.insert(Some(height), next);
        state = next;
    }

    state
}

fn count_signalling(deployment: &Deployment, chain: &dyn ChainView, from: u32, to: u32) -> u32 {
    (from..=to)
        .filter(|height| condition(deployment, chain.block_version(*height)))
        .count() as u32
}

/// First height at which the current state of `deployment` applied.
pub fn state_since_height_for(
    pos: DeploymentPos,
    deployment: &Deployment,
    chain: &dyn ChainView,
    prev: Option<u32>,
    cache: &mut ThresholdConditionCache,
) -> u32 {
    let initial = state_for(pos, deployment, chain, prev, cache);
    if initial == ThresholdState::Defined {
        return 0;
    }

    let period = deployment.window_size;
    // Non-DEFINED implies a window has closed, so this is always `Some`.
    let Some(mut window_end) = prev.and_then(|height| end_of_previous_window(height, period)) else {
        return 0;
    };
    while let Some(previous_end) = window_end.checked_sub(period) {
        if state_for(pos, deployment, chain, Some(previous_end), cache) != initial {
            break;
        }
        window_end = previous_end;
    }
    window_end + 1
}

/// Signalling statistics for the window containing `height`.
pub fn statistics_for(deployment: &Deployment, chain: &dyn ChainView, height: Option<u32>) -> Bip9Stats {
    let period = deployment.window_size;
    let threshold = deployment.threshold;
    let Some(height) = height else {
        return Bip9Stats { period, threshold, elapsed: 0, count: 0, possible: false };
    };

    let window_start = (height + 1) - (height + 1) % period;
    let elapsed = height + 1 - window_start;
    let count = count_signalling(deployment, chain, window_start, height);
    Bip9Stats {
        period,
        threshold,
        elapsed,
        count,
        possible: period.saturating_sub(threshold) >= elapsed - count,
    }
}

/// Per-deployment memo of window states for one chain. Entries are keyed by
/// height, so the cache must be cleared when the chain reorganises.
#[derive(Debug, Default)]
pub struct VersionBitsCache {
    caches: HashMap<DeploymentPos, ThresholdConditionCache>,
}

impl VersionBitsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.caches.clear();
    }

    pub fn state(
        &mut self,
        consensus: &ConsensusParams,
        pos: DeploymentPos,
        chain: &dyn ChainView,
        prev: Option<u32>,
    ) -> ThresholdState {
        let cache = self.caches.entry(pos).or_default();
        state_for(pos, consensus.deployment(pos), chain, prev, cache)
    }

    pub fn state_since_height(
        &mut self,
        consensus: &ConsensusParams,
        pos: DeploymentPos,
        chain: &dyn ChainView,
        prev: Option<u32>,
    ) -> u32 {
        let cache = self.caches.entry(pos).or_default();
        state_since_height_for(pos, consensus.deployment(pos), chain, prev, cache)
    }

    /// Block version a miner should use on top of `prev`.
    pub fn compute_block_version(
        &mut self,
        consensus: &ConsensusParams,
        chain: &dyn ChainView,
        prev: Option<u32>,
    ) -> i32 {
        let mut version = VERSIONBITS_TOP_BITS;
        for pos in DeploymentPos::ALL {
            let state = self.state(consensus, pos, chain, prev);
            if matches!(state, ThresholdState::Started | ThresholdState::LockedIn) {
                version |= consensus.deployment(pos).mask();
            }
        }
        version as i32
    }
}

pub fn statistics(consensus: &ConsensusParams, pos: DeploymentPos, chain: &dyn ChainView, height: Option<u32>) -> Bip9Stats {
    statistics_for(consensus.deployment(pos), chain, height)
}

pub fn version_bits_mask(consensus: &ConsensusParams, pos: DeploymentPos) -> u32 {
    consensus.deployment(pos).mask()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Chain where every block has the same time, so MTP equals that time.
    struct FlatChain {
        versions: Vec<i32>,
        time: i64,
    }

    impl ChainView for FlatChain {
        fn tip_height(&self) -> Option<u32> {
            self.versions.len().checked_sub(1).map(|h| h as u32)
        }

        fn block_version(&self, height: u32) -> i32 {
            self.versions[height as usize]
        }

        fn median_time_past(&self, _height: u32) -> i64 {
            self.time
        }
    }

    fn deployment() -> Deployment {
        Deployment { bit: 1, start_time: 100, timeout: 1_000, window_size: 10, threshold: 8 }
    }

    const SIGNAL: i32 = (VERSIONBITS_TOP_BITS | 0b10) as i32;

    #[test]
    fn condition_requires_top_bits() {
        let d = deployment();
        assert!(condition(&d, SIGNAL));
        assert!(!condition(&d, 0b10));
        assert!(!condition(&d, VERSIONBITS_TOP_BITS as i32));
        assert!(!condition(&d, (0x6000_0000u32 | 0b10) as i32));
    }

    #[test]
    fn first_window_is_defined() {
        let chain = FlatChain { versions: vec![SIGNAL; 9], time: 500 };
        let mut cache = ThresholdConditionCache::new();
        assert_eq!(state_for(DeploymentPos::Dip0001, &deployment(), &chain, Some(8), &mut cache), ThresholdState::Defined);
        assert_eq!(state_for(DeploymentPos::Dip0001, &deployment(), &chain, None, &mut cache), ThresholdState::Defined);
    }

    #[test]
    fn full_signalling_activates_after_two_windows() {
        let chain = FlatChain { versions: vec![SIGNAL; 40], time: 500 };
        let d = deployment();
        let mut cache = ThresholdConditionCache::new();
        let pos = DeploymentPos::Dip0001;
        assert_eq!(state_for(pos, &d, &chain, Some(9), &mut cache), ThresholdState::Started);
        assert_eq!(state_for(pos, &d, &chain, Some(19), &mut cache), ThresholdState::LockedIn);
        assert_eq!(state_for(pos, &d, &chain, Some(29), &mut cache), ThresholdState::Active);
        assert_eq!(state_since_height_for(pos, &d, &chain, Some(35), &mut cache), 30);
        assert_eq!(state_since_height_for(pos, &d, &chain, Some(25), &mut cache), 20);
    }

    #[test]
    fn timeout_before_start_fails_directly() {
        let chain = FlatChain { versions: vec![SIGNAL; 20], time: 2_000 };
        let mut cache = ThresholdConditionCache::new();
        assert_eq!(
            state_for(DeploymentPos::Csv, &deployment(), &chain, Some(9), &mut cache),
            ThresholdState::Failed
        );
    }

    #[test]
    fn statistics_track_current_window() {
        let mut versions = vec![SIGNAL; 10];
        versions.extend([SIGNAL, 4, 4, SIGNAL]);
        let chain = FlatChain { versions, time: 500 };
        let stats = statistics_for(&deployment(), &chain, Some(13));
        assert_eq!(stats, Bip9Stats { period: 10, threshold: 8, elapsed: 4, count: 2, possible: true });

        let mut versions = vec![SIGNAL; 10];
        versions.extend([4, 4, 4]);
        let chain = FlatChain { versions, time: 500 };
        assert!(!statistics_for(&deployment(), &chain, Some(12)).possible);
    }
}
