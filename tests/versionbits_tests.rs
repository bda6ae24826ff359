//! Deployment voting over an in-memory regtest chain.

use std::sync::Arc;

use blaze_consensus::blockchain::{ChainView, MemoryChain};
use blaze_consensus::chainparams::{ChainRegistry, DeploymentPos, GenesisCheck, Network, ParameterSet};
use blaze_consensus::primitives::Sha256dHasher;
use blaze_consensus::versionbits::{
    statistics, version_bits_mask, ThresholdState, VersionBitsCache, VERSIONBITS_LAST_OLD_BLOCK_VERSION,
    VERSIONBITS_NUM_BITS, VERSIONBITS_TOP_BITS,
};

const WINDOW: u32 = 144;
const THRESHOLD: u32 = 108;

fn regtest() -> Arc<ParameterSet> {
    let mut registry = ChainRegistry::new(Arc::new(Sha256dHasher), GenesisCheck::MerkleRoot).unwrap();
    registry.select("regtest").unwrap()
}

fn chain_for(params: &ParameterSet) -> MemoryChain {
    MemoryChain::from_params(params, Arc::new(Sha256dHasher))
}

/// Extends `chain` to `height`, with the first `signalling` new blocks
/// voting for `pos`.
fn extend(chain: &mut MemoryChain, params: &ParameterSet, pos: DeploymentPos, height: u32, signalling: u32) {
    let signal = (VERSIONBITS_TOP_BITS | version_bits_mask(&params.consensus, pos)) as i32;
    let mut voted = 0;
    while chain.tip_height().unwrap() < height {
        let tip = chain.tip().unwrap();
        let version = if voted < signalling {
            voted += 1;
            signal
        } else {
            VERSIONBITS_LAST_OLD_BLOCK_VERSION
        };
        let time = tip.header.time + params.consensus.pow_target_spacing as u32;
        chain.push(version, time).unwrap();
    }
}

#[test]
fn test_regtest_deployment_windows() {
    let params = regtest();
    let deployment = params.consensus.deployment(DeploymentPos::Csv);
    assert_eq!((deployment.window_size, deployment.threshold), (WINDOW, THRESHOLD));
}

#[test]
fn test_deployment_bits_are_usable() {
    let mut registry = ChainRegistry::new(Arc::new(Sha256dHasher), GenesisCheck::MerkleRoot).unwrap();
    registry.initialize_devnet("devnet").unwrap();
    for network in Network::ALL {
        let consensus = &registry.get(network).unwrap().consensus;
        let mut masks = 0u32;
        for (pos, deployment) in consensus.deployments.iter() {
            assert!(deployment.bit < VERSIONBITS_NUM_BITS, "{} {}", network, pos);
            assert!(deployment.threshold <= deployment.window_size, "{} {}", network, pos);
            assert_eq!(masks & deployment.mask(), 0, "{} {} reuses a bit", network, pos);
            masks |= deployment.mask();
        }
    }
}

#[test]
fn test_csv_activates_after_lock_in() {
    let params = regtest();
    let consensus = &params.consensus;
    let mut chain = chain_for(&params);
    let mut cache = VersionBitsCache::new();
    let csv = DeploymentPos::Csv;

    assert_eq!(cache.state(consensus, csv, &chain, None), ThresholdState::Defined);

    extend(&mut chain, &params, csv, WINDOW - 1, 0);
    assert_eq!(cache.state(consensus, csv, &chain, Some(WINDOW - 2)), ThresholdState::Defined);
    assert_eq!(cache.state(consensus, csv, &chain, Some(WINDOW - 1)), ThresholdState::Started);
    assert_eq!(cache.state_since_height(consensus, csv, &chain, Some(WINDOW - 1)), WINDOW);

    let version = cache.compute_block_version(consensus, &chain, Some(WINDOW - 1)) as u32;
    assert_eq!(version & 0xe000_0000, VERSIONBITS_TOP_BITS);
    assert_ne!(version & version_bits_mask(consensus, csv), 0);

    // Exactly the threshold in the second window.
    extend(&mut chain, &params, csv, 2 * WINDOW - 1, THRESHOLD);
    assert_eq!(cache.state(consensus, csv, &chain, Some(2 * WINDOW - 2)), ThresholdState::Started);
    assert_eq!(cache.state(consensus, csv, &chain, Some(2 * WINDOW - 1)), ThresholdState::LockedIn);
    assert_eq!(cache.state_since_height(consensus, csv, &chain, Some(2 * WINDOW - 1)), 2 * WINDOW);

    extend(&mut chain, &params, csv, 3 * WINDOW - 1, 0);
    assert_eq!(cache.state(consensus, csv, &chain, Some(3 * WINDOW - 1)), ThresholdState::Active);
    assert_eq!(cache.state_since_height(consensus, csv, &chain, Some(3 * WINDOW - 1)), 3 * WINDOW);

    // Active deployments no longer set their bit.
    let version = cache.compute_block_version(consensus, &chain, Some(3 * WINDOW - 1)) as u32;
    assert_eq!(version & version_bits_mask(consensus, csv), 0);
}

#[test]
fn test_one_vote_short_stays_started() {
    let params = regtest();
    let mut chain = chain_for(&params);
    let mut cache = VersionBitsCache::new();
    extend(&mut chain, &params, DeploymentPos::Csv, WINDOW - 1, 0);
    extend(&mut chain, &params, DeploymentPos::Csv, 2 * WINDOW - 1, THRESHOLD - 1);
    assert_eq!(
        cache.state(&params.consensus, DeploymentPos::Csv, &chain, Some(2 * WINDOW - 1)),
        ThresholdState::Started
    );
}

#[test]
fn test_votes_only_count_for_their_bit() {
    let params = regtest();
    let mut chain = chain_for(&params);
    let mut cache = VersionBitsCache::new();
    extend(&mut chain, &params, DeploymentPos::Csv, WINDOW - 1, 0);
    extend(&mut chain, &params, DeploymentPos::Csv, 2 * WINDOW - 1, WINDOW);
    let tip = Some(2 * WINDOW - 1);
    assert_eq!(cache.state(&params.consensus, DeploymentPos::Csv, &chain, tip), ThresholdState::LockedIn);
    assert_eq!(cache.state(&params.consensus, DeploymentPos::Dip0001, &chain, tip), ThresholdState::Started);
}

#[test]
fn test_timeout_fails_deployment() {
    let mut registry = ChainRegistry::new(Arc::new(Sha256dHasher), GenesisCheck::MerkleRoot).unwrap();
    let genesis_time = registry.profile("regtest").unwrap().genesis.header.time as i64;
    registry.select("regtest").unwrap();
    // Times out halfway through the second window.
    let timeout = genesis_time + 150 * i64::from(WINDOW + WINDOW / 2);
    registry.update_regtest_bip9_parameters(DeploymentPos::Csv, 0, timeout);
    let params = Arc::clone(registry.active());

    let mut chain = chain_for(&params);
    let mut cache = VersionBitsCache::new();
    extend(&mut chain, &params, DeploymentPos::Csv, WINDOW - 1, 0);
    extend(&mut chain, &params, DeploymentPos::Csv, 2 * WINDOW - 1, THRESHOLD - 1);
    assert_eq!(
        cache.state(&params.consensus, DeploymentPos::Csv, &chain, Some(2 * WINDOW - 1)),
        ThresholdState::Failed
    );

    // A full window of votes afterwards changes nothing.
    extend(&mut chain, &params, DeploymentPos::Csv, 3 * WINDOW - 1, WINDOW);
    assert_eq!(
        cache.state(&params.consensus, DeploymentPos::Csv, &chain, Some(3 * WINDOW - 1)),
        ThresholdState::Failed
    );
}

#[test]
fn test_statistics_mid_window() {
    let params = regtest();
    let mut chain = chain_for(&params);
    extend(&mut chain, &params, DeploymentPos::Csv, WINDOW - 1, 0);
    extend(&mut chain, &params, DeploymentPos::Csv, WINDOW + 56, 40);

    let stats = statistics(&params.consensus, DeploymentPos::Csv, &chain, Some(WINDOW + 56));
    assert_eq!(stats.period, WINDOW);
    assert_eq!(stats.threshold, THRESHOLD);
    assert_eq!(stats.elapsed, 57);
    assert_eq!(stats.count, 40);
    assert!(stats.possible);

    extend(&mut chain, &params, DeploymentPos::Csv, WINDOW + 100, 0);
    let stats = statistics(&params.consensus, DeploymentPos::Csv, &chain, Some(WINDOW + 100));
    assert_eq!((stats.elapsed, stats.count), (101, 40));
    assert!(!stats.possible);
}

#[test]
fn test_cache_must_be_cleared_on_reorg() {
    let params = regtest();
    let consensus = &params.consensus;
    let mut chain = chain_for(&params);
    let mut cache = VersionBitsCache::new();
    extend(&mut chain, &params, DeploymentPos::Csv, WINDOW - 1, 0);
    extend(&mut chain, &params, DeploymentPos::Csv, 2 * WINDOW - 1, WINDOW);
    let tip = Some(2 * WINDOW - 1);
    assert_eq!(cache.state(consensus, DeploymentPos::Csv, &chain, tip), ThresholdState::LockedIn);

    // Replace the voting window with one that does not vote.
    chain.truncate(WINDOW - 1);
    extend(&mut chain, &params, DeploymentPos::Csv, 2 * WINDOW - 1, 0);
    assert_eq!(cache.state(consensus, DeploymentPos::Csv, &chain, tip), ThresholdState::LockedIn);

    cache.clear();
    assert_eq!(cache.state(consensus, DeploymentPos::Csv, &chain, tip), ThresholdState::Started);
}
