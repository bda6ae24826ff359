//! Builders for the four network profiles.

use std::collections::BTreeMap;

use log::debug;

use super::consensus::{ConsensusParams, Deployment, Deployments};
use super::genesis::{create_genesis_block, devnet_network_id, find_devnet_genesis_block, verify_genesis, GenesisCheck};
use super::{Base58Prefixes, DnsSeed, Network, ParameterSet};
use crate::error::ChainParamsError;
use crate::llmq::params::{LlmqParams, LlmqType, LLMQ_10_60, LLMQ_400_60, LLMQ_400_85, LLMQ_50_60};
use crate::primitives::hash::hex_array;
use crate::primitives::{BlockHasher, Hash256, Target, COIN};

pub const GENESIS_MERKLE_ROOT: Hash256 =
    Hash256::from_hex_const("0xafa40b920f60bc567f654f9620721556d1612f94c544d2a5c9a1e914b3a6255e");

pub const MAIN_GENESIS_HASH: Hash256 =
    Hash256::from_hex_const("0x00000b4481f80f01dd59de3bb0bb3cee06c187e289d8168f5d5b5e2bbf56d149");
pub const TESTNET_GENESIS_HASH: Hash256 =
    Hash256::from_hex_const("0x000002118ed46dbfb70c512f381362e96ca2902e92316b786d3a076af010cd37");
pub const DEVNET_GENESIS_HASH: Hash256 =
    Hash256::from_hex_const("0x000001abb33bf728258dd53384ca07b341e79d774fa46f8ada0fdf462796da21");
pub const REGTEST_GENESIS_HASH: Hash256 =
    Hash256::from_hex_const("0x0000059c796214ccb7a4da449afcb3226b07a34878429824c4695f4986f43610");

// ~uint256(0) >> 20
const POW_LIMIT_MAIN: Target =
    Target::from_hex_const("0x00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
// ~uint256(0) >> 1
const POW_LIMIT_TEST_CHAINS: Target =
    Target::from_hex_const("0x7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");

const MAIN_ALERT_KEY: [u8; 65] = hex_array(
    "047b1580634494ed0102f5cb701bcc6ba04bc389279ccc2a8c5b1f5a86e372496711236bf93465d346104e33909fe0d2be8f29d3c22f985576c844edabc9290110",
);
const TESTNET_ALERT_KEY: [u8; 65] = hex_array(
    "042362a7409148d891007fdcd1a52c9815f6e91f434a6bae2c598ec77730a8edb8499fdf6d73ebb4dc2ac98114783eec58d22c2cec3549c8d258489588cf46b202",
);
const DEVNET_ALERT_KEY: [u8; 65] = hex_array(
    "04032c784206b9276ebf143c8f2010a7ca967d2612b446801211d08c6fdebd373315d9973b0bf469a1a8d7935ec4026d165f1661eaa619c7d06f02c37bf446de0d",
);

const POW_TARGET_TIMESPAN: i64 = 24 * 60 * 60;
const POW_TARGET_SPACING: i64 = 150;

const REGTEST_NEVER_TIMEOUT: i64 = 999_999_999_999;

fn deployment(bit: u8, start_time: i64, timeout: i64, window_size: u32, threshold: u32) -> Deployment {
    Deployment { bit, start_time, timeout, window_size, threshold }
}

fn deployment_table(deployments: Deployments) -> Result<Deployments, ChainParamsError> {
    deployments.validate()?;
    Ok(deployments)
}

fn llmq_table(entries: &[LlmqParams]) -> Result<BTreeMap<LlmqType, LlmqParams>, ChainParamsError> {
    entries
        .iter()
        .map(|params| {
            params.validate()?;
            Ok((params.llmq_type, params.clone()))
        })
        .collect()
}

fn blazegeek_seeds(hosts: &[&'static str]) -> Vec<DnsSeed> {
    hosts.iter().map(|&host| DnsSeed { name: "blazegeek.com", host }).collect()
}

pub fn main_params(hasher: &dyn BlockHasher, check: GenesisCheck) -> Result<ParameterSet, ChainParamsError> {
    let genesis = create_genesis_block(1710706800, 1327548, 0x1e0ffff0, 1, 1000 * COIN);
    let genesis_hash = verify_genesis("main", &genesis, MAIN_GENESIS_HASH, GENESIS_MERKLE_ROOT, hasher, check)?;

    let window = 2016;
    let threshold = 1916; // 95% of 2016
    let consensus = ConsensusParams {
        hash_genesis_block: genesis_hash,
        hash_devnet_genesis_block: None,
        subsidy_halving_interval: 51840,
        masternode_payments_start_block: 4032,
        masternode_payments_increase_block: 158000,
        masternode_payments_increase_period: 576 * 30,
        instant_send_confirmations_required: 6,
        instant_send_keep_lock: 24,
        budget_payments_start_block: 180000,
        budget_payments_cycle_blocks: 16616,
        budget_payments_window_blocks: 100,
        superblock_start_block: 180000,
        superblock_start_hash: Hash256::ZERO,
        superblock_cycle: 16616,
        governance_min_quorum: 10,
        governance_filter_elements: 20000,
        masternode_minimum_confirmations: 15,
        bip34_height: 1,
        bip34_hash: MAIN_GENESIS_HASH,
        bip65_height: 1,
        bip66_height: 1,
        dip0001_height: 1,
        pow_limit: POW_LIMIT_MAIN,
        pow_target_timespan: POW_TARGET_TIMESPAN,
        pow_target_spacing: POW_TARGET_SPACING,
        pow_allow_min_difficulty_blocks: false,
        pow_no_retargeting: false,
        pow_kgw_height: 1,
        pow_dgw_height: 1,
        rule_change_activation_threshold: threshold,
        miner_confirmation_window: window,
        deployments: deployment_table(Deployments {
            test_dummy: deployment(28, 1199145601, 1230767999, window, threshold),
            csv: deployment(0, 1547856000, 1579392000, window, threshold),
            dip0001: deployment(1, 1547856000, 1579392000, 4032, 3226),
            bip147: deployment(2, 1547856000, 1579392000, 4032, 3226),
            dip0003: deployment(3, 1557360000, 1588982400, 4032, 3226),
        })?,
        minimum_chain_work: Hash256::ZERO,
        default_assume_valid: Hash256::ZERO,
        minimum_difficulty_blocks: 0,
        high_subsidy_blocks: 0,
        high_subsidy_factor: 1,
        llmqs: llmq_table(&[LLMQ_50_60, LLMQ_400_60, LLMQ_400_85])?,
        llmq_allow_dummy_commitments: false,
    };

    debug!("Built main profile, genesis {}", genesis_hash);
    Ok(ParameterSet {
        network: Network::Main,
        network_id: Network::Main.as_str().to_string(),
        consensus,
        message_start: [0xb4, 0xbb, 0xab, 0xbc],
        alert_pubkey: MAIN_ALERT_KEY.to_vec(),
        default_port: 5190,
        prune_after_height: 100_000,
        genesis,
        devnet_genesis: None,
        dns_seeds: blazegeek_seeds(&["explorer.blazegeek.com", "masternode.blazegeek.com", "dev.blazegeek.com"]),
        base58_prefixes: Base58Prefixes {
            pubkey_address: [0x42, 0x76, 0xf1, 0xe7],
            script_address: [0x54, 0xda, 0x34, 0x09],
            secret_key: [0xe6, 0xce, 0x83, 0x46],
            ext_public_key: [0x04, 0x88, 0xb2, 0x1e],
            ext_secret_key: [0x04, 0x88, 0xad, 0xe4],
        },
        ext_coin_type: 5,
        checkpoints: BTreeMap::from([(0, MAIN_GENESIS_HASH)]),
        mining_requires_peers: false,
        default_consistency_checks: false,
        require_standard: true,
        require_routable_external_ip: true,
        mine_blocks_on_demand: false,
        allow_multiple_addresses_from_group: false,
        allow_multiple_ports: false,
        pool_max_transactions: 3,
        fulfilled_request_expire_time: 60 * 60,
        spork_addresses: vec!["geek1RJqQpuCcJ57ZqskQCeDv8VVUyPphauoDM"],
        min_spork_keys: 1,
        bip9_check_masternodes_upgraded: false,
    })
}

pub fn testnet_params(hasher: &dyn BlockHasher, check: GenesisCheck) -> Result<ParameterSet, ChainParamsError> {
    let genesis = create_genesis_block(1710706500, 4306049, 0x1e0ffff0, 1, 1000 * COIN);
    let genesis_hash = verify_genesis("test", &genesis, TESTNET_GENESIS_HASH, GENESIS_MERKLE_ROOT, hasher, check)?;

    let window = 576;
    let threshold = 432; // 75% for test chains
    let consensus = ConsensusParams {
        hash_genesis_block: genesis_hash,
        hash_devnet_genesis_block: None,
        subsidy_halving_interval: 51840,
        masternode_payments_start_block: 10,
        masternode_payments_increase_block: 4030,
        masternode_payments_increase_period: 10,
        instant_send_confirmations_required: 2,
        instant_send_keep_lock: 6,
        budget_payments_start_block: 500,
        budget_payments_cycle_blocks: 50,
        budget_payments_window_blocks: 10,
        superblock_start_block: 500,
        superblock_start_hash: Hash256::ZERO,
        superblock_cycle: 24,
        governance_min_quorum: 1,
        governance_filter_elements: 500,
        masternode_minimum_confirmations: 1,
        bip34_height: 1,
        bip34_hash: Hash256::ZERO,
        bip65_height: 1,
        bip66_height: 1,
        dip0001_height: 10,
        pow_limit: POW_LIMIT_MAIN,
        pow_target_timespan: POW_TARGET_TIMESPAN,
        pow_target_spacing: POW_TARGET_SPACING,
        pow_allow_min_difficulty_blocks: true,
        pow_no_retargeting: false,
        pow_kgw_height: 1,
        pow_dgw_height: 1,
        rule_change_activation_threshold: threshold,
        miner_confirmation_window: window,
        deployments: deployment_table(Deployments {
            test_dummy: deployment(28, 1199145601, 1230767999, window, threshold),
            csv: deployment(0, 1549032900, 1579132800, 100, 50),
            dip0001: deployment(1, 1549119300, 1579132800, 100, 50),
            bip147: deployment(2, 1549205700, 1579132800, 100, 50),
            dip0003: deployment(3, 1549292100, 1579132800, 100, 50),
        })?,
        minimum_chain_work: Hash256::ZERO,
        default_assume_valid: Hash256::ZERO,
        minimum_difficulty_blocks: 0,
        high_subsidy_blocks: 0,
        high_subsidy_factor: 1,
        llmqs: llmq_table(&[LLMQ_50_60, LLMQ_400_60, LLMQ_400_85])?,
        llmq_allow_dummy_commitments: true,
    };

    debug!("Built test profile, genesis {}", genesis_hash);
    Ok(ParameterSet {
        network: Network::Testnet,
        network_id: Network::Testnet.as_str().to_string(),
        consensus,
        message_start: [0xcb, 0xba, 0xbb, 0xb4],
        alert_pubkey: TESTNET_ALERT_KEY.to_vec(),
        default_port: 15190,
        prune_after_height: 1000,
        genesis,
        devnet_genesis: None,
        dns_seeds: blazegeek_seeds(&["dev.blazegeek.com"]),
        base58_prefixes: Base58Prefixes {
            pubkey_address: [0x42, 0x76, 0xf2, 0x28],
            script_address: [0x54, 0xda, 0x34, 0x4d],
            secret_key: [0xe6, 0xce, 0x83, 0x80],
            ext_public_key: [0x04, 0x35, 0x87, 0xcf],
            ext_secret_key: [0x04, 0x35, 0x83, 0x94],
        },
        ext_coin_type: 1,
        checkpoints: BTreeMap::new(),
        mining_requires_peers: false,
        default_consistency_checks: false,
        require_standard: false,
        require_routable_external_ip: true,
        mine_blocks_on_demand: false,
        allow_multiple_addresses_from_group: false,
        allow_multiple_ports: false,
        pool_max_transactions: 3,
        fulfilled_request_expire_time: 5 * 60,
        spork_addresses: vec!["geekTXjEJGQapt7YWpHy9bRjJ8p2sKcU1baHYP"],
        min_spork_keys: 1,
        bip9_check_masternodes_upgraded: false,
    })
}

/// Builds a devnet profile. Runs the devnet anchor search, so callers build
/// this once per process.
pub fn devnet_params(
    devnet_name: &str,
    hasher: &dyn BlockHasher,
    check: GenesisCheck,
) -> Result<ParameterSet, ChainParamsError> {
    if devnet_name.is_empty() {
        return Err(ChainParamsError::EmptyDevnetName);
    }
    let genesis = create_genesis_block(1710706200, 1896248, 0x207fffff, 1, 1000 * COIN);
    let genesis_hash = verify_genesis("dev", &genesis, DEVNET_GENESIS_HASH, GENESIS_MERKLE_ROOT, hasher, check)?;
    let network_id = devnet_network_id(devnet_name);
    // The anchor coinbase commits to the full network id, not the bare name.
    let devnet_genesis = find_devnet_genesis_block(&genesis, genesis_hash, &network_id, 50 * COIN, hasher)?;
    let devnet_genesis_hash = devnet_genesis.hash_with(hasher);

    let window = 2016;
    let threshold = 1512; // 75% for test chains
    let consensus = ConsensusParams {
        hash_genesis_block: genesis_hash,
        hash_devnet_genesis_block: Some(devnet_genesis_hash),
        subsidy_halving_interval: 51840,
        masternode_payments_start_block: 4010,
        masternode_payments_increase_block: 4030,
        masternode_payments_increase_period: 10,
        instant_send_confirmations_required: 2,
        instant_send_keep_lock: 6,
        budget_payments_start_block: 4100,
        budget_payments_cycle_blocks: 50,
        budget_payments_window_blocks: 10,
        superblock_start_block: 4200,
        superblock_start_hash: Hash256::ZERO,
        superblock_cycle: 24,
        governance_min_quorum: 1,
        governance_filter_elements: 500,
        masternode_minimum_confirmations: 1,
        bip34_height: 1,
        bip34_hash: Hash256::ZERO,
        bip65_height: 1,
        bip66_height: 1,
        dip0001_height: 1,
        pow_limit: POW_LIMIT_TEST_CHAINS,
        pow_target_timespan: POW_TARGET_TIMESPAN,
        pow_target_spacing: POW_TARGET_SPACING,
        pow_allow_min_difficulty_blocks: true,
        pow_no_retargeting: false,
        pow_kgw_height: 1,
        pow_dgw_height: 1,
        rule_change_activation_threshold: threshold,
        miner_confirmation_window: window,
        deployments: deployment_table(Deployments {
            test_dummy: deployment(28, 1199145601, 1230767999, window, threshold),
            csv: deployment(0, 1506556800, 1538092800, window, threshold),
            dip0001: deployment(1, 1505692800, 1537228800, 100, 50),
            bip147: deployment(2, 1517792400, 1549328400, 100, 50),
            dip0003: deployment(3, 1535752800, 1567288800, 100, 50),
        })?,
        minimum_chain_work: Hash256::ZERO,
        default_assume_valid: Hash256::ZERO,
        minimum_difficulty_blocks: 0,
        high_subsidy_blocks: 0,
        high_subsidy_factor: 1,
        llmqs: llmq_table(&[LLMQ_50_60, LLMQ_400_60, LLMQ_400_85])?,
        llmq_allow_dummy_commitments: true,
    };

    debug!("Built dev profile, genesis {}, devnet anchor {}", genesis_hash, devnet_genesis_hash);
    Ok(ParameterSet {
        network: Network::Devnet,
        network_id,
        consensus,
        message_start: [0xe2, 0xca, 0xff, 0xce],
        alert_pubkey: DEVNET_ALERT_KEY.to_vec(),
        default_port: 15190,
        prune_after_height: 1000,
        genesis,
        devnet_genesis: Some(devnet_genesis),
        dns_seeds: blazegeek_seeds(&["dev.blazegeek.com"]),
        base58_prefixes: Base58Prefixes {
            pubkey_address: [0x42, 0x76, 0xf2, 0x05],
            script_address: [0x54, 0xda, 0x34, 0x2c],
            secret_key: [0xe6, 0xce, 0x83, 0x21],
            ext_public_key: [0x04, 0x35, 0x88, 0x14],
            ext_secret_key: [0x04, 0x35, 0x83, 0xd9],
        },
        ext_coin_type: 1,
        checkpoints: BTreeMap::new(),
        mining_requires_peers: false,
        default_consistency_checks: false,
        require_standard: false,
        require_routable_external_ip: false,
        mine_blocks_on_demand: false,
        allow_multiple_addresses_from_group: true,
        allow_multiple_ports: true,
        pool_max_transactions: 3,
        fulfilled_request_expire_time: 5 * 60,
        spork_addresses: vec!["geekDd97GtgV6mAFsy2yxL7sunao5HeAiq18u1"],
        min_spork_keys: 1,
        // devnets start without masternodes, so there is nothing to check
        bip9_check_masternodes_upgraded: false,
    })
}

pub fn regtest_params(hasher: &dyn BlockHasher, check: GenesisCheck) -> Result<ParameterSet, ChainParamsError> {
    let genesis = create_genesis_block(1710705900, 417036, 0x207fffff, 1, 1000 * COIN);
    let genesis_hash = verify_genesis("regtest", &genesis, REGTEST_GENESIS_HASH, GENESIS_MERKLE_ROOT, hasher, check)?;

    let window = 144;
    let threshold = 108; // 75% for test chains
    let consensus = ConsensusParams {
        hash_genesis_block: genesis_hash,
        hash_devnet_genesis_block: None,
        subsidy_halving_interval: 150,
        masternode_payments_start_block: 240,
        masternode_payments_increase_block: 350,
        masternode_payments_increase_period: 10,
        instant_send_confirmations_required: 2,
        instant_send_keep_lock: 6,
        budget_payments_start_block: 1000,
        budget_payments_cycle_blocks: 50,
        budget_payments_window_blocks: 10,
        superblock_start_block: 1500,
        superblock_start_hash: Hash256::ZERO,
        superblock_cycle: 10,
        governance_min_quorum: 1,
        governance_filter_elements: 100,
        masternode_minimum_confirmations: 1,
        bip34_height: 1,
        bip34_hash: Hash256::ZERO,
        bip65_height: 1,
        bip66_height: 1,
        dip0001_height: 1,
        pow_limit: POW_LIMIT_TEST_CHAINS,
        pow_target_timespan: POW_TARGET_TIMESPAN,
        pow_target_spacing: POW_TARGET_SPACING,
        pow_allow_min_difficulty_blocks: true,
        pow_no_retargeting: true,
        pow_kgw_height: 1,
        pow_dgw_height: 1,
        rule_change_activation_threshold: threshold,
        miner_confirmation_window: window,
        deployments: deployment_table(Deployments {
            test_dummy: deployment(28, 0, REGTEST_NEVER_TIMEOUT, window, threshold),
            csv: deployment(0, 0, REGTEST_NEVER_TIMEOUT, window, threshold),
            dip0001: deployment(1, 0, REGTEST_NEVER_TIMEOUT, window, threshold),
            bip147: deployment(2, 0, REGTEST_NEVER_TIMEOUT, window, threshold),
            dip0003: deployment(3, 0, REGTEST_NEVER_TIMEOUT, window, threshold),
        })?,
        minimum_chain_work: Hash256::ZERO,
        default_assume_valid: Hash256::ZERO,
        minimum_difficulty_blocks: 0,
        high_subsidy_blocks: 0,
        high_subsidy_factor: 1,
        llmqs: llmq_table(&[LLMQ_10_60, LLMQ_50_60])?,
        llmq_allow_dummy_commitments: true,
    };

    debug!("Built regtest profile, genesis {}", genesis_hash);
    Ok(ParameterSet {
        network: Network::Regtest,
        network_id: Network::Regtest.as_str().to_string(),
        consensus,
        message_start: [0xff, 0xbb, 0xbb, 0xcb],
        alert_pubkey: Vec::new(),
        default_port: 25190,
        prune_after_height: 1000,
        genesis,
        devnet_genesis: None,
        dns_seeds: Vec::new(),
        base58_prefixes: Base58Prefixes {
            pubkey_address: [0x42, 0x76, 0xf2, 0x4a],
            script_address: [0x54, 0xda, 0x34, 0x8f],
            secret_key: [0xe6, 0xce, 0x83, 0xa2],
            ext_public_key: [0x04, 0x35, 0x88, 0x59],
            ext_secret_key: [0x04, 0x35, 0x84, 0x1e],
        },
        ext_coin_type: 1,
        checkpoints: BTreeMap::new(),
        mining_requires_peers: false,
        default_consistency_checks: true,
        require_standard: false,
        require_routable_external_ip: false,
        mine_blocks_on_demand: true,
        allow_multiple_addresses_from_group: true,
        allow_multiple_ports: true,
        pool_max_transactions: 3,
        fulfilled_request_expire_time: 5 * 60,
        spork_addresses: vec!["geekTXjEJGQapt7YWpHy9bRjJ8p2sKcU1baHYP"],
        min_spork_keys: 1,
        bip9_check_masternodes_upgraded: false,
    })
}
