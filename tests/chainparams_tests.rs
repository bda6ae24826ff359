//! Network profile tests: genesis anchors, devnet mining and profile selection.

use std::collections::HashSet;
use std::sync::Arc;

use blaze_consensus::chainparams::networks::GENESIS_MERKLE_ROOT;
use blaze_consensus::chainparams::{Base58Type, ChainRegistry, DeploymentPos, GenesisCheck, Network};
use blaze_consensus::primitives::{BlockHasher, BlockHeader, Hash256, Sha256dHasher};
use blaze_consensus::ChainParamsError;

fn registry() -> ChainRegistry {
    ChainRegistry::new(Arc::new(Sha256dHasher), GenesisCheck::MerkleRoot).unwrap()
}

fn all_profiles() -> ChainRegistry {
    let mut registry = registry();
    registry.initialize_devnet("devnet").unwrap();
    registry
}

#[test]
fn test_profiles_are_distinct() {
    let registry = all_profiles();
    let profiles: Vec<_> = Network::ALL.iter().map(|n| registry.get(*n).unwrap()).collect();

    let magics: HashSet<_> = profiles.iter().map(|p| p.message_start).collect();
    let genesis: HashSet<_> = profiles.iter().map(|p| p.genesis_hash()).collect();
    let ids: HashSet<_> = profiles.iter().map(|p| p.network_id.clone()).collect();

    assert_eq!(magics.len(), 4);
    assert_eq!(genesis.len(), 4);
    assert_eq!(ids.len(), 4);
}

#[test]
fn test_base58_prefixes_are_distinct_per_network() {
    let registry = all_profiles();
    for kind in Base58Type::ALL {
        let prefixes: HashSet<[u8; 4]> = Network::ALL
            .iter()
            .map(|n| *registry.get(*n).unwrap().base58_prefix(kind))
            .collect();
        assert_eq!(prefixes.len(), Network::ALL.len(), "{:?}", kind);
    }
}

#[test]
fn test_genesis_blocks_share_merkle_root() {
    let registry = all_profiles();
    for network in Network::ALL {
        let profile = registry.get(network).unwrap();
        assert_eq!(profile.genesis.header.merkle_root, GENESIS_MERKLE_ROOT, "{}", network);
        assert_eq!(profile.genesis.compute_merkle_root(), GENESIS_MERKLE_ROOT, "{}", network);
        assert!(profile.genesis.header.prev_block_hash.is_zero());
    }
}

#[test]
fn test_genesis_header_sha256d_vectors() {
    let registry = registry();
    let expected = [
        (Network::Main, "8f8c81400bcc114d95d8b568fe33f50b668d1c1119133b34592735653e1194a3"),
        (Network::Testnet, "a1190efb56cfb602f64a236af5d57b038e5fe77b591dee9096305b3521c64de7"),
        (Network::Regtest, "d230149c7a4ce0e57c57f2c21f0e4dab48195c854d2fcbaad384d95d4f6bed10"),
    ];
    for (network, hash) in expected {
        let profile = registry.get(network).unwrap();
        assert_eq!(profile.genesis.hash_with(&Sha256dHasher).to_string(), hash);
    }
}

/// Hasher that reports the pinned hash for known headers, standing in for the
/// chain's real proof-of-work function.
struct PinnedHasher(Vec<(BlockHeader, Hash256)>);

impl BlockHasher for PinnedHasher {
    fn hash_header(&self, header: &BlockHeader) -> Hash256 {
        self.0
            .iter()
            .find(|(known, _)| known == header)
            .map(|(_, hash)| *hash)
            .unwrap_or_else(|| Sha256dHasher.hash_header(header))
    }

    fn name(&self) -> &'static str {
        "pinned"
    }
}

#[test]
fn test_full_check_passes_with_matching_hasher() {
    let reference = registry();
    let pinned = PinnedHasher(
        [Network::Main, Network::Testnet, Network::Regtest]
            .iter()
            .map(|n| {
                let profile = reference.get(*n).unwrap();
                (profile.genesis.header, profile.genesis_hash())
            })
            .collect(),
    );
    let full = ChainRegistry::new(Arc::new(pinned), GenesisCheck::Full).unwrap();
    assert_eq!(
        full.get(Network::Main).unwrap().genesis_hash(),
        reference.get(Network::Main).unwrap().genesis_hash()
    );
}

#[test]
fn test_full_check_rejects_wrong_hasher() {
    let err = ChainRegistry::new(Arc::new(Sha256dHasher), GenesisCheck::Full).unwrap_err();
    assert!(matches!(err, ChainParamsError::GenesisHashMismatch { hasher: "sha256d", .. }));
}

#[test]
fn test_alert_keys_parse() {
    let registry = all_profiles();
    for network in [Network::Main, Network::Testnet, Network::Devnet] {
        let key = registry.get(network).unwrap().alert_public_key();
        assert!(matches!(key, Some(Ok(_))), "{}", network);
    }
    assert!(registry.get(Network::Regtest).unwrap().alert_public_key().is_none());
}

#[test]
fn test_named_devnet_anchor() {
    let mut registry = registry();
    let dev = registry.initialize_devnet("alpha").unwrap();
    assert_eq!(dev.network_id, "devnet-alpha");

    let anchor = dev.devnet_genesis.as_ref().unwrap();
    assert_eq!(anchor.header.nonce, 2);
    assert_eq!(anchor.header.version, 4);
    assert_eq!(anchor.header.time, dev.genesis.header.time + 1);
    assert_eq!(anchor.header.bits, dev.genesis.header.bits);
    assert_eq!(anchor.header.prev_block_hash, dev.genesis_hash());
    assert_eq!(
        anchor.header.merkle_root.to_string(),
        "3ff2cbea528db228a1696f8da2920055b2df91f09c03a13380ec1c5aae7c63ca"
    );
    assert_eq!(
        dev.devnet_genesis_hash().unwrap().to_string(),
        "6e93fca4d23f5f589b78dffd3390da4d5a35cb9f923b3d1a3f5e74f6cfc87c1e"
    );
}

#[test]
fn test_devnets_with_different_names_differ() {
    let mut registry = registry();
    let plain = registry.initialize_devnet("devnet").unwrap().devnet_genesis_hash();
    registry.reset_devnet();
    let alpha = registry.initialize_devnet("alpha").unwrap().devnet_genesis_hash();
    assert_ne!(plain, alpha);
}

#[test]
fn test_unknown_chain() {
    let mut registry = registry();
    for name in ["mainnet", "testnet3", ""] {
        assert!(matches!(registry.profile(name), Err(ChainParamsError::UnknownChain(n)) if n == name));
        assert!(registry.select(name).is_err());
    }
    assert!(registry.try_active().is_none());
}

#[test]
fn test_regtest_and_test_differ() {
    let registry = registry();
    let test = registry.get(Network::Testnet).unwrap();
    let regtest = registry.get(Network::Regtest).unwrap();
    assert_ne!(test.genesis_hash(), regtest.genesis_hash());
    assert_ne!(test.message_start, regtest.message_start);
    assert_ne!(
        test.base58_prefix(Base58Type::PubkeyAddress),
        regtest.base58_prefix(Base58Type::PubkeyAddress)
    );
    assert_ne!(
        test.consensus.deployment(DeploymentPos::Csv).window_size,
        regtest.consensus.deployment(DeploymentPos::Csv).window_size
    );
}

#[test]
fn test_summary_serializes() {
    let mut registry = registry();
    let regtest = registry.select("regtest").unwrap();
    let json = serde_json::to_value(regtest.summary()).unwrap();
    assert_eq!(json["network"], "regtest");
    assert_eq!(json["default_port"], 25190);
    assert_eq!(json["deployments"].as_array().unwrap().len(), DeploymentPos::ALL.len());
    assert_eq!(json["llmqs"].as_array().unwrap().len(), 2);
    assert!(json.get("devnet_genesis_hash").is_none());
}
