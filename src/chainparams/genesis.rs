//! Genesis anchors: the fixed first block of every network, plus the mined
//! second anchor that gives each devnet its own identity.

use std::ops::Range;

use log::{error, info};

use crate::error::ChainParamsError;
use crate::primitives::hash::hex_array;
use crate::primitives::script::{OP_CHECKSIG, OP_RETURN};
use crate::primitives::{Amount, Block, BlockHasher, BlockHeader, Hash256, Script, Target, Transaction};

pub const GENESIS_MESSAGE: &str = "Dive in and GEEK!";

const GENESIS_OUTPUT_PUBKEY: [u8; 65] = hex_array(
    "04523d49d8413248c959eb3518a86fa6cc189ca5508b102dc5f882de30ecc38b6abcbbed7901834c8cbc68cd4c739af6f7857b066a56cbd8b1e59929d350cd5f5b",
);

/// First push of every genesis coinbase: the nBits of Bitcoin's genesis block.
const GENESIS_SCRIPT_SIG_MARKER: i64 = 486_604_799;

const DEVNET_GENESIS_VERSION: i32 = 4;

/// Nonces tried when mining a devnet anchor. `u32::MAX` itself is never tried.
const DEVNET_NONCES: Range<u32> = 0..u32::MAX;

/// How strictly a built genesis block is checked against its hard-coded identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenesisCheck {
    /// Merkle root and block hash must both match.
    Full,
    /// Merkle root must match; the block hash is taken from the hard-coded
    /// constant. Used when the chain's proof-of-work hasher is not linked in.
    MerkleRoot,
}

pub fn genesis_output_script() -> Script {
    Script::builder()
        .push_slice(&GENESIS_OUTPUT_PUBKEY)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

pub fn create_genesis_block_with(
    message: &str,
    output_script: Script,
    time: u32,
    nonce: u32,
    bits: u32,
    version: i32,
    reward: Amount,
) -> Block {
    let script_sig = Script::builder()
        .push_int(GENESIS_SCRIPT_SIG_MARKER)
        .push_script_num(4)
        .push_slice(message.as_bytes())
        .into_script();
    let coinbase = Transaction::coinbase(script_sig, reward, output_script);
    let mut block = Block {
        header: BlockHeader {
            version,
            prev_block_hash: Hash256::ZERO,
            merkle_root: Hash256::ZERO,
            time,
            bits,
            nonce,
        },
        transactions: vec![coinbase],
    };
    block.header.merkle_root = block.compute_merkle_root();
    block
}

/// Genesis block with the network-wide message and reward script.
pub fn create_genesis_block(time: u32, nonce: u32, bits: u32, version: i32, reward: Amount) -> Block {
    create_genesis_block_with(GENESIS_MESSAGE, genesis_output_script(), time, nonce, bits, version, reward)
}

/// The devnet anchor commits to its height (1, BIP34-style) and the devnet name.
pub fn create_devnet_genesis_block(
    prev_block_hash: Hash256,
    devnet_name: &str,
    time: u32,
    nonce: u32,
    bits: u32,
    reward: Amount,
) -> Result<Block, ChainParamsError> {
    if devnet_name.is_empty() {
        return Err(ChainParamsError::EmptyDevnetName);
    }
    let script_sig = Script::builder()
        .push_int(1)
        .push_slice(devnet_name.as_bytes())
        .into_script();
    let script_pubkey = Script::builder().push_opcode(OP_RETURN).into_script();
    let mut block = Block {
        header: BlockHeader {
            version: DEVNET_GENESIS_VERSION,
            prev_block_hash,
            merkle_root: Hash256::ZERO,
            time,
            bits,
            nonce,
        },
        transactions: vec![Transaction::coinbase(script_sig, reward, script_pubkey)],
    };
    block.header.merkle_root = block.compute_merkle_root();
    Ok(block)
}

/// Mines the devnet anchor on top of `prev_block` (whose canonical hash is
/// `prev_block_hash`), one second later and at the same difficulty.
pub fn find_devnet_genesis_block(
    prev_block: &Block,
    prev_block_hash: Hash256,
    devnet_name: &str,
    reward: Amount,
    hasher: &dyn BlockHasher,
) -> Result<Block, ChainParamsError> {
    let bits = prev_block.header.bits;
    let target = Target::from_compact(bits)
        .filter(|target| *target != Target::ZERO)
        .ok_or(ChainParamsError::InvalidDifficultyBits(bits))?;
    let mut block = create_devnet_genesis_block(
        prev_block_hash,
        devnet_name,
        prev_block.header.time.wrapping_add(1),
        0,
        bits,
        reward,
    )?;

    match search_nonce(&mut block, &target, hasher, DEVNET_NONCES) {
        Some(hash) => {
            info!(
                "Mined devnet anchor for {} at nonce {} with {}: {}",
                devnet_name,
                block.header.nonce,
                hasher.name(),
                hash
            );
            Ok(block)
        }
        None => {
            error!("Could not find devnet genesis block for {}", devnet_name);
            Err(ChainParamsError::DevnetNonceExhausted(devnet_name.to_string()))
        }
    }
}

/// Tries each nonce in turn, leaving the block at the first one whose hash
/// meets `target`.
pub(crate) fn search_nonce<I>(
    block: &mut Block,
    target: &Target,
    hasher: &dyn BlockHasher,
    nonces: I,
) -> Option<Hash256>
where
    I: IntoIterator<Item = u32>,
{
    for nonce in nonces {
        block.header.nonce = nonce;
        let hash = block.hash_with(hasher);
        if target.is_met_by(&hash) {
            return Some(hash);
        }
    }
    None
}

/// Checks a freshly built genesis block against its hard-coded identity and
/// returns the hash the network will use for it.
pub fn verify_genesis(
    network: &str,
    block: &Block,
    expected_hash: Hash256,
    expected_merkle_root: Hash256,
    hasher: &dyn BlockHasher,
    check: GenesisCheck,
) -> Result<Hash256, ChainParamsError> {
    let merkle_root = block.header.merkle_root;
    if merkle_root != expected_merkle_root {
        error!("{}: genesis merkle root {} does not match {}", network, merkle_root, expected_merkle_root);
        return Err(ChainParamsError::MerkleRootMismatch {
            network: network.to_string(),
            expected: expected_merkle_root,
            computed: merkle_root,
        });
    }

    match check {
        GenesisCheck::MerkleRoot => Ok(expected_hash),
        GenesisCheck::Full => {
            let computed = block.hash_with(hasher);
            if computed != expected_hash {
                error!("{}: genesis hash {} does not match {}", network, computed, expected_hash);
                return Err(ChainParamsError::GenesisHashMismatch {
                    network: network.to_string(),
                    expected: expected_hash,
                    computed,
                    hasher: hasher.name(),
                });
            }
            Ok(computed)
        }
    }
}

/// `"devnet"` for the unnamed devnet, `"devnet-<name>"` otherwise.
pub fn devnet_network_id(devnet_name: &str) -> String {
    if devnet_name == "devnet" {
        devnet_name.to_string()
    } else {
        format!("devnet-{}", devnet_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{serialize, Sha256dHasher, COIN};

    const GENESIS_MERKLE: Hash256 =
        Hash256::from_hex_const("afa40b920f60bc567f654f9620721556d1612f94c544d2a5c9a1e914b3a6255e");

    #[test]
    fn coinbase_script_sig_layout() {
        let block = create_genesis_block(1710706800, 1327548, 0x1e0ffff0, 1, 1000 * COIN);
        let script_sig = block.transactions[0].inputs[0].script_sig.as_bytes();
        assert_eq!(&script_sig[..7], &[0x04, 0xff, 0xff, 0x00, 0x1d, 0x01, 0x04]);
        assert_eq!(script_sig[7] as usize, GENESIS_MESSAGE.len());
        assert_eq!(&script_sig[8..], GENESIS_MESSAGE.as_bytes());
    }

    #[test]
    fn output_script_is_pay_to_pubkey() {
        let script = genesis_output_script();
        assert_eq!(script.len(), 67);
        assert_eq!(script.as_bytes()[0], 65);
        assert_eq!(script.as_bytes()[66], OP_CHECKSIG);
    }

    #[test]
    fn every_network_shares_the_merkle_root() {
        for (time, nonce, bits) in [
            (1710706800, 1327548, 0x1e0ffff0),
            (1710706500, 4306049, 0x1e0ffff0),
            (1710706200, 1896248, 0x207fffff),
            (1710705900, 417036, 0x207fffff),
        ] {
            let block = create_genesis_block(time, nonce, bits, 1, 1000 * COIN);
            assert_eq!(block.header.merkle_root, GENESIS_MERKLE);
        }
    }

    #[test]
    fn regtest_genesis_header_hash_with_sha256d() {
        let block = create_genesis_block(1710705900, 417036, 0x207fffff, 1, 1000 * COIN);
        assert_eq!(serialize(&block.header).len(), BlockHeader::SIZE);
        assert_eq!(
            block.hash_with(&Sha256dHasher).to_string(),
            "d230149c7a4ce0e57c57f2c21f0e4dab48195c854d2fcbaad384d95d4f6bed10"
        );
    }

    #[test]
    fn empty_devnet_name_is_rejected() {
        let err = create_devnet_genesis_block(Hash256::ZERO, "", 0, 0, 0x207fffff, 50 * COIN).unwrap_err();
        assert!(matches!(err, ChainParamsError::EmptyDevnetName));
    }

    #[test]
    fn devnet_coinbase_commits_to_name() {
        let block = create_devnet_genesis_block(Hash256::ZERO, "alpha", 1, 0, 0x207fffff, 50 * COIN).unwrap();
        let tx = &block.transactions[0];
        assert_eq!(tx.inputs[0].script_sig.as_bytes(), &[0x51, 5, b'a', b'l', b'p', b'h', b'a']);
        assert!(tx.is_coinbase());
        assert!(tx.outputs[0].script_pubkey.is_provably_unspendable());
        assert_eq!(block.header.version, DEVNET_GENESIS_VERSION);
    }

    #[test]
    fn mining_finds_low_nonce_on_easy_target() {
        let dev = create_genesis_block(1710706200, 1896248, 0x207fffff, 1, 1000 * COIN);
        let prev_hash =
            Hash256::from_hex_const("000001abb33bf728258dd53384ca07b341e79d774fa46f8ada0fdf462796da21");
        let block = find_devnet_genesis_block(&dev, prev_hash, "devnet", 50 * COIN, &Sha256dHasher).unwrap();
        assert_eq!(block.header.nonce, 4);
        assert_eq!(block.header.time, 1710706201);
        assert_eq!(block.header.prev_block_hash, prev_hash);
        assert_eq!(
            block.hash_with(&Sha256dHasher).to_string(),
            "658d39a4afb42e57cf610c4c8bc8e73c6db14577c4e1921a9685923750e57f7c"
        );
    }

    #[test]
    fn exhausted_nonce_range_yields_none() {
        let mut block = create_devnet_genesis_block(Hash256::ZERO, "x", 0, 0, 0x207fffff, 0).unwrap();
        assert!(search_nonce(&mut block, &Target::ZERO, &Sha256dHasher, 0..16).is_none());
    }

    /// Meets any target only at nonce `u32::MAX`.
    struct LastNonceHasher;

    impl BlockHasher for LastNonceHasher {
        fn hash_header(&self, header: &BlockHeader) -> Hash256 {
            if header.nonce == u32::MAX {
                Hash256::ZERO
            } else {
                Hash256::from_bytes([0xff; 32])
            }
        }

        fn name(&self) -> &'static str {
            "last-nonce"
        }
    }

    #[test]
    fn devnet_search_stops_before_max_nonce() {
        assert_eq!(DEVNET_NONCES.end, u32::MAX);
        assert!(!DEVNET_NONCES.contains(&u32::MAX));

        let target = Target::from_compact(0x207fffff).unwrap();
        let mut block = create_devnet_genesis_block(Hash256::ZERO, "x", 0, 0, 0x207fffff, 0).unwrap();
        let tail = DEVNET_NONCES.end - 8..DEVNET_NONCES.end;
        assert!(search_nonce(&mut block, &target, &LastNonceHasher, tail).is_none());
        assert!(search_nonce(&mut block, &target, &LastNonceHasher, u32::MAX..=u32::MAX).is_some());
    }

    #[test]
    fn each_genesis_input_changes_the_hash() {
        let (time, nonce, bits, version, reward) = (1710705900, 417036, 0x207fffff, 1, 1000 * COIN);
        let base = create_genesis_block(time, nonce, bits, version, reward).hash_with(&Sha256dHasher);
        let variants = [
            create_genesis_block(time + 1, nonce, bits, version, reward),
            create_genesis_block(time, nonce + 1, bits, version, reward),
            create_genesis_block(time, nonce, 0x1e0ffff0, version, reward),
            create_genesis_block(time, nonce, bits, version + 1, reward),
            create_genesis_block(time, nonce, bits, version, reward + 1),
        ];
        for (i, block) in variants.iter().enumerate() {
            assert_ne!(block.hash_with(&Sha256dHasher), base, "variant {}", i);
        }
        // The reward only reaches the header through the merkle root.
        assert_ne!(variants[4].header.merkle_root, GENESIS_MERKLE);
    }

    #[test]
    fn zero_target_bits_are_rejected() {
        let mut prev = create_genesis_block(0, 0, 0x207fffff, 1, 0);
        prev.header.bits = 0;
        let err = find_devnet_genesis_block(&prev, Hash256::ZERO, "x", 0, &Sha256dHasher).unwrap_err();
        assert!(matches!(err, ChainParamsError::InvalidDifficultyBits(0)));
    }

    #[test]
    fn verify_reports_mismatches() {
        let block = create_genesis_block(1710705900, 417036, 0x207fffff, 1, 1000 * COIN);
        let pinned = Hash256::from_hex_const("0000059c796214ccb7a4da449afcb3226b07a34878429824c4695f4986f43610");

        let hash = verify_genesis("regtest", &block, pinned, GENESIS_MERKLE, &Sha256dHasher, GenesisCheck::MerkleRoot)
            .unwrap();
        assert_eq!(hash, pinned);

        let err = verify_genesis("regtest", &block, pinned, GENESIS_MERKLE, &Sha256dHasher, GenesisCheck::Full)
            .unwrap_err();
        assert!(matches!(err, ChainParamsError::GenesisHashMismatch { .. }));

        let err = verify_genesis("regtest", &block, pinned, Hash256::ZERO, &Sha256dHasher, GenesisCheck::MerkleRoot)
            .unwrap_err();
        assert!(matches!(err, ChainParamsError::MerkleRootMismatch { .. }));
    }

    #[test]
    fn devnet_ids() {
        assert_eq!(devnet_network_id("devnet"), "devnet");
        assert_eq!(devnet_network_id("alpha"), "devnet-alpha");
    }
}
