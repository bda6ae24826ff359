//! Fixed-size BLS elements and the signature capability the quorum code
//! relies on. The curve arithmetic lives outside this crate.

use std::fmt;
use std::io::{Error as IoError, Write};

use serde::{Serialize, Serializer};

use crate::primitives::{Encodable, Hash256};

macro_rules! impl_bls_element {
    ($name:ident, $len:expr) => {
        impl $name {
            pub const SIZE: usize = $len;
            pub const NULL: $name = $name([0u8; $len]);

            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                $name(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// The all-zero encoding, used for "no key" / "no signature".
            pub fn is_null(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                $name(bytes)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl Encodable for $name {
            fn consensus_encode<W: Write>(&self, w: &mut W) -> Result<usize, IoError> {
                w.write_all(&self.0)?;
                Ok($len)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }
    };
}

/// Compressed 48-byte BLS12-381 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlsPublicKey([u8; 48]);

/// Compressed 96-byte BLS12-381 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlsSignature([u8; 96]);

impl_bls_element!(BlsPublicKey, 48);
impl_bls_element!(BlsSignature, 96);

/// Threshold-signature operations needed to check quorum commitments.
pub trait ThresholdSignatureScheme: Send + Sync {
    /// Whether `key` decodes to a valid, non-identity curve point.
    fn is_valid_public_key(&self, key: &BlsPublicKey) -> bool;

    fn verify(&self, key: &BlsPublicKey, message: &Hash256, signature: &BlsSignature) -> bool;

    /// Verifies a signature aggregated from one signature per key over the
    /// same message, with rogue-key protection.
    fn verify_secure_aggregated(&self, keys: &[BlsPublicKey], message: &Hash256, signature: &BlsSignature) -> bool;
}
