use std::io::{Error as IoError, Write};

use serde::{Serialize, Serializer};

use super::encode::{write_var_bytes, Encodable};

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_CHECKSIG: u8 = 0xac;

/// Raw script bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new() -> Self {
        Script(Vec::new())
    }

    pub fn builder() -> ScriptBuilder {
        ScriptBuilder::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A script whose first opcode is `OP_RETURN` can never be spent.
    pub fn is_provably_unspendable(&self) -> bool {
        self.0.first() == Some(&OP_RETURN)
    }
}

impl Encodable for Script {
    fn consensus_encode<W: Write>(&self, w: &mut W) -> Result<usize, IoError> {
        write_var_bytes(w, &self.0)
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

/// Minimal `CScript <<` equivalent: only the push forms the anchors need.
#[derive(Clone, Debug, Default)]
pub struct ScriptBuilder(Vec<u8>);

impl ScriptBuilder {
    /// `CScript << int64`: small values use `OP_0`/`OP_1NEGATE`/`OP_1..OP_16`,
    /// anything else is pushed as a minimal script number.
    pub fn push_int(self, n: i64) -> Self {
        match n {
            0 => self.push_opcode(OP_0),
            -1 => self.push_opcode(OP_1NEGATE),
            1..=16 => self.push_opcode(OP_1 + (n as u8 - 1)),
            _ => self.push_slice(&script_num_bytes(n)),
        }
    }

    /// `CScript << CScriptNum(n)`: always a data push, even for small values.
    pub fn push_script_num(self, n: i64) -> Self {
        self.push_slice(&script_num_bytes(n))
    }

    pub fn push_slice(mut self, data: &[u8]) -> Self {
        let len = data.len();
        if len < OP_PUSHDATA1 as usize {
            self.0.push(len as u8);
        } else if len <= 0xff {
            self.0.push(OP_PUSHDATA1);
            self.0.push(len as u8);
        } else if len <= 0xffff {
            self.0.push(OP_PUSHDATA2);
            self.0.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.0.push(OP_PUSHDATA4);
            self.0.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.0.extend_from_slice(data);
        self
    }

    pub fn push_opcode(mut self, op: u8) -> Self {
        self.0.push(op);
        self
    }

    pub fn into_script(self) -> Script {
        Script(self.0)
    }
}

/// Minimal little-endian sign-magnitude encoding (`CScriptNum::serialize`).
pub fn script_num_bytes(value: i64) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let negative = value < 0;
    let mut abs = value.unsigned_abs();
    let mut out = Vec::new();
    while abs > 0 {
        out.push((abs & 0xff) as u8);
        abs >>= 8;
    }
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_genesis_marker_encoding() {
        let script = Script::builder()
            .push_int(486_604_799)
            .push_script_num(4)
            .into_script();
        assert_eq!(script.as_bytes(), &[0x04, 0xff, 0xff, 0x00, 0x1d, 0x01, 0x04]);
    }

    #[test]
    fn small_ints_become_opcodes() {
        let script = Script::builder().push_int(1).push_int(16).push_int(0).into_script();
        assert_eq!(script.as_bytes(), &[0x51, 0x60, 0x00]);
    }

    #[test]
    fn script_num_sign_handling() {
        assert_eq!(script_num_bytes(0x80), vec![0x80, 0x00]);
        assert_eq!(script_num_bytes(-1), vec![0x81]);
        assert_eq!(script_num_bytes(-0x80), vec![0x80, 0x80]);
    }

    #[test]
    fn long_push_uses_pushdata1() {
        let data = [7u8; 80];
        let script = Script::builder().push_slice(&data).into_script();
        assert_eq!(&script.as_bytes()[..2], &[OP_PUSHDATA1, 80]);
        assert_eq!(script.len(), 82);
    }

    #[test]
    fn op_return_is_unspendable() {
        assert!(Script::builder().push_opcode(OP_RETURN).into_script().is_provably_unspendable());
        assert!(!Script::new().is_provably_unspendable());
    }
}
