use std::fmt;

use serde::Serialize;

use crate::error::{ChainParamsError, QuorumError};

/// Number of DKG phases (initialization, contribution, complaining,
/// justification, commitment) that must finish before a commitment can be mined.
pub const DKG_PHASE_COUNT: u32 = 5;

/// Long-living masternode quorum types. The discriminant is the on-wire id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum LlmqType {
    /// 50 members, 30 (60%) threshold, one per hour.
    Llmq50_60 = 1,
    /// 400 members, 240 (60%) threshold, one every 12 hours.
    Llmq400_60 = 2,
    /// 400 members, 340 (85%) threshold, one every 24 hours.
    Llmq400_85 = 3,
    /// 10 members, 6 (60%) threshold; regression tests only.
    Llmq10_60 = 100,
}

impl LlmqType {
    pub const NONE: u8 = 0xff;

    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for LlmqType {
    type Error = QuorumError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(LlmqType::Llmq50_60),
            2 => Ok(LlmqType::Llmq400_60),
            3 => Ok(LlmqType::Llmq400_85),
            100 => Ok(LlmqType::Llmq10_60),
            other => Err(QuorumError::UnknownLlmqType(other)),
        }
    }
}

impl fmt::Display for LlmqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LlmqParams {
    #[serde(rename = "type")]
    pub llmq_type: LlmqType,
    pub name: &'static str,
    /// Members selected per quorum.
    pub size: u32,
    /// Valid members required for a commitment to be accepted.
    pub min_size: u32,
    /// Signature shares required to recover a quorum signature.
    pub threshold: u32,
    /// Blocks between DKG sessions.
    pub dkg_interval: u32,
    pub dkg_phase_blocks: u32,
    /// Offsets from the DKG start block in which commitments may be mined.
    pub dkg_mining_window_start: u32,
    pub dkg_mining_window_end: u32,
}

pub const LLMQ_10_60: LlmqParams = LlmqParams {
    llmq_type: LlmqType::Llmq10_60,
    name: "llmq_10",
    size: 10,
    min_size: 6,
    threshold: 6,
    dkg_interval: 24,
    dkg_phase_blocks: 2,
    dkg_mining_window_start: 10,
    dkg_mining_window_end: 18,
};

pub const LLMQ_50_60: LlmqParams = LlmqParams {
    llmq_type: LlmqType::Llmq50_60,
    name: "llmq_50_60",
    size: 50,
    min_size: 40,
    threshold: 30,
    dkg_interval: 24,
    dkg_phase_blocks: 2,
    dkg_mining_window_start: 10,
    dkg_mining_window_end: 18,
};

pub const LLMQ_400_60: LlmqParams = LlmqParams {
    llmq_type: LlmqType::Llmq400_60,
    name: "llmq_400_51",
    size: 400,
    min_size: 300,
    threshold: 240,
    dkg_interval: 24 * 12,
    dkg_phase_blocks: 4,
    dkg_mining_window_start: 20,
    dkg_mining_window_end: 28,
};

// Signals deployments and minimum protocol versions, hence the higher threshold
// and the wider mining window.
pub const LLMQ_400_85: LlmqParams = LlmqParams {
    llmq_type: LlmqType::Llmq400_85,
    name: "llmq_400_85",
    size: 400,
    min_size: 350,
    threshold: 340,
    dkg_interval: 24 * 24,
    dkg_phase_blocks: 4,
    dkg_mining_window_start: 20,
    dkg_mining_window_end: 48,
};

impl LlmqParams {
    pub fn validate(&self) -> Result<(), ChainParamsError> {
        let invalid = |reason: String| ChainParamsError::InvalidLlmqParams { name: self.name, reason };

        if self.threshold == 0 {
            return Err(invalid("threshold must be positive".into()));
        }
        if !(self.threshold <= self.min_size && self.min_size <= self.size) {
            return Err(invalid(format!(
                "expected threshold <= min_size <= size, got {} / {} / {}",
                self.threshold, self.min_size, self.size
            )));
        }
        if self.dkg_interval == 0 {
            return Err(invalid("dkg interval must be positive".into()));
        }
        if self.dkg_mining_window_start < self.dkg_phase_blocks * DKG_PHASE_COUNT {
            return Err(invalid(format!(
                "mining window starts at {} before the DKG phases finish at {}",
                self.dkg_mining_window_start,
                self.dkg_phase_blocks * DKG_PHASE_COUNT
            )));
        }
        if self.dkg_mining_window_start > self.dkg_mining_window_end
            || self.dkg_mining_window_end >= self.dkg_interval
        {
            return Err(invalid(format!(
                "mining window [{}, {}) does not fit in interval {}",
                self.dkg_mining_window_start, self.dkg_mining_window_end, self.dkg_interval
            )));
        }
        Ok(())
    }

    /// Height of the DKG session that `height` belongs to.
    pub fn quorum_start_height(&self, height: u32) -> u32 {
        height - height % self.dkg_interval
    }

    /// Whether a final commitment for this type may be mined at `height`.
    pub fn is_mining_window(&self, height: u32) -> bool {
        let offset = height % self.dkg_interval;
        offset >= self.dkg_mining_window_start && offset < self.dkg_mining_window_end
    }
}
