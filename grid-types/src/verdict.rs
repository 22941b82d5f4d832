use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Final ruling for one submission. A player receives exactly one of
/// these per submit-word event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum WordVerdict {
    /// Valid and scored at full value.
    Accepted,
    /// Valid but claimed by more than one player this round; scored at
    /// reduced value for every claimant.
    Shared,
    /// Already submitted by this player this round; scores zero.
    Duplicate,
    /// Structurally illegal or failed arbitration.
    Rejected { reason: RejectReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RejectReason {
    TooShort,
    NotOnGrid,
    NotAWord,
    /// The external judge said valid but below the confidence gate.
    LowConfidence { confidence: u8 },
    /// Arbitration could not complete before the deadline.
    ArbitrationUnavailable,
}

/// What the submitter gets back: the verdict plus the resulting score
/// delta and server-computed combo level.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmitOutcome {
    pub word: String,
    pub verdict: WordVerdict,
    pub score: i32,
    pub combo_level: u32,
}

/// One entry in a player's per-round word list.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WordRecord {
    pub word: String,
    pub verdict: WordVerdict,
    pub score: i32,
}

/// Response contract for the probabilistic external judge.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JudgeDecision {
    pub valid: bool,
    pub reason: String,
    pub confidence: u8,
}
