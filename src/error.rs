//! The two fallible boundaries: construction (`ProgramError`) and
//! evaluation (`TickError`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("rule head {0} is not range restricted")]
    RuleNotRangeRestricted(String),

    #[error("unsupported rule head: {0}")]
    UnsupportedRuleHead(String),

    #[error("START-annotated rule has a non-empty body: {0}")]
    StartRuleHasBody(String),

    #[error("program is not stratifiable: negation cycle touching {0:?}")]
    UnstratifiableProgram(Vec<String>),

    #[error("malformed rule: {0}")]
    BadRuleShape(String),
}

#[derive(Debug, Error)]
pub enum TickError {
    #[error("call '{symbol}' failed: {message}")]
    CallFailed { symbol: String, message: String },

    #[error("oracle '{symbol}' failed: {message}")]
    OracleFailed { symbol: String, message: String },
}
