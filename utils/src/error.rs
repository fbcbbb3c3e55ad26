//! Reject reasons shared by the crowdfunding scripts.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    #[error("Args length is wrong and cannot be parsed. need ({expected}), actual ({actual})")]
    Length { expected: usize, actual: usize },

    #[error("Script args is too short for a vm envelope: {actual} bytes")]
    EnvelopeTooShort { actual: usize },
}

/// The four classes of reject reason. The verdict itself is binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Structural,
    Consistency,
    Economic,
    Temporal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error("Not found Project Cell")]
    ProjectNotFound,

    #[error("Script group has no cell in inputs nor outputs")]
    UnknownScriptStatus,

    #[error("Transaction has no input #0 to read since from")]
    MissingInput,

    #[error("Cell data is not a 16 byte amount, length: {0}")]
    InvalidCellData(usize),

    #[error("Type id args missing at offset {0}")]
    TypeIdArgs(usize),

    #[error("Type id group may only hold one input and one output")]
    TypeIdDuplicated,

    #[error("Type id does not match the first input")]
    TypeIdMismatch,

    #[error("deadline and since types do not match")]
    SinceIncomparable,

    #[error("Project deadline is not this")]
    DeadlineMismatch,

    #[error("This Script is not in ProjectCell")]
    ScriptNotInProject,

    #[error("Contribution Cell Type error, index: {0}")]
    ContributionType(usize),

    #[error("Inputs Type Script error")]
    InputType,

    #[error("Output Type Script error")]
    OutputType,

    #[error("Args goalAmount is 0")]
    ZeroGoal,

    #[error("Not enough funds raised, need: {need}, actual: {actual}")]
    InsufficientFunds { need: u128, actual: u128 },

    #[error("After success, the funds need to be transferred to the designated account")]
    FundsNotTransferred,

    #[error("After expiration, only the Project Cell can be destroyed")]
    ProjectRecreated,

    #[error("Contribution must be destroyed after success")]
    ContributionNotDestroyed,

    #[error("Merge's output is allowed to exist only once")]
    MergeOutputDuplicated,

    #[error("The total input capacity ({input}) is not equal to the output capacity ({output})")]
    MergeCapacity { input: u128, output: u128 },

    #[error("There can contribution (same Project) only be one tx")]
    ContributionDuplicated,

    #[error("Only one Claim cell can be created in one tx")]
    ClaimDuplicated,

    #[error("Contribution capacity ({capacity:?}) not equal to Claim cell data ({amount})")]
    ClaimAmount { capacity: Option<u64>, amount: u128 },

    #[error("Insufficient refund amount, need: {need}, actual: {actual}")]
    InsufficientRefund { need: u128, actual: u128 },

    #[error("Backer not found in outputs")]
    BackerNotFound,

    #[error("The actual number of refunds was too small. need: {need}, actual: {actual}")]
    RefundTooSmall { need: u128, actual: u128 },

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Project does not allow transactions")]
    ProjectTransaction,

    #[error("After Deadline, it can only be destroyed")]
    ProjectExpired,

    #[error("Claim cannot be used for transactions")]
    ClaimTransaction,

    #[error("Claims cannot be created independently after they expire")]
    ClaimExpired,
}

impl Error {
    pub fn category(&self) -> Category {
        use Error::*;
        match self {
            Args(_) | ProjectNotFound | UnknownScriptStatus | MissingInput | InvalidCellData(_)
            | TypeIdArgs(_) | TypeIdDuplicated | TypeIdMismatch => Category::Structural,
            SinceIncomparable | DeadlineMismatch | ScriptNotInProject | ContributionType(_)
            | InputType | OutputType | ContributionDuplicated | ClaimDuplicated => {
                Category::Consistency
            }
            ZeroGoal
            | InsufficientFunds { .. }
            | FundsNotTransferred
            | ContributionNotDestroyed
            | MergeOutputDuplicated
            | MergeCapacity { .. }
            | ClaimAmount { .. }
            | InsufficientRefund { .. }
            | BackerNotFound
            | RefundTooSmall { .. }
            | AmountOverflow => Category::Economic,
            ProjectRecreated | ProjectTransaction | ProjectExpired | ClaimTransaction
            | ClaimExpired => Category::Temporal,
        }
    }

    /// Script exit code. Every reject reason maps to the same code.
    pub fn exit_code(&self) -> i8 {
        -1
    }
}

pub type Result<T> = std::result::Result<T, Error>;
