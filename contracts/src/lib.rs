//! The three crowdfunding scripts and the verifier that runs them over a
//! transaction.
//!
//! * `project`: a type script guarded by type id. Created with a goal and a
//!   deadline, destroyed either by sweeping the raised funds to the creator
//!   before the deadline, or plainly after it.
//! * `contribution`: the lock of every donated cell. Can be merged while the
//!   project is alive and must be consumed when the project succeeds.
//! * `claim`: a type script minted 1:1 with each contribution, redeemable for
//!   a refund once the deadline passed.

use ckb_types::prelude::*;
use crowdfunding_since::Since;
use crowdfunding_utils::{
    option_bytes_eq, CellLoader, ContributionArgs, Error, Hash32, NetworkConfig, Result,
    ScriptRef, Source,
};

pub mod claim;
pub mod contribution;
pub mod project;
pub mod verifier;

pub use verifier::{Verifier, VerifyError};

/// Matches contribution cells of one project.
pub(crate) struct ContributionFilter<'a> {
    pub config: &'a NetworkConfig,
    pub script: ScriptRef,
    pub project_hash: Hash32,
    pub deadline: Since,
    pub contribution_type: Option<Hash32>,
}

impl<'a> ContributionFilter<'a> {
    /// `None` past the end of `source`, `Some(Ok(None))` for a cell that is not
    /// a contribution of this project, and an error for a contribution whose
    /// args or type script are wrong.
    pub fn capacity<L: CellLoader + ?Sized>(
        &self,
        loader: &L,
        index: usize,
        source: Source,
    ) -> Option<Result<Option<u64>>> {
        let lock = loader.load_cell_lock(index, source)?;
        let vm = match self.config.vm_args(&lock) {
            Some(vm) if vm.script == self.script => vm,
            _ => return Some(Ok(None)),
        };
        let args: ContributionArgs = match vm.inner() {
            Ok(args) => args,
            Err(err) => return Some(Err(err.into())),
        };
        if args.project_script_hash != self.project_hash || args.deadline != self.deadline {
            return Some(Ok(None));
        }

        let type_hash = loader.load_cell_type_hash(index, source)?;
        if !option_bytes_eq(
            type_hash.as_ref().map(|hash| hash.as_slice()),
            self.contribution_type.as_ref().map(|hash| &hash[..]),
        ) {
            return Some(Err(Error::ContributionType(index)));
        }
        loader
            .load_cell_capacity(index, source)
            .map(|capacity| Ok(Some(capacity)))
    }
}
