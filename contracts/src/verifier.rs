//! Runs every crowdfunding script group of a transaction.
//!
//! Groups are independent of each other, so each one runs on its own scoped
//! thread; the verdict is reported in group order regardless of which thread
//! finishes first.

use std::panic;
use std::thread;

use ckb_logger::{debug, error, info};
use ckb_types::packed::Byte32;
use crowdfunding_utils::{
    CellLoader, Error as ScriptError, MockTransaction, NetworkConfig, Result, ScriptContext,
    ScriptGroup, ScriptKind,
};
use thiserror::Error;

use crate::{claim, contribution, project};

#[derive(Debug, Error)]
#[error("script group #{group_index} ({script_hash}) rejected: {error}")]
pub struct VerifyError {
    pub group_index: usize,
    pub script_hash: Byte32,
    /// `None` when the group's vm envelope itself is malformed.
    pub kind: Option<ScriptKind>,
    #[source]
    pub error: ScriptError,
}

pub fn run_script<L: CellLoader + ?Sized>(
    kind: ScriptKind,
    loader: &L,
    config: &NetworkConfig,
) -> Result<()> {
    match kind {
        ScriptKind::Project => project::main(loader, config),
        ScriptKind::Contribution => contribution::main(loader, config),
        ScriptKind::Claim => claim::main(loader, config),
    }
}

pub struct Verifier<'a> {
    config: &'a NetworkConfig,
}

impl<'a> Verifier<'a> {
    pub fn new(config: &'a NetworkConfig) -> Self {
        Verifier { config }
    }

    /// The crowdfunding groups of `mock`, with the script each one runs, or
    /// the reason the vm rejects the group's envelope. Groups on other code,
    /// or on an unknown inner script, are left to the chain.
    pub fn groups(
        &self,
        mock: &MockTransaction,
    ) -> Vec<(usize, ScriptGroup, Result<ScriptKind>)> {
        mock.script_groups()
            .into_iter()
            .enumerate()
            .filter_map(|(index, group)| {
                let vm = match self.config.vm_envelope(&group.script) {
                    Some(Ok(vm)) => vm,
                    Some(Err(err)) => return Some((index, group, Err(err.into()))),
                    None => {
                        debug!("group #{} does not run on the crowdfunding vm", index);
                        return None;
                    }
                };
                match self.config.kind_of(&vm.script) {
                    Some(kind) => Some((index, group, Ok(kind))),
                    None => {
                        debug!("group #{} runs unknown script {:x?}", index, vm.script);
                        None
                    }
                }
            })
            .collect()
    }

    pub fn verify(&self, mock: &MockTransaction) -> std::result::Result<(), VerifyError> {
        let groups = self.groups(mock);
        let config = self.config;

        let results: Vec<Result<()>> = thread::scope(|scope| {
            let handles: Vec<_> = groups
                .iter()
                .map(|(_, group, kind)| {
                    let context: ScriptContext = mock.context(group);
                    let kind = kind.clone();
                    scope.spawn(move || kind.and_then(|kind| run_script(kind, &context, config)))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|err| panic::resume_unwind(err)))
                .collect()
        });

        for ((group_index, group, kind), result) in groups.iter().zip(results) {
            if let Err(err) = result {
                let err = VerifyError {
                    group_index: *group_index,
                    script_hash: group.script.calc_script_hash(),
                    kind: kind.as_ref().ok().copied(),
                    error: err,
                };
                match err.kind {
                    Some(kind) => error!("{} {}, {:?}", kind, err, err.error.category()),
                    None => error!("{}, {:?}", err, err.error.category()),
                }
                return Err(err);
            }
        }

        info!(
            "transaction {} passed {} crowdfunding groups",
            mock.tx.hash(),
            groups.len()
        );
        Ok(())
    }
}
