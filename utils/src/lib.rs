use std::cmp::Ordering;

use ckb_hash::new_blake2b;
use ckb_logger::debug;
use ckb_types::prelude::*;
use crowdfunding_since::Since;

pub mod args;
pub mod config;
pub mod context;
pub mod error;
pub mod query;

pub use args::{
    amount_from_data, ClaimArgs, ContributionArgs, FixedRecord, Hash32, ProjectArgs, ScriptRef,
    VmArgs,
};
pub use config::{Config, ConfigError, HashType, NetworkConfig, ScriptId, ScriptKind};
pub use context::{
    MockTransaction, MockTxError, ResolvedCell, ScriptContext, ScriptGroup, ScriptGroupType,
};
pub use error::{ArgsError, Category, Error, Result};
pub use query::{hash32, option_bytes_eq, CellLoader, QueryIter, Source};

/// Offset of the type id inside a vm script's args, right after the envelope header.
pub const TYPE_ID_OFFSET: usize = VmArgs::HEADER_LEN;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptStatus {
    /// Only in outputs.
    Created,
    /// In inputs and outputs.
    Transaction,
    /// Only in inputs.
    Destroyed,
}

pub fn get_script_status<L: CellLoader + ?Sized>(loader: &L) -> Result<ScriptStatus> {
    let input = loader.load_cell(0, Source::GroupInput).is_some();
    let output = loader.load_cell(0, Source::GroupOutput).is_some();

    match (input, output) {
        (true, true) => Ok(ScriptStatus::Transaction),
        (false, true) => Ok(ScriptStatus::Created),
        (true, false) => Ok(ScriptStatus::Destroyed),
        (false, false) => Err(Error::UnknownScriptStatus),
    }
}

/// Returns `false` once the deadline has been reached by the since of input #0.
pub fn check_deadline<L: CellLoader + ?Sized>(loader: &L, deadline: &Since) -> Result<bool> {
    let since = loader
        .load_input_since(0, Source::Input)
        .map(Since::new)
        .ok_or(Error::MissingInput)?;
    match deadline.partial_cmp(&since) {
        Some(ordering) => Ok(ordering == Ordering::Greater),
        None => {
            debug!("deadline {} is incomparable with since {}", deadline, since);
            Err(Error::SinceIncomparable)
        }
    }
}

/// Finds the cell in `source` whose type script hash is `script_hash` and
/// parses its project args.
pub fn get_project_args<L: CellLoader + ?Sized>(
    loader: &L,
    script_hash: &Hash32,
    source: Source,
) -> Result<Option<ProjectArgs>> {
    let found = QueryIter::new(loader, |l, i, s| l.load_cell_type(i, s), source)
        .flatten()
        .find(|script| script.calc_script_hash().as_slice() == script_hash);

    match found {
        Some(script) => {
            let vm = VmArgs::parse(&script.args().raw_data())?;
            Ok(Some(vm.inner()?))
        }
        None => Ok(None),
    }
}

/// Type id uniqueness: at most one cell of this type in inputs and outputs,
/// and a freshly created one must carry `blake2b(first input || output index)`
/// at `offset` of its args.
pub fn check_type_id<L: CellLoader + ?Sized>(loader: &L, offset: usize) -> Result<()> {
    let script = loader.load_script();
    let args = script.args().raw_data();
    if args.len() < offset + 32 {
        return Err(Error::TypeIdArgs(offset));
    }
    let type_id = &args[offset..offset + 32];

    if loader.load_cell(1, Source::GroupInput).is_some()
        || loader.load_cell(1, Source::GroupOutput).is_some()
    {
        return Err(Error::TypeIdDuplicated);
    }

    if loader.load_cell(0, Source::GroupInput).is_some() {
        return Ok(());
    }

    let first_input = loader
        .load_input(0, Source::Input)
        .ok_or(Error::MissingInput)?;
    let script_hash = script.calc_script_hash();
    let output_index = QueryIter::new(loader, |l, i, s| l.load_cell_type_hash(i, s), Source::Output)
        .position(|hash| hash.as_ref() == Some(&script_hash))
        .ok_or(Error::TypeIdMismatch)?;

    let mut blake2b = new_blake2b();
    blake2b.update(first_input.as_slice());
    blake2b.update(&(output_index as u64).to_le_bytes());
    let mut expected = [0u8; 32];
    blake2b.finalize(&mut expected);

    if type_id != expected {
        return Err(Error::TypeIdMismatch);
    }
    Ok(())
}
