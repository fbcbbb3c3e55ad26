//! A candidate transaction with every input and cell dep resolved, and the
//! per script group view the scripts run against.

use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use ckb_jsonrpc_types as json;
use ckb_types::{
    bytes::Bytes,
    core::TransactionView,
    packed::{self, Byte32, CellInput, CellOutput, Script},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::{CellLoader, Source};

#[derive(Debug, Error)]
pub enum MockTxError {
    #[error("failed to read mock transaction {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse mock transaction: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transaction has {tx} {what} but {resolved} were resolved")]
    Unresolved {
        what: &'static str,
        tx: usize,
        resolved: usize,
    },
}

/// A resolved cell: its output and data.
#[derive(Clone, Debug)]
pub struct ResolvedCell {
    pub output: CellOutput,
    pub data: Bytes,
}

impl ResolvedCell {
    pub fn new(output: CellOutput, data: Bytes) -> Self {
        ResolvedCell { output, data }
    }
}

#[derive(Clone, Debug)]
pub struct MockTransaction {
    pub tx: TransactionView,
    pub inputs: Vec<ResolvedCell>,
    pub cell_deps: Vec<ResolvedCell>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptGroupType {
    Lock,
    Type,
}

/// All cells in a transaction sharing one script.
#[derive(Clone, Debug)]
pub struct ScriptGroup {
    pub script: Script,
    pub group_type: ScriptGroupType,
    pub input_indices: Vec<usize>,
    pub output_indices: Vec<usize>,
}

impl ScriptGroup {
    fn new(script: Script, group_type: ScriptGroupType) -> Self {
        ScriptGroup {
            script,
            group_type,
            input_indices: vec![],
            output_indices: vec![],
        }
    }
}

impl MockTransaction {
    pub fn new(
        tx: TransactionView,
        inputs: Vec<ResolvedCell>,
        cell_deps: Vec<ResolvedCell>,
    ) -> Result<Self, MockTxError> {
        if tx.inputs().len() != inputs.len() {
            return Err(MockTxError::Unresolved {
                what: "inputs",
                tx: tx.inputs().len(),
                resolved: inputs.len(),
            });
        }
        if tx.cell_deps().len() != cell_deps.len() {
            return Err(MockTxError::Unresolved {
                what: "cell deps",
                tx: tx.cell_deps().len(),
                resolved: cell_deps.len(),
            });
        }
        Ok(MockTransaction {
            tx,
            inputs,
            cell_deps,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MockTxError> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|source| MockTxError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, MockTxError> {
        let repr: ReprMockTransaction = serde_json::from_str(content)?;
        repr.try_into()
    }

    /// Groups scripts the way the chain does: lock groups from input locks,
    /// type groups from input and output types. Groups keep the order in
    /// which their script first appears.
    pub fn script_groups(&self) -> Vec<ScriptGroup> {
        let mut groups: Vec<ScriptGroup> = vec![];
        let mut positions: HashMap<(ScriptGroupType, Byte32), usize> = HashMap::new();

        let mut group_of = |script: Script, group_type: ScriptGroupType| -> usize {
            let key = (group_type, script.calc_script_hash());
            *positions.entry(key).or_insert_with(|| {
                groups.push(ScriptGroup::new(script, group_type));
                groups.len() - 1
            })
        };

        let mut input_slots = vec![];
        for (i, cell) in self.inputs.iter().enumerate() {
            input_slots.push((group_of(cell.output.lock(), ScriptGroupType::Lock), i));
            if let Some(type_) = cell.output.type_().to_opt() {
                input_slots.push((group_of(type_, ScriptGroupType::Type), i));
            }
        }
        let mut output_slots = vec![];
        for (i, output) in self.tx.outputs().into_iter().enumerate() {
            if let Some(type_) = output.type_().to_opt() {
                output_slots.push((group_of(type_, ScriptGroupType::Type), i));
            }
        }

        for (group, i) in input_slots {
            groups[group].input_indices.push(i);
        }
        for (group, i) in output_slots {
            groups[group].output_indices.push(i);
        }
        groups
    }

    pub fn context<'a>(&'a self, group: &'a ScriptGroup) -> ScriptContext<'a> {
        ScriptContext { tx: self, group }
    }
}

/// One script group's view of a transaction.
#[derive(Clone, Copy)]
pub struct ScriptContext<'a> {
    tx: &'a MockTransaction,
    group: &'a ScriptGroup,
}

impl<'a> ScriptContext<'a> {
    fn resolve(&self, index: usize, source: Source) -> Option<(usize, Source)> {
        match source {
            Source::GroupInput => self
                .group
                .input_indices
                .get(index)
                .map(|i| (*i, Source::Input)),
            Source::GroupOutput => self
                .group
                .output_indices
                .get(index)
                .map(|i| (*i, Source::Output)),
            _ => Some((index, source)),
        }
    }
}

impl<'a> CellLoader for ScriptContext<'a> {
    fn load_script(&self) -> Script {
        self.group.script.clone()
    }

    fn load_cell(&self, index: usize, source: Source) -> Option<CellOutput> {
        match self.resolve(index, source)? {
            (i, Source::Input) => self.tx.inputs.get(i).map(|cell| cell.output.clone()),
            (i, Source::CellDep) => self.tx.cell_deps.get(i).map(|cell| cell.output.clone()),
            (i, _) => self.tx.tx.output(i),
        }
    }

    fn load_cell_data(&self, index: usize, source: Source) -> Option<Bytes> {
        match self.resolve(index, source)? {
            (i, Source::Input) => self.tx.inputs.get(i).map(|cell| cell.data.clone()),
            (i, Source::CellDep) => self.tx.cell_deps.get(i).map(|cell| cell.data.clone()),
            (i, _) => self
                .tx
                .tx
                .outputs_data()
                .get(i)
                .map(|data| data.raw_data()),
        }
    }

    fn load_input(&self, index: usize, source: Source) -> Option<CellInput> {
        match self.resolve(index, source)? {
            (i, Source::Input) => self.tx.tx.inputs().get(i),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReprMockInput {
    pub input: json::CellInput,
    pub output: json::CellOutput,
    pub data: json::JsonBytes,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReprMockCellDep {
    pub cell_dep: json::CellDep,
    pub output: json::CellOutput,
    pub data: json::JsonBytes,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReprMockInfo {
    pub inputs: Vec<ReprMockInput>,
    pub cell_deps: Vec<ReprMockCellDep>,
}

/// JSON form of a mock transaction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReprMockTransaction {
    pub mock_info: ReprMockInfo,
    pub tx: json::Transaction,
}

impl TryFrom<ReprMockTransaction> for MockTransaction {
    type Error = MockTxError;

    fn try_from(repr: ReprMockTransaction) -> Result<Self, Self::Error> {
        let tx = packed::Transaction::from(repr.tx).into_view();
        let inputs = repr
            .mock_info
            .inputs
            .into_iter()
            .map(|input| ResolvedCell::new(input.output.into(), input.data.into_bytes()))
            .collect();
        let cell_deps = repr
            .mock_info
            .cell_deps
            .into_iter()
            .map(|dep| ResolvedCell::new(dep.output.into(), dep.data.into_bytes()))
            .collect();
        MockTransaction::new(tx, inputs, cell_deps)
    }
}

impl From<&MockTransaction> for ReprMockTransaction {
    fn from(mock: &MockTransaction) -> Self {
        let inputs = mock
            .tx
            .inputs()
            .into_iter()
            .zip(mock.inputs.iter())
            .map(|(input, cell)| ReprMockInput {
                input: input.into(),
                output: cell.output.clone().into(),
                data: json::JsonBytes::from_bytes(cell.data.clone()),
            })
            .collect();
        let cell_deps = mock
            .tx
            .cell_deps()
            .into_iter()
            .zip(mock.cell_deps.iter())
            .map(|(cell_dep, cell)| ReprMockCellDep {
                cell_dep: cell_dep.into(),
                output: cell.output.clone().into(),
                data: json::JsonBytes::from_bytes(cell.data.clone()),
            })
            .collect();
        ReprMockTransaction {
            mock_info: ReprMockInfo { inputs, cell_deps },
            tx: mock.tx.data().into(),
        }
    }
}
