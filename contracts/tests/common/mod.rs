#![allow(dead_code)]

use ckb_hash::new_blake2b;
use ckb_types::{
    bytes::Bytes,
    core::{DepType, ScriptHashType, TransactionBuilder},
    packed::{Byte32, CellDep, CellInput, CellOutput, OutPoint, Script},
    prelude::*,
};
use crowdfunding_contracts::{Verifier, VerifyError};
use crowdfunding_since::Since;
use crowdfunding_utils::{
    hash32, ClaimArgs, Config, ContributionArgs, FixedRecord, Hash32, MockTransaction,
    NetworkConfig, ProjectArgs, ResolvedCell, ScriptRef, VmArgs,
};

pub const CONFIG: &str = r#"
[networks.devnet.vm]
code_hash = "0x3e9b6bead927bef62fcb56f0c79f4fbd1b739f32dd222beac10d346f2918bed7"
hash_type = "type"

[networks.devnet.project]
code_hash = "0x1111111111111111111111111111111111111111111111111111111111111111"
hash_type = "data2"

[networks.devnet.contribution]
code_hash = "0x2222222222222222222222222222222222222222222222222222222222222222"
hash_type = "data2"

[networks.devnet.claim]
code_hash = "0x3333333333333333333333333333333333333333333333333333333333333333"
hash_type = "data2"
"#;

pub const NOW: u64 = 1_660_000_000;
pub const DAY: u64 = 24 * 60 * 60;
pub const GOAL: u128 = 2000;

pub fn network() -> NetworkConfig {
    Config::from_toml(CONFIG)
        .unwrap()
        .network("devnet")
        .unwrap()
        .clone()
}

pub fn timestamp(secs: u64) -> Since {
    Since::from_timestamp(secs, true).unwrap()
}

pub fn deadline() -> Since {
    timestamp(NOW + 100 * DAY)
}

/// Since of an input before the deadline.
pub fn before() -> Since {
    timestamp(NOW)
}

/// Since of an input after the deadline.
pub fn after() -> Since {
    timestamp(NOW + 200 * DAY)
}

/// Type script of the token a typed project collects.
pub fn token_type() -> Script {
    user_lock(7)
}

/// A project collecting cells of `token_type()`.
pub fn typed_project() -> Project {
    Project::new(before()).with_args(|args| args.contribution_type = Some(lock_hash(&token_type())))
}

/// A plain user lock, not running on the crowdfunding vm.
pub fn user_lock(id: u8) -> Script {
    Script::new_builder()
        .args(Bytes::from(vec![id; 20]).pack())
        .hash_type(ScriptHashType::Data.into())
        .build()
}

pub fn lock_hash(script: &Script) -> Hash32 {
    hash32(&script.calc_script_hash())
}

pub fn vm_script(config: &NetworkConfig, script: ScriptRef, inner: Vec<u8>) -> Script {
    Script::new_builder()
        .code_hash(config.vm.code_hash.pack())
        .hash_type(ScriptHashType::Type.into())
        .args(VmArgs::new(script, inner.into()).to_bytes().pack())
        .build()
}

pub fn cell(capacity: u64, lock: Script, type_: Option<Script>) -> CellOutput {
    CellOutput::new_builder()
        .capacity(capacity.pack())
        .lock(lock)
        .type_(type_.pack())
        .build()
}

pub fn amount_data(amount: u128) -> Bytes {
    Bytes::from(amount.to_le_bytes().to_vec())
}

/// The `index`th input a `TxBuilder` creates.
pub fn cell_input(index: usize, since: Since) -> CellInput {
    let tx_hash: Byte32 = [index as u8 + 1; 32].pack();
    CellInput::new(OutPoint::new(tx_hash, 0), since.as_u64())
}

pub fn type_id(first_input: &CellInput, output_index: u64) -> Hash32 {
    let mut blake2b = new_blake2b();
    blake2b.update(first_input.as_slice());
    blake2b.update(&output_index.to_le_bytes());
    let mut ret = [0u8; 32];
    blake2b.finalize(&mut ret);
    ret
}

/// Everything needed to build the cells of one crowdfunding project.
pub struct Project {
    pub config: NetworkConfig,
    pub creator: Script,
    pub args: ProjectArgs,
}

impl Project {
    /// A project created by the first input of a transaction with input
    /// since `since`, at output 0.
    pub fn new(since: Since) -> Self {
        let config = network();
        let creator = user_lock(1);
        let args = ProjectArgs {
            type_id: type_id(&cell_input(0, since), 0),
            creator_lock_script_hash: lock_hash(&creator),
            goal_amount: GOAL,
            deadline: deadline(),
            contribution_script: config.contribution.script_ref(),
            claim_script: config.claim.script_ref(),
            contribution_type: None,
        };
        Project {
            config,
            creator,
            args,
        }
    }

    pub fn with_args<F: FnOnce(&mut ProjectArgs)>(mut self, f: F) -> Self {
        f(&mut self.args);
        self
    }

    pub fn script(&self) -> Script {
        vm_script(
            &self.config,
            self.config.project.script_ref(),
            self.args.to_bytes(),
        )
    }

    pub fn hash(&self) -> Hash32 {
        lock_hash(&self.script())
    }

    pub fn cell(&self) -> CellOutput {
        cell(500, self.creator.clone(), Some(self.script()))
    }

    pub fn contribution_lock(&self) -> Script {
        let args = ContributionArgs {
            project_script_hash: self.hash(),
            deadline: self.args.deadline,
            claim_script: self.args.claim_script,
        };
        vm_script(
            &self.config,
            self.args.contribution_script,
            args.to_bytes(),
        )
    }

    pub fn contribution(&self, capacity: u64) -> CellOutput {
        cell(capacity, self.contribution_lock(), None)
    }

    pub fn typed_contribution(&self, capacity: u64, type_: Option<Script>) -> CellOutput {
        cell(capacity, self.contribution_lock(), type_)
    }

    pub fn claim_type(&self, backer: &Script) -> Script {
        let args = ClaimArgs {
            project_script_hash: self.hash(),
            deadline: self.args.deadline,
            backer_lock_script: lock_hash(backer),
        };
        vm_script(&self.config, self.args.claim_script, args.to_bytes())
    }

    pub fn claim(&self, capacity: u64, backer: &Script) -> CellOutput {
        cell(capacity, backer.clone(), Some(self.claim_type(backer)))
    }

    pub fn verify(&self, mock: &MockTransaction) -> Result<(), VerifyError> {
        Verifier::new(&self.config).verify(mock)
    }
}

/// Builds a resolved transaction. Every input shares one since.
pub struct TxBuilder {
    since: Since,
    inputs: Vec<(CellOutput, Bytes)>,
    cell_deps: Vec<(CellOutput, Bytes)>,
    outputs: Vec<(CellOutput, Bytes)>,
}

impl TxBuilder {
    pub fn new(since: Since) -> Self {
        TxBuilder {
            since,
            inputs: vec![],
            cell_deps: vec![],
            outputs: vec![],
        }
    }

    pub fn input(mut self, output: CellOutput) -> Self {
        self.inputs.push((output, Bytes::new()));
        self
    }

    pub fn input_with_data(mut self, output: CellOutput, data: Bytes) -> Self {
        self.inputs.push((output, data));
        self
    }

    pub fn cell_dep(mut self, output: CellOutput) -> Self {
        self.cell_deps.push((output, Bytes::new()));
        self
    }

    pub fn output(mut self, output: CellOutput) -> Self {
        self.outputs.push((output, Bytes::new()));
        self
    }

    pub fn output_with_data(mut self, output: CellOutput, data: Bytes) -> Self {
        self.outputs.push((output, data));
        self
    }

    pub fn build(self) -> MockTransaction {
        let since = self.since;
        let inputs: Vec<CellInput> = (0..self.inputs.len())
            .map(|i| cell_input(i, since))
            .collect();
        let cell_deps: Vec<CellDep> = (0..self.cell_deps.len())
            .map(|i| {
                CellDep::new_builder()
                    .out_point(OutPoint::new([0xddu8; 32].pack(), i as u32))
                    .dep_type(DepType::Code.into())
                    .build()
            })
            .collect();
        let tx = TransactionBuilder::default()
            .inputs(inputs)
            .cell_deps(cell_deps)
            .outputs(self.outputs.iter().map(|(output, _)| output.clone()))
            .outputs_data(self.outputs.iter().map(|(_, data)| data.pack()))
            .build();

        let resolve = |cells: Vec<(CellOutput, Bytes)>| -> Vec<ResolvedCell> {
            cells
                .into_iter()
                .map(|(output, data)| ResolvedCell::new(output, data))
                .collect()
        };
        MockTransaction::new(tx, resolve(self.inputs), resolve(self.cell_deps)).unwrap()
    }
}
