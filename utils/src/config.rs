//! Script identities per network, loaded from a TOML file:
//!
//! ```toml
//! [networks.devnet.vm]
//! code_hash = "0x..."
//! hash_type = "type"
//!
//! [networks.devnet.project]
//! code_hash = "0x..."
//! hash_type = "data2"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use ckb_types::{packed::Script, prelude::*, H256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::args::{ScriptRef, VmArgs};
use crate::error::ArgsError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("network `{0}` is not configured")]
    UnknownNetwork(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    Data,
    Type,
    Data1,
    Data2,
}

impl HashType {
    pub fn as_u8(self) -> u8 {
        match self {
            HashType::Data => 0,
            HashType::Type => 1,
            HashType::Data1 => 2,
            HashType::Data2 => 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptId {
    pub code_hash: H256,
    pub hash_type: HashType,
}

impl ScriptId {
    pub fn script_ref(&self) -> ScriptRef {
        ScriptRef::new(self.code_hash.0, self.hash_type.as_u8())
    }

    pub fn matches(&self, script: &Script) -> bool {
        script.code_hash().as_slice() == self.code_hash.as_bytes()
            && u8::from(script.hash_type()) == self.hash_type.as_u8()
    }
}

/// Identities of the crowdfunding scripts on one network.
///
/// `vm` is the outer script every crowdfunding cell is locked or typed by;
/// the other three are the references its envelope points at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub vm: ScriptId,
    pub project: ScriptId,
    pub contribution: ScriptId,
    pub claim: ScriptId,
}

impl NetworkConfig {
    /// `None` when `script` does not run on the configured vm, otherwise
    /// its parsed envelope. The vm aborts on an envelope that does not parse.
    pub fn vm_envelope(&self, script: &Script) -> Option<Result<VmArgs, ArgsError>> {
        if !self.vm.matches(script) {
            return None;
        }
        Some(VmArgs::parse(&script.args().raw_data()))
    }

    /// The envelope of `script`, if it runs on the configured vm and parses.
    pub fn vm_args(&self, script: &Script) -> Option<VmArgs> {
        self.vm_envelope(script)?.ok()
    }

    pub fn kind_of(&self, script_ref: &ScriptRef) -> Option<ScriptKind> {
        if *script_ref == self.project.script_ref() {
            Some(ScriptKind::Project)
        } else if *script_ref == self.contribution.script_ref() {
            Some(ScriptKind::Contribution)
        } else if *script_ref == self.claim.script_ref() {
            Some(ScriptKind::Claim)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptKind {
    Project,
    Contribution,
    Claim,
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ScriptKind::Project => "project",
            ScriptKind::Contribution => "contribution",
            ScriptKind::Claim => "claim",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ConfigError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))
    }
}
