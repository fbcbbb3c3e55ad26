//! Fixed layout script args.
//!
//! Every crowdfunding script carries the same outer envelope in its args:
//!
//! ```text
//! flags(2) | script code_hash(32) | script hash_type(1) | inner args
//! ```
//!
//! The inner args are one of the fixed length records below. Field order is
//! consensus relevant: changing it changes every script hash.

use ckb_types::bytes::Bytes;
use crowdfunding_since::Since;

use crate::error::ArgsError;

pub type Hash32 = [u8; 32];

pub const HASH_LEN: usize = 32;
pub const SCRIPT_REF_LEN: usize = 33;

/// A fixed length binary record.
pub trait FixedRecord: Sized {
    const LEN: usize;

    /// Parses exactly `LEN` bytes; any other length is an error.
    fn parse(bytes: &[u8]) -> Result<Self, ArgsError>;

    fn to_bytes(&self) -> Vec<u8>;
}

fn check_len(bytes: &[u8], expected: usize) -> Result<(), ArgsError> {
    if bytes.len() != expected {
        return Err(ArgsError::Length {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

// Callers check the total length first, a short read here is unreachable
// but still reported instead of panicking.
fn take<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8], ArgsError> {
    if input.len() < n {
        return Err(ArgsError::Length {
            expected: n,
            actual: input.len(),
        });
    }
    let (a, b) = input.split_at(n);
    *input = b;
    Ok(a)
}

fn read_32(input: &mut &[u8]) -> Result<Hash32, ArgsError> {
    let b = take(input, HASH_LEN)?;
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(b);
    Ok(out)
}

fn read_since(input: &mut &[u8]) -> Result<Since, ArgsError> {
    let b = take(input, 8)?;
    let mut out = [0u8; 8];
    out.copy_from_slice(b);
    Ok(Since::from_le_bytes(out))
}

fn read_u128_le(input: &mut &[u8]) -> Result<u128, ArgsError> {
    let b = take(input, 16)?;
    let mut out = [0u8; 16];
    out.copy_from_slice(b);
    Ok(u128::from_le_bytes(out))
}

/// Reads a nullable hash, all zero bytes meaning "absent".
fn read_option_32(input: &mut &[u8]) -> Result<Option<Hash32>, ArgsError> {
    let hash = read_32(input)?;
    Ok(if hash == [0u8; HASH_LEN] {
        None
    } else {
        Some(hash)
    })
}

fn write_option_32(out: &mut Vec<u8>, v: &Option<Hash32>) {
    out.extend_from_slice(v.as_ref().unwrap_or(&[0u8; HASH_LEN]));
}

/// A script identity: code hash plus hash type byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScriptRef {
    pub code_hash: Hash32,
    pub hash_type: u8,
}

impl ScriptRef {
    pub fn new(code_hash: Hash32, hash_type: u8) -> Self {
        Self {
            code_hash,
            hash_type,
        }
    }

    fn read(input: &mut &[u8]) -> Result<Self, ArgsError> {
        let code_hash = read_32(input)?;
        let hash_type = take(input, 1)?[0];
        Ok(Self {
            code_hash,
            hash_type,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.code_hash);
        out.push(self.hash_type);
    }
}

impl FixedRecord for ScriptRef {
    const LEN: usize = SCRIPT_REF_LEN;

    fn parse(bytes: &[u8]) -> Result<Self, ArgsError> {
        check_len(bytes, Self::LEN)?;
        let mut input = bytes;
        Self::read(&mut input)
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        self.write(&mut out);
        out
    }
}

/// The outer envelope shared by every crowdfunding script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmArgs {
    pub flags: [u8; 2],
    pub script: ScriptRef,
    pub args: Bytes,
}

impl VmArgs {
    pub const HEADER_LEN: usize = 2 + SCRIPT_REF_LEN;

    pub fn new(script: ScriptRef, args: Bytes) -> Self {
        Self {
            flags: [0u8; 2],
            script,
            args,
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, ArgsError> {
        if bytes.len() < Self::HEADER_LEN {
            return Err(ArgsError::EnvelopeTooShort {
                actual: bytes.len(),
            });
        }
        let mut input = bytes;
        let flags = take(&mut input, 2)?;
        let script = ScriptRef::read(&mut input)?;
        Ok(Self {
            flags: [flags[0], flags[1]],
            script,
            args: Bytes::copy_from_slice(input),
        })
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(Self::HEADER_LEN + self.args.len());
        out.extend_from_slice(&self.flags);
        self.script.write(&mut out);
        out.extend_from_slice(&self.args);
        out.into()
    }

    /// Parses the inner args as record `R`.
    pub fn inner<R: FixedRecord>(&self) -> Result<R, ArgsError> {
        R::parse(&self.args)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectArgs {
    pub type_id: Hash32,
    pub creator_lock_script_hash: Hash32,
    pub goal_amount: u128,
    pub deadline: Since,
    pub contribution_script: ScriptRef,
    pub claim_script: ScriptRef,
    /// Type script hash every contribution cell must carry, `None` for no type.
    pub contribution_type: Option<Hash32>,
}

impl FixedRecord for ProjectArgs {
    const LEN: usize = HASH_LEN + HASH_LEN + 16 + 8 + SCRIPT_REF_LEN + SCRIPT_REF_LEN + HASH_LEN;

    fn parse(bytes: &[u8]) -> Result<Self, ArgsError> {
        check_len(bytes, Self::LEN)?;
        let mut input = bytes;
        Ok(Self {
            type_id: read_32(&mut input)?,
            creator_lock_script_hash: read_32(&mut input)?,
            goal_amount: read_u128_le(&mut input)?,
            deadline: read_since(&mut input)?,
            contribution_script: ScriptRef::read(&mut input)?,
            claim_script: ScriptRef::read(&mut input)?,
            contribution_type: read_option_32(&mut input)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&self.type_id);
        out.extend_from_slice(&self.creator_lock_script_hash);
        out.extend_from_slice(&self.goal_amount.to_le_bytes());
        out.extend_from_slice(&self.deadline.to_le_bytes());
        self.contribution_script.write(&mut out);
        self.claim_script.write(&mut out);
        write_option_32(&mut out, &self.contribution_type);
        out
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContributionArgs {
    pub project_script_hash: Hash32,
    pub deadline: Since,
    pub claim_script: ScriptRef,
}

impl FixedRecord for ContributionArgs {
    const LEN: usize = HASH_LEN + 8 + SCRIPT_REF_LEN;

    fn parse(bytes: &[u8]) -> Result<Self, ArgsError> {
        check_len(bytes, Self::LEN)?;
        let mut input = bytes;
        Ok(Self {
            project_script_hash: read_32(&mut input)?,
            deadline: read_since(&mut input)?,
            claim_script: ScriptRef::read(&mut input)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&self.project_script_hash);
        out.extend_from_slice(&self.deadline.to_le_bytes());
        self.claim_script.write(&mut out);
        out
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClaimArgs {
    pub project_script_hash: Hash32,
    pub deadline: Since,
    pub backer_lock_script: Hash32,
}

impl FixedRecord for ClaimArgs {
    const LEN: usize = HASH_LEN + 8 + HASH_LEN;

    fn parse(bytes: &[u8]) -> Result<Self, ArgsError> {
        check_len(bytes, Self::LEN)?;
        let mut input = bytes;
        Ok(Self {
            project_script_hash: read_32(&mut input)?,
            deadline: read_since(&mut input)?,
            backer_lock_script: read_32(&mut input)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&self.project_script_hash);
        out.extend_from_slice(&self.deadline.to_le_bytes());
        out.extend_from_slice(&self.backer_lock_script);
        out
    }
}

/// Reads the little endian u128 amount at the head of a cell's data.
pub fn amount_from_data(data: &[u8]) -> Option<u128> {
    if data.len() < 16 {
        return None;
    }
    let mut out = [0u8; 16];
    out.copy_from_slice(&data[..16]);
    Some(u128::from_le_bytes(out))
}
