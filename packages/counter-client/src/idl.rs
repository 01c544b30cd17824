//! Typed contract for the counter program, loaded from its Anchor IDL.
//!
//! The IDL is parsed once at startup and validated against the shape the
//! client relies on. Both the current Anchor layout (explicit discriminators,
//! `writable`/`signer`, top-level `address`) and the legacy layout
//! (`isMut`/`isSigner`, `metadata.address`, derived discriminators) are
//! accepted.

use std::{fs, path::Path, str::FromStr};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};
use thiserror::Error;

/// Length of an Anchor instruction or account discriminator.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Name of the on-chain account type holding the counter.
pub const BASE_ACCOUNT_TYPE: &str = "BaseAccount";

const CREATE: &str = "create";
const INCREMENT: &str = "increment";
const DECREMENT: &str = "decrement";

/// Errors raised while loading or validating an IDL.
#[derive(Debug, Error)]
pub enum IdlError {
    #[error("I/O error reading IDL `{0}`: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("malformed IDL at {path}: {message}")]
    Malformed {
        /// JSON path of the offending value
        path: String,
        /// Underlying serde message
        message: String,
    },

    #[error("IDL does not declare a program address")]
    MissingAddress,

    #[error("invalid program address `{0}`")]
    InvalidAddress(String),

    #[error("IDL is missing the `{0}` instruction")]
    MissingInstruction(&'static str),

    #[error("instruction `{instruction}` takes {count} arguments, expected none")]
    UnexpectedArgs {
        /// Instruction name
        instruction: &'static str,
        /// Number of declared arguments
        count: usize,
    },

    #[error("instruction `{instruction}` has unexpected accounts: {reason}")]
    AccountMismatch {
        /// Instruction name
        instruction: &'static str,
        /// What did not match
        reason: String,
    },

    #[error("IDL is missing the `{0}` account type")]
    MissingAccountType(&'static str),

    #[error("account type `{BASE_ACCOUNT_TYPE}` has an unexpected layout: {0}")]
    AccountLayout(String),

    #[error("discriminator of `{item}` has {len} bytes, expected {DISCRIMINATOR_LEN}")]
    InvalidDiscriminator {
        /// Instruction or account name
        item: String,
        /// Actual length
        len: usize,
    },
}

#[derive(Deserialize)]
struct RawIdl {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
    instructions: Vec<RawInstruction>,
    #[serde(default)]
    accounts: Vec<RawAccountDef>,
    #[serde(default)]
    types: Vec<RawTypeDef>,
}

#[derive(Deserialize)]
struct RawMetadata {
    #[serde(default)]
    address: Option<String>,
}

#[derive(Deserialize)]
struct RawInstruction {
    name: String,
    #[serde(default)]
    discriminator: Option<Vec<u8>>,
    accounts: Vec<RawInstructionAccount>,
    #[serde(default)]
    args: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawInstructionAccount {
    name: String,
    #[serde(default)]
    writable: bool,
    #[serde(default)]
    signer: bool,
    #[serde(default, rename = "isMut")]
    is_mut: bool,
    #[serde(default, rename = "isSigner")]
    is_signer: bool,
    #[serde(default)]
    address: Option<String>,
}

impl RawInstructionAccount {
    const fn writable(&self) -> bool {
        self.writable || self.is_mut
    }

    const fn signer(&self) -> bool {
        self.signer || self.is_signer
    }
}

/// Account definition. Legacy IDLs inline the type here.
#[derive(Deserialize)]
struct RawAccountDef {
    name: String,
    #[serde(default)]
    discriminator: Option<Vec<u8>>,
    #[serde(default, rename = "type")]
    type_def: Option<RawTypeDefBody>,
}

#[derive(Deserialize)]
struct RawTypeDef {
    name: String,
    #[serde(rename = "type")]
    type_def: RawTypeDefBody,
}

#[derive(Deserialize)]
struct RawTypeDefBody {
    kind: String,
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    field_type: serde_json::Value,
}

/// Accounts the counter program's instructions refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountRole {
    /// The counter's storage account.
    BaseAccount,
    /// The wallet paying for account creation.
    User,
    /// The system program.
    SystemProgram,
}

impl AccountRole {
    fn from_idl_name(name: &str) -> Option<Self> {
        match to_snake_case(name).as_str() {
            "base_account" => Some(Self::BaseAccount),
            "user" => Some(Self::User),
            "system_program" => Some(Self::SystemProgram),
            _ => None,
        }
    }
}

/// Validated layout of the `create` instruction.
#[derive(Clone, Debug)]
struct CreateLayout {
    discriminator: [u8; DISCRIMINATOR_LEN],
    order: [AccountRole; 3],
}

/// The counter program as described by its IDL.
#[derive(Clone, Debug)]
pub struct CounterProgram {
    program_id: Pubkey,
    create: CreateLayout,
    increment: [u8; DISCRIMINATOR_LEN],
    decrement: [u8; DISCRIMINATOR_LEN],
    base_account_discriminator: [u8; DISCRIMINATOR_LEN],
}

impl CounterProgram {
    /// Load and validate an IDL file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, IdlError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .map_err(|e| IdlError::Io(path_ref.display().to_string(), e))?;
        Self::from_json(&contents)
    }

    /// Parse and validate an IDL document.
    pub fn from_json(json: &str) -> Result<Self, IdlError> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let raw: RawIdl = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
            IdlError::Malformed {
                path: e.path().to_string(),
                message: e.inner().to_string(),
            }
        })?;

        let address = raw
            .address
            .as_deref()
            .or_else(|| raw.metadata.as_ref().and_then(|m| m.address.as_deref()))
            .ok_or(IdlError::MissingAddress)?;
        let program_id =
            Pubkey::from_str(address).map_err(|_| IdlError::InvalidAddress(address.to_string()))?;

        let program = Self {
            program_id,
            create: create_layout(find_instruction(&raw, CREATE)?)?,
            increment: mutate_layout(find_instruction(&raw, INCREMENT)?, INCREMENT)?,
            decrement: mutate_layout(find_instruction(&raw, DECREMENT)?, DECREMENT)?,
            base_account_discriminator: base_account_layout(&raw)?,
        };

        tracing::debug!(program_id = %program.program_id, "loaded counter program IDL");

        Ok(program)
    }

    /// Address of the deployed program.
    #[must_use]
    pub const fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// Discriminator prefixing `BaseAccount` data.
    #[must_use]
    pub const fn base_account_discriminator(&self) -> [u8; DISCRIMINATOR_LEN] {
        self.base_account_discriminator
    }

    /// Builds the `create` instruction. Both `base_account` and `user` must sign.
    #[must_use]
    pub fn create_instruction(&self, base_account: Pubkey, user: Pubkey) -> Instruction {
        let accounts = self
            .create
            .order
            .iter()
            .map(|role| match role {
                AccountRole::BaseAccount => AccountMeta::new(base_account, true),
                AccountRole::User => AccountMeta::new(user, true),
                AccountRole::SystemProgram => AccountMeta::new_readonly(system_program::ID, false),
            })
            .collect();

        Instruction {
            program_id: self.program_id,
            accounts,
            data: self.create.discriminator.to_vec(),
        }
    }

    /// Builds the `increment` instruction.
    #[must_use]
    pub fn increment_instruction(&self, base_account: Pubkey) -> Instruction {
        self.mutate_instruction(self.increment, base_account)
    }

    /// Builds the `decrement` instruction.
    #[must_use]
    pub fn decrement_instruction(&self, base_account: Pubkey) -> Instruction {
        self.mutate_instruction(self.decrement, base_account)
    }

    /// Identifies which counter instruction `data` encodes, if any.
    #[must_use]
    pub fn classify(&self, data: &[u8]) -> Option<CounterInstruction> {
        let discriminator = data.get(..DISCRIMINATOR_LEN)?;
        if discriminator == self.create.discriminator {
            Some(CounterInstruction::Create)
        } else if discriminator == self.increment {
            Some(CounterInstruction::Increment)
        } else if discriminator == self.decrement {
            Some(CounterInstruction::Decrement)
        } else {
            None
        }
    }

    /// Position of `role` in the `create` account list.
    #[must_use]
    pub fn create_account_index(&self, role: AccountRole) -> usize {
        self.create
            .order
            .iter()
            .position(|r| *r == role)
            .unwrap_or_default()
    }

    fn mutate_instruction(
        &self,
        discriminator: [u8; DISCRIMINATOR_LEN],
        base_account: Pubkey,
    ) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![AccountMeta::new(base_account, false)],
            data: discriminator.to_vec(),
        }
    }
}

/// The three operations the counter program exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterInstruction {
    /// Initialize a counter at zero.
    Create,
    /// Add one.
    Increment,
    /// Subtract one.
    Decrement,
}

fn find_instruction<'a>(raw: &'a RawIdl, name: &'static str) -> Result<&'a RawInstruction, IdlError> {
    raw.instructions
        .iter()
        .find(|ix| to_snake_case(&ix.name) == name)
        .ok_or(IdlError::MissingInstruction(name))
}

fn create_layout(ix: &RawInstruction) -> Result<CreateLayout, IdlError> {
    ensure_no_args(ix, CREATE)?;
    let mismatch = |reason: String| IdlError::AccountMismatch {
        instruction: CREATE,
        reason,
    };

    if ix.accounts.len() != 3 {
        return Err(mismatch(format!(
            "expected 3 accounts, found {}",
            ix.accounts.len()
        )));
    }

    let mut order = [AccountRole::BaseAccount; 3];
    for (slot, account) in order.iter_mut().zip(&ix.accounts) {
        let role = AccountRole::from_idl_name(&account.name)
            .ok_or_else(|| mismatch(format!("unknown account `{}`", account.name)))?;

        let (writable, signer) = match role {
            AccountRole::BaseAccount | AccountRole::User => (true, true),
            AccountRole::SystemProgram => (false, false),
        };
        if account.writable() != writable || account.signer() != signer {
            return Err(mismatch(format!(
                "`{}` must be writable={writable} signer={signer}",
                account.name
            )));
        }
        if role == AccountRole::SystemProgram {
            if let Some(address) = &account.address {
                if Pubkey::from_str(address).ok() != Some(system_program::ID) {
                    return Err(mismatch(format!(
                        "`{}` is pinned to {address}, not the system program",
                        account.name
                    )));
                }
            }
        }
        *slot = role;
    }

    for role in [
        AccountRole::BaseAccount,
        AccountRole::User,
        AccountRole::SystemProgram,
    ] {
        if !order.contains(&role) {
            return Err(mismatch(format!("missing {role:?} account")));
        }
    }

    Ok(CreateLayout {
        discriminator: instruction_discriminator(ix)?,
        order,
    })
}

fn mutate_layout(
    ix: &RawInstruction,
    name: &'static str,
) -> Result<[u8; DISCRIMINATOR_LEN], IdlError> {
    ensure_no_args(ix, name)?;
    match ix.accounts.as_slice() {
        [account]
            if AccountRole::from_idl_name(&account.name) == Some(AccountRole::BaseAccount)
                && account.writable()
                && !account.signer() => {}
        _ => {
            return Err(IdlError::AccountMismatch {
                instruction: name,
                reason: "expected a single writable `base_account`".to_string(),
            })
        }
    }
    instruction_discriminator(ix)
}

fn ensure_no_args(ix: &RawInstruction, name: &'static str) -> Result<(), IdlError> {
    if ix.args.is_empty() {
        Ok(())
    } else {
        Err(IdlError::UnexpectedArgs {
            instruction: name,
            count: ix.args.len(),
        })
    }
}

fn base_account_layout(raw: &RawIdl) -> Result<[u8; DISCRIMINATOR_LEN], IdlError> {
    let account = raw
        .accounts
        .iter()
        .find(|a| a.name == BASE_ACCOUNT_TYPE)
        .ok_or(IdlError::MissingAccountType(BASE_ACCOUNT_TYPE))?;

    let body = account.type_def.as_ref().or_else(|| {
        raw.types
            .iter()
            .find(|t| t.name == BASE_ACCOUNT_TYPE)
            .map(|t| &t.type_def)
    });

    if let Some(body) = body {
        if body.kind != "struct" {
            return Err(IdlError::AccountLayout(format!(
                "expected a struct, found `{}`",
                body.kind
            )));
        }
        match body.fields.as_slice() {
            [field] if field.name == "count" && field.field_type == "u64" => {}
            _ => {
                return Err(IdlError::AccountLayout(
                    "expected a single `count: u64` field".to_string(),
                ))
            }
        }
    }

    match &account.discriminator {
        Some(bytes) => to_discriminator(bytes, &account.name),
        None => Ok(sighash("account", &account.name)),
    }
}

fn instruction_discriminator(ix: &RawInstruction) -> Result<[u8; DISCRIMINATOR_LEN], IdlError> {
    match &ix.discriminator {
        Some(bytes) => to_discriminator(bytes, &ix.name),
        None => Ok(sighash("global", &to_snake_case(&ix.name))),
    }
}

fn to_discriminator(bytes: &[u8], item: &str) -> Result<[u8; DISCRIMINATOR_LEN], IdlError> {
    bytes
        .try_into()
        .map_err(|_| IdlError::InvalidDiscriminator {
            item: item.to_string(),
            len: bytes.len(),
        })
}

/// Anchor's legacy discriminator: the first 8 bytes of `sha256("<namespace>:<name>")`.
fn sighash(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let hash = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    out
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM_ID: &str = "9EoiyC3P15LGQs6ZyLeY9a9FmrRMENUyHfQ2W9PkhYxV";

    const CREATE_DISCRIMINATOR: [u8; 8] = [24, 30, 200, 40, 5, 28, 7, 119];
    const INCREMENT_DISCRIMINATOR: [u8; 8] = [11, 18, 104, 9, 104, 174, 59, 33];
    const DECREMENT_DISCRIMINATOR: [u8; 8] = [106, 227, 168, 59, 248, 27, 150, 101];
    const BASE_ACCOUNT_DISCRIMINATOR: [u8; 8] = [16, 90, 130, 242, 159, 10, 232, 133];

    fn legacy_idl() -> serde_json::Value {
        serde_json::json!({
            "version": "0.1.0",
            "name": "counter",
            "instructions": [
                {
                    "name": "create",
                    "accounts": [
                        { "name": "baseAccount", "isMut": true, "isSigner": true },
                        { "name": "user", "isMut": true, "isSigner": true },
                        { "name": "systemProgram", "isMut": false, "isSigner": false }
                    ],
                    "args": []
                },
                {
                    "name": "increment",
                    "accounts": [{ "name": "baseAccount", "isMut": true, "isSigner": false }],
                    "args": []
                },
                {
                    "name": "decrement",
                    "accounts": [{ "name": "baseAccount", "isMut": true, "isSigner": false }],
                    "args": []
                }
            ],
            "accounts": [{
                "name": "BaseAccount",
                "type": { "kind": "struct", "fields": [{ "name": "count", "type": "u64" }] }
            }],
            "metadata": { "address": PROGRAM_ID }
        })
    }

    fn shipped_idl() -> &'static str {
        include_str!("../../../idl/counter.json")
    }

    #[test]
    fn test_shipped_idl_loads() {
        let program = CounterProgram::from_json(shipped_idl()).unwrap();
        assert_eq!(program.program_id().to_string(), PROGRAM_ID);
        assert_eq!(
            program.base_account_discriminator(),
            BASE_ACCOUNT_DISCRIMINATOR
        );
    }

    #[test]
    fn test_legacy_idl_derives_discriminators() {
        let program = CounterProgram::from_json(&legacy_idl().to_string()).unwrap();

        let base = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        assert_eq!(program.create_instruction(base, user).data, CREATE_DISCRIMINATOR);
        assert_eq!(program.increment_instruction(base).data, INCREMENT_DISCRIMINATOR);
        assert_eq!(program.decrement_instruction(base).data, DECREMENT_DISCRIMINATOR);
        assert_eq!(
            program.base_account_discriminator(),
            BASE_ACCOUNT_DISCRIMINATOR
        );
    }

    #[test]
    fn test_create_instruction_accounts() {
        let program = CounterProgram::from_json(shipped_idl()).unwrap();
        let base = Pubkey::new_unique();
        let user = Pubkey::new_unique();

        let ix = program.create_instruction(base, user);
        assert_eq!(ix.program_id.to_string(), PROGRAM_ID);
        assert_eq!(
            ix.accounts,
            vec![
                AccountMeta::new(base, true),
                AccountMeta::new(user, true),
                AccountMeta::new_readonly(system_program::ID, false),
            ]
        );
        assert_eq!(program.classify(&ix.data), Some(CounterInstruction::Create));
    }

    #[test]
    fn test_mutate_instructions_only_touch_base_account() {
        let program = CounterProgram::from_json(shipped_idl()).unwrap();
        let base = Pubkey::new_unique();

        for (ix, kind) in [
            (program.increment_instruction(base), CounterInstruction::Increment),
            (program.decrement_instruction(base), CounterInstruction::Decrement),
        ] {
            assert_eq!(ix.accounts, vec![AccountMeta::new(base, false)]);
            assert_eq!(program.classify(&ix.data), Some(kind));
        }
        assert_eq!(program.classify(&[1, 2, 3]), None);
    }

    #[test]
    fn test_missing_address_fails() {
        let mut idl = legacy_idl();
        idl.as_object_mut().unwrap().remove("metadata");
        let err = CounterProgram::from_json(&idl.to_string()).unwrap_err();
        assert!(matches!(err, IdlError::MissingAddress));
    }

    #[test]
    fn test_invalid_address_fails() {
        let mut idl = legacy_idl();
        idl["metadata"]["address"] = "not-a-key".into();
        let err = CounterProgram::from_json(&idl.to_string()).unwrap_err();
        assert!(matches!(err, IdlError::InvalidAddress(ref a) if a == "not-a-key"));
    }

    #[test]
    fn test_missing_instruction_fails() {
        let mut idl = legacy_idl();
        idl["instructions"].as_array_mut().unwrap().remove(2);
        let err = CounterProgram::from_json(&idl.to_string()).unwrap_err();
        assert!(matches!(err, IdlError::MissingInstruction("decrement")));
    }

    #[test]
    fn test_unexpected_args_fail() {
        let mut idl = legacy_idl();
        idl["instructions"][1]["args"] = serde_json::json!([{ "name": "amount", "type": "u64" }]);
        let err = CounterProgram::from_json(&idl.to_string()).unwrap_err();
        assert!(matches!(
            err,
            IdlError::UnexpectedArgs {
                instruction: "increment",
                count: 1
            }
        ));
    }

    #[test]
    fn test_create_requires_signing_base_account() {
        let mut idl = legacy_idl();
        idl["instructions"][0]["accounts"][0]["isSigner"] = false.into();
        let err = CounterProgram::from_json(&idl.to_string()).unwrap_err();
        assert!(matches!(
            err,
            IdlError::AccountMismatch {
                instruction: "create",
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_count_type_fails() {
        let mut idl = legacy_idl();
        idl["accounts"][0]["type"]["fields"][0]["type"] = "i32".into();
        let err = CounterProgram::from_json(&idl.to_string()).unwrap_err();
        assert!(matches!(err, IdlError::AccountLayout(_)));
    }

    #[test]
    fn test_malformed_idl_reports_path() {
        let mut idl = legacy_idl();
        idl["instructions"][1]["accounts"] = "oops".into();
        let err = CounterProgram::from_json(&idl.to_string()).unwrap_err();
        match err {
            IdlError::Malformed { path, .. } => assert_eq!(path, "instructions[1].accounts"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_discriminator_fails() {
        let mut idl: serde_json::Value = serde_json::from_str(shipped_idl()).unwrap();
        idl["instructions"][0]["discriminator"] = serde_json::json!([1, 2, 3]);
        let err = CounterProgram::from_json(&idl.to_string()).unwrap_err();
        assert!(matches!(err, IdlError::InvalidDiscriminator { len: 3, .. }));
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let err = CounterProgram::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, IdlError::Io(ref p, _) if p == "/definitely/not/here.json"));
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("baseAccount"), "base_account");
        assert_eq!(to_snake_case("system_program"), "system_program");
        assert_eq!(to_snake_case("user"), "user");
    }
}
