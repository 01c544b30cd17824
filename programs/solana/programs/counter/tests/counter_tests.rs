use anchor_lang::{AccountDeserialize, AnchorSerialize, Discriminator, InstructionData, Space};
use counter::{state::BaseAccount, ID};
use mollusk_svm::{result::InstructionResult, Mollusk};
use solana_sdk::{
    account::Account,
    instruction::{AccountMeta, Instruction},
    native_loader,
    pubkey::Pubkey,
    system_program,
};

const fn get_counter_program_path() -> &'static str {
    "../../target/deploy/counter"
}

fn create_base_account(pubkey: Pubkey, count: u64) -> (Pubkey, Account) {
    let mut data = Vec::new();
    data.extend_from_slice(BaseAccount::DISCRIMINATOR);
    BaseAccount { count }.serialize(&mut data).unwrap();

    (
        pubkey,
        Account {
            lamports: 1_000_000,
            data,
            owner: ID,
            executable: false,
            rent_epoch: 0,
        },
    )
}

const fn create_uninitialized_account(pubkey: Pubkey) -> (Pubkey, Account) {
    (
        pubkey,
        Account {
            lamports: 0,
            data: vec![],
            owner: system_program::ID,
            executable: false,
            rent_epoch: 0,
        },
    )
}

const fn create_payer_account(pubkey: Pubkey) -> (Pubkey, Account) {
    (
        pubkey,
        Account {
            lamports: 1_000_000_000,
            data: vec![],
            owner: system_program::ID,
            executable: false,
            rent_epoch: 0,
        },
    )
}

const fn create_system_program_account() -> (Pubkey, Account) {
    (
        system_program::ID,
        Account {
            lamports: 0,
            data: vec![],
            owner: native_loader::ID,
            executable: true,
            rent_epoch: 0,
        },
    )
}

fn create_instruction(base_account: Pubkey, user: Pubkey) -> Instruction {
    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new(base_account, true),
            AccountMeta::new(user, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: counter::instruction::Create {}.data(),
    }
}

fn mutate_instruction(base_account: Pubkey, data: Vec<u8>) -> Instruction {
    Instruction {
        program_id: ID,
        accounts: vec![AccountMeta::new(base_account, false)],
        data,
    }
}

fn resulting_account(result: &InstructionResult, pubkey: Pubkey) -> (Pubkey, Account) {
    result
        .resulting_accounts
        .iter()
        .find(|(key, _)| *key == pubkey)
        .cloned()
        .unwrap()
}

fn count_of(account: &Account) -> u64 {
    BaseAccount::try_deserialize(&mut account.data.as_slice())
        .unwrap()
        .count
}

#[test]
fn test_create_increment_decrement() {
    let mollusk = Mollusk::new(&ID, get_counter_program_path());

    let base_account = Pubkey::new_unique();
    let user = Pubkey::new_unique();

    let result = mollusk.process_instruction(
        &create_instruction(base_account, user),
        &[
            create_uninitialized_account(base_account),
            create_payer_account(user),
            create_system_program_account(),
        ],
    );
    assert!(!result.program_result.is_err());

    let created = resulting_account(&result, base_account);
    assert_eq!(created.1.owner, ID);
    assert_eq!(created.1.data.len(), 8 + BaseAccount::INIT_SPACE);
    assert_eq!(count_of(&created.1), 0);

    let result = mollusk.process_instruction(
        &mutate_instruction(base_account, counter::instruction::Increment {}.data()),
        &[created],
    );
    assert!(!result.program_result.is_err());
    let incremented = resulting_account(&result, base_account);
    assert_eq!(count_of(&incremented.1), 1);

    let result = mollusk.process_instruction(
        &mutate_instruction(base_account, counter::instruction::Decrement {}.data()),
        &[incremented],
    );
    assert!(!result.program_result.is_err());
    assert_eq!(count_of(&resulting_account(&result, base_account).1), 0);
}

#[test]
fn test_create_requires_base_account_signature() {
    let mollusk = Mollusk::new(&ID, get_counter_program_path());

    let base_account = Pubkey::new_unique();
    let user = Pubkey::new_unique();
    let mut instruction = create_instruction(base_account, user);
    instruction.accounts[0].is_signer = false;

    let result = mollusk.process_instruction(
        &instruction,
        &[
            create_uninitialized_account(base_account),
            create_payer_account(user),
            create_system_program_account(),
        ],
    );
    assert!(result.program_result.is_err());
}

#[test]
fn test_create_existing_account_fails() {
    let mollusk = Mollusk::new(&ID, get_counter_program_path());

    let base_account = Pubkey::new_unique();
    let user = Pubkey::new_unique();

    let result = mollusk.process_instruction(
        &create_instruction(base_account, user),
        &[
            create_base_account(base_account, 3),
            create_payer_account(user),
            create_system_program_account(),
        ],
    );
    assert!(result.program_result.is_err());
}

#[test]
fn test_decrement_below_zero_fails() {
    let mollusk = Mollusk::new(&ID, get_counter_program_path());

    let base_account = Pubkey::new_unique();
    let result = mollusk.process_instruction(
        &mutate_instruction(base_account, counter::instruction::Decrement {}.data()),
        &[create_base_account(base_account, 0)],
    );
    assert!(result.program_result.is_err());
}

#[test]
fn test_increment_at_max_fails() {
    let mollusk = Mollusk::new(&ID, get_counter_program_path());

    let base_account = Pubkey::new_unique();
    let result = mollusk.process_instruction(
        &mutate_instruction(base_account, counter::instruction::Increment {}.data()),
        &[create_base_account(base_account, u64::MAX)],
    );
    assert!(result.program_result.is_err());
}

#[test]
fn test_increment_rejects_foreign_account() {
    let mollusk = Mollusk::new(&ID, get_counter_program_path());

    let base_account = Pubkey::new_unique();
    let (_, mut account) = create_base_account(base_account, 1);
    account.owner = Pubkey::new_unique();

    let result = mollusk.process_instruction(
        &mutate_instruction(base_account, counter::instruction::Increment {}.data()),
        &[(base_account, account)],
    );
    assert!(result.program_result.is_err());
}
