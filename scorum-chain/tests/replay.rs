use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scorum_chain::asset::Asset;
use scorum_chain::block::Transaction;
use scorum_chain::operations::{Operation, Transfer, TransferToScorumpower};
use scorum_chain::services::{AccountService, DynamicGlobalPropertyService};
use scorum_chain::testing::{produce_block, ChainStateBuilder, ConfigBuilder};
use scorum_chain::types::AccountName;
use scorum_chain::ChainState;

const ACCOUNTS: [&str; 4] = ["alice", "bob", "carol", "dave"];
const BLOCKS: usize = 30;

fn genesis_state() -> ChainState {
    let config = ConfigBuilder::new()
        .with_irreversible_distance(BLOCKS as u32 + 1)
        .build();
    let mut builder = ChainStateBuilder::new().with_config(config);
    for name in ACCOUNTS.iter() {
        builder = builder.with_account(name, Asset::scr(10_000), Asset::sp(1_000));
    }
    builder.with_witness("alice").with_witness("bob").build().unwrap()
}

fn name(name: &str) -> AccountName {
    name.parse().unwrap()
}

/// Transfers and stakings the senders can always afford.
fn random_transactions(state: &ChainState, rng: &mut ChaCha8Rng) -> Vec<Transaction> {
    let mut spent = [0i64; 4];
    let mut transactions = Vec::new();
    for _ in 0..rng.gen_range(0..4) {
        let from = rng.gen_range(0..ACCOUNTS.len());
        let balance = state
            .database()
            .get_account(&name(ACCOUNTS[from]))
            .unwrap()
            .balance
            .amount
            - spent[from];
        if balance <= 0 {
            continue;
        }
        let amount = rng.gen_range(1..=balance.min(500));
        spent[from] += amount;
        let operation = if rng.gen_bool(0.25) {
            Operation::TransferToScorumpower(TransferToScorumpower {
                from: name(ACCOUNTS[from]),
                to: None,
                amount: Asset::scr(amount),
            })
        } else {
            let to = (from + rng.gen_range(1..ACCOUNTS.len())) % ACCOUNTS.len();
            Operation::Transfer(Transfer {
                from: name(ACCOUNTS[from]),
                to: name(ACCOUNTS[to]),
                amount: Asset::scr(amount),
                memo: String::new(),
            })
        };
        transactions.push(Transaction::from(operation));
    }
    transactions
}

fn run(seed: u64) -> ChainState {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = genesis_state();
    for block in 0..BLOCKS {
        let transactions = random_transactions(&state, &mut rng);
        let witness = ACCOUNTS[block % 2];
        produce_block(&mut state, witness, transactions).unwrap();
    }
    state
}

fn snapshot(state: &mut ChainState) -> Vec<u8> {
    let mut bytes = Vec::new();
    state.save_snapshot(&mut bytes).unwrap();
    bytes
}

fn holdings(state: &ChainState) -> i64 {
    ACCOUNTS
        .iter()
        .map(|account| {
            let account = state.database().get_account(&name(account)).unwrap();
            account.balance.amount + account.scorumpower.amount
        })
        .sum()
}

#[test]
pub fn same_blocks_give_the_same_state() {
    let mut first = run(0x5c0_2017);
    let mut second = run(0x5c0_2017);
    assert_eq!(first.head_block_num().unwrap(), BLOCKS as u32);
    assert_eq!(snapshot(&mut first), snapshot(&mut second));
}

#[test]
pub fn transfers_and_stakings_keep_holdings() {
    let state = run(7);
    let props = state.database().dynamic_global_properties().unwrap();
    assert_eq!(holdings(&state), 4 * 11_000);
    assert_eq!(props.circulating_capital.amount, holdings(&state));
}

#[test]
pub fn popping_every_block_restores_genesis() {
    let genesis = snapshot(&mut genesis_state());
    let mut state = run(42);
    assert_ne!(snapshot(&mut state), genesis);
    assert_eq!(state.reversible_blocks(), BLOCKS);

    while state.reversible_blocks() > 0 {
        state.pop_block().unwrap();
    }
    assert_eq!(state.head_block_num().unwrap(), 0);
    assert_eq!(snapshot(&mut state), genesis);
}
