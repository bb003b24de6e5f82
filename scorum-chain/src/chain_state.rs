//! Block and transaction application on top of the database.
//!
//! Every block is applied inside its own undo session which is kept on the
//! undo stack until the block becomes irreversible, so that the most recent
//! blocks can be popped again. A transaction is applied inside a nested
//! session squashed into the enclosing one on success.
//!
//! Transactions pushed outside of a block are pending: they share one undo
//! state above the head block. That state is lifted before a block is
//! applied or popped, and the pending transactions that still apply are
//! pushed again afterwards.

use crate::block::{Block, BlockError, Transaction};
use crate::block_tasks::{apply_block_tasks, BlockTaskContext};
use crate::config::ChainConfig;
use crate::database::Database;
use crate::error::Result;
use crate::evaluators::{apply_operation, EvaluationContext};
use crate::genesis::Genesis;
use crate::services::{DynamicGlobalPropertyService, WitnessService};
use crate::snapshot;
use crate::time::TimePointSec;
use crate::types::AccountName;
use crate::virtual_ops::{VirtualOperation, VirtualOperationSink};
use chainbase::Undoable;
use std::io::{Read, Write};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Apply every operation of `tx`, all or nothing.
pub(crate) fn apply_transaction(
    db: &mut Database,
    tx: &Transaction,
    virtual_operations: &mut Vec<VirtualOperation>,
) -> Result<()> {
    let mut emitted = Vec::new();
    let mut session = db.start_undo_session(true);
    {
        let mut ctx = EvaluationContext::new(&mut *session, &mut emitted);
        for operation in tx.operations.iter() {
            apply_operation(&mut ctx, operation)?;
        }
    }
    session.squash();
    virtual_operations.append(&mut emitted);
    Ok(())
}

pub struct ChainState {
    db: Database,
    sinks: Vec<Box<dyn VirtualOperationSink + Send + Sync>>,
    pending: Vec<Transaction>,
    /// The undo state of the pending transactions is on top of the stack.
    pending_session: bool,
}

impl ChainState {
    pub fn from_genesis(config: Arc<ChainConfig>, genesis: &Genesis) -> Result<Self> {
        config.validate()?;
        let mut db = Database::new(config);
        genesis.apply(&mut db)?;
        Ok(ChainState::from_database(db))
    }

    /// Restore a state saved with [`ChainState::save_snapshot`].
    pub fn from_snapshot<R: Read>(config: Arc<ChainConfig>, reader: &mut R) -> Result<Self> {
        config.validate()?;
        let mut db = Database::new(config);
        let head = snapshot::load(&mut db, reader)?;
        db.set_revision(head as i64);
        tracing::info!(head_block_num = head, "state restored from snapshot");
        Ok(ChainState::from_database(db))
    }

    pub fn from_database(db: Database) -> Self {
        ChainState {
            db,
            sinks: Vec::new(),
            pending: Vec::new(),
            pending_session: false,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    pub fn config(&self) -> &ChainConfig {
        self.db.config()
    }

    pub fn head_block_num(&self) -> Result<u32> {
        self.db.head_block_num()
    }

    /// Blocks that can still be popped.
    pub fn reversible_blocks(&self) -> usize {
        self.db.undo_stack_size() - self.pending_session as usize
    }

    /// Transactions applied on top of the head block, in push order.
    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn add_sink<S>(&mut self, sink: S)
    where
        S: VirtualOperationSink + Send + Sync + 'static,
    {
        self.sinks.push(Box::new(sink));
    }

    /// Save the state of the head block. Pending transactions are not part
    /// of it.
    pub fn save_snapshot<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        let pending = self.clear_pending();
        let result = snapshot::save(&self.db, writer);
        self.restore_pending(pending);
        result
    }

    /// Apply a transaction outside of any block. It stays pending until a
    /// block includes it, and never joins the head block's undo state.
    pub fn push_transaction(&mut self, tx: &Transaction) -> Result<Vec<VirtualOperation>> {
        if !self.pending_session {
            self.db.push_undo_state();
            self.pending_session = true;
        }
        let mut virtual_operations = Vec::new();
        apply_transaction(&mut self.db, tx, &mut virtual_operations)?;
        self.pending.push(tx.clone());
        Ok(virtual_operations)
    }

    /// Undo the pending transactions and hand them back.
    fn clear_pending(&mut self) -> Vec<Transaction> {
        if self.pending_session {
            self.db.undo();
            self.pending_session = false;
        }
        std::mem::take(&mut self.pending)
    }

    fn restore_pending(&mut self, transactions: Vec<Transaction>) {
        for tx in transactions {
            if let Err(error) = self.push_transaction(&tx) {
                tracing::debug!(%error, "pending transaction dropped");
            }
        }
    }

    /// Apply `block` on top of the head block. Nothing of the block remains
    /// if any of its transactions or block tasks fails.
    pub fn apply_block(&mut self, block: &Block) -> Result<Vec<VirtualOperation>> {
        let mut pending = self.clear_pending();
        let result = self.apply_block_on_head(block);
        if result.is_ok() {
            pending.retain(|tx| !block.transactions.contains(tx));
        }
        self.restore_pending(pending);
        result
    }

    /// Build a block out of the pending transactions that still apply, and
    /// apply it. Failing transactions are left out.
    pub fn generate_block(
        &mut self,
        timestamp: TimePointSec,
        witness: &AccountName,
    ) -> Result<Block> {
        let block_num = self.db.head_block_num()? + 1;
        let pending = self.clear_pending();
        let mut transactions = Vec::with_capacity(pending.len());
        {
            let mut session = self.db.start_undo_session(true);
            for tx in pending.iter() {
                match apply_transaction(&mut *session, tx, &mut Vec::new()) {
                    Ok(()) => transactions.push(tx.clone()),
                    Err(error) => {
                        tracing::debug!(block_num, %error, "transaction left out of the block")
                    }
                }
            }
        }
        let block = Block {
            block_num,
            timestamp,
            witness: witness.clone(),
            transactions,
        };

        let result = self.apply_block_on_head(&block);
        let remaining = match result {
            Ok(_) => pending
                .into_iter()
                .filter(|tx| !block.transactions.contains(tx))
                .collect(),
            Err(_) => pending,
        };
        self.restore_pending(remaining);
        result.map(|_| block)
    }

    fn apply_block_on_head(&mut self, block: &Block) -> Result<Vec<VirtualOperation>> {
        let (head, head_time) = {
            let props = self.db.dynamic_global_properties()?;
            (props.head_block_number, props.time)
        };
        ensure!(
            block.block_num == head + 1,
            BlockError::UnexpectedBlockNumber {
                expected: head + 1,
                found: block.block_num,
            }
        )?;
        ensure!(
            block.timestamp > head_time,
            BlockError::TimestampNotIncreasing {
                head: head_time,
                found: block.timestamp,
            }
        )?;

        let info = block.info();
        let distance = self.db.config().irreversible_distance;
        let mut virtual_operations = Vec::new();

        let mut session = self.db.start_undo_session(true);
        let witness = session.get_witness(&block.witness)?.id;
        session.update_dynamic_global_properties(|p| {
            p.head_block_number = block.block_num;
            p.time = block.timestamp;
            p.current_witness = Some(block.witness.clone());
            p.last_irreversible_block_num = p
                .last_irreversible_block_num
                .max(block.block_num.saturating_sub(distance));
        })?;
        session.update_witness(witness, |w| w.last_confirmed_block_num = block.block_num)?;

        for (index, tx) in block.transactions.iter().enumerate() {
            if let Err(error) = apply_transaction(&mut *session, tx, &mut virtual_operations) {
                tracing::warn!(
                    block_num = block.block_num,
                    transaction = index,
                    %error,
                    "transaction rejected, dropping block"
                );
                return Err(error);
            }
        }
        apply_block_tasks(&mut BlockTaskContext::new(
            &mut *session,
            &info,
            &mut virtual_operations,
        ))?;

        let irreversible = session
            .dynamic_global_properties()?
            .last_irreversible_block_num;
        session.push();
        self.db.commit(irreversible as i64);

        tracing::info!(
            block_num = block.block_num,
            witness = %block.witness,
            transactions = block.transactions.len(),
            virtual_operations = virtual_operations.len(),
            "block applied"
        );
        self.deliver(block.block_num, &virtual_operations);
        Ok(virtual_operations)
    }

    /// Revert the head block. Pending transactions are applied again on
    /// top of the new head.
    pub fn pop_block(&mut self) -> Result<()> {
        let pending = self.clear_pending();
        let result = self.undo_head_block();
        self.restore_pending(pending);
        result
    }

    fn undo_head_block(&mut self) -> Result<()> {
        ensure!(
            self.db.undo_stack_size() > 0,
            BlockError::NoReversibleBlock
        )?;
        let popped = self.db.head_block_num()?;
        self.db.undo();
        tracing::info!(block_num = popped, "block popped");
        Ok(())
    }

    fn deliver(&mut self, block_num: u32, virtual_operations: &[VirtualOperation]) {
        for sink in self.sinks.iter_mut() {
            for op in virtual_operations.iter() {
                if let Err(error) = sink.accept(block_num, op) {
                    tracing::warn!(block_num, %error, "virtual operation not delivered");
                }
            }
        }
    }
}

/// Chain state behind a reader-writer lock: block application takes the
/// write lock, readers share the read lock.
#[derive(Clone)]
pub struct SharedChainState(Arc<RwLock<ChainState>>);

impl SharedChainState {
    pub fn new(state: ChainState) -> Self {
        SharedChainState(Arc::new(RwLock::new(state)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ChainState> {
        // a panicking writer leaves no open session behind, see `Session`
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ChainState> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn apply_block(&self, block: &Block) -> Result<Vec<VirtualOperation>> {
        self.write().apply_block(block)
    }
}
