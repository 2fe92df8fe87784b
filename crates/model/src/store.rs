// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Storage seams for positions and their transactions.
//!
//! Persistence is an external collaborator; [`InMemoryStore`] backs the CLI and tests.

use std::collections::BTreeMap;

use ahash::AHashMap;
use chrono::{DateTime, Utc};

use crate::{
    enums::{MarketType, PositionStatus, Venue},
    error::{ModelError, ModelResult},
    identifiers::{PositionId, Symbol, TransactionId},
    position::Position,
    transaction::{Transaction, TransactionDraft},
};

/// Provides ordered access to the transactions of a position.
pub trait TransactionStore {
    /// Returns the transactions of the position, ordered ascending by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the position does not exist.
    fn transactions(&self, position_id: PositionId) -> ModelResult<Vec<Transaction>>;

    /// Normalises and appends a drafted transaction, returning its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the position does not exist, is not open, or the draft is invalid.
    fn add_transaction(
        &mut self,
        position_id: PositionId,
        draft: TransactionDraft,
    ) -> ModelResult<TransactionId>;

    /// Deletes a transaction from the position.
    ///
    /// # Errors
    ///
    /// Returns an error if the position or transaction does not exist.
    fn delete_transaction(
        &mut self,
        position_id: PositionId,
        transaction_id: TransactionId,
    ) -> ModelResult<()>;
}

/// Provides access to position descriptors and their status transitions.
pub trait PositionStore {
    /// Returns the position descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the position does not exist.
    fn position(&self, position_id: PositionId) -> ModelResult<Position>;

    /// Returns all positions ordered by id.
    fn positions(&self) -> Vec<Position>;

    /// Opens a new position and returns its id.
    fn open_position(&mut self, venue: Venue, market: MarketType, symbol: Symbol) -> PositionId;

    /// Closes the position if it is open and flat.
    ///
    /// # Errors
    ///
    /// Returns an error if the position does not exist, is not open, or is not flat.
    fn close_position(&mut self, position_id: PositionId, ts: DateTime<Utc>) -> ModelResult<()>;
}

/// An in-memory implementation of [`PositionStore`] and [`TransactionStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    positions: BTreeMap<PositionId, Position>,
    transactions: AHashMap<PositionId, BTreeMap<TransactionId, Transaction>>,
    next_position_id: u64,
    next_transaction_id: u64,
}

impl InMemoryStore {
    /// Creates a new empty [`InMemoryStore`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an existing position together with already-normalised transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if any transaction fails validation or ids collide.
    pub fn insert(&mut self, position: Position, transactions: Vec<Transaction>) -> ModelResult<()> {
        let mut rows = BTreeMap::new();
        for tx in transactions {
            tx.validate()?;
            self.next_transaction_id = self.next_transaction_id.max(tx.id.as_u64());
            if rows.insert(tx.id, tx).is_some() {
                return Err(ModelError::DuplicateTransactionId(tx.id));
            }
        }

        self.next_position_id = self.next_position_id.max(position.id.as_u64());
        self.transactions.insert(position.id, rows);
        self.positions.insert(position.id, position);
        Ok(())
    }

    fn rows(&self, position_id: PositionId) -> ModelResult<&BTreeMap<TransactionId, Transaction>> {
        self.transactions
            .get(&position_id)
            .ok_or(ModelError::PositionNotFound(position_id))
    }
}

impl TransactionStore for InMemoryStore {
    fn transactions(&self, position_id: PositionId) -> ModelResult<Vec<Transaction>> {
        Ok(self.rows(position_id)?.values().copied().collect())
    }

    fn add_transaction(
        &mut self,
        position_id: PositionId,
        draft: TransactionDraft,
    ) -> ModelResult<TransactionId> {
        let position = self.position(position_id)?;
        if !position.is_open() {
            return Err(ModelError::InvalidStatus {
                id: position_id,
                status: position.status,
                expected: PositionStatus::Open,
            });
        }

        let id = TransactionId::new(self.next_transaction_id + 1);
        let tx = draft.normalize(id, position.market)?;
        self.next_transaction_id += 1;
        self.transactions
            .entry(position_id)
            .or_default()
            .insert(id, tx);

        tracing::debug!(%position_id, transaction_id = %id, kind = %tx.kind, "Added transaction");
        Ok(id)
    }

    fn delete_transaction(
        &mut self,
        position_id: PositionId,
        transaction_id: TransactionId,
    ) -> ModelResult<()> {
        let rows = self
            .transactions
            .get_mut(&position_id)
            .ok_or(ModelError::PositionNotFound(position_id))?;

        rows.remove(&transaction_id)
            .map(|_| ())
            .ok_or(ModelError::TransactionNotFound {
                position_id,
                transaction_id,
            })
    }
}

impl PositionStore for InMemoryStore {
    fn position(&self, position_id: PositionId) -> ModelResult<Position> {
        self.positions
            .get(&position_id)
            .cloned()
            .ok_or(ModelError::PositionNotFound(position_id))
    }

    fn positions(&self) -> Vec<Position> {
        self.positions.values().cloned().collect()
    }

    fn open_position(&mut self, venue: Venue, market: MarketType, symbol: Symbol) -> PositionId {
        self.next_position_id += 1;
        let id = PositionId::new(self.next_position_id);
        self.positions
            .insert(id, Position::new(id, venue, market, symbol));
        self.transactions.insert(id, BTreeMap::new());
        id
    }

    fn close_position(&mut self, position_id: PositionId, ts: DateTime<Utc>) -> ModelResult<()> {
        let transactions = self.transactions(position_id)?;
        let position = self
            .positions
            .get_mut(&position_id)
            .ok_or(ModelError::PositionNotFound(position_id))?;
        let state = position.accountant().fold(&transactions)?;
        position.close(&state, ts)
    }
}
