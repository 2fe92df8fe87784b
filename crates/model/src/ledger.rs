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

//! Per-step ledger rows produced by replaying a position's transactions.

use serde::{Deserialize, Serialize};

use crate::{enums::TransactionKind, identifiers::TransactionId, transaction::Transaction};

/// Running fee and funding totals.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Accumulated quote-denominated fees.
    pub fee_quote: f64,
    /// Accumulated base-denominated fees.
    pub fee_base: f64,
    /// Accumulated funding payments.
    pub funding: f64,
}

impl LedgerTotals {
    pub const ZERO: Self = Self {
        fee_quote: 0.0,
        fee_base: 0.0,
        funding: 0.0,
    };

    /// Adds the fees and funding of `tx` to the totals.
    pub fn add(&mut self, tx: &Transaction) {
        self.fee_quote += tx.fee_quote;
        self.fee_base += tx.fee_base;
        self.funding += tx.funding;
    }
}

/// The running position state after applying one transaction.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub transaction_id: TransactionId,
    pub kind: TransactionKind,
    pub position: f64,
    /// `None` while the position is flat.
    pub avg_price: Option<f64>,
    pub realized_pnl: f64,
    pub totals: LedgerTotals,
}
