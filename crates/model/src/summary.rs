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

//! Summaries derived from a position's transactions.

use std::fmt::{Display, Formatter};

use poscalc_core::{
    consts::PLACEHOLDER,
    format::{format_adaptive_price, format_signed},
};
use serde::{Deserialize, Serialize};

use crate::{
    accounting::PositionState,
    enums::{MarketType, PositionStatus, Venue},
    error::ModelResult,
    identifiers::{PositionId, Symbol},
    ledger::LedgerTotals,
    position::Position,
    transaction::Transaction,
};

/// The committed state of a position and its fee and funding totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionSummary {
    pub position_id: PositionId,
    pub venue: Venue,
    pub market: MarketType,
    pub symbol: Symbol,
    pub status: PositionStatus,
    /// The final position, normalised to zero within epsilon.
    pub final_position: f64,
    /// The final average price, `None` when flat.
    pub final_avg_price: Option<f64>,
    /// The realized PnL carried by the last transaction.
    pub realized_pnl: f64,
    pub totals: LedgerTotals,
    pub transaction_count: usize,
    /// Whether the position may be closed now.
    pub can_close: bool,
}

impl PositionSummary {
    /// Builds the summary of `position` from its committed `transactions`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transactions fail validation.
    pub fn build(position: &Position, transactions: &[Transaction]) -> ModelResult<Self> {
        let accountant = position.accountant();
        let state = accountant.fold(transactions)?;
        let totals = accountant
            .replay(transactions)?
            .last()
            .map_or(LedgerTotals::ZERO, |entry| entry.totals);

        Ok(Self {
            position_id: position.id,
            venue: position.venue,
            market: position.market,
            symbol: position.symbol,
            status: position.status,
            final_position: state.normalized_position(),
            final_avg_price: state.avg_price(),
            realized_pnl: state.realized_pnl,
            totals,
            transaction_count: state.transaction_count,
            can_close: position.can_close(&state),
        })
    }
}

/// The outcome of folding a user-selected subset of transactions.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SelectionSummary {
    /// Nothing was selected.
    Empty,
    /// The subset realized PnL; position and average price are not reported.
    Realized { realized_pnl: f64 },
    /// The subset leaves an open (or flat) position.
    Open {
        position: f64,
        avg_price: Option<f64>,
    },
}

impl SelectionSummary {
    /// Classifies a folded subset `state`.
    #[must_use]
    pub fn from_state(state: &PositionState) -> Self {
        if state.transaction_count == 0 {
            Self::Empty
        } else if state.realized_pnl != 0.0 {
            Self::Realized {
                realized_pnl: state.realized_pnl,
            }
        } else {
            Self::Open {
                position: state.normalized_position(),
                avg_price: state.avg_price(),
            }
        }
    }

    /// Returns the open position of the subset, if any.
    #[must_use]
    pub const fn open_position(&self) -> Option<(f64, Option<f64>)> {
        match self {
            Self::Open {
                position,
                avg_price,
            } => Some((*position, *avg_price)),
            Self::Empty | Self::Realized { .. } => None,
        }
    }
}

impl Display for SelectionSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str(PLACEHOLDER),
            Self::Realized { realized_pnl } => {
                write!(f, "Realized PnL = {}", format_signed(*realized_pnl, 2))
            }
            Self::Open {
                position,
                avg_price,
            } => write!(
                f,
                "Position = {}, Avg = {}",
                format_adaptive_price(Some(*position)),
                format_adaptive_price(*avg_price),
            ),
        }
    }
}
