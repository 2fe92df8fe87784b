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

//! The position accountant: folds an ordered transaction list into a position state.
//!
//! Two recurrences are supported, selected by [`MarketType`]:
//!
//! - **Spot**: buys may pay their fee in base units, so the position grows by
//!   `volume - fee_base` while the full quote notional is carried into the average price.
//! - **Futures** (any non-spot market): fees are quote denominated and funding payments
//!   adjust the average price of an open position, or accrue to realized PnL when flat.
//!
//! A step that nets the position to zero (within the fold's epsilon) resets the average
//! price to zero and realizes PnL against the previous average. Realized PnL from the
//! last closure is carried into the cost basis of the next trade that reopens a position.
//!
//! Accounting is always a full recomputation: inputs are validated, sorted by id, and
//! folded from a zero state. Folding the same set twice yields identical results.

use poscalc_core::math::{is_within_epsilon, normalize_zero, sign};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
    enums::{MarketType, TransactionKind},
    error::{ModelError, ModelResult},
    identifiers::TransactionId,
    ledger::{LedgerEntry, LedgerTotals},
    transaction::Transaction,
};

/// The epsilon used when no transaction provides a non-zero reference step.
pub const DEFAULT_POSITION_EPSILON: f64 = 1e-10;

/// The lower clamp for a computed position epsilon.
pub const MIN_POSITION_EPSILON: f64 = 1e-12;

/// The upper clamp for a computed position epsilon.
pub const MAX_POSITION_EPSILON: f64 = 1e-8;

/// Returns the epsilon below which a position magnitude is treated as zero.
///
/// The reference step is the smallest non-zero `|volume|` or `|fee_base|` in the set,
/// scaled down by 1000 and clamped to [`MIN_POSITION_EPSILON`, `MAX_POSITION_EPSILON`].
#[must_use]
pub fn position_epsilon(transactions: &[Transaction]) -> f64 {
    let min_step = transactions
        .iter()
        .flat_map(|tx| [tx.volume.abs(), tx.fee_base.abs()])
        .filter(|step| *step > 0.0 && step.is_finite())
        .fold(f64::INFINITY, f64::min);

    if min_step.is_finite() {
        (min_step / 1000.0).clamp(MIN_POSITION_EPSILON, MAX_POSITION_EPSILON)
    } else {
        DEFAULT_POSITION_EPSILON
    }
}

/// Why a step set the average price to zero.
#[derive(Copy, Clone, Debug, Display, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvgPriceResetReason {
    /// The step netted the position to zero.
    PositionClosed,
    /// A spot buy whose base fee consumed its whole volume.
    ZeroNetVolume,
    /// A first futures trade with zero volume.
    ZeroVolumeTrade,
    /// A funding payment applied while the position was flat.
    FlatFunding,
}

/// Records a step where the average price fell back to zero instead of dividing by zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvgPriceReset {
    pub transaction_id: TransactionId,
    pub reason: AvgPriceResetReason,
}

/// The result of folding a transaction set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    /// The market type whose recurrence produced this state.
    pub market: MarketType,
    /// The raw net position (sum of signed volume, net of spot base fees).
    pub position: f64,
    /// The raw average price as left by the recurrence.
    pub avg_price: f64,
    /// The realized PnL carried by the last step.
    pub realized_pnl: f64,
    /// The epsilon used for zero tests during the fold.
    pub epsilon: f64,
    /// The number of transactions folded.
    pub transaction_count: usize,
    /// Steps where the average price fell back to zero.
    pub resets: Vec<AvgPriceReset>,
}

impl PositionState {
    /// Creates a flat state for `market` with the given `epsilon`.
    #[must_use]
    pub const fn flat(market: MarketType, epsilon: f64) -> Self {
        Self {
            market,
            position: 0.0,
            avg_price: 0.0,
            realized_pnl: 0.0,
            epsilon,
            transaction_count: 0,
            resets: Vec::new(),
        }
    }

    /// Returns the position with residue within epsilon normalised to zero.
    #[must_use]
    pub fn normalized_position(&self) -> f64 {
        normalize_zero(self.position, self.epsilon)
    }

    #[must_use]
    pub fn is_flat(&self) -> bool {
        is_within_epsilon(self.position, self.epsilon)
    }

    /// Returns the average price, or `None` when the position is flat.
    #[must_use]
    pub fn avg_price(&self) -> Option<f64> {
        if self.is_flat() {
            None
        } else {
            Some(self.avg_price)
        }
    }
}

/// Folds transactions into a [`PositionState`] using the recurrence of its market type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionAccountant {
    market: MarketType,
}

impl PositionAccountant {
    /// Creates a new [`PositionAccountant`] instance.
    #[must_use]
    pub const fn new(market: MarketType) -> Self {
        Self { market }
    }

    #[must_use]
    pub const fn market(&self) -> MarketType {
        self.market
    }

    /// Folds the full transaction set. Input order is irrelevant.
    ///
    /// # Errors
    ///
    /// Returns an error if any transaction fails validation or two transactions share an id.
    pub fn fold(&self, transactions: &[Transaction]) -> ModelResult<PositionState> {
        let sorted = prepare(transactions)?;
        let mut acc = Accumulator::new(self.market, position_epsilon(&sorted));
        for (i, tx) in sorted.iter().enumerate() {
            acc.apply(tx, i == 0);
        }
        Ok(acc.into_state())
    }

    /// Folds only the transactions whose ids are in `selected`.
    ///
    /// The subset gets its own epsilon and its own first transaction. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if any selected transaction fails validation or ids collide.
    pub fn fold_selected(
        &self,
        transactions: &[Transaction],
        selected: &[TransactionId],
    ) -> ModelResult<PositionState> {
        let subset: Vec<Transaction> = transactions
            .iter()
            .filter(|tx| selected.contains(&tx.id))
            .copied()
            .collect();
        self.fold(&subset)
    }

    /// Replays the transaction set, returning the running state after every step.
    ///
    /// # Errors
    ///
    /// Returns an error if any transaction fails validation or two transactions share an id.
    pub fn replay(&self, transactions: &[Transaction]) -> ModelResult<Vec<LedgerEntry>> {
        let sorted = prepare(transactions)?;
        let mut acc = Accumulator::new(self.market, position_epsilon(&sorted));
        Ok(sorted
            .iter()
            .enumerate()
            .map(|(i, tx)| {
                acc.apply(tx, i == 0);
                acc.entry(tx)
            })
            .collect())
    }
}

fn prepare(transactions: &[Transaction]) -> ModelResult<Vec<Transaction>> {
    for tx in transactions {
        tx.validate()?;
    }

    let mut sorted = transactions.to_vec();
    sorted.sort_by_key(|tx| tx.id);

    if let Some(pair) = sorted.windows(2).find(|pair| pair[0].id == pair[1].id) {
        return Err(ModelError::DuplicateTransactionId(pair[0].id));
    }

    Ok(sorted)
}

struct Accumulator {
    market: MarketType,
    epsilon: f64,
    pos: f64,
    avg: f64,
    rpnl: f64,
    count: usize,
    totals: LedgerTotals,
    resets: Vec<AvgPriceReset>,
}

impl Accumulator {
    const fn new(market: MarketType, epsilon: f64) -> Self {
        Self {
            market,
            epsilon,
            pos: 0.0,
            avg: 0.0,
            rpnl: 0.0,
            count: 0,
            totals: LedgerTotals::ZERO,
            resets: Vec::new(),
        }
    }

    fn is_zero(&self, value: f64) -> bool {
        is_within_epsilon(value, self.epsilon)
    }

    fn reset(&mut self, tx: &Transaction, reason: AvgPriceResetReason) {
        if !matches!(reason, AvgPriceResetReason::PositionClosed) {
            tracing::debug!(transaction_id = %tx.id, %reason, "Average price fell back to zero");
        }
        self.avg = 0.0;
        self.resets.push(AvgPriceReset {
            transaction_id: tx.id,
            reason,
        });
    }

    fn apply(&mut self, tx: &Transaction, first: bool) {
        match self.market {
            MarketType::Spot => self.apply_spot(tx, first),
            MarketType::Futures => self.apply_futures(tx, first),
        }
        self.count += 1;
        self.totals.add(tx);
    }

    fn closing_pnl(&self, tx: &Transaction, avg_prev: f64) -> f64 {
        (tx.price - avg_prev) * tx.volume.abs().min(self.pos.abs()) * sign(self.pos)
    }

    fn apply_spot(&mut self, tx: &Transaction, first: bool) {
        let avg_prev = self.avg;

        if tx.volume > 0.0 {
            let net = tx.volume - tx.fee_base;
            let closes = self.is_zero(self.pos + net);

            if self.is_zero(net) {
                self.reset(tx, AvgPriceResetReason::ZeroNetVolume);
            } else if first {
                self.avg = tx.price * tx.volume / net;
            } else if closes {
                self.reset(tx, AvgPriceResetReason::PositionClosed);
            } else {
                let entry_price = tx.price * tx.volume / net;
                self.avg = (self.pos * self.avg + net * entry_price - self.rpnl) / (self.pos + net);
            }

            self.rpnl = if closes {
                self.closing_pnl(tx, avg_prev)
            } else {
                0.0
            };
            self.pos += net;
        } else if tx.volume < 0.0 {
            let closes = self.is_zero(self.pos + tx.volume);

            if closes {
                self.reset(tx, AvgPriceResetReason::PositionClosed);
                self.rpnl = self.closing_pnl(tx, avg_prev) - tx.fee_quote;
            } else {
                self.avg = (self.pos * self.avg + tx.volume * tx.price + tx.fee_quote)
                    / (self.pos + tx.volume);
                self.rpnl = 0.0;
            }
            self.pos += tx.volume;
        }
    }

    fn apply_futures(&mut self, tx: &Transaction, first: bool) {
        let avg_prev = self.avg;

        match tx.kind {
            TransactionKind::Trade if first => {
                if tx.volume == 0.0 {
                    self.reset(tx, AvgPriceResetReason::ZeroVolumeTrade);
                } else {
                    self.avg = (tx.price * tx.volume + tx.fee_quote) / tx.volume;
                }
                self.rpnl = 0.0;
            }
            TransactionKind::Trade => {
                if self.is_zero(self.pos + tx.volume) {
                    self.reset(tx, AvgPriceResetReason::PositionClosed);
                    self.rpnl = self.closing_pnl(tx, avg_prev) - tx.fee_quote;
                } else {
                    self.avg = (self.pos * self.avg + tx.volume * tx.price + tx.fee_quote
                        - self.rpnl)
                        / (self.pos + tx.volume);
                    self.rpnl = 0.0;
                }
            }
            TransactionKind::Funding => {
                if self.is_zero(self.pos) {
                    self.reset(tx, AvgPriceResetReason::FlatFunding);
                    self.rpnl += tx.funding;
                } else {
                    self.avg = (self.pos * self.avg - tx.funding) / self.pos;
                }
            }
        }

        self.pos += tx.volume;
    }

    fn entry(&self, tx: &Transaction) -> LedgerEntry {
        LedgerEntry {
            transaction_id: tx.id,
            kind: tx.kind,
            position: self.pos,
            avg_price: if self.is_zero(self.pos) {
                None
            } else {
                Some(self.avg)
            },
            realized_pnl: self.rpnl,
            totals: self.totals,
        }
    }

    fn into_state(self) -> PositionState {
        PositionState {
            market: self.market,
            position: self.pos,
            avg_price: self.avg,
            realized_pnl: self.rpnl,
            epsilon: self.epsilon,
            transaction_count: self.count,
            resets: self.resets,
        }
    }
}
