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

//! Live price state of a watched position, as handed to the display layer.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use poscalc_core::{
    consts::PLACEHOLDER,
    format::{format_adaptive_price, format_fixed},
};
use poscalc_model::{
    accounting::PositionState,
    identifiers::ExchangeIdentity,
    pnl::{PNL_DISPLAY_DECIMALS, PnlEstimate, compute_unrealized_pnl},
    summary::SelectionSummary,
};
use poscalc_network::mode::ConnectionStatus;
use poscalc_venues::client::{MarketDataEvent, PriceSource, PriceUpdate};

/// What the display layer renders for a watched position.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplaySnapshot {
    pub identity: ExchangeIdentity,
    /// The normalised net position.
    pub position: f64,
    /// The average entry price, absent while flat.
    pub avg_price: Option<f64>,
    pub pnl: PnlEstimate,
    pub last_price: Option<f64>,
    pub source: Option<PriceSource>,
    pub status: ConnectionStatus,
}

impl Display for DisplaySnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let cost = self.pnl.cost().map_or_else(
            || PLACEHOLDER.to_string(),
            |cost| format_fixed(cost, PNL_DISPLAY_DECIMALS),
        );
        write!(
            f,
            "{} | position={} avg={} last={} upnl={} cost={} | {}",
            self.identity,
            format_adaptive_price(Some(self.position)),
            format_adaptive_price(self.avg_price),
            format_adaptive_price(self.last_price),
            self.pnl,
            cost,
            self.status,
        )
    }
}

/// Holds the last accepted price for one position and derives PnL from it.
///
/// Only prices stamped with the epoch of the currently supervising client are
/// accepted; anything from a superseded client is discarded.
#[derive(Clone, Debug)]
pub struct PriceSession {
    identity: ExchangeIdentity,
    position: f64,
    avg_price: Option<f64>,
    taker_fee: f64,
    last: Option<PriceUpdate>,
}

impl PriceSession {
    /// Creates a new [`PriceSession`] instance for the folded `state`.
    #[must_use]
    pub fn new(identity: ExchangeIdentity, state: &PositionState, taker_fee: f64) -> Self {
        Self {
            identity,
            position: state.normalized_position(),
            avg_price: state.avg_price(),
            taker_fee,
            last: None,
        }
    }

    #[must_use]
    pub const fn identity(&self) -> ExchangeIdentity {
        self.identity
    }

    #[must_use]
    pub fn last_price(&self) -> Option<f64> {
        self.last.map(|update| update.price)
    }

    #[must_use]
    pub fn last_update_ts(&self) -> Option<DateTime<Utc>> {
        self.last.map(|update| update.ts)
    }

    /// Replaces the position figures after the transaction set changed.
    pub fn update_state(&mut self, state: &PositionState) {
        self.position = state.normalized_position();
        self.avg_price = state.avg_price();
    }

    pub const fn set_taker_fee(&mut self, taker_fee: f64) {
        self.taker_fee = taker_fee;
    }

    /// Applies `event` if it belongs to `current_epoch`.
    ///
    /// Returns whether the displayed price changed.
    pub fn apply(&mut self, event: &MarketDataEvent, current_epoch: Option<u64>) -> bool {
        let MarketDataEvent::Price(update) = event else {
            return false;
        };

        if current_epoch != Some(update.epoch) {
            tracing::trace!(
                epoch = update.epoch,
                ?current_epoch,
                "Discarding price from superseded stream"
            );
            return false;
        }

        // REST prices requested before the stream started must not overwrite a newer tick
        if let Some(last) = &self.last
            && last.epoch == update.epoch
            && last.source == PriceSource::Stream
            && update.source == PriceSource::Rest
        {
            return false;
        }

        self.last = Some(*update);
        true
    }

    /// Returns the unrealized PnL of the whole position at the last price.
    #[must_use]
    pub fn unrealized_pnl(&self) -> PnlEstimate {
        match self.last_price() {
            Some(last) => {
                compute_unrealized_pnl(last, self.avg_price, Some(self.position), self.taker_fee)
            }
            None => PnlEstimate::NotComputable,
        }
    }

    /// Returns the unrealized PnL of a selected subset at the last price.
    ///
    /// Subsets that realized PnL, or are empty, have no unrealized figure.
    #[must_use]
    pub fn selection_pnl(&self, selection: &SelectionSummary) -> PnlEstimate {
        match (selection.open_position(), self.last_price()) {
            (Some((position, avg_price)), Some(last)) => {
                compute_unrealized_pnl(last, avg_price, Some(position), self.taker_fee)
            }
            _ => PnlEstimate::NotComputable,
        }
    }

    /// Builds the snapshot rendered for the current state.
    #[must_use]
    pub fn snapshot(&self, status: ConnectionStatus) -> DisplaySnapshot {
        DisplaySnapshot {
            identity: self.identity,
            position: self.position,
            avg_price: self.avg_price,
            pnl: self.unrealized_pnl(),
            last_price: self.last_price(),
            source: self.last.map(|update| update.source),
            status,
        }
    }
}
