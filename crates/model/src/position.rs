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

//! Position descriptors and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    accounting::{PositionAccountant, PositionState},
    enums::{MarketType, PositionStatus, Venue},
    error::{ModelError, ModelResult},
    identifiers::{ExchangeIdentity, PositionId, Symbol},
};

/// A position tracked on a venue, identified independently of its transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub venue: Venue,
    pub market: MarketType,
    pub symbol: Symbol,
    #[serde(default)]
    pub status: PositionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Position {
    /// Creates a new open [`Position`] instance.
    #[must_use]
    pub const fn new(id: PositionId, venue: Venue, market: MarketType, symbol: Symbol) -> Self {
        Self {
            id,
            venue,
            market,
            symbol,
            status: PositionStatus::Open,
            closed_at: None,
        }
    }

    /// Returns the exchange identity a live price feed for this position binds to.
    #[must_use]
    pub const fn identity(&self) -> ExchangeIdentity {
        ExchangeIdentity::new(self.venue, self.market, self.symbol)
    }

    /// Returns an accountant for this position's market type.
    #[must_use]
    pub const fn accountant(&self) -> PositionAccountant {
        PositionAccountant::new(self.market)
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Returns whether the position may transition to closed given its folded `state`.
    #[must_use]
    pub fn can_close(&self, state: &PositionState) -> bool {
        self.is_open() && state.is_flat()
    }

    /// Transitions the position from open to closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the position is not open or `state` is not flat.
    pub fn close(&mut self, state: &PositionState, ts: DateTime<Utc>) -> ModelResult<()> {
        if !self.is_open() {
            return Err(ModelError::InvalidStatus {
                id: self.id,
                status: self.status,
                expected: PositionStatus::Open,
            });
        }

        if !state.is_flat() {
            return Err(ModelError::PositionNotFlat {
                id: self.id,
                position: state.position,
            });
        }

        self.status = PositionStatus::Closed;
        self.closed_at = Some(ts);
        tracing::info!(position_id = %self.id, symbol = %self.symbol, "Position closed");
        Ok(())
    }
}
