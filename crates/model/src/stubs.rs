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

//! Type stubs to facilitate testing.

use chrono::{DateTime, TimeZone, Utc};
use rstest::fixture;

use crate::{
    enums::{MarketType, Venue},
    identifiers::{PositionId, Symbol, TransactionId},
    position::Position,
    transaction::Transaction,
};

/// Returns a trade with the given id and fields.
#[must_use]
pub fn stub_trade(id: u64, price: f64, volume: f64, fee_base: f64, fee_quote: f64) -> Transaction {
    Transaction::trade(TransactionId::new(id), price, volume, fee_base, fee_quote)
}

/// Returns a funding payment with the given id and amount.
#[must_use]
pub fn stub_funding(id: u64, amount: f64) -> Transaction {
    Transaction::funding(TransactionId::new(id), amount)
}

#[fixture]
pub fn ts_close() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

#[fixture]
pub fn position_spot_btc() -> Position {
    Position::new(
        PositionId::new(1),
        Venue::Binance,
        MarketType::Spot,
        Symbol::from_static("BTC/USDT"),
    )
}

#[fixture]
pub fn position_futures_eth() -> Position {
    Position::new(
        PositionId::new(2),
        Venue::Bybit,
        MarketType::Futures,
        Symbol::from_static("ETH/USDT"),
    )
}

/// Buy 10 @ 100, sell 10 @ 110.
#[fixture]
pub fn spot_round_trip() -> Vec<Transaction> {
    vec![
        stub_trade(1, 100.0, 10.0, 0.0, 0.0),
        stub_trade(2, 110.0, -10.0, 0.0, 0.0),
    ]
}

/// An open futures long with fees and funding.
#[fixture]
pub fn futures_long_with_funding() -> Vec<Transaction> {
    vec![
        stub_trade(1, 3000.0, 2.0, 0.0, 3.3),
        stub_trade(2, 3100.0, 1.0, 0.0, 1.7),
        stub_funding(3, -1.2),
        stub_trade(4, 3200.0, -1.5, 0.0, 2.64),
    ]
}
