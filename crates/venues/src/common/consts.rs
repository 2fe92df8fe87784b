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

//! Constants shared by the venue adapters.

use std::time::Duration;

use poscalc_model::enums::{MarketType, Venue};

/// Silence allowed on a price stream before it is force-closed.
pub const STREAM_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Period of client pings for venues that require them.
pub const STREAM_PING_INTERVAL: Duration = Duration::from_secs(20);

/// Default request timeout for REST price fetches.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns the default taker fee rate for `venue` on `market`.
#[must_use]
pub const fn default_taker_fee(venue: Venue, market: MarketType) -> f64 {
    let (spot, futures) = match venue {
        Venue::Binance => (0.001, 0.0004),
        Venue::Bybit => (0.001, 0.00055),
        Venue::Kucoin => (0.001, 0.0006),
        Venue::Htx => (0.002, 0.0005),
        Venue::Coinex => (0.001, 0.0005),
        Venue::Poloniex => (0.0015, 0.0005),
    };

    match market {
        MarketType::Spot => spot,
        MarketType::Futures => futures,
    }
}

/// Returns a millisecond request id for subscription and ping payloads.
#[must_use]
pub fn request_id() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
