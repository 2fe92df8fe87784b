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

//! Bybit v5 spot and linear tickers.

use poscalc_model::{
    enums::{MarketType, Venue},
    identifiers::Symbol,
};
use poscalc_network::heartbeat::{HeartbeatConfig, PingMessage};
use serde_json::{Value, json};

use crate::{
    adapter::VenueAdapter,
    common::{
        consts::{STREAM_HEARTBEAT_TIMEOUT, STREAM_PING_INTERVAL},
        parse::price_at,
    },
};

const HTTP_BASE: &str = "https://api.bybit.com";
const WS_BASE: &str = "wss://stream.bybit.com";

#[derive(Clone, Copy, Debug)]
pub struct BybitAdapter {
    market: MarketType,
}

impl BybitAdapter {
    #[must_use]
    pub const fn new(market: MarketType) -> Self {
        Self { market }
    }

    /// Returns the v5 product category for the market.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.market {
            MarketType::Spot => "spot",
            MarketType::Futures => "linear",
        }
    }
}

impl VenueAdapter for BybitAdapter {
    fn venue(&self) -> Venue {
        Venue::Bybit
    }

    fn market(&self) -> MarketType {
        self.market
    }

    fn default_http_base(&self) -> &'static str {
        HTTP_BASE
    }

    fn default_ws_base(&self) -> &'static str {
        WS_BASE
    }

    fn map_symbol(&self, symbol: &Symbol) -> String {
        symbol.compact()
    }

    fn rest_price_path(&self, symbol: &Symbol) -> String {
        format!(
            "/v5/market/tickers?category={}&symbol={}",
            self.category(),
            self.map_symbol(symbol)
        )
    }

    fn parse_rest_price(&self, payload: &Value) -> Option<f64> {
        price_at(payload, "/result/list/0/lastPrice")
    }

    fn stream_path(&self, _symbol: &Symbol) -> String {
        format!("/v5/public/{}", self.category())
    }

    fn subscribe_message(&self, symbol: &Symbol) -> Option<String> {
        let topic = format!("tickers.{}", self.map_symbol(symbol));
        Some(json!({ "op": "subscribe", "args": [topic] }).to_string())
    }

    fn parse_stream_price(&self, payload: &Value) -> Option<f64> {
        payload.get("topic")?;
        price_at(payload, "/data/lastPrice")
    }

    fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::default()
            .with_timeout(STREAM_HEARTBEAT_TIMEOUT)
            .with_ping(STREAM_PING_INTERVAL, PingMessage::from(r#"{"op":"ping"}"#))
    }
}
