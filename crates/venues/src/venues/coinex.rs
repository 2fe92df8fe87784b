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

//! CoinEx spot and perpetual tickers.

use poscalc_model::{
    enums::{MarketType, Venue},
    identifiers::Symbol,
};
use poscalc_network::heartbeat::{HeartbeatConfig, PingMessage};
use serde_json::{Value, json};

use crate::{
    adapter::VenueAdapter,
    common::{
        consts::{STREAM_HEARTBEAT_TIMEOUT, STREAM_PING_INTERVAL, request_id},
        parse::price_at,
    },
};

const HTTP_BASE: &str = "https://api.coinex.com";
const WS_SPOT: &str = "wss://socket.coinex.com";
const WS_FUTURES: &str = "wss://perpetual.coinex.com";

#[derive(Clone, Copy, Debug)]
pub struct CoinexAdapter {
    market: MarketType,
}

impl CoinexAdapter {
    #[must_use]
    pub const fn new(market: MarketType) -> Self {
        Self { market }
    }
}

impl VenueAdapter for CoinexAdapter {
    fn venue(&self) -> Venue {
        Venue::Coinex
    }

    fn market(&self) -> MarketType {
        self.market
    }

    fn default_http_base(&self) -> &'static str {
        HTTP_BASE
    }

    fn default_ws_base(&self) -> &'static str {
        match self.market {
            MarketType::Spot => WS_SPOT,
            MarketType::Futures => WS_FUTURES,
        }
    }

    fn map_symbol(&self, symbol: &Symbol) -> String {
        symbol.compact()
    }

    fn rest_price_path(&self, symbol: &Symbol) -> String {
        let path = match self.market {
            MarketType::Spot => "/v1/market/ticker",
            MarketType::Futures => "/perpetual/v1/market/ticker",
        };
        format!("{path}?market={}", self.map_symbol(symbol))
    }

    fn parse_rest_price(&self, payload: &Value) -> Option<f64> {
        price_at(payload, "/data/ticker/last")
    }

    fn stream_path(&self, _symbol: &Symbol) -> String {
        match self.market {
            MarketType::Spot => "/v1/spot".to_string(),
            MarketType::Futures => "/ws".to_string(),
        }
    }

    fn subscribe_message(&self, symbol: &Symbol) -> Option<String> {
        let channel = format!("market.{}.ticker", self.map_symbol(symbol));
        Some(
            json!({
                "method": "subscribe",
                "params": [channel],
                "id": request_id(),
            })
            .to_string(),
        )
    }

    fn parse_stream_price(&self, payload: &Value) -> Option<f64> {
        if payload.get("method").and_then(Value::as_str) != Some("ticker.update") {
            return None;
        }
        price_at(payload, "/params/0/last")
    }

    fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::default()
            .with_timeout(STREAM_HEARTBEAT_TIMEOUT)
            .with_ping(STREAM_PING_INTERVAL, PingMessage::from(r#"{"method":"ping"}"#))
    }
}
