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

//! Poloniex spot and futures tickers.

use poscalc_model::{
    enums::{MarketType, Venue},
    identifiers::Symbol,
};
use poscalc_network::heartbeat::HeartbeatConfig;
use serde_json::{Value, json};

use crate::{
    adapter::VenueAdapter,
    common::{consts::STREAM_HEARTBEAT_TIMEOUT, parse::price_at},
};

const HTTP_SPOT: &str = "https://api.poloniex.com";
const HTTP_FUTURES: &str = "https://futures-api.poloniex.com";
const WS_SPOT: &str = "wss://ws.poloniex.com";
const WS_FUTURES: &str = "wss://futures-apiws.poloniex.com";

#[derive(Clone, Copy, Debug)]
pub struct PoloniexAdapter {
    market: MarketType,
}

impl PoloniexAdapter {
    #[must_use]
    pub const fn new(market: MarketType) -> Self {
        Self { market }
    }
}

impl VenueAdapter for PoloniexAdapter {
    fn venue(&self) -> Venue {
        Venue::Poloniex
    }

    fn market(&self) -> MarketType {
        self.market
    }

    fn default_http_base(&self) -> &'static str {
        match self.market {
            MarketType::Spot => HTTP_SPOT,
            MarketType::Futures => HTTP_FUTURES,
        }
    }

    fn default_ws_base(&self) -> &'static str {
        match self.market {
            MarketType::Spot => WS_SPOT,
            MarketType::Futures => WS_FUTURES,
        }
    }

    fn map_symbol(&self, symbol: &Symbol) -> String {
        match self.market {
            MarketType::Spot => symbol.as_str().replace('/', "_"),
            MarketType::Futures => symbol.compact(),
        }
    }

    fn rest_price_path(&self, symbol: &Symbol) -> String {
        let mapped = self.map_symbol(symbol);
        match self.market {
            MarketType::Spot => format!("/markets/{mapped}/ticker24h"),
            MarketType::Futures => format!("/v1/ticker?symbol={mapped}"),
        }
    }

    fn parse_rest_price(&self, payload: &Value) -> Option<f64> {
        price_at(payload, "/price").or_else(|| price_at(payload, "/last"))
    }

    fn stream_path(&self, _symbol: &Symbol) -> String {
        match self.market {
            MarketType::Spot => "/ws/public".to_string(),
            MarketType::Futures => "/ws/v1".to_string(),
        }
    }

    fn subscribe_message(&self, symbol: &Symbol) -> Option<String> {
        let mapped = self.map_symbol(symbol);
        let message = match self.market {
            MarketType::Spot => {
                json!({ "event": "subscribe", "channel": "ticker", "symbols": [mapped] })
            }
            MarketType::Futures => json!({ "op": "subscribe", "args": [format!("ticker.{mapped}")] }),
        };
        Some(message.to_string())
    }

    fn parse_stream_price(&self, payload: &Value) -> Option<f64> {
        price_at(payload, "/data/0/price")
    }

    fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::default()
            .with_timeout(STREAM_HEARTBEAT_TIMEOUT)
            .with_auto_pong(true)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(MarketType::Spot, "BTC_USDT", "/markets/BTC_USDT/ticker24h", "/ws/public")]
    #[case(MarketType::Futures, "BTCUSDT", "/v1/ticker?symbol=BTCUSDT", "/ws/v1")]
    fn test_symbol_and_urls(
        #[case] market: MarketType,
        #[case] mapped: &str,
        #[case] rest: &str,
        #[case] stream: &str,
    ) {
        let adapter = PoloniexAdapter::new(market);
        let symbol = Symbol::from_static("BTC/USDT");

        assert_eq!(adapter.map_symbol(&symbol), mapped);
        assert_eq!(adapter.rest_price_path(&symbol), rest);
        assert_eq!(adapter.stream_path(&symbol), stream);
    }

    #[rstest]
    #[case(MarketType::Spot, json!({"event": "subscribe", "channel": "ticker", "symbols": ["BTC_USDT"]}))]
    #[case(MarketType::Futures, json!({"op": "subscribe", "args": ["ticker.BTCUSDT"]}))]
    fn test_subscribe_message(#[case] market: MarketType, #[case] expected: Value) {
        let adapter = PoloniexAdapter::new(market);
        let message = adapter
            .subscribe_message(&Symbol::from_static("BTC/USDT"))
            .unwrap();

        assert_eq!(serde_json::from_str::<Value>(&message).unwrap(), expected);
    }

    #[rstest]
    #[case(json!({"symbol": "BTC_USDT", "price": "65000"}), Some(65000.0))]
    #[case(json!({"symbol": "BTC_USDT", "last": "64000"}), Some(64000.0))]
    #[case(json!({"code": 400}), None)]
    fn test_parse_rest_price(#[case] payload: Value, #[case] expected: Option<f64>) {
        let adapter = PoloniexAdapter::new(MarketType::Spot);
        assert_eq!(adapter.parse_rest_price(&payload), expected);
    }

    #[rstest]
    fn test_parse_stream_price() {
        let adapter = PoloniexAdapter::new(MarketType::Spot);
        let payload = json!({"channel": "ticker", "data": [{"symbol": "BTC_USDT", "price": "65010.1"}]});

        assert_eq!(adapter.parse_stream_price(&payload), Some(65010.1));
        assert_eq!(adapter.parse_stream_price(&json!({"event": "pong"})), None);
    }
}
