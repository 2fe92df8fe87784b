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

//! Binance spot and USDⓈ-M futures tickers.
//!
//! The symbol is part of the stream URL so no subscription message is sent.

use poscalc_model::{
    enums::{MarketType, Venue},
    identifiers::Symbol,
};
use serde_json::Value;

use crate::{adapter::VenueAdapter, common::parse::price_at};

const HTTP_SPOT: &str = "https://api.binance.com";
const HTTP_FUTURES: &str = "https://fapi.binance.com";
const WS_SPOT: &str = "wss://stream.binance.com:9443";
const WS_FUTURES: &str = "wss://fstream.binance.com";

#[derive(Clone, Copy, Debug)]
pub struct BinanceAdapter {
    market: MarketType,
}

impl BinanceAdapter {
    #[must_use]
    pub const fn new(market: MarketType) -> Self {
        Self { market }
    }
}

impl VenueAdapter for BinanceAdapter {
    fn venue(&self) -> Venue {
        Venue::Binance
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
        symbol.compact().to_ascii_lowercase()
    }

    fn rest_price_path(&self, symbol: &Symbol) -> String {
        let path = match self.market {
            MarketType::Spot => "/api/v3/ticker/price",
            MarketType::Futures => "/fapi/v1/ticker/price",
        };
        format!("{path}?symbol={}", symbol.compact())
    }

    fn parse_rest_price(&self, payload: &Value) -> Option<f64> {
        price_at(payload, "/price")
    }

    fn stream_path(&self, symbol: &Symbol) -> String {
        format!("/ws/{}@ticker", self.map_symbol(symbol))
    }

    fn subscribe_message(&self, _symbol: &Symbol) -> Option<String> {
        None
    }

    fn parse_stream_price(&self, payload: &Value) -> Option<f64> {
        price_at(payload, "/c")
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(
        MarketType::Spot,
        "/api/v3/ticker/price?symbol=BTCUSDT",
        "wss://stream.binance.com:9443/ws/btcusdt@ticker"
    )]
    #[case(
        MarketType::Futures,
        "/fapi/v1/ticker/price?symbol=BTCUSDT",
        "wss://fstream.binance.com/ws/btcusdt@ticker"
    )]
    fn test_urls(#[case] market: MarketType, #[case] rest: &str, #[case] stream: &str) {
        let adapter = BinanceAdapter::new(market);
        let symbol = Symbol::from_static("BTC/USDT");

        assert_eq!(adapter.rest_price_path(&symbol), rest);
        assert_eq!(
            format!("{}{}", adapter.default_ws_base(), adapter.stream_path(&symbol)),
            stream
        );
        assert!(adapter.subscribe_message(&symbol).is_none());
    }

    #[rstest]
    fn test_parse_prices() {
        let adapter = BinanceAdapter::new(MarketType::Spot);

        let rest = json!({"symbol": "BTCUSDT", "price": "65000.10"});
        let stream = json!({"e": "24hrTicker", "s": "BTCUSDT", "c": "65001.5"});
        let ack = json!({"result": null, "id": 1});

        assert_eq!(adapter.parse_rest_price(&rest), Some(65000.1));
        assert_eq!(adapter.parse_stream_price(&stream), Some(65001.5));
        assert_eq!(adapter.parse_stream_price(&ack), None);
    }

    #[rstest]
    fn test_heartbeat_is_timeout_only() {
        let config = BinanceAdapter::new(MarketType::Futures).heartbeat_config();

        assert_eq!(config.timeout.as_secs(), 60);
        assert!(config.ping_interval.is_none());
        assert!(!config.auto_pong);
    }
}
