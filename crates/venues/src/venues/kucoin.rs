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

//! KuCoin spot and futures tickers.
//!
//! KuCoin does not publish a fixed stream URL. A public token is requested first and
//! the stream endpoint is taken from the token response.

use std::sync::Arc;

use async_trait::async_trait;
use poscalc_model::{
    enums::{MarketType, Venue},
    identifiers::Symbol,
};
use poscalc_network::{
    heartbeat::{HeartbeatConfig, PingMessage},
    http::HttpClient,
};
use serde_json::{Value, json};

use crate::{
    adapter::{Endpoints, VenueAdapter},
    common::{
        consts::{STREAM_HEARTBEAT_TIMEOUT, STREAM_PING_INTERVAL, request_id},
        parse::price_at,
    },
    error::VenueError,
};

const HTTP_SPOT: &str = "https://api.kucoin.com";
const HTTP_FUTURES: &str = "https://api-futures.kucoin.com";
const WS_SPOT: &str = "wss://ws-api-spot.kucoin.com";
const WS_FUTURES: &str = "wss://ws-api-futures.kucoin.com";
const TOKEN_PATH: &str = "/api/v1/bullet-public";

#[derive(Clone, Copy, Debug)]
pub struct KucoinAdapter {
    market: MarketType,
}

impl KucoinAdapter {
    #[must_use]
    pub const fn new(market: MarketType) -> Self {
        Self { market }
    }

    fn topic(&self, symbol: &Symbol) -> String {
        let prefix = match self.market {
            MarketType::Spot => "/market/ticker",
            MarketType::Futures => "/contractMarket/ticker",
        };
        format!("{prefix}:{}", self.map_symbol(symbol))
    }
}

/// Builds the stream URL from a public token response.
///
/// # Errors
///
/// Returns an error if the response carries no token.
pub fn stream_url_from_token(
    payload: &Value,
    fallback_endpoint: &str,
) -> Result<String, VenueError> {
    let token = payload
        .pointer("/data/token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| VenueError::Token(format!("missing token in response: {payload}")))?;

    let endpoint = payload
        .pointer("/data/instanceServers/0/endpoint")
        .and_then(Value::as_str)
        .unwrap_or(fallback_endpoint);

    Ok(format!("{endpoint}?token={token}&connectId={}", request_id()))
}

#[async_trait]
impl VenueAdapter for KucoinAdapter {
    fn venue(&self) -> Venue {
        Venue::Kucoin
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
            MarketType::Spot => symbol.as_str().replace('/', "-"),
            MarketType::Futures => format!("{}M", symbol.compact()),
        }
    }

    fn rest_price_path(&self, symbol: &Symbol) -> String {
        let path = match self.market {
            MarketType::Spot => "/api/v1/market/orderbook/level1",
            MarketType::Futures => "/api/v1/ticker",
        };
        format!("{path}?symbol={}", self.map_symbol(symbol))
    }

    fn parse_rest_price(&self, payload: &Value) -> Option<f64> {
        price_at(payload, "/data/price").or_else(|| price_at(payload, "/data/last"))
    }

    fn stream_path(&self, _symbol: &Symbol) -> String {
        String::new()
    }

    async fn resolve_stream_url(
        &self,
        http: &HttpClient,
        endpoints: &Endpoints,
        _symbol: &Symbol,
    ) -> Result<String, VenueError> {
        let url = format!("{}{TOKEN_PATH}", endpoints.http_base);
        let payload = http.post_json(&url, &json!({})).await?;
        stream_url_from_token(&payload, &endpoints.ws_base)
    }

    fn subscribe_message(&self, symbol: &Symbol) -> Option<String> {
        Some(
            json!({
                "id": request_id(),
                "type": "subscribe",
                "topic": self.topic(symbol),
                "privateChannel": false,
                "response": true,
            })
            .to_string(),
        )
    }

    fn parse_stream_price(&self, payload: &Value) -> Option<f64> {
        payload.get("topic")?;
        price_at(payload, "/data/price")
    }

    fn heartbeat_config(&self) -> HeartbeatConfig {
        let ping = PingMessage::Dynamic(Arc::new(|| {
            json!({ "id": request_id(), "type": "ping" }).to_string()
        }));
        HeartbeatConfig::default()
            .with_timeout(STREAM_HEARTBEAT_TIMEOUT)
            .with_ping(STREAM_PING_INTERVAL, ping)
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
    #[case(MarketType::Spot, "BTC-USDT", "/api/v1/market/orderbook/level1?symbol=BTC-USDT")]
    #[case(MarketType::Futures, "BTCUSDTM", "/api/v1/ticker?symbol=BTCUSDTM")]
    fn test_symbol_and_rest_path(
        #[case] market: MarketType,
        #[case] mapped: &str,
        #[case] path: &str,
    ) {
        let adapter = KucoinAdapter::new(market);
        let symbol = Symbol::from_static("BTC/USDT");

        assert_eq!(adapter.map_symbol(&symbol), mapped);
        assert_eq!(adapter.rest_price_path(&symbol), path);
    }

    #[rstest]
    #[case(MarketType::Spot, "/market/ticker:BTC-USDT")]
    #[case(MarketType::Futures, "/contractMarket/ticker:BTCUSDTM")]
    fn test_subscribe_message(#[case] market: MarketType, #[case] topic: &str) {
        let adapter = KucoinAdapter::new(market);
        let message = adapter
            .subscribe_message(&Symbol::from_static("BTC/USDT"))
            .unwrap();
        let value: Value = serde_json::from_str(&message).unwrap();

        assert_eq!(value["type"], "subscribe");
        assert_eq!(value["topic"], topic);
        assert_eq!(value["privateChannel"], false);
        assert_eq!(value["response"], true);
        assert!(value["id"].as_i64().is_some());
    }

    #[rstest]
    fn test_stream_url_from_token() {
        let payload = json!({
            "code": "200000",
            "data": {
                "token": "abc",
                "instanceServers": [{"endpoint": "wss://ws-api-spot.kucoin.com/", "pingInterval": 18000}]
            }
        });

        let url = stream_url_from_token(&payload, WS_SPOT).unwrap();

        assert!(url.starts_with("wss://ws-api-spot.kucoin.com/?token=abc&connectId="));
    }

    #[rstest]
    fn test_stream_url_without_token_fails() {
        let payload = json!({"code": "400100", "msg": "error"});

        let result = stream_url_from_token(&payload, WS_SPOT);

        assert!(matches!(result, Err(VenueError::Token(_))));
    }

    #[rstest]
    fn test_parse_prices() {
        let adapter = KucoinAdapter::new(MarketType::Spot);
        let rest = json!({"code": "200000", "data": {"price": "65000.5", "size": "0.1"}});
        let futures_rest = json!({"code": "200000", "data": {"last": "64000"}});
        let stream = json!({
            "type": "message",
            "topic": "/market/ticker:BTC-USDT",
            "data": {"price": "65001"}
        });
        let welcome = json!({"id": "1", "type": "welcome"});

        assert_eq!(adapter.parse_rest_price(&rest), Some(65000.5));
        assert_eq!(adapter.parse_rest_price(&futures_rest), Some(64000.0));
        assert_eq!(adapter.parse_stream_price(&stream), Some(65001.0));
        assert_eq!(adapter.parse_stream_price(&welcome), None);
    }

    #[rstest]
    fn test_heartbeat_generates_pings() {
        let config = KucoinAdapter::new(MarketType::Spot).heartbeat_config();
        let ping: Value = serde_json::from_str(&config.ping_message.unwrap().render()).unwrap();

        assert_eq!(ping["type"], "ping");
        assert!(ping["id"].as_i64().is_some());
        assert_eq!(config.ping_interval, Some(STREAM_PING_INTERVAL));
    }
}
