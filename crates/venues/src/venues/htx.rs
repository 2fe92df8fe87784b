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

//! HTX (Huobi) spot and linear swap trade streams.
//!
//! Every stream frame is gzip-compressed binary. The server pings with
//! `{"ping": <ts>}` and expects `{"pong": <ts>}` back.

use poscalc_model::{
    enums::{MarketType, Venue},
    identifiers::Symbol,
};
use poscalc_network::heartbeat::HeartbeatConfig;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

use crate::{
    adapter::VenueAdapter,
    common::{
        consts::{STREAM_HEARTBEAT_TIMEOUT, request_id},
        parse::{decode_gzip, frame_text, price_at},
    },
};

const HTTP_SPOT: &str = "https://api.huobi.pro";
const HTTP_FUTURES: &str = "https://api.hbdm.com";
const WS_SPOT: &str = "wss://api.huobi.pro";
const WS_FUTURES: &str = "wss://api.hbdm.com";

#[derive(Clone, Copy, Debug)]
pub struct HtxAdapter {
    market: MarketType,
}

impl HtxAdapter {
    #[must_use]
    pub const fn new(market: MarketType) -> Self {
        Self { market }
    }
}

impl VenueAdapter for HtxAdapter {
    fn venue(&self) -> Venue {
        Venue::Htx
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

    /// Spot symbols are lower case without separator, swap contract codes are `BTC-USDT`.
    fn map_symbol(&self, symbol: &Symbol) -> String {
        match self.market {
            MarketType::Spot => symbol.compact().to_ascii_lowercase(),
            MarketType::Futures => symbol.as_str().replace('/', "-"),
        }
    }

    fn rest_price_path(&self, symbol: &Symbol) -> String {
        let mapped = self.map_symbol(symbol);
        match self.market {
            MarketType::Spot => format!("/market/trade?symbol={mapped}"),
            MarketType::Futures => format!("/linear-swap-ex/market/trade?contract_code={mapped}"),
        }
    }

    fn parse_rest_price(&self, payload: &Value) -> Option<f64> {
        price_at(payload, "/tick/data/0/price")
    }

    fn stream_path(&self, _symbol: &Symbol) -> String {
        match self.market {
            MarketType::Spot => "/ws".to_string(),
            MarketType::Futures => "/linear-swap-ws".to_string(),
        }
    }

    fn subscribe_message(&self, symbol: &Symbol) -> Option<String> {
        let topic = format!("market.{}.trade.detail", self.map_symbol(symbol));
        Some(json!({ "sub": topic, "id": request_id().to_string() }).to_string())
    }

    fn decode_frame(&self, message: Message) -> Option<String> {
        match message {
            Message::Binary(data) => decode_gzip(&data),
            other => frame_text(other),
        }
    }

    fn parse_stream_price(&self, payload: &Value) -> Option<f64> {
        price_at(payload, "/tick/data/0/price")
    }

    fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::default()
            .with_timeout(STREAM_HEARTBEAT_TIMEOUT)
            .with_auto_pong(true)
    }
}
