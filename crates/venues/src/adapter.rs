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

//! The seam between the generic streaming client and each venue's wire contract.

use std::fmt::Debug;

use async_trait::async_trait;
use poscalc_model::{
    enums::{MarketType, Venue},
    identifiers::Symbol,
};
use poscalc_network::{heartbeat::HeartbeatConfig, http::HttpClient};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

use crate::{
    common::{consts::STREAM_HEARTBEAT_TIMEOUT, parse::frame_text},
    config::VenueClientConfig,
    error::VenueError,
};

/// Resolved REST and WebSocket base URLs for one client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub http_base: String,
    pub ws_base: String,
}

impl Endpoints {
    /// Resolves the endpoints of `adapter`, respecting the overrides in `config`.
    #[must_use]
    pub fn resolve<A: VenueAdapter + ?Sized>(adapter: &A, config: &VenueClientConfig) -> Self {
        Self {
            http_base: config.http_base(adapter.default_http_base()),
            ws_base: config.ws_base(adapter.default_ws_base()),
        }
    }
}

/// Describes how one venue and market exposes its public ticker.
///
/// Adapters are pure descriptions: symbol mapping, URLs, payload shapes and heartbeat
/// requirements. Connection management lives in [`crate::client::StreamingClient`].
#[async_trait]
pub trait VenueAdapter: Debug + Send + Sync + 'static {
    fn venue(&self) -> Venue;

    fn market(&self) -> MarketType;

    /// Default REST base URL (scheme and host).
    fn default_http_base(&self) -> &'static str;

    /// Default WebSocket base URL (scheme and host).
    fn default_ws_base(&self) -> &'static str;

    /// Maps a user-facing symbol such as `BTC/USDT` to the venue's wire symbol.
    fn map_symbol(&self, symbol: &Symbol) -> String;

    /// Path and query of the REST ticker endpoint, appended to the REST base.
    fn rest_price_path(&self, symbol: &Symbol) -> String;

    /// Extracts the last price from a REST ticker response.
    fn parse_rest_price(&self, payload: &Value) -> Option<f64>;

    /// Path of the stream endpoint, appended to the WebSocket base.
    fn stream_path(&self, symbol: &Symbol) -> String;

    /// Resolves the full stream URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the venue requires a pre-connection handshake and it fails.
    async fn resolve_stream_url(
        &self,
        _http: &HttpClient,
        endpoints: &Endpoints,
        symbol: &Symbol,
    ) -> Result<String, VenueError> {
        Ok(format!("{}{}", endpoints.ws_base, self.stream_path(symbol)))
    }

    /// The message sent once the stream is open, if the venue needs one.
    fn subscribe_message(&self, symbol: &Symbol) -> Option<String>;

    /// Turns an inbound frame into JSON text.
    fn decode_frame(&self, message: Message) -> Option<String> {
        frame_text(message)
    }

    /// Extracts the last price from a stream payload, `None` for anything else.
    fn parse_stream_price(&self, payload: &Value) -> Option<f64>;

    /// Heartbeat requirements of the stream.
    fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::default().with_timeout(STREAM_HEARTBEAT_TIMEOUT)
    }
}
