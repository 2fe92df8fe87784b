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

//! Configuration for the venue market data clients.

use std::time::Duration;

use poscalc_model::enums::{MarketType, Venue};
use serde::{Deserialize, Serialize};

use crate::common::consts::{HTTP_TIMEOUT, default_taker_fee};

/// Per-venue overrides, typically loaded from the live configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VenueOverrides {
    /// Override for the REST base URL (scheme and host).
    pub base_url_http: Option<String>,
    /// Override for the WebSocket base URL (scheme and host).
    pub base_url_ws: Option<String>,
    /// Override for the spot taker fee rate.
    pub taker_fee_spot: Option<f64>,
    /// Override for the futures taker fee rate.
    pub taker_fee_futures: Option<f64>,
}

/// Configuration for a single market data client.
#[derive(Clone, Debug)]
pub struct VenueClientConfig {
    pub venue: Venue,
    pub market: MarketType,
    /// Override for the REST base URL.
    pub base_url_http: Option<String>,
    /// Override for the WebSocket base URL.
    pub base_url_ws: Option<String>,
    /// Override for the taker fee rate.
    pub taker_fee: Option<f64>,
    /// Override for the stream silence timeout.
    pub heartbeat_timeout: Option<Duration>,
    /// REST request timeout.
    pub http_timeout: Duration,
}

impl VenueClientConfig {
    /// Creates a new configuration with default endpoints for `venue` and `market`.
    #[must_use]
    pub const fn new(venue: Venue, market: MarketType) -> Self {
        Self {
            venue,
            market,
            base_url_http: None,
            base_url_ws: None,
            taker_fee: None,
            heartbeat_timeout: None,
            http_timeout: HTTP_TIMEOUT,
        }
    }

    /// Applies the per-venue `overrides` for this client's market.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &VenueOverrides) -> Self {
        if overrides.base_url_http.is_some() {
            self.base_url_http.clone_from(&overrides.base_url_http);
        }
        if overrides.base_url_ws.is_some() {
            self.base_url_ws.clone_from(&overrides.base_url_ws);
        }
        let fee = match self.market {
            MarketType::Spot => overrides.taker_fee_spot,
            MarketType::Futures => overrides.taker_fee_futures,
        };
        if fee.is_some() {
            self.taker_fee = fee;
        }
        self
    }

    #[must_use]
    pub fn with_base_url_http(mut self, url: impl Into<String>) -> Self {
        self.base_url_http = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_base_url_ws(mut self, url: impl Into<String>) -> Self {
        self.base_url_ws = Some(url.into());
        self
    }

    #[must_use]
    pub const fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Returns the REST base URL, respecting overrides.
    #[must_use]
    pub fn http_base(&self, default: &str) -> String {
        trim_base(self.base_url_http.as_deref().unwrap_or(default))
    }

    /// Returns the WebSocket base URL, respecting overrides.
    #[must_use]
    pub fn ws_base(&self, default: &str) -> String {
        trim_base(self.base_url_ws.as_deref().unwrap_or(default))
    }

    /// Returns the taker fee rate, respecting overrides.
    #[must_use]
    pub fn taker_fee(&self) -> f64 {
        self.taker_fee
            .unwrap_or_else(|| default_taker_fee(self.venue, self.market))
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
