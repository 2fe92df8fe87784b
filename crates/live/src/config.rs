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

//! Configuration for live price supervision.
//!
//! A [`LiveConfig`] is usually loaded from a TOML file:
//!
//! ```toml
//! heartbeat_timeout_ms = 45000
//! http_timeout_ms = 5000
//!
//! [reconnect]
//! delay_initial_ms = 5000
//! delay_max_ms = 60000
//! factor = 1.5
//! jitter_ms = 1000
//!
//! [venues.bybit]
//! base_url_ws = "wss://stream-testnet.bybit.com"
//! taker_fee_futures = 0.0006
//! ```

use std::{collections::BTreeMap, path::Path, time::Duration};

use anyhow::Context;
use poscalc_model::{enums::Venue, identifiers::ExchangeIdentity};
use poscalc_network::backoff::ExponentialBackoff;
use poscalc_venues::config::{VenueClientConfig, VenueOverrides};
use serde::{Deserialize, Serialize};

/// Reconnection backoff parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectConfig {
    pub delay_initial_ms: u64,
    pub delay_max_ms: u64,
    pub factor: f64,
    pub jitter_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay_initial_ms: 5_000,
            delay_max_ms: 60_000,
            factor: 1.5,
            jitter_ms: 1_000,
        }
    }
}

impl ReconnectConfig {
    /// Builds the backoff these parameters describe.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are out of range.
    pub fn backoff(&self) -> anyhow::Result<ExponentialBackoff> {
        ExponentialBackoff::new(
            Duration::from_millis(self.delay_initial_ms),
            Duration::from_millis(self.delay_max_ms),
            self.factor,
            self.jitter_ms,
        )
    }
}

/// Configuration for a [`crate::controller::ConnectionController`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiveConfig {
    pub reconnect: ReconnectConfig,
    /// Overrides the stream silence timeout of every venue.
    pub heartbeat_timeout_ms: Option<u64>,
    /// Overrides the REST request timeout.
    pub http_timeout_ms: Option<u64>,
    /// Overrides the taker fee of every venue and market.
    pub taker_fee: Option<f64>,
    /// Per-venue endpoint and fee overrides.
    pub venues: BTreeMap<Venue, VenueOverrides>,
}

impl LiveConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid value.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.reconnect.backoff().context("Invalid reconnect config")?;

        if let Some(fee) = self.taker_fee {
            anyhow::ensure!(
                fee.is_finite() && (0.0..1.0).contains(&fee),
                "taker_fee must be in [0, 1), was {fee}"
            );
        }
        anyhow::ensure!(
            self.heartbeat_timeout_ms != Some(0),
            "heartbeat_timeout_ms must be positive"
        );
        anyhow::ensure!(
            self.http_timeout_ms != Some(0),
            "http_timeout_ms must be positive"
        );
        Ok(())
    }

    /// Builds the client configuration for `identity`.
    ///
    /// Venue overrides apply first, the global fee override wins over both.
    #[must_use]
    pub fn client_config(&self, identity: &ExchangeIdentity) -> VenueClientConfig {
        let mut config = VenueClientConfig::new(identity.venue, identity.market);

        if let Some(overrides) = self.venues.get(&identity.venue) {
            config = config.with_overrides(overrides);
        }
        if let Some(timeout) = self.heartbeat_timeout_ms {
            config = config.with_heartbeat_timeout(Duration::from_millis(timeout));
        }
        if let Some(timeout) = self.http_timeout_ms {
            config = config.with_http_timeout(Duration::from_millis(timeout));
        }
        if self.taker_fee.is_some() {
            config.taker_fee = self.taker_fee;
        }
        config
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::io::Write;

    use poscalc_model::{enums::MarketType, identifiers::Symbol};
    use rstest::rstest;

    use super::*;

    fn identity(venue: Venue, market: MarketType) -> ExchangeIdentity {
        ExchangeIdentity::new(venue, market, Symbol::from_static("BTC/USDT"))
    }

    #[rstest]
    fn test_empty_config_uses_defaults() {
        let config = LiveConfig::from_toml_str("").unwrap();

        assert_eq!(config, LiveConfig::default());
        assert_eq!(config.reconnect.delay_initial_ms, 5_000);
        assert_eq!(config.reconnect.factor, 1.5);
    }

    #[rstest]
    fn test_parse_full_config() {
        let content = r#"
            heartbeat_timeout_ms = 45000
            http_timeout_ms = 2500

            [reconnect]
            delay_initial_ms = 1000
            delay_max_ms = 8000
            factor = 2.0
            jitter_ms = 0

            [venues.bybit]
            base_url_ws = "ws://127.0.0.1:9000"
            taker_fee_futures = 0.0006
        "#;

        let config = LiveConfig::from_toml_str(content).unwrap();
        let client = config.client_config(&identity(Venue::Bybit, MarketType::Futures));

        assert_eq!(client.base_url_ws.as_deref(), Some("ws://127.0.0.1:9000"));
        assert_eq!(client.base_url_http, None);
        assert_eq!(client.taker_fee(), 0.0006);
        assert_eq!(client.heartbeat_timeout, Some(Duration::from_secs(45)));
        assert_eq!(client.http_timeout, Duration::from_millis(2500));

        let mut backoff = config.reconnect.backoff().unwrap();
        assert_eq!(backoff.next_duration(), Duration::from_secs(1));
        assert_eq!(backoff.next_duration(), Duration::from_secs(2));
    }

    #[rstest]
    fn test_venue_overrides_do_not_leak() {
        let content = r#"
            [venues.bybit]
            base_url_http = "http://localhost:1"
        "#;
        let config = LiveConfig::from_toml_str(content).unwrap();

        let client = config.client_config(&identity(Venue::Binance, MarketType::Spot));

        assert_eq!(client.base_url_http, None);
        assert_eq!(client.taker_fee(), 0.001);
    }

    #[rstest]
    fn test_global_fee_overrides_venue_fee() {
        let content = r#"
            taker_fee = 0.0
            [venues.htx]
            taker_fee_spot = 0.003
        "#;
        let config = LiveConfig::from_toml_str(content).unwrap();

        let client = config.client_config(&identity(Venue::Htx, MarketType::Spot));

        assert_eq!(client.taker_fee(), 0.0);
    }

    #[rstest]
    #[case("unknown_key = 1")]
    #[case("[venues.ftx]\nbase_url_http = \"http://x\"")]
    #[case("[reconnect]\nfactor = 0.5")]
    #[case("[reconnect]\ndelay_initial_ms = 0")]
    #[case("taker_fee = 1.5")]
    #[case("heartbeat_timeout_ms = 0")]
    fn test_invalid_config(#[case] content: &str) {
        assert!(LiveConfig::from_toml_str(content).is_err());
    }

    #[rstest]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "http_timeout_ms = 1500").unwrap();

        let config = LiveConfig::from_file(file.path()).unwrap();

        assert_eq!(config.http_timeout_ms, Some(1500));
    }

    #[rstest]
    fn test_from_missing_file() {
        let err = LiveConfig::from_file("/nonexistent/poscalc.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
