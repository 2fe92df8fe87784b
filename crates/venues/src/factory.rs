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

//! Client construction keyed by venue and market type.

use std::str::FromStr;

use async_trait::async_trait;
use poscalc_model::{
    enums::{MarketType, Venue},
    identifiers::Symbol,
};
use poscalc_network::mode::{ConnectionStatus, StatusCell};

use crate::{
    client::{EventSender, MarketDataClient, StreamingClient},
    config::VenueClientConfig,
    error::VenueError,
    venues::{
        binance::BinanceAdapter, bybit::BybitAdapter, coinex::CoinexAdapter, htx::HtxAdapter,
        kucoin::KucoinAdapter, poloniex::PoloniexAdapter,
    },
};

/// A market data client for any supported venue.
#[derive(Debug)]
pub enum MarketDataClientAny {
    Binance(StreamingClient<BinanceAdapter>),
    Bybit(StreamingClient<BybitAdapter>),
    Kucoin(StreamingClient<KucoinAdapter>),
    Htx(StreamingClient<HtxAdapter>),
    Coinex(StreamingClient<CoinexAdapter>),
    Poloniex(StreamingClient<PoloniexAdapter>),
}

macro_rules! dispatch {
    ($self:expr, $client:ident => $body:expr) => {
        match $self {
            Self::Binance($client) => $body,
            Self::Bybit($client) => $body,
            Self::Kucoin($client) => $body,
            Self::Htx($client) => $body,
            Self::Coinex($client) => $body,
            Self::Poloniex($client) => $body,
        }
    };
}

impl MarketDataClientAny {
    /// Creates the client for `config.venue` and `config.market`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: VenueClientConfig, events: EventSender) -> Result<Self, VenueError> {
        let market = config.market;
        tracing::debug!(venue = %config.venue, %market, epoch = events.epoch(), "Creating client");

        Ok(match config.venue {
            Venue::Binance => {
                Self::Binance(StreamingClient::new(BinanceAdapter::new(market), config, events)?)
            }
            Venue::Bybit => {
                Self::Bybit(StreamingClient::new(BybitAdapter::new(market), config, events)?)
            }
            Venue::Kucoin => {
                Self::Kucoin(StreamingClient::new(KucoinAdapter::new(market), config, events)?)
            }
            Venue::Htx => Self::Htx(StreamingClient::new(HtxAdapter::new(market), config, events)?),
            Venue::Coinex => {
                Self::Coinex(StreamingClient::new(CoinexAdapter::new(market), config, events)?)
            }
            Venue::Poloniex => {
                Self::Poloniex(StreamingClient::new(PoloniexAdapter::new(market), config, events)?)
            }
        })
    }
}

/// Parses a venue name as accepted by [`create_client`].
///
/// # Errors
///
/// Returns [`VenueError::UnsupportedVenue`] if the name matches no supported venue.
pub fn parse_venue(name: &str) -> Result<Venue, VenueError> {
    Venue::from_str(name.trim()).map_err(|_| VenueError::UnsupportedVenue(name.to_string()))
}

/// Creates a market data client from a venue name (case-insensitive) and market type.
///
/// # Errors
///
/// Returns [`VenueError::UnsupportedVenue`] for an unknown venue name, or an error if the
/// client cannot be built.
pub fn create_client(
    venue: &str,
    market: MarketType,
    events: EventSender,
) -> Result<MarketDataClientAny, VenueError> {
    let venue = parse_venue(venue)?;
    MarketDataClientAny::new(VenueClientConfig::new(venue, market), events)
}

#[async_trait]
impl MarketDataClient for MarketDataClientAny {
    fn venue(&self) -> Venue {
        dispatch!(self, client => client.venue())
    }

    fn market(&self) -> MarketType {
        dispatch!(self, client => client.market())
    }

    fn epoch(&self) -> u64 {
        dispatch!(self, client => client.epoch())
    }

    fn status(&self) -> ConnectionStatus {
        dispatch!(self, client => client.status())
    }

    fn status_cell(&self) -> StatusCell {
        dispatch!(self, client => client.status_cell())
    }

    fn taker_fee(&self) -> f64 {
        dispatch!(self, client => client.taker_fee())
    }

    async fn fetch_initial_price(&self, symbol: &Symbol) -> Result<f64, VenueError> {
        dispatch!(self, client => client.fetch_initial_price(symbol).await)
    }

    async fn connect_ws(&self, symbol: &Symbol) -> Result<(), VenueError> {
        dispatch!(self, client => client.connect_ws(symbol).await)
    }

    fn close_ws(&self) {
        dispatch!(self, client => client.close_ws());
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strum::IntoEnumIterator;
    use tokio::sync::mpsc;

    use super::*;

    fn events() -> EventSender {
        let (tx, _rx) = mpsc::unbounded_channel();
        EventSender::new(1, tx)
    }

    #[rstest]
    #[case("binance", Venue::Binance)]
    #[case("Bybit", Venue::Bybit)]
    #[case("KUCOIN", Venue::Kucoin)]
    #[case("htx", Venue::Htx)]
    #[case(" coinex ", Venue::Coinex)]
    #[case("poloniex", Venue::Poloniex)]
    fn test_parse_venue(#[case] name: &str, #[case] expected: Venue) {
        assert_eq!(parse_venue(name).unwrap(), expected);
    }

    #[rstest]
    fn test_unsupported_venue_fails_fast() {
        let err = create_client("ftx", MarketType::Spot, events()).unwrap_err();

        assert!(matches!(err, VenueError::UnsupportedVenue(ref name) if name == "ftx"));
        assert_eq!(err.to_string(), "Unsupported exchange: ftx");
    }

    #[rstest]
    fn test_every_venue_and_market_is_constructible() {
        for venue in Venue::iter() {
            for market in [MarketType::Spot, MarketType::Futures] {
                let client = create_client(venue.as_ref(), market, events()).unwrap();

                assert_eq!(client.venue(), venue);
                assert_eq!(client.market(), market);
                assert_eq!(client.epoch(), 1);
                assert_eq!(client.status(), ConnectionStatus::Disconnected);
                assert!(!client.is_open_or_connecting());
            }
        }
    }

    #[rstest]
    #[case(Venue::Binance, MarketType::Futures, 0.0004)]
    #[case(Venue::Poloniex, MarketType::Spot, 0.0015)]
    fn test_taker_fee(#[case] venue: Venue, #[case] market: MarketType, #[case] expected: f64) {
        let client = create_client(venue.as_ref(), market, events()).unwrap();
        assert_eq!(client.taker_fee(), expected);
    }

    #[rstest]
    fn test_close_ws_is_idempotent_when_never_connected() {
        let client = create_client("bybit", MarketType::Spot, events()).unwrap();

        client.close_ws();
        client.close_ws();

        assert_eq!(client.status(), ConnectionStatus::Disconnected);
    }
}
