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

//! The market data client capability set and its generic streaming implementation.
//!
//! A client delivers a single normalised price signal for one venue and market: an
//! initial REST price, then stream updates. Every event carries the epoch the client
//! was created with, so consumers can discard events from superseded clients.
//!
//! Clients never reconnect by themselves. When a stream is lost a
//! [`MarketDataEvent::StreamLost`] is emitted and the owner decides what to do.

use std::{
    fmt::Debug,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poscalc_model::{
    enums::{MarketType, Venue},
    identifiers::Symbol,
};
use poscalc_network::{
    heartbeat::HeartbeatMonitor,
    http::HttpClient,
    mode::{ConnectionStatus, StatusCell},
    websocket::{
        WebSocketConnection,
        config::WebSocketConfig,
        types::{DisconnectHandler, DisconnectReason, MessageHandler},
    },
};
use strum::{AsRefStr, Display};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::{
    adapter::{Endpoints, VenueAdapter},
    config::VenueClientConfig,
    error::VenueError,
};

/// Where a price came from.
#[derive(Clone, Copy, Debug, Display, AsRefStr, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum PriceSource {
    Rest,
    Stream,
}

/// A last-price observation tagged with the epoch of the client that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceUpdate {
    pub epoch: u64,
    pub price: f64,
    pub source: PriceSource,
    pub ts: DateTime<Utc>,
}

/// Why a stream stopped delivering prices without a local close.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum StreamLoss {
    /// Nothing was received for longer than the heartbeat timeout.
    HeartbeatTimeout,
    /// The server closed the stream.
    ServerClosed,
    /// The stream failed with a transport error.
    #[strum(to_string = "error: {0}")]
    Error(String),
}

/// Events emitted by a market data client.
#[derive(Clone, Debug, PartialEq)]
pub enum MarketDataEvent {
    Price(PriceUpdate),
    StreamLost { epoch: u64, reason: StreamLoss },
}

impl MarketDataEvent {
    /// Returns the epoch of the client that emitted the event.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        match self {
            Self::Price(update) => update.epoch,
            Self::StreamLost { epoch, .. } => *epoch,
        }
    }
}

/// Sends [`MarketDataEvent`]s stamped with a fixed epoch.
#[derive(Clone, Debug)]
pub struct EventSender {
    epoch: u64,
    tx: mpsc::UnboundedSender<MarketDataEvent>,
}

impl EventSender {
    #[must_use]
    pub const fn new(epoch: u64, tx: mpsc::UnboundedSender<MarketDataEvent>) -> Self {
        Self { epoch, tx }
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn send_price(&self, price: f64, source: PriceSource) {
        self.send(MarketDataEvent::Price(PriceUpdate {
            epoch: self.epoch,
            price,
            source,
            ts: Utc::now(),
        }));
    }

    pub fn send_loss(&self, reason: StreamLoss) {
        self.send(MarketDataEvent::StreamLost {
            epoch: self.epoch,
            reason,
        });
    }

    fn send(&self, event: MarketDataEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!("Event receiver dropped: {e}");
        }
    }
}

/// The capability set every market data client provides.
#[async_trait]
pub trait MarketDataClient: Debug + Send + Sync {
    fn venue(&self) -> Venue;

    fn market(&self) -> MarketType;

    /// The epoch stamped on every event this client emits.
    fn epoch(&self) -> u64;

    fn status(&self) -> ConnectionStatus;

    /// Returns a handle to the observable connection status.
    fn status_cell(&self) -> StatusCell;

    /// The taker fee rate applied to unrealized PnL.
    fn taker_fee(&self) -> f64;

    fn is_open_or_connecting(&self) -> bool {
        self.status().is_open_or_connecting()
    }

    /// Fetches the last price over REST and emits it as a [`PriceSource::Rest`] update.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response carries no price.
    async fn fetch_initial_price(&self, symbol: &Symbol) -> Result<f64, VenueError>;

    /// Opens and subscribes the price stream. A no-op while open or connecting.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream URL cannot be resolved or the connection fails.
    async fn connect_ws(&self, symbol: &Symbol) -> Result<(), VenueError>;

    /// Stops the heartbeat and closes the stream. Idempotent.
    ///
    /// No price events from the closed stream are emitted after this returns.
    fn close_ws(&self);
}

/// A [`MarketDataClient`] driven by a [`VenueAdapter`].
pub struct StreamingClient<A: VenueAdapter> {
    adapter: Arc<A>,
    config: VenueClientConfig,
    endpoints: Endpoints,
    http: HttpClient,
    status: StatusCell,
    heartbeat: HeartbeatMonitor,
    connection: Mutex<Option<Arc<WebSocketConnection>>>,
    generation: Arc<AtomicU64>,
    events: EventSender,
}

impl<A: VenueAdapter> Debug for StreamingClient<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(StreamingClient))
            .field("adapter", &self.adapter)
            .field("endpoints", &self.endpoints)
            .field("status", &self.status.get())
            .field("epoch", &self.events.epoch())
            .finish()
    }
}

impl<A: VenueAdapter> StreamingClient<A> {
    /// Creates a new [`StreamingClient`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        adapter: A,
        config: VenueClientConfig,
        events: EventSender,
    ) -> Result<Self, VenueError> {
        let endpoints = Endpoints::resolve(&adapter, &config);
        let http = HttpClient::new(config.http_timeout)?;
        let status = StatusCell::default();

        let mut heartbeat_config = adapter.heartbeat_config();
        if let Some(timeout) = config.heartbeat_timeout {
            heartbeat_config = heartbeat_config.with_timeout(timeout);
        }
        let heartbeat = HeartbeatMonitor::new(heartbeat_config, status.clone());

        Ok(Self {
            adapter: Arc::new(adapter),
            config,
            endpoints,
            http,
            status,
            heartbeat,
            connection: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
            events,
        })
    }

    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    #[must_use]
    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn message_handler(&self) -> MessageHandler {
        let adapter = self.adapter.clone();
        let heartbeat = self.heartbeat.clone();
        let events = self.events.clone();

        Arc::new(move |message: Message| {
            let Some(text) = adapter.decode_frame(message) else {
                return;
            };
            let Some(payload) = heartbeat.handle_message(&text) else {
                return;
            };
            if let Some(price) = adapter.parse_stream_price(&payload) {
                events.send_price(price, PriceSource::Stream);
            }
        })
    }

    fn disconnect_handler(&self, generation: u64) -> DisconnectHandler {
        let current = self.generation.clone();
        let heartbeat = self.heartbeat.clone();
        let status = self.status.clone();
        let events = self.events.clone();
        let venue = self.adapter.venue();

        Arc::new(move |reason: DisconnectReason| {
            if current.load(Ordering::SeqCst) != generation {
                return;
            }

            heartbeat.stop();

            let (next, loss) = match reason {
                DisconnectReason::ServerClosed => {
                    tracing::info!(%venue, "Stream closed by server");
                    (ConnectionStatus::Disconnected, StreamLoss::ServerClosed)
                }
                DisconnectReason::Error(e) => {
                    tracing::error!(%venue, error = %e, "Stream error");
                    (ConnectionStatus::Error, StreamLoss::Error(e))
                }
            };

            status.set(next);
            events.send_loss(loss);
        })
    }

    fn fail_connect(&self, generation: u64, error: &VenueError) {
        tracing::error!(
            venue = %self.adapter.venue(),
            market = %self.adapter.market(),
            error = %error,
            "Stream connection failed"
        );
        if self.generation.load(Ordering::SeqCst) == generation {
            self.status.set(ConnectionStatus::Error);
        }
    }

    fn subscribe(
        &self,
        generation: u64,
        connection: &WebSocketConnection,
        symbol: &Symbol,
    ) -> Result<(), VenueError> {
        let Some(message) = self.adapter.subscribe_message(symbol) else {
            return Ok(());
        };

        tracing::debug!(venue = %self.adapter.venue(), "Subscribing: {message}");
        if let Err(e) = connection.send_text(message) {
            let e = VenueError::from(e);
            if self.generation.load(Ordering::SeqCst) == generation {
                self.heartbeat.stop();
                self.replace_connection(None);
            }
            connection.close();
            self.fail_connect(generation, &e);
            return Err(e);
        }
        Ok(())
    }

    fn replace_connection(&self, connection: Option<Arc<WebSocketConnection>>) {
        let previous = match self.connection.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, connection),
            Err(_) => None,
        };
        if let Some(previous) = previous {
            previous.close();
        }
    }
}

#[async_trait]
impl<A: VenueAdapter> MarketDataClient for StreamingClient<A> {
    fn venue(&self) -> Venue {
        self.adapter.venue()
    }

    fn market(&self) -> MarketType {
        self.adapter.market()
    }

    fn epoch(&self) -> u64 {
        self.events.epoch()
    }

    fn status(&self) -> ConnectionStatus {
        self.status.get()
    }

    fn status_cell(&self) -> StatusCell {
        self.status.clone()
    }

    fn taker_fee(&self) -> f64 {
        self.config.taker_fee()
    }

    async fn fetch_initial_price(&self, symbol: &Symbol) -> Result<f64, VenueError> {
        let url = format!(
            "{}{}",
            self.endpoints.http_base,
            self.adapter.rest_price_path(symbol)
        );

        let payload = self.http.get_json(&url).await.map_err(|e| {
            tracing::warn!(
                venue = %self.adapter.venue(),
                url = %url,
                error = %e,
                "Initial price fetch failed"
            );
            VenueError::from(e)
        })?;

        let price = self
            .adapter
            .parse_rest_price(&payload)
            .ok_or_else(|| VenueError::PriceNotFound {
                venue: self.adapter.venue(),
                url: url.clone(),
            })?;

        tracing::debug!(venue = %self.adapter.venue(), %symbol, price, "Initial price");
        self.events.send_price(price, PriceSource::Rest);
        Ok(price)
    }

    async fn connect_ws(&self, symbol: &Symbol) -> Result<(), VenueError> {
        let venue = self.adapter.venue();

        if !self
            .status
            .set_if(ConnectionStatus::Connecting, |s| !s.is_open_or_connecting())
        {
            tracing::debug!(%venue, "Stream already open or connecting");
            return Ok(());
        }

        let generation = self.generation.load(Ordering::SeqCst);

        let url = match self
            .adapter
            .resolve_stream_url(&self.http, &self.endpoints, symbol)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                self.fail_connect(generation, &e);
                return Err(e);
            }
        };

        let connection = match WebSocketConnection::connect(
            WebSocketConfig::new(url.clone()),
            self.message_handler(),
            Some(self.disconnect_handler(generation)),
        )
        .await
        {
            Ok(connection) => Arc::new(connection),
            Err(e) => {
                let e = VenueError::from(e);
                self.fail_connect(generation, &e);
                return Err(e);
            }
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(%venue, "Stream closed while connecting");
            connection.close();
            return Ok(());
        }

        self.replace_connection(Some(connection.clone()));
        self.status.set(ConnectionStatus::Connected);

        let events = self.events.clone();
        let current = self.generation.clone();
        self.heartbeat.start(connection.clone(), move || {
            if current.load(Ordering::SeqCst) == generation {
                events.send_loss(StreamLoss::HeartbeatTimeout);
            }
        });

        self.subscribe(generation, &connection, symbol)?;

        tracing::info!(
            %venue,
            market = %self.adapter.market(),
            %symbol,
            url = %url,
            "Stream connected"
        );
        Ok(())
    }

    fn close_ws(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.heartbeat.stop();
        self.replace_connection(None);

        let previous = self.status.set(ConnectionStatus::Disconnected);
        if previous != ConnectionStatus::Disconnected {
            tracing::info!(venue = %self.adapter.venue(), "Stream closed");
        }
    }
}

impl<A: VenueAdapter> Drop for StreamingClient<A> {
    fn drop(&mut self) {
        self.close_ws();
    }
}
