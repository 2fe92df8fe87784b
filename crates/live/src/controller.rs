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

//! Supervision of the live price feed of one watched position.
//!
//! The [`ConnectionController`] owns at most one [`MarketDataClientAny`] at a time. Every
//! client it creates is tagged with a fresh connection epoch, so prices still in flight
//! from a superseded client can be told apart from current ones. Reconnection after a
//! lost stream is decided here rather than inside the client.

use std::fmt::Debug;

use poscalc_model::{enums::PositionStatus, identifiers::ExchangeIdentity};
use poscalc_network::{backoff::ExponentialBackoff, mode::ConnectionStatus};
use poscalc_venues::{
    client::{EventSender, MarketDataClient, MarketDataEvent, StreamLoss},
    error::VenueError,
    factory::MarketDataClientAny,
};
use tokio::{
    sync::mpsc,
    time::{Instant, sleep_until},
};

use crate::config::LiveConfig;

/// Supervises the market data client of the watched position.
pub struct ConnectionController {
    config: LiveConfig,
    tx: mpsc::UnboundedSender<MarketDataEvent>,
    rx: mpsc::UnboundedReceiver<MarketDataEvent>,
    client: Option<MarketDataClientAny>,
    identity: Option<ExchangeIdentity>,
    position_status: PositionStatus,
    last_epoch: u64,
    backoff: ExponentialBackoff,
    reconnect_at: Option<Instant>,
}

impl Debug for ConnectionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(ConnectionController))
            .field("identity", &self.identity)
            .field("position_status", &self.position_status)
            .field("epoch", &self.epoch())
            .field("status", &self.status())
            .field("reconnect_at", &self.reconnect_at)
            .finish()
    }
}

impl ConnectionController {
    /// Creates a new [`ConnectionController`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the reconnect backoff parameters are invalid.
    pub fn new(config: LiveConfig) -> anyhow::Result<Self> {
        let backoff = config.reconnect.backoff()?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            tx,
            rx,
            client: None,
            identity: None,
            position_status: PositionStatus::Open,
            last_epoch: 0,
            backoff,
            reconnect_at: None,
        })
    }

    /// Returns the epoch of the current client, if any.
    #[must_use]
    pub fn epoch(&self) -> Option<u64> {
        self.client.as_ref().map(MarketDataClient::epoch)
    }

    /// Returns the connection status of the current client.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.client
            .as_ref()
            .map_or(ConnectionStatus::Disconnected, MarketDataClient::status)
    }

    /// Returns the taker fee of the current client.
    #[must_use]
    pub fn taker_fee(&self) -> Option<f64> {
        self.client.as_ref().map(MarketDataClient::taker_fee)
    }

    #[must_use]
    pub const fn identity(&self) -> Option<ExchangeIdentity> {
        self.identity
    }

    #[must_use]
    pub const fn is_reconnect_pending(&self) -> bool {
        self.reconnect_at.is_some()
    }

    /// Returns the number of reconnect delays handed out since the last established connection.
    #[must_use]
    pub const fn reconnect_attempts(&self) -> u32 {
        self.backoff.attempts()
    }

    /// Reconciles the feed with the position's current `identity` and `status`.
    ///
    /// - Open, with no client or a different identity: the old client is closed, a new
    ///   one streams and fetches an initial price.
    /// - Open, with the same identity already open or connecting: nothing happens.
    /// - Not open: any stream is closed and a new client fetches a single initial price.
    ///
    /// Transport failures are logged and surfaced through [`Self::status`].
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be constructed.
    pub async fn refresh(
        &mut self,
        identity: ExchangeIdentity,
        status: PositionStatus,
    ) -> Result<(), VenueError> {
        self.position_status = status;
        let same_identity = self.identity == Some(identity) && self.client.is_some();

        if status.is_open() {
            if same_identity
                && self
                    .client
                    .as_ref()
                    .is_some_and(MarketDataClient::is_open_or_connecting)
            {
                tracing::debug!(%identity, "Feed already open");
                return Ok(());
            }

            self.reconnect_at = None;
            self.replace_client(identity)?;
            self.connect_and_fetch().await;
            return Ok(());
        }

        // A fresh epoch lets the fallback price supersede the last stream tick
        self.reconnect_at = None;
        self.replace_client(identity)?;
        if let Some(client) = &self.client
            && let Err(e) = client.fetch_initial_price(&identity.symbol).await
        {
            tracing::warn!(%identity, error = %e, "Initial price unavailable");
        }
        Ok(())
    }

    /// Waits for the next market data event, running due reconnects in the meantime.
    ///
    /// Stream losses for the current epoch schedule a reconnect while the position is open.
    /// Events from superseded epochs are returned unchanged so callers can discard them.
    pub async fn next_event(&mut self) -> Option<MarketDataEvent> {
        loop {
            let deadline = self.reconnect_at;

            tokio::select! {
                event = self.rx.recv() => {
                    let event = event?;
                    if let MarketDataEvent::StreamLost { epoch, reason } = &event {
                        self.handle_stream_lost(*epoch, reason);
                    }
                    return Some(event);
                }
                () = wait_for(deadline) => {
                    self.reconnect_at = None;
                    if let Err(e) = self.reconnect().await {
                        tracing::error!(error = %e, "Reconnect failed");
                    }
                }
            }
        }
    }

    /// Returns an already queued event without waiting.
    pub fn try_next_event(&mut self) -> Option<MarketDataEvent> {
        let event = self.rx.try_recv().ok()?;
        if let MarketDataEvent::StreamLost { epoch, reason } = &event {
            self.handle_stream_lost(*epoch, reason);
        }
        Some(event)
    }

    /// Closes the stream and drops the client.
    pub fn shutdown(&mut self) {
        self.reconnect_at = None;
        if let Some(client) = self.client.take() {
            client.close_ws();
            tracing::info!(epoch = client.epoch(), "Feed shut down");
        }
    }

    fn replace_client(&mut self, identity: ExchangeIdentity) -> Result<(), VenueError> {
        if let Some(previous) = self.client.take() {
            previous.close_ws();
        }

        self.last_epoch += 1;
        let events = EventSender::new(self.last_epoch, self.tx.clone());
        let client = MarketDataClientAny::new(self.config.client_config(&identity), events)?;

        tracing::debug!(%identity, epoch = self.last_epoch, "Created market data client");
        self.client = Some(client);
        self.identity = Some(identity);
        Ok(())
    }

    async fn connect_and_fetch(&mut self) {
        let (Some(client), Some(identity)) = (&self.client, self.identity) else {
            return;
        };

        let connected = match client.connect_ws(&identity.symbol).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%identity, error = %e, "Stream connection failed");
                false
            }
        };

        if let Err(e) = client.fetch_initial_price(&identity.symbol).await {
            tracing::warn!(%identity, error = %e, "Initial price unavailable");
        }

        if connected {
            self.backoff.reset();
        } else if self.position_status.is_open() {
            self.schedule_reconnect();
        }
    }

    async fn reconnect(&mut self) -> Result<(), VenueError> {
        let Some(identity) = self.identity else {
            return Ok(());
        };
        if !self.position_status.is_open() {
            return Ok(());
        }

        tracing::info!(%identity, attempt = self.backoff.attempts(), "Reconnecting");
        self.replace_client(identity)?;
        self.connect_and_fetch().await;
        Ok(())
    }

    fn handle_stream_lost(&mut self, epoch: u64, reason: &StreamLoss) {
        if self.epoch() != Some(epoch) {
            tracing::debug!(epoch, "Ignoring loss of superseded stream");
            return;
        }
        if !self.position_status.is_open() {
            return;
        }

        tracing::warn!(epoch, %reason, "Stream lost");
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect_at.is_some() {
            return;
        }

        let delay = self.backoff.next_duration();
        tracing::info!(delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
        self.reconnect_at = Some(Instant::now() + delay);
    }
}

impl Drop for ConnectionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
