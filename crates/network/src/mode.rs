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

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tokio::sync::watch;

/// Connection status of a market data stream.
///
/// Transitions are published through a [`StatusCell`] so observers can await changes.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Hash,
    PartialEq,
    Eq,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    /// No connection exists and none is being attempted.
    Disconnected = 0,
    /// A connection attempt is in flight.
    Connecting = 1,
    /// The stream is open and subscribed.
    Connected = 2,
    /// The stream was dropped (e.g. heartbeat timeout) and a new connection is expected.
    Reconnecting = 3,
    /// The last connection attempt or stream failed.
    Error = 4,
}

impl ConnectionStatus {
    /// Convert a u8 to [`ConnectionStatus`], returning `None` for unknown values.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disconnected),
            1 => Some(Self::Connecting),
            2 => Some(Self::Connected),
            3 => Some(Self::Reconnecting),
            4 => Some(Self::Error),
            _ => None,
        }
    }

    /// Convert a [`ConnectionStatus`] to a u8.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns true if the stream is open or an open is in flight.
    #[inline]
    #[must_use]
    pub const fn is_open_or_connecting(&self) -> bool {
        matches!(self, Self::Connected | Self::Connecting)
    }

    #[inline]
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    #[inline]
    #[must_use]
    pub const fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

/// A shared, observable [`ConnectionStatus`].
///
/// Clones share the same underlying value.
#[derive(Clone, Debug)]
pub struct StatusCell {
    tx: Arc<watch::Sender<ConnectionStatus>>,
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new(ConnectionStatus::Disconnected)
    }
}

impl StatusCell {
    /// Creates a new [`StatusCell`] holding `initial`.
    #[must_use]
    pub fn new(initial: ConnectionStatus) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn get(&self) -> ConnectionStatus {
        *self.tx.borrow()
    }

    /// Publishes `status`, returning the previous value.
    pub fn set(&self, status: ConnectionStatus) -> ConnectionStatus {
        let previous = self.tx.send_replace(status);
        if previous != status {
            tracing::debug!(from = %previous, to = %status, "Connection status changed");
        }
        previous
    }

    /// Publishes `status` only if `predicate` holds for the current value.
    ///
    /// The check and the update happen under the same lock, so concurrent callers
    /// cannot both observe the old value. Returns true if the status was updated.
    pub fn set_if<F>(&self, status: ConnectionStatus, predicate: F) -> bool
    where
        F: FnOnce(ConnectionStatus) -> bool,
    {
        let mut previous = None;
        let updated = self.tx.send_if_modified(|current| {
            if predicate(*current) {
                previous = Some(*current);
                *current = status;
                true
            } else {
                false
            }
        });

        if let Some(previous) = previous
            && previous != status
        {
            tracing::debug!(from = %previous, to = %status, "Connection status changed");
        }
        updated
    }

    /// Returns a receiver notified on every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.tx.subscribe()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ConnectionStatus::Disconnected)]
    #[case(ConnectionStatus::Connecting)]
    #[case(ConnectionStatus::Connected)]
    #[case(ConnectionStatus::Reconnecting)]
    #[case(ConnectionStatus::Error)]
    fn test_u8_conversion(#[case] status: ConnectionStatus) {
        assert_eq!(ConnectionStatus::from_u8(status.as_u8()), Some(status));
    }

    #[rstest]
    fn test_invalid_u8() {
        assert_eq!(ConnectionStatus::from_u8(9), None);
    }

    #[rstest]
    #[case(ConnectionStatus::Connecting, true)]
    #[case(ConnectionStatus::Connected, true)]
    #[case(ConnectionStatus::Reconnecting, false)]
    #[case(ConnectionStatus::Error, false)]
    #[case(ConnectionStatus::Disconnected, false)]
    fn test_is_open_or_connecting(#[case] status: ConnectionStatus, #[case] expected: bool) {
        assert_eq!(status.is_open_or_connecting(), expected);
    }

    #[rstest]
    fn test_strings() {
        assert_eq!(ConnectionStatus::Reconnecting.to_string(), "reconnecting");
        assert_eq!(
            ConnectionStatus::from_str("connected").unwrap(),
            ConnectionStatus::Connected
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_status_cell_notifies_subscribers() {
        let cell = StatusCell::default();
        let mut rx = cell.subscribe();

        let previous = cell.clone().set(ConnectionStatus::Connecting);

        assert_eq!(previous, ConnectionStatus::Disconnected);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectionStatus::Connecting);
        assert_eq!(cell.get(), ConnectionStatus::Connecting);
    }

    #[rstest]
    fn test_set_if_only_applies_when_predicate_holds() {
        let cell = StatusCell::default();
        let begin = |cell: &StatusCell| {
            cell.set_if(ConnectionStatus::Connecting, |s| !s.is_open_or_connecting())
        };

        assert!(begin(&cell));
        assert!(!begin(&cell));
        assert_eq!(cell.get(), ConnectionStatus::Connecting);
    }
}
