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

//! Error types for the venue market data clients.

use poscalc_model::enums::Venue;
use poscalc_network::error::{HttpClientError, NetworkError};
use thiserror::Error;

/// The main error type for market data client operations.
#[derive(Debug, Error)]
pub enum VenueError {
    /// The venue name does not match any supported venue.
    #[error("Unsupported exchange: {0}")]
    UnsupportedVenue(String),

    /// REST transport errors.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpClientError),

    /// WebSocket transport errors.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] NetworkError),

    /// The response did not contain a usable price.
    #[error("No price found in {venue} response from {url}")]
    PriceNotFound { venue: Venue, url: String },

    /// The public stream token could not be obtained or was malformed.
    #[error("Stream token error: {0}")]
    Token(String),
}

impl VenueError {
    /// Returns true if retrying the operation later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::UnsupportedVenue(_))
    }
}
