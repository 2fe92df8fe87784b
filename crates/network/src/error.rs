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

//! Error types for the network layer.

use thiserror::Error;

/// Error type for WebSocket connection failures.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The connection is closed or was never opened.
    #[error("WebSocket not connected")]
    NotConnected,

    /// Failed to hand a message to the writer task.
    #[error("WebSocket send error: {0}")]
    Send(String),

    /// Underlying transport error from the WebSocket implementation.
    #[error("WebSocket transport error: {0}")]
    Transport(String),

    /// The connection attempt did not complete in time.
    #[error("WebSocket connection timed out after {0}ms")]
    Timeout(u64),
}

impl From<tokio_tungstenite::tungstenite::Error> for NetworkError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

/// Error type for HTTP request failures.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The request could not be built or sent, or the response body could not be read.
    #[error("HTTP request error: {0}")]
    Request(String),

    /// The server responded with a non-success status.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<reqwest::Error> for HttpClientError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error.to_string())
    }
}

impl From<serde_json::Error> for HttpClientError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}
