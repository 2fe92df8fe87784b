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

//! Parsing helpers for venue payloads.

use std::io::Read;

use flate2::read::GzDecoder;
use poscalc_core::parsing::pointer_to_f64;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

/// Extracts a strictly positive price at the JSON `pointer` within `payload`.
#[must_use]
pub fn price_at(payload: &Value, pointer: &str) -> Option<f64> {
    pointer_to_f64(payload, pointer).filter(|price| *price > 0.0)
}

/// Returns the text of a frame, accepting UTF-8 binary frames.
#[must_use]
pub fn frame_text(message: Message) -> Option<String> {
    match message {
        Message::Text(text) => Some(text.as_str().to_string()),
        Message::Binary(data) => String::from_utf8(data.to_vec()).ok(),
        _ => None,
    }
}

/// Largest decompressed frame accepted from a venue, in bytes.
pub const MAX_DECODED_FRAME: u64 = 1024 * 1024;

/// Decompresses a gzip frame into text.
///
/// Frames inflating to [`MAX_DECODED_FRAME`] bytes or more are dropped.
#[must_use]
pub fn decode_gzip(data: &[u8]) -> Option<String> {
    decode_gzip_capped(data, MAX_DECODED_FRAME)
}

fn decode_gzip_capped(data: &[u8], limit: u64) -> Option<String> {
    let mut decoder = GzDecoder::new(data).take(limit);
    let mut text = String::new();
    match decoder.read_to_string(&mut text) {
        Ok(n) if (n as u64) < limit => Some(text),
        Ok(n) => {
            tracing::warn!(bytes = n, limit, "Dropping oversized frame");
            None
        }
        Err(e) => {
            tracing::debug!("Failed to decompress frame: {e}");
            None
        }
    }
}
