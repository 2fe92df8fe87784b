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

//! Lenient numeric parsing for user input and venue payloads.
//!
//! Venue payloads report prices as JSON numbers, numeric strings or small objects
//! carrying the price under a well-known field. Every parser here returns `None`
//! instead of failing so callers can fall back to a placeholder.

use serde_json::Value;

/// Object fields probed (in order) when a price arrives wrapped in an object.
pub const PRICE_FIELDS: [&str; 3] = ["price", "last", "c"];

/// Parses a user or wire string into a finite `f64`.
///
/// Surrounding and embedded whitespace is ignored and a decimal comma is accepted.
/// Empty strings and a lone `-` parse to `None`.
#[must_use]
pub fn to_number_safe(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }

    let normalized: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Extracts a finite `f64` from a JSON value.
///
/// Numbers are taken as is, strings go through [`to_number_safe`], and objects are
/// probed for one of the [`PRICE_FIELDS`].
#[must_use]
pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => to_number_safe(s),
        Value::Object(map) => PRICE_FIELDS
            .iter()
            .find_map(|field| map.get(*field))
            .and_then(|inner| match inner {
                Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
                Value::String(s) => to_number_safe(s),
                _ => None,
            }),
        Value::Null | Value::Bool(_) | Value::Array(_) => None,
    }
}

/// Extracts a finite `f64` found at the JSON `pointer` within `value`.
#[must_use]
pub fn pointer_to_f64(value: &Value, pointer: &str) -> Option<f64> {
    value.pointer(pointer).and_then(value_to_f64)
}
