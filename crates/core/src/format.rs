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

//! Adaptive-precision formatting for prices and PnL figures.

use crate::consts::PLACEHOLDER;

/// Removes trailing fractional zeros (and a dangling decimal point) from `s`.
///
/// Strings in exponent notation are returned unchanged.
#[must_use]
pub fn trim_trailing_zeros(s: &str) -> String {
    if s.contains('e') || !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Formats a price with a precision that adapts to its magnitude.
///
/// - `None` renders the placeholder.
/// - Non-finite values render as their raw representation.
/// - `|value| >= 1` uses 4 decimals, `|value| >= 1e-6` uses 6 significant digits,
///   anything smaller uses exponent notation with 3 fractional digits.
///
/// Trailing zeros are trimmed.
#[must_use]
pub fn format_adaptive_price(value: Option<f64>) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };

    if !value.is_finite() {
        return value.to_string();
    }

    if value == 0.0 {
        return "0".to_string();
    }

    let abs = value.abs();
    let formatted = if abs >= 1.0 {
        format!("{value:.4}")
    } else if abs >= 1e-6 {
        format_significant(value, 6)
    } else {
        format!("{value:.3e}")
    };

    trim_trailing_zeros(&formatted)
}

/// Formats `value` with `digits` significant digits in positional notation.
///
/// Only meaningful for non-zero finite values.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_significant(value: f64, digits: u32) -> String {
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (digits as i32 - 1 - magnitude).max(0) as usize;
    format!("{value:.decimals$}")
}

/// Formats `value` with a fixed number of `decimals`.
#[must_use]
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// Formats `value` with a fixed number of `decimals`, prefixing positive values with `+`.
#[must_use]
pub fn format_signed(value: f64, decimals: usize) -> String {
    if value > 0.0 {
        format!("+{value:.decimals$}")
    } else {
        format!("{value:.decimals$}")
    }
}

/// Formats an optional value with fixed `decimals`, rendering `None` as the placeholder.
#[must_use]
pub fn format_fixed_or_placeholder(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format_fixed(v, decimals))
}
