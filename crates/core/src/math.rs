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

//! Floating point helpers used by the accounting recurrence.

/// Checks if two floating-point numbers are approximately equal within the given epsilon.
///
/// # Examples
///
/// ```
/// use poscalc_core::approx_eq;
///
/// assert!(approx_eq!(f64, 0.1 + 0.2, 0.3, epsilon = 1e-12));
/// ```
#[macro_export]
macro_rules! approx_eq {
    ($type:ty, $left:expr, $right:expr, epsilon = $epsilon:expr) => {{
        let left_val: $type = $left;
        let right_val: $type = $right;
        (left_val - right_val).abs() < $epsilon
    }};
}

/// Returns the sign of `value` as `-1.0`, `0.0` or `1.0`.
///
/// Unlike [`f64::signum`] a zero (of either sign) maps to `0.0`.
#[inline]
#[must_use]
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Returns whether `value` is within `epsilon` of zero (inclusive).
#[inline]
#[must_use]
pub fn is_within_epsilon(value: f64, epsilon: f64) -> bool {
    value.abs() <= epsilon
}

/// Returns `0.0` when `value` is within `epsilon` of zero, otherwise `value`.
#[inline]
#[must_use]
pub fn normalize_zero(value: f64, epsilon: f64) -> f64 {
    if is_within_epsilon(value, epsilon) {
        0.0
    } else {
        value
    }
}
