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

//! Functions for correctness checks similar to the *design by contract* philosophy.
//!
//! An [`anyhow::Result`] is returned with a descriptive message when the
//! condition check fails.

use anyhow::{Result, bail};

/// A message prefix that can be used with calls to `expect` or other assertion-related functions.
pub const FAILED: &str = "Condition failed:";

/// Validates the content of a string `s`.
///
/// # Errors
///
/// Returns an error if:
/// - `s` is an empty string.
/// - `s` consists solely of whitespace characters.
/// - `s` contains one or more non-ASCII characters.
pub fn check_valid_string(s: &str, desc: &str) -> Result<()> {
    if s.is_empty() {
        bail!("{FAILED} invalid string for '{desc}', was empty")
    } else if s.chars().all(char::is_whitespace) {
        bail!("{FAILED} invalid string for '{desc}', was all whitespace")
    } else if !s.is_ascii() {
        bail!("{FAILED} invalid string for '{desc}' contained a non-ASCII char, was '{s}'")
    }
    Ok(())
}

/// Validates that the `f64` value is finite.
///
/// # Errors
///
/// Returns an error if `value` is NaN or infinite.
pub fn check_f64_finite(value: f64, desc: &str) -> Result<()> {
    if !value.is_finite() {
        bail!("{FAILED} invalid f64 for '{desc}', was {value}")
    }
    Ok(())
}

/// Validates that the `f64` value is finite and non-negative.
///
/// # Errors
///
/// Returns an error if `value` is not finite or is negative.
pub fn check_f64_non_negative(value: f64, desc: &str) -> Result<()> {
    check_f64_finite(value, desc)?;
    if value < 0.0 {
        bail!("{FAILED} invalid f64 for '{desc}' negative, was {value}")
    }
    Ok(())
}

/// Validates that the `f64` value is in the inclusive range [`l`, `r`].
///
/// # Errors
///
/// Returns an error if `value` is not finite or falls outside the range.
pub fn check_f64_in_range_inclusive(value: f64, l: f64, r: f64, desc: &str) -> Result<()> {
    check_f64_finite(value, desc)?;
    if value < l || value > r {
        bail!("{FAILED} invalid f64 for '{desc}' not in range [{l}, {r}], was {value}")
    }
    Ok(())
}

/// Validates that the `u64` value is positive (> 0).
///
/// # Errors
///
/// Returns an error if `value` is zero.
pub fn check_positive_u64(value: u64, desc: &str) -> Result<()> {
    if value == 0 {
        bail!("{FAILED} invalid u64 for '{desc}' not positive, was {value}")
    }
    Ok(())
}
