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

//! Exponential backoff with jitter for reconnection delays.
//!
//! The delay starts from an initial value and grows by a factor on every attempt up to a
//! maximum. Random jitter is added to each returned delay so that clients dropped together
//! do not reconnect in lockstep.

use std::time::Duration;

use poscalc_core::correctness::{check_f64_in_range_inclusive, check_positive_u64};
use rand::RngExt;

/// An exponential backoff mechanism with optional jitter.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    /// The initial backoff delay.
    delay_initial: Duration,
    /// The maximum delay to cap the backoff.
    delay_max: Duration,
    /// The current backoff delay.
    delay_current: Duration,
    /// The factor to multiply the delay on each iteration.
    factor: f64,
    /// The maximum random jitter to add (in milliseconds).
    jitter_ms: u64,
    /// The number of delays handed out since the last reset.
    attempts: u32,
}

impl ExponentialBackoff {
    /// Creates a new [`ExponentialBackoff`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `delay_initial` is zero.
    /// - `delay_max` is less than `delay_initial`.
    /// - `factor` is not in the range [1.0, 100.0].
    pub fn new(
        delay_initial: Duration,
        delay_max: Duration,
        factor: f64,
        jitter_ms: u64,
    ) -> anyhow::Result<Self> {
        check_positive_u64(delay_initial.as_millis() as u64, "delay_initial")?;
        anyhow::ensure!(
            delay_max >= delay_initial,
            "delay_max ({delay_max:?}) must be >= delay_initial ({delay_initial:?})"
        );
        check_f64_in_range_inclusive(factor, 1.0, 100.0, "factor")?;

        Ok(Self {
            delay_initial,
            delay_max,
            delay_current: delay_initial,
            factor,
            jitter_ms,
            attempts: 0,
        })
    }

    /// Returns the next backoff delay with jitter and advances the internal state.
    pub fn next_duration(&mut self) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.jitter_ms)
        };
        let delay_with_jitter = self.delay_current + Duration::from_millis(jitter);

        let next_nanos = (self.delay_current.as_nanos() as f64 * self.factor) as u128;
        let capped = next_nanos.min(self.delay_max.as_nanos());
        self.delay_current = Duration::from_nanos(capped as u64);
        self.attempts = self.attempts.saturating_add(1);

        delay_with_jitter
    }

    /// Resets the backoff to its initial state.
    pub const fn reset(&mut self) {
        self.delay_current = self.delay_initial;
        self.attempts = 0;
    }

    /// Returns the base delay (without jitter) the next call to [`Self::next_duration`] uses.
    #[must_use]
    pub const fn current_delay(&self) -> Duration {
        self.delay_current
    }

    /// Returns the number of delays handed out since the last reset.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}
