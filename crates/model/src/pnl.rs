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

//! Unrealized PnL against a live price.

use std::fmt::{Display, Formatter};

use poscalc_core::{consts::PLACEHOLDER, format::format_fixed};
use serde::{Deserialize, Serialize};

/// Decimals used when rendering unrealized PnL and cost.
pub const PNL_DISPLAY_DECIMALS: usize = 8;

/// The result of an unrealized PnL computation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PnlEstimate {
    /// Inputs were sufficient to compute PnL.
    Computed {
        /// `last*pos - avg*pos - last*taker_fee*pos`.
        unrealized_pnl: f64,
        /// Notional cost `|pos * last|`.
        cost: f64,
    },
    /// The price is not finite, or the position or its average price is unknown or flat.
    NotComputable,
}

impl PnlEstimate {
    #[must_use]
    pub const fn is_computable(&self) -> bool {
        matches!(self, Self::Computed { .. })
    }

    #[must_use]
    pub const fn unrealized_pnl(&self) -> Option<f64> {
        match self {
            Self::Computed { unrealized_pnl, .. } => Some(*unrealized_pnl),
            Self::NotComputable => None,
        }
    }

    #[must_use]
    pub const fn cost(&self) -> Option<f64> {
        match self {
            Self::Computed { cost, .. } => Some(*cost),
            Self::NotComputable => None,
        }
    }
}

impl Display for PnlEstimate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Computed { unrealized_pnl, .. } => {
                f.write_str(&format_fixed(*unrealized_pnl, PNL_DISPLAY_DECIMALS))
            }
            Self::NotComputable => f.write_str(PLACEHOLDER),
        }
    }
}

/// Computes the unrealized PnL of `position` held at `avg_price` against `last_price`.
///
/// A taker fee on the exit notional is deducted. Returns [`PnlEstimate::NotComputable`]
/// instead of failing on unusable inputs.
#[must_use]
pub fn compute_unrealized_pnl(
    last_price: f64,
    avg_price: Option<f64>,
    position: Option<f64>,
    taker_fee: f64,
) -> PnlEstimate {
    let (Some(avg), Some(pos)) = (avg_price, position) else {
        return PnlEstimate::NotComputable;
    };

    if !last_price.is_finite() || !avg.is_finite() || !pos.is_finite() || !taker_fee.is_finite()
    {
        return PnlEstimate::NotComputable;
    }

    if pos == 0.0 {
        return PnlEstimate::NotComputable;
    }

    PnlEstimate::Computed {
        unrealized_pnl: last_price * pos - avg * pos - last_price * taker_fee * pos,
        cost: (pos * last_price).abs(),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_long_position() {
        let estimate = compute_unrealized_pnl(110.0, Some(100.0), Some(2.0), 0.001);

        let pnl = estimate.unrealized_pnl().unwrap();
        assert!((pnl - (220.0 - 200.0 - 0.22)).abs() < 1e-12);
        assert_eq!(estimate.cost(), Some(220.0));
    }

    #[rstest]
    fn test_short_position_cost_is_absolute() {
        let estimate = compute_unrealized_pnl(90.0, Some(100.0), Some(-1.0), 0.0);

        assert_eq!(estimate.unrealized_pnl(), Some(10.0));
        assert_eq!(estimate.cost(), Some(90.0));
    }

    #[rstest]
    #[case(f64::NAN, Some(100.0), Some(1.0))]
    #[case(f64::INFINITY, Some(100.0), Some(1.0))]
    #[case(100.0, None, Some(1.0))]
    #[case(100.0, Some(100.0), None)]
    #[case(100.0, Some(100.0), Some(0.0))]
    #[case(100.0, Some(f64::NAN), Some(1.0))]
    fn test_not_computable(
        #[case] last: f64,
        #[case] avg: Option<f64>,
        #[case] pos: Option<f64>,
    ) {
        let estimate = compute_unrealized_pnl(last, avg, pos, 0.001);
        assert_eq!(estimate, PnlEstimate::NotComputable);
        assert_eq!(estimate.to_string(), "\u{2014}");
    }

    #[rstest]
    fn test_display_fixed_decimals() {
        let estimate = compute_unrealized_pnl(101.0, Some(100.0), Some(1.0), 0.0);
        assert_eq!(estimate.to_string(), "1.00000000");
    }
}
