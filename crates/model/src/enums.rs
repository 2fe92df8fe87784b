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

//! Enumerations for the position accounting domain model.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The market type of a position, selecting the accounting recurrence.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum MarketType {
    /// Spot market: fees may be charged in base units on buys.
    #[default]
    Spot,
    /// Futures market (perpetual swaps): fees in quote units, funding payments apply.
    Futures,
}

impl MarketType {
    /// Parses a market label where `SPOT` (any case) is spot and every other label is futures.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("SPOT") {
            Self::Spot
        } else {
            Self::Futures
        }
    }

    #[must_use]
    pub const fn is_spot(&self) -> bool {
        matches!(self, Self::Spot)
    }
}

impl From<String> for MarketType {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

/// The kind of a transaction.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    Hash,
    PartialEq,
    Eq,
    AsRefStr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// A buy or sell fill.
    #[default]
    Trade,
    /// A periodic funding payment (futures only).
    Funding,
}

/// The side of a trade as entered by the user.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    AsRefStr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    /// Applies the action's sign to an unsigned quantity.
    #[must_use]
    pub fn signed(&self, quantity: f64) -> f64 {
        match self {
            Self::Buy => quantity.abs(),
            Self::Sell => -quantity.abs(),
        }
    }
}

/// The lifecycle status of a position.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    Hash,
    PartialEq,
    Eq,
    AsRefStr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    #[default]
    Open,
    #[strum(to_string = "CLOSE", serialize = "CLOSED")]
    #[serde(rename = "CLOSE", alias = "CLOSED")]
    Closed,
}

impl PositionStatus {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// A supported trading venue.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Binance,
    Bybit,
    Kucoin,
    Htx,
    Coinex,
    Poloniex,
}
