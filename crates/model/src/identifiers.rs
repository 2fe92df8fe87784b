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

//! Identifiers for transactions, positions and the instruments they track.

use std::fmt::{Display, Formatter};

use poscalc_core::correctness::{FAILED, check_valid_string};
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::enums::{MarketType, Venue};

/// Identifies a transaction; accounting order is strictly ascending by this value.
#[derive(
    Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TransactionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a position.
#[derive(
    Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PositionId(u64);

impl PositionId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for PositionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for PositionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-facing instrument symbol such as `BTC/USDT`, normalised to upper case.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(Ustr);

impl Symbol {
    /// Creates a new [`Symbol`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a valid string.
    pub fn new<S: AsRef<str>>(value: S) -> anyhow::Result<Self> {
        let value = value.as_ref().trim();
        check_valid_string(value, stringify!(value))?;
        Ok(Self(Ustr::from(&value.to_ascii_uppercase())))
    }

    /// Creates a new [`Symbol`] from a literal known to be valid.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not a valid string.
    #[must_use]
    pub fn from_static(value: &'static str) -> Self {
        Self::new(value).expect(FAILED)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the base and quote legs when the symbol uses a `/` separator.
    #[must_use]
    pub fn legs(&self) -> Option<(&str, &str)> {
        self.0.as_str().split_once('/')
    }

    /// Returns the symbol with any `/` separator removed, e.g. `BTCUSDT`.
    #[must_use]
    pub fn compact(&self) -> String {
        self.0.as_str().replace('/', "")
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = anyhow::Error;

    fn try_from(value: String) -> anyhow::Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0.to_string()
    }
}

/// The exchange identity a live price feed is bound to.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeIdentity {
    pub venue: Venue,
    pub market: MarketType,
    pub symbol: Symbol,
}

impl ExchangeIdentity {
    #[must_use]
    pub const fn new(venue: Venue, market: MarketType, symbol: Symbol) -> Self {
        Self {
            venue,
            market,
            symbol,
        }
    }
}

impl Display for ExchangeIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.venue, self.market, self.symbol)
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
    fn test_symbol_normalises_case() {
        let symbol = Symbol::new(" btc/usdt ").unwrap();
        assert_eq!(symbol.as_str(), "BTC/USDT");
        assert_eq!(symbol.legs(), Some(("BTC", "USDT")));
        assert_eq!(symbol.compact(), "BTCUSDT");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_symbol_invalid(#[case] value: &str) {
        assert!(Symbol::new(value).is_err());
    }

    #[rstest]
    fn test_symbol_serde() {
        let symbol: Symbol = serde_json::from_str("\"eth/usdt\"").unwrap();
        assert_eq!(serde_json::to_string(&symbol).unwrap(), "\"ETH/USDT\"");
        assert!(serde_json::from_str::<Symbol>("\"\"").is_err());
    }

    #[rstest]
    fn test_exchange_identity_display() {
        let identity = ExchangeIdentity::new(
            Venue::Bybit,
            MarketType::Futures,
            Symbol::new("BTC/USDT").unwrap(),
        );
        assert_eq!(identity.to_string(), "bybit:FUTURES:BTC/USDT");
    }

    #[rstest]
    fn test_ids_order() {
        assert!(TransactionId::new(1) < TransactionId::new(2));
        assert_eq!(PositionId::from(7).to_string(), "7");
    }
}
