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

//! Transactions: the immutable inputs to position accounting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    enums::{MarketType, TradeAction, TransactionKind},
    error::{ModelError, ModelResult},
    identifiers::TransactionId,
};

/// A single trade or funding payment belonging to a position.
///
/// `volume` is signed: positive for buys, negative for sells and zero for funding.
/// `fee_base` is charged in base units (spot buys), `fee_quote` in quote units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(default)]
    pub kind: TransactionKind,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub fee_base: f64,
    #[serde(default)]
    pub fee_quote: f64,
    #[serde(default)]
    pub funding: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Creates a new trade [`Transaction`].
    #[must_use]
    pub const fn trade(
        id: TransactionId,
        price: f64,
        volume: f64,
        fee_base: f64,
        fee_quote: f64,
    ) -> Self {
        Self {
            id,
            kind: TransactionKind::Trade,
            price,
            volume,
            fee_base,
            fee_quote,
            funding: 0.0,
            ts: None,
        }
    }

    /// Creates a new funding [`Transaction`].
    #[must_use]
    pub const fn funding(id: TransactionId, funding: f64) -> Self {
        Self {
            id,
            kind: TransactionKind::Funding,
            price: 0.0,
            volume: 0.0,
            fee_base: 0.0,
            fee_quote: 0.0,
            funding,
            ts: None,
        }
    }

    #[must_use]
    pub const fn with_ts(mut self, ts: DateTime<Utc>) -> Self {
        self.ts = Some(ts);
        self
    }

    #[must_use]
    pub const fn is_funding(&self) -> bool {
        matches!(self.kind, TransactionKind::Funding)
    }

    /// Validates the transaction for accounting.
    ///
    /// # Errors
    ///
    /// Returns an error if any numeric field is non-finite, or a funding transaction
    /// carries a non-zero volume.
    pub fn validate(&self) -> ModelResult<()> {
        for (field, value) in [
            ("price", self.price),
            ("volume", self.volume),
            ("fee_base", self.fee_base),
            ("fee_quote", self.fee_quote),
            ("funding", self.funding),
        ] {
            if !value.is_finite() {
                return Err(ModelError::NonFiniteValue {
                    id: self.id,
                    field,
                    value,
                });
            }
        }

        if self.is_funding() && self.volume != 0.0 {
            return Err(ModelError::FundingWithVolume {
                id: self.id,
                volume: self.volume,
            });
        }

        Ok(())
    }
}

/// A transaction as entered by a user, before normalisation.
///
/// Quantities may carry either sign; the trade action decides the volume sign.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    #[serde(default)]
    pub kind: TransactionKind,
    #[serde(default)]
    pub action: Option<TradeAction>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub fee_base: Option<f64>,
    #[serde(default)]
    pub fee_quote: Option<f64>,
    #[serde(default)]
    pub funding: Option<f64>,
    #[serde(default)]
    pub ts: Option<DateTime<Utc>>,
}

impl TransactionDraft {
    /// Creates a trade draft.
    #[must_use]
    pub const fn trade(action: TradeAction, price: f64, volume: f64) -> Self {
        Self {
            kind: TransactionKind::Trade,
            action: Some(action),
            price: Some(price),
            volume: Some(volume),
            fee_base: None,
            fee_quote: None,
            funding: None,
            ts: None,
        }
    }

    /// Creates a funding draft.
    #[must_use]
    pub const fn funding(amount: f64) -> Self {
        Self {
            kind: TransactionKind::Funding,
            action: None,
            price: None,
            volume: None,
            fee_base: None,
            fee_quote: None,
            funding: Some(amount),
            ts: None,
        }
    }

    #[must_use]
    pub const fn with_fee_base(mut self, fee: f64) -> Self {
        self.fee_base = Some(fee);
        self
    }

    #[must_use]
    pub const fn with_fee_quote(mut self, fee: f64) -> Self {
        self.fee_quote = Some(fee);
        self
    }

    /// Normalises the draft into a [`Transaction`] for a position of the given `market`.
    ///
    /// - The volume sign follows the action (buy positive, sell negative).
    /// - Price and fees are taken as absolute values.
    /// - Spot buys keep only the base fee; spot sells and futures trades keep only the quote fee.
    /// - Funding is accepted for futures only and never carries volume.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing or non-finite, or funding is
    /// drafted for a spot position.
    pub fn normalize(self, id: TransactionId, market: MarketType) -> ModelResult<Transaction> {
        let tx = match self.kind {
            TransactionKind::Funding => {
                if market.is_spot() {
                    return Err(ModelError::FundingNotSupported(market));
                }
                let funding = required(self.funding, "funding")?;
                Transaction::funding(id, funding)
            }
            TransactionKind::Trade => {
                let action = self.action.ok_or(ModelError::MissingField("action"))?;
                let price = required(self.price, "price")?.abs();
                let volume = action.signed(required(self.volume, "volume")?);

                match (market, action) {
                    (MarketType::Spot, TradeAction::Buy) => {
                        let fee_base = required(self.fee_base, "fee_base")?.abs();
                        if fee_base > volume {
                            return Err(ModelError::InvalidField {
                                field: "fee_base",
                                reason: format!("fee {fee_base} exceeds volume {volume}"),
                            });
                        }
                        Transaction::trade(id, price, volume, fee_base, 0.0)
                    }
                    _ => {
                        let fee_quote = required(self.fee_quote, "fee_quote")?.abs();
                        Transaction::trade(id, price, volume, 0.0, fee_quote)
                    }
                }
            }
        };

        let tx = match self.ts {
            Some(ts) => tx.with_ts(ts),
            None => tx,
        };
        tx.validate()?;
        Ok(tx)
    }
}

fn required(value: Option<f64>, field: &'static str) -> ModelResult<f64> {
    match value {
        None => Err(ModelError::MissingField(field)),
        Some(v) if !v.is_finite() => Err(ModelError::InvalidField {
            field,
            reason: format!("was {v}"),
        }),
        Some(v) => Ok(v),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn id() -> TransactionId {
        TransactionId::new(1)
    }

    #[rstest]
    fn test_futures_sell_is_negated_and_keeps_quote_fee() {
        let draft = TransactionDraft::trade(TradeAction::Sell, -100.0, 2.0)
            .with_fee_quote(-0.5)
            .with_fee_base(0.1);
        let tx = draft.normalize(id(), MarketType::Futures).unwrap();
        assert_eq!(tx.price, 100.0);
        assert_eq!(tx.volume, -2.0);
        assert_eq!(tx.fee_quote, 0.5);
        assert_eq!(tx.fee_base, 0.0);
    }

    #[rstest]
    fn test_spot_buy_keeps_base_fee_only() {
        let draft = TransactionDraft::trade(TradeAction::Buy, 100.0, -10.0)
            .with_fee_base(0.01)
            .with_fee_quote(3.0);
        let tx = draft.normalize(id(), MarketType::Spot).unwrap();
        assert_eq!(tx.volume, 10.0);
        assert_eq!(tx.fee_base, 0.01);
        assert_eq!(tx.fee_quote, 0.0);
    }

    #[rstest]
    fn test_spot_sell_requires_quote_fee() {
        let draft = TransactionDraft::trade(TradeAction::Sell, 100.0, 1.0).with_fee_base(0.1);
        let err = draft.normalize(id(), MarketType::Spot).unwrap_err();
        assert_eq!(err, ModelError::MissingField("fee_quote"));
    }

    #[rstest]
    fn test_spot_buy_rejects_fee_above_volume() {
        let draft = TransactionDraft::trade(TradeAction::Buy, 100.0, 1.0).with_fee_base(2.0);
        assert!(matches!(
            draft.normalize(id(), MarketType::Spot),
            Err(ModelError::InvalidField { field: "fee_base", .. })
        ));
    }

    #[rstest]
    fn test_trade_requires_action() {
        let draft = TransactionDraft {
            price: Some(1.0),
            volume: Some(1.0),
            fee_quote: Some(0.0),
            ..Default::default()
        };
        assert_eq!(
            draft.normalize(id(), MarketType::Futures).unwrap_err(),
            ModelError::MissingField("action")
        );
    }

    #[rstest]
    fn test_funding_on_futures() {
        let tx = TransactionDraft::funding(-1.25)
            .normalize(id(), MarketType::Futures)
            .unwrap();
        assert!(tx.is_funding());
        assert_eq!(tx.funding, -1.25);
        assert_eq!(tx.volume, 0.0);
    }

    #[rstest]
    fn test_funding_on_spot_is_rejected() {
        assert_eq!(
            TransactionDraft::funding(1.0)
                .normalize(id(), MarketType::Spot)
                .unwrap_err(),
            ModelError::FundingNotSupported(MarketType::Spot)
        );
    }

    #[rstest]
    fn test_validate_rejects_funding_with_volume() {
        let mut tx = Transaction::funding(id(), 5.0);
        tx.volume = 1.0;
        assert_eq!(
            tx.validate().unwrap_err(),
            ModelError::FundingWithVolume {
                id: id(),
                volume: 1.0
            }
        );
    }

    #[rstest]
    fn test_validate_rejects_non_finite() {
        let tx = Transaction::trade(id(), f64::NAN, 1.0, 0.0, 0.0);
        assert!(matches!(
            tx.validate(),
            Err(ModelError::NonFiniteValue { field: "price", .. })
        ));
    }

    #[rstest]
    fn test_deserialize_with_defaults() {
        let tx: Transaction =
            serde_json::from_str(r#"{"id": 3, "kind": "FUNDING", "funding": 2.5}"#).unwrap();
        assert_eq!(tx, Transaction::funding(TransactionId::new(3), 2.5));
    }
}
