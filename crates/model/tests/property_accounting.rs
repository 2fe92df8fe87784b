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

//! Property-based tests for the position accountant.
//!
//! These tests verify invariants that should hold for any transaction set:
//! - Folding is idempotent and independent of input order
//! - The final position equals the sum of net volumes
//! - The average price is always finite and only reported for open positions
//! - Folding a selection of every id equals folding the full set

use poscalc_model::{
    accounting::PositionAccountant,
    enums::MarketType,
    identifiers::TransactionId,
    transaction::Transaction,
};
use proptest::prelude::*;
use rstest::rstest;

fn market_strategy() -> impl Strategy<Value = MarketType> {
    prop_oneof![Just(MarketType::Spot), Just(MarketType::Futures)]
}

/// Generate a transaction body: (is_funding, price, volume, fee_base, fee_quote, funding).
fn transaction_strategy() -> impl Strategy<Value = (bool, f64, f64, f64, f64, f64)> {
    (
        prop::bool::weighted(0.2),
        1.0f64..=100_000.0,
        prop_oneof![-50.0f64..=-0.001, 0.001f64..=50.0],
        0.0f64..=0.0005,
        0.0f64..=10.0,
        -5.0f64..=5.0,
    )
}

fn transactions_strategy(market: MarketType) -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec(transaction_strategy(), 0..=25).prop_map(move |bodies| {
        bodies
            .into_iter()
            .enumerate()
            .map(|(i, (is_funding, price, volume, fee_base, fee_quote, funding))| {
                let id = TransactionId::new(i as u64 + 1);
                if is_funding && !market.is_spot() {
                    Transaction::funding(id, funding)
                } else if market.is_spot() && volume > 0.0 {
                    Transaction::trade(id, price, volume, fee_base.min(volume / 2.0), 0.0)
                } else {
                    Transaction::trade(id, price, volume, 0.0, fee_quote)
                }
            })
            .collect()
    })
}

fn market_and_transactions() -> impl Strategy<Value = (MarketType, Vec<Transaction>)> {
    market_strategy().prop_flat_map(|market| (Just(market), transactions_strategy(market)))
}

proptest! {
    /// Property: Folding twice yields identical state.
    #[rstest]
    fn fold_is_idempotent((market, txs) in market_and_transactions()) {
        let accountant = PositionAccountant::new(market);
        prop_assert_eq!(accountant.fold(&txs), accountant.fold(&txs));
    }

    /// Property: Any permutation of the input folds to the same state as sorted input.
    #[rstest]
    fn fold_is_order_invariant(
        (market, txs) in market_and_transactions(),
        seed in any::<u64>(),
    ) {
        let accountant = PositionAccountant::new(market);
        let mut shuffled = txs.clone();
        let len = shuffled.len();
        if len > 1 {
            // Deterministic Fisher-Yates driven by the seed
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state % (i as u64 + 1)) as usize;
                shuffled.swap(i, j);
            }
        }
        prop_assert_eq!(accountant.fold(&txs), accountant.fold(&shuffled));
    }

    /// Property: The position equals the running sum of net volumes.
    #[rstest]
    fn position_is_sum_of_net_volumes((market, txs) in market_and_transactions()) {
        let state = PositionAccountant::new(market).fold(&txs).unwrap();
        let expected: f64 = txs
            .iter()
            .map(|tx| {
                if market.is_spot() && tx.volume > 0.0 {
                    tx.volume - tx.fee_base
                } else {
                    tx.volume
                }
            })
            .fold(0.0, |acc, v| acc + v);
        prop_assert!((state.position - expected).abs() <= 1e-9 * (1.0 + expected.abs()));
    }

    /// Property: Average price never becomes NaN or infinite, and is hidden when flat.
    #[rstest]
    fn avg_price_is_finite_and_hidden_when_flat((market, txs) in market_and_transactions()) {
        let state = PositionAccountant::new(market).fold(&txs).unwrap();
        prop_assert!(state.avg_price.is_finite());
        prop_assert!(state.realized_pnl.is_finite());
        if state.is_flat() {
            prop_assert!(state.avg_price().is_none());
            prop_assert_eq!(state.normalized_position(), 0.0);
        }
    }

    /// Property: Selecting every transaction is the same as folding the full set.
    #[rstest]
    fn selecting_all_equals_full_fold((market, txs) in market_and_transactions()) {
        let accountant = PositionAccountant::new(market);
        let ids: Vec<TransactionId> = txs.iter().map(|tx| tx.id).collect();
        prop_assert_eq!(accountant.fold_selected(&txs, &ids), accountant.fold(&txs));
    }

    /// Property: The last ledger row agrees with the fold.
    #[rstest]
    fn replay_ends_at_fold((market, txs) in market_and_transactions()) {
        let accountant = PositionAccountant::new(market);
        let state = accountant.fold(&txs).unwrap();
        let ledger = accountant.replay(&txs).unwrap();
        prop_assert_eq!(ledger.len(), txs.len());
        if let Some(last) = ledger.last() {
            prop_assert_eq!(last.position, state.position);
            prop_assert_eq!(last.realized_pnl, state.realized_pnl);
            prop_assert_eq!(last.avg_price, state.avg_price());
        }
    }
}
