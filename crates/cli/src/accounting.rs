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

//! The `fold` and `summary` commands.

use poscalc_core::format::{format_adaptive_price, format_signed};
use poscalc_model::{
    accounting::{AvgPriceResetReason, PositionAccountant, PositionState},
    enums::PositionStatus,
    identifiers::{PositionId, TransactionId},
    ledger::LedgerEntry,
    position::Position,
    store::{InMemoryStore, PositionStore, TransactionStore},
    summary::{PositionSummary, SelectionSummary},
    transaction::Transaction,
};
use poscalc_venues::factory::parse_venue;
use serde_json::json;
use tabled::{Table, Tabled, settings::Style};

use crate::{
    input::load_transactions,
    opt::{FoldOpt, MarketOpt, SummaryOpt, TransactionsOpt},
};

#[derive(Tabled)]
struct LedgerRow {
    id: TransactionId,
    kind: String,
    position: String,
    avg_price: String,
    realized_pnl: String,
    fee_quote: String,
    fee_base: String,
    funding: String,
}

impl From<&LedgerEntry> for LedgerRow {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.transaction_id,
            kind: entry.kind.to_string(),
            position: format_adaptive_price(Some(entry.position)),
            avg_price: format_adaptive_price(entry.avg_price),
            realized_pnl: format_signed(entry.realized_pnl, 2),
            fee_quote: format_adaptive_price(Some(entry.totals.fee_quote)),
            fee_base: format_adaptive_price(Some(entry.totals.fee_base)),
            funding: format_adaptive_price(Some(entry.totals.funding)),
        }
    }
}

#[derive(Tabled)]
struct FieldRow {
    field: &'static str,
    value: String,
}

/// Renders ledger entries as a table.
#[must_use]
pub fn ledger_table(entries: &[LedgerEntry]) -> String {
    let rows: Vec<LedgerRow> = entries.iter().map(LedgerRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn state_line(state: &PositionState) -> String {
    let mut line = format!(
        "Position = {}, Avg = {}, Realized PnL = {}",
        format_adaptive_price(Some(state.normalized_position())),
        format_adaptive_price(state.avg_price()),
        format_signed(state.realized_pnl, 2),
    );
    for reset in state
        .resets
        .iter()
        .filter(|reset| reset.reason != AvgPriceResetReason::PositionClosed)
    {
        line.push_str(&format!(
            "\nAvg price reset at #{}: {}",
            reset.transaction_id, reset.reason
        ));
    }
    line
}

/// Renders the output of the `fold` command.
///
/// # Errors
///
/// Returns an error if the transactions fail validation.
pub fn render_fold(
    accountant: &PositionAccountant,
    transactions: &[Transaction],
    select: &[u64],
    as_json: bool,
) -> anyhow::Result<String> {
    if !select.is_empty() {
        let ids: Vec<TransactionId> = select.iter().copied().map(TransactionId::new).collect();
        let state = accountant.fold_selected(transactions, &ids)?;
        let summary = SelectionSummary::from_state(&state);
        return Ok(if as_json {
            serde_json::to_string_pretty(&summary)?
        } else {
            summary.to_string()
        });
    }

    let entries = accountant.replay(transactions)?;
    let state = accountant.fold(transactions)?;

    if as_json {
        let value = json!({ "ledger": entries, "state": state });
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    Ok(format!("{}\n{}", ledger_table(&entries), state_line(&state)))
}

/// Renders a position summary.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_summary(summary: &PositionSummary, as_json: bool) -> anyhow::Result<String> {
    if as_json {
        return Ok(serde_json::to_string_pretty(summary)?);
    }

    let rows = vec![
        FieldRow {
            field: "position_id",
            value: summary.position_id.to_string(),
        },
        FieldRow {
            field: "symbol",
            value: summary.symbol.to_string(),
        },
        FieldRow {
            field: "venue",
            value: summary.venue.to_string(),
        },
        FieldRow {
            field: "market",
            value: summary.market.to_string(),
        },
        FieldRow {
            field: "status",
            value: summary.status.to_string(),
        },
        FieldRow {
            field: "position",
            value: format_adaptive_price(Some(summary.final_position)),
        },
        FieldRow {
            field: "avg_price",
            value: format_adaptive_price(summary.final_avg_price),
        },
        FieldRow {
            field: "fee_base",
            value: format_adaptive_price(Some(summary.totals.fee_base)),
        },
        FieldRow {
            field: "fee_quote",
            value: format_adaptive_price(Some(summary.totals.fee_quote)),
        },
        FieldRow {
            field: "funding",
            value: format_adaptive_price(Some(summary.totals.funding)),
        },
        FieldRow {
            field: "realized_pnl",
            value: format_signed(summary.realized_pnl, 2),
        },
        FieldRow {
            field: "transactions",
            value: summary.transaction_count.to_string(),
        },
        FieldRow {
            field: "can_close",
            value: summary.can_close.to_string(),
        },
    ];
    Ok(Table::new(rows).with(Style::rounded()).to_string())
}

/// Loads a position and its transactions through an in-memory store.
///
/// # Errors
///
/// Returns an error if the venue is unknown, or the transactions cannot be loaded or
/// fail validation.
pub fn load_position(
    market: &MarketOpt,
    transactions: &TransactionsOpt,
    status: PositionStatus,
) -> anyhow::Result<(Position, Vec<Transaction>)> {
    let venue = parse_venue(&market.venue)?;
    let mut position = Position::new(PositionId::new(1), venue, market.market, market.symbol);
    position.status = status;

    let mut store = InMemoryStore::new();
    store.insert(position.clone(), load_transactions(&transactions.file)?)?;

    Ok((
        store.position(position.id)?,
        store.transactions(position.id)?,
    ))
}

pub fn run_fold(opt: &FoldOpt) -> anyhow::Result<()> {
    let transactions = load_transactions(&opt.transactions.file)?;
    let accountant = PositionAccountant::new(opt.market);
    println!(
        "{}",
        render_fold(&accountant, &transactions, &opt.select, opt.json)?
    );
    Ok(())
}

pub fn run_summary(opt: &SummaryOpt) -> anyhow::Result<()> {
    let (position, transactions) = load_position(&opt.market, &opt.transactions, opt.status)?;
    let summary = PositionSummary::build(&position, &transactions)?;
    println!("{}", render_summary(&summary, opt.json)?);
    Ok(())
}
