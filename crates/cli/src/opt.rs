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

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use poscalc_model::{
    enums::{MarketType, PositionStatus},
    identifiers::Symbol,
};

/// Main CLI structure for parsing command-line arguments and options.
///
/// This is the entry point for the poscalc command-line interface, providing position
/// accounting over transaction files and live price feeds from supported venues.
#[derive(Debug, Parser)]
#[clap(version, about, author)]
pub struct PoscalcCli {
    /// Path to a TOML live configuration file.
    #[arg(long, global = true, env = "POSCALC_CONFIG")]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Commands,
}

/// Available top-level commands for the poscalc CLI.
#[derive(Parser, Debug)]
pub enum Commands {
    /// Replays transactions and prints the running ledger.
    Fold(FoldOpt),
    /// Prints the committed summary of a position.
    Summary(SummaryOpt),
    /// Fetches the last price of a market once.
    Price(MarketOpt),
    /// Streams the last price and unrealized PnL of a position.
    Watch(WatchOpt),
}

/// The market a price feed binds to.
#[derive(Parser, Debug, Clone)]
pub struct MarketOpt {
    /// Venue name (binance, bybit, kucoin, htx, coinex, poloniex).
    #[arg(long, env = "POSCALC_VENUE")]
    pub venue: String,
    /// Market type; `SPOT` selects spot, any other label futures.
    #[arg(long, default_value = "SPOT", value_parser = parse_market)]
    pub market: MarketType,
    /// Symbol as `BASE/QUOTE`.
    #[arg(long, value_parser = parse_symbol)]
    pub symbol: Symbol,
}

/// Where a position's transactions come from.
#[derive(Parser, Debug, Clone)]
pub struct TransactionsOpt {
    /// Transactions file, JSON array or CSV (by `.csv` extension).
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct FoldOpt {
    #[command(flatten)]
    pub transactions: TransactionsOpt,
    #[arg(long, default_value = "SPOT", value_parser = parse_market)]
    pub market: MarketType,
    /// Comma separated transaction ids to fold as an ad-hoc selection.
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<u64>,
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SummaryOpt {
    #[command(flatten)]
    pub market: MarketOpt,
    #[command(flatten)]
    pub transactions: TransactionsOpt,
    /// Position status (`OPEN` or `CLOSE`).
    #[arg(long, default_value = "OPEN", value_parser = parse_status)]
    pub status: PositionStatus,
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct WatchOpt {
    #[command(flatten)]
    pub market: MarketOpt,
    #[command(flatten)]
    pub transactions: TransactionsOpt,
    /// Position status (`OPEN` or `CLOSE`). Closed positions get a single price.
    #[arg(long, default_value = "OPEN", value_parser = parse_status)]
    pub status: PositionStatus,
    /// Stop after this many price updates.
    #[arg(long)]
    pub max_updates: Option<usize>,
}

fn parse_market(value: &str) -> Result<MarketType, String> {
    Ok(MarketType::from_label(value))
}

fn parse_symbol(value: &str) -> Result<Symbol, String> {
    Symbol::new(value).map_err(|e| e.to_string())
}

fn parse_status(value: &str) -> Result<PositionStatus, String> {
    PositionStatus::from_str(value.trim()).map_err(|e| e.to_string())
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_cli_definition_is_valid() {
        PoscalcCli::command().debug_assert();
    }

    #[rstest]
    fn test_parse_watch() {
        let cli = PoscalcCli::try_parse_from([
            "poscalc",
            "watch",
            "--venue",
            "bybit",
            "--market",
            "linear",
            "--symbol",
            "btc/usdt",
            "--file",
            "positions.csv",
            "--max-updates",
            "3",
        ])
        .unwrap();

        let Commands::Watch(opt) = cli.command else {
            panic!("expected watch command");
        };
        assert_eq!(opt.market.venue, "bybit");
        assert_eq!(opt.market.market, MarketType::Futures);
        assert_eq!(opt.market.symbol.as_str(), "BTC/USDT");
        assert_eq!(opt.status, PositionStatus::Open);
        assert_eq!(opt.max_updates, Some(3));
    }

    #[rstest]
    fn test_parse_fold_selection() {
        let cli = PoscalcCli::try_parse_from([
            "poscalc", "fold", "--file", "tx.json", "--select", "1,3,4",
        ])
        .unwrap();

        let Commands::Fold(opt) = cli.command else {
            panic!("expected fold command");
        };
        assert_eq!(opt.market, MarketType::Spot);
        assert_eq!(opt.select, vec![1, 3, 4]);
        assert!(!opt.json);
    }

    #[rstest]
    #[case("close", PositionStatus::Closed)]
    #[case("CLOSED", PositionStatus::Closed)]
    #[case("open", PositionStatus::Open)]
    fn test_parse_status(#[case] value: &str, #[case] expected: PositionStatus) {
        assert_eq!(parse_status(value).unwrap(), expected);
    }

    #[rstest]
    fn test_parse_status_invalid() {
        assert!(parse_status("pending").is_err());
    }
}
