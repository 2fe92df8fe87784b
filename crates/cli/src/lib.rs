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

//! Command-line interface for the poscalc position engine.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]

pub mod accounting;
pub mod input;
mod live;
pub mod opt;

use poscalc_live::config::LiveConfig;

use crate::opt::{Commands, PoscalcCli};

pub async fn run(opt: PoscalcCli) -> anyhow::Result<()> {
    let config = match &opt.config {
        Some(path) => LiveConfig::from_file(path)?,
        None => LiveConfig::default(),
    };

    match opt.command {
        Commands::Fold(fold_opt) => accounting::run_fold(&fold_opt)?,
        Commands::Summary(summary_opt) => accounting::run_summary(&summary_opt)?,
        Commands::Price(market_opt) => live::run_price(&market_opt, &config).await?,
        Commands::Watch(watch_opt) => live::run_watch(&watch_opt, &config).await?,
    }
    Ok(())
}
