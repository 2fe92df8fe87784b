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

//! The `price` and `watch` commands.

use poscalc_core::format::format_adaptive_price;
use poscalc_live::{config::LiveConfig, controller::ConnectionController, session::PriceSession};
use poscalc_model::identifiers::ExchangeIdentity;
use poscalc_venues::{
    client::{EventSender, MarketDataClient, MarketDataEvent},
    factory::{MarketDataClientAny, parse_venue},
};
use tokio::sync::mpsc;

use crate::{
    accounting::load_position,
    opt::{MarketOpt, WatchOpt},
};

pub async fn run_price(opt: &MarketOpt, config: &LiveConfig) -> anyhow::Result<()> {
    let venue = parse_venue(&opt.venue)?;
    let identity = ExchangeIdentity::new(venue, opt.market, opt.symbol);

    let (tx, _rx) = mpsc::unbounded_channel();
    let client = MarketDataClientAny::new(config.client_config(&identity), EventSender::new(0, tx))?;
    let price = client.fetch_initial_price(&identity.symbol).await?;

    println!("{identity} {}", format_adaptive_price(Some(price)));
    Ok(())
}

pub async fn run_watch(opt: &WatchOpt, config: &LiveConfig) -> anyhow::Result<()> {
    let (position, transactions) = load_position(&opt.market, &opt.transactions, opt.status)?;
    let state = position.accountant().fold(&transactions)?;
    let identity = position.identity();

    let mut controller = ConnectionController::new(config.clone())?;
    controller.refresh(identity, position.status).await?;

    let taker_fee = controller.taker_fee().unwrap_or_default();
    let mut session = PriceSession::new(identity, &state, taker_fee);

    if !position.is_open() {
        while let Some(event) = controller.try_next_event() {
            session.apply(&event, controller.epoch());
        }
        println!("{}", session.snapshot(controller.status()));
        controller.shutdown();
        return Ok(());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut updates = 0usize;

    loop {
        tokio::select! {
            event = controller.next_event() => {
                let Some(event) = event else {
                    break;
                };

                let changed = session.apply(&event, controller.epoch());
                if changed || matches!(event, MarketDataEvent::StreamLost { .. }) {
                    println!("{}", session.snapshot(controller.status()));
                }

                if changed {
                    updates += 1;
                    if opt.max_updates.is_some_and(|max| updates >= max) {
                        break;
                    }
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    controller.shutdown();
    Ok(())
}
