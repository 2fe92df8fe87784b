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

//! Market data clients for the venues supported by the position calculator.
//!
//! The `poscalc-venues` crate provides one [`adapter::VenueAdapter`] per venue describing
//! its public ticker contract (symbol mapping, REST and stream endpoints, payload shapes,
//! heartbeat requirements and taker fees), a generic [`client::StreamingClient`] driving
//! any adapter, and [`factory::MarketDataClientAny`] selecting the client by venue name.
//!
//! Supported venues: Binance, Bybit, KuCoin, HTX, CoinEx and Poloniex, each for spot and
//! futures markets.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_panics_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod adapter;
pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod factory;
pub mod venues;
