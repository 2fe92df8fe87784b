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

//! Live price supervision for the poscalc position engine.
//!
//! The `poscalc-live` crate connects the pure accounting model to the venue clients:
//!
//! - [`controller::ConnectionController`] owns the market data client of a watched
//!   position and reconnects lost streams with exponential backoff.
//! - [`session::PriceSession`] keeps the last accepted price and derives the
//!   [`session::DisplaySnapshot`] rendered by the display layer.
//! - [`config::LiveConfig`] is the TOML-loadable configuration.
//! - [`logging::init_tracing`] installs the tracing subscriber for binaries.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod controller;
pub mod logging;
pub mod session;
