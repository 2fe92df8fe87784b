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

//! The position accounting domain model.
//!
//! The `poscalc-model` crate defines transactions and positions, and the pure accounting
//! functions that fold transactions into a weighted-average entry price, realized PnL
//! and live unrealized PnL:
//!
//! - Enumerations and identifiers.
//! - Transaction drafts and their normalisation rules.
//! - The [`accounting::PositionAccountant`] recurrence for spot and futures markets.
//! - Ledger replay, position summaries and selection summaries.
//! - Unrealized PnL estimation.
//! - Storage seams with an in-memory implementation.
//!
//! # Feature flags
//!
//! - `stubs`: Enables type stubs for use in testing scenarios.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod accounting;
pub mod enums;
pub mod error;
pub mod identifiers;
pub mod ledger;
pub mod pnl;
pub mod position;
pub mod store;
pub mod summary;
pub mod transaction;

#[cfg(any(test, feature = "stubs"))]
pub mod stubs;
