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

//! Network machinery for live price feeds.
//!
//! The `poscalc-network` crate provides the transport layer used by the venue adapters:
//!
//! - A single-shot WebSocket connection with split read/write tasks.
//! - A heartbeat monitor detecting silent connections.
//! - An observable connection status.
//! - Exponential backoff for reconnection delays.
//! - A JSON-over-HTTP client for public REST endpoints.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backoff;
pub mod error;
pub mod heartbeat;
pub mod http;
pub mod mode;
pub mod testing;
pub mod tls;
pub mod websocket;
