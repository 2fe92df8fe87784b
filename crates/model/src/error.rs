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

//! Error types for transaction validation and position accounting.

use thiserror::Error;

use crate::{
    enums::{MarketType, PositionStatus},
    identifiers::{PositionId, TransactionId},
};

/// Result alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Error type for model validation and accounting failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Two transactions share the same identifier.
    #[error("Duplicate transaction id {0}")]
    DuplicateTransactionId(TransactionId),

    /// A numeric field was NaN or infinite.
    #[error("Transaction {id} has non-finite {field}: {value}")]
    NonFiniteValue {
        id: TransactionId,
        field: &'static str,
        value: f64,
    },

    /// A funding transaction carried a non-zero volume.
    #[error("Funding transaction {id} must have zero volume, was {volume}")]
    FundingWithVolume { id: TransactionId, volume: f64 },

    /// Funding transactions only apply to futures positions.
    #[error("Funding transactions are not supported for {0} positions")]
    FundingNotSupported(MarketType),

    /// A required draft field was not supplied.
    #[error("Field \"{0}\" is empty")]
    MissingField(&'static str),

    /// A draft field was supplied with an invalid value.
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// The position is not in a state that allows the requested transition.
    #[error("Position {id} is {status}, expected {expected}")]
    InvalidStatus {
        id: PositionId,
        status: PositionStatus,
        expected: PositionStatus,
    },

    /// The position still holds a non-zero quantity.
    #[error("Can't close position {id}: position not 0 (was {position})")]
    PositionNotFlat { id: PositionId, position: f64 },

    /// No position exists for the identifier.
    #[error("Position {0} not found")]
    PositionNotFound(PositionId),

    /// No transaction exists for the identifier within the position.
    #[error("Transaction {transaction_id} not found for position {position_id}")]
    TransactionNotFound {
        position_id: PositionId,
        transaction_id: TransactionId,
    },
}
