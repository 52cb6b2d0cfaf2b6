// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Error types for area accounting, persistence and reporting.

use crate::base::{ContractPlotId, PhysicalPlotId};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Reason a proposed claim failed validation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimRejection {
    /// Requested area is zero or negative
    #[error("requested area must be positive")]
    NonPositiveArea,

    /// Requested area is larger than what the parcel has left
    #[error("requested area exceeds available area")]
    ExceedsAvailableArea,
}

/// Persistence collaborator failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("physical plot {0} not found")]
    PlotNotFound(PhysicalPlotId),

    #[error("contract plot {0} not found")]
    ClaimNotFound(ContractPlotId),

    #[error("duplicate physical plot ID {0}")]
    DuplicatePlot(PhysicalPlotId),

    #[error("duplicate contract plot ID {0}")]
    DuplicateClaim(ContractPlotId),

    /// The transaction is scoped to a different parcel's row
    #[error("physical plot {0} is not locked by this transaction")]
    PlotNotLocked(PhysicalPlotId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Area ledger and claim workflow errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("physical plot {0} not found")]
    PlotNotFound(PhysicalPlotId),

    #[error("contract plot {0} not found")]
    ClaimNotFound(ContractPlotId),

    #[error("contract plot {0} is already released")]
    ClaimReleased(ContractPlotId),

    #[error("claim rejected: {reason} (available {available})")]
    ClaimRejected {
        reason: ClaimRejection,
        available: Decimal,
    },

    /// Parcel area would drop below what active claims already hold
    #[error("total area {requested} is smaller than active claims {claimed}")]
    AreaBelowActiveClaims { requested: Decimal, claimed: Decimal },

    /// Parcel area is zero or negative
    #[error("invalid area (must be positive)")]
    InvalidArea,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PlotNotFound(id) => LedgerError::PlotNotFound(id),
            StoreError::ClaimNotFound(id) => LedgerError::ClaimNotFound(id),
            other => LedgerError::Store(other),
        }
    }
}

/// Report generation errors.
///
/// A failed scan fails the whole report; partial aggregates are never returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("inventory scan failed: {0}")]
    Scan(#[from] StoreError),
}
