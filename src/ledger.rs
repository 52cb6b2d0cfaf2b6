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

//! Area accounting for a single parcel.
//!
//! The ledger holds no state and takes no locks. Every function reads through
//! the store handle it is given; callers that mutate claims must run
//! compute → validate → persist → [`derive_status`] inside one transaction on
//! the parcel's row, or two claims can pass validation against the same
//! snapshot.
//!
//! # Invariant
//!
//! For every parcel, the sum of active claims never exceeds its total area.
//!
//! # Example
//!
//! ```
//! use plot_inventory_rs::{ledger, MemoryStore, NewPhysicalPlot, Period, PhysicalPlotId, TransactionalStore};
//! use rust_decimal_macros::dec;
//!
//! let store = MemoryStore::new();
//! store.insert_plot(NewPhysicalPlot {
//!     id: PhysicalPlotId(1),
//!     plot_number: "A-1".to_string(),
//!     period: Period::First,
//!     total_area_sqm: dec!(3.6),
//!     notes: None,
//! }.into()).unwrap();
//!
//! let tx = store.begin(PhysicalPlotId(1)).unwrap();
//! let check = ledger::validate_claim(&tx, PhysicalPlotId(1), dec!(3.6), None).unwrap();
//! assert!(check.is_valid);
//! ```

use crate::base::{ContractPlotId, PhysicalPlotId};
use crate::error::{ClaimRejection, LedgerError};
use crate::plot::PlotStatus;
use crate::store::{ClaimSlice, PlotLedgerStore};
use rust_decimal::Decimal;
use serde::Serialize;

/// Outcome of checking a proposed claim. Never mutates anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimValidation {
    pub is_valid: bool,
    pub available_area: Decimal,
    pub reason: Option<ClaimRejection>,
}

impl ClaimValidation {
    fn accepted(available_area: Decimal) -> Self {
        Self {
            is_valid: true,
            available_area,
            reason: None,
        }
    }

    fn rejected(available_area: Decimal, reason: ClaimRejection) -> Self {
        Self {
            is_valid: false,
            available_area,
            reason: Some(reason),
        }
    }

    /// Converts a failed validation into [`LedgerError::ClaimRejected`].
    pub fn into_result(self) -> Result<Decimal, LedgerError> {
        match self.reason {
            None => Ok(self.available_area),
            Some(reason) => Err(LedgerError::ClaimRejected {
                reason,
                available: self.available_area,
            }),
        }
    }
}

/// `total - claimed`, floored at zero.
fn remaining_area(total: Decimal, claimed: Decimal) -> Decimal {
    let remaining = total - claimed;
    if remaining < Decimal::ZERO {
        tracing::warn!(%total, %claimed, "active claims exceed parcel area, clamping to zero");
        Decimal::ZERO
    } else {
        remaining
    }
}

fn claimed_area<'a>(
    claims: impl IntoIterator<Item = &'a ClaimSlice>,
    exclude: Option<ContractPlotId>,
) -> Decimal {
    claims
        .into_iter()
        .filter(|claim| Some(claim.id) != exclude)
        .map(|claim| claim.claimed_area_sqm)
        .sum()
}

fn available_excluding<S: PlotLedgerStore + ?Sized>(
    store: &S,
    plot: PhysicalPlotId,
    exclude: Option<ContractPlotId>,
) -> Result<(Decimal, Decimal), LedgerError> {
    let snapshot = store.fetch_physical_plot(plot)?;
    let claims = store.fetch_active_claims(plot)?;
    let claimed = claimed_area(&claims, exclude);
    Ok((
        snapshot.total_area_sqm,
        remaining_area(snapshot.total_area_sqm, claimed),
    ))
}

/// Area of the parcel not held by any active claim.
///
/// # Errors
///
/// - [`LedgerError::PlotNotFound`] - No parcel with this ID.
pub fn compute_available_area<S: PlotLedgerStore + ?Sized>(
    store: &S,
    plot: PhysicalPlotId,
) -> Result<Decimal, LedgerError> {
    available_excluding(store, plot, None).map(|(_, available)| available)
}

/// Checks whether `requested` square meters can be claimed from the parcel.
///
/// When resizing an existing claim, pass its ID as `exclude` so its current
/// area is returned to the pool before checking. Claiming exactly the
/// available area is valid.
///
/// # Errors
///
/// - [`LedgerError::PlotNotFound`] - No parcel with this ID. A rejected claim is
///   not an error; it is reported through [`ClaimValidation::reason`].
pub fn validate_claim<S: PlotLedgerStore + ?Sized>(
    store: &S,
    plot: PhysicalPlotId,
    requested: Decimal,
    exclude: Option<ContractPlotId>,
) -> Result<ClaimValidation, LedgerError> {
    let (_, available) = available_excluding(store, plot, exclude)?;

    if requested <= Decimal::ZERO {
        return Ok(ClaimValidation::rejected(
            available,
            ClaimRejection::NonPositiveArea,
        ));
    }
    if requested > available {
        return Ok(ClaimValidation::rejected(
            available,
            ClaimRejection::ExceedsAvailableArea,
        ));
    }
    Ok(ClaimValidation::accepted(available))
}

/// Recomputes the parcel's status from its active claims and persists it.
///
/// Calling it again with no intervening writes persists the same status.
pub fn derive_status<S: PlotLedgerStore + ?Sized>(
    store: &mut S,
    plot: PhysicalPlotId,
) -> Result<PlotStatus, LedgerError> {
    let (total, available) = available_excluding(&*store, plot, None)?;
    let status = PlotStatus::derive(total, available);
    store.persist_status(plot, status)?;
    tracing::debug!(%plot, %status, %available, "derived plot status");
    Ok(status)
}

/// Checks that the parcel's area can be changed to `new_total`.
///
/// The parcel may not shrink below the area its active claims already hold.
/// This only checks; applying the change is the caller's job.
///
/// # Errors
///
/// - [`LedgerError::InvalidArea`] - `new_total` is zero or negative.
/// - [`LedgerError::AreaBelowActiveClaims`] - Active claims exceed `new_total`.
/// - [`LedgerError::PlotNotFound`] - No parcel with this ID.
pub fn check_total_area<S: PlotLedgerStore + ?Sized>(
    store: &S,
    plot: PhysicalPlotId,
    new_total: Decimal,
) -> Result<(), LedgerError> {
    if new_total <= Decimal::ZERO {
        return Err(LedgerError::InvalidArea);
    }
    store.fetch_physical_plot(plot)?;
    let claimed = claimed_area(&store.fetch_active_claims(plot)?, None);
    if claimed > new_total {
        return Err(LedgerError::AreaBelowActiveClaims {
            requested: new_total,
            claimed,
        });
    }
    Ok(())
}
