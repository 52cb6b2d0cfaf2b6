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

//! Parcel registry and claim workflow.
//!
//! The [`PlotRegistry`] owns a store and runs every claim mutation as one
//! transaction on the owning parcel's row:
//!
//! 1. begin (locks the row)
//! 2. [`ledger::validate_claim`]
//! 3. write the claim
//! 4. [`ledger::derive_status`]
//! 5. commit
//!
//! Any error before the commit drops the transaction and leaves the store
//! unchanged.
//!
//! # Thread Safety
//!
//! All methods take `&self`. Claims against the same parcel are serialized by
//! the row lock; claims against different parcels run in parallel.

use crate::base::{ContractPlotId, Period, PhysicalPlotId};
use crate::claim_registry::LedgerEvent;
use crate::error::{InventoryError, LedgerError};
use crate::inventory;
use crate::ledger;
use crate::pager::Page;
use crate::plot::{ContractPlot, LifecycleState, NewPhysicalPlot, PhysicalPlot};
use crate::report::{
    AreaInventory, AreaQuery, OverallSummary, PeriodSummaries, SectionInventory, SectionQuery,
};
use crate::store::{ClaimWriter, MemoryStore, PlotLedgerStore, TransactionalStore};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Parcel registry with transactional claim handling.
///
/// # Invariants
///
/// - Claim IDs are globally unique across all parcels.
/// - For every parcel, active claims never sum to more than its total area.
/// - A parcel's stored status always matches its active claims after commit.
/// - Released claims stay released.
pub struct PlotRegistry<S = MemoryStore> {
    store: S,
}

impl PlotRegistry<MemoryStore> {
    /// Creates a registry over an empty in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Takes every committed ledger event, oldest first.
    ///
    /// Events accumulate until taken, so a long-running owner should drain
    /// them on a schedule.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.store.registry().drain_events()
    }

    pub fn pending_events(&self) -> usize {
        self.store.registry().pending_events()
    }
}

impl Default for PlotRegistry<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TransactionalStore> PlotRegistry<S> {
    pub fn with_store(store: S) -> Self {
        PlotRegistry { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a parcel. It starts out available.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidArea`] - Area is zero or negative.
    /// - [`LedgerError::Store`] - A parcel with this ID already exists.
    pub fn register_plot(&self, plot: NewPhysicalPlot) -> Result<PhysicalPlot, LedgerError> {
        if plot.total_area_sqm <= Decimal::ZERO {
            return Err(LedgerError::InvalidArea);
        }
        let plot: PhysicalPlot = plot.into();
        self.store.insert_plot(plot.clone())?;
        tracing::debug!(plot = %plot.id, number = %plot.plot_number, "registered plot");
        Ok(plot)
    }

    /// Registers parcels in bulk, reporting each row's outcome in input order.
    ///
    /// A failed row does not stop the import.
    pub fn import_plots<I>(&self, plots: I) -> Vec<Result<PhysicalPlotId, LedgerError>>
    where
        I: IntoIterator<Item = NewPhysicalPlot>,
    {
        let results: Vec<_> = plots
            .into_iter()
            .map(|plot| self.register_plot(plot).map(|plot| plot.id))
            .collect();
        let imported = results.iter().filter(|result| result.is_ok()).count();
        tracing::info!(
            imported,
            failed = results.len() - imported,
            "imported physical plots"
        );
        results
    }

    /// Claims `area` square meters of a parcel for a new contract.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::PlotNotFound`] - No parcel with this ID.
    /// - [`LedgerError::ClaimRejected`] - Area is not positive or exceeds what is left.
    /// - [`LedgerError::Store`] - The claim ID is already taken.
    pub fn create_claim(
        &self,
        plot: PhysicalPlotId,
        claim: ContractPlotId,
        area: Decimal,
        created_at: DateTime<Utc>,
    ) -> Result<ContractPlot, LedgerError> {
        let mut tx = self.store.begin(plot)?;
        check_claim(&tx, plot, area, None)?;

        let contract = ContractPlot {
            id: claim,
            physical_plot_id: plot,
            claimed_area_sqm: area,
            created_at,
            lifecycle_state: LifecycleState::Active,
        };
        tx.insert_claim(contract.clone())?;
        ledger::derive_status(&mut tx, plot)?;
        tx.commit()?;

        tracing::debug!(%plot, %claim, %area, "created claim");
        Ok(contract)
    }

    /// Changes an active claim's area. The claim's current area is returned to
    /// the pool before the new area is checked.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ClaimNotFound`] - No claim with this ID.
    /// - [`LedgerError::ClaimReleased`] - The claim has been released.
    /// - [`LedgerError::ClaimRejected`] - Area is not positive or exceeds what is left.
    pub fn resize_claim(
        &self,
        claim: ContractPlotId,
        area: Decimal,
    ) -> Result<ContractPlot, LedgerError> {
        let plot = self.store.claim_owner(claim)?;
        let mut tx = self.store.begin(plot)?;
        if !tx.claim(claim)?.is_active() {
            return Err(LedgerError::ClaimReleased(claim));
        }
        check_claim(&tx, plot, area, Some(claim))?;

        tx.set_claimed_area(claim, area)?;
        ledger::derive_status(&mut tx, plot)?;
        let resized = tx.claim(claim)?.clone();
        tx.commit()?;

        tracing::debug!(%plot, %claim, %area, "resized claim");
        Ok(resized)
    }

    /// Releases a claim, returning its area to the parcel.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ClaimNotFound`] - No claim with this ID.
    /// - [`LedgerError::ClaimReleased`] - The claim was already released.
    pub fn release_claim(&self, claim: ContractPlotId) -> Result<ContractPlot, LedgerError> {
        let plot = self.store.claim_owner(claim)?;
        let mut tx = self.store.begin(plot)?;
        if !tx.claim(claim)?.is_active() {
            return Err(LedgerError::ClaimReleased(claim));
        }

        tx.release_claim(claim)?;
        ledger::derive_status(&mut tx, plot)?;
        let released = tx.claim(claim)?.clone();
        tx.commit()?;

        tracing::debug!(%plot, %claim, "released claim");
        Ok(released)
    }

    /// Changes a parcel's total area.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidArea`] - Area is zero or negative.
    /// - [`LedgerError::AreaBelowActiveClaims`] - Active claims hold more than `area`.
    /// - [`LedgerError::PlotNotFound`] - No parcel with this ID.
    pub fn update_total_area(
        &self,
        plot: PhysicalPlotId,
        area: Decimal,
    ) -> Result<PhysicalPlot, LedgerError> {
        let mut tx = self.store.begin(plot)?;
        if let Err(err) = ledger::check_total_area(&tx, plot, area) {
            tracing::warn!(%plot, %area, %err, "total area change rejected");
            return Err(err);
        }

        tx.set_total_area(area)?;
        ledger::derive_status(&mut tx, plot)?;
        let updated = tx.plot().clone();
        tx.commit()?;
        Ok(updated)
    }

    pub fn plot(&self, id: PhysicalPlotId) -> Result<PhysicalPlot, LedgerError> {
        Ok(self.store.physical_plot(id)?)
    }

    pub fn claim(&self, id: ContractPlotId) -> Result<ContractPlot, LedgerError> {
        let plot = self.store.claim_owner(id)?;
        self.store
            .contract_plots(plot)?
            .into_iter()
            .find(|claim| claim.id == id)
            .ok_or(LedgerError::ClaimNotFound(id))
    }

    /// Every claim on the parcel, released ones included.
    pub fn claims(&self, plot: PhysicalPlotId) -> Result<Vec<ContractPlot>, LedgerError> {
        Ok(self.store.contract_plots(plot)?)
    }

    pub fn available_area(&self, plot: PhysicalPlotId) -> Result<Decimal, LedgerError> {
        let tx = self.store.begin(plot)?;
        ledger::compute_available_area(&tx, plot)
    }

    pub fn summary(&self) -> Result<OverallSummary, InventoryError> {
        inventory::overall_summary(&self.store)
    }

    pub fn periods(&self, period: Option<Period>) -> Result<PeriodSummaries, InventoryError> {
        inventory::period_summaries(&self.store, period)
    }

    pub fn sections(&self, query: &SectionQuery) -> Result<Page<SectionInventory>, InventoryError> {
        inventory::section_inventory(&self.store, query)
    }

    pub fn areas(&self, query: &AreaQuery) -> Result<Page<AreaInventory>, InventoryError> {
        inventory::area_inventory(&self.store, query)
    }
}

/// Validates a claim, logging and converting a rejection into an error.
fn check_claim<T: PlotLedgerStore + ?Sized>(
    tx: &T,
    plot: PhysicalPlotId,
    area: Decimal,
    exclude: Option<ContractPlotId>,
) -> Result<Decimal, LedgerError> {
    let validation = ledger::validate_claim(tx, plot, area, exclude)?;
    if let Some(reason) = validation.reason {
        tracing::warn!(
            %plot,
            %area,
            available = %validation.available_area,
            %reason,
            "claim rejected"
        );
    }
    validation.into_result()
}
