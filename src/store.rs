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

//! Persistence collaborator contract and the in-memory store.
//!
//! The area ledger reads and writes through [`PlotLedgerStore`], which is
//! implemented by a transaction scoped to one parcel's row. Reports scan
//! through [`InventorySource`] and need no transaction.
//!
//! # Thread Safety
//!
//! [`MemoryStore`] keeps each parcel row behind its own [`Mutex`]. A
//! [`MemoryTransaction`] holds that lock from [`TransactionalStore::begin`]
//! until it is committed or dropped, so concurrent claims on one parcel are
//! serialized while other parcels proceed in parallel. Writes go to a working
//! copy and only replace the row on commit; dropping a transaction rolls back.

use crate::base::{ContractPlotId, Period, PhysicalPlotId};
use crate::claim_registry::{ClaimRegistry, LedgerEvent};
use crate::error::StoreError;
use crate::plot::{ContractPlot, LifecycleState, PhysicalPlot, PlotStatus};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Area and cached status of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotSnapshot {
    pub total_area_sqm: Decimal,
    pub status: PlotStatus,
}

/// An active claim's share of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimSlice {
    pub id: ContractPlotId,
    pub claimed_area_sqm: Decimal,
}

/// A parcel together with the areas of its active claims, as scanned for reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotInventoryRow {
    pub id: PhysicalPlotId,
    pub plot_number: String,
    pub period: Period,
    pub total_area_sqm: Decimal,
    pub status: PlotStatus,
    pub active_claims: Vec<Decimal>,
}

impl PlotInventoryRow {
    pub fn claimed_area_sqm(&self) -> Decimal {
        self.active_claims.iter().copied().sum()
    }
}

/// Parcel selection for report scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlotFilter {
    pub period: Option<Period>,
    pub status: Option<PlotStatus>,
}

impl PlotFilter {
    pub fn matches(&self, plot: &PhysicalPlot) -> bool {
        self.period.is_none_or(|period| period == plot.period)
            && self.status.is_none_or(|status| status == plot.status)
    }
}

/// Per-parcel reads and writes used by the area ledger.
///
/// Every mutating call must run inside the caller's transaction.
pub trait PlotLedgerStore {
    fn fetch_physical_plot(&self, id: PhysicalPlotId) -> Result<PlotSnapshot, StoreError>;

    /// Active claims only; released claims never appear here.
    fn fetch_active_claims(&self, id: PhysicalPlotId) -> Result<Vec<ClaimSlice>, StoreError>;

    fn persist_status(&mut self, id: PhysicalPlotId, status: PlotStatus) -> Result<(), StoreError>;
}

/// Bulk parcel scan used by the inventory reports.
pub trait InventorySource {
    /// Returns matching parcels ordered by ID, each with its active claim areas.
    fn fetch_all_physical_plots(
        &self,
        filter: &PlotFilter,
    ) -> Result<Vec<PlotInventoryRow>, StoreError>;
}

/// Claim mutations inside a transaction on one parcel's row.
pub trait ClaimWriter: PlotLedgerStore {
    /// The parcel this transaction holds.
    fn plot(&self) -> &PhysicalPlot;

    fn claim(&self, id: ContractPlotId) -> Result<&ContractPlot, StoreError>;

    fn insert_claim(&mut self, claim: ContractPlot) -> Result<(), StoreError>;

    fn set_claimed_area(&mut self, id: ContractPlotId, area: Decimal) -> Result<(), StoreError>;

    fn release_claim(&mut self, id: ContractPlotId) -> Result<(), StoreError>;

    fn set_total_area(&mut self, area: Decimal) -> Result<(), StoreError>;

    /// Makes every write visible. Dropping without commit discards them.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// A store that can serialize writers per parcel.
pub trait TransactionalStore: InventorySource {
    type Transaction<'a>: ClaimWriter
    where
        Self: 'a;

    /// Locks the parcel's row for the lifetime of the returned transaction.
    fn begin(&self, plot: PhysicalPlotId) -> Result<Self::Transaction<'_>, StoreError>;

    fn insert_plot(&self, plot: PhysicalPlot) -> Result<(), StoreError>;

    fn claim_owner(&self, claim: ContractPlotId) -> Result<PhysicalPlotId, StoreError>;

    fn physical_plot(&self, id: PhysicalPlotId) -> Result<PhysicalPlot, StoreError>;

    /// Every claim on the parcel, released ones included.
    fn contract_plots(&self, plot: PhysicalPlotId) -> Result<Vec<ContractPlot>, StoreError>;
}

#[derive(Debug, Clone)]
struct PlotRow {
    plot: PhysicalPlot,
    claims: Vec<ContractPlot>,
}

impl PlotRow {
    fn active_claims(&self) -> impl Iterator<Item = &ContractPlot> {
        self.claims.iter().filter(|claim| claim.is_active())
    }

    fn assert_invariants(&self) {
        let claimed: Decimal = self
            .active_claims()
            .map(|claim| claim.claimed_area_sqm)
            .sum();
        debug_assert!(
            claimed <= self.plot.total_area_sqm,
            "Invariant violated: plot {} has {} claimed of {}",
            self.plot.id,
            claimed,
            self.plot.total_area_sqm
        );
    }

    fn inventory_row(&self) -> PlotInventoryRow {
        PlotInventoryRow {
            id: self.plot.id,
            plot_number: self.plot.plot_number.clone(),
            period: self.plot.period,
            total_area_sqm: self.plot.total_area_sqm,
            status: self.plot.status,
            active_claims: self
                .active_claims()
                .map(|claim| claim.claimed_area_sqm)
                .collect(),
        }
    }
}

/// In-memory parcel store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Parcel rows indexed by parcel ID.
    plots: DashMap<PhysicalPlotId, Arc<Mutex<PlotRow>>>,
    /// Claim ownership and the event journal.
    registry: ClaimRegistry,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plot_count(&self) -> usize {
        self.plots.len()
    }

    pub fn registry(&self) -> &ClaimRegistry {
        &self.registry
    }

    fn row(&self, id: PhysicalPlotId) -> Result<Arc<Mutex<PlotRow>>, StoreError> {
        // Clone the Arc so the shard lock is released before the row lock is taken.
        self.plots
            .get(&id)
            .map(|row| Arc::clone(row.value()))
            .ok_or(StoreError::PlotNotFound(id))
    }
}

impl InventorySource for MemoryStore {
    fn fetch_all_physical_plots(
        &self,
        filter: &PlotFilter,
    ) -> Result<Vec<PlotInventoryRow>, StoreError> {
        let rows: Vec<Arc<Mutex<PlotRow>>> = self
            .plots
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut plots: Vec<PlotInventoryRow> = rows
            .iter()
            .filter_map(|row| {
                let row = row.lock();
                filter.matches(&row.plot).then(|| row.inventory_row())
            })
            .collect();
        plots.sort_by_key(|plot| plot.id);
        Ok(plots)
    }
}

impl TransactionalStore for MemoryStore {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn begin(&self, plot: PhysicalPlotId) -> Result<MemoryTransaction<'_>, StoreError> {
        let row = self.row(plot)?.lock_arc();
        let working = row.clone();
        Ok(MemoryTransaction {
            registry: &self.registry,
            row,
            working,
            pending: Vec::new(),
            new_claims: Vec::new(),
        })
    }

    fn insert_plot(&self, plot: PhysicalPlot) -> Result<(), StoreError> {
        match self.plots.entry(plot.id) {
            Entry::Occupied(_) => Err(StoreError::DuplicatePlot(plot.id)),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(PlotRow {
                    plot,
                    claims: Vec::new(),
                })));
                Ok(())
            }
        }
    }

    fn claim_owner(&self, claim: ContractPlotId) -> Result<PhysicalPlotId, StoreError> {
        self.registry
            .owner_of(claim)
            .ok_or(StoreError::ClaimNotFound(claim))
    }

    fn physical_plot(&self, id: PhysicalPlotId) -> Result<PhysicalPlot, StoreError> {
        Ok(self.row(id)?.lock().plot.clone())
    }

    fn contract_plots(&self, plot: PhysicalPlotId) -> Result<Vec<ContractPlot>, StoreError> {
        Ok(self.row(plot)?.lock().claims.clone())
    }
}

/// Write transaction holding one parcel's row lock.
pub struct MemoryTransaction<'a> {
    registry: &'a ClaimRegistry,
    row: ArcMutexGuard<RawMutex, PlotRow>,
    working: PlotRow,
    pending: Vec<LedgerEvent>,
    new_claims: Vec<ContractPlotId>,
}

impl MemoryTransaction<'_> {
    fn ensure_locked(&self, id: PhysicalPlotId) -> Result<(), StoreError> {
        if id == self.working.plot.id {
            Ok(())
        } else {
            Err(StoreError::PlotNotLocked(id))
        }
    }

    fn claim_mut(&mut self, id: ContractPlotId) -> Result<&mut ContractPlot, StoreError> {
        self.working
            .claims
            .iter_mut()
            .find(|claim| claim.id == id)
            .ok_or(StoreError::ClaimNotFound(id))
    }
}

impl PlotLedgerStore for MemoryTransaction<'_> {
    fn fetch_physical_plot(&self, id: PhysicalPlotId) -> Result<PlotSnapshot, StoreError> {
        self.ensure_locked(id)?;
        Ok(PlotSnapshot {
            total_area_sqm: self.working.plot.total_area_sqm,
            status: self.working.plot.status,
        })
    }

    fn fetch_active_claims(&self, id: PhysicalPlotId) -> Result<Vec<ClaimSlice>, StoreError> {
        self.ensure_locked(id)?;
        Ok(self
            .working
            .active_claims()
            .map(|claim| ClaimSlice {
                id: claim.id,
                claimed_area_sqm: claim.claimed_area_sqm,
            })
            .collect())
    }

    fn persist_status(&mut self, id: PhysicalPlotId, status: PlotStatus) -> Result<(), StoreError> {
        self.ensure_locked(id)?;
        let current = self.working.plot.status;
        if current != status {
            self.working.plot.status = status;
            self.pending.push(LedgerEvent::StatusChanged {
                plot: id,
                from: current,
                to: status,
            });
        }
        Ok(())
    }
}

impl ClaimWriter for MemoryTransaction<'_> {
    fn plot(&self) -> &PhysicalPlot {
        &self.working.plot
    }

    fn claim(&self, id: ContractPlotId) -> Result<&ContractPlot, StoreError> {
        self.working
            .claims
            .iter()
            .find(|claim| claim.id == id)
            .ok_or(StoreError::ClaimNotFound(id))
    }

    fn insert_claim(&mut self, claim: ContractPlot) -> Result<(), StoreError> {
        self.ensure_locked(claim.physical_plot_id)?;
        if self.registry.contains(claim.id) || self.new_claims.contains(&claim.id) {
            return Err(StoreError::DuplicateClaim(claim.id));
        }
        self.pending.push(LedgerEvent::ClaimCreated {
            plot: claim.physical_plot_id,
            claim: claim.id,
            area: claim.claimed_area_sqm,
        });
        self.new_claims.push(claim.id);
        self.working.claims.push(claim);
        Ok(())
    }

    fn set_claimed_area(&mut self, id: ContractPlotId, area: Decimal) -> Result<(), StoreError> {
        let plot = self.working.plot.id;
        let claim = self.claim_mut(id)?;
        let from = claim.claimed_area_sqm;
        claim.claimed_area_sqm = area;
        self.pending.push(LedgerEvent::ClaimResized {
            plot,
            claim: id,
            from,
            to: area,
        });
        Ok(())
    }

    fn release_claim(&mut self, id: ContractPlotId) -> Result<(), StoreError> {
        let plot = self.working.plot.id;
        let claim = self.claim_mut(id)?;
        claim.lifecycle_state = LifecycleState::Released;
        let area = claim.claimed_area_sqm;
        self.pending.push(LedgerEvent::ClaimReleased {
            plot,
            claim: id,
            area,
        });
        Ok(())
    }

    fn set_total_area(&mut self, area: Decimal) -> Result<(), StoreError> {
        let from = self.working.plot.total_area_sqm;
        self.working.plot.total_area_sqm = area;
        self.pending.push(LedgerEvent::TotalAreaChanged {
            plot: self.working.plot.id,
            from,
            to: area,
        });
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        let MemoryTransaction {
            registry,
            mut row,
            working,
            pending,
            new_claims,
        } = self;

        for (index, claim) in new_claims.iter().enumerate() {
            if let Err(err) = registry.reserve(*claim, working.plot.id) {
                for reserved in &new_claims[..index] {
                    registry.unreserve(*reserved);
                }
                return Err(err);
            }
        }

        working.assert_invariants();
        *row = working;
        for event in pending {
            registry.record(event);
        }
        Ok(())
    }
}
