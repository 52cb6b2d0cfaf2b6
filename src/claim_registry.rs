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

//! Thread-safe claim ownership index and ledger event journal.
//!
//! Claim IDs are unique across all parcels. The registry maps each claim to
//! its owning parcel and keeps an ordered log of committed mutations.

use crate::base::{ContractPlotId, PhysicalPlotId};
use crate::error::StoreError;
use crate::plot::PlotStatus;
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use serde::Serialize;

/// A committed change to a parcel or one of its claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    ClaimCreated {
        plot: PhysicalPlotId,
        claim: ContractPlotId,
        area: Decimal,
    },
    ClaimResized {
        plot: PhysicalPlotId,
        claim: ContractPlotId,
        from: Decimal,
        to: Decimal,
    },
    ClaimReleased {
        plot: PhysicalPlotId,
        claim: ContractPlotId,
        area: Decimal,
    },
    TotalAreaChanged {
        plot: PhysicalPlotId,
        from: Decimal,
        to: Decimal,
    },
    StatusChanged {
        plot: PhysicalPlotId,
        from: PlotStatus,
        to: PlotStatus,
    },
}

/// Claim ownership index with an ordered event journal.
///
/// Combines a [`DashMap`] for O(1) duplicate checking with a [`SegQueue`]
/// to preserve commit order.
#[derive(Debug)]
pub struct ClaimRegistry {
    /// Owning parcel of every claim ever committed.
    owners: DashMap<ContractPlotId, PhysicalPlotId>,

    /// Committed events in FIFO order. Unbounded until drained.
    journal: SegQueue<LedgerEvent>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self {
            owners: DashMap::new(),
            journal: SegQueue::new(),
        }
    }

    /// Records a new claim's owner.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateClaim`] if the claim ID is already taken.
    pub fn reserve(
        &self,
        claim: ContractPlotId,
        plot: PhysicalPlotId,
    ) -> Result<(), StoreError> {
        match self.owners.entry(claim) {
            Entry::Occupied(_) => Err(StoreError::DuplicateClaim(claim)),
            Entry::Vacant(entry) => {
                entry.insert(plot);
                Ok(())
            }
        }
    }

    /// Drops a reservation made by a transaction that did not commit.
    pub(crate) fn unreserve(&self, claim: ContractPlotId) {
        self.owners.remove(&claim);
    }

    pub fn contains(&self, claim: ContractPlotId) -> bool {
        self.owners.contains_key(&claim)
    }

    pub fn owner_of(&self, claim: ContractPlotId) -> Option<PhysicalPlotId> {
        self.owners.get(&claim).map(|owner| *owner)
    }

    pub fn record(&self, event: LedgerEvent) {
        self.journal.push(event);
    }

    /// Number of events waiting to be drained.
    pub fn pending_events(&self) -> usize {
        self.journal.len()
    }

    /// Takes every journaled event, oldest first.
    ///
    /// Long-lived owners must call this periodically; the journal is never
    /// trimmed otherwise.
    pub fn drain_events(&self) -> Vec<LedgerEvent> {
        let mut events = Vec::with_capacity(self.journal.len());
        while let Some(event) = self.journal.pop() {
            events.push(event);
        }
        events
    }
}

impl Default for ClaimRegistry {
    fn default() -> Self {
        Self::new()
    }
}
