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

//! # Plot Inventory
//!
//! This library allocates cemetery parcels among sale claims without ever
//! over-allocating their area, and reports occupancy by sales period, section
//! and area size.
//!
//! ## Core Components
//!
//! - [`PlotRegistry`]: Parcel registry running the claim workflow in per-parcel transactions
//! - [`ledger`]: Available area, claim validation and status derivation
//! - [`inventory`]: Occupancy reports with fractional used counts
//! - [`pager`]: Filter, sort and paginate report rows
//! - [`plot_number`]: Section and plot type classification of plot numbers
//! - [`MemoryStore`]: In-memory store with row-locked transactions
//!
//! ## Example
//!
//! ```
//! use plot_inventory_rs::{ContractPlotId, NewPhysicalPlot, Period, PhysicalPlotId, PlotRegistry};
//! use chrono::Utc;
//! use rust_decimal_macros::dec;
//!
//! let registry = PlotRegistry::new();
//! for id in 1..=3 {
//!     registry.register_plot(NewPhysicalPlot {
//!         id: PhysicalPlotId(id),
//!         plot_number: format!("A-{id}"),
//!         period: Period::First,
//!         total_area_sqm: dec!(3.6),
//!         notes: None,
//!     }).unwrap();
//! }
//!
//! registry.create_claim(PhysicalPlotId(2), ContractPlotId(1), dec!(3.6), Utc::now()).unwrap();
//! registry.create_claim(PhysicalPlotId(3), ContractPlotId(2), dec!(1.8), Utc::now()).unwrap();
//!
//! // 1 + 0.5 + 0 parcels used; each count is rounded on its own.
//! let summary = registry.summary().unwrap();
//! assert_eq!(summary.total_count, 3);
//! assert_eq!(summary.used_count, 2);
//! assert_eq!(summary.remaining_count, 2);
//! assert_eq!(summary.usage_rate, dec!(50.0));
//! ```
//!
//! ## Thread Safety
//!
//! Claim mutations lock only the owning parcel's row, so claims against
//! different parcels proceed in parallel. Reports read without a transaction.

mod base;
pub mod claim_registry;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod pager;
pub mod plot;
pub mod plot_number;
mod registry;
pub mod report;
pub mod store;

pub use base::{ContractPlotId, Period, PhysicalPlotId, UnknownPeriod};
pub use claim_registry::{ClaimRegistry, LedgerEvent};
pub use error::{ClaimRejection, InventoryError, LedgerError, StoreError};
pub use plot::{ContractPlot, LifecycleState, NewPhysicalPlot, PhysicalPlot, PlotStatus};
pub use registry::PlotRegistry;
pub use store::{
    ClaimWriter, InventorySource, MemoryStore, PlotLedgerStore, TransactionalStore,
};
