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

//! Parcels and the claims held against them.
//!
//! A parcel's status follows its remaining area:
//!
//! ```text
//!  Available ──claim──► PartiallySold ──claim rest──► SoldOut
//!      ▲                     │  ▲                        │
//!      └──release all────────┘  └──────release some──────┘
//! ```

use crate::base::{ContractPlotId, Period, PhysicalPlotId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Occupancy of a parcel, derived from its remaining area.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlotStatus {
    Available,
    PartiallySold,
    SoldOut,
}

impl PlotStatus {
    /// Classifies a parcel from its total and remaining area.
    ///
    /// `available` is expected to already be floored at zero.
    pub fn derive(total_area: Decimal, available_area: Decimal) -> Self {
        if available_area == total_area {
            PlotStatus::Available
        } else if available_area <= Decimal::ZERO {
            PlotStatus::SoldOut
        } else {
            PlotStatus::PartiallySold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlotStatus::Available => "available",
            PlotStatus::PartiallySold => "partially_sold",
            PlotStatus::SoldOut => "sold_out",
        }
    }
}

impl fmt::Display for PlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "available" => Ok(PlotStatus::Available),
            "partially_sold" => Ok(PlotStatus::PartiallySold),
            "sold_out" => Ok(PlotStatus::SoldOut),
            other => Err(format!("unknown plot status: {other}")),
        }
    }
}

/// Soft-delete state of a claim. Released claims no longer hold area.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Active,
    Released,
}

/// A fixed-capacity land parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalPlot {
    pub id: PhysicalPlotId,
    /// Opaque plot number token, e.g. `"A-56"`.
    pub plot_number: String,
    pub period: Period,
    pub total_area_sqm: Decimal,
    /// Cached result of [`PlotStatus::derive`] over the active claims.
    pub status: PlotStatus,
    pub notes: Option<String>,
}

/// Input for registering a parcel. New parcels start [`PlotStatus::Available`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPhysicalPlot {
    pub id: PhysicalPlotId,
    pub plot_number: String,
    pub period: Period,
    pub total_area_sqm: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<NewPhysicalPlot> for PhysicalPlot {
    fn from(new: NewPhysicalPlot) -> Self {
        PhysicalPlot {
            id: new.id,
            plot_number: new.plot_number,
            period: new.period,
            total_area_sqm: new.total_area_sqm,
            status: PlotStatus::Available,
            notes: new.notes,
        }
    }
}

/// A sale's claim on part (or all) of a parcel's area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPlot {
    pub id: ContractPlotId,
    pub physical_plot_id: PhysicalPlotId,
    pub claimed_area_sqm: Decimal,
    pub created_at: DateTime<Utc>,
    pub lifecycle_state: LifecycleState,
}

impl ContractPlot {
    pub fn is_active(&self) -> bool {
        self.lifecycle_state == LifecycleState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn derive_available_when_nothing_claimed() {
        assert_eq!(PlotStatus::derive(dec!(3.6), dec!(3.6)), PlotStatus::Available);
    }

    #[test]
    fn derive_sold_out_when_nothing_left() {
        assert_eq!(PlotStatus::derive(dec!(3.6), Decimal::ZERO), PlotStatus::SoldOut);
    }

    #[test]
    fn derive_partially_sold_in_between() {
        assert_eq!(
            PlotStatus::derive(dec!(3.6), dec!(1.8)),
            PlotStatus::PartiallySold
        );
    }

    #[test]
    fn derive_compares_values_not_scale() {
        // 3.60 and 3.6 are the same area
        assert_eq!(PlotStatus::derive(dec!(3.6), dec!(3.60)), PlotStatus::Available);
    }

    #[test]
    fn status_string_round_trip() {
        for status in [
            PlotStatus::Available,
            PlotStatus::PartiallySold,
            PlotStatus::SoldOut,
        ] {
            assert_eq!(status.as_str().parse::<PlotStatus>(), Ok(status));
        }
        assert!("reserved".parse::<PlotStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&PlotStatus::PartiallySold).unwrap();
        assert_eq!(json, "\"partially_sold\"");
    }

    #[test]
    fn new_plot_starts_available() {
        let plot: PhysicalPlot = NewPhysicalPlot {
            id: PhysicalPlotId(1),
            plot_number: "A-1".to_string(),
            period: Period::First,
            total_area_sqm: dec!(3.6),
            notes: None,
        }
        .into();
        assert_eq!(plot.status, PlotStatus::Available);
    }
}
