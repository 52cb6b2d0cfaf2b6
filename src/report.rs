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

//! Report queries and response rows.
//!
//! Field names serialize in camelCase. Counts are integers; rates and areas
//! are JSON numbers.

use crate::base::Period;
use crate::pager::{PageRequest, SortOrder};
use crate::plot::PlotStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Occupancy across every parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSummary {
    pub total_count: u64,
    pub used_count: u64,
    pub remaining_count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub usage_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_area_sqm: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_area_sqm: Decimal,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub period: Period,
    pub total_count: u64,
    pub used_count: u64,
    pub remaining_count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub usage_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummaries {
    pub periods: Vec<PeriodSummary>,
}

/// Occupancy of one `(period, section)` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInventory {
    pub period: Period,
    pub section: String,
    pub category: Option<String>,
    pub total_count: u64,
    pub used_count: u64,
    pub remaining_count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub usage_rate: Decimal,
}

/// Occupancy of one `(period, area, plot type)` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaInventory {
    pub period: Period,
    #[serde(with = "rust_decimal::serde::float")]
    pub area_sqm: Decimal,
    pub plot_type: String,
    pub total_count: u64,
    pub used_count: u64,
    pub remaining_count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_area_sqm: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub used_area_sqm: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_area_sqm: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionSortKey {
    #[default]
    Period,
    Section,
    TotalCount,
    UsedCount,
    RemainingCount,
    UsageRate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AreaSortKey {
    #[default]
    Period,
    AreaSqm,
    TotalCount,
    UsedCount,
    RemainingCount,
    RemainingAreaSqm,
    PlotType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<Period>,
}

/// Query for the section breakdown. Missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionQuery {
    pub period: Option<Period>,
    pub status: Option<PlotStatus>,
    pub search: Option<String>,
    pub sort_by: Option<SectionSortKey>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SectionQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Query for the area-size breakdown. Missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaQuery {
    pub period: Option<Period>,
    pub search: Option<String>,
    pub sort_by: Option<AreaSortKey>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl AreaQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Lowercased, trimmed search needle; `None` when there is nothing to match.
pub(crate) fn search_needle(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .map(str::to_lowercase)
}
