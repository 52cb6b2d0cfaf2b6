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

//! Occupancy reports over every parcel.
//!
//! # Counting
//!
//! A parcel adds a capacity-weighted fraction to the used count: `1` when
//! sold out, `claimed / total` when partially sold, `0` when available.
//! Fractions are summed unrounded and every output metric is rounded once,
//! on its own, at the end. `remaining_count` is `round(total - used)`, so it
//! need not equal `total_count - used_count`.
//!
//! # Grouping
//!
//! Section and area reports group rows into an arena of tallies indexed by a
//! composite key. Groups appear in the order their first parcel was scanned,
//! which is the order stable sorting falls back to for equal keys. The whole
//! filtered parcel set is held in memory while grouping.

use crate::base::Period;
use crate::error::InventoryError;
use crate::pager::{Page, paginate};
use crate::plot::PlotStatus;
use crate::plot_number::{categorize_section, determine_plot_type, extract_section};
use crate::report::{
    AreaInventory, AreaQuery, AreaSortKey, OverallSummary, PeriodSummaries, PeriodSummary,
    SectionInventory, SectionQuery, SectionSortKey, search_needle,
};
use crate::store::{InventorySource, PlotFilter, PlotInventoryRow};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use std::collections::HashMap;

const RATE_PRECISION: u32 = 1;
const AREA_PRECISION: u32 = 2;

/// A parcel's contribution to the used count.
pub fn capacity_weight(status: PlotStatus, total_area: Decimal, claimed_area: Decimal) -> Decimal {
    match status {
        PlotStatus::SoldOut => Decimal::ONE,
        PlotStatus::PartiallySold => claimed_area
            .min(total_area)
            .checked_div(total_area)
            .unwrap_or(Decimal::ZERO),
        PlotStatus::Available => Decimal::ZERO,
    }
}

/// A parcel's contribution to the used area.
fn used_area(status: PlotStatus, total_area: Decimal, claimed_area: Decimal) -> Decimal {
    match status {
        PlotStatus::SoldOut => total_area,
        PlotStatus::PartiallySold => claimed_area.min(total_area),
        PlotStatus::Available => Decimal::ZERO,
    }
}

fn round_count(value: Decimal) -> u64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(0)
}

fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Unrounded running totals for a set of parcels.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    count: u64,
    used_fraction: Decimal,
    total_area: Decimal,
    used_area: Decimal,
}

impl Tally {
    fn add(&mut self, plot: &PlotInventoryRow) {
        let claimed = plot.claimed_area_sqm();
        self.count += 1;
        self.used_fraction += capacity_weight(plot.status, plot.total_area_sqm, claimed);
        self.total_area += plot.total_area_sqm;
        self.used_area += used_area(plot.status, plot.total_area_sqm, claimed);
    }

    fn total_count(&self) -> u64 {
        self.count
    }

    fn used_count(&self) -> u64 {
        round_count(self.used_fraction)
    }

    fn remaining_count(&self) -> u64 {
        round_count(Decimal::from(self.count) - self.used_fraction)
    }

    fn usage_rate(&self) -> Decimal {
        if self.count == 0 {
            return Decimal::ZERO;
        }
        let rate = self.used_fraction / Decimal::from(self.count) * Decimal::ONE_HUNDRED;
        round_to(rate, RATE_PRECISION)
    }

    fn total_area(&self) -> Decimal {
        round_to(self.total_area, AREA_PRECISION)
    }

    fn used_area(&self) -> Decimal {
        round_to(self.used_area, AREA_PRECISION)
    }

    fn remaining_area(&self) -> Decimal {
        round_to(self.total_area - self.used_area, AREA_PRECISION)
    }
}

/// Counts, areas and usage across every parcel.
///
/// With no parcels every field is zero.
pub fn overall_summary<S: InventorySource + ?Sized>(
    source: &S,
) -> Result<OverallSummary, InventoryError> {
    let plots = source.fetch_all_physical_plots(&PlotFilter::default())?;
    let mut tally = Tally::default();
    for plot in &plots {
        tally.add(plot);
    }

    Ok(OverallSummary {
        total_count: tally.total_count(),
        used_count: tally.used_count(),
        remaining_count: tally.remaining_count(),
        usage_rate: tally.usage_rate(),
        total_area_sqm: tally.total_area(),
        remaining_area_sqm: tally.remaining_area(),
        last_updated: Utc::now(),
    })
}

/// Per-period counts, one entry per period in sales order.
///
/// When `period` is given only that period is scanned and returned.
pub fn period_summaries<S: InventorySource + ?Sized>(
    source: &S,
    period: Option<Period>,
) -> Result<PeriodSummaries, InventoryError> {
    let filter = PlotFilter {
        period,
        status: None,
    };
    let plots = source.fetch_all_physical_plots(&filter)?;

    let mut tallies = [Tally::default(); Period::ALL.len()];
    for plot in &plots {
        let slot = Period::ALL
            .iter()
            .position(|candidate| *candidate == plot.period)
            .unwrap_or_default();
        tallies[slot].add(plot);
    }

    let periods = Period::ALL
        .into_iter()
        .zip(tallies)
        .filter(|(candidate, _)| period.is_none_or(|wanted| wanted == *candidate))
        .map(|(period, tally)| PeriodSummary {
            period,
            total_count: tally.total_count(),
            used_count: tally.used_count(),
            remaining_count: tally.remaining_count(),
            usage_rate: tally.usage_rate(),
        })
        .collect();

    Ok(PeriodSummaries { periods })
}

/// Arena of tallies indexed by a composite group key.
struct Groups<K, V> {
    index: HashMap<K, usize>,
    arena: Vec<(V, Tally)>,
}

impl<K: std::hash::Hash + Eq, V> Groups<K, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            arena: Vec::new(),
        }
    }

    fn add(&mut self, key: K, plot: &PlotInventoryRow, label: impl FnOnce() -> V) {
        let slot = *self.index.entry(key).or_insert_with(|| {
            self.arena.push((label(), Tally::default()));
            self.arena.len() - 1
        });
        self.arena[slot].1.add(plot);
    }

    fn into_arena(self) -> Vec<(V, Tally)> {
        self.arena
    }
}

/// Occupancy grouped by `(period, section)`, filtered, sorted and paginated.
pub fn section_inventory<S: InventorySource + ?Sized>(
    source: &S,
    query: &SectionQuery,
) -> Result<Page<SectionInventory>, InventoryError> {
    let filter = PlotFilter {
        period: query.period,
        status: query.status,
    };
    let plots = source.fetch_all_physical_plots(&filter)?;

    let mut groups: Groups<(Period, String), (Period, String)> = Groups::new();
    for plot in &plots {
        let section = extract_section(&plot.plot_number);
        let key = (plot.period, section.to_string());
        groups.add(key, plot, || (plot.period, section.to_string()));
    }

    let rows: Vec<SectionInventory> = groups
        .into_arena()
        .into_iter()
        .map(|((period, section), tally)| SectionInventory {
            period,
            category: categorize_section(&section).map(str::to_string),
            section,
            total_count: tally.total_count(),
            used_count: tally.used_count(),
            remaining_count: tally.remaining_count(),
            usage_rate: tally.usage_rate(),
        })
        .collect();

    let needle = search_needle(query.search.as_deref());
    let sort_by = query.sort_by.unwrap_or_default();
    Ok(paginate(
        rows,
        |row| match &needle {
            None => true,
            Some(needle) => {
                row.period.label().to_lowercase().contains(needle)
                    || row.section.to_lowercase().contains(needle)
                    || row
                        .category
                        .as_deref()
                        .is_some_and(|category| category.to_lowercase().contains(needle))
            }
        },
        |a, b| compare_sections(sort_by, a, b),
        query.sort_order.unwrap_or_default(),
        query.page_request(),
    ))
}

fn compare_sections(key: SectionSortKey, a: &SectionInventory, b: &SectionInventory) -> Ordering {
    match key {
        SectionSortKey::Period => a.period.label().cmp(b.period.label()),
        SectionSortKey::Section => a.section.cmp(&b.section),
        SectionSortKey::TotalCount => a.total_count.cmp(&b.total_count),
        SectionSortKey::UsedCount => a.used_count.cmp(&b.used_count),
        SectionSortKey::RemainingCount => a.remaining_count.cmp(&b.remaining_count),
        SectionSortKey::UsageRate => a.usage_rate.cmp(&b.usage_rate),
    }
}

/// Occupancy grouped by `(period, area, plot type)`, filtered, sorted and paginated.
pub fn area_inventory<S: InventorySource + ?Sized>(
    source: &S,
    query: &AreaQuery,
) -> Result<Page<AreaInventory>, InventoryError> {
    let filter = PlotFilter {
        period: query.period,
        status: None,
    };
    let plots = source.fetch_all_physical_plots(&filter)?;

    let mut groups: Groups<(Period, Decimal, &'static str), (Period, Decimal, &'static str)> =
        Groups::new();
    for plot in &plots {
        let area = plot.total_area_sqm.normalize();
        let plot_type = determine_plot_type(extract_section(&plot.plot_number), area);
        groups.add((plot.period, area, plot_type), plot, || {
            (plot.period, area, plot_type)
        });
    }

    let rows: Vec<AreaInventory> = groups
        .into_arena()
        .into_iter()
        .map(|((period, area_sqm, plot_type), tally)| AreaInventory {
            period,
            area_sqm,
            plot_type: plot_type.to_string(),
            total_count: tally.total_count(),
            used_count: tally.used_count(),
            remaining_count: tally.remaining_count(),
            total_area_sqm: tally.total_area(),
            used_area_sqm: tally.used_area(),
            remaining_area_sqm: tally.remaining_area(),
        })
        .collect();

    let needle = search_needle(query.search.as_deref());
    let sort_by = query.sort_by.unwrap_or_default();
    Ok(paginate(
        rows,
        |row| match &needle {
            None => true,
            Some(needle) => {
                row.period.label().to_lowercase().contains(needle)
                    || row.plot_type.to_lowercase().contains(needle)
            }
        },
        |a, b| compare_areas(sort_by, a, b),
        query.sort_order.unwrap_or_default(),
        query.page_request(),
    ))
}

fn compare_areas(key: AreaSortKey, a: &AreaInventory, b: &AreaInventory) -> Ordering {
    match key {
        AreaSortKey::Period => a.period.label().cmp(b.period.label()),
        AreaSortKey::AreaSqm => a.area_sqm.cmp(&b.area_sqm),
        AreaSortKey::TotalCount => a.total_count.cmp(&b.total_count),
        AreaSortKey::UsedCount => a.used_count.cmp(&b.used_count),
        AreaSortKey::RemainingCount => a.remaining_count.cmp(&b.remaining_count),
        AreaSortKey::RemainingAreaSqm => a.remaining_area_sqm.cmp(&b.remaining_area_sqm),
        AreaSortKey::PlotType => a.plot_type.cmp(&b.plot_type),
    }
}
