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

//! Occupancy report integration tests.

use chrono::Utc;
use plot_inventory_rs::pager::SortOrder;
use plot_inventory_rs::report::{
    AreaInventory, AreaQuery, AreaSortKey, SectionInventory, SectionQuery, SectionSortKey,
};
use plot_inventory_rs::store::{InventorySource, PlotFilter, PlotInventoryRow};
use plot_inventory_rs::{
    ContractPlotId, InventoryError, NewPhysicalPlot, Period, PhysicalPlotId, PlotRegistry,
    PlotStatus, StoreError, inventory,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct Fixture {
    registry: PlotRegistry,
    next_claim: u32,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            registry: PlotRegistry::new(),
            next_claim: 1,
        }
    }

    /// Registers a parcel and claims `claims` against it.
    fn plot(&mut self, id: u32, number: &str, period: Period, area: Decimal, claims: &[Decimal]) {
        self.registry
            .register_plot(NewPhysicalPlot {
                id: PhysicalPlotId(id),
                plot_number: number.to_string(),
                period,
                total_area_sqm: area,
                notes: None,
            })
            .unwrap();
        for claim in claims {
            self.registry
                .create_claim(
                    PhysicalPlotId(id),
                    ContractPlotId(self.next_claim),
                    *claim,
                    Utc::now(),
                )
                .unwrap();
            self.next_claim += 1;
        }
    }
}

/// Three 3.6 m² parcels in 1期: available, sold out, half sold.
fn three_plots() -> Fixture {
    let mut fixture = Fixture::new();
    fixture.plot(1, "A-1", Period::First, dec!(3.6), &[]);
    fixture.plot(2, "A-2", Period::First, dec!(3.6), &[dec!(3.6)]);
    fixture.plot(3, "A-3", Period::First, dec!(3.6), &[dec!(1.8)]);
    fixture
}

/// A mixed layout across periods, sections and sizes.
fn cemetery() -> Fixture {
    let mut fixture = Fixture::new();
    fixture.plot(1, "A-1", Period::First, dec!(3.6), &[dec!(3.6)]);
    fixture.plot(2, "A-2", Period::First, dec!(3.6), &[]);
    fixture.plot(3, "吉相-1", Period::First, dec!(2.0), &[dec!(1.0)]);
    fixture.plot(4, "樹林-1", Period::Second, dec!(1.0), &[dec!(1.0)]);
    fixture.plot(5, "天空K-3", Period::Second, dec!(1.0), &[]);
    fixture.plot(6, "B-7", Period::Second, dec!(3.6), &[dec!(0.9)]);
    fixture.plot(7, "ペット-2", Period::Third, dec!(0.5), &[]);
    fixture
}

#[test]
fn end_to_end_overall_summary() {
    let fixture = three_plots();
    let summary = fixture.registry.summary().unwrap();

    assert_eq!(summary.total_count, 3);
    assert_eq!(summary.used_count, 2);
    assert_eq!(summary.remaining_count, 2);
    assert_eq!(summary.total_area_sqm, dec!(10.8));
    assert_eq!(summary.remaining_area_sqm, dec!(5.4));
    assert_eq!(summary.usage_rate, dec!(50.0));
}

#[test]
fn empty_inventory_summary_is_all_zero() {
    let registry = PlotRegistry::new();
    let summary = registry.summary().unwrap();

    assert_eq!(summary.total_count, 0);
    assert_eq!(summary.used_count, 0);
    assert_eq!(summary.remaining_count, 0);
    assert_eq!(summary.usage_rate, Decimal::ZERO);
    assert_eq!(summary.total_area_sqm, Decimal::ZERO);
    assert_eq!(summary.remaining_area_sqm, Decimal::ZERO);
}

#[test]
fn period_summaries_cover_every_period() {
    let fixture = cemetery();
    let summaries = fixture.registry.periods(None).unwrap();

    let periods: Vec<Period> = summaries.periods.iter().map(|p| p.period).collect();
    assert_eq!(periods, Period::ALL.to_vec());

    let first = &summaries.periods[0];
    // 1 + 0 + 0.5
    assert_eq!(first.total_count, 3);
    assert_eq!(first.used_count, 2);
    assert_eq!(first.remaining_count, 2);
    assert_eq!(first.usage_rate, dec!(50.0));

    let second = &summaries.periods[1];
    // 1 + 0 + 0.25
    assert_eq!(second.total_count, 3);
    assert_eq!(second.used_count, 1);
    assert_eq!(second.remaining_count, 2);
    assert_eq!(second.usage_rate, dec!(41.7));

    let fourth = &summaries.periods[3];
    assert_eq!(fourth.total_count, 0);
    assert_eq!(fourth.usage_rate, Decimal::ZERO);
}

#[test]
fn period_summary_for_one_period() {
    let fixture = cemetery();
    let summaries = fixture.registry.periods(Some(Period::Third)).unwrap();

    assert_eq!(summaries.periods.len(), 1);
    assert_eq!(summaries.periods[0].period, Period::Third);
    assert_eq!(summaries.periods[0].total_count, 1);
    assert_eq!(summaries.periods[0].used_count, 0);
}

#[test]
fn sections_group_by_period_and_section() {
    let fixture = cemetery();
    let page = fixture.registry.sections(&SectionQuery::default()).unwrap();

    let keys: Vec<(Period, &str)> = page
        .items
        .iter()
        .map(|row| (row.period, row.section.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (Period::First, "A"),
            (Period::First, "吉相"),
            (Period::Second, "樹林"),
            (Period::Second, "天空K"),
            (Period::Second, "B"),
            (Period::Third, "ペット"),
        ]
    );
    assert_eq!(page.pagination.total, 6);
    assert_eq!(page.items[0].total_count, 2);
    assert_eq!(page.items[0].used_count, 1);
    assert_eq!(page.items[2].category.as_deref(), Some("樹林・天空"));
    assert_eq!(page.items[3].category.as_deref(), Some("樹林・天空"));
    assert_eq!(page.items[4].category, None);
}

#[test]
fn sections_search_matches_category() {
    let fixture = cemetery();
    let query = SectionQuery {
        search: Some("天空".to_string()),
        ..Default::default()
    };
    let page = fixture.registry.sections(&query).unwrap();

    // 樹林 matches through its category, 天空K through both.
    let sections: Vec<&str> = page.items.iter().map(|row| row.section.as_str()).collect();
    assert_eq!(sections, vec!["樹林", "天空K"]);
    assert_eq!(page.pagination.total, 2);
}

#[test]
fn sections_search_matches_period_case_insensitively() {
    let mut fixture = Fixture::new();
    fixture.plot(1, "abc-1", Period::First, dec!(1.0), &[]);
    fixture.plot(2, "XYZ-1", Period::Second, dec!(1.0), &[]);

    let by_section = SectionQuery {
        search: Some("ABC".to_string()),
        ..Default::default()
    };
    let page = fixture.registry.sections(&by_section).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].section, "abc");

    let by_period = SectionQuery {
        search: Some("2期".to_string()),
        ..Default::default()
    };
    let page = fixture.registry.sections(&by_period).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].section, "XYZ");
}

#[test]
fn sections_status_filter_applies_before_grouping() {
    let fixture = cemetery();
    let query = SectionQuery {
        status: Some(PlotStatus::SoldOut),
        ..Default::default()
    };
    let page = fixture.registry.sections(&query).unwrap();

    let sections: Vec<&str> = page.items.iter().map(|row| row.section.as_str()).collect();
    assert_eq!(sections, vec!["A", "樹林"]);
    assert_eq!(page.items[0].total_count, 1);
    assert_eq!(page.items[0].usage_rate, dec!(100.0));
}

#[test]
fn sections_desc_sort_is_non_increasing() {
    let fixture = cemetery();
    let query = SectionQuery {
        sort_by: Some(SectionSortKey::UsageRate),
        sort_order: Some(SortOrder::Desc),
        ..Default::default()
    };
    let page = fixture.registry.sections(&query).unwrap();

    let rates: Vec<Decimal> = page.items.iter().map(|row| row.usage_rate).collect();
    assert!(rates.windows(2).all(|pair| pair[0] >= pair[1]));
    assert_eq!(rates[0], dec!(100.0));
}

#[test]
fn sections_paginate_after_filtering() {
    let fixture = cemetery();
    let query = SectionQuery {
        period: Some(Period::Second),
        sort_by: Some(SectionSortKey::Section),
        page: Some(2),
        limit: Some(2),
        ..Default::default()
    };
    let page = fixture.registry.sections(&query).unwrap();

    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.pagination.total_pages, 2);
    assert_eq!(page.pagination.page, 2);
    assert_eq!(page.items.len(), 1);
    // "B" < "天空K" < "樹林" by code point
    assert_eq!(page.items[0].section, "樹林");
}

#[test]
fn areas_group_by_period_area_and_type() {
    let fixture = cemetery();
    let page = fixture.registry.areas(&AreaQuery::default()).unwrap();

    let keys: Vec<(Period, Decimal, &str)> = page
        .items
        .iter()
        .map(|row| (row.period, row.area_sqm, row.plot_type.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (Period::First, dec!(3.6), "自由"),
            (Period::First, dec!(2.0), "吉相"),
            (Period::Second, dec!(1.0), "樹林"),
            (Period::Second, dec!(1.0), "天空"),
            (Period::Second, dec!(3.6), "自由"),
            (Period::Third, dec!(0.5), "ペット共葬"),
        ]
    );

    let free = &page.items[0];
    assert_eq!(free.total_count, 2);
    assert_eq!(free.used_count, 1);
    assert_eq!(free.remaining_count, 1);
    assert_eq!(free.total_area_sqm, dec!(7.2));
    assert_eq!(free.used_area_sqm, dec!(3.6));
    assert_eq!(free.remaining_area_sqm, dec!(3.6));

    let second_free = &page.items[4];
    assert_eq!(second_free.used_area_sqm, dec!(0.9));
    assert_eq!(second_free.remaining_area_sqm, dec!(2.7));
}

#[test]
fn areas_treat_equal_areas_as_one_group() {
    let mut fixture = Fixture::new();
    fixture.plot(1, "C-1", Period::First, dec!(3.6), &[]);
    fixture.plot(2, "C-2", Period::First, dec!(3.60), &[]);

    let page = fixture.registry.areas(&AreaQuery::default()).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].total_count, 2);
}

#[test]
fn areas_search_matches_plot_type() {
    let fixture = cemetery();
    let query = AreaQuery {
        search: Some("自由".to_string()),
        sort_by: Some(AreaSortKey::RemainingAreaSqm),
        sort_order: Some(SortOrder::Desc),
        ..Default::default()
    };
    let page = fixture.registry.areas(&query).unwrap();

    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.items[0].remaining_area_sqm, dec!(3.6));
    assert_eq!(page.items[1].remaining_area_sqm, dec!(2.7));
}

/// The value a report is sorted by, compared the way its column is.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
enum SortValue {
    Text(String),
    Count(u64),
    Number(Decimal),
}

fn section_value(key: SectionSortKey, row: &SectionInventory) -> SortValue {
    match key {
        SectionSortKey::Period => SortValue::Text(row.period.label().to_string()),
        SectionSortKey::Section => SortValue::Text(row.section.clone()),
        SectionSortKey::TotalCount => SortValue::Count(row.total_count),
        SectionSortKey::UsedCount => SortValue::Count(row.used_count),
        SectionSortKey::RemainingCount => SortValue::Count(row.remaining_count),
        SectionSortKey::UsageRate => SortValue::Number(row.usage_rate),
    }
}

fn area_value(key: AreaSortKey, row: &AreaInventory) -> SortValue {
    match key {
        AreaSortKey::Period => SortValue::Text(row.period.label().to_string()),
        AreaSortKey::AreaSqm => SortValue::Number(row.area_sqm),
        AreaSortKey::TotalCount => SortValue::Count(row.total_count),
        AreaSortKey::UsedCount => SortValue::Count(row.used_count),
        AreaSortKey::RemainingCount => SortValue::Count(row.remaining_count),
        AreaSortKey::RemainingAreaSqm => SortValue::Number(row.remaining_area_sqm),
        AreaSortKey::PlotType => SortValue::Text(row.plot_type.clone()),
    }
}

fn assert_ordered(values: &[SortValue], order: SortOrder, key: &str) {
    let ordered = values.windows(2).all(|pair| match order {
        SortOrder::Asc => pair[0] <= pair[1],
        SortOrder::Desc => pair[0] >= pair[1],
    });
    assert!(ordered, "{key} {order:?} out of order: {values:?}");
}

#[test]
fn every_section_sort_key_orders_its_column() {
    let fixture = cemetery();
    let keys = [
        SectionSortKey::Period,
        SectionSortKey::Section,
        SectionSortKey::TotalCount,
        SectionSortKey::UsedCount,
        SectionSortKey::RemainingCount,
        SectionSortKey::UsageRate,
    ];

    for key in keys {
        let mut ascending = Vec::new();
        for order in [SortOrder::Asc, SortOrder::Desc] {
            let query = SectionQuery {
                sort_by: Some(key),
                sort_order: Some(order),
                ..Default::default()
            };
            let page = fixture.registry.sections(&query).unwrap();
            assert_eq!(page.items.len(), 6);

            let values: Vec<SortValue> =
                page.items.iter().map(|row| section_value(key, row)).collect();
            assert_ordered(&values, order, &format!("{key:?}"));
            match order {
                SortOrder::Asc => ascending = values,
                SortOrder::Desc => {
                    let mut reversed = values;
                    reversed.reverse();
                    assert_eq!(reversed, ascending, "{key:?}");
                }
            }
        }
    }
}

#[test]
fn every_area_sort_key_orders_its_column() {
    let fixture = cemetery();
    let keys = [
        AreaSortKey::Period,
        AreaSortKey::AreaSqm,
        AreaSortKey::TotalCount,
        AreaSortKey::UsedCount,
        AreaSortKey::RemainingCount,
        AreaSortKey::RemainingAreaSqm,
        AreaSortKey::PlotType,
    ];

    for key in keys {
        let mut ascending = Vec::new();
        for order in [SortOrder::Asc, SortOrder::Desc] {
            let query = AreaQuery {
                sort_by: Some(key),
                sort_order: Some(order),
                ..Default::default()
            };
            let page = fixture.registry.areas(&query).unwrap();
            assert_eq!(page.items.len(), 6);

            let values: Vec<SortValue> =
                page.items.iter().map(|row| area_value(key, row)).collect();
            assert_ordered(&values, order, &format!("{key:?}"));
            match order {
                SortOrder::Asc => ascending = values,
                SortOrder::Desc => {
                    let mut reversed = values;
                    reversed.reverse();
                    assert_eq!(reversed, ascending, "{key:?}");
                }
            }
        }
    }
}

#[test]
fn area_sort_by_size_and_type() {
    let fixture = cemetery();
    let by_size = fixture
        .registry
        .areas(&AreaQuery {
            sort_by: Some(AreaSortKey::AreaSqm),
            ..Default::default()
        })
        .unwrap();
    let sizes: Vec<Decimal> = by_size.items.iter().map(|row| row.area_sqm).collect();
    assert_eq!(
        sizes,
        vec![dec!(0.5), dec!(1.0), dec!(1.0), dec!(2.0), dec!(3.6), dec!(3.6)]
    );

    let by_used = fixture
        .registry
        .areas(&AreaQuery {
            sort_by: Some(AreaSortKey::UsedCount),
            sort_order: Some(SortOrder::Desc),
            ..Default::default()
        })
        .unwrap();
    // 1期 自由 (one sold out), then 吉相 (half rounds up), then 樹林
    assert_eq!(by_used.items[0].plot_type, "自由");
    assert_eq!(by_used.items[0].used_count, 1);
    assert_eq!(by_used.items[1].plot_type, "吉相");
    assert_eq!(by_used.items[2].plot_type, "樹林");
}

#[test]
fn limit_is_capped() {
    let mut fixture = Fixture::new();
    for id in 1..=120 {
        fixture.plot(id, &format!("S{id}-1"), Period::First, dec!(1.0), &[]);
    }
    let query = SectionQuery {
        limit: Some(500),
        ..Default::default()
    };
    let page = fixture.registry.sections(&query).unwrap();

    assert_eq!(page.pagination.limit, 100);
    assert_eq!(page.items.len(), 100);
    assert_eq!(page.pagination.total, 120);
    assert_eq!(page.pagination.total_pages, 2);
}

#[test]
fn response_shapes_are_camel_case() {
    let fixture = cemetery();
    let page = fixture.registry.areas(&AreaQuery::default()).unwrap();
    let json = serde_json::to_value(&page).unwrap();

    assert_eq!(json["pagination"]["totalPages"], 1);
    assert_eq!(json["items"][0]["period"], "1期");
    assert_eq!(json["items"][0]["plotType"], "自由");
    assert_eq!(json["items"][0]["remainingAreaSqm"], 3.6);
}

/// A scan source that always fails.
struct BrokenSource;

impl InventorySource for BrokenSource {
    fn fetch_all_physical_plots(
        &self,
        _filter: &PlotFilter,
    ) -> Result<Vec<PlotInventoryRow>, StoreError> {
        Err(StoreError::Unavailable("connection reset".to_string()))
    }
}

#[test]
fn scan_failure_fails_the_whole_report() {
    let expected = InventoryError::Scan(StoreError::Unavailable("connection reset".to_string()));

    assert_eq!(inventory::overall_summary(&BrokenSource), Err(expected.clone()));
    assert_eq!(
        inventory::period_summaries(&BrokenSource, None),
        Err(expected.clone())
    );
    assert_eq!(
        inventory::section_inventory(&BrokenSource, &SectionQuery::default()),
        Err(expected.clone())
    );
    assert_eq!(
        inventory::area_inventory(&BrokenSource, &AreaQuery::default()),
        Err(expected)
    );
}
