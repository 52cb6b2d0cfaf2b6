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

//! Plot number parsing and classification.
//!
//! A plot number such as `"吉相-10"` is a section prefix followed by a
//! `-<digits>` suffix. Reports group by section, by display category and by
//! plot type.
//!
//! # Example
//!
//! ```
//! use plot_inventory_rs::plot_number::{determine_plot_type, extract_section};
//! use rust_decimal_macros::dec;
//!
//! let section = extract_section("天空K-3");
//! assert_eq!(section, "天空K");
//! assert_eq!(determine_plot_type(section, dec!(3.6)), "天空");
//! ```

use rust_decimal::Decimal;

/// Section pairs folded into one display category.
const SECTION_CATEGORIES: &[(&str, &str)] = &[("樹林", "樹林・天空"), ("天空K", "樹林・天空")];

/// Sections that are their own plot type.
const NAMED_SECTIONS: &[&str] = &["吉相", "るり庵テラス", "樹林", "憩"];

/// Compound-name families, matched by substring after the named sections.
const SECTION_FAMILIES: &[(&str, &str)] = &[("天空", "天空"), ("るり庵", "るり庵")];

/// Special zones, matched exactly after the families.
const SPECIAL_ZONES: &[(&str, &str)] = &[("特別区画", "特別区画"), ("ペット", "ペット共葬")];

/// Plot type for every section no rule names.
pub const DEFAULT_PLOT_TYPE: &str = "自由";

/// Returns the section part of a plot number.
///
/// Strips a trailing `-<digits>` suffix when the prefix before it is
/// non-empty; any other token is its own section.
pub fn extract_section(plot_number: &str) -> &str {
    match plot_number.rsplit_once('-') {
        Some((prefix, digits))
            if !prefix.is_empty()
                && !digits.is_empty()
                && digits.chars().all(|c| c.is_ascii_digit()) =>
        {
            prefix
        }
        _ => plot_number,
    }
}

/// Returns the broader display category of a section, if it has one.
pub fn categorize_section(section: &str) -> Option<&'static str> {
    SECTION_CATEGORIES
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, category)| *category)
}

/// Classifies a section into its reporting plot type.
///
/// Rules are tried in order: named sections, then compound-name families,
/// then special zones, then [`DEFAULT_PLOT_TYPE`]. Named sections must win
/// over families so `"るり庵テラス"` keeps its own type instead of `"るり庵"`.
///
/// The area is part of the signature for parity with area-based reports;
/// no current rule depends on it.
pub fn determine_plot_type(section: &str, _area_sqm: Decimal) -> &'static str {
    if let Some(named) = NAMED_SECTIONS.iter().find(|name| **name == section) {
        return *named;
    }
    if let Some((_, plot_type)) = SECTION_FAMILIES
        .iter()
        .find(|(needle, _)| section.contains(needle))
    {
        return *plot_type;
    }
    if let Some((_, plot_type)) = SPECIAL_ZONES.iter().find(|(zone, _)| *zone == section) {
        return *plot_type;
    }
    DEFAULT_PLOT_TYPE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn extract_section_strips_numeric_suffix() {
        assert_eq!(extract_section("A-56"), "A");
        assert_eq!(extract_section("吉相-10"), "吉相");
        assert_eq!(extract_section("るり庵テラス-1"), "るり庵テラス");
    }

    #[test]
    fn extract_section_keeps_plain_tokens() {
        assert_eq!(extract_section("A"), "A");
        assert_eq!(extract_section("A-"), "A-");
        assert_eq!(extract_section("-12"), "-12");
        assert_eq!(extract_section("A-1b"), "A-1b");
    }

    #[test]
    fn extract_section_only_strips_last_suffix() {
        assert_eq!(extract_section("B-2-7"), "B-2");
    }

    #[test]
    fn categorize_folds_tree_and_sky_sections() {
        assert_eq!(categorize_section("樹林"), Some("樹林・天空"));
        assert_eq!(categorize_section("天空K"), Some("樹林・天空"));
        assert_eq!(categorize_section("A"), None);
    }

    #[test]
    fn named_sections_are_their_own_type() {
        assert_eq!(determine_plot_type("吉相", dec!(3.6)), "吉相");
        assert_eq!(determine_plot_type("るり庵テラス", dec!(1.0)), "るり庵テラス");
    }

    #[test]
    fn compound_families_match_by_substring() {
        assert_eq!(determine_plot_type("天空K", dec!(3.6)), "天空");
        assert_eq!(determine_plot_type("るり庵II", dec!(1.0)), "るり庵");
    }

    #[test]
    fn special_zones_match_exactly() {
        assert_eq!(determine_plot_type("特別区画", dec!(9.0)), "特別区画");
        assert_eq!(determine_plot_type("ペット", dec!(1.0)), "ペット共葬");
        assert_eq!(determine_plot_type("ペット2", dec!(1.0)), DEFAULT_PLOT_TYPE);
    }

    #[test]
    fn everything_else_is_default() {
        assert_eq!(determine_plot_type("X", dec!(3.6)), "自由");
        assert_eq!(determine_plot_type("A", dec!(7.2)), "自由");
    }
}
