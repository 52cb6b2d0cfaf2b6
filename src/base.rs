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

//! Core identifier types for parcels and claims, and the sales period enumeration.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a physical land parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PhysicalPlotId(pub u32);

impl fmt::Display for PhysicalPlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a contract plot (a claim against a parcel).
///
/// Claim IDs are unique across all parcels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ContractPlotId(pub u32);

impl fmt::Display for ContractPlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sales phase a parcel was released in.
///
/// Serialized by its display label (`"1期"` .. `"4期"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    First,
    Second,
    Third,
    Fourth,
}

impl Period {
    /// Every period, in sales order.
    pub const ALL: [Period; 4] = [Period::First, Period::Second, Period::Third, Period::Fourth];

    pub fn label(&self) -> &'static str {
        match self {
            Period::First => "1期",
            Period::Second => "2期",
            Period::Third => "3期",
            Period::Fourth => "4期",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a string is not one of the known period labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown period: {0}")]
pub struct UnknownPeriod(pub String);

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|period| period.label() == s.trim())
            .ok_or_else(|| UnknownPeriod(s.to_string()))
    }
}

impl Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_labels_round_trip_through_from_str() {
        for period in Period::ALL {
            assert_eq!(period.label().parse::<Period>(), Ok(period));
        }
    }

    #[test]
    fn unknown_period_is_rejected() {
        assert_eq!(
            "5期".parse::<Period>(),
            Err(UnknownPeriod("5期".to_string()))
        );
    }

    #[test]
    fn period_order_matches_label_order() {
        let mut labels: Vec<&str> = Period::ALL.iter().map(Period::label).collect();
        labels.sort();
        assert_eq!(labels, vec!["1期", "2期", "3期", "4期"]);
    }

    #[test]
    fn period_serializes_as_label() {
        let json = serde_json::to_string(&Period::Third).unwrap();
        assert_eq!(json, "\"3期\"");
        let parsed: Period = serde_json::from_str("\"2期\"").unwrap();
        assert_eq!(parsed, Period::Second);
    }
}
