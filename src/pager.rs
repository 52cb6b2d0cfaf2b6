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

//! Filter, sort and paginate in-memory report rows.
//!
//! # Example
//!
//! ```
//! use plot_inventory_rs::pager::{paginate, PageRequest, SortOrder};
//!
//! let rows = vec![5, 1, 4, 2, 3];
//! let page = paginate(rows, |n| *n != 4, |a, b| a.cmp(b), SortOrder::Desc, PageRequest::new(Some(1), Some(2)));
//! assert_eq!(page.items, vec![5, 3]);
//! assert_eq!(page.pagination.total, 4);
//! assert_eq!(page.pagination.total_pages, 2);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A normalized page request: `page >= 1`, `1 <= limit <= MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Applies defaults and caps. A zero page or limit counts as missing.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.filter(|page| *page > 0).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        Self { page, limit }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// `(page - 1) * limit`
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    /// Matching rows before pagination.
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Keeps rows matching `predicate`, sorts them with `compare` in `order`, and
/// slices out the requested page.
///
/// The sort is stable in both directions: rows that compare equal keep their
/// input order.
pub fn paginate<T, P, C>(
    items: Vec<T>,
    mut predicate: P,
    mut compare: C,
    order: SortOrder,
    request: PageRequest,
) -> Page<T>
where
    P: FnMut(&T) -> bool,
    C: FnMut(&T, &T) -> Ordering,
{
    let mut matching: Vec<T> = items.into_iter().filter(|item| predicate(item)).collect();
    match order {
        SortOrder::Asc => matching.sort_by(|a, b| compare(a, b)),
        SortOrder::Desc => matching.sort_by(|a, b| compare(b, a)),
    }

    let total = matching.len();
    let limit = request.limit() as usize;
    let items: Vec<T> = matching
        .into_iter()
        .skip(request.offset())
        .take(limit)
        .collect();

    Page {
        items,
        pagination: Pagination {
            page: request.page(),
            limit: request.limit(),
            total,
            total_pages: total.div_ceil(limit),
        },
    }
}
