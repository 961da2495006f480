//! Offset pagination shared by every list endpoint.

use serde::Serialize;

use crate::error::{DomainError, DomainResult};

/// Validated `limit`/`offset` pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    limit: i64,
    offset: i64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Build a page request; absent values take their defaults.
    ///
    /// `limit` must be within `1..=100`, `offset` must be non-negative.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> DomainResult<Self> {
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT);
        let offset = offset.unwrap_or(0);
        if !(1..=Self::MAX_LIMIT).contains(&limit) {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {} (got {limit})",
                Self::MAX_LIMIT
            )));
        }
        if offset < 0 {
            return Err(DomainError::validation(format!(
                "offset must be >= 0 (got {offset})"
            )));
        }
        Ok(Self { limit, offset })
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// One page of results plus the unpaginated total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, total: i64, items: Vec<T>) -> Self {
        Self {
            total,
            limit: request.limit(),
            offset: request.offset(),
            items,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            limit: self.limit,
            offset: self.offset,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
