//! Sorting and pagination parameters shared by every list endpoint.
//!
//! Raw query-string values go in, validated `Filters` come out. The sort
//! column handed to SQL is always borrowed from a `'static` allow-list, so
//! nothing the client sends is ever spliced into an `ORDER BY` clause.

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid sort value: {0}")]
    InvalidSort(String),

    #[error("invalid {field}: {reason}")]
    InvalidPagination {
        field: &'static str,
        reason: &'static str,
    },
}

impl FilterError {
    /// Query-string parameter the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidSort(_) => "sort",
            Self::InvalidPagination { field, .. } => field,
        }
    }

    pub fn reason(&self) -> String {
        match self {
            Self::InvalidSort(_) => "invalid sort value".to_string(),
            Self::InvalidPagination { reason, .. } => (*reason).to_string(),
        }
    }
}

// -- Sorting --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    column: &'static str,
    direction: SortDirection,
}

impl SortSpec {
    /// Match `requested` byte-for-byte against `safelist`. A leading `-`
    /// selects descending order.
    pub fn parse(requested: &str, safelist: &'static [&'static str]) -> Result<Self, FilterError> {
        let key = safelist
            .iter()
            .copied()
            .find(|allowed| *allowed == requested)
            .ok_or_else(|| FilterError::InvalidSort(requested.to_string()))?;

        Ok(match key.strip_prefix('-') {
            Some(column) => Self { column, direction: SortDirection::Desc },
            None => Self { column: key, direction: SortDirection::Asc },
        })
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

// -- Paging --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    page: i64,
    page_size: i64,
}

impl PageSpec {
    pub fn new(page: i64, page_size: i64) -> Result<Self, FilterError> {
        if page <= 0 {
            return Err(FilterError::InvalidPagination {
                field: "page",
                reason: "must be greater than zero",
            });
        }
        if page_size <= 0 {
            return Err(FilterError::InvalidPagination {
                field: "page_size",
                reason: "must be greater than zero",
            });
        }
        if page_size > MAX_PAGE_SIZE {
            return Err(FilterError::InvalidPagination {
                field: "page_size",
                reason: "must be a maximum of 100",
            });
        }
        Ok(Self { page, page_size })
    }

    /// Absent values take the defaults; present ones must be integers.
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Result<Self, FilterError> {
        let page = parse_int("page", page, DEFAULT_PAGE)?;
        let page_size = parse_int("page_size", page_size, DEFAULT_PAGE_SIZE)?;
        Self::new(page, page_size)
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

fn parse_int(field: &'static str, raw: Option<&str>, default: i64) -> Result<i64, FilterError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse().map_err(|_| FilterError::InvalidPagination {
            field,
            reason: "must be an integer value",
        }),
    }
}

/// Validated sort + page window for one list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filters {
    pub sort: SortSpec,
    pub page: PageSpec,
}

impl Filters {
    /// `default_sort` is used only when the client sent no `sort` at all; it
    /// still has to be a member of `safelist`.
    pub fn parse(
        page: Option<&str>,
        page_size: Option<&str>,
        sort: Option<&str>,
        default_sort: &str,
        safelist: &'static [&'static str],
    ) -> Result<Self, FilterError> {
        let page = PageSpec::parse(page, page_size)?;
        let sort = SortSpec::parse(sort.unwrap_or(default_sort), safelist)?;
        Ok(Self { sort, page })
    }
}

// -- Metadata --

/// Shape of one page of a scoped result set. All zero means "no rows".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl Metadata {
    pub fn calculate(total_records: i64, page: &PageSpec) -> Self {
        if total_records <= 0 {
            return Self::default();
        }

        let page_size = page.page_size();
        Self {
            current_page: page.page(),
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}
