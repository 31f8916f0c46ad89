//! Admin list query: search, filters, sort and page.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use pagination::PageRequest;

use crate::domain::{ApplicationStatus, ApplicationType};

/// Sortable columns of the admin list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    /// When the application was created.
    CreatedAt,
    /// When the applicant submitted.
    SubmittedAt,
    /// Applicant display name.
    ApplicantName,
    /// Requested principal.
    LoanAmount,
    /// Lifecycle status.
    Status,
    /// Product type.
    ApplicationType,
}

impl SortColumn {
    /// Field name understood by the backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::SubmittedAt => "submittedAt",
            Self::ApplicantName => "applicantName",
            Self::LoanAmount => "loanAmount",
            Self::Status => "status",
            Self::ApplicationType => "applicationType",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        [
            Self::CreatedAt,
            Self::SubmittedAt,
            Self::ApplicantName,
            Self::LoanAmount,
            Self::Status,
            Self::ApplicationType,
        ]
        .into_iter()
        .find(|column| column.as_str().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| format!("unknown sort column: {wanted}"))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// The other direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortOrder {
    /// Column sorted on.
    pub column: SortColumn,
    /// Direction of the sort.
    pub direction: SortDirection,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            column: SortColumn::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

/// Admin list query.
///
/// ## Invariants
/// - Every filter change returns to the first page.
/// - Sort and page changes keep the filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminQuery {
    search: Option<String>,
    status: Option<ApplicationStatus>,
    application_type: Option<ApplicationType>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    sort: SortOrder,
    page: PageRequest,
}

impl AdminQuery {
    /// Free-text search; blank input clears it.
    pub fn set_search(&mut self, search: Option<&str>) {
        self.search = search
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        self.page = self.page.first();
    }

    /// Status filter.
    pub fn set_status(&mut self, status: Option<ApplicationStatus>) {
        self.status = status;
        self.page = self.page.first();
    }

    /// Product filter.
    pub fn set_application_type(&mut self, application_type: Option<ApplicationType>) {
        self.application_type = application_type;
        self.page = self.page.first();
    }

    /// Inclusive creation-date range. Either bound may be open.
    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.from = from;
        self.to = to;
        self.page = self.page.first();
    }

    /// Flip the direction when `column` is already active, otherwise sort by
    /// it ascending.
    pub fn toggle_sort(&mut self, column: SortColumn) {
        self.sort = if self.sort.column == column {
            SortOrder {
                column,
                direction: self.sort.direction.flipped(),
            }
        } else {
            SortOrder {
                column,
                direction: SortDirection::Asc,
            }
        };
    }

    /// Jump to a zero-based page.
    pub fn set_page(&mut self, page: u32) {
        self.page = self.page.with_page(page);
    }

    /// Replace the page size, returning to the first page.
    pub fn set_page_size(&mut self, page: PageRequest) {
        self.page = page.first();
    }

    /// Trimmed search text, if any.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Status filter.
    pub const fn status(&self) -> Option<ApplicationStatus> {
        self.status
    }

    /// Product filter.
    pub const fn application_type(&self) -> Option<ApplicationType> {
        self.application_type
    }

    /// Current sort.
    pub const fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Page being shown.
    pub const fn page(&self) -> PageRequest {
        self.page
    }

    /// Query pairs for `/admin/applications` and its CSV export.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_owned()));
        }
        if let Some(kind) = self.application_type {
            pairs.push(("type", kind.as_str().to_owned()));
        }
        if let Some(from) = self.from {
            pairs.push(("startDate", from.to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("endDate", to.to_string()));
        }
        pairs.push((
            "sort",
            format!(
                "{},{}",
                self.sort.column.as_str(),
                self.sort.direction.as_str()
            ),
        ));
        pairs.extend(self.page.query_pairs());
        pairs
    }
}
