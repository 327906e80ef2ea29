// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Request and response types for the trials search endpoint.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Default overall statuses used when the `statuses` parameter is absent.
/// These are the four "open" statuses of the registry, spelled exactly as
/// the registry spells them (note the comma in the last one).
pub const DEFAULT_STATUSES: [&str; 4] = [
    "Recruiting",
    "Not yet recruiting",
    "Enrolling by invitation",
    "Active, not recruiting",
];

/// Raw query parameters of `GET /api/trials`.
///
/// Pagination fields are kept as strings so that non-numeric input degrades
/// to defaults instead of being rejected by the extractor.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TrialsQuery {
    /// 1-based result page (default 1).
    pub page: Option<String>,
    /// Results per page, 1-100 (default 20).
    pub page_size: Option<String>,
    /// Free-text disease filter, matched against trial conditions.
    pub disease: Option<String>,
    /// Free-text medical-term filter, matched against trial conditions.
    pub medical: Option<String>,
    /// Free-text drug filter, matched against intervention names.
    pub drug: Option<String>,
    /// Free-text location filter, matched against city/state/country/facility.
    pub location: Option<String>,
    /// Comma-separated overall statuses, overriding the four-status default.
    pub statuses: Option<String>,
}

/// Validated, immutable search filters built from [`TrialsQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters {
    pub disease: Option<String>,
    pub medical_term: Option<String>,
    pub drug: Option<String>,
    pub location: Option<String>,
    pub statuses: Vec<String>,
    pub page: u32,
    pub page_size: u32,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SearchFilters {
    /// Build filters from raw query parameters.
    ///
    /// Invalid pagination clamps to defaults rather than erroring: `page`
    /// falls back to 1 when non-numeric or < 1, `page_size` falls back to 20
    /// when non-numeric, < 1, or > 100.
    pub fn from_query(query: TrialsQuery) -> Self {
        let page = query
            .page
            .as_deref()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&p| p > 0)
            .unwrap_or(1);

        let page_size = query
            .page_size
            .as_deref()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&s| s > 0 && s <= 100)
            .unwrap_or(20);

        let statuses: Vec<String> = match non_empty(query.statuses) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };
        let statuses = if statuses.is_empty() {
            DEFAULT_STATUSES.iter().map(|s| s.to_string()).collect()
        } else {
            statuses
        };

        Self {
            disease: non_empty(query.disease),
            medical_term: non_empty(query.medical),
            drug: non_empty(query.drug),
            location: non_empty(query.location),
            statuses,
            page,
            page_size,
        }
    }
}

/// Location fields of a trial, each a list because a trial can run at
/// multiple sites.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TrialLocations {
    pub city: Vec<String>,
    pub state: Vec<String>,
    pub country: Vec<String>,
    pub facility: Vec<String>,
}

/// One normalized trial record, flattened from the registry's field bag.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    pub nct_id: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub last_updated: Option<String>,
    pub conditions: Vec<String>,
    pub interventions: Vec<String>,
    pub sponsor: Option<String>,
    pub study_type: Option<String>,
    pub start_date: Option<String>,
    pub primary_completion_date: Option<String>,
    pub locations: TrialLocations,
}

/// Paged search response: records sorted by descending last-update date.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult {
    pub page: u32,
    pub page_size: u32,
    /// Upstream-reported total, falling back to `data.len()`.
    pub total: u64,
    pub data: Vec<TrialRecord>,
}

/// JSON error body for 502/500 responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Upstream HTTP status, present only for upstream failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}
