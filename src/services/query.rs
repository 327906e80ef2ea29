// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Translation of [`SearchFilters`] into the registry's query language:
//! a search expression, a fixed field projection, and a rank window.

use crate::models::trials::SearchFilters;
use chrono::{DateTime, Duration, Utc};

/// Fields requested from the registry, in projection order. Constant across
/// all requests.
pub const STUDY_FIELDS: [&str; 14] = [
    "NCTId",
    "BriefTitle",
    "OverallStatus",
    "LastUpdatePostDate",
    "Condition",
    "InterventionName",
    "LeadSponsorName",
    "StudyType",
    "StartDate",
    "PrimaryCompletionDate",
    "LocationCity",
    "LocationState",
    "LocationCountry",
    "LocationFacility",
];

/// 1-based inclusive pagination window in the registry's rank space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankWindow {
    pub min_rank: u64,
    pub max_rank: u64,
}

impl RankWindow {
    /// Window covering `page` at `page_size` records per page.
    /// Both bounds are >= 1 and `min_rank <= max_rank` for valid input
    /// (page >= 1, page_size >= 1), which [`SearchFilters`] guarantees.
    /// Widened to u64 so an extreme `page` cannot overflow.
    pub fn for_page(page: u32, page_size: u32) -> Self {
        let (page, page_size) = (u64::from(page), u64::from(page_size));
        Self {
            min_rank: (page - 1) * page_size + 1,
            max_rank: page * page_size,
        }
    }
}

/// Quote a phrase for the expression language if it contains whitespace.
fn quote_phrase(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

/// Zero-padded `YYYYMMDD` in UTC.
fn format_date_yyyymmdd(date: DateTime<Utc>) -> String {
    date.format("%Y%m%d").to_string()
}

/// Build the registry search expression for `filters`, anchored at `now`.
///
/// Always contains a parenthesized status disjunction and a trailing-365-day
/// recency range on the last-update date; condition, intervention, and
/// location clauses are appended only when their input is present. All
/// clauses are joined with `AND`.
///
/// Both the disease and the medical-term inputs map onto `AREA[Condition]`.
/// That duplication is intentional: it mirrors the search form this gateway
/// replaces, and changing it would change observable query results.
pub fn build_expression(filters: &SearchFilters, now: DateTime<Utc>) -> String {
    let status_terms: Vec<String> = filters
        .statuses
        .iter()
        .map(|s| format!("AREA[OverallStatus]{}", quote_phrase(s)))
        .collect();

    // Rolling window: exactly 365 days back, no calendar-month arithmetic.
    let since = format_date_yyyymmdd(now - Duration::days(365));

    let mut clauses = vec![
        format!("({})", status_terms.join(" OR ")),
        format!("AREA[LastUpdatePostDate]RANGE[{},MAX]", since),
    ];

    if let Some(disease) = &filters.disease {
        clauses.push(format!("AREA[Condition]{}", quote_phrase(disease)));
    }
    if let Some(medical) = &filters.medical_term {
        clauses.push(format!("AREA[Condition]{}", quote_phrase(medical)));
    }
    if let Some(drug) = &filters.drug {
        clauses.push(format!("AREA[InterventionName]{}", quote_phrase(drug)));
    }
    if let Some(location) = &filters.location {
        let phrase = quote_phrase(location);
        clauses.push(format!(
            "(AREA[LocationCity]{p} OR AREA[LocationState]{p} OR AREA[LocationCountry]{p} OR AREA[LocationFacility]{p})",
            p = phrase
        ));
    }

    clauses.join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trials::{SearchFilters, DEFAULT_STATUSES};
    use chrono::TimeZone;

    fn empty_filters() -> SearchFilters {
        SearchFilters {
            disease: None,
            medical_term: None,
            drug: None,
            location: None,
            statuses: DEFAULT_STATUSES.iter().map(|s| s.to_string()).collect(),
            page: 1,
            page_size: 20,
        }
    }

    fn anchor() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_rank_window_first_page() {
        let window = RankWindow::for_page(1, 20);
        assert_eq!(window.min_rank, 1);
        assert_eq!(window.max_rank, 20);
    }

    #[test]
    fn test_rank_window_later_page() {
        let window = RankWindow::for_page(3, 25);
        assert_eq!(window.min_rank, 51);
        assert_eq!(window.max_rank, 75);
    }

    #[test]
    fn test_rank_window_page_size_one() {
        let window = RankWindow::for_page(7, 1);
        assert_eq!(window.min_rank, 7);
        assert_eq!(window.max_rank, 7);
    }

    #[test]
    fn test_status_with_spaces_is_quoted() {
        let expr = build_expression(&empty_filters(), anchor());
        assert!(expr.contains("AREA[OverallStatus]\"Not yet recruiting\""));
        assert!(expr.contains("AREA[OverallStatus]\"Active, not recruiting\""));
    }

    #[test]
    fn test_status_without_spaces_is_not_quoted() {
        let expr = build_expression(&empty_filters(), anchor());
        assert!(expr.contains("AREA[OverallStatus]Recruiting OR"));
        assert!(!expr.contains("\"Recruiting\""));
    }

    #[test]
    fn test_recency_clause_is_365_days_back() {
        let expr = build_expression(&empty_filters(), anchor());
        // 2024-06-15 minus 365 days is 2023-06-16 (2024 is a leap year).
        assert!(expr.contains("AREA[LastUpdatePostDate]RANGE[20230616,MAX]"));
    }

    #[test]
    fn test_disease_only_produces_single_condition_clause() {
        let filters = SearchFilters {
            disease: Some("당뇨병".to_string()),
            ..empty_filters()
        };
        let expr = build_expression(&filters, anchor());
        assert_eq!(expr.matches("AREA[Condition]").count(), 1);
        assert!(expr.contains("AREA[Condition]당뇨병"));
        assert!(!expr.contains("AREA[InterventionName]"));
        assert!(!expr.contains("AREA[LocationCity]"));
    }

    #[test]
    fn test_medical_term_also_maps_to_condition_field() {
        let filters = SearchFilters {
            disease: Some("diabetes".to_string()),
            medical_term: Some("insulin resistance".to_string()),
            ..empty_filters()
        };
        let expr = build_expression(&filters, anchor());
        assert_eq!(expr.matches("AREA[Condition]").count(), 2);
        assert!(expr.contains("AREA[Condition]diabetes"));
        assert!(expr.contains("AREA[Condition]\"insulin resistance\""));
    }

    #[test]
    fn test_location_expands_to_four_way_disjunction() {
        let filters = SearchFilters {
            location: Some("서울".to_string()),
            ..empty_filters()
        };
        let expr = build_expression(&filters, anchor());
        assert!(expr.contains(
            "(AREA[LocationCity]서울 OR AREA[LocationState]서울 \
             OR AREA[LocationCountry]서울 OR AREA[LocationFacility]서울)"
        ));
    }

    #[test]
    fn test_clauses_joined_with_and() {
        let filters = SearchFilters {
            drug: Some("aspirin".to_string()),
            ..empty_filters()
        };
        let expr = build_expression(&filters, anchor());
        let parts: Vec<&str> = expr.split(" AND ").collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].starts_with("(AREA[OverallStatus]"));
        assert!(parts[1].starts_with("AREA[LastUpdatePostDate]"));
        assert_eq!(parts[2], "AREA[InterventionName]aspirin");
    }

    #[test]
    fn test_study_fields_order_is_fixed() {
        assert_eq!(STUDY_FIELDS[0], "NCTId");
        assert_eq!(STUDY_FIELDS[3], "LastUpdatePostDate");
        assert_eq!(STUDY_FIELDS[13], "LocationFacility");
    }
}
