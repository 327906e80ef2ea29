// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Client for the registry's `study_fields` API and normalization of its
//! columnar response into flat [`TrialRecord`]s.

use crate::models::trials::{PagedResult, SearchFilters, TrialLocations, TrialRecord};
use crate::services::query::{build_expression, RankWindow, STUDY_FIELDS};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::cmp::Reverse;
use std::fmt;
use url::Url;

/// Base URL of the public registry, overridable for tests and deployments.
pub const DEFAULT_REGISTRY_BASE_URL: &str = "https://classic.clinicaltrials.gov/api/query";

/// Upstream returned a non-success HTTP status. Carried as a concrete error
/// type so the handler can surface the status as a 502.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamError {
    pub status: u16,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream registry returned HTTP {}", self.status)
    }
}

impl std::error::Error for UpstreamError {}

/// Response envelope of the `study_fields` endpoint. Each study is a field
/// bag: requested field name to either a scalar or an array of values.
#[derive(Debug, Deserialize)]
struct StudyFieldsEnvelope {
    #[serde(rename = "StudyFieldsResponse")]
    response: Option<StudyFieldsBody>,
}

#[derive(Debug, Deserialize)]
struct StudyFieldsBody {
    #[serde(rename = "NStudiesFound")]
    n_studies_found: Option<u64>,
    #[serde(rename = "StudyFields", default)]
    study_fields: Vec<Map<String, Value>>,
}

/// Registry client wrapper around a shared `reqwest` connection pool.
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Run one search against the registry and normalize the result.
    ///
    /// One outbound GET per call; no retry, no explicit timeout. A non-OK
    /// upstream status is returned as [`UpstreamError`] inside the `anyhow`
    /// chain and is never treated as an empty result.
    pub async fn search(&self, filters: &SearchFilters) -> Result<PagedResult> {
        let expr = build_expression(filters, Utc::now());
        let window = RankWindow::for_page(filters.page, filters.page_size);

        let mut url = Url::parse(&format!("{}/study_fields", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("expr", &expr)
            .append_pair("fields", &STUDY_FIELDS.join(","))
            .append_pair("min_rnk", &window.min_rank.to_string())
            .append_pair("max_rnk", &window.max_rank.to_string())
            .append_pair("fmt", "json");

        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(UpstreamError {
                status: response.status().as_u16(),
            }
            .into());
        }

        let body = response.text().await?;
        let envelope: StudyFieldsEnvelope = serde_json::from_str(&body)?;
        Ok(normalize(envelope, filters.page, filters.page_size))
    }
}

/// First element of an array-valued field, or the scalar itself.
fn first_value(bag: &Map<String, Value>, key: &str) -> Option<String> {
    match bag.get(key) {
        Some(Value::Array(items)) => items.first().and_then(value_to_string),
        Some(value) => value_to_string(value),
        None => None,
    }
}

/// Full ordered list of an array-valued field; a bare scalar becomes a
/// single-element list, absent fields an empty one.
fn value_list(bag: &Map<String, Value>, key: &str) -> Vec<String> {
    match bag.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(value_to_string).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(value) => value_to_string(value).into_iter().collect(),
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Parse a registry last-update date to a sort key. The classic API emits
/// long-form dates ("January 2, 2024"); compact and ISO forms are accepted
/// as well. Unparsable or absent dates map to 0 so they sort last in
/// descending order.
fn last_updated_timestamp(value: Option<&str>) -> i64 {
    let Some(raw) = value else { return 0 };
    const FORMATS: [&str; 3] = ["%Y%m%d", "%B %d, %Y", "%Y-%m-%d"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw.trim(), fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

fn normalize_study(bag: &Map<String, Value>) -> TrialRecord {
    TrialRecord {
        nct_id: first_value(bag, "NCTId"),
        title: first_value(bag, "BriefTitle"),
        status: first_value(bag, "OverallStatus"),
        last_updated: first_value(bag, "LastUpdatePostDate"),
        conditions: value_list(bag, "Condition"),
        interventions: value_list(bag, "InterventionName"),
        sponsor: first_value(bag, "LeadSponsorName"),
        study_type: first_value(bag, "StudyType"),
        start_date: first_value(bag, "StartDate"),
        primary_completion_date: first_value(bag, "PrimaryCompletionDate"),
        locations: TrialLocations {
            city: value_list(bag, "LocationCity"),
            state: value_list(bag, "LocationState"),
            country: value_list(bag, "LocationCountry"),
            facility: value_list(bag, "LocationFacility"),
        },
    }
}

/// Flatten the envelope into records sorted by descending last-update date.
/// The sort is stable, so records with equal (or missing) dates keep their
/// upstream relative order.
fn normalize(envelope: StudyFieldsEnvelope, page: u32, page_size: u32) -> PagedResult {
    let (n_found, studies) = match envelope.response {
        Some(body) => (body.n_studies_found, body.study_fields),
        None => (None, Vec::new()),
    };

    let mut data: Vec<TrialRecord> = studies.iter().map(normalize_study).collect();
    data.sort_by_key(|record| Reverse(last_updated_timestamp(record.last_updated.as_deref())));

    let total = n_found.unwrap_or(data.len() as u64);
    PagedResult {
        page,
        page_size,
        total,
        data,
    }
}
