//! Multi-course assignment search: text match, due-date window, due-date ordering.

use chrono::{Local, TimeZone};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dates::{parse_date_in, DateWindow};
use crate::error::ContentError;
use crate::model::{AssignmentRecord, CourseAssignments, SearchResult};
use crate::text::to_plain_text;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchQuery {
    /// Free text; split on whitespace, any term may match
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub window: DateWindow,
}

impl SearchQuery {
    /// Lowercased, non-empty whitespace-separated terms.
    pub fn terms(&self) -> Vec<String> {
        self.text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    }
}

/// True when there are no terms, or any term occurs in the lowercased title or
/// plain-text description.
pub fn matches_terms(record: &AssignmentRecord, terms: &[String]) -> Result<bool, ContentError> {
    if terms.is_empty() {
        return Ok(true);
    }

    let title = record.name.to_lowercase();
    if terms.iter().any(|t| title.contains(t.as_str())) {
        return Ok(true);
    }

    if record.description.is_none() {
        return Ok(false);
    }
    let description = to_plain_text(record.description.as_deref())?.to_lowercase();
    Ok(terms.iter().any(|t| description.contains(t.as_str())))
}

pub fn search(
    courses: &[CourseAssignments],
    query: &SearchQuery,
) -> Result<Vec<SearchResult>, ContentError> {
    search_in(courses, query, &Local)
}

/// Filter every course's assignments and return the matches ordered by due date.
pub fn search_in<Tz: TimeZone>(
    courses: &[CourseAssignments],
    query: &SearchQuery,
    tz: &Tz,
) -> Result<Vec<SearchResult>, ContentError> {
    let terms = query.terms();
    let mut results = Vec::new();

    for batch in courses {
        let mut matched = 0usize;
        for assignment in &batch.assignments {
            if !matches_terms(assignment, &terms)? {
                continue;
            }
            if !query.window.contains_in(assignment.due_at.as_deref(), tz) {
                continue;
            }
            matched += 1;
            results.push(SearchResult {
                assignment: assignment.clone(),
                course_name: batch.course.name.clone(),
                course_id: batch.course.id,
            });
        }
        debug!(
            course_id = batch.course.id,
            total = batch.assignments.len(),
            matched,
            "filtered course assignments"
        );
    }

    sort_by_due_in(&mut results, tz);
    Ok(results)
}

/// Stable ascending sort by due instant. Parseable dates come first, then present but
/// unparseable ones, then missing ones; ties keep their input order.
pub fn sort_by_due_in<Tz: TimeZone>(results: &mut [SearchResult], tz: &Tz) {
    results.sort_by_cached_key(|r| due_key(r.assignment.due_at.as_deref(), tz));
}

fn due_key<Tz: TimeZone>(due: Option<&str>, tz: &Tz) -> (u8, i64) {
    match due.filter(|d| !d.is_empty()) {
        None => (2, 0),
        Some(raw) => match parse_date_in(Some(raw), tz) {
            Some(instant) => (0, instant.timestamp_millis()),
            None => (1, 0),
        },
    }
}
