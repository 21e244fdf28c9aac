use std::fmt;
use std::str::FromStr;

use assignment_engine::classify::{AnalysisBundle, TutoringPlan};
use assignment_engine::dates::Bucket;
use assignment_engine::model::{AssignmentRecord, CourseSummary, Link, SearchResult, Submission};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How an assignment description is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionFormat {
    /// The raw HTML as stored by the LMS
    Full,
    /// Text content only
    Plain,
    #[default]
    Markdown,
}

impl FromStr for DescriptionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "plain" => Ok(Self::Plain),
            "markdown" => Ok(Self::Markdown),
            other => Err(format!("unknown description format: '{other}' (expected full, plain or markdown)")),
        }
    }
}

/// Enrollment filter the caller used when listing courses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentState {
    #[default]
    Active,
    Completed,
    All,
}

impl fmt::Display for EnrollmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EnrollmentState::Active => "active",
            EnrollmentState::Completed => "completed",
            EnrollmentState::All => "all",
        })
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RenderDescriptionParams {
    /// HTML description of an assignment. Omit or pass null for none.
    pub html: Option<String>,
    /// Output format: full (HTML), plain (text only) or markdown. Defaults to the server setting.
    pub format: Option<DescriptionFormat>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RenderDescriptionResponse {
    pub format: DescriptionFormat,
    pub text: String,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExtractLinksParams {
    /// HTML to scan for anchors.
    pub html: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ExtractLinksResponse {
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AnalyzeAssignmentParams {
    /// Assignment object exactly as returned by the LMS assignments endpoint.
    pub assignment: AssignmentRecord,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AnalyzeAssignmentResponse {
    pub analysis: AnalysisBundle,
    pub tutoring_plan: TutoringPlan,
    /// Markdown report of the analysis.
    pub report: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AssignmentDetailsParams {
    /// Course the assignment belongs to.
    pub course_id: u64,
    /// Assignment object exactly as returned by the LMS assignments endpoint.
    pub assignment: AssignmentRecord,
    /// Description format (default: server setting).
    pub format: Option<DescriptionFormat>,
    /// Include difficulty, time estimate and standards alignment (default: true).
    pub include_analysis: Option<bool>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ReportResponse {
    /// Markdown report.
    pub report: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AssignmentSummaryParams {
    /// Assignment object exactly as returned by the LMS assignments endpoint.
    pub assignment: AssignmentRecord,
    /// Description format (default: server setting).
    pub format: Option<DescriptionFormat>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SubmissionParams {
    /// Submission object exactly as returned by the LMS submissions endpoint.
    pub submission: Submission,
    /// Points possible on the assignment, shown as the score's denominator.
    pub points_possible: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListCoursesParams {
    /// Courses as returned by the LMS courses endpoint (with the term included).
    pub courses: Vec<CourseSummary>,
    /// Enrollment state the courses were fetched with (default: active).
    pub state: Option<EnrollmentState>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CourseListResponse {
    pub count: usize,
    /// Markdown listing of the courses.
    pub report: String,
}

/// One course's assignments as fetched by the caller, or the error the fetch hit.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CoursePayload {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub assignments: Vec<AssignmentRecord>,
    /// Set when fetching this course failed; the course is skipped.
    #[serde(default)]
    pub fetch_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchAssignmentsParams {
    /// Courses to search, each with its fetched assignments.
    pub courses: Vec<CoursePayload>,
    /// Search terms matched against titles and descriptions (default: match all).
    pub query: Option<String>,
    /// Only include assignments due on or before this date (YYYY-MM-DD).
    pub due_before: Option<String>,
    /// Only include assignments due on or after this date (YYYY-MM-DD).
    pub due_after: Option<String>,
    /// Set when the assignments were fetched with the bucket from plan_assignment_query.
    pub bucket_applied: Option<bool>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SkippedCourse {
    pub course_id: u64,
    pub course_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchAssignmentsResponse {
    /// Number of matches before truncation.
    pub total: usize,
    pub truncated: bool,
    pub results: Vec<SearchResult>,
    pub skipped_courses: Vec<SkippedCourse>,
    /// Markdown listing of the results.
    pub summary: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PlanQueryParams {
    /// Upper due-date bound (YYYY-MM-DD).
    pub due_before: Option<String>,
    /// Lower due-date bound (YYYY-MM-DD).
    pub due_after: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PlanQueryResponse {
    pub bucket: Option<Bucket>,
    pub due_after: Option<String>,
    pub due_before: Option<String>,
    /// The parameters joined as a query string fragment, e.g. "bucket=future&due_after=...".
    pub query_string: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_format_parses_case_insensitively() {
        assert_eq!("Plain".parse::<DescriptionFormat>(), Ok(DescriptionFormat::Plain));
        assert_eq!(" markdown ".parse::<DescriptionFormat>(), Ok(DescriptionFormat::Markdown));
        assert!("html".parse::<DescriptionFormat>().is_err());
    }

    #[test]
    fn enrollment_state_defaults_to_active() {
        let params: ListCoursesParams = serde_json::from_str(r#"{"courses": []}"#).unwrap();
        assert_eq!(params.state.unwrap_or_default(), EnrollmentState::Active);
        assert_eq!(EnrollmentState::Completed.to_string(), "completed");
    }

    #[test]
    fn course_payload_defaults() {
        let payload: CoursePayload =
            serde_json::from_str(r#"{"id": 5, "name": "Chemistry", "fetch_error": "timeout"}"#).unwrap();
        assert!(payload.assignments.is_empty());
        assert_eq!(payload.fetch_error.as_deref(), Some("timeout"));
    }
}
