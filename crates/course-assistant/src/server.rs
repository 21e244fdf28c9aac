use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::info;

use assignment_engine::classify::analyze;
use assignment_engine::dates::{DateWindow, UpstreamQuery};
use assignment_engine::links::extract_links;
use assignment_engine::search::{search, SearchQuery};
use assignment_engine::source::gather;

use crate::config::Config;
use crate::error::AppError;
use crate::mcp_api::*;
use crate::report;
use crate::snapshot::SnapshotSource;

#[derive(Clone)]
pub struct CourseAssistantServer {
    config: Arc<Config>,
    tool_router: ToolRouter<CourseAssistantServer>,
}

impl CourseAssistantServer {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }

    fn details_report(&self, params: &AssignmentDetailsParams) -> Result<String, AppError> {
        let format = params.format.unwrap_or(self.config.description_format);
        let analysis = if params.include_analysis.unwrap_or(true) {
            Some(analyze(&params.assignment)?)
        } else {
            None
        };
        Ok(report::assignment_details(
            params.course_id,
            &params.assignment,
            format,
            analysis.as_ref(),
        )?)
    }
}

#[tool_router]
impl CourseAssistantServer {
    #[tool(description = "Render an assignment's HTML description as full HTML, plain text or Markdown, and list the links it contains.")]
    async fn render_description(
        &self,
        Parameters(params): Parameters<RenderDescriptionParams>,
    ) -> Result<Json<RenderDescriptionResponse>, String> {
        let format = params.format.unwrap_or(self.config.description_format);
        let html = params.html.as_deref();
        let text = report::render_description(html, format)
            .map_err(|e| format!("render failed: {e}"))?;
        let links = extract_links(html).map_err(|e| format!("render failed: {e}"))?;
        Ok(Json(RenderDescriptionResponse { format, text, links }))
    }

    #[tool(description = "Extract every hyperlink (anchor text and href) from an HTML fragment, in document order.")]
    async fn extract_links(
        &self,
        Parameters(params): Parameters<ExtractLinksParams>,
    ) -> Result<Json<ExtractLinksResponse>, String> {
        let links = extract_links(params.html.as_deref())
            .map_err(|e| format!("link extraction failed: {e}"))?;
        Ok(Json(ExtractLinksResponse { links }))
    }

    #[tool(description = "Analyze an assignment: difficulty tier, estimated minutes, subject area, NC standards alignment, prerequisite skills, support resources, inferred learning objectives and a tutoring plan.")]
    async fn analyze_assignment(
        &self,
        Parameters(params): Parameters<AnalyzeAssignmentParams>,
    ) -> Result<Json<AnalyzeAssignmentResponse>, String> {
        let record = params.assignment;
        let analysis = analyze(&record).map_err(|e| format!("analysis failed: {e}"))?;
        info!(
            assignment_id = record.id,
            difficulty = %analysis.difficulty,
            minutes = analysis.estimated_minutes,
            "analyzed assignment"
        );
        let report = report::analysis_report(&record, &analysis);
        Ok(Json(AnalyzeAssignmentResponse {
            tutoring_plan: analysis.difficulty.tutoring_plan(),
            analysis,
            report,
        }))
    }

    #[tool(description = "Build a Markdown report for one assignment: key facts, optional learning analysis, submission requirements, rubric, special requirements, access restrictions, description and linked materials.")]
    async fn get_assignment_details(
        &self,
        Parameters(params): Parameters<AssignmentDetailsParams>,
    ) -> Result<Json<ReportResponse>, String> {
        let report = self
            .details_report(&params)
            .map_err(|e| format!("details failed: {e}"))?;
        Ok(Json(ReportResponse { report }))
    }

    #[tool(description = "Build a short Markdown overview of one assignment: due date, points, submission type, difficulty, estimated time, NC standards and description.")]
    async fn assignment_summary(
        &self,
        Parameters(params): Parameters<AssignmentSummaryParams>,
    ) -> Result<Json<ReportResponse>, String> {
        let format = params.format.unwrap_or(self.config.description_format);
        let analysis = analyze(&params.assignment).map_err(|e| format!("summary failed: {e}"))?;
        let report = report::assignment_summary(&params.assignment, &analysis, format)
            .map_err(|e| format!("summary failed: {e}"))?;
        Ok(Json(ReportResponse { report }))
    }

    #[tool(description = "Build a Markdown status report for a student's submission: workflow state, submitted time, score, grade, attempt, late/missing/excused flags, and the submitted text, URL and attachments.")]
    async fn get_student_submission(
        &self,
        Parameters(params): Parameters<SubmissionParams>,
    ) -> Result<Json<ReportResponse>, String> {
        let submission = &params.submission;
        info!(
            assignment_id = submission.assignment_id,
            user_id = submission.user_id,
            state = %submission.workflow_state,
            "reporting submission"
        );
        let report = report::submission_report(submission, params.points_possible)
            .map_err(|e| format!("submission report failed: {e}"))?;
        Ok(Json(ReportResponse { report }))
    }

    #[tool(description = "List courses (id, name and term) from a courses payload, labelled with the enrollment state it was fetched with.")]
    async fn list_courses(
        &self,
        Parameters(params): Parameters<ListCoursesParams>,
    ) -> Result<Json<CourseListResponse>, String> {
        let state = params.state.unwrap_or_default();
        let report = report::course_list(&params.courses, state);
        Ok(Json(CourseListResponse {
            count: params.courses.len(),
            report,
        }))
    }

    #[tool(description = "Search assignments across courses by free text and due-date window. Courses whose fetch failed are skipped and reported. Results are ordered by due date.")]
    async fn search_assignments(
        &self,
        Parameters(params): Parameters<SearchAssignmentsParams>,
    ) -> Result<Json<SearchAssignmentsResponse>, String> {
        let window = DateWindow::new(params.due_before, params.due_after);
        let plan = UpstreamQuery::plan(&window);
        let (source, courses) = SnapshotSource::from_payloads(params.courses)?;

        let gathered = gather(&source, &courses, &plan).await;

        let window = if params.bucket_applied.unwrap_or(false) {
            window.delegating_bucket()
        } else {
            window
        };
        let query = SearchQuery {
            text: params.query.unwrap_or_default(),
            window,
        };
        let mut results =
            search(&gathered.batches, &query).map_err(|e| format!("search failed: {e}"))?;

        let total = results.len();
        results.truncate(self.config.max_search_results);
        let truncated = results.len() < total;
        info!(
            courses = courses.len(),
            skipped = gathered.failures.len(),
            total,
            truncated,
            "searched assignments"
        );

        let summary = report::search_summary(&results, &query, total);
        let skipped_courses = gathered
            .failures
            .into_iter()
            .map(|failure| SkippedCourse {
                course_id: failure.course.id,
                course_name: failure.course.name,
                reason: failure.error.to_string(),
            })
            .collect();

        Ok(Json(SearchAssignmentsResponse {
            total,
            truncated,
            results,
            skipped_courses,
            summary,
        }))
    }

    #[tool(description = "Plan the coarse filter to send when fetching assignments from the LMS for a due-date window: bucket (future/past) and UTC due_after/due_before bounds. Pass bucket_applied=true to search_assignments when the bucket was used.")]
    async fn plan_assignment_query(
        &self,
        Parameters(params): Parameters<PlanQueryParams>,
    ) -> Result<Json<PlanQueryResponse>, String> {
        let window = DateWindow::new(params.due_before, params.due_after);
        let plan = UpstreamQuery::plan(&window);
        let query_string = plan
            .params()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        Ok(Json(PlanQueryResponse {
            bucket: plan.bucket,
            due_after: plan.due_after,
            due_before: plan.due_before,
            query_string,
        }))
    }
}

#[tool_handler]
impl ServerHandler for CourseAssistantServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "course-assistant".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Course assistant MCP server. It works on LMS course, assignment and submission JSON \
the caller has already fetched. Use list_courses to list courses, \
render_description/extract_links for descriptions, analyze_assignment, get_assignment_details \
and assignment_summary for per-assignment reports, get_student_submission for submission \
status, and search_assignments to search across courses. Call plan_assignment_query first to \
get the bucket/due_after/due_before parameters to fetch with."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn server(max_search_results: usize) -> CourseAssistantServer {
        CourseAssistantServer::new(Config {
            max_search_results,
            ..Config::default()
        })
    }

    fn params<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Parameters<T> {
        Parameters(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn tools_publish_output_schemas() {
        let tools = CourseAssistantServer::tool_router().list_all();
        for name in [
            "render_description",
            "extract_links",
            "analyze_assignment",
            "get_assignment_details",
            "search_assignments",
            "plan_assignment_query",
            "assignment_summary",
            "get_student_submission",
            "list_courses",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[tokio::test]
    async fn render_description_uses_configured_default_format() {
        let Json(response) = server(10)
            .render_description(params(json!({
                "html": "<h2>Goal</h2><p>See <a href=\"/files/1\">notes</a></p>"
            })))
            .await
            .unwrap();
        assert_eq!(response.format, DescriptionFormat::Markdown);
        assert_eq!(response.text, "## Goal\n\nSee [notes](/files/1)");
        assert_eq!(response.links.len(), 1);
        assert_eq!(response.links[0].href, "/files/1");
    }

    #[tokio::test]
    async fn analyze_assignment_returns_bundle_and_report() {
        let Json(response) = server(10)
            .analyze_assignment(params(json!({
                "assignment": {
                    "id": 3,
                    "name": "Algebra: solve linear equations",
                    "points_possible": 20,
                    "submission_types": ["online_upload"]
                }
            })))
            .await
            .unwrap();
        assert_eq!(response.analysis.standards, vec!["NC.M1.A-REI"]);
        assert_eq!(response.tutoring_plan, response.analysis.difficulty.tutoring_plan());
        assert!(response.report.contains("- **Subject Area:** Mathematics"));
    }

    #[tokio::test]
    async fn search_skips_failed_courses_and_caps_results() {
        let Json(response) = server(2)
            .search_assignments(params(json!({
                "courses": [
                    {
                        "id": 1,
                        "name": "Biology",
                        "assignments": [
                            {"id": 11, "name": "Lab report", "due_at": "2024-04-03T12:00:00Z"},
                            {"id": 12, "name": "Lab safety quiz", "due_at": "2024-04-01T12:00:00Z"},
                            {"id": 13, "name": "Reading log"}
                        ]
                    },
                    {"id": 2, "name": "Chemistry", "fetch_error": "500 internal error"},
                    {
                        "id": 3,
                        "name": "Physics",
                        "assignments": [{"id": 31, "name": "Lab: pendulum", "due_at": "2024-04-02T12:00:00Z"}]
                    }
                ],
                "query": "lab"
            })))
            .await
            .unwrap();

        assert_eq!(response.total, 3);
        assert!(response.truncated);
        let ids: Vec<u64> = response.results.iter().map(|r| r.assignment.id).collect();
        assert_eq!(ids, vec![12, 31]);
        assert_eq!(response.skipped_courses.len(), 1);
        assert_eq!(response.skipped_courses[0].course_id, 2);
        assert!(response.summary.starts_with("Found 3 assignments matching \"lab\":"));
    }

    #[tokio::test]
    async fn search_rejects_duplicate_courses() {
        let err = server(10)
            .search_assignments(params(json!({
                "courses": [{"id": 1, "name": "A"}, {"id": 1, "name": "B"}]
            })))
            .await
            .err()
            .unwrap();
        assert_eq!(err, "duplicate course id: 1");
    }

    #[tokio::test]
    async fn plan_without_bounds_is_empty() {
        let Json(response) = server(10)
            .plan_assignment_query(params(json!({})))
            .await
            .unwrap();
        assert!(response.bucket.is_none());
        assert!(response.query_string.is_empty());
    }

    #[tokio::test]
    async fn plan_with_only_after_uses_future_bucket() {
        let Json(response) = server(10)
            .plan_assignment_query(params(json!({"due_after": "2024-03-01"})))
            .await
            .unwrap();
        assert_eq!(response.bucket, Some(assignment_engine::dates::Bucket::Future));
        assert!(response.due_after.is_some());
        assert!(response.query_string.starts_with("bucket=future&due_after="));
    }

    #[tokio::test]
    async fn assignment_summary_tolerates_null_fields() {
        let Json(response) = server(10)
            .assignment_summary(params(json!({
                "assignment": {
                    "id": 8,
                    "name": "Geometry: triangle proofs",
                    "description": null,
                    "submission_types": null,
                    "grading_type": null,
                    "published": null
                }
            })))
            .await
            .unwrap();
        assert!(response.report.contains("**Submission Type:** Not specified"));
        assert!(response.report.contains("**NC Standards:** NC.M1.G-CO"));
    }

    #[tokio::test]
    async fn student_submission_report() {
        let Json(response) = server(10)
            .get_student_submission(params(json!({
                "submission": {
                    "user_id": 17,
                    "assignment_id": 42,
                    "submitted_at": null,
                    "score": null,
                    "grade": null,
                    "attempt": null,
                    "workflow_state": "unsubmitted",
                    "late": false,
                    "missing": true,
                    "excused": false,
                    "submission_type": null
                },
                "points_possible": 10
            })))
            .await
            .unwrap();
        assert!(response.report.contains("**Student ID:** 17"));
        assert!(response.report.contains("**Submitted:** Not submitted"));
        assert!(response.report.contains("**Status Flags:** Missing"));
    }

    #[tokio::test]
    async fn list_courses_counts_and_labels() {
        let Json(response) = server(10)
            .list_courses(params(json!({
                "courses": [{"id": 3, "name": "Biology", "term": {"name": "Fall 2024"}}],
                "state": "all"
            })))
            .await
            .unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.report, "Your all courses:\n\n- ID: 3 | Biology (Fall 2024)");
    }
}
