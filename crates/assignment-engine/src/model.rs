use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Submission type tag for file uploads.
pub const ONLINE_UPLOAD: &str = "online_upload";
/// Submission type tag for assignments completed in an external (LTI) tool.
pub const EXTERNAL_TOOL: &str = "external_tool";

/// Read an explicit JSON `null` as the type's default, the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An assignment as returned by the LMS assignments endpoint.
///
/// Absent fields deserialize to `None`; an unset word count is not the same as a word
/// count of zero. Non-optional fields also accept `null` and read it as their default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AssignmentRecord {
    /// Assignment identifier
    pub id: u64,
    /// Assignment title
    pub name: String,
    /// Raw HTML description, untrusted
    #[serde(default)]
    pub description: Option<String>,
    /// Due instant as an ISO-like string, possibly malformed
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub unlock_at: Option<String>,
    #[serde(default)]
    pub lock_at: Option<String>,
    /// Points possible; the LMS sends `null` for ungraded work
    #[serde(default)]
    pub points_possible: Option<f64>,
    /// Submission type tags, e.g. "online_upload", "external_tool"
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<Vec<String>>")]
    pub submission_types: Vec<String>,
    #[serde(default)]
    pub allowed_extensions: Option<Vec<String>>,
    /// Attempt cap; -1 means unlimited
    #[serde(default)]
    pub allowed_attempts: Option<i64>,
    /// Grading type tag, e.g. "points", "letter_grade"
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub grading_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub published: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub has_group_assignment: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub peer_reviews: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub anonymize_students: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub require_lockdown_browser: bool,
    /// Rubric criteria in display order
    #[serde(default)]
    pub rubric: Option<Vec<RubricCriterion>>,
    /// Target word count for written work
    #[serde(default)]
    pub word_count: Option<u32>,
    #[serde(default)]
    pub external_tool_tag_attributes: Option<ExternalTool>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub use_rubric_for_grading: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub only_visible_to_overrides: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub locked_for_user: bool,
    #[serde(default)]
    pub lock_explanation: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub turnitin_enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub vericite_enabled: bool,
    #[serde(default)]
    pub annotatable_attachment_id: Option<u64>,
}

impl AssignmentRecord {
    /// Points possible, with an unset value counting as zero.
    pub fn points(&self) -> f64 {
        self.points_possible.unwrap_or(0.0)
    }

    pub fn has_submission_type(&self, tag: &str) -> bool {
        self.submission_types.iter().any(|t| t == tag)
    }

    /// Number of rubric criteria; zero when there is no rubric.
    pub fn rubric_len(&self) -> usize {
        self.rubric.as_ref().map_or(0, Vec::len)
    }
}

/// A single rubric criterion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RubricCriterion {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<f64>")]
    pub points: f64,
    /// Short description shown as the criterion heading
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub description: String,
    #[serde(default)]
    pub long_description: Option<String>,
}

/// External tool launch settings attached to an assignment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExternalTool {
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub new_tab: bool,
}

/// A course as seen by the search pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CourseRef {
    pub id: u64,
    pub name: String,
}

/// The assignments fetched for one course.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CourseAssignments {
    pub course: CourseRef,
    pub assignments: Vec<AssignmentRecord>,
}

/// An anchor found in an assignment description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Link {
    /// Anchor text content, empty when the anchor has none
    pub text: String,
    /// `href` attribute value, empty when absent
    pub href: String,
}

/// An assignment that matched a search, tagged with its source course.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    #[serde(flatten)]
    pub assignment: AssignmentRecord,
    pub course_name: String,
    pub course_id: u64,
}

/// A student's submission for one assignment, as returned by the LMS submissions endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Submission {
    #[serde(default)]
    pub id: Option<u64>,
    pub user_id: u64,
    pub assignment_id: u64,
    #[serde(default)]
    pub submitted_at: Option<String>,
    /// Score awarded; `None` until graded
    #[serde(default)]
    pub score: Option<f64>,
    /// Grade as displayed, e.g. "A-", "85" or "complete"
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub attempt: Option<u32>,
    /// Workflow state tag, e.g. "submitted", "graded", "unsubmitted"
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub workflow_state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub late: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub missing: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub excused: bool,
    /// Submission type tag; "none" and `None` both mean nothing was handed in
    #[serde(default)]
    pub submission_type: Option<String>,
    /// HTML body of a text entry submission
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<Vec<Attachment>>")]
    pub attachments: Vec<Attachment>,
}

impl Submission {
    /// The submission type when something was actually handed in.
    pub fn content_type(&self) -> Option<&str> {
        self.submission_type
            .as_deref()
            .filter(|t| !t.is_empty() && *t != "none")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Attachment {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub filename: String,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub url: String,
    #[serde(default, rename = "content-type", alias = "content_type", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub content_type: String,
}

/// A course from the LMS courses endpoint, with its term when requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CourseSummary {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub name: String,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub term: Option<Term>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Term {
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_lms_payload_with_nulls() {
        let json = r#"{
            "id": 42,
            "name": "Essay 1",
            "description": null,
            "due_at": null,
            "points_possible": null,
            "submission_types": ["online_upload"],
            "allowed_extensions": ["pdf", "docx"],
            "allowed_attempts": -1,
            "grading_type": "points",
            "published": true,
            "word_count": null,
            "rubric": [{"id": "c1", "points": 5.0, "description": "Thesis", "long_description": null}]
        }"#;

        let record: AssignmentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.points(), 0.0);
        assert!(record.word_count.is_none());
        assert!(record.has_submission_type(ONLINE_UPLOAD));
        assert!(!record.has_submission_type(EXTERNAL_TOOL));
        assert_eq!(record.rubric_len(), 1);
        assert!(!record.peer_reviews);
    }

    #[test]
    fn word_count_zero_is_distinct_from_unset() {
        let zero: AssignmentRecord =
            serde_json::from_str(r#"{"id": 1, "name": "a", "word_count": 0}"#).unwrap();
        let unset: AssignmentRecord = serde_json::from_str(r#"{"id": 1, "name": "a"}"#).unwrap();
        assert_eq!(zero.word_count, Some(0));
        assert_eq!(unset.word_count, None);
    }

    #[test]
    fn search_result_flattens_assignment_fields() {
        let result = SearchResult {
            assignment: AssignmentRecord {
                id: 7,
                name: "Lab".to_string(),
                ..Default::default()
            },
            course_name: "Biology".to_string(),
            course_id: 3,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["name"], "Lab");
        assert_eq!(value["course_name"], "Biology");
    }

    #[test]
    fn explicit_nulls_read_as_defaults() {
        let json = r#"{
            "id": 5,
            "name": "Quiz",
            "submission_types": null,
            "grading_type": null,
            "published": null,
            "peer_reviews": null,
            "has_group_assignment": null,
            "external_tool_tag_attributes": {"url": null, "new_tab": null},
            "rubric": [{"id": "c1", "points": null, "description": null}]
        }"#;

        let record: AssignmentRecord = serde_json::from_str(json).unwrap();
        assert!(record.submission_types.is_empty());
        assert!(!record.has_submission_type(ONLINE_UPLOAD));
        assert_eq!(record.grading_type, "");
        assert!(!record.published);
        assert!(!record.peer_reviews);
        assert!(!record.has_group_assignment);
        let tool = record.external_tool_tag_attributes.unwrap();
        assert_eq!(tool.url, "");
        assert!(!tool.new_tab);
        let rubric = record.rubric.unwrap();
        assert_eq!(rubric[0].points, 0.0);
        assert_eq!(rubric[0].description, "");
    }

    #[test]
    fn deserializes_submission() {
        let json = r#"{
            "id": 900,
            "user_id": 17,
            "assignment_id": 42,
            "submitted_at": "2024-03-15T10:30:00Z",
            "score": null,
            "grade": null,
            "attempt": 1,
            "workflow_state": "submitted",
            "late": true,
            "missing": false,
            "excused": null,
            "submission_type": "online_upload",
            "body": null,
            "url": null,
            "attachments": [
                {"id": 3, "filename": "essay.pdf", "url": "https://lms.example/f/3", "content-type": "application/pdf"}
            ]
        }"#;

        let submission: Submission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.user_id, 17);
        assert!(submission.score.is_none());
        assert!(submission.late);
        assert!(!submission.excused);
        assert_eq!(submission.content_type(), Some("online_upload"));
        assert_eq!(submission.attachments[0].content_type, "application/pdf");
    }

    #[test]
    fn unsubmitted_submission_has_no_content_type() {
        let submission: Submission = serde_json::from_str(
            r#"{"user_id": 1, "assignment_id": 2, "submission_type": "none", "attachments": null, "workflow_state": null}"#,
        )
        .unwrap();
        assert_eq!(submission.content_type(), None);
        assert!(submission.attachments.is_empty());
        assert_eq!(submission.workflow_state, "");
    }

    #[test]
    fn course_summary_term_is_optional() {
        let course: CourseSummary =
            serde_json::from_str(r#"{"id": 3, "name": "Biology", "term": {"name": "Fall 2024"}}"#)
                .unwrap();
        assert_eq!(course.term.unwrap().name, "Fall 2024");
        let course: CourseSummary =
            serde_json::from_str(r#"{"id": 4, "name": "Chemistry", "term": null}"#).unwrap();
        assert!(course.term.is_none());
    }
}
