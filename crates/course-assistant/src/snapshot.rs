use std::collections::HashMap;

use assignment_engine::dates::UpstreamQuery;
use assignment_engine::error::SourceError;
use assignment_engine::model::{AssignmentRecord, CourseRef};
use assignment_engine::source::AssignmentSource;

use crate::mcp_api::CoursePayload;

/// Assignments the caller already fetched, served through [`AssignmentSource`].
///
/// The upstream plan is ignored: whatever filtering the caller applied when fetching has
/// already happened.
pub struct SnapshotSource {
    courses: HashMap<u64, Result<Vec<AssignmentRecord>, String>>,
}

impl SnapshotSource {
    /// Returns the source and the courses in payload order. Duplicate course ids are
    /// rejected.
    pub fn from_payloads(payloads: Vec<CoursePayload>) -> Result<(Self, Vec<CourseRef>), String> {
        let mut courses = HashMap::with_capacity(payloads.len());
        let mut order = Vec::with_capacity(payloads.len());

        for payload in payloads {
            if courses.contains_key(&payload.id) {
                return Err(format!("duplicate course id: {}", payload.id));
            }
            let outcome = match payload.fetch_error {
                Some(message) => Err(message),
                None => Ok(payload.assignments),
            };
            courses.insert(payload.id, outcome);
            order.push(CourseRef {
                id: payload.id,
                name: payload.name,
            });
        }

        Ok((Self { courses }, order))
    }
}

impl AssignmentSource for SnapshotSource {
    async fn assignments(
        &self,
        course: &CourseRef,
        _plan: &UpstreamQuery,
    ) -> Result<Vec<AssignmentRecord>, SourceError> {
        match self.courses.get(&course.id) {
            Some(Ok(assignments)) => Ok(assignments.clone()),
            Some(Err(message)) => Err(SourceError::Fetch {
                course_id: course.id,
                message: message.clone(),
            }),
            None => Err(SourceError::NotFound(course.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use assignment_engine::source::gather;

    use super::*;

    fn payload(id: u64, fetch_error: Option<&str>) -> CoursePayload {
        CoursePayload {
            id,
            name: format!("Course {id}"),
            assignments: vec![AssignmentRecord {
                id: id * 10,
                name: "Worksheet".to_string(),
                ..Default::default()
            }],
            fetch_error: fetch_error.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn fetch_errors_become_failures() {
        let (source, courses) =
            SnapshotSource::from_payloads(vec![payload(1, None), payload(2, Some("403 forbidden"))])
                .unwrap();
        let gathered = gather(&source, &courses, &UpstreamQuery::default()).await;

        assert_eq!(gathered.batches.len(), 1);
        assert_eq!(gathered.batches[0].assignments[0].id, 10);
        assert_eq!(gathered.failures.len(), 1);
        assert_eq!(
            gathered.failures[0].error.to_string(),
            "fetch failed for course 2: 403 forbidden"
        );
    }

    #[test]
    fn duplicate_course_ids_are_rejected() {
        let err = SnapshotSource::from_payloads(vec![payload(1, None), payload(1, None)])
            .err()
            .unwrap();
        assert_eq!(err, "duplicate course id: 1");
    }
}
