//! The seam to whatever fetches assignments from the LMS.
//!
//! Fetching is outside the engine. A source only has to turn a course and an upstream
//! query plan into assignment records; `gather` runs all courses concurrently and keeps
//! going when individual courses fail.

use std::future::Future;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::dates::UpstreamQuery;
use crate::error::SourceError;
use crate::model::{AssignmentRecord, CourseAssignments, CourseRef};

pub trait AssignmentSource {
    fn assignments(
        &self,
        course: &CourseRef,
        plan: &UpstreamQuery,
    ) -> impl Future<Output = Result<Vec<AssignmentRecord>, SourceError>> + Send;
}

#[derive(Debug, Clone)]
pub struct CourseFailure {
    pub course: CourseRef,
    pub error: SourceError,
}

/// Courses that fetched successfully, in input order, plus the ones that did not.
#[derive(Debug, Clone, Default)]
pub struct Gathered {
    pub batches: Vec<CourseAssignments>,
    pub failures: Vec<CourseFailure>,
}

pub async fn gather<S>(source: &S, courses: &[CourseRef], plan: &UpstreamQuery) -> Gathered
where
    S: AssignmentSource + Sync,
{
    let fetches = courses.iter().map(|course| async move {
        let outcome = source.assignments(course, plan).await;
        (course, outcome)
    });

    let mut gathered = Gathered::default();
    for (course, outcome) in join_all(fetches).await {
        match outcome {
            Ok(assignments) => {
                debug!(course_id = course.id, count = assignments.len(), "fetched assignments");
                gathered.batches.push(CourseAssignments {
                    course: course.clone(),
                    assignments,
                });
            }
            Err(error) => {
                warn!(course_id = course.id, error = %error, "skipping course after fetch failure");
                gathered.failures.push(CourseFailure {
                    course: course.clone(),
                    error,
                });
            }
        }
    }
    gathered
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::dates::{Bucket, DateWindow};
    use crate::search::{search, SearchQuery};

    struct FakeSource {
        courses: HashMap<u64, Result<Vec<AssignmentRecord>, SourceError>>,
        plans: Mutex<Vec<UpstreamQuery>>,
    }

    impl AssignmentSource for FakeSource {
        async fn assignments(
            &self,
            course: &CourseRef,
            plan: &UpstreamQuery,
        ) -> Result<Vec<AssignmentRecord>, SourceError> {
            self.plans.lock().unwrap().push(plan.clone());
            self.courses
                .get(&course.id)
                .cloned()
                .unwrap_or(Err(SourceError::NotFound(course.id)))
        }
    }

    fn course(id: u64) -> CourseRef {
        CourseRef {
            id,
            name: format!("Course {id}"),
        }
    }

    fn assignment(id: u64, name: &str) -> AssignmentRecord {
        AssignmentRecord {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn source() -> FakeSource {
        let mut courses = HashMap::new();
        courses.insert(1, Ok(vec![assignment(11, "Essay draft")]));
        courses.insert(
            2,
            Err(SourceError::Fetch {
                course_id: 2,
                message: "401 unauthorized".to_string(),
            }),
        );
        courses.insert(3, Ok(vec![assignment(31, "Essay final"), assignment(32, "Quiz")]));
        FakeSource {
            courses,
            plans: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn failed_courses_are_skipped() {
        let source = source();
        let courses = [course(1), course(2), course(3), course(4)];
        let gathered = gather(&source, &courses, &UpstreamQuery::default()).await;

        let fetched: Vec<u64> = gathered.batches.iter().map(|b| b.course.id).collect();
        assert_eq!(fetched, vec![1, 3]);
        let failed: Vec<u64> = gathered.failures.iter().map(|f| f.course.id).collect();
        assert_eq!(failed, vec![2, 4]);
        assert!(matches!(gathered.failures[1].error, SourceError::NotFound(4)));
    }

    #[tokio::test]
    async fn gathered_batches_feed_search() {
        let source = source();
        let courses = [course(1), course(2), course(3)];
        let gathered = gather(&source, &courses, &UpstreamQuery::default()).await;

        let query = SearchQuery {
            text: "essay".to_string(),
            ..Default::default()
        };
        let results = search(&gathered.batches, &query).unwrap();
        let ids: Vec<u64> = results.iter().map(|r| r.assignment.id).collect();
        assert_eq!(ids, vec![11, 31]);
    }

    #[tokio::test]
    async fn plan_is_passed_to_every_fetch() {
        let source = source();
        let window = DateWindow::new(None, Some("2024-03-01".to_string()));
        let plan = UpstreamQuery::plan(&window);
        gather(&source, &[course(1), course(3)], &plan).await;

        let plans = source.plans.lock().unwrap();
        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.bucket == Some(Bucket::Future)));
    }
}
