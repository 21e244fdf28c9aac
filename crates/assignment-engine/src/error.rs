//! Error types shared by the assignment engine and its callers.
//!
//! Content transformations are total over malformed dates and absent fields; the only
//! failure they surface is a fragment the walker refuses to descend into. Fetch failures
//! belong to the external source collaborator and are reported per course.

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("html fragment nests deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("fetch failed for course {course_id}: {message}")]
    Fetch { course_id: u64, message: String },

    #[error("course {0} not found")]
    NotFound(u64),
}
