//! Markdown reports returned by the tools.

use assignment_engine::classify::AnalysisBundle;
use assignment_engine::dates::format_date;
use assignment_engine::error::ContentError;
use assignment_engine::links::extract_links;
use assignment_engine::markdown::to_markdown;
use assignment_engine::model::{
    AssignmentRecord, CourseSummary, SearchResult, Submission, ONLINE_UPLOAD,
};
use assignment_engine::search::SearchQuery;
use assignment_engine::text::to_plain_text;

use crate::mcp_api::{DescriptionFormat, EnrollmentState};

const NO_DESCRIPTION: &str = "No description available";

/// Render a description in the requested format. Absent input renders as "".
pub fn render_description(
    html: Option<&str>,
    format: DescriptionFormat,
) -> Result<String, ContentError> {
    let Some(html) = html.filter(|h| !h.is_empty()) else {
        return Ok(String::new());
    };
    match format {
        DescriptionFormat::Full => Ok(html.to_string()),
        DescriptionFormat::Plain => to_plain_text(Some(html)),
        DescriptionFormat::Markdown => to_markdown(html),
    }
}

fn points(value: Option<f64>) -> String {
    value.map_or_else(|| "Not set".to_string(), |p| p.to_string())
}

fn submission_types(record: &AssignmentRecord) -> String {
    if record.submission_types.is_empty() {
        "Not specified".to_string()
    } else {
        record.submission_types.join(", ")
    }
}

/// Rendered description, or the placeholder when it renders empty.
fn description_or_placeholder(
    record: &AssignmentRecord,
    format: DescriptionFormat,
) -> Result<String, ContentError> {
    let description = render_description(record.description.as_deref(), format)?;
    Ok(if description.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        description
    })
}

pub fn assignment_details(
    course_id: u64,
    record: &AssignmentRecord,
    format: DescriptionFormat,
    analysis: Option<&AnalysisBundle>,
) -> Result<String, ContentError> {
    let description = description_or_placeholder(record, format)?;
    let links = extract_links(record.description.as_deref())?;

    let visibility = if record.only_visible_to_overrides {
        " (Only visible to specific students)"
    } else {
        ""
    };
    let mut lines = vec![
        format!("# {}", record.name),
        String::new(),
        format!("**Course ID:** {course_id}"),
        format!("**Assignment ID:** {}", record.id),
        format!("**Due Date:** {}", format_date(record.due_at.as_deref())),
        format!("**Points Possible:** {}", points(record.points_possible)),
        format!(
            "**Status:** {}{visibility}",
            if record.published { "Published" } else { "Unpublished" }
        ),
        String::new(),
    ];

    if let Some(analysis) = analysis {
        lines.push("## Learning Analysis".to_string());
        lines.push(String::new());
        lines.push(format!("**Difficulty Level:** {}", analysis.difficulty.label()));
        lines.push(format!("**Estimated Time:** {} minutes", analysis.estimated_minutes));
        lines.push(String::new());
        if !analysis.standards.is_empty() {
            lines.push("**NC Standards Alignment:**".to_string());
            lines.extend(analysis.standards.iter().map(|s| format!("- {s}")));
            lines.push(String::new());
        }
        lines.push("**Recommendations:**".to_string());
        lines.extend(
            analysis
                .difficulty
                .recommendations()
                .iter()
                .map(|tip| format!("- {tip}")),
        );
        lines.push(String::new());
    }

    push_submission_requirements(&mut lines, record);
    push_rubric(&mut lines, record);

    let mut special = Vec::new();
    if record.anonymize_students {
        special.push("Anonymous Grading Enabled");
    }
    if record.require_lockdown_browser {
        special.push("Lockdown Browser Required");
    }
    if record.annotatable_attachment_id.is_some() {
        special.push("Annotation Required");
    }
    if !special.is_empty() {
        lines.extend([String::new(), "## Special Requirements".to_string(), String::new()]);
        lines.extend(special.iter().map(|req| format!("- {req}")));
    }

    if record.locked_for_user {
        lines.extend([String::new(), "## Access Restrictions".to_string(), String::new()]);
        lines.push(
            record
                .lock_explanation
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "This assignment is currently locked.".to_string()),
        );
    }

    lines.extend([String::new(), "## Description".to_string(), String::new(), description]);

    if !links.is_empty() {
        lines.extend([String::new(), "## Required Materials and Links".to_string(), String::new()]);
        lines.extend(links.iter().map(|l| format!("- [{}]({})", l.text, l.href)));
    }

    Ok(lines.join("\n"))
}

fn push_submission_requirements(lines: &mut Vec<String>, record: &AssignmentRecord) {
    lines.push("## Submission Requirements".to_string());
    lines.push(format!("- **Submission Type:** {}", submission_types(record)));

    if record.has_submission_type(ONLINE_UPLOAD) {
        if let Some(extensions) = record.allowed_extensions.as_ref().filter(|e| !e.is_empty()) {
            let list: Vec<String> = extensions.iter().map(|ext| format!("`.{ext}`")).collect();
            lines.push(format!("- **Allowed File Types:** {}", list.join(", ")));
        }
    }

    if let Some(attempts) = record.allowed_attempts.filter(|&a| a != -1) {
        lines.push(format!("- **Allowed Attempts:** {attempts}"));
    }

    if !record.grading_type.is_empty() {
        lines.push(format!(
            "- **Grading Type:** {}",
            record.grading_type.replace('_', " ").to_lowercase()
        ));
    }

    if record.unlock_at.is_some() || record.lock_at.is_some() {
        lines.push("- **Time Restrictions:**".to_string());
        if let Some(unlock) = record.unlock_at.as_deref() {
            lines.push(format!("  - Available from: {}", format_date(Some(unlock))));
        }
        if let Some(lock) = record.lock_at.as_deref() {
            lines.push(format!("  - Locks at: {}", format_date(Some(lock))));
        }
    }

    if record.has_group_assignment {
        lines.push("- **Group Assignment:** Yes".to_string());
    }
    if record.peer_reviews {
        lines.push("- **Peer Reviews Required:** Yes".to_string());
    }
    if let Some(words) = record.word_count.filter(|&w| w > 0) {
        lines.push(format!("- **Required Word Count:** {words}"));
    }

    if let Some(tool) = record
        .external_tool_tag_attributes
        .as_ref()
        .filter(|t| !t.url.is_empty())
    {
        lines.push("- **External Tool Required:** Yes".to_string());
        lines.push(format!("  - Tool URL: {}", tool.url));
        if tool.new_tab {
            lines.push("  - Opens in new tab: Yes".to_string());
        }
    }

    if record.turnitin_enabled || record.vericite_enabled {
        lines.push("- **Plagiarism Detection:**".to_string());
        if record.turnitin_enabled {
            lines.push("  - Turnitin enabled".to_string());
        }
        if record.vericite_enabled {
            lines.push("  - VeriCite enabled".to_string());
        }
    }
}

fn push_rubric(lines: &mut Vec<String>, record: &AssignmentRecord) {
    let Some(rubric) = record.rubric.as_ref().filter(|r| !r.is_empty()) else {
        return;
    };
    lines.extend([String::new(), "## Rubric".to_string()]);
    if record.use_rubric_for_grading {
        lines.extend(["*This rubric is used for grading*".to_string(), String::new()]);
    }
    for criterion in rubric {
        lines.push(format!("### {} ({} points)", criterion.description, criterion.points));
        if let Some(long) = criterion.long_description.as_ref().filter(|l| !l.is_empty()) {
            lines.push(long.clone());
        }
        lines.push(String::new());
    }
}

pub fn analysis_report(record: &AssignmentRecord, analysis: &AnalysisBundle) -> String {
    let mut lines = vec![
        format!("# Learning Analysis: {}", record.name),
        String::new(),
        "## Assignment Overview".to_string(),
        format!("- **Subject Area:** {}", analysis.subject_area),
        format!("- **Difficulty Level:** {}", analysis.difficulty.label()),
        format!("- **Estimated Time:** {} minutes", analysis.estimated_minutes),
        format!("- **Points Possible:** {}", points(record.points_possible)),
        String::new(),
        "## NC Standards Alignment".to_string(),
    ];
    if analysis.standards.is_empty() {
        lines.push("- No specific NC standards identified (may require manual review)".to_string());
    } else {
        lines.extend(analysis.standards.iter().map(|s| format!("- {s}")));
    }

    lines.extend([String::new(), "## Prerequisite Skills".to_string()]);
    lines.extend(analysis.prerequisites.iter().map(|s| format!("- {s}")));

    let plan = analysis.difficulty.tutoring_plan();
    lines.extend([
        String::new(),
        "## Tutoring Recommendations".to_string(),
        format!("- **Approach:** {}", plan.approach),
        format!("- **Tutor Support:** {}", plan.support),
        format!("- **Focus:** {}", plan.focus),
        format!("- **Intervention:** {}", plan.intervention),
    ]);

    lines.extend([String::new(), "## Recommended Support Resources".to_string()]);
    lines.extend(analysis.support_resources.iter().map(|r| format!("- {r}")));

    lines.extend([
        String::new(),
        "## Learning Objectives (Inferred)".to_string(),
        "Based on assignment content analysis:".to_string(),
    ]);
    lines.extend(analysis.learning_objectives.iter().map(|o| format!("- {o}")));

    lines.join("\n")
}

/// `total` is the match count before any truncation of `results`.
pub fn search_summary(results: &[SearchResult], query: &SearchQuery, total: usize) -> String {
    let query_str = if query.text.trim().is_empty() {
        String::new()
    } else {
        format!(" matching \"{}\"", query.text)
    };
    let date_str = query.window.describe();

    if total == 0 {
        return format!("No assignments found{query_str}{date_str}.");
    }

    let listing: Vec<String> = results
        .iter()
        .map(|r| {
            let status = if r.assignment.published { "" } else { " (Unpublished)" };
            format!(
                "- Course: {} (ID: {})\n  Assignment: {}{status} (ID: {})\n  Due: {}",
                r.course_name,
                r.course_id,
                r.assignment.name,
                r.assignment.id,
                format_date(r.assignment.due_at.as_deref()),
            )
        })
        .collect();

    let mut summary = format!(
        "Found {total} assignments{query_str}{date_str}:\n\n{}",
        listing.join("\n\n")
    );
    if results.len() < total {
        summary.push_str(&format!("\n\n(showing the first {} of {total})", results.len()));
    }
    summary
}

/// Compact assignment overview with the headline analysis figures.
pub fn assignment_summary(
    record: &AssignmentRecord,
    analysis: &AnalysisBundle,
    format: DescriptionFormat,
) -> Result<String, ContentError> {
    let due = match record.due_at.as_deref().filter(|d| !d.is_empty()) {
        Some(due) => format_date(Some(due)),
        None => "No due date".to_string(),
    };
    let mut lines = vec![
        format!("# {}", record.name),
        String::new(),
        "## Assignment Details".to_string(),
        format!("**Due Date:** {due}"),
        format!("**Points Possible:** {}", points(record.points_possible)),
        format!("**Submission Type:** {}", submission_types(record)),
        String::new(),
        "## Learning Analysis".to_string(),
        format!("**Difficulty:** {}", analysis.difficulty.label()),
        format!("**Estimated Time:** {} minutes", analysis.estimated_minutes),
    ];
    if !analysis.standards.is_empty() {
        lines.push(format!("**NC Standards:** {}", analysis.standards.join(", ")));
    }
    lines.extend([
        String::new(),
        "## Description".to_string(),
        String::new(),
        description_or_placeholder(record, format)?,
    ]);
    Ok(lines.join("\n"))
}

/// Submission status report. `points_possible` completes the score as "score/points".
pub fn submission_report(
    submission: &Submission,
    points_possible: Option<f64>,
) -> Result<String, ContentError> {
    let submitted = match submission.submitted_at.as_deref().filter(|s| !s.is_empty()) {
        Some(at) => format_date(Some(at)),
        None => "Not submitted".to_string(),
    };
    let score = match (submission.score, points_possible) {
        (Some(score), Some(total)) => format!("{score}/{total}"),
        (Some(score), None) => score.to_string(),
        (None, _) => "Not graded".to_string(),
    };
    let grade = submission
        .grade
        .clone()
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| "Not graded".to_string());
    let state = if submission.workflow_state.is_empty() {
        "unknown"
    } else {
        submission.workflow_state.as_str()
    };
    let attempt = submission
        .attempt
        .map_or_else(|| "None".to_string(), |a| a.to_string());

    let mut lines = vec![
        "# Submission Status".to_string(),
        String::new(),
        format!("**Assignment ID:** {}", submission.assignment_id),
        format!("**Student ID:** {}", submission.user_id),
        format!("**Submission Status:** {state}"),
        format!("**Submitted:** {submitted}"),
        format!("**Score:** {score}"),
        format!("**Grade:** {grade}"),
        format!("**Attempt:** {attempt}"),
        String::new(),
    ];

    let mut flags = Vec::new();
    if submission.late {
        flags.push("Late");
    }
    if submission.missing {
        flags.push("Missing");
    }
    if submission.excused {
        flags.push("Excused");
    }
    if !flags.is_empty() {
        lines.push(format!("**Status Flags:** {}", flags.join(", ")));
        lines.push(String::new());
    }

    if let Some(kind) = submission.content_type() {
        lines.push("## Submission Content".to_string());
        lines.push(format!("**Type:** {kind}"));
        if let Some(body) = submission.body.as_deref().filter(|b| !b.is_empty()) {
            lines.extend([
                String::new(),
                "**Text Submission:**".to_string(),
                String::new(),
                to_markdown(body)?,
            ]);
        }
        if let Some(url) = submission.url.as_deref().filter(|u| !u.is_empty()) {
            lines.extend([String::new(), format!("**URL Submission:** {url}")]);
        }
        if !submission.attachments.is_empty() {
            lines.extend([String::new(), "**File Attachments:**".to_string()]);
            lines.extend(submission.attachments.iter().map(|a| {
                format!("- [{}]({}) ({})", a.filename, a.url, a.content_type)
            }));
        }
    }

    Ok(lines.join("\n").trim_end().to_string())
}

pub fn course_list(courses: &[CourseSummary], state: EnrollmentState) -> String {
    if courses.is_empty() {
        return format!("No {state} courses found.");
    }
    let listing: Vec<String> = courses
        .iter()
        .map(|course| match course.term.as_ref().filter(|t| !t.name.is_empty()) {
            Some(term) => format!("- ID: {} | {} ({})", course.id, course.name, term.name),
            None => format!("- ID: {} | {}", course.id, course.name),
        })
        .collect();
    format!("Your {state} courses:\n\n{}", listing.join("\n"))
}
