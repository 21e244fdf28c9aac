//! Heuristic classification of assignments.
//!
//! Scores and keyword tables are approximate by nature; what matters is that the
//! decision rules are exact and the check order is fixed. Keyword tests run against
//! [`KeywordText`], the lowercased title plus plain-text description.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::model::{AssignmentRecord, EXTERNAL_TOOL, ONLINE_UPLOAD};
use crate::text::to_plain_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    fn from_score(score: u32) -> Self {
        if score >= 5 {
            Difficulty::Hard
        } else if score >= 3 {
            Difficulty::Medium
        } else {
            Difficulty::Easy
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Capitalized form for reports.
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Short planning tips shown next to an assignment's details.
    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            Difficulty::Easy => &[
                "This assignment is well-suited for independent work",
                "Consider using it as practice for core concepts",
                "Good opportunity to build confidence",
            ],
            Difficulty::Medium => &[
                "May benefit from some guidance or scaffolding",
                "Consider breaking into smaller steps",
                "Good for applying learned concepts",
            ],
            Difficulty::Hard => &[
                "Recommend additional support and resources",
                "Consider collaborative work or peer support",
                "May need prerequisite skill review",
            ],
        }
    }

    pub fn tutoring_plan(self) -> TutoringPlan {
        match self {
            Difficulty::Easy => TutoringPlan {
                approach: "Independent work with minimal guidance",
                support: "Available for clarification questions",
                focus: "Building confidence and reinforcing concepts",
                intervention: "Monitor for completion and basic understanding",
            },
            Difficulty::Medium => TutoringPlan {
                approach: "Guided practice with scaffolding",
                support: "Step-by-step guidance and concept explanation",
                focus: "Breaking down complex tasks into manageable steps",
                intervention: "Provide examples and check understanding frequently",
            },
            Difficulty::Hard => TutoringPlan {
                approach: "Intensive support with multiple resources",
                support: "Comprehensive tutoring and skill building",
                focus: "Prerequisite review and concept development",
                intervention: "Consider additional time, peer collaboration, or instructor consultation",
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tutor should approach an assignment of a given tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TutoringPlan {
    pub approach: &'static str,
    pub support: &'static str,
    pub focus: &'static str,
    pub intervention: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SubjectArea {
    Mathematics,
    #[serde(rename = "English Language Arts")]
    EnglishLanguageArts,
    Science,
    #[serde(rename = "Social Studies")]
    SocialStudies,
    General,
}

impl SubjectArea {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectArea::Mathematics => "Mathematics",
            SubjectArea::EnglishLanguageArts => "English Language Arts",
            SubjectArea::Science => "Science",
            SubjectArea::SocialStudies => "Social Studies",
            SubjectArea::General => "General",
        }
    }
}

impl fmt::Display for SubjectArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything derived from one assignment. Computed fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisBundle {
    pub difficulty: Difficulty,
    pub estimated_minutes: u32,
    pub subject_area: SubjectArea,
    pub standards: Vec<String>,
    pub prerequisites: Vec<String>,
    pub support_resources: Vec<String>,
    pub learning_objectives: Vec<String>,
}

/// Lowercased "{title} {plain-text description}" used by every keyword test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordText(String);

impl KeywordText {
    pub fn from_record(record: &AssignmentRecord) -> Result<Self, ContentError> {
        let description = to_plain_text(record.description.as_deref())?;
        Ok(Self::new(&record.name, &description))
    }

    pub fn new(title: &str, description: &str) -> Self {
        Self(format!("{title} {description}").to_lowercase())
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.0.contains(keyword)
    }

    pub fn contains_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.contains(k))
    }
}

// --- Rule tables ---

/// A keyword alternative set mapped to one or more outputs.
struct KeywordRule {
    keywords: &'static [&'static str],
    outputs: &'static [&'static str],
}

struct StandardsFamily {
    triggers: &'static [&'static str],
    rules: &'static [KeywordRule],
}

const fn rule(keywords: &'static [&'static str], outputs: &'static [&'static str]) -> KeywordRule {
    KeywordRule { keywords, outputs }
}

/// Checked top to bottom: math, ELA reading, ELA writing, science, social studies.
const STANDARDS_TABLE: &[StandardsFamily] = &[
    StandardsFamily {
        triggers: &["math", "algebra", "geometry"],
        rules: &[
            rule(&["linear", "equation"], &["NC.M1.A-REI"]),
            rule(&["function", "graph"], &["NC.M1.F-IF"]),
            rule(&["geometry", "triangle"], &["NC.M1.G-CO"]),
            rule(&["statistics", "data"], &["NC.M1.S-ID"]),
        ],
    },
    StandardsFamily {
        triggers: &["reading", "literature", "text"],
        rules: &[
            rule(&["main idea", "theme"], &["NC.ELA.RL.K-12.2"]),
            rule(&["evidence", "support"], &["NC.ELA.RL.K-12.1"]),
            rule(&["character", "setting"], &["NC.ELA.RL.K-12.3"]),
        ],
    },
    StandardsFamily {
        triggers: &["writing", "essay", "argument"],
        rules: &[
            rule(&["argument", "persuasive"], &["NC.ELA.W.K-12.1"]),
            rule(&["informative", "explain"], &["NC.ELA.W.K-12.2"]),
            rule(&["narrative", "story"], &["NC.ELA.W.K-12.3"]),
        ],
    },
    StandardsFamily {
        triggers: &["science", "biology", "chemistry"],
        rules: &[
            rule(&["cell", "organism"], &["NC.Bio.1.1"]),
            rule(&["ecosystem", "environment"], &["NC.Bio.2.1"]),
            rule(&["genetics", "dna"], &["NC.Bio.3.1"]),
        ],
    },
    StandardsFamily {
        triggers: &["history", "government", "civics"],
        rules: &[
            rule(&["constitution", "democracy"], &["NC.SS.CE.1"]),
            rule(&["economics", "market"], &["NC.SS.CE.2"]),
            rule(&["american history", "revolution"], &["NC.SS.AH1.H.1"]),
        ],
    },
];

/// First match wins.
const SUBJECT_TABLE: &[(SubjectArea, &[&str])] = &[
    (SubjectArea::Mathematics, &["math", "algebra", "geometry", "calculus"]),
    (SubjectArea::EnglishLanguageArts, &["english", "writing", "literature", "reading"]),
    (SubjectArea::Science, &["science", "biology", "chemistry", "physics"]),
    (SubjectArea::SocialStudies, &["history", "social", "government", "civics"]),
];

const MATH_PREREQUISITES: &[KeywordRule] = &[
    rule(&["algebra"], &["Basic arithmetic operations", "Understanding of variables"]),
    rule(&["geometry"], &["Basic shapes and measurements", "Coordinate plane understanding"]),
    rule(&["function"], &["Understanding of input/output relationships", "Graphing skills"]),
];

const ELA_PREREQUISITES: &[KeywordRule] = &[
    rule(&["essay", "writing"], &["Paragraph structure", "Thesis development", "Grammar fundamentals"]),
    rule(&["analysis"], &["Reading comprehension", "Critical thinking skills", "Evidence identification"]),
];

const FALLBACK_PREREQUISITES: &[&str] = &[
    "Basic reading and comprehension skills",
    "Familiarity with assignment submission process",
];

const BASE_RESOURCES: &[&str] = &[
    "AITA AI Tutor for personalized help",
    "Canvas course materials and readings",
];

const OBJECTIVE_RULES: &[KeywordRule] = &[
    rule(&["solve", "calculate"], &["Demonstrate problem-solving skills"]),
    rule(&["analyze", "evaluate"], &["Apply critical thinking and analysis skills"]),
    rule(&["write", "compose"], &["Communicate ideas effectively in writing"]),
    rule(&["research", "investigate"], &["Conduct research and gather relevant information"]),
    rule(&["create", "design"], &["Apply creative and design thinking"]),
];

const FALLBACK_OBJECTIVES: &[&str] = &[
    "Demonstrate understanding of course concepts",
    "Apply learned skills to complete assignment requirements",
];

fn prerequisite_rules(subject: SubjectArea) -> &'static [KeywordRule] {
    match subject {
        SubjectArea::Mathematics => MATH_PREREQUISITES,
        SubjectArea::EnglishLanguageArts => ELA_PREREQUISITES,
        _ => &[],
    }
}

fn subject_resources(subject: SubjectArea) -> &'static [&'static str] {
    match subject {
        SubjectArea::Mathematics => &[
            "Khan Academy math practice",
            "Desmos graphing calculator",
            "Math help videos",
        ],
        SubjectArea::EnglishLanguageArts => &[
            "Writing center resources",
            "Grammar checking tools",
            "Citation guides",
        ],
        SubjectArea::Science => &[
            "Virtual lab simulations",
            "Scientific calculator",
            "Research databases",
        ],
        SubjectArea::SocialStudies | SubjectArea::General => &[],
    }
}

/// Outputs of every rule whose keywords appear, in table order.
fn fired_outputs(text: &KeywordText, rules: &[KeywordRule]) -> Vec<String> {
    rules
        .iter()
        .filter(|r| text.contains_any(r.keywords))
        .flat_map(|r| r.outputs.iter().map(|s| s.to_string()))
        .collect()
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// --- Scoring ---

pub fn difficulty(record: &AssignmentRecord) -> Difficulty {
    let mut score = 0;

    let points = record.points();
    if points > 100.0 {
        score += 2;
    } else if points > 50.0 {
        score += 1;
    }

    match record.word_count {
        Some(words) if words > 1000 => score += 2,
        Some(words) if words > 500 => score += 1,
        _ => {}
    }

    if record.has_submission_type(ONLINE_UPLOAD) {
        score += 1;
    }
    if record.has_submission_type(EXTERNAL_TOOL) {
        score += 2;
    }

    let criteria = record.rubric_len();
    if criteria > 5 {
        score += 2;
    } else if criteria > 3 {
        score += 1;
    }

    if record.peer_reviews {
        score += 1;
    }
    if record.has_group_assignment {
        score += 1;
    }

    Difficulty::from_score(score)
}

/// Rough minutes of student effort, assuming about 50 written words per minute.
pub fn estimated_minutes(record: &AssignmentRecord) -> u32 {
    let mut minutes = 30.0;
    minutes += record.points() / 10.0 * 5.0;
    if let Some(words) = record.word_count {
        minutes += f64::from(words) / 50.0;
    }
    if record.has_submission_type(ONLINE_UPLOAD) {
        minutes += 15.0;
    }
    if record.has_submission_type(EXTERNAL_TOOL) {
        minutes += 20.0;
    }
    if record.rubric_len() > 3 {
        minutes += 20.0;
    }
    if record.peer_reviews {
        minutes += 30.0;
    }
    if record.has_group_assignment {
        minutes += 45.0;
    }
    minutes.round().max(0.0) as u32
}

pub fn standards_alignment(text: &KeywordText) -> Vec<String> {
    STANDARDS_TABLE
        .iter()
        .filter(|family| text.contains_any(family.triggers))
        .flat_map(|family| fired_outputs(text, family.rules))
        .collect()
}

pub fn subject_area(text: &KeywordText) -> SubjectArea {
    SUBJECT_TABLE
        .iter()
        .find(|(_, triggers)| text.contains_any(triggers))
        .map_or(SubjectArea::General, |(subject, _)| *subject)
}

/// Never empty: falls back to generic skills when no subject rule fires.
pub fn prerequisites(text: &KeywordText) -> Vec<String> {
    let skills = fired_outputs(text, prerequisite_rules(subject_area(text)));
    if skills.is_empty() {
        owned(FALLBACK_PREREQUISITES)
    } else {
        skills
    }
}

/// Generic resources first, then subject-specific ones.
pub fn support_resources(text: &KeywordText) -> Vec<String> {
    let mut resources = owned(BASE_RESOURCES);
    resources.extend(owned(subject_resources(subject_area(text))));
    resources
}

pub fn learning_objectives(text: &KeywordText) -> Vec<String> {
    let objectives = fired_outputs(text, OBJECTIVE_RULES);
    if objectives.is_empty() {
        owned(FALLBACK_OBJECTIVES)
    } else {
        objectives
    }
}

pub fn analyze(record: &AssignmentRecord) -> Result<AnalysisBundle, ContentError> {
    let text = KeywordText::from_record(record)?;
    Ok(AnalysisBundle {
        difficulty: difficulty(record),
        estimated_minutes: estimated_minutes(record),
        subject_area: subject_area(&text),
        standards: standards_alignment(&text),
        prerequisites: prerequisites(&text),
        support_resources: support_resources(&text),
        learning_objectives: learning_objectives(&text),
    })
}
