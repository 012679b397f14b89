use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised by a single malformed material record.
///
/// These are reported and counted per material; they never abort a batch
/// run unless `fail_fast` is enabled.
#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("material {oid} has no text body")]
    MissingText { oid: String },

    #[error("test material {oid} has no questions")]
    MissingQuestions { oid: String },
}

/// Mongo-style object id wrapper as it appears in database dumps
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectId {
    #[serde(rename = "$oid")]
    pub oid: String,
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.oid)
    }
}

/// Material types present in the learning platform dump
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MaterialType {
    Course,
    LearningPath,
    Lecture,
    Lab,
    Test,
    TestExam,
}

impl MaterialType {
    /// Container types group other materials and carry no text of their own
    pub fn is_container(&self) -> bool {
        matches!(self, MaterialType::Course | MaterialType::LearningPath)
    }

    /// Test types carry their text inside the question list
    pub fn is_test(&self) -> bool {
        matches!(self, MaterialType::Test | MaterialType::TestExam)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::Course => "course",
            MaterialType::LearningPath => "learning-path",
            MaterialType::Lecture => "lecture",
            MaterialType::Lab => "lab",
            MaterialType::Test => "test",
            MaterialType::TestExam => "test-exam",
        }
    }
}

impl std::fmt::Display for MaterialType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single multiple-choice / matching option inside a quiz question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub option: String,

    /// Unmodeled keys (correctness flags etc.) round-trip unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An accepted answer for a quiz question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub answer: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A quiz question attached to a test material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question: String,

    /// Open string tag; only "matching" gets special handling
    #[serde(rename = "answerType")]
    pub answer_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuestionOption>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<QuestionAnswer>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    pub fn is_matching(&self) -> bool {
        self.answer_type == "matching"
    }
}

/// A loosely-typed learning material record from the database dump.
///
/// Only the fields the pipeline reads or writes are modeled; everything
/// else is preserved through the flattened `extra` map so that `--update`
/// write-back never drops data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    #[serde(rename = "materialType")]
    pub material_type: MaterialType,

    /// Free-text markdown body; synthesized for tests before scrubbing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<Question>>,

    /// Derived: remaining word count after markup scrubbing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<u64>,

    /// Derived: embedded picture count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pics: Option<u64>,

    /// Derived: external link count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<u64>,

    /// Derived: embedded video playtime in minutes (plus one base minute
    /// per embed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_minutes: Option<u64>,

    /// Derived: estimated completion time in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Material {
    /// Flatten the question list into a single text body.
    ///
    /// Concatenates each question string, the option strings of matching
    /// questions, and every answer string, space-separated — the same text
    /// the platform shows a student taking the test.
    pub fn synthesize_question_text(&self) -> Result<String, MaterialError> {
        let questions = self
            .questions
            .as_ref()
            .ok_or_else(|| MaterialError::MissingQuestions {
                oid: self.id.oid.clone(),
            })?;

        let mut parts: Vec<&str> = Vec::new();
        for question in questions {
            parts.push(&question.question);
            if question.is_matching() {
                for option in question.options.iter().flatten() {
                    parts.push(&option.option);
                }
            }
            for answer in question.answers.iter().flatten() {
                parts.push(&answer.answer);
            }
        }

        Ok(parts.join(" "))
    }

    /// Number of questions on a test material (0 for other types)
    pub fn question_count(&self) -> usize {
        self.questions.as_ref().map_or(0, |q| q.len())
    }
}
