//! Content Models
//! Subject → Topic → SubTopic → Note ↔ Illustration

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const SUBJECT_NAME_MAX_LEN: usize = 100;
pub const SUBJECT_CODE_MAX_LEN: usize = 10;
pub const TOPIC_NAME_MAX_LEN: usize = 100;
pub const NOTE_TITLE_MAX_LEN: usize = 100;
pub const ILLUSTRATION_DESCRIPTION_MAX_LEN: usize = 150;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    pub subject_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubTopic {
    pub id: i64,
    pub name: String,
    pub topic_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_approved: bool,
    pub subtopic_id: i64,
    pub created_by_id: Option<i64>, // None once the author account is deleted
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Illustration {
    pub id: i64,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubject {
    pub name: String,
    pub code: String,
}

impl CreateSubject {
    pub fn validate(&self) -> AppResult<()> {
        require_text("name", &self.name, SUBJECT_NAME_MAX_LEN)?;
        require_text("code", &self.code, SUBJECT_CODE_MAX_LEN)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTopic {
    pub name: String,
    pub subject_id: i64,
}

impl CreateTopic {
    pub fn validate(&self) -> AppResult<()> {
        require_text("name", &self.name, TOPIC_NAME_MAX_LEN)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubTopic {
    pub name: String,
    pub topic_id: i64,
}

impl CreateSubTopic {
    pub fn validate(&self) -> AppResult<()> {
        require_text("name", &self.name, TOPIC_NAME_MAX_LEN)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNote {
    pub title: String,
    pub content: String,
    pub subtopic_id: i64,
}

impl CreateNote {
    pub fn validate(&self) -> AppResult<()> {
        require_text("title", &self.title, NOTE_TITLE_MAX_LEN)?;
        if self.content.trim().is_empty() {
            return Err(AppError::bad_request("content must not be empty"));
        }
        Ok(())
    }
}

/// New illustration, optionally linked to a note straight away
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateIllustration {
    pub description: Option<String>,
    pub image: Option<String>,
    pub note_id: Option<i64>,
}

impl CreateIllustration {
    pub fn validate(&self) -> AppResult<()> {
        validate_description(self.description.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIllustration {
    pub description: Option<String>,
    pub image: Option<String>,
}

impl UpdateIllustration {
    pub fn validate(&self) -> AppResult<()> {
        validate_description(self.description.as_deref())
    }
}

fn require_text(field: &str, value: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{} must not be empty", field)));
    }
    if value.chars().count() > max_len {
        return Err(AppError::bad_request(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> AppResult<()> {
    match description {
        Some(d) if d.chars().count() > ILLUSTRATION_DESCRIPTION_MAX_LEN => {
            Err(AppError::bad_request(format!(
                "description must be at most {} characters",
                ILLUSTRATION_DESCRIPTION_MAX_LEN
            )))
        }
        _ => Ok(()),
    }
}
