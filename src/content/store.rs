//! Content Storage
//! Mission: Persist the subject/topic/subtopic/note hierarchy and note illustrations

use crate::content::models::{
    CreateIllustration, CreateNote, CreateSubTopic, CreateSubject, CreateTopic, Illustration,
    Note, SubTopic, Subject, Topic, UpdateIllustration,
};
use crate::db::{is_foreign_key_violation, is_unique_violation, Database};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

const NOTE_COLUMNS: &str =
    "id, title, content, is_approved, subtopic_id, created_by_id, created_at";

pub struct ContentStore {
    db: Database,
}

impl ContentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            is_approved: row.get(3)?,
            subtopic_id: row.get(4)?,
            created_by_id: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn row_to_illustration(row: &Row<'_>) -> rusqlite::Result<Illustration> {
        Ok(Illustration {
            id: row.get(0)?,
            description: row.get(1)?,
            image: row.get(2)?,
        })
    }

    // ===== Subjects =====

    pub fn create_subject(&self, new: &CreateSubject) -> AppResult<Subject> {
        new.validate()?;
        let conn = self.db.conn();

        conn.execute(
            "INSERT INTO subjects (name, code) VALUES (?1, ?2)",
            params![new.name, new.code],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Subject name or code already exists")
            } else {
                e.into()
            }
        })?;

        let subject = Subject {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            code: new.code.clone(),
        };
        info!("Created subject {} ({})", subject.name, subject.code);
        Ok(subject)
    }

    pub fn list_subjects(&self) -> AppResult<Vec<Subject>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare("SELECT id, name, code FROM subjects ORDER BY id")?;
        let subjects = stmt
            .query_map([], |row| {
                Ok(Subject {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    code: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subjects)
    }

    // ===== Topics =====

    pub fn create_topic(&self, new: &CreateTopic) -> AppResult<Topic> {
        new.validate()?;
        let conn = self.db.conn();
        ensure_exists(&conn, "subjects", new.subject_id, "Subject not found.")?;

        conn.execute(
            "INSERT INTO topics (name, subject_id) VALUES (?1, ?2)",
            params![new.name, new.subject_id],
        )
        .map_err(|e| parent_missing(e, "Subject not found."))?;

        Ok(Topic {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            subject_id: new.subject_id,
        })
    }

    pub fn topics_for_subject(&self, subject_id: i64) -> AppResult<Vec<Topic>> {
        let conn = self.db.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, subject_id FROM topics WHERE subject_id = ?1 ORDER BY id")?;
        let topics = stmt
            .query_map(params![subject_id], |row| {
                Ok(Topic {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    subject_id: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(topics)
    }

    // ===== SubTopics =====

    pub fn create_subtopic(&self, new: &CreateSubTopic) -> AppResult<SubTopic> {
        new.validate()?;
        let conn = self.db.conn();
        ensure_exists(&conn, "topics", new.topic_id, "Topic not found.")?;

        conn.execute(
            "INSERT INTO subtopics (name, topic_id) VALUES (?1, ?2)",
            params![new.name, new.topic_id],
        )
        .map_err(|e| parent_missing(e, "Topic not found."))?;

        Ok(SubTopic {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            topic_id: new.topic_id,
        })
    }

    pub fn subtopics_for_topic(&self, topic_id: i64) -> AppResult<Vec<SubTopic>> {
        let conn = self.db.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, topic_id FROM subtopics WHERE topic_id = ?1 ORDER BY id")?;
        let subtopics = stmt
            .query_map(params![topic_id], |row| {
                Ok(SubTopic {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    topic_id: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subtopics)
    }

    // ===== Notes =====

    /// New notes start unapproved
    pub fn create_note(&self, new: &CreateNote, created_by_id: i64) -> AppResult<Note> {
        new.validate()?;
        let conn = self.db.conn();
        ensure_exists(&conn, "subtopics", new.subtopic_id, "Subtopic not found.")?;

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO notes (title, content, is_approved, subtopic_id, created_by_id, created_at)
             VALUES (?1, ?2, 0, ?3, ?4, ?5)",
            params![new.title, new.content, new.subtopic_id, created_by_id, now],
        )
        .map_err(|e| parent_missing(e, "Subtopic not found."))?;

        let note = Note {
            id: conn.last_insert_rowid(),
            title: new.title.clone(),
            content: new.content.clone(),
            is_approved: false,
            subtopic_id: new.subtopic_id,
            created_by_id: Some(created_by_id),
            created_at: now,
        };
        info!("Note {} created by user {}", note.id, created_by_id);
        Ok(note)
    }

    pub fn get_note(&self, note_id: i64) -> AppResult<Option<Note>> {
        let conn = self.db.conn();
        let note = conn
            .query_row(
                &format!("SELECT {} FROM notes WHERE id = ?1", NOTE_COLUMNS),
                params![note_id],
                Self::row_to_note,
            )
            .optional()?;
        Ok(note)
    }

    pub fn approve_note(&self, note_id: i64) -> AppResult<Note> {
        {
            let conn = self.db.conn();
            let rows = conn.execute(
                "UPDATE notes SET is_approved = 1 WHERE id = ?1",
                params![note_id],
            )?;
            if rows == 0 {
                return Err(AppError::not_found("Note not found."));
            }
        }
        info!("Note {} approved", note_id);
        self.get_note(note_id)?
            .ok_or_else(|| AppError::not_found("Note not found."))
    }

    pub fn delete_note(&self, note_id: i64) -> AppResult<()> {
        let conn = self.db.conn();
        let rows = conn.execute("DELETE FROM notes WHERE id = ?1", params![note_id])?;
        if rows == 0 {
            return Err(AppError::not_found("Note not found."));
        }
        info!("Note {} deleted", note_id);
        Ok(())
    }

    /// Only approved notes are ever visible to readers
    pub fn approved_notes_for_subtopic(&self, subtopic_id: i64) -> AppResult<Vec<Note>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes WHERE subtopic_id = ?1 AND is_approved = 1 ORDER BY id",
            NOTE_COLUMNS
        ))?;
        let notes = stmt
            .query_map(params![subtopic_id], Self::row_to_note)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    // ===== Illustrations =====

    pub fn create_illustration(&self, new: &CreateIllustration) -> AppResult<Illustration> {
        new.validate()?;
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        if let Some(note_id) = new.note_id {
            ensure_exists(&tx, "notes", note_id, "Note not found.")?;
        }

        tx.execute(
            "INSERT INTO illustrations (description, image) VALUES (?1, ?2)",
            params![new.description, new.image],
        )?;
        let illustration = Illustration {
            id: tx.last_insert_rowid(),
            description: new.description.clone(),
            image: new.image.clone(),
        };

        if let Some(note_id) = new.note_id {
            tx.execute(
                "INSERT INTO note_illustrations (note_id, illustration_id) VALUES (?1, ?2)",
                params![note_id, illustration.id],
            )?;
        }
        tx.commit()?;

        Ok(illustration)
    }

    pub fn update_illustration(
        &self,
        illustration_id: i64,
        changes: &UpdateIllustration,
    ) -> AppResult<Illustration> {
        changes.validate()?;
        let conn = self.db.conn();

        let mut illustration = conn
            .query_row(
                "SELECT id, description, image FROM illustrations WHERE id = ?1",
                params![illustration_id],
                Self::row_to_illustration,
            )
            .optional()?
            .ok_or_else(|| AppError::not_found("Illustration not found."))?;

        if let Some(description) = &changes.description {
            illustration.description = Some(description.clone());
        }
        if let Some(image) = &changes.image {
            illustration.image = Some(image.clone());
        }

        conn.execute(
            "UPDATE illustrations SET description = ?1, image = ?2 WHERE id = ?3",
            params![illustration.description, illustration.image, illustration_id],
        )?;
        Ok(illustration)
    }

    /// Link an existing illustration to a note; linking twice is a no-op
    pub fn attach_illustration(&self, note_id: i64, illustration_id: i64) -> AppResult<()> {
        let conn = self.db.conn();
        ensure_exists(&conn, "notes", note_id, "Note not found.")?;
        ensure_exists(&conn, "illustrations", illustration_id, "Illustration not found.")?;

        conn.execute(
            "INSERT OR IGNORE INTO note_illustrations (note_id, illustration_id) VALUES (?1, ?2)",
            params![note_id, illustration_id],
        )?;
        Ok(())
    }

    pub fn illustrations_for_note(&self, note_id: i64) -> AppResult<Vec<Illustration>> {
        let conn = self.db.conn();
        ensure_exists(&conn, "notes", note_id, "Note not found.")?;

        let mut stmt = conn.prepare(
            "SELECT i.id, i.description, i.image
             FROM illustrations i
             JOIN note_illustrations ni ON ni.illustration_id = i.id
             WHERE ni.note_id = ?1
             ORDER BY i.id",
        )?;
        let illustrations = stmt
            .query_map(params![note_id], Self::row_to_illustration)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(illustrations)
    }
}

fn ensure_exists(conn: &Connection, table: &str, id: i64, missing: &str) -> AppResult<()> {
    // `table` is always one of our own literals, never user input.
    let exists: bool = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table),
        params![id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(AppError::not_found(missing))
    }
}

fn parent_missing(err: rusqlite::Error, missing: &str) -> AppError {
    if is_foreign_key_violation(&err) {
        AppError::not_found(missing)
    } else {
        err.into()
    }
}
