//! Content Module
//! Mission: Subjects, topics, subtopics, notes and their illustrations

pub mod models;
pub mod store;

pub use models::{Illustration, Note, SubTopic, Subject, Topic};
pub use store::ContentStore;
