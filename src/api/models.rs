use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value of the `docType` field that tells the document kinds apart.
pub mod doc_type {
    pub const USER: &str = "user";
    pub const LECTURE: &str = "lecture";
    pub const QUESTION: &str = "question";
    pub const ANSWER: &str = "answer";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub attended_lectures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecture {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: String,
    pub lecture_id: String,
    pub title: String,
    /// Milliseconds since the Unix epoch.
    pub time: i64,
    #[serde(default)]
    pub author: Option<String>,
}

impl Question {
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(rename = "_id")]
    pub id: String,
    pub question_id: String,
    pub text: String,
    pub time: i64,
    #[serde(default)]
    pub author: Option<String>,
}

impl Answer {
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time)
    }

    /// Lines of the answer, trimmed, blank ones dropped.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// How an author is shown next to a post: `anonymous` when the post has no
/// author, `unknown` when the author has no display name.
pub fn author_label(author: Option<&str>, names: &HashMap<String, String>) -> String {
    match author {
        None => "anonymous".to_string(),
        Some(id) => names
            .get(id)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string()),
    }
}
