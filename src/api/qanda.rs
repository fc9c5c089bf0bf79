//! Domain operations of the Q&A application on top of a [`DocumentStore`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::design::{self, views};
use super::error::{DataError, DataErrorKind, DataResult};
use super::models::{Answer, Lecture, Question, User, doc_type};
use super::store::{DocumentStore, ViewParams, ViewResult};

/// Result of checking a username/password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(User),
    UnknownUser,
    WrongPassword,
}

#[derive(Clone)]
pub struct QandaApi {
    store: Arc<dyn DocumentStore>,
    db: String,
}

impl QandaApi {
    pub fn new(store: Arc<dyn DocumentStore>, db: impl Into<String>) -> Self {
        Self {
            store,
            db: db.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.db
    }

    /// Create the database (an existing one is fine) and install the design
    /// documents, stopping at the first failure.
    pub async fn install(&self) -> DataResult<()> {
        match self.store.create_database(&self.db).await {
            Ok(()) => info!("Created database '{}'", self.db),
            Err(err) if err.is(DataErrorKind::AlreadyExists) => {
                info!("Database '{}' already exists", self.db)
            }
            Err(err) => return Err(err),
        }

        for (id, doc) in design::documents() {
            debug!("Installing {}", id);
            self.store.put_document(&self.db, Some(&id), &doc).await?;
        }
        Ok(())
    }

    // Password is stored as given.
    pub async fn create_user(&self, username: &str, display_name: &str, password: &str) -> DataResult<String> {
        self.create(json!({
            "docType": doc_type::USER,
            "username": username,
            "displayName": display_name,
            "password": password,
            "attendedLectures": []
        }))
        .await
    }

    pub async fn create_lecture(&self, name: &str) -> DataResult<String> {
        self.create(json!({ "docType": doc_type::LECTURE, "name": name })).await
    }

    /// Add `lecture_id` to the user's attended lectures. Attending twice is a
    /// no-op on the server.
    pub async fn attend_lecture(&self, user_id: &str, lecture_id: &str) -> DataResult<()> {
        self.store
            .update(&self.db, design::USERS, design::ATTEND_LECTURE, user_id, lecture_id)
            .await
    }

    /// All lectures, or only those with the given ids.
    pub async fn get_lectures(&self, keys: Option<&[String]>) -> DataResult<Vec<Lecture>> {
        let params = match keys {
            Some(keys) => ViewParams::with_keys(keys.iter().cloned()),
            None => ViewParams::new(),
        };
        let result = self.view(design::LECTURES, views::GET_LECTURES, &params).await?;
        decode_values(result)
    }

    pub async fn post_question(&self, lecture_id: &str, title: &str, author: Option<&str>) -> DataResult<String> {
        self.create(json!({
            "docType": doc_type::QUESTION,
            "lectureId": lecture_id,
            "title": title,
            "time": Utc::now().timestamp_millis(),
            "author": author
        }))
        .await
    }

    pub async fn post_answer(&self, question_id: &str, text: &str, author: Option<&str>) -> DataResult<String> {
        self.create(json!({
            "docType": doc_type::ANSWER,
            "questionId": question_id,
            "text": text,
            "time": Utc::now().timestamp_millis(),
            "author": author
        }))
        .await
    }

    pub async fn get_question_by_id(&self, question_id: &str) -> DataResult<Question> {
        self.document(question_id).await
    }

    /// Questions of a lecture, oldest first.
    pub async fn get_questions_by_lecture(&self, lecture_id: &str) -> DataResult<Vec<Question>> {
        let result = self
            .view(design::LECTURES, views::QUESTIONS_BY_LECTURE, &ViewParams::with_key(lecture_id))
            .await?;
        let mut questions: Vec<Question> = decode_values(result)?;
        questions.sort_by_key(|question| question.time);
        Ok(questions)
    }

    /// Answers to a question, oldest first.
    pub async fn get_answers_for_question(&self, question_id: &str) -> DataResult<Vec<Answer>> {
        let result = self
            .view(design::LECTURES, views::ANSWERS_BY_QUESTION, &ViewParams::with_key(question_id))
            .await?;
        let mut answers: Vec<Answer> = decode_values(result)?;
        answers.sort_by_key(|answer| answer.time);
        Ok(answers)
    }

    pub async fn get_number_of_questions_by_lecture(&self, lecture_ids: &[String]) -> DataResult<HashMap<String, u64>> {
        self.counts(views::QUESTION_COUNT_BY_LECTURE, lecture_ids).await
    }

    pub async fn get_number_of_answers_by_question(&self, question_ids: &[String]) -> DataResult<HashMap<String, u64>> {
        self.counts(views::ANSWER_COUNT_BY_QUESTION, question_ids).await
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> DataResult<User> {
        self.document(user_id).await
    }

    /// Look a user up by username, ignoring case.
    pub async fn get_user_by_username(&self, username: &str) -> DataResult<Option<User>> {
        let params = ViewParams::with_key(username.to_lowercase());
        let result = self.view(design::USERS, views::USERS_BY_USERNAME, &params).await?;
        match result.rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row.value)?)),
            None => Ok(None),
        }
    }

    pub async fn get_user_display_name(&self, user_id: &str) -> DataResult<Option<String>> {
        let result = self
            .view(design::USERS, views::DISPLAY_NAMES_BY_ID, &ViewParams::with_key(user_id))
            .await?;
        Ok(result
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.value.as_str().map(str::to_string)))
    }

    /// Display names keyed by user id. Users without a display name are
    /// missing from the map.
    pub async fn get_user_display_names(&self, user_ids: &[String]) -> DataResult<HashMap<String, String>> {
        let ids = unique(user_ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let result = self
            .view(design::USERS, views::DISPLAY_NAMES_BY_ID, &ViewParams::with_keys(ids))
            .await?;
        Ok(result
            .rows
            .into_iter()
            .filter_map(|row| match (row.key, row.value) {
                (Value::String(id), Value::String(name)) => Some((id, name)),
                _ => None,
            })
            .collect())
    }

    /// Lectures the user attends. Ids pointing at deleted lectures are
    /// skipped.
    pub async fn get_attended_lectures(&self, user_id: &str) -> DataResult<Vec<Lecture>> {
        let params = ViewParams::with_key(user_id).include_docs();
        let result = self.view(design::USERS, views::ATTENDED_LECTURES, &params).await?;
        result
            .rows
            .into_iter()
            .filter_map(|row| row.doc.filter(|doc| !doc.is_null()))
            .map(|doc| serde_json::from_value(doc).map_err(DataError::from))
            .collect()
    }

    /// Check a login attempt. The username is trimmed and matched without
    /// regard to case; the password must match exactly.
    pub async fn authenticate(&self, username: &str, password: &str) -> DataResult<LoginOutcome> {
        let Some(user) = self.get_user_by_username(username.trim()).await? else {
            return Ok(LoginOutcome::UnknownUser);
        };
        if user.password != password {
            return Ok(LoginOutcome::WrongPassword);
        }
        Ok(LoginOutcome::Success(user))
    }

    async fn create(&self, doc: Value) -> DataResult<String> {
        self.store
            .put_document(&self.db, None, &doc)
            .await?
            .ok_or_else(|| DataError::decode("store did not return a document id"))
    }

    async fn document<T: DeserializeOwned>(&self, id: &str) -> DataResult<T> {
        let doc = self.store.get_document(&self.db, id).await?;
        Ok(serde_json::from_value(doc)?)
    }

    async fn view(&self, design: &str, view: &str, params: &ViewParams) -> DataResult<ViewResult> {
        debug!("Querying {}/{}{}", design, view, params.to_query());
        self.store.execute_view(&self.db, design, view, params).await
    }

    async fn counts(&self, view: &str, ids: &[String]) -> DataResult<HashMap<String, u64>> {
        let ids = unique(ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let params = ViewParams::with_keys(ids.iter().cloned()).grouped();
        let result = self.view(design::LECTURES, view, &params).await?;
        tally_counts(&ids, result)
    }
}

/// Turn grouped `_sum` rows into a count per requested id, with 0 for ids
/// that produced no row. Rows for other ids are ignored.
pub fn tally_counts(ids: &[String], result: ViewResult) -> DataResult<HashMap<String, u64>> {
    let mut counts: HashMap<String, u64> = ids.iter().map(|id| (id.clone(), 0)).collect();
    for row in result.rows {
        if row.error.is_some() || row.value.is_null() {
            continue;
        }
        let Some(id) = row.key.as_str() else {
            continue;
        };
        if let Some(count) = counts.get_mut(id) {
            *count = serde_json::from_value(row.value)?;
        }
    }
    Ok(counts)
}

fn unique(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if seen.insert(id.as_str()) {
            unique.push(id.clone());
        }
    }
    unique
}

fn decode_values<T: DeserializeOwned>(result: ViewResult) -> DataResult<Vec<T>> {
    result
        .rows
        .into_iter()
        .map(|row| serde_json::from_value(row.value).map_err(DataError::from))
        .collect()
}
