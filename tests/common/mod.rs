//! Shared fixtures for the integration tests: an in-memory document store
//! and a recording activity.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use std::sync::Mutex;

use async_trait::async_trait;
use lecture_qanda::activity::{
    Activity, ActivityBase, ActivityStack, RenderHost, RootHandle, View,
};
use lecture_qanda::api::design::views;
use lecture_qanda::api::{DataError, DataErrorKind, DataResult, DocumentStore, ViewParams, ViewResult, ViewRow};
use lecture_qanda::tui::Theme;
use ratatui::Frame;
use ratatui::layout::Rect;
use serde_json::{Value, json};

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

pub struct Blank;

impl View for Blank {
    fn render(&self, _frame: &mut Frame, _area: Rect, _theme: &Theme) {}
}

/// Activity that records every lifecycle hook as `<name>.<hook>`.
pub struct Probe {
    base: ActivityBase,
    name: String,
    log: Log,
}

impl Probe {
    pub fn new(name: &str, log: &Log) -> Rc<Self> {
        Rc::new(Self {
            base: ActivityBase::new(name, name, Rc::new(Blank)),
            name: name.to_string(),
            log: log.clone(),
        })
    }

    fn record(&self, hook: &str) {
        self.log.borrow_mut().push(format!("{}.{}", self.name, hook));
    }
}

impl Activity for Probe {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn on_attach_to_stack(&self, _stack: &ActivityStack) {
        self.record("attach");
    }

    fn on_start(&self) {
        self.record("start");
    }

    fn on_resume(&self) {
        self.record("resume");
    }

    fn on_pause(&self) {
        self.record("pause");
    }

    fn on_stop(&self) {
        self.record("stop");
    }

    fn on_detach_from_stack(&self) {
        self.record("detach");
    }
}

/// Render host that records mounts as `mount <kind>` / `unmount <kind>`.
pub struct RecordingHost {
    log: Log,
    mounted: RefCell<Option<RootHandle>>,
}

impl RecordingHost {
    pub fn new(log: &Log) -> Rc<Self> {
        Rc::new(Self {
            log: log.clone(),
            mounted: RefCell::new(None),
        })
    }

    pub fn mounted(&self) -> Option<RootHandle> {
        self.mounted.borrow().clone()
    }
}

impl RenderHost for RecordingHost {
    fn mount(&self, root: &RootHandle) {
        self.log.borrow_mut().push(format!("mount {}", root.owner().kind()));
        *self.mounted.borrow_mut() = Some(root.clone());
    }

    fn unmount(&self, root: &RootHandle) {
        self.log.borrow_mut().push(format!("unmount {}", root.owner().kind()));
        let mut mounted = self.mounted.borrow_mut();
        if mounted.as_ref().is_some_and(|current| current.same_root(root)) {
            *mounted = None;
        }
    }
}

#[derive(Default)]
struct StoreState {
    databases: HashSet<String>,
    docs: BTreeMap<String, Value>,
    calls: Vec<String>,
    failing_views: HashMap<String, DataError>,
    next_id: u64,
}

/// In-memory [`DocumentStore`] that evaluates the installed views in Rust
/// and records every call.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already has the database `db`.
    pub fn with_database(db: &str) -> Self {
        let store = Self::new();
        store.state.lock().unwrap().databases.insert(db.to_string());
        store
    }

    pub fn insert(&self, id: &str, mut doc: Value) {
        doc["_id"] = json!(id);
        self.state.lock().unwrap().docs.insert(id.to_string(), doc);
    }

    pub fn doc(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().docs.get(id).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn fail_view(&self, view: &str, error: DataError) {
        self.state
            .lock()
            .unwrap()
            .failing_views
            .insert(view.to_string(), error);
    }

    fn require_database(state: &StoreState, db: &str) -> DataResult<()> {
        if state.databases.contains(db) {
            Ok(())
        } else {
            Err(DataError::new(DataErrorKind::NotFound, format!("no database '{}'", db)))
        }
    }
}

fn of_type<'a>(docs: &'a BTreeMap<String, Value>, doc_type: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    docs.values().filter(move |doc| doc["docType"] == doc_type)
}

fn row(key: Value, value: Value) -> ViewRow {
    ViewRow {
        id: None,
        key,
        value,
        doc: None,
        error: None,
    }
}

fn emitted(docs: &BTreeMap<String, Value>, view: &str) -> Option<Vec<ViewRow>> {
    let rows = match view {
        views::GET_LECTURES => of_type(docs, "lecture")
            .map(|doc| row(doc["_id"].clone(), doc.clone()))
            .collect(),
        views::QUESTIONS_BY_LECTURE | views::QUESTION_COUNT_BY_LECTURE => of_type(docs, "question")
            .map(|doc| row(doc["lectureId"].clone(), doc.clone()))
            .collect(),
        views::ANSWERS_BY_QUESTION | views::ANSWER_COUNT_BY_QUESTION => of_type(docs, "answer")
            .map(|doc| row(doc["questionId"].clone(), doc.clone()))
            .collect(),
        views::ATTENDED_LECTURES => of_type(docs, "user")
            .flat_map(|user| {
                let attended = user["attendedLectures"].as_array().cloned().unwrap_or_default();
                attended.into_iter().map(move |lecture| {
                    let mut row = row(user["_id"].clone(), json!({ "_id": lecture.clone() }));
                    row.doc = Some(lecture.as_str().and_then(|id| docs.get(id)).cloned().unwrap_or(Value::Null));
                    row
                })
            })
            .collect(),
        views::DISPLAY_NAMES_BY_ID => of_type(docs, "user")
            .filter(|user| !user["displayName"].is_null())
            .map(|user| row(user["_id"].clone(), user["displayName"].clone()))
            .collect(),
        views::USERS_BY_USERNAME => of_type(docs, "user")
            .map(|user| {
                let username = user["username"].as_str().unwrap_or_default().to_lowercase();
                row(json!(username), user.clone())
            })
            .collect(),
        _ => return None,
    };
    Some(rows)
}

fn select(rows: Vec<ViewRow>, params: &ViewParams) -> Vec<ViewRow> {
    match (&params.key, &params.keys) {
        (Some(key), _) => rows.into_iter().filter(|row| &row.key == key).collect(),
        (None, Some(keys)) => keys
            .iter()
            .flat_map(|key| rows.iter().filter(move |row| &row.key == key).cloned())
            .collect(),
        (None, None) => rows,
    }
}

fn reduce_sum(rows: Vec<ViewRow>) -> Vec<ViewRow> {
    let mut order = Vec::new();
    let mut sums: HashMap<String, u64> = HashMap::new();
    for row in rows {
        let key = row.key.as_str().unwrap_or_default().to_string();
        if !sums.contains_key(&key) {
            order.push(key.clone());
        }
        *sums.entry(key).or_insert(0) += 1;
    }
    order
        .into_iter()
        .map(|key| {
            let sum = sums[&key];
            row(json!(key), json!(sum))
        })
        .collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_database(&self, db: &str) -> DataResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_database {}", db));
        if !state.databases.insert(db.to_string()) {
            return Err(DataError::new(
                DataErrorKind::AlreadyExists,
                format!("Database already exists: '{}'", db),
            ));
        }
        Ok(())
    }

    async fn put_document(&self, db: &str, id: Option<&str>, doc: &Value) -> DataResult<Option<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("put_document {}", id.unwrap_or("<new>")));
        Self::require_database(&state, db)?;

        let (id, generated) = match id {
            Some(id) => (id.to_string(), None),
            None => {
                state.next_id += 1;
                let id = format!("doc-{:04}", state.next_id);
                (id.clone(), Some(id))
            }
        };
        let mut doc = doc.clone();
        doc["_id"] = json!(id);
        state.docs.insert(id, doc);
        Ok(generated)
    }

    async fn get_document(&self, db: &str, id: &str) -> DataResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("get_document {}", id));
        Self::require_database(&state, db)?;
        state
            .docs
            .get(id)
            .cloned()
            .ok_or_else(|| DataError::new(DataErrorKind::NotFound, format!("missing: {}", id)))
    }

    async fn execute_view(&self, db: &str, design: &str, view: &str, params: &ViewParams) -> DataResult<ViewResult> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("view {}/{}{}", design, view, params.to_query()));
        Self::require_database(&state, db)?;
        if let Some(error) = state.failing_views.get(view) {
            return Err(error.clone());
        }

        let rows = emitted(&state.docs, view)
            .ok_or_else(|| DataError::new(DataErrorKind::NotFound, format!("no view {}", view)))?;
        let mut rows = select(rows, params);
        if matches!(view, views::QUESTION_COUNT_BY_LECTURE | views::ANSWER_COUNT_BY_QUESTION) {
            rows = reduce_sum(rows);
        }
        Ok(ViewResult {
            total_rows: Some(rows.len() as u64),
            offset: Some(0),
            rows,
        })
    }

    async fn update(&self, db: &str, design: &str, function: &str, target: &str, body: &str) -> DataResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("update {}/{} {} {}", design, function, target, body));
        Self::require_database(&state, db)?;

        let Some(user) = state.docs.get_mut(target).filter(|doc| doc["docType"] == "user") else {
            return Err(DataError::server(400));
        };
        let attended = user["attendedLectures"]
            .as_array_mut()
            .ok_or_else(|| DataError::server(400))?;
        if !attended.iter().any(|id| id == body) {
            attended.push(json!(body));
        }
        Ok(())
    }
}
