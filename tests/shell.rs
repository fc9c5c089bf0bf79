//! End-to-end tests of the terminal shell against an in-memory store:
//! login, navigation through the screens and the breadcrumb header.

mod common;

use std::rc::Rc;
use std::sync::Arc;

use common::MemoryStore;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lecture_qanda::activity::Activity;
use lecture_qanda::api::QandaApi;
use lecture_qanda::config::Settings;
use lecture_qanda::tui::{AppContext, QandaApp, StatusLevel, Theme, ThemeVariant};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use serde_json::json;
use tokio::task::LocalSet;

const DB: &str = "hci-qanda";

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::with_database(DB));
    store.insert("u-alice", json!({
        "docType": "user",
        "username": "alice",
        "displayName": "Alice",
        "password": "secret",
        "attendedLectures": ["l-hci"]
    }));
    store.insert("l-hci", json!({ "docType": "lecture", "name": "HCI" }));
    store.insert("l-os", json!({ "docType": "lecture", "name": "Operating Systems" }));
    store.insert("q-1", json!({
        "docType": "question",
        "lectureId": "l-hci",
        "title": "What is a widget?",
        "time": 1_700_000_000_000_i64,
        "author": "u-alice"
    }));
    store
}

fn app_for(store: &Arc<MemoryStore>) -> (Rc<AppContext>, QandaApp) {
    let api = QandaApi::new(store.clone(), DB);
    let context = Rc::new(AppContext::new(api, Settings::default()));
    let app = QandaApp::new(context.clone(), Theme::new(ThemeVariant::Mocha));
    (context, app)
}

fn press(app: &QandaApp, code: KeyCode) -> bool {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_text(app: &QandaApp, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

/// Let spawned data requests and their result handlers run.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn foreground_kind(app: &QandaApp) -> String {
    app.stack()
        .foreground()
        .map(|activity| activity.id().kind().to_string())
        .unwrap_or_default()
}

async fn log_in(app: &QandaApp, username: &str, password: &str) {
    type_text(app, username);
    press(app, KeyCode::Tab);
    type_text(app, password);
    press(app, KeyCode::Enter);
    settle().await;
}

#[tokio::test]
async fn test_login_replaces_itself_with_lecture_menu() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let (context, app) = app_for(&store);

            app.start().unwrap();
            assert_eq!(app.breadcrumb().labels(), ["Login"]);
            assert_eq!(app.take_window_title().as_deref(), Some("Login"));

            log_in(&app, "  Alice", "secret").await;

            assert_eq!(context.current_user_id().as_deref(), Some("u-alice"));
            assert_eq!(app.stack().len(), 1);
            assert_eq!(foreground_kind(&app), "LectureMenuActivity");
            assert_eq!(app.breadcrumb().labels(), ["Lectures"]);
            assert_eq!(app.take_window_title().as_deref(), Some("Lectures"));
            assert_eq!(app.take_window_title(), None);
        })
        .await;
}

#[tokio::test]
async fn test_wrong_password_stays_on_login() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let (context, app) = app_for(&store);
            app.start().unwrap();

            log_in(&app, "alice", "wrong").await;

            assert_eq!(foreground_kind(&app), "LoginActivity");
            assert_eq!(context.current_user_id(), None);
        })
        .await;
}

#[tokio::test]
async fn test_escape_on_root_screen_does_not_quit() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let (_context, app) = app_for(&store);
            app.start().unwrap();

            assert!(press(&app, KeyCode::Esc));
            assert_eq!(app.stack().len(), 1);

            let quit = app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
            assert!(!quit);
        })
        .await;
}

#[tokio::test]
async fn test_open_lecture_and_navigate_back() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let (_context, app) = app_for(&store);
            app.start().unwrap();
            log_in(&app, "alice", "secret").await;

            press(&app, KeyCode::Enter);
            settle().await;

            assert_eq!(foreground_kind(&app), "LectureOverviewActivity");
            assert_eq!(app.breadcrumb().labels(), ["Lectures", "HCI"]);

            press(&app, KeyCode::Enter);
            settle().await;
            assert_eq!(foreground_kind(&app), "ViewQuestionActivity");
            assert_eq!(app.breadcrumb().labels(), ["Lectures", "HCI", "What is a widget?"]);

            press(&app, KeyCode::Esc);
            press(&app, KeyCode::Esc);

            assert_eq!(foreground_kind(&app), "LectureMenuActivity");
            assert_eq!(app.breadcrumb().labels(), ["Lectures"]);
        })
        .await;
}

#[tokio::test]
async fn test_join_lecture_from_catalog() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let (context, app) = app_for(&store);
            app.start().unwrap();
            log_in(&app, "alice", "secret").await;

            press(&app, KeyCode::Char('m'));
            settle().await;
            assert_eq!(foreground_kind(&app), "AllLecturesActivity");

            press(&app, KeyCode::Enter);
            press(&app, KeyCode::Char('y'));
            settle().await;

            let attended = store.doc("u-alice").unwrap()["attendedLectures"].clone();
            assert_eq!(attended, json!(["l-hci", "l-os"]));
            let status = context.status().get().unwrap();
            assert_eq!(status.level, StatusLevel::Info);
            assert!(status.text.contains("Operating Systems"));

            press(&app, KeyCode::Char('b'));
            assert_eq!(foreground_kind(&app), "LectureMenuActivity");
        })
        .await;
}

#[tokio::test]
async fn test_data_errors_reach_the_status_line() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            store.fail_view(
                lecture_qanda::api::design::views::USERS_BY_USERNAME,
                lecture_qanda::api::DataError::server(500),
            );
            let (context, app) = app_for(&store);
            app.start().unwrap();

            log_in(&app, "alice", "secret").await;

            let status = context.status().get().unwrap();
            assert_eq!(status.level, StatusLevel::Error);
            assert!(status.text.starts_with("Failed to retrieve data"));
            assert_eq!(foreground_kind(&app), "LoginActivity");
        })
        .await;
}

#[tokio::test]
async fn test_render_shows_breadcrumb_and_hints() {
    LocalSet::new()
        .run_until(async {
            let store = seeded_store();
            let (_context, app) = app_for(&store);
            app.start().unwrap();
            log_in(&app, "alice", "secret").await;

            let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
            terminal.draw(|frame| app.render(frame)).unwrap();

            let screen: String = terminal
                .backend()
                .buffer()
                .content()
                .iter()
                .map(|cell| cell.symbol())
                .collect();
            assert!(screen.contains("Lectures"));
            assert!(screen.contains("HCI"));
            assert!(screen.contains("Ctrl+Q"));
        })
        .await;
}
