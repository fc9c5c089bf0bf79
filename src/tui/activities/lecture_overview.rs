use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{List, ListItem};

use super::{
    AskQuestionActivity, Reloader, ViewQuestionActivity, count_label, render_placeholder,
    spawn_for,
};
use crate::activity::{Activity, ActivityBase, ActivityResult, View, take_result};
use crate::api::models::author_label;
use crate::api::{DataResult, Lecture, QandaApi, Question};
use crate::tui::context::AppContext;
use crate::tui::theme::Theme;
use crate::tui::time::relative_to_now;
use crate::tui::widgets::Selection;

struct QuestionRow {
    question: Question,
    author: String,
    answers: Option<u64>,
}

#[derive(Default)]
struct OverviewState {
    rows: Vec<QuestionRow>,
    selection: Selection,
    loaded: bool,
}

struct OverviewLoad {
    questions: Vec<Question>,
    names: DataResult<HashMap<String, String>>,
    answer_counts: DataResult<HashMap<String, u64>>,
}

/// Questions asked in one lecture, refreshed periodically while visible.
pub struct LectureOverviewActivity {
    base: ActivityBase,
    context: Rc<AppContext>,
    lecture: Lecture,
    state: Rc<RefCell<OverviewState>>,
    reloader: Reloader,
    me: Weak<Self>,
}

impl LectureOverviewActivity {
    pub fn new(context: Rc<AppContext>, lecture: Lecture) -> Rc<Self> {
        let state = Rc::new(RefCell::new(OverviewState::default()));
        let view = Rc::new(OverviewView {
            state: state.clone(),
        });

        Rc::new_cyclic(|me| Self {
            base: ActivityBase::new("LectureOverviewActivity", lecture.name.clone(), view),
            context,
            lecture,
            state,
            reloader: Reloader::default(),
            me: me.clone(),
        })
    }

    fn reload(&self) {
        let api = self.context.data().clone();
        spawn_for(
            &self.me,
            load_questions(api, self.lecture.id.clone()),
            |this: &Self, loaded: DataResult<OverviewLoad>| this.apply(loaded),
        );
    }

    fn apply(&self, loaded: DataResult<OverviewLoad>) {
        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                self.context.report_error("Retrieving data from server failed", &err);
                return;
            }
        };
        let names = loaded.names.unwrap_or_else(|err| {
            self.context.report_error("Failed to retrieve user information", &err);
            HashMap::new()
        });
        let counts = loaded.answer_counts.unwrap_or_else(|err| {
            self.context.report_error("Failed to retrieve data from server", &err);
            HashMap::new()
        });

        let rows: Vec<QuestionRow> = loaded
            .questions
            .into_iter()
            .map(|question| QuestionRow {
                author: author_label(question.author.as_deref(), &names),
                answers: counts.get(&question.id).copied(),
                question,
            })
            .collect();

        let mut state = self.state.borrow_mut();
        state.selection.clamp(rows.len());
        state.rows = rows;
        state.loaded = true;
    }

    fn ask_question(&self) {
        let ask = AskQuestionActivity::new(self.context.clone(), self.lecture.clone());
        let me = self.me.clone();
        let on_result = move |returned: ActivityResult| {
            let Some(question_id) = take_result::<String>(returned) else {
                return;
            };
            if let Some(this) = me.upgrade() {
                this.open_posted_question(question_id);
            }
        };
        if let Err(err) = self.base.start_activity(ask, Some(Box::new(on_result))) {
            self.context.report_stack_error(&err);
        }
    }

    fn open_posted_question(&self, question_id: String) {
        let api = self.context.data().clone();
        spawn_for(
            &self.me,
            async move { api.get_question_by_id(&question_id).await },
            |this: &Self, question| match question {
                Ok(question) => this.open_question(question),
                Err(err) => this.context.report_error("Failed to retrieve question", &err),
            },
        );
    }

    fn open_question(&self, question: Question) {
        let view = ViewQuestionActivity::new(self.context.clone(), self.lecture.clone(), question);
        if let Err(err) = self.base.start_activity(view, None) {
            self.context.report_stack_error(&err);
        }
    }
}

async fn load_questions(api: QandaApi, lecture_id: String) -> DataResult<OverviewLoad> {
    let questions = api.get_questions_by_lecture(&lecture_id).await?;
    let authors: Vec<String> = questions
        .iter()
        .filter_map(|question| question.author.clone())
        .collect();
    let names = api.get_user_display_names(&authors).await;
    let ids: Vec<String> = questions.iter().map(|question| question.id.clone()).collect();
    let answer_counts = api.get_number_of_answers_by_question(&ids).await;

    Ok(OverviewLoad {
        questions,
        names,
        answer_counts,
    })
}

impl Activity for LectureOverviewActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn on_resume(&self) {
        self.reload();
        let me = self.me.clone();
        self.reloader
            .start(self.context.settings().question_reload_interval(), move || {
                if let Some(this) = me.upgrade() {
                    this.reload();
                }
            });
    }

    fn on_pause(&self) {
        self.reloader.stop();
    }

    fn handle_key(&self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('a') => {
                self.ask_question();
                true
            }
            KeyCode::Enter => {
                let question = {
                    let state = self.state.borrow();
                    state
                        .selection
                        .selected()
                        .and_then(|index| state.rows.get(index))
                        .map(|row| row.question.clone())
                };
                if let Some(question) = question {
                    self.open_question(question);
                }
                true
            }
            code => {
                let mut state = self.state.borrow_mut();
                let count = state.rows.len();
                state.selection.handle_key(code, count)
            }
        }
    }

    fn key_hints(&self) -> Vec<(&'static str, &'static str)> {
        vec![("↑↓", "select"), ("Enter", "view"), ("a", "ask a question")]
    }
}

struct OverviewView {
    state: Rc<RefCell<OverviewState>>,
}

impl View for OverviewView {
    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let state = self.state.borrow();
        if !state.loaded {
            render_placeholder(frame, area, theme, "Loading questions...");
            return;
        }
        if state.rows.is_empty() {
            render_placeholder(frame, area, theme, "No questions yet. Press a to ask the first one.");
            return;
        }

        let items: Vec<ListItem> = state
            .rows
            .iter()
            .map(|row| {
                let mut meta = format!("by {} {}", row.author, relative_to_now(row.question.time));
                if let Some(count) = row.answers {
                    meta.push_str(" • ");
                    meta.push_str(&count_label(count, "answer", "answers"));
                }
                ListItem::new(Text::from(vec![
                    Line::styled(row.question.title.clone(), theme.text_style()),
                    Line::from(Span::styled(meta, theme.muted_style())),
                ]))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(theme.selected_style())
            .highlight_symbol("› ");
        frame.render_stateful_widget(list, area, &mut state.selection.to_list_state());
    }
}
