use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::{Reloader, spawn_for};
use crate::activity::{Activity, ActivityBase, View};
use crate::api::models::author_label;
use crate::api::{Answer, DataResult, Lecture, QandaApi, Question};
use crate::tui::context::AppContext;
use crate::tui::theme::Theme;
use crate::tui::time::relative_to_now;
use crate::tui::widgets::TextInput;

struct AnswerRow {
    answer: Answer,
    author: String,
}

struct QuestionState {
    question: Question,
    author: Option<String>,
    answers: Vec<AnswerRow>,
    loaded: bool,
    scroll: u16,
    input: TextInput,
    anonymous: bool,
    posting: bool,
    message: Option<String>,
}

/// One question with its answers and a form to post another answer.
pub struct ViewQuestionActivity {
    base: ActivityBase,
    context: Rc<AppContext>,
    lecture: Lecture,
    question: Question,
    state: Rc<RefCell<QuestionState>>,
    reloader: Reloader,
    me: Weak<Self>,
}

impl ViewQuestionActivity {
    pub fn new(context: Rc<AppContext>, lecture: Lecture, question: Question) -> Rc<Self> {
        let state = Rc::new(RefCell::new(QuestionState {
            question: question.clone(),
            author: None,
            answers: Vec::new(),
            loaded: false,
            scroll: 0,
            input: TextInput::multiline(),
            anonymous: false,
            posting: false,
            message: None,
        }));
        let view = Rc::new(QuestionView {
            state: state.clone(),
        });

        Rc::new_cyclic(|me| Self {
            base: ActivityBase::new("ViewQuestionActivity", question.title.clone(), view),
            context,
            lecture,
            question,
            state,
            reloader: Reloader::default(),
            me: me.clone(),
        })
    }

    pub fn lecture(&self) -> &Lecture {
        &self.lecture
    }

    fn reload(&self) {
        self.reload_meta();
        self.reload_answers();
    }

    fn reload_meta(&self) {
        self.base.title().set(self.question.title.clone());

        let Some(author_id) = self.question.author.clone() else {
            self.state.borrow_mut().author = Some(author_label(None, &HashMap::new()));
            return;
        };

        let api = self.context.data().clone();
        spawn_for(
            &self.me,
            async move {
                let name = api.get_user_display_name(&author_id).await?;
                let names: HashMap<String, String> = name.into_iter().map(|name| (author_id.clone(), name)).collect();
                Ok::<_, crate::api::DataError>(author_label(Some(&author_id), &names))
            },
            |this: &Self, author| match author {
                Ok(author) => this.state.borrow_mut().author = Some(author),
                Err(err) => this.context.report_error("Failed to retrieve user information", &err),
            },
        );
    }

    fn reload_answers(&self) {
        let api = self.context.data().clone();
        spawn_for(
            &self.me,
            load_answers(api, self.question.id.clone()),
            |this: &Self, loaded: DataResult<(Vec<Answer>, DataResult<HashMap<String, String>>)>| {
                let (answers, names) = match loaded {
                    Ok(loaded) => loaded,
                    Err(err) => {
                        this.context.report_error("Retrieving data from server failed", &err);
                        return;
                    }
                };
                let names = names.unwrap_or_else(|err| {
                    this.context.report_error("Failed to retrieve user information", &err);
                    HashMap::new()
                });

                let rows = answers
                    .into_iter()
                    .map(|answer| AnswerRow {
                        author: author_label(answer.author.as_deref(), &names),
                        answer,
                    })
                    .collect();
                let mut state = this.state.borrow_mut();
                state.answers = rows;
                state.loaded = true;
            },
        );
    }

    fn post_answer(&self) {
        let (text, anonymous) = {
            let mut state = self.state.borrow_mut();
            if state.posting {
                return;
            }
            let text = state.input.value().trim().to_string();
            if text.is_empty() {
                state.message = Some("Please enter an answer.".to_string());
                return;
            }
            state.posting = true;
            state.message = None;
            (text, state.anonymous)
        };

        let author = if anonymous {
            None
        } else {
            self.context.current_user_id()
        };
        let api = self.context.data().clone();
        let question_id = self.question.id.clone();
        spawn_for(
            &self.me,
            async move { api.post_answer(&question_id, &text, author.as_deref()).await },
            |this: &Self, posted| {
                this.state.borrow_mut().posting = false;
                match posted {
                    Ok(_) => {
                        this.state.borrow_mut().input.clear();
                        this.reload_answers();
                    }
                    Err(err) => this.context.report_error("Failed to post answer", &err),
                }
            },
        );
    }
}

async fn load_answers(
    api: QandaApi,
    question_id: String,
) -> DataResult<(Vec<Answer>, DataResult<HashMap<String, String>>)> {
    let answers = api.get_answers_for_question(&question_id).await?;
    let authors: Vec<String> = answers.iter().filter_map(|answer| answer.author.clone()).collect();
    let names = api.get_user_display_names(&authors).await;
    Ok((answers, names))
}

impl Activity for ViewQuestionActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn on_resume(&self) {
        self.reload();
        let me = self.me.clone();
        self.reloader
            .start(self.context.settings().answer_reload_interval(), move || {
                if let Some(this) = me.upgrade() {
                    this.reload();
                }
            });
    }

    fn on_pause(&self) {
        self.reloader.stop();
    }

    fn handle_key(&self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => {
                    self.post_answer();
                    return true;
                }
                KeyCode::Char('a') => {
                    let mut state = self.state.borrow_mut();
                    state.anonymous = !state.anonymous;
                    return true;
                }
                _ => return false,
            }
        }

        let mut state = self.state.borrow_mut();
        match key.code {
            KeyCode::PageUp => {
                state.scroll = state.scroll.saturating_sub(5);
                true
            }
            KeyCode::PageDown => {
                state.scroll = state.scroll.saturating_add(5);
                true
            }
            _ => state.input.handle_key(key),
        }
    }

    fn key_hints(&self) -> Vec<(&'static str, &'static str)> {
        vec![("Ctrl+S", "send answer"), ("Ctrl+A", "toggle anonymous"), ("PgUp/PgDn", "scroll")]
    }
}

struct QuestionView {
    state: Rc<RefCell<QuestionState>>,
}

impl View for QuestionView {
    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let state = self.state.borrow();
        let [meta, answers, input, footer] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .areas(area);

        let author = state.author.as_deref().unwrap_or("...");
        frame.render_widget(
            Paragraph::new(Line::styled(
                format!("by {} {}", author, relative_to_now(state.question.time)),
                theme.muted_style(),
            )),
            meta,
        );

        let mut lines: Vec<Line> = Vec::new();
        if !state.loaded {
            lines.push(Line::styled("Loading answers...", theme.muted_style()));
        } else if state.answers.is_empty() {
            lines.push(Line::styled("No answers yet.", theme.muted_style()));
        }
        for row in &state.answers {
            lines.push(Line::from(Span::styled(
                format!("by {} {}", row.author, relative_to_now(row.answer.time)),
                theme.muted_style(),
            )));
            for paragraph in row.answer.paragraphs() {
                lines.push(Line::styled(paragraph.to_string(), theme.text_style()));
            }
            lines.push(Line::default());
        }
        let answer_list = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(theme.border_style(false))
                    .title(Span::styled(" Answers ", theme.heading_style())),
            )
            .wrap(Wrap { trim: false })
            .scroll((state.scroll, 0));
        frame.render_widget(answer_list, answers);

        state.input.render(frame, input, theme, "Your answer", true);

        let checkbox = if state.anonymous { "[x]" } else { "[ ]" };
        let status = if state.posting {
            Span::styled("  Sending...", theme.info_style())
        } else if let Some(message) = &state.message {
            Span::styled(format!("  {}", message), theme.error_style())
        } else {
            Span::raw("")
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!("{} Answer anonymously", checkbox), theme.muted_style()),
                status,
            ])),
            footer,
        );
    }
}
