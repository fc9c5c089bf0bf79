use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use super::spawn_for;
use crate::activity::{Activity, ActivityBase, View, result};
use crate::api::Lecture;
use crate::tui::context::AppContext;
use crate::tui::theme::Theme;
use crate::tui::widgets::TextInput;

#[derive(Default)]
struct AskState {
    input: TextInput,
    anonymous: bool,
    posting: bool,
    message: Option<String>,
}

/// Form for a new question. Returns the id of the posted question.
pub struct AskQuestionActivity {
    base: ActivityBase,
    context: Rc<AppContext>,
    lecture: Lecture,
    state: Rc<RefCell<AskState>>,
    me: Weak<Self>,
}

impl AskQuestionActivity {
    pub fn new(context: Rc<AppContext>, lecture: Lecture) -> Rc<Self> {
        let state = Rc::new(RefCell::new(AskState::default()));
        let view = Rc::new(AskView {
            state: state.clone(),
        });

        Rc::new_cyclic(|me| Self {
            base: ActivityBase::new("AskQuestionActivity", "Ask question", view),
            context,
            lecture,
            state,
            me: me.clone(),
        })
    }

    fn submit(&self) {
        let (text, anonymous) = {
            let mut state = self.state.borrow_mut();
            if state.posting {
                return;
            }
            let text = state.input.value().trim().to_string();
            if text.is_empty() {
                state.message = Some("Please enter a question.".to_string());
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
        let lecture_id = self.lecture.id.clone();
        spawn_for(
            &self.me,
            async move { api.post_question(&lecture_id, &text, author.as_deref()).await },
            |this: &Self, posted| {
                this.state.borrow_mut().posting = false;
                match posted {
                    Ok(question_id) => {
                        if let Err(err) = this.base.return_from_activity(result(question_id)) {
                            this.context.report_stack_error(&err);
                        }
                    }
                    Err(err) => this.context.report_error("Failed to post question", &err),
                }
            },
        );
    }
}

impl Activity for AskQuestionActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn handle_key(&self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('a') {
            let mut state = self.state.borrow_mut();
            state.anonymous = !state.anonymous;
            return true;
        }
        if key.code == KeyCode::Enter {
            self.submit();
            return true;
        }
        self.state.borrow_mut().input.handle_key(key)
    }

    fn key_hints(&self) -> Vec<(&'static str, &'static str)> {
        vec![("Enter", "post"), ("Ctrl+A", "toggle anonymous")]
    }
}

struct AskView {
    state: Rc<RefCell<AskState>>,
}

impl View for AskView {
    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let state = self.state.borrow();
        let [_, input, toggle, message, _] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .areas(area);

        state.input.render(frame, input, theme, "Your question", true);

        let checkbox = if state.anonymous { "[x]" } else { "[ ]" };
        frame.render_widget(
            Paragraph::new(Line::styled(format!("{} Ask anonymously", checkbox), theme.muted_style())),
            toggle,
        );

        let line = if state.posting {
            Line::styled("Posting...", theme.info_style())
        } else if let Some(text) = &state.message {
            Line::styled(text.clone(), theme.error_style())
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(line), message);
    }
}
