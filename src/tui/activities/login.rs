use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crossterm::event::{KeyCode, KeyEvent};
use log::info;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use super::spawn_for;
use crate::activity::{Activity, ActivityBase, View, result};
use crate::api::LoginOutcome;
use crate::tui::context::AppContext;
use crate::tui::theme::Theme;
use crate::tui::widgets::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Field {
    #[default]
    Username,
    Password,
}

#[derive(Default)]
struct LoginState {
    username: TextInput,
    password: TextInput,
    focus: Field,
    busy: bool,
    message: Option<String>,
}

/// Asks for credentials and returns the id of the user that logged in.
pub struct LoginActivity {
    base: ActivityBase,
    context: Rc<AppContext>,
    state: Rc<RefCell<LoginState>>,
    me: Weak<Self>,
}

impl LoginActivity {
    pub fn new(context: Rc<AppContext>) -> Rc<Self> {
        let state = Rc::new(RefCell::new(LoginState {
            password: TextInput::masked(),
            ..LoginState::default()
        }));
        let view = Rc::new(LoginView {
            state: state.clone(),
        });

        Rc::new_cyclic(|me| Self {
            base: ActivityBase::new("LoginActivity", "Login", view),
            context,
            state,
            me: me.clone(),
        })
    }

    fn submit(&self) {
        let (username, password) = {
            let mut state = self.state.borrow_mut();
            if state.busy {
                return;
            }
            let username = state.username.value().trim().to_string();
            if username.is_empty() {
                state.message = Some("Please enter a username.".to_string());
                return;
            }
            state.busy = true;
            state.message = None;
            (username, state.password.value().to_string())
        };

        let api = self.context.data().clone();
        spawn_for(
            &self.me,
            async move { api.authenticate(&username, &password).await },
            |this: &Self, outcome| this.finish(outcome),
        );
    }

    fn finish(&self, outcome: crate::api::DataResult<LoginOutcome>) {
        self.state.borrow_mut().busy = false;
        let message = match outcome {
            Ok(LoginOutcome::Success(user)) => {
                info!("Logged in as {} ({})", user.username, user.id);
                if let Err(err) = self.base.return_from_activity(result(user.id)) {
                    self.context.report_stack_error(&err);
                }
                return;
            }
            Ok(LoginOutcome::UnknownUser) => "User not found.",
            Ok(LoginOutcome::WrongPassword) => "Incorrect password.",
            Err(err) => {
                self.context.report_error("Failed to retrieve data", &err);
                return;
            }
        };
        self.state.borrow_mut().message = Some(message.to_string());
    }
}

impl Activity for LoginActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn handle_key(&self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                let mut state = self.state.borrow_mut();
                state.focus = match state.focus {
                    Field::Username => Field::Password,
                    Field::Password => Field::Username,
                };
                true
            }
            KeyCode::Enter => {
                self.submit();
                true
            }
            _ => {
                let mut state = self.state.borrow_mut();
                match state.focus {
                    Field::Username => state.username.handle_key(key),
                    Field::Password => state.password.handle_key(key),
                }
            }
        }
    }

    fn key_hints(&self) -> Vec<(&'static str, &'static str)> {
        vec![("Tab", "switch field"), ("Enter", "log in")]
    }
}

struct LoginView {
    state: Rc<RefCell<LoginState>>,
}

impl View for LoginView {
    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let state = self.state.borrow();
        let [_, username, password, message, _] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .areas(area);

        state
            .username
            .render(frame, username, theme, "Username", state.focus == Field::Username);
        state
            .password
            .render(frame, password, theme, "Password", state.focus == Field::Password);

        let line = if state.busy {
            Line::styled("Checking credentials...", theme.info_style())
        } else if let Some(message) = &state.message {
            Line::styled(message.clone(), theme.error_style())
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(line), message);
    }
}
