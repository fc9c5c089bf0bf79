use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{List, ListItem, Paragraph};

use super::{render_placeholder, spawn_for};
use crate::activity::{Activity, ActivityBase, View};
use crate::api::{DataResult, Lecture, QandaApi};
use crate::tui::context::AppContext;
use crate::tui::theme::Theme;
use crate::tui::widgets::Selection;

#[derive(Default)]
struct CatalogState {
    available: Vec<Lecture>,
    selection: Selection,
    loaded: bool,
    confirm: Option<Lecture>,
    joining: bool,
}

/// Lectures the current user does not attend yet, with the option to join.
pub struct AllLecturesActivity {
    base: ActivityBase,
    context: Rc<AppContext>,
    state: Rc<RefCell<CatalogState>>,
    me: Weak<Self>,
}

impl AllLecturesActivity {
    pub fn new(context: Rc<AppContext>) -> Rc<Self> {
        let state = Rc::new(RefCell::new(CatalogState::default()));
        let view = Rc::new(CatalogView {
            state: state.clone(),
        });

        Rc::new_cyclic(|me| Self {
            base: ActivityBase::new("AllLecturesActivity", "More lectures", view),
            context,
            state,
            me: me.clone(),
        })
    }

    fn reload(&self) {
        let Some(user_id) = self.context.current_user_id() else {
            return;
        };
        let api = self.context.data().clone();
        spawn_for(
            &self.me,
            load_available(api, user_id),
            |this: &Self, available: DataResult<Vec<Lecture>>| match available {
                Ok(available) => {
                    let mut state = this.state.borrow_mut();
                    state.selection.clamp(available.len());
                    state.available = available;
                    state.loaded = true;
                }
                Err(err) => this.context.report_error("Failed to retrieve lectures", &err),
            },
        );
    }

    fn join(&self, lecture: Lecture) {
        let Some(user_id) = self.context.current_user_id() else {
            return;
        };
        self.state.borrow_mut().joining = true;

        let api = self.context.data().clone();
        let lecture_id = lecture.id.clone();
        spawn_for(
            &self.me,
            async move { api.attend_lecture(&user_id, &lecture_id).await },
            move |this: &Self, joined| {
                this.state.borrow_mut().joining = false;
                match joined {
                    Ok(()) => this.context.notify(format!("Joined \"{}\".", lecture.name)),
                    Err(err) => this.context.report_error("Failed to update settings", &err),
                }
                this.reload();
            },
        );
    }

    fn handle_confirm(&self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let lecture = self.state.borrow_mut().confirm.take();
                if let Some(lecture) = lecture {
                    self.join(lecture);
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state.borrow_mut().confirm = None;
            }
            _ => {}
        }
        true
    }
}

async fn load_available(api: QandaApi, user_id: String) -> DataResult<Vec<Lecture>> {
    let all = api.get_lectures(None).await?;
    let mine = api.get_attended_lectures(&user_id).await?;
    Ok(all
        .into_iter()
        .filter(|lecture| !mine.iter().any(|attended| attended.id == lecture.id))
        .collect())
}

impl Activity for AllLecturesActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn on_resume(&self) {
        self.reload();
    }

    fn handle_key(&self, key: KeyEvent) -> bool {
        if self.state.borrow().confirm.is_some() {
            return self.handle_confirm(key);
        }

        match key.code {
            KeyCode::Enter => {
                let mut state = self.state.borrow_mut();
                let selected = state
                    .selection
                    .selected()
                    .and_then(|index| state.available.get(index).cloned());
                state.confirm = selected;
                true
            }
            KeyCode::Char('b') => {
                if let Err(err) = self.base.return_from_activity(None) {
                    self.context.report_stack_error(&err);
                }
                true
            }
            code => {
                let mut state = self.state.borrow_mut();
                let count = state.available.len();
                state.selection.handle_key(code, count)
            }
        }
    }

    fn key_hints(&self) -> Vec<(&'static str, &'static str)> {
        if self.state.borrow().confirm.is_some() {
            vec![("y", "join"), ("n", "cancel")]
        } else {
            vec![("↑↓", "select"), ("Enter", "join"), ("b", "back to my lectures")]
        }
    }
}

struct CatalogView {
    state: Rc<RefCell<CatalogState>>,
}

impl View for CatalogView {
    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let state = self.state.borrow();
        let [body, prompt] = Layout::vertical([Constraint::Min(0), Constraint::Length(2)]).areas(area);

        if !state.loaded {
            render_placeholder(frame, body, theme, "Loading lectures...");
        } else if state.available.is_empty() {
            render_placeholder(frame, body, theme, "You are attending every lecture.");
        } else {
            let items: Vec<ListItem> = state
                .available
                .iter()
                .map(|lecture| ListItem::new(Line::styled(lecture.name.clone(), theme.text_style())))
                .collect();
            let list = List::new(items)
                .highlight_style(theme.selected_style())
                .highlight_symbol("› ");
            frame.render_stateful_widget(list, body, &mut state.selection.to_list_state());
        }

        let line = if let Some(lecture) = &state.confirm {
            Line::styled(format!("Join lecture \"{}\"? (y/n)", lecture.name), theme.warning_style())
        } else if state.joining {
            Line::styled("Joining...", theme.info_style())
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(line), prompt);
    }
}
