use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, Paragraph};

use super::{
    AllLecturesActivity, LectureOverviewActivity, count_label, render_placeholder, spawn_for,
};
use crate::activity::{Activity, ActivityBase, View};
use crate::api::{DataResult, Lecture, QandaApi};
use crate::tui::context::AppContext;
use crate::tui::theme::Theme;
use crate::tui::widgets::Selection;

#[derive(Default)]
struct MenuState {
    lectures: Vec<Lecture>,
    question_counts: HashMap<String, u64>,
    selection: Selection,
    loaded: bool,
    display_name: Option<String>,
}

type MenuLoad = DataResult<(Vec<Lecture>, DataResult<HashMap<String, u64>>)>;

/// The lectures the current user attends, with their question counts.
pub struct LectureMenuActivity {
    base: ActivityBase,
    context: Rc<AppContext>,
    state: Rc<RefCell<MenuState>>,
    me: Weak<Self>,
}

impl LectureMenuActivity {
    pub fn new(context: Rc<AppContext>) -> Rc<Self> {
        let state = Rc::new(RefCell::new(MenuState::default()));
        let view = Rc::new(MenuView {
            state: state.clone(),
        });

        Rc::new_cyclic(|me| Self {
            base: ActivityBase::new("LectureMenuActivity", "Lectures", view),
            context,
            state,
            me: me.clone(),
        })
    }

    fn reload(&self) {
        let Some(user_id) = self.context.current_user_id() else {
            self.context.notify("Not logged in.");
            return;
        };

        let api = self.context.data().clone();
        let uid = user_id.clone();
        spawn_for(
            &self.me,
            load_menu(api, uid),
            |this: &Self, loaded: MenuLoad| this.apply(loaded),
        );

        let api = self.context.data().clone();
        spawn_for(
            &self.me,
            async move { api.get_user_by_id(&user_id).await },
            |this: &Self, user| match user {
                Ok(user) => {
                    let name = user.display_name.unwrap_or(user.username);
                    this.state.borrow_mut().display_name = Some(name);
                }
                Err(err) => this
                    .context
                    .report_error("Failed to retrieve user information", &err),
            },
        );
    }

    fn apply(&self, loaded: MenuLoad) {
        let (lectures, counts) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                self.context.report_error("Failed to retrieve data from server", &err);
                return;
            }
        };
        // Lectures are still listed, just without badges.
        let counts = counts.unwrap_or_else(|err| {
            self.context.report_error("Failed to retrieve data from server", &err);
            HashMap::new()
        });

        let mut state = self.state.borrow_mut();
        state.selection.clamp(lectures.len());
        state.lectures = lectures;
        state.question_counts = counts;
        state.loaded = true;
    }

    fn open_selected(&self) {
        let lecture = {
            let state = self.state.borrow();
            state
                .selection
                .selected()
                .and_then(|index| state.lectures.get(index).cloned())
        };
        if let Some(lecture) = lecture {
            let overview = LectureOverviewActivity::new(self.context.clone(), lecture);
            if let Err(err) = self.base.start_activity(overview, None) {
                self.context.report_stack_error(&err);
            }
        }
    }

    fn open_more(&self) {
        let more = AllLecturesActivity::new(self.context.clone());
        if let Err(err) = self.base.start_activity(more, None) {
            self.context.report_stack_error(&err);
        }
    }
}

async fn load_menu(api: QandaApi, user_id: String) -> MenuLoad {
    let lectures = api.get_attended_lectures(&user_id).await?;
    let ids: Vec<String> = lectures.iter().map(|lecture| lecture.id.clone()).collect();
    let counts = api.get_number_of_questions_by_lecture(&ids).await;
    Ok((lectures, counts))
}

impl Activity for LectureMenuActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn on_resume(&self) {
        self.reload();
    }

    fn handle_key(&self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter => {
                self.open_selected();
                true
            }
            KeyCode::Char('m') => {
                self.open_more();
                true
            }
            KeyCode::Char('r') => {
                self.reload();
                true
            }
            code => {
                let mut state = self.state.borrow_mut();
                let count = state.lectures.len();
                state.selection.handle_key(code, count)
            }
        }
    }

    fn key_hints(&self) -> Vec<(&'static str, &'static str)> {
        vec![("↑↓", "select"), ("Enter", "open"), ("m", "more lectures"), ("r", "reload")]
    }
}

struct MenuView {
    state: Rc<RefCell<MenuState>>,
}

impl View for MenuView {
    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let state = self.state.borrow();
        let [greeting, body] = Layout::vertical([Constraint::Length(2), Constraint::Min(0)]).areas(area);

        if let Some(name) = &state.display_name {
            let line = Line::from(vec![
                Span::styled("Logged in as ", theme.muted_style()),
                Span::styled(name.clone(), theme.text_style()),
            ]);
            frame.render_widget(Paragraph::new(line), greeting);
        }

        if !state.loaded {
            render_placeholder(frame, body, theme, "Loading lectures...");
            return;
        }
        if state.lectures.is_empty() {
            render_placeholder(
                frame,
                body,
                theme,
                "You are not attending any lectures yet. Press m to find more.",
            );
            return;
        }

        let items: Vec<ListItem> = state
            .lectures
            .iter()
            .map(|lecture| {
                let mut spans = vec![Span::styled(lecture.name.clone(), theme.text_style())];
                if let Some(count) = state.question_counts.get(&lecture.id) {
                    spans.push(Span::raw("  "));
                    spans.push(Span::styled(
                        count_label(*count, "question", "questions"),
                        theme.badge_style(),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(theme.selected_style())
            .highlight_symbol("› ");
        frame.render_stateful_widget(list, body, &mut state.selection.to_list_state());
    }
}
