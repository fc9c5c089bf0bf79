//! The application's screens.

mod all_lectures;
mod ask_question;
mod lecture_menu;
mod lecture_overview;
mod login;
mod view_question;

pub use all_lectures::AllLecturesActivity;
pub use ask_question::AskQuestionActivity;
pub use lecture_menu::LectureMenuActivity;
pub use lecture_overview::LectureOverviewActivity;
pub use login::LoginActivity;
pub use view_question::ViewQuestionActivity;

use std::cell::RefCell;
use std::future::Future;
use std::rc::Weak;
use std::time::Duration;

use log::debug;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::activity::Activity;
use crate::tui::theme::Theme;

/// Run `task` on the local task set and hand its output to `apply`, unless
/// the activity has been dropped or left its stack in the meantime.
pub(crate) fn spawn_for<A, T, F, R>(owner: &Weak<A>, task: F, apply: R) -> JoinHandle<()>
where
    A: Activity + 'static,
    T: 'static,
    F: Future<Output = T> + 'static,
    R: FnOnce(&A, T) + 'static,
{
    let owner = owner.clone();
    tokio::task::spawn_local(async move {
        let output = task.await;
        let Some(activity) = owner.upgrade() else {
            return;
        };
        if !activity.lifecycle().accepts_results() {
            debug!("Dropping late result for {} ({})", activity.id(), activity.lifecycle());
            return;
        }
        apply(&activity, output);
    })
}

/// Periodic reload while a screen is in the foreground.
#[derive(Default)]
pub(crate) struct Reloader {
    handle: RefCell<Option<JoinHandle<()>>>,
}

impl Reloader {
    /// Call `tick` every `period`, first after one period. Replaces any
    /// running schedule. A zero period disables reloading.
    pub fn start(&self, period: Duration, tick: impl Fn() + 'static) {
        self.stop();
        if period.is_zero() {
            debug!("Reload interval is zero, not scheduling reloads");
            return;
        }
        let handle = tokio::task::spawn_local(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        });
        *self.handle.borrow_mut() = Some(handle);
    }

    pub fn stop(&self) {
        if let Some(handle) = self.handle.borrow_mut().take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.borrow().is_some()
    }
}

impl Drop for Reloader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Centered placeholder for screens that are still waiting for data.
pub(crate) fn render_placeholder(frame: &mut Frame, area: Rect, theme: &Theme, text: &str) {
    let paragraph = Paragraph::new(Line::styled(text.to_string(), theme.muted_style()))
        .alignment(ratatui::layout::Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// "1 question", "3 questions".
pub(crate) fn count_label(count: u64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
