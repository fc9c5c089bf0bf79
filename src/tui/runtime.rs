//! The terminal shell: composition root, key routing and frame rendering.

use std::cell::{Cell, RefCell};
use std::io::{self, Stdout};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
};
use log::{debug, info};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Margin, Rect};
use ratatui::style::Stylize;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tokio::task::LocalSet;

use super::activities::{LectureMenuActivity, LoginActivity};
use super::context::{AppContext, StatusLevel};
use super::theme::Theme;
use crate::activity::diagnostics::set_fault_hook;
use crate::activity::{
    ActivityStack, Listener, StackBreadcrumb, StackError, TerminalHost, take_result,
};
use crate::api::QandaApi;
use crate::config::Settings;

const GLOBAL_HINTS: [(&str, &str); 3] = [("Esc", "back"), ("F1", "help"), ("Ctrl+Q", "quit")];

/// Owns the activity stack, its breadcrumb and the terminal host, and
/// routes input to the foreground activity.
pub struct QandaApp {
    context: Rc<AppContext>,
    host: Rc<TerminalHost>,
    stack: ActivityStack,
    breadcrumb: StackBreadcrumb,
    theme: Theme,
    help_open: Cell<bool>,
    pending_title: Rc<RefCell<Option<String>>>,
    title_listener: Listener<String>,
}

impl QandaApp {
    pub fn new(context: Rc<AppContext>, theme: Theme) -> Self {
        let host = Rc::new(TerminalHost::new());
        let stack = ActivityStack::new(host.clone());
        let breadcrumb = StackBreadcrumb::attach(&stack);

        let pending_title = Rc::new(RefCell::new(None));
        let sink = pending_title.clone();
        let title_listener = breadcrumb
            .window_title()
            .on_change()
            .listen("shell.window_title", move |title: &String| {
                *sink.borrow_mut() = Some(title.clone());
            });

        Self {
            context,
            host,
            stack,
            breadcrumb,
            theme,
            help_open: Cell::new(false),
            pending_title,
            title_listener,
        }
    }

    pub fn context(&self) -> &Rc<AppContext> {
        &self.context
    }

    pub fn stack(&self) -> &ActivityStack {
        &self.stack
    }

    pub fn breadcrumb(&self) -> &StackBreadcrumb {
        &self.breadcrumb
    }

    /// Push the login screen. Once it returns a user id, the id is stored
    /// in the context and the lecture menu replaces it.
    pub fn start(&self) -> Result<(), StackError> {
        let login = LoginActivity::new(self.context.clone());
        let context = Rc::downgrade(&self.context);
        let stack = self.stack.downgrade();

        self.stack.push_for_result(login, move |returned| {
            let (Some(context), Some(stack)) = (context.upgrade(), stack.upgrade()) else {
                return;
            };
            let Some(user_id) = take_result::<String>(returned) else {
                return;
            };
            debug!("Session user is {}", user_id);
            context.user_id().set(Some(user_id));

            // Applied by the stack once the login pop has finished.
            if let Err(err) = stack.push(LectureMenuActivity::new(context.clone()), None) {
                context.report_stack_error(&err);
            }
        })
    }

    /// The window title, if it changed since the last call.
    pub fn take_window_title(&self) -> Option<String> {
        self.pending_title.borrow_mut().take()
    }

    /// Route a key press. Returns `false` when the application should quit.
    pub fn handle_key(&self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return true;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
        {
            return false;
        }

        if key.code == KeyCode::F(1) {
            self.help_open.set(!self.help_open.get());
            return true;
        }
        if self.help_open.get() {
            if key.code == KeyCode::Esc {
                self.help_open.set(false);
            }
            return true;
        }

        self.context.clear_status();

        let consumed = self
            .stack
            .foreground()
            .is_some_and(|activity| activity.handle_key(key));

        if !consumed && key.code == KeyCode::Esc {
            match self.breadcrumb.navigate_back() {
                Ok(true) => {}
                Ok(false) => debug!("Nothing to navigate back to"),
                Err(err) => self.context.report_stack_error(&err),
            }
        }

        !self.stack.is_empty()
    }

    pub fn render(&self, frame: &mut Frame) {
        let theme = &self.theme;
        let area = frame.area();
        let [header, body, status, footer] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_header(frame, header);

        let content = body.inner(Margin::new(2, 1));
        self.host.render(frame, content, theme);

        if let Some(message) = self.context.status().get() {
            let style = match message.level {
                StatusLevel::Info => theme.info_style(),
                StatusLevel::Error => theme.error_style(),
            };
            frame.render_widget(Paragraph::new(Line::styled(message.text, style)), status);
        }

        frame.render_widget(Paragraph::new(self.hint_line()), footer);

        if self.help_open.get() {
            self.render_help(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let labels = self.breadcrumb.labels();
        let last = labels.len().saturating_sub(1);

        let mut spans = Vec::new();
        for (index, label) in labels.into_iter().enumerate() {
            if index > 0 {
                spans.push(Span::styled(" › ", theme.muted_style()));
            }
            if index == last {
                spans.push(Span::styled(label, theme.text_style().fg(theme.blue).bold()));
            } else {
                spans.push(Span::styled(label, theme.muted_style()));
            }
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(false))
            .title(Span::styled(" Lecture Q&A ", theme.heading_style()));
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn hint_line(&self) -> Line<'static> {
        let theme = &self.theme;
        let mut hints = self
            .stack
            .foreground()
            .map(|activity| activity.key_hints())
            .unwrap_or_default();
        hints.extend(GLOBAL_HINTS);

        let mut spans = Vec::new();
        for (key, action) in hints {
            spans.push(Span::styled(format!(" {} ", key), theme.cursor_style()));
            spans.push(Span::styled(format!(" {}  ", action), theme.muted_style()));
        }
        Line::from(spans)
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let [_, middle, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(14),
            Constraint::Fill(1),
        ])
        .areas(area);
        let [_, popup, _] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(50),
            Constraint::Fill(1),
        ])
        .areas(middle);

        let mut lines = vec![Line::styled("This screen", theme.heading_style())];
        if let Some(activity) = self.stack.foreground() {
            for (key, action) in activity.key_hints() {
                lines.push(help_line(theme, key, action));
            }
        }
        lines.push(Line::default());
        lines.push(Line::styled("Everywhere", theme.heading_style()));
        for (key, action) in GLOBAL_HINTS {
            lines.push(help_line(theme, key, action));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(true))
            .title(Span::styled(" Help (F1 / Esc to close) ", theme.heading_style()));
        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

fn help_line(theme: &Theme, key: &str, action: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:>12}  ", key), theme.badge_style()),
        Span::styled(action.to_string(), theme.text_style()),
    ])
}

impl Drop for QandaApp {
    fn drop(&mut self) {
        self.breadcrumb
            .window_title()
            .on_change()
            .unsubscribe(&self.title_listener);
    }
}

/// Run the terminal client against `api` until the user quits.
pub async fn launch(api: QandaApi, settings: Settings) -> Result<()> {
    info!("Launching TUI against database '{}'", api.database());
    let local = LocalSet::new();
    local.run_until(run_app(api, settings)).await
}

async fn run_app(api: QandaApi, settings: Settings) -> Result<()> {
    let theme = Theme::new(settings.theme);
    let context = Rc::new(AppContext::new(api, settings));
    let app = QandaApp::new(context.clone(), theme);

    let weak_context = Rc::downgrade(&context);
    let _fault_hook = set_fault_hook(move |fault| {
        if let Some(context) = weak_context.upgrade() {
            context.report_fault(fault);
        }
    });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = match app.start() {
        Ok(()) => run_tui(&mut terminal, &app).await,
        Err(err) => Err(anyhow!("Failed to show the login screen: {}", err)),
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_tui(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &QandaApp) -> Result<()> {
    loop {
        let frame_start = Instant::now();

        // Drain pending input first for minimal latency
        let mut should_quit = false;
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()?
                && !app.handle_key(key)
            {
                should_quit = true;
                break;
            }
        }
        if should_quit {
            break;
        }

        if let Some(title) = app.take_window_title() {
            execute!(terminal.backend_mut(), SetTitle(title))?;
        }

        terminal.draw(|frame| app.render(frame))?;

        // Sleep for the rest of the 16ms frame; local tasks (data requests,
        // reload timers) run while we wait.
        if let Some(remaining) = Duration::from_millis(16).checked_sub(frame_start.elapsed()) {
            tokio::time::sleep(remaining).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    Ok(())
}
