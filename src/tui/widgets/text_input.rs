use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::tui::theme::Theme;

const MASK: char = '•';

/// Editable text field: owns its value and a cursor measured in characters.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor_pos: usize,
    masked: bool,
    multiline: bool,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show every character as a bullet.
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    /// Enter inserts a line break instead of being left to the caller.
    pub fn multiline() -> Self {
        Self {
            multiline: true,
            ..Self::default()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor_pos(&self) -> usize {
        self.cursor_pos
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor_pos = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor_pos = 0;
    }

    /// Apply an editing or cursor key. Returns `true` if the key was used.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return false;
        }

        let char_count = self.value.chars().count();
        match key.code {
            KeyCode::Char(c) => {
                self.insert(c);
                true
            }
            KeyCode::Enter if self.multiline => {
                self.insert('\n');
                true
            }
            KeyCode::Backspace => {
                if self.cursor_pos > 0 {
                    let mut chars: Vec<char> = self.value.chars().collect();
                    chars.remove(self.cursor_pos - 1);
                    self.cursor_pos -= 1;
                    self.value = chars.into_iter().collect();
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor_pos < char_count {
                    let mut chars: Vec<char> = self.value.chars().collect();
                    chars.remove(self.cursor_pos);
                    self.value = chars.into_iter().collect();
                }
                true
            }
            KeyCode::Left => {
                self.cursor_pos = self.cursor_pos.saturating_sub(1);
                true
            }
            KeyCode::Right => {
                self.cursor_pos = (self.cursor_pos + 1).min(char_count);
                true
            }
            KeyCode::Home => {
                self.cursor_pos = 0;
                true
            }
            KeyCode::End => {
                self.cursor_pos = char_count;
                true
            }
            _ => false,
        }
    }

    fn insert(&mut self, c: char) {
        let mut chars: Vec<char> = self.value.chars().collect();
        chars.insert(self.cursor_pos, c);
        self.cursor_pos += 1;
        self.value = chars.into_iter().collect();
    }

    fn display_text(&self) -> String {
        if self.masked {
            self.value.chars().map(|_| MASK).collect()
        } else {
            self.value.clone()
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme, label: &str, focused: bool) {
        let cursor = focused.then_some(self.cursor_pos);
        let lines = styled_lines(&self.display_text(), cursor, theme.text_style(), theme.cursor_style());

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(focused))
            .title(Span::styled(format!(" {} ", label), theme.muted_style()));

        let mut paragraph = Paragraph::new(lines).block(block);
        if self.multiline {
            paragraph = paragraph.wrap(Wrap { trim: false });
        }
        frame.render_widget(paragraph, area);
    }
}

/// Split `text` into lines of spans, highlighting the character under the
/// cursor (or a trailing blank when the cursor sits at a line end).
fn styled_lines(text: &str, cursor: Option<usize>, style: Style, cursor_style: Style) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();

    for (index, c) in text.chars().enumerate() {
        let at_cursor = cursor == Some(index);
        if at_cursor {
            spans.push(Span::styled(std::mem::take(&mut run), style));
        }
        if c == '\n' {
            if at_cursor {
                spans.push(Span::styled(" ", cursor_style));
            } else {
                spans.push(Span::styled(std::mem::take(&mut run), style));
            }
            lines.push(Line::from(std::mem::take(&mut spans)));
            continue;
        }
        if at_cursor {
            spans.push(Span::styled(c.to_string(), cursor_style));
        } else {
            run.push(c);
        }
    }

    spans.push(Span::styled(run, style));
    if cursor == Some(text.chars().count()) {
        spans.push(Span::styled(" ", cursor_style));
    }
    lines.push(Line::from(spans));
    lines
}
