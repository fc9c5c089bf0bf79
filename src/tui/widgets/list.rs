use crossterm::event::KeyCode;

/// Selection state of a vertical list.
#[derive(Debug, Clone)]
pub struct Selection {
    selected: Option<usize>,
    wrap_around: bool,
    page_size: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection {
    pub fn new() -> Self {
        Self {
            selected: None,
            wrap_around: true,
            page_size: 10,
        }
    }

    pub fn with_wrap_around(mut self, wrap_around: bool) -> Self {
        self.wrap_around = wrap_around;
        self
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Keep the selection valid after the list was reloaded with
    /// `item_count` items. Selects the first item of a non-empty list.
    pub fn clamp(&mut self, item_count: usize) {
        self.selected = match (self.selected, item_count) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(index), count) => Some(index.min(count - 1)),
        };
    }

    /// Handle a navigation key, returns true if handled
    pub fn handle_key(&mut self, key: KeyCode, item_count: usize) -> bool {
        if item_count == 0 {
            return false;
        }

        let last = item_count - 1;
        let next = match (key, self.selected) {
            (KeyCode::Up, None) | (KeyCode::Down, None) => 0,
            (KeyCode::Up, Some(0)) if self.wrap_around => last,
            (KeyCode::Up, Some(index)) => index.saturating_sub(1),
            (KeyCode::Down, Some(index)) if index >= last => {
                if self.wrap_around {
                    0
                } else {
                    last
                }
            }
            (KeyCode::Down, Some(index)) => index + 1,
            (KeyCode::PageUp, current) => current.unwrap_or(0).saturating_sub(self.page_size),
            (KeyCode::PageDown, current) => (current.unwrap_or(0) + self.page_size).min(last),
            (KeyCode::Home, _) => 0,
            (KeyCode::End, _) => last,
            _ => return false,
        };
        self.selected = Some(next);
        true
    }

    pub fn to_list_state(&self) -> ratatui::widgets::ListState {
        ratatui::widgets::ListState::default().with_selected(self.selected)
    }
}
