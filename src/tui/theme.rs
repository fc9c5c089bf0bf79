//! Catppuccin palettes (Mocha for dark terminals, Latte for light ones).

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    #[default]
    Mocha,
    Latte,
}

impl std::fmt::Display for ThemeVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeVariant::Mocha => write!(f, "mocha"),
            ThemeVariant::Latte => write!(f, "latte"),
        }
    }
}

impl std::str::FromStr for ThemeVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mocha" => Ok(ThemeVariant::Mocha),
            "latte" => Ok(ThemeVariant::Latte),
            other => Err(anyhow::anyhow!("Unknown theme '{}' (expected mocha or latte)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub mauve: Color,
    pub red: Color,
    pub peach: Color,
    pub yellow: Color,
    pub green: Color,
    pub teal: Color,
    pub blue: Color,
    pub lavender: Color,
    pub text: Color,
    pub subtext0: Color,
    pub overlay0: Color,
    pub surface0: Color,
    pub surface1: Color,
    pub base: Color,
    pub mantle: Color,
}

impl Theme {
    pub fn new(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Mocha => Self {
                mauve: Color::Rgb(0xcb, 0xa6, 0xf7),
                red: Color::Rgb(0xf3, 0x8b, 0xa8),
                peach: Color::Rgb(0xfa, 0xb3, 0x87),
                yellow: Color::Rgb(0xf9, 0xe2, 0xaf),
                green: Color::Rgb(0xa6, 0xe3, 0xa1),
                teal: Color::Rgb(0x94, 0xe2, 0xd5),
                blue: Color::Rgb(0x89, 0xb4, 0xfa),
                lavender: Color::Rgb(0xb4, 0xbe, 0xfe),
                text: Color::Rgb(0xcd, 0xd6, 0xf4),
                subtext0: Color::Rgb(0xa6, 0xad, 0xc8),
                overlay0: Color::Rgb(0x6c, 0x70, 0x86),
                surface0: Color::Rgb(0x31, 0x32, 0x44),
                surface1: Color::Rgb(0x45, 0x47, 0x5a),
                base: Color::Rgb(0x1e, 0x1e, 0x2e),
                mantle: Color::Rgb(0x18, 0x18, 0x25),
            },
            ThemeVariant::Latte => Self {
                mauve: Color::Rgb(0x88, 0x39, 0xef),
                red: Color::Rgb(0xd2, 0x0f, 0x39),
                peach: Color::Rgb(0xfe, 0x64, 0x0b),
                yellow: Color::Rgb(0xdf, 0x8e, 0x1d),
                green: Color::Rgb(0x40, 0xa0, 0x2b),
                teal: Color::Rgb(0x17, 0x92, 0x99),
                blue: Color::Rgb(0x1e, 0x66, 0xf5),
                lavender: Color::Rgb(0x72, 0x87, 0xfd),
                text: Color::Rgb(0x4c, 0x4f, 0x69),
                subtext0: Color::Rgb(0x6c, 0x6f, 0x85),
                overlay0: Color::Rgb(0x9c, 0xa0, 0xb0),
                surface0: Color::Rgb(0xcc, 0xd0, 0xda),
                surface1: Color::Rgb(0xbc, 0xc0, 0xcc),
                base: Color::Rgb(0xef, 0xf1, 0xf5),
                mantle: Color::Rgb(0xe6, 0xe9, 0xef),
            },
        }
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.red)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.yellow)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.green)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.teal)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    /// Secondary text: timestamps, authors, hints.
    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.subtext0)
    }

    pub fn heading_style(&self) -> Style {
        Style::default().fg(self.mauve).add_modifier(Modifier::BOLD)
    }

    pub fn selected_style(&self) -> Style {
        Style::default().bg(self.surface0).fg(self.lavender).add_modifier(Modifier::BOLD)
    }

    pub fn badge_style(&self) -> Style {
        Style::default().fg(self.peach)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.blue)
        } else {
            Style::default().fg(self.overlay0)
        }
    }

    pub fn cursor_style(&self) -> Style {
        Style::default().bg(self.text).fg(self.base)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeVariant::default())
    }
}
