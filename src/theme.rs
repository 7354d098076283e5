use ratatui::style::Color;

/// Widget color scheme. Toggled by the user, persisted across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Persisted string form, as written to the preferences file.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Parse the persisted form. Unknown values fall back to light.
    pub fn from_str(s: &str) -> Self {
        match s {
            "dark" => Self::Dark,
            _ => Self::Light,
        }
    }

    pub fn palette(self) -> &'static Palette {
        match self {
            Self::Light => &LIGHT,
            Self::Dark => &DARK,
        }
    }
}

/// Colors for every widget surface. Rendering derives all styles from the
/// active palette, so a mode switch repaints everything on the next frame.
pub struct Palette {
    pub primary: Color,
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub text_muted: Color,
    pub border: Color,
    pub user_bubble_bg: Color,
    pub user_bubble_fg: Color,
    pub bot_bubble_bg: Color,
    pub bot_bubble_fg: Color,
}

pub static LIGHT: Palette = Palette {
    primary: Color::Rgb(79, 70, 229),
    background: Color::Rgb(249, 250, 251),
    surface: Color::Rgb(255, 255, 255),
    text: Color::Rgb(17, 24, 39),
    text_muted: Color::Rgb(107, 114, 128),
    border: Color::Rgb(229, 231, 235),
    user_bubble_bg: Color::Rgb(79, 70, 229),
    user_bubble_fg: Color::Rgb(255, 255, 255),
    bot_bubble_bg: Color::Rgb(243, 244, 246),
    bot_bubble_fg: Color::Rgb(17, 24, 39),
};

pub static DARK: Palette = Palette {
    primary: Color::Rgb(129, 140, 248),
    background: Color::Rgb(17, 24, 39),
    surface: Color::Rgb(31, 41, 55),
    text: Color::Rgb(243, 244, 246),
    text_muted: Color::Rgb(156, 163, 175),
    border: Color::Rgb(55, 65, 81),
    user_bubble_bg: Color::Rgb(99, 102, 241),
    user_bubble_fg: Color::Rgb(255, 255, 255),
    bot_bubble_bg: Color::Rgb(55, 65, 81),
    bot_bubble_fg: Color::Rgb(243, 244, 246),
};
