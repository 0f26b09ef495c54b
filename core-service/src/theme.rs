//! Light/dark theme preference persisted in the host settings store.

use std::sync::Arc;

use bridge_traits::storage::SettingsStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Settings key holding `"light"` or `"dark"`.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Anything other than `"light"` reads as dark.
    pub fn from_stored(value: &str) -> Self {
        if value == "light" {
            Theme::Light
        } else {
            Theme::Dark
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn palette(self) -> ThemePalette {
        match self {
            Theme::Light => ThemePalette::LIGHT,
            Theme::Dark => ThemePalette::DARK,
        }
    }
}

/// Navigation colors handed to the UI shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemePalette {
    pub dark: bool,
    pub primary: &'static str,
    pub background: &'static str,
    pub card: &'static str,
    pub text: &'static str,
    pub border: &'static str,
    pub notification: &'static str,
}

impl ThemePalette {
    pub const LIGHT: ThemePalette = ThemePalette {
        dark: false,
        primary: "blue",
        background: "white",
        card: "gray",
        text: "black",
        border: "gray",
        notification: "red",
    };

    pub const DARK: ThemePalette = ThemePalette {
        dark: true,
        primary: "blue",
        background: "gray",
        card: "gray",
        text: "white",
        border: "gray",
        notification: "red",
    };
}

/// Current theme plus the store it is persisted to.
///
/// Storage failures never block the UI: reads fall back to [`Theme::Light`]
/// and a failed write still flips the in-memory theme.
pub struct ThemePreference {
    store: Option<Arc<dyn SettingsStore>>,
    current: Theme,
}

impl ThemePreference {
    /// Read the stored theme. Without a store the theme is light and
    /// toggles are kept in memory only.
    pub async fn load(store: Option<Arc<dyn SettingsStore>>) -> Self {
        let current = match &store {
            Some(store) => match store.get_string(THEME_KEY).await {
                Ok(Some(value)) => Theme::from_stored(&value),
                Ok(None) => {
                    debug!("No stored theme, using light");
                    Theme::Light
                }
                Err(err) => {
                    warn!(error = %err, "Failed to read theme, using light");
                    Theme::Light
                }
            },
            None => Theme::Light,
        };

        Self { store, current }
    }

    pub fn theme(&self) -> Theme {
        self.current
    }

    pub fn palette(&self) -> ThemePalette {
        self.current.palette()
    }

    /// Flip and persist. Returns the new theme.
    pub async fn toggle(&mut self) -> Theme {
        self.current = self.current.toggled();
        if let Some(store) = &self.store {
            if let Err(err) = store.set_string(THEME_KEY, self.current.as_str()).await {
                warn!(error = %err, theme = self.current.as_str(), "Failed to persist theme");
            }
        }
        self.current
    }
}

impl std::fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemePreference")
            .field("current", &self.current)
            .field("persistent", &self.store.is_some())
            .finish()
    }
}
