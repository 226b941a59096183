//! Light/dark/system theme preference.
//!
//! The preference is persisted under a fixed storage key and read back on
//! start. `System` is resolved against the platform color scheme each time
//! the theme is applied. The document root carries exactly one marker class
//! for the resolved theme.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::Storage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    pub fn resolve(self, system: ColorScheme) -> ResolvedTheme {
        match self {
            ThemePreference::Light => ResolvedTheme::Light,
            ThemePreference::Dark => ResolvedTheme::Dark,
            ThemePreference::System => match system {
                ColorScheme::Light => ResolvedTheme::Light,
                ColorScheme::Dark => ResolvedTheme::Dark,
            },
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "system" => Ok(ThemePreference::System),
            other => Err(format!("unknown theme preference: {other}")),
        }
    }
}

/// The platform's `prefers-color-scheme`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl ResolvedTheme {
    pub const ALL: [ResolvedTheme; 2] = [ResolvedTheme::Light, ResolvedTheme::Dark];

    pub fn class_name(self) -> &'static str {
        match self {
            ResolvedTheme::Light => "theme-light",
            ResolvedTheme::Dark => "theme-dark",
        }
    }
}

/// Class list of the document root.
#[derive(Debug, Default, Clone)]
pub struct RootClassList {
    classes: BTreeSet<String>,
}

impl RootClassList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Swap the theme marker, leaving unrelated classes alone.
    pub fn apply_theme(&mut self, theme: ResolvedTheme) {
        for t in ResolvedTheme::ALL {
            self.classes.remove(t.class_name());
        }
        self.classes.insert(theme.class_name().to_string());
    }
}

/// The user's theme preference and the storage key it lives under. The
/// storage itself belongs to the application context.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    key: String,
    preference: ThemePreference,
}

impl ThemeStore {
    /// Load the persisted preference, falling back to `default` when nothing
    /// (or something unreadable) is stored.
    pub fn load(storage: &impl Storage, key: &str, default: ThemePreference) -> Self {
        let preference = match storage.get(key) {
            Some(raw) => raw.parse::<ThemePreference>().unwrap_or_else(|e| {
                warn!(error = %e, "ignoring stored theme");
                default
            }),
            None => default,
        };
        debug!(%preference, "theme loaded");
        Self {
            key: key.to_string(),
            preference,
        }
    }

    pub fn preference(&self) -> ThemePreference {
        self.preference
    }

    pub fn set(&mut self, storage: &mut impl Storage, preference: ThemePreference) {
        storage.set(&self.key, preference.as_str());
        self.preference = preference;
    }

    pub fn resolved(&self, system: ColorScheme) -> ResolvedTheme {
        self.preference.resolve(system)
    }

    pub fn apply(&self, system: ColorScheme, root: &mut RootClassList) -> ResolvedTheme {
        let theme = self.resolved(system);
        root.apply_theme(theme);
        theme
    }
}
