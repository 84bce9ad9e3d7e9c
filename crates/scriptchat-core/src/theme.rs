//! Site themes: copy, colors and decoration settings per look.
//!
//! Nothing in the playback logic depends on these values. Consumers only
//! check that a theme is present and fall back to [`Theme::default`] if not.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const SITE_CONFIG: &str = include_str!("../assets/site_config.json");

pub const DEFAULT_PARTNER_NAME: &str = "AI Assistant";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Premium,
    Retro,
    Hybrid,
}

impl ThemeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::Premium => "premium",
            ThemeName::Retro => "retro",
            ThemeName::Hybrid => "hybrid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "premium" => Some(ThemeName::Premium),
            "retro" => Some(ThemeName::Retro),
            "hybrid" => Some(ThemeName::Hybrid),
            _ => None,
        }
    }

    pub fn all() -> Vec<ThemeName> {
        vec![ThemeName::Premium, ThemeName::Retro, ThemeName::Hybrid]
    }

    /// Toggle order: premium -> retro -> hybrid -> premium
    pub fn next(&self) -> Self {
        match self {
            ThemeName::Premium => ThemeName::Retro,
            ThemeName::Retro => ThemeName::Hybrid,
            ThemeName::Hybrid => ThemeName::Premium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    Particles,
    #[default]
    Solid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    #[serde(default)]
    pub kind: BackgroundKind,
    #[serde(default = "default_background_color")]
    pub color: String,
}

fn default_background_color() -> String {
    "#000000".to_string()
}

impl Default for Background {
    fn default() -> Self {
        Self {
            kind: BackgroundKind::default(),
            color: default_background_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Headline {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Intro {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub font_color: Option<String>,
}

/// Hex colors for the chat and terminal panes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub accent: String,
    pub user: String,
    pub bot: String,
    pub terminal: String,
    pub muted: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            accent: "#3B82F6".to_string(),
            user: "#00FFFF".to_string(),
            bot: "#FFFFFF".to_string(),
            terminal: "#00FF00".to_string(),
            muted: "#808080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoSection {
    #[serde(default = "default_info_title")]
    pub title: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

fn default_info_title() -> String {
    "Supplementary Information".to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub chat_partner_name: Option<String>,
    #[serde(default)]
    pub toggle_label: Option<String>,
    #[serde(default)]
    pub headline: Headline,
    #[serde(default)]
    pub intro: Intro,
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub palette: Palette,
    #[serde(default)]
    pub info_section: Option<InfoSection>,
}

impl Theme {
    /// Links worth showing; an info section without links renders nothing
    pub fn info_links(&self) -> Option<&InfoSection> {
        self.info_section.as_ref().filter(|s| !s.links.is_empty())
    }
}

/// Every theme keyed by name, plus the one to start with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub active_theme: ThemeName,
    #[serde(default)]
    pub themes: BTreeMap<String, Theme>,
    #[serde(skip)]
    fallback: Theme,
}

impl SiteConfig {
    /// The site configuration compiled into the binary
    pub fn builtin() -> Self {
        serde_json::from_str(SITE_CONFIG).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "built-in site config is invalid, using defaults");
            Self::empty()
        })
    }

    pub fn empty() -> Self {
        Self {
            active_theme: ThemeName::default(),
            themes: BTreeMap::new(),
            fallback: Theme::default(),
        }
    }

    /// The named theme, or the default theme if it isn't configured
    pub fn theme(&self, name: ThemeName) -> &Theme {
        self.themes.get(name.as_str()).unwrap_or(&self.fallback)
    }

    pub fn has_theme(&self, name: ThemeName) -> bool {
        self.themes.contains_key(name.as_str())
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Chat partner shown in the chat header.
///
/// A template's name wins over the theme's, then the generic default.
pub fn partner_name<'a>(template_name: Option<&'a str>, theme: &'a Theme) -> &'a str {
    template_name
        .or(theme.chat_partner_name.as_deref())
        .unwrap_or(DEFAULT_PARTNER_NAME)
}
