//! Per-pane configuration attributes (spec.md §6.4): `render-wrap`,
//! `shift-left`, `render-vmargin`, `heading`, `background`, `hide-cursor`,
//! `line-format`. Parsed from TOML with `serde`, with a context-aware
//! clamp for `render-vmargin` applied at apply time rather than at parse
//! time, so later viewport resizes can re-clamp without reparsing.

use anyhow::Result;
use serde::{Deserialize, Deserializer};
use std::{fmt, fs, path::PathBuf};
use tracing::info;

/// A resolved `background` attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    Color(String),
    Image(PathBuf),
    Call(String),
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Background::Color(c) => write!(f, "color:{c}"),
            Background::Image(p) => write!(f, "image:{}", p.display()),
            Background::Call(c) => write!(f, "call:{c}"),
        }
    }
}

impl std::str::FromStr for Background {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("background value {s:?} missing a `kind:` prefix"))?;
        match kind {
            "color" => Ok(Background::Color(rest.to_string())),
            "image" => Ok(Background::Image(PathBuf::from(rest))),
            "call" => Ok(Background::Call(rest.to_string())),
            other => Err(format!("unknown background kind {other:?}")),
        }
    }
}

impl<'de> Deserialize<'de> for Background {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// §6.4's attribute table for a single pane. Every field is optional; an
/// absent field means the pane inherits whatever default the caller uses.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct PaneConfig {
    #[serde(rename = "render-wrap", default)]
    pub render_wrap: Option<bool>,
    #[serde(rename = "shift-left", default)]
    pub shift_left: Option<u32>,
    #[serde(rename = "render-vmargin", default)]
    pub render_vmargin: Option<u16>,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub background: Option<Background>,
    #[serde(rename = "hide-cursor", default)]
    pub hide_cursor: Option<bool>,
    #[serde(rename = "line-format", default)]
    pub line_format: Option<String>,
}

/// Top-level config file: a `[default]` table applied to every pane, plus
/// named overrides under `[panes.<name>]` keyed by whatever name the
/// caller associates with a pane (a buffer name, a file glob, etc.).
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub default: PaneConfig,
    #[serde(default)]
    pub panes: std::collections::BTreeMap<String, PaneConfig>,
}

impl ConfigFile {
    /// The effective config for a pane: the default table with any
    /// matching named override applied field-by-field on top.
    pub fn resolve(&self, name: &str) -> PaneConfig {
        let mut cfg = self.default.clone();
        if let Some(over) = self.panes.get(name) {
            if over.render_wrap.is_some() {
                cfg.render_wrap = over.render_wrap;
            }
            if over.shift_left.is_some() {
                cfg.shift_left = over.shift_left;
            }
            if over.render_vmargin.is_some() {
                cfg.render_vmargin = over.render_vmargin;
            }
            if over.heading.is_some() {
                cfg.heading = over.heading.clone();
            }
            if over.background.is_some() {
                cfg.background = over.background.clone();
            }
            if over.hide_cursor.is_some() {
                cfg.hide_cursor = over.hide_cursor;
            }
            if over.line_format.is_some() {
                cfg.line_format = over.line_format.clone();
            }
        }
        cfg
    }
}

/// Platform details that influence how a margin clamp is computed (mirrors
/// the same concept `core-viewport` needs from its caller, passed in
/// rather than detected here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformTraits {
    pub is_windows: bool,
    pub supports_scroll_region: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigContext {
    pub viewport_columns: u16,
    pub viewport_rows: u16,
    pub status_rows: u16,
    pub overlay_rows: u16,
    pub platform: PlatformTraits,
}

impl ConfigContext {
    pub fn new(
        viewport_columns: u16,
        viewport_rows: u16,
        status_rows: u16,
        overlay_rows: u16,
        platform: PlatformTraits,
    ) -> Self {
        Self {
            viewport_columns,
            viewport_rows,
            status_rows,
            overlay_rows,
            platform,
        }
    }

    pub fn text_rows(&self) -> u16 {
        let reserved = self.status_rows.saturating_add(self.overlay_rows);
        self.viewport_rows.saturating_sub(reserved)
    }

    pub fn from_viewport_height(viewport_rows: u16) -> Self {
        Self {
            viewport_columns: 0,
            viewport_rows,
            status_rows: 0,
            overlay_rows: 0,
            platform: PlatformTraits::default(),
        }
    }
}

/// A loaded config file plus the derived, context-clamped values a caller
/// actually applies to a pane.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,
    pub file: ConfigFile,
    pub effective_vmargin: u16,
}

/// Best-effort config path following platform conventions (local override
/// first, then the platform config directory).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("editor.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("editor").join("editor.toml");
    }
    PathBuf::from("editor.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Config {
                raw: Some(content),
                file,
                effective_vmargin: 0,
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config parse failed, using defaults");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    /// Apply viewport context to compute the clamped `render-vmargin` for
    /// `pane_name` (or the default table if no named override exists).
    /// Returns the effective value.
    pub fn apply_context(&mut self, pane_name: &str, ctx: ConfigContext) -> u16 {
        let pane = self.file.resolve(pane_name);
        let raw = pane.render_vmargin.unwrap_or(0);
        let text_rows = ctx.text_rows();
        let (clamped, max) = if text_rows <= 3 {
            (0, 0)
        } else {
            let max = (text_rows.saturating_sub(2)) / 2;
            (raw.min(max), max)
        };

        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                max,
                text_rows,
                viewport_rows = ctx.viewport_rows,
                overlay_rows = ctx.overlay_rows,
                status_rows = ctx.status_rows,
                supports_scroll_region = ctx.platform.supports_scroll_region,
                is_windows = ctx.platform.is_windows,
                "render_vmargin_clamped"
            );
        }
        self.effective_vmargin = clamped;
        clamped
    }

    pub fn apply_viewport_height(&mut self, pane_name: &str, viewport_height: u16) -> u16 {
        self.apply_context(pane_name, ConfigContext::from_viewport_height(viewport_height))
    }

    /// Recompute on a viewport or platform change. Returns `Some(new)` only
    /// when the effective value actually changed.
    pub fn recompute_with_context(&mut self, pane_name: &str, ctx: ConfigContext) -> Option<u16> {
        let prev = self.effective_vmargin;
        let current = self.apply_context(pane_name, ctx);
        if current != prev { Some(current) } else { None }
    }
}
