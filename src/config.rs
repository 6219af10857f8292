use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};

use crate::page::Markup;

pub struct Config {
    pub listings_page: PathBuf,
    pub output_path: PathBuf,
    pub settings_path: PathBuf,
    pub quiet_window: Duration,
    pub price_label: String,
    pub area_label: String,
    pub watch_page: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let markup = Markup::default();

        let cfg = Self {
            listings_page: var("LISTINGS_PAGE")
                .map(PathBuf::from)
                .context("LISTINGS_PAGE must point at a saved result page")?,
            output_path: var("OVERLAY_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("overlay.html")),
            settings_path: var("SETTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("overlay-settings.json")),
            quiet_window: Duration::from_millis(match var("QUIET_WINDOW_MS") {
                Some(v) => v.parse().with_context(|| format!("QUIET_WINDOW_MS: {v:?}"))?,
                None => 500,
            }),
            price_label: var("PRICE_LABEL").unwrap_or(markup.price_label),
            area_label: var("AREA_LABEL").unwrap_or(markup.area_label),
            watch_page: match var("WATCH_PAGE") {
                Some(v) => parse_flag(&v).with_context(|| format!("WATCH_PAGE: {v:?}"))?,
                None => true,
            },
        };

        if resolve(&cfg.output_path)? == resolve(&cfg.listings_page)? {
            bail!("OVERLAY_OUTPUT must differ from LISTINGS_PAGE");
        }

        Ok(cfg)
    }

    pub fn markup(&self) -> Markup {
        Markup {
            price_label: self.price_label.clone(),
            area_label: self.area_label.clone(),
            ..Markup::default()
        }
    }
}

/// Absolute form of `path` with its directory resolved, so `./a.html`,
/// `sub/../a.html` and `/cwd/a.html` compare equal. The file itself need not exist.
fn resolve(path: &Path) -> anyhow::Result<PathBuf> {
    let abs = std::path::absolute(path)
        .with_context(|| format!("resolving {}", path.display()))?;

    let resolved = match (abs.parent(), abs.file_name()) {
        (Some(dir), Some(name)) => dir.canonicalize().ok().map(|dir| dir.join(name)),
        _ => None,
    };
    Ok(resolved.unwrap_or(abs))
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("expected a boolean"),
    }
}
