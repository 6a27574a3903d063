use std::path::Path;
use std::time::Duration;

use crate::error::Error;

/// Name of the config file at the vault root.
pub const CONFIG_FILE: &str = ".backref.toml";

/// Vault configuration loaded from `.backref.toml`.
/// Include/exclude patterns are path prefixes applied to markdown documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Characters of context captured on each side of a referencing marker.
    pub context_chars: usize,
    /// Skip documents whose relative path starts with one of these.
    exclude: Vec<String>,
    /// Coalescing delay for per-document recomputes.
    pub file_recompute_debounce: Duration,
    /// Coalescing delay for whole-vault rebuilds.
    pub full_rebuild_debounce: Duration,
    /// Only scan documents whose relative path starts with one of these.
    include: Vec<String>,
    /// Maximum characters of portal preview text.
    pub portal_chars: usize,
    /// Opacity applied to preview-only views.
    pub temporary_view_opacity: f32,
}

/// Raw TOML structure for `.backref.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct BackrefTomlConfig {
    /// See `Config::context_chars`.
    #[serde(default = "default_context_chars")]
    context_chars: usize,
    /// See `Config::exclude`.
    #[serde(default)]
    exclude: Vec<String>,
    /// Milliseconds; see `Config::file_recompute_debounce`.
    #[serde(default = "default_file_recompute_debounce_ms")]
    file_recompute_debounce_ms: u64,
    /// Milliseconds; see `Config::full_rebuild_debounce`.
    #[serde(default = "default_full_rebuild_debounce_ms")]
    full_rebuild_debounce_ms: u64,
    /// See `Config::include`.
    #[serde(default)]
    include: Vec<String>,
    /// See `Config::portal_chars`.
    #[serde(default = "default_portal_chars")]
    portal_chars: usize,
    /// See `Config::temporary_view_opacity`.
    #[serde(default = "default_temporary_view_opacity")]
    temporary_view_opacity: f32,
}

/// Default for `context_chars`.
const fn default_context_chars() -> usize {
    return 25;
}

/// Default for `file_recompute_debounce_ms`.
const fn default_file_recompute_debounce_ms() -> u64 {
    return 300;
}

/// Default for `full_rebuild_debounce_ms`.
const fn default_full_rebuild_debounce_ms() -> u64 {
    return 100;
}

/// Default for `portal_chars`.
const fn default_portal_chars() -> usize {
    return 60;
}

/// Default for `temporary_view_opacity`.
const fn default_temporary_view_opacity() -> f32 {
    return 0.7;
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            context_chars: default_context_chars(),
            exclude: Vec::new(),
            file_recompute_debounce: Duration::from_millis(default_file_recompute_debounce_ms()),
            full_rebuild_debounce: Duration::from_millis(default_full_rebuild_debounce_ms()),
            include: Vec::new(),
            portal_chars: default_portal_chars(),
            temporary_view_opacity: default_temporary_view_opacity(),
        };
    }
}

impl Config {
    /// Load config from `.backref.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist. Returns an error if the
    /// file exists but is malformed; never silently falls back to defaults
    /// when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed,
    /// or `Error::ConfigInvalid` if a value is out of range.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed,
    /// or `Error::ConfigInvalid` if a value is out of range.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: BackrefTomlConfig = toml::from_str(content)?;

        if !(raw.temporary_view_opacity > 0.0 && raw.temporary_view_opacity <= 1.0) {
            return Err(Error::ConfigInvalid {
                reason: format!(
                    "temporary_view_opacity must be in (0, 1], got {}",
                    raw.temporary_view_opacity
                ),
            });
        }

        return Ok(Self {
            context_chars: raw.context_chars,
            exclude: raw.exclude,
            file_recompute_debounce: Duration::from_millis(raw.file_recompute_debounce_ms),
            full_rebuild_debounce: Duration::from_millis(raw.full_rebuild_debounce_ms),
            include: raw.include,
            portal_chars: raw.portal_chars,
            temporary_view_opacity: raw.temporary_view_opacity,
        });
    }

    /// Check whether a markdown document path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}
