//! Persisted settings store plus built-in defaults and precedence helpers.
//!
//! Settings live under a single `[settings]` section in
//! `~/.config/nodegrab/config.toml`. The file is auto-initialized with empty
//! values on first load and always rewritten in full by an explicit `save`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Built-in URL list used when neither a flag nor a stored value provides one.
pub const DEFAULT_URLS: &[&str] = &[
    "https://raw.githubusercontent.com/Barabama/FreeNodes/main/nodes/yudou66.txt",
    "https://raw.githubusercontent.com/Barabama/FreeNodes/main/nodes/blues.txt",
    "https://raw.githubusercontent.com/Barabama/FreeNodes/main/nodes/clashmeta.txt",
    "https://raw.githubusercontent.com/Barabama/FreeNodes/main/nodes/nodev2ray.txt",
    "https://raw.githubusercontent.com/Barabama/FreeNodes/main/nodes/nodefree.txt",
    "https://raw.githubusercontent.com/Barabama/FreeNodes/main/nodes/v2rayshare.txt",
    "https://raw.githubusercontent.com/Barabama/FreeNodes/main/nodes/wenode.txt",
];

/// Built-in output path (relative to the working directory).
pub const DEFAULT_OUTPUT: &str = "free_get_node.txt";

/// Built-in proxy address (local socks5 forwarder).
pub const DEFAULT_PROXY: &str = "socks5://127.0.0.1:10808";

/// Built-in per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Built-in overall budget in seconds (one-shot surface only).
pub const DEFAULT_TOTAL_TIMEOUT_SECS: u64 = 60;

/// Operator settings persisted between invocations.
///
/// `urls` keeps the comma-joined form so the stored file round-trips the
/// exact string the operator supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Output file path; empty means unset.
    pub output_path: String,
    /// Proxy address (e.g. `socks5://127.0.0.1:10808`); empty means none.
    pub proxy: String,
    /// Comma-joined URL list; empty means unset.
    pub urls: String,
    /// Per-request timeout in seconds.
    pub timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_path: String::new(),
            proxy: String::new(),
            urls: String::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// On-disk wrapper so the file carries a named `[settings]` section.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    settings: Settings,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("nodegrab")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load settings from disk, creating an empty-valued file if none exists.
pub fn load_or_init() -> Result<Settings> {
    let path = config_path()?;
    if !path.exists() {
        let file = SettingsFile::default();
        let toml = toml::to_string_pretty(&file)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default settings at {}", path.display());
        return Ok(file.settings);
    }

    let data = fs::read_to_string(&path)?;
    let file: SettingsFile = toml::from_str(&data)?;
    Ok(file.settings)
}

/// Rewrite the whole settings file. Persistence is always this explicit call;
/// nothing in the engine saves behind the operator's back.
pub fn save(settings: &Settings) -> Result<()> {
    let path = config_path()?;
    let file = SettingsFile {
        settings: settings.clone(),
    };
    let toml = toml::to_string_pretty(&file)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, toml)?;
    tracing::info!("settings saved to {}", path.display());
    Ok(())
}

/// Split a comma-joined URL string into an ordered list, dropping
/// empty/whitespace entries. No deduplication.
pub fn parse_url_list(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve one string-valued parameter: explicit flag wins, then a non-empty
/// stored value, then the built-in default.
pub fn resolve_str(flag: Option<&str>, stored: &str, default: &str) -> String {
    if let Some(v) = flag {
        return v.to_string();
    }
    if !stored.trim().is_empty() {
        return stored.to_string();
    }
    default.to_string()
}
