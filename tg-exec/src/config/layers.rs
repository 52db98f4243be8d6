//! Raw configuration sources and the precedence between them.
//!
//! A key is looked up in the process environment first, then in the
//! user config file, then in the system config file. Empty values are
//! treated as unset at every layer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tg-exec/config.conf";

const XDG_CONFIG_HOME: &str = "XDG_CONFIG_HOME";

/// Token replaced with the machine host name inside config file values.
const HOSTNAME_TOKEN: &str = "$(hostname)";

/// A configuration key: its environment variable and its config file names.
#[derive(Debug, Clone, Copy)]
pub struct Key {
    pub env: &'static str,
    pub file: &'static [&'static str],
}

impl Key {
    pub const fn new(env: &'static str, file: &'static [&'static str]) -> Self {
        Self { env, file }
    }
}

/// Key/value maps for each configuration layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayers {
    pub env: HashMap<String, String>,
    pub user: HashMap<String, String>,
    pub system: HashMap<String, String>,
}

impl ConfigLayers {
    /// Read the process environment and both config files.
    pub fn discover() -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        let user = user_config_path(non_empty(env.get(XDG_CONFIG_HOME)))
            .map(|path| read_kv_file(&path))
            .unwrap_or_default();

        Self {
            env,
            user,
            system: read_kv_file(Path::new(SYSTEM_CONFIG_PATH)),
        }
    }

    /// Resolve `key` by precedence: environment, user file, system file.
    pub fn lookup(&self, key: &Key) -> Option<&str> {
        if let Some(value) = non_empty(self.env.get(key.env)) {
            return Some(value);
        }

        [&self.user, &self.system].into_iter().find_map(|layer| {
            key.file
                .iter()
                .find_map(|name| non_empty(layer.get(*name)))
        })
    }

    /// Look up a plain environment variable, ignoring the config files.
    pub fn env_var(&self, name: &str) -> Option<&str> {
        non_empty(self.env.get(name))
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// `$xdg_config_home/tg-exec/config.conf`, or `~/.config/tg-exec/config.conf`
/// when `xdg_config_home` is unset.
pub fn user_config_path(xdg_config_home: Option<&str>) -> Option<PathBuf> {
    let base = match xdg_config_home.filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()?.join(".config"),
    };
    Some(base.join("tg-exec").join("config.conf"))
}

/// Read a config file; a missing or unreadable file yields an empty map.
pub fn read_kv_file(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            debug!(path = %path.display(), "Loaded config file");
            parse_kv(&contents)
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Config file not loaded");
            HashMap::new()
        }
    }
}

/// Parse `KEY=VALUE` lines.
///
/// Blank lines and `#` comments (whole-line or trailing) are skipped,
/// surrounding double quotes are stripped from values and `$(hostname)`
/// is substituted.
pub fn parse_kv(contents: &str) -> HashMap<String, String> {
    let mut hostname: Option<String> = None;
    let mut map = HashMap::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = match line.find('#') {
            Some(idx) => line[..idx].trim(),
            None => line,
        };

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let mut value = value.trim().trim_matches('"').trim().to_string();
        if value.contains(HOSTNAME_TOKEN) {
            let host =
                hostname.get_or_insert_with(|| sysinfo::System::host_name().unwrap_or_default());
            value = value.replace(HOSTNAME_TOKEN, host.as_str());
        }

        map.insert(key.trim().to_string(), value);
    }

    map
}
