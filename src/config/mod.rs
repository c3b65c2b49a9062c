use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;

use crate::script::KeyStyle;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path())
    }

    pub fn load_from(config_path: PathBuf) -> Self {
        let mut map = default_map();

        // Read .ssrrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(|l| l.ok()) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    /// Pin a value regardless of file or environment.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    pub fn project_root(&self) -> PathBuf {
        self.get_path("SSR_PROJECT_ROOT")
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn public_root(&self) -> PathBuf {
        self.project_relative("SSR_PUBLIC_DIR", "public")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_relative("SSR_MANIFEST_PATH", "public/packs/manifest.json")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.project_relative("SSR_OUTPUT_DIR", "tmp/ssr")
    }

    pub fn interpreter(&self) -> String {
        self.get("SSR_INTERPRETER")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "node".to_string())
    }

    /// `None` when `SSR_EXEC_TIMEOUT` is 0.
    pub fn exec_timeout(&self) -> Option<Duration> {
        match self.get_u64("SSR_EXEC_TIMEOUT").unwrap_or(60) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("REQUEST_TIMEOUT").unwrap_or(60))
    }

    pub fn max_tries(&self) -> u32 {
        self.get_u64("SSR_MAX_TRIES")
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(10)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.get_u64("SSR_DELAY_MS").unwrap_or(1000))
    }

    pub fn key_style(&self) -> KeyStyle {
        match self.get("SSR_PROPS_KEY_STYLE").as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("preserve") => KeyStyle::Preserve,
            _ => KeyStyle::LowerCamel,
        }
    }

    /// Dev server mode: `Some(forced)` or `None` to probe the port.
    pub fn dev_server_mode(&self) -> Option<bool> {
        match self.get("SSR_DEV_SERVER")?.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn project_relative(&self, key: &str, default: &str) -> PathBuf {
        let p = self.get_path(key).unwrap_or_else(|| PathBuf::from(default));
        absolutize(&self.project_root(), &p)
    }
}

fn absolutize(root: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or SSR_* for forward-compat
    const KEYS: &[&str] = &["REQUEST_TIMEOUT"];

    KEYS.contains(&k) || k.starts_with("SSR_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("react_ssr").join(".ssrrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    // Paths
    m.insert("SSR_PUBLIC_DIR".into(), "public".into());
    m.insert("SSR_MANIFEST_PATH".into(), "public/packs/manifest.json".into());
    m.insert("SSR_OUTPUT_DIR".into(), "tmp/ssr".into());

    // Dev server
    m.insert("SSR_DEV_SERVER".into(), "auto".into());
    m.insert("SSR_DEV_SERVER_PROTOCOL".into(), "http".into());
    m.insert("SSR_DEV_SERVER_HOST".into(), "localhost".into());
    m.insert("SSR_DEV_SERVER_PORT".into(), "3035".into());

    // Numbers
    m.insert("SSR_MAX_TRIES".into(), "10".into());
    m.insert("SSR_DELAY_MS".into(), "1000".into());
    m.insert("SSR_EXEC_TIMEOUT".into(), "60".into());
    m.insert("REQUEST_TIMEOUT".into(), "60".into());

    // Strings
    m.insert("SSR_INTERPRETER".into(), "node".into());
    m.insert("SSR_PROPS_KEY_STYLE".into(), "camel".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rc_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let rc = dir.path().join(".ssrrc");
        fs::write(
            &rc,
            "# comment\nSSR_INTERPRETER = nodejs\n\nSSR_EXEC_TIMEOUT=0\nSSR_PROPS_KEY_STYLE=preserve\n",
        )
        .unwrap();

        let cfg = Config::load_from(rc);
        if env::var("SSR_INTERPRETER").is_err() {
            assert_eq!(cfg.interpreter(), "nodejs");
        }
        if env::var("SSR_EXEC_TIMEOUT").is_err() {
            assert_eq!(cfg.exec_timeout(), None);
        }
        if env::var("SSR_PROPS_KEY_STYLE").is_err() {
            assert_eq!(cfg.key_style(), KeyStyle::Preserve);
        }
    }

    #[test]
    fn paths_are_project_relative() {
        let mut cfg = Config::load_from(PathBuf::from("/nonexistent/.ssrrc"));
        cfg.set("SSR_PROJECT_ROOT", "/srv/app");
        cfg.set("SSR_PUBLIC_DIR", "public");
        cfg.set("SSR_MANIFEST_PATH", "public/packs/manifest.json");
        cfg.set("SSR_OUTPUT_DIR", "/var/tmp/ssr");

        assert_eq!(cfg.public_root(), PathBuf::from("/srv/app/public"));
        assert_eq!(cfg.manifest_path(), PathBuf::from("/srv/app/public/packs/manifest.json"));
        assert_eq!(cfg.output_dir(), PathBuf::from("/var/tmp/ssr"));
    }

    #[test]
    fn out_of_range_max_tries_falls_back() {
        let mut cfg = Config::load_from(PathBuf::from("/nonexistent/.ssrrc"));
        cfg.set("SSR_MAX_TRIES", "4294967296");
        assert_eq!(cfg.max_tries(), 10);
        cfg.set("SSR_MAX_TRIES", "3");
        assert_eq!(cfg.max_tries(), 3);
    }

    #[test]
    fn dev_server_mode_parses_auto_and_forced() {
        let mut cfg = Config::load_from(PathBuf::from("/nonexistent/.ssrrc"));
        cfg.set("SSR_DEV_SERVER", "auto");
        assert_eq!(cfg.dev_server_mode(), None);
        cfg.set("SSR_DEV_SERVER", "TRUE");
        assert_eq!(cfg.dev_server_mode(), Some(true));
        cfg.set("SSR_DEV_SERVER", "false");
        assert_eq!(cfg.dev_server_mode(), Some(false));
    }
}
