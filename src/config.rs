use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

pub fn key_match(key: &KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|binding| is_match(key, binding))
}

fn is_match(key: &KeyEvent, binding: &str) -> bool {
    let binding = binding.to_lowercase();
    let parts: Vec<&str> = binding.split('+').collect();

    let mut target_modifiers = KeyModifiers::NONE;
    let mut target_code = KeyCode::Null;

    for part in parts {
        match part {
            "ctrl" => target_modifiers.insert(KeyModifiers::CONTROL),
            "opt" | "alt" => target_modifiers.insert(KeyModifiers::ALT),
            "shift" => target_modifiers.insert(KeyModifiers::SHIFT),
            "enter" => target_code = KeyCode::Enter,
            "esc" => target_code = KeyCode::Esc,
            "backspace" => target_code = KeyCode::Backspace,
            "tab" => target_code = KeyCode::Tab,
            "backtab" => target_code = KeyCode::BackTab,
            "space" => target_code = KeyCode::Char(' '),
            "up" => target_code = KeyCode::Up,
            "down" => target_code = KeyCode::Down,
            "left" => target_code = KeyCode::Left,
            "right" => target_code = KeyCode::Right,
            "home" => target_code = KeyCode::Home,
            "end" => target_code = KeyCode::End,
            "pageup" => target_code = KeyCode::PageUp,
            "pagedown" => target_code = KeyCode::PageDown,
            c if c.chars().count() == 1 => {
                if let Some(ch) = c.chars().next() {
                    target_code = KeyCode::Char(ch);
                }
            }
            _ => {}
        }
    }

    let code_matches = if key.code == target_code {
        true
    } else if let (KeyCode::Char(c), KeyCode::Char(tc)) = (key.code, target_code) {
        c.to_lowercase().next() == Some(tc)
    } else {
        false
    };
    if !code_matches {
        return false;
    }

    // Enter must match exactly so `enter` and `shift+enter` can coexist.
    if target_code == KeyCode::Enter {
        return key.modifiers == target_modifiers;
    }

    let mut key_mods = key.modifiers;
    if !target_modifiers.contains(KeyModifiers::SHIFT) {
        key_mods.remove(KeyModifiers::SHIFT);
    }

    key_mods.contains(target_modifiers)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "jarvis", "jarvis")
}

fn default_data_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("JARVIS_DATA_DIR") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = project_dirs() {
        return dirs.data_dir().to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".jarvis")
}

pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("JARVIS_CONFIG") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = project_dirs() {
        return dirs.config_dir().join("config.toml");
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".jarvis-config.toml")
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub calendar: CalendarConfig,
    pub data: DataConfig,
    pub keybindings: KeyBindings,
    pub theme: Theme,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// 0 disables the timeout; a hung request then keeps the client syncing.
    pub request_timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_seconds: 0,
        }
    }
}

impl BackendConfig {
    /// `JARVIS_BACKEND_URL` wins over the file, mirroring a deploy-time setting.
    pub fn resolved_base_url(&self) -> String {
        let from_env = std::env::var("JARVIS_BACKEND_URL").unwrap_or_default();
        let raw = if from_env.trim().is_empty() {
            self.base_url.trim()
        } else {
            from_env.trim()
        };
        let raw = if raw.is_empty() { DEFAULT_BACKEND_URL } else { raw };
        raw.trim_end_matches('/').to_string()
    }

    pub fn login_url(&self) -> String {
        format!("{}/auth/google/login", self.resolved_base_url())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// Port the backend redirects back to after Google sign-in.
    pub callback_port: u16,
    pub callback_timeout_seconds: u64,
    pub open_browser: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            callback_port: 5173,
            callback_timeout_seconds: 600,
            open_browser: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CalendarConfig {
    pub clock_24h: bool,
}

impl CalendarConfig {
    pub fn clock_format(&self) -> &'static str {
        if self.clock_24h { "%H:%M" } else { "%I:%M %p" }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.data_dir.join("jarvis.log")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KeyBindings {
    pub global: GlobalBindings,
    pub calendar: CalendarBindings,
    pub tasks: TasksBindings,
    pub chat: ChatBindings,
    pub popup: PopupBindings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GlobalBindings {
    pub quit: Vec<String>,
    pub help: Vec<String>,
    pub next_panel: Vec<String>,
    pub prev_panel: Vec<String>,
    pub chat: Vec<String>,
    pub tasks: Vec<String>,
    pub calendar: Vec<String>,
    pub connect: Vec<String>,
    pub refresh: Vec<String>,
}

impl Default for GlobalBindings {
    fn default() -> Self {
        Self {
            quit: vec!["ctrl+q".to_string(), "q".to_string()],
            help: vec!["?".to_string()],
            next_panel: vec!["tab".to_string()],
            prev_panel: vec!["backtab".to_string()],
            chat: vec!["1".to_string()],
            tasks: vec!["2".to_string()],
            calendar: vec!["3".to_string()],
            connect: vec!["c".to_string()],
            refresh: vec!["r".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CalendarBindings {
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub prev_month: Vec<String>,
    pub next_month: Vec<String>,
    pub today: Vec<String>,
}

impl Default for CalendarBindings {
    fn default() -> Self {
        Self {
            left: vec!["h".to_string(), "left".to_string()],
            right: vec!["l".to_string(), "right".to_string()],
            up: vec!["k".to_string(), "up".to_string()],
            down: vec!["j".to_string(), "down".to_string()],
            prev_month: vec!["[".to_string(), "pageup".to_string()],
            next_month: vec!["]".to_string(), "pagedown".to_string()],
            today: vec!["t".to_string(), "home".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TasksBindings {
    pub up: Vec<String>,
    pub down: Vec<String>,
}

impl Default for TasksBindings {
    fn default() -> Self {
        Self {
            up: vec!["k".to_string(), "up".to_string()],
            down: vec!["j".to_string(), "down".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ChatBindings {
    pub compose: Vec<String>,
    pub send: Vec<String>,
    pub newline: Vec<String>,
    pub cancel: Vec<String>,
    pub scroll_up: Vec<String>,
    pub scroll_down: Vec<String>,
}

impl Default for ChatBindings {
    fn default() -> Self {
        Self {
            compose: vec!["i".to_string(), "enter".to_string()],
            send: vec!["enter".to_string()],
            newline: vec!["shift+enter".to_string(), "alt+enter".to_string()],
            cancel: vec!["esc".to_string()],
            scroll_up: vec!["k".to_string(), "up".to_string()],
            scroll_down: vec!["j".to_string(), "down".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PopupBindings {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl Default for PopupBindings {
    fn default() -> Self {
        Self {
            confirm: vec!["enter".to_string(), "y".to_string()],
            cancel: vec!["esc".to_string(), "n".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    pub border_default: String,
    pub border_active: String,
    pub accent: String,
    pub muted: String,
    pub today: String,
    pub selection: String,
    pub event_marker: String,
    pub user_message: String,
    pub jarvis_message: String,
    pub toast: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border_default: "DarkGray".to_string(),
            border_active: "Blue".to_string(),
            accent: "LightBlue".to_string(),
            muted: "DarkGray".to_string(),
            today: "Yellow".to_string(),
            selection: "40,70,140".to_string(),
            event_marker: "LightGreen".to_string(),
            user_message: "Cyan".to_string(),
            jarvis_message: "LightBlue".to_string(),
            toast: "Cyan".to_string(),
        }
    }
}

impl Config {
    /// Loading runs before logging is set up, so problems are returned for
    /// the caller to log once a subscriber exists.
    pub fn load() -> (Self, Vec<String>) {
        Self::load_from(&config_path())
    }

    pub fn load_from(config_path: &Path) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();

        let mut config = if let Ok(content) = fs::read_to_string(config_path) {
            match toml::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(e) => {
                    warnings.push(format!(
                        "failed to parse {}, using defaults: {e}",
                        config_path.display()
                    ));
                    Config::default()
                }
            }
        } else {
            Config::default()
        };

        let changed = config.normalize();
        if (changed || !config_path.exists())
            && let Err(e) = config.save_to_path(config_path)
        {
            warnings.push(format!("failed to write {}: {e}", config_path.display()));
        }

        (config, warnings)
    }

    pub fn save_to_path(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).unwrap_or_default();
        fs::write(path, content)
    }

    fn normalize(&mut self) -> bool {
        let mut changed = false;

        if self.data.data_dir.as_os_str().is_empty() {
            self.data.data_dir = default_data_dir();
            changed = true;
        }

        if self.backend.base_url.trim().is_empty() {
            self.backend.base_url = DEFAULT_BACKEND_URL.to_string();
            changed = true;
        }

        if self.auth.callback_timeout_seconds == 0 {
            self.auth.callback_timeout_seconds = AuthConfig::default().callback_timeout_seconds;
            changed = true;
        }

        changed
    }
}
