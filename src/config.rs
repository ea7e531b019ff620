use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Status of config file loading
#[derive(Debug, Clone)]
pub enum ConfigLoadStatus {
    /// Config loaded successfully from existing file
    Loaded,
    /// Created default config file (first run)
    Created,
    /// Error occurred during loading, using defaults.
    /// String is used in Debug output for logging.
    #[allow(dead_code)]
    Error(String),
}

/// Folder layout for the report workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Folder holding named report templates.
    pub templates: String,
    /// Folder where editable source documents live.
    pub source: String,
    /// Parent of the dated output folders.
    pub output_root: String,
    /// Folder holding the latest artifact per report.
    pub current: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates: "~/reports/templates".to_string(),
            source: "~/reports/source".to_string(),
            output_root: "~/reports/output".to_string(),
            current: "~/reports/current".to_string(),
        }
    }
}

/// Filename construction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Separator between a component's tag and its value.
    pub tag_delimiter: String,
    /// Separator between name components.
    pub component_delimiter: String,
    /// Extension of template and source documents.
    pub source_ext: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            tag_delimiter: ".".to_string(),
            component_delimiter: "_".to_string(),
            source_ext: "md".to_string(),
        }
    }
}

/// Renderer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Converter command invoked as `command <source> [args..] -o <output>`.
    pub command: String,
    /// Extra arguments passed to the converter before `-o`.
    pub args: Vec<String>,
    /// Default output format when none is given on the command line.
    pub format: String,
    /// strftime format for dated folder names and artifact date suffixes.
    pub date_format: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            command: "pandoc".to_string(),
            args: vec!["--standalone".to_string()],
            format: "html".to_string(),
            date_format: "%d%b%y".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl Config {
    /// Expand `~` to home directory in a path string
    pub fn expand_tilde(path: &str) -> PathBuf {
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }

    /// Resolve a path against the process working directory, once, so that
    /// every later filesystem operation works on an absolute path.
    pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(env::current_dir()?.join(path))
        }
    }

    /// Get the expanded templates folder path
    pub fn templates_path(&self) -> PathBuf {
        Self::expand_tilde(&self.paths.templates)
    }

    /// Get the expanded source folder path
    pub fn source_path(&self) -> PathBuf {
        Self::expand_tilde(&self.paths.source)
    }

    /// Get the expanded output root path
    pub fn output_root_path(&self) -> PathBuf {
        Self::expand_tilde(&self.paths.output_root)
    }

    /// Get the expanded current folder path
    pub fn current_path(&self) -> PathBuf {
        Self::expand_tilde(&self.paths.current)
    }
}

/// Partial folder layout for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialPathsConfig {
    pub templates: Option<String>,
    pub source: Option<String>,
    pub output_root: Option<String>,
    pub current: Option<String>,
}

/// Partial naming settings for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialNamingConfig {
    pub tag_delimiter: Option<String>,
    pub component_delimiter: Option<String>,
    pub source_ext: Option<String>,
}

/// Partial renderer settings for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialRenderConfig {
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
    pub format: Option<String>,
    pub date_format: Option<String>,
}

/// Project-specific configuration where every field is optional.
/// Parsed from `.recap` files. Fields that are `None` inherit from the
/// global config.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialConfig {
    pub paths: PartialPathsConfig,
    pub naming: PartialNamingConfig,
    pub render: PartialRenderConfig,
}

/// Merge a global config with a project-level partial config.
/// Project values override global values where present.
pub fn merge_config(global: &Config, project: &PartialConfig) -> Config {
    Config {
        paths: PathsConfig {
            templates: project
                .paths
                .templates
                .clone()
                .unwrap_or_else(|| global.paths.templates.clone()),
            source: project
                .paths
                .source
                .clone()
                .unwrap_or_else(|| global.paths.source.clone()),
            output_root: project
                .paths
                .output_root
                .clone()
                .unwrap_or_else(|| global.paths.output_root.clone()),
            current: project
                .paths
                .current
                .clone()
                .unwrap_or_else(|| global.paths.current.clone()),
        },
        naming: NamingConfig {
            tag_delimiter: project
                .naming
                .tag_delimiter
                .clone()
                .unwrap_or_else(|| global.naming.tag_delimiter.clone()),
            component_delimiter: project
                .naming
                .component_delimiter
                .clone()
                .unwrap_or_else(|| global.naming.component_delimiter.clone()),
            source_ext: project
                .naming
                .source_ext
                .clone()
                .unwrap_or_else(|| global.naming.source_ext.clone()),
        },
        render: RenderConfig {
            command: project
                .render
                .command
                .clone()
                .unwrap_or_else(|| global.render.command.clone()),
            args: project
                .render
                .args
                .clone()
                .unwrap_or_else(|| global.render.args.clone()),
            format: project
                .render
                .format
                .clone()
                .unwrap_or_else(|| global.render.format.clone()),
            date_format: project
                .render
                .date_format
                .clone()
                .unwrap_or_else(|| global.render.date_format.clone()),
        },
    }
}

/// Loaded configuration with metadata
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_path: PathBuf,
    pub project_config_path: Option<PathBuf>,
    pub status: ConfigLoadStatus,
}

/// Get the platform-appropriate config directory
fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "recap", "recap").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the full path to the config file
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.recap in current working directory).
pub fn get_project_config_path() -> Option<PathBuf> {
    let path = std::env::current_dir().ok()?.join(".recap");
    if path.exists() { Some(path) } else { None }
}

/// Load a project config (.recap) from the given path.
/// Returns Ok(PartialConfig) on success, Err(String) on parse/read failure.
fn load_project_config(path: &PathBuf) -> Result<PartialConfig, String> {
    let contents = fs::read_to_string(path).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_read_failed");
        format!("Failed to read .recap: {}", e)
    })?;

    toml::from_str::<PartialConfig>(&contents).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_parse_failed");
        format!("Invalid .recap: {}", e)
    })
}

/// Load configuration from file, environment, and defaults
pub fn load_config() -> LoadedConfig {
    let config_path = match get_config_path() {
        Some(path) => path,
        None => {
            warn!("Could not determine config directory, using defaults");
            return LoadedConfig {
                config: apply_env_overrides(Config::default()),
                config_path: PathBuf::from("config.toml"),
                project_config_path: None,
                status: ConfigLoadStatus::Error("Could not determine config directory".to_string()),
            };
        }
    };

    debug!("Config path: {:?}", config_path);

    let (mut config, status) = load_or_create_config(&config_path);

    // Check for project-level .recap file
    let project_config_path = get_project_config_path();
    if let Some(ref project_path) = project_config_path {
        match load_project_config(project_path) {
            Ok(partial) => {
                config = merge_config(&config, &partial);
                info!(path = ?project_path, "project_config_loaded");
            }
            Err(e) => {
                warn!(path = ?project_path, error = %e, "project_config_error");
                // Keep using global config only
            }
        }
    }

    let config = apply_env_overrides(config);

    LoadedConfig {
        config,
        config_path,
        project_config_path,
        status,
    }
}

/// Load config from file, or create default if not exists
fn load_or_create_config(config_path: &PathBuf) -> (Config, ConfigLoadStatus) {
    match fs::read_to_string(config_path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(config) => {
                info!("Loaded config from {:?}", config_path);
                (config, ConfigLoadStatus::Loaded)
            }
            Err(e) => {
                warn!(
                    "Config file malformed at {:?}: {}. Using defaults.",
                    config_path, e
                );
                (
                    Config::default(),
                    ConfigLoadStatus::Error(format!("Malformed TOML: {}", e)),
                )
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            // Config doesn't exist, create default
            create_default_config(config_path)
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(
                "Permission denied reading config at {:?}. Using defaults.",
                config_path
            );
            (
                Config::default(),
                ConfigLoadStatus::Error("Permission denied reading config".to_string()),
            )
        }
        Err(e) => {
            warn!(
                "Error reading config at {:?}: {}. Using defaults.",
                config_path, e
            );
            (
                Config::default(),
                ConfigLoadStatus::Error(format!("Read error: {}", e)),
            )
        }
    }
}

/// Create the default config file
fn create_default_config(config_path: &PathBuf) -> (Config, ConfigLoadStatus) {
    let config = Config::default();

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!(
            "Could not create config directory {:?}: {}. Continuing without file.",
            parent, e
        );
        return (
            config,
            ConfigLoadStatus::Error(format!("Could not create config directory: {}", e)),
        );
    }

    // Serialize to TOML
    let toml_content = match toml::to_string_pretty(&config) {
        Ok(s) => s,
        Err(e) => {
            warn!("Could not serialize default config: {}", e);
            return (
                config,
                ConfigLoadStatus::Error(format!("Serialization error: {}", e)),
            );
        }
    };

    // Write file
    match fs::write(config_path, &toml_content) {
        Ok(()) => {
            info!("Created default config at {:?}", config_path);
            (config, ConfigLoadStatus::Created)
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(
                "Permission denied creating config at {:?}. Continuing without file.",
                config_path
            );
            (
                config,
                ConfigLoadStatus::Error("Permission denied creating config".to_string()),
            )
        }
        Err(e) => {
            warn!(
                "Could not write default config to {:?}: {}. Continuing without file.",
                config_path, e
            );
            (
                config,
                ConfigLoadStatus::Error(format!("Write error: {}", e)),
            )
        }
    }
}

/// Apply environment variable overrides to config
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(path) = env::var("RECAP_TEMPLATES_DIR") {
        debug!("Overriding paths.templates from RECAP_TEMPLATES_DIR");
        config.paths.templates = path;
    }

    if let Ok(path) = env::var("RECAP_SOURCE_DIR") {
        debug!("Overriding paths.source from RECAP_SOURCE_DIR");
        config.paths.source = path;
    }

    if let Ok(path) = env::var("RECAP_OUTPUT_ROOT") {
        debug!("Overriding paths.output_root from RECAP_OUTPUT_ROOT");
        config.paths.output_root = path;
    }

    if let Ok(path) = env::var("RECAP_CURRENT_DIR") {
        debug!("Overriding paths.current from RECAP_CURRENT_DIR");
        config.paths.current = path;
    }

    if let Ok(command) = env::var("RECAP_RENDER_COMMAND") {
        debug!("Overriding render.command from RECAP_RENDER_COMMAND");
        config.render.command = command;
    }

    config
}
