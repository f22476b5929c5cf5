//! Shared configuration loader for the caddy tools.
//!
//! `defaults/caddy.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Binaries layer a user file and flag overrides
//! on top of those defaults via [`Loader`] before deserializing into
//! [`CaddyConfig`].
//!
//! The `config` crate lowercases keys while merging sources, which is harmless
//! for the fixed settings but would rename script globals (`maxLen` becomes
//! `maxlen`). `[runner.globals]` is therefore read straight from the TOML text
//! of each layer, keeping names exactly as written.

use caddy_js::check::CheckOptions;
use caddy_js::extract::{Dialect, ExtractOptions, OutputFormat};
use caddy_js::runner::{Bindings, RunnerOptions};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/caddy.default.toml");

/// Top-level configuration consumed by the caddy binaries.
#[derive(Debug, Clone, Deserialize)]
pub struct CaddyConfig {
    pub runner: RunnerConfig,
    pub extractor: ExtractorConfig,
    pub check: CheckConfig,
}

/// Script execution settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    pub input_binding: String,
    #[serde(default)]
    pub loop_iteration_limit: Option<u64>,
    #[serde(default)]
    pub recursion_limit: Option<usize>,
    /// Extra globals installed after `console`, names case-preserved.
    /// Filled by [`Loader::build`] from the raw TOML layers.
    #[serde(skip)]
    pub globals: BTreeMap<String, serde_json::Value>,
}

impl RunnerConfig {
    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            input_binding: self.input_binding.clone(),
            loop_iteration_limit: self.loop_iteration_limit,
            recursion_limit: self.recursion_limit,
        }
    }

    /// Build the scope bindings for one run, with `input` bound under
    /// [`RunnerConfig::input_binding`].
    pub fn bindings(&self, input: Option<String>) -> Bindings {
        Bindings {
            input,
            globals: self.globals.clone(),
        }
    }
}

/// Function extraction settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    pub default_prefix: String,
    pub dialect: Dialect,
    pub module: bool,
    pub format: OutputFormat,
}

impl ExtractorConfig {
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            dialect: self.dialect,
            module: self.module,
        }
    }
}

/// Challenge checking settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckConfig {
    pub prefix: String,
}

impl CaddyConfig {
    /// Combine the runner and extractor sections into checker options.
    pub fn check_options(&self) -> CheckOptions {
        CheckOptions {
            prefix: self.check.prefix.clone(),
            extract: self.extractor.extract_options(),
            runner: self.runner.runner_options(),
            bindings: self.runner.bindings(None),
        }
    }
}

/// Builds a [`CaddyConfig`] from the embedded defaults, an optional
/// `--config` file and per-flag overrides.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
    /// Files layered so far, re-read for their `[runner.globals]` tables
    files: Vec<PathBuf>,
}

impl Loader {
    /// Start from `caddy.default.toml`.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self {
            builder,
            files: Vec::new(),
        }
    }

    /// Layer the TOML file given with `--config`; a missing file fails
    /// [`Loader::build`].
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let source = File::from(path).format(FileFormat::Toml).required(true);
        self.builder = self.builder.add_source(source);
        self.files.push(path.to_path_buf());
        self
    }

    /// Override one dotted key, e.g. `extractor.format` from
    /// `caddy-extract --format` or `check.prefix` from the `caddy-check`
    /// prefix argument. Keys under `runner.globals` are not supported here.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge every layer and deserialize it.
    pub fn build(self) -> Result<CaddyConfig, ConfigError> {
        let mut config: CaddyConfig = self.builder.clone().build()?.try_deserialize()?;
        config.runner.globals = self.read_globals()?;
        Ok(config)
    }

    /// Later layers replace same-named globals from earlier ones.
    fn read_globals(&self) -> Result<BTreeMap<String, serde_json::Value>, ConfigError> {
        let mut globals = parse_globals(DEFAULT_TOML, None)?;
        for path in &self.files {
            let text = fs::read_to_string(path).map_err(|err| ConfigError::Foreign(Box::new(err)))?;
            globals.extend(parse_globals(&text, Some(path))?);
        }
        Ok(globals)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults alone, as used when no `--config` is given.
pub fn load_defaults() -> Result<CaddyConfig, ConfigError> {
    Loader::new().build()
}

#[derive(Deserialize, Default)]
struct GlobalsLayer {
    #[serde(default)]
    runner: GlobalsSection,
}

#[derive(Deserialize, Default)]
struct GlobalsSection {
    #[serde(default)]
    globals: BTreeMap<String, serde_json::Value>,
}

fn parse_globals(
    text: &str,
    path: Option<&Path>,
) -> Result<BTreeMap<String, serde_json::Value>, ConfigError> {
    let layer: GlobalsLayer = toml::from_str(text).map_err(|err| ConfigError::FileParse {
        uri: path.map(|path| path.display().to_string()),
        cause: Box::new(err),
    })?;
    Ok(layer.runner.globals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.runner.input_binding, "s");
        assert_eq!(config.runner.loop_iteration_limit, None);
        assert!(config.runner.globals.is_empty());
        assert_eq!(config.extractor.default_prefix, "");
        assert_eq!(config.extractor.dialect, Dialect::Tsx);
        assert!(config.extractor.module);
        assert_eq!(config.extractor.format, OutputFormat::Json);
        assert_eq!(config.check.prefix, "ch");
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("extractor.format", "yaml")
            .expect("override to apply")
            .set_override("extractor.dialect", "js")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.extractor.format, OutputFormat::Yaml);
        assert_eq!(config.extractor.dialect, Dialect::Js);
    }

    #[test]
    fn layers_user_file_with_globals() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "[runner]\nloop_iteration_limit = 1000\n\n[runner.globals]\nlimit = 3\ngreeting = \"hi\"\n"
        )
        .expect("write config");

        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");

        assert_eq!(config.runner.input_binding, "s");
        assert_eq!(config.runner.loop_iteration_limit, Some(1000));
        assert_eq!(config.runner.globals["limit"], serde_json::json!(3));
        assert_eq!(config.runner.globals["greeting"], serde_json::json!("hi"));

        let options = config.runner.runner_options();
        assert_eq!(options.loop_iteration_limit, Some(1000));
        let bindings = config.runner.bindings(Some("abc".to_string()));
        assert_eq!(bindings.input.as_deref(), Some("abc"));
        assert_eq!(bindings.globals.len(), 2);
    }

    #[test]
    fn global_names_keep_their_case() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "[runner.globals]\nmaxLen = 3\nWORDS = [\"a\", \"b\"]\n"
        )
        .expect("write config");

        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");

        let names: Vec<&str> = config.runner.globals.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["WORDS", "maxLen"]);
        assert_eq!(config.runner.globals["maxLen"], serde_json::json!(3));
        assert_eq!(config.runner.globals["WORDS"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn later_files_replace_earlier_globals() {
        let mut first = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(first, "[runner.globals]\nmaxLen = 3\nkeep = true\n").expect("write config");
        let mut second = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(second, "[runner.globals]\nmaxLen = 5\n").expect("write config");

        let config = Loader::new()
            .with_file(first.path())
            .with_file(second.path())
            .build()
            .expect("config to build");

        assert_eq!(config.runner.globals["maxLen"], serde_json::json!(5));
        assert_eq!(config.runner.globals["keep"], serde_json::json!(true));
    }

    #[test]
    fn missing_user_file_is_an_error() {
        let result = Loader::new()
            .with_file("/nonexistent/caddy.toml")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn check_options_combine_sections() {
        let config = load_defaults().expect("defaults to deserialize");
        let options = config.check_options();
        assert_eq!(options.prefix, "ch");
        assert_eq!(options.runner.input_binding, "s");
        assert_eq!(options.extract.dialect, Dialect::Tsx);
    }
}
