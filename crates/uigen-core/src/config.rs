//! Configuration for agent turns, the preview frame, and allowed modules.
//!
//! Configuration is stored in TOML format at
//! `<config dir>/uigen/config.toml` (see [`PreviewConfig::default_path`]).
//!
//! ```toml
//! [agent]
//! max_steps = 40
//! mock_max_steps = 4
//!
//! [preview]
//! styling_url = "https://cdn.tailwindcss.com"
//! frame_timeout_ms = 5000
//! max_bundle_bytes = 4194304
//! error_policy = "show-error"
//!
//! [externals]
//! react = "https://esm.sh/react@19.1.0"
//! ```
//!
//! # Examples
//!
//! ```
//! use uigen_core::PreviewConfig;
//!
//! let config = PreviewConfig::default();
//! assert_eq!(config.agent.max_steps, 40);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{Error, Result};
use crate::externals::ExternalModules;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the preview shows after a failed compile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// The error panel replaces the preview.
    #[default]
    ShowError,
    /// The error is shown next to the last successfully rendered document.
    KeepLastGood,
}

/// Limits for a single agent turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum tool calls per turn
    pub max_steps: usize,
    /// Maximum tool calls per turn in reduced (mock provider) mode
    pub mock_max_steps: usize,
}

impl AgentConfig {
    /// Default ceiling for a turn.
    pub const DEFAULT_MAX_STEPS: usize = 40;

    /// Default ceiling when running against the mock provider.
    pub const DEFAULT_MOCK_MAX_STEPS: usize = 4;

    /// Returns the ceiling for the given mode.
    #[must_use]
    pub const fn step_limit(&self, mock: bool) -> usize {
        if mock { self.mock_max_steps } else { self.max_steps }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: Self::DEFAULT_MAX_STEPS,
            mock_max_steps: Self::DEFAULT_MOCK_MAX_STEPS,
        }
    }
}

/// Settings for the isolated preview frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    /// Stylesheet runtime injected into every preview document
    pub styling_url: String,
    /// How long the host waits for the frame to answer a load
    pub frame_timeout_ms: u64,
    /// Largest bundle the frame accepts
    pub max_bundle_bytes: usize,
    /// Policy for failed compile passes
    pub error_policy: ErrorPolicy,
}

impl FrameSettings {
    /// Default styling layer.
    pub const DEFAULT_STYLING_URL: &'static str = "https://cdn.tailwindcss.com";

    /// Default frame timeout: 5 seconds
    pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

    /// Default bundle size limit: 4 MiB
    pub const DEFAULT_MAX_BUNDLE_BYTES: usize = 4 * 1024 * 1024;

    /// Returns the frame timeout as a `Duration`.
    #[must_use]
    pub const fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            styling_url: Self::DEFAULT_STYLING_URL.to_string(),
            frame_timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            max_bundle_bytes: Self::DEFAULT_MAX_BUNDLE_BYTES,
            error_policy: ErrorPolicy::default(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Agent turn limits
    #[serde(default)]
    pub agent: AgentConfig,

    /// Preview frame settings
    #[serde(default)]
    pub preview: FrameSettings,

    /// Allow-listed bare imports
    #[serde(default)]
    pub externals: ExternalModules,
}

impl PreviewConfig {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_core::{ErrorPolicy, PreviewConfig};
    ///
    /// let config = PreviewConfig::builder()
    ///     .max_steps(10)
    ///     .error_policy(ErrorPolicy::KeepLastGood)
    ///     .build();
    ///
    /// assert_eq!(config.agent.max_steps, 10);
    /// ```
    #[must_use]
    pub fn builder() -> PreviewConfigBuilder {
        PreviewConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if:
    /// - A step ceiling is zero
    /// - The frame timeout or bundle limit is zero
    /// - The styling URL is empty
    /// - The allow-list lacks the framework or mount module
    pub fn validate(&self) -> Result<()> {
        let fail = |message: &str| {
            Err(Error::ConfigError {
                message: message.to_string(),
            })
        };

        if self.agent.max_steps == 0 || self.agent.mock_max_steps == 0 {
            return fail("agent step ceilings must be greater than zero");
        }
        if self.preview.frame_timeout_ms == 0 {
            return fail("preview.frame_timeout_ms must be greater than zero");
        }
        if self.preview.max_bundle_bytes == 0 {
            return fail("preview.max_bundle_bytes must be greater than zero");
        }
        if self.preview.styling_url.trim().is_empty() {
            return fail("preview.styling_url cannot be empty");
        }
        for required in [ExternalModules::FRAMEWORK, ExternalModules::MOUNT] {
            if !self.externals.contains(required) {
                return Err(Error::ConfigError {
                    message: format!("externals must include '{required}'"),
                });
            }
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// Missing sections fall back to their defaults. A present
    /// `[externals]` table replaces the built-in allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the TOML is malformed or the
    /// resulting configuration is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_core::PreviewConfig;
    ///
    /// let config = PreviewConfig::from_toml_str("[agent]\nmax_steps = 12\n").unwrap();
    /// assert_eq!(config.agent.max_steps, 12);
    /// assert_eq!(config.agent.mock_max_steps, 4);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::ConfigError {
            message: format!("invalid configuration: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationError`] if encoding fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::SerializationError {
            message: format!("failed to encode configuration: {e}"),
            source: None,
        })
    }

    /// Loads configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::ConfigError {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Self::from_toml_str(&text)
    }

    /// Loads configuration from `path` if it exists, otherwise the default file,
    /// otherwise built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if an existing file is invalid.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(default) if default.is_file() => Self::load(default),
            _ => Ok(Self::default()),
        }
    }

    /// Returns the default configuration file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("uigen").join("config.toml"))
    }
}

/// Builder for [`PreviewConfig`].
#[derive(Debug, Clone, Default)]
pub struct PreviewConfigBuilder {
    config: PreviewConfig,
}

impl PreviewConfigBuilder {
    /// Creates a builder seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the step ceiling for normal turns.
    #[must_use]
    pub fn max_steps(mut self, steps: usize) -> Self {
        self.config.agent.max_steps = steps;
        self
    }

    /// Sets the step ceiling for mock turns.
    #[must_use]
    pub fn mock_max_steps(mut self, steps: usize) -> Self {
        self.config.agent.mock_max_steps = steps;
        self
    }

    /// Sets the styling layer URL.
    #[must_use]
    pub fn styling_url(mut self, url: impl Into<String>) -> Self {
        self.config.preview.styling_url = url.into();
        self
    }

    /// Sets the frame timeout.
    #[must_use]
    pub fn frame_timeout(mut self, timeout: Duration) -> Self {
        self.config.preview.frame_timeout_ms =
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the maximum bundle size.
    #[must_use]
    pub fn max_bundle_bytes(mut self, bytes: usize) -> Self {
        self.config.preview.max_bundle_bytes = bytes;
        self
    }

    /// Sets the failed-compile policy.
    #[must_use]
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.config.preview.error_policy = policy;
        self
    }

    /// Replaces the allow-list.
    #[must_use]
    pub fn externals(mut self, externals: ExternalModules) -> Self {
        self.config.externals = externals;
        self
    }

    /// Adds one allow-listed module.
    #[must_use]
    pub fn external(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.config.externals.insert(name, url);
        self
    }

    /// Builds the configuration without validating it.
    #[must_use]
    pub fn build(self) -> PreviewConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PreviewConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.step_limit(false), 40);
        assert_eq!(config.agent.step_limit(true), 4);
        assert_eq!(config.preview.error_policy, ErrorPolicy::ShowError);
    }

    #[test]
    fn test_zero_steps_rejected() {
        let config = PreviewConfig::builder().max_steps(0).build();
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_missing_framework_rejected() {
        let config = PreviewConfig::builder()
            .externals(ExternalModules::empty().with("react-dom/client", "https://x"))
            .build();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("react"));
    }

    #[test]
    fn test_toml_partial_sections() {
        let config = PreviewConfig::from_toml_str(
            "[preview]\nframe_timeout_ms = 250\nerror_policy = \"keep-last-good\"\n",
        )
        .unwrap();
        assert_eq!(config.preview.frame_timeout(), Duration::from_millis(250));
        assert_eq!(config.preview.error_policy, ErrorPolicy::KeepLastGood);
        assert_eq!(config.preview.styling_url, FrameSettings::DEFAULT_STYLING_URL);
        assert_eq!(config.externals, ExternalModules::default());
    }

    #[test]
    fn test_toml_invalid_rejected() {
        assert!(PreviewConfig::from_toml_str("[agent\nmax_steps = ").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PreviewConfig::builder().max_steps(7).build();
        let text = config.to_toml_string().unwrap();
        let back = PreviewConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\nmock_max_steps = 2\n").unwrap();

        let config = PreviewConfig::load(&path).unwrap();
        assert_eq!(config.agent.mock_max_steps, 2);

        let explicit = PreviewConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(explicit, config);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = PreviewConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(err.is_config_error());
    }
}
