use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use vigil_watch::CompletionConfig;

/// On-disk configuration. Every field has a default so an absent file or a
/// partial file both work.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub watch: WatchSection,
    pub visual: VisualSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSection {
    /// Seconds of quiet before a completion candidate is considered.
    pub idle_threshold_secs: u64,
    /// Additional quiet seconds confirming the candidate.
    pub confirm_delay_secs: u64,
    /// Milliseconds a file must stay unmodified before its change surfaces.
    pub stability_window_ms: u64,
    /// Replaces the built-in ignore set when present.
    pub ignore_globs: Option<Vec<String>>,
}

impl Default for WatchSection {
    fn default() -> Self {
        let defaults = CompletionConfig::default();
        Self {
            idle_threshold_secs: defaults.idle_threshold.as_secs(),
            confirm_delay_secs: defaults.confirm_delay.as_secs(),
            stability_window_ms: vigil_watch::fs::DEFAULT_STABILITY_WINDOW.as_millis() as u64,
            ignore_globs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisualSection {
    /// Milliseconds between window re-captures.
    pub poll_interval_ms: u64,
    /// Application alias -> concrete name, e.g. `vscode = "Visual Studio Code"`.
    pub aliases: HashMap<String, String>,
}

impl Default for VisualSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: vigil_watch::visual::DEFAULT_POLL_INTERVAL.as_millis() as u64,
            aliases: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn completion(&self) -> CompletionConfig {
        CompletionConfig {
            idle_threshold: Duration::from_secs(self.watch.idle_threshold_secs),
            confirm_delay: Duration::from_secs(self.watch.confirm_delay_secs),
        }
    }

    pub fn stability_window(&self) -> Duration {
        Duration::from_millis(self.watch.stability_window_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.visual.poll_interval_ms)
    }
}
