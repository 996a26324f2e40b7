use crate::automation::{DesktopAutomation, WindowInfo};
use std::collections::HashMap;
use std::sync::Arc;
use vigil_foundation::error::WatchError;

/// Disambiguates a multi-window application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSelector {
    /// 1-based position in the window list.
    Index(usize),
    /// Case-insensitive title substring.
    Title(String),
}

impl std::fmt::Display for WindowSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowSelector::Index(i) => write!(f, "index:{i}"),
            WindowSelector::Title(t) => write!(f, "title:{t}"),
        }
    }
}

/// Maps human-supplied application aliases and window selectors onto live
/// desktop state.
pub struct WindowResolver {
    automation: Arc<dyn DesktopAutomation>,
    /// alias (lowercase) -> concrete name fragment, merged with built-ins.
    aliases: HashMap<String, String>,
}

impl WindowResolver {
    pub fn new(automation: Arc<dyn DesktopAutomation>) -> Self {
        Self {
            automation,
            aliases: HashMap::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: HashMap<String, String>) -> Self {
        self.aliases = aliases
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        self
    }

    /// Resolve an alias or partial name against the running applications.
    ///
    /// Matching is a case-insensitive substring check in both directions, so
    /// "code" finds "Visual Studio Code" and "Visual Studio Code Insiders"
    /// finds an app list entry of "Code".
    pub fn resolve_application(&self, alias_or_name: &str) -> Result<String, WatchError> {
        let running = self.automation.list_running_applications()?;

        let needle = alias_or_name.to_lowercase();
        let mut candidates = vec![needle.clone()];
        for (alias, concrete) in &self.aliases {
            if substring_match(alias, &needle) {
                candidates.push(concrete.to_lowercase());
            }
        }

        for app in &running {
            let app_lower = app.to_lowercase();
            if candidates.iter().any(|c| substring_match(&app_lower, c)) {
                return Ok(app.clone());
            }
        }
        Err(WatchError::ApplicationNotFound(alias_or_name.to_string()))
    }

    /// Resolve a selector to one window, falling back to the first window
    /// when a title substring matches nothing.
    pub fn resolve_window(
        &self,
        app: &str,
        selector: &WindowSelector,
    ) -> Result<WindowInfo, WatchError> {
        let windows = self.list_windows(app)?;
        if windows.is_empty() {
            return Err(WatchError::WindowNotFound {
                app: app.to_string(),
                selector: selector.to_string(),
            });
        }

        match selector {
            WindowSelector::Index(i) => {
                windows
                    .get(i.wrapping_sub(1))
                    .cloned()
                    .ok_or_else(|| WatchError::WindowNotFound {
                        app: app.to_string(),
                        selector: selector.to_string(),
                    })
            }
            WindowSelector::Title(fragment) => {
                let fragment = fragment.to_lowercase();
                Ok(windows
                    .iter()
                    .find(|w| w.title.to_lowercase().contains(&fragment))
                    .cloned()
                    .unwrap_or_else(|| windows[0].clone()))
            }
        }
    }

    /// Full geometry and title for every window of an application, used by
    /// hosts to let the user pick before watching begins.
    pub fn list_windows(&self, app: &str) -> Result<Vec<WindowInfo>, WatchError> {
        self.automation.list_windows(app)
    }

    pub(crate) fn automation(&self) -> &dyn DesktopAutomation {
        self.automation.as_ref()
    }
}

fn substring_match(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}
