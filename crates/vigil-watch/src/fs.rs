use crate::source::{ChangeEvent, ChangeSource};
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use vigil_foundation::error::WatchError;

/// Path globs that never count as project activity: version-control
/// bookkeeping, build output, lock files, and OS metadata.
pub const DEFAULT_IGNORE_GLOBS: &[&str] = &[
    "**/.git/**",
    "**/.hg/**",
    "**/.svn/**",
    "**/node_modules/**",
    "**/target/**",
    "**/dist/**",
    "**/build/**",
    "**/__pycache__/**",
    "**/*.lock",
    "**/.DS_Store",
    "**/Thumbs.db",
    "**/*.swp",
    "**/*.tmp",
];

/// How long a file must stay unmodified before its change is surfaced.
/// Coalesces rapid successive writes so partial-write flicker is reported
/// as a single change.
pub const DEFAULT_STABILITY_WINDOW: Duration = Duration::from_millis(400);

/// Recursive filesystem watch over one root, reporting root-relative paths.
pub struct FileSystemChangeSource {
    id: String,
    root: PathBuf,
    ignore_globs: Vec<String>,
    stability_window: Duration,
    debouncer: Option<Debouncer<notify::RecommendedWatcher>>,
}

impl FileSystemChangeSource {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
            ignore_globs: DEFAULT_IGNORE_GLOBS.iter().map(|s| s.to_string()).collect(),
            stability_window: DEFAULT_STABILITY_WINDOW,
            debouncer: None,
        }
    }

    /// Replace the ignore set (patterns are matched against the
    /// root-relative path).
    pub fn with_ignore_globs(mut self, globs: Vec<String>) -> Self {
        self.ignore_globs = globs;
        self
    }

    pub fn with_stability_window(mut self, window: Duration) -> Self {
        self.stability_window = window;
        self
    }

    fn build_ignore_set(&self) -> Result<GlobSet, WatchError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.ignore_globs {
            let glob = Glob::new(pattern)
                .map_err(|e| WatchError::WatchFailed(format!("bad ignore glob {pattern:?}: {e}")))?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| WatchError::WatchFailed(e.to_string()))
    }
}

impl ChangeSource for FileSystemChangeSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn start(&mut self, tx: UnboundedSender<ChangeEvent>) -> Result<(), WatchError> {
        if self.debouncer.is_some() {
            return Err(WatchError::AlreadyWatching);
        }
        if !self.root.is_dir() {
            return Err(WatchError::WatchFailed(format!(
                "watch root is not a directory: {}",
                self.root.display()
            )));
        }

        let ignore = self.build_ignore_set()?;
        let root = self.root.clone();
        let source_id = self.id.clone();

        let mut debouncer = new_debouncer(
            self.stability_window,
            move |result: notify_debouncer_mini::DebounceEventResult| match result {
                Ok(events) => {
                    for event in events {
                        // `AnyContinuous` means writes are still landing;
                        // only the stable notification counts.
                        if event.kind != DebouncedEventKind::Any {
                            continue;
                        }
                        // The debouncer erases the event kind, so removals
                        // and rename-aways arrive looking like writes. Only
                        // creates and modifications count as activity, and
                        // for those the path still exists.
                        if !event.path.exists() {
                            continue;
                        }
                        let relative = match event.path.strip_prefix(&root) {
                            Ok(rel) => rel,
                            Err(_) => continue,
                        };
                        if relative.as_os_str().is_empty() || ignore.is_match(relative) {
                            continue;
                        }
                        let _ = tx.send(ChangeEvent {
                            source_id: source_id.clone(),
                            timestamp: Instant::now(),
                            metadata: relative.display().to_string(),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!("filesystem watch error: {}", e);
                }
            },
        )
        .map_err(|e| WatchError::WatchFailed(e.to_string()))?;

        debouncer
            .watcher()
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|e| WatchError::WatchFailed(e.to_string()))?;

        tracing::info!(root = %self.root.display(), "filesystem change source watching");
        self.debouncer = Some(debouncer);
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the debouncer tears down the watch threads; no event is
        // delivered afterwards.
        if self.debouncer.take().is_some() {
            tracing::info!(root = %self.root.display(), "filesystem change source stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ignores_cover_common_noise() {
        let source = FileSystemChangeSource::new("fs", ".");
        let set = source.build_ignore_set().unwrap();
        for path in [
            ".git/objects/ab/cdef",
            "node_modules/react/index.js",
            "target/debug/build.log",
            "Cargo.lock",
            ".DS_Store",
            "src/.main.rs.swp",
        ] {
            assert!(set.is_match(path), "{path} should be ignored");
        }
        for path in ["src/main.rs", "README.md", "assets/logo.png"] {
            assert!(!set.is_match(path), "{path} should be tracked");
        }
    }

    #[test]
    fn bad_glob_is_a_start_error() {
        let mut source = FileSystemChangeSource::new("fs", ".")
            .with_ignore_globs(vec!["[".to_string()]);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        assert!(matches!(source.start(tx), Err(WatchError::WatchFailed(_))));
    }

    #[test]
    fn missing_root_is_a_start_error() {
        let mut source = FileSystemChangeSource::new("fs", "/nonexistent/vigil-test-root");
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        assert!(matches!(source.start(tx), Err(WatchError::WatchFailed(_))));
    }
}
