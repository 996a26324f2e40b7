//! Activity watching for vigil.
//!
//! A [`detector::CompletionDetector`] subscribes to a [`source::ChangeSource`]
//! (filesystem or visual) and announces when the target has gone quiet for an
//! idle threshold plus a confirm delay. Window targeting for the visual
//! source goes through [`window::WindowResolver`] over a host-supplied
//! [`automation::DesktopAutomation`] backend.

pub mod automation;
pub mod completion;
pub mod detector;
pub mod fs;
pub mod metrics;
pub mod source;
pub mod visual;
pub mod window;

pub use automation::{DesktopAutomation, WindowBounds, WindowInfo};
pub use completion::{CompletionConfig, FinishedEvent};
pub use detector::CompletionDetector;
pub use fs::FileSystemChangeSource;
pub use metrics::WatcherMetrics;
pub use source::{ChangeEvent, ChangeSource};
pub use visual::VisualChangeSource;
pub use window::{WindowResolver, WindowSelector};
