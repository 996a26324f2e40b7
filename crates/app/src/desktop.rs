use vigil_watch::{DesktopAutomation, WindowBounds, WindowInfo};
use vigil_foundation::error::WatchError;

/// Placeholder automation backend for platforms without one.
///
/// Window enumeration and screen capture need an OS integration (Accessibility
/// on macOS, AT-SPI or a compositor protocol elsewhere) that embedding hosts
/// supply; the standalone binary reports the capability as unavailable rather
/// than failing obscurely mid-watch.
pub struct UnavailableDesktop;

impl UnavailableDesktop {
    fn unavailable<T>(&self) -> Result<T, WatchError> {
        Err(WatchError::WatchFailed(
            "no desktop automation backend is available on this platform".into(),
        ))
    }
}

impl DesktopAutomation for UnavailableDesktop {
    fn list_running_applications(&self) -> Result<Vec<String>, WatchError> {
        self.unavailable()
    }

    fn list_windows(&self, _app: &str) -> Result<Vec<WindowInfo>, WatchError> {
        self.unavailable()
    }

    fn capture_region(&self, _bounds: &WindowBounds) -> Result<Vec<u8>, WatchError> {
        self.unavailable()
    }

    fn activate_application(&self, _app: &str) -> Result<(), WatchError> {
        self.unavailable()
    }

    fn send_keystrokes(&self, _text: &str) -> Result<(), WatchError> {
        self.unavailable()
    }
}
