use vigil_foundation::error::WatchError;

/// Screen-space rectangle of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One window of a running application, resolved fresh on each query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub app: String,
    /// 1-based position in the application's window list.
    pub index: usize,
    pub title: String,
    pub bounds: WindowBounds,
}

/// Platform desktop capability consumed by the visual change source and the
/// window resolver.
///
/// Window enumeration, screen capture, and keystroke injection are OS
/// services vigil does not reimplement; hosts supply an implementation and
/// every operation may fail recoverably when the target process has exited.
pub trait DesktopAutomation: Send + Sync {
    fn list_running_applications(&self) -> Result<Vec<String>, WatchError>;

    fn list_windows(&self, app: &str) -> Result<Vec<WindowInfo>, WatchError>;

    /// Capture the pixels of a screen region as opaque image bytes.
    fn capture_region(&self, bounds: &WindowBounds) -> Result<Vec<u8>, WatchError>;

    fn activate_application(&self, app: &str) -> Result<(), WatchError>;

    fn send_keystrokes(&self, text: &str) -> Result<(), WatchError>;
}
