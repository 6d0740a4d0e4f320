/// Window presentation settings applied when the controller binds a window.
///
/// Sizes are in logical units. The default is a 1600x900 launch window that
/// can be shrunk down to 100x100.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    /// Title bar text.
    pub title: String,
    /// Size requested at launch, width by height.
    pub launch_size: (u32, u32),
    /// Smallest size the user may resize the window to.
    pub min_size: (u32, u32),
}

impl WindowConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_launch_size(mut self, width: u32, height: u32) -> Self {
        self.launch_size = (width, height);
        self
    }

    pub fn with_min_size(mut self, width: u32, height: u32) -> Self {
        self.min_size = (width, height);
        self
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Stagehand".to_string(),
            launch_size: (1600, 900),
            min_size: (100, 100),
        }
    }
}
