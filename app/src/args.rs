//! Command line arguments for shell applications.
//!
//! Uses clap for proper CLI parsing with help text, validation and clear
//! error messages. [`ShellArgs`] can also be built programmatically for
//! embedders that do their own argument handling.

use std::time::Duration;

use clap::Parser;

use stagehand_core::{PollPacing, WindowConfig};

/// Worker pacing selection for CLI.
///
/// Maps onto [`PollPacing`]; `sleep` takes its interval from
/// `--poll-interval-ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliPacing {
    /// Re-check the phase continuously. Lowest latency, burns a core.
    Spin,
    /// Yield the worker thread between iterations.
    #[default]
    Yield,
    /// Sleep between iterations (interval from --poll-interval-ms).
    Sleep,
}

/// Stagehand shell arguments.
#[derive(Parser, Debug)]
#[command(
    name = "Stagehand App",
    about = "Stagehand lifecycle application",
    long_about = "A windowed application hosted by the Stagehand lifecycle shell.\n\n\
        The shell owns the window and event loop; background work runs on the\n\
        worker loop and is paced by --pacing. Press Escape to exit.\n\n\
        EXAMPLES:\n\
          # Default 1600x900 window\n\
          ./app\n\
        \n\
          # Small window with a sleeping worker\n\
          ./app --width 640 --height 480 --pacing sleep --poll-interval-ms 2\n\
        \n\
          # Automated smoke run\n\
          ./app --max-ticks 100",
    version
)]
struct ClapArgs {
    /// Initial window width in logical pixels.
    #[arg(long, default_value = "1600")]
    width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value = "900")]
    height: u32,

    /// Window title.
    #[arg(long, default_value = "Stagehand")]
    title: String,

    /// Worker loop pacing.
    #[arg(long, default_value = "yield", value_enum)]
    pacing: CliPacing,

    /// Sleep interval for '--pacing sleep', in milliseconds.
    #[arg(long, default_value = "1")]
    poll_interval_ms: u64,

    /// Exit after the worker ticks N times (useful for testing).
    #[arg(long)]
    max_ticks: Option<u64>,
}

/// Parsed shell arguments.
///
/// # Examples
///
/// ```bash
/// # Show help
/// ./my_app --help
///
/// # Custom window, sleeping worker
/// ./my_app --width 800 --height 600 --pacing sleep
///
/// # Run 100 worker ticks then exit (useful for testing)
/// ./my_app --max-ticks 100
/// ```
#[derive(Debug, Clone)]
pub struct ShellArgs {
    width: u32,
    height: u32,
    title: String,
    pacing: PollPacing,
    max_ticks: Option<u64>,
}

impl Default for ShellArgs {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
            title: "Stagehand".to_string(),
            pacing: PollPacing::default(),
            max_ticks: None,
        }
    }
}

impl ShellArgs {
    /// Parse from the process command line.
    pub fn parse() -> Self {
        ClapArgs::parse().into()
    }

    /// Create args with a custom title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the launch window size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the worker pacing.
    pub fn with_pacing(mut self, pacing: PollPacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the tick limit.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Launch window width in logical pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Launch window height in logical pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Window title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Worker pacing.
    pub fn pacing(&self) -> PollPacing {
        self.pacing
    }

    /// Tick limit, if any.
    pub fn max_ticks(&self) -> Option<u64> {
        self.max_ticks
    }

    /// Window configuration for the lifecycle controller.
    pub fn window_config(&self) -> WindowConfig {
        WindowConfig::new(self.title.clone()).with_launch_size(self.width, self.height)
    }
}

impl From<ClapArgs> for ShellArgs {
    fn from(args: ClapArgs) -> Self {
        let pacing = match args.pacing {
            CliPacing::Spin => PollPacing::Spin,
            CliPacing::Yield => PollPacing::Yield,
            CliPacing::Sleep => PollPacing::Sleep(Duration::from_millis(args.poll_interval_ms)),
        };
        Self {
            width: args.width,
            height: args.height,
            title: args.title,
            pacing,
            max_ticks: args.max_ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_launch_layout() {
        let args: ShellArgs = ClapArgs::try_parse_from(["app"]).unwrap().into();
        assert_eq!(args.width(), 1600);
        assert_eq!(args.height(), 900);
        assert_eq!(args.title(), "Stagehand");
        assert_eq!(args.pacing(), PollPacing::Yield);
        assert_eq!(args.max_ticks(), None);

        let config = args.window_config();
        assert_eq!(config.launch_size, (1600, 900));
        assert_eq!(config.min_size, (100, 100));
    }

    #[test]
    fn sleep_pacing_uses_poll_interval() {
        let args: ShellArgs = ClapArgs::try_parse_from([
            "app",
            "--pacing",
            "sleep",
            "--poll-interval-ms",
            "7",
        ])
        .unwrap()
        .into();
        assert_eq!(args.pacing(), PollPacing::Sleep(Duration::from_millis(7)));
    }

    #[test]
    fn size_and_tick_limit_flags() {
        let args: ShellArgs = ClapArgs::try_parse_from([
            "app",
            "--width",
            "640",
            "--height",
            "480",
            "--max-ticks",
            "25",
        ])
        .unwrap()
        .into();
        assert_eq!(args.width(), 640);
        assert_eq!(args.height(), 480);
        assert_eq!(args.max_ticks(), Some(25));
    }

    #[test]
    fn builder_style_construction() {
        let args = ShellArgs::with_title("Builder")
            .with_size(320, 240)
            .with_pacing(PollPacing::Spin)
            .with_max_ticks(5);
        assert_eq!(args.title(), "Builder");
        assert_eq!(args.width(), 320);
        assert_eq!(args.pacing(), PollPacing::Spin);
        assert_eq!(args.max_ticks(), Some(5));
    }
}
