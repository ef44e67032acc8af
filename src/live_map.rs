use crate::config::LiveMapConfig;
use crate::error::LaunchError;
use std::process::{Child, Command, Stdio};
use tracing::{debug, info};

/// A window showing the live traffic map
pub trait WindowHandle {
    fn is_open(&mut self) -> bool;
}

/// Opens a URL in a new external window
pub trait Launcher {
    fn launch(&self, url: &str) -> Result<Box<dyn WindowHandle>, LaunchError>;
}

/// Runs an external program with the URL as last argument.
/// The window counts as open for as long as that process lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLauncher {
    program: String,
    args: Vec<String>,
}

impl CommandLauncher {
    /// First element is the program, the rest are leading arguments
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn platform_default() -> Option<Self> {
        let command: &[&str] = if cfg!(target_os = "macos") {
            &["open"]
        } else if cfg!(target_os = "windows") {
            &["cmd", "/C", "start", ""]
        } else if cfg!(unix) {
            &["xdg-open"]
        } else {
            return None;
        };
        let command: Vec<String> = command.iter().map(|s| s.to_string()).collect();
        Self::new(&command)
    }

    pub fn from_config(config: &LiveMapConfig) -> Option<Self> {
        match &config.launcher {
            Some(command) => Self::new(command),
            None => Self::platform_default(),
        }
    }
}

struct ChildWindow(Child);

impl WindowHandle for ChildWindow {
    fn is_open(&mut self) -> bool {
        matches!(self.0.try_wait(), Ok(None))
    }
}

impl Launcher for CommandLauncher {
    fn launch(&self, url: &str) -> Result<Box<dyn WindowHandle>, LaunchError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                command: self.program.clone(),
                source,
            })?;
        Ok(Box::new(ChildWindow(child)))
    }
}

/// Launcher used when nothing can open URLs on this platform
struct NoLauncher;

impl Launcher for NoLauncher {
    fn launch(&self, _url: &str) -> Result<Box<dyn WindowHandle>, LaunchError> {
        Err(LaunchError::NoLauncher)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    Opened,
    AlreadyOpen,
}

/// Owner of the single live traffic map window
pub struct LiveMapWindow {
    url: String,
    launcher: Box<dyn Launcher>,
    window: Option<Box<dyn WindowHandle>>,
}

impl LiveMapWindow {
    pub fn new(url: impl Into<String>, launcher: Box<dyn Launcher>) -> Self {
        Self {
            url: url.into(),
            launcher,
            window: None,
        }
    }

    pub fn from_config(config: &LiveMapConfig) -> Self {
        let launcher: Box<dyn Launcher> = match CommandLauncher::from_config(config) {
            Some(launcher) => Box::new(launcher),
            None => Box::new(NoLauncher),
        };
        Self::new(config.url.clone(), launcher)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_open(&mut self) -> bool {
        self.window.as_mut().is_some_and(|w| w.is_open())
    }

    /// Forget the window once it has closed, reaping the launcher process
    pub fn refresh(&mut self) {
        if self.window.is_some() && !self.is_open() {
            debug!("live traffic map window closed");
            self.window = None;
        }
    }

    /// Open the window, or leave the existing one in place
    pub fn open_or_activate(&mut self) -> Result<WindowStatus, LaunchError> {
        if self.is_open() {
            debug!("live traffic map already open");
            return Ok(WindowStatus::AlreadyOpen);
        }
        info!(url = %self.url, "opening live traffic map");
        self.window = Some(self.launcher.launch(&self.url)?);
        Ok(WindowStatus::Opened)
    }
}
