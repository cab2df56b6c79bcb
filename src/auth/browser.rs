//! Opening the authorization URL in the user's browser

use crate::error::TrelloAuthError;

/// Something that can send the user to a URL.
///
/// The coordinator only needs "try to open this"; failures are non-fatal
/// because the URL is always printed for manual use as well.
pub trait BrowserLauncher: Send + Sync {
    /// Attempts to open `url`.
    ///
    /// # Errors
    ///
    /// Returns [`TrelloAuthError::BrowserLaunch`] when no browser could be
    /// started.
    fn open(&self, url: &str) -> Result<(), TrelloAuthError>;
}

/// Launches the platform's default browser.
///
/// Uses `open` on macOS, `xdg-open` on Linux and `cmd /C start` on Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), TrelloAuthError> {
        let mut command = platform_command(url)?;
        command
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        command
            .spawn()
            .map(|_| ())
            .map_err(|e| TrelloAuthError::BrowserLaunch(e.to_string()))
    }
}

#[cfg(target_os = "macos")]
fn platform_command(url: &str) -> Result<std::process::Command, TrelloAuthError> {
    let mut command = std::process::Command::new("open");
    command.arg(url);
    Ok(command)
}

#[cfg(target_os = "linux")]
fn platform_command(url: &str) -> Result<std::process::Command, TrelloAuthError> {
    let mut command = std::process::Command::new("xdg-open");
    command.arg(url);
    Ok(command)
}

#[cfg(target_os = "windows")]
fn platform_command(url: &str) -> Result<std::process::Command, TrelloAuthError> {
    // The empty argument is the window title `start` expects first.
    let mut command = std::process::Command::new("cmd");
    command.args(["/C", "start", "", url]);
    Ok(command)
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn platform_command(_url: &str) -> Result<std::process::Command, TrelloAuthError> {
    Err(TrelloAuthError::BrowserLaunch(
        "no known browser launcher for this platform".to_string(),
    ))
}

/// A launcher that never opens anything.
///
/// Used for headless sessions (`--no-browser`); the operator follows the
/// printed URL instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBrowser;

impl BrowserLauncher for NoBrowser {
    fn open(&self, _url: &str) -> Result<(), TrelloAuthError> {
        Err(TrelloAuthError::BrowserLaunch(
            "browser launch disabled".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_browser_reports_launch_error() {
        let err = NoBrowser.open("https://trello.com").unwrap_err();
        assert!(matches!(err, TrelloAuthError::BrowserLaunch(_)));
    }
}
