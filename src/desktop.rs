//! Desktop popup and sound invocation.
//!
//! Builds and spawns `notify-send` and `paplay` style commands. Output is
//! discarded and nothing is retried; each call reports its own result.

use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::config::Config;
use crate::domain::Notice;

const DEFAULT_NOTIFY_COMMAND: &str = "notify-send";
const DEFAULT_SOUND_COMMAND: &str = "paplay";

/// Failure of a single external command.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with code {code:?}")]
    Exited { command: String, code: Option<i32> },
}

/// Result of dispatching one notice.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub popup: Result<(), DispatchError>,
    /// `None` when the notice had no sound.
    pub sound: Option<Result<(), DispatchError>>,
}

impl DispatchOutcome {
    /// Returns true if every attempted call succeeded.
    pub fn is_success(&self) -> bool {
        self.popup.is_ok() && self.sound.as_ref().is_none_or(Result::is_ok)
    }

    /// Log each failed call.
    pub fn log_failures(&self) {
        if let Err(e) = &self.popup {
            warn!("Notification failed: {}", e);
        }
        if let Some(Err(e)) = &self.sound {
            warn!("Sound playback failed: {}", e);
        }
    }
}

/// Something that can show a notice to the user.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Show the popup and play the sound concurrently.
    ///
    /// Never fails as a whole; per-call failures are in the outcome.
    async fn dispatch(&self, notice: &Notice) -> DispatchOutcome;
}

/// Dispatcher that spawns external commands.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    notify_command: PathBuf,
    sound_command: PathBuf,
    dry_run: bool,
}

impl CommandDispatcher {
    /// Create a dispatcher from config.
    pub fn from_config(config: &Config) -> Self {
        let notify_command = config
            .notify_command
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_NOTIFY_COMMAND));
        let sound_command = config
            .sound_command
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOUND_COMMAND));

        Self {
            notify_command,
            sound_command,
            dry_run: config.dry_run,
        }
    }

    /// Warn about commands that cannot be found.
    ///
    /// Missing commands are not fatal: the daemon still runs and each
    /// dispatch reports the spawn failure.
    pub fn check_commands(&self) {
        for command in [&self.notify_command, &self.sound_command] {
            match which::which(command) {
                Ok(path) => info!("Using {}", path.display()),
                Err(e) => warn!("{} not usable: {}", command.display(), e),
            }
        }
    }

    async fn show_popup(&self, notice: &Notice) -> Result<(), DispatchError> {
        run(&self.notify_command, popup_args(notice), self.dry_run).await
    }

    async fn play_sound(&self, sound: &Path, volume: u32) -> Result<(), DispatchError> {
        run(&self.sound_command, sound_args(sound, volume), self.dry_run).await
    }
}

#[async_trait]
impl Dispatcher for CommandDispatcher {
    async fn dispatch(&self, notice: &Notice) -> DispatchOutcome {
        let popup = self.show_popup(notice);
        match notice.sound.as_deref() {
            Some(sound) => {
                let (popup, sound) = tokio::join!(popup, self.play_sound(sound, notice.volume));
                DispatchOutcome {
                    popup,
                    sound: Some(sound),
                }
            }
            None => DispatchOutcome {
                popup: popup.await,
                sound: None,
            },
        }
    }
}

/// Build arguments for the popup command: `[-i ICON] TITLE BODY`.
fn popup_args(notice: &Notice) -> Vec<OsString> {
    let mut args = Vec::with_capacity(4);
    if let Some(ref icon) = notice.icon {
        args.push(OsString::from("-i"));
        args.push(icon.clone().into_os_string());
    }
    args.push(OsString::from(&notice.title));
    args.push(OsString::from(&notice.body));
    args
}

/// Build arguments for the sound command: `--volume=N PATH`.
fn sound_args(sound: &Path, volume: u32) -> Vec<OsString> {
    vec![
        OsString::from(format!("--volume={volume}")),
        sound.as_os_str().to_owned(),
    ]
}

/// Spawn a command with all stdio discarded and wait for it.
async fn run(program: &Path, args: Vec<OsString>, dry_run: bool) -> Result<(), DispatchError> {
    let command = program.display().to_string();

    if dry_run {
        info!("[DRY RUN] Would execute: {} {}", command, display_args(&args));
        return Ok(());
    }

    debug!("Executing: {} {}", command, display_args(&args));

    let status = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| DispatchError::Spawn {
            command: command.clone(),
            source,
        })?;

    if status.success() {
        trace!("{} succeeded", command);
        Ok(())
    } else {
        Err(DispatchError::Exited {
            command,
            code: status.code(),
        })
    }
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| format!("{:?}", a.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(icon: Option<&str>, sound: Option<&str>) -> Notice {
        Notice {
            title: "opencode".to_string(),
            body: "Session idle".to_string(),
            icon: icon.map(PathBuf::from),
            sound: sound.map(PathBuf::from),
            volume: 45000,
        }
    }

    fn dispatcher(notify: &str, sound: &str) -> CommandDispatcher {
        CommandDispatcher {
            notify_command: PathBuf::from(notify),
            sound_command: PathBuf::from(sound),
            dry_run: false,
        }
    }

    #[test]
    fn test_popup_args_with_icon() {
        let args = popup_args(&notice(Some("/icons/bot.png"), None));
        assert_eq!(args, vec!["-i", "/icons/bot.png", "opencode", "Session idle"]);
    }

    #[test]
    fn test_popup_args_without_icon() {
        let args = popup_args(&notice(None, None));
        assert_eq!(args, vec!["opencode", "Session idle"]);
    }

    #[test]
    fn test_sound_args() {
        let args = sound_args(Path::new("/sounds/ding.oga"), 32768);
        assert_eq!(args, vec!["--volume=32768", "/sounds/ding.oga"]);
    }

    #[test]
    fn test_from_config_defaults() {
        let d = CommandDispatcher::from_config(&Config::default());
        assert_eq!(d.notify_command, PathBuf::from("notify-send"));
        assert_eq!(d.sound_command, PathBuf::from("paplay"));
        assert!(!d.dry_run);
    }

    #[tokio::test]
    async fn test_dry_run_succeeds_without_spawning() {
        let d = CommandDispatcher {
            dry_run: true,
            ..dispatcher("/nonexistent/notify", "/nonexistent/play")
        };
        let outcome = d.dispatch(&notice(None, Some("/sounds/ding.oga"))).await;
        assert!(outcome.is_success());
        assert!(outcome.sound.is_some());
    }

    #[tokio::test]
    async fn test_successful_commands() {
        let d = dispatcher("true", "true");
        let outcome = d.dispatch(&notice(Some("/icons/bot.png"), Some("/s.oga"))).await;
        assert!(outcome.popup.is_ok());
        assert!(matches!(outcome.sound, Some(Ok(()))));
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_failures_are_independent() {
        let d = dispatcher("/nonexistent/notify-send", "true");
        let outcome = d.dispatch(&notice(None, Some("/s.oga"))).await;
        assert!(matches!(outcome.popup, Err(DispatchError::Spawn { .. })));
        assert!(matches!(outcome.sound, Some(Ok(()))));
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported() {
        let d = dispatcher("false", "false");
        let outcome = d.dispatch(&notice(None, Some("/s.oga"))).await;
        assert!(matches!(
            outcome.popup,
            Err(DispatchError::Exited { code: Some(1), .. })
        ));
        assert!(matches!(
            outcome.sound,
            Some(Err(DispatchError::Exited { .. }))
        ));
    }

    #[tokio::test]
    async fn test_silent_notice_skips_sound() {
        let d = dispatcher("true", "/nonexistent/paplay");
        let outcome = d.dispatch(&notice(None, None)).await;
        assert!(outcome.sound.is_none());
        assert!(outcome.is_success());
    }
}
