use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::envelope::{Command, Envelope};
use crate::routing::{Component, Handled, RouteCtx};

use super::names;

const UNIX_HOME: &str = "/home/pi/";

/// Sound folders relative to the home path, per voice.
const VOICE_DIRS: &[(&str, &str)] = &[
    ("AUTO", "resources/audio/AUTO/"),
    ("GLADOS", "resources/audio/GLaDOS/"),
];

/// Knows where files live.
///
/// - `OS <name>` fixes the home path (working directory on Windows, the
///   configured unix home elsewhere) and pushes the voice folders to the
///   sound manager.
/// - `GET_PATH_TO <subject>` is answered with `PATH <subject> <path>`.
pub struct FileManager {
    home: Option<PathBuf>,
    unix_home: PathBuf,
}

impl FileManager {
    pub fn new() -> Self {
        Self {
            home: None,
            unix_home: PathBuf::from(UNIX_HOME),
        }
    }

    /// Home path used on every OS except Windows.
    #[must_use]
    pub fn with_unix_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.unix_home = home.into();
        self
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Path for `subject`, if it names a known voice.
    pub fn path_to(&self, subject: &str) -> Option<PathBuf> {
        let upper = subject.to_ascii_uppercase();
        let (_, rel) = VOICE_DIRS.iter().find(|(voice, _)| upper.contains(voice))?;
        let home = self.home.as_deref().unwrap_or(&self.unix_home);
        Some(home.join(rel))
    }

    fn set_os(&mut self, os: &str) {
        let home = if os.to_ascii_lowercase().contains("windows") {
            match std::env::current_dir() {
                Ok(dir) => dir,
                Err(e) => {
                    warn!(error = %e, "no working directory; keeping the unix home");
                    self.unix_home.clone()
                }
            }
        } else {
            self.unix_home.clone()
        };
        info!(os, home = %home.display(), "home path set");
        self.home = Some(home);
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for FileManager {
    fn handle(&mut self, env: &Envelope, cmd: Command<'_>, ctx: &RouteCtx<'_>) -> Handled {
        let own = env.target;
        match cmd {
            Command::Os(os) => {
                self.set_os(os);
                let sound = ctx.registry().address_of(names::SOUND_MANAGER);
                if sound.is_assigned() {
                    for (voice, _) in VOICE_DIRS {
                        if let Some(path) = self.path_to(voice) {
                            let path = path.display().to_string();
                            let payload = Command::Path {
                                subject: voice,
                                path: &path,
                            };
                            let _ = ctx.send(Envelope::new(sound, own, payload.to_string()));
                        }
                    }
                }
                Handled::Done
            }
            Command::GetPathTo(subject) => {
                let answer = match self.path_to(subject) {
                    Some(path) => Command::Path {
                        subject,
                        path: &path.display().to_string(),
                    }
                    .to_string(),
                    None => format!("PRINT no path known for {subject}"),
                };
                let _ = ctx.reply(env, own, answer);
                Handled::Done
            }
            _ => Handled::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_to_known_voices() {
        let fm = FileManager::new().with_unix_home("/srv/aas");
        assert_eq!(
            fm.path_to("glados"),
            Some(PathBuf::from("/srv/aas/resources/audio/GLaDOS/"))
        );
        assert_eq!(
            fm.path_to("AUTO"),
            Some(PathBuf::from("/srv/aas/resources/audio/AUTO/"))
        );
        assert_eq!(fm.path_to("weather"), None);
    }

    #[test]
    fn test_os_sets_home() {
        let mut fm = FileManager::new().with_unix_home("/srv/aas");
        assert!(fm.home().is_none());
        fm.set_os("linux");
        assert_eq!(fm.home(), Some(Path::new("/srv/aas")));
    }
}
