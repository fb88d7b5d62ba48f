//! # Payload verbs.
//!
//! Payloads follow a loose `VERB [arguments]` convention. [`Command::parse`]
//! recognises the verbs the core and the built-in components understand and
//! hands everything else back as [`Command::Other`].
//!
//! Argument-less verbs match only by equality: a bounced `SHUTDOWN` carries
//! `SHUTDOWN UNRESOLVED 7` and must not be mistaken for a fresh request.
//!
//! ```rust
//! use actionbus::Command;
//!
//! assert_eq!(Command::parse("SHUTDOWN"), Command::Shutdown);
//! assert_eq!(Command::parse("PRINT hello there"), Command::Print("hello there"));
//! assert_eq!(
//!     Command::parse("PLAY_SOUND glados the cake"),
//!     Command::PlaySound { voice: "glados", text: "the cake" },
//! );
//! assert_eq!(Command::Print("hi").to_string(), "PRINT hi");
//! ```

use std::fmt;

/// Verb strings.
pub mod verbs {
    pub const SHUTDOWN: &str = "SHUTDOWN";
    pub const SHUTDOWN_COMPLETE: &str = "SHUTDOWN_COMPLETE";
    pub const UPDATE_IDS: &str = "UPDATE_IDS";
    pub const RELOAD: &str = "RELOAD";
    /// Sent by a worker to its own router once it has nothing left to do.
    pub const QUIESCED: &str = "QUIESCED";
    pub const PRINT: &str = "PRINT";
    pub const PLAY_SOUND: &str = "PLAY_SOUND";
    pub const OS: &str = "OS";
    pub const GET_PATH_TO: &str = "GET_PATH_TO";
    /// Answer to [`GET_PATH_TO`]: `PATH <subject> <path>`.
    pub const PATH: &str = "PATH";
}

/// Borrowed, parsed view of a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Shutdown,
    ShutdownComplete,
    UpdateIds,
    Reload,
    Quiesced,
    Print(&'a str),
    PlaySound { voice: &'a str, text: &'a str },
    Os(&'a str),
    GetPathTo(&'a str),
    Path { subject: &'a str, path: &'a str },
    /// Anything not recognised above (the whole trimmed payload).
    Other(&'a str),
}

impl<'a> Command<'a> {
    /// Parses `payload`. Never fails: unknown input becomes [`Command::Other`].
    pub fn parse(payload: &'a str) -> Self {
        let trimmed = payload.trim();
        let (verb, rest) = match trimmed.split_once(' ') {
            Some((verb, rest)) => (verb, rest.trim_start()),
            None => (trimmed, ""),
        };

        match verb {
            verbs::SHUTDOWN if rest.is_empty() => Command::Shutdown,
            verbs::SHUTDOWN_COMPLETE if rest.is_empty() => Command::ShutdownComplete,
            verbs::UPDATE_IDS if rest.is_empty() => Command::UpdateIds,
            verbs::RELOAD if rest.is_empty() => Command::Reload,
            verbs::QUIESCED if rest.is_empty() => Command::Quiesced,
            verbs::PRINT => Command::Print(rest),
            verbs::OS => Command::Os(rest),
            verbs::GET_PATH_TO if !rest.is_empty() => Command::GetPathTo(rest),
            verbs::PLAY_SOUND => match split_word(rest) {
                Some((voice, text)) => Command::PlaySound { voice, text },
                None => Command::Other(trimmed),
            },
            verbs::PATH => match split_word(rest) {
                Some((subject, path)) => Command::Path { subject, path },
                None => Command::Other(trimmed),
            },
            _ => Command::Other(trimmed),
        }
    }

    /// Verb of this command; `None` for [`Command::Other`].
    pub fn verb(&self) -> Option<&'static str> {
        Some(match self {
            Command::Shutdown => verbs::SHUTDOWN,
            Command::ShutdownComplete => verbs::SHUTDOWN_COMPLETE,
            Command::UpdateIds => verbs::UPDATE_IDS,
            Command::Reload => verbs::RELOAD,
            Command::Quiesced => verbs::QUIESCED,
            Command::Print(_) => verbs::PRINT,
            Command::PlaySound { .. } => verbs::PLAY_SOUND,
            Command::Os(_) => verbs::OS,
            Command::GetPathTo(_) => verbs::GET_PATH_TO,
            Command::Path { .. } => verbs::PATH,
            Command::Other(_) => return None,
        })
    }
}

/// Splits `"<word> <rest>"`; both parts must be non-empty.
fn split_word(s: &str) -> Option<(&str, &str)> {
    let (head, tail) = s.split_once(' ')?;
    let tail = tail.trim_start();
    if head.is_empty() || tail.is_empty() {
        return None;
    }
    Some((head, tail))
}

impl fmt::Display for Command<'_> {
    /// Renders the command back into payload form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Print(text) if text.is_empty() => f.write_str(verbs::PRINT),
            Command::Print(text) => write!(f, "{} {text}", verbs::PRINT),
            Command::PlaySound { voice, text } => write!(f, "{} {voice} {text}", verbs::PLAY_SOUND),
            Command::Os(name) if name.is_empty() => f.write_str(verbs::OS),
            Command::Os(name) => write!(f, "{} {name}", verbs::OS),
            Command::GetPathTo(subject) => write!(f, "{} {subject}", verbs::GET_PATH_TO),
            Command::Path { subject, path } => write!(f, "{} {subject} {path}", verbs::PATH),
            Command::Other(raw) => f.write_str(raw),
            plain => f.write_str(plain.verb().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_verbs_match_by_equality() {
        assert_eq!(Command::parse("SHUTDOWN"), Command::Shutdown);
        assert_eq!(Command::parse("  SHUTDOWN_COMPLETE \n"), Command::ShutdownComplete);
        assert_eq!(Command::parse("UPDATE_IDS"), Command::UpdateIds);
        assert_eq!(Command::parse("RELOAD"), Command::Reload);
        assert_eq!(Command::parse("QUIESCED"), Command::Quiesced);
        assert_eq!(
            Command::parse("SHUTDOWN UNRESOLVED 7"),
            Command::Other("SHUTDOWN UNRESOLVED 7")
        );
        assert_eq!(Command::parse("shutdown"), Command::Other("shutdown"));
    }

    #[test]
    fn test_verbs_with_arguments() {
        assert_eq!(Command::parse("PRINT"), Command::Print(""));
        assert_eq!(Command::parse("PRINT  two  spaces"), Command::Print("two  spaces"));
        assert_eq!(Command::parse("OS linux"), Command::Os("linux"));
        assert_eq!(Command::parse("GET_PATH_TO AUTO"), Command::GetPathTo("AUTO"));
        assert_eq!(Command::parse("GET_PATH_TO"), Command::Other("GET_PATH_TO"));
        assert_eq!(
            Command::parse("PATH AUTO /home/pi/resources/audio/AUTO/"),
            Command::Path {
                subject: "AUTO",
                path: "/home/pi/resources/audio/AUTO/"
            }
        );
    }

    #[test]
    fn test_play_sound_requires_voice_and_text() {
        assert_eq!(
            Command::parse("PLAY_SOUND auto hello world"),
            Command::PlaySound {
                voice: "auto",
                text: "hello world"
            }
        );
        assert_eq!(Command::parse("PLAY_SOUND auto"), Command::Other("PLAY_SOUND auto"));
    }

    #[test]
    fn test_display_renders_payload() {
        assert_eq!(Command::Shutdown.to_string(), "SHUTDOWN");
        assert_eq!(Command::Print("").to_string(), "PRINT");
        assert_eq!(
            Command::PlaySound {
                voice: "glados",
                text: "hi"
            }
            .to_string(),
            "PLAY_SOUND glados hi"
        );
        assert_eq!(Command::Other("NOPE 1").to_string(), "NOPE 1");
        let rendered = Command::GetPathTo("AUTO").to_string();
        assert_eq!(Command::parse(&rendered), Command::GetPathTo("AUTO"));
    }
}
