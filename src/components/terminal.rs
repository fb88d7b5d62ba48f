//! # Terminal: the human-facing leaf.
//!
//! [`TerminalManager`] prints `PRINT` payloads and bounce notices.
//! [`terminal_input`] is its worker: it reads lines, maps them to
//! envelopes with [`TerminalInput::parse`] and stops reading once the router
//! leaves the active state.
//!
//! ```text
//! help                        list commands
//! shutdown                    SHUTDOWN           ─► dispatcher
//! reload | read component list RELOAD            ─► dispatcher
//! os                          OS <this os>       ─► FileManager
//! path <subject>              GET_PATH_TO <s>    ─► FileManager
//! play sound <voice> <text>   PLAY_SOUND <v> <t> ─► SoundManager
//! send <address> <payload>    <payload>          ─► <address>
//! ```

use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::address::Address;
use crate::envelope::{verbs, Command, Envelope};
use crate::error::WorkerError;
use crate::routing::{Component, Drain, Handled, LifecycleFlag, RouteCtx};
use crate::workers::{WorkerFn, WorkerRef};

use super::names;
use super::outbox::Outbox;

const HELP: &[(&str, &str)] = &[
    ("help", "list the available commands"),
    ("shutdown", "stop every component and exit"),
    ("read component list", "re-read the component table (alias: reload)"),
    ("os", "tell the file manager which OS this is"),
    ("path <subject>", "ask the file manager for a path"),
    ("play sound <voice> <text>", "say <text> with <voice>"),
    ("send <address> <payload>", "send a raw payload"),
];

/// One parsed line of terminal input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TerminalInput {
    Help,
    Shutdown,
    Reload,
    Os,
    PathTo(String),
    PlaySound { voice: String, text: String },
    Send { target: Address, payload: String },
    Unknown(String),
}

impl TerminalInput {
    /// Parses one line; keywords are case-insensitive. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let lower = line.to_ascii_lowercase();
        let words: Vec<&str> = line.split_whitespace().collect();

        let input = match lower.as_str() {
            "help" => Self::Help,
            "shutdown" => Self::Shutdown,
            "reload" | "read component list" => Self::Reload,
            "os" => Self::Os,
            _ if lower.starts_with("play sound ") && words.len() >= 4 => Self::PlaySound {
                voice: words[2].to_ascii_uppercase(),
                text: words[3..].join(" "),
            },
            _ if lower.starts_with("path ") && words.len() >= 2 => {
                Self::PathTo(words[1..].join(" "))
            }
            _ if lower.starts_with("send ") && words.len() >= 3 => {
                match words[1].parse::<Address>() {
                    Ok(target) => Self::Send {
                        target,
                        payload: words[2..].join(" "),
                    },
                    Err(_) => Self::Unknown(line.to_string()),
                }
            }
            _ => Self::Unknown(line.to_string()),
        };
        Some(input)
    }

    /// Sends whatever this input asks for. Returns `false` if nothing was
    /// enqueued.
    pub fn submit(self, outbox: &Outbox) -> bool {
        match self {
            Self::Help => {
                let mut text = String::from("available commands:");
                for (cmd, what) in HELP {
                    text.push_str(&format!("\n  {cmd:<28} {what}"));
                }
                outbox.send_self(Command::Print(&text).to_string())
            }
            Self::Shutdown => outbox.send_to_dispatcher(verbs::SHUTDOWN),
            Self::Reload => outbox.send_to_dispatcher(verbs::RELOAD),
            Self::Os => outbox.send_to(
                names::FILE_MANAGER,
                Command::Os(std::env::consts::OS).to_string(),
            ),
            Self::PathTo(subject) => outbox.send_to(
                names::FILE_MANAGER,
                Command::GetPathTo(&subject).to_string(),
            ),
            Self::PlaySound { voice, text } => outbox.send_to(
                names::SOUND_MANAGER,
                Command::PlaySound {
                    voice: &voice,
                    text: &text,
                }
                .to_string(),
            ),
            Self::Send { target, payload } => outbox.send_to_address(target, payload),
            Self::Unknown(line) => {
                outbox.send_self(format!("{} unknown command `{line}`; type help", verbs::PRINT))
            }
        }
    }
}

/// Prints what reaches the terminal router.
pub struct TerminalManager {
    out: Box<dyn Write + Send>,
}

impl TerminalManager {
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    fn print(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            warn!(error = %e, "terminal write failed");
        }
    }
}

impl Component for TerminalManager {
    fn handle(&mut self, env: &Envelope, cmd: Command<'_>, _ctx: &RouteCtx<'_>) -> Handled {
        if env.is_bounce() {
            self.print(&format!("not delivered ({} attempts): {}", env.error_count, env.payload));
            return Handled::Done;
        }
        match cmd {
            Command::Print(text) => self.print(text),
            Command::Path { subject, path } => self.print(&format!("{subject}: {path}")),
            _ => return Handled::Unknown,
        }
        Handled::Done
    }

    fn on_shutdown(&mut self, _ctx: &RouteCtx<'_>) -> Drain {
        let _ = self.out.flush();
        Drain::Done
    }
}

/// Worker reading terminal lines from the reader `open` returns.
///
/// End of input ends the loop normally; a read error is retryable. The loop
/// also ends once `flag` leaves the active state.
pub fn terminal_input<F, R>(outbox: Outbox, flag: LifecycleFlag, open: F) -> WorkerRef
where
    F: Fn() -> R + Send + Sync + 'static,
    R: AsyncRead + Unpin + Send + 'static,
{
    WorkerFn::arc("terminal-input", move |token: CancellationToken| {
        let outbox = outbox.clone();
        let flag = flag.clone();
        let mut lines = BufReader::new(open()).lines();
        async move {
            while flag.is_active() {
                let line = tokio::select! {
                    _ = token.cancelled() => return Err(WorkerError::Canceled),
                    line = lines.next_line() => line?,
                };
                let Some(line) = line else {
                    debug!("terminal input closed");
                    return Ok(());
                };
                if !flag.is_active() {
                    debug!(line = %line, "input after shutdown ignored");
                    break;
                }
                if let Some(input) = TerminalInput::parse(&line) {
                    input.submit(&outbox);
                }
            }
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(TerminalInput::parse("HELP"), Some(TerminalInput::Help));
        assert_eq!(TerminalInput::parse(" shutdown "), Some(TerminalInput::Shutdown));
        assert_eq!(
            TerminalInput::parse("Read Component List"),
            Some(TerminalInput::Reload)
        );
        assert_eq!(TerminalInput::parse(""), None);
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(
            TerminalInput::parse("play sound glados the cake is a lie"),
            Some(TerminalInput::PlaySound {
                voice: "GLADOS".into(),
                text: "the cake is a lie".into()
            })
        );
        assert_eq!(
            TerminalInput::parse("send 210 GET_PATH_TO AUTO"),
            Some(TerminalInput::Send {
                target: Address::new(210),
                payload: "GET_PATH_TO AUTO".into()
            })
        );
        assert_eq!(
            TerminalInput::parse("send abc PING"),
            Some(TerminalInput::Unknown("send abc PING".into()))
        );
        assert_eq!(
            TerminalInput::parse("play sound glados"),
            Some(TerminalInput::Unknown("play sound glados".into()))
        );
    }
}
