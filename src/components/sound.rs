//! # Sound output.
//!
//! [`SoundManager`] queues utterances; [`playback`] is the worker that
//! "plays" them one after another. Synthesis is not done here: an utterance
//! is logged and takes `word_time` per word.
//!
//! Shutdown waits for the queue: `on_shutdown` reports [`Drain::Pending`]
//! while anything is queued or playing, and the worker sends `QUIESCED` to
//! its router after the last utterance.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::envelope::{verbs, Command, Envelope};
use crate::error::WorkerError;
use crate::routing::{Component, Drain, Handled, Lifecycle, LifecycleFlag, RouteCtx};
use crate::workers::{WorkerFn, WorkerRef};

use super::outbox::Outbox;

/// Voices the sound manager accepts.
pub const VOICES: &[&str] = &["GLADOS", "AUTO"];

const WORD_TIME: Duration = Duration::from_millis(60);

/// One queued sentence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utterance {
    pub voice: String,
    pub text: String,
}

#[derive(Default)]
struct State {
    queue: VecDeque<Utterance>,
    playing: bool,
    folders: HashMap<String, PathBuf>,
}

/// Queue shared by [`SoundManager`] and its [`playback`] worker.
#[derive(Clone, Default)]
pub struct SoundQueue {
    state: Arc<Mutex<State>>,
    wake: Arc<Notify>,
}

impl SoundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, utterance: Utterance) {
        self.lock().queue.push_back(utterance);
        self.wake.notify_one();
    }

    /// Queued utterances, not counting the one playing.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when nothing is queued or playing.
    pub fn is_idle(&self) -> bool {
        let state = self.lock();
        state.queue.is_empty() && !state.playing
    }

    pub fn folder(&self, voice: &str) -> Option<PathBuf> {
        self.lock().folders.get(voice).cloned()
    }

    fn set_folder(&self, voice: &str, path: PathBuf) {
        self.lock().folders.insert(voice.to_string(), path);
    }

    /// Takes the head and marks it playing.
    fn start_next(&self) -> Option<Utterance> {
        let mut state = self.lock();
        let next = state.queue.pop_front();
        state.playing = next.is_some();
        next
    }

    /// Clears the playing mark; returns `true` if the queue is now idle.
    fn finish(&self) -> bool {
        let mut state = self.lock();
        state.playing = false;
        state.queue.is_empty()
    }
}

/// Leaf accepting `PLAY_SOUND <voice> <text>` and `PATH <voice> <folder>`.
pub struct SoundManager {
    queue: SoundQueue,
}

impl SoundManager {
    pub fn new(queue: SoundQueue) -> Self {
        Self { queue }
    }
}

impl Component for SoundManager {
    fn handle(&mut self, env: &Envelope, cmd: Command<'_>, ctx: &RouteCtx<'_>) -> Handled {
        match cmd {
            Command::PlaySound { voice, text } => {
                let voice = voice.to_ascii_uppercase();
                if !VOICES.contains(&voice.as_str()) {
                    let _ = ctx.reply(env, env.target, format!("{} unknown voice {voice}", verbs::PRINT));
                    return Handled::Done;
                }
                self.queue.push(Utterance {
                    voice,
                    text: text.replace(',', ""),
                });
                Handled::Done
            }
            Command::Path { subject, path } => {
                self.queue
                    .set_folder(&subject.to_ascii_uppercase(), PathBuf::from(path));
                Handled::Done
            }
            _ => Handled::Unknown,
        }
    }

    fn on_shutdown(&mut self, _ctx: &RouteCtx<'_>) -> Drain {
        if self.queue.is_idle() {
            Drain::Done
        } else {
            debug!(queued = self.queue.len(), "sound queue draining");
            Drain::Pending
        }
    }

    fn is_drained(&self) -> bool {
        self.queue.is_idle()
    }
}

/// Worker playing the queue until the router stops.
pub fn playback(outbox: Outbox, queue: SoundQueue, flag: LifecycleFlag) -> WorkerRef {
    playback_with(outbox, queue, flag, WORD_TIME)
}

/// [`playback`] with an explicit time per word.
pub fn playback_with(
    outbox: Outbox,
    queue: SoundQueue,
    flag: LifecycleFlag,
    word_time: Duration,
) -> WorkerRef {
    WorkerFn::arc("sound-playback", move |token: CancellationToken| {
        let outbox = outbox.clone();
        let queue = queue.clone();
        let flag = flag.clone();
        async move {
            loop {
                let utterance = match queue.start_next() {
                    Some(utterance) => utterance,
                    None => {
                        if flag.is_stopped() {
                            return Ok(());
                        }
                        tokio::select! {
                            _ = queue.wake.notified() => {}
                            _ = token.cancelled() => return Err(WorkerError::Canceled),
                        }
                        continue;
                    }
                };

                let folder = queue.folder(&utterance.voice);
                info!(
                    voice = %utterance.voice,
                    text = %utterance.text,
                    folder = ?folder,
                    "playing utterance"
                );
                let words = utterance.text.split_whitespace().count().max(1) as u32;
                tokio::select! {
                    _ = tokio::time::sleep(word_time * words) => {}
                    _ = token.cancelled() => {
                        queue.finish();
                        return Err(WorkerError::Canceled);
                    }
                }

                if queue.finish() && flag.get() == Lifecycle::Draining {
                    outbox.send_self(verbs::QUIESCED);
                }
            }
        }
    })
}
