#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use actionbus::{Command, Component, Envelope, Event, EventKind, Handled, RouteCtx, Subscribe};
use async_trait::async_trait;

/// Leaf that records every envelope handed to it.
#[derive(Clone, Default)]
pub struct Inbox(Arc<Mutex<Vec<Envelope>>>);

impl Inbox {
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.0.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|e| e.payload.clone()).collect()
    }
}

impl Component for Inbox {
    fn handle(&mut self, env: &Envelope, _cmd: Command<'_>, _ctx: &RouteCtx<'_>) -> Handled {
        self.0.lock().unwrap().push(env.clone());
        Handled::Done
    }
}

/// Subscriber keeping every event kind it sees.
#[derive(Default)]
pub struct EventLog(Mutex<Vec<Event>>);

impl EventLog {
    pub fn count(&self, kind: EventKind) -> usize {
        self.0.lock().unwrap().iter().filter(|e| e.kind == kind).count()
    }

    pub fn names(&self, kind: EventKind) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .filter_map(|e| e.name.as_deref().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Subscribe for EventLog {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().unwrap().push(ev.clone());
    }

    fn name(&self) -> &'static str {
        "event-log"
    }
}

/// `Write` target shared with the test.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub const TABLE: &str = "\
// test tree
0 Dispatcher
1 Glados
110 TerminalManager
2 Auto
210 FileManager
3 SoundManager
";
