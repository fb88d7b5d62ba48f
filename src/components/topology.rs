use std::sync::Arc;

use crate::routing::{LifecycleFlag, Node};
use crate::runtime::{RuntimeBuilder, Topology};

use super::files::FileManager;
use super::hub::hub;
use super::names;
use super::outbox::Outbox;
use super::sound::{playback, SoundManager, SoundQueue};
use super::terminal::{terminal_input, TerminalManager};

/// The assistant's tree, matching `resources/componentList.txt`:
///
/// ```text
/// Dispatcher (0)
/// ├── Glados (1)                 width 1
/// │   └── TerminalManager (110)  width 2   + terminal-input worker
/// ├── Auto (2)                   width 1
/// │   └── FileManager (210)      width 2
/// └── SoundManager (3)           width 1   + sound-playback worker
/// ```
///
/// The terminal reads stdin and prints to stdout.
pub fn default_topology(builder: &RuntimeBuilder) -> Topology {
    let dispatcher = builder.config().dispatcher_name.clone();
    let outbox = |name: &str| {
        Outbox::new(
            builder.bus().clone(),
            Arc::clone(builder.registry()),
            name,
            dispatcher.as_str(),
        )
    };

    let terminal_flag = LifecycleFlag::new();
    let terminal = Node::new(names::TERMINAL_MANAGER, 2)
        .with_lifecycle(terminal_flag.clone())
        .with_component(TerminalManager::stdout());

    let sound_flag = LifecycleFlag::new();
    let queue = SoundQueue::new();
    let sound = Node::new(names::SOUND_MANAGER, 1)
        .with_lifecycle(sound_flag.clone())
        .with_component(SoundManager::new(queue.clone()));

    let files = Node::new(names::FILE_MANAGER, 2).with_component(FileManager::new());

    Topology {
        children: vec![
            hub(names::GLADOS, 1, vec![terminal]),
            hub(names::AUTO, 1, vec![files]),
            sound,
        ],
        workers: vec![
            terminal_input(outbox(names::TERMINAL_MANAGER), terminal_flag, tokio::io::stdin),
            playback(outbox(names::SOUND_MANAGER), queue, sound_flag),
        ],
    }
}
