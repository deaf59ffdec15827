pub mod file_dialogs;
pub mod main_window;
pub mod menu;
pub mod settings_panel;
pub mod theme;
pub mod view;

use std::time::Duration;

use fltk::app::{self, Sender};

use crate::app::domain::messages::Message;
use crate::app::runtime::EventSink;

/// Delivers worker results through the FLTK channel and arms timers on the
/// FLTK event loop.
#[derive(Clone, Copy)]
pub struct FltkSink {
    sender: Sender<Message>,
}

impl FltkSink {
    pub fn new(sender: Sender<Message>) -> Self {
        Self { sender }
    }
}

impl EventSink for FltkSink {
    fn post(&self, message: Message) {
        self.sender.send(message);
        app::awake();
    }

    fn post_after(&self, delay: Duration, message: Message) {
        let s = self.sender;
        let mut pending = Some(message);
        app::add_timeout3(delay.as_secs_f64(), move |_| {
            if let Some(message) = pending.take() {
                s.send(message);
            }
        });
    }
}
