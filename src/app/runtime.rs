//! Runs the effects requested by the session controller.
//!
//! Network calls and file writes happen on worker threads; their results come
//! back to the controller as `Message`s through an `EventSink`.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::app::controllers::session::{Effect, TransferJob};
use crate::app::domain::messages::Message;
use crate::app::infrastructure::error::Result;
use crate::app::services::api::{GenerateRequest, RenderService};

/// Where worker threads and timers deliver their messages.
pub trait EventSink: Clone + Send + 'static {
    fn post(&self, message: Message);

    /// Deliver `message` after `delay`. The default parks a thread; GUI sinks
    /// override this with their own timer.
    fn post_after(&self, delay: Duration, message: Message) {
        let sink = self.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            sink.post(message);
        });
    }
}

impl EventSink for std::sync::mpsc::Sender<Message> {
    fn post(&self, message: Message) {
        if self.send(message).is_err() {
            log::debug!("event receiver dropped");
        }
    }
}

/// What `Executor::run` asks of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Executor<S: EventSink> {
    service: Arc<dyn RenderService>,
    sink: S,
    generate_cancel: Option<(u64, Arc<AtomicBool>)>,
}

impl<S: EventSink> Executor<S> {
    pub fn new(service: Arc<dyn RenderService>, sink: S) -> Self {
        Self {
            service,
            sink,
            generate_cancel: None,
        }
    }

    pub fn run(&mut self, effects: Vec<Effect>) -> Flow {
        let mut flow = Flow::Continue;
        for effect in effects {
            if self.run_one(effect) == Flow::Quit {
                flow = Flow::Quit;
            }
        }
        flow
    }

    fn run_one(&mut self, effect: Effect) -> Flow {
        match effect {
            Effect::FetchFonts => {
                self.spawn(|service| Message::FontsLoaded(service.fonts()));
            }
            Effect::ArmPreviewTimer { key, delay } => {
                self.sink.post_after(delay, Message::PreviewTimer(key));
            }
            Effect::ArmGenerateTimeout { ticket, delay } => {
                self.sink.post_after(delay, Message::GenerateTimeout(ticket));
            }
            Effect::FetchPreview { seq, text } => {
                self.spawn(move |service| Message::PreviewLoaded {
                    seq,
                    result: service.preview(&text),
                });
            }
            Effect::Generate { ticket, request } => self.generate(ticket, request),
            Effect::CancelGenerate { ticket } => {
                if let Some((current, flag)) = &self.generate_cancel {
                    if *current == ticket {
                        flag.store(true, Ordering::SeqCst);
                        log::debug!("generation {} abandoned", ticket);
                    }
                }
            }
            Effect::Transfer(job) => {
                self.spawn(move |service| Message::TransferFinished(transfer(service, &job)));
            }
            Effect::AutoStructure { text } => {
                self.spawn(move |service| {
                    let result = service.auto_structure(&text);
                    Message::AutoStructured {
                        source: text,
                        result,
                    }
                });
            }
            Effect::OpenArtifact { artifact } => {
                let url = self.service.artifact_url(&artifact);
                if let Err(e) = open::that(&url) {
                    log::warn!("could not open {}: {}", url, e);
                }
            }
            Effect::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn spawn<F>(&self, work: F)
    where
        F: FnOnce(&dyn RenderService) -> Message + Send + 'static,
    {
        let service = self.service.clone();
        let sink = self.sink.clone();
        thread::spawn(move || sink.post(work(service.as_ref())));
    }

    /// The HTTP call itself cannot be interrupted; cancelling only suppresses
    /// its result.
    fn generate(&mut self, ticket: u64, request: GenerateRequest) {
        let cancelled = Arc::new(AtomicBool::new(false));
        if let Some((_, previous)) = self.generate_cancel.replace((ticket, cancelled.clone())) {
            previous.store(true, Ordering::SeqCst);
        }
        let service = self.service.clone();
        let sink = self.sink.clone();
        thread::spawn(move || {
            let result = service.generate(&request);
            if cancelled.load(Ordering::SeqCst) {
                log::debug!("dropping result of abandoned generation {}", ticket);
                return;
            }
            sink.post(Message::GenerateFinished { ticket, result });
        });
    }
}

fn transfer(service: &dyn RenderService, job: &TransferJob) -> Result<PathBuf> {
    let (bytes, dest) = match job {
        TransferJob::Download { artifact, dest } => (service.download(artifact)?, dest),
        TransferJob::Export {
            artifact,
            format,
            scan,
            dest,
        } => (service.export(artifact, *format, *scan)?, dest),
    };
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, bytes)?;
    log::info!("saved {}", dest.display());
    Ok(dest.clone())
}
