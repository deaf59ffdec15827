use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quill_pad::app::controllers::preview::PreviewPane;
use quill_pad::app::services::api::{ArtifactId, ExportFormat, GenerateRequest, PreviewLine};
use quill_pad::app::{
    AppError, ClientConfig, Executor, Flow, FontChoice, MemoryStorage, Message, RenderService,
    Result, SessionController, SessionState,
};

/// Render service double that records what it was asked.
#[derive(Default)]
struct FakeService {
    previews: Mutex<Vec<String>>,
    generated: Mutex<Vec<String>>,
    generate_delay: Option<Duration>,
}

impl RenderService for FakeService {
    fn fonts(&self) -> Result<Vec<String>> {
        Err(AppError::Transport("fonts endpoint missing".to_string()))
    }

    fn preview(&self, text: &str) -> Result<Vec<PreviewLine>> {
        self.previews.lock().unwrap().push(text.to_string());
        Ok(text
            .lines()
            .map(|l| PreviewLine {
                kind: "answer".to_string(),
                content: l.to_string(),
            })
            .collect())
    }

    fn generate(&self, request: &GenerateRequest) -> Result<ArtifactId> {
        if let Some(delay) = self.generate_delay {
            std::thread::sleep(delay);
        }
        self.generated.lock().unwrap().push(request.text.clone());
        ArtifactId::parse("sheet1.pdf")
    }

    fn download(&self, _artifact: &ArtifactId) -> Result<Vec<u8>> {
        Ok(b"%PDF-1.7 fake".to_vec())
    }

    fn export(&self, _artifact: &ArtifactId, _format: ExportFormat, _scan: bool) -> Result<Vec<u8>> {
        Err(AppError::Server("Export not supported".to_string()))
    }

    fn auto_structure(&self, text: &str) -> Result<String> {
        Ok(format!("1. {}", text))
    }

    fn artifact_url(&self, artifact: &ArtifactId) -> String {
        format!("http://localhost/generated/{}", artifact.as_str())
    }
}

struct Harness {
    session: SessionController,
    executor: Executor<Sender<Message>>,
    rx: Receiver<Message>,
    service: Arc<FakeService>,
}

impl Harness {
    fn new(service: FakeService, config: ClientConfig) -> Self {
        let service = Arc::new(service);
        let (tx, rx) = mpsc::channel();
        let session = SessionController::new(config, Arc::new(MemoryStorage::new()), false);
        let executor = Executor::new(service.clone(), tx);
        Self {
            session,
            executor,
            rx,
            service,
        }
    }

    fn send(&mut self, message: Message) {
        let effects = self.session.handle(message);
        assert_eq!(self.executor.run(effects), Flow::Continue);
    }

    /// Pump messages until nothing arrives for `idle`.
    fn settle(&mut self, idle: Duration) {
        while let Ok(message) = self.rx.recv_timeout(idle) {
            self.send(message);
        }
    }
}

fn fast_config(dir: PathBuf) -> ClientConfig {
    ClientConfig {
        preview_delay_ms: 20,
        download_dir: Some(dir),
        ..Default::default()
    }
}

#[test]
fn test_typing_burst_yields_one_preview() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(FakeService::default(), fast_config(dir.path().to_path_buf()));

    for text in ["H", "He", "Hel", "Hell", "Hello"] {
        h.send(Message::TextEdited(text.to_string()));
    }
    h.settle(Duration::from_millis(300));

    assert_eq!(*h.service.previews.lock().unwrap(), vec!["Hello".to_string()]);
    match h.session.preview_pane() {
        PreviewPane::Lines(lines) => assert_eq!(lines[0].content, "Hello"),
        other => panic!("unexpected pane {:?}", other),
    }
}

#[test]
fn test_generate_then_download() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(FakeService::default(), fast_config(dir.path().to_path_buf()));

    h.send(Message::TextEdited("Name: Ada\n1. What is 2+2?\nAns: 4".to_string()));
    h.send(Message::Generate);
    h.settle(Duration::from_millis(300));

    assert!(matches!(h.session.state(), SessionState::Ready { .. }));
    assert_eq!(
        h.session.status(),
        "PDF generated successfully! You can download it now."
    );

    h.send(Message::Download);
    h.settle(Duration::from_millis(300));

    let saved = dir.path().join("handwritten_assignment.pdf");
    assert_eq!(std::fs::read(&saved).unwrap(), b"%PDF-1.7 fake");
    assert!(h.session.status().starts_with("Saved to"));
    assert!(h.session.can_transfer());
}

#[test]
fn test_failed_export_reports_error_and_keeps_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(FakeService::default(), fast_config(dir.path().to_path_buf()));

    h.send(Message::TextEdited("text".to_string()));
    h.send(Message::Generate);
    h.settle(Duration::from_millis(300));

    h.send(Message::Export(ExportFormat::Jpg));
    h.settle(Duration::from_millis(300));

    assert_eq!(h.session.status(), "Error: Export not supported");
    assert!(h.session.artifact().is_some());
    assert!(!dir.path().join("handwritten_assignment.jpg").exists());
}

#[test]
fn test_slow_generation_times_out_and_stays_editing() {
    let dir = tempfile::tempdir().unwrap();
    let service = FakeService {
        generate_delay: Some(Duration::from_millis(400)),
        ..Default::default()
    };
    let config = ClientConfig {
        generate_timeout_secs: 0,
        ..fast_config(dir.path().to_path_buf())
    };
    let mut h = Harness::new(service, config);

    h.send(Message::TextEdited("slow".to_string()));
    h.send(Message::Generate);
    h.settle(Duration::from_millis(800));

    assert_eq!(h.session.state(), &SessionState::Editing);
    assert!(h.session.status().contains("too long"));
    assert!(h.session.can_generate());
}

#[test]
fn test_startup_keeps_builtin_fonts_when_listing_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(FakeService::default(), fast_config(dir.path().to_path_buf()));

    let effects = h.session.start();
    assert_eq!(h.executor.run(effects), Flow::Continue);
    h.settle(Duration::from_millis(300));

    assert_eq!(h.session.fonts(), FontChoice::all());
    assert_eq!(h.session.status(), "");
    assert!(h.service.previews.lock().unwrap().is_empty());
}

#[test]
fn test_auto_structure_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(FakeService::default(), fast_config(dir.path().to_path_buf()));

    h.send(Message::TextEdited("what is rust".to_string()));
    h.send(Message::AutoStructure);
    h.settle(Duration::from_millis(300));

    assert_eq!(h.session.text(), "1. what is rust");
    h.send(Message::Undo);
    assert_eq!(h.session.text(), "what is rust");
}
