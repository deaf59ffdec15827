use serde::{Deserialize, Serialize};

use crate::app::domain::settings::Settings;
use crate::app::infrastructure::error::{AppError, Result};

/// Line category assigned by the rendering service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Name,
    Id,
    Date,
    Subject,
    Question,
    AnswerLabel,
    Answer,
    Heading,
    Empty,
    Other,
}

impl LineKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "title" => Self::Title,
            "name" => Self::Name,
            "id" => Self::Id,
            "date" => Self::Date,
            "subject" => Self::Subject,
            "question" => Self::Question,
            "answer_label" => Self::AnswerLabel,
            "answer" => Self::Answer,
            "heading" => Self::Heading,
            "empty" => Self::Empty,
            _ => Self::Other,
        }
    }

    /// Answers are written in the chosen ink; everything else stays black.
    pub fn uses_ink(&self) -> bool {
        matches!(self, Self::Answer | Self::AnswerLabel)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewLine {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl PreviewLine {
    pub fn line_kind(&self) -> LineKind {
        LineKind::parse(&self.kind)
    }
}

#[derive(Debug, Deserialize)]
struct PreviewResponse {
    lines: Vec<PreviewLine>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AutoStructureResponse {
    #[serde(default)]
    structured: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    text: &'a str,
}

/// Body of `POST /api/generate`: the text plus every persistent setting.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub text: String,
    #[serde(flatten)]
    pub settings: Settings,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub scan_effect: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl GenerateRequest {
    pub fn new(text: &str, settings: &Settings) -> Self {
        Self {
            text: text.to_string(),
            settings: settings.clone(),
            scan_effect: settings.scan_effect,
            signature: settings.signature.as_ref().map(|s| s.data_url()),
        }
    }
}

/// Server-issued name of a generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Accepts only names that are safe to splice into a URL path.
    pub fn parse(name: &str) -> Result<Self> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(AppError::MalformedResponse(format!(
                "invalid artifact name: {:?}",
                name
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Jpg,
    Png,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }
}

/// Everything the client needs from the rendering service.
pub trait RenderService: Send + Sync {
    /// Font keys the server can render with, e.g. `"ComicNeue"`.
    fn fonts(&self) -> Result<Vec<String>>;
    fn preview(&self, text: &str) -> Result<Vec<PreviewLine>>;
    fn generate(&self, request: &GenerateRequest) -> Result<ArtifactId>;
    fn download(&self, artifact: &ArtifactId) -> Result<Vec<u8>>;
    fn export(&self, artifact: &ArtifactId, format: ExportFormat, scan: bool) -> Result<Vec<u8>>;
    fn auto_structure(&self, text: &str) -> Result<String>;
    fn artifact_url(&self, artifact: &ArtifactId) -> String;
}

/// `RenderService` over HTTP.
pub struct HttpRenderService {
    base_url: String,
    timeout_secs: u64,
    generate_timeout_secs: u64,
}

fn is_success(status: i32) -> bool {
    (200..300).contains(&status)
}

fn is_json(response: &minreq::Response) -> bool {
    response
        .headers
        .get("content-type")
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}

/// Turn a non-payload response into the most specific error available.
fn error_from_response(response: &minreq::Response) -> AppError {
    let body = response
        .as_str()
        .ok()
        .and_then(|s| serde_json::from_str::<ErrorBody>(s).ok())
        .and_then(|b| b.error);
    match body {
        Some(msg) => AppError::Server(msg),
        None => AppError::Server(format!(
            "HTTP {} {}",
            response.status_code, response.reason_phrase
        )),
    }
}

/// Binary endpoints: any JSON-typed body is an error, whatever the status.
fn binary_payload(response: minreq::Response) -> Result<Vec<u8>> {
    if is_json(&response) || !is_success(response.status_code) {
        return Err(error_from_response(&response));
    }
    Ok(response.into_bytes())
}

impl HttpRenderService {
    pub fn new(base_url: &str, timeout_secs: u64, generate_timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            generate_timeout_secs,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_json<T: Serialize>(&self, path: &str, body: &T, timeout: u64) -> Result<minreq::Response> {
        let response = minreq::post(self.url(path))
            .with_timeout(timeout)
            .with_json(body)?
            .send()?;
        Ok(response)
    }
}

impl RenderService for HttpRenderService {
    fn fonts(&self) -> Result<Vec<String>> {
        let response = minreq::get(self.url("/api/fonts"))
            .with_timeout(self.timeout_secs)
            .send()?;
        if !is_success(response.status_code) {
            return Err(error_from_response(&response));
        }
        Ok(response.json()?)
    }

    fn preview(&self, text: &str) -> Result<Vec<PreviewLine>> {
        let response = self.post_json("/api/preview", &TextBody { text }, self.timeout_secs)?;
        if !is_success(response.status_code) {
            return Err(error_from_response(&response));
        }
        let parsed: PreviewResponse = response.json()?;
        Ok(parsed.lines)
    }

    fn generate(&self, request: &GenerateRequest) -> Result<ArtifactId> {
        let response = self.post_json("/api/generate", request, self.generate_timeout_secs)?;
        let parsed = match response.json::<GenerateResponse>() {
            Ok(parsed) => parsed,
            Err(_) if !is_success(response.status_code) => {
                return Err(error_from_response(&response));
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(error) = parsed.error {
            return Err(AppError::Server(error));
        }
        match parsed.filename {
            Some(name) => ArtifactId::parse(&name),
            None => Err(AppError::MalformedResponse(
                "generate response has no filename".to_string(),
            )),
        }
    }

    fn download(&self, artifact: &ArtifactId) -> Result<Vec<u8>> {
        let response = minreq::get(self.url(&format!("/api/download/{}", artifact.as_str())))
            .with_timeout(self.generate_timeout_secs)
            .send()?;
        binary_payload(response)
    }

    fn export(&self, artifact: &ArtifactId, format: ExportFormat, scan: bool) -> Result<Vec<u8>> {
        let mut path = format!("/api/export/{}/{}", artifact.as_str(), format.extension());
        if scan {
            path.push_str("?scan=1");
        }
        let response = minreq::get(self.url(&path))
            .with_timeout(self.generate_timeout_secs)
            .send()?;
        binary_payload(response)
    }

    fn auto_structure(&self, text: &str) -> Result<String> {
        let response = self.post_json("/api/auto-structure", &TextBody { text }, self.timeout_secs)?;
        let parsed = match response.json::<AutoStructureResponse>() {
            Ok(parsed) => parsed,
            Err(_) if !is_success(response.status_code) => {
                return Err(error_from_response(&response));
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(error) = parsed.error {
            return Err(AppError::Server(error));
        }
        parsed.structured.ok_or_else(|| {
            AppError::MalformedResponse("auto-structure response has no text".to_string())
        })
    }

    fn artifact_url(&self, artifact: &ArtifactId) -> String {
        self.url(&format!("/generated/{}", artifact.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::settings::SignatureImage;
    use crate::app::infrastructure::error::ErrorKind;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    #[test]
    fn test_line_kind_parse() {
        assert_eq!(LineKind::parse("answer_label"), LineKind::AnswerLabel);
        assert_eq!(LineKind::parse("title"), LineKind::Title);
        assert_eq!(LineKind::parse("footnote"), LineKind::Other);
        assert!(LineKind::Answer.uses_ink());
        assert!(!LineKind::Question.uses_ink());
    }

    #[test]
    fn test_preview_response_shape() {
        let json = r#"{"lines":[{"type":"title","content":"HOME ASSIGNMENT"},{"type":"empty","content":""}]}"#;
        let parsed: PreviewResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.lines.len(), 2);
        assert_eq!(parsed.lines[0].line_kind(), LineKind::Title);
        assert_eq!(parsed.lines[1].content, "");
    }

    #[test]
    fn test_generate_request_flattens_settings() {
        let settings = Settings::default();
        let request = GenerateRequest::new("Hello", &settings);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["text"], "Hello");
        assert_eq!(value["font_size"], 18);
        assert_eq!(value["page_size"], "A4");
        assert_eq!(value["font"], "ComicNeue");
        assert!(value.get("signature").is_none());
        assert!(value.get("scan_effect").is_none());
    }

    #[test]
    fn test_generate_request_carries_signature_and_scan() {
        let settings = Settings {
            scan_effect: true,
            signature: Some(SignatureImage {
                bytes: vec![0xff],
                mime: "image/jpeg",
            }),
            ..Default::default()
        };
        let value = serde_json::to_value(GenerateRequest::new("x", &settings)).unwrap();
        assert_eq!(value["scan_effect"], true);
        assert_eq!(value["signature"], "data:image/jpeg;base64,/w==");
    }

    #[test]
    fn test_artifact_id_validation() {
        assert!(ArtifactId::parse("3f2a9c.pdf").is_ok());
        assert!(ArtifactId::parse("").is_err());
        assert!(ArtifactId::parse("../etc/passwd").is_err());
        assert!(ArtifactId::parse("a/b.pdf").is_err());
        assert!(ArtifactId::parse("a b.pdf").is_err());
    }

    #[test]
    fn test_urls() {
        let service = HttpRenderService::new("http://localhost:5000/", 10, 90);
        let artifact = ArtifactId::parse("abc123.pdf").unwrap();
        assert_eq!(
            service.artifact_url(&artifact),
            "http://localhost:5000/generated/abc123.pdf"
        );
        assert_eq!(service.url("/api/preview"), "http://localhost:5000/api/preview");
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Jpg.extension(), "jpg");
        assert_eq!(ExportFormat::Png.extension(), "png");
    }

    /// Serve one canned HTTP response on a local port and hand back a service
    /// pointed at it, plus a handle yielding the raw request that arrived.
    fn serve_once(
        status: &str,
        content_type: &str,
        body: &[u8],
    ) -> (HttpRenderService, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            content_type,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            stream.write_all(&response).unwrap();
            stream.flush().unwrap();
            request
        });
        let service = HttpRenderService::new(&format!("http://{}", addr), 5, 5);
        (service, handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn artifact() -> ArtifactId {
        ArtifactId::parse("sheet1.pdf").unwrap()
    }

    #[test]
    fn test_export_json_body_is_error_despite_200() {
        let (service, handle) = serve_once(
            "200 OK",
            "application/json",
            br#"{"error":"Image export requires pdf2image"}"#,
        );
        let err = service.export(&artifact(), ExportFormat::Png, false).unwrap_err();
        match err {
            AppError::Server(msg) => assert!(msg.contains("pdf2image")),
            other => panic!("unexpected error {:?}", other),
        }
        let request = handle.join().unwrap();
        assert!(request.starts_with("GET /api/export/sheet1.pdf/png "));
    }

    #[test]
    fn test_export_png_bytes() {
        let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];
        let (service, handle) = serve_once("200 OK", "image/png", &png);
        let bytes = service.export(&artifact(), ExportFormat::Png, true).unwrap();
        assert_eq!(bytes, png);
        let request = handle.join().unwrap();
        assert!(request.starts_with("GET /api/export/sheet1.pdf/png?scan=1 "));
    }

    #[test]
    fn test_download_server_error_without_json() {
        let (service, handle) = serve_once("404 NOT FOUND", "text/html", b"<h1>Not Found</h1>");
        let err = service.download(&artifact()).unwrap_err();
        assert!(matches!(err, AppError::Server(ref msg) if msg.starts_with("HTTP 404")));
        handle.join().unwrap();
    }

    #[test]
    fn test_generate_error_body() {
        let (service, handle) = serve_once(
            "500 INTERNAL SERVER ERROR",
            "application/json",
            br#"{"error":"boom"}"#,
        );
        let request = GenerateRequest::new("Hello", &Settings::default());
        let err = service.generate(&request).unwrap_err();
        assert!(matches!(err, AppError::Server(ref msg) if msg == "boom"));

        let raw = handle.join().unwrap();
        assert!(raw.starts_with("POST /api/generate "));
        assert!(raw.contains(r#""text":"Hello""#));
    }

    #[test]
    fn test_generate_returns_artifact() {
        let (service, handle) =
            serve_once("200 OK", "application/json", br#"{"filename":"a1b2.pdf"}"#);
        let request = GenerateRequest::new("Hello", &Settings::default());
        assert_eq!(service.generate(&request).unwrap().as_str(), "a1b2.pdf");
        handle.join().unwrap();
    }

    #[test]
    fn test_preview_html_body_is_error() {
        let (service, handle) =
            serve_once("200 OK", "text/html", b"<html><body>maintenance</body></html>");
        let err = service.preview("Name: Ada").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        handle.join().unwrap();
    }

    #[test]
    fn test_fonts_list() {
        let (service, handle) = serve_once(
            "200 OK",
            "application/json",
            br#"["DancingScript","Pacifico","ComicNeue"]"#,
        );
        assert_eq!(
            service.fonts().unwrap(),
            vec!["DancingScript", "Pacifico", "ComicNeue"]
        );
        assert!(handle.join().unwrap().starts_with("GET /api/fonts "));
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let service = HttpRenderService::new(&format!("http://{}", addr), 2, 2);
        assert_eq!(service.fonts().unwrap_err().kind(), ErrorKind::Transport);
    }
}
