use backend::doc_service::DocService;
use backend::registry::SqliteRegistry;
use backend::state::AppState;
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::write::FileOptions;
use zip::ZipWriter;

pub const BOUNDARY: &str = "docgen-test-boundary";

/// A one-part `.docx` whose paragraphs each hold a single run.
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );
    for text in paragraphs {
        xml.push_str("<w:p><w:r><w:t>");
        xml.push_str(text);
        xml.push_str("</w:t></w:r></w:p>");
    }
    xml.push_str("</w:body></w:document>");

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("[Content_Types].xml", FileOptions::default())
        .unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer
        .start_file("word/document.xml", FileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Fresh state over a temp storage root and an in-memory registry.
pub fn state() -> (tempfile::TempDir, AppState) {
    let root = tempfile::tempdir().unwrap();
    let registry = SqliteRegistry::open_in_memory().unwrap();
    let state = AppState::new(Arc::new(registry), DocService::new(root.path()));
    (root, state)
}

/// Multipart body with an optional `name` field and an optional file.
pub fn multipart(name: Option<&str>, file: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(name) = name {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{}\r\n",
                BOUNDARY, name
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"template_file\"; filename=\"t.docx\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
