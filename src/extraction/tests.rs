use super::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("should write test file");
    path
}

#[test]
fn file_type_from_str() {
    assert_eq!("pdf".parse::<FileType>().expect("should parse"), FileType::Pdf);
    assert_eq!("TXT".parse::<FileType>().expect("should parse"), FileType::Txt);
    assert_eq!("markdown".parse::<FileType>().expect("should parse"), FileType::Md);

    let result = "docx".parse::<FileType>();
    assert!(matches!(result, Err(RagError::Extraction(_))));
}

#[test]
fn file_type_from_path() {
    let detected = FileType::from_path(Path::new("/tmp/notes.MD")).expect("should detect");
    assert_eq!(detected, FileType::Md);

    let result = FileType::from_path(Path::new("/tmp/no_extension"));
    assert!(matches!(result, Err(RagError::Extraction(_))));
}

#[test]
fn extract_plain_text() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_file(&dir, "notes.txt", "hello world\nsecond line");

    let text = extract_text(&path, FileType::Txt).expect("should extract");
    assert_eq!(text, "hello world\nsecond line");
}

#[test]
fn extract_json_pretty_prints() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_file(&dir, "data.json", r#"{"name":"campus","count":3}"#);

    let text = extract_text(&path, FileType::Json).expect("should extract");
    assert!(text.contains("\"name\": \"campus\""));
    assert!(text.contains("\"count\": 3"));
}

#[test]
fn malformed_json_is_extraction_error() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_file(&dir, "data.json", "{not valid");

    let result = extract_text(&path, FileType::Json);
    assert!(matches!(result, Err(RagError::Extraction(_))));
}

#[test]
fn extract_markdown_renders() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_file(&dir, "doc.md", "# Title\n\nSome *emphasis* here.");

    let text = extract_text(&path, FileType::Md).expect("should extract");
    assert!(text.contains("<h1>Title</h1>"));
    assert!(text.contains("<em>emphasis</em>"));
}

#[test]
fn missing_file_is_extraction_error() {
    let result = extract_text(Path::new("/nonexistent/file.txt"), FileType::Txt);
    assert!(matches!(result, Err(RagError::Extraction(_))));
}
