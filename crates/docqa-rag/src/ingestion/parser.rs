//! Text extraction for PDF, DOCX, TXT and Markdown files

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::FileType;

/// PDF extraction can hang on pathological fonts
const PDF_EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Plain text pulled out of a document
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub file_type: FileType,
    pub text: String,
}

/// Turns a file on disk into plain text.
///
/// Implementations:
/// - `FileExtractor`: native Rust parsers for pdf/docx/txt/md
pub trait DocumentExtractor: Send + Sync {
    /// Extract text, failing with `UnsupportedFileType`, `FileNotFound` or `Extraction`
    fn extract(&self, path: &Path) -> Result<ExtractedText>;
}

/// Extractor backed by `pdf-extract` and `docx-rs`
#[derive(Debug, Default, Clone, Copy)]
pub struct FileExtractor;

impl DocumentExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedText> {
        let filename = display_name(path);
        let file_type = FileType::from_path(path).ok_or_else(|| {
            let ext = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_else(|| "(none)".to_string());
            Error::UnsupportedFileType(ext)
        })?;

        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let data = std::fs::read(path)
            .map_err(|e| Error::extraction(&filename, format!("read failed: {}", e)))?;

        let text = match file_type {
            FileType::Pdf => extract_pdf(&filename, data)?,
            FileType::Docx => extract_docx(&filename, &data)?,
            FileType::Txt | FileType::Markdown => String::from_utf8(data)
                .map_err(|e| Error::extraction(&filename, format!("not valid UTF-8: {}", e)))?,
        };

        Ok(ExtractedText { file_type, text })
    }
}

/// Extract PDF text on a helper thread so a stuck parse cannot block ingestion forever
fn extract_pdf(filename: &str, data: Vec<u8>) -> Result<String> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = pdf_extract::extract_text_from_mem(&data);
        let _ = tx.send(result);
    });

    match rx.recv_timeout(PDF_EXTRACT_TIMEOUT) {
        Ok(Ok(text)) => Ok(cleanup_pdf_text(&text)),
        Ok(Err(e)) => Err(Error::extraction(filename, e.to_string())),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::error!("PDF extraction of '{}' timed out", filename);
            Err(Error::extraction(
                filename,
                format!("timed out after {}s", PDF_EXTRACT_TIMEOUT.as_secs()),
            ))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(Error::extraction(filename, "extraction thread panicked"))
        }
    }
}

/// Replace ligatures and typographic spaces that PDF fonts commonly emit
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

/// Paragraph text joined by newlines; tables are skipped
fn extract_docx(filename: &str, data: &[u8]) -> Result<String> {
    let doc = docx_rs::read_docx(data).map_err(|e| Error::extraction(filename, e.to_string()))?;

    let mut paragraphs = Vec::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            let mut line = String::new();
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            line.push_str(&t.text);
                        }
                    }
                }
            }
            paragraphs.push(line);
        }
    }

    Ok(paragraphs.join("\n"))
}

/// File name used in logs, reports and chunk metadata
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Supported documents directly inside `dir` (not recursive), sorted by path
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::FileNotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| FileType::from_path(path).is_some())
        .collect();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_txt_and_md() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("info.txt");
        let md = dir.path().join("notes.md");
        std::fs::write(&txt, "YSJ offers a Computer Science degree.").unwrap();
        std::fs::write(&md, "# Campus\nLibrary opens at 8am.").unwrap();

        let out = FileExtractor.extract(&txt).unwrap();
        assert_eq!(out.file_type, FileType::Txt);
        assert_eq!(out.text, "YSJ offers a Computer Science degree.");

        let out = FileExtractor.extract(&md).unwrap();
        assert_eq!(out.file_type, FileType::Markdown);
        assert!(out.text.contains("Library"));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.xlsx");
        std::fs::write(&path, b"whatever").unwrap();

        let err = FileExtractor.extract(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(ref ext) if ext == ".xlsx"));
    }

    #[test]
    fn test_missing_file() {
        let err = FileExtractor.extract(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_garbage_pdf_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, "this is not a pdf").unwrap();

        let err = FileExtractor.extract(&path).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_discover_documents() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.pdf", "c.xlsx", "d.md"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/e.txt"), "x").unwrap();

        let names: Vec<String> = discover_documents(dir.path())
            .unwrap()
            .iter()
            .map(|p| display_name(p))
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.txt", "d.md"]);
    }
}
