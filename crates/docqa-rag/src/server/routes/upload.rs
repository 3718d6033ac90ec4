//! Document upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{FileType, UploadResponse};

/// POST /api/upload - Store uploaded files under the raw directory and ingest them.
///
/// Accepts any number of `file`/`files` parts. Unsupported extensions are
/// skipped and listed in the response rather than failing the request.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let raw_dir = state.config().storage.raw_dir.clone();
    let mut saved: Vec<PathBuf> = Vec::new();
    let mut filenames = Vec::new();
    let mut skipped = Vec::new();
    let mut seen_file = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" && name != "files" {
            continue;
        }
        let Some(original) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        if original.is_empty() {
            continue;
        }
        seen_file = true;

        let filename = sanitize_filename(&original);
        if FileType::from_path(std::path::Path::new(&filename)).is_none() {
            tracing::warn!("Skipping unsupported upload: {}", original);
            skipped.push(original);
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read '{}': {}", original, e)))?;

        tokio::fs::create_dir_all(&raw_dir).await?;
        let path = raw_dir.join(&filename);
        tokio::fs::write(&path, &data).await?;
        tracing::info!("Stored upload {} ({} bytes)", filename, data.len());

        saved.push(path);
        filenames.push(filename);
    }

    if !seen_file {
        return Err(Error::InvalidRequest("No file part".to_string()));
    }

    if saved.is_empty() {
        return Ok(Json(UploadResponse {
            message: "No supported files were uploaded.".to_string(),
            filenames,
            skipped,
            report: None,
        }));
    }

    let report = state.pipeline().ingest(&saved).await?;
    Ok(Json(UploadResponse {
        message: report.summary(),
        filenames,
        skipped,
        report: Some(report),
    }))
}

/// Reduce a client-supplied name to a safe single path component
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::routes::test_state;
    use crate::testing::ScriptedLlm;
    use axum::body::Body;
    use axum::extract::{FromRequest, Request};
    use std::sync::Arc;

    const BOUNDARY: &str = "docqa-test-boundary";

    /// `(field name, file name, content)` parts; a `None` file name makes a plain form field
    async fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Multipart {
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match filename {
                Some(filename) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_upload_stores_and_ingests_supported_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Arc::new(ScriptedLlm::new()));

        let form = multipart(&[
            (
                "file",
                Some("../Prospectus 2024.txt"),
                "YSJ offers a Computer Science degree.",
            ),
            ("files", Some("x.xlsx"), "PK binary spreadsheet"),
        ])
        .await;

        let Json(response) = upload(State(state.clone()), form).await.unwrap();
        assert_eq!(response.skipped, vec!["x.xlsx".to_string()]);
        assert_eq!(response.filenames, vec!["Prospectus_2024.txt".to_string()]);

        let stored = dir.path().join("raw").join("Prospectus_2024.txt");
        assert_eq!(
            std::fs::read_to_string(&stored).unwrap(),
            "YSJ offers a Computer Science degree."
        );
        assert!(!dir.path().join("raw").join("x.xlsx").exists());

        let report = response.report.unwrap();
        assert_eq!(report.documents.len(), 1);
        assert!(report.errors.is_empty());
        assert!(!state.pipeline().is_empty());
    }

    #[tokio::test]
    async fn test_upload_with_only_unsupported_files_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Arc::new(ScriptedLlm::new()));

        let form = multipart(&[("file", Some("grades.xlsx"), "binary")]).await;
        let Json(response) = upload(State(state.clone()), form).await.unwrap();

        assert_eq!(response.skipped, vec!["grades.xlsx".to_string()]);
        assert!(response.filenames.is_empty());
        assert!(response.report.is_none());
        assert!(state.pipeline().is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_file_part_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Arc::new(ScriptedLlm::new()));

        let form = multipart(&[("message", None, "hello")]).await;
        let err = upload(State(state), form).await.unwrap_err();

        assert!(matches!(err, Error::InvalidRequest(ref msg) if msg == "No file part"));
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Prospectus 2024.pdf"), "Prospectus_2024.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\notes.md"), "notes.md");
        assert_eq!(sanitize_filename(".hidden.txt"), "hidden.txt");
        assert_eq!(sanitize_filename("..."), "upload");
    }
}
