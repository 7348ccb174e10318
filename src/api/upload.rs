//! Document upload endpoint
//!
//! Relays multipart file uploads to the storage provider under a folder
//! keyed by the uploading person's name.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, State},
    response::Json,
};
use serde::Serialize;

use crate::AppState;
use crate::error::AppError;
use crate::metrics::{
    HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL, UPLOAD_BYTES_TOTAL, UPLOADS_TOTAL,
};

/// Folder prefix for relayed documents
const UPLOAD_PREFIX: &str = "uploads";
/// Folder used when the request carries no person name
const DEFAULT_PERSON_NAME: &str = "sem-nome";
/// Per-file cap, matching the request body limit
const MAX_FILE_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Descriptor for one relayed file
#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub url: String,
    pub id: String,
    pub tipo: String,
    pub tamanho: u64,
}

/// Upload response: one descriptor per submitted field name
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub arquivos: HashMap<String, UploadedFile>,
}

/// A file part buffered before any provider call
struct PendingFile {
    field_name: String,
    file_name: String,
    content_type: String,
    data: Vec<u8>,
}

/// Derive the destination folder from the person name field.
///
/// Absent or blank input falls back to a fixed default folder.
fn upload_folder(nome_pessoa: Option<&str>) -> String {
    let nome = nome_pessoa
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_PERSON_NAME);
    format!("{}/{}", UPLOAD_PREFIX, nome)
}

/// Resolve the content type for a file part.
///
/// Prefers the type declared by the client, falling back to the
/// file extension for clients that omit it.
fn content_type_for(declared: Option<&str>, file_name: &str) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|value| !value.is_empty()) {
        return declared.to_string();
    }
    guess_content_type(file_name).to_string()
}

/// Guess a MIME type from the file extension.
fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// POST /upload
///
/// Buffers every part first: the person name field applies to all files
/// regardless of part order, and a request with zero files is rejected
/// before any provider call is attempted.
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/upload"])
        .start_timer();

    let mut nome_pessoa: Option<String> = None;
    let mut files: Vec<PendingFile> = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to parse multipart: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(|name| name.trim().to_string());

        match file_name {
            Some(file_name) => {
                let file_name = if file_name.is_empty() {
                    field_name.clone()
                } else {
                    file_name
                };
                let content_type = content_type_for(field.content_type(), &file_name);

                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {}", e)))?
                {
                    if bytes.len() + chunk.len() > MAX_FILE_UPLOAD_BYTES {
                        return Err(AppError::Validation(format!(
                            "File too large: exceeds {} bytes",
                            MAX_FILE_UPLOAD_BYTES
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                files.push(PendingFile {
                    field_name,
                    file_name,
                    content_type,
                    data: bytes,
                });
            }
            None if field_name == "nomePessoa" => {
                nome_pessoa = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read nomePessoa: {}", e))
                })?);
            }
            None => {}
        }
    }

    if files.is_empty() {
        return Err(AppError::Validation("Nenhum arquivo recebido.".to_string()));
    }

    let folder = upload_folder(nome_pessoa.as_deref());

    let mut arquivos = HashMap::with_capacity(files.len());
    for file in files {
        let key = format!("{}/{}", folder, file.file_name);
        let size = file.data.len() as u64;

        let url = state
            .storage
            .upload(&key, file.data, &file.content_type)
            .await?;

        UPLOADS_TOTAL.inc();
        UPLOAD_BYTES_TOTAL.inc_by(size as f64);

        tracing::info!(key = %key, size, "File relayed to storage provider");

        arquivos.insert(
            file.field_name,
            UploadedFile {
                url,
                id: key,
                tipo: file.content_type,
                tamanho: size,
            },
        );
    }

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/upload", "200"])
        .inc();

    Ok(Json(UploadResponse {
        message: "Upload concluído com sucesso!".to_string(),
        arquivos,
    }))
}

#[cfg(test)]
mod tests {
    use super::{content_type_for, guess_content_type, upload_folder};

    #[test]
    fn upload_folder_uses_person_name() {
        assert_eq!(upload_folder(Some("maria")), "uploads/maria");
    }

    #[test]
    fn upload_folder_trims_whitespace() {
        assert_eq!(upload_folder(Some("  joao  ")), "uploads/joao");
    }

    #[test]
    fn upload_folder_defaults_when_absent_or_blank() {
        assert_eq!(upload_folder(None), "uploads/sem-nome");
        assert_eq!(upload_folder(Some("")), "uploads/sem-nome");
        assert_eq!(upload_folder(Some("   ")), "uploads/sem-nome");
    }

    #[test]
    fn content_type_prefers_declared_value() {
        assert_eq!(content_type_for(Some("image/png"), "foto.jpg"), "image/png");
    }

    #[test]
    fn content_type_falls_back_to_extension() {
        assert_eq!(content_type_for(None, "laudo.PDF"), "application/pdf");
        assert_eq!(content_type_for(Some("  "), "foto.jpeg"), "image/jpeg");
    }

    #[test]
    fn guess_content_type_defaults_to_octet_stream() {
        assert_eq!(guess_content_type("arquivo"), "application/octet-stream");
        assert_eq!(guess_content_type("dados.xyz"), "application/octet-stream");
    }
}
