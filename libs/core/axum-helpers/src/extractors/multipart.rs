//! Multipart form extractor restricted to image uploads.

use std::collections::HashMap;
use std::str::FromStr;

use crate::errors::{AppError, ErrorCode};
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    response::{IntoResponse, Response},
};

/// Content types accepted for file parts.
pub const ALLOWED_IMAGE_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

/// A single uploaded file part, buffered in memory.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Form field the file arrived under (e.g. `imageCover`)
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FileUpload {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Buffered `multipart/form-data` body.
///
/// Text parts land in `fields` (last value wins), file parts in `files`
/// in arrival order. Any file that is not PNG or JPEG rejects the whole
/// request with 400 "image only".
///
/// ```ignore
/// async fn create(form: MultipartForm) -> Result<Json<Value>, AppError> {
///     let title = form.text("title");
///     let price: Option<i64> = form.parse("price")?;
///     let cover = form.file("imageCover");
///     let gallery = form.files("images");
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<FileUpload>,
}

impl MultipartForm {
    /// Text value for `name`, trimmed; empty strings count as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parse a text field, failing with 400 when present but malformed.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.text(name)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| {
                    AppError::BadRequest(format!("invalid value for {}: {}", name, raw))
                })
            })
            .transpose()
    }

    /// First file uploaded under `name`.
    pub fn file(&self, name: &str) -> Option<&FileUpload> {
        self.files.iter().find(|f| f.field == name)
    }

    /// Every file uploaded under `name`.
    pub fn files(&self, name: &str) -> Vec<FileUpload> {
        self.files
            .iter()
            .filter(|f| f.field == name)
            .cloned()
            .collect()
    }
}

impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()).into_response())?;

        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()).into_response())?
        {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
                        return Err(AppError::InvalidUpload(
                            ErrorCode::InvalidUpload.default_message().to_string(),
                        )
                        .into_response());
                    }
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()).into_response())?;
                    form.files
                        .push(FileUpload::new(name, file_name, content_type, bytes));
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()).into_response())?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::post,
    };
    use tower::ServiceExt;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn body(parts: &[(&str, Option<(&str, &str)>, &str)]) -> String {
        let mut out = String::new();
        for (name, file, value) in parts {
            out.push_str(&format!("--{}\r\n", BOUNDARY));
            match file {
                Some((file_name, content_type)) => out.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    name, file_name, content_type
                )),
                None => out.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str(&format!("--{}--\r\n", BOUNDARY));
        out
    }

    fn request(payload: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(payload))
            .unwrap()
    }

    fn app() -> Router {
        Router::new().route(
            "/",
            post(|form: MultipartForm| async move {
                format!(
                    "{}|{}|{}",
                    form.text("name").unwrap_or_default(),
                    form.files("images").len(),
                    form.file("imageCover").map(|f| f.file_name.clone()).unwrap_or_default()
                )
            }),
        )
    }

    #[tokio::test]
    async fn test_collects_text_and_image_parts() {
        let payload = body(&[
            ("name", None, "Phones"),
            ("imageCover", Some(("cover.png", "image/png")), "png-bytes"),
            ("images", Some(("a.jpg", "image/jpeg")), "a"),
            ("images", Some(("b.jpg", "image/jpeg")), "b"),
        ]);
        let response = app().oneshot(request(payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(&bytes[..], b"Phones|2|cover.png");
    }

    #[tokio::test]
    async fn test_rejects_non_image_file() {
        let payload = body(&[("image", Some(("notes.pdf", "application/pdf")), "%PDF")]);
        let response = app().oneshot(request(payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_field_values() {
        let mut form = MultipartForm::default();
        form.fields.insert("price".into(), " 250 ".into());
        form.fields.insert("quantity".into(), "many".into());
        form.fields.insert("blank".into(), "   ".into());

        assert_eq!(form.parse::<i64>("price").unwrap(), Some(250));
        assert_eq!(form.parse::<i64>("missing").unwrap(), None);
        assert_eq!(form.parse::<i64>("blank").unwrap(), None);
        assert!(form.parse::<i64>("quantity").is_err());
    }
}
