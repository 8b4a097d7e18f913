use actix_multipart::Multipart;
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use futures::StreamExt;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{text_too_long, FieldErrors, INVALID_CHOICE, MAX_TEXT_BYTES};
use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::media::{CheckedImage, MediaStore};
use crate::AppState;

/// Fallback upload cap when no `AppState` is registered
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// URL-encoded post form
#[derive(Debug, Default, Deserialize)]
pub struct PostFormBody {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Validate)]
struct PostFields {
    #[validate(length(min = 1, message = "This field is required."))]
    text: String,
}

/// Raw create/edit submission, either `multipart/form-data` or urlencoded
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub text: String,
    pub group: String,
    /// Upload bytes, read up to one byte past the configured limit
    pub image: Option<Vec<u8>>,
}

/// Submission that passed every check
#[derive(Debug)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<CheckedImage>,
}

impl PostSubmission {
    /// Validate every field, collecting all messages
    ///
    /// Nothing is written here: the image is only decoded, the caller stores
    /// it once the whole form is valid.
    pub async fn clean(
        &mut self,
        repo: &dyn BlogRepository,
        media: &MediaStore,
    ) -> Result<std::result::Result<ValidPost, FieldErrors>> {
        let mut errors = FieldErrors::new();

        let fields = PostFields {
            text: self.text.trim().to_string(),
        };
        if let Err(e) = fields.validate() {
            errors.merge(e.into());
        }
        if self.text.len() > MAX_TEXT_BYTES {
            errors.add("text", text_too_long());
        }

        let group_id = match self.group.trim() {
            "" => None,
            raw => {
                let known = match Uuid::parse_str(raw) {
                    Ok(id) => repo.find_group(id).await?.map(|g| g.id),
                    Err(_) => None,
                };
                if known.is_none() {
                    errors.add("group", INVALID_CHOICE);
                }
                known
            }
        };

        let image = match self.image.take() {
            Some(bytes) => match media.inspect(bytes).await {
                Ok(checked) => Some(checked),
                Err(rejection) => {
                    errors.add("image", rejection.to_string());
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        Ok(Ok(ValidPost {
            text: fields.text,
            group_id,
            image,
        }))
    }
}

impl FromRequest for PostSubmission {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let max_upload_bytes = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.media.max_upload_bytes())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        if is_multipart(req) {
            let multipart = Multipart::new(req.headers(), payload.take());
            Box::pin(read_multipart(multipart, max_upload_bytes))
        } else {
            let form = web::Form::<PostFormBody>::from_request(req, payload);
            Box::pin(async move {
                let web::Form(body) = form
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Malformed form body: {}", e)))?;
                Ok(PostSubmission {
                    text: body.text,
                    group: body.group,
                    image: None,
                })
            })
        }
    }
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn read_multipart(mut multipart: Multipart, max_upload_bytes: usize) -> Result<PostSubmission> {
    let mut submission = PostSubmission::default();

    while let Some(item) = multipart.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" => {
                let has_file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(|f| !f.is_empty())
                    .unwrap_or(false);
                let bytes = read_field(&mut field, max_upload_bytes + 1).await?;
                // browsers send an empty part when no file was picked
                if has_file_name || !bytes.is_empty() {
                    submission.image = Some(bytes);
                }
            }
            "text" | "group" => {
                // one byte over the cap is enough for `clean` to report it
                let bytes = read_field(&mut field, MAX_TEXT_BYTES + 1).await?;
                let value = if bytes.len() > MAX_TEXT_BYTES {
                    String::from_utf8_lossy(&bytes).into_owned()
                } else {
                    String::from_utf8(bytes).map_err(|_| {
                        AppError::InvalidInput(format!("Field '{}' is not UTF-8", name))
                    })?
                };
                if name == "text" {
                    submission.text = value;
                } else {
                    submission.group = value;
                }
            }
            _ => {
                read_field(&mut field, 0).await?;
            }
        }
    }

    Ok(submission)
}

/// Read at most `cap` bytes of a part, draining the rest
async fn read_field(field: &mut actix_multipart::Field, cap: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?;
        let room = cap.saturating_sub(buf.len());
        buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;
    use crate::forms::REQUIRED;
    use crate::models::NewGroup;

    fn store() -> MediaStore {
        MediaStore::new(std::env::temp_dir().join("quill-form-tests"), 1024)
    }

    #[tokio::test]
    async fn blank_text_is_required() {
        let repo = MemoryRepository::new();
        let mut submission = PostSubmission {
            text: "   ".to_string(),
            ..Default::default()
        };
        let errors = submission.clean(&repo, &store()).await.unwrap().unwrap_err();
        assert_eq!(errors.get("text"), vec![REQUIRED.to_string()]);
    }

    #[tokio::test]
    async fn unknown_group_is_invalid_choice() {
        let repo = MemoryRepository::new();
        let mut submission = PostSubmission {
            text: "Some text".to_string(),
            group: Uuid::new_v4().to_string(),
            image: None,
        };
        let errors = submission.clean(&repo, &store()).await.unwrap().unwrap_err();
        assert_eq!(errors.get("group"), vec![INVALID_CHOICE.to_string()]);

        submission.group = "not-a-uuid".to_string();
        let errors = submission.clean(&repo, &store()).await.unwrap().unwrap_err();
        assert!(errors.has("group"));
    }

    #[tokio::test]
    async fn valid_submission_is_trimmed() {
        let repo = MemoryRepository::new();
        let group = repo
            .create_group(NewGroup {
                title: "Cats".to_string(),
                slug: "cats".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();

        let mut submission = PostSubmission {
            text: "  Hello  ".to_string(),
            group: group.id.to_string(),
            image: None,
        };
        let valid = submission.clean(&repo, &store()).await.unwrap().unwrap();
        assert_eq!(valid.text, "Hello");
        assert_eq!(valid.group_id, Some(group.id));
        assert!(valid.image.is_none());
    }

    #[tokio::test]
    async fn overlong_text_is_reported() {
        let repo = MemoryRepository::new();
        let mut submission = PostSubmission {
            text: "a".repeat(MAX_TEXT_BYTES + 1),
            ..Default::default()
        };
        let errors = submission.clean(&repo, &store()).await.unwrap().unwrap_err();
        assert_eq!(errors.get("text"), vec![text_too_long()]);

        submission.text = "a".repeat(MAX_TEXT_BYTES);
        assert!(submission.clean(&repo, &store()).await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let repo = MemoryRepository::new();
        let mut submission = PostSubmission {
            text: "Some text".to_string(),
            group: String::new(),
            image: Some(b"plain text".to_vec()),
        };
        let errors = submission.clean(&repo, &store()).await.unwrap().unwrap_err();
        assert!(errors.get("image")[0].starts_with("Upload a valid image."));
    }
}
