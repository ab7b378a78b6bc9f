//! Form-level checks shared by the post and comment services.
//!
//! Messages are user-facing and follow the site locale.

use std::collections::BTreeMap;

use bytes::Bytes;
use thiserror::Error;

use crate::ids::GroupId;

const MEGABYTE: u64 = 1024 * 1024;

fn megabytes(bytes: &u64) -> String {
    if bytes % MEGABYTE == 0 {
        format!("{}", bytes / MEGABYTE)
    } else {
        format!("{:.1}", *bytes as f64 / MEGABYTE as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Обязательное поле.")]
    Required,

    #[error(
        "Максимальный размер изображения не должен превышать {} Мбайт, загружено {} Мбайт",
        megabytes(.limit),
        megabytes(.size)
    )]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("Загрузите правильное изображение.")]
    NotAnImage,

    #[error("Выберите корректную группу.")]
    UnknownGroup,

    #[error("Неверный ответ на проверочный вопрос.")]
    CaptchaFailed,
}

/// Validation failures keyed by form field name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Error)]
#[error("{} invalid field(s)", .errors.len())]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, Vec<ValidationError>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(field, error);
        errors
    }

    pub fn add(&mut self, field: &'static str, error: ValidationError) {
        self.errors.entry(field).or_default().push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> &[ValidationError] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[ValidationError])> {
        self.errors.iter().map(|(field, errors)| (*field, errors.as_slice()))
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// An uploaded file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// File extension used when the upload is stored. `None` means the
    /// upload does not look like an image.
    pub fn extension(&self) -> Option<&'static str> {
        let by_type = match self.content_type.as_deref() {
            Some("image/png") => Some("png"),
            Some("image/jpeg") | Some("image/jpg") => Some("jpg"),
            Some("image/gif") => Some("gif"),
            Some("image/webp") => Some("webp"),
            Some("image/bmp") => Some("bmp"),
            _ => None,
        };
        if by_type.is_some() {
            return by_type;
        }

        let ext = self
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())?;
        match ext.as_str() {
            "png" => Some("png"),
            "jpg" | "jpeg" => Some("jpg"),
            "gif" => Some("gif"),
            "webp" => Some("webp"),
            "bmp" => Some("bmp"),
            _ => None,
        }
    }
}

pub fn validate_image(image: &ImageUpload, max_bytes: u64) -> Result<(), ValidationError> {
    if image.extension().is_none() {
        return Err(ValidationError::NotAnImage);
    }
    if image.size() > max_bytes {
        return Err(ValidationError::ImageTooLarge {
            size: image.size(),
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Submitted post form.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<ImageUpload>,
}

impl PostDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    /// Field checks that need no database access. Group existence is
    /// checked by the posts service.
    pub fn validate(&self, max_image_bytes: u64) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.text.trim().is_empty() {
            errors.add("text", ValidationError::Required);
        }

        if let Some(image) = &self.image {
            if let Err(error) = validate_image(image, max_image_bytes) {
                errors.add("image", error);
            }
        }

        errors
    }
}

pub fn validate_comment_text(text: &str) -> Result<(), FieldErrors> {
    if text.trim().is_empty() {
        return Err(FieldErrors::single("text", ValidationError::Required));
    }
    Ok(())
}
