//! Item form submissions, accepted as multipart (with an optional `image` part)
//! or as a plain urlencoded body.

use axum::{
    Form, async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request, multipart::MultipartError},
    http::header::CONTENT_TYPE,
    response::Response,
};

use crate::error::{ShopError, ShopResult, error_response};
use crate::model::{DEFAULT_CATEGORY, DEFAULT_QUANTITY, ItemFields};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemForm {
    pub item_id: Option<String>,
    pub text: Option<String>,
    pub quantity: Option<String>,
    pub category: Option<String>,
    pub added_by: Option<String>,
    pub description: Option<String>,
    /// Set whenever an `urgent` field is submitted, whatever its value (checkbox semantics).
    pub urgent: bool,
    pub remove_image: bool,
}

impl ItemForm {
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "item_id" => self.item_id = Some(value),
            "text" => self.text = Some(value),
            "quantity" => self.quantity = Some(value),
            "category" => self.category = Some(value),
            "added_by" => self.added_by = Some(value),
            "description" => self.description = Some(value),
            "urgent" => self.urgent = true,
            "remove_image" => self.remove_image = value == "true",
            _ => tracing::debug!(field = name, "ignoring unknown form field"),
        }
    }

    /// Trims every field and fills in defaults for the absent ones.
    pub fn to_fields(&self) -> ShopResult<ItemFields> {
        let text = self.text.as_deref().unwrap_or("").trim();
        if text.is_empty() {
            return Err(ShopError::Validation("item text is required".to_string()));
        }

        let trimmed = |value: &Option<String>, default: &str| {
            value.as_deref().unwrap_or(default).trim().to_string()
        };

        Ok(ItemFields {
            text: text.to_string(),
            quantity: trimmed(&self.quantity, DEFAULT_QUANTITY),
            category: trimmed(&self.category, DEFAULT_CATEGORY),
            added_by: trimmed(&self.added_by, ""),
            description: trimmed(&self.description, ""),
            urgent: self.urgent,
        })
    }

    pub fn item_id(&self) -> ShopResult<i64> {
        let raw = match self.item_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => return Err(ShopError::Validation("item_id is required".to_string())),
        };
        parse_item_id(raw)
    }
}

/// Item ids that are not integers cannot name an item, so they are not found.
pub fn parse_item_id(raw: &str) -> ShopResult<i64> {
    raw.parse().map_err(|_| ShopError::NotFound("item"))
}

fn multipart_error(e: MultipartError) -> Response {
    error_response(e.status(), e.body_text())
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct ItemSubmission {
    pub form: ItemForm,
    pub image: Option<ImageUpload>,
}

#[async_trait]
impl<S> FromRequest<S> for ItemSubmission
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        let mut submission = ItemSubmission::default();

        if !is_multipart {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| error_response(e.status(), e.body_text()))?;
            for (name, value) in pairs {
                submission.form.set_field(&name, value);
            }
            return Ok(submission);
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| error_response(e.status(), e.body_text()))?;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                tracing::debug!(filename = ?filename, bytes = data.len(), "received image part");
                submission.image = Some(ImageUpload { filename, data });
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                submission.form.set_field(&name, value);
            }
        }

        Ok(submission)
    }
}
