//! JSON body extractor with normalization and validation

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Json, Request},
    http::request::Parts,
};
use projectmgr_shared::auth::{authorization::require_creator, middleware::AuthContext};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

use crate::error::{validation_details, ApiError, ValidationErrorDetail};

/// Request body that can be canonicalized and checked before a handler sees it
pub trait RequestBody: DeserializeOwned + Validate {
    /// Fields for which an explicit `null` is rejected
    const NON_NULLABLE: &'static [&'static str] = &[];

    /// Canonicalizes inputs (e.g. trims surrounding whitespace)
    fn normalize(&mut self) {}

    /// Checks not expressible as field attributes, such as required or blank fields
    fn presence_errors(&self) -> Vec<ValidationErrorDetail> {
        Vec::new()
    }
}

/// JSON extractor that normalizes and validates the body
///
/// A body that isn't a JSON object, or doesn't fit `T`, is a 400 `bad_request`.
/// Field failures are collected into a single 400 `validation_error`: at most
/// one null or presence error per field and, for fields that passed those
/// checks, every attribute validator message.
///
/// # Example
///
/// ```ignore
/// async fn create(ValidatedJson(body): ValidatedJson<ProjectInput>) -> ApiResult<...> {
///     // body.title is trimmed and at most 100 characters here
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: RequestBody,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state).await?;

        let Value::Object(object) = value else {
            return Err(ApiError::BadRequest(
                "Invalid data. Expected a JSON object.".to_string(),
            ));
        };

        let mut details = null_errors(&object, T::NON_NULLABLE);

        let mut data: T = serde_json::from_value(Value::Object(object))
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;

        data.normalize();

        let presence: Vec<ValidationErrorDetail> = data
            .presence_errors()
            .into_iter()
            .filter(|detail| !details.iter().any(|d| d.field == detail.field))
            .collect();
        details.extend(presence);

        if let Err(errors) = data.validate() {
            // A null or presence error already explains the field
            let attribute_details: Vec<ValidationErrorDetail> = validation_details(&errors)
                .into_iter()
                .filter(|detail| !details.iter().any(|d| d.field == detail.field))
                .collect();
            details.extend(attribute_details);
        }

        if details.is_empty() {
            Ok(ValidatedJson(data))
        } else {
            details.sort_by(|a, b| a.field.cmp(&b.field));
            Err(ApiError::ValidationError(details))
        }
    }
}

/// Authenticated caller allowed to create resources
///
/// Rejects anonymous requests with 403 before the body is read.
pub struct Creator(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for Creator
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts.extensions.get::<AuthContext>().cloned();
        Ok(Creator(require_creator(auth)?))
    }
}

/// One error per listed field sent as an explicit `null`
fn null_errors(object: &Map<String, Value>, fields: &[&str]) -> Vec<ValidationErrorDetail> {
    fields
        .iter()
        .filter(|field| matches!(object.get(**field), Some(Value::Null)))
        .map(|field| ValidationErrorDetail::new(*field, "This field may not be null."))
        .collect()
}

/// Trims `value` in place
pub fn trim_in_place(value: &mut Option<String>) {
    if let Some(s) = value.as_mut() {
        let trimmed = s.trim();
        if trimmed.len() != s.len() {
            *s = trimmed.to_string();
        }
    }
}

/// Presence check for one field
///
/// `required` makes an absent field an error; a present blank field is always one.
pub fn check_present(
    details: &mut Vec<ValidationErrorDetail>,
    field: &str,
    value: Option<&String>,
    required: bool,
) {
    match value {
        None if required => details.push(ValidationErrorDetail::new(field, "This field is required.")),
        Some(v) if v.is_empty() => {
            details.push(ValidationErrorDetail::new(field, "This field may not be blank."))
        }
        _ => {}
    }
}
