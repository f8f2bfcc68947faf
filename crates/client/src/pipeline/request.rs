//! Replayable request descriptions.
//!
//! A request may be sent twice (once before and once after a token refresh),
//! so the pipeline keeps a description and rebuilds the `reqwest` request for
//! every attempt instead of holding a consumed builder.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

/// One file in a multipart upload.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name.
    pub field: String,
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type, if known.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// A part for `field` with the given file name and contents.
    #[must_use]
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    /// Set the MIME type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Request payload.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Json(serde_json::Value),
    /// Sent as `multipart/form-data`, overriding the JSON default.
    Multipart(Vec<FilePart>),
}

/// A call to the backend, relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Body,
    pub(crate) skip_auth_refresh: bool,
}

impl ApiRequest {
    /// Request with no body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
            skip_auth_refresh: false,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Set a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, serde_json::Error> {
        self.body = Body::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Set a multipart body.
    #[must_use]
    pub fn multipart(mut self, files: Vec<FilePart>) -> Self {
        self.body = Body::Multipart(files);
        self
    }

    /// Exempt this request from token refresh handling.
    ///
    /// Failures are returned to the caller as-is. Used by the refresh call so
    /// that it cannot trigger itself.
    #[must_use]
    pub fn skip_auth_refresh(mut self) -> Self {
        self.skip_auth_refresh = true;
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn skips_auth_refresh(&self) -> bool {
        self.skip_auth_refresh
    }

    pub(crate) fn build_multipart(files: &[FilePart]) -> Result<Form, reqwest::Error> {
        files.iter().try_fold(Form::new(), |form, file| {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            if let Some(ref mime) = file.content_type {
                part = part.mime_str(mime)?;
            }
            Ok(form.part(file.field.clone(), part))
        })
    }
}

/// Whether a call has already been replayed after a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attempt {
    First,
    Retried,
}

/// A request travelling through the pipeline together with its attempt.
#[derive(Debug, Clone)]
pub(crate) struct PipelineCall {
    pub(crate) request: ApiRequest,
    pub(crate) attempt: Attempt,
}

impl PipelineCall {
    pub(crate) fn first(request: ApiRequest) -> Self {
        Self {
            request,
            attempt: Attempt::First,
        }
    }

    pub(crate) fn retried(self) -> Self {
        Self {
            attempt: Attempt::Retried,
            ..self
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_builder() {
        let request = ApiRequest::get("/brands")
            .query("page", 1)
            .query("size", 10)
            .query("brandName", "");

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/brands");
        assert_eq!(request.query.len(), 3);
        assert!(!request.skips_auth_refresh());
        assert!(matches!(request.body, Body::Empty));
    }

    #[test]
    fn test_json_body() {
        let request = ApiRequest::post("/auth/refresh-token")
            .json(&json!({"refreshToken": "r1"}))
            .unwrap()
            .skip_auth_refresh();

        assert!(request.skips_auth_refresh());
        match request.body {
            Body::Json(value) => assert_eq!(value["refreshToken"], "r1"),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_retried_keeps_request() {
        let call = PipelineCall::first(ApiRequest::delete("/vouchers/3"));
        assert_eq!(call.attempt, Attempt::First);

        let call = call.retried();
        assert_eq!(call.attempt, Attempt::Retried);
        assert_eq!(call.request.path(), "/vouchers/3");
    }

    #[test]
    fn test_multipart_form_builds() {
        let files = vec![
            FilePart::new("files", "a.png", vec![1, 2, 3]).with_content_type("image/png"),
            FilePart::new("files", "b.jpg", vec![4]),
        ];
        assert!(ApiRequest::build_multipart(&files).is_ok());

        let bad = vec![FilePart::new("files", "c", vec![]).with_content_type("not a mime")];
        assert!(ApiRequest::build_multipart(&bad).is_err());
    }
}
