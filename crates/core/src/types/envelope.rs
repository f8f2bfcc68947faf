//! Response envelopes returned by every backend endpoint.

use serde::{Deserialize, Serialize};

/// Standard response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseApi<T> {
    /// HTTP-like status code echoed by the backend.
    pub status: u16,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
    /// Payload.
    pub data: T,
}

impl<T> ResponseApi<T> {
    /// Discard the envelope and keep the payload.
    pub fn into_data(self) -> T {
        self.data
    }
}

/// One page of a paginated collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Page size requested.
    pub limit: u32,
    /// 1-based page number.
    pub page: u32,
    /// Total number of items across all pages.
    pub total_item: u64,
    /// Total number of pages.
    pub total_page: u32,
    /// Items on this page.
    pub data: Vec<T>,
}

/// Envelope carrying a [`Page`].
pub type PageResponse<T> = ResponseApi<Page<T>>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_response_deserialization() {
        let json = r#"{
            "status": 200,
            "message": "ok",
            "data": {
                "limit": 10,
                "page": 1,
                "totalItem": 12,
                "totalPage": 2,
                "data": [{"id": 1}, {"id": 2}]
            }
        }"#;

        let response: PageResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.data.total_item, 12);
        assert_eq!(response.data.data.len(), 2);
        assert_eq!(response.data.total_page, 2);
    }

    #[test]
    fn test_missing_message_defaults_to_empty() {
        let response: ResponseApi<Vec<String>> =
            serde_json::from_str(r#"{"status": 201, "data": ["a.png"]}"#).unwrap();
        assert!(response.message.is_empty());
        assert_eq!(response.into_data(), vec!["a.png".to_owned()]);
    }
}
