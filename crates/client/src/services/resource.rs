//! Thin REST wrappers for catalog and back-office collections.

use std::fmt::{Debug, Display};

use ecom_core::{Page, PageResponse, ResponseApi};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::ApiError;
use crate::pipeline::{ApiClient, ApiRequest};

pub const PRODUCTS: &str = "products";
pub const BRANDS: &str = "brands";
pub const CATEGORIES: &str = "categories";
pub const VARIANTS: &str = "variants";
pub const VOUCHERS: &str = "vouchers";
pub const PROMOTIONS: &str = "promotions";
pub const STAFFS: &str = "staffs";
pub const CUSTOMERS: &str = "customers";
pub const RANKINGS: &str = "rankings";

/// Pagination and filters for [`Resource::list`].
#[derive(Debug, Clone)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
    pub filters: Vec<(String, String)>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 10,
            filters: Vec::new(),
        }
    }
}

impl PageQuery {
    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            filters: Vec::new(),
        }
    }

    /// Add a filter such as `brandName=acme`.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }
}

/// One REST collection, e.g. `/brands`.
#[derive(Debug, Clone)]
pub struct Resource {
    client: ApiClient,
    base: String,
}

impl Resource {
    /// Wrapper for the collection at `/{collection}`.
    #[must_use]
    pub fn new(client: ApiClient, collection: &str) -> Self {
        Self {
            client,
            base: format!("/{}", collection.trim_matches('/')),
        }
    }

    /// Collection path, e.g. `/brands`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.base
    }

    fn item_path(&self, id: impl Display) -> String {
        format!("{}/{id}", self.base)
    }

    /// One page of the collection.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self, query), fields(collection = %self.base, page = query.page))]
    pub async fn list<T: DeserializeOwned>(&self, query: &PageQuery) -> Result<Page<T>, ApiError> {
        let request = query.filters.iter().fold(
            ApiRequest::get(self.base.as_str())
                .query("page", query.page)
                .query("size", query.size),
            |request, (key, value)| request.query(key.as_str(), value),
        );
        let response: PageResponse<T> = self.client.fetch(request).await?;
        Ok(response.into_data())
    }

    /// One item by id.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self), fields(collection = %self.base))]
    pub async fn get<T: DeserializeOwned>(&self, id: impl Display + Debug) -> Result<T, ApiError> {
        let response: ResponseApi<T> = self.client.get(&self.item_path(id)).await?;
        Ok(response.into_data())
    }

    /// Create an item.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self, body), fields(collection = %self.base))]
    pub async fn create<B, T>(&self, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response: ResponseApi<T> = self.client.post(&self.base, body).await?;
        Ok(response.into_data())
    }

    /// Replace an item.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self, body), fields(collection = %self.base))]
    pub async fn update<B, T>(&self, id: impl Display + Debug, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response: ResponseApi<T> = self.client.put(&self.item_path(id), body).await?;
        Ok(response.into_data())
    }

    /// Toggle an item between active and inactive.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self), fields(collection = %self.base))]
    pub async fn change_status(&self, id: impl Display + Debug) -> Result<(), ApiError> {
        self.client.execute(self.status_request(id)).await?;
        Ok(())
    }

    /// Staff accounts and products have their own toggle endpoints.
    fn status_request(&self, id: impl Display) -> ApiRequest {
        match self.base.trim_start_matches('/') {
            STAFFS => ApiRequest::put(format!("{}/change-active/{id}", self.base)),
            PRODUCTS => ApiRequest::patch(format!("{}/status", self.item_path(id))),
            _ => ApiRequest::put(format!("{}/change-status/{id}", self.base)),
        }
    }

    /// Delete an item.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self), fields(collection = %self.base))]
    pub async fn delete(&self, id: impl Display + Debug) -> Result<(), ApiError> {
        self.client.delete(&self.item_path(id)).await
    }

    /// Send a voucher to every eligible customer. Only meaningful on
    /// [`VOUCHERS`].
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self), fields(collection = %self.base))]
    pub async fn send_to_customers(&self, id: impl Display + Debug) -> Result<(), ApiError> {
        self.client
            .put_empty(&format!("{}/send", self.item_path(id)))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::Method;
    use url::Url;

    use super::*;
    use crate::config::ClientConfig;

    fn resource(collection: &str) -> Resource {
        let client = ApiClient::builder(ClientConfig::new(
            Url::parse("http://localhost:8080/api/v1").unwrap(),
        ))
        .build()
        .unwrap();
        Resource::new(client, collection)
    }

    #[test]
    fn test_paths() {
        let brands = resource(BRANDS);
        assert_eq!(brands.path(), "/brands");
        assert_eq!(brands.item_path(12), "/brands/12");

        let trimmed = resource("/vouchers/");
        assert_eq!(trimmed.path(), "/vouchers");
    }

    #[test]
    fn test_status_endpoints() {
        let cases = [
            (BRANDS, Method::PUT, "/brands/change-status/4"),
            (VOUCHERS, Method::PUT, "/vouchers/change-status/4"),
            (STAFFS, Method::PUT, "/staffs/change-active/4"),
            (PRODUCTS, Method::PATCH, "/products/4/status"),
        ];

        for (collection, method, path) in cases {
            let request = resource(collection).status_request(4);
            assert_eq!(request.method(), &method, "{collection}");
            assert_eq!(request.path(), path);
        }
    }

    #[test]
    fn test_page_query() {
        let query = PageQuery::default();
        assert_eq!((query.page, query.size), (1, 10));

        let query = PageQuery::new(2, 7).filter("search", "tea");
        assert_eq!(query.filters, vec![("search".to_owned(), "tea".to_owned())]);
    }
}
