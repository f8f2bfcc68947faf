//! The signed-in customer's cart.

use ecom_core::{Cart, CartItemRequest, CartResponse};
use tracing::instrument;

use crate::error::ApiError;
use crate::pipeline::{ApiClient, ApiRequest};

const CARTS_PATH: &str = "/carts";

/// Cart operations. Every mutation returns the updated cart.
#[derive(Debug, Clone)]
pub struct CartService {
    client: ApiClient,
}

impl CartService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Current cart.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<Cart, ApiError> {
        let response: CartResponse = self.client.get(CARTS_PATH).await?;
        Ok(response.into_data())
    }

    /// Add `quantity` units of a product variant.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self))]
    pub async fn add(&self, product_variant_id: i64, quantity: u32) -> Result<Cart, ApiError> {
        let body = CartItemRequest {
            product_variant_id,
            quantity,
        };
        let response: CartResponse = self
            .client
            .post(&format!("{CARTS_PATH}/add"), &body)
            .await?;
        Ok(response.into_data())
    }

    /// Set the quantity of a line already in the cart.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        product_variant_id: i64,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let body = CartItemRequest {
            product_variant_id,
            quantity,
        };
        let response: CartResponse = self
            .client
            .put(&format!("{CARTS_PATH}/update-quantity"), &body)
            .await?;
        Ok(response.into_data())
    }

    /// Remove a product variant's line.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_variant_id: i64) -> Result<Cart, ApiError> {
        let request = ApiRequest::delete(format!("{CARTS_PATH}/remove/{product_variant_id}"));
        let response: CartResponse = self.client.fetch(request).await?;
        Ok(response.into_data())
    }

    /// Empty the cart of `user_id`. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns any pipeline error.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: i64) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{CARTS_PATH}/clear/{user_id}"))
            .await
    }
}
