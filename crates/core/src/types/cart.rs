//! Shopping cart of the signed-in customer.

use serde::{Deserialize, Serialize};

use super::envelope::ResponseApi;

/// The customer's cart as the backend returns it after every cart operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub cart_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub total_price: f64,
}

/// One product variant line in a [`Cart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_variant_id: i64,
    pub product_name: String,
    #[serde(default)]
    pub product_image: String,
    pub sku: String,
    pub quantity: u32,
    /// Discount percentage applied to `price`.
    #[serde(default)]
    pub discount: f64,
    pub price: f64,
}

/// Body of `POST /carts/add` and `PUT /carts/update-quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_variant_id: i64,
    pub quantity: u32,
}

/// Envelope carrying a [`Cart`].
pub type CartResponse = ResponseApi<Cart>;
