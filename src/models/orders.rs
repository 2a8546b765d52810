// src/models/orders.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{common::error::AppError, models::validation::validate_not_blank};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn ensure_transition(&self, next: OrderStatus) -> Result<(), AppError> {
        use OrderStatus::*;
        let allowed = matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
        );

        if allowed {
            Ok(())
        } else {
            Err(AppError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[validate(
        length(min = 1, max = 120, message = "The recipient name is required."),
        custom(function = "validate_not_blank")
    )]
    pub full_name: String,
    #[validate(
        length(min = 1, max = 200, message = "The address is required."),
        custom(function = "validate_not_blank")
    )]
    pub line1: String,
    #[validate(length(max = 200))]
    pub line2: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "The city is required."),
        custom(function = "validate_not_blank")
    )]
    pub city: String,
    #[validate(
        length(min = 1, max = 100, message = "The state is required."),
        custom(function = "validate_not_blank")
    )]
    pub state: String,
    #[validate(length(min = 3, max = 12, message = "The postal code is invalid."))]
    pub postal_code: String,
    #[validate(length(min = 6, max = 20, message = "The phone number is invalid."))]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(skip)]
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = ShippingAddress)]
    pub shipping_address: Json<ShippingAddress>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLinePayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 1000, message = "The quantity must be between 1 and 1000."))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderPayload {
    #[validate(nested)]
    pub items: Vec<OrderLinePayload>,
    #[validate(nested)]
    pub shipping_address: ShippingAddress,
}

pub const MAX_CART_LINES: usize = 50;

impl PlaceOrderPayload {
    // Validação padrão + regra do carrinho (entre 1 e 50 linhas)
    pub fn validate_cart(&self) -> Result<(), ValidationErrors> {
        self.validate()?;

        if self.items.is_empty() || self.items.len() > MAX_CART_LINES {
            let mut err = ValidationError::new("length");
            err.message = Some("The cart must have between 1 and 50 items.".into());
            let mut errors = ValidationErrors::new();
            errors.add("items", err);
            return Err(errors);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusPayload {
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn order_lifecycle() {
        assert!(Pending.ensure_transition(Confirmed).is_ok());
        assert!(Confirmed.ensure_transition(Shipped).is_ok());
        assert!(Shipped.ensure_transition(Delivered).is_ok());
        assert!(Pending.ensure_transition(Cancelled).is_ok());

        assert!(Shipped.ensure_transition(Cancelled).is_err());
        assert!(Delivered.ensure_transition(Pending).is_err());
        assert!(Cancelled.ensure_transition(Confirmed).is_err());
    }

    #[test]
    fn nested_cart_lines_are_validated() {
        let payload: PlaceOrderPayload = serde_json::from_value(serde_json::json!({
            "items": [{ "productId": Uuid::new_v4(), "quantity": 0 }],
            "shippingAddress": {
                "fullName": "Asha Patil",
                "line1": "Plot 12, Market Road",
                "city": "Wardha",
                "state": "Maharashtra",
                "postalCode": "442001",
                "phone": "9800000000"
            }
        }))
        .unwrap();

        let errors = payload.validate_cart().unwrap_err();
        assert!(errors.errors().contains_key("items"));
    }

    #[test]
    fn empty_cart_is_rejected() {
        let payload: PlaceOrderPayload = serde_json::from_value(serde_json::json!({
            "items": [],
            "shippingAddress": {
                "fullName": "Asha Patil",
                "line1": "Plot 12",
                "city": "Wardha",
                "state": "Maharashtra",
                "postalCode": "442001",
                "phone": "9800000000"
            }
        }))
        .unwrap();

        assert!(payload.validate_cart().unwrap_err().field_errors().contains_key("items"));
    }
}
