//! Order model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::parse_date;
use crate::error::{AppResult, FieldErrors};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub order_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct OrderPayload {
    #[validate(
        required(message = "Missing data for required field."),
        range(min = 1, message = "Must be a positive id.")
    )]
    pub user_id: Option<i64>,
    #[validate(
        required(message = "Missing data for required field."),
        range(min = 1, message = "Must be a positive id.")
    )]
    pub item_id: Option<i64>,
    /// Defaults to 1
    #[validate(range(min = 1, message = "Must be at least 1."))]
    pub quantity: Option<i64>,
    pub order_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub order_date: Option<NaiveDate>,
}

impl OrderPayload {
    pub fn into_record(self) -> AppResult<NewOrder> {
        let mut errors = FieldErrors::collect(self.validate());
        let order_date = parse_date("order_date", self.order_date.as_deref(), &mut errors);
        errors.into_result()?;

        Ok(NewOrder {
            user_id: self.user_id.unwrap_or_default(),
            item_id: self.item_id.unwrap_or_default(),
            quantity: self.quantity.unwrap_or(1),
            order_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quantity_defaults_to_one() {
        let payload: OrderPayload =
            serde_json::from_value(json!({"user_id": 1, "item_id": 2})).unwrap();
        let record = payload.into_record().unwrap();
        assert_eq!(record.quantity, 1);
        assert_eq!(record.order_date, None);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let payload: OrderPayload =
            serde_json::from_value(json!({"user_id": 1, "item_id": 2, "quantity": 0})).unwrap();
        assert!(payload.into_record().is_err());
    }
}
