//! Shop item model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::trim_field;
use crate::error::{AppResult, FieldErrors};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i64,
    pub item_name: String,
    pub description: Option<String>,
    pub price: f64,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ItemPayload {
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 360, message = "Length must be between 1 and 360.")
    )]
    pub item_name: Option<String>,
    #[validate(length(max = 1000, message = "Longer than maximum length 1000."))]
    pub description: Option<String>,
    #[validate(
        required(message = "Missing data for required field."),
        range(min = 0.0, message = "Must be greater than or equal to 0.")
    )]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub item_name: String,
    pub description: Option<String>,
    pub price: f64,
}

impl ItemPayload {
    pub fn into_record(mut self) -> AppResult<NewItem> {
        trim_field(&mut self.item_name);
        let mut errors = FieldErrors::collect(self.validate());
        if self.price.is_some_and(|p| !p.is_finite()) {
            errors.add("price", "Not a valid number.");
        }
        errors.into_result()?;

        Ok(NewItem {
            item_name: self.item_name.unwrap_or_default(),
            description: self.description,
            price: self.price.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use serde_json::json;

    #[test]
    fn negative_price_is_rejected() {
        let payload: ItemPayload =
            serde_json::from_value(json!({"item_name": "Tote bag", "price": -1.5})).unwrap();
        let AppError::InvalidFields(fields) = payload.into_record().unwrap_err() else {
            panic!("expected field errors");
        };
        assert!(fields.contains("price"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let payload: ItemPayload =
            serde_json::from_value(json!({"item_name": "  ", "price": 1.0})).unwrap();
        let AppError::InvalidFields(fields) = payload.into_record().unwrap_err() else {
            panic!("expected field errors");
        };
        assert!(fields.contains("item_name"));
    }

    #[test]
    fn free_items_are_allowed() {
        let payload: ItemPayload =
            serde_json::from_value(json!({"item_name": "Bookmark", "price": 0})).unwrap();
        assert_eq!(payload.into_record().unwrap().price, 0.0);
    }
}
