//! Book model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{parse_date, trim_field};
use crate::error::{AppResult, FieldErrors};

/// Book as stored in the `books` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub age_category: String,
    pub publish_date: Option<NaiveDate>,
    pub author: Option<String>,
}

/// Book with the number of loans it appears in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookPopularity {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub age_category: String,
    pub publish_date: Option<NaiveDate>,
    pub author: Option<String>,
    pub loan_count: i64,
}

/// Create / replace book request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct BookPayload {
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 360, message = "Length must be between 1 and 360.")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 360, message = "Length must be between 1 and 360.")
    )]
    pub genre: Option<String>,
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 120, message = "Length must be between 1 and 120.")
    )]
    pub age_category: Option<String>,
    /// ISO-8601 date (`YYYY-MM-DD`)
    pub publish_date: Option<String>,
    #[validate(length(max = 360, message = "Longer than maximum length 360."))]
    pub author: Option<String>,
}

/// Validated book fields ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub genre: String,
    pub age_category: String,
    pub publish_date: Option<NaiveDate>,
    pub author: Option<String>,
}

impl BookPayload {
    pub fn into_record(mut self) -> AppResult<NewBook> {
        trim_field(&mut self.title);
        trim_field(&mut self.genre);
        trim_field(&mut self.age_category);
        let mut errors = FieldErrors::collect(self.validate());
        let publish_date = parse_date("publish_date", self.publish_date.as_deref(), &mut errors);
        errors.into_result()?;

        Ok(NewBook {
            title: self.title.unwrap_or_default(),
            genre: self.genre.unwrap_or_default(),
            age_category: self.age_category.unwrap_or_default(),
            publish_date,
            author: self.author,
        })
    }
}

/// Book search parameters
#[derive(Debug, Deserialize)]
pub struct BookSearchQuery {
    pub title: Option<String>,
}
