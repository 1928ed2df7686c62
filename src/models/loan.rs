//! Loan model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::parse_date;
use crate::error::{AppResult, FieldErrors};

/// Row of the `loans` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct LoanRow {
    pub id: i64,
    pub user_id: i64,
    pub loan_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
}

/// Loan with the ids of its books
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Loan {
    pub id: i64,
    pub user_id: i64,
    pub loan_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub book_ids: Vec<i64>,
}

impl Loan {
    pub fn from_row(row: LoanRow, book_ids: Vec<i64>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            loan_date: row.loan_date,
            deadline: row.deadline,
            return_date: row.return_date,
            book_ids,
        }
    }
}

/// Create / replace loan request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct LoanPayload {
    #[validate(
        required(message = "Missing data for required field."),
        range(min = 1, message = "Must be a positive id.")
    )]
    pub user_id: Option<i64>,
    pub loan_date: Option<String>,
    pub deadline: Option<String>,
    pub return_date: Option<String>,
    #[serde(default)]
    pub book_ids: Vec<i64>,
}

/// Validated loan fields ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub user_id: i64,
    pub loan_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    /// Distinct book ids, in request order
    pub book_ids: Vec<i64>,
}

impl LoanPayload {
    pub fn into_record(self) -> AppResult<NewLoan> {
        let mut errors = FieldErrors::collect(self.validate());
        let loan_date = parse_date("loan_date", self.loan_date.as_deref(), &mut errors);
        let deadline = parse_date("deadline", self.deadline.as_deref(), &mut errors);
        let return_date = parse_date("return_date", self.return_date.as_deref(), &mut errors);

        if let (Some(start), Some(end)) = (loan_date, deadline) {
            if end < start {
                errors.add("deadline", "Must not be before loan_date.");
            }
        }

        let mut book_ids: Vec<i64> = Vec::with_capacity(self.book_ids.len());
        for id in self.book_ids {
            if !book_ids.contains(&id) {
                book_ids.push(id);
            }
        }
        errors.into_result()?;

        Ok(NewLoan {
            user_id: self.user_id.unwrap_or_default(),
            loan_date,
            deadline,
            return_date,
            book_ids,
        })
    }
}
