//! User model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{parse_date, trim_field};
use crate::{
    auth::Role,
    error::{AppResult, FieldErrors},
};

/// User as stored in the `users` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    pub role: Role,
}

/// Create / replace user request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UserPayload {
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 120, message = "Length must be between 1 and 120.")
    )]
    pub username: Option<String>,
    #[validate(
        required(message = "Missing data for required field."),
        email(message = "Not a valid email address."),
        length(max = 360, message = "Longer than maximum length 360.")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 4, max = 120, message = "Length must be between 4 and 120.")
    )]
    pub password: Option<String>,
    /// ISO-8601 date (`YYYY-MM-DD`)
    #[serde(alias = "DOB")]
    pub dob: Option<String>,
    #[validate(length(max = 500, message = "Longer than maximum length 500."))]
    pub address: Option<String>,
    /// `admin` or `user`
    pub role: Option<String>,
}

/// Validated user fields; the password is still in clear text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    /// Requested role, if any
    pub role: Option<Role>,
}

impl UserPayload {
    pub fn into_record(mut self) -> AppResult<NewUser> {
        trim_field(&mut self.username);
        trim_field(&mut self.email);
        let mut errors = FieldErrors::collect(self.validate());
        let dob = parse_date("dob", self.dob.as_deref(), &mut errors);
        let role = match self.role.as_deref().map(str::parse::<Role>) {
            None => None,
            Some(Ok(role)) => Some(role),
            Some(Err(_)) => {
                errors.add("role", "Must be one of: admin, user.");
                None
            }
        };
        errors.into_result()?;

        Ok(NewUser {
            username: self.username.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            dob,
            address: self.address,
            role,
        })
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(
        required(message = "Missing data for required field."),
        email(message = "Not a valid email address.")
    )]
    pub email: Option<String>,
    #[validate(required(message = "Missing data for required field."))]
    pub password: Option<String>,
}

impl LoginRequest {
    /// Validated `(email, password)`
    pub fn into_credentials(self) -> AppResult<(String, String)> {
        FieldErrors::collect(self.validate()).into_result()?;
        Ok((
            self.email.unwrap_or_default(),
            self.password.unwrap_or_default(),
        ))
    }
}
