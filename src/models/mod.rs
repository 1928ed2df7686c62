//! Data models for Bibliotheca

pub mod book;
pub mod item;
pub mod loan;
pub mod order;
pub mod pagination;
pub mod user;

use chrono::NaiveDate;

use crate::error::FieldErrors;

// Re-export commonly used types
pub use book::{Book, BookPayload, BookPopularity, NewBook};
pub use item::{Item, ItemPayload, NewItem};
pub use loan::{Loan, LoanPayload, LoanRow, NewLoan};
pub use order::{NewOrder, Order, OrderPayload};
pub use pagination::{Listing, PageQuery, PageRequest, Paginated};
pub use user::{LoginRequest, NewUser, User, UserPayload};

/// Wire format for dates
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Strip surrounding whitespace so blank input fails the length checks
pub(crate) fn trim_field(value: &mut Option<String>) {
    if let Some(text) = value {
        let trimmed = text.trim();
        if trimmed.len() != text.len() {
            *text = trimmed.to_string();
        }
    }
}

/// Parse an optional ISO-8601 calendar date, recording a field error on failure
pub(crate) fn parse_date(
    field: &str,
    value: Option<&str>,
    errors: &mut FieldErrors,
) -> Option<NaiveDate> {
    let raw = value?;
    match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "Not a valid date.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            parse_date("d", Some("2022-05-10"), &mut errors),
            NaiveDate::from_ymd_opt(2022, 5, 10)
        );
        assert_eq!(parse_date("d", None, &mut errors), None);
        assert!(errors.is_empty());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let mut blank = Some("   ".to_string());
        trim_field(&mut blank);
        assert_eq!(blank.as_deref(), Some(""));

        let mut padded = Some("\tDune \n".to_string());
        trim_field(&mut padded);
        assert_eq!(padded.as_deref(), Some("Dune"));

        let mut missing = None;
        trim_field(&mut missing);
        assert_eq!(missing, None);
    }

    #[test]
    fn rejects_malformed_dates() {
        let mut errors = FieldErrors::new();
        assert_eq!(parse_date("publish_date", Some("10/05/2022"), &mut errors), None);
        assert_eq!(parse_date("deadline", Some("2022-02-30"), &mut errors), None);
        assert!(errors.contains("publish_date"));
        assert!(errors.contains("deadline"));
    }
}
