//! Card data validation.
//!
//! Checks run in a fixed order — card number, expiration, CVV, ZIP —
//! and fail on the first violation with a field-specific reason.
//! Invalid data never creates or mutates a payment record.

use chrono::{Datelike, Utc};
use common::CoreError;

use crate::entity::{CardDetails, CardUpdate};

/// Validates a full card at payment creation.
pub fn validate_card(card: &CardDetails) -> Result<(), CoreError> {
    validate_card_number(&card.card_number)?;
    validate_expiration(&card.expiration)?;
    validate_cvv(&card.cvv)?;
    validate_zip(&card.zip)
}

/// Validates only the fields supplied in an update, same rules and
/// order as creation.
pub fn validate_update(update: &CardUpdate) -> Result<(), CoreError> {
    if let Some(ref card_number) = update.card_number {
        validate_card_number(card_number)?;
    }
    if let Some(ref expiration) = update.expiration {
        validate_expiration(expiration)?;
    }
    if let Some(ref cvv) = update.cvv {
        validate_cvv(cvv)?;
    }
    if let Some(ref zip) = update.zip {
        validate_zip(zip)?;
    }
    Ok(())
}

fn validate_card_number(card_number: &str) -> Result<(), CoreError> {
    if card_number.len() == 16 && card_number.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CoreError::InvalidData(
            "invalid payment card number".to_string(),
        ))
    }
}

/// Expiration is `MMYY`; the first moment of the expiry month must lie
/// strictly after the current time.
fn validate_expiration(expiration: &str) -> Result<(), CoreError> {
    let invalid = || CoreError::InvalidData("invalid expiration date".to_string());

    if expiration.len() != 4 || !expiration.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let month: u32 = expiration[..2].parse().map_err(|_| invalid())?;
    let year: i32 = expiration[2..].parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }

    let now = Utc::now();
    let full_year = 2000 + year;
    // Strictly after now: a card expiring this month is already stale.
    if (full_year, month) > (now.year(), now.month()) {
        Ok(())
    } else {
        Err(invalid())
    }
}

fn validate_cvv(cvv: &str) -> Result<(), CoreError> {
    if (3..=4).contains(&cvv.len()) && cvv.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CoreError::InvalidData("invalid CVV".to_string()))
    }
}

fn validate_zip(zip: &str) -> Result<(), CoreError> {
    if zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CoreError::InvalidData("invalid ZIP code".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_card;

    #[test]
    fn valid_card_passes() {
        assert!(validate_card(&test_card()).is_ok());
    }

    #[test]
    fn card_number_must_be_sixteen_digits() {
        let mut card = test_card();
        card.card_number = "1234".to_string();
        assert!(matches!(
            validate_card(&card),
            Err(CoreError::InvalidData(reason)) if reason.contains("card number")
        ));

        card.card_number = "42424242424242xx".to_string();
        assert!(validate_card(&card).is_err());
    }

    #[test]
    fn expiration_month_must_be_in_range() {
        let mut card = test_card();
        card.expiration = "1330".to_string();
        assert!(matches!(
            validate_card(&card),
            Err(CoreError::InvalidData(reason)) if reason.contains("expiration")
        ));

        card.expiration = "0030".to_string();
        assert!(validate_card(&card).is_err());
    }

    #[test]
    fn expired_card_is_rejected() {
        let mut card = test_card();
        card.expiration = "0120".to_string();
        assert!(validate_card(&card).is_err());
    }

    #[test]
    fn malformed_expiration_is_rejected() {
        let mut card = test_card();
        for bad in ["123", "12345", "ab30", ""] {
            card.expiration = bad.to_string();
            assert!(validate_card(&card).is_err(), "expected rejection for {bad:?}");
        }
    }

    #[test]
    fn cvv_must_be_three_or_four_digits() {
        let mut card = test_card();
        card.cvv = "12".to_string();
        assert!(matches!(
            validate_card(&card),
            Err(CoreError::InvalidData(reason)) if reason.contains("CVV")
        ));

        card.cvv = "1234".to_string();
        assert!(validate_card(&card).is_ok());

        card.cvv = "12a".to_string();
        assert!(validate_card(&card).is_err());
    }

    #[test]
    fn zip_must_be_five_digits() {
        let mut card = test_card();
        card.zip = "0213".to_string();
        assert!(matches!(
            validate_card(&card),
            Err(CoreError::InvalidData(reason)) if reason.contains("ZIP")
        ));
    }

    #[test]
    fn first_failing_check_wins() {
        let mut card = test_card();
        card.card_number = "bad".to_string();
        card.zip = "bad".to_string();
        // Card number is checked before ZIP.
        assert!(matches!(
            validate_card(&card),
            Err(CoreError::InvalidData(reason)) if reason.contains("card number")
        ));
    }

    #[test]
    fn update_validates_only_supplied_fields() {
        let update = CardUpdate {
            cvv: Some("99".to_string()),
            ..CardUpdate::default()
        };
        assert!(validate_update(&update).is_err());

        let update = CardUpdate {
            billing_address: Some("2 Elm St".to_string()),
            ..CardUpdate::default()
        };
        assert!(validate_update(&update).is_ok());
    }
}
