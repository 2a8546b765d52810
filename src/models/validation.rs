// src/models/validation.rs

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

use crate::common::error::AppError;

// Limite de NUMERIC(12,2)
pub fn max_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Texto obrigatório: só espaços conta como vazio.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field cannot be blank.".into());
        return Err(err);
    }
    Ok(())
}

/// Erro de validação para um campo que chegou só com espaços.
pub fn blank_field_error(field: &'static str) -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add(
        field,
        ValidationError::new("blank").with_message("This field cannot be blank.".into()),
    );
    AppError::ValidationError(errors)
}

/// Descrição do sintoma, contada sem os espaços das pontas.
pub fn validate_description(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if !(10..=500).contains(&len) {
        let mut err = ValidationError::new("length");
        err.add_param("min".into(), &10);
        err.add_param("max".into(), &500);
        err.message = Some("Please provide a description between 10 and 500 characters.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_price(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("The value cannot be negative.".into());
        return Err(err);
    }
    if *value > max_price() {
        let mut err = ValidationError::new("range");
        err.add_param("max".into(), &max_price().to_string());
        err.message = Some("The price cannot exceed 9999999999.99.".into());
        return Err(err);
    }
    if value.normalize().scale() > 2 {
        let mut err = ValidationError::new("scale");
        err.message = Some("The price can have at most 2 decimal places.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_text_is_blank() {
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("\t\n").is_err());
        assert!(validate_not_blank(" Seeds ").is_ok());
    }

    #[test]
    fn blank_field_error_names_the_field() {
        match blank_field_error("text") {
            AppError::ValidationError(errors) => assert!(errors.field_errors().contains_key("text")),
            other => panic!("esperava erro de validação, veio {:?}", other),
        }
    }

    #[test]
    fn description_padding_does_not_count() {
        assert!(validate_description("   yellow       ").is_err());
        assert!(validate_description("  yellow leaf tips  ").is_ok());
        assert!(validate_description(&"a".repeat(501)).is_err());
    }

    #[test]
    fn price_limits_follow_column_type() {
        assert_eq!(max_price().to_string(), "9999999999.99");
        assert!(validate_price(&max_price()).is_ok());
        assert!(validate_price(&Decimal::new(100_000_000_000, 0)).is_err());
        assert!(validate_price(&Decimal::new(-1, 2)).is_err());
        assert!(validate_price(&Decimal::new(1999, 3)).is_err());
        // zeros à direita não contam como casa decimal
        assert!(validate_price(&Decimal::new(19_990, 3)).is_ok());
        assert!(validate_price(&Decimal::ZERO).is_ok());
    }
}
