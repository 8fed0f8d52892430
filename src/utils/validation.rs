//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    // VIN de 17 caracteres, sin I, O ni Q
    static ref VIN_RE: Regex = Regex::new(r"^[A-HJ-NPR-Za-hj-npr-z0-9]{17}$").unwrap();
    static ref LICENSE_PLATE_RE: Regex = Regex::new(r"^[A-Za-z0-9 \-]{2,10}$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
}

/// Validar formato de VIN
pub fn validate_vin(value: &str) -> Result<(), ValidationError> {
    if VIN_RE.is_match(value) {
        Ok(())
    } else {
        let mut error = ValidationError::new("vin");
        error.add_param("value".into(), &value.to_string());
        Err(error)
    }
}

/// Validar formato de matrícula
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    if LICENSE_PLATE_RE.is_match(value) {
        Ok(())
    } else {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        Err(error)
    }
}

/// Validar formato de teléfono
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_vin() {
        assert!(validate_vin("1HGBH41JXMN109186").is_ok());
        assert!(validate_vin("1HGBH41JXMN10918").is_err()); // 16 chars
        assert!(validate_vin("1HGBH41JXMN10918O").is_err()); // letra O
    }

    #[test]
    fn test_validate_license_plate() {
        assert!(validate_license_plate("ABC1234").is_ok());
        assert!(validate_license_plate("ABC-1234").is_ok());
        assert!(validate_license_plate("").is_err());
        assert!(validate_license_plate("TOO LONG PLATE 99").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("5551234567").is_ok());
        assert!(validate_phone("+15551234567").is_ok());
        assert!(validate_phone("555-123").is_err());
    }
}
