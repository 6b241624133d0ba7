//! Checkout form fields and their validation.

use petal_core::{CountryCode, Email};
use serde::Deserialize;
use thiserror::Error;

/// Why the checkout form cannot be submitted yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("please enter a valid email address")]
    InvalidEmail,
    #[error("please choose a valid country")]
    InvalidCountry,
}

/// Raw checkout fields as typed by the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub country: String,
}

/// Validated, trimmed customer details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: CountryCode,
}

impl CheckoutForm {
    /// Blank form with the country pre-filled.
    #[must_use]
    pub fn with_country(country: &CountryCode) -> Self {
        Self {
            country: country.to_string(),
            ..Self::default()
        }
    }

    /// Check every required field, reporting the first problem found.
    ///
    /// # Errors
    ///
    /// Returns the first missing field in form order, then email and country
    /// format problems.
    pub fn validate(&self) -> Result<CustomerDetails, FormError> {
        let name = required("name", &self.name)?;
        let email = required("email", &self.email)?;
        let address = required("address", &self.address)?;
        let city = required("city", &self.city)?;
        let zip = required("zip", &self.zip)?;
        let country = required("country", &self.country)?;

        Ok(CustomerDetails {
            name,
            email: Email::parse(&email).map_err(|_| FormError::InvalidEmail)?,
            address,
            city,
            zip,
            country: CountryCode::parse(&country).map_err(|_| FormError::InvalidCountry)?,
        })
    }

    /// Whether [`Self::validate`] would succeed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }
}

fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled() -> CheckoutForm {
        CheckoutForm {
            name: " Ada Obi ".to_string(),
            email: "ada@example.com".to_string(),
            address: "1 Marina Rd".to_string(),
            city: "Lagos".to_string(),
            zip: "100001".to_string(),
            country: "ng".to_string(),
        }
    }

    #[test]
    fn test_validate_trims_and_normalizes() {
        let details = filled().validate().unwrap();
        assert_eq!(details.name, "Ada Obi");
        assert_eq!(details.country.as_str(), "NG");
    }

    #[test]
    fn test_whitespace_only_field_is_missing() {
        let form = CheckoutForm {
            city: "   ".to_string(),
            ..filled()
        };
        assert_eq!(form.validate(), Err(FormError::MissingField("city")));
        assert!(!form.is_complete());
    }

    #[test]
    fn test_invalid_email_and_country() {
        let form = CheckoutForm {
            email: "ada.example.com".to_string(),
            ..filled()
        };
        assert_eq!(form.validate(), Err(FormError::InvalidEmail));

        let form = CheckoutForm {
            country: "Nigeria".to_string(),
            ..filled()
        };
        assert_eq!(form.validate(), Err(FormError::InvalidCountry));
    }

    #[test]
    fn test_with_country_prefills() {
        let form = CheckoutForm::with_country(&CountryCode::default());
        assert_eq!(form.country, "NG");
        assert_eq!(form.validate(), Err(FormError::MissingField("name")));
    }
}
