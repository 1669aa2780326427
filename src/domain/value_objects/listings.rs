use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    entities::listings::ListingEntity,
    value_objects::listing_quota::QuotaExceeded,
};

pub const MAX_TITLE_LEN: usize = 120;
pub const MAX_DESCRIPTION_LEN: usize = 5_000;
pub const DEFAULT_BROWSE_LIMIT: i64 = 24;
pub const MAX_BROWSE_LIMIT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingValidationError {
    #[error("title is required")]
    MissingTitle,
    #[error("title must be at most 120 characters")]
    TitleTooLong,
    #[error("description must be at most 5000 characters")]
    DescriptionTooLong,
    #[error("category is required")]
    MissingCategory,
    #[error("a sale price or a rental price is required")]
    MissingPrice,
    #[error("{0} must be greater than zero")]
    NonPositivePrice(&'static str),
    #[error("no changes supplied")]
    EmptyUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListingModel {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub sale_price_minor: Option<i64>,
    pub rental_price_minor: Option<i64>,
}

impl NewListingModel {
    pub fn validate(&self) -> Result<(), ListingValidationError> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        if self.category.trim().is_empty() {
            return Err(ListingValidationError::MissingCategory);
        }
        if self.sale_price_minor.is_none() && self.rental_price_minor.is_none() {
            return Err(ListingValidationError::MissingPrice);
        }
        validate_price("sale_price_minor", self.sale_price_minor)?;
        validate_price("rental_price_minor", self.rental_price_minor)?;
        Ok(())
    }
}

/// Seller edits. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateListingModel {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sale_price_minor: Option<i64>,
    pub rental_price_minor: Option<i64>,
    pub is_available: Option<bool>,
}

impl UpdateListingModel {
    pub fn validate(&self) -> Result<(), ListingValidationError> {
        if *self == UpdateListingModel::default() {
            return Err(ListingValidationError::EmptyUpdate);
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(category) = &self.category {
            if category.trim().is_empty() {
                return Err(ListingValidationError::MissingCategory);
            }
        }
        validate_price("sale_price_minor", self.sale_price_minor)?;
        validate_price("rental_price_minor", self.rental_price_minor)?;
        Ok(())
    }

    pub fn reactivates(&self, listing: &ListingEntity) -> bool {
        self.is_available == Some(true) && !listing.is_available
    }
}

fn validate_title(title: &str) -> Result<(), ListingValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ListingValidationError::MissingTitle);
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(ListingValidationError::TitleTooLong);
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ListingValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ListingValidationError::DescriptionTooLong);
    }
    Ok(())
}

fn validate_price(field: &'static str, price: Option<i64>) -> Result<(), ListingValidationError> {
    match price {
        Some(value) if value <= 0 => Err(ListingValidationError::NonPositivePrice(field)),
        _ => Ok(()),
    }
}

/// Owner's view of a listing with its derived lifecycle flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    #[serde(flatten)]
    pub listing: ListingEntity,
    pub is_sold: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateListingOutcome {
    Updated(ListingEntity),
    NotFound,
    NotOwner,
    Sold,
    QuotaExceeded(QuotaExceeded),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteListingOutcome {
    Deleted,
    NotFound,
    NotOwner,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_listing() -> NewListingModel {
        NewListingModel {
            title: "Yamaha P-125".to_string(),
            description: "Digital piano with stand".to_string(),
            category: "keyboards".to_string(),
            sale_price_minor: Some(45_000),
            rental_price_minor: None,
        }
    }

    #[test]
    fn complete_listing_validates() {
        assert_eq!(new_listing().validate(), Ok(()));
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut model = new_listing();
        model.title = "   ".to_string();
        assert_eq!(model.validate(), Err(ListingValidationError::MissingTitle));
    }

    #[test]
    fn listing_needs_some_price() {
        let mut model = new_listing();
        model.sale_price_minor = None;
        assert_eq!(model.validate(), Err(ListingValidationError::MissingPrice));
    }

    #[test]
    fn zero_price_is_rejected() {
        let mut model = new_listing();
        model.rental_price_minor = Some(0);
        assert_eq!(
            model.validate(),
            Err(ListingValidationError::NonPositivePrice("rental_price_minor"))
        );
    }

    #[test]
    fn empty_update_is_rejected() {
        assert_eq!(
            UpdateListingModel::default().validate(),
            Err(ListingValidationError::EmptyUpdate)
        );
    }
}
