//! Draft state controller: holds the listing draft and its live error map.

use tracing::debug;

use crate::models::{ListingDraft, PropertyKind};
use crate::validation::{self, parse_int_prefix, ErrorMap, Field, PRICE_MAX, PRICE_MIN};

/// Boolean switches on the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Parking,
    Furnished,
    Offer,
}

/// Stepper direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Listing draft plus the errors shown next to each field
#[derive(Debug, Clone, Default)]
pub struct ListingForm {
    draft: ListingDraft,
    errors: ErrorMap,
}

impl ListingForm {
    pub fn new(draft: ListingDraft) -> Self {
        Self {
            draft,
            errors: ErrorMap::new(),
        }
    }

    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    /// Apply raw input to a field and re-validate it.
    ///
    /// Numeric input is coerced to its leading integer (0 when there is
    /// none). A zero for bedrooms, bathrooms, square footage or regular
    /// price is ignored so a half-typed value does not wipe the field.
    pub fn set_field(&mut self, field: Field, raw: &str) {
        if field == Field::Kind {
            match PropertyKind::parse(raw) {
                Some(kind) => self.select_kind(kind),
                None => debug!("Ignoring unknown property kind {:?}", raw),
            }
            return;
        }

        if field.is_numeric() {
            let value = coerce_integer(field, raw);
            if value == 0 && field != Field::DiscountPrice {
                return;
            }
            self.store_number(field, value);
        } else {
            let value = raw.to_string();
            match field {
                Field::Name => self.draft.name = value,
                Field::Description => self.draft.description = value,
                Field::Address => self.draft.address = value,
                Field::ContactNumber => self.draft.contact_number = value,
                _ => {}
            }
        }

        self.revalidate_field(field);
        if field == Field::RegularPrice {
            self.revalidate_field(Field::DiscountPrice);
        }
    }

    pub fn select_kind(&mut self, kind: PropertyKind) {
        self.draft.kind = kind;
        self.errors.clear(Field::Kind);
    }

    pub fn set_toggle(&mut self, toggle: Toggle, on: bool) {
        match toggle {
            Toggle::Parking => self.draft.parking = on,
            Toggle::Furnished => self.draft.furnished = on,
            Toggle::Offer => {
                self.draft.offer = on;
                if !on {
                    self.draft.discount_price = 0;
                    self.errors.clear(Field::DiscountPrice);
                }
            }
        }
    }

    /// Nudge a numeric field by one, clamped to its valid range.
    pub fn step(&mut self, field: Field, direction: Direction) {
        let Some(current) = self.number(field) else {
            return;
        };
        let delta = match direction {
            Direction::Up => 1,
            Direction::Down => -1,
        };
        let next = current.saturating_add(delta);
        let clamped = match field {
            Field::RegularPrice => next.clamp(PRICE_MIN, PRICE_MAX),
            Field::DiscountPrice => next.clamp(0, (self.draft.regular_price - 1).max(0)),
            _ => field.bounds().map_or(next, |bounds| bounds.clamp(next)),
        };

        self.store_number(field, clamped);
        self.revalidate_field(field);
        if field == Field::RegularPrice {
            self.revalidate_field(Field::DiscountPrice);
        }
    }

    /// Validate every field without touching the stored error map.
    pub fn validate_all(&self) -> ErrorMap {
        validation::validate_draft(&self.draft)
    }

    /// Validate every field and replace the stored error map with the result.
    pub fn revalidate(&mut self) -> &ErrorMap {
        self.errors = self.validate_all();
        &self.errors
    }

    /// Overlay errors reported by the gateway.
    pub fn merge_errors(&mut self, errors: ErrorMap) {
        self.errors.merge(errors);
    }

    pub fn set_image_error(&mut self, message: Option<String>) {
        self.errors.set_images(message);
    }

    fn revalidate_field(&mut self, field: Field) {
        if field == Field::DiscountPrice && !self.draft.offer {
            self.errors.clear(field);
            return;
        }
        self.errors.record(field, field.validate(&self.draft));
    }

    fn number(&self, field: Field) -> Option<i64> {
        match field {
            Field::Bedrooms => Some(self.draft.bedrooms),
            Field::Bathrooms => Some(self.draft.bathrooms),
            Field::SquareFootage => Some(self.draft.square_footage),
            Field::RegularPrice => Some(self.draft.regular_price),
            Field::DiscountPrice => Some(self.draft.discount_price),
            _ => None,
        }
    }

    fn store_number(&mut self, field: Field, value: i64) {
        match field {
            Field::Bedrooms => self.draft.bedrooms = value,
            Field::Bathrooms => self.draft.bathrooms = value,
            Field::SquareFootage => self.draft.square_footage = value,
            Field::RegularPrice => self.draft.regular_price = value,
            Field::DiscountPrice => self.draft.discount_price = value,
            _ => {}
        }
    }
}

/// Price inputs are shown with digit grouping, so commas are stripped first.
fn coerce_integer(field: Field, raw: &str) -> i64 {
    let parsed = match field {
        Field::RegularPrice | Field::DiscountPrice => parse_int_prefix(&raw.replace(',', "")),
        _ => parse_int_prefix(raw),
    };
    parsed.unwrap_or(0)
}
