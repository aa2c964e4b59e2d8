//! Field validators for listing drafts.
//!
//! Every check is a pure function returning `Ok(())` or the message shown
//! next to the field. [`Field`] is the closed set of draft fields and maps
//! each one to its validator.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ListingDraft, PropertyKind};

pub const NAME_MIN_LEN: usize = 10;
pub const NAME_MAX_LEN: usize = 62;
pub const ADDRESS_MIN_LEN: usize = 15;
pub const DESCRIPTION_MIN_LEN: usize = 50;
pub const DESCRIPTION_MIN_WORDS: usize = 5;
pub const DESCRIPTION_WORD_LEN: usize = 3;

pub const PRICE_MIN: i64 = 1_000_000;
pub const PRICE_MAX: i64 = 20_000_000;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s]+$").expect("valid regex"));
static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\s,.\-]+$").expect("valid regex"));
static CONTACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid regex"));

/// Outcome of a single field check
pub type Check = Result<(), String>;

/// Inclusive integer range with the label used in its messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub label: &'static str,
    pub min: i64,
    pub max: i64,
}

pub const BEDROOMS: Bounds = Bounds {
    label: "Bedrooms",
    min: 1,
    max: 6,
};

pub const BATHROOMS: Bounds = Bounds {
    label: "Bathrooms",
    min: 1,
    max: 6,
};

pub const SQUARE_FOOTAGE: Bounds = Bounds {
    label: "Square footage",
    min: 500,
    max: 10_000,
};

impl Bounds {
    pub fn check(&self, value: i64) -> Check {
        if value < self.min {
            return Err(format!("{} cannot be less than {}", self.label, self.min));
        }
        if value > self.max {
            return Err(format!("{} cannot be more than {}", self.label, self.max));
        }
        Ok(())
    }

    /// Check raw user text, rejecting anything that is not an integer.
    pub fn check_input(&self, raw: &str) -> Check {
        match parse_int_prefix(raw) {
            Some(value) => self.check(value),
            None => Err(format!("{} must be a number", self.label)),
        }
    }

    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }
}

/// Leading-integer parse: skips leading whitespace, accepts an optional
/// sign, then reads digits until the first non-digit. `None` when no
/// digit was read.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = rest[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

pub fn validate_name(name: &str) -> Check {
    if name.trim().is_empty() {
        return Err("Property name is required".into());
    }
    let len = name.chars().count();
    if len < NAME_MIN_LEN {
        return Err(format!("Name must be at least {NAME_MIN_LEN} characters"));
    }
    if len > NAME_MAX_LEN {
        return Err(format!("Name cannot exceed {NAME_MAX_LEN} characters"));
    }
    if !NAME_RE.is_match(name) {
        return Err("Name can only contain letters and spaces".into());
    }
    Ok(())
}

pub fn validate_address(address: &str) -> Check {
    if address.trim().is_empty() {
        return Err("Address is required".into());
    }
    if address.chars().count() < ADDRESS_MIN_LEN {
        return Err("Please enter a complete address".into());
    }
    if !ADDRESS_RE.is_match(address) {
        return Err("Please enter a valid address".into());
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Check {
    if description.trim().is_empty() {
        return Err("Description is required".into());
    }
    if description.chars().count() < DESCRIPTION_MIN_LEN {
        return Err(format!(
            "Description must be at least {DESCRIPTION_MIN_LEN} characters"
        ));
    }
    let meaningful = description
        .split_whitespace()
        .filter(|word| word.chars().count() >= DESCRIPTION_WORD_LEN)
        .count();
    if meaningful < DESCRIPTION_MIN_WORDS {
        return Err("Description should contain meaningful content".into());
    }
    Ok(())
}

pub fn validate_contact_number(number: &str) -> Check {
    if number.trim().is_empty() {
        return Err("Contact number is required".into());
    }
    if !CONTACT_RE.is_match(number) {
        return Err("Please enter a valid 10-digit phone number".into());
    }
    Ok(())
}

pub fn validate_kind(kind: PropertyKind) -> Check {
    match kind {
        PropertyKind::Unset => Err("Please select either Rent or Sell".into()),
        PropertyKind::Sale | PropertyKind::Rent => Ok(()),
    }
}

/// Regular prices sit in `[PRICE_MIN, PRICE_MAX]`; discounts use a floor of 0.
pub fn validate_price(price: i64, is_discount: bool) -> Check {
    if is_discount {
        if price < 0 {
            return Err("Price cannot be less than 0".into());
        }
    } else if price < PRICE_MIN {
        return Err("Price cannot be less than ₹10,00,000".into());
    }
    if price > PRICE_MAX {
        return Err("Price cannot exceed ₹2,00,00,000".into());
    }
    Ok(())
}

pub fn validate_price_input(raw: &str, is_discount: bool) -> Check {
    match parse_int_prefix(&raw.replace(',', "")) {
        Some(price) => validate_price(price, is_discount),
        None => Err("Price must be a number".into()),
    }
}

pub fn validate_discount_price(discount_price: i64, regular_price: i64) -> Check {
    if regular_price > 0 && discount_price >= regular_price {
        return Err("Discount price must be less than regular price".into());
    }
    validate_price(discount_price, true)
}

/// Draft fields that carry a validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Description,
    Address,
    Kind,
    Bedrooms,
    Bathrooms,
    SquareFootage,
    ContactNumber,
    RegularPrice,
    DiscountPrice,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Name,
        Field::Description,
        Field::Address,
        Field::Kind,
        Field::Bedrooms,
        Field::Bathrooms,
        Field::SquareFootage,
        Field::ContactNumber,
        Field::RegularPrice,
        Field::DiscountPrice,
    ];

    /// Name used by the gateway payload and its error reports
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Address => "address",
            Self::Kind => "type",
            Self::Bedrooms => "bedrooms",
            Self::Bathrooms => "bathrooms",
            Self::SquareFootage => "squareFootage",
            Self::ContactNumber => "contactNumber",
            Self::RegularPrice => "regularPrice",
            Self::DiscountPrice => "discountPrice",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.wire_name() == name)
    }

    /// Bounds for the stepper-driven numeric fields
    pub fn bounds(self) -> Option<Bounds> {
        match self {
            Self::Bedrooms => Some(BEDROOMS),
            Self::Bathrooms => Some(BATHROOMS),
            Self::SquareFootage => Some(SQUARE_FOOTAGE),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Bedrooms
                | Self::Bathrooms
                | Self::SquareFootage
                | Self::RegularPrice
                | Self::DiscountPrice
        )
    }

    /// Run this field's validator against the draft.
    ///
    /// The discount is checked regardless of the offer flag here; callers
    /// that want offer-aware behaviour go through [`validate_draft`].
    pub fn validate(self, draft: &ListingDraft) -> Check {
        match self {
            Self::Name => validate_name(&draft.name),
            Self::Description => validate_description(&draft.description),
            Self::Address => validate_address(&draft.address),
            Self::Kind => validate_kind(draft.kind),
            Self::Bedrooms => BEDROOMS.check(draft.bedrooms),
            Self::Bathrooms => BATHROOMS.check(draft.bathrooms),
            Self::SquareFootage => SQUARE_FOOTAGE.check(draft.square_footage),
            Self::ContactNumber => validate_contact_number(&draft.contact_number),
            Self::RegularPrice => validate_price(draft.regular_price, false),
            Self::DiscountPrice => {
                validate_discount_price(draft.discount_price, draft.regular_price)
            }
        }
    }
}

/// Per-field error messages plus the image-set slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMap {
    fields: BTreeMap<Field, String>,
    images: Option<String>,
}

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Store the outcome of a check, clearing the entry on success.
    pub fn record(&mut self, field: Field, check: Check) {
        match check {
            Ok(()) => {
                self.fields.remove(&field);
            }
            Err(message) => {
                self.fields.insert(field, message);
            }
        }
    }

    pub fn clear(&mut self, field: Field) {
        self.fields.remove(&field);
    }

    pub fn images(&self) -> Option<&str> {
        self.images.as_deref()
    }

    pub fn set_images(&mut self, message: Option<String>) {
        self.images = message;
    }

    /// Overlay `other` on top of this map; keys it does not mention survive.
    pub fn merge(&mut self, other: ErrorMap) {
        self.fields.extend(other.fields);
        if other.images.is_some() {
            self.images = other.images;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.images.is_none()
    }

    pub fn len(&self) -> usize {
        self.fields.len() + usize::from(self.images.is_some())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Validate every field of the draft. The discount only counts while an
/// offer is enabled.
pub fn validate_draft(draft: &ListingDraft) -> ErrorMap {
    let mut errors = ErrorMap::new();
    for field in Field::ALL {
        if field == Field::DiscountPrice && !draft.offer {
            continue;
        }
        errors.record(field, field.validate(draft));
    }
    errors
}
