use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire value the gateway uses for listings created without a session.
const ANONYMOUS_OWNER: &str = "public";

/// Server-assigned listing identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the property is offered for sale or for rent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyKind {
    Sale,
    Rent,
    #[default]
    Unset,
}

impl PropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Rent => "rent",
            Self::Unset => "",
        }
    }

    /// Parse the selector id used by the form (`sale` / `rent`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "sale" => Some(Self::Sale),
            "rent" => Some(Self::Rent),
            _ => None,
        }
    }
}

impl From<String> for PropertyKind {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or(Self::Unset)
    }
}

impl From<PropertyKind> for String {
    fn from(kind: PropertyKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Who a listing belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Ownership {
    Owned(String),
    #[default]
    Anonymous,
}

impl From<String> for Ownership {
    fn from(raw: String) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == ANONYMOUS_OWNER {
            Self::Anonymous
        } else {
            Self::Owned(raw.to_string())
        }
    }
}

impl From<Ownership> for String {
    fn from(owner: Ownership) -> Self {
        match owner {
            Ownership::Owned(id) => id,
            Ownership::Anonymous => ANONYMOUS_OWNER.to_string(),
        }
    }
}

/// The listing record a seller is composing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    pub name: String,
    pub description: String,
    pub address: String,
    pub contact_number: String,
    pub kind: PropertyKind,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub square_footage: i64,
    pub regular_price: i64,
    pub offer: bool,
    pub discount_price: i64,
    pub parking: bool,
    pub furnished: bool,
    pub owner: Ownership,
}

impl Default for ListingDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            address: String::new(),
            contact_number: String::new(),
            kind: PropertyKind::Unset,
            bedrooms: 1,
            bathrooms: 1,
            square_footage: 500,
            regular_price: 1_000_000,
            offer: false,
            discount_price: 0,
            parking: false,
            furnished: false,
            owner: Ownership::Anonymous,
        }
    }
}

impl ListingDraft {
    /// Empty draft owned by `owner`
    pub fn new(owner: Ownership) -> Self {
        Self {
            owner,
            ..Self::default()
        }
    }

    /// Hydrate a draft from a stored listing for the edit flow.
    ///
    /// Zero or missing numbers fall back to the same defaults a fresh
    /// draft starts with. An anonymous stored owner is replaced by
    /// `fallback_owner`.
    pub fn from_persisted(listing: &PersistedListing, fallback_owner: Ownership) -> Self {
        let defaults = Self::default();
        let owner = match &listing.owner {
            Ownership::Anonymous => fallback_owner,
            owned => owned.clone(),
        };

        Self {
            name: listing.name.clone(),
            description: listing.description.clone(),
            address: listing.address.clone(),
            contact_number: listing.contact_number.clone(),
            kind: listing.kind,
            bedrooms: non_zero_or(listing.bedrooms, defaults.bedrooms),
            bathrooms: non_zero_or(listing.bathrooms, defaults.bathrooms),
            square_footage: non_zero_or(listing.square_footage, defaults.square_footage),
            regular_price: non_zero_or(listing.regular_price, defaults.regular_price),
            offer: listing.offer,
            discount_price: listing.discount_price,
            parking: listing.parking,
            furnished: listing.furnished,
            owner,
        }
    }

    /// Discount actually sent to the gateway: zero unless an offer is on
    /// and the discount sits strictly between zero and the regular price.
    pub fn effective_discount(&self) -> i64 {
        if self.offer && self.discount_price > 0 && self.discount_price < self.regular_price {
            self.discount_price
        } else {
            0
        }
    }
}

fn non_zero_or(value: i64, fallback: i64) -> i64 {
    if value == 0 {
        fallback
    } else {
        value
    }
}

/// Phase-one request body for create and update
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPayload {
    pub name: String,
    pub description: String,
    pub address: String,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub square_footage: i64,
    pub contact_number: String,
    pub regular_price: i64,
    pub discount_price: i64,
    pub offer: bool,
    pub parking: bool,
    pub furnished: bool,
    pub user_ref: Ownership,
}

impl From<&ListingDraft> for ListingPayload {
    fn from(draft: &ListingDraft) -> Self {
        Self {
            name: draft.name.clone(),
            description: draft.description.clone(),
            address: draft.address.clone(),
            kind: draft.kind,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            square_footage: draft.square_footage,
            contact_number: draft.contact_number.clone(),
            regular_price: draft.regular_price,
            discount_price: draft.effective_discount(),
            offer: draft.offer,
            parking: draft.parking,
            furnished: draft.furnished,
            user_ref: draft.owner.clone(),
        }
    }
}

/// Listing as stored by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedListing {
    #[serde(rename = "_id")]
    pub id: ListingId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "type", default)]
    pub kind: PropertyKind,
    #[serde(default)]
    pub bedrooms: i64,
    #[serde(default)]
    pub bathrooms: i64,
    #[serde(default)]
    pub square_footage: i64,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub regular_price: i64,
    #[serde(default)]
    pub discount_price: i64,
    #[serde(default)]
    pub offer: bool,
    #[serde(default)]
    pub parking: bool,
    #[serde(default)]
    pub furnished: bool,
    #[serde(rename = "userRef", default)]
    pub owner: Ownership,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PersistedListing {
    /// Price a buyer pays: the discount when an offer is running.
    pub fn asking_price(&self) -> i64 {
        if self.offer && self.discount_price > 0 {
            self.discount_price
        } else {
            self.regular_price
        }
    }
}

/// Case-insensitive substring match on name, address or property type.
/// An empty term matches every listing.
pub fn matches_search(listing: &PersistedListing, term: &str) -> bool {
    let term = term.to_lowercase();
    [listing.name.as_str(), listing.address.as_str(), listing.kind.as_str()]
        .iter()
        .any(|value| value.to_lowercase().contains(&term))
}

/// Format whole rupees with Indian digit grouping (`50,00,000`).
pub fn format_inr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn searchable() -> PersistedListing {
        serde_json::from_value(json!({
            "_id": "s1",
            "name": "Lakeview Cottage",
            "address": "7 Harbour Road, Kochi, Kerala",
            "type": "rent"
        }))
        .unwrap()
    }

    #[rstest]
    #[case("", true)]
    #[case("lakeview", true)]
    #[case("COTTAGE", true)]
    #[case("kochi", true)]
    #[case("Rent", true)]
    #[case("sale", false)]
    #[case("villa", false)]
    fn search_matches_name_address_or_type(#[case] term: &str, #[case] expected: bool) {
        assert_eq!(matches_search(&searchable(), term), expected);
    }

    #[test]
    fn formats_prices_with_indian_grouping() {
        assert_eq!(format_inr(0), "0");
        assert_eq!(format_inr(999), "999");
        assert_eq!(format_inr(1_000), "1,000");
        assert_eq!(format_inr(100_000), "1,00,000");
        assert_eq!(format_inr(5_000_000), "50,00,000");
        assert_eq!(format_inr(20_000_000), "2,00,00,000");
        assert_eq!(format_inr(-1_500), "-1,500");
    }

    #[test]
    fn anonymous_owner_travels_as_public() {
        let payload = ListingPayload::from(&ListingDraft::default());
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["userRef"], "public");
        assert_eq!(value["type"], "");

        let owned: Ownership = "public".to_string().into();
        assert_eq!(owned, Ownership::Anonymous);
        let owned: Ownership = "u-42".to_string().into();
        assert_eq!(owned, Ownership::Owned("u-42".into()));
    }

    #[test]
    fn payload_zeroes_discount_without_offer() {
        let draft = ListingDraft {
            regular_price: 5_000_000,
            discount_price: 4_000_000,
            offer: false,
            ..ListingDraft::default()
        };
        assert_eq!(ListingPayload::from(&draft).discount_price, 0);

        let draft = ListingDraft { offer: true, ..draft };
        assert_eq!(ListingPayload::from(&draft).discount_price, 4_000_000);

        let draft = ListingDraft {
            discount_price: 5_000_000,
            ..draft
        };
        assert_eq!(ListingPayload::from(&draft).discount_price, 0);
    }

    #[test]
    fn hydration_falls_back_to_defaults_for_missing_numbers() {
        let listing: PersistedListing = serde_json::from_value(json!({
            "_id": "abc123",
            "name": "Sunny Riverside Villa",
            "type": "rent",
            "bedrooms": 0,
            "regularPrice": 7500000,
            "userRef": "public",
            "images": ["https://cdn.example/a.jpg"],
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        let draft = ListingDraft::from_persisted(&listing, Ownership::Owned("seller-1".into()));
        assert_eq!(draft.kind, PropertyKind::Rent);
        assert_eq!(draft.bedrooms, 1);
        assert_eq!(draft.bathrooms, 1);
        assert_eq!(draft.square_footage, 500);
        assert_eq!(draft.regular_price, 7_500_000);
        assert_eq!(draft.owner, Ownership::Owned("seller-1".into()));
        assert!(listing.created_at.is_some());
    }
}
