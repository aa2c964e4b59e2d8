use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use super::error::GatewayError;
use crate::models::{ListingId, PersistedListing};

/// Role a user signs in as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

/// Signup request body
#[derive(Debug, Clone, Serialize)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: Role,
}

/// Account details shown and edited on the profile page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
struct FieldMessage {
    field: String,
    message: String,
}

/// Interpret a gateway response body.
///
/// An empty body becomes `{"success": <status ok>}`. A body with an
/// `errors` array is always a rejection carrying the per-field messages.
/// Any other non-2xx body is a rejection with its `message`, or
/// `fallback` when there is none.
pub(crate) fn parse_body(status: u16, text: &str, fallback: &str) -> Result<Value, GatewayError> {
    let ok = (200..300).contains(&status);
    if text.trim().is_empty() {
        return if ok {
            Ok(json!({ "success": true }))
        } else {
            Err(GatewayError::rejected(status, fallback))
        };
    }

    let data: Value = match serde_json::from_str(text) {
        Ok(data) => data,
        Err(e) => {
            warn!("Unparseable gateway response ({}): {}", status, e);
            return Err(GatewayError::Malformed("Invalid JSON response".into()));
        }
    };

    if let Some(errors) = data.get("errors").filter(|e| e.is_array()) {
        let field_errors: BTreeMap<String, String> =
            serde_json::from_value::<Vec<FieldMessage>>(errors.clone())
                .unwrap_or_default()
                .into_iter()
                .map(|e| (e.field, e.message))
                .collect();
        return Err(GatewayError::Rejected {
            status,
            message: message_of(&data).unwrap_or("Validation failed").to_string(),
            field_errors,
        });
    }

    if !ok {
        return Err(GatewayError::rejected(
            status,
            message_of(&data).unwrap_or(fallback),
        ));
    }

    Ok(data)
}

fn message_of(data: &Value) -> Option<&str> {
    data.get("message").and_then(Value::as_str).filter(|m| !m.is_empty())
}

/// Pull the new listing's id out of a create response.
pub(crate) fn extract_listing_id(data: &Value) -> Result<ListingId, GatewayError> {
    data.get("listingId")
        .or_else(|| data.pointer("/listing/_id"))
        .or_else(|| data.get("_id"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(ListingId::new)
        .ok_or_else(|| GatewayError::Malformed("Response did not include a listing id".into()))
}

/// Single listings arrive under `listing`, under `data`, or bare.
/// Profile from `{ user: {...} }` or the bare body.
pub(crate) fn unwrap_profile(data: Value) -> Result<Profile, GatewayError> {
    let inner = match data {
        Value::Object(mut map) => map.remove("user").unwrap_or(Value::Object(map)),
        other => other,
    };
    serde_json::from_value(inner)
        .map_err(|e| GatewayError::Malformed(format!("Unexpected profile shape: {e}")))
}

pub(crate) fn unwrap_listing(data: Value) -> Result<PersistedListing, GatewayError> {
    let inner = match data {
        Value::Object(mut map) => {
            if let Some(listing) = map.remove("listing") {
                listing
            } else if let Some(listing) = map.remove("data") {
                listing
            } else {
                Value::Object(map)
            }
        }
        other => other,
    };
    serde_json::from_value(inner)
        .map_err(|e| GatewayError::Malformed(format!("Unexpected listing shape: {e}")))
}

/// Listing collections arrive under `listings`, as a bare array, or under `data`.
pub(crate) fn unwrap_listings(data: Value) -> Result<Vec<PersistedListing>, GatewayError> {
    let items = match data {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => map
            .remove("listings")
            .or_else(|| map.remove("data"))
            .unwrap_or_else(|| Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
    };
    serde_json::from_value(items)
        .map_err(|e| GatewayError::Malformed(format!("Unexpected listings shape: {e}")))
}

/// Stored image references that are not already URLs point at the
/// gateway's image endpoint.
pub(crate) fn resolve_image_url(base_url: &str, image: &str) -> String {
    if image.starts_with("http") {
        image.to_string()
    } else {
        format!("{base_url}/api/listings/image/{image}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn empty_success_body_is_success() {
        let data = parse_body(204, "", "Failed").unwrap();
        assert_eq!(data["success"], true);
        assert_matches!(
            parse_body(500, "", "Failed to delete listing"),
            Err(GatewayError::Rejected { status: 500, message, .. }) if message == "Failed to delete listing"
        );
    }

    #[test]
    fn errors_array_becomes_field_map() {
        let body = r#"{"message":"Bad listing","errors":[{"field":"name","message":"Too short"},{"field":"regularPrice","message":"Too low"}]}"#;
        let err = parse_body(400, body, "Failed").unwrap_err();
        assert_matches!(&err, GatewayError::Rejected { message, field_errors, .. } => {
            assert_eq!(message, "Bad listing");
            assert_eq!(field_errors.get("name").map(String::as_str), Some("Too short"));
            assert_eq!(field_errors.len(), 2);
        });

        let err = parse_body(400, r#"{"errors":[]}"#, "Failed").unwrap_err();
        assert_matches!(err, GatewayError::Rejected { message, .. } if message == "Validation failed");
    }

    #[test]
    fn non_json_body_is_malformed() {
        assert_matches!(
            parse_body(200, "<html>oops</html>", "Failed"),
            Err(GatewayError::Malformed(m)) if m == "Invalid JSON response"
        );
    }

    #[test]
    fn rejection_uses_server_message_or_fallback() {
        assert_matches!(
            parse_body(403, r#"{"message":"Not your listing"}"#, "Failed to update listing"),
            Err(GatewayError::Rejected { status: 403, message, .. }) if message == "Not your listing"
        );
        assert_matches!(
            parse_body(403, r#"{"ok":false}"#, "Failed to update listing"),
            Err(GatewayError::Rejected { message, .. }) if message == "Failed to update listing"
        );
    }

    #[test]
    fn listing_id_lookup() {
        assert_eq!(
            extract_listing_id(&json!({"listingId": "l1"})).unwrap(),
            ListingId::new("l1")
        );
        assert_eq!(
            extract_listing_id(&json!({"listing": {"_id": "l2"}})).unwrap(),
            ListingId::new("l2")
        );
        assert_matches!(
            extract_listing_id(&json!({"success": true})),
            Err(GatewayError::Malformed(_))
        );
    }

    #[test]
    fn listing_shapes_are_unwrapped() {
        let bare = json!({"_id": "a", "name": "Quiet Hill House"});
        assert_eq!(unwrap_listing(bare).unwrap().name, "Quiet Hill House");

        let nested = json!({"success": true, "listing": {"_id": "b"}});
        assert_eq!(unwrap_listing(nested).unwrap().id, ListingId::new("b"));

        let under_data = json!({"data": [{"_id": "c"}, {"_id": "d"}]});
        assert_eq!(unwrap_listings(under_data).unwrap().len(), 2);

        let array = json!([{"_id": "e"}]);
        assert_eq!(unwrap_listings(array).unwrap().len(), 1);

        assert!(unwrap_listings(json!({"success": true})).unwrap().is_empty());
    }

    #[test]
    fn image_ids_become_urls() {
        assert_eq!(
            resolve_image_url("http://localhost:5000", "65f0c0ffee"),
            "http://localhost:5000/api/listings/image/65f0c0ffee"
        );
        assert_eq!(
            resolve_image_url("http://localhost:5000", "https://cdn.example/x.jpg"),
            "https://cdn.example/x.jpg"
        );
    }

    #[test]
    fn profile_accepts_bare_and_wrapped_bodies() {
        let bare = json!({"name": "Asha", "email": "asha@example.com", "phone": "9876543210", "role": "seller"});
        let profile = unwrap_profile(bare).unwrap();
        assert_eq!(profile.role, Some(Role::Seller));
        assert_eq!(profile.phone, "9876543210");

        let wrapped = json!({"user": {"name": "Ravi", "email": "ravi@example.com"}});
        let profile = unwrap_profile(wrapped).unwrap();
        assert_eq!(profile.name, "Ravi");
        assert!(profile.phone.is_empty());
        assert_eq!(profile.role, None);

        assert_matches!(unwrap_profile(json!([1, 2])), Err(GatewayError::Malformed(_)));
    }
}
