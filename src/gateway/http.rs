use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::auth::Session;
use super::error::GatewayError;
use super::traits::ListingGateway;
use super::types::{
    extract_listing_id, parse_body, resolve_image_url, unwrap_listing, unwrap_listings,
    unwrap_profile, LoginRequest, Profile, Role, Signup,
};
use crate::config::GatewayConfig;
use crate::images::PendingImage;
use crate::models::{ListingId, ListingPayload, PersistedListing};

/// Listing gateway over the marketplace REST API
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    session: Option<Session>,
}

impl HttpGateway {
    /// Create a gateway client; `session` is attached to every call when present.
    pub fn new(config: &GatewayConfig, session: Option<Session>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("listing-desk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            session,
        })
    }

    /// Same client, different session (e.g. after logging in).
    pub fn with_session(mut self, session: Option<Session>) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session {
            Some(session) => request.bearer_auth(session.token()),
            None => request,
        }
    }

    async fn fetch(&self, request: RequestBuilder) -> Result<(StatusCode, String), GatewayError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("Gateway answered {} with {} bytes", status, text.len());
        Ok((status, text))
    }

    async fn call(&self, request: RequestBuilder, fallback: &str) -> Result<Value, GatewayError> {
        let (status, text) = self.fetch(request).await?;
        parse_body(status.as_u16(), &text, fallback)
    }

    fn resolve_images(&self, mut listing: PersistedListing) -> PersistedListing {
        listing.images = listing
            .images
            .iter()
            .map(|image| resolve_image_url(&self.base_url, image))
            .collect();
        listing
    }

    /// Sign in and return the session for the issued token.
    pub async fn login(&self, email: &str, password: &str, role: Role) -> Result<Session, GatewayError> {
        let request = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest { email, password, role });
        let (status, text) = self.fetch(request).await?;
        let data = parse_body(status.as_u16(), &text, "Login failed")?;
        session_from(&data)
    }

    /// Register a new account. Returns a session when the gateway signs the
    /// user in straight away.
    pub async fn signup(&self, signup: &Signup) -> Result<Option<Session>, GatewayError> {
        let request = self.client.post(self.url("/api/auth/signup")).json(signup);
        let (status, text) = self.fetch(request).await?;
        let data = parse_body(status.as_u16(), &text, "Signup failed")?;
        Ok(session_from(&data).ok())
    }

    /// Ask the gateway whether a stored token is still valid.
    pub async fn verify_token(&self, token: &str) -> Result<Session, GatewayError> {
        let request = self
            .client
            .get(self.url("/api/auth/verify"))
            .bearer_auth(token);
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        parse_body(status.as_u16(), &text, "Token verification failed")?;
        Ok(Session::from_token(token))
    }

    /// Account details of the signed-in user.
    pub async fn profile(&self) -> Result<Profile, GatewayError> {
        let request = self.client.get(self.url("/api/auth/profile"));
        let data = self.call(request, "Failed to fetch user data").await?;
        unwrap_profile(data)
    }

    pub async fn update_profile(&self, profile: &Profile) -> Result<(), GatewayError> {
        info!("Updating profile for {}", profile.email);
        let request = self.client.put(self.url("/api/auth/profile")).json(profile);
        self.call(request, "Failed to update profile").await?;
        Ok(())
    }
}

fn image_part(image: &PendingImage) -> Result<Part, GatewayError> {
    Part::bytes(image.data.clone())
        .file_name(image.file_name.clone())
        .mime_str(&image.media_type)
        .map_err(|_| GatewayError::InvalidUpload {
            file_name: image.file_name.clone(),
            media_type: image.media_type.clone(),
        })
}

fn session_from(data: &Value) -> Result<Session, GatewayError> {
    data.get("token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(Session::from_token)
        .ok_or_else(|| GatewayError::Malformed("Response did not include a token".into()))
}

#[async_trait]
impl ListingGateway for HttpGateway {
    async fn create_listing(&self, listing: &ListingPayload) -> Result<ListingId, GatewayError> {
        info!("Creating listing {:?}", listing.name);
        let request = self.client.post(self.url("/api/listings")).json(listing);
        let data = self.call(request, "Failed to create listing").await?;
        let id = extract_listing_id(&data)?;
        info!("✅ Listing {} created", id);
        Ok(id)
    }

    async fn update_listing(
        &self,
        id: &ListingId,
        listing: &ListingPayload,
    ) -> Result<(), GatewayError> {
        info!("Updating listing {}", id);
        let request = self
            .client
            .put(self.url(&format!("/api/listings/{id}")))
            .json(listing);
        self.call(request, "Failed to update listing").await?;
        Ok(())
    }

    async fn upload_images(
        &self,
        id: &ListingId,
        images: &[PendingImage],
    ) -> Result<(), GatewayError> {
        info!("Uploading {} image(s) to listing {}", images.len(), id);
        let mut form = Form::new();
        for image in images {
            form = form.part("images", image_part(image)?);
        }

        let request = self
            .client
            .post(self.url(&format!("/api/listings/{id}/upload-images")))
            .multipart(form);
        self.call(request, "Image upload failed").await?;
        Ok(())
    }

    async fn get_listing(&self, id: &ListingId) -> Result<Option<PersistedListing>, GatewayError> {
        debug!("Fetching listing {}", id);
        let request = self.client.get(self.url(&format!("/api/listings/{id}")));
        let (status, text) = self.fetch(request).await?;
        if status == StatusCode::NOT_FOUND {
            warn!("Listing {} not found", id);
            return Ok(None);
        }
        let fallback = format!("Failed to fetch listing: {}", status.as_u16());
        let data = parse_body(status.as_u16(), &text, &fallback)?;
        if data.is_null() {
            return Ok(None);
        }
        Ok(Some(self.resolve_images(unwrap_listing(data)?)))
    }

    async fn delete_listing(&self, id: &ListingId) -> Result<(), GatewayError> {
        info!("Deleting listing {}", id);
        let request = self.client.delete(self.url(&format!("/api/listings/{id}")));
        self.call(request, "Failed to delete listing").await?;
        Ok(())
    }

    async fn delete_image(&self, id: &ListingId, image_url: &str) -> Result<(), GatewayError> {
        debug!("Deleting image {} from listing {}", image_url, id);
        let request = self
            .client
            .delete(self.url(&format!("/api/listings/{id}/images")))
            .json(&json!({ "imageUrl": image_url }));
        self.call(request, "Failed to delete image").await?;
        Ok(())
    }

    async fn list_listings(&self) -> Result<Vec<PersistedListing>, GatewayError> {
        let request = self.client.get(self.url("/api/listings"));
        let (status, text) = self.fetch(request).await?;
        let fallback = format!("Failed to fetch listings: {}", status.as_u16());
        let data = parse_body(status.as_u16(), &text, &fallback)?;
        let listings: Vec<PersistedListing> = unwrap_listings(data)?
            .into_iter()
            .map(|listing| self.resolve_images(listing))
            .collect();
        info!("Fetched {} listing(s)", listings.len());
        Ok(listings)
    }

    fn gateway_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(session: Option<Session>) -> HttpGateway {
        HttpGateway::new(&GatewayConfig::new("http://localhost:5000/"), session).unwrap()
    }

    #[test]
    fn bad_media_type_is_a_local_error() {
        let image = PendingImage::new("scan.jpg", "not a media type", vec![1, 2, 3]);
        let err = image_part(&image).unwrap_err();
        assert!(matches!(
            &err,
            GatewayError::InvalidUpload { file_name, .. } if file_name == "scan.jpg"
        ));
        assert_eq!(err.message_or("Failed to upload images"), err.to_string());

        assert!(image_part(&PendingImage::new("ok.png", "image/png", vec![1])).is_ok());
    }

    #[test]
    fn builds_urls_from_trimmed_base() {
        let gateway = gateway(None);
        assert_eq!(gateway.url("/api/listings"), "http://localhost:5000/api/listings");
    }

    #[test]
    fn attaches_bearer_token_only_with_session() {
        let anonymous = gateway(None);
        let request = anonymous
            .authorize(anonymous.client.get(anonymous.url("/api/listings")))
            .build()
            .unwrap();
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());

        let signed_in = anonymous.with_session(Some(Session::from_token("tok")));
        let request = signed_in
            .authorize(signed_in.client.get(signed_in.url("/api/listings")))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer tok"
        );
    }

    #[test]
    fn resolves_stored_image_ids() {
        let gateway = gateway(None);
        let listing: PersistedListing = serde_json::from_value(json!({
            "_id": "l1",
            "images": ["abc", "https://cdn.example/x.jpg"]
        }))
        .unwrap();
        let listing = gateway.resolve_images(listing);
        assert_eq!(
            listing.images,
            vec![
                "http://localhost:5000/api/listings/image/abc".to_string(),
                "https://cdn.example/x.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn login_response_must_carry_a_token() {
        assert!(session_from(&json!({"token": "a.b.c"})).is_ok());
        assert!(session_from(&json!({"success": true})).is_err());
    }
}
