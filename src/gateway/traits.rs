use async_trait::async_trait;

use super::error::GatewayError;
use crate::images::PendingImage;
use crate::models::{ListingId, ListingPayload, PersistedListing};

/// Remote store for listings and their images
///
/// The workflow only talks to listings through this trait, so tests and
/// alternative transports can stand in for the HTTP client.
#[async_trait]
pub trait ListingGateway: Send + Sync {
    /// Persist a new listing and return its server-assigned id
    async fn create_listing(&self, listing: &ListingPayload) -> Result<ListingId, GatewayError>;

    async fn update_listing(
        &self,
        id: &ListingId,
        listing: &ListingPayload,
    ) -> Result<(), GatewayError>;

    /// Upload images in the given order
    async fn upload_images(
        &self,
        id: &ListingId,
        images: &[PendingImage],
    ) -> Result<(), GatewayError>;

    /// Fetch one listing; `Ok(None)` when it does not exist
    async fn get_listing(&self, id: &ListingId) -> Result<Option<PersistedListing>, GatewayError>;

    /// Irreversibly delete a listing
    async fn delete_listing(&self, id: &ListingId) -> Result<(), GatewayError>;

    /// Remove one stored image from a listing
    async fn delete_image(&self, id: &ListingId, image_url: &str) -> Result<(), GatewayError>;

    async fn list_listings(&self) -> Result<Vec<PersistedListing>, GatewayError>;

    /// Name of the backend, for logs
    fn gateway_name(&self) -> &'static str;
}
