//! Seller-side core of a property-listing marketplace: field validation,
//! draft and image-set state, and the two-phase submission to the listing
//! gateway.

pub mod config;
pub mod form;
pub mod gateway;
pub mod images;
pub mod models;
pub mod validation;
pub mod workflow;

pub use config::GatewayConfig;
pub use form::{Direction, ListingForm, Toggle};
pub use gateway::{GatewayError, HttpGateway, ListingGateway, Session};
pub use images::{ImageSet, ImageSetError, PendingImage};
pub use models::{ListingDraft, ListingId, Ownership, PersistedListing, PropertyKind};
pub use validation::{ErrorMap, Field};
pub use workflow::{Destination, ListingWorkflow, Mode, Stage, WorkflowError};
