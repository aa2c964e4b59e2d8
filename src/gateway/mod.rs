pub mod auth;
pub mod error;
pub mod http;
pub mod traits;
pub mod types;

pub use auth::{ownership_of, Session, SessionUser};
pub use error::{GatewayError, GENERIC_FAILURE};
pub use http::HttpGateway;
pub use traits::ListingGateway;
pub use types::{Profile, Role, Signup};
