//! HTTP API handlers for meterd-api

pub mod confirm;
pub mod error;
pub mod health;
pub mod list;
pub mod upload;

pub use confirm::confirm_measurement;
pub use error::ApiError;
pub use health::health_routes;
pub use list::list_measurements;
pub use upload::upload_measurement;

use uuid::Uuid;

/// Fabricated URL for a stored meter image. Image storage itself is out of
/// scope; the URL shape matches what the storage service would serve.
pub fn image_url(base_url: &str, uuid: &Uuid) -> String {
    format!("{}/{}.png", base_url, uuid)
}
