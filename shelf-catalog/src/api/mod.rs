//! HTTP API handlers for shelf-catalog

pub mod books;
pub mod health;
pub mod identity;
pub mod json;
pub mod ratings;
pub mod reviews;

pub use books::book_routes;
pub use health::health_routes;
pub use identity::{USER_ID_HEADER, USER_ROLES_HEADER};
pub use json::ApiJson;
pub use ratings::rating_routes;
pub use reviews::review_routes;
