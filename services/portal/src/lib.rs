//! Renovar donor portal
//!
//! Client-side core of the recycling-donation portal: account sign-up and
//! sign-in, profile completion, route guarding, postal-code auto-fill,
//! onboarding and the donation dashboard, all against the remote profile
//! gateway.

pub mod app;
pub mod cep;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod jwt;
pub mod models;
pub mod onboarding;
pub mod routes;
pub mod session;
pub mod validation;

pub use app::Portal;
pub use config::PortalConfig;
pub use error::{PortalError, PortalResult};
pub use gateway::{HttpGateway, ProfileGateway};
pub use routes::{Navigation, Route};
pub use session::SessionStore;
