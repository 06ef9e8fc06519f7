pub mod auth;
pub mod install;
pub mod validation;
pub mod views;

pub use auth::{AuthService, Principal};
pub use install::InstallService;
