pub mod auth;
pub mod chapters;
pub mod install;
pub mod manga;
pub mod taxonomy;
pub mod upload;
pub mod users;
