pub mod auth;
pub mod genre;
pub mod retry;
pub mod upstream;
