pub mod auth;
pub mod credentials;
pub mod middleware;
pub mod pages;
