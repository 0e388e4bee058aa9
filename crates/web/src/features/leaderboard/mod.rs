pub mod handlers;
pub mod render;
pub mod routes;
pub mod services;
pub mod sessions;
pub mod view;
