mod cors;
mod not_found;

pub use cors::{no_content_preflight, preflight_handler};
pub use not_found::not_found_handler;
