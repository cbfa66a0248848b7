mod api;
mod pages;

pub use api::{bulk_handler, generate_handler, get_generated};
pub use pages::{generator_page, verify_page, welcome};
