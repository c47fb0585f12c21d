//! HTTP protocol layer module
//!
//! Response builders for every status the server emits, decoupled from
//! routing and business logic.

pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_405_response, build_html_response, build_options_response,
};
