//! Request handler module
//!
//! Routing dispatch and the greeting responder. The router plays the part
//! the hosting container played in the original deployment: method
//! defaults, path binding, and access logging all live here, while the
//! greeting responder stays a pure function from request to response.

pub mod greeting;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
