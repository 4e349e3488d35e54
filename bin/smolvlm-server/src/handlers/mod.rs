//! Request-processing steps shared by the route handlers.

pub mod inference;
pub mod normalize;
