//! HTTP service wiring, exposed as a library so integration tests can
//! drive the real router.

pub mod routes;
pub mod state;
