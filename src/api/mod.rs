//! API Module
//!
//! Front HTTP API used to drive a node's group from outside the cluster.
//!
//! # Endpoints
//! - `GET /api?key=<key>` - Fetch a value through the group
//! - `GET /stats` - Get group statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
