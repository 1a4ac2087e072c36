//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a JSON value with an optional TTL
//! - `GET /get/:key` - Retrieve a value by key
//! - `GET /has/:key` - Check whether a key is live
//! - `DELETE /del/:key` - Delete a key
//! - `POST /invalidate` - Delete keys by glob pattern
//! - `DELETE /clear` - Empty a store
//! - `GET /stats` - Get store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
