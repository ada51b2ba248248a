//! HTTP surface of binwatch.
//!
//! - `POST /api/trash-full` — the bin sensor's trigger
//! - `GET  /api/notifications` — recent queue entries
//! - `GET  /api/notifications/{id}` — one queue entry
//! - `GET  /health`

pub mod routes;
pub mod state;
