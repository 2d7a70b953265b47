//! HTTP prediction service.
//!
//! This module exposes the single `POST /predict-audio` endpoint backed by
//! the shared `AppContext`: it accepts an uploaded recording or a path
//! reference, runs feature extraction and inference, and maps every outcome
//! to the documented JSON shapes.

mod routes;

pub use routes::{build_router, run_http_server};
