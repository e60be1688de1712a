//! This crate provides the Belly Button Biodiversity data server. It exposes a read-only SQLite
//! dataset of operational taxonomic unit (OTU) counts and sample metadata as JSON over HTTP, for
//! consumption by a browser dashboard.
//!
//! The dataset has three tables:
//!
//! * `otu`: the taxonomic unit catalog.
//! * `samples`: a wide count matrix with one row per taxonomic unit and one column per sample.
//! * `samples_metadata`: demographics and weekly washing frequency for each sample.
//!
//! Their expected shape is declared in [schema] and checked when the server starts.
//!
//! The server is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs serialisation of JSON response data.
//! * [SQLx](sqlx) provides pooled asynchronous access to the SQLite store.

pub mod app;
pub mod app_state;
pub mod cli;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod operations;
pub mod schema;
pub mod server;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod validated_path;
