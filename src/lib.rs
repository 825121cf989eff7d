//! coastal_monitoring_client: client for the Coastal Monitoring observations API.
//!
//! Authenticates with a static API key, requests wave observations for a
//! sensor at a point in time, and turns the GeoJSON-style response into
//! validated, typed records that can be exported as a time-indexed table.
//!
//! # Module structure
//!
//! ```text
//! coastal_monitoring_client
//! ├── model       — shared data types (Observation, Feature, PropertiesWave, ClientError, …)
//! ├── glossary    — wave parameter registry: codes, descriptive names, units
//! ├── ingest
//! │   ├── normalize — wire values → typed values (dates, measurements, coordinates)
//! │   ├── waves     — response body → Observation
//! │   └── fixtures (test only) — representative API response payloads
//! ├── export      — rows, column renaming, CSV / text output
//! ├── client      — transport seam, scoped session, request building
//! ├── config      — TOML + environment configuration
//! └── logging     — tracing subscriber setup and failure classification
//! ```
//!
//! # Example
//!
//! ```
//! use coastal_monitoring_client::ingest::waves::parse_observation;
//!
//! let body = r#"{"type": "FeatureCollection", "features": []}"#;
//! let observation = parse_observation(body)?;
//! assert!(observation.to_table(true).is_empty());
//! # Ok::<(), coastal_monitoring_client::ClientError>(())
//! ```

pub mod client;
pub mod config;
pub mod export;
pub mod glossary;
pub mod ingest;
pub mod logging;
pub mod model;

pub use client::{CoastalMonitoringClient, HttpTransport, Session, Transport, TransportResponse};
pub use config::ClientConfig;
pub use model::{ClientError, Coordinates, Endpoint, Feature, Geometry, Observation, PropertiesWave};
