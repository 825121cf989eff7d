/// Response ingestion for the observations API.
///
/// - `normalize` — wire value → typed value (dates, measurements, coordinates).
/// - `waves`     — response body → validated `Observation`.
///
/// When the tides and met endpoints get retrieval operations, their parsers
/// get their own file here rather than growing `waves`.

pub mod normalize;
pub mod waves;

#[cfg(test)]
pub mod fixtures;
