//! Geodesic measurement of drawn shapes.
//!
//! Distances use the haversine formula and areas use the Chamberlain & Duquette
//! spherical-excess approximation, both on the same sphere so that lengths and
//! areas reported for a session are consistent with each other.

use thiserror::Error;

use crate::constants::EARTH_RADIUS_M;
use crate::types::LatLon;

/// Errors raised when a measurement is asked of malformed geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasureError {
    /// Not enough vertices for the requested measurement
    #[error("invalid input: at least {needed} vertices required, got {got}")]
    InvalidInput {
        /// Minimum vertex count
        needed: usize,
        /// Vertex count that was supplied
        got: usize,
    },
    /// A vertex had a NaN or infinite component
    #[error("invalid input: vertex {index} is not a finite coordinate")]
    NonFinite {
        /// Position of the offending vertex
        index: usize,
    },
}

fn validate(vertices: &[LatLon], needed: usize) -> Result<(), MeasureError> {
    if vertices.len() < needed {
        return Err(MeasureError::InvalidInput {
            needed,
            got: vertices.len(),
        });
    }
    if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
        return Err(MeasureError::NonFinite { index });
    }
    Ok(())
}

/// Great-circle distance in meters between two positions.
pub fn distance(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Total length in meters of the path through `vertices`, in order.
///
/// Fails with [`MeasureError::InvalidInput`] when fewer than two vertices are given.
pub fn path_length(vertices: &[LatLon]) -> Result<f64, MeasureError> {
    validate(vertices, 2)?;
    Ok(vertices.windows(2).map(|w| distance(w[0], w[1])).sum())
}

/// Unsigned area in square meters enclosed by `ring`.
///
/// The ring is closed implicitly from the last vertex back to the first. Winding
/// direction does not affect the result. Fails with [`MeasureError::InvalidInput`]
/// when fewer than three vertices are given.
pub fn ring_area(ring: &[LatLon]) -> Result<f64, MeasureError> {
    validate(ring, 3)?;

    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % n];
        sum += (p2.lon - p1.lon).to_radians()
            * (2.0 + p1.lat.to_radians().sin() + p2.lat.to_radians().sin());
    }

    Ok((sum * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs())
}
