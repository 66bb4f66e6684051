//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing the beginning of a period.
#[derive(Clone, Copy, Debug)]
pub struct Beginning;

/// Marker type describing the end of a period.
#[derive(Clone, Copy, Debug)]
pub struct Ending;
