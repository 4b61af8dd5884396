//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing a start of some term.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing a moment something becomes due.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// Marker type describing a payment settlement.
#[derive(Clone, Copy, Debug)]
pub struct Payment;
