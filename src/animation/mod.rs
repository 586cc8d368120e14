//! Weight-vector animation: easing curves and the tween state machine.

/// Tween state machine driving weight vectors over wall-clock time.
pub mod driver;
/// Easing presets and custom easing functions.
pub mod ease;
