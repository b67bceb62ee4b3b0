//! Mock device implementations for testing and development.
//!
//! This module provides simulated door peripherals that can be controlled
//! and observed programmatically without requiring physical hardware.

pub mod actuator;
pub mod button;

// Re-export commonly used types
pub use actuator::MockActuator;
pub use button::MockButton;
