//! Business logic services

pub mod batch_lifecycle;
pub mod ordering;
pub mod preview;
pub mod pricing;
pub mod sequencer;
pub mod vehicle_rule;
