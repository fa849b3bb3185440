//! Database query functions

pub mod batch;
pub mod order;
pub mod reference;
