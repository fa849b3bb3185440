//! Type definitions

pub mod batch;
pub mod messages;
pub mod order;
pub mod reference;
pub mod route;
pub mod stop;

pub use batch::*;
pub use messages::*;
pub use order::*;
pub use reference::*;
pub use route::*;
pub use stop::*;
