//! Session module — registration, login, refresh rotation, lookup, logout
//!
//! Every state transition runs through the [`SessionActor`]; callers hold
//! a cloneable [`SessionHandle`].

pub mod actor;
pub mod types;

pub use actor::{SessionActor, SessionHandle};
pub use types::{TokenPair, UserDetails, UserLookup};
