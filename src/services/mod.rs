//! # Service contracts: the work trait, factories, status, and slots.

mod factory;
mod service;
mod slot;
mod status;

pub use factory::{FactoryFn, FactoryRef, ServiceFactory};
pub use service::{Service, ServiceFn, ServiceRef};
pub use slot::{Metadata, Reference, ServiceSlot, SlotRef};
pub use status::{State, Status};
