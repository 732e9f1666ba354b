//! Capability agents as seen by the domain.
//!
//! The set of skills is closed: [`Capability`](entities::Capability) has one
//! variant per agent kind, and the router returns sets of these tags rather
//! than references to concrete agents.

pub mod entities;
pub mod value_objects;
