//! Query routing.
//!
//! - [`decision::RoutingDecision`]: which capabilities a query needs and
//!   whether the decision-memo gate applies
//! - [`router::Router`]: rule-based intent classifier producing decisions

pub mod decision;
pub mod router;
