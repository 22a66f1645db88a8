//! Core data structures representing molecular structures and parametrized topologies.
//!
//! - [`types`] – Periodic table elements and bond orders.
//! - [`atom`] – Input atom: element and formal charge.
//! - [`system`] – Untyped structures as delivered by readers.
//! - [`graph`] – The connectivity graph that typing runs on, with ring and aromaticity perception.
//! - [`topology`] – Typed graph plus parametrized bonded terms.
//!
//! The data model separates the raw structure ([`System`]) from the perceived graph
//! ([`MolecularGraph`]) and the final [`ParametrizedTopology`], so the
//! [`crate::apply`] pipeline can move one into the next without hidden state.
//!
//! [`System`]: system::System
//! [`MolecularGraph`]: graph::MolecularGraph
//! [`ParametrizedTopology`]: topology::ParametrizedTopology

pub mod atom;
pub mod graph;
pub mod system;
pub mod topology;
pub mod types;
