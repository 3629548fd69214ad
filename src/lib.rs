//! Braess's Paradox Simulation Library
//!
//! A headless microsimulation of traffic on a small road network, showing how
//! opening a shortcut can slow every selfish driver down.

pub mod simulation;
