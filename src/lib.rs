//! Intersection Microsimulation Library
//!
//! A discrete-time simulation of a single signalized road intersection:
//! Poisson vehicle arrivals, a multi-mode signal controller, per-vehicle
//! kinematics, and level-of-service metrics. Runs headless; rendering is
//! left to external callers reading the live vehicle collection.

pub mod simulation;
