//! # SweepLib
//!
//! SweepLib drives an external cache simulator across a parameter space and collects the results
//!
//! It enumerates every legal cache configuration, runs the simulator once per trace and
//! configuration on a bounded pool of workers, and writes the L1 average access time of each run
//! to a CSV table. A separate report step reduces that table to the best block size for each
//! cache geometry and L2 policy.

/// Contains the layout and loading of the sweep configuration
pub mod config;

/// Generates the configurations of a sweep
pub mod enumerator;

/// Contains the contract with the external simulator: its flags, its output, and a trait for
/// running it
pub mod simulator;

/// Runs simulations on a pool of worker threads, reporting progress through an observer
pub mod dispatcher;

/// Collects results into the sorted result table, and reads and writes it as CSV
pub mod aggregate;

/// Reduces a result table to the best block size per cache geometry and policy
pub mod report;

/// Ties enumeration, dispatch and aggregation together
pub mod sweep;

/// Contains the error types for a single run and for a whole sweep
pub mod error;

#[cfg(test)]
mod test;
