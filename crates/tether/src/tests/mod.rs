//! Behavioural test suites for the connection lifecycle.

mod lifecycle_behaviour;
