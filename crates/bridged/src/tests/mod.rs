//! Test suites for the bridge daemon.

mod socket_behaviour;
mod support;
