//! Test suites for the Panda gateway.

pub(crate) mod support;
mod unit;
