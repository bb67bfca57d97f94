//! Test suites for the thermocouple simulation daemon.

pub(crate) mod support;
