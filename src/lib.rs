// library crate for control-conditions
// the ctlcond and generate-man binaries are thin wrappers over these modules

pub mod cli;
pub mod conditions;
pub mod config;
pub mod registry;
