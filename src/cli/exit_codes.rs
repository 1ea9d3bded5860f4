//! process exit codes of `ctlcond`
//!
//! scripts can tell a hidden control apart from a broken rule file without
//! parsing output. JSON error envelopes carry the same code as `-32000 - code`.

pub const SUCCESS: i32 = 0;

/// anything not covered below, including errors returned from `main`
pub const ERROR: i32 = 1;

/// a control named on the command line has no rules
pub const CONTROL_NOT_FOUND: i32 = 2;

/// rule or settings file missing, unreadable or malformed
pub const RULES_ERROR: i32 = 3;

pub const INVALID_ARGS: i32 = 4;

/// config file unreadable or failing `config verify`
pub const CONFIG_ERROR: i32 = 5;

/// `check --fail-hidden` found a hidden control
pub const CONTROL_HIDDEN: i32 = 6;
