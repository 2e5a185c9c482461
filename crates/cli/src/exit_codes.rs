//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Reconciled: no changes, no new/missing lines, no anomalies |
//! | 1    | Discrepancies found (changes, new/missing lines, anomalies) |
//! | 2    | CLI usage error (bad args)                                 |
//! | 3    | Invalid config (TOML parse or validation)                  |
//! | 4    | Invalid input document (JSON shape)                        |
//! | 5    | Runtime / IO failure (read, write, serialize)              |

/// Success - invoice reconciles cleanly against the order.
pub const EXIT_SUCCESS: u8 = 0;

/// Discrepancies found. Like `diff(1)`, exit 1 means "they differ."
pub const EXIT_RECON_DISCREPANCIES: u8 = 1;

/// Usage error - bad arguments, e.g. a negative tolerance flag.
pub const EXIT_USAGE: u8 = 2;

/// Config file failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 3;

/// Input document is not a valid reconciliation request.
pub const EXIT_RECON_INVALID_INPUT: u8 = 4;

/// Could not read input, write output, or serialize the result.
pub const EXIT_RECON_RUNTIME: u8 = 5;
