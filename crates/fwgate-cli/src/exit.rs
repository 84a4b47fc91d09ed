//! Process exit codes

use fwgate_core::Error;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_AUTH: u8 = 2;
pub const EXIT_NOT_FOUND: u8 = 3;

/// First fwgate error in the chain, if any
pub fn fwgate_error(err: &anyhow::Error) -> Option<&Error> {
    err.chain().find_map(|e| e.downcast_ref::<Error>())
}

/// Exit code for a failed run; cancellation counts as success
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match fwgate_error(err) {
        Some(Error::Cancelled) => EXIT_SUCCESS,
        Some(Error::Auth(_)) => EXIT_AUTH,
        Some(Error::NotFound(_)) => EXIT_NOT_FOUND,
        _ => EXIT_FAILURE,
    }
}
