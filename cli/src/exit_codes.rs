//! # Exit Codes
//!
//! Standard exit codes for the Lore CLI, meaningful to scripts and CI.

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// General error (unspecified)
pub const EXIT_ERROR: i32 = 1;

/// Invalid input (empty text, bad scope pairing)
pub const EXIT_INVALID_INPUT: i32 = 6;

/// Knowledge store unavailable
pub const EXIT_STORE_ERROR: i32 = 7;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_ERROR, EXIT_INVALID_INPUT, EXIT_STORE_ERROR];
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }
}
