//! Integration tests for the ciquant binary.
//!
//! These tests run the compiled binary on small generated inputs and check the
//! files it writes.

mod helpers;
mod test_credibility_command;
mod test_error_paths;
mod test_intervals_command;
mod test_sample_command;
