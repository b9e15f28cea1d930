pub mod progress_utils;
pub mod schedule;
pub mod test_utils;
