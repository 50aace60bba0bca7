//! Tests for the mismatch objective and the telescope search.

mod config_files;
mod mismatch;
mod telescope_search;
