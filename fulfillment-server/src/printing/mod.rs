//! Kitchen ticket print tracking

pub mod tracker;

pub use tracker::apply_print_entries;
