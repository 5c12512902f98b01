//! Cross-platform utilities
//!
//! - [`fs`] - file and directory helpers returning plain I/O results
//! - [`platform`] - home directory resolution and OS checks

pub mod fs;
pub mod platform;

pub use fs::{copy_dir, copy_file, ensure_dir, ensure_dir_with_mode, is_empty_dir, remove_path};
pub use platform::{get_home_dir, is_windows};
