//! Core types shared by every installer component.
//!
//! At the moment this is the error taxonomy; see [`error`] for how failures are
//! categorised and rendered for users.

pub mod error;

pub use error::{
    DependencyInstallError, ErrorContext, FilesystemError, InstallerError, RegistryError,
    RemovalFailure, TransferError, UnpackError, UnsupportedPlatformError, VerifyError,
    user_friendly_error,
};
