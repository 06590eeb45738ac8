//! Macros for provisioning error handling.
//!
//! Provides convenience macros for creating and returning
//! [`crate::error::AutografError`] instances with reduced boilerplate.

/// Creates an [`crate::error::AutografError`] from error kind and description.
///
/// This macro provides a concise way to create [`crate::error::AutografError`]
/// instances with either static descriptions or additional dynamic detail
/// information.
#[macro_export]
macro_rules! autograf_error {
    ($kind:expr, $desc:expr) => {
        AutografError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        AutografError::from(($kind, $desc, $detail.to_string()))
    };
}

/// Creates and returns an [`crate::error::AutografError`] from the current
/// function.
///
/// This macro combines error creation with early return, reducing boilerplate
/// when handling error conditions that should immediately terminate execution.
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return Err($crate::autograf_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return Err($crate::autograf_error!($kind, $desc, $detail))
    };
}
