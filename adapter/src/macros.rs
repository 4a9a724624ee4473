//! Macros for adapter error handling.

/// Creates an [`crate::error::AdapterError`] from an error kind and description.
///
/// Accepts optional dynamic detail and an optional source error:
/// `adapter_error!(kind, "desc")`, `adapter_error!(kind, "desc", detail)`,
/// `adapter_error!(kind, "desc", source: err)`.
#[macro_export]
macro_rules! adapter_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::AdapterError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::AdapterError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::AdapterError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::AdapterError::from(($kind, $desc, $detail.to_string()))
            .with_source($source)
    };
}

/// Returns an [`crate::error::AdapterError`] from the current function.
///
/// Takes the same arguments as [`adapter_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::adapter_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::adapter_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::adapter_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::adapter_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
