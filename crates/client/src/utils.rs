//! Internal helper macros.

/// Early-returns an error when a condition does not hold.
///
/// Like `assert!`, but producing an `Err` instead of a panic; used for
/// validation checks in the codec.
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
