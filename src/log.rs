//! Internal diagnostics.
//!
//! With the `defmt` feature the macros forward to `defmt`. Without it they expand to a
//! dead branch so the arguments are still type checked but nothing is emitted.

#[cfg(feature = "defmt")]
#[allow(unused)]
#[macro_use]
mod imp {
    macro_rules! trace {
        ($($args:tt)*) => { ::defmt::trace!($($args)*) }
    }

    macro_rules! debug {
        ($($args:tt)*) => { ::defmt::debug!($($args)*) }
    }

    macro_rules! info {
        ($($args:tt)*) => { ::defmt::info!($($args)*) }
    }

    macro_rules! warn {
        ($($args:tt)*) => { ::defmt::warn!($($args)*) }
    }

    macro_rules! error {
        ($($args:tt)*) => { ::defmt::error!($($args)*) }
    }
}

#[cfg(not(feature = "defmt"))]
#[allow(unused)]
#[macro_use]
mod imp {
    macro_rules! trace {
        ($($args:tt)*) => {{ if false { let _ = ::core::format_args!($($args)*); } }}
    }

    macro_rules! debug {
        ($($args:tt)*) => {{ if false { let _ = ::core::format_args!($($args)*); } }}
    }

    macro_rules! info {
        ($($args:tt)*) => {{ if false { let _ = ::core::format_args!($($args)*); } }}
    }

    macro_rules! warn {
        ($($args:tt)*) => {{ if false { let _ = ::core::format_args!($($args)*); } }}
    }

    macro_rules! error {
        ($($args:tt)*) => {{ if false { let _ = ::core::format_args!($($args)*); } }}
    }
}
