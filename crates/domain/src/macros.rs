//! Macro for implementing Display and FromStr for status enums
//!
//! Status-like enums in this crate travel as lowercase snake_case strings
//! (wire payloads, log fields, CLI output). The macro keeps the string table
//! in one place for both directions.
//!
//! # Example
//!
//! ```rust
//! use shelfsight_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum UploadPhase {
//!     Queued,
//!     Sending,
//!     Done,
//! }
//!
//! impl_domain_status_conversions!(UploadPhase {
//!     Queued => "queued",
//!     Sending => "sending",
//!     Done => "done",
//! });
//!
//! assert_eq!(UploadPhase::Sending.to_string(), "sending");
//! assert_eq!("DONE".parse::<UploadPhase>(), Ok(UploadPhase::Done));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their string
///   representations
///
/// Parsing is case-insensitive; the error names the enum and the rejected
/// input.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
