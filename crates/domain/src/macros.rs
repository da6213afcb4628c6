//! Macro for implementing Display and FromStr for status-like enums
//!
//! Used by every enum that crosses a text boundary (record store rows,
//! configuration values, CLI arguments). Parsing is case-insensitive and
//! output is always the canonical lowercase form.
//!
//! # Example
//!
//! ```rust
//! use slotwatch_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Discord,
//!     Email,
//! }
//!
//! impl_domain_status_conversions!(Channel {
//!     Discord => "discord",
//!     Email => "email",
//! });
//!
//! assert_eq!("DISCORD".parse::<Channel>().unwrap(), Channel::Discord);
//! assert_eq!(Channel::Email.to_string(), "email");
//! ```

/// Implements Display and FromStr traits for status enums
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
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
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
