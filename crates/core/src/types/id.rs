//! Newtype IDs for type-safe entity references.
//!
//! Catalog entities seeded at start-up use numeric ids (`define_id!`).
//! Records minted at runtime (orders, tickets, surveys) use prefixed string
//! codes (`define_code!`) that are safe to read aloud to a customer.

use uuid::Uuid;

/// Macro to define a type-safe numeric ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
///
/// # Example
///
/// ```rust
/// # use shopdesk_core::define_id;
/// define_id!(WarehouseId);
/// define_id!(ShelfId);
///
/// let warehouse = WarehouseId::new(1);
/// let shelf = ShelfId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: WarehouseId = shelf;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Macro to define a prefixed, string-backed record code.
///
/// Generated codes look like `ORD-1A2B3C4D`: the prefix, a dash, and the
/// first eight hex digits of a random v4 UUID in upper case.
#[macro_export]
macro_rules! define_code {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix every generated code starts with.
            pub const PREFIX: &'static str = $prefix;

            /// Wrap an existing code.
            #[must_use]
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            /// Mint a fresh random code.
            #[must_use]
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, $crate::types::id::random_suffix()))
            }

            /// Returns the code as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

/// Eight upper-case hex digits taken from a random v4 UUID.
#[doc(hidden)]
#[must_use]
pub fn random_suffix() -> String {
    let mut simple = Uuid::new_v4().simple().to_string();
    simple.truncate(8);
    simple.to_uppercase()
}

define_id!(ProductId);
define_id!(CustomerId);

define_code!(OrderId, "ORD");
define_code!(TicketId, "TKT");
define_code!(SurveyId, "SRV");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_roundtrip() {
        let id = ProductId::new(7);
        assert_eq!(id.as_i32(), 7);
        assert_eq!(i32::from(id), 7);
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn test_generated_order_id_format() {
        let id = OrderId::generate();
        let code = id.as_str();
        assert!(code.starts_with("ORD-"));
        assert_eq!(code.len(), 12);
        assert!(code[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_codes_are_unique() {
        let a = TicketId::generate();
        let b = TicketId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with(TicketId::PREFIX));
    }

    #[test]
    fn test_code_serializes_transparently() {
        let id = OrderId::new("ORD-00000001");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"ORD-00000001\"");
    }
}
