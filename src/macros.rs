//! # Record declaration macro
//!
//! `record!` declares a plain struct and derives the wire capability for it:
//! `Default`, [`Encode`](crate::Encode), [`Decode`](crate::Decode) and
//! [`Record`](crate::Record). Fields are encoded in the order they are written.
//!
//! ```
//! use smecodec::{record, Record};
//!
//! record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Point {
//!         pub x: i32,
//!         pub y: i32,
//!         pub label: String,
//!     }
//! }
//!
//! let p = Point { x: 1, y: -1, label: "a".to_string() };
//! let bytes = p.serialize().unwrap();
//! assert_eq!(bytes.len(), 4 + 4 + 4 + 1);
//! assert_eq!(Point::deserialize(&bytes).unwrap(), p);
//! ```
//!
//! Every field type must implement `Default`, `Encode` and `Decode`. Do not
//! derive `Default` yourself; the macro already does.

/// Declare a record type. See the [module docs](crate::macros).
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Encode for $name {
            #[allow(unused_variables)]
            fn encode<W: ::std::io::Write>(
                &self,
                sink: &mut $crate::Sink<W>,
            ) -> ::std::result::Result<(), $crate::CodecError> {
                $( $crate::Encode::encode(&self.$field, sink)?; )*
                Ok(())
            }

            fn encoded_len(&self) -> usize {
                0 $( + $crate::Encode::encoded_len(&self.$field) )*
            }
        }

        impl $crate::Decode for $name {
            #[allow(unused_variables)]
            fn decode<R: ::std::io::Read>(
                source: &mut $crate::Source<R>,
            ) -> ::std::result::Result<Self, $crate::CodecError> {
                // Struct expression fields evaluate in source order, which is wire order.
                source.nested(|source| {
                    Ok($name {
                        $( $field: <$ty as $crate::Decode>::decode(source)?, )*
                    })
                })
            }
        }

        impl $crate::Record for $name {
            const NAME: &'static str = stringify!($name);
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];
        }
    };
}
