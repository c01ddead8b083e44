/// Closed enumeration of a fixed-width wire field. Values outside the set fail to decode.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($(#[$vmeta:meta])* $variant:ident = $val:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        $vis enum $name {
            $($(#[$vmeta])* $variant = $val),+
        }

        impl std::convert::TryFrom<u64> for $name {
            type Error = ();
            fn try_from(x: u64) -> Result<Self, Self::Error> {
                match x {
                    $(v if v == $val => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl $name {
            /// Convert this enum back into the raw integer value
            pub fn into_raw(self) -> u64 {
                self as u64
            }

            /// Decode a raw wire value, naming the field in the error
            pub fn from_raw(x: u64, field: &'static str) -> Result<Self, nas_core::DecodeError> {
                Self::try_from(x).map_err(|_| nas_core::DecodeError::InvalidEnumValue { field, value: x })
            }
        }

        impl From<$name> for u64 {
            fn from(e: $name) -> Self { e.into_raw() }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{:?}", self)
            }
        }
    };
}

/// Octet-wide enumeration where unlisted values are reserved for future use and
/// decode into `Reserved(raw)`. Equality and hashing go by the wire value, so a
/// `Reserved(raw)` holding a listed value is the same as the named variant.
macro_rules! wire_enum_open {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($(#[$vmeta:meta])* $variant:ident = $val:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        $vis enum $name {
            $($(#[$vmeta])* $variant,)+
            #[doc = "Value outside the defined set"]
            Reserved(u8),
        }

        impl From<u8> for $name {
            fn from(x: u8) -> Self {
                match x {
                    $(v if v == $val => $name::$variant,)+
                    other => $name::Reserved(other),
                }
            }
        }

        impl $name {
            /// Convert this enum back into the raw integer value
            pub fn into_raw(self) -> u8 {
                match self {
                    $($name::$variant => $val,)+
                    $name::Reserved(x) => x,
                }
            }
        }

        impl From<$name> for u8 {
            fn from(e: $name) -> Self { e.into_raw() }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.into_raw() == other.into_raw()
            }
        }

        impl Eq for $name {}

        impl core::hash::Hash for $name {
            fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
                self.into_raw().hash(state);
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    $name::Reserved(x) => write!(f, "Reserved({})", x),
                    other => write!(f, "{:?}", other),
                }
            }
        }
    };
}
