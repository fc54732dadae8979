//! Macros for the common codec impl shapes.

/// Generates a `Codec` impl for a single-field tuple wrapper.
///
/// ```
/// # use spi_codec::impl_wrapper_codec;
/// #[derive(Debug, PartialEq)]
/// struct Height(u64);
/// impl_wrapper_codec!(Height => u64);
///
/// let buf = spi_codec::encode_to_vec(&Height(7)).unwrap();
/// assert_eq!(buf, [7, 0, 0, 0, 0, 0, 0, 0]);
/// ```
#[macro_export]
macro_rules! impl_wrapper_codec {
    ($this:ty => $target:ty) => {
        impl $crate::Codec for $this {
            fn decode(dec: &mut impl $crate::Decoder) -> Result<Self, $crate::CodecError> {
                <$target as $crate::Codec>::decode(dec).map(Self)
            }

            fn encode(&self, enc: &mut impl $crate::Encoder) -> Result<(), $crate::CodecError> {
                <$target as $crate::Codec>::encode(&self.0, enc)
            }
        }
    };
}

/// Defines a struct whose fields are encoded back to back in declaration
/// order, along with a `new` constructor and by-reference accessors.
#[macro_export]
macro_rules! impl_type_flat_struct {
    {
        $( #[ $sattr:meta ] )*
        $v:vis struct $name:ident {
            $(
                $( #[ $fattr:meta ] )*
                $fname:ident : $fty:ty,
            )*
        }
    } => {
        $( #[ $sattr ] )*
        $v struct $name {
            $(
                $( #[ $fattr ] )*
                $fname : $fty,
            )*
        }

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "` from its fields.")]
            #[allow(clippy::too_many_arguments)]
            $v fn new($( $fname : $fty ),*) -> Self {
                Self { $( $fname ),* }
            }

            $(
                #[doc = concat!("Returns the `", stringify!($fname), "` field.")]
                $v fn $fname(&self) -> &$fty {
                    &self.$fname
                }
            )*
        }

        impl $crate::Codec for $name {
            fn decode(dec: &mut impl $crate::Decoder) -> Result<Self, $crate::CodecError> {
                Ok(Self {
                    $( $fname: <$fty as $crate::Codec>::decode(dec)?, )*
                })
            }

            fn encode(&self, enc: &mut impl $crate::Encoder) -> Result<(), $crate::CodecError> {
                let Self { $( $fname ),* } = self;
                $( <$fty as $crate::Codec>::encode($fname, enc)?; )*
                Ok(())
            }
        }
    }
}
