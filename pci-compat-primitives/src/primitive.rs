macro_rules! impl_le_integers_fmt{
    {
        $(impl ::$($trait:ident)::+ for $le_int_ty:ident;)*
    } => {
        $(
            impl ::$($trait)::+ for $le_int_ty{
                fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result{
                    let this = self.get();

                    ::$($trait)::+ :: fmt(&this, f)
                }
            }
        )*
    }
}

macro_rules! def_le_integers{
    {
        $($vis:vis type $le_int_ty:ident = $base_ty:ident;)*
    } => {
        $(
            #[doc = concat!("A [`", stringify!($base_ty), "`] that is represented in memory as little-endian")]
            #[repr(transparent)]
            #[derive(Copy, Clone, Default, Hash, PartialEq, Eq, bytemuck::Zeroable, bytemuck::Pod)]
            $vis struct $le_int_ty($base_ty);

            impl $le_int_ty{
                #[doc = concat!("Constructs an [`", stringify!($le_int_ty), "`] from it's base type. On big-endian platforms, this swaps the bytes of `x`")]
                $vis const fn new(x: $base_ty) -> Self{
                    Self(x.to_le())
                }

                #[doc = concat!("Converts a [`", stringify!($le_int_ty), "`] to it's base type. On big-endian platforms, this swaps the bytes of `x`")]
                $vis const fn get(self) -> $base_ty{
                    $base_ty::from_le(self.0)
                }

                #[doc = concat!("Constructs a [`", stringify!($le_int_ty), "`] from the raw LE bytes. This is zero cost on all platforms")]
                $vis const fn from_le_bytes(x: [u8; ::core::mem::size_of::<$base_ty>()]) -> Self{
                    Self(<$base_ty>::from_ne_bytes(x))
                }

                #[doc = concat!("Reads a [`", stringify!($le_int_ty), "`] from the front of `bytes`. Missing high-order bytes read as zero and excess bytes are ignored")]
                $vis fn from_le_prefix(bytes: &[u8]) -> Self{
                    Self::from_le_bytes($crate::zero_extended(bytes))
                }
            }

            impl_le_integers_fmt!{
                impl ::core::fmt::Debug for $le_int_ty;
                impl ::core::fmt::Display for $le_int_ty;
                impl ::core::fmt::LowerHex for $le_int_ty;
            }
        )*
    }
}

def_le_integers! {
    pub type LeU8 = u8;
    pub type LeU16 = u16;
    pub type LeU32 = u32;
}

#[macro_export]
macro_rules! le_fake_enum{
    {
        #[repr($field_vis:vis $repr:ident)]
        $(#[$meta:meta])*
        $vis:vis enum $name:ident{
            $( $(#[$meta2:meta])* $var:ident = $discrim:literal),*
            $(,)?
        }
    } => {

        #[repr(transparent)]
        #[derive(Copy, Clone, Hash, PartialEq, Eq)]
        $(#[$meta])*
        $vis struct $name($field_vis $crate::primitive::$repr);

        #[allow(non_upper_case_globals)]
        impl $name{
            $(
                $(#[$meta2])* $vis const $var: Self = Self($crate::primitive::$repr::new($discrim));
            )*

            pub const fn validate(self) -> bool{
                match self.0.get(){
                    $($discrim => true,)*
                    _ => false
                }
            }
        }

        impl ::core::fmt::Display for $name{
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result{
                match *self{
                    $(Self::$var => f.write_str(::core::stringify!($var)),)*
                    _ => {
                        f.write_str(::core::stringify!($name))?;
                        f.write_str("(")?;
                        ::core::fmt::Display::fmt(&self.0, f)?;
                        f.write_str(")")
                    }
                }
            }
        }

        impl ::core::fmt::Debug for $name{
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result{
                ::core::fmt::Display::fmt(self, f)
            }
        }
    }
}

pub use le_fake_enum;

#[cfg(test)]
mod test {
    use super::{LeU16, LeU32};

    #[test]
    fn test_le_bytes_layout() {
        let x = LeU16::new(0x8086);
        assert_eq!(bytemuck::bytes_of(&x), &[0x86, 0x80]);
        assert_eq!(LeU16::from_le_bytes([0x86, 0x80]).get(), 0x8086);
    }

    #[test]
    fn test_le_prefix_zero_extends() {
        assert_eq!(LeU32::from_le_prefix(&[0x00, 0x00, 0x03]).get(), 0x030000);
        assert_eq!(LeU16::from_le_prefix(&[0xAB]).get(), 0x00AB);
    }

    #[test]
    fn test_le_fmt_hex() {
        assert_eq!(format!("{:04x}", LeU16::new(0x10de)), "10de");
        assert_eq!(format!("{}", LeU32::new(0x060000)), "393216");
    }
}
