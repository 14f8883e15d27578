/// Wrap a little-endian flag word in a newtype with one named predicate per
/// bit of interest.
///
/// The generated `Debug` impl lists only the flags that are set, which keeps
/// verbose header dumps short.
///
/// # Syntax
///
/// ```ignore
/// flags! {
///     pub struct SomeFlags(u16) {
///         pub some_flag = 0x0001;
///     }
/// }
/// ```
macro_rules! flags {
    {
        $(#[$type_meta:meta])*
        $vis:vis struct $name:ident($repr:ty) {
            $(
                $(#[$flag_meta:meta])*
                $flag_vis:vis $flag:ident = $mask:expr;
            )*
        }
    } => {
        #[derive(Clone, Copy, PartialEq, Eq)]
        $(#[$type_meta])*
        $vis struct $name($repr);

        impl $name {
            pub fn new(bits: $repr) -> Self {
                Self(bits)
            }

            /// The raw flag word.
            pub fn bits(&self) -> $repr {
                self.0
            }

            $(
                $(#[$flag_meta])*
                $flag_vis fn $flag(&self) -> bool {
                    self.0 & $mask != 0
                }
            )*
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut set = f.debug_list();
                $(
                    if self.$flag() {
                        set.entry(&stringify!($flag));
                    }
                )*
                set.finish()
            }
        }
    };
}

/// Map an integer tag to an enum, with a fallthrough case so unknown tags
/// survive into diagnostics instead of failing the parse.
macro_rules! int_enum {
    {
        $(#[$type_meta:meta])*
        $vis:vis enum $name:ident : $repr:ty {
            $(
                $(#[$case_meta:meta])*
                $case:ident = $tag:literal,
            )*
        }
    } => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $(#[$type_meta])*
        $vis enum $name {
            $(
                $(#[$case_meta])*
                $case,
            )*
            /// A tag this parser does not recognize.
            Unknown($repr),
        }

        impl From<$repr> for $name {
            fn from(tag: $repr) -> Self {
                match tag {
                    $($tag => Self::$case,)*
                    _ => Self::Unknown(tag),
                }
            }
        }
    };
}
