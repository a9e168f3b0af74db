//! Macro interna para enums persistidos como texto en minúsculas.
//!
//! Genera `as_str`, `Display` y `FromStr`. El valor textual es el contrato
//! con las columnas `status`/`bonus_tier` de la base de datos, por lo que no
//! debe cambiar entre versiones.

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self { $($name::$variant => $text),+ }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::DomainError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::DomainError::ValidationError(
                        format!("{} desconocido: '{}'", stringify!($name), other))),
                }
            }
        }
    };
}
