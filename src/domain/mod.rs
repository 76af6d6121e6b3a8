//! Domain entities and rules of the clinic management service.

/// Declares a fieldless enum whose variants travel as fixed lowercase strings
/// in JSON and in the database.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
        )]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::domain::types::TypeConstraintError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($value => Ok($name::$variant),)+
                    other => Err(crate::domain::types::TypeConstraintError::InvalidValue(
                        format!("{} {other}", stringify!($name)),
                    )),
                }
            }
        }
    };
}

pub mod appointment;
pub mod clinic;
pub mod dashboard;
pub mod finance;
pub mod invitation;
pub mod lead;
pub mod medical;
pub mod member;
pub mod package;
pub mod patient;
pub mod permission;
pub mod professional;
pub mod report;
pub mod types;
