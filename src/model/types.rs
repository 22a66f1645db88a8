use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid or unsupported element symbol: '{0}'")]
pub struct ParseElementError(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid bond order string: '{0}'")]
pub struct ParseBondOrderError(String);

macro_rules! elements {
    ($( $variant:ident = $z:literal, $valence:expr; )*) => {
        /// Chemical element, H through Xe.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Element {
            $( $variant = $z, )*
        }

        impl Element {
            /// Every supported element in atomic-number order.
            pub const ALL: &'static [Element] = &[$( Element::$variant, )*];

            pub fn symbol(&self) -> &'static str {
                match self {
                    $( Element::$variant => stringify!($variant), )*
                }
            }

            /// Largest number of explicit neighbors expected for a neutral atom,
            /// or `None` when the element has no fixed valence class (metals, noble gases).
            pub fn max_valence(&self) -> Option<u8> {
                match self {
                    $( Element::$variant => $valence, )*
                }
            }
        }

        impl FromStr for Element {
            type Err = ParseElementError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( stringify!($variant) => Ok(Element::$variant), )*
                    _ => Err(ParseElementError(s.to_string())),
                }
            }
        }
    };
}

elements! {
    H = 1, Some(1);
    He = 2, None;
    Li = 3, Some(1);
    Be = 4, Some(2);
    B = 5, Some(4);
    C = 6, Some(4);
    N = 7, Some(3);
    O = 8, Some(2);
    F = 9, Some(1);
    Ne = 10, None;
    Na = 11, Some(1);
    Mg = 12, Some(2);
    Al = 13, Some(4);
    Si = 14, Some(4);
    P = 15, Some(5);
    S = 16, Some(6);
    Cl = 17, Some(4);
    Ar = 18, None;
    K = 19, Some(1);
    Ca = 20, Some(2);
    Sc = 21, None;
    Ti = 22, None;
    V = 23, None;
    Cr = 24, None;
    Mn = 25, None;
    Fe = 26, None;
    Co = 27, None;
    Ni = 28, None;
    Cu = 29, None;
    Zn = 30, None;
    Ga = 31, Some(4);
    Ge = 32, Some(4);
    As = 33, Some(5);
    Se = 34, Some(6);
    Br = 35, Some(4);
    Kr = 36, None;
    Rb = 37, Some(1);
    Sr = 38, Some(2);
    Y = 39, None;
    Zr = 40, None;
    Nb = 41, None;
    Mo = 42, None;
    Tc = 43, None;
    Ru = 44, None;
    Rh = 45, None;
    Pd = 46, None;
    Ag = 47, None;
    Cd = 48, None;
    In = 49, Some(4);
    Sn = 50, Some(4);
    Sb = 51, Some(5);
    Te = 52, Some(6);
    I = 53, Some(4);
    Xe = 54, None;
}

impl Element {
    pub fn atomic_number(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let symbol = String::deserialize(deserializer)?;
        symbol.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BondOrder::Single => write!(f, "Single"),
            BondOrder::Double => write!(f, "Double"),
            BondOrder::Triple => write!(f, "Triple"),
            BondOrder::Aromatic => write!(f, "Aromatic"),
        }
    }
}

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "1" => Ok(BondOrder::Single),
            "double" | "2" => Ok(BondOrder::Double),
            "triple" | "3" => Ok(BondOrder::Triple),
            "aromatic" | "ar" => Ok(BondOrder::Aromatic),
            _ => Err(ParseBondOrderError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for BondOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_from_str_valid() {
        assert_eq!(Element::from_str("H").unwrap(), Element::H);
        assert_eq!(Element::from_str("Cl").unwrap(), Element::Cl);
        assert_eq!(Element::from_str("Xe").unwrap(), Element::Xe);
    }

    #[test]
    fn element_from_str_is_case_sensitive() {
        let err = Element::from_str("cl").unwrap_err();
        assert_eq!(err.to_string(), "invalid or unsupported element symbol: 'cl'");
    }

    #[test]
    fn element_symbol_display_and_atomic_number() {
        assert_eq!(Element::Na.symbol(), "Na");
        assert_eq!(Element::Na.to_string(), "Na");
        assert_eq!(Element::Na.atomic_number(), 11);
        assert_eq!(Element::Xe.atomic_number(), 54);
    }

    #[test]
    fn element_table_is_contiguous() {
        for (idx, el) in Element::ALL.iter().enumerate() {
            assert_eq!(el.atomic_number() as usize, idx + 1);
        }
    }

    #[test]
    fn organic_valence_classes() {
        assert_eq!(Element::H.max_valence(), Some(1));
        assert_eq!(Element::C.max_valence(), Some(4));
        assert_eq!(Element::N.max_valence(), Some(3));
        assert_eq!(Element::O.max_valence(), Some(2));
        assert_eq!(Element::Fe.max_valence(), None);
    }

    #[test]
    fn bondorder_from_str_variants() {
        assert_eq!(BondOrder::from_str("single").unwrap(), BondOrder::Single);
        assert_eq!(BondOrder::from_str("2").unwrap(), BondOrder::Double);
        assert_eq!(BondOrder::from_str("Triple").unwrap(), BondOrder::Triple);
        assert_eq!(BondOrder::from_str("AR").unwrap(), BondOrder::Aromatic);
    }

    #[test]
    fn bondorder_from_str_invalid() {
        let err = BondOrder::from_str("quad").unwrap_err();
        assert_eq!(err.to_string(), "invalid bond order string: 'quad'");
    }
}
