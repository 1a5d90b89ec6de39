//! Exact decimal newtypes for prices and quantities.
//!
//! Venue payloads carry numbers as strings or floats. Adapters convert them
//! to `Decimal` on the way in, so spread math never runs on `f64`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shared surface of the decimal newtypes: constants, accessors, parsing
/// (surrounding whitespace allowed) and plain `Display`.
macro_rules! decimal_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Decimal);

        impl $name {
            pub const ZERO: Self = Self(Decimal::ZERO);
            pub const ONE: Self = Self(Decimal::ONE);

            #[inline]
            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            #[inline]
            pub fn inner(&self) -> Decimal {
                self.0
            }

            #[inline]
            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            /// Strictly greater than zero.
            #[inline]
            pub fn is_positive(&self) -> bool {
                self.0 > Decimal::ZERO
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = rust_decimal::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Decimal::from_str(s.trim()).map(Self)
            }
        }

        impl From<Decimal> for $name {
            fn from(value: Decimal) -> Self {
                Self(value)
            }
        }
    };
}

decimal_newtype! {
    /// USD (or quote-asset) price.
    Price
}

decimal_newtype! {
    /// Base-asset quantity.
    Size
}

impl Price {
    /// Signed percentage difference from `reference`, `None` when the
    /// reference is zero.
    pub fn pct_from(&self, reference: Price) -> Option<Decimal> {
        if reference.is_zero() {
            return None;
        }
        Some((self.0 - reference.0) / reference.0 * Decimal::ONE_HUNDRED)
    }

    /// `|self - reference| / reference * 100`.
    ///
    /// Anchored on `reference`: swapping the operands changes the magnitude.
    pub fn abs_pct_from(&self, reference: Price) -> Option<Decimal> {
        self.pct_from(reference).map(|pct| pct.abs())
    }
}

impl Size {
    /// Quote-asset value of this quantity at `price`.
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pct_from_is_signed() {
        let dex = Price::new(dec!(0.95));
        let cex = Price::new(dec!(1.00));

        assert_eq!(dex.pct_from(cex).unwrap(), dec!(-5));
        assert_eq!(dex.abs_pct_from(cex).unwrap(), dec!(5));
    }

    #[test]
    fn test_abs_pct_is_anchored_to_reference() {
        let a = Price::new(dec!(1.00));
        let b = Price::new(dec!(0.95));

        let anchored_on_b = a.abs_pct_from(b).unwrap();
        let anchored_on_a = b.abs_pct_from(a).unwrap();
        assert_ne!(anchored_on_b, anchored_on_a);
        assert_eq!(anchored_on_a, dec!(5));
    }

    #[test]
    fn test_pct_from_zero_reference() {
        assert!(Price::ONE.pct_from(Price::ZERO).is_none());
    }

    #[test]
    fn test_parse_trims_and_rejects_garbage() {
        let price: Price = " 0.000012 ".parse().unwrap();
        assert_eq!(price.inner(), dec!(0.000012));
        assert!("abc".parse::<Price>().is_err());
        assert_eq!("100".parse::<Size>().unwrap(), Size::new(dec!(100)));
    }

    #[test]
    fn test_sign_checks() {
        assert!(Price::new(dec!(0.01)).is_positive());
        assert!(!Price::ZERO.is_positive());
        assert!(!Price::new(dec!(-1)).is_positive());
        assert!(Size::ZERO.is_zero());
    }

    #[test]
    fn test_notional() {
        let size = Size::new(dec!(100));
        assert_eq!(size.notional(Price::new(dec!(0.975))), dec!(97.500));
    }

    #[test]
    fn test_display_passes_precision_through() {
        let price = Price::new(dec!(1250.5));
        assert_eq!(price.to_string(), "1250.5");
        assert_eq!(format!("{price:.2}"), "1250.50");
    }
}
