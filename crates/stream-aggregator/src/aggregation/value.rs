use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Numeric value domain an aggregator operates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueDomain {
    F64,
    F32,
    I64,
    I32,
    U64,
    U32,
}

impl ValueDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueDomain::F64 => "f64",
            ValueDomain::F32 => "f32",
            ValueDomain::I64 => "i64",
            ValueDomain::I32 => "i32",
            ValueDomain::U64 => "u64",
            ValueDomain::U32 => "u32",
        }
    }
}

impl fmt::Display for ValueDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values that can be folded by an aggregator
///
/// Implemented for the primitive floats and the 32/64-bit integers. Integer
/// addition saturates at the domain bounds; float addition follows IEEE 754.
pub trait Numeric:
    Copy + PartialOrd + Send + Sync + Debug + Serialize + DeserializeOwned + 'static
{
    /// Domain tag carried by snapshots of this type
    const DOMAIN: ValueDomain;

    /// Additive identity
    fn zero() -> Self;

    /// Sum of two values, saturating for integers
    fn accumulate(self, other: Self) -> Self;

    /// Whether this value is NaN (always false for integers)
    fn is_nan(&self) -> bool {
        false
    }

    fn to_f64(&self) -> f64;
}

macro_rules! impl_numeric_float {
    ($t:ty, $domain:expr) => {
        impl Numeric for $t {
            const DOMAIN: ValueDomain = $domain;

            fn zero() -> Self {
                0.0
            }

            fn accumulate(self, other: Self) -> Self {
                self + other
            }

            fn is_nan(&self) -> bool {
                <$t>::is_nan(*self)
            }

            fn to_f64(&self) -> f64 {
                *self as f64
            }
        }
    };
}

macro_rules! impl_numeric_int {
    ($t:ty, $domain:expr) => {
        impl Numeric for $t {
            const DOMAIN: ValueDomain = $domain;

            fn zero() -> Self {
                0
            }

            fn accumulate(self, other: Self) -> Self {
                self.saturating_add(other)
            }

            fn to_f64(&self) -> f64 {
                *self as f64
            }
        }
    };
}

impl_numeric_float!(f64, ValueDomain::F64);
impl_numeric_float!(f32, ValueDomain::F32);
impl_numeric_int!(i64, ValueDomain::I64);
impl_numeric_int!(i32, ValueDomain::I32);
impl_numeric_int!(u64, ValueDomain::U64);
impl_numeric_int!(u32, ValueDomain::U32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_f64_conversions() {
        assert_eq!(42_f64.to_f64(), 42.0);
        assert_eq!(42_f32.to_f64(), 42.0);
        assert_eq!(42_i64.to_f64(), 42.0);
        assert_eq!(42_i32.to_f64(), 42.0);
        assert_eq!(42_u64.to_f64(), 42.0);
        assert_eq!(42_u32.to_f64(), 42.0);
    }

    #[test]
    fn test_integer_accumulate_saturates() {
        assert_eq!(i64::MAX.accumulate(1), i64::MAX);
        assert_eq!(i32::MIN.accumulate(-1), i32::MIN);
        assert_eq!(u64::MAX.accumulate(10), u64::MAX);
    }

    #[test]
    fn test_float_nan_detection() {
        assert!(Numeric::is_nan(&f64::NAN));
        assert!(!Numeric::is_nan(&1.5_f32));
        assert!(!Numeric::is_nan(&7_i64));
    }

    #[test]
    fn test_domain_serde_names() {
        assert_eq!(serde_json::to_string(&ValueDomain::F64).unwrap(), "\"f64\"");
        let parsed: ValueDomain = serde_json::from_str("\"u32\"").unwrap();
        assert_eq!(parsed, ValueDomain::U32);
        assert_eq!(ValueDomain::I64.to_string(), "i64");
    }
}
