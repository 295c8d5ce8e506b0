//! Arbitrary-precision number values and the arithmetic ranges rely on
//!
//! [`BigInt`] and [`Ratio`] wrap the `num` crate types behind shared handles so
//! that values stay cheap to clone. Only the operations the sequence layer
//! needs live here: overflow-promoting addition, comparison and sign tests.
//! Numbers compare for equality within their category: integers (`Long` and
//! `BigInt`) by integer value, ratios by reduced value, doubles by value.

use crate::error::{Error, Result};
use crate::hash::long_hash_code;
use crate::murmur3;
use crate::value::Value;
use num::{BigRational, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Arbitrary-precision integer value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BigInt(Arc<num::BigInt>);

impl BigInt {
    /// Wrap a `num` integer
    #[inline]
    #[must_use]
    pub fn new(value: num::BigInt) -> Self {
        Self(Arc::new(value))
    }

    /// Widen a machine integer
    #[inline]
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self::new(num::BigInt::from(value))
    }

    /// Borrow the underlying integer
    #[inline]
    #[must_use]
    pub fn as_big(&self) -> &num::BigInt {
        &self.0
    }

    /// Narrow to a machine integer when it fits
    #[inline]
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }

    /// Murmur3-based hash; values in `i64` range hash like longs
    #[must_use]
    pub fn hasheq(&self) -> i32 {
        match self.to_i64() {
            Some(small) => murmur3::hash_long(small),
            None => {
                let (sign, digits) = self.0.to_u32_digits();
                let sign_hash = i32::from(sign == num::bigint::Sign::Minus);
                murmur3::hash_ordered(
                    std::iter::once(sign_hash).chain(digits.into_iter().map(|d| d as i32)),
                )
            }
        }
    }

    /// Host-style hash; values in `i64` range hash like longs
    #[must_use]
    pub fn hash_code(&self) -> i32 {
        match self.to_i64() {
            Some(small) => long_hash_code(small),
            None => self.hasheq(),
        }
    }
}

impl Display for BigInt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}N", self.0)
    }
}

/// Exact rational value, always in lowest terms with a positive denominator
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ratio(Arc<BigRational>);

impl Ratio {
    /// Build `numerator / denominator`
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for a zero denominator
    pub fn new(numerator: num::BigInt, denominator: num::BigInt) -> Result<Self> {
        if denominator.is_zero() {
            return Err(Error::invalid("divide by zero"));
        }
        Ok(Self(Arc::new(BigRational::new(numerator, denominator))))
    }

    /// Build a ratio and collapse it to an integer value when it is whole
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for a zero denominator
    pub fn normalized(numerator: num::BigInt, denominator: num::BigInt) -> Result<Value> {
        let ratio = Self::new(numerator, denominator)?;
        Ok(ratio_to_value(ratio.0.as_ref().clone()))
    }

    /// Reduced numerator
    #[inline]
    #[must_use]
    pub fn numerator(&self) -> &num::BigInt {
        self.0.numer()
    }

    /// Reduced, positive denominator
    #[inline]
    #[must_use]
    pub fn denominator(&self) -> &num::BigInt {
        self.0.denom()
    }

    /// Murmur3-based hash over numerator and denominator
    #[must_use]
    pub fn hasheq(&self) -> i32 {
        BigInt::new(self.numerator().clone()).hasheq()
            ^ BigInt::new(self.denominator().clone()).hasheq()
    }

    /// Host-style hash over numerator and denominator
    #[must_use]
    pub fn hash_code(&self) -> i32 {
        BigInt::new(self.numerator().clone()).hash_code()
            ^ BigInt::new(self.denominator().clone()).hash_code()
    }
}

impl Display for Ratio {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator(), self.denominator())
    }
}

/// A number lifted into the widest representation two operands share
enum Operand {
    Long(i64),
    Big(num::BigInt),
    Ratio(BigRational),
    Double(f64),
}

impl Operand {
    fn of(value: &Value) -> Result<Self> {
        match value {
            Value::Long(n) => Ok(Self::Long(*n)),
            Value::BigInt(b) => Ok(Self::Big(b.as_big().clone())),
            Value::Ratio(r) => Ok(Self::Ratio(r.0.as_ref().clone())),
            Value::Double(d) => Ok(Self::Double(*d)),
            other => Err(Error::NotANumber {
                type_name: other.type_name(),
            }),
        }
    }

    fn to_f64(&self) -> f64 {
        match self {
            Self::Long(n) => *n as f64,
            Self::Big(b) => b.to_f64().unwrap_or(f64::NAN),
            Self::Ratio(r) => r.to_f64().unwrap_or(f64::NAN),
            Self::Double(d) => *d,
        }
    }

    fn to_ratio(&self) -> BigRational {
        match self {
            Self::Long(n) => BigRational::from_integer(num::BigInt::from(*n)),
            Self::Big(b) => BigRational::from_integer(b.clone()),
            Self::Ratio(r) => r.clone(),
            Self::Double(d) => BigRational::from_float(*d).unwrap_or_else(BigRational::zero),
        }
    }

    fn is_double(&self) -> bool {
        matches!(self, Self::Double(_))
    }

    fn is_ratio(&self) -> bool {
        matches!(self, Self::Ratio(_))
    }
}

fn ratio_to_value(ratio: BigRational) -> Value {
    if ratio.is_integer() {
        Value::BigInt(BigInt::new(ratio.to_integer()))
    } else {
        Value::Ratio(Ratio(Arc::new(ratio)))
    }
}

/// Add two numbers, promoting `Long` overflow to `BigInt`
///
/// # Errors
/// Returns [`Error::NotANumber`] if either operand is not numeric
pub fn add_p(a: &Value, b: &Value) -> Result<Value> {
    let (x, y) = (Operand::of(a)?, Operand::of(b)?);
    Ok(match (&x, &y) {
        (Operand::Long(p), Operand::Long(q)) => match p.checked_add(*q) {
            Some(sum) => Value::Long(sum),
            None => Value::BigInt(BigInt::new(num::BigInt::from(*p) + num::BigInt::from(*q))),
        },
        _ if x.is_double() || y.is_double() => Value::Double(x.to_f64() + y.to_f64()),
        _ if x.is_ratio() || y.is_ratio() => ratio_to_value(x.to_ratio() + y.to_ratio()),
        _ => {
            let sum = x.to_ratio().to_integer() + y.to_ratio().to_integer();
            Value::BigInt(BigInt::new(sum))
        }
    })
}

/// Compare two numbers across categories
///
/// `NaN` compares equal to everything.
///
/// # Errors
/// Returns [`Error::NotANumber`] if either operand is not numeric
pub fn compare(a: &Value, b: &Value) -> Result<Ordering> {
    let (x, y) = (Operand::of(a)?, Operand::of(b)?);
    Ok(match (&x, &y) {
        (Operand::Long(p), Operand::Long(q)) => p.cmp(q),
        _ if x.is_double() || y.is_double() => x
            .to_f64()
            .partial_cmp(&y.to_f64())
            .unwrap_or(Ordering::Equal),
        _ => x.to_ratio().cmp(&y.to_ratio()),
    })
}

fn sign(value: &Value) -> Result<Ordering> {
    Ok(match Operand::of(value)? {
        Operand::Long(n) => n.cmp(&0),
        Operand::Big(b) => b.cmp(&num::BigInt::zero()),
        Operand::Ratio(r) => r.cmp(&BigRational::zero()),
        Operand::Double(d) => d.partial_cmp(&0.0).unwrap_or(Ordering::Equal),
    })
}

/// Test for zero
///
/// # Errors
/// Returns [`Error::NotANumber`] for non-numeric values
pub fn is_zero(value: &Value) -> Result<bool> {
    Ok(sign(value)? == Ordering::Equal)
}

/// Test for a strictly positive number
///
/// # Errors
/// Returns [`Error::NotANumber`] for non-numeric values
pub fn is_pos(value: &Value) -> Result<bool> {
    Ok(sign(value)? == Ordering::Greater)
}

/// Test for a strictly negative number
///
/// # Errors
/// Returns [`Error::NotANumber`] for non-numeric values
pub fn is_neg(value: &Value) -> Result<bool> {
    Ok(sign(value)? == Ordering::Less)
}

/// Category-aware numeric equality; `None` when either side is not a number
#[must_use]
pub fn num_equiv(a: &Value, b: &Value) -> Option<bool> {
    Some(match (a, b) {
        (Value::Long(p), Value::Long(q)) => p == q,
        (Value::Long(p), Value::BigInt(q)) | (Value::BigInt(q), Value::Long(p)) => {
            q.to_i64() == Some(*p)
        }
        (Value::BigInt(p), Value::BigInt(q)) => p == q,
        (Value::Ratio(p), Value::Ratio(q)) => p == q,
        (Value::Double(p), Value::Double(q)) => p == q || (p.is_nan() && q.is_nan()),
        (Value::Long(_) | Value::BigInt(_) | Value::Ratio(_) | Value::Double(_), _) => {
            if b.is_number() {
                false
            } else {
                return None;
            }
        }
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_promotes_on_overflow() {
        let sum = add_p(&Value::Long(i64::MAX), &Value::Long(1)).unwrap();
        match sum {
            Value::BigInt(b) => {
                assert_eq!(*b.as_big(), num::BigInt::from(i64::MAX) + 1);
            }
            other => panic!("expected BigInt, got {other:?}"),
        }
    }

    #[test]
    fn ratio_sum_collapses_to_integer() {
        let half = Ratio::normalized(1.into(), 2.into()).unwrap();
        let whole = add_p(&half, &half).unwrap();
        assert_eq!(num_equiv(&whole, &Value::Long(1)), Some(true));
    }

    #[test]
    fn zero_denominator_rejected() {
        assert!(Ratio::new(1.into(), 0.into()).is_err());
    }

    #[test]
    fn cross_category_compare() {
        let third = Ratio::normalized(1.into(), 3.into()).unwrap();
        assert_eq!(compare(&third, &Value::Double(0.5)).unwrap(), Ordering::Less);
        assert_eq!(compare(&Value::Long(1), &third).unwrap(), Ordering::Greater);
        assert!(compare(&Value::Nil, &Value::Long(1)).is_err());
    }

    #[test]
    fn equality_respects_categories() {
        let big_one = Value::BigInt(BigInt::from_i64(1));
        assert_eq!(num_equiv(&Value::Long(1), &big_one), Some(true));
        assert_eq!(num_equiv(&Value::Long(1), &Value::Double(1.0)), Some(false));
        assert_eq!(num_equiv(&Value::Long(1), &Value::Nil), None);
    }

    #[test]
    fn small_bigints_hash_like_longs() {
        assert_eq!(BigInt::from_i64(42).hasheq(), murmur3::hash_long(42));
    }

    #[test]
    fn sign_tests() {
        assert!(is_pos(&Value::Long(3)).unwrap());
        assert!(is_neg(&Value::Double(-0.5)).unwrap());
        assert!(is_zero(&Value::BigInt(BigInt::from_i64(0))).unwrap());
    }
}
