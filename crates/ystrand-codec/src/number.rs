//! Numeric limits shared by the value codec

/// Largest integer an `f64` represents exactly (2^53 - 1)
pub const F64_MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Smallest integer an `f64` represents exactly (-(2^53 - 1))
pub const F64_MIN_SAFE_INTEGER: f64 = -F64_MAX_SAFE_INTEGER;

/// Whether `num` is a whole number inside the safe-integer range
pub fn is_safe_integer(num: f64) -> bool {
    num.trunc() == num && (F64_MIN_SAFE_INTEGER..=F64_MAX_SAFE_INTEGER).contains(&num)
}
