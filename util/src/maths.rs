//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Bring an angle in degrees into the range [-180, 180] by adding or subtracting a single turn.
///
/// Only one turn is ever applied, so inputs must lie in (-540, 540) for the result to be in
/// range. This is always the case for the difference of two angles which are themselves in
/// [0, 360] or [-180, 180].
pub fn norm_180_deg<T>(angle_deg: T) -> T
where
    T: Float
{
    let half_turn = T::from(180.0).unwrap_or_else(T::zero);
    let turn = half_turn + half_turn;

    if angle_deg > half_turn {
        angle_deg - turn
    }
    else if angle_deg < -half_turn {
        angle_deg + turn
    }
    else {
        angle_deg
    }
}

/// Get the signed shortest rotation in degrees which takes `from_deg` onto `to_deg`.
///
/// The difference is rounded to the nearest whole degree before being wrapped, as the actuator
/// controller only accepts integer angles.
pub fn shortest_rotation_deg<T>(from_deg: T, to_deg: T) -> T
where
    T: Float
{
    norm_180_deg((to_deg - from_deg).round())
}

/// Wrap an angle in degrees into the range [0, 360).
pub fn wrap_360_deg<T>(angle_deg: T) -> T
where
    T: Float
{
    let turn = T::from(360.0).unwrap_or_else(T::zero);
    let r = rem_euclid(angle_deg, turn);

    // Rounding can leave us exactly on the upper bound
    if r >= turn { r - turn } else { r }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}
