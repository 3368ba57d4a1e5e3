//! Fixed-Point Math for the RND Staking Pool
//!
//! All index arithmetic runs in `u128` scaled by `RATE_SCALE` and is checked.
//! Index updates truncate; the only rounded value is a payout, which rounds to
//! the nearest base unit with ties away from zero.

use crate::constants::precision::{RATE_SCALE, RESCALE_FACTOR, RESCALE_THRESHOLD};
use crate::errors::{StakingError, StakingResult};

/// Growth factor applied by a distribution
///
/// factor = RATE_SCALE + distributed * RATE_SCALE / pool_amount
///
/// # Errors
/// [`StakingError::EmptyPool`] when `pool_amount` is zero.
pub fn growth_factor(distributed: u64, pool_amount: u64) -> StakingResult<u128> {
    if pool_amount == 0 {
        return Err(StakingError::EmptyPool);
    }

    let ratio = (distributed as u128)
        .checked_mul(RATE_SCALE)
        .ok_or(StakingError::ArithmeticOverflow)?
        / pool_amount as u128;

    RATE_SCALE
        .checked_add(ratio)
        .ok_or(StakingError::ArithmeticOverflow)
}

/// Index after a socialized burn, rescaled if it fell too low
///
/// new_rate = rate * (pool_amount - burned) / pool_amount
///
/// Whenever the result would land under `RESCALE_THRESHOLD` it is multiplied
/// by `RESCALE_FACTOR` until it does not, and the number of multiplications is
/// returned alongside. A burn of the whole pool returns `(0, 0)`; the caller
/// starts a new epoch instead.
///
/// # Errors
/// [`StakingError::InsufficientPoolBalance`] if `burned` exceeds the pool,
/// [`StakingError::ArithmeticOverflow`] if the scaled product does not fit.
pub fn shrink_rate(rate: u128, burned: u64, pool_amount: u64) -> StakingResult<(u128, u64)> {
    let remaining = pool_sub(pool_amount, burned)?;
    if pool_amount == 0 {
        return Ok((rate, 0));
    }
    if remaining == 0 {
        return Ok((0, 0));
    }

    let mut numerator = rate
        .checked_mul(remaining as u128)
        .ok_or(StakingError::ArithmeticOverflow)?;
    let mut new_rate = numerator / pool_amount as u128;
    let mut rescales = 0u64;
    while new_rate < RESCALE_THRESHOLD {
        numerator = numerator
            .checked_mul(RESCALE_FACTOR)
            .ok_or(StakingError::ArithmeticOverflow)?;
        new_rate = numerator / pool_amount as u128;
        rescales += 1;
    }

    Ok((new_rate, rescales))
}

/// Snapshot rate expressed at the pool's current scale
///
/// divisor = rate_initial * RESCALE_FACTOR^scale_gap
///
/// `None` means the snapshot is so many rescales behind that its value has
/// rounded away to nothing.
pub fn rescaled_divisor(rate_initial: u128, scale_gap: u64) -> Option<u128> {
    let exponent = u32::try_from(scale_gap).ok()?;
    RESCALE_FACTOR
        .checked_pow(exponent)?
        .checked_mul(rate_initial)
}

/// Multiply the index by a factor expressed on RATE_SCALE
///
/// new_rate = rate * factor / RATE_SCALE
pub fn compound_rate(rate: u128, factor: u128) -> StakingResult<u128> {
    rate.checked_mul(factor)
        .ok_or(StakingError::ArithmeticOverflow)
        .map(|scaled| scaled / RATE_SCALE)
}

/// Integer division rounding to nearest, ties away from zero
///
/// Returns `None` when `denominator` is zero.
pub fn div_round_half_up(numerator: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    // remainder >= denominator / 2, written without losing the odd half
    if remainder >= denominator - remainder {
        quotient.checked_add(1)
    } else {
        Some(quotient)
    }
}

/// Current value of a principal staked at `rate_initial`
///
/// value = round(balance * rate_now / rate_initial)
///
/// # Errors
/// [`StakingError::ArithmeticOverflow`] if the product or the result does not
/// fit, or if the snapshot rate is zero.
pub fn scaled_value(balance: u64, rate_now: u128, rate_initial: u128) -> StakingResult<u64> {
    if balance == 0 {
        return Ok(0);
    }

    let numerator = (balance as u128)
        .checked_mul(rate_now)
        .ok_or(StakingError::ArithmeticOverflow)?;
    let value = div_round_half_up(numerator, rate_initial).ok_or(StakingError::ArithmeticOverflow)?;

    u64::try_from(value).map_err(|_| StakingError::ArithmeticOverflow)
}

/// Safe addition with overflow check
pub fn safe_add(a: u64, b: u64) -> StakingResult<u64> {
    a.checked_add(b).ok_or(StakingError::ArithmeticOverflow)
}

/// Pool subtraction; underflow means the pool cannot cover `b`
pub fn pool_sub(available: u64, required: u64) -> StakingResult<u64> {
    available
        .checked_sub(required)
        .ok_or(StakingError::InsufficientPoolBalance { available, required })
}
