//! 16.16 fixed-point scalar and binary angles.
//!
//! Every coordinate, height and speed in the simulation goes through
//! [`Fixed`].  Replays are only bit-exact as long as no float ever touches
//! world state, so there is deliberately no `From<f32>`.

use once_cell::sync::Lazy;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

pub const FRACBITS: i32 = 16;
pub const FRACUNIT: i32 = 1 << FRACBITS;

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(FRACUNIT);
    pub const MAX: Fixed = Fixed(i32::MAX);
    pub const MIN: Fixed = Fixed(i32::MIN);

    /// Map units → fixed (`v << FRACBITS`).
    #[inline]
    pub const fn from_int(v: i32) -> Self {
        Fixed(v << FRACBITS)
    }

    /// Fixed → map units, rounding toward −∞ like an arithmetic shift.
    #[inline]
    pub const fn to_int(self) -> i32 {
        self.0 >> FRACBITS
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Fixed(self.0.wrapping_abs())
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/* ─────────────────────────── arithmetic ─────────────────────────── */

impl Add for Fixed {
    type Output = Fixed;
    #[inline]
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    #[inline]
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    #[inline]
    fn neg(self) -> Fixed {
        Fixed(self.0.wrapping_neg())
    }
}

/// `FixedMul`: 64-bit product shifted back down.
impl Mul for Fixed {
    type Output = Fixed;
    #[inline]
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(((self.0 as i64 * rhs.0 as i64) >> FRACBITS) as i32)
    }
}

/// `FixedDiv`: saturates to `MIN`/`MAX` (by sign) when the quotient would
/// not fit, which also covers division by zero.
impl Div for Fixed {
    type Output = Fixed;
    #[inline]
    fn div(self, rhs: Fixed) -> Fixed {
        if (self.0.unsigned_abs() >> 14) >= rhs.0.unsigned_abs() {
            return if (self.0 ^ rhs.0) < 0 {
                Fixed::MIN
            } else {
                Fixed::MAX
            };
        }
        Fixed((((self.0 as i64) << FRACBITS) / rhs.0 as i64) as i32)
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}/65536", self.0 >> FRACBITS, self.0 & (FRACUNIT - 1))
    }
}

/* ─────────────────────────── angles ─────────────────────────── */

/// Binary angle measurement: the full circle is the whole `u32` range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bam(pub u32);

impl Bam {
    pub const ANG45: Bam = Bam(0x2000_0000);
    pub const ANG90: Bam = Bam(0x4000_0000);
    pub const ANG180: Bam = Bam(0x8000_0000);

    /// Angles stored as 16-bit map fields are the high half of a BAM.
    #[inline]
    pub const fn from_short(v: i16) -> Self {
        Bam(((v as i32) << 16) as u32)
    }

    /// Editor angles (degrees) snap to 45° steps.
    #[inline]
    pub const fn from_degrees_snapped(deg: i16) -> Self {
        Bam(Self::ANG45.0.wrapping_mul((deg / 45) as i32 as u32))
    }

    #[inline]
    pub const fn wrapping_add(self, rhs: Bam) -> Bam {
        Bam(self.0.wrapping_add(rhs.0))
    }
}

/* ─────────────────────────── fine trig ─────────────────────────── */

pub const FINEANGLES: usize = 8192;
pub const ANGLETOFINESHIFT: u32 = 19;

/// `sin((i + 0.5) * 2π / FINEANGLES)` in 16.16, truncated toward zero.
///
/// Built with integer Taylor series so the table is identical on every
/// platform.
static FINESINE: Lazy<Vec<i32>> = Lazy::new(|| {
    const SCALE_BITS: u32 = 60;
    const PI: i128 = 3_622_009_729_038_561_421; // π << 60
    let quarter = FINEANGLES / 4;

    let mut table = vec![0i32; FINEANGLES];
    for i in 0..quarter {
        let theta = (2 * i as i128 + 1) * PI / FINEANGLES as i128;
        let theta2 = theta * theta >> SCALE_BITS;
        let (mut term, mut sum, mut k) = (theta, theta, 1i128);
        while term != 0 {
            term = -term * theta2 / (1i128 << SCALE_BITS) / ((2 * k) * (2 * k + 1));
            sum += term;
            k += 1;
        }
        table[i] = ((sum << FRACBITS) >> SCALE_BITS) as i32;
    }
    for i in 0..quarter {
        table[quarter + i] = table[quarter - 1 - i];
    }
    for i in 0..FINEANGLES / 2 {
        table[FINEANGLES / 2 + i] = -table[i];
    }
    table
});

impl Bam {
    #[inline]
    pub fn fine_index(self) -> usize {
        (self.0 >> ANGLETOFINESHIFT) as usize
    }

    pub fn sin(self) -> Fixed {
        Fixed(FINESINE[self.fine_index()])
    }

    pub fn cos(self) -> Fixed {
        Fixed(FINESINE[(self.fine_index() + FINEANGLES / 4) & (FINEANGLES - 1)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_conversion_uses_arithmetic_shift() {
        assert_eq!(Fixed::from_int(3).raw(), 3 * FRACUNIT);
        assert_eq!(Fixed::from_int(-3).to_int(), -3);
        assert_eq!(Fixed(-1).to_int(), -1);
    }

    #[test]
    fn mul_and_div() {
        let a = Fixed::from_int(6);
        let b = Fixed::from_int(4);
        assert_eq!(a * b, Fixed::from_int(24));
        assert_eq!(a / b, Fixed(FRACUNIT + FRACUNIT / 2));
        assert_eq!(Fixed(0xE800) * Fixed::from_int(2), Fixed(0x1_D000));
    }

    #[test]
    fn div_saturates_on_overflow_and_zero() {
        assert_eq!(Fixed::from_int(1) / Fixed::ZERO, Fixed::MAX);
        assert_eq!(Fixed::from_int(-1) / Fixed::ZERO, Fixed::MIN);
        assert_eq!(Fixed::from_int(30000) / Fixed(1), Fixed::MAX);
    }

    #[test]
    fn short_angles() {
        assert_eq!(Bam::from_short(0x4000), Bam::ANG90);
        assert_eq!(Bam::from_short(-32768), Bam::ANG180);
        assert_eq!(Bam::from_degrees_snapped(90), Bam::ANG90);
        assert_eq!(Bam::from_degrees_snapped(100), Bam::ANG90);
    }

    #[test]
    fn fine_sine_table() {
        assert_eq!(Bam(0).sin(), Fixed(25));
        assert_eq!(Bam(1 << ANGLETOFINESHIFT).sin(), Fixed(75));
        assert_eq!(Bam(0x3FFF_FFFF).sin(), Fixed(65535));
        assert_eq!(Bam::ANG90.cos(), Fixed(-25));
        assert_eq!(Bam(0).cos(), Fixed(65535));
        assert_eq!(Bam::ANG180.sin(), Fixed(-25));
    }
}
