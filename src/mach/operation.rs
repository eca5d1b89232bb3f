use super::val::{from_bool, FALSE};

/// ## Arithmetic on stack words
///
/// Binary operations take the second-popped word as `lhs`. Arithmetic
/// wraps like the 32-bit registers of the handheld and nothing
/// here can fail: division by zero has defined results.

pub struct Operation {}

impl Operation {
    pub fn negate(val: i32) -> i32 {
        val.wrapping_neg()
    }

    pub fn sum(lhs: i32, rhs: i32) -> i32 {
        lhs.wrapping_add(rhs)
    }

    pub fn subtract(lhs: i32, rhs: i32) -> i32 {
        lhs.wrapping_sub(rhs)
    }

    pub fn multiply(lhs: i32, rhs: i32) -> i32 {
        lhs.wrapping_mul(rhs)
    }

    /// Division by zero is -1.
    pub fn divide(lhs: i32, rhs: i32) -> i32 {
        if rhs == 0 {
            -1
        } else {
            lhs.wrapping_div(rhs)
        }
    }

    /// Remainder by zero is 0.
    pub fn modulo(lhs: i32, rhs: i32) -> i32 {
        if rhs == 0 {
            0
        } else {
            lhs.wrapping_rem(rhs)
        }
    }

    pub fn shift_left(lhs: i32, rhs: i32) -> i32 {
        lhs.wrapping_shl(rhs as u32)
    }

    pub fn shift_right(lhs: i32, rhs: i32) -> i32 {
        lhs.wrapping_shr(rhs as u32)
    }

    pub fn shift_right_unsigned(lhs: i32, rhs: i32) -> i32 {
        (lhs as u32).wrapping_shr(rhs as u32) as i32
    }

    pub fn and(lhs: i32, rhs: i32) -> i32 {
        from_bool(lhs != 0 && rhs != 0)
    }

    pub fn or(lhs: i32, rhs: i32) -> i32 {
        from_bool(lhs != 0 || rhs != 0)
    }

    pub fn not(val: i32) -> i32 {
        from_bool(val == FALSE)
    }

    pub fn equal(lhs: i32, rhs: i32) -> i32 {
        from_bool(lhs == rhs)
    }

    pub fn not_equal(lhs: i32, rhs: i32) -> i32 {
        from_bool(lhs != rhs)
    }

    pub fn less(lhs: i32, rhs: i32) -> i32 {
        from_bool(lhs < rhs)
    }

    pub fn less_equal(lhs: i32, rhs: i32) -> i32 {
        from_bool(lhs <= rhs)
    }

    pub fn greater(lhs: i32, rhs: i32) -> i32 {
        from_bool(lhs > rhs)
    }

    pub fn greater_equal(lhs: i32, rhs: i32) -> i32 {
        from_bool(lhs >= rhs)
    }

    pub fn abs(val: i32) -> i32 {
        val.wrapping_abs()
    }
}
