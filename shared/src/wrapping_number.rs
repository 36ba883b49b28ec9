use crate::Tick;

const HALF_RANGE: Tick = Tick::MAX / 2 + 1;

/// Returns whether or not a wrapping tick is greater than another
/// tick_greater_than(2,1) will return true
/// tick_greater_than(1,2) will return false
/// tick_greater_than(1,1) will return false
pub fn tick_greater_than(a: Tick, b: Tick) -> bool {
    ((a > b) && (a - b <= HALF_RANGE)) || ((a < b) && (b - a > HALF_RANGE))
}

/// Returns whether or not a wrapping tick is less than another
/// tick_less_than(1,2) will return true
/// tick_less_than(2,1) will return false
/// tick_less_than(1,1) will return false
pub fn tick_less_than(a: Tick, b: Tick) -> bool {
    tick_greater_than(b, a)
}
