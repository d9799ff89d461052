use fixed::types::I32F32;

/// Q32.32 fixed-point amount of product per cycle. Exact comparison is what
/// lets `imported == quantity` mean "fully supplied".
pub type Quantity = I32F32;

/// Recipe outputs below this amount are unbounded raw sources.
pub const UNBOUNDED_BELOW: Quantity = Quantity::ONE;

/// Convert an f64 to a Quantity. Use for construction and data loading only.
#[inline]
pub fn qty(v: f64) -> Quantity {
    Quantity::from_num(v)
}

/// Convert a Quantity to f64. Use for display only.
#[inline]
pub fn to_f64(v: Quantity) -> f64 {
    v.to_num::<f64>()
}

/// Whether an output quantity denotes an uncapped source.
#[inline]
pub fn is_unbounded(v: Quantity) -> bool {
    v < UNBOUNDED_BELOW
}
