/// Largest discount the storefront will honour, in whole percent.
pub const MAX_DISCOUNT_PERCENT: i32 = 70;

/// Applies a percentage discount to a price.
///
/// Percentages outside `[0, MAX_DISCOUNT_PERCENT]` (including negative ones)
/// leave the price unchanged. That is policy, not an error: a bogus coupon
/// simply buys you nothing.
pub fn apply_discount(price: f64, percent: i32) -> f64 {
    if !(0..=MAX_DISCOUNT_PERCENT).contains(&percent) {
        return price;
    }
    price - (price * percent as f64 / 100.0)
}

/// Single-slot memo for repeated quotes of the same `(price, percent)` pair.
///
/// The slot is caller-owned, so two carts never observe each other's cached
/// quote and `&mut self` keeps concurrent use out of the type system entirely.
/// A miss recomputes and overwrites the slot unconditionally.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscountCache {
    slot: Option<(f64, i32, f64)>,
}

impl DiscountCache {
    pub fn new() -> Self { Self::default() }

    /// Same result as [`apply_discount`] for every input pair.
    pub fn apply(&mut self, price: f64, percent: i32) -> f64 {
        if let Some((cached_price, cached_percent, cached_result)) = self.slot {
            if cached_price == price && cached_percent == percent {
                return cached_result;
            }
        }

        let result = apply_discount(price, percent);
        self.slot = Some((price, percent, result));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_formula_over_valid_range() {
        for percent in 0..=MAX_DISCOUNT_PERCENT {
            let expected = 250.0 * (1.0 - percent as f64 / 100.0);
            assert!((apply_discount(250.0, percent) - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn out_of_range_percent_is_a_no_op() {
        assert_eq!(apply_discount(100.0, -1), 100.0);
        assert_eq!(apply_discount(100.0, 71), 100.0);
        assert_eq!(apply_discount(100.0, i32::MIN), 100.0);
        assert_eq!(apply_discount(100.0, i32::MAX), 100.0);
    }

    #[test]
    fn zero_price_stays_zero() {
        assert_eq!(apply_discount(0.0, 50), 0.0);
    }

    #[test]
    fn cache_agrees_with_plain_discount() {
        let mut cache = DiscountCache::new();
        for (price, percent) in [(100.0, 20), (100.0, 20), (19.99, 5), (42.0, -3), (42.0, 90)] {
            assert_eq!(cache.apply(price, percent), apply_discount(price, percent));
        }
    }

    #[test]
    fn cache_hit_returns_the_stored_value() {
        let mut cache = DiscountCache::new();
        cache.apply(100.0, 20);

        // poke the slot so a hit is distinguishable from a recompute
        cache.slot = Some((100.0, 20, -1.0));
        assert_eq!(cache.apply(100.0, 20), -1.0);
    }

    #[test]
    fn cache_miss_overwrites_the_slot() {
        let mut cache = DiscountCache::new();
        assert!(cache.slot.is_none());

        cache.apply(100.0, 20);
        assert_eq!(cache.slot, Some((100.0, 20, 80.0)));

        cache.apply(50.0, 10);
        assert_eq!(cache.slot, Some((50.0, 10, 45.0)));
    }
}
