//! Property-based tests for the Meridian catalog and BOM models
//!
//! Validation rules must hold for every quantity and cost, not just the
//! handful of literals used in the unit tests.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{is_positive_quantity, ChangeContext, ComponentEdge, Product};

prop_compose! {
    fn arb_decimal()(mantissa in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..6) -> Decimal {
        Decimal::new(mantissa, scale)
    }
}

prop_compose! {
    fn arb_part_number()(prefix in "[A-Z]{2,4}", number in 1..999_999u32) -> String {
        format!("{}-{:06}", prefix, number)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_edge_validates_iff_quantity_positive(quantity in arb_decimal()) {
        let ctx = ChangeContext::new("prop");
        let edge = ComponentEdge::new(Uuid::new_v4(), Uuid::new_v4(), quantity, &ctx);

        prop_assert_eq!(edge.validate().is_ok(), quantity > Decimal::ZERO);
        prop_assert_eq!(is_positive_quantity(quantity), quantity > Decimal::ZERO);
    }

    #[test]
    fn prop_leaf_validates_iff_cost_non_negative(
        part_number in arb_part_number(),
        cost in arb_decimal(),
    ) {
        let product = Product::leaf(part_number, "Leaf part", cost);
        prop_assert_eq!(product.validate().is_ok(), !cost.is_sign_negative());
    }

    #[test]
    fn prop_composite_never_accepts_direct_cost(
        part_number in arb_part_number(),
        cost in arb_decimal(),
    ) {
        let mut product = Product::composite(part_number, "Assembly");
        prop_assert!(product.validate().is_ok());
        product.direct_cost = Some(cost);
        prop_assert!(product.validate().is_err());
    }
}
