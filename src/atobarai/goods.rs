//! Conversion of Saleor order lines into NP Atobarai `goods`.
//!
//! NP Atobarai settles in whole yen and requires the goods total to equal
//! `billed_amount`; any difference is carried by a single adjustment line.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::types::Goods;

pub const SHIPPING_GOODS_NAME: &str = "Shipping";
pub const ADJUSTMENT_GOODS_NAME: &str = "Adjustment";

/// One Saleor line as seen by the goods builder.
#[derive(Debug, Clone, PartialEq)]
pub struct GoodsLine<'a> {
    pub product_name: &'a str,
    pub product_sku: Option<&'a str>,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Whole-yen amount with halves rounded away from zero, `None` if it does not fit an `i64`.
pub fn to_yen(amount: Decimal) -> Option<i64> {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Build goods for `lines` plus an optional shipping line, balanced to `billed_amount`.
///
/// `None` when an amount does not fit an `i64` or the goods total overflows.
pub fn build_goods<'a>(
    lines: impl IntoIterator<Item = GoodsLine<'a>>,
    shipping_amount: Option<Decimal>,
    billed_amount: i64,
    sku_as_name: bool,
) -> Option<Vec<Goods>> {
    let mut goods = Vec::new();

    for line in lines {
        if line.quantity == 0 {
            continue;
        }
        let goods_name = match (sku_as_name, line.product_sku) {
            (true, Some(sku)) if !sku.is_empty() => sku.to_string(),
            _ => line.product_name.to_string(),
        };
        goods.push(Goods {
            goods_name,
            goods_price: to_yen(line.unit_price)?,
            quantity: line.quantity,
        });
    }

    if let Some(shipping) = shipping_amount.filter(|amount| !amount.is_zero()) {
        goods.push(Goods {
            goods_name: SHIPPING_GOODS_NAME.to_string(),
            goods_price: to_yen(shipping)?,
            quantity: 1,
        });
    }

    let total = goods
        .iter()
        .try_fold(0i64, |sum, g| sum.checked_add(g.checked_total()?))?;
    if total != billed_amount {
        goods.push(Goods {
            goods_name: ADJUSTMENT_GOODS_NAME.to_string(),
            goods_price: billed_amount.checked_sub(total)?,
            quantity: 1,
        });
    }

    Some(goods)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, price: i64, quantity: u32) -> GoodsLine<'_> {
        GoodsLine {
            product_name: name,
            product_sku: None,
            unit_price: Decimal::new(price, 0),
            quantity,
        }
    }

    #[test]
    fn balanced_lines_need_no_adjustment() {
        let goods = build_goods([line("Tea", 500, 2)], Some(Decimal::new(300, 0)), 1300, false).unwrap();
        assert_eq!(goods.len(), 2);
        assert_eq!(goods[1].goods_name, SHIPPING_GOODS_NAME);
        assert_eq!(goods.iter().filter_map(Goods::checked_total).sum::<i64>(), 1300);
    }

    #[test]
    fn difference_goes_to_one_adjustment_line() {
        let goods = build_goods([line("Tea", 500, 2)], None, 900, false).unwrap();
        let adjustment = goods.last().unwrap();
        assert_eq!(adjustment.goods_name, ADJUSTMENT_GOODS_NAME);
        assert_eq!(adjustment.goods_price, -100);
    }

    #[test]
    fn zero_quantity_lines_and_free_shipping_are_dropped() {
        let goods = build_goods([line("Tea", 500, 0), line("Cup", 200, 1)], Some(Decimal::ZERO), 200, false).unwrap();
        assert_eq!(goods, vec![Goods { goods_name: "Cup".into(), goods_price: 200, quantity: 1 }]);
    }

    #[test]
    fn sku_replaces_name_when_configured() {
        let mut tea = line("Tea", 500, 1);
        tea.product_sku = Some("TEA-001");
        let goods = build_goods([tea], None, 500, true).unwrap();
        assert_eq!(goods[0].goods_name, "TEA-001");
    }

    #[test]
    fn yen_rounding() {
        assert_eq!(to_yen(Decimal::new(10050, 2)), Some(101));
        assert_eq!(to_yen(Decimal::new(10150, 2)), Some(102));
        assert_eq!(to_yen(Decimal::new(100, 0)), Some(100));
    }

    #[test]
    fn half_yen_rounds_away_from_zero() {
        assert_eq!(to_yen(Decimal::new(10250, 2)), Some(103));
        assert_eq!(to_yen(Decimal::new(-10050, 2)), Some(-101));
        assert_eq!(to_yen(Decimal::new(-10250, 2)), Some(-103));
    }

    #[test]
    fn overflowing_goods_total_is_rejected() {
        let huge = line("Gold", 5_000_000_000_000_000_000, 2);
        assert_eq!(build_goods([huge], None, 100, false), None);

        let lines = [line("Gold", i64::MAX, 1), line("Silver", 1, 1)];
        assert_eq!(build_goods(lines, None, 100, false), None);
    }

    #[test]
    fn adjustment_that_overflows_is_rejected() {
        assert_eq!(build_goods([line("Tea", 2, 1)], None, i64::MIN, false), None);
    }
}
