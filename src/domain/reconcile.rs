//! Reconciliation engine.
//!
//! Joins the marketplace catalog with the supplier list and produces
//! the minimal ordered set of price/stock writes. Pure computation over
//! in-memory snapshots; no I/O.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::catalog::{CatalogItem, OfferId, ReferenceItem, UpdateInstruction};
use super::pricing::{PriceConverter, PriceRounding};
use super::stock::StockPolicy;

/// Which input a malformed record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Catalog,
    Reference,
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog => write!(f, "catalog"),
            Self::Reference => write!(f, "reference feed"),
        }
    }
}

/// Malformed input record. Aborts the whole reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchingError {
    #[error("{input} record #{index} has no offer identifier")]
    MissingIdentifier {
        input: RecordSource,
        index: usize,
    },
}

/// Tunables for one marketplace target.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Rounding used for whole-ruble prices.
    pub rounding: PriceRounding,
    /// Marketplace stock ceiling, if any.
    pub max_stock: Option<u32>,
    /// Write stock 0 for listed offers the supplier no longer reports.
    pub zero_missing_stock: bool,
}

/// Output of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationPlan {
    /// Writes to send, in catalog order, unique by offer.
    pub instructions: Vec<UpdateInstruction>,
    /// Matched offers whose listed price and stock already match.
    pub unchanged: usize,
    /// Listed offers missing from the supplier list.
    pub unmatched_catalog: usize,
    /// Supplier rows with no listed offer.
    pub unmatched_reference: usize,
    /// Stock-only zeroing writes included in `instructions`.
    pub zeroed: usize,
}

impl ReconciliationPlan {
    /// Instructions that carry a price write.
    pub fn price_updates(&self) -> impl Iterator<Item = &UpdateInstruction> {
        self.instructions.iter().filter(|i| i.has_price())
    }

    /// Every instruction carries a stock write.
    pub fn stock_updates(&self) -> impl Iterator<Item = &UpdateInstruction> {
        self.instructions.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Reconciles catalog snapshots against supplier data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    prices: PriceConverter,
    stock: StockPolicy,
    zero_missing_stock: bool,
}

impl Reconciler {
    /// Build a reconciler from per-marketplace options.
    pub fn new(options: ReconcileOptions) -> Self {
        Self {
            prices: PriceConverter::new(options.rounding),
            stock: StockPolicy::new(options.max_stock),
            zero_missing_stock: options.zero_missing_stock,
        }
    }

    /// Join and diff the two snapshots.
    ///
    /// # Errors
    /// [`MatchingError`] if any record in either input has a blank
    /// identifier. No partial plan is returned.
    pub fn reconcile(
        &self,
        catalog: &[CatalogItem],
        reference: &[ReferenceItem],
    ) -> Result<ReconciliationPlan, MatchingError> {
        check_identifiers(catalog.iter().map(|c| c.offer_id.as_str()), RecordSource::Catalog)?;
        check_identifiers(reference.iter().map(|r| r.offer_id.as_str()), RecordSource::Reference)?;

        // First supplier row per offer wins.
        let mut by_offer: HashMap<&str, &ReferenceItem> = HashMap::with_capacity(reference.len());
        for item in reference {
            by_offer.entry(item.offer_id.trim()).or_insert(item);
        }

        let mut plan = ReconciliationPlan::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(catalog.len());

        for listed in catalog {
            let key = listed.offer_id.trim();
            if !seen.insert(key) {
                continue;
            }

            let Some(supplied) = by_offer.get(key) else {
                plan.unmatched_catalog += 1;
                if self.zero_missing_stock && listed.stock != Some(0) {
                    plan.instructions.push(UpdateInstruction {
                        offer_id: OfferId::from(key),
                        price: None,
                        stock: 0,
                    });
                    plan.zeroed += 1;
                }
                continue;
            };

            let price = self.prices.to_marketplace(supplied.price);
            let stock = self.stock.to_marketplace(supplied.stock);

            if listed.price == Some(price) && listed.stock == Some(stock) {
                plan.unchanged += 1;
                continue;
            }

            plan.instructions.push(UpdateInstruction {
                offer_id: OfferId::from(key),
                price: Some(price),
                stock,
            });
        }

        plan.unmatched_reference = by_offer.keys().filter(|k| !seen.contains(*k)).count();

        Ok(plan)
    }
}

fn check_identifiers<'a>(
    ids: impl Iterator<Item = &'a str>,
    source: RecordSource,
) -> Result<(), MatchingError> {
    for (index, id) in ids.enumerate() {
        if id.trim().is_empty() {
            return Err(MatchingError::MissingIdentifier { input: source, index });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn catalog(id: &str, price: rust_decimal::Decimal, stock: u32) -> CatalogItem {
        CatalogItem {
            offer_id: id.to_string(),
            price: Some(price),
            stock: Some(stock),
        }
    }

    fn supplied(id: &str, price: rust_decimal::Decimal, stock: i64) -> ReferenceItem {
        ReferenceItem {
            offer_id: id.to_string(),
            price,
            stock,
        }
    }

    #[test]
    fn test_single_match_converts_price() {
        let r = Reconciler::default();
        let plan = r
            .reconcile(&[catalog("A", dec!(100), 5)], &[supplied("A", dec!(9.99), 3)])
            .unwrap();

        assert_eq!(
            plan.instructions,
            vec![UpdateInstruction {
                offer_id: "A".into(),
                price: Some(PriceConverter::default().to_marketplace(dec!(9.99))),
                stock: 3,
            }]
        );
    }

    #[test]
    fn test_no_match_no_instructions() {
        let r = Reconciler::default();
        let plan = r
            .reconcile(&[catalog("A", dec!(100), 5)], &[supplied("B", dec!(50), 1)])
            .unwrap();

        assert!(plan.is_empty());
        assert_eq!(plan.unmatched_catalog, 1);
        assert_eq!(plan.unmatched_reference, 1);
    }

    #[test]
    fn test_unchanged_offer_is_skipped() {
        let r = Reconciler::default();
        let plan = r
            .reconcile(&[catalog("A", dec!(5990), 4)], &[supplied("A", dec!(5990.00), 4)])
            .unwrap();

        assert!(plan.is_empty());
        assert_eq!(plan.unchanged, 1);
    }

    #[test]
    fn test_unknown_listing_values_always_update() {
        let r = Reconciler::default();
        let plan = r
            .reconcile(&[CatalogItem::listed("A")], &[supplied("A", dec!(10), 2)])
            .unwrap();

        assert_eq!(plan.instructions.len(), 1);
    }

    #[test]
    fn test_duplicates_first_wins() {
        let r = Reconciler::default();
        let plan = r
            .reconcile(
                &[CatalogItem::listed("A"), CatalogItem::listed("A")],
                &[supplied("A", dec!(10), 2), supplied("A", dec!(99), 9)],
            )
            .unwrap();

        assert_eq!(plan.instructions.len(), 1);
        assert_eq!(plan.instructions[0].price, Some(dec!(10)));
        assert_eq!(plan.instructions[0].stock, 2);
    }

    #[test]
    fn test_identifiers_are_trimmed() {
        let r = Reconciler::default();
        let plan = r
            .reconcile(&[CatalogItem::listed("GA-100 ")], &[supplied(" GA-100", dec!(1), 1)])
            .unwrap();

        assert_eq!(plan.instructions[0].offer_id, "GA-100");
    }

    #[test]
    fn test_blank_identifier_aborts() {
        let r = Reconciler::default();
        let err = r
            .reconcile(
                &[CatalogItem::listed("A")],
                &[supplied("A", dec!(1), 1), supplied("  ", dec!(1), 1)],
            )
            .unwrap_err();

        assert_eq!(
            err,
            MatchingError::MissingIdentifier {
                input: RecordSource::Reference,
                index: 1,
            }
        );
    }

    #[test]
    fn test_missing_left_untouched_by_default() {
        let r = Reconciler::default();
        let plan = r
            .reconcile(&[CatalogItem::listed("A"), CatalogItem::listed("B")], &[supplied("A", dec!(1), 1)])
            .unwrap();

        assert_eq!(plan.instructions.len(), 1);
        assert_eq!(plan.zeroed, 0);
    }

    #[test]
    fn test_zero_missing_stock_emits_stock_only() {
        let r = Reconciler::new(ReconcileOptions {
            zero_missing_stock: true,
            ..Default::default()
        });
        let plan = r
            .reconcile(&[CatalogItem::listed("A"), CatalogItem::listed("B")], &[supplied("A", dec!(1), 1)])
            .unwrap();

        assert_eq!(plan.instructions.len(), 2);
        assert_eq!(plan.zeroed, 1);
        assert_eq!(plan.instructions[1].price, None);
        assert_eq!(plan.instructions[1].stock, 0);
        assert_eq!(plan.price_updates().count(), 1);
        assert_eq!(plan.stock_updates().count(), 2);
    }

    #[test]
    fn test_stock_clamped_to_max() {
        let r = Reconciler::new(ReconcileOptions {
            max_stock: Some(50),
            ..Default::default()
        });
        let plan = r
            .reconcile(&[CatalogItem::listed("A")], &[supplied("A", dec!(1), 1_000)])
            .unwrap();

        assert_eq!(plan.instructions[0].stock, 50);
    }
}
