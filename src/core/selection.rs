use crate::domain::model::{BranchBatch, MergedRecord, PriceStockRow, Product};
use crate::utils::error::{EtlError, Result};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Left join of price/stock rows with the catalog on SKU.
///
/// Every price row yields at least one record; a SKU listed several times in
/// the catalog yields one record per listing.
pub fn merge_on_sku(prices: &[PriceStockRow], products: &[Product]) -> Vec<MergedRecord> {
    let mut by_sku: HashMap<&str, Vec<&Product>> = HashMap::new();
    for product in products {
        by_sku.entry(product.sku.as_str()).or_default().push(product);
    }

    let mut merged = Vec::with_capacity(prices.len());
    let mut unmatched = 0usize;
    for row in prices {
        match by_sku.get(row.sku.as_str()) {
            Some(matches) => {
                merged.extend(matches.iter().map(|product| MergedRecord::new(row, Some(*product))));
            }
            None => {
                unmatched += 1;
                merged.push(MergedRecord::new(row, None));
            }
        }
    }

    if unmatched > 0 {
        tracing::debug!("{} price rows have no catalog entry", unmatched);
    }
    merged
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchPartition {
    pub matching: Vec<MergedRecord>,
    pub others: Vec<MergedRecord>,
}

pub fn partition_by_branch(records: Vec<MergedRecord>, branch: &str) -> BranchPartition {
    let (matching, others): (Vec<_>, Vec<_>) =
        records.into_iter().partition(|r| r.branch == branch);
    BranchPartition { matching, others }
}

/// The `n` highest-priced records, most expensive first. Records without a
/// price are skipped; equal prices keep their input order.
pub fn top_by_price(records: &[MergedRecord], n: usize) -> Vec<MergedRecord> {
    let mut priced: Vec<&MergedRecord> = records
        .iter()
        .filter(|r| r.price.is_some_and(|p| !p.is_nan()))
        .collect();

    // stable sort, so ties stay in file order
    priced.sort_by(|a, b| {
        b.price
            .partial_cmp(&a.price)
            .unwrap_or(Ordering::Equal)
    });

    priced.into_iter().take(n).cloned().collect()
}

/// Upload order: the other branches first, then the partition branch.
pub fn select_batches(records: Vec<MergedRecord>, partition_branch: &str, top_n: usize) -> Vec<BranchBatch> {
    let partition = partition_by_branch(records, partition_branch);

    let mut other_branches: Vec<&str> = Vec::new();
    for record in &partition.others {
        if !other_branches.contains(&record.branch.as_str()) {
            other_branches.push(record.branch.as_str());
        }
    }
    let others_label = if other_branches.is_empty() {
        format!("not {}", partition_branch)
    } else {
        other_branches.join(",")
    };

    vec![
        BranchBatch {
            records: top_by_price(&partition.others, top_n),
            partition_size: partition.others.len(),
            label: others_label,
        },
        BranchBatch {
            records: top_by_price(&partition.matching, top_n),
            partition_size: partition.matching.len(),
            label: partition_branch.to_string(),
        },
    ]
}

/// Delimited dump of the selected records, header first.
pub fn render_snapshot(batches: &[BranchBatch], delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    for record in batches.iter().flat_map(|b| &b.records) {
        writer.serialize(record)?;
    }

    let bytes = writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("failed to flush snapshot: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
        message: format!("snapshot is not valid UTF-8: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_row(sku: &str, branch: &str, price: Option<f64>) -> PriceStockRow {
        PriceStockRow {
            sku: sku.to_string(),
            branch: branch.to_string(),
            price,
            stock: Some(1.0),
        }
    }

    fn product(sku: &str, name: &str) -> Product {
        Product {
            sku: sku.to_string(),
            item_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn record(sku: &str, branch: &str, price: Option<f64>) -> MergedRecord {
        MergedRecord::new(&price_row(sku, branch, price), None)
    }

    #[test]
    fn test_left_join_preserves_price_rows() {
        let prices = vec![
            price_row("1", "MM", Some(5.0)),
            price_row("2", "RHSM", Some(6.0)),
            price_row("3", "MM", Some(7.0)),
        ];
        let products = vec![product("1", "Uno"), product("3", "Tres"), product("9", "Nueve")];

        let merged = merge_on_sku(&prices, &products);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].item_name.as_deref(), Some("Uno"));
        assert_eq!(merged[1].item_name, None);
        assert_eq!(merged[1].package, None);
        assert_eq!(merged[2].item_name.as_deref(), Some("Tres"));
    }

    #[test]
    fn test_left_join_repeats_duplicate_catalog_entries() {
        let prices = vec![price_row("1", "MM", Some(5.0))];
        let products = vec![product("1", "A"), product("1", "B")];

        let merged = merge_on_sku(&prices, &products);
        let names: Vec<_> = merged.iter().map(|m| m.item_name.clone().unwrap()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let records = vec![
            record("1", "MM", Some(1.0)),
            record("2", "RHSM", Some(2.0)),
            record("3", "MM", Some(3.0)),
            record("4", "RHSM", Some(4.0)),
        ];

        let partition = partition_by_branch(records.clone(), "MM");

        assert!(partition.matching.iter().all(|r| r.branch == "MM"));
        assert!(partition.others.iter().all(|r| r.branch != "MM"));
        assert_eq!(partition.matching.len() + partition.others.len(), records.len());
        for r in &records {
            let in_matching = partition.matching.contains(r);
            let in_others = partition.others.contains(r);
            assert!(in_matching ^ in_others);
        }
    }

    #[test]
    fn test_top_by_price_orders_and_limits() {
        let records = vec![
            record("a", "MM", Some(10.0)),
            record("b", "MM", None),
            record("c", "MM", Some(30.0)),
            record("d", "MM", Some(10.0)),
            record("e", "MM", Some(20.0)),
        ];

        let top = top_by_price(&records, 3);
        let skus: Vec<&str> = top.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["c", "e", "a"]);

        let all = top_by_price(&records, 100);
        let skus: Vec<&str> = all.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["c", "e", "a", "d"]);
    }

    #[test]
    fn test_select_batches_order() {
        let records = vec![
            record("1", "MM", Some(1.0)),
            record("2", "RHSM", Some(2.0)),
            record("3", "MM", Some(3.0)),
        ];

        let batches = select_batches(records, "MM", 1);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].label, "RHSM");
        assert_eq!(batches[0].partition_size, 1);
        assert_eq!(batches[1].label, "MM");
        assert_eq!(batches[1].partition_size, 2);
        assert_eq!(batches[1].records.len(), 1);
        assert_eq!(batches[1].records[0].sku, "3");
    }

    #[test]
    fn test_render_snapshot() {
        let batches = select_batches(vec![record("1", "MM", Some(9.5))], "MM", 10);
        let snapshot = render_snapshot(&batches, b'|').unwrap();

        let mut lines = snapshot.lines();
        assert_eq!(
            lines.next().unwrap(),
            "SKU|BRANCH|PRICE|STOCK|BUY_UNIT|FINELINE_NUMBER|EAN|ITEM_NAME|ITEM_DESCRIPTION|ITEM_IMG|BRAND_NAME|ALL_CATEGORIES|PACKAGE"
        );
        assert_eq!(lines.next().unwrap(), "1|MM|9.5|1.0|||||||||");
        assert!(lines.next().is_none());
    }
}
