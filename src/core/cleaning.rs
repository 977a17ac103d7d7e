//! Cleaning of the two pipe-delimited exports.
//!
//! The price/stock file is filtered down to sellable rows of the allowed
//! branches; the catalog file gets a merged category path, HTML-free
//! descriptions and a package size pulled out of the description text.

use crate::domain::model::{PriceStockRow, Product, ProductRow};
use crate::utils::error::{EtlError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

pub const PRICE_STOCK_COLUMNS: [&str; 4] = ["SKU", "BRANCH", "PRICE", "STOCK"];

pub const PRODUCT_REQUIRED_COLUMNS: [&str; 6] = [
    "SKU",
    "ITEM_NAME",
    "ITEM_DESCRIPTION",
    "CATEGORY",
    "SUB_CATEGORY",
    "SUB_SUB_CATEGORY",
];

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("html tag pattern is valid"));

static PACKAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d[0-9]{1,} .{2,3}|[0-9]{1,}UN|[0-9]{1,}KG|[0-9]{1,}M|\d+GR)")
        .expect("package pattern is valid")
});

/// Raw bytes of one export plus what is needed to parse and report on it.
#[derive(Debug, Clone, Copy)]
pub struct CsvSource<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    pub delimiter: u8,
}

impl<'a> CsvSource<'a> {
    pub fn new(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            data,
            delimiter: b'|',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn reader(&self, trim: csv::Trim) -> csv::Reader<&'a [u8]> {
        csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(trim)
            .from_reader(self.data)
    }
}

fn require_columns<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
    source: &str,
    columns: &[&str],
) -> Result<()> {
    let headers = reader.headers()?;
    for column in columns {
        if !headers.iter().any(|h| h == *column) {
            return Err(EtlError::MissingColumnError {
                file: source.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Keeps in-stock rows of the allowed branches, then removes every row whose
/// (SKU, BRANCH) pair occurs more than once.
pub fn prepare_prices_stock(source: CsvSource<'_>, branches: &[String]) -> Result<Vec<PriceStockRow>> {
    let mut reader = source.reader(csv::Trim::All);
    require_columns(&mut reader, source.name, &PRICE_STOCK_COLUMNS)?;

    let mut total = 0usize;
    let mut rows = Vec::new();
    for result in reader.deserialize::<PriceStockRow>() {
        let row = result?;
        total += 1;

        if !row.stock.is_some_and(|stock| stock > 0.0) {
            continue;
        }
        if !branches.iter().any(|b| *b == row.branch) {
            continue;
        }
        rows.push(row);
    }

    let mut occurrences: HashMap<(String, String), usize> = HashMap::new();
    for row in &rows {
        *occurrences
            .entry((row.sku.clone(), row.branch.clone()))
            .or_default() += 1;
    }

    let in_stock = rows.len();
    rows.retain(|row| occurrences[&(row.sku.clone(), row.branch.clone())] == 1);

    tracing::debug!(
        "{}: {} rows read, {} in stock at allowed branches, {} after dropping duplicates",
        source.name,
        total,
        in_stock,
        rows.len()
    );

    Ok(rows)
}

/// Cleans every catalog row; the row count is unchanged.
///
/// Free-text cells are kept as exported, so only headers are trimmed here;
/// blank category levels are handled in [`merge_categories`].
pub fn prepare_products(source: CsvSource<'_>) -> Result<Vec<Product>> {
    let mut reader = source.reader(csv::Trim::Headers);
    require_columns(&mut reader, source.name, &PRODUCT_REQUIRED_COLUMNS)?;

    let mut products = Vec::new();
    for result in reader.deserialize::<ProductRow>() {
        products.push(clean_product(result?));
    }

    tracing::debug!("{}: {} products prepared", source.name, products.len());
    Ok(products)
}

fn clean_product(row: ProductRow) -> Product {
    let all_categories = merge_categories(&row);
    let item_description = row.item_description.as_deref().map(strip_html);
    let package = item_description
        .as_deref()
        .and_then(extract_package)
        .unwrap_or_default();

    Product {
        sku: row.sku.trim().to_string(),
        buy_unit: row.buy_unit,
        fineline_number: row.fineline_number,
        ean: row.ean,
        item_name: row.item_name.map(|name| name.replace("   ", "")),
        item_description,
        item_img: row.item_img,
        brand_name: row.brand_name,
        all_categories,
        package,
    }
}

/// `category|sub category|sub sub category` in lowercase, or nothing when any
/// level is missing or blank.
pub fn merge_categories(row: &ProductRow) -> Option<String> {
    let category = non_blank(&row.category)?;
    let sub_category = non_blank(&row.sub_category)?;
    let sub_sub_category = non_blank(&row.sub_sub_category)?;

    Some(format!(
        "{}|{}|{}",
        category.to_lowercase(),
        sub_category.to_lowercase(),
        sub_sub_category.to_lowercase()
    ))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

pub fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").trim().to_string()
}

/// First package size mentioned in a description, e.g. `1000 ML`, `40UN`, `3KG`.
pub fn extract_package(description: &str) -> Option<String> {
    PACKAGE
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branches() -> Vec<String> {
        vec!["MM".to_string(), "RHSM".to_string()]
    }

    #[test]
    fn test_prices_filters_stock_and_branch() {
        let csv = "SKU|BRANCH|PRICE|STOCK\n1|MM|10.5|3\n2|MM|8|0\n3|RHSM|4|-1\n4|XYZ|9|5\n5|RHSM|7|\n6|RHSM|2.5|1\n";
        let rows = prepare_prices_stock(CsvSource::new("prices", csv.as_bytes()), &branches()).unwrap();

        let skus: Vec<&str> = rows.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["1", "6"]);
        assert_eq!(rows[0].price, Some(10.5));
    }

    #[test]
    fn test_prices_drops_every_duplicate() {
        let csv = "SKU|BRANCH|PRICE|STOCK\n1|MM|10|3\n1|MM|11|4\n1|RHSM|10|2\n2|MM|5|0\n2|MM|5|6\n";
        let rows = prepare_prices_stock(CsvSource::new("prices", csv.as_bytes()), &branches()).unwrap();

        // both 1/MM rows go; 2/MM survives because its twin had no stock
        let pairs: Vec<(&str, &str)> = rows.iter().map(|r| (r.sku.as_str(), r.branch.as_str())).collect();
        assert_eq!(pairs, vec![("1", "RHSM"), ("2", "MM")]);
    }

    #[test]
    fn test_prices_missing_column() {
        let csv = "SKU|BRANCH|PRICE\n1|MM|10\n";
        let err = prepare_prices_stock(CsvSource::new("PRICES-STOCK.csv", csv.as_bytes()), &branches()).unwrap_err();
        match err {
            EtlError::MissingColumnError { file, column } => {
                assert_eq!(file, "PRICES-STOCK.csv");
                assert_eq!(column, "STOCK");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_prices_custom_delimiter() {
        let csv = "SKU;BRANCH;PRICE;STOCK\n1;MM;10;3\n";
        let source = CsvSource::new("prices", csv.as_bytes()).with_delimiter(b';');
        assert_eq!(prepare_prices_stock(source, &branches()).unwrap().len(), 1);
    }

    #[test]
    fn test_prices_rejects_non_numeric_stock() {
        let csv = "SKU|BRANCH|PRICE|STOCK\n1|MM|10|lots\n";
        let err = prepare_prices_stock(CsvSource::new("prices", csv.as_bytes()), &branches()).unwrap_err();
        assert!(matches!(err, EtlError::CsvError(_)));
    }

    #[test]
    fn test_product_cleanup() {
        let csv = "SKU|ITEM_NAME|ITEM_DESCRIPTION|CATEGORY|SUB_CATEGORY|SUB_SUB_CATEGORY|EAN\n\
                   10|Leche   Entera|<p>Leche entera <b>12UN</b></p>  |Lácteos|Leches|Entera|750100\n\
                   11|Pan|Pan blanco|Panadería||Blanco|\n";
        let products = prepare_products(CsvSource::new("products", csv.as_bytes())).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].item_name.as_deref(), Some("LecheEntera"));
        assert_eq!(products[0].item_description.as_deref(), Some("Leche entera 12UN"));
        assert_eq!(products[0].package, "12UN");
        assert_eq!(products[0].all_categories.as_deref(), Some("lácteos|leches|entera"));
        assert_eq!(products[0].ean.as_deref(), Some("750100"));

        assert_eq!(products[1].all_categories, None);
        assert_eq!(products[1].package, "");
        assert_eq!(products[1].ean, None);
    }

    #[test]
    fn test_blank_category_level_means_no_category() {
        let csv = "SKU|ITEM_NAME|ITEM_DESCRIPTION|CATEGORY|SUB_CATEGORY|SUB_SUB_CATEGORY\n\
                   12|Jugo|Jugo de naranja|  |Bebidas|Jugos\n\
                   13|Agua|Agua natural|Bebidas|Aguas|Natural\n";
        let products = prepare_products(CsvSource::new("products", csv.as_bytes())).unwrap();

        assert_eq!(products[0].all_categories, None);
        assert_eq!(products[1].all_categories.as_deref(), Some("bebidas|aguas|natural"));
    }

    #[test]
    fn test_products_missing_category_column() {
        let csv = "SKU|ITEM_NAME|ITEM_DESCRIPTION|CATEGORY|SUB_CATEGORY\n1|a|b|c|d\n";
        let err = prepare_products(CsvSource::new("products", csv.as_bytes())).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumnError { .. }));
    }

    #[test]
    fn test_extract_package_patterns() {
        assert_eq!(extract_package("Aceite botella 1000 ML").as_deref(), Some("1000 ML"));
        assert_eq!(extract_package("Detergente 3KG").as_deref(), Some("3KG"));
        assert_eq!(extract_package("Etapa 4 paquete 40UN").as_deref(), Some("40UN"));
        assert_eq!(extract_package("Papel aluminio 30M").as_deref(), Some("30M"));
        assert_eq!(extract_package("Queso 500GR").as_deref(), Some("500GR"));
        assert_eq!(extract_package("Sin medida"), None);
    }

    #[test]
    fn test_strip_html_keeps_text() {
        assert_eq!(strip_html("  <div>Galletas <i>surtidas</i></div> "), "Galletas surtidas");
        assert_eq!(strip_html("a < b and c > d"), "a  d");
    }
}
