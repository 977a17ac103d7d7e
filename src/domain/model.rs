use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the price/stock export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PriceStockRow {
    pub sku: String,
    pub branch: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub stock: Option<f64>,
}

/// One row of the product catalog export, as delivered.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ProductRow {
    pub sku: String,
    #[serde(default)]
    pub buy_unit: Option<String>,
    #[serde(default)]
    pub description_status: Option<String>,
    #[serde(default)]
    pub organic_item: Option<String>,
    #[serde(default)]
    pub kirland_item: Option<String>,
    #[serde(default)]
    pub fineline_number: Option<String>,
    #[serde(default)]
    pub ean: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub item_description: Option<String>,
    #[serde(default)]
    pub item_img: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub sub_sub_category: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
}

/// A catalog row after category merge, text cleanup and column pruning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Product {
    pub sku: String,
    pub buy_unit: Option<String>,
    pub fineline_number: Option<String>,
    pub ean: Option<String>,
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub item_img: Option<String>,
    pub brand_name: Option<String>,
    pub all_categories: Option<String>,
    pub package: String,
}

/// Price/stock columns followed by the product columns of the left join.
/// Product columns stay empty when the SKU has no catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MergedRecord {
    pub sku: String,
    pub branch: String,
    pub price: Option<f64>,
    pub stock: Option<f64>,
    pub buy_unit: Option<String>,
    pub fineline_number: Option<String>,
    pub ean: Option<String>,
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub item_img: Option<String>,
    pub brand_name: Option<String>,
    pub all_categories: Option<String>,
    pub package: Option<String>,
}

impl MergedRecord {
    pub fn new(row: &PriceStockRow, product: Option<&Product>) -> Self {
        let mut merged = Self {
            sku: row.sku.clone(),
            branch: row.branch.clone(),
            price: row.price,
            stock: row.stock,
            ..Default::default()
        };

        if let Some(product) = product {
            merged.buy_unit = product.buy_unit.clone();
            merged.fineline_number = product.fineline_number.clone();
            merged.ean = product.ean.clone();
            merged.item_name = product.item_name.clone();
            merged.item_description = product.item_description.clone();
            merged.item_img = product.item_img.clone();
            merged.brand_name = product.brand_name.clone();
            merged.all_categories = product.all_categories.clone();
            merged.package = Some(product.package.clone());
        }

        merged
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedData {
    pub prices: Vec<PriceStockRow>,
    pub products: Vec<Product>,
}

/// Records of one branch partition, already cut down to the upload selection.
#[derive(Debug, Clone)]
pub struct BranchBatch {
    pub label: String,
    pub partition_size: usize,
    pub records: Vec<MergedRecord>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub merged_count: usize,
    pub batches: Vec<BranchBatch>,
    pub snapshot_csv: String,
}

impl TransformResult {
    pub fn selected_count(&self) -> usize {
        self.batches.iter().map(|b| b.records.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchProduct {
    pub branch: String,
    pub stock: serde_json::Value,
    pub price: f64,
}

/// Body of `POST /api/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    pub merchant_id: String,
    pub sku: String,
    pub barcodes: Vec<String>,
    pub brand: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub package: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub url: String,
    pub branch_products: Vec<BranchProduct>,
}

impl ProductPayload {
    /// Returns `None` for a record without a price, which is never uploaded.
    pub fn from_record(merchant_id: &str, record: &MergedRecord) -> Option<Self> {
        let price = record.price.filter(|p| !p.is_nan())?;

        Some(Self {
            merchant_id: merchant_id.to_string(),
            sku: record.sku.clone(),
            barcodes: record.ean.iter().cloned().collect(),
            brand: record.brand_name.clone(),
            name: record.item_name.clone(),
            description: record.item_description.clone(),
            package: record.package.clone(),
            image_url: record.item_img.clone(),
            category: record.all_categories.clone(),
            url: String::new(),
            branch_products: vec![BranchProduct {
                branch: record.branch.clone(),
                stock: record.stock.map(number_value).unwrap_or(serde_json::Value::Null),
                price,
            }],
        })
    }
}

/// Whole quantities go out as JSON integers, anything else as a float.
fn number_value(value: f64) -> serde_json::Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serde_json::Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Body of `PUT /api/merchants/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantUpdate {
    pub id: String,
    pub name: String,
    pub can_be_deleted: bool,
    pub can_be_updated: bool,
    pub is_active: bool,
}

/// One entry of `GET /api/merchants`. Fields the lookup cannot use come out
/// as `None` instead of failing the whole list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Merchant {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchantList {
    #[serde(default)]
    pub merchants: Vec<Merchant>,
}

impl MerchantList {
    /// Id of the first well-formed entry called `name`.
    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.merchants
            .iter()
            .filter(|merchant| merchant.name.as_deref() == Some(name))
            .find_map(|merchant| merchant.id.as_deref())
    }
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_name<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Status and decoded body of a remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductFailure {
    pub error_id: usize,
    pub status: u16,
    pub payload: ProductPayload,
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub merchant_id: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<ProductFailure>,
    pub generated_at: DateTime<Utc>,
}
