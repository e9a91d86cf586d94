//! Data Models
//! PricedItem（正規化済みビューモデル）とバックエンドの生レスポンス型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ========================================
// PricedItem (canonical view model)
// ========================================

/// Canonical pricing view of one product, built only by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedItem {
    pub id: String,
    pub code: String,
    pub barcode: String,
    pub name: String,
    pub details: ItemDetails,
    pub normal_price: f64,
    pub discounted_price: f64,
    pub bulk_tiers: Vec<BulkTier>,
    pub promotions: Vec<Promotion>,
}

/// Secondary item attributes only the REST backend reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetails {
    pub abbreviation: String,
    pub manufacturer_code: String,
    pub unit: String,
    pub units_per_carton: f64,
}

/// Buy at least `quantity` units, pay `unit_price` each.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTier {
    pub id: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub per_carton: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    pub code: String,
    pub name: String,
    pub starts_at: Option<NaiveDate>,
    pub ends_at: Option<NaiveDate>,
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub unit_price: f64,
}

impl PricedItem {
    pub fn has_discount(&self) -> bool {
        self.discounted_price < self.normal_price
    }

    pub fn has_bulk_pricing(&self) -> bool {
        !self.bulk_tiers.is_empty()
    }

    /// Unit price paid when buying `quantity` units: the tier with the
    /// largest quantity not above `quantity`, else the discounted price.
    pub fn unit_price_for(&self, quantity: f64) -> f64 {
        self.bulk_tiers
            .iter()
            .filter(|tier| tier.quantity <= quantity)
            .max_by(|a, b| a.quantity.total_cmp(&b.quantity))
            .map_or(self.discounted_price, |tier| tier.unit_price)
    }

    /// Promotions whose date window contains `day`.
    pub fn active_promotions(&self, day: NaiveDate) -> impl Iterator<Item = &Promotion> {
        self.promotions.iter().filter(move |p| p.is_active_on(day))
    }
}

impl Promotion {
    /// A missing bound is treated as open.
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.starts_at.map_or(true, |start| start <= day) && self.ends_at.map_or(true, |end| day <= end)
    }
}

// ========================================
// Raw backend payloads
// ========================================

/// Payload as returned by either data source, before normalization.
#[derive(Debug, Clone)]
pub enum RawItem {
    Rest(RestPayload),
    Graphql(GraphqlItem),
}

/// Item id as sent by the backends: a number over REST, a string over GraphQL.
/// Whole-valued floats (`7.0`) are read as integers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireId")]
pub enum RawId {
    Int(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl TryFrom<WireId> for RawId {
    type Error = String;

    fn try_from(wire: WireId) -> Result<Self, Self::Error> {
        match wire {
            WireId::Int(n) => Ok(RawId::Int(n)),
            WireId::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(RawId::Int(f as i64)),
            WireId::Float(f) => Err(format!("id must be a whole number, got {f}")),
            WireId::Text(s) => Ok(RawId::Text(s)),
        }
    }
}

impl RawId {
    /// Blank string ids count as absent.
    pub fn into_string(self) -> Option<String> {
        match self {
            RawId::Int(n) => Some(n.to_string()),
            RawId::Text(s) if s.trim().is_empty() => None,
            RawId::Text(s) => Some(s),
        }
    }
}

// ----------------------------------------
// REST: GET /item?code=...
// ----------------------------------------

/// `/item` answers either with the bare item or with the item wrapped
/// together with its bulk and promo price rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RestPayload {
    Wrapped(RestPlu),
    Flat(RestItem),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestPlu {
    pub item: RestItem,
    #[serde(default)]
    pub harga_grosir: Vec<RestBulkPrice>,
    #[serde(default)]
    pub harga_promo: Vec<RestPromoPrice>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestItem {
    #[serde(rename = "IDItem", default)]
    pub id_item: Option<RawId>,
    #[serde(default)]
    pub kode: Option<String>,
    #[serde(default)]
    pub nama: Option<String>,
    #[serde(default)]
    pub singkatan: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub kode_pabrik: Option<String>,
    #[serde(default)]
    pub jumlah_dos: Option<f64>,
    #[serde(default)]
    pub satuan: Option<String>,
    pub harga_normal: f64,
    pub harga_jual: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestBulkPrice {
    #[serde(rename = "IDItemHargaGrosir")]
    pub id: RawId,
    #[serde(default)]
    pub jumlah: f64,
    #[serde(default)]
    pub harga: f64,
    /// "Ya" when the tier is counted in cartons.
    #[serde(default)]
    pub is_dos: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestPromoPrice {
    #[serde(rename = "IDItemHargaD")]
    pub id: RawId,
    #[serde(default)]
    pub kode: Option<String>,
    #[serde(default)]
    pub nama: Option<String>,
    #[serde(default)]
    pub tanggal_awal: Option<NaiveDate>,
    #[serde(default)]
    pub tanggal_akhir: Option<NaiveDate>,
    #[serde(default)]
    pub harga_jual: Option<f64>,
    #[serde(default)]
    pub diskon_persen: Option<f64>,
    #[serde(default)]
    pub diskon: Option<f64>,
}

// ----------------------------------------
// GraphQL: query plu(barcode: String!)
// ----------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlItem {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub normal_price: f64,
    pub discounted_price: f64,
    #[serde(default)]
    pub bulk_prices: Vec<GraphqlBulkPrice>,
    #[serde(default)]
    pub promo_prices: Vec<GraphqlPromoPrice>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlBulkPrice {
    pub id: RawId,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlPromoPrice {
    pub id: RawId,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub promo_name: Option<String>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub discount_percent: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
}
