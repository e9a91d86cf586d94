//! View Model Normalizer
//! REST / GraphQL の生レスポンスを PricedItem に変換

use crate::error::NormalizationError;
use crate::models::{
    BulkTier, GraphqlBulkPrice, GraphqlItem, GraphqlPromoPrice, ItemDetails, PricedItem, Promotion, RawId,
    RawItem, RestBulkPrice, RestItem, RestPayload, RestPromoPrice,
};

/// Map either backend shape to the canonical [`PricedItem`].
///
/// # Errors
///
/// [`NormalizationError::MissingField`] when the item id or code is absent.
pub fn normalize(raw: RawItem) -> Result<PricedItem, NormalizationError> {
    match raw {
        RawItem::Rest(payload) => normalize_rest(payload),
        RawItem::Graphql(item) => normalize_graphql(item),
    }
}

pub fn normalize_rest(payload: RestPayload) -> Result<PricedItem, NormalizationError> {
    let (item, bulk, promo) = match payload {
        RestPayload::Wrapped(plu) => (plu.item, plu.harga_grosir, plu.harga_promo),
        RestPayload::Flat(item) => (item, Vec::new(), Vec::new()),
    };

    let RestItem {
        id_item,
        kode,
        nama,
        singkatan,
        barcode,
        kode_pabrik,
        jumlah_dos,
        satuan,
        harga_normal,
        harga_jual,
    } = item;

    Ok(PricedItem {
        id: required_id(id_item)?,
        code: required_text(kode, "code")?,
        barcode: barcode.unwrap_or_default(),
        name: nama.unwrap_or_default(),
        details: ItemDetails {
            abbreviation: singkatan.unwrap_or_default(),
            manufacturer_code: kode_pabrik.unwrap_or_default(),
            unit: satuan.unwrap_or_default(),
            units_per_carton: jumlah_dos.unwrap_or_default(),
        },
        normal_price: harga_normal,
        discounted_price: harga_jual,
        bulk_tiers: bulk.into_iter().map(rest_bulk_tier).collect(),
        promotions: promo.into_iter().map(rest_promotion).collect(),
    })
}

pub fn normalize_graphql(item: GraphqlItem) -> Result<PricedItem, NormalizationError> {
    Ok(PricedItem {
        id: required_id(item.id)?,
        code: required_text(item.code, "code")?,
        barcode: item.barcode.unwrap_or_default(),
        name: item.name.unwrap_or_default(),
        details: ItemDetails::default(),
        normal_price: item.normal_price,
        discounted_price: item.discounted_price,
        bulk_tiers: item.bulk_prices.into_iter().map(graphql_bulk_tier).collect(),
        promotions: item.promo_prices.into_iter().map(graphql_promotion).collect(),
    })
}

fn required_id(id: Option<RawId>) -> Result<String, NormalizationError> {
    id.and_then(RawId::into_string)
        .ok_or(NormalizationError::MissingField("id"))
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, NormalizationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(NormalizationError::MissingField(field))
}

/// Row ids are display keys only; an unusable one becomes empty.
fn row_id(id: RawId) -> String {
    id.into_string().unwrap_or_default()
}

fn rest_bulk_tier(row: RestBulkPrice) -> BulkTier {
    BulkTier {
        id: row_id(row.id),
        quantity: row.jumlah,
        unit_price: row.harga,
        per_carton: row.is_dos.as_deref() == Some("Ya"),
    }
}

fn rest_promotion(row: RestPromoPrice) -> Promotion {
    Promotion {
        id: row_id(row.id),
        code: row.kode.unwrap_or_default(),
        name: row.nama.unwrap_or_default(),
        starts_at: row.tanggal_awal,
        ends_at: row.tanggal_akhir,
        discount_percent: row.diskon_persen.unwrap_or_default(),
        discount_amount: row.diskon.unwrap_or_default(),
        unit_price: row.harga_jual.unwrap_or_default(),
    }
}

fn graphql_bulk_tier(row: GraphqlBulkPrice) -> BulkTier {
    BulkTier {
        id: row_id(row.id),
        quantity: row.quantity,
        unit_price: row.unit_price,
        per_carton: false,
    }
}

fn graphql_promotion(row: GraphqlPromoPrice) -> Promotion {
    Promotion {
        id: row_id(row.id),
        code: row.promo_code.unwrap_or_default(),
        name: row.promo_name.unwrap_or_default(),
        starts_at: row.start,
        ends_at: row.end,
        discount_percent: row.discount_percent.unwrap_or_default(),
        discount_amount: row.discount.unwrap_or_default(),
        unit_price: row.unit_price.unwrap_or_default(),
    }
}
