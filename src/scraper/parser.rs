//! Product card parsing
//!
//! Marketplaces return the same kind of information under different field
//! names. A [`ProductLayout`] names where each field lives as JSON pointers,
//! and one [`ProductParser`] turns any card following that layout into
//! [`ProductVariant`] values. No I/O happens here.

use crate::product::{round_price, Marketplace, ProductVariant};
use crate::scraper::ScrapeError;
use serde_json::Value;

/// Where each product field lives in a marketplace's card JSON
///
/// Paths under `products` are relative to one product entry; paths under
/// `sizes` are relative to one size entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductLayout {
    pub products: &'static str,
    pub id: &'static str,
    pub name: &'static str,
    pub brand: &'static str,
    pub brand_id: &'static str,
    pub pics: &'static str,
    pub sizes: &'static str,
    pub size_name: &'static str,
    /// Fallback used when `size_name` is missing or blank
    pub size_alt_name: &'static str,
    /// Block whose absence means the size has no offer
    pub price_block: &'static str,
    pub price_basic: &'static str,
    pub price: &'static str,
    pub stocks: &'static str,
    pub stock_quantity: &'static str,
    /// Minor currency units per major unit
    pub price_divisor: f64,
}

/// Card layout of the Wildberries `cards/v4/detail` endpoint
pub const WILDBERRIES_LAYOUT: ProductLayout = ProductLayout {
    products: "/products",
    id: "/id",
    name: "/name",
    brand: "/brand",
    brand_id: "/brandId",
    pics: "/pics",
    sizes: "/sizes",
    size_name: "/name",
    size_alt_name: "/origName",
    price_block: "/price",
    price_basic: "/price/basic",
    price: "/price/product",
    stocks: "/stocks",
    stock_quantity: "/qty",
    price_divisor: 100.0,
};

/// Turns raw card JSON into product variants
#[derive(Debug, Clone, Copy)]
pub struct ProductParser {
    marketplace: Marketplace,
    layout: ProductLayout,
}

impl ProductParser {
    pub fn new(marketplace: Marketplace, layout: ProductLayout) -> Self {
        Self {
            marketplace,
            layout,
        }
    }

    /// Parses the card for `article` into one variant per size
    ///
    /// The product entry whose id equals `article` is used; when none
    /// matches, the first entry is. Image URLs are left empty for the caller
    /// to fill in.
    ///
    /// # Errors
    ///
    /// * `ScrapeError::MalformedResponse` - No products list, an empty list,
    ///   a product without an id, or a product without a sizes list
    pub fn parse(&self, article: u64, data: &Value) -> Result<Vec<ProductVariant>, ScrapeError> {
        let layout = &self.layout;

        let products = data
            .pointer(layout.products)
            .and_then(Value::as_array)
            .ok_or_else(|| self.malformed(article, "missing products list"))?;

        let product = products
            .iter()
            .find(|p| p.pointer(layout.id).and_then(Value::as_u64) == Some(article))
            .or_else(|| products.first())
            .ok_or_else(|| self.malformed(article, "empty products list"))?;

        let internal_id = product
            .pointer(layout.id)
            .and_then(Value::as_u64)
            .ok_or_else(|| self.malformed(article, "product has no id"))?;

        let sizes = product
            .pointer(layout.sizes)
            .and_then(Value::as_array)
            .ok_or_else(|| self.malformed(article, "product has no sizes list"))?;

        let name = text_at(product, layout.name);
        let brand = text_at(product, layout.brand);
        let brand_id = product.pointer(layout.brand_id).and_then(Value::as_u64);
        let pics = count_at(product, layout.pics);

        let variants = sizes
            .iter()
            .enumerate()
            .map(|(index, size)| {
                let (price_basic, price, quantity) = self.offer(size);
                ProductVariant {
                    marketplace: self.marketplace,
                    internal_id,
                    name: name.clone(),
                    brand: brand.clone(),
                    brand_id,
                    price_basic,
                    price,
                    size: self.size_name(index, size),
                    quantity,
                    image_url: String::new(),
                    pics,
                }
            })
            .collect();

        Ok(variants)
    }

    /// Prices and stock of one size; all zero when the size has no offer
    fn offer(&self, size: &Value) -> (f64, f64, u32) {
        let layout = &self.layout;
        if size.pointer(layout.price_block).map_or(true, Value::is_null) {
            return (0.0, 0.0, 0);
        }

        let price_basic = self.money_at(size, layout.price_basic);
        let price = self.money_at(size, layout.price);
        let quantity = size
            .pointer(layout.stocks)
            .and_then(Value::as_array)
            .map(|stocks| {
                stocks
                    .iter()
                    .map(|stock| u64::from(count_at(stock, layout.stock_quantity)))
                    .sum::<u64>()
            })
            .unwrap_or(0);

        (
            price_basic,
            price,
            u32::try_from(quantity).unwrap_or(u32::MAX),
        )
    }

    /// Name of the size at `index`; unnamed sizes are keyed by position
    fn size_name(&self, index: usize, size: &Value) -> String {
        [self.layout.size_name, self.layout.size_alt_name]
            .into_iter()
            .map(|path| text_at(size, path))
            .find(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("#{}", index + 1))
    }

    fn money_at(&self, value: &Value, path: &str) -> f64 {
        let minor = value.pointer(path).and_then(Value::as_f64).unwrap_or(0.0);
        if minor.is_finite() && minor > 0.0 {
            round_price(minor / self.layout.price_divisor)
        } else {
            0.0
        }
    }

    fn malformed(&self, article: u64, message: &str) -> ScrapeError {
        ScrapeError::MalformedResponse {
            marketplace: self.marketplace,
            article,
            message: message.to_string(),
        }
    }
}

fn text_at(value: &Value, path: &str) -> String {
    match value.pointer(path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn count_at(value: &Value, path: &str) -> u32 {
    value
        .pointer(path)
        .and_then(Value::as_u64)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}
