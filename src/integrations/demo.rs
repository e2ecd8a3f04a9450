//! Built-in product catalog
//!
//! Served for product searches when the commerce provider is gated off or a
//! live call fails. Orders are never faked; only products have a demo set.

use std::sync::LazyLock;

use super::models::{Product, ProductImage, ProductVariant};

static CATALOG: LazyLock<Vec<Product>> = LazyLock::new(build_catalog);

/// Read-only access to the demo catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoCatalog;

impl DemoCatalog {
    pub fn products(&self) -> &'static [Product] {
        &CATALOG
    }

    /// Products matching `query`, or the whole catalog when nothing matches
    pub fn search(&self, query: &str, limit: usize) -> Vec<Product> {
        let matched: Vec<Product> = CATALOG
            .iter()
            .filter(|p| p.matches_query(query))
            .take(limit)
            .cloned()
            .collect();

        if matched.is_empty() {
            CATALOG.iter().take(limit).cloned().collect()
        } else {
            matched
        }
    }
}

struct DemoItem {
    id: u64,
    title: &'static str,
    handle: &'static str,
    product_type: &'static str,
    vendor: &'static str,
    tags: &'static str,
    description: &'static str,
    /// (variant title, price, stock)
    variants: &'static [(&'static str, &'static str, i64)],
}

const ITEMS: &[DemoItem] = &[
    DemoItem {
        id: 9_001,
        title: "Aurora Wireless Headphones",
        handle: "aurora-wireless-headphones",
        product_type: "Headphones",
        vendor: "Aurora Audio",
        tags: "wireless, bluetooth, noise-cancelling, over-ear",
        description: "Over-ear headphones with active noise cancelling and 30-hour battery.",
        variants: &[("Midnight Black", "199.00", 24), ("Arctic White", "199.00", 8)],
    },
    DemoItem {
        id: 9_002,
        title: "Pulse Sport Earbuds",
        handle: "pulse-sport-earbuds",
        product_type: "Earbuds",
        vendor: "Pulse",
        tags: "wireless, bluetooth, earbud, sport, earphone",
        description: "Sweat-resistant true wireless earbuds with secure-fit wings.",
        variants: &[("Graphite", "89.00", 40), ("Coral", "89.00", 0)],
    },
    DemoItem {
        id: 9_003,
        title: "Boombox Mini Bluetooth Speaker",
        handle: "boombox-mini-speaker",
        product_type: "Speakers",
        vendor: "Boombox",
        tags: "bluetooth, wireless, speaker, portable, waterproof",
        description: "Pocket-sized waterproof speaker with 12 hours of playback.",
        variants: &[("Blue", "59.00", 15), ("Red", "59.00", 12)],
    },
    DemoItem {
        id: 9_004,
        title: "Studio Reference Headphones",
        handle: "studio-reference-headphones",
        product_type: "Headphones",
        vendor: "Aurora Audio",
        tags: "wired, studio, over-ear",
        description: "Closed-back wired headphones tuned for mixing and monitoring.",
        variants: &[("Standard", "149.00", 6)],
    },
    DemoItem {
        id: 9_005,
        title: "Roomfill Smart Speaker",
        handle: "roomfill-smart-speaker",
        product_type: "Speakers",
        vendor: "Boombox",
        tags: "wireless, wifi, bluetooth, speaker, home",
        description: "Room-filling smart speaker with multi-room pairing.",
        variants: &[("Charcoal", "249.00", 5)],
    },
    DemoItem {
        id: 9_006,
        title: "Braided USB-C Charging Cable",
        handle: "braided-usb-c-cable",
        product_type: "Accessories",
        vendor: "Pulse",
        tags: "cable, usb-c, charging, accessory",
        description: "Two-metre braided USB-C cable for headphones, earbuds and speakers.",
        variants: &[("1 m", "12.00", 120), ("2 m", "15.00", 80)],
    },
];

fn build_catalog() -> Vec<Product> {
    ITEMS
        .iter()
        .map(|item| Product {
            id: item.id,
            title: item.title.to_string(),
            body_html: Some(format!("<p>{}</p>", item.description)),
            vendor: Some(item.vendor.to_string()),
            product_type: Some(item.product_type.to_string()),
            tags: item.tags.to_string(),
            handle: item.handle.to_string(),
            images: vec![ProductImage {
                src: format!("https://cdn.example.com/demo/{}.jpg", item.handle),
                alt: Some(item.title.to_string()),
            }],
            variants: item
                .variants
                .iter()
                .enumerate()
                .map(|(i, (title, price, stock))| ProductVariant {
                    id: item.id * 100 + i as u64 + 1,
                    title: title.to_string(),
                    price: price.to_string(),
                    sku: Some(format!("DEMO-{}-{}", item.id, i + 1)),
                    inventory_quantity: Some(*stock),
                })
                .collect(),
            url: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_complete() {
        let products = DemoCatalog.products();
        assert_eq!(products.len(), 6);
        assert!(products.iter().all(|p| !p.variants.is_empty()));
        assert!(products.iter().all(|p| !p.images.is_empty()));
    }

    #[test]
    fn test_search_filters_by_query() {
        let results = DemoCatalog.search("headphones", 10);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|p| p.title.contains("Headphones")));
    }

    #[test]
    fn test_search_speaker() {
        let results = DemoCatalog.search("speaker", 10);
        assert!(results.iter().all(|p| p.tag_list().contains(&"speaker".to_string())));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_unmatched_query_returns_full_catalog() {
        let results = DemoCatalog.search("general", 10);
        assert_eq!(results.len(), 6);
    }

    #[test]
    fn test_search_respects_limit() {
        assert_eq!(DemoCatalog.search("wireless", 2).len(), 2);
    }

    #[test]
    fn test_out_of_stock_variant() {
        let earbuds = &DemoCatalog.products()[1];
        assert!(earbuds.variants[0].available());
        assert!(!earbuds.variants[1].available());
    }
}
