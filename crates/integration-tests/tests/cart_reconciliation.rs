//! Integration tests for cart sanitizing and merging.
//!
//! Carts enter here as raw JSON, the way they come back from device storage
//! and from profile documents.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::HashSet;

use serde_json::{Value, json};
use vogue_core::{Cart, LineItem, merge, sanitize};
use vogue_integration_tests::line;

/// A messy stored cart: valid records mixed with every kind of bad one.
fn messy_cart() -> Value {
    json!([
        {"id": 1, "name": "Cashmere Sweater", "price": 890, "selectedSize": "m", "selectedColor": "black", "quantity": 2},
        "not a record",
        {"id": 9, "name": "RK Test Product", "price": 10},
        {"id": 2, "name": "Mohair Scarf", "price": "425.00", "quantity": 1},
        {"id": 3, "name": "Silk Blouse", "price": -5},
        {"id": 4, "name": "Wool Coat", "price": "free"},
        {"id": null, "name": "Orphan", "price": 10},
        {"name": "No Id", "price": 10},
        {"id": 5, "name": "", "price": 10},
        {"id": "doc-6", "name": "Leather Belt", "price": 120.5, "quantity": 3, "giftWrap": true},
        null,
        42
    ])
}

// =============================================================================
// Sanitizer
// =============================================================================

#[test]
fn test_sanitize_is_idempotent() {
    let inputs = [
        messy_cart(),
        json!([]),
        json!(null),
        json!({"id": 1, "name": "Not a list", "price": 1}),
        json!([{"id": 1, "name": "Only", "price": "0"}]),
    ];

    for input in inputs {
        let once = sanitize(&input);
        let twice = sanitize(&Cart::from_items(once.clone()).to_json());
        assert_eq!(once, twice, "sanitize must be idempotent for {input}");
    }
}

#[test]
fn test_invalid_prices_never_survive_at_any_position() {
    let bad_prices = [json!(-1), json!("-0.01"), json!("abc"), json!(""), json!(null), json!([])];
    let good = json!({"id": 1, "name": "Coat", "price": 10});

    for bad in &bad_prices {
        for position in 0..3 {
            let mut items = vec![good.clone(), good.clone()];
            items.insert(position, json!({"id": 99, "name": "Bad", "price": bad}));

            let kept = sanitize(&Value::Array(items));
            assert_eq!(kept.len(), 2, "price {bad} at {position}");
            assert!(kept.iter().all(|item| item.name == "Coat"));
        }
    }
}

#[test]
fn test_sanitize_keeps_valid_records_in_order() {
    let kept = sanitize(&messy_cart());
    let names: Vec<&str> = kept.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, ["Cashmere Sweater", "Mohair Scarf", "Leather Belt"]);

    // Unknown fields survive a round trip through the cart
    let stored = Cart::from_items(kept).to_json();
    assert_eq!(stored[2]["giftWrap"], json!(true));
}

#[test]
fn test_ghost_item_removed() {
    let kept = sanitize(&json!([{"name": "RK Test Product", "price": 10, "id": 9}]));
    assert!(kept.is_empty());
}

#[test]
fn test_loosely_typed_records_are_kept() {
    let kept = sanitize(&json!([
        {"id": 1.5, "name": "Float Id", "price": 10},
        {"id": false, "name": "Flag Id", "price": 10},
        {"id": 3, "name": "Odd Image", "price": 10, "image": 7},
        {"id": 4, "name": "Odd Size", "price": 10, "selectedSize": 42, "selectedColor": "red"},
        {"id": 5, "name": "Suffixed Price", "price": "12abc"},
        {"id": {"sku": 6}, "name": "Object Id", "price": 10}
    ]));

    let names: Vec<&str> = kept.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(
        names,
        ["Float Id", "Flag Id", "Odd Image", "Odd Size", "Suffixed Price"]
    );
    assert_eq!(kept[3].selected_size, None);
    assert_eq!(kept[3].selected_color.as_deref(), Some("red"));
    assert_eq!(kept[4].price, "12".parse().unwrap());

    // Still idempotent once the odd fields have been normalized away
    let again = sanitize(&Cart::from_items(kept.clone()).to_json());
    assert_eq!(again, kept);
}

// =============================================================================
// Merger
// =============================================================================

/// Deterministic spread of carts over a small variant space, so keys collide
/// often.
fn generated_carts() -> Vec<Vec<LineItem>> {
    let sizes = ["s", "m"];
    let colors = ["black", "camel"];
    (0..12u32)
        .map(|seed| {
            (0..seed % 5)
                .map(|n| {
                    let k = (seed + n * 3) as usize;
                    line(
                        i64::from((seed + n) % 3),
                        sizes[k % 2],
                        colors[(k / 2) % 2],
                        (seed * 7 + n) % 4 + 1,
                    )
                })
                .collect()
        })
        .collect()
}

#[test]
fn test_merge_has_unique_keys() {
    let carts = generated_carts();
    for cloud in &carts {
        for local in &carts {
            let merged = merge(cloud, local);
            let keys: HashSet<_> = merged.iter().map(LineItem::key).collect();
            assert_eq!(keys.len(), merged.len());
        }
    }
}

#[test]
fn test_merge_takes_max_quantity_for_shared_keys() {
    let carts = generated_carts();
    for cloud in &carts {
        for local in &carts {
            let merged = merge(cloud, local);
            for item in &merged {
                let max_of = |side: &[LineItem]| {
                    side.iter()
                        .filter(|other| other.key() == item.key())
                        .map(|other| other.quantity)
                        .max()
                        .unwrap_or(0)
                };
                assert_eq!(item.quantity, max_of(cloud).max(max_of(local)));
            }
        }
    }
}

#[test]
fn test_merge_with_empty_sides() {
    assert!(merge(&[], &[]).is_empty());

    for cart in generated_carts() {
        let deduped = Cart::from_items(cart.clone()).into_items();
        assert_eq!(merge(&deduped, &[]), deduped);
        assert_eq!(merge(&[], &deduped), deduped);
    }
}

#[test]
fn test_merge_same_variant_from_two_devices() {
    let local = sanitize(&json!([
        {"id": 1, "name": "Sweater", "price": 890, "selectedSize": "m", "selectedColor": "black", "quantity": 2}
    ]));
    let cloud = sanitize(&json!([
        {"id": 1, "name": "Sweater", "price": 890, "selectedSize": "m", "selectedColor": "black", "quantity": 5}
    ]));

    let merged = merge(&cloud, &local);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].quantity, 5);
    assert_eq!(merged[0].selected_size.as_deref(), Some("m"));
    assert_eq!(merged[0].selected_color.as_deref(), Some("black"));
}

#[test]
fn test_merge_treats_numeric_and_string_ids_alike() {
    let cloud = sanitize(&json!([{"id": "7", "name": "Scarf", "price": 425, "quantity": 1}]));
    let local = sanitize(&json!([{"id": 7, "name": "Scarf", "price": 425, "quantity": 3}]));

    let merged = merge(&cloud, &local);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].quantity, 3);
}
