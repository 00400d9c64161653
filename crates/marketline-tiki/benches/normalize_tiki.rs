use marketline_core::RawProduct;
use marketline_tiki::normalize;
use serde_json::{Value, json};

fn synthetic_product(i: usize, variants: usize) -> RawProduct {
    let options: Vec<Value> = (0..variants)
        .map(|v| {
            json!({
                "id": i * 100 + v,
                "sku": format!("SKU{i}-{v}"),
                "option1": format!("Size {v}"),
                "price": 199000 + v * 1000,
                "selected": v == 0
            })
        })
        .collect();
    RawProduct {
        hint: json!({
            "id": i,
            "sku": format!("SKU{i}"),
            "name": format!("Product {i}"),
            "url_key": format!("product-{i}"),
            "url_path": format!("product-{i}.html"),
            "price": 199000,
            "list_price": 249000
        }),
        detail: json!({
            "id": i,
            "rating_average": 4.7,
            "brand": {"name": "Brand"},
            "configurable_products": options
        }),
        variants: vec![],
    }
}

#[divan::bench(args = [0, 4, 16])]
fn normalize_tiki_product(bencher: divan::Bencher, variants: usize) {
    let products: Vec<RawProduct> = (0..1000).map(|i| synthetic_product(i, variants)).collect();
    bencher.bench(|| {
        for product in &products {
            let _ = normalize(product).unwrap();
        }
    });
}

fn main() {
    divan::main();
}
