//! # Seed Data Generator
//!
//! Populates the database with workshop parts and a few quotations for
//! development.
//!
//! ## Usage
//! ```bash
//! # Default database ./keystone_dev.db
//! cargo run -p keystone-db --bin seed
//!
//! # Specify database path
//! cargo run -p keystone-db --bin seed -- --db ./data/keystone.db
//! ```
//!
//! ## Generated Data
//! - One product per catalog entry below, with a bin in zones A-C.
//!   Every fifth part has no bin, every fourth sits at its reorder point.
//! - Three quotations: a draft, one that has been sent, and one accepted
//!   quotation that is ready to check and convert.

use chrono::{Duration, Utc};
use keystone_core::pricing::{Adjustment, PriceAdjustments, Shipping};
use keystone_core::{calculate_price, BinLocation, Customer, Money, Percent, Product, QuotationStatus};
use keystone_db::{Database, DbConfig, NewQuotation};
use rust_decimal::Decimal;
use std::env;
use uuid::Uuid;

/// (SKU, name, price in cents)
const CATALOG: &[(&str, &str, i64)] = &[
    ("BRK-PAD-01", "Brake pad set, front", 4_250),
    ("BRK-DSC-02", "Brake disc, vented", 6_899),
    ("OIL-FLT-01", "Oil filter", 899),
    ("OIL-5W30-5", "Engine oil 5W-30, 5L", 3_450),
    ("AIR-FLT-03", "Air filter element", 1_525),
    ("SPK-PLG-04", "Spark plug, iridium", 1_199),
    ("BAT-12V-70", "Battery 12V 70Ah", 11_900),
    ("WPR-BLD-60", "Wiper blade 600mm", 1_450),
    ("CLT-5L-G12", "Coolant G12, 5L", 2_275),
    ("BLT-SRP-01", "Serpentine belt", 2_980),
    ("HYD-HOS-08", "Hydraulic hose 8mm, per metre", 675),
    ("BRG-WHL-02", "Wheel bearing kit", 5_420),
];

const TAX_RATES: &[i64] = &[0, 500, 825, 1000];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./keystone_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                let Some(path) = args.get(i + 1) else {
                    return Err(format!("{} needs a <PATH> value", args[i]).into());
                };
                db_path = path.clone();
                i += 1;
            }
            "--help" | "-h" => {
                println!("Keystone Workshop Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./keystone_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Keystone Workshop Seed Data Generator");
    println!("=====================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut products = Vec::with_capacity(CATALOG.len());
    for (idx, (sku, name, cents)) in CATALOG.iter().enumerate() {
        let product = generate_product(idx, sku, name, *cents);
        match db.products().insert(&product).await {
            Ok(p) => products.push(p),
            Err(e) => eprintln!("Failed to insert {}: {}", sku, e),
        }
    }
    println!("✓ Inserted {} products", products.len());

    let valid_until = (Utc::now() + Duration::days(30)).date_naive();
    let customers = ["Harbour Garage", "Northside Fleet Services", "M. Okafor"];

    for (idx, customer) in customers.iter().enumerate() {
        let items: Vec<_> = products
            .iter()
            .skip(idx * 3)
            .take(3)
            .enumerate()
            .map(|(n, p)| p.line_item(n as i64 + 1))
            .collect();

        let adjustments = PriceAdjustments {
            discounts: vec![Adjustment::percentage("Trade discount", Percent::from_whole(5))],
            taxes: vec![],
            shipping: Shipping::flat(Money::from_major(15)),
        };
        let totals = calculate_price(&items, &adjustments)?;

        let quotation = db
            .quotations()
            .create(
                NewQuotation {
                    customer: Customer::named(*customer),
                    items,
                    totals,
                    valid_until,
                    notes: None,
                },
                "Q",
            )
            .await?;

        // Walk the later quotations forward so every stage is represented.
        let path: &[QuotationStatus] = match idx {
            0 => &[],
            1 => &[QuotationStatus::Sent],
            _ => &[QuotationStatus::Sent, QuotationStatus::Viewed, QuotationStatus::Accepted],
        };
        let mut current = QuotationStatus::Draft;
        for next in path {
            db.quotations()
                .update_status(&quotation.id, current, *next)
                .await?;
            current = *next;
        }

        println!(
            "✓ Quotation {} for {} ({}), total {}",
            quotation.quotation_number,
            customer,
            current,
            quotation.totals.grand_total
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one catalog product with deterministic stock and bin data.
fn generate_product(idx: usize, sku: &str, name: &str, cents: i64) -> Product {
    let now = Utc::now();
    let zones = ["A", "B", "C"];

    let location = if idx % 5 == 4 {
        None
    } else {
        Some(BinLocation::new(
            zones[idx % zones.len()],
            format!("{:02}", idx / 3 + 1),
            format!("{}", idx % 4 + 1),
            ["A", "B", "C", "D"][idx % 4],
        ))
    };

    let min_stock = 2 + (idx % 3) as i64;
    let current_stock = if idx % 4 == 3 {
        min_stock
    } else {
        10 + (idx * 7 % 40) as i64
    };

    Product {
        id: Uuid::new_v4().to_string(),
        sku: sku.to_string(),
        name: name.to_string(),
        unit_price: Money::from_cents(cents),
        tax_rate_percent: Percent::new(Decimal::new(TAX_RATES[idx % TAX_RATES.len()], 2)),
        current_stock,
        min_stock,
        location,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
