//! # Seed Data Generator
//!
//! Gives an existing account a demo store with a small cafe catalog.
//!
//! ## Usage
//! ```bash
//! # Register first (POST /api/users/register), then:
//! cargo run -p tally-db --bin seed -- --owner ada@example.com
//!
//! # Specify database path and store name
//! cargo run -p tally-db --bin seed -- --owner ada@example.com --db ./data/tally.db --store "Pier Cafe"
//! ```
//!
//! ## Generated Catalog
//! - Categories: Coffee, Bakery, Cold Drinks
//! - Each coffee has a Size group (Small / Medium / Large) and a Milk group
//! - Some products carry a percentage or a fixed discount

use clap::Parser;
use rust_decimal::Decimal;
use tally_core::{
    Discount, ModifierGroup, ModifierOption, Money, NewCategory, NewProduct, NewStore,
};
use tally_db::{Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Tally POS demo data generator")]
struct Args {
    /// Email of the account that will own the demo store
    #[arg(short, long)]
    owner: String,

    /// Database file path
    #[arg(short, long, default_value = "./tally.db", env = "TALLY_DB_PATH")]
    db: String,

    /// Name of the demo store
    #[arg(short, long, default_value = "Demo Cafe")]
    store: String,
}

/// (category, [(product, price in cents, has coffee modifiers, discount)])
const CATALOG: &[(&str, &[(&str, i64, bool, Option<SeedDiscount>)])] = &[
    (
        "Coffee",
        &[
            ("Espresso", 250, true, None),
            ("Americano", 300, true, None),
            ("Latte", 450, true, Some(SeedDiscount::Percent("Happy Hour", 10))),
            ("Cappuccino", 425, true, Some(SeedDiscount::Percent("Happy Hour", 10))),
            ("Flat White", 400, true, None),
        ],
    ),
    (
        "Bakery",
        &[
            ("Croissant", 325, false, Some(SeedDiscount::Cents("Day Old", 100))),
            ("Blueberry Muffin", 350, false, Some(SeedDiscount::Cents("Day Old", 100))),
            ("Cinnamon Roll", 400, false, None),
        ],
    ),
    (
        "Cold Drinks",
        &[
            ("Lemonade", 300, false, None),
            ("Iced Tea", 275, false, Some(SeedDiscount::Percent("Staff", 25))),
            ("Sparkling Water", 200, false, None),
        ],
    ),
];

#[derive(Debug, Clone, Copy)]
enum SeedDiscount {
    Percent(&'static str, i64),
    Cents(&'static str, i64),
}

impl SeedDiscount {
    fn to_discount(self) -> Discount {
        match self {
            SeedDiscount::Percent(name, pct) => Discount::percentage(name, Decimal::from(pct)),
            SeedDiscount::Cents(name, cents) => Discount::fixed(name, Money::from_cents(cents)),
        }
    }
}

fn coffee_modifiers() -> Vec<ModifierGroup> {
    vec![
        ModifierGroup {
            name: "Size".to_string(),
            options: vec![
                ModifierOption::new("Small", Money::zero()),
                ModifierOption::new("Medium", Money::from_cents(50)),
                ModifierOption::new("Large", Money::from_cents(100)),
            ],
        },
        ModifierGroup {
            name: "Milk".to_string(),
            options: vec![
                ModifierOption::new("Whole", Money::zero()),
                ModifierOption::new("Oat", Money::from_cents(60)),
                ModifierOption::new("Almond", Money::from_cents(60)),
            ],
        },
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args = Args::parse();
    info!(db = %args.db, owner = %args.owner, "Seeding demo data");

    let db = Database::new(DbConfig::new(&args.db)).await?;

    let Some(owner) = db.users().find_by_email(&args.owner).await? else {
        return Err(format!("no account registered for {}", args.owner).into());
    };

    let store = db
        .stores()
        .create(
            &owner.user.id,
            &NewStore {
                name: args.store.clone(),
                address: "1 Harbour Road".to_string(),
                phone: "555-0100".to_string(),
            },
        )
        .await?;
    info!(store = %store.id, name = %store.name, "Created store");

    for (category_name, products) in CATALOG {
        let category = db
            .categories()
            .create(
                &store.id,
                &NewCategory {
                    name: category_name.to_string(),
                    description: None,
                },
            )
            .await?;

        for (name, cents, coffee, discount) in products.iter() {
            db.products()
                .create(
                    &store.id,
                    &NewProduct {
                        name: name.to_string(),
                        price: Money::from_cents(*cents),
                        category: Some(category.id.clone()),
                        modifiers: if *coffee { coffee_modifiers() } else { Vec::new() },
                        discounts: discount.map(SeedDiscount::to_discount).into_iter().collect(),
                    },
                )
                .await?;
        }
    }

    let count = db.products().count(&store.id).await?;
    info!(store = %store.id, products = count, "Seed complete");

    db.close().await;
    Ok(())
}
