//! # Seed Data Generator
//!
//! Populates a database with the café menu and seating plan.
//!
//! ## Usage
//! ```bash
//! # Seed ./cafe_dev.db with 12 tables
//! cargo run -p cafe-db --bin seed
//!
//! # Specify database path and table count
//! cargo run -p cafe-db --bin seed -- --db ./data/cafe.db --tables 20
//! ```
//!
//! ## Generated Data
//! - One menu item per dish, grouped by category, in card order
//! - Item ids are slugs of the dish name (`masala-chai`)
//! - Tables `T1..Tn` plus the `COUNTER` pseudo-location

use std::env;

use cafe_core::{Location, MenuItem, Money, COUNTER_LOCATION_ID};
use cafe_db::{Database, DbConfig};

/// (category title, base price, dishes) in display order.
const MENU: &[(&str, i64, &[&str])] = &[
    (
        "Chai",
        30,
        &["Adrak Chai", "Pudina Chai", "Honey Ginger Lemon Tea", "Masala Chai", "Kesar Chai"],
    ),
    (
        "Hot Beverages",
        90,
        &["Hot Cappuccino", "Chocolate Cappuccino", "Hot Chocolate"],
    ),
    (
        "Cold Beverages",
        120,
        &[
            "Cold Coffee",
            "Chocolate Shake",
            "KitKat Shake",
            "Oreo Shake",
            "Strawberry Shake",
            "Blueberry Shake",
            "Vanilla Scotch Shake",
        ],
    ),
    (
        "Coolers",
        80,
        &[
            "Fresh Lime Soda",
            "Masala Lime Soda",
            "Virgin Mojito",
            "Strawberry Mojito",
            "Lemon Mint Ice Tea",
            "Peach Ice Tea",
            "Watermelon Ice Tea",
        ],
    ),
    ("Soups", 90, &["Vegetable Soup", "Tomato Soup", "Sweet Corn Soup"]),
    ("Maggi", 60, &["Plain Maggi", "Masala Veg Maggi", "Cheese Masala Maggi"]),
    (
        "Paratha & Poha",
        70,
        &["Aloo Paratha", "Aloo-Pyaaz Paratha", "Paneer Paratha", "Pap-Arazzi Paratha", "Poha"],
    ),
    (
        "Sandwiches",
        100,
        &[
            "Grilled Veg",
            "Grilled Cheese",
            "Grilled Tandoori Paneer",
            "Bombay Style",
            "Corn & Cheese",
            "Baked Cheese Loaded",
        ],
    ),
    (
        "Burgers",
        80,
        &[
            "Aaloo Tikki",
            "Aaloo Tikki Paneer",
            "Veggie Crunchy",
            "Chilli Garlic Special",
            "Jumbo Double Decker",
        ],
    ),
    ("Pastas", 150, &["Red Sauce Pasta", "White Sauce Pasta", "Pink Sauce Pasta"]),
    (
        "Garlic Breads",
        110,
        &["Cheesy Garlic Bread", "Veg Mix Garlic Bread", "Jalo-Herbs Garlic Bread"],
    ),
    ("French Fries", 90, &["Salted Fries", "Peri-Peri Fries", "Cheesy PP Fries"]),
    (
        "Pizzas",
        180,
        &[
            "Classic Margherita",
            "OTC Mix Special",
            "Peri-Peri Paneer",
            "Cheesy Heaven",
            "Veg Farm Loaded",
        ],
    ),
    (
        "Quick Bites",
        140,
        &["Honey Chilli Potato", "Chilli Paneer", "Crispy Corn", "Fried Rice", "Sauté Vegetables"],
    ),
    (
        "Noodles",
        130,
        &["Veg Chowmein", "Hakka Noodles", "Schezwan Noodles", "Burnt Garlic Noodles"],
    ),
    (
        "Momos",
        100,
        &[
            "Veg Steamed Momos",
            "Pan Fried Veg Momos",
            "Veg Crunchy Momos",
            "Cheese Corn Fried Momos",
        ],
    ),
    ("Cheese Toasts", 90, &["Chilli Cheese Toast", "Jalapeno Cheese Toast"]),
    (
        "Nachos",
        120,
        &["Nachos with Dip", "Loaded Cheese Nachos", "Jalapeno Cheese Nachos"],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut tables: usize = 12;
    let mut db_path = String::from("./cafe_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tables" | "-t" => {
                if i + 1 < args.len() {
                    tables = args[i + 1].parse().unwrap_or(12);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cafe Ops Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -t, --tables <N>   Number of dine-in tables (default: 12)");
                println!("  -d, --db <PATH>    Database file path (default: ./cafe_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Cafe Ops Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Tables:   {}", tables);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.menu().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} menu items", existing);
        println!("  Skipping menu seed to avoid overwriting manager edits.");
    } else {
        let items = menu_items();
        for item in &items {
            db.menu().upsert(item).await?;
        }
        println!("✓ Seeded {} menu items in {} categories", items.len(), MENU.len());
    }

    for n in 1..=tables {
        let table = Location {
            location_id: format!("T{n}"),
            name: format!("Table {n}"),
        };
        db.menu().upsert_location(&table, n as i64).await?;
    }
    let counter = Location {
        location_id: COUNTER_LOCATION_ID.to_string(),
        name: "Counter".to_string(),
    };
    db.menu().upsert_location(&counter, 10_000).await?;
    println!("✓ Seeded {} tables and the counter", tables);

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// Expands the static menu into rows. Prices step up by 10 within a
/// category so the list is not flat.
fn menu_items() -> Vec<MenuItem> {
    MENU.iter()
        .enumerate()
        .flat_map(|(category_idx, (category, base_price, dishes))| {
            dishes.iter().enumerate().map(move |(item_idx, dish)| MenuItem {
                item_id: slug(dish),
                name: dish.to_string(),
                category: category.to_string(),
                category_order: category_idx as i64 + 1,
                item_order: item_idx as i64 + 1,
                price: Money::new(base_price + 10 * item_idx as i64),
                available: true,
            })
        })
        .collect()
}

/// "Corn & Cheese" → "corn-cheese", "Sauté Vegetables" → "saut-vegetables".
fn slug(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
