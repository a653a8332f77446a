//! # Menu Repository
//!
//! Menu items and seating locations.
//!
//! ## Display Order
//! ```text
//! ORDER BY category_order, item_order, name
//!
//!  1 Hot Beverages   1 Masala Chai
//!                    2 Filter Coffee
//!  2 Breakfast       1 Poha
//!                    2 Upma
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use cafe_core::action::MenuItemUpdate;
use cafe_core::validation::{validate_name, validate_price};
use cafe_core::{CoreError, Location, MenuItem, Money};

use crate::error::{DbError, DbResult};

const SELECT_MENU: &str = r#"
    SELECT item_id, name, category, category_order, item_order, price, available
    FROM menu_items
"#;

const MENU_ORDER: &str = "ORDER BY category_order, item_order, name";

#[derive(Debug, sqlx::FromRow)]
struct MenuRow {
    item_id: String,
    name: String,
    category: String,
    category_order: i64,
    item_order: i64,
    price: i64,
    available: bool,
}

impl From<MenuRow> for MenuItem {
    fn from(row: MenuRow) -> Self {
        MenuItem {
            item_id: row.item_id,
            name: row.name,
            category: row.category,
            category_order: row.category_order,
            item_order: row.item_order,
            price: Money::new(row.price),
            available: row.available,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    location_id: String,
    name: String,
}

/// Repository for the menu and seating locations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// Public menu: available items only, in display order.
    pub async fn list_available(&self) -> DbResult<Vec<MenuItem>> {
        let rows: Vec<MenuRow> =
            sqlx::query_as(&format!("{SELECT_MENU} WHERE available = 1 {MENU_ORDER}"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    /// Manager menu: every item, available or not.
    pub async fn list_all(&self) -> DbResult<Vec<MenuItem>> {
        let rows: Vec<MenuRow> = sqlx::query_as(&format!("{SELECT_MENU} {MENU_ORDER}"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    pub async fn get(&self, item_id: &str) -> DbResult<MenuItem> {
        let row: Option<MenuRow> = sqlx::query_as(&format!("{SELECT_MENU} WHERE item_id = ?"))
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(MenuItem::from)
            .ok_or_else(|| DbError::not_found("Menu item", item_id))
    }

    /// Inserts or replaces a menu item (seeding).
    pub async fn upsert(&self, item: &MenuItem) -> DbResult<()> {
        validate_price(item.price).map_err(CoreError::from)?;

        sqlx::query(
            r#"
            INSERT INTO menu_items (item_id, name, category, category_order, item_order, price, available, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (item_id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                category_order = excluded.category_order,
                item_order = excluded.item_order,
                price = excluded.price,
                available = excluded.available,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(item.item_id.as_str())
        .bind(item.name.as_str())
        .bind(item.category.as_str())
        .bind(item.category_order)
        .bind(item.item_order)
        .bind(item.price.amount())
        .bind(item.available)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Applies one partial update.
    pub async fn apply_update(&self, update: &MenuItemUpdate) -> DbResult<MenuItem> {
        let mut tx = self.pool.begin().await?;
        apply_update(&mut tx, update).await?;
        tx.commit().await?;

        info!(item_id = %update.item_id, "Menu item updated");
        self.get(&update.item_id).await
    }

    /// Applies several partial updates atomically: all or none.
    pub async fn apply_batch(&self, updates: &[MenuItemUpdate]) -> DbResult<usize> {
        let mut tx = self.pool.begin().await?;
        for update in updates {
            apply_update(&mut tx, update).await?;
        }
        tx.commit().await?;

        info!(count = updates.len(), "Menu batch applied");
        Ok(updates.len())
    }

    // =========================================================================
    // Locations
    // =========================================================================

    /// Tables and the counter, in display order.
    pub async fn locations(&self) -> DbResult<Vec<Location>> {
        let rows: Vec<LocationRow> =
            sqlx::query_as("SELECT location_id, name FROM locations ORDER BY sort_order, location_id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|row| Location {
                location_id: row.location_id,
                name: row.name,
            })
            .collect())
    }

    pub async fn location_exists(&self, location_id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM locations WHERE location_id = ?")
            .bind(location_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn upsert_location(&self, location: &Location, sort_order: i64) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO locations (location_id, name, sort_order) VALUES (?, ?, ?)
            ON CONFLICT (location_id) DO UPDATE SET name = excluded.name, sort_order = excluded.sort_order
            "#,
        )
        .bind(location.location_id.as_str())
        .bind(location.name.as_str())
        .bind(sort_order)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

async fn apply_update(conn: &mut sqlx::SqliteConnection, update: &MenuItemUpdate) -> DbResult<()> {
    if let Some(name) = &update.name {
        validate_name("name", name).map_err(CoreError::from)?;
    }
    if let Some(category) = &update.category {
        validate_name("category", category).map_err(CoreError::from)?;
    }
    if let Some(price) = update.price {
        validate_price(price).map_err(CoreError::from)?;
    }

    let result = sqlx::query(
        r#"
        UPDATE menu_items SET
            name = COALESCE(?, name),
            category = COALESCE(?, category),
            price = COALESCE(?, price),
            available = COALESCE(?, available),
            updated_at = ?
        WHERE item_id = ?
        "#,
    )
    .bind(update.name.as_deref())
    .bind(update.category.as_deref())
    .bind(update.price.map(|p| p.amount()))
    .bind(update.available)
    .bind(Utc::now())
    .bind(update.item_id.as_str())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Menu item", update.item_id.as_str()));
    }

    debug!(item_id = %update.item_id, "Menu item row updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn item(id: &str, category_order: i64, item_order: i64) -> MenuItem {
        MenuItem {
            item_id: id.to_string(),
            name: id.to_uppercase(),
            category: format!("cat-{category_order}"),
            category_order,
            item_order,
            price: Money::new(100),
            available: true,
        }
    }

    #[tokio::test]
    async fn test_menu_display_order_and_availability() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let menu = db.menu();

        menu.upsert(&item("upma", 2, 2)).await.unwrap();
        menu.upsert(&item("chai", 1, 1)).await.unwrap();
        menu.upsert(&item("poha", 2, 1)).await.unwrap();

        let ids: Vec<String> = menu
            .list_available()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.item_id)
            .collect();
        assert_eq!(ids, vec!["chai", "poha", "upma"]);

        let updated = menu
            .apply_update(&MenuItemUpdate {
                item_id: "poha".to_string(),
                available: Some(false),
                price: Some(Money::new(70)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!updated.available);
        assert_eq!(updated.price.amount(), 70);
        assert_eq!(updated.name, "POHA");

        assert_eq!(menu.list_available().await.unwrap().len(), 2);
        assert_eq!(menu.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_batch_is_atomic() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let menu = db.menu();
        menu.upsert(&item("chai", 1, 1)).await.unwrap();

        let updates = vec![
            MenuItemUpdate {
                item_id: "chai".to_string(),
                price: Some(Money::new(30)),
                ..Default::default()
            },
            MenuItemUpdate {
                item_id: "missing".to_string(),
                available: Some(false),
                ..Default::default()
            },
        ];

        let err = menu.apply_batch(&updates).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(menu.get("chai").await.unwrap().price.amount(), 100);

        let err = menu
            .apply_update(&MenuItemUpdate {
                item_id: "chai".to_string(),
                price: Some(Money::new(-1)),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(_)));
    }

    #[tokio::test]
    async fn test_price_above_cap_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let menu = db.menu();
        menu.upsert(&item("chai", 1, 1)).await.unwrap();

        let err = menu
            .apply_update(&MenuItemUpdate {
                item_id: "chai".to_string(),
                price: Some(Money::new(i64::MAX / 50)),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(_)));
        assert_eq!(menu.get("chai").await.unwrap().price.amount(), 100);

        let mut pricey = item("saffron", 1, 2);
        pricey.price = Money::new(cafe_core::MAX_ITEM_PRICE + 1);
        assert!(matches!(menu.upsert(&pricey).await.unwrap_err(), DbError::Rule(_)));
        assert!(menu.get("saffron").await.is_err());

        pricey.price = Money::new(cafe_core::MAX_ITEM_PRICE);
        menu.upsert(&pricey).await.unwrap();
        assert_eq!(menu.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_locations() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let menu = db.menu();

        let counter = Location {
            location_id: "COUNTER".to_string(),
            name: "Counter".to_string(),
        };
        let table = Location {
            location_id: "T1".to_string(),
            name: "Table 1".to_string(),
        };
        menu.upsert_location(&counter, 100).await.unwrap();
        menu.upsert_location(&table, 1).await.unwrap();

        let locations = menu.locations().await.unwrap();
        assert_eq!(locations[0].location_id, "T1");
        assert!(menu.location_exists("COUNTER").await.unwrap());
        assert!(!menu.location_exists("T9").await.unwrap());
    }
}
