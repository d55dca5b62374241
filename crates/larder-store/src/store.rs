use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use thiserror::Error;
use tracing::debug;

use larder_core::models::{FoodItem, ItemFilter, NewFoodItem, Unit};
use larder_core::store::LIST_LIMIT;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Food already saved")]
    Duplicate,

    #[error("Food item not found: {0}")]
    NotFound(String),

    #[error("Storage operation failed: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// SQLite-backed inventory store
///
/// SQLite was chosen because:
/// - Zero-config embedded database
/// - The UNIQUE constraint gives us the atomic per-owner dedup check
/// - Battle-tested and reliable
/// - Doesn't require a separate process
pub struct SqliteInventoryStore {
    conn: Mutex<Connection>,
}

impl SqliteInventoryStore {
    /// Open (or create) a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| StoreError::Storage(format!("open: {}", e)))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Storage(format!("open_in_memory: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS food_items (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                code TEXT NOT NULL,
                product_name TEXT NOT NULL,
                brands TEXT NOT NULL,
                image_url TEXT NOT NULL DEFAULT '',
                nutriscore_grade TEXT,
                quantity INTEGER NOT NULL,
                unit TEXT NOT NULL,
                expiration_date TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(owner_id, code)
            );

            CREATE INDEX IF NOT EXISTS idx_food_items_owner ON food_items(owner_id);
            ",
        )
        .map_err(|e| StoreError::Storage(format!("init_schema: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Storage(format!("lock poisoned: {}", e)))
    }

    /// Insert a new item for an owner.
    ///
    /// The UNIQUE(owner_id, code) constraint is the only duplicate check:
    /// two racing saves hit the same insert and SQLite picks the winner.
    pub fn create(&self, owner_id: &str, item: NewFoodItem) -> Result<FoodItem> {
        let record = FoodItem {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            code: item.code,
            product_name: item.product_name,
            brands: item.brands,
            image_url: item.image_url,
            nutriscore_grade: item.nutriscore_grade,
            quantity: item.quantity,
            unit: item.unit,
            expiration_date: Some(item.expiration_date),
            created_at: Utc::now(),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO food_items
                 (id, owner_id, code, product_name, brands, image_url,
                  nutriscore_grade, quantity, unit, expiration_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.id,
                record.owner_id,
                record.code,
                record.product_name,
                record.brands,
                record.image_url,
                record.nutriscore_grade,
                record.quantity,
                record.unit.as_str(),
                record
                    .expiration_date
                    .map(|d| d.format("%Y-%m-%d").to_string()),
                record.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return StoreError::Duplicate;
                }
            }
            StoreError::Storage(format!("insert: {}", e))
        })?;

        debug!(owner = owner_id, code = %record.code, "inserted food item");
        Ok(record)
    }

    /// All items saved by an owner, in insertion order (no meaning attached).
    pub fn list_by_owner(&self, owner_id: &str) -> Result<Vec<FoodItem>> {
        self.select(
            "SELECT id, owner_id, code, product_name, brands, image_url,
                    nutriscore_grade, quantity, unit, expiration_date, created_at
             FROM food_items WHERE owner_id = ?1",
            vec![Box::new(owner_id.to_string())],
        )
    }

    /// Items saved by an owner, narrowed by exact code and/or name substring
    /// (case-insensitive), capped at the listing limit.
    pub fn find_by_owner(&self, owner_id: &str, filter: &ItemFilter) -> Result<Vec<FoodItem>> {
        let mut sql = String::from(
            "SELECT id, owner_id, code, product_name, brands, image_url,
                    nutriscore_grade, quantity, unit, expiration_date, created_at
             FROM food_items WHERE owner_id = ?1",
        );
        let mut args: Vec<Box<dyn rusqlite::types::ToSql>> =
            vec![Box::new(owner_id.to_string())];

        if let Some(code) = &filter.code {
            args.push(Box::new(code.clone()));
            sql.push_str(&format!(" AND code = ?{}", args.len()));
        }
        if let Some(name) = &filter.name {
            args.push(Box::new(format!("%{}%", name.to_lowercase())));
            sql.push_str(&format!(" AND LOWER(product_name) LIKE ?{}", args.len()));
        }

        sql.push_str(&format!(" LIMIT {}", LIST_LIMIT));

        self.select(&sql, args)
    }

    /// Delete an item only if it belongs to the owner.
    ///
    /// Foreign and absent ids report the same NotFound so a delete probe
    /// cannot reveal whether some other user saved a given record.
    pub fn delete_by_id(&self, id: &str, owner_id: &str) -> Result<()> {
        let conn = self.lock()?;
        let rows = conn
            .execute(
                "DELETE FROM food_items WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )
            .map_err(|e| StoreError::Storage(format!("delete: {}", e)))?;

        if rows == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn select(
        &self,
        sql: &str,
        args: Vec<Box<dyn rusqlite::types::ToSql>>,
    ) -> Result<Vec<FoodItem>> {
        let conn = self.lock()?;
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            args.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| StoreError::Storage(format!("prepare: {}", e)))?;

        let rows = stmt
            .query_map(params_ref.as_slice(), |row| Ok(Self::row_to_item(row)))
            .map_err(|e| StoreError::Storage(format!("query: {}", e)))?;

        let mut items = Vec::new();
        for row_result in rows {
            let item = row_result.map_err(|e| StoreError::Storage(format!("row: {}", e)))?;
            items.push(item?);
        }
        Ok(items)
    }

    fn row_to_item(row: &rusqlite::Row<'_>) -> Result<FoodItem> {
        let unit_str: String = row
            .get(8)
            .map_err(|e| StoreError::Storage(format!("row unit: {}", e)))?;
        let unit: Unit = unit_str
            .parse()
            .map_err(|_| StoreError::Storage(format!("bad unit column: {:?}", unit_str)))?;

        let expiration_str: Option<String> = row
            .get(9)
            .map_err(|e| StoreError::Storage(format!("row expiration: {}", e)))?;
        let expiration_date = expiration_str
            .map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|e| StoreError::Storage(format!("bad expiration column: {}", e)))
            })
            .transpose()?;

        let created_str: String = row
            .get(10)
            .map_err(|e| StoreError::Storage(format!("row created_at: {}", e)))?;
        let created_at = DateTime::parse_from_rfc3339(&created_str)
            .map_err(|e| StoreError::Storage(format!("bad created_at column: {}", e)))?
            .with_timezone(&Utc);

        Ok(FoodItem {
            id: Self::column(row, 0)?,
            owner_id: Self::column(row, 1)?,
            code: Self::column(row, 2)?,
            product_name: Self::column(row, 3)?,
            brands: Self::column(row, 4)?,
            image_url: Self::column(row, 5)?,
            nutriscore_grade: row
                .get(6)
                .map_err(|e| StoreError::Storage(format!("row nutriscore: {}", e)))?,
            quantity: row
                .get(7)
                .map_err(|e| StoreError::Storage(format!("row quantity: {}", e)))?,
            unit,
            expiration_date,
            created_at,
        })
    }

    fn column(row: &rusqlite::Row<'_>, index: usize) -> Result<String> {
        row.get(index)
            .map_err(|e| StoreError::Storage(format!("row column {}: {}", index, e)))
    }
}

impl larder_core::InventoryStore for SqliteInventoryStore {
    fn create(&self, owner_id: &str, item: NewFoodItem) -> larder_core::Result<FoodItem> {
        SqliteInventoryStore::create(self, owner_id, item).map_err(into_core)
    }

    fn list_by_owner(&self, owner_id: &str) -> larder_core::Result<Vec<FoodItem>> {
        SqliteInventoryStore::list_by_owner(self, owner_id).map_err(into_core)
    }

    fn find_by_owner(
        &self,
        owner_id: &str,
        filter: &ItemFilter,
    ) -> larder_core::Result<Vec<FoodItem>> {
        SqliteInventoryStore::find_by_owner(self, owner_id, filter).map_err(into_core)
    }

    fn delete_by_id(&self, id: &str, owner_id: &str) -> larder_core::Result<()> {
        SqliteInventoryStore::delete_by_id(self, id, owner_id).map_err(into_core)
    }
}

fn into_core(err: StoreError) -> larder_core::Error {
    match err {
        StoreError::Duplicate => larder_core::Error::DuplicateItem,
        StoreError::NotFound(id) => larder_core::Error::NotFound(id),
        StoreError::Storage(msg) => larder_core::Error::Store(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(code: &str, name: &str) -> NewFoodItem {
        NewFoodItem {
            code: code.into(),
            product_name: name.into(),
            brands: "Unknown".into(),
            image_url: String::new(),
            nutriscore_grade: Some("b".into()),
            quantity: 2,
            unit: Unit::Cases,
            expiration_date: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
        }
    }

    #[test]
    fn test_create_and_list_round_trip() {
        let store = SqliteInventoryStore::open_in_memory().unwrap();
        let saved = store.create("alice", new_item("100", "Rice Noodles")).unwrap();

        let items = store.list_by_owner("alice").unwrap();
        assert_eq!(items.len(), 1);
        let got = &items[0];
        assert_eq!(got.id, saved.id);
        assert_eq!(got.code, "100");
        assert_eq!(got.product_name, "Rice Noodles");
        assert_eq!(got.quantity, 2);
        assert_eq!(got.unit, Unit::Cases);
        assert_eq!(got.nutriscore_grade.as_deref(), Some("b"));
        assert_eq!(
            got.expiration_date,
            Some(NaiveDate::from_ymd_opt(2026, 8, 20).unwrap())
        );
        assert_eq!(got.created_at, saved.created_at);
    }

    #[test]
    fn test_duplicate_code_per_owner_rejected() {
        let store = SqliteInventoryStore::open_in_memory().unwrap();
        store.create("alice", new_item("100", "First")).unwrap();

        let err = store.create("alice", new_item("100", "Second")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));

        // The losing insert left nothing behind.
        let items = store.list_by_owner("alice").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name, "First");
    }

    #[test]
    fn test_same_code_under_two_owners() {
        let store = SqliteInventoryStore::open_in_memory().unwrap();
        store.create("alice", new_item("100", "Noodles")).unwrap();
        store.create("bob", new_item("100", "Noodles")).unwrap();

        assert_eq!(store.list_by_owner("alice").unwrap().len(), 1);
        assert_eq!(store.list_by_owner("bob").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_is_owner_scoped() {
        let store = SqliteInventoryStore::open_in_memory().unwrap();
        let saved = store.create("alice", new_item("100", "Noodles")).unwrap();

        let err = store.delete_by_id(&saved.id, "bob").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.list_by_owner("alice").unwrap().len(), 1);

        store.delete_by_id(&saved.id, "alice").unwrap();
        assert!(store.list_by_owner("alice").unwrap().is_empty());

        // Deleting again reports NotFound, same as a foreign id.
        let err = store.delete_by_id(&saved.id, "alice").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_find_by_code_and_name() {
        let store = SqliteInventoryStore::open_in_memory().unwrap();
        store.create("alice", new_item("100", "Rice Noodles")).unwrap();
        store.create("alice", new_item("200", "Tomato Soup")).unwrap();
        store.create("bob", new_item("300", "Rice Crackers")).unwrap();

        let by_code = store
            .find_by_owner(
                "alice",
                &ItemFilter {
                    code: Some("200".into()),
                    name: None,
                },
            )
            .unwrap();
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].product_name, "Tomato Soup");

        // Substring match ignores case and never crosses owners.
        let by_name = store
            .find_by_owner(
                "alice",
                &ItemFilter {
                    code: None,
                    name: Some("RICE".into()),
                },
            )
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].code, "100");
    }

    #[test]
    fn test_row_without_expiration_is_readable() {
        let store = SqliteInventoryStore::open_in_memory().unwrap();

        // Legacy rows predate the required-date rule; readers tolerate them.
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO food_items
                     (id, owner_id, code, product_name, brands, image_url,
                      nutriscore_grade, quantity, unit, expiration_date, created_at)
                 VALUES ('legacy', 'alice', '900', 'No name', 'Unknown', '',
                         NULL, 1, 'items', NULL, ?1)",
                params![Utc::now().to_rfc3339()],
            )
            .unwrap();
        }

        let items = store.list_by_owner("alice").unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].expiration_date.is_none());
    }

    #[test]
    fn test_find_caps_results() {
        let store = SqliteInventoryStore::open_in_memory().unwrap();
        for i in 0..60 {
            store
                .create("alice", new_item(&format!("code-{i}"), "Bulk"))
                .unwrap();
        }

        let found = store
            .find_by_owner(
                "alice",
                &ItemFilter {
                    code: None,
                    name: Some("bulk".into()),
                },
            )
            .unwrap();
        assert_eq!(found.len(), LIST_LIMIT);
    }
}
