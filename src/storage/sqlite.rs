//! SQLite store
//!
//! Local single-file backend. One table per record type, named after the
//! hosted schema (`products`, `inventory_records`, ...). Dates are stored
//! as ISO-8601 text so range filters compare lexicographically.

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::storage::backend::InventoryStore;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{
    normalize_code, ApprovalAction, ApprovalLog, ApprovalStatus, ExportLog, InventoryRecord,
    Movement, Product, RecordFilter, SalesRecord, SpecialOutboundRecord, VarianceReport,
};
use crate::variance::VarianceInputs;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    unit TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT '',
    unit_price REAL NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL,
    record_date TEXT NOT NULL,
    movement TEXT NOT NULL,
    quantity REAL NOT NULL,
    note TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_inventory_date ON inventory_records(record_date);

CREATE TABLE IF NOT EXISTS sales_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL,
    sale_date TEXT NOT NULL,
    quantity REAL NOT NULL,
    promotion_quantity REAL NOT NULL DEFAULT 0,
    unit_price REAL NOT NULL,
    customer TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sales_date ON sales_records(sale_date);

CREATE TABLE IF NOT EXISTS special_outbound_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL,
    outbound_date TEXT NOT NULL,
    quantity REAL NOT NULL,
    reason TEXT NOT NULL,
    status TEXT NOT NULL,
    requested_by TEXT NOT NULL,
    decided_by TEXT,
    decision_note TEXT,
    decided_at TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory_variance_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL,
    report_date TEXT NOT NULL,
    beginning_inventory REAL NOT NULL,
    inbound_quantity REAL NOT NULL,
    sales_quantity REAL NOT NULL,
    promotion_quantity REAL NOT NULL,
    special_outbound_quantity REAL NOT NULL,
    actual_inventory REAL NOT NULL,
    note TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (product_id, report_date)
);

CREATE TABLE IF NOT EXISTS approval_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    outbound_id INTEGER NOT NULL,
    action TEXT NOT NULL,
    actor TEXT NOT NULL,
    comment TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS export_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    dataset TEXT NOT NULL,
    format TEXT NOT NULL,
    row_count INTEGER NOT NULL,
    file_name TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

/// SQLite-backed store
pub struct SqliteStore {
    /// std Mutex: the connection is never held across an await point
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open or create a database file
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = ?path, "SQLite schema ready");
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file path (None for in-memory databases)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))
    }
}

/// Build `WHERE` conditions for a record filter
fn filter_sql(filter: &RecordFilter, date_column: &str) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(product_id) = filter.product_id {
        clauses.push("product_id = ?".to_string());
        values.push(Value::Integer(i64::from(product_id)));
    }

    if let Some(range) = filter.range {
        clauses.push(format!("{date_column} >= ? AND {date_column} <= ?"));
        values.push(Value::Text(range.start.format("%Y-%m-%d").to_string()));
        values.push(Value::Text(range.end.format("%Y-%m-%d").to_string()));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

fn is_constraint(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn conversion_error(idx: usize, value: &str, what: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("unknown {what}: {value}").into(),
    )
}

fn last_id(conn: &Connection) -> u32 {
    conn.last_insert_rowid() as u32
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        unit: row.get(3)?,
        category: row.get(4)?,
        unit_price: row.get(5)?,
        active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const PRODUCT_COLUMNS: &str = "id, code, name, unit, category, unit_price, active, created_at";

fn inventory_from_row(row: &Row<'_>) -> rusqlite::Result<InventoryRecord> {
    let movement: String = row.get(3)?;
    Ok(InventoryRecord {
        id: row.get(0)?,
        product_id: row.get(1)?,
        record_date: row.get(2)?,
        movement: Movement::parse(&movement)
            .ok_or_else(|| conversion_error(3, &movement, "movement"))?,
        quantity: row.get(4)?,
        note: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn sale_from_row(row: &Row<'_>) -> rusqlite::Result<SalesRecord> {
    Ok(SalesRecord {
        id: row.get(0)?,
        product_id: row.get(1)?,
        sale_date: row.get(2)?,
        quantity: row.get(3)?,
        promotion_quantity: row.get(4)?,
        unit_price: row.get(5)?,
        customer: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const OUTBOUND_COLUMNS: &str = "id, product_id, outbound_date, quantity, reason, status, \
     requested_by, decided_by, decision_note, decided_at, created_at";

fn outbound_from_row(row: &Row<'_>) -> rusqlite::Result<SpecialOutboundRecord> {
    let status: String = row.get(5)?;
    Ok(SpecialOutboundRecord {
        id: row.get(0)?,
        product_id: row.get(1)?,
        outbound_date: row.get(2)?,
        quantity: row.get(3)?,
        reason: row.get(4)?,
        status: ApprovalStatus::parse(&status)
            .ok_or_else(|| conversion_error(5, &status, "approval status"))?,
        requested_by: row.get(6)?,
        decided_by: row.get(7)?,
        decision_note: row.get(8)?,
        decided_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

const REPORT_COLUMNS: &str = "id, product_id, report_date, beginning_inventory, \
     inbound_quantity, sales_quantity, promotion_quantity, special_outbound_quantity, \
     actual_inventory, note, created_at, updated_at";

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<VarianceReport> {
    Ok(VarianceReport {
        id: row.get(0)?,
        product_id: row.get(1)?,
        report_date: row.get(2)?,
        inputs: VarianceInputs {
            beginning_inventory: row.get(3)?,
            inbound_quantity: row.get(4)?,
            sales_quantity: row.get(5)?,
            promotion_quantity: row.get(6)?,
            special_outbound_quantity: row.get(7)?,
            actual_inventory: row.get(8)?,
        },
        note: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn approval_log_from_row(row: &Row<'_>) -> rusqlite::Result<ApprovalLog> {
    let action: String = row.get(2)?;
    Ok(ApprovalLog {
        id: row.get(0)?,
        outbound_id: row.get(1)?,
        action: ApprovalAction::parse(&action)
            .ok_or_else(|| conversion_error(2, &action, "approval action"))?,
        actor: row.get(3)?,
        comment: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn delete_row(conn: &Connection, table: &str, entity: &'static str, id: u32) -> StorageResult<()> {
    let affected = conn.execute(&format!("DELETE FROM {table} WHERE id = ?"), params![id])?;
    if affected == 0 {
        return Err(StorageError::not_found(entity, id));
    }
    Ok(())
}

#[async_trait]
impl InventoryStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn ping(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    async fn list_products(&self) -> StorageResult<Vec<Product>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare_cached(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))?;
        let rows = stmt.query_map([], product_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn get_product(&self, id: u32) -> StorageResult<Product> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"),
            params![id],
            product_from_row,
        )
        .optional()?
        .ok_or_else(|| StorageError::not_found("product", id))
    }

    async fn find_product_by_code(&self, code: String) -> StorageResult<Option<Product>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?"),
                params![normalize_code(&code)],
                product_from_row,
            )
            .optional()?)
    }

    async fn insert_product(&self, mut product: Product) -> StorageResult<Product> {
        product.code = normalize_code(&product.code);
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO products (code, name, unit, category, unit_price, active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                product.code,
                product.name,
                product.unit,
                product.category,
                product.unit_price,
                product.active,
                product.created_at
            ],
        )
        .map_err(|e| {
            if is_constraint(&e) {
                StorageError::duplicate("product code", &product.code)
            } else {
                e.into()
            }
        })?;

        product.id = last_id(&conn);
        Ok(product)
    }

    async fn update_product(&self, mut product: Product) -> StorageResult<Product> {
        product.code = normalize_code(&product.code);
        let conn = self.conn()?;
        let affected = conn
            .execute(
                "UPDATE products
                 SET code = ?, name = ?, unit = ?, category = ?, unit_price = ?, active = ?
                 WHERE id = ?",
                params![
                    product.code,
                    product.name,
                    product.unit,
                    product.category,
                    product.unit_price,
                    product.active,
                    product.id
                ],
            )
            .map_err(|e| {
                if is_constraint(&e) {
                    StorageError::duplicate("product code", &product.code)
                } else {
                    e.into()
                }
            })?;

        if affected == 0 {
            return Err(StorageError::not_found("product", product.id));
        }
        Ok(product)
    }

    async fn delete_product(&self, id: u32) -> StorageResult<()> {
        let conn = self.conn()?;
        delete_row(&conn, "products", "product", id)
    }

    async fn list_inventory(&self, filter: RecordFilter) -> StorageResult<Vec<InventoryRecord>> {
        let (where_sql, values) = filter_sql(&filter, "record_date");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, product_id, record_date, movement, quantity, note, created_at
             FROM inventory_records{where_sql} ORDER BY record_date, id"
        ))?;
        let rows = stmt.query_map(params_from_iter(values.iter()), inventory_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn insert_inventory(&self, mut record: InventoryRecord) -> StorageResult<InventoryRecord> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO inventory_records
             (product_id, record_date, movement, quantity, note, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.product_id,
                record.record_date,
                record.movement.as_str(),
                record.quantity,
                record.note,
                record.created_at
            ],
        )?;
        record.id = last_id(&conn);
        Ok(record)
    }

    async fn delete_inventory(&self, id: u32) -> StorageResult<()> {
        let conn = self.conn()?;
        delete_row(&conn, "inventory_records", "inventory record", id)
    }

    async fn list_sales(&self, filter: RecordFilter) -> StorageResult<Vec<SalesRecord>> {
        let (where_sql, values) = filter_sql(&filter, "sale_date");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, product_id, sale_date, quantity, promotion_quantity, unit_price,
                    customer, created_at
             FROM sales_records{where_sql} ORDER BY sale_date, id"
        ))?;
        let rows = stmt.query_map(params_from_iter(values.iter()), sale_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn insert_sale(&self, mut record: SalesRecord) -> StorageResult<SalesRecord> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sales_records
             (product_id, sale_date, quantity, promotion_quantity, unit_price, customer, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                record.product_id,
                record.sale_date,
                record.quantity,
                record.promotion_quantity,
                record.unit_price,
                record.customer,
                record.created_at
            ],
        )?;
        record.id = last_id(&conn);
        Ok(record)
    }

    async fn delete_sale(&self, id: u32) -> StorageResult<()> {
        let conn = self.conn()?;
        delete_row(&conn, "sales_records", "sales record", id)
    }

    async fn list_special_outbound(
        &self,
        filter: RecordFilter,
        status: Option<ApprovalStatus>,
    ) -> StorageResult<Vec<SpecialOutboundRecord>> {
        let (mut where_sql, mut values) = filter_sql(&filter, "outbound_date");
        if let Some(status) = status {
            where_sql.push_str(if where_sql.is_empty() { " WHERE " } else { " AND " });
            where_sql.push_str("status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {OUTBOUND_COLUMNS} FROM special_outbound_records{where_sql}
             ORDER BY outbound_date, id"
        ))?;
        let rows = stmt.query_map(params_from_iter(values.iter()), outbound_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn get_special_outbound(&self, id: u32) -> StorageResult<SpecialOutboundRecord> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {OUTBOUND_COLUMNS} FROM special_outbound_records WHERE id = ?"),
            params![id],
            outbound_from_row,
        )
        .optional()?
        .ok_or_else(|| StorageError::not_found("special outbound", id))
    }

    async fn insert_special_outbound(
        &self,
        mut record: SpecialOutboundRecord,
    ) -> StorageResult<SpecialOutboundRecord> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO special_outbound_records
             (product_id, outbound_date, quantity, reason, status, requested_by,
              decided_by, decision_note, decided_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.product_id,
                record.outbound_date,
                record.quantity,
                record.reason,
                record.status.as_str(),
                record.requested_by,
                record.decided_by,
                record.decision_note,
                record.decided_at,
                record.created_at
            ],
        )?;
        record.id = last_id(&conn);
        Ok(record)
    }

    async fn update_special_outbound(
        &self,
        record: SpecialOutboundRecord,
    ) -> StorageResult<SpecialOutboundRecord> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "UPDATE special_outbound_records
             SET quantity = ?, reason = ?, status = ?, decided_by = ?, decision_note = ?,
                 decided_at = ?
             WHERE id = ?",
            params![
                record.quantity,
                record.reason,
                record.status.as_str(),
                record.decided_by,
                record.decision_note,
                record.decided_at,
                record.id
            ],
        )?;
        if affected == 0 {
            return Err(StorageError::not_found("special outbound", record.id));
        }
        Ok(record)
    }

    async fn list_variance_reports(
        &self,
        filter: RecordFilter,
    ) -> StorageResult<Vec<VarianceReport>> {
        let (where_sql, values) = filter_sql(&filter, "report_date");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM inventory_variance_reports{where_sql}
             ORDER BY report_date, product_id"
        ))?;
        let rows = stmt.query_map(params_from_iter(values.iter()), report_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn get_variance_report(&self, id: u32) -> StorageResult<VarianceReport> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {REPORT_COLUMNS} FROM inventory_variance_reports WHERE id = ?"),
            params![id],
            report_from_row,
        )
        .optional()?
        .ok_or_else(|| StorageError::not_found("variance report", id))
    }

    async fn find_variance_report(
        &self,
        product_id: u32,
        report_date: NaiveDate,
    ) -> StorageResult<Option<VarianceReport>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {REPORT_COLUMNS} FROM inventory_variance_reports
                     WHERE product_id = ? AND report_date = ?"
                ),
                params![product_id, report_date],
                report_from_row,
            )
            .optional()?)
    }

    async fn save_variance_report(
        &self,
        mut report: VarianceReport,
    ) -> StorageResult<VarianceReport> {
        let conn = self.conn()?;
        let inputs = report.inputs;
        let duplicate = |e: rusqlite::Error, report: &VarianceReport| {
            if is_constraint(&e) {
                StorageError::duplicate(
                    "variance report",
                    format!("product {} on {}", report.product_id, report.report_date),
                )
            } else {
                StorageError::from(e)
            }
        };

        if report.id == 0 {
            conn.execute(
                "INSERT INTO inventory_variance_reports
                 (product_id, report_date, beginning_inventory, inbound_quantity, sales_quantity,
                  promotion_quantity, special_outbound_quantity, actual_inventory, note,
                  created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    report.product_id,
                    report.report_date,
                    inputs.beginning_inventory,
                    inputs.inbound_quantity,
                    inputs.sales_quantity,
                    inputs.promotion_quantity,
                    inputs.special_outbound_quantity,
                    inputs.actual_inventory,
                    report.note,
                    report.created_at,
                    report.updated_at
                ],
            )
            .map_err(|e| duplicate(e, &report))?;
            report.id = last_id(&conn);
            return Ok(report);
        }

        report.updated_at = chrono::Utc::now();
        let affected = conn
            .execute(
                "UPDATE inventory_variance_reports
                 SET product_id = ?, report_date = ?, beginning_inventory = ?,
                     inbound_quantity = ?, sales_quantity = ?, promotion_quantity = ?,
                     special_outbound_quantity = ?, actual_inventory = ?, note = ?,
                     updated_at = ?
                 WHERE id = ?",
                params![
                    report.product_id,
                    report.report_date,
                    inputs.beginning_inventory,
                    inputs.inbound_quantity,
                    inputs.sales_quantity,
                    inputs.promotion_quantity,
                    inputs.special_outbound_quantity,
                    inputs.actual_inventory,
                    report.note,
                    report.updated_at,
                    report.id
                ],
            )
            .map_err(|e| duplicate(e, &report))?;

        if affected == 0 {
            return Err(StorageError::not_found("variance report", report.id));
        }
        Ok(report)
    }

    async fn delete_variance_report(&self, id: u32) -> StorageResult<()> {
        let conn = self.conn()?;
        delete_row(&conn, "inventory_variance_reports", "variance report", id)
    }

    async fn insert_approval_log(&self, mut log: ApprovalLog) -> StorageResult<ApprovalLog> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO approval_logs (outbound_id, action, actor, comment, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                log.outbound_id,
                log.action.as_str(),
                log.actor,
                log.comment,
                log.created_at
            ],
        )?;
        log.id = last_id(&conn);
        Ok(log)
    }

    async fn list_approval_logs(&self, outbound_id: u32) -> StorageResult<Vec<ApprovalLog>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, outbound_id, action, actor, comment, created_at
             FROM approval_logs WHERE outbound_id = ? ORDER BY id",
        )?;
        let rows = stmt.query_map(params![outbound_id], approval_log_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn insert_export_log(&self, mut log: ExportLog) -> StorageResult<ExportLog> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO export_logs (dataset, format, row_count, file_name, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![log.dataset, log.format, log.row_count, log.file_name, log.created_at],
        )?;
        log.id = last_id(&conn);
        Ok(log)
    }

    async fn list_export_logs(&self) -> StorageResult<Vec<ExportLog>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, dataset, format, row_count, file_name, created_at
             FROM export_logs ORDER BY id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ExportLog {
                id: row.get(0)?,
                dataset: row.get(1)?,
                format: row.get(2)?,
                row_count: row.get(3)?,
                file_name: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
