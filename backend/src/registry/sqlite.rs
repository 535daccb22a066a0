use crate::error::{AppError, Result};
use crate::registry::Registry;
use common::model::document::{Document, DocumentFields, DocumentStatus};
use common::model::template::Template;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS templates (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    file_id     TEXT NOT NULL UNIQUE,
    version     INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    id           TEXT PRIMARY KEY,
    template_id  TEXT NOT NULL REFERENCES templates(id),
    filename     TEXT NOT NULL UNIQUE,
    status       TEXT NOT NULL,
    fio          TEXT NOT NULL DEFAULT '',
    lavozim      TEXT NOT NULL DEFAULT '',
    oylik        TEXT NOT NULL DEFAULT '',
    stavka       TEXT NOT NULL DEFAULT '',
    username     TEXT NOT NULL DEFAULT '',
    order_type   TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);
";

const TEMPLATE_COLUMNS: &str = "id, name, file_id, version, created_at, updated_at";
const DOCUMENT_COLUMNS: &str = "id, template_id, filename, status, fio, lavozim, oylik, stavka, \
     username, order_type, created_at, updated_at";

/// Registry backed by a single SQLite connection.
pub struct SqliteRegistry {
    conn: Mutex<Connection>,
}

impl SqliteRegistry {
    /// Opens (or creates) the database at `url`. Accepts a plain path, a
    /// `sqlite://` URL or `:memory:`.
    pub fn open(url: &str) -> Result<Self> {
        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Registry for SqliteRegistry {
    fn find_template(&self, id: Uuid) -> Result<Template> {
        self.conn()
            .query_row(
                &format!("SELECT {} FROM templates WHERE id = ?1", TEMPLATE_COLUMNS),
                params![id.to_string()],
                template_from_row,
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("template {} not found", id)))
    }

    fn create_template(&self, template: &Template) -> Result<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO templates ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                TEMPLATE_COLUMNS
            ),
            params![
                template.id.to_string(),
                template.name,
                template.file_id.to_string(),
                template.version,
                template.created_at,
                template.updated_at,
            ],
        )?;
        Ok(())
    }

    fn list_templates(&self) -> Result<Vec<Template>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM templates ORDER BY name ASC, version DESC",
            TEMPLATE_COLUMNS
        ))?;
        let templates = stmt
            .query_map([], template_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(templates)
    }

    fn find_document(&self, id: Uuid) -> Result<Document> {
        self.conn()
            .query_row(
                &format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS),
                params![id.to_string()],
                document_from_row,
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("document {} not found", id)))
    }

    fn create_document(&self, document: &Document) -> Result<()> {
        let [fio, lavozim, oylik, stavka, username, order_type] = document.fields.values();
        self.conn().execute(
            &format!(
                "INSERT INTO documents ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                DOCUMENT_COLUMNS
            ),
            params![
                document.id.to_string(),
                document.template_id.to_string(),
                document.filename,
                document.status.as_str(),
                fio,
                lavozim,
                oylik,
                stavka,
                username,
                order_type,
                document.created_at,
                document.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_document(&self, document: &Document) -> Result<()> {
        let [fio, lavozim, oylik, stavka, username, order_type] = document.fields.values();
        let changed = self.conn().execute(
            "UPDATE documents SET status = ?1, fio = ?2, lavozim = ?3, oylik = ?4, stavka = ?5, \
             username = ?6, order_type = ?7, updated_at = ?8 WHERE id = ?9",
            params![
                document.status.as_str(),
                fio,
                lavozim,
                oylik,
                stavka,
                username,
                order_type,
                document.updated_at,
                document.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("document {} not found", document.id)));
        }
        Ok(())
    }
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    Ok(Template {
        id: uuid_column(row, 0)?,
        name: row.get(1)?,
        file_id: uuid_column(row, 2)?,
        version: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let status: String = row.get(3)?;
    let status = status
        .parse::<DocumentStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;
    Ok(Document {
        id: uuid_column(row, 0)?,
        template_id: uuid_column(row, 1)?,
        filename: row.get(2)?,
        status,
        fields: DocumentFields {
            fio: row.get(4)?,
            lavozim: row.get(5)?,
            oylik: row.get(6)?,
            stavka: row.get(7)?,
            username: row.get(8)?,
            order_type: row.get(9)?,
        },
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
