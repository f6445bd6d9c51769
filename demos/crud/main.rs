//! # CRUD Demo
//!
//! Declares two entities, creates their tables in an `SQLite` database and
//! walks through the repository operations and a join.
//!
//! ```bash
//! RUST_LOG=quill_orm=debug cargo run --example crud
//! ```
//!
//! `QUILL_SQLITE_DATABASE` selects the database file (in-memory by default)
//! and `QUILL_MAP_UNDERSCORE_TO_CAMEL_CASE` toggles column name conversion.

use std::sync::Arc;

use chrono::NaiveDate;
use quill_orm::{Column, Dialect, FromEnv, Gateway, Orm, OrmOptions, Table, entity};
use quill_sqlite::SqliteGateway;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

entity! {
    table = "authors",
    id = id(DatabaseAssigned),
    #[derive(Debug, Clone, Default)]
    pub struct Author {
        pub id: Option<i64>,
        pub name: Option<String>,
        pub born: Option<NaiveDate>,
    }
}

entity! {
    table = "books",
    id = isbn(Random, "id"),
    columns = [author => "author_id"],
    #[derive(Debug, Clone, Default)]
    pub struct Book {
        pub isbn: Option<String>,
        pub title: Option<String>,
        pub author: Option<i64>,
        pub pages: Option<i32>,
    }
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        born TEXT
    );
    CREATE TABLE IF NOT EXISTS books (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        author_id INTEGER REFERENCES authors (id),
        pages INTEGER
    );
";

fn main() -> anyhow::Result<()> {
    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let gateway = SqliteGateway::connect()?;
    gateway.execute_batch(SCHEMA)?;
    let gateway: Arc<dyn Gateway> = Arc::new(gateway);
    let orm = Orm::new(OrmOptions::from_env()?.dialect(Dialect::Sqlite), gateway);

    let authors = orm.repository::<Author>()?;
    let books = orm.repository::<Book>()?;

    let mut author = Author {
        name: Some("Ursula K. Le Guin".to_string()),
        born: NaiveDate::from_ymd_opt(1929, 10, 21),
        ..Author::default()
    };
    authors.insert(&mut author)?;
    tracing::info!(id = ?author.id, "inserted author");

    for (title, pages) in [("A Wizard of Earthsea", 183), ("The Dispossessed", 387)] {
        let mut book = Book {
            title: Some(title.to_string()),
            author: author.id,
            pages: Some(pages),
            ..Book::default()
        };
        books.insert(&mut book)?;
        tracing::info!(isbn = ?book.isbn, title, "inserted book");
    }

    let long = books.select_list([books.condition().gt("pages", 200)])?;
    tracing::info!(count = long.len(), "books over 200 pages");

    let mut renamed = author.clone();
    renamed.name = Some("Ursula Kroeber Le Guin".to_string());
    authors.update_by_id(&renamed)?;
    if let Some(found) = authors.select_by_id(author.id)? {
        tracing::info!(name = ?found.name, "reloaded author");
    }

    let author_table = Table::new("authors").column(Column::new("name").alias("author_name"));
    let book_table = Table::new("books")
        .column(Column::new("title"))
        .column(Column::new("author_id").references(author_table.foreign_key("id")));
    let rows = orm
        .select(author_table.clone())
        .join(book_table.clone())
        .order_by(book_table.new_order("title", true))
        .fetch(orm.gateway())?;
    for row in &rows {
        tracing::info!(?row, "joined row");
    }

    tracing::info!(books = books.count()?, authors = authors.count()?, "totals");
    books.delete_all()?;
    authors.delete_by_id(author.id)?;

    Ok(())
}
