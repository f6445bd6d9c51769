//! End-to-end CRUD against an in-memory database.

#![allow(missing_docs)]

use std::sync::Arc;

use chrono::NaiveDate;
use quill_orm::{Column, Dialect, Gateway, Orm, OrmOptions, Table, entity};
use quill_sqlite::SqliteGateway;

entity! {
    table = "users",
    id = id(DatabaseAssigned),
    columns = [email => "mail"],
    ignore = [session],
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct User {
        pub id: Option<i64>,
        pub user_name: Option<String>,
        pub email: Option<String>,
        pub active: Option<bool>,
        pub joined: Option<NaiveDate>,
        pub session: Option<String>,
    }
}

entity! {
    table = "orders",
    id = id(Random),
    #[derive(Debug, Clone, Default)]
    pub struct Order {
        pub id: Option<String>,
        pub user_id: Option<i64>,
        pub total: Option<f64>,
    }
}

const SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_name TEXT,
        mail TEXT,
        active INTEGER,
        joined TEXT
    );
    CREATE TABLE orders (id TEXT PRIMARY KEY, user_id INTEGER, total REAL);
";

fn setup() -> Orm {
    let gateway = SqliteGateway::in_memory().expect("connect");
    gateway.execute_batch(SCHEMA).expect("schema");
    let gateway: Arc<dyn Gateway> = Arc::new(gateway);
    Orm::new(OrmOptions::default().dialect(Dialect::Sqlite), gateway)
}

fn user(name: &str) -> User {
    User {
        user_name: Some(name.to_string()),
        email: Some(format!("{name}@example.com")),
        active: Some(true),
        joined: NaiveDate::from_ymd_opt(2024, 5, 1),
        ..User::default()
    }
}

#[test]
fn insert_and_select() {
    let orm = setup();
    let users = orm.repository::<User>().expect("repository");

    let mut ann = user("ann");
    assert_eq!(users.insert(&mut ann).expect("insert"), 1);
    assert_eq!(ann.id, Some(1));

    let mut bob = user("bob");
    users.insert(&mut bob).expect("insert");
    assert_eq!(bob.id, Some(2));

    let found = users.select_by_id(2).expect("select").expect("row");
    assert_eq!(found, bob);
    assert!(users.select_by_id(99).expect("select").is_none());

    let listed = users
        .select_list([users.condition().like("user_name", "nn")])
        .expect("select list");
    assert_eq!(listed, [ann]);
    assert_eq!(users.count().expect("count"), 2);
}

#[test]
fn update_and_delete() {
    let orm = setup();
    let users = orm.repository::<User>().expect("repository");

    let mut ann = user("ann");
    users.insert(&mut ann).expect("insert");
    users.insert(&mut user("bob")).expect("insert");

    let change = User {
        id: ann.id,
        email: Some("ann@example.org".to_string()),
        ..User::default()
    };
    assert_eq!(users.update_by_id(&change).expect("update"), 1);

    let found = users.select_by_id(ann.id).expect("select").expect("row");
    assert_eq!(found.email.as_deref(), Some("ann@example.org"));
    assert_eq!(found.user_name.as_deref(), Some("ann"));

    let inactive = User {
        active: Some(false),
        ..User::default()
    };
    assert_eq!(users.update_all(&inactive).expect("update all"), 2);
    let active = users.select_list([users.condition().eq("active", true)]).expect("select");
    assert!(active.is_empty());

    assert_eq!(users.delete_by_id(ann.id).expect("delete"), 1);
    assert_eq!(users.count().expect("count"), 1);
    assert_eq!(users.delete_all().expect("delete all"), 1);
    assert_eq!(users.count().expect("count"), 0);
}

#[test]
fn random_identity_round_trip() {
    let orm = setup();
    let orders = orm.repository::<Order>().expect("repository");

    let mut order = Order {
        user_id: Some(1),
        total: Some(12.5),
        ..Order::default()
    };
    orders.insert(&mut order).expect("insert");

    let id = order.id.clone().expect("generated id");
    let found = orders.select_by_id(id).expect("select").expect("row");
    assert_eq!(found.total, Some(12.5));
}

#[test]
fn join_through_foreign_key() {
    let orm = setup();
    let users = orm.repository::<User>().expect("repository");
    let orders = orm.repository::<Order>().expect("repository");

    let mut ann = user("ann");
    users.insert(&mut ann).expect("insert");
    for total in [5.0, 7.5] {
        let mut order = Order {
            user_id: ann.id,
            total: Some(total),
            ..Order::default()
        };
        orders.insert(&mut order).expect("insert");
    }

    let user_table = Table::new("users").column(Column::new("user_name"));
    let order_table = Table::new("orders")
        .column(Column::new("total"))
        .column(Column::new("user_id").references(user_table.foreign_key("id")));

    let rows = orm
        .select(user_table.clone())
        .join(order_table.clone())
        .r#where(user_table.new_condition().eq("id", ann.id))
        .order_by(order_table.new_order("total", false))
        .fetch(orm.gateway())
        .expect("join");

    let totals: Vec<_> = rows.iter().filter_map(|row| row.get("total").cloned()).collect();
    assert_eq!(
        totals,
        [quill_orm::DataType::Double(Some(7.5)), quill_orm::DataType::Double(Some(5.0))]
    );
}
