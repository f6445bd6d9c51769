//! Integration tests for the CRUD repository.

#![allow(missing_docs)]

mod common;

use common::{
    Account, AuditEntry, Purchase, RecordingGateway, User, assert_sql_contains, orm, row,
};
use quill_orm::{DataType, Error};

#[test]
fn insert_populates_generated_key() {
    let gateway = RecordingGateway::new(1, Some(41));
    let users = orm(&gateway).repository::<User>().unwrap();
    let mut user = User {
        user_name: Some("ann".to_string()),
        session: Some("token".to_string()),
        ..User::default()
    };

    assert_eq!(users.insert(&mut user).unwrap(), 1);
    assert_eq!(user.id, Some(41));

    let query = gateway.last();
    assert_sql_contains(&query.sql, &["INSERT INTO users (user_name) VALUES ($1)"]);
    assert_eq!(query.params, vec![DataType::Str(Some("ann".to_string()))]);
}

#[test]
fn insert_narrows_generated_key() {
    let gateway = RecordingGateway::new(1, Some(12));
    let purchases = orm(&gateway).repository::<Purchase>().unwrap();
    let mut purchase = Purchase {
        user_id: Some(3),
        total: Some(9.5),
        ..Purchase::default()
    };

    purchases.insert(&mut purchase).unwrap();
    assert_eq!(purchase.id, Some(12));
}

#[test]
fn insert_without_rows_leaves_key_unset() {
    let gateway = RecordingGateway::new(0, Some(41));
    let users = orm(&gateway).repository::<User>().unwrap();
    let mut user = User {
        user_name: Some("ann".to_string()),
        ..User::default()
    };

    assert_eq!(users.insert(&mut user).unwrap(), 0);
    assert!(user.id.is_none());
}

#[test]
fn insert_generates_random_key() {
    let gateway = RecordingGateway::new(1, None);
    let accounts = orm(&gateway).repository::<Account>().unwrap();
    let mut account = Account {
        owner: Some("ann".to_string()),
        ..Account::default()
    };

    assert_eq!(accounts.insert(&mut account).unwrap(), 1);
    let id = account.account_id.clone().unwrap();

    let query = gateway.last();
    assert_sql_contains(&query.sql, &["INSERT INTO accounts (id, owner) VALUES ($1, $2)"]);
    assert_eq!(query.params[0], DataType::Str(Some(id)));
}

#[test]
fn insert_without_values_executes_nothing() {
    let gateway = RecordingGateway::new(1, Some(1));
    let users = orm(&gateway).repository::<User>().unwrap();

    let err = users.insert(&mut User::default()).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(gateway.statements().is_empty());
}

#[test]
fn delete_by_id() {
    let gateway = RecordingGateway::new(1, None);
    let users = orm(&gateway).repository::<User>().unwrap();

    assert_eq!(users.delete_by_id(7).unwrap(), 1);

    let query = gateway.last();
    assert_sql_contains(&query.sql, &["DELETE FROM users WHERE (id) = ($1)"]);
    assert_eq!(query.params, vec![DataType::Int32(Some(7))]);
}

#[test]
fn delete_where_conditions() {
    let gateway = RecordingGateway::new(2, None);
    let users = orm(&gateway).repository::<User>().unwrap();

    let removed =
        users.delete_where([users.condition().is_null("mail"), users.condition().gt("age", 60)]);
    assert_eq!(removed.unwrap(), 2);

    let query = gateway.last();
    assert_sql_contains(&query.sql, &["DELETE FROM users WHERE", "mail", "IS", "AND", "age"]);
    assert_eq!(query.params, vec![DataType::Int32(Some(60))]);
}

#[test]
fn delete_all_has_no_where() {
    let gateway = RecordingGateway::new(5, None);
    let users = orm(&gateway).repository::<User>().unwrap();

    assert_eq!(users.delete_all().unwrap(), 5);
    let query = gateway.last();
    assert_sql_contains(&query.sql, &["DELETE FROM users"]);
    assert!(!query.sql.contains("WHERE"));
}

#[test]
fn update_by_id() {
    let gateway = RecordingGateway::new(1, None);
    let users = orm(&gateway).repository::<User>().unwrap();
    let user = User {
        id: Some(7),
        email: Some("ann@example.com".to_string()),
        ..User::default()
    };

    assert_eq!(users.update_by_id(&user).unwrap(), 1);

    let query = gateway.last();
    assert_sql_contains(&query.sql, &["UPDATE users SET mail = $1 WHERE (id) = ($2)"]);
    assert_eq!(
        query.params,
        vec![DataType::Str(Some("ann@example.com".to_string())), DataType::Int64(Some(7))]
    );
}

#[test]
fn update_by_id_with_unset_identity() {
    let gateway = RecordingGateway::new(1, None);
    let users = orm(&gateway).repository::<User>().unwrap();
    let user = User {
        user_name: Some("ann".to_string()),
        ..User::default()
    };

    let err = users.update_by_id(&user).unwrap_err();
    assert!(matches!(err, Error::IllegalState(message) if message.contains("id")));
    assert!(gateway.statements().is_empty());
}

#[test]
fn table_for_entity() {
    let gateway = RecordingGateway::new(0, None);
    let orm = orm(&gateway);
    let table = orm.table::<User>().unwrap();

    assert_eq!(table.name(), "users");
    let columns: Vec<_> = table.column_list().iter().map(|column| column.name()).collect();
    assert_eq!(columns, ["id", "user_name", "mail", "age"]);

    let query = orm.select(table).build().unwrap();
    assert_sql_contains(&query.sql, &["SELECT users.id, users.user_name, users.mail, users.age"]);
}

#[test]
fn update_all_has_no_where() {
    let gateway = RecordingGateway::new(3, None);
    let users = orm(&gateway).repository::<User>().unwrap();
    let user = User {
        age: Some(18),
        ..User::default()
    };

    assert_eq!(users.update_all(&user).unwrap(), 3);
    let query = gateway.last();
    assert_sql_contains(&query.sql, &["UPDATE users SET age = $1"]);
    assert!(!query.sql.contains("WHERE"));
}

#[test]
fn identity_operations_need_identity() {
    let gateway = RecordingGateway::new(1, None);
    let entries = orm(&gateway).repository::<AuditEntry>().unwrap();

    assert!(matches!(entries.select_by_id(1), Err(Error::Configuration(_))));
    assert!(matches!(entries.delete_by_id(1), Err(Error::Configuration(_))));
    assert!(matches!(entries.update_by_id(&AuditEntry::default()), Err(Error::Configuration(_))));
    assert!(gateway.statements().is_empty());
}

#[test]
fn select_by_id_decodes_row() {
    let gateway = RecordingGateway::with_rows(vec![row(&[
        ("id", DataType::Int64(Some(7))),
        ("user_name", DataType::Str(Some("ann".to_string()))),
        ("mail", DataType::Str(Some("ann@example.com".to_string()))),
        ("age", DataType::Int32(None)),
    ])]);
    let users = orm(&gateway).repository::<User>().unwrap();

    let user = users.select_by_id(7).unwrap().unwrap();
    assert_eq!(user.id, Some(7));
    assert_eq!(user.email.as_deref(), Some("ann@example.com"));
    assert!(user.age.is_none());
    assert!(user.session.is_none());

    let query = gateway.last();
    assert_sql_contains(
        &query.sql,
        &[
            "SELECT users.id, users.user_name, users.mail, users.age",
            "FROM users",
            "WHERE (users.id) = ($1)",
        ],
    );
}

#[test]
fn select_by_id_missing_row() {
    let gateway = RecordingGateway::with_rows(Vec::new());
    let users = orm(&gateway).repository::<User>().unwrap();
    assert!(users.select_by_id(7).unwrap().is_none());
}

#[test]
fn select_list_decodes_rows() {
    let gateway = RecordingGateway::with_rows(vec![
        row(&[
            ("message", DataType::Str(Some("started".to_string()))),
            ("level", DataType::Int32(Some(1))),
        ]),
        row(&[
            ("message", DataType::Str(Some("stopped".to_string()))),
            ("level", DataType::Int32(Some(2))),
        ]),
    ]);
    let entries = orm(&gateway).repository::<AuditEntry>().unwrap();

    let found = entries.select_list([entries.condition().like("message", "ed")]).unwrap();
    let messages: Vec<_> = found.iter().filter_map(|entry| entry.message.as_deref()).collect();
    assert_eq!(messages, ["started", "stopped"]);

    let query = gateway.last();
    assert_sql_contains(&query.sql, &["FROM audit_log WHERE", "audit_log.message", "LIKE"]);
    assert_eq!(query.params, vec![DataType::Str(Some("%ed%".to_string()))]);
}

#[test]
fn count_rows() {
    let gateway = RecordingGateway::with_rows(vec![row(&[("count", DataType::Int64(Some(4)))])]);
    let users = orm(&gateway).repository::<User>().unwrap();

    assert_eq!(users.count().unwrap(), 4);
    assert_sql_contains(&gateway.last().sql, &["SELECT COUNT(", "users.id", "AS count FROM users"]);
}
