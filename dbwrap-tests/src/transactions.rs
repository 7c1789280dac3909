use dbwrap::{
    Connection, Database, DatabaseAction, Driver, MapperExt, Query, SingleDatabaseAction,
    to_primitive,
};

fn count<D: Driver>(database: &Database<D>) -> SingleDatabaseAction<D, i64> {
    database.action_mapped(
        "SELECT COUNT(*) FROM transaction_item",
        to_primitive::<i64>().or_default(0),
    )
}

pub async fn transactions<D: Driver>(database: &Database<D>) {
    let mut connection = database
        .connect()
        .await
        .expect("Could not open the connection");
    connection
        .execute("DROP TABLE IF EXISTS transaction_item")
        .await
        .expect("Failed to drop the transaction_item table");
    connection
        .execute("CREATE TABLE transaction_item (id INTEGER PRIMARY KEY)")
        .await
        .expect("Failed to create the transaction_item table");
    connection
        .close()
        .await
        .expect("Could not close the connection");
    let insert = Query::new("INSERT INTO transaction_item (id) VALUES (?)");

    // Commit
    let mut writer = database
        .begin()
        .await
        .expect("Could not begin a transaction");
    for id in [1, 2] {
        writer
            .execute_statement(&insert.clone().bind(id))
            .await
            .expect("Failed to insert in the transaction");
    }
    assert_eq!(
        count(database).query().await.expect("Failed to count"),
        0,
        "Uncommitted rows must not be visible to other connections"
    );
    writer
        .commit()
        .await
        .expect("Failed to commit the transaction");
    assert_eq!(count(database).query().await.expect("Failed to count"), 2);

    // Rollback
    writer
        .begin()
        .await
        .expect("Could not begin a transaction");
    writer
        .execute("DELETE FROM transaction_item")
        .await
        .expect("Failed to delete in the transaction");
    assert_eq!(count(database).query().await.expect("Failed to count"), 2);
    writer
        .rollback()
        .await
        .expect("Failed to rollback the transaction");
    assert_eq!(count(database).query().await.expect("Failed to count"), 2);

    // Closing discards the open transaction
    writer
        .begin()
        .await
        .expect("Could not begin a transaction");
    writer
        .execute_statement(&insert.clone().bind(3))
        .await
        .expect("Failed to insert in the transaction");
    writer
        .close()
        .await
        .expect("Could not close the connection");
    assert_eq!(count(database).query().await.expect("Failed to count"), 2);

    // Nothing to commit
    let mut connection = database
        .connect()
        .await
        .expect("Could not open the connection");
    let result = crate::silent_logs! { connection.commit().await };
    assert!(result.is_err(), "Committing without a transaction must fail");
    connection
        .close()
        .await
        .expect("Could not close the connection");
}
