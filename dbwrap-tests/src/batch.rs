use dbwrap::{Connection, Database, Driver, Mapper, Value, to_primitive};

pub async fn batch<D: Driver>(database: &Database<D>) {
    let mut connection = database
        .connect()
        .await
        .expect("Could not open the connection");
    connection
        .execute("DROP TABLE IF EXISTS batch")
        .await
        .expect("Failed to drop the batch table");
    connection
        .execute("CREATE TABLE batch (id INTEGER PRIMARY KEY, label VARCHAR(32))")
        .await
        .expect("Failed to create the batch table");

    let rows = (0..50)
        .map(|i| vec![Value::from(i), Value::from(format!("label {i}"))])
        .collect();
    connection
        .execute_batch("INSERT INTO batch (id, label) VALUES (?, ?)", rows)
        .await
        .expect("Failed to insert the batch");

    let table = connection
        .query("SELECT COUNT(*), MAX(id) FROM batch")
        .await
        .expect("Failed to count the batch");
    assert_eq!(to_primitive::<i64>().map(table.clone()).unwrap(), Some(50));
    assert_eq!(table[0].get(1), Some("49"));

    // A failing row stops the batch, earlier rows are kept
    let rows = vec![
        vec![Value::from(100), Value::from("ok")],
        vec![Value::from(0), Value::from("duplicate")],
        vec![Value::from(101), Value::from("never")],
    ];
    let result = crate::silent_logs! {
        connection
            .execute_batch("INSERT INTO batch (id, label) VALUES (?, ?)", rows)
            .await
    };
    assert!(result.is_err(), "A duplicate key should fail the batch");
    let table = connection
        .query("SELECT id FROM batch WHERE id >= 100")
        .await
        .expect("Failed to read the batch");
    assert_eq!(table.column(0), Some(vec![Some("100")]));

    connection
        .close()
        .await
        .expect("Could not close the connection");
}
