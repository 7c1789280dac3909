use dbwrap::{
    Connection, Database, DatabaseAction, DatabaseError, Driver, Query, error_kind, identity,
};

fn is_execution_error<T>(result: &dbwrap::Result<T>) -> bool {
    matches!(
        result.as_ref().map(|_| ()).map_err(error_kind),
        Err(Some(DatabaseError::Execution(..)))
    )
}

pub async fn failures<D: Driver>(database: &Database<D>) {
    let mut connection = database
        .connect()
        .await
        .expect("Could not open the connection");
    connection
        .execute("CREATE TABLE IF NOT EXISTS failure (id INTEGER PRIMARY KEY)")
        .await
        .expect("Failed to create the failure table");

    crate::silent_logs! {
        // Malformed statement
        let result = connection.query("SELEC id FROM failure").await;
        assert!(is_execution_error(&result), "Malformed SQL must be an execution error");

        // Missing table
        let result = connection.execute("INSERT INTO missing_table VALUES (1)").await;
        assert!(is_execution_error(&result), "A missing table must be an execution error");

        // Arguments count mismatch
        let result = connection
            .query_statement(&Query::new("SELECT id FROM failure WHERE id = ?").bind(1).bind(2))
            .await;
        assert!(is_execution_error(&result), "Too many arguments must be an execution error");
        let result = connection
            .execute_statement(&Query::new("INSERT INTO failure (id) VALUES (?)"))
            .await;
        assert!(is_execution_error(&result), "Missing arguments must be an execution error");

        // Failed action
        let result = database
            .action_mapped("SELECT nothing FROM nowhere", identity())
            .query()
            .await;
        assert!(is_execution_error(&result), "The action must report the execution error");
        let result = database
            .all_of([
                database.action("SELECT 1").shared(),
                database.action("SELECT nothing FROM nowhere").shared(),
            ])
            .query()
            .await;
        assert!(is_execution_error(&result), "The composite must report the execution error");
    };

    // The connection is still usable after failures
    let table = connection
        .query("SELECT COUNT(*) FROM failure")
        .await
        .expect("The connection should survive failed statements");
    assert_eq!(table.row_count(), 1);

    connection
        .close()
        .await
        .expect("Could not close the connection");
    crate::silent_logs! {
        let result = connection.query("SELECT 1").await;
        assert!(result.is_err(), "A closed connection must not run statements");
    };
}
