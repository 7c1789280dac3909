use dbwrap::{
    Connection, Database, DatabaseAction, Driver, Query, StringMapper, Value, row_stream,
};
use futures::StreamExt;
use indoc::indoc;

pub async fn simple<D: Driver>(database: &Database<D>) {
    let mut connection = database
        .connect()
        .await
        .expect("Could not open the connection");

    // Setup
    connection
        .execute("DROP TABLE IF EXISTS simple")
        .await
        .expect("Failed to drop the simple table");
    connection
        .execute(indoc! {"
            CREATE TABLE simple (
                id INTEGER PRIMARY KEY,
                name VARCHAR(32),
                score DOUBLE PRECISION,
                active BOOLEAN
            )
        "})
        .await
        .expect("Failed to create the simple table");

    // Insert
    let insert = Query::new("INSERT INTO simple (id, name, score, active) VALUES (?, ?, ?, ?)");
    connection
        .execute_statement(&insert.clone().bind(1).bind("alpha").bind(1.5).bind(true))
        .await
        .expect("Failed to insert the first row");
    connection
        .execute_statement(&insert.with_args([
            Value::from(2),
            Value::Varchar(None),
            Value::from(-20.25),
            Value::from(false),
        ]))
        .await
        .expect("Failed to insert the second row");

    // Read
    let table = connection
        .query("SELECT id, name, score, active FROM simple ORDER BY id")
        .await
        .expect("Failed to read the simple table");
    assert_eq!(table.attributes(), ["id", "name", "score", "active"]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table[0].get_by_name("id"), Some("1"));
    assert_eq!(table[0].get_by_name("name"), Some("alpha"));
    assert_eq!(table[1].get_by_name("name"), None);
    assert_eq!(
        StringMapper::new(table[0].get_by_name("score"))
            .to_double()
            .unwrap(),
        1.5
    );
    assert_eq!(
        StringMapper::new(table[1].get_by_name("score"))
            .to_double()
            .unwrap(),
        -20.25
    );
    assert!(
        StringMapper::new(table[0].get_by_name("active"))
            .to_bool()
            .unwrap()
    );
    assert!(
        !StringMapper::new(table[1].get_by_name("active"))
            .to_bool()
            .unwrap()
    );

    // Parameterized read
    let table = connection
        .query_statement(&Query::new("SELECT name, score FROM simple WHERE id = ?").bind(2))
        .await
        .expect("Failed to read the second row");
    assert_eq!(table.row_count(), 1);
    assert_eq!(table[0].get(0), None);
    let table = connection
        .query_statement(&Query::new("SELECT name FROM simple WHERE id = ?").bind(3))
        .await
        .expect("Failed to read a missing row");
    assert!(table.is_empty());
    assert_eq!(table.attributes(), ["name"]);

    #[cfg(not(feature = "disable-multiple-statements"))]
    {
        connection
            .execute(indoc! {"
                DELETE FROM simple WHERE id = 1;
                INSERT INTO simple (id, name) VALUES (10, 'ten');
                INSERT INTO simple (id, name) VALUES (11, 'eleven');
            "})
            .await
            .expect("Failed to run multiple statements");
        let table = connection
            .query("SELECT id FROM simple ORDER BY id")
            .await
            .expect("Failed to read the simple table");
        assert_eq!(table.column(0), Some(vec![Some("2"), Some("10"), Some("11")]));
    }

    connection
        .close()
        .await
        .expect("Could not close the connection");

    // Rows as a stream
    let names = database
        .action_mapped("SELECT id, name FROM simple ORDER BY id", row_stream())
        .query()
        .await
        .expect("Failed to stream the simple table")
        .filter_map(|row| async move { row.get_by_name("name").map(str::to_owned) })
        .collect::<Vec<_>>()
        .await;
    #[cfg(not(feature = "disable-multiple-statements"))]
    assert_eq!(names, ["ten", "eleven"]);
    #[cfg(feature = "disable-multiple-statements")]
    assert_eq!(names, ["alpha"]);
}
