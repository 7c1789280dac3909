use dbwrap::{
    Database, DatabaseAction, Driver, MapperExt, Query, Table, TaskExecutor, WorkerPool,
    string_value, to_primitive,
};
use std::sync::Arc;

pub async fn actions<D: Driver>(database: &Database<D>) {
    database
        .action("DROP TABLE IF EXISTS action_item")
        .execute()
        .await
        .expect("Failed to drop the action_item table");
    database
        .action("CREATE TABLE action_item (id INTEGER PRIMARY KEY, name VARCHAR(32))")
        .execute()
        .await
        .expect("Failed to create the action_item table");

    // Composite execute
    let insert = Query::new("INSERT INTO action_item (id, name) VALUES (?, ?)");
    let inserts = (1..=5)
        .map(|i| {
            database
                .action(insert.clone().bind(i).bind(format!("item {i}")))
                .shared()
        })
        .collect::<Vec<_>>();
    database
        .all_of(inserts)
        .execute()
        .await
        .expect("Failed to insert the items");

    // Composite query, results follow the order of the actions
    let select = Query::new("SELECT name FROM action_item WHERE id = ?");
    let names = database
        .all_of_mapped(
            [5, 1, 3, 42].map(|id| {
                database
                    .action_mapped(select.clone().bind(id), string_value())
                    .shared()
            }),
            |name: Option<String>| name.unwrap_or_else(|| "missing".into()),
        )
        .query()
        .await
        .expect("Failed to query the items");
    assert_eq!(names, ["item 5", "item 1", "item 3", "missing"]);

    // Nested composites
    let count = || {
        database
            .action_mapped(
                "SELECT COUNT(*) FROM action_item",
                to_primitive::<i64>().or_default(0),
            )
            .shared()
    };
    let nested = database
        .all_of([
            database.all_of([count(), count()]).shared(),
            database.all_of([count()]).shared(),
            database.all_of(Vec::<Arc<dyn DatabaseAction<D, i64>>>::new()).shared(),
        ])
        .query()
        .await
        .expect("Failed to run the nested composite");
    assert_eq!(nested, [vec![5, 5], vec![5], vec![]]);

    // Same action on a different executor
    let action = database.action("SELECT id, name FROM action_item ORDER BY id");
    let pool: Arc<WorkerPool> = Arc::new(WorkerPool::new(2).expect("Could not start the pool"));
    let table: Table = action
        .with_executor(pool.clone())
        .query()
        .await
        .expect("Failed to query on the worker pool");
    assert_eq!(table.row_count(), 5);
    assert_eq!(table.attributes(), ["id", "name"]);
    pool.shutdown();
    let again = action
        .query()
        .map(|table| table.row_count())
        .await
        .expect("Failed to query on the original executor");
    assert_eq!(again, 5);
}
