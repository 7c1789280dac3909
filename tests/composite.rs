#[cfg(test)]
mod tests {
    use dbwrap::{
        Database, DatabaseAction, DatabaseError, Table, WorkerPool, error_kind, string_list,
        string_value, to_primitive,
    };
    use dbwrap_tests::{MockDriver, ServiceRecorder, init_logs, silent_logs};
    use std::{sync::Arc, time::Duration};

    fn cell(value: &str) -> Table {
        Table::new(["value"], [[Some(value)]]).unwrap()
    }

    fn setup(workers: usize) -> (MockDriver, ServiceRecorder, Database<MockDriver>) {
        init_logs();
        let driver = MockDriver::new();
        let recorder = ServiceRecorder::new();
        let database = driver
            .database()
            .unwrap()
            .with_service(recorder.supplier(workers));
        (driver, recorder, database)
    }

    fn value(
        database: &Database<MockDriver>,
        sql: &str,
    ) -> Arc<dyn DatabaseAction<MockDriver, Option<String>>> {
        database.action_mapped(sql, string_value()).shared()
    }

    #[tokio::test]
    async fn shared_connection() {
        let (driver, recorder, database) = setup(4);
        driver.returns("SELECT 'a'", cell("a"));
        driver.returns("SELECT 'b'", cell("b"));
        driver.returns("SELECT 'c'", cell("c"));
        let values = database
            .all_of([
                value(&database, "SELECT 'a'"),
                value(&database, "SELECT 'b'"),
                value(&database, "SELECT 'c'"),
            ])
            .query()
            .await
            .unwrap();
        assert_eq!(
            values,
            [Some("a".to_string()), Some("b".to_string()), Some("c".to_string())]
        );
        assert_eq!(driver.opened(), 1);
        assert_eq!(driver.closed(), 1);
        assert_eq!(driver.statements().len(), 3);
        assert_eq!(recorder.created(), 1);
        assert_eq!(recorder.tasks(), 3);
        assert_eq!(recorder.shutdowns(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn input_order() {
        let (driver, _recorder, database) = setup(4);
        driver
            .returns("SELECT 'slow'", cell("slow"))
            .delays("SELECT 'slow'", Duration::from_millis(150));
        driver
            .returns("SELECT 'medium'", cell("medium"))
            .delays("SELECT 'medium'", Duration::from_millis(50));
        driver.returns("SELECT 'fast'", cell("fast"));
        let values = database
            .all_of([
                database.all_of([value(&database, "SELECT 'slow'")]).shared(),
                database.all_of([value(&database, "SELECT 'medium'")]).shared(),
                database.all_of([value(&database, "SELECT 'fast'")]).shared(),
            ])
            .query()
            .await
            .unwrap();
        assert_eq!(
            values,
            [
                vec![Some("slow".to_string())],
                vec![Some("medium".to_string())],
                vec![Some("fast".to_string())],
            ]
        );
        assert_eq!(driver.opened(), 4);
        assert_eq!(driver.closed(), 4);
    }

    #[tokio::test]
    async fn nested() {
        let (driver, recorder, database) = setup(2);
        let values = database
            .all_of([
                database
                    .all_of([value(&database, "SELECT 1"), value(&database, "SELECT 2")])
                    .shared(),
                database.all_of([value(&database, "SELECT 3")]).shared(),
            ])
            .query()
            .await
            .unwrap();
        assert_eq!(values, [vec![None::<String>, None], vec![None]]);
        assert_eq!(driver.opened(), 3);
        assert_eq!(driver.closed(), 3);
        assert_eq!(recorder.created(), 3);
        assert_eq!(recorder.shutdowns(), 3);
        // Two composite children on the outer service, three leaves on the inner ones
        assert_eq!(recorder.tasks(), 5);
    }

    #[tokio::test]
    async fn mixed_children() {
        let (driver, _recorder, database) = setup(2);
        driver.returns(
            "SELECT name FROM users",
            Table::new(["name"], [[Some("alice")], [None], [Some("bob")]]).unwrap(),
        );
        driver.returns("SELECT 'x'", cell("x"));
        let values = database
            .all_of([
                database
                    .action_mapped("SELECT name FROM users", string_list())
                    .shared(),
                database
                    .all_of([value(&database, "SELECT 'x'"), value(&database, "SELECT 'y'")])
                    .shared(),
            ])
            .query()
            .await
            .unwrap();
        assert_eq!(
            values,
            [
                vec![Some("alice".to_string()), None, Some("bob".to_string())],
                vec![Some("x".to_string()), None],
            ]
        );
        assert_eq!(driver.opened(), 2);
        assert_eq!(driver.closed(), 2);
    }

    #[tokio::test]
    async fn mapped() {
        let (driver, _recorder, database) = setup(1);
        driver.returns("SELECT 7", cell("7"));
        let values = database
            .all_of_mapped(
                [
                    database.action_mapped("SELECT 7", to_primitive::<i32>()).shared(),
                    database.action_mapped("SELECT NULL", to_primitive::<i32>()).shared(),
                ],
                |v: Option<i32>| v.unwrap_or(-1),
            )
            .query()
            .await
            .unwrap();
        assert_eq!(values, [7, -1]);
    }

    #[tokio::test]
    async fn execute() {
        let (driver, recorder, database) = setup(2);
        database
            .all_of([
                database.action("INSERT INTO t VALUES (1)").shared(),
                database.action("INSERT INTO t VALUES (2)").shared(),
            ])
            .execute()
            .await
            .unwrap();
        let mut statements = driver.statements();
        statements.sort();
        assert_eq!(
            statements,
            ["INSERT INTO t VALUES (1)", "INSERT INTO t VALUES (2)"]
        );
        assert_eq!(driver.opened(), 1);
        assert_eq!(driver.closed(), 1);
        assert_eq!(recorder.shutdowns(), 1);
    }

    #[tokio::test]
    async fn empty() {
        let (driver, recorder, database) = setup(1);
        let values = database
            .all_of(Vec::<Arc<dyn DatabaseAction<MockDriver, Table>>>::new())
            .query()
            .await
            .unwrap();
        assert!(values.is_empty());
        assert_eq!(driver.closed(), driver.opened());
        assert_eq!(recorder.created(), recorder.shutdowns());
    }

    #[tokio::test]
    async fn child_failure() {
        let (driver, recorder, database) = setup(1);
        driver.fails("SELECT broken", "syntax error");
        let result = silent_logs! {
            database
                .all_of([
                    value(&database, "SELECT 1"),
                    value(&database, "SELECT broken"),
                    value(&database, "SELECT 3"),
                ])
                .query()
                .await
        };
        let error = result.unwrap_err();
        assert!(matches!(
            error_kind(&error),
            Some(DatabaseError::Execution(..))
        ));
        let message = format!("{error:#}");
        assert!(message.contains("child action 1"), "{message}");
        assert!(message.contains("syntax error"), "{message}");
        // The other children still ran before the failure was reported
        assert_eq!(driver.statements().len(), 3);
        assert_eq!(driver.opened(), 1);
        assert_eq!(driver.closed(), 1);
        assert_eq!(recorder.shutdowns(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn first_failure_in_input_order() {
        let (driver, recorder, database) = setup(4);
        driver
            .fails("SELECT first", "first failure")
            .delays("SELECT first", Duration::from_millis(100));
        driver.fails("SELECT second", "second failure");
        let result = silent_logs! {
            database
                .all_of([
                    database.all_of([value(&database, "SELECT first")]).shared(),
                    database.all_of([value(&database, "SELECT second")]).shared(),
                ])
                .query()
                .await
        };
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("first failure"), "{message}");
        assert!(!message.contains("second failure"), "{message}");
        assert_eq!(driver.opened(), 3);
        assert_eq!(driver.closed(), 3);
        assert_eq!(recorder.shutdowns(), 3);
    }

    #[tokio::test]
    async fn connection_failure() {
        let (driver, recorder, database) = setup(1);
        driver.fail_connect(true);
        let result = silent_logs! {
            database
                .all_of([value(&database, "SELECT 1")])
                .query()
                .await
        };
        assert!(matches!(
            result.as_ref().map_err(error_kind),
            Err(Some(DatabaseError::Connection(..)))
        ));
        assert!(driver.statements().is_empty());
        assert_eq!(recorder.created(), 1);
        assert_eq!(recorder.shutdowns(), 1);
        assert_eq!(recorder.tasks(), 0);
    }

    #[tokio::test]
    async fn panicking_child() {
        let (driver, recorder, database) = setup(1);
        let result = silent_logs! {
            database
                .all_of([
                    value(&database, "SELECT 1"),
                    database
                        .action_mapped("SELECT 2", |_: Table| -> dbwrap::Result<Option<String>> {
                            panic!("Mapper failure")
                        })
                        .shared(),
                ])
                .query()
                .await
        };
        assert!(matches!(
            result.as_ref().map_err(error_kind),
            Err(Some(DatabaseError::Abandoned))
        ));
        assert_eq!(driver.closed(), 1);
        assert_eq!(recorder.shutdowns(), 1);
    }

    #[tokio::test]
    async fn panicking_mapper() {
        let (driver, recorder, database) = setup(1);
        let result = database
            .all_of_mapped([value(&database, "SELECT 1")], |_: Option<String>| -> i32 {
                panic!("Mapper failure")
            })
            .query()
            .await;
        assert!(matches!(
            result.as_ref().map_err(error_kind),
            Err(Some(DatabaseError::Abandoned))
        ));
        assert_eq!(driver.opened(), 1);
        assert_eq!(driver.closed(), 1);
        assert_eq!(recorder.shutdowns(), 1);
    }

    #[tokio::test]
    async fn with_executor() {
        let (driver, _recorder, database) = setup(1);
        let composite = database.all_of([value(&database, "SELECT 1")]);
        let pool: Arc<WorkerPool> = Arc::new(WorkerPool::new(2).unwrap());
        let original = composite.executor().clone();
        let rebased = composite.with_executor(pool.clone());
        assert!(Arc::ptr_eq(composite.executor(), &original));
        assert!(!Arc::ptr_eq(rebased.executor(), &original));
        assert_eq!(rebased.query().await.unwrap(), [None::<String>]);
        assert_eq!(composite.query().await.unwrap(), [None::<String>]);
        assert_eq!(driver.opened(), 2);
        assert!(rebased.as_single().is_none());
    }

    #[tokio::test]
    async fn leaves_of_other_databases() {
        let (driver, recorder, database) = setup(2);
        let other_driver = MockDriver::new();
        let other = other_driver.database().unwrap();
        driver.returns("SELECT v FROM t", cell("from_main"));
        other_driver.returns("SELECT v FROM t", cell("from_other"));
        let values = database
            .all_of([
                value(&other, "SELECT v FROM t"),
                value(&database, "SELECT v FROM t"),
            ])
            .query()
            .await
            .unwrap();
        assert_eq!(
            values,
            [Some("from_other".to_string()), Some("from_main".to_string())]
        );
        assert_eq!(driver.statements(), ["SELECT v FROM t"]);
        assert_eq!(other_driver.statements(), ["SELECT v FROM t"]);
        assert_eq!(driver.opened(), 1);
        assert_eq!(other_driver.opened(), 1);
        assert_eq!(other_driver.closed(), 1);
        assert_eq!(recorder.tasks(), 2);

        // Same driver and credentials, but configured separately
        let separate = driver.database().unwrap();
        let values = database
            .all_of([value(&separate, "SELECT v FROM t")])
            .query()
            .await
            .unwrap();
        assert_eq!(values, [Some("from_main".to_string())]);
        assert_eq!(driver.opened(), 3);
        assert_eq!(driver.closed(), 3);
    }
}
