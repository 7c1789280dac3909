#[cfg(test)]
mod tests {
    use dbwrap_core::{
        ConfigAuthenticator, Connection, Credentials, Database, DatabaseError, Driver, Query,
        error_kind,
    };
    use dbwrap_sqlite::SqliteDriver;
    use dbwrap_tests::{init_logs, silent_logs};
    use std::{fs, time::Duration};

    #[tokio::test]
    async fn create_database() {
        init_logs();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creation.sqlite");
        let driver = SqliteDriver::new();
        let url = |mode: &str| Credentials::from_url(format!("sqlite://{}?mode={}", path.display(), mode));
        let mut connection = driver
            .connect(&url("rwc"))
            .await
            .expect("Could not create the database");
        assert!(path.exists(), "Database file should be created after connection");
        connection.close().await.unwrap();
        let mut connection = driver
            .connect(&url("ro"))
            .await
            .expect("Could not open the database read only");
        let result = silent_logs! {
            connection.execute("CREATE TABLE t (id INTEGER)").await
        };
        assert!(result.is_err(), "Read only database should reject writes");
        connection.close().await.unwrap();
        fs::remove_file(&path).unwrap();
        let result = silent_logs! { driver.connect(&url("ro")).await };
        let Err(error) = result else {
            panic!("Should not be able to open in read only a missing database");
        };
        assert!(matches!(
            error_kind(&error),
            Some(DatabaseError::Connection(..))
        ));
    }

    #[tokio::test]
    async fn wrong_url() {
        let result = silent_logs! {
            SqliteDriver::new()
                .connect(&Credentials::from_url("duckdb://some_value"))
                .await
        };
        assert!(result.is_err(), "Should not accept a url of another driver");
        let result = silent_logs! {
            Database::new(SqliteDriver::new(), Credentials::from_url("duckdb://some_value"))
        };
        assert!(matches!(
            result.as_ref().map_err(error_kind),
            Err(Some(DatabaseError::Configuration(..)))
        ));
    }

    #[tokio::test]
    async fn memory() {
        let mut connection = SqliteDriver::new()
            .with_busy_timeout(Duration::from_millis(100))
            .connect(&Credentials::from_url("sqlite://:memory:"))
            .await
            .expect("Could not open an in memory database");
        let table = connection
            .query_statement(&Query::new("SELECT ? AS a, ? AS b, ? AS c").bind(7).bind("x").bind(None::<i32>))
            .await
            .unwrap();
        assert_eq!(table.attributes(), ["a", "b", "c"]);
        assert_eq!(table[0].values(), [Some("7".to_string()), Some("x".to_string()), None]);
        let table = connection
            .query("SELECT 1 AS one; SELECT 2 AS two; -- trailing comment")
            .await
            .unwrap();
        assert_eq!(table.attributes(), ["two"]);
        let result = silent_logs! {
            connection
                .query_statement(&Query::new("SELECT ?"))
                .await
        };
        assert!(matches!(
            result.as_ref().map_err(error_kind),
            Err(Some(DatabaseError::Execution(..)))
        ));
        let result = silent_logs! {
            connection.query("SELECT 1 AS id, 2 AS id").await
        };
        let error = result.unwrap_err();
        assert!(matches!(
            error_kind(&error),
            Some(DatabaseError::Execution(..))
        ));
        assert!(format!("{error:#}").contains("alias"));
        let table = connection
            .query("SELECT 1 AS first_id, 2 AS second_id")
            .await
            .unwrap();
        assert_eq!(table.attributes(), ["first_id", "second_id"]);
        connection.close().await.unwrap();
        assert!(connection.is_closed());
        let result = silent_logs! { connection.query("SELECT 1").await };
        assert!(result.is_err(), "A closed connection must not run statements");
        assert!(silent_logs! { connection.close().await }.is_err());
    }

    #[tokio::test]
    async fn authenticate() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.cfg");
        fs::write(
            &config,
            format!(
                "host=sqlite://{}\ndriver=sqlite\n",
                dir.path().join("auth.sqlite").display()
            ),
        )
        .unwrap();
        let database = Database::authenticate(SqliteDriver::new(), &ConfigAuthenticator::new(&config))
            .await
            .expect("Could not authenticate");
        assert!(database.url().starts_with("sqlite://"));
        assert!(dir.path().join("auth.sqlite").exists());

        fs::write(&config, "driver=sqlite\n").unwrap();
        let result = silent_logs! {
            Database::authenticate(SqliteDriver::new(), &ConfigAuthenticator::new(&config)).await
        };
        let Err(error) = result else {
            panic!("A configuration without url must be rejected");
        };
        assert!(format!("{error:#}").contains("url cannot be null"));
    }
}
