#[cfg(test)]
mod tests {
    use dbwrap_core::{
        Authenticator, ConfigAuthenticator, Credentials, DatabaseError, EnvAuthenticator,
        error_kind,
    };
    use indoc::indoc;
    use std::io::Write;

    #[test]
    fn config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Could not create the config file");
        file.write_all(
            indoc! {"
                # database
                username = admin
                password: s3cr=t
                host=sqlite://data.db
                driver=sqlite
                unknown=1
            "}
            .as_bytes(),
        )
        .unwrap();
        let credentials = ConfigAuthenticator::new(file.path()).credentials().unwrap();
        assert_eq!(
            credentials,
            Credentials::from_url("sqlite://data.db")
                .with_user("admin", "s3cr=t")
                .with_driver("sqlite")
        );
        assert!(!format!("{:?}", credentials).contains("s3cr=t"));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let error = ConfigAuthenticator::new(dir.path().join("config.cfg"))
            .credentials()
            .unwrap_err();
        assert!(matches!(
            error_kind(&error),
            Some(DatabaseError::Configuration(..))
        ));
        assert_eq!(
            ConfigAuthenticator::default().path().to_str(),
            Some(ConfigAuthenticator::DEFAULT_FILE)
        );
    }

    #[test]
    fn partial_file() {
        let credentials = ConfigAuthenticator::parse("username=a\n").unwrap();
        assert_eq!(credentials.username.as_deref(), Some("a"));
        assert_eq!(credentials.url, None);
        assert_eq!(credentials.driver, None);
        let credentials = ConfigAuthenticator::parse("; empty\n").unwrap();
        assert_eq!(credentials, Credentials::default());
    }

    #[test]
    fn url_key() {
        let credentials = ConfigAuthenticator::parse(indoc! {"
            url = sqlite://a=b.db
            driver: sqlite
        "})
        .unwrap();
        assert_eq!(credentials.url.as_deref(), Some("sqlite://a=b.db"));
        assert_eq!(credentials.driver.as_deref(), Some("sqlite"));
    }

    #[test]
    fn environment() {
        let prefix = "DBWRAP_CREDENTIALS_TEST";
        // SAFETY: the variables are unique to this test
        unsafe {
            std::env::set_var(format!("{prefix}_URL"), "mock://env");
            std::env::set_var(format!("{prefix}_USERNAME"), "user");
        }
        let credentials = EnvAuthenticator::new(prefix).credentials().unwrap();
        assert_eq!(credentials.url.as_deref(), Some("mock://env"));
        assert_eq!(credentials.username.as_deref(), Some("user"));
        assert_eq!(credentials.password, None);
    }
}
