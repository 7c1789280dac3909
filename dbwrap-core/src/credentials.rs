use crate::{Context, DatabaseError, Result};
use config::{Config, Environment, File, FileFormat, Source};
use serde::Deserialize;
use std::{
    fmt::{self, Debug, Display},
    path::{Path, PathBuf},
};

/// What is needed to open a connection.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<String>,
    /// Name of the driver these credentials are meant for, see [`crate::Driver::NAME`].
    pub driver: Option<String>,
}

impl Credentials {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }
    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("url", &self.url)
            .field("driver", &self.driver)
            .finish()
    }
}

/// A source of [`Credentials`].
pub trait Authenticator {
    fn credentials(&self) -> Result<Credentials>;
}

impl Authenticator for Credentials {
    fn credentials(&self) -> Result<Credentials> {
        Ok(self.clone())
    }
}

#[derive(Deserialize)]
struct Properties {
    username: Option<String>,
    password: Option<String>,
    #[serde(alias = "host")]
    url: Option<String>,
    driver: Option<String>,
}

impl From<Properties> for Credentials {
    fn from(value: Properties) -> Self {
        Self {
            username: value.username,
            password: value.password,
            url: value.url,
            driver: value.driver,
        }
    }
}

fn load<S>(source: S, origin: impl Display) -> Result<Credentials>
where
    S: Source + Send + Sync + 'static,
{
    Config::builder()
        .add_source(source)
        .build()
        .and_then(|config| config.try_deserialize::<Properties>())
        .map(Credentials::from)
        .map_err(|e| {
            DatabaseError::Configuration(format!(
                "Cannot read the credentials from {}: {}",
                origin, e
            ))
        })
        .context("While loading the database credentials")
}

/// Reads credentials from an ini style properties file.
///
/// Recognized keys are `username`, `password`, `host` (the connection url) and `driver`.
/// ```text
/// # comment
/// username=admin
/// password: secret
/// host = sqlite://data.db
/// driver=sqlite
/// ```
#[derive(Debug, Clone)]
pub struct ConfigAuthenticator {
    path: PathBuf,
}

impl ConfigAuthenticator {
    pub const DEFAULT_FILE: &'static str = "config.cfg";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses the content of a properties file.
    pub fn parse(content: &str) -> Result<Credentials> {
        load(File::from_str(content, FileFormat::Ini), "the given properties")
    }
}

impl Default for ConfigAuthenticator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FILE)
    }
}

impl Authenticator for ConfigAuthenticator {
    fn credentials(&self) -> Result<Credentials> {
        load(
            File::from(self.path.as_path()).format(FileFormat::Ini),
            format_args!("`{}`", self.path.display()),
        )
    }
}

/// Reads credentials from `<PREFIX>_USERNAME`, `<PREFIX>_PASSWORD`, `<PREFIX>_URL` and
/// `<PREFIX>_DRIVER`.
#[derive(Debug, Clone)]
pub struct EnvAuthenticator {
    prefix: String,
}

impl EnvAuthenticator {
    pub const DEFAULT_PREFIX: &'static str = "DBWRAP";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for EnvAuthenticator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl Authenticator for EnvAuthenticator {
    fn credentials(&self) -> Result<Credentials> {
        load(
            Environment::with_prefix(&self.prefix),
            format_args!("the `{}_*` environment variables", self.prefix),
        )
    }
}
