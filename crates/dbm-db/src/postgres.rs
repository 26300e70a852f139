//! PostgreSQL backend: connections, the migration worker, and its
//! database-level operations.

use async_trait::async_trait;
use tokio_postgres::config::Host;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Config, NoTls};

use dbm_core::{
    MigrationScript, ScriptParam, ScriptParams, Version, PARAM_APP_NAME, PARAM_APP_VERSION,
    PARAM_DB_COLLATION, PARAM_DB_NAME, PARAM_DB_SERVER, PARAM_DB_TABLESPACE, PARAM_DB_VERSION,
};

use crate::error::{DbError, DbResult};
use crate::executor::{DbConnection, DbExecutor};
use crate::sql::{quote_ident, quote_literal};
use crate::versioning::VersionManager;
use crate::worker::{run_scripts, MigrationReport};

/// Database connected to when creating or dropping another database.
const MAINTENANCE_DATABASE: &str = "postgres";

/// Rewrite `:name` bind markers to positional `$n` parameters.
///
/// Markers are processed longest-first so `:Db` never clobbers
/// `:DbVersion`; parameters whose marker does not occur in the statement
/// are dropped, since the driver rejects unreferenced binds. Returns the
/// rewritten SQL and the values in positional order.
fn expand_bind_markers<'a>(statement: &str, params: &'a [ScriptParam]) -> (String, Vec<&'a str>) {
    let mut ordered: Vec<&ScriptParam> = params.iter().collect();
    ordered.sort_by_key(|p| std::cmp::Reverse(p.bind_name().len()));

    let mut sql = statement.to_string();
    let mut values = Vec::with_capacity(params.len());
    for param in ordered {
        if !sql.contains(param.bind_name()) {
            continue;
        }
        values.push(param.value());
        sql = sql.replace(param.bind_name(), &format!("${}", values.len()));
    }
    (sql, values)
}

fn to_sql_refs<'a>(values: &'a [&'a str]) -> Vec<&'a (dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

/// One open connection, owned by the engine for the duration of a run.
///
/// Transaction control uses explicit `BEGIN`/`COMMIT`/`ROLLBACK` statements
/// so the client and its transaction state live in one place.
pub struct PgConnection {
    client: Client,
    in_transaction: bool,
}

impl PgConnection {
    pub async fn connect(config: &Config) -> DbResult<Self> {
        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        // The connection task drives the socket until the client drops.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("Database connection error: {e}");
            }
        });

        Ok(Self {
            client,
            in_transaction: false,
        })
    }

    /// Whether a database of the given name exists on the server.
    pub async fn database_exists(&self, name: &str) -> DbResult<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)",
                &[&name],
            )
            .await?;
        Ok(row.get(0))
    }
}

#[async_trait]
impl DbExecutor for PgConnection {
    async fn execute(&self, statement: &str, params: &[ScriptParam]) -> DbResult<u64> {
        if params.is_empty() {
            // The simple protocol accepts multi-statement batches and
            // utility commands; no row count is reported.
            self.client.batch_execute(statement).await?;
            Ok(0)
        } else {
            let (sql, values) = expand_bind_markers(statement, params);
            let refs = to_sql_refs(&values);
            Ok(self.client.execute(&sql, &refs).await?)
        }
    }

    async fn query_scalar(
        &self,
        statement: &str,
        params: &[ScriptParam],
    ) -> DbResult<Option<String>> {
        let (sql, values) = expand_bind_markers(statement, params);
        let refs = to_sql_refs(&values);
        match self.client.query_opt(&sql, &refs).await? {
            Some(row) => Ok(row.try_get::<_, Option<String>>(0)?),
            None => Ok(None),
        }
    }

    async fn table_exists(&self, table: &str) -> DbResult<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = $1)",
                &[&table],
            )
            .await?;
        Ok(row.get(0))
    }
}

#[async_trait]
impl DbConnection for PgConnection {
    async fn begin(&mut self) -> DbResult<()> {
        self.client.batch_execute("BEGIN").await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        if self.in_transaction {
            self.client.batch_execute("COMMIT").await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> DbResult<()> {
        if self.in_transaction {
            self.client.batch_execute("ROLLBACK").await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}

/// Migration worker bound to one PostgreSQL server.
///
/// Owns the connection configuration and opens one connection per
/// operation; scripts within a run share that single connection.
#[derive(Debug)]
pub struct PgWorker {
    config: Config,
}

impl PgWorker {
    /// Build a worker from a connection string, either key/value
    /// (`host=... user=...`) or URL (`postgres://...`) form.
    pub fn from_connection_string(text: &str) -> DbResult<Self> {
        let config: Config = text
            .parse()
            .map_err(|e: tokio_postgres::Error| DbError::Connection(e.to_string()))?;
        Ok(Self { config })
    }

    /// Build a worker from split connection fields. Empty credentials mean
    /// trusted authentication: no password is sent and the user falls back
    /// to `postgres`.
    pub fn new(server: &str, database: Option<&str>, user: &str, password: &str) -> Self {
        let mut config = Config::new();
        config.host(server);
        if user.is_empty() {
            config.user("postgres");
        } else {
            config.user(user);
        }
        if !user.is_empty() && !password.is_empty() {
            config.password(password);
        }
        if let Some(database) = database {
            if !database.is_empty() {
                config.dbname(database);
            }
        }
        Self { config }
    }

    /// Target database name, when configured.
    pub fn database(&self) -> Option<&str> {
        self.config.get_dbname()
    }

    /// Target server host.
    pub fn server(&self) -> String {
        match self.config.get_hosts().first() {
            Some(Host::Tcp(host)) => host.clone(),
            #[cfg(unix)]
            Some(Host::Unix(path)) => path.display().to_string(),
            _ => "localhost".to_string(),
        }
    }

    /// Re-target the worker at another database on the same server.
    pub fn set_database(&mut self, name: &str) {
        self.config.dbname(name);
    }

    async fn connect(&self) -> DbResult<PgConnection> {
        PgConnection::connect(&self.config).await
    }

    /// Connect to the maintenance database instead of the target one, for
    /// operations on databases themselves.
    async fn connect_maintenance(&self) -> DbResult<PgConnection> {
        let mut config = self.config.clone();
        config.dbname(MAINTENANCE_DATABASE);
        PgConnection::connect(&config).await
    }

    /// Caller parameters plus the engine-injected identity parameters.
    /// Callers come first so their values win under first-match lookup.
    fn merged_params(&self, args: &ScriptParams) -> ScriptParams {
        let mut params = args.clone();
        params.push(PARAM_APP_NAME, "dbmigrate");
        params.push(PARAM_APP_VERSION, env!("CARGO_PKG_VERSION"));
        params.push(PARAM_DB_SERVER, quote_ident(&self.server()));
        if let Some(database) = self.database() {
            params.push(PARAM_DB_NAME, quote_ident(database));
        }
        params
    }

    /// Execute an ordered script batch against the target database.
    ///
    /// Statement failures stop the run and are reported through the
    /// [`MigrationReport`]; only connection establishment fails hard.
    pub async fn execute_scripts(
        &self,
        scripts: &mut [MigrationScript],
        args: &ScriptParams,
        manager: Option<&dyn VersionManager>,
    ) -> DbResult<MigrationReport> {
        let params = self.merged_params(args);
        let mut conn = self.connect().await?;
        Ok(run_scripts(&mut conn, scripts, &params, manager).await)
    }

    /// Create a database if it does not exist and re-target the worker at
    /// it. The name comes from `name` or the `DbName` parameter; optional
    /// `DbCollation`/`DbTablespace` parameters shape the creation
    /// statement, and `DbVersion` (default `0.0`) seeds the version
    /// manager.
    ///
    /// Reports the outcome as a boolean; the cause of a failure is logged.
    pub async fn create_database(
        &mut self,
        name: Option<&str>,
        args: &ScriptParams,
        manager: Option<&dyn VersionManager>,
    ) -> bool {
        let resolved = name
            .map(str::to_string)
            .or_else(|| args.value_of(PARAM_DB_NAME).map(str::to_string));
        let Some(database) = resolved else {
            log::error!("Create database: no name given and no {PARAM_DB_NAME} parameter");
            return false;
        };

        match self.create_database_inner(&database, args, manager).await {
            Ok(()) => {
                log::info!("Created database {database} ... [OK]");
                true
            }
            Err(e) => {
                log::error!("Created database {database} ... [FAILED]: {e}");
                false
            }
        }
    }

    async fn create_database_inner(
        &mut self,
        database: &str,
        args: &ScriptParams,
        manager: Option<&dyn VersionManager>,
    ) -> DbResult<()> {
        let version_text = args.value_or(PARAM_DB_VERSION, "0.0").to_string();
        let version = Version::parse(&version_text)?;

        let mut run_args = args.clone();
        run_args.push(PARAM_DB_NAME, database);
        run_args.push(PARAM_DB_VERSION, version_text);

        let mut conn = self.connect_maintenance().await?;
        if !conn.database_exists(database).await? {
            let mut statement = format!("CREATE DATABASE {}", quote_ident(database));
            if let Some(collation) = args.value_of(PARAM_DB_COLLATION) {
                statement.push_str(&format!(
                    " LC_COLLATE {} LC_CTYPE {} TEMPLATE template0",
                    quote_literal(collation),
                    quote_literal(collation)
                ));
            }
            if let Some(tablespace) = args.value_of(PARAM_DB_TABLESPACE) {
                statement.push_str(&format!(" TABLESPACE {}", quote_ident(tablespace)));
            }

            // Routed through the engine so the CREATE DATABASE rule keeps
            // the pseudo-script outside a transaction.
            let mut script =
                MigrationScript::from_statements(version, "Database Creation", vec![statement]);
            let params = self.merged_params(&run_args);
            let report = run_scripts(
                &mut conn,
                std::slice::from_mut(&mut script),
                &params,
                None,
            )
            .await;
            if let Some(failure) = report.failure() {
                return Err(DbError::Execution(
                    failure.error.clone().unwrap_or_default(),
                ));
            }
        }

        // Switch context to the new database. The server cannot change
        // databases on an open connection, so versioning bootstrap runs
        // over a fresh connection to it.
        self.set_database(database);
        if let Some(manager) = manager {
            let conn = self.connect().await?;
            manager.update(&conn, None, 0, &run_args).await?;
        }
        Ok(())
    }

    /// Drop a database if it exists, optionally forcing other sessions off
    /// first. Reports the outcome as a boolean; the cause of a failure is
    /// logged.
    pub async fn drop_database(&self, database: &str, close_existing_connections: bool) -> bool {
        match self
            .drop_database_inner(database, close_existing_connections)
            .await
        {
            Ok(()) => {
                log::info!("Dropped database {database} ... [OK]");
                true
            }
            Err(e) => {
                log::error!("Dropped database {database} ... [FAILED]: {e}");
                false
            }
        }
    }

    async fn drop_database_inner(
        &self,
        database: &str,
        close_existing_connections: bool,
    ) -> DbResult<()> {
        let conn = self.connect_maintenance().await?;

        if close_existing_connections {
            let param = ScriptParam::new(PARAM_DB_NAME, database);
            let terminate = format!(
                "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
                 WHERE datname = {} AND pid <> pg_backend_pid()",
                param.bind_name()
            );
            conn.execute(&terminate, &[param]).await?;
        }

        conn.execute(
            &format!("DROP DATABASE IF EXISTS {}", quote_ident(database)),
            &[],
        )
        .await?;
        Ok(())
    }

    /// Read the tracked schema version through a version manager.
    pub async fn get_version(&self, manager: &dyn VersionManager) -> DbResult<Version> {
        let conn = self.connect().await?;
        let version = manager.get_version(&conn).await?;
        log::info!("Database version: {version}");
        Ok(version)
    }

    /// Record a schema version through a version manager, without a script.
    pub async fn set_version(&self, manager: &dyn VersionManager, version: &Version) -> DbResult<()> {
        let conn = self.connect().await?;
        let params = ScriptParams::new().with(PARAM_DB_VERSION, version.to_string());
        manager.update(&conn, None, 0, &params).await?;
        log::info!("Updated database version to: {version}");
        Ok(())
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
