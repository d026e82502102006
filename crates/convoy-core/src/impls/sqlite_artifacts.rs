//! SqliteArtifactRepository - SQLite 実装の artifact ストア（本番用）
//!
//! # 設計原則
//! - 一意性は UNIQUE / PRIMARY KEY 制約が保証する
//! - `INSERT ... ON CONFLICT (...) DO NOTHING` の影響行数で「作成 / 既存」を判定
//! - 書き込みは IMMEDIATE トランザクション 1 つで完結
//! - rusqlite は同期 API なので spawn_blocking で実行し、全体を operation timeout で囲む
//!
//! 同じ DB ファイルを複数のリポジトリ（複数プロセス）が開いても、
//! 排他は SQLite のロックと制約に任せます。

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, TransactionBehavior, params};
use tracing::{debug, info, warn};

use crate::config::{RegistryConfig, SchemaNames};
use crate::domain::{
    ArtifactError, ArtifactType, ArtifactUid, DeliveryArtifact, DeliveryArtifactVersion,
    InfrastructureError, Provenance, RegisteredArtifact, VersionOrdering,
};
use crate::ports::{ArtifactRegistry, ArtifactVersionStore, IdGenerator};

impl From<rusqlite::Error> for InfrastructureError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                Self::Contended(err.to_string())
            }
            _ => Self::Storage(Box::new(err)),
        }
    }
}

impl From<rusqlite::Error> for ArtifactError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Infrastructure(err.into())
    }
}

/// SQL rendered once from the configured table/column names.
struct Statements {
    create_schema: String,
    insert_artifact: String,
    select_artifact_uid: String,
    insert_version: String,
    select_versions: String,
}

impl Statements {
    fn new(names: &SchemaNames) -> Self {
        // names are validated identifiers; quoting keeps words like `type` safe
        let q = |ident: &str| format!("\"{ident}\"");
        let artifact = q(&names.artifact_table);
        let version_table = q(&names.version_table);
        let uid = q(&names.uid_column);
        let artifact_uid = q(&names.artifact_uid_column);
        let name = q(&names.name_column);
        let ty = q(&names.type_column);
        let version = q(&names.version_column);
        let provenance = q(&names.provenance_column);

        Self {
            create_schema: format!(
                "CREATE TABLE IF NOT EXISTS {artifact} (
                    {uid} TEXT PRIMARY KEY NOT NULL,
                    {name} TEXT NOT NULL,
                    {ty} TEXT NOT NULL,
                    UNIQUE ({name}, {ty})
                );
                CREATE TABLE IF NOT EXISTS {version_table} (
                    {artifact_uid} TEXT NOT NULL REFERENCES {artifact} ({uid}),
                    {version} TEXT NOT NULL,
                    {provenance} TEXT NOT NULL,
                    PRIMARY KEY ({artifact_uid}, {version})
                );"
            ),
            insert_artifact: format!(
                "INSERT INTO {artifact} ({uid}, {name}, {ty}) VALUES (?1, ?2, ?3)
                 ON CONFLICT ({name}, {ty}) DO NOTHING"
            ),
            select_artifact_uid: format!(
                "SELECT {uid} FROM {artifact} WHERE {name} = ?1 AND {ty} = ?2"
            ),
            insert_version: format!(
                "INSERT INTO {version_table} ({artifact_uid}, {version}, {provenance}) VALUES (?1, ?2, ?3)
                 ON CONFLICT ({artifact_uid}, {version}) DO NOTHING"
            ),
            select_versions: format!(
                "SELECT {version}, {provenance} FROM {version_table} WHERE {artifact_uid} = ?1"
            ),
        }
    }

    fn lookup_uid(
        &self,
        conn: &Connection,
        name: &str,
        artifact_type: ArtifactType,
    ) -> rusqlite::Result<Option<String>> {
        conn.query_row(
            &self.select_artifact_uid,
            params![name, artifact_type.as_str()],
            |row| row.get(0),
        )
        .optional()
    }
}

/// Artifact registry and version store over a SQLite database.
#[derive(Clone)]
pub struct SqliteArtifactRepository {
    conn: Arc<Mutex<Connection>>,
    sql: Arc<Statements>,
    ids: Arc<dyn IdGenerator>,
    ordering: VersionOrdering,
    operation_timeout: Duration,
}

impl SqliteArtifactRepository {
    /// Opens the database named by `config.database.path` (in-memory when
    /// unset) and creates the registry tables if they are missing.
    pub fn open(
        config: &RegistryConfig,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, InfrastructureError> {
        let busy_timeout = config.database.busy_timeout();
        let conn = match &config.database.path {
            Some(path) => Self::open_file(path, busy_timeout)?,
            None => {
                let conn = Connection::open_in_memory()?;
                conn.busy_timeout(busy_timeout)?;
                conn
            }
        };
        conn.pragma_update(None, "foreign_keys", true)?;

        let sql = Statements::new(&config.schema);
        conn.execute_batch(&sql.create_schema)?;

        info!(
            path = ?config.database.path,
            artifact_table = %config.schema.artifact_table,
            version_table = %config.schema.version_table,
            "opened artifact registry"
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            sql: Arc::new(sql),
            ids,
            ordering: config.versions.ordering,
            operation_timeout: config.database.operation_timeout(),
        })
    }

    fn open_file(path: &Path, busy_timeout: Duration) -> Result<Connection, InfrastructureError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        // WAL への切り替え自体がロックを取るので、先に busy_timeout を効かせる
        conn.busy_timeout(busy_timeout)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(?path, journal_mode = %mode, "opened sqlite database");
        Ok(conn)
    }

    /// Runs `op` on a blocking thread with exclusive use of the connection.
    ///
    /// The operation timeout covers waiting for the connection as well as the
    /// statement itself. On timeout the blocking thread is not interrupted.
    async fn with_connection<T, F>(&self, op: F) -> Result<T, ArtifactError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &Statements) -> Result<T, ArtifactError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let sql = Arc::clone(&self.sql);
        let task = tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| InfrastructureError::LockPoisoned)?;
            op(&mut guard, &sql)
        });

        match tokio::time::timeout(self.operation_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(InfrastructureError::TaskJoin(join.to_string()).into()),
            Err(_) => {
                warn!(timeout = ?self.operation_timeout, "artifact store operation timed out");
                Err(InfrastructureError::Timeout(self.operation_timeout).into())
            }
        }
    }
}

#[async_trait]
impl ArtifactRegistry for SqliteArtifactRepository {
    async fn register(&self, artifact: &DeliveryArtifact) -> Result<ArtifactUid, ArtifactError> {
        let uid = self.ids.generate_artifact_uid();
        let candidate = artifact.clone();

        let uid = self
            .with_connection(move |conn, sql| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let inserted = tx.execute(
                    &sql.insert_artifact,
                    params![
                        uid.to_storage_key(),
                        candidate.name(),
                        candidate.artifact_type().as_str()
                    ],
                )?;
                if inserted == 0 {
                    return Err(ArtifactError::AlreadyRegistered(candidate));
                }
                tx.commit()?;
                Ok(uid)
            })
            .await?;

        debug!(%artifact, %uid, "registered artifact");
        Ok(uid)
    }

    async fn is_registered(
        &self,
        name: &str,
        artifact_type: ArtifactType,
    ) -> Result<bool, ArtifactError> {
        let name = name.to_string();
        self.with_connection(move |conn, sql| {
            Ok(sql.lookup_uid(conn, &name, artifact_type)?.is_some())
        })
        .await
    }

    async fn get(
        &self,
        name: &str,
        artifact_type: ArtifactType,
    ) -> Result<Option<RegisteredArtifact>, ArtifactError> {
        let name = name.to_string();
        self.with_connection(move |conn, sql| {
            let Some(raw_uid) = sql.lookup_uid(conn, &name, artifact_type)? else {
                return Ok(None);
            };
            let uid: ArtifactUid = raw_uid
                .parse()
                .map_err(|e| InfrastructureError::CorruptRow(format!("{e}")))?;
            let artifact = DeliveryArtifact::new(name, artifact_type)
                .map_err(|e| InfrastructureError::CorruptRow(format!("{e}")))?;
            Ok(Some(RegisteredArtifact { uid, artifact }))
        })
        .await
    }
}

#[async_trait]
impl ArtifactVersionStore for SqliteArtifactRepository {
    async fn store(&self, version: &DeliveryArtifactVersion) -> Result<bool, ArtifactError> {
        let candidate = version.clone();

        let created = self
            .with_connection(move |conn, sql| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let artifact = &candidate.artifact;
                let Some(uid) = sql.lookup_uid(&tx, artifact.name(), artifact.artifact_type())?
                else {
                    return Err(ArtifactError::NoSuchArtifact(candidate.artifact));
                };
                let inserted = tx.execute(
                    &sql.insert_version,
                    params![uid, candidate.version, candidate.provenance.as_str()],
                )?;
                tx.commit()?;
                Ok(inserted == 1)
            })
            .await?;

        debug!(
            artifact = %version.artifact,
            version = %version.version,
            created,
            "stored artifact version"
        );
        Ok(created)
    }

    async fn versions(
        &self,
        artifact: &DeliveryArtifact,
    ) -> Result<Vec<DeliveryArtifactVersion>, ArtifactError> {
        let artifact = artifact.clone();

        let mut versions = self
            .with_connection(move |conn, sql| {
                // one read transaction so the existence check and the listing agree
                let tx = conn.transaction()?;
                let Some(uid) = sql.lookup_uid(&tx, artifact.name(), artifact.artifact_type())?
                else {
                    return Err(ArtifactError::NoSuchArtifact(artifact));
                };

                let mut stmt = tx.prepare(&sql.select_versions)?;
                let rows = stmt.query_map(params![uid], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?;

                let mut versions = Vec::new();
                for row in rows {
                    let (label, provenance) = row?;
                    let provenance = Provenance::parse(provenance)
                        .map_err(|e| InfrastructureError::CorruptRow(format!("{e}")))?;
                    versions.push(DeliveryArtifactVersion::new(
                        artifact.clone(),
                        label,
                        provenance,
                    ));
                }
                Ok(versions)
            })
            .await?;

        self.ordering.sort_descending(&mut versions);
        Ok(versions)
    }
}
