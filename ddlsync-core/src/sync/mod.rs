//! Diff-based synchronization of generated scripts.
//!
//! [`SyncDriver::run`] opens the session, discovers the inventory and then
//! walks every object and fill entry in discovery order. Each unit ends in
//! exactly one terminal [`ObjectState`]. A failing unit is logged and counted
//! as `Error` while the run goes on; only connection and discovery failures
//! abort the run.

mod report;

pub use report::{KindTally, SyncReport, Tally, percent, stat_line, state_label, tally_line};

use crate::{DdlSyncError, Result};
use crate::adapters::create_driver;
use crate::config::{Config, DbConfig, FillFormat, PathContext, resolve};
use crate::ddl::{
    can_synthesize, describe_columns, needs_post_format, post_format, synthesize, with_description,
};
use crate::dialect::{DdlOptions, DdlTarget, SqlDialect};
use crate::discovery::discover;
use crate::executor::Executor;
use crate::files::{FileStore, LocalFiles};
use crate::fill::generate_fill;
use crate::models::{CatalogObject, FillKind, ObjectKind, ObjectState, Schema, TableFill};
use crate::stamp::make_stamp;
use std::path::Path;
use tracing::{debug, error, info};

/// Progress label of the database and schema scripts written before the walk.
const SCAFFOLD_PROGRESS: &str = "setup";

/// Runs one synchronization with the configured dialect and local files.
///
/// # Errors
/// Fails when the dialect's driver is not compiled in, the connection cannot
/// be opened, or discovery fails. Per-object failures are only reported.
pub async fn synchronize(config: &Config) -> Result<SyncReport> {
    let driver = create_driver(config.db.kind)?;
    let sync = SyncDriver::new(
        Executor::new(driver),
        Box::new(LocalFiles),
        config.db.clone(),
    );
    sync.run().await
}

/// Outcome of rewriting a file holding `existing` with `text`.
///
/// Content is compared after trimming surrounding whitespace; an absent or
/// empty file is created.
pub fn decide(existing: Option<&str>, text: &str) -> ObjectState {
    match existing {
        None => ObjectState::Insert,
        Some(current) if current.trim() == text.trim() => ObjectState::NoChange,
        Some(_) => ObjectState::Update,
    }
}

/// Drives one run over an executor and a file store.
pub struct SyncDriver {
    executor: Executor,
    files: Box<dyn FileStore>,
    db: DbConfig,
}

impl std::fmt::Debug for SyncDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncDriver")
            .field("executor", &self.executor)
            .field("dialect", &self.db.kind)
            .field("connection", &self.db.connection)
            .finish_non_exhaustive()
    }
}

impl SyncDriver {
    /// Creates a driver.
    pub fn new(executor: Executor, files: Box<dyn FileStore>, db: DbConfig) -> Self {
        Self {
            executor,
            files,
            db,
        }
    }

    /// Synchronizes every selected object and fill entry.
    ///
    /// The session is closed before returning, whatever the outcome.
    ///
    /// # Errors
    /// Fails when the connection cannot be opened or discovery fails.
    pub async fn run(&self) -> Result<SyncReport> {
        let sql = self.db.kind.sql();
        info!("connecting to {} \"{}\"", self.db.kind, self.db.connection);
        self.executor
            .open(
                self.db.connection.clone(),
                sql.init_script().map(str::to_string),
            )
            .await
            .map_err(|e| {
                error!("on open connection \"{}\": {}", self.db.connection, e);
                e
            })?;

        let result = self.run_opened(sql).await;
        self.executor.close().await;
        result
    }

    async fn run_opened(&self, sql: &dyn SqlDialect) -> Result<SyncReport> {
        let mut schemas = discover(&self.executor, &self.db).await.map_err(|e| {
            error!("on discover objects: {}", e);
            e
        })?;
        info!("found {} schema(s)", schemas.len());

        let options = DdlOptions::new(&self.db.connection.database, &self.db.objects);
        self.sync_scaffolding(sql, &schemas, &options).await;

        for schema in &mut schemas {
            self.settle_ignored(sql, schema);
            info!("objects in schema \"{}\"", schema.name);
            for line in self.inventory_lines(sql, schema) {
                info!("  {}", line);
            }
        }

        let total: usize = schemas
            .iter()
            .map(|s| {
                s.objects.iter().filter(|o| !o.state().is_terminal()).count()
                    + s.table_fills.iter().filter(|f| !f.state().is_terminal()).count()
            })
            .sum();
        let mut done = 0;

        for schema in &mut schemas {
            if schema.objects.is_empty() && schema.table_fills.is_empty() {
                continue;
            }
            debug!("start schema \"{}\"", schema.name);
            for idx in 0..schema.objects.len() {
                if schema.objects[idx].state().is_terminal() {
                    continue;
                }
                done += 1;
                let progress = percent(done, total);
                let state = {
                    let current: &Schema = schema;
                    self.sync_object(sql, &options, current, &current.objects[idx], &progress)
                        .await
                };
                schema.objects[idx].settle(state);
            }
            for idx in 0..schema.table_fills.len() {
                if schema.table_fills[idx].state().is_terminal() {
                    continue;
                }
                done += 1;
                let progress = percent(done, total);
                let state = {
                    let current: &Schema = schema;
                    self.sync_fill(sql, current, &current.table_fills[idx], &progress)
                        .await
                };
                schema.table_fills[idx].settle(state);
            }
            debug!("stop schema \"{}\"", schema.name);
        }

        let report = SyncReport::from_schemas(schemas);
        for row in &report.tallies {
            info!("stat for schema \"{}\": {}", row.schema, tally_line(row.label, &row.tally));
        }
        Ok(report)
    }

    /// Writes the database and per-schema scripts. Failures are logged only.
    async fn sync_scaffolding(&self, sql: &dyn SqlDialect, schemas: &[Schema], options: &DdlOptions) {
        let database = self.db.connection.database.as_str();
        if let Some(template) = self.db.objects.dir_for(ObjectKind::Database)
            && can_synthesize(sql, ObjectKind::Database)
        {
            if let Err(e) = self
                .sync_script(sql, options, ObjectKind::Database, template, database, database)
                .await
            {
                debug!("skip database script \"{}\": {}", database, e);
            }
        }
        if let Some(template) = self.db.objects.dir_for(ObjectKind::Schema)
            && can_synthesize(sql, ObjectKind::Schema)
        {
            for schema in schemas {
                if let Err(e) = self
                    .sync_script(sql, options, ObjectKind::Schema, template, &schema.name, &schema.name)
                    .await
                {
                    debug!("skip schema script \"{}\": {}", schema.name, e);
                }
            }
        }
    }

    async fn sync_script(
        &self,
        sql: &dyn SqlDialect,
        options: &DdlOptions,
        kind: ObjectKind,
        template: &str,
        schema: &str,
        name: &str,
    ) -> Result<ObjectState> {
        let ctx = PathContext {
            base: &self.db.connection.database,
            schema,
            parent: None,
            object: name,
        };
        let path = resolve(template, &ctx).map_err(|e| {
            error!("on resolve path of {} \"{}\": {}", kind, name, e);
            e
        })?;
        let existing = self.read_current(&path).await?;
        let target = DdlTarget {
            schema,
            name,
            parent: None,
        };
        let text = synthesize(&self.executor, sql, kind, &target, options)
            .await
            .map_err(|e| self.log_query_error(kind.as_str(), name, e))?;
        self.store(&path, existing.as_deref(), &text, SCAFFOLD_PROGRESS).await
    }

    /// Marks units that will not be written as `Ignore`.
    fn settle_ignored(&self, sql: &dyn SqlDialect, schema: &mut Schema) {
        let objects = &self.db.objects;
        for object in &mut schema.objects {
            if objects.dir_for(object.kind).is_none() || !can_synthesize(sql, object.kind) {
                object.settle(ObjectState::Ignore);
            }
        }
        for entry in &mut schema.table_fills {
            if !objects.fill_enabled(entry.fill) {
                entry.settle(ObjectState::Ignore);
            }
        }
    }

    fn inventory_lines(&self, sql: &dyn SqlDialect, schema: &Schema) -> Vec<String> {
        let objects = &self.db.objects;
        let mut lines: Vec<String> = ObjectKind::ALL
            .into_iter()
            .filter(|kind| !matches!(kind, ObjectKind::Database | ObjectKind::Schema))
            .filter(|kind| crate::config::supports_kind(self.db.kind, *kind))
            .map(|kind| {
                let ignored = objects.dir_for(kind).is_none() || !can_synthesize(sql, kind);
                stat_line(kind.as_str(), schema.count_of(kind), ignored)
            })
            .collect();
        for fill in [FillKind::Full, FillKind::Demo] {
            let count = schema.fill_count_of(fill);
            if count > 0 {
                lines.push(stat_line(fill.as_str(), count, !objects.fill_enabled(fill)));
            }
        }
        lines
    }

    async fn sync_object(
        &self,
        sql: &dyn SqlDialect,
        options: &DdlOptions,
        schema: &Schema,
        object: &CatalogObject,
        progress: &str,
    ) -> ObjectState {
        let Some(template) = self.db.objects.dir_for(object.kind) else {
            return ObjectState::Ignore;
        };
        let parent = schema.parent_of(object);
        let ctx = PathContext {
            base: &self.db.connection.database,
            schema: &schema.name,
            parent,
            object: &object.name,
        };
        let outcome = async {
            let path = resolve(template, &ctx).map_err(|e| {
                error!("on resolve path of {} \"{}\": {}", object.kind, object.name, e);
                e
            })?;
            let existing = self.read_current(&path).await?;
            let text = self
                .render_object(sql, options, &schema.name, object, parent)
                .await
                .map_err(|e| self.log_query_error(object.kind.as_str(), &object.name, e))?;
            let state = self.store(&path, existing.as_deref(), &text, progress).await?;
            Ok::<_, DdlSyncError>(state)
        };
        outcome.await.unwrap_or(ObjectState::Error)
    }

    async fn render_object(
        &self,
        sql: &dyn SqlDialect,
        options: &DdlOptions,
        schema: &str,
        object: &CatalogObject,
        parent: Option<&str>,
    ) -> Result<String> {
        let target = DdlTarget {
            schema,
            name: &object.name,
            parent,
        };
        let mut text = synthesize(&self.executor, sql, object.kind, &target, options).await?;
        if needs_post_format(object.kind) {
            text = post_format(&text).trim().to_string();
        }

        let mut description = None;
        if object.kind == ObjectKind::Table {
            let table = describe_columns(&self.executor, sql, schema, &object.name).await?;
            text = with_description(sql, &text, schema, &object.name, &table);
            description = Some(table);
        }

        let body = format!(
            "{}{}",
            sql.preamble(&self.db.connection.database, schema),
            text
        );
        if self.db.objects.stamp {
            let stamp = make_stamp(&object.name, description.as_ref())?;
            return Ok(format!("{stamp}\n{body}"));
        }
        Ok(body)
    }

    async fn sync_fill(
        &self,
        sql: &dyn SqlDialect,
        schema: &Schema,
        entry: &TableFill,
        progress: &str,
    ) -> ObjectState {
        let Some(template) = self.db.objects.fill_dir_for(entry.fill) else {
            return ObjectState::Ignore;
        };
        let database = self.db.connection.database.as_str();
        let ctx = PathContext {
            base: database,
            schema: &schema.name,
            parent: None,
            object: &entry.name,
        };
        let outcome = async {
            let path = resolve(template, &ctx).map_err(|e| {
                error!("on resolve path of {} \"{}\": {}", entry.fill.as_str(), entry.name, e);
                e
            })?;
            let existing = self.read_current(&path).await?;
            if entry.fill == FillKind::Demo
                && self.db.objects.table_fill_demo.ignore_exists
                && existing.is_some()
            {
                debug!("[{}] exists file with script \"{}\"", progress, path.display());
                return Ok(ObjectState::NoChange);
            }

            let mut text = generate_fill(&self.executor, sql, database, &schema.name, entry, &self.db.objects)
                .await
                .map_err(|e| self.log_query_error(entry.fill.as_str(), &entry.name, e))?;
            if self.db.objects.fill_format(entry.fill) == FillFormat::Sql {
                text = format!("{}{}", sql.preamble(database, &schema.name), text.trim());
            }
            let state = self.store(&path, existing.as_deref(), &text, progress).await?;
            Ok::<_, DdlSyncError>(state)
        };
        outcome.await.unwrap_or(ObjectState::Error)
    }

    async fn read_current(&self, path: &Path) -> Result<Option<String>> {
        self.files.read_text(path).await.map_err(|e| {
            error!("on read current file \"{}\": {}", path.display(), e);
            e
        })
    }

    /// Writes `text` unless the file already holds it.
    async fn store(
        &self,
        path: &Path,
        existing: Option<&str>,
        text: &str,
        progress: &str,
    ) -> Result<ObjectState> {
        let state = decide(existing, text);
        if state == ObjectState::NoChange {
            debug!("[{}] no changes for file \"{}\"", progress, path.display());
            return Ok(state);
        }
        self.files.write_text(path, text.trim()).await.map_err(|e| {
            error!("on write file \"{}\": {}", path.display(), e);
            e
        })?;
        info!("[{}] {} file \"{}\"", progress, state_label(state), path.display());
        Ok(state)
    }

    fn log_query_error(&self, kind: &str, name: &str, e: DdlSyncError) -> DdlSyncError {
        error!(
            "on exec query in {} \"{}\" for {} \"{}\": {}",
            self.db.kind, self.db.connection, kind, name, e
        );
        e
    }
}
