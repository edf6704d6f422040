//! SQLite storage layer for runner and run records.
//!
//! Schema:
//! - `runner` table: id, name, gender (ordinal index)
//! - `run` table: id, date (ISO-8601 text), distance_km, minutes, runner_id
//!
//! Every write runs inside a single transaction scoped to the call; reads
//! run at SQLite's default isolation. No state is cached between calls.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::error::StoreError;
use super::models::{Gender, Run, Runner, MARATHON_DISTANCE_KM};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS runner (
    id      INTEGER PRIMARY KEY,
    name    TEXT NOT NULL,
    gender  INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS run (
    id          INTEGER PRIMARY KEY,
    date        TEXT NOT NULL,
    distance_km REAL NOT NULL,
    minutes     INTEGER NOT NULL,
    runner_id   INTEGER NOT NULL REFERENCES runner(id)
);
CREATE INDEX IF NOT EXISTS idx_run_runner ON run(runner_id);
";

/// Persistence gateway for runners and their runs
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Wrap an externally supplied connection, bootstrapping the schema
    pub fn new(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Storage { conn })
    }

    /// Open (or create) a database file at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::new(Connection::open(path)?)
    }

    /// Open a fresh in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::new(Connection::open_in_memory()?)
    }

    /// List every runner. Run lists are not loaded; order is unspecified.
    pub fn list_runners(&self) -> Result<Vec<Runner>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT id, name, gender FROM runner")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut runners = Vec::new();
        for row in rows {
            let (id, name, gender) = row?;
            runners.push(decode_runner(id, name, gender)?);
        }
        Ok(runners)
    }

    /// Average speed in km/h across all of the runner's runs, weighted by
    /// duration: `sum(distance) / sum(minutes) * 60`. Not to be confused
    /// with the mean of the per-run speeds. `None` when the runner has no
    /// runs (an unsaved runner owns none by definition).
    pub fn average_speed(&self, runner: &Runner) -> Result<Option<f64>, StoreError> {
        let Some(id) = runner.id else {
            return Ok(None);
        };
        // SUM over zero rows is NULL, which maps to None
        let speed: Option<f64> = self.conn.query_row(
            "SELECT SUM(distance_km) / SUM(minutes) * 60 FROM run WHERE runner_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(speed)
    }

    /// The runner with the given id, with all associated runs eagerly
    /// loaded; `None` for unknown ids.
    pub fn find_runner(&self, id: i64) -> Result<Option<Runner>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, gender FROM runner WHERE id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, gender)) = row else {
            return Ok(None);
        };
        let mut runner = decode_runner(id, name, gender)?;
        runner.runs = self.runs_for(&runner)?;
        Ok(Some(runner))
    }

    /// The distinct set of runners with at least one run covering at least
    /// the marathon distance. Run lists are not loaded.
    pub fn marathon_finishers(&self) -> Result<HashSet<Runner>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT runner.id, runner.name, runner.gender
             FROM run JOIN runner ON runner.id = run.runner_id
             WHERE run.distance_km >= ?1",
        )?;
        let rows = stmt.query_map([MARATHON_DISTANCE_KM], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut finishers = HashSet::new();
        for row in rows {
            let (id, name, gender) = row?;
            finishers.insert(decode_runner(id, name, gender)?);
        }
        Ok(finishers)
    }

    /// Upsert a runner: insert when it has no id, otherwise update every
    /// field of the row with that id. Returns the persisted record with its
    /// id assigned.
    pub fn save_runner(&mut self, runner: Runner) -> Result<Runner, StoreError> {
        runner.validate()?;
        let tx = self.conn.transaction()?;
        let saved = upsert_runner(&tx, runner)?;
        tx.commit()?;
        Ok(saved)
    }

    /// Insert a new run, first upserting its runner so the foreign key
    /// resolves. Both writes share one transaction: a failure leaves
    /// neither row behind. Returns the run with its id assigned and the
    /// updated runner embedded.
    pub fn save_run(&mut self, run: Run) -> Result<Run, StoreError> {
        if run.id.is_some() {
            return Err(StoreError::Validation {
                field: "id",
                reason: "run is already persisted".to_string(),
            });
        }
        run.validate()?;

        let Run {
            date,
            distance_km,
            minutes,
            runner,
            ..
        } = run;

        let tx = self.conn.transaction()?;
        let runner = upsert_runner(&tx, runner)?;
        tx.execute(
            "INSERT INTO run (date, distance_km, minutes, runner_id) VALUES (?1, ?2, ?3, ?4)",
            params![date.to_string(), distance_km, minutes, runner.id],
        )
        .map_err(|e| map_constraint(e, "run references an unresolvable runner"))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        tracing::debug!(id, runner_id = runner.id, "inserted run");

        Ok(Run {
            id: Some(id),
            date,
            distance_km,
            minutes,
            runner,
        })
    }

    /// Runs referencing the given runner, looked up by foreign key
    fn runs_for(&self, owner: &Runner) -> Result<Vec<Run>, StoreError> {
        let Some(owner_id) = owner.id else {
            return Ok(Vec::new());
        };
        let mut stmt = self
            .conn
            .prepare("SELECT id, date, distance_km, minutes FROM run WHERE runner_id = ?1")?;
        let rows = stmt.query_map([owner_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut runs = Vec::new();
        for row in rows {
            let (id, date, distance_km, minutes) = row?;
            let date = date.parse::<NaiveDate>().map_err(|e| {
                StoreError::Corrupt(format!("unparseable date for run {id}: {e}"))
            })?;
            runs.push(Run {
                id: Some(id),
                date,
                distance_km,
                minutes,
                // embed the owner without its run list to keep the payload flat
                runner: Runner {
                    id: owner.id,
                    name: owner.name.clone(),
                    gender: owner.gender,
                    runs: Vec::new(),
                },
            });
        }
        Ok(runs)
    }
}

/// Build a Runner from raw column values; runs are left unloaded
fn decode_runner(id: i64, name: String, gender: i64) -> Result<Runner, StoreError> {
    let gender = Gender::from_ordinal(gender).ok_or_else(|| {
        StoreError::Corrupt(format!("unknown gender ordinal {gender} for runner {id}"))
    })?;
    Ok(Runner {
        id: Some(id),
        name,
        gender,
        runs: Vec::new(),
    })
}

/// Insert-or-update a runner within the caller's transaction. Updating an
/// id with no matching row is an integrity error: the merge target cannot
/// be resolved, and inventing a row under a caller-chosen id would not be
/// an update.
fn upsert_runner(conn: &Connection, mut runner: Runner) -> Result<Runner, StoreError> {
    match runner.id {
        None => {
            conn.execute(
                "INSERT INTO runner (name, gender) VALUES (?1, ?2)",
                params![runner.name, runner.gender.ordinal()],
            )?;
            let id = conn.last_insert_rowid();
            tracing::debug!(id, "inserted runner");
            runner.id = Some(id);
        }
        Some(id) => {
            let updated = conn.execute(
                "UPDATE runner SET name = ?1, gender = ?2 WHERE id = ?3",
                params![runner.name, runner.gender.ordinal(), id],
            )?;
            if updated == 0 {
                return Err(StoreError::Integrity(format!(
                    "no runner row with id {id} to update"
                )));
            }
            tracing::debug!(id, "updated runner");
        }
    }
    Ok(runner)
}

/// Map SQLite constraint violations to the integrity taxonomy; everything
/// else passes through as a driver failure
fn map_constraint(err: rusqlite::Error, context: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::Integrity(format!("{context}: {err}"))
        }
        _ => StoreError::Sqlite(err),
    }
}
