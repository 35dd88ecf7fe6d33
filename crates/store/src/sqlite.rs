//! SQLite backend.
//!
//! Uses a single SQLite database file with four tables:
//! - `chores` — chore definitions, reward terms stored as JSON
//! - `assignments` — one row per (chore, child) pairing
//! - `payouts` — payouts of approved rows that were later reset or deleted
//! - `adjustments` — the append-only ledger
//!
//! The pool claim relies on a unique index over the nullable `pool_slot`
//! column: a claim writes the chore id there, so a second claim for the
//! same chore is a uniqueness violation of one `INSERT`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use choreboard_core::error::StoreError;
use choreboard_core::{
    Adjustment, AdjustmentId, Assignment, AssignmentId, AssignmentState, BalanceSources, ChildId,
    Chore, ChoreId, ChoreRepository, DistributionMode, FamilyId, Money, NewAdjustment, ParentId, Payout,
    Recurrence, StateTransition,
};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// A SQLite-backed repository.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a database from a connection string.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database.
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Backend(format!("Invalid SQLite path: {e}")))?;
        // Every connection to `:memory:` is a separate database.
        let max_connections = if url.contains(":memory:") { 1 } else { 4 };
        Self::connect(options, max_connections, url).await
    }

    /// Open (or create) a database file.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Backend(format!("Failed to create {}: {e}", parent.display()))
                })?;
            }
        }
        let options = SqliteConnectOptions::new().filename(path);
        Self::connect(options, 4, &path.display().to_string()).await
    }

    async fn connect(
        options: SqliteConnectOptions,
        max_connections: u32,
        label: &str,
    ) -> Result<Self, StoreError> {
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {label}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run schema migrations — creates tables and indexes.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements = [
            (
                "chores table",
                r#"
                CREATE TABLE IF NOT EXISTS chores (
                    id               TEXT PRIMARY KEY NOT NULL,
                    family_id        TEXT NOT NULL,
                    parent_id        TEXT NOT NULL,
                    title            TEXT NOT NULL,
                    description      TEXT NOT NULL DEFAULT '',
                    reward           TEXT NOT NULL,
                    distribution     TEXT NOT NULL,
                    recurrence_days  INTEGER,
                    created_at       TEXT NOT NULL
                )
                "#,
            ),
            (
                "assignments table",
                r#"
                CREATE TABLE IF NOT EXISTS assignments (
                    id               TEXT PRIMARY KEY NOT NULL,
                    chore_id         TEXT NOT NULL REFERENCES chores(id),
                    child_id         TEXT NOT NULL,
                    state            TEXT NOT NULL,
                    completed_at     TEXT,
                    approved_at      TEXT,
                    payable_cents    INTEGER,
                    rejection_reason TEXT,
                    pool_slot        TEXT,
                    created_at       TEXT NOT NULL,
                    updated_at       TEXT NOT NULL
                )
                "#,
            ),
            (
                "chore/child index",
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_assignments_chore_child ON assignments(chore_id, child_id)",
            ),
            (
                "pool slot index",
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_assignments_pool_slot ON assignments(pool_slot)",
            ),
            (
                "child index",
                "CREATE INDEX IF NOT EXISTS idx_assignments_child ON assignments(child_id)",
            ),
            (
                "payouts table",
                r#"
                CREATE TABLE IF NOT EXISTS payouts (
                    iid           INTEGER PRIMARY KEY AUTOINCREMENT,
                    assignment_id TEXT NOT NULL,
                    chore_id      TEXT NOT NULL,
                    child_id      TEXT NOT NULL,
                    amount_cents  INTEGER NOT NULL,
                    approved_at   TEXT NOT NULL
                )
                "#,
            ),
            (
                "payout child index",
                "CREATE INDEX IF NOT EXISTS idx_payouts_child ON payouts(child_id)",
            ),
            (
                "adjustments table",
                r#"
                CREATE TABLE IF NOT EXISTS adjustments (
                    iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                    id           TEXT UNIQUE NOT NULL,
                    child_id     TEXT NOT NULL,
                    parent_id    TEXT NOT NULL,
                    amount_cents INTEGER NOT NULL,
                    reason       TEXT NOT NULL,
                    created_at   TEXT NOT NULL
                )
                "#,
            ),
            (
                "adjustment child index",
                "CREATE INDEX IF NOT EXISTS idx_adjustments_child ON adjustments(child_id)",
            ),
        ];

        for (what, sql) in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(format!("Migration failed ({what}): {e}")))?;
        }

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `Chore` from a SQLite row.
    fn row_to_chore(row: &SqliteRow) -> Result<Chore, StoreError> {
        let reward_json: String = column(row, "reward")?;
        let reward = serde_json::from_str(&reward_json)
            .map_err(|e| StoreError::Corrupt(format!("reward terms: {e}")))?;
        let distribution: String = column(row, "distribution")?;
        let distribution = DistributionMode::from_str(&distribution).map_err(StoreError::Corrupt)?;
        let recurrence_days: Option<i64> = column(row, "recurrence_days")?;
        let recurrence = match recurrence_days {
            None => Recurrence::None,
            Some(days) => Recurrence::every_days(
                u32::try_from(days)
                    .map_err(|_| StoreError::Corrupt(format!("recurrence_days {days}")))?,
            ),
        };

        Ok(Chore {
            id: parse_id(row, "id")?,
            family_id: parse_id::<FamilyId>(row, "family_id")?,
            parent_id: parse_id::<ParentId>(row, "parent_id")?,
            title: column(row, "title")?,
            description: column(row, "description")?,
            reward,
            distribution,
            recurrence,
            created_at: parse_time(row, "created_at")?,
        })
    }

    /// Parse an `Assignment` from a SQLite row.
    fn row_to_assignment(row: &SqliteRow) -> Result<Assignment, StoreError> {
        let state: String = column(row, "state")?;
        let payable_cents: Option<i64> = column(row, "payable_cents")?;

        Ok(Assignment {
            id: parse_id(row, "id")?,
            chore_id: parse_id(row, "chore_id")?,
            child_id: parse_id(row, "child_id")?,
            state: AssignmentState::from_str(&state).map_err(StoreError::Corrupt)?,
            completed_at: parse_optional_time(row, "completed_at")?,
            approved_at: parse_optional_time(row, "approved_at")?,
            payable_amount: payable_cents.map(Money::from_cents),
            rejection_reason: column(row, "rejection_reason")?,
            created_at: parse_time(row, "created_at")?,
            updated_at: parse_time(row, "updated_at")?,
        })
    }

    fn row_to_payout(row: &SqliteRow) -> Result<Payout, StoreError> {
        let amount_cents: i64 = column(row, "amount_cents")?;
        Ok(Payout {
            assignment_id: parse_id(row, "assignment_id")?,
            chore_id: parse_id(row, "chore_id")?,
            child_id: parse_id(row, "child_id")?,
            amount: Money::from_cents(amount_cents),
            approved_at: parse_time(row, "approved_at")?,
        })
    }

    fn row_to_adjustment(row: &SqliteRow) -> Result<Adjustment, StoreError> {
        let amount_cents: i64 = column(row, "amount_cents")?;
        Ok(Adjustment {
            id: parse_id::<AdjustmentId>(row, "id")?,
            child_id: parse_id(row, "child_id")?,
            parent_id: parse_id(row, "parent_id")?,
            amount: Money::from_cents(amount_cents),
            reason: column(row, "reason")?,
            created_at: parse_time(row, "created_at")?,
        })
    }

    async fn acquire(&self) -> Result<PoolConnection<Sqlite>, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| StoreError::Backend(format!("Acquire connection: {e}")))
    }

    async fn fetch_assignments(
        &self,
        sql: &str,
        key: String,
        what: &str,
    ) -> Result<Vec<Assignment>, StoreError> {
        let rows = sqlx::query(sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("{what}: {e}")))?;
        rows.iter().map(Self::row_to_assignment).collect()
    }
}

#[async_trait]
impl ChoreRepository for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create_chore(&self, chore: Chore) -> Result<Chore, StoreError> {
        let mut conn = self.acquire().await?;
        insert_chore(&mut *conn, &chore).await?;

        debug!(chore_id = %chore.id, "Stored chore");
        Ok(chore)
    }

    async fn create_chore_with_assignments(
        &self,
        chore: Chore,
        children: &[ChildId],
        initial_state: AssignmentState,
        now: DateTime<Utc>,
    ) -> Result<(Chore, Vec<Assignment>), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(format!("BEGIN failed: {e}")))?;
        insert_chore(&mut *tx, &chore).await?;

        let mut rows = Vec::with_capacity(children.len());
        for child_id in children {
            let assignment = Assignment::new(chore.id, *child_id, initial_state, now);
            // Dropping `tx` on error rolls the chore back too.
            insert_assignment(&mut *tx, &assignment, None)
                .await
                .map_err(|e| assignment_insert_error(e, &chore.id, child_id))?;
            rows.push(assignment);
        }
        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(format!("COMMIT failed: {e}")))?;

        debug!(chore_id = %chore.id, assignments = rows.len(), "Stored chore with assignments");
        Ok((chore, rows))
    }

    async fn get_chore(&self, id: &ChoreId) -> Result<Option<Chore>, StoreError> {
        let row = sqlx::query("SELECT * FROM chores WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("GET chore: {e}")))?;

        row.as_ref().map(Self::row_to_chore).transpose()
    }

    async fn create_assignment(
        &self,
        chore_id: &ChoreId,
        child_id: &ChildId,
        initial_state: AssignmentState,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError> {
        let assignment = Assignment::new(*chore_id, *child_id, initial_state, now);
        let mut conn = self.acquire().await?;
        insert_assignment(&mut *conn, &assignment, None)
            .await
            .map_err(|e| assignment_insert_error(e, chore_id, child_id))?;
        Ok(assignment)
    }

    async fn claim_if_unassigned(
        &self,
        chore_id: &ChoreId,
        child_id: &ChildId,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError> {
        let assignment = Assignment::new(*chore_id, *child_id, AssignmentState::Completed, now);
        let mut conn = self.acquire().await?;
        match insert_assignment(&mut *conn, &assignment, Some(chore_id)).await {
            Ok(()) => Ok(assignment),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::AlreadyClaimed(*chore_id))
            }
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(StoreError::NotFound {
                    entity: "chore",
                    id: chore_id.to_string(),
                })
            }
            Err(e) => Err(StoreError::Backend(format!("Claim INSERT failed: {e}"))),
        }
    }

    async fn get_assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, StoreError> {
        let row = sqlx::query("SELECT * FROM assignments WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("GET assignment: {e}")))?;

        row.as_ref().map(Self::row_to_assignment).transpose()
    }

    async fn update_assignment_state(
        &self,
        id: &AssignmentId,
        expected: AssignmentState,
        transition: StateTransition,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(format!("BEGIN failed: {e}")))?;

        if expected == AssignmentState::Approved && transition.state != AssignmentState::Approved {
            archive_payout(&mut *tx, id).await?;
        }

        let row = sqlx::query(
            r#"
            UPDATE assignments SET
                state = ?3,
                completed_at = ?4,
                approved_at = ?5,
                payable_cents = ?6,
                rejection_reason = ?7,
                updated_at = ?8
            WHERE id = ?1 AND state = ?2
            RETURNING *
            "#,
        )
        .bind(id.to_string())
        .bind(expected.as_str())
        .bind(transition.state.as_str())
        .bind(transition.completed_at.map(format_time))
        .bind(transition.approved_at.map(format_time))
        .bind(transition.payable_amount.map(Money::cents))
        .bind(transition.rejection_reason.as_deref())
        .bind(format_time(now))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StoreError::Backend(format!("UPDATE assignment failed: {e}")))?;

        if let Some(row) = row {
            let updated = Self::row_to_assignment(&row)?;
            tx.commit()
                .await
                .map_err(|e| StoreError::Backend(format!("COMMIT failed: {e}")))?;
            return Ok(updated);
        }
        tx.rollback()
            .await
            .map_err(|e| StoreError::Backend(format!("ROLLBACK failed: {e}")))?;

        // Nothing matched: either the row is gone or someone moved it first.
        match self.get_assignment(id).await? {
            Some(current) => Err(StoreError::PreconditionFailed {
                id: *id,
                expected,
                actual: current.state,
            }),
            None => Err(StoreError::NotFound {
                entity: "assignment",
                id: id.to_string(),
            }),
        }
    }

    async fn delete_assignment(&self, id: &AssignmentId) -> Result<bool, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(format!("BEGIN failed: {e}")))?;
        archive_payout(&mut *tx, id).await?;

        let result = sqlx::query("DELETE FROM assignments WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Backend(format!("DELETE failed: {e}")))?;
        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(format!("COMMIT failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_assignments_for_chore(
        &self,
        chore_id: &ChoreId,
    ) -> Result<Vec<Assignment>, StoreError> {
        self.fetch_assignments(
            "SELECT * FROM assignments WHERE chore_id = ?1 ORDER BY created_at, id",
            chore_id.to_string(),
            "List by chore",
        )
        .await
    }

    async fn list_assignments_for_child(
        &self,
        child_id: &ChildId,
    ) -> Result<Vec<Assignment>, StoreError> {
        self.fetch_assignments(
            "SELECT * FROM assignments WHERE child_id = ?1 ORDER BY created_at, id",
            child_id.to_string(),
            "List by child",
        )
        .await
    }

    async fn balance_sources_for_child(
        &self,
        child_id: &ChildId,
    ) -> Result<BalanceSources, StoreError> {
        let key = child_id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(format!("BEGIN failed: {e}")))?;

        let approved = sqlx::query(
            "SELECT * FROM assignments WHERE child_id = ?1 AND state = 'approved' ORDER BY created_at, id",
        )
        .bind(&key)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| StoreError::Backend(format!("Balance approved rows: {e}")))?;
        let payouts = sqlx::query("SELECT * FROM payouts WHERE child_id = ?1 ORDER BY iid")
            .bind(&key)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| StoreError::Backend(format!("Balance payouts: {e}")))?;
        let adjustments = sqlx::query("SELECT * FROM adjustments WHERE child_id = ?1 ORDER BY iid")
            .bind(&key)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| StoreError::Backend(format!("Balance adjustments: {e}")))?;
        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(format!("COMMIT failed: {e}")))?;

        Ok(BalanceSources {
            approved: approved
                .iter()
                .map(Self::row_to_assignment)
                .collect::<Result<_, _>>()?,
            payouts: payouts
                .iter()
                .map(Self::row_to_payout)
                .collect::<Result<_, _>>()?,
            adjustments: adjustments
                .iter()
                .map(Self::row_to_adjustment)
                .collect::<Result<_, _>>()?,
        })
    }

    async fn list_payouts_for_child(&self, child_id: &ChildId) -> Result<Vec<Payout>, StoreError> {
        let rows = sqlx::query("SELECT * FROM payouts WHERE child_id = ?1 ORDER BY iid")
            .bind(child_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("List payouts: {e}")))?;

        rows.iter().map(Self::row_to_payout).collect()
    }

    async fn list_adjustments_for_child(
        &self,
        child_id: &ChildId,
    ) -> Result<Vec<Adjustment>, StoreError> {
        let rows = sqlx::query("SELECT * FROM adjustments WHERE child_id = ?1 ORDER BY iid")
            .bind(child_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("List adjustments: {e}")))?;

        rows.iter().map(Self::row_to_adjustment).collect()
    }

    async fn create_adjustment(
        &self,
        adjustment: NewAdjustment,
        now: DateTime<Utc>,
    ) -> Result<Adjustment, StoreError> {
        let adjustment = Adjustment::from_new(adjustment, now);

        sqlx::query(
            r#"
            INSERT INTO adjustments (id, child_id, parent_id, amount_cents, reason, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(adjustment.id.to_string())
        .bind(adjustment.child_id.to_string())
        .bind(adjustment.parent_id.to_string())
        .bind(adjustment.amount.cents())
        .bind(&adjustment.reason)
        .bind(format_time(adjustment.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("INSERT adjustment failed: {e}")))?;

        Ok(adjustment)
    }
}

async fn insert_chore(conn: &mut SqliteConnection, chore: &Chore) -> Result<(), StoreError> {
    let reward_json = serde_json::to_string(&chore.reward)
        .map_err(|e| StoreError::Backend(format!("Reward serialization: {e}")))?;

    sqlx::query(
        r#"
        INSERT INTO chores (id, family_id, parent_id, title, description, reward, distribution, recurrence_days, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(chore.id.to_string())
    .bind(chore.family_id.to_string())
    .bind(chore.parent_id.to_string())
    .bind(&chore.title)
    .bind(&chore.description)
    .bind(&reward_json)
    .bind(chore.distribution.as_str())
    .bind(chore.recurrence.interval_days().map(i64::from))
    .bind(format_time(chore.created_at))
    .execute(conn)
    .await
    .map_err(|e| StoreError::Backend(format!("INSERT chore failed: {e}")))?;
    Ok(())
}

async fn insert_assignment(
    conn: &mut SqliteConnection,
    assignment: &Assignment,
    pool_slot: Option<&ChoreId>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO assignments (id, chore_id, child_id, state, completed_at, pool_slot, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(assignment.id.to_string())
    .bind(assignment.chore_id.to_string())
    .bind(assignment.child_id.to_string())
    .bind(assignment.state.as_str())
    .bind(assignment.completed_at.map(format_time))
    .bind(pool_slot.map(|id| id.to_string()))
    .bind(format_time(assignment.created_at))
    .bind(format_time(assignment.updated_at))
    .execute(conn)
    .await
    .map(|_| ())
}

fn assignment_insert_error(e: sqlx::Error, chore_id: &ChoreId, child_id: &ChildId) -> StoreError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AlreadyExists {
            chore_id: *chore_id,
            child_id: *child_id,
        },
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound {
            entity: "chore",
            id: chore_id.to_string(),
        },
        e => StoreError::Backend(format!("INSERT assignment failed: {e}")),
    }
}

/// Copy an approved row's payout into `payouts`. A no-op for any other row.
async fn archive_payout(conn: &mut SqliteConnection, id: &AssignmentId) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO payouts (assignment_id, chore_id, child_id, amount_cents, approved_at)
        SELECT id, chore_id, child_id, payable_cents, approved_at FROM assignments
        WHERE id = ?1 AND state = 'approved'
          AND payable_cents IS NOT NULL AND approved_at IS NOT NULL
        "#,
    )
    .bind(id.to_string())
    .execute(conn)
    .await
    .map_err(|e| StoreError::Backend(format!("Archive payout failed: {e}")))?;
    Ok(())
}

fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Corrupt(format!("{name} column: {e}")))
}

fn parse_id<T: FromStr>(row: &SqliteRow, name: &str) -> Result<T, StoreError> {
    let raw: String = column(row, name)?;
    raw.parse()
        .map_err(|_| StoreError::Corrupt(format!("{name} is not a valid id: {raw}")))
}

fn parse_time(row: &SqliteRow, name: &str) -> Result<DateTime<Utc>, StoreError> {
    let raw: String = column(row, name)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("{name} timestamp '{raw}': {e}")))
}

fn parse_optional_time(row: &SqliteRow, name: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
    let raw: Option<String> = column(row, name)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::Corrupt(format!("{name} timestamp '{raw}': {e}")))
    })
    .transpose()
}
