//! SQLite implementation of the war archive.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};

use super::models::{AttackerCount, DonationEntry, WarSort};
use crate::domain::archived::{ArchivedAttack, ArchivedWar, ViolationStatus, WarResult};
use crate::domain::season::{DateWindow, season_window};
use crate::domain::snapshot::RosterMember;
use crate::error::ArchiverError;

const WAR_COLUMNS: &str = "end_time, end_date, opponent_name, team_size, clan_stars, \
     opponent_stars, clan_destruction, opponent_destruction, clan_attacks_used, result, \
     is_league_war, total_violations";

type WarRow = (
    String,
    String,
    String,
    i64,
    i64,
    i64,
    f64,
    f64,
    i64,
    String,
    bool,
    i64,
);

type AttackRow = (String, String, String, i64, f64, i64, i64, Option<i64>);

/// SQLite-backed war archive using `sqlx::SqlitePool`.
///
/// # Consistency
///
/// A war and its attacks are written in one transaction by
/// [`SqliteArchive::archive_war`], so readers never see an archived war
/// without its attack rows.
#[derive(Debug, Clone)]
pub struct SqliteArchive {
    pool: SqlitePool,
}

impl SqliteArchive {
    /// Creates an archive over an existing connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] if the URL is invalid or the
    /// database cannot be opened.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, ArchiverError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;

        Ok(Self::new(pool))
    }

    /// Opens a private in-memory archive with the schema applied.
    ///
    /// The pool keeps a single connection alive for its whole lifetime,
    /// since every SQLite in-memory connection is its own database.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn in_memory() -> Result<Self, ArchiverError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;
        let archive = Self::new(pool);
        archive.migrate().await?;
        Ok(archive)
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), ArchiverError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))
    }

    // ── Wars ───────────────────────────────────────────────────────────

    /// Returns `true` if a war with this end time is archived.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn exists(&self, end_time: &str) -> Result<bool, ArchiverError> {
        let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM wars WHERE end_time = ?")
            .bind(end_time)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;

        Ok(row.is_some())
    }

    /// Inserts the war, replacing any row with the same end time.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn upsert_war(&self, war: &ArchivedWar) -> Result<(), ArchiverError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;
        upsert_war_on(&mut conn, war)
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))
    }

    /// Replaces every attack of the war ending at `end_time`.
    ///
    /// Delete and insert run in one transaction: on failure the previous
    /// attack rows stay in place and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure,
    /// including when no war with this end time exists.
    pub async fn replace_attacks(
        &self,
        end_time: &str,
        attacks: &[ArchivedAttack],
    ) -> Result<(), ArchiverError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;
        replace_attacks_on(&mut tx, end_time, attacks)
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;
        tx.commit()
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))
    }

    /// Upserts the war and replaces its attacks in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure; nothing
    /// is written in that case.
    pub async fn archive_war(
        &self,
        war: &ArchivedWar,
        attacks: &[ArchivedAttack],
    ) -> Result<(), ArchiverError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;
        upsert_war_on(&mut tx, war)
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;
        replace_attacks_on(&mut tx, &war.end_time, attacks)
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;
        tx.commit()
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))
    }

    /// Lists archived wars in the requested order.
    ///
    /// [`WarSort::LeagueSeason`] keeps only wars whose end date falls in
    /// the season containing `today`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn list_wars(
        &self,
        sort: WarSort,
        today: NaiveDate,
    ) -> Result<Vec<ArchivedWar>, ArchiverError> {
        let order = match sort {
            WarSort::OldestFirst => "ASC",
            WarSort::NewestFirst | WarSort::LeagueSeason => "DESC",
        };
        let rows = sqlx::query_as::<_, WarRow>(&format!(
            "SELECT {WAR_COLUMNS} FROM wars ORDER BY end_date {order}, end_time {order}"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ArchiverError::Persistence(e.to_string()))?;
        let wars = rows
            .into_iter()
            .map(war_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        if sort == WarSort::LeagueSeason {
            let season = season_window(today)?;
            return Ok(wars
                .into_iter()
                .filter(|war| season.contains_exclusive(war.end_date))
                .collect());
        }
        Ok(wars)
    }

    /// Loads a single archived war.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn get_war(&self, end_time: &str) -> Result<Option<ArchivedWar>, ArchiverError> {
        let row = sqlx::query_as::<_, WarRow>(&format!(
            "SELECT {WAR_COLUMNS} FROM wars WHERE end_time = ?"
        ))
        .bind(end_time)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ArchiverError::Persistence(e.to_string()))?;

        row.map(war_from_row).transpose()
    }

    /// Loads the attacks of a war in the order they were archived.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn get_attacks(&self, end_time: &str) -> Result<Vec<ArchivedAttack>, ArchiverError> {
        let rows = sqlx::query_as::<_, AttackRow>(
            "SELECT attacker_tag, attacker_name, defender_tag, stars, destruction, \
             attack_order, archived_at, is_rule_violation \
             FROM attacks WHERE war_end_time = ? ORDER BY id ASC",
        )
        .bind(end_time)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ArchiverError::Persistence(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    attacker_tag,
                    attacker_name,
                    defender_tag,
                    stars,
                    destruction,
                    attack_order,
                    archived_at,
                    is_rule_violation,
                )| ArchivedAttack {
                    attacker_tag,
                    attacker_name,
                    defender_tag,
                    stars: u8::try_from(stars).unwrap_or_default(),
                    destruction,
                    attack_order: u8::try_from(attack_order).unwrap_or_default(),
                    archived_at,
                    violation: ViolationStatus::from_db(is_rule_violation),
                },
            )
            .collect())
    }

    /// Counts attacks per attacker over non-league wars whose end date lies
    /// in `window`, both ends inclusive.
    ///
    /// Ordered by count descending, then attacker name ascending.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn count_attacks_by_attacker(
        &self,
        window: DateWindow,
    ) -> Result<Vec<AttackerCount>, ArchiverError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT a.attacker_name, COUNT(a.id) AS attack_count \
             FROM attacks a JOIN wars w ON a.war_end_time = w.end_time \
             WHERE w.is_league_war = 0 AND w.end_date BETWEEN ? AND ? \
             GROUP BY a.attacker_name \
             ORDER BY attack_count DESC, a.attacker_name ASC",
        )
        .bind(window.start.to_string())
        .bind(window.end.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ArchiverError::Persistence(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(attacker_name, count)| AttackerCount {
                attacker_name,
                attacks: u32::try_from(count).unwrap_or(u32::MAX),
            })
            .collect())
    }

    // ── Subscribers ────────────────────────────────────────────────────

    /// Adds an alert recipient. Returns `false` if already subscribed.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn subscribe(&self, recipient_id: i64) -> Result<bool, ArchiverError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO subscribers (recipient_id, subscribed_at) VALUES (?, ?)",
        )
        .bind(recipient_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ArchiverError::Persistence(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes an alert recipient. Returns `false` if it was not subscribed.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn unsubscribe(&self, recipient_id: i64) -> Result<bool, ArchiverError> {
        let result = sqlx::query("DELETE FROM subscribers WHERE recipient_id = ?")
            .bind(recipient_id)
            .execute(&self.pool)
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns `true` if the recipient receives alerts.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn is_subscribed(&self, recipient_id: i64) -> Result<bool, ArchiverError> {
        let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM subscribers WHERE recipient_id = ?")
            .bind(recipient_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;

        Ok(row.is_some())
    }

    /// All alert recipients, in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn subscribers(&self) -> Result<Vec<i64>, ArchiverError> {
        sqlx::query_scalar::<_, i64>("SELECT recipient_id FROM subscribers ORDER BY recipient_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))
    }

    // ── Donation snapshots ─────────────────────────────────────────────

    /// Stores the donation counters of `members`, keyed by the hour of
    /// `taken_at`. A second snapshot within the same hour replaces the first.
    ///
    /// Returns the number of members written.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure; nothing
    /// is written in that case.
    pub async fn save_donation_snapshot(
        &self,
        taken_at: DateTime<Utc>,
        members: &[RosterMember],
    ) -> Result<usize, ArchiverError> {
        let snapshot_time = taken_at.format("%Y-%m-%d %H:00:00").to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;

        for member in members {
            sqlx::query(
                "INSERT OR REPLACE INTO donation_snapshots \
                 (snapshot_time, player_tag, player_name, donations, donations_received) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&snapshot_time)
            .bind(&member.tag)
            .bind(&member.name)
            .bind(i64::from(member.donations))
            .bind(i64::from(member.donations_received))
            .execute(&mut *tx)
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| ArchiverError::Persistence(e.to_string()))?;
        Ok(members.len())
    }

    /// Entries of the most recent donation snapshot, by player tag.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiverError::Persistence`] on database failure.
    pub async fn latest_donation_snapshot(&self) -> Result<Vec<DonationEntry>, ArchiverError> {
        let rows = sqlx::query_as::<_, (String, String, String, i64, i64)>(
            "SELECT snapshot_time, player_tag, player_name, donations, donations_received \
             FROM donation_snapshots \
             WHERE snapshot_time = (SELECT MAX(snapshot_time) FROM donation_snapshots) \
             ORDER BY player_tag",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ArchiverError::Persistence(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(snapshot_time, player_tag, player_name, donations, donations_received)| {
                    DonationEntry {
                        snapshot_time,
                        player_tag,
                        player_name,
                        donations: u32::try_from(donations).unwrap_or_default(),
                        donations_received: u32::try_from(donations_received)
                            .unwrap_or_default(),
                    }
                },
            )
            .collect())
    }
}

async fn upsert_war_on(conn: &mut SqliteConnection, war: &ArchivedWar) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO wars ({WAR_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(end_time) DO UPDATE SET \
         end_date = excluded.end_date, \
         opponent_name = excluded.opponent_name, \
         team_size = excluded.team_size, \
         clan_stars = excluded.clan_stars, \
         opponent_stars = excluded.opponent_stars, \
         clan_destruction = excluded.clan_destruction, \
         opponent_destruction = excluded.opponent_destruction, \
         clan_attacks_used = excluded.clan_attacks_used, \
         result = excluded.result, \
         is_league_war = excluded.is_league_war, \
         total_violations = excluded.total_violations"
    ))
    .bind(&war.end_time)
    .bind(war.end_date.to_string())
    .bind(&war.opponent_name)
    .bind(i64::from(war.team_size))
    .bind(i64::from(war.clan_stars))
    .bind(i64::from(war.opponent_stars))
    .bind(war.clan_destruction)
    .bind(war.opponent_destruction)
    .bind(i64::from(war.clan_attacks_used))
    .bind(war.result.as_str())
    .bind(war.is_league_war)
    .bind(i64::from(war.total_violations))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn replace_attacks_on(
    conn: &mut SqliteConnection,
    end_time: &str,
    attacks: &[ArchivedAttack],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM attacks WHERE war_end_time = ?")
        .bind(end_time)
        .execute(&mut *conn)
        .await?;

    for attack in attacks {
        sqlx::query(
            "INSERT INTO attacks (war_end_time, attacker_tag, attacker_name, defender_tag, \
             stars, destruction, attack_order, archived_at, is_rule_violation) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(end_time)
        .bind(&attack.attacker_tag)
        .bind(&attack.attacker_name)
        .bind(&attack.defender_tag)
        .bind(i64::from(attack.stars))
        .bind(attack.destruction)
        .bind(i64::from(attack.attack_order))
        .bind(attack.archived_at)
        .bind(attack.violation.to_db())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

fn war_from_row(row: WarRow) -> Result<ArchivedWar, ArchiverError> {
    let (
        end_time,
        end_date,
        opponent_name,
        team_size,
        clan_stars,
        opponent_stars,
        clan_destruction,
        opponent_destruction,
        clan_attacks_used,
        result,
        is_league_war,
        total_violations,
    ) = row;

    let end_date = NaiveDate::parse_from_str(&end_date, "%Y-%m-%d")
        .map_err(|e| ArchiverError::Persistence(format!("bad end_date {end_date:?}: {e}")))?;

    Ok(ArchivedWar {
        end_time,
        end_date,
        opponent_name,
        team_size: u32::try_from(team_size).unwrap_or_default(),
        clan_stars: u32::try_from(clan_stars).unwrap_or_default(),
        opponent_stars: u32::try_from(opponent_stars).unwrap_or_default(),
        clan_destruction,
        opponent_destruction,
        clan_attacks_used: u32::try_from(clan_attacks_used).unwrap_or_default(),
        result: result.parse::<WarResult>()?,
        is_league_war,
        total_violations: u32::try_from(total_violations).unwrap_or_default(),
    })
}
