use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{parse_datetime, parse_uuid};
use crate::board::{CardStore, StoredCard};
use crate::models::Card;
use crate::rank::Rank;

const CARD_COLUMNS: &str = "id, bucket, title, position, created_at, updated_at";

/// Display order within a bucket. `rowid` breaks ties by insertion order.
const DISPLAY_ORDER: &str = "position IS NULL, position, rowid";

/// [`CardStore`] over one open SQLite transaction.
pub struct SqliteCardStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCardStore<'a> {
    pub(super) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn load_card(&self, id: Uuid) -> Result<Option<Card>> {
        let card = self
            .conn
            .query_row(
                &format!("SELECT {} FROM cards WHERE id = ?", CARD_COLUMNS),
                [id.to_string()],
                card_from_row,
            )
            .optional()?;
        Ok(card)
    }

    pub fn load_bucket(&self, bucket: &str) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM cards WHERE bucket = ? ORDER BY {}",
            CARD_COLUMNS, DISPLAY_ORDER
        ))?;
        let cards = stmt
            .query_map([bucket], card_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    pub fn insert_card(&self, bucket: &str, title: &str, position: Option<&str>) -> Result<Card> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO cards (id, bucket, title, position, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                bucket,
                title,
                position,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Card {
            id,
            bucket: bucket.to_string(),
            title: title.to_string(),
            position: position.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
    }

    /// Every card, grouped by bucket and in display order.
    pub fn all_cards(&self) -> Result<Vec<StoredCard>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, bucket, position FROM cards ORDER BY bucket, {}",
            DISPLAY_ORDER
        ))?;
        let cards = stmt
            .query_map([], stored_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }
}

impl CardStore for SqliteCardStore<'_> {
    fn card(&self, id: Uuid) -> Result<Option<StoredCard>> {
        let card = self
            .conn
            .query_row(
                "SELECT id, bucket, position FROM cards WHERE id = ?",
                [id.to_string()],
                stored_from_row,
            )
            .optional()?;
        Ok(card)
    }

    fn bucket_cards(&self, bucket: &str, exclude: Option<Uuid>) -> Result<Vec<StoredCard>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, bucket, position FROM cards
             WHERE bucket = ?1 AND (?2 IS NULL OR id != ?2)
             ORDER BY {}",
            DISPLAY_ORDER
        ))?;
        let cards = stmt
            .query_map(
                params![bucket, exclude.map(|u| u.to_string())],
                stored_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    fn count_within(
        &self,
        bucket: &str,
        exclude: Option<Uuid>,
        lower: Option<&str>,
        upper: Option<&str>,
    ) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cards
             WHERE bucket = ?1
               AND position IS NOT NULL
               AND (?2 IS NULL OR id != ?2)
               AND (?3 IS NULL OR position > ?3)
               AND (?4 IS NULL OR position < ?4)",
            params![bucket, exclude.map(|u| u.to_string()), lower, upper],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn write_position(&self, id: Uuid, bucket: &str, rank: &Rank) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE cards SET bucket = ?, position = ?, updated_at = ? WHERE id = ?",
            (bucket, rank.get(), Utc::now().to_rfc3339(), id.to_string()),
        )?;
        if rows == 0 {
            anyhow::bail!("Card {} not found while writing position", id);
        }
        Ok(())
    }

    fn write_positions(&self, ranks: &[(Uuid, Rank)]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut stmt = self
            .conn
            .prepare_cached("UPDATE cards SET position = ?, updated_at = ? WHERE id = ?")?;
        for (id, rank) in ranks {
            stmt.execute((rank.get(), &now, id.to_string()))?;
        }
        Ok(())
    }
}

fn card_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: parse_uuid(row.get::<_, String>(0)?),
        bucket: row.get(1)?,
        title: row.get(2)?,
        position: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
        updated_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn stored_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredCard> {
    Ok(StoredCard {
        id: parse_uuid(row.get::<_, String>(0)?),
        bucket: row.get(1)?,
        position: row.get(2)?,
    })
}
