mod schema;
mod store;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use crate::board::{Board, BoardError, CardStore, MoveRequest, StoredCard};
use crate::models::*;
use crate::rank::RankGenerator;
use crate::repair;

pub use store::SqliteCardStore;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)?;
        Ok(())
    }

    /// Run `f` in one `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken up front, so reading neighbour positions and
    /// writing the new one can't interleave with another move or rebalance.
    /// Rolled back if `f` fails.
    fn write_transaction<T, E>(&self, f: impl FnOnce(&SqliteCardStore<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| E::from(anyhow::Error::from(e)))?;
        let value = f(&SqliteCardStore::new(&tx))?;
        tx.commit().map_err(|e| E::from(anyhow::Error::from(e)))?;
        Ok(value)
    }

    // ============================================================
    // Card operations
    // ============================================================

    pub fn get_card(&self, id: Uuid) -> Result<Option<Card>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        SqliteCardStore::new(&conn).load_card(id)
    }

    /// Cards of a bucket in display order, unranked cards last.
    pub fn get_bucket_cards(&self, bucket: &str) -> Result<Vec<Card>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        SqliteCardStore::new(&conn).load_bucket(bucket)
    }

    pub fn create_card(
        &self,
        board: &Board,
        bucket: &str,
        input: CreateCardInput,
    ) -> Result<Card, BoardError> {
        let placement = input.placement.unwrap_or_default();
        self.write_transaction(|store| {
            let rank = board.place(store, bucket, placement)?;
            let card = store.insert_card(bucket, &input.title, Some(rank.get()))?;
            tracing::debug!(card = %card.id, bucket = %bucket, rank = %rank, "Created card");
            Ok(card)
        })
    }

    /// Store a card with its position as given.
    pub fn import_card(&self, bucket: &str, input: ImportCardInput) -> Result<Card> {
        self.write_transaction(|store| {
            let card = store.insert_card(bucket, &input.title, input.position.as_deref())?;
            tracing::debug!(card = %card.id, bucket = %bucket, position = ?card.position, "Imported card");
            Ok(card)
        })
    }

    /// Removing a card leaves every other position untouched.
    pub fn delete_card(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM cards WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    pub fn move_card(&self, board: &Board, id: Uuid, input: MoveCardInput) -> Result<Card, BoardError> {
        let request = MoveRequest {
            card: id,
            bucket: input.bucket,
            after: input.after,
            before: input.before,
        };

        self.write_transaction(|store| {
            board.move_item(store, &request)?;
            store
                .load_card(id)?
                .ok_or(BoardError::CardNotFound { id })
        })
    }

    /// Re-space a whole bucket, keeping display order.
    pub fn rebalance_bucket(&self, board: &Board, bucket: &str) -> Result<Vec<Card>, BoardError> {
        self.write_transaction(|store| {
            board.rebalance_bucket(store, bucket, None)?;
            Ok(store.load_bucket(bucket)?)
        })
    }

    // ============================================================
    // Position repair
    // ============================================================

    pub fn analyze_positions(&self, generator: &RankGenerator) -> Result<PositionAnalysis> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let cards = SqliteCardStore::new(&conn).all_cards()?;
        Ok(repair::analyze(generator, &cards))
    }

    /// Plan and, unless `dry_run`, apply a repair in one transaction.
    ///
    /// With `Regenerate`, an id filter selects the buckets holding those
    /// cards; each selected bucket is re-spaced as a whole.
    pub fn repair_positions(
        &self,
        board: &Board,
        strategy: RepairStrategy,
        filter: &RepairFilter,
        dry_run: bool,
    ) -> Result<RepairPlan, BoardError> {
        self.write_transaction(|store| {
            let mut buckets: BTreeMap<String, Vec<StoredCard>> = BTreeMap::new();
            for card in store.all_cards()? {
                buckets.entry(card.bucket.clone()).or_default().push(card);
            }

            let mut plan = RepairPlan {
                strategy,
                changes: BTreeMap::new(),
            };

            for (bucket, cards) in buckets {
                if !filter.matches_bucket(&bucket) {
                    continue;
                }
                if strategy == RepairStrategy::Regenerate
                    && !filter.ids.is_empty()
                    && !cards.iter().any(|c| filter.ids.contains(&c.id))
                {
                    continue;
                }

                let ranks = repair::plan_bucket(board.generator(), &cards, strategy, &filter.ids)?;
                if ranks.is_empty() {
                    continue;
                }
                if !dry_run {
                    store.write_positions(&ranks)?;
                }

                let changes = ranks
                    .into_iter()
                    .map(|(card_id, rank)| PositionChange {
                        card_id,
                        old: cards
                            .iter()
                            .find(|c| c.id == card_id)
                            .and_then(|c| c.position.clone()),
                        new: rank.into_string(),
                    })
                    .collect();
                plan.changes.insert(bucket, changes);
            }

            tracing::info!(
                strategy = strategy.as_str(),
                changes = plan.len(),
                dry_run,
                "Planned position repair"
            );
            Ok(plan)
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
