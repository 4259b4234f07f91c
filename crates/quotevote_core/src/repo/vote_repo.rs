//! Vote ledger contracts and SQLite implementation.
//!
//! # Responsibility
//! - Record ballots under the `(quote_id, voter_identity)` uniqueness rule.
//! - Remove all ballots of one quote for cascade deletion.
//! - Reconcile ballot counts against cached quote tallies.
//!
//! # Invariants
//! - `record_vote` never overwrites; a repeated pair fails with
//!   `RepoError::DuplicateBallot`, whether caught by the pre-check or by the
//!   unique index.
//! - Ballots always reference an existing quote (foreign key).

use crate::model::ballot::{Ballot, VoterIdentity};
use crate::model::quote::QuoteId;
use crate::model::tally::TallyMismatch;
use crate::repo::{is_foreign_key_violation, is_unique_violation, RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Repository interface for ballot records.
pub(crate) trait VoteLedger {
    fn has_voted(&self, quote_id: QuoteId, voter: &VoterIdentity) -> RepoResult<bool>;
    fn record_vote(&self, quote_id: QuoteId, voter: &VoterIdentity) -> RepoResult<Ballot>;
    /// Deletes every ballot of `quote_id` and returns how many were removed.
    fn delete_all_for_quote(&self, quote_id: QuoteId) -> RepoResult<usize>;
    fn count_for_quote(&self, quote_id: QuoteId) -> RepoResult<u64>;
    /// Lists quotes whose tally differs from their ballot count, by id.
    fn tally_mismatches(&self) -> RepoResult<Vec<TallyMismatch>>;
}

/// SQLite-backed vote ledger.
pub(crate) struct SqliteVoteLedger<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVoteLedger<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl VoteLedger for SqliteVoteLedger<'_> {
    fn has_voted(&self, quote_id: QuoteId, voter: &VoterIdentity) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM votes
                WHERE quote_id = ?1 AND voter_identity = ?2
            );",
            params![quote_id, voter.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn record_vote(&self, quote_id: QuoteId, voter: &VoterIdentity) -> RepoResult<Ballot> {
        let inserted = self.conn.execute(
            "INSERT INTO votes (quote_id, voter_identity) VALUES (?1, ?2);",
            params![quote_id, voter.as_str()],
        );
        match inserted {
            Ok(_) => Ok(Ballot {
                id: self.conn.last_insert_rowid(),
                quote_id,
                voter: voter.clone(),
            }),
            Err(err) if is_unique_violation(&err) => Err(RepoError::DuplicateBallot {
                quote_id,
                voter: voter.clone(),
            }),
            Err(err) if is_foreign_key_violation(&err) => Err(RepoError::NotFound(quote_id)),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_all_for_quote(&self, quote_id: QuoteId) -> RepoResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM votes WHERE quote_id = ?1;", [quote_id])?;
        Ok(deleted)
    }

    fn count_for_quote(&self, quote_id: QuoteId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM votes WHERE quote_id = ?1;",
            [quote_id],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative ballot count `{count}`")))
    }

    fn tally_mismatches(&self) -> RepoResult<Vec<TallyMismatch>> {
        let mut stmt = self.conn.prepare(
            "SELECT q.id, q.vote_count, COUNT(v.id) AS ballots
             FROM quotes q
             LEFT JOIN votes v ON v.quote_id = q.id
             GROUP BY q.id
             HAVING q.vote_count <> COUNT(v.id)
             ORDER BY q.id ASC;",
        )?;
        let mismatches = stmt
            .query_map([], |row| {
                Ok(TallyMismatch {
                    quote_id: row.get(0)?,
                    vote_count: row.get(1)?,
                    ballots: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(mismatches)
    }
}
