//! Quote store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/delete APIs over the `quotes` table.
//! - Provide the ranked, paginated listing.
//! - Own the single-statement tally increment.
//!
//! # Invariants
//! - Write paths validate `NewQuote` before SQL mutations.
//! - Ranking order is `vote_count DESC, id ASC`, so pages are deterministic.
//! - Read paths reject undecodable rows instead of masking them.

use crate::model::page::PageRequest;
use crate::model::quote::{NewQuote, Quote, QuoteId};
use crate::repo::{is_foreign_key_violation, is_unique_violation, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const QUOTE_SELECT_SQL: &str = "SELECT
    id,
    text,
    author,
    tags,
    vote_count
FROM quotes";

/// Repository interface for quote records.
///
/// Crate-internal: writes go through `QuoteBoard` so tallies and ballots move
/// together.
pub(crate) trait QuoteRepository {
    /// Inserts a validated quote with `vote_count = 0`.
    fn create_quote(&self, quote: &NewQuote) -> RepoResult<Quote>;
    fn get_quote(&self, id: QuoteId) -> RepoResult<Option<Quote>>;
    /// Removes one quote. Fails with `BallotsRemain` while ballots reference it.
    fn delete_quote(&self, id: QuoteId) -> RepoResult<()>;
    /// Adds exactly one to the cached tally and returns the updated record.
    fn increment_vote_count(&self, id: QuoteId) -> RepoResult<Quote>;
    /// Returns one ranked page plus the total number of quotes.
    fn list_ranked(&self, request: &PageRequest) -> RepoResult<(Vec<Quote>, u64)>;
}

/// SQLite-backed quote repository.
pub(crate) struct SqliteQuoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuoteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl QuoteRepository for SqliteQuoteRepository<'_> {
    fn create_quote(&self, quote: &NewQuote) -> RepoResult<Quote> {
        let quote = quote.validate()?;
        let tags_json = encode_tags(&quote.tags)?;

        let inserted = self.conn.execute(
            "INSERT INTO quotes (text, author, tags, vote_count)
             VALUES (?1, ?2, ?3, 0);",
            params![quote.text.as_str(), quote.author.as_deref(), tags_json],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => return Err(RepoError::DuplicateText),
            Err(err) => return Err(err.into()),
        }

        Ok(Quote {
            id: self.conn.last_insert_rowid(),
            text: quote.text,
            author: quote.author,
            tags: quote.tags,
            vote_count: 0,
        })
    }

    fn get_quote(&self, id: QuoteId) -> RepoResult<Option<Quote>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{QUOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_quote_row(row)?));
        }

        Ok(None)
    }

    fn delete_quote(&self, id: QuoteId) -> RepoResult<()> {
        let changed = match self.conn.execute("DELETE FROM quotes WHERE id = ?1;", [id]) {
            Ok(changed) => changed,
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(RepoError::BallotsRemain(id))
            }
            Err(err) => return Err(err.into()),
        };

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn increment_vote_count(&self, id: QuoteId) -> RepoResult<Quote> {
        // SQLite turns an overflowing integer sum into REAL; refuse instead.
        let changed = self.conn.execute(
            "UPDATE quotes SET vote_count = vote_count + 1
             WHERE id = ?1 AND vote_count < ?2;",
            params![id, i64::MAX],
        )?;

        if changed == 0 {
            return match self.get_quote(id)? {
                Some(_) => Err(RepoError::InvalidData(format!(
                    "vote_count of quote {id} cannot be incremented past {}",
                    i64::MAX
                ))),
                None => Err(RepoError::NotFound(id)),
            };
        }

        self.get_quote(id)?.ok_or(RepoError::NotFound(id))
    }

    fn list_ranked(&self, request: &PageRequest) -> RepoResult<(Vec<Quote>, u64)> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM quotes;", [], |row| row.get(0))?;
        let total = u64::try_from(total)
            .map_err(|_| RepoError::InvalidData(format!("negative quote count `{total}`")))?;

        if request.offset() >= total {
            return Ok((Vec::new(), total));
        }
        let offset = i64::try_from(request.offset())
            .map_err(|_| RepoError::InvalidData("page offset exceeds row range".to_string()))?;

        let mut stmt = self.conn.prepare_cached(&format!(
            "{QUOTE_SELECT_SQL}
             ORDER BY vote_count DESC, id ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(request.page_size()), offset])?;
        let mut quotes = Vec::new();
        while let Some(row) = rows.next()? {
            quotes.push(parse_quote_row(row)?);
        }

        Ok((quotes, total))
    }
}

fn parse_quote_row(row: &Row<'_>) -> RepoResult<Quote> {
    let id: QuoteId = row.get("id")?;

    let tags_text: String = row.get("tags")?;
    let tags = decode_tags(&tags_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid tags `{tags_text}` in quotes.tags for id {id}: {err}"))
    })?;

    let raw_count: i64 = row.get("vote_count")?;
    let vote_count = u64::try_from(raw_count).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid vote_count value `{raw_count}` in quotes.vote_count for id {id}"
        ))
    })?;

    Ok(Quote {
        id,
        text: row.get("text")?,
        author: row.get("author")?,
        tags,
        vote_count,
    })
}

fn encode_tags(tags: &[String]) -> RepoResult<String> {
    serde_json::to_string(tags)
        .map_err(|err| RepoError::InvalidData(format!("tags could not be encoded: {err}")))
}

fn decode_tags(value: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(value)
}
