//! Exhaustive, offset-paginated ticket search.
//!
//! A [`PageSource`] knows how to fetch one page from one endpoint. [`collect`]
//! drives any source to exhaustion with one set of termination rules, so the
//! JQL search endpoint and the agile epic listing behave identically even
//! though they report totals differently.

use crate::errors::Result;
use crate::models::ticket::Ticket;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;

/// One page as returned by a provider, before normalization.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub tickets: Vec<Ticket>,
    /// `None` or `Some(0)` means the provider did not report a usable total.
    pub reported_total: Option<u32>,
}

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, start_at: u32, page_size: u32) -> Result<SearchPage>;

    /// Short description used in logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TotalCount {
    Reported(u32),
    /// Best-effort guess from the records seen; the provider gave no total.
    Inferred(u32),
}

impl TotalCount {
    pub fn value(&self) -> u32 {
        match self {
            TotalCount::Reported(n) | TotalCount::Inferred(n) => *n,
        }
    }

    pub fn is_inferred(&self) -> bool {
        matches!(self, TotalCount::Inferred(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub page_size: u32,
    /// Stop once this many tickets are collected.
    pub limit: Option<usize>,
}

impl SearchOptions {
    pub fn exhaustive(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            limit: None,
        }
    }

    pub fn limited(page_size: u32, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            page_size: page_size.clamp(1, limit.min(u32::MAX as usize) as u32),
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub tickets: Vec<Ticket>,
    pub total: TotalCount,
    #[serde(skip)]
    pub pages_fetched: u32,
}

/// Fetches pages from `source` until the result set is exhausted.
///
/// Any page error aborts the whole search and nothing collected so far is
/// returned.
pub async fn collect<S>(source: &S, options: SearchOptions) -> Result<SearchResults>
where
    S: PageSource + ?Sized,
{
    let page_size = options.page_size.max(1);
    let mut start: u32 = 0;
    let mut estimate: u32 = 0;
    let mut inferred = false;
    let mut pages_fetched = 0;
    let mut seen: HashSet<String> = HashSet::new();
    let mut tickets: Vec<Ticket> = Vec::new();

    loop {
        let page = source.fetch_page(start, page_size).await?;
        pages_fetched += 1;
        let received = page.tickets.len() as u32;

        tracing::debug!(
            source = %source.describe(),
            start,
            received,
            reported_total = ?page.reported_total,
            "fetched page"
        );

        if received == 0 {
            break;
        }

        let mut added = 0;
        for mut ticket in page.tickets {
            if !seen.insert(ticket.key.clone()) {
                tracing::warn!(key = %ticket.key, "skipping duplicate ticket returned by provider");
                continue;
            }
            ticket.normalize_description();
            tickets.push(ticket);
            added += 1;
        }

        let consumed = start.saturating_add(received);
        match page.reported_total {
            Some(total) if total > 0 => {
                inferred = false;
                estimate = total;
            }
            _ => {
                // A full page means another one may follow.
                let guess = if received >= page_size {
                    consumed.saturating_add(1)
                } else {
                    consumed
                };
                if !inferred {
                    tracing::debug!("provider reported no total; inferring from records seen");
                }
                inferred = true;
                estimate = estimate.max(guess);
            }
        }

        if let Some(limit) = options.limit {
            if tickets.len() >= limit {
                tickets.truncate(limit);
                break;
            }
        }

        if consumed >= estimate {
            break;
        }

        if added == 0 {
            tracing::warn!(start, "page contained no new tickets; stopping");
            break;
        }

        start = start.saturating_add(page_size);
    }

    let total = if inferred {
        TotalCount::Inferred(tickets.len() as u32)
    } else if estimate == 0 {
        TotalCount::Reported(tickets.len() as u32)
    } else {
        TotalCount::Reported(estimate)
    };

    Ok(SearchResults {
        tickets,
        total,
        pages_fetched,
    })
}
