//! Lazy, paginated child listing
//!
//! Turns a container's page-by-page listing into one iterator of entries.
//! A page is requested only once the previous one has been handed out.

use crate::drive::{Entry, RemoteNamespace};
use crate::error::Result;

/// Single-pass iterator over every child of a container
///
/// Yields entries in the order the remote returns them. The first error
/// is yielded once and the iterator is finished afterwards.
pub struct Listing<'a, C: RemoteNamespace + ?Sized> {
    client: &'a C,
    container_id: String,
    folders_only: bool,
    current: std::vec::IntoIter<Entry>,
    next_token: Option<String>,
    started: bool,
    finished: bool,
    pages_fetched: usize,
}

impl<'a, C: RemoteNamespace + ?Sized> Listing<'a, C> {
    /// Prepare a listing; nothing is fetched until the first `next()`
    pub fn new(client: &'a C, container_id: impl Into<String>, folders_only: bool) -> Self {
        Self {
            client,
            container_id: container_id.into(),
            folders_only,
            current: Vec::new().into_iter(),
            next_token: None,
            started: false,
            finished: false,
            pages_fetched: 0,
        }
    }

    /// Container being listed
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Number of pages requested so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}

impl<C: RemoteNamespace + ?Sized> Iterator for Listing<'_, C> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                return Some(Ok(entry));
            }
            if self.finished {
                return None;
            }

            let token = if self.started {
                match self.next_token.take() {
                    Some(token) => Some(token),
                    None => {
                        self.finished = true;
                        return None;
                    }
                }
            } else {
                None
            };
            self.started = true;

            match self
                .client
                .list_page(&self.container_id, token.as_deref(), self.folders_only)
            {
                Ok(page) => {
                    self.pages_fetched += 1;
                    tracing::debug!(
                        "Fetched page {} of {} ({} entries)",
                        self.pages_fetched,
                        self.container_id,
                        page.entries.len()
                    );
                    // An empty token ends the listing just like a missing one
                    self.next_token = page.next_page_token.filter(|t| !t.is_empty());
                    self.current = page.entries.into_iter();
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// List every child of `container_id`, optionally folders only
pub fn list_all<'a, C: RemoteNamespace + ?Sized>(
    client: &'a C,
    container_id: &str,
    folders_only: bool,
) -> Listing<'a, C> {
    Listing::new(client, container_id, folders_only)
}
