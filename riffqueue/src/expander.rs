//! Playlist expansion
//!
//! Turns an external playlist into an ordered list of search strings by
//! walking the provider's catalog pages.

use crate::classifier::{ExternalKind, ExternalRef};
use crate::error::ProviderError;
use crate::model::SearchString;
use crate::provider::CatalogProvider;
use std::sync::Arc;
use tracing::{debug, warn};

/// Number of entries requested per page
pub const PAGE_SIZE: u32 = 100;

/// Hard bound on the offset reached while paginating
///
/// Applied whatever total the provider reports.
pub const PAGINATION_CAP: u32 = 1000;

/// More entries remain according to the provider
fn below_reported_total(seen: u32, reported_total: u32) -> bool {
    seen < reported_total
}

/// The safety cap has not been reached
fn below_cap(offset: u32) -> bool {
    offset < PAGINATION_CAP
}

/// Expands external references into search strings
#[derive(Clone)]
pub struct PlaylistExpander {
    provider: Arc<dyn CatalogProvider>,
}

impl PlaylistExpander {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        Self { provider }
    }

    /// Expands a playlist, in playlist order
    ///
    /// Provider failures are logged and end the expansion: whatever was
    /// collected before the failure is returned, possibly nothing.
    pub async fn expand(&self, playlist_id: &str) -> Vec<SearchString> {
        let mut queries = Vec::new();
        if let Err(e) = self.collect_playlist(playlist_id, &mut queries).await {
            warn!(
                playlist_id,
                kept = queries.len(),
                "Playlist expansion aborted: {}",
                e
            );
        }
        queries
    }

    /// Expands a single external reference
    ///
    /// A track yields at most one search string. If the provider reports the
    /// reference to be a playlist, the playlist is paginated instead.
    pub async fn expand_item(&self, reference: &ExternalRef) -> Vec<SearchString> {
        if reference.kind == ExternalKind::Playlist {
            return self.expand(&reference.id).await;
        }

        let item = match self.fetch_item(reference).await {
            Ok(item) => item,
            Err(e) => {
                warn!(item_id = %reference.id, "Item lookup failed: {}", e);
                return Vec::new();
            }
        };

        match item.kind {
            ExternalKind::Playlist => self.expand(&item.id).await,
            ExternalKind::Track => SearchString::from_metadata(item.name.as_deref(), &item.artists)
                .into_iter()
                .collect(),
        }
    }

    async fn fetch_item(
        &self,
        reference: &ExternalRef,
    ) -> Result<crate::provider::CatalogItem, ProviderError> {
        self.provider.authorize().await?;
        self.provider.fetch_item(reference).await
    }

    /// Walks the playlist pages, appending one search string per usable entry
    ///
    /// Progress toward the reported total counts every entry received,
    /// including the ones dropped for lack of metadata, not only the search
    /// strings kept. Counting kept strings would make a playlist with removed
    /// tracks request pages past its end until an empty page or the cap.
    async fn collect_playlist(
        &self,
        playlist_id: &str,
        queries: &mut Vec<SearchString>,
    ) -> Result<(), ProviderError> {
        self.provider.authorize().await?;

        let mut offset = 0;
        let mut seen = 0;

        loop {
            let page = self
                .provider
                .fetch_page(playlist_id, offset, PAGE_SIZE)
                .await?;
            offset += PAGE_SIZE;

            let received = page.items.len().min(PAGE_SIZE as usize);
            seen += received as u32;

            let before = queries.len();
            queries.extend(page.items.into_iter().take(received).filter_map(|entry| {
                SearchString::from_metadata(entry.name.as_deref(), &entry.artists)
            }));

            debug!(
                playlist_id,
                offset,
                received,
                kept = queries.len() - before,
                total = page.total,
                "Fetched playlist page"
            );

            if received == 0 || !(below_reported_total(seen, page.total) && below_cap(offset)) {
                break;
            }
        }

        Ok(())
    }
}
