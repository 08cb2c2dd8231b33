//! External playlist/track metadata provider seam

use crate::classifier::{ExternalKind, ExternalRef};
use crate::error::ProviderError;
use async_trait::async_trait;

/// One entry of a provider playlist page
///
/// `name` is `None` when the provider returned an entry without a playable
/// item (removed or local tracks).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: Option<String>,
    pub artists: Vec<String>,
}

/// One page of playlist entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPage {
    pub items: Vec<CatalogEntry>,
    /// Total number of entries the provider reports for the playlist
    pub total: u32,
}

/// Metadata of one referenced item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub kind: ExternalKind,
    pub id: String,
    pub name: Option<String>,
    pub artists: Vec<String>,
}

/// Catalog API of the external provider
///
/// Implementations cache their access credential and refresh it lazily.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Obtains or refreshes the access credential
    async fn authorize(&self) -> Result<(), ProviderError>;

    /// Fetches `limit` playlist entries starting at `offset`
    async fn fetch_page(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<CatalogPage, ProviderError>;

    /// Fetches the metadata of a single reference
    async fn fetch_item(&self, reference: &ExternalRef) -> Result<CatalogItem, ProviderError>;
}
