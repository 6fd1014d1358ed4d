//! Resource services built on the shared request engine.

pub mod caches;
pub mod files;
pub mod models;

pub use caches::*;
pub use files::*;
pub use models::*;

use std::sync::Arc;

use crate::pager::PageFetcher;
use crate::transport::{ApiClient, RequestDescriptor};

/// Fetcher issuing `GET {path}` with the paging parameters as query.
pub(crate) fn list_fetcher(api_client: ApiClient, path: String) -> PageFetcher {
    Arc::new(move |params| {
        let api_client = api_client.clone();
        let descriptor = RequestDescriptor::get(path.clone())
            .with_optional_query("pageSize", params.page_size)
            .with_optional_query("pageToken", params.page_token)
            .with_optional_query("filter", params.filter);
        Box::pin(async move { api_client.request(descriptor).await?.json_value() })
    })
}
