//! Restartable paging over list calls.
//!
//! A [`Pager`] holds one page of items and the parameters for the next request.
//! The continuation cursor returned by the server is written back into those
//! parameters, so [`Pager::has_next_page`] is simply "is there a cursor".

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{GenAiResult, RequestError, ResponseError};
use crate::types::ListParams;

/// Collection a pager walks. The name is also the key holding the items in each
/// list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagedItem {
    Models,
    Files,
    CachedContents,
    BatchJobs,
    TuningJobs,
}

impl PagedItem {
    /// Response key of the item array.
    pub fn key(self) -> &'static str {
        match self {
            PagedItem::Models => "models",
            PagedItem::Files => "files",
            PagedItem::CachedContents => "cachedContents",
            PagedItem::BatchJobs => "batchJobs",
            PagedItem::TuningJobs => "tuningJobs",
        }
    }
}

impl fmt::Display for PagedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Issues one list request and returns the raw response body.
pub type PageFetcher = Arc<dyn Fn(ListParams) -> BoxFuture<'static, GenAiResult<Value>> + Send + Sync>;

/// One page of a list call plus the means to fetch the next.
pub struct Pager<T> {
    name: PagedItem,
    fetcher: PageFetcher,
    params: ListParams,
    page: Vec<T>,
    page_size: usize,
}

impl<T: DeserializeOwned> Pager<T> {
    /// Fetches the first page.
    pub async fn create(name: PagedItem, params: ListParams, fetcher: PageFetcher) -> GenAiResult<Self> {
        let response = fetcher(params.clone()).await?;
        Self::from_response(name, fetcher, params, &response)
    }

    /// Builds a pager around an already fetched first page.
    pub fn from_response(
        name: PagedItem,
        fetcher: PageFetcher,
        params: ListParams,
        response: &Value,
    ) -> GenAiResult<Self> {
        let mut pager = Self {
            name,
            fetcher,
            params,
            page: Vec::new(),
            page_size: 0,
        };
        pager.load(response)?;
        Ok(pager)
    }

    fn load(&mut self, response: &Value) -> GenAiResult<()> {
        self.page = match response.get(self.name.key()) {
            Some(items) => serde_json::from_value(items.clone()).map_err(|e| {
                ResponseError::DeserializationError {
                    message: format!("{}: {e}", self.name),
                }
            })?,
            None => Vec::new(),
        };
        self.page_size = self
            .params
            .page_size
            .map_or(self.page.len(), |size| size as usize);
        self.params.page_token = response
            .get("nextPageToken")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        tracing::debug!(
            collection = %self.name,
            items = self.page.len(),
            has_next = self.params.page_token.is_some(),
            "Page loaded"
        );
        Ok(())
    }

    /// Collection being paged.
    pub fn name(&self) -> PagedItem {
        self.name
    }

    /// Items of the current page.
    pub fn page(&self) -> &[T] {
        &self.page
    }

    /// Requested page size, or the length of the current page when none was set.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Parameters that the next request will use.
    pub fn params(&self) -> &ListParams {
        &self.params
    }

    /// True when the last response carried a continuation cursor.
    pub fn has_next_page(&self) -> bool {
        self.params.page_token.is_some()
    }

    /// Replaces the current page with the next one and returns it.
    pub async fn next_page(&mut self) -> GenAiResult<&[T]> {
        if !self.has_next_page() {
            return Err(RequestError::InvalidParameter {
                parameter: "pageToken".to_string(),
                message: "No more pages to fetch.".to_string(),
            }
            .into());
        }
        let response = (self.fetcher)(self.params.clone()).await?;
        self.load(&response)?;
        Ok(&self.page)
    }
}

impl<T: DeserializeOwned + Send + 'static> Pager<T> {
    /// Yields items one at a time, fetching further pages as each is exhausted.
    ///
    /// Ends without error when no cursor remains. A failed fetch is yielded once
    /// and ends the sequence.
    pub fn into_stream(mut self) -> impl Stream<Item = GenAiResult<T>> + Send {
        let items = std::mem::take(&mut self.page).into_iter();
        futures::stream::unfold(Some((self, items)), |state| async move {
            let (mut pager, mut items) = state?;
            loop {
                if let Some(item) = items.next() {
                    return Some((Ok(item), Some((pager, items))));
                }
                if !pager.has_next_page() {
                    return None;
                }
                match pager.next_page().await {
                    Ok(_) => items = std::mem::take(&mut pager.page).into_iter(),
                    Err(e) => return Some((Err(e), None)),
                }
            }
        })
    }
}

impl<T: fmt::Debug> fmt::Debug for Pager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pager")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("page", &self.page)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use parking_lot::Mutex;
    use serde_json::json;

    fn scripted(pages: Vec<Value>) -> (PageFetcher, Arc<Mutex<Vec<ListParams>>>) {
        let pages = Arc::new(Mutex::new(pages.into_iter()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&seen);
        let fetcher: PageFetcher = Arc::new(move |params| {
            recorded.lock().push(params);
            let next = pages.lock().next().unwrap_or_else(|| json!({}));
            Box::pin(async move { Ok(next) })
        });
        (fetcher, seen)
    }

    #[tokio::test]
    async fn test_single_page_terminates() {
        let (fetcher, seen) = scripted(vec![json!({"files": [{"name": "files/a"}, {"name": "files/b"}]})]);

        let pager: Pager<Value> = Pager::create(PagedItem::Files, ListParams::default(), fetcher)
            .await
            .unwrap();
        assert!(!pager.has_next_page());
        assert_eq!(pager.page_size(), 2);

        let items: Vec<Value> = pager.into_stream().map(Result::unwrap).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_cursor_is_forwarded() {
        let (fetcher, seen) = scripted(vec![
            json!({"models": [{"name": "models/a"}], "nextPageToken": "t1"}),
            json!({"models": [{"name": "models/b"}]}),
        ]);

        let mut pager: Pager<Value> = Pager::create(PagedItem::Models, ListParams::with_page_size(1), fetcher)
            .await
            .unwrap();
        assert!(pager.has_next_page());

        let page = pager.next_page().await.unwrap();
        assert_eq!(page[0]["name"], "models/b");
        assert!(!pager.has_next_page());
        assert_eq!(seen.lock()[1].page_token.as_deref(), Some("t1"));
        assert_eq!(seen.lock()[1].page_size, Some(1));
    }

    #[tokio::test]
    async fn test_next_page_without_cursor_fails() {
        let (fetcher, _) = scripted(vec![json!({"files": []})]);
        let mut pager: Pager<Value> = Pager::create(PagedItem::Files, ListParams::default(), fetcher)
            .await
            .unwrap();

        let error = pager.next_page().await.unwrap_err();
        assert!(error.to_string().contains("No more pages to fetch."));
    }

    #[tokio::test]
    async fn test_stream_walks_all_pages() {
        let (fetcher, _) = scripted(vec![
            json!({"cachedContents": [{"name": "c1"}], "nextPageToken": "t1"}),
            json!({"cachedContents": [], "nextPageToken": "t2"}),
            json!({"cachedContents": [{"name": "c2"}, {"name": "c3"}]}),
        ]);
        let pager: Pager<Value> = Pager::create(PagedItem::CachedContents, ListParams::default(), fetcher)
            .await
            .unwrap();

        let names: Vec<String> = pager
            .into_stream()
            .map(|item| item.unwrap()["name"].as_str().unwrap().to_string())
            .collect()
            .await;
        assert_eq!(names, vec!["c1", "c2", "c3"]);
    }
}
