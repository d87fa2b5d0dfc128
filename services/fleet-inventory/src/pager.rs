//! Token-Based Pagination
//!
//! Turns a page-fetch function into a lazy stream of items. The next page is
//! requested only after the previous page's items have been consumed.

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};

/// One page of a list response
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the following page; `None` or empty on the last page
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        // Empty tokens are how JSON APIs say "no more pages"
        let next_page_token = next_page_token.filter(|t| !t.is_empty());
        Self {
            items,
            next_page_token,
        }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

/// A paginated collection
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;
    type Error: Send;

    /// Fetch the page identified by `page_token` (`None` for the first page)
    async fn fetch_page(&self, page_token: Option<&str>) -> Result<Page<Self::Item>, Self::Error>;

    /// Error to raise when the server hands back the token it was just sent
    fn stalled(&self, token: &str) -> Self::Error;
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Lazily stream every item of `source`, in server order
pub fn items<S>(source: &S) -> impl Stream<Item = Result<S::Item, S::Error>> + Send + '_
where
    S: PageSource,
{
    stream::try_unfold(Cursor::Start, move |cursor| async move {
        let sent = match cursor {
            Cursor::Done => return Ok(None),
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
        };

        let page = source.fetch_page(sent.as_deref()).await?;

        let next = match page.next_page_token {
            Some(token) if sent.as_deref() == Some(token.as_str()) => {
                return Err(source.stalled(&token));
            }
            Some(token) => Cursor::Next(token),
            None => Cursor::Done,
        };

        Ok(Some((page.items, next)))
    })
    .map_ok(|page_items| stream::iter(page_items.into_iter().map(Ok)))
    .try_flatten()
}

/// Collect every item of `source` into a vector
pub async fn collect_all<S>(source: &S) -> Result<Vec<S::Item>, S::Error>
where
    S: PageSource,
{
    items(source).try_collect().await
}
