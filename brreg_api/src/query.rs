//! Query builder for the `/enheter` search endpoint.

use url::Url;

/// Default number of hits requested per search. Ten is enough to pick a
/// best match without paging.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Name search against `/enheter`.
#[derive(Clone, Debug)]
pub struct SearchQuery {
    /// Free-text name to search for (`navn`).
    pub name: String,
    /// Hits per page (`size`).
    pub size: u32,
}

impl SearchQuery {
    /// Creates a name search with the default page size.
    pub fn by_name(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the number of hits per page.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Appends this query's parameters to the given URL, returning the modified URL.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("navn", &self.name)
            .append_pair("size", &self.size.to_string());
        url
    }
}
