// Remote sources: GeoJSON boundaries and paginated JSON results.

use log::{debug, info};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use circo_results::Row;

use crate::carte::io_common::{next_page_url, rows_from_payload};
use crate::carte::*;

/// Something that returns a JSON document for a URL.
///
/// `what` names the data being loaded, for the error messages.
#[allow(async_fn_in_trait)]
pub trait JsonFetcher {
    async fn get_json(&self, url: &str, what: &str) -> CarteResult<JSValue>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> CarteResult<HttpFetcher> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(HttpRequestSnafu { what: "données" })?;
        Ok(HttpFetcher { client })
    }
}

impl JsonFetcher for HttpFetcher {
    async fn get_json(&self, url: &str, what: &str) -> CarteResult<JSValue> {
        debug!("get_json: GET {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context(HttpRequestSnafu { what })?;
        let status = resp.status();
        ensure!(
            status.is_success(),
            HttpStatusSnafu {
                what,
                status: status.as_u16()
            }
        );
        resp.json::<JSValue>()
            .await
            .context(HttpRequestSnafu { what })
    }
}

/// Follows the `next` links of a paginated results API and concatenates the rows.
///
/// Fails when more than `max_pages` pages would be needed.
pub async fn fetch_paginated_rows<F: JsonFetcher>(
    fetcher: &F,
    url: &str,
    max_pages: usize,
    what: &str,
) -> CarteResult<Vec<Row>> {
    let mut rows: Vec<Row> = Vec::new();
    let mut current = url.to_string();
    let mut pages = 0_usize;
    loop {
        ensure!(pages < max_pages, TooManyPagesSnafu { what, max_pages });
        let payload = fetcher.get_json(&current, what).await?;
        pages += 1;
        ensure!(
            payload.is_array() || payload.get("data").map(|d| d.is_array()).unwrap_or(false),
            UnexpectedPayloadSnafu { what }
        );
        let page_rows = rows_from_payload(&payload);
        debug!(
            "fetch_paginated_rows: page {}: {} rows",
            pages,
            page_rows.len()
        );
        rows.extend(page_rows);
        match next_page_url(&payload) {
            Some(next) if next != current => current = next,
            _ => break,
        }
    }
    info!(
        "fetch_paginated_rows: {} rows in {} page(s) from {}",
        rows.len(),
        pages,
        url
    );
    Ok(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    /// Serves canned documents; unknown URLs answer with a 404.
    pub(crate) struct CannedFetcher {
        pub pages: HashMap<String, JSValue>,
    }

    impl CannedFetcher {
        pub fn new(pages: Vec<(&str, JSValue)>) -> CannedFetcher {
            CannedFetcher {
                pages: pages
                    .into_iter()
                    .map(|(u, js)| (u.to_string(), js))
                    .collect(),
            }
        }
    }

    impl JsonFetcher for CannedFetcher {
        async fn get_json(&self, url: &str, what: &str) -> CarteResult<JSValue> {
            match self.pages.get(url) {
                Some(js) => Ok(js.clone()),
                None => HttpStatusSnafu { what, status: 404_u16 }.fail(),
            }
        }
    }

    fn page(n: usize, next: Option<&str>) -> JSValue {
        json!({
            "data": [{"CodeCirconscription": format!("01{:02}", n), "Voix": n}],
            "links": {"next": next},
        })
    }

    #[tokio::test]
    async fn follows_next_links() {
        let fetcher = CannedFetcher::new(vec![
            ("p1", page(1, Some("p2"))),
            ("p2", page(2, Some("p3"))),
            ("p3", page(3, None)),
        ]);
        let rows = fetch_paginated_rows(&fetcher, "p1", 10, "résultats")
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["CodeCirconscription"], json!("0103"));
    }

    #[tokio::test]
    async fn bare_list_is_one_page() {
        let fetcher = CannedFetcher::new(vec![("u", json!([{"a": 1}, {"a": 2}]))]);
        let rows = fetch_paginated_rows(&fetcher, "u", 1, "résultats")
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn page_guard() {
        let fetcher = CannedFetcher::new(vec![
            ("p1", page(1, Some("p2"))),
            ("p2", page(2, Some("p3"))),
            ("p3", page(3, None)),
        ]);
        let res = fetch_paginated_rows(&fetcher, "p1", 2, "résultats").await;
        assert!(matches!(
            res,
            Err(CarteError::TooManyPages { max_pages: 2, .. })
        ));
    }

    #[tokio::test]
    async fn self_link_stops() {
        let fetcher = CannedFetcher::new(vec![("p1", page(1, Some("p1")))]);
        let rows = fetch_paginated_rows(&fetcher, "p1", 5, "résultats")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn status_error_message() {
        let fetcher = CannedFetcher::new(vec![]);
        let err = fetch_paginated_rows(&fetcher, "missing", 5, "résultats")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Erreur lors du chargement des résultats (404)"
        );
    }

    #[tokio::test]
    async fn unexpected_payload() {
        let fetcher = CannedFetcher::new(vec![("u", json!({"results": []}))]);
        let res = fetch_paginated_rows(&fetcher, "u", 5, "résultats").await;
        assert!(matches!(res, Err(CarteError::UnexpectedPayload { .. })));
    }
}
