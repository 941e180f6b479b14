//! [`CacheStore`] implementation for [`CacheDb`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

use super::CacheStore;
use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::http::{Request, Response};

/// An entry as written to the `entries` table.
struct EntryRow {
    key: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!("only GET requests can be cached, got {}", request.method)));
        }

        Ok(Self {
            key: compute_cache_key(&request.method, &request.url),
            method: request.method.clone(),
            url: request.url.as_str().to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
        })
    }
}

/// Columns read back for a match.
type MatchRow = (u16, String, String, Vec<u8>);

fn decode(row: MatchRow) -> Result<Response, Error> {
    let (status, status_text, headers_json, body) = row;
    let headers: BTreeMap<String, String> = serde_json::from_str(&headers_json)?;
    Ok(Response { status, status_text, headers, body: body.into() })
}

fn ensure_namespace(conn: &rusqlite::Connection, namespace: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO namespaces (name, created_at, seq)
         VALUES (?1, ?2, (SELECT COALESCE(MAX(seq), 0) + 1 FROM namespaces))",
        params![namespace, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn write_entry(conn: &rusqlite::Connection, namespace: &str, row: &EntryRow) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO entries (namespace, key, method, url, status, status_text, headers_json, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(namespace, key) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            namespace,
            &row.key,
            &row.method,
            &row.url,
            row.status,
            &row.status_text,
            &row.headers_json,
            &row.body,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_namespace(conn, &namespace)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM namespaces ORDER BY seq ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_in(&self, namespace: &str, request: &Request) -> Result<Option<Response>, Error> {
        let namespace = namespace.to_string();
        let key = compute_cache_key(&request.method, &request.url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<MatchRow>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status, status_text, headers_json, body FROM entries
                         WHERE namespace = ?1 AND key = ?2",
                        params![namespace, key],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(decode).transpose()
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = compute_cache_key(&request.method, &request.url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<MatchRow>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.status_text, e.headers_json, e.body
                         FROM entries e JOIN namespaces n ON n.name = e.namespace
                         WHERE e.key = ?1
                         ORDER BY n.seq ASC
                         LIMIT 1",
                        params![key],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(decode).transpose()
    }

    async fn put(&self, namespace: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let namespace = namespace.to_string();
        let row = EntryRow::new(request, response)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_namespace(conn, &namespace)?;
                write_entry(conn, &namespace, &row)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, namespace: &str, entries: Vec<(Request, Response)>) -> Result<(), Error> {
        let namespace = namespace.to_string();
        let rows = entries
            .iter()
            .map(|(request, response)| EntryRow::new(request, response))
            .collect::<Result<Vec<_>, _>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_namespace(&tx, &namespace)?;
                for row in &rows {
                    write_entry(&tx, &namespace, row)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, namespace: &str) -> Result<bool, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM namespaces WHERE name = ?1", params![namespace])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, namespace: &str) -> Result<Vec<String>, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE namespace = ?1 ORDER BY url ASC")?;
                let urls = stmt
                    .query_map(params![namespace], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn get(path: &str) -> Request {
        Request::get(Url::parse("https://example.com").unwrap().join(path).unwrap())
    }

    fn ok(body: &'static str) -> Response {
        Response::new(200, body).status_text("OK").header("content-type", "text/css")
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("/static/css/output.css");

        db.put("app-v1", &request, &ok("body{}")).await.unwrap();

        let hit = db.match_in("app-v1", &request).await.unwrap().unwrap();
        assert_eq!(hit.status, 200);
        assert_eq!(hit.status_text, "OK");
        assert_eq!(hit.content_type(), Some("text/css"));
        assert_eq!(hit.text(), "body{}");

        assert!(db.match_any(&request).await.unwrap().is_some());
        assert!(db.match_in("app-v2", &request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.match_any(&get("/nothing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("/search/");

        db.put("app-v1", &request, &ok("first")).await.unwrap();
        db.put("app-v1", &request, &ok("second")).await.unwrap();

        let hit = db.match_in("app-v1", &request).await.unwrap().unwrap();
        assert_eq!(hit.text(), "second");
        assert_eq!(db.entries("app-v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_rejects_non_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = Request::new("POST", Url::parse("https://example.com/book/1/progress/").unwrap());

        let result = db.put("app-v1", &request, &ok("")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(db.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("app-v2").await.unwrap();
        db.open("app-v1").await.unwrap();
        db.open("app-v2").await.unwrap();

        assert_eq!(db.keys().await.unwrap(), vec!["app-v2".to_string(), "app-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_namespace() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("/");
        db.put("app-v1", &request, &ok("old")).await.unwrap();
        db.put("app-v2", &request, &ok("new")).await.unwrap();

        assert_eq!(db.match_any(&request).await.unwrap().unwrap().text(), "old");
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = get("/media/books/42.epub");
        db.put("app-v1", &request, &ok("epub")).await.unwrap();

        assert!(db.delete("app-v1").await.unwrap());
        assert!(!db.delete("app-v1").await.unwrap());
        assert!(db.match_any(&request).await.unwrap().is_none());
        assert!(db.entries("app-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_all_is_atomic() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![
            (get("/"), ok("home")),
            (Request::new("POST", Url::parse("https://example.com/x").unwrap()), ok("nope")),
        ];

        assert!(db.put_all("app-v1", entries).await.is_err());
        assert!(db.keys().await.unwrap().is_empty());

        let entries = vec![(get("/"), ok("home")), (get("/offline/"), ok("offline"))];
        db.put_all("app-v1", entries).await.unwrap();
        assert_eq!(
            db.entries("app-v1").await.unwrap(),
            vec!["https://example.com/".to_string(), "https://example.com/offline/".to_string()]
        );
    }

    #[tokio::test]
    async fn test_match_ignores_fragment() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("app-v1", &get("/book/1/"), &ok("book")).await.unwrap();

        let hit = db.match_any(&get("/book/1/#chapter-2")).await.unwrap();
        assert!(hit.is_some());
    }
}
