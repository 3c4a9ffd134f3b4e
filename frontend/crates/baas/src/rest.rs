//! Table Service (`/rest/v1`)

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::BaasClient;
use crate::error::{BaasError, BaasResult};
use crate::query::Query;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

impl BaasClient {
    /// Rows matching `query`
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> BaasResult<Vec<T>> {
        if query.is_single() {
            return self.select_single(query).await.map(|row| vec![row]);
        }
        let request = self
            .request(Method::GET, &table_path(query))?
            .query(&query.to_pairs());
        self.send_json(request).await
    }

    /// Exactly one row; zero or several rows is a 406 from the server
    pub async fn select_single<T: DeserializeOwned>(&self, query: &Query) -> BaasResult<T> {
        let request = self
            .request(Method::GET, &table_path(query))?
            .query(&query.to_pairs())
            .header("Accept", SINGLE_OBJECT);
        self.send_json(request).await
    }

    /// First matching row, if any
    pub async fn select_maybe<T: DeserializeOwned>(&self, query: &Query) -> BaasResult<Option<T>> {
        let rows: Vec<T> = self.select(&query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Exact number of matching rows
    pub async fn count(&self, query: &Query) -> BaasResult<u64> {
        let request = self
            .request(Method::HEAD, &table_path(query))?
            .query(&query.to_pairs())
            .header("Prefer", "count=exact");
        let response = self.send_raw(request).await?;
        let header = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| BaasError::Decode("Missing Content-Range header".into()))?;
        parse_content_range_total(header)
    }

    /// Insert one row and return it as stored
    pub async fn insert<B, T>(&self, table: &str, row: &B) -> BaasResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::POST, &format!("rest/v1/{}", table))?
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(row);
        self.send_json(request).await
    }

    /// Apply `patch` to the rows matched by `query`
    pub async fn update<B, T>(&self, query: &Query, patch: &B) -> BaasResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        ensure_filtered(query)?;
        let request = self
            .request(Method::PATCH, &table_path(query))?
            .query(&query.filter_pairs())
            .header("Prefer", "return=representation")
            .json(patch);
        self.send_json(request).await
    }

    pub async fn delete(&self, query: &Query) -> BaasResult<()> {
        ensure_filtered(query)?;
        let request = self
            .request(Method::DELETE, &table_path(query))?
            .query(&query.filter_pairs());
        self.send_empty(request).await
    }
}

fn table_path(query: &Query) -> String {
    format!("rest/v1/{}", query.table_name())
}

/// Unfiltered mutations would touch every row
fn ensure_filtered(query: &Query) -> BaasResult<()> {
    if query.has_filters() {
        Ok(())
    } else {
        Err(BaasError::InvalidRequest(format!(
            "Refusing to modify every row of {}",
            query.table_name()
        )))
    }
}

/// Total from `Content-Range: 0-9/42` or `*/0`
fn parse_content_range_total(header: &str) -> BaasResult<u64> {
    header
        .rsplit('/')
        .next()
        .and_then(|total| total.trim().parse().ok())
        .ok_or_else(|| BaasError::Decode(format!("Unexpected Content-Range: {}", header)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_range_total() {
        assert_eq!(parse_content_range_total("0-9/42").unwrap(), 42);
        assert_eq!(parse_content_range_total("*/0").unwrap(), 0);
        assert!(parse_content_range_total("0-9/*").is_err());
    }

    #[test]
    fn test_unfiltered_mutation_is_refused() {
        let err = ensure_filtered(&Query::table("applications")).unwrap_err();
        assert!(matches!(err, BaasError::InvalidRequest(_)));
        assert!(ensure_filtered(&Query::table("applications").eq("id", 1)).is_ok());
    }

    #[tokio::test]
    async fn test_delete_without_filter_sends_nothing() {
        let client = BaasClient::new(
            crate::config::BaasConfig::new("http://127.0.0.1:9", "anon").unwrap(),
        )
        .unwrap();
        let err = client.delete(&Query::table("messages")).await.unwrap_err();
        assert!(matches!(err, BaasError::InvalidRequest(_)));
    }
}
