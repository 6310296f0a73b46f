//! Supabase `PostgREST` remote store

use reqwest::{Client, RequestBuilder};

use super::{InboundRow, OutboundRow, RemoteError, RemoteResult, RemoteStore};
use crate::auth::Principal;
use crate::config::RemoteConfig;
use crate::sync::{SyncRecord, Table};
use crate::util::parse_api_error;

/// Remote store speaking to `{project}/rest/v1/{table}`.
///
/// Row-level security on the server restricts rows to `auth.uid()`; reads also
/// filter on `user_id` explicitly.
#[derive(Clone)]
pub struct PostgrestRemote {
    rest_url: String,
    anon_key: String,
    client: Client,
}

impl PostgrestRemote {
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        Ok(Self {
            rest_url: config.rest_url(),
            anon_key: config.anon_key().to_string(),
            client: Client::builder().timeout(config.request_timeout()).build()?,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.rest_url, table.name())
    }

    fn authorized(&self, request: RequestBuilder, principal: &Principal) -> RemoteResult<RequestBuilder> {
        let token = principal
            .access_token
            .as_deref()
            .ok_or_else(|| RemoteError::MissingToken(principal.id.clone()))?;
        Ok(request
            .header("apikey", &self.anon_key)
            .bearer_auth(token))
    }
}

impl RemoteStore for PostgrestRemote {
    async fn upsert<T: SyncRecord>(
        &self,
        principal: &Principal,
        rows: &[OutboundRow<'_, T>],
    ) -> RemoteResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let request = self.authorized(
            self.client
                .post(self.table_url(T::TABLE))
                .query(&[("on_conflict", "id")])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(rows),
            principal,
        )?;

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api(parse_api_error(status, &body)));
        }

        tracing::debug!("Upserted {} rows into remote {}", rows.len(), T::TABLE);
        Ok(())
    }

    async fn select_all<T: SyncRecord>(&self, principal: &Principal) -> RemoteResult<Vec<T>> {
        let owner_filter = format!("eq.{}", principal.id);
        let request = self.authorized(
            self.client
                .get(self.table_url(T::TABLE))
                .query(&[("select", "*"), ("user_id", owner_filter.as_str())])
                .header("Accept", "application/json"),
            principal,
        )?;

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api(parse_api_error(status, &body)));
        }

        let body = response.text().await?;
        let rows: Vec<InboundRow<T>> = serde_json::from_str(&body).map_err(|error| {
            RemoteError::InvalidPayload(format!("{} rows: {error}", T::TABLE))
        })?;
        Ok(rows.into_iter().map(|row| row.record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;

    fn remote() -> PostgrestRemote {
        let config = RemoteConfig::new("https://demo.supabase.co", "anon").unwrap();
        PostgrestRemote::new(&config).unwrap()
    }

    #[test]
    fn table_url_uses_rest_path() {
        assert_eq!(
            remote().table_url(Table::Connections),
            "https://demo.supabase.co/rest/v1/connections"
        );
    }

    #[tokio::test]
    async fn requests_require_access_token() {
        let remote = remote();
        let principal = Principal::new("user-1");
        let session = Session::new("Keynote");

        let error = remote
            .upsert(&principal, &[OutboundRow::new(&session, &principal)])
            .await
            .unwrap_err();
        assert!(matches!(error, RemoteError::MissingToken(_)));

        let error = remote.select_all::<Session>(&principal).await.unwrap_err();
        assert!(matches!(error, RemoteError::MissingToken(_)));
    }

    #[tokio::test]
    async fn empty_upsert_makes_no_request() {
        let principal = Principal::new("user-1");
        remote()
            .upsert::<Session>(&principal, &[])
            .await
            .unwrap();
    }
}
