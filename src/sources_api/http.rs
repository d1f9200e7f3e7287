use crate::codec::http::{build_request, decode_body, error_detail, resolve_url};
use crate::config::SourcesApiConfig;
use crate::domain::{Application, Authentication, Endpoint};
use crate::error::Result;
use crate::sources_api::{ApiError, AvailabilityPatch, SourcesApi};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;

/// Sources API client speaking the public v3.1 API plus the internal authentication API.
#[derive(Clone)]
pub struct HttpSourcesApi {
    client: Client,
    base_url: String,
    internal_base_url: String,
    headers: Vec<(String, String)>,
}

impl fmt::Debug for HttpSourcesApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSourcesApi")
            .field("base_url", &self.base_url)
            .field("internal_base_url", &self.internal_base_url)
            .field("headers", &self.headers.len())
            .finish()
    }
}

impl HttpSourcesApi {
    pub fn new(config: &SourcesApiConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new();
        if let Some(connect_timeout) = config.connect_timeout()? {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(request_timeout) = config.request_timeout()? {
            builder = builder.timeout(request_timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
            internal_base_url: config.internal_base_url.clone(),
            headers: Vec::new(),
        })
    }

    /// Headers sent with every request, typically the tenant identity.
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    async fn send<B>(
        &self,
        method: Method,
        base: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<(StatusCode, JsonValue), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = resolve_url(base, path).map_err(|err| ApiError::InvalidRequest(err.to_string()))?;
        let url_text = url.to_string();

        let request = build_request(&self.client, method.clone(), url, &self.headers, body)
            .map_err(|err| ApiError::InvalidRequest(err.to_string()))?;

        tracing::debug!(method = %method, url = %url_text, "sending sources api request");

        let response = request
            .send()
            .await
            .map_err(|err| ApiError::transport(&url_text, err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::transport(&url_text, err.to_string()))?;

        let body = decode_body(&bytes);
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok((status, body));
        }

        Err(ApiError::status(
            url_text,
            status.as_u16(),
            error_detail(&body),
        ))
    }

    async fn get(&self, base: &str, path: &str) -> Result<Option<JsonValue>, ApiError> {
        let (status, body) = self.send::<JsonValue>(Method::GET, base, path, None).await?;
        if status == StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Ok(Some(body))
        }
    }

    /// First record of a collection response (`{"data": [...]}`), if any.
    async fn first_record<T>(&self, path: &str) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let Some(body) = self.get(&self.base_url, path).await? else {
            return Ok(None);
        };

        let first = body
            .get("data")
            .and_then(JsonValue::as_array)
            .and_then(|records| records.first())
            .cloned();

        match first {
            Some(record) => decode_record(&self.base_url, path, record).map(Some),
            None => Ok(None),
        }
    }

    async fn patch(&self, path: &str, patch: &AvailabilityPatch) -> Result<(), ApiError> {
        let (status, body) = self
            .send(Method::PATCH, &self.base_url, path, Some(patch))
            .await?;
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::status(
                format!("{}/{}", self.base_url.trim_end_matches('/'), path),
                status.as_u16(),
                error_detail(&body),
            ));
        }
        Ok(())
    }
}

fn decode_record<T>(base: &str, path: &str, record: JsonValue) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(record).map_err(|err| {
        ApiError::decode(
            format!("{}/{}", base.trim_end_matches('/'), path),
            err.to_string(),
        )
    })
}

#[async_trait]
impl SourcesApi for HttpSourcesApi {
    async fn get_endpoint(&self, source_id: &str) -> Result<Option<Endpoint>, ApiError> {
        self.first_record(&format!("sources/{source_id}/endpoints"))
            .await
    }

    async fn get_application(&self, source_id: &str) -> Result<Option<Application>, ApiError> {
        self.first_record(&format!("sources/{source_id}/applications"))
            .await
    }

    async fn get_authentication(
        &self,
        endpoint_id: &str,
    ) -> Result<Option<Authentication>, ApiError> {
        let listed: Option<Authentication> = self
            .first_record(&format!("endpoints/{endpoint_id}/authentications"))
            .await?;
        let Some(listed) = listed else {
            return Ok(None);
        };

        // The public API never returns secrets; the internal API exposes the password on request.
        let path = format!(
            "authentications/{}?expose_encrypted_attribute[]=password",
            listed.id
        );
        match self.get(&self.internal_base_url, &path).await? {
            Some(body) => decode_record(&self.internal_base_url, &path, body).map(Some),
            None => Ok(None),
        }
    }

    async fn update_source(&self, id: &str, patch: &AvailabilityPatch) -> Result<(), ApiError> {
        self.patch(&format!("sources/{id}"), patch).await
    }

    async fn update_endpoint(&self, id: &str, patch: &AvailabilityPatch) -> Result<(), ApiError> {
        self.patch(&format!("endpoints/{id}"), patch).await
    }

    async fn update_application(
        &self,
        id: &str,
        patch: &AvailabilityPatch,
    ) -> Result<(), ApiError> {
        self.patch(&format!("applications/{id}"), patch).await
    }
}
