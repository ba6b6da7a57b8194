//! Box Content API connector

use std::sync::Arc;

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::config::TemplateRef;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::error::{BoxError, Result};
use crate::types::{
    BoxFile, ClientError, FileMetadataSummary, FolderItem, FolderItemsResponse, MetadataInstances,
    MetadataPatchOp,
};

/// Maximum items per page (Box API limit)
const MAX_PAGE_SIZE: u64 = 1000;

/// Fields to request for folder entries
const ITEM_FIELDS: &str = "type,id,name";

const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// Box API connector
///
/// Issues authenticated calls against the Box Content API with a single
/// access token. Connectors are cheap and built per request.
///
/// # Example
///
/// ```ignore
/// use provider_box::BoxConnector;
///
/// let connector = BoxConnector::new(http_client, "https://api.box.com/2.0", token);
/// let file = connector.get_file("12345").await?;
/// ```
pub struct BoxConnector {
    http_client: Arc<dyn HttpClient>,
    api_base_url: String,
    access_token: String,
}

impl BoxConnector {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// URL of a folder, as used for the `resource` of a downscoped token
    pub fn folder_resource_url(&self, folder_id: &str) -> String {
        format!("{}/folders/{}", self.api_base_url, urlencoding::encode(folder_id))
    }

    /// Fetch a file object.
    #[instrument(skip(self))]
    pub async fn get_file(&self, file_id: &str) -> Result<BoxFile> {
        let url = format!(
            "{}/files/{}",
            self.api_base_url,
            urlencoding::encode(file_id)
        );
        let response = self.send(HttpRequest::get(url)).await?;
        parse(&response)
    }

    /// All metadata instances attached to a file.
    #[instrument(skip(self))]
    pub async fn get_file_metadata(&self, file_id: &str) -> Result<Vec<Value>> {
        let url = format!(
            "{}/files/{}/metadata",
            self.api_base_url,
            urlencoding::encode(file_id)
        );
        let response = self.send(HttpRequest::get(url)).await?;
        let instances: MetadataInstances = parse(&response)?;
        debug!("Fetched {} metadata instances", instances.entries.len());
        Ok(instances.entries)
    }

    /// Every item in a folder, following offset pagination.
    #[instrument(skip(self))]
    pub async fn list_folder_items(&self, folder_id: &str) -> Result<Vec<FolderItem>> {
        let mut items = Vec::new();
        let mut offset = 0u64;

        loop {
            let url = format!(
                "{}/folders/{}/items?fields={}&limit={}&offset={}",
                self.api_base_url,
                urlencoding::encode(folder_id),
                ITEM_FIELDS,
                MAX_PAGE_SIZE,
                offset
            );
            let response = self.send(HttpRequest::get(url)).await?;
            let page: FolderItemsResponse = parse(&response)?;

            let page_len = page.entries.len() as u64;
            items.extend(page.entries);
            offset += page_len;

            debug!(
                "Fetched {} folder items ({} of {})",
                page_len,
                items.len(),
                page.total_count
            );

            if page_len == 0 || page_len < MAX_PAGE_SIZE || offset >= page.total_count {
                break;
            }
        }

        info!("Listed {} items in folder", items.len());
        Ok(items)
    }

    /// Create a metadata instance on a file.
    #[instrument(
        skip(self, template, values),
        fields(scope = %template.scope, template_key = %template.template_key)
    )]
    pub async fn create_metadata(
        &self,
        file_id: &str,
        template: &TemplateRef,
        values: &Map<String, Value>,
    ) -> Result<Value> {
        let request = HttpRequest::post(self.metadata_url(file_id, template))
            .json(values)
            .map_err(BoxError::from)?;
        let response = self.send(request).await?;
        parse(&response)
    }

    /// Fetch the instance of one template attached to a file.
    #[instrument(
        skip(self, template),
        fields(scope = %template.scope, template_key = %template.template_key)
    )]
    pub async fn get_metadata_instance(
        &self,
        file_id: &str,
        template: &TemplateRef,
    ) -> Result<Map<String, Value>> {
        let request = HttpRequest::get(self.metadata_url(file_id, template));
        let response = self.send(request).await?;
        parse(&response)
    }

    /// Write fields into an existing metadata instance.
    ///
    /// Fields the instance already carries are replaced; the rest are added.
    #[instrument(
        skip(self, template, values),
        fields(scope = %template.scope, template_key = %template.template_key)
    )]
    pub async fn update_metadata(
        &self,
        file_id: &str,
        template: &TemplateRef,
        values: &Map<String, Value>,
    ) -> Result<Value> {
        let instance = self.get_metadata_instance(file_id, template).await?;
        let ops = patch_ops(&instance, values);

        let url = self.metadata_url(file_id, template);
        let request = HttpRequest::new(HttpMethod::Put, url)
            .json_with_content_type(&ops, JSON_PATCH_CONTENT_TYPE)
            .map_err(BoxError::from)?;
        let response = self.send(request).await?;
        parse(&response)
    }

    /// Create the instance, falling back to an update when one already exists.
    pub async fn apply_metadata(
        &self,
        file_id: &str,
        template: &TemplateRef,
        values: &Map<String, Value>,
    ) -> Result<Value> {
        match self.create_metadata(file_id, template, values).await {
            Err(e) if e.is_conflict() => {
                debug!(file_id, "Metadata instance exists, updating instead");
                self.update_metadata(file_id, template, values).await
            }
            other => other,
        }
    }

    /// Metadata of every file directly inside a folder.
    ///
    /// Files whose metadata cannot be read are left out of the result.
    #[instrument(skip(self))]
    pub async fn folder_file_metadata(
        &self,
        folder_id: &str,
    ) -> Result<Vec<FileMetadataSummary>> {
        let items = self.list_folder_items(folder_id).await?;
        let mut summaries = Vec::new();

        for item in items.into_iter().filter(FolderItem::is_file) {
            match self.get_file_metadata(&item.id).await {
                Ok(metadata) => summaries.push(FileMetadataSummary {
                    file_id: item.id,
                    file_name: item.name,
                    metadata,
                }),
                Err(e) => {
                    warn!(
                        file_id = %item.id,
                        error = %e,
                        "Skipping file with unreadable metadata"
                    );
                }
            }
        }

        Ok(summaries)
    }

    fn metadata_url(&self, file_id: &str, template: &TemplateRef) -> String {
        format!(
            "{}/files/{}/metadata/{}/{}",
            self.api_base_url,
            urlencoding::encode(file_id),
            urlencoding::encode(&template.scope),
            urlencoding::encode(&template.template_key)
        )
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request = request
            .bearer_token(&self.access_token)
            .header("Accept", "application/json");
        let method = request.method;

        let response = self.http_client.execute(request).await?;
        if response.is_success() {
            return Ok(response);
        }

        let status = response.status;
        let message = error_message(&response);
        warn!(?method, status, error = %message, "Box API request failed");
        Err(BoxError::ApiError {
            status_code: status,
            message,
        })
    }
}

/// JSON Patch ops writing `values` over `instance`.
fn patch_ops(instance: &Map<String, Value>, values: &Map<String, Value>) -> Vec<MetadataPatchOp> {
    values
        .iter()
        .map(|(key, value)| {
            if instance.contains_key(key) {
                MetadataPatchOp::replace(key, value.clone())
            } else {
                MetadataPatchOp::add(key, value.clone())
            }
        })
        .collect()
}

fn parse<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    response
        .json()
        .map_err(|e| BoxError::ParseError(e.to_string()))
}

fn error_message(response: &HttpResponse) -> String {
    if let Ok(body) = response.json::<ClientError>() {
        match (body.code, body.message) {
            (Some(code), Some(message)) => return format!("{}: {}", code, message),
            (None, Some(message)) => return message,
            (Some(code), None) => return code,
            (None, None) => {}
        }
    }

    response
        .text()
        .unwrap_or_else(|_| "Unable to read error response".to_string())
}
