use crate::config::types::DestinationConfig;
use crate::model::Document;
use crate::sink::{DocumentSink, SinkError};
use async_trait::async_trait;
use serde::Serialize;

/// MongoDB Atlas Data API client writing one collection via `insertMany`.
#[derive(Debug)]
pub struct MongoDataApiSink {
    base_url: String,
    api_key: Option<String>,
    data_source: String,
    database: String,
    collection: String,
    client: reqwest::Client,
}

impl MongoDataApiSink {
    pub fn new(config: &DestinationConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            data_source: config.data_source.clone(),
            database: config.database.clone(),
            collection: config.collection.clone(),
            client,
        })
    }

    fn insert_many_body<'a>(&'a self, docs: &'a [Document]) -> InsertManyRequest<'a> {
        InsertManyRequest {
            data_source: &self.data_source,
            database: &self.database,
            collection: &self.collection,
            documents: docs,
        }
    }
}

#[async_trait]
impl DocumentSink for MongoDataApiSink {
    async fn insert_batch(&self, docs: &[Document]) -> Result<(), SinkError> {
        let url = format!("{}/action/insertMany", self.base_url);
        let mut request = self.client.post(&url).json(&self.insert_many_body(docs));

        if let Some(api_key) = &self.api_key {
            request = request.header("api-key", api_key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(SinkError::Server {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertManyRequest<'a> {
    data_source: &'a str,
    database: &'a str,
    collection: &'a str,
    documents: &'a [Document],
}
