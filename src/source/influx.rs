use crate::config::types::SourceConfig;
use crate::model::RawPoint;
use crate::source::{SeriesStore, SourceError};
use async_trait::async_trait;
use serde::Deserialize;

/// InfluxDB v1 `/query` HTTP client.
///
/// Timestamps are requested with `epoch=ns` so rows carry integer nanosecond
/// epochs instead of RFC3339 strings.
#[derive(Debug)]
pub struct InfluxSource {
    base_url: String,
    database: String,
    username: Option<String>,
    password: Option<String>,
    client: reqwest::Client,
}

impl InfluxSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
        })
    }

    async fn query(&self, q: &str) -> Result<QueryResponse, SourceError> {
        let url = format!("{}/query", self.base_url);
        let mut request = self.client.get(&url).query(&[
            ("db", self.database.as_str()),
            ("epoch", "ns"),
            ("q", q),
        ]);

        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Server {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: QueryResponse = response.json().await?;

        // Query-level errors come back with HTTP 200
        for result in &body.results {
            if let Some(error) = &result.error {
                return Err(SourceError::Query(error.clone()));
            }
        }

        Ok(body)
    }
}

#[async_trait]
impl SeriesStore for InfluxSource {
    async fn list_series(&self) -> Result<Vec<String>, SourceError> {
        let body = self.query("SHOW MEASUREMENTS").await?;
        parse_measurement_names(&body)
    }

    async fn fetch_page(
        &self,
        series: &str,
        start_ns: i64,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RawPoint>, SourceError> {
        let q = select_page_query(series, start_ns, offset, limit);
        let body = self.query(&q).await?;
        parse_series_rows(&body)
    }
}

/// Range query for one page of a series, inclusive lower bound, ascending.
fn select_page_query(series: &str, start_ns: i64, offset: u64, limit: u64) -> String {
    format!(
        "SELECT * FROM \"{}\" WHERE time >= {} ORDER BY time ASC LIMIT {} OFFSET {}",
        escape_identifier(series),
        start_ns,
        limit,
        offset
    )
}

fn escape_identifier(name: &str) -> String {
    name.replace('"', "\\\"")
}

fn parse_measurement_names(body: &QueryResponse) -> Result<Vec<String>, SourceError> {
    let mut names = Vec::new();
    for result in &body.results {
        for series in &result.series {
            for row in &series.values {
                let name = row
                    .first()
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        SourceError::Malformed("measurement row without a name".to_string())
                    })?;
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

fn parse_series_rows(body: &QueryResponse) -> Result<Vec<RawPoint>, SourceError> {
    // An empty result (series has no matching points) is not an error.
    let Some(series) = body
        .results
        .first()
        .and_then(|result| result.series.first())
    else {
        return Ok(Vec::new());
    };

    let time_idx = series
        .columns
        .iter()
        .position(|c| c == "time")
        .ok_or_else(|| SourceError::Malformed("result has no 'time' column".to_string()))?;

    // The value column name varies per measurement; take the first
    // non-time column, matching the original single-field layout.
    let value_idx = (0..series.columns.len())
        .find(|&i| i != time_idx)
        .ok_or_else(|| SourceError::Malformed("result has no value column".to_string()))?;

    let mut points = Vec::with_capacity(series.values.len());
    for row in &series.values {
        if row.len() <= time_idx.max(value_idx) {
            return Err(SourceError::Malformed(format!(
                "row has {} columns, expected at least {}",
                row.len(),
                time_idx.max(value_idx) + 1
            )));
        }
        points.push(RawPoint {
            timestamp: row[time_idx].clone(),
            value: row[value_idx].as_f64(),
        });
    }

    Ok(points)
}

// ===== Response Types =====

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    series: Vec<SeriesPayload>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesPayload {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}
