pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# TSFERRY CONFIGURATION
# =============================================================================
# This file configures one migration run: where the time-series data comes
# from, where the documents go, and the metadata stamped on every document.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/tsferry/config.yml
#   3. /etc/tsferry/config.yml
#
# Credentials can reference environment variables with $env{VAR_NAME}.

# =============================================================================
# SOURCE (InfluxDB v1 HTTP API)
# =============================================================================
# Each endpoint is stored as one measurement; every measurement is migrated
# unless it appears in run.exclude_series.

source:
  url: http://127.0.0.1:8086
  database: M111682
  # username: admin
  # password: $env{INFLUX_PASSWORD}
  # Rows fetched per range-query page
  page_size: 10000
  timeout: 30s

# =============================================================================
# DESTINATION (MongoDB Atlas Data API or compatible endpoint)
# =============================================================================
# All series land in a single collection as uniform documents:
#   { createdAt, machineId, machineType, valueType, values, version }

destination:
  url: https://data.mongodb-api.com/app/<app-id>/endpoint/data/v1
  # api_key: $env{MONGO_DATA_API_KEY}
  data_source: mongodb-atlas
  database: machines
  collection: machineDataCollection
  timeout: 30s

# =============================================================================
# RUN
# =============================================================================

run:
  machine_type: CI400
  machine_id: 11682
  # Inclusive lower bound; points at or after this instant are migrated
  start_timestamp: 2000-01-01T00:00:00Z
  # Series skipped entirely (exact name match)
  exclude_series: []

# =============================================================================
# BATCHING & RETRY
# =============================================================================

batch:
  # Documents per bulk insert
  size: 500
  # Attempts per batch before the series is marked failed
  max_retries: 3
  # Exponential backoff between attempts, doubling up to max_backoff
  initial_backoff: 500ms
  max_backoff: 30s
"#
    .to_string()
}
