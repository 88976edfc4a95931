use super::{MetricSnapshot, StatusClient};
use crate::error::ProbeError;
use crate::{EVENTS_METRICS_FIELD, EVENTS_PATH, EVENT_LAST_SYNCED_ID, EVENT_PROCESSOR_STATUS};

/// Reads the catalog's event processor metrics.
///
/// The `/events?json` page embeds its metrics as a `key: value` text blob
/// inside a JSON string field, so the JSON is decoded first and the blob is
/// then parsed line by line.
#[derive(Debug, Clone)]
pub struct EventProcessorScraper {
    status: StatusClient,
}

impl EventProcessorScraper {
    pub fn new(status: StatusClient) -> Self {
        Self { status }
    }

    pub async fn metrics(&self) -> Result<MetricSnapshot, ProbeError> {
        let document = self.status.get_json(EVENTS_PATH).await?;
        let blob = document
            .get(EVENTS_METRICS_FIELD)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProbeError::MissingField {
                url: self.status.url_for(EVENTS_PATH),
                field: EVENTS_METRICS_FIELD.to_string(),
            })?;
        Ok(MetricSnapshot::from_text(blob))
    }

    pub async fn last_synced_event_id(&self) -> Result<i64, ProbeError> {
        self.metrics().await?.get_i64(EVENT_LAST_SYNCED_ID)
    }

    pub async fn status(&self) -> Result<String, ProbeError> {
        self.metrics().await?.get_string(EVENT_PROCESSOR_STATUS)
    }
}
