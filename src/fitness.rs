//! Thin typed-path wrappers over the authenticated client
//!
//! Payloads are passed through as JSON without interpretation.

use crate::client::GarminClient;
use crate::endpoints::*;
use crate::error::AppError;
use crate::utils::today;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct FitnessApi {
    client: Arc<GarminClient>,
}

impl FitnessApi {
    pub fn new(client: Arc<GarminClient>) -> Self {
        Self { client }
    }

    pub async fn activities(&self, start: u32, limit: u32) -> Result<Value, AppError> {
        self.client
            .get(&format!("{}?start={}&limit={}", ACTIVITIES_SEARCH, start, limit))
            .await
    }

    pub async fn activities_by_date(
        &self,
        start_date: &str,
        end_date: &str,
        activity_type: Option<&str>,
    ) -> Result<Value, AppError> {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("startDate", start_date)
            .append_pair("endDate", end_date)
            .append_pair("start", "0")
            .append_pair("limit", &DEFAULT_ACTIVITIES_BY_DATE_LIMIT.to_string());
        if let Some(kind) = activity_type {
            query.append_pair("activityType", kind);
        }
        self.client
            .get(&format!("{}?{}", ACTIVITIES_SEARCH, query.finish()))
            .await
    }

    pub async fn activity(&self, activity_id: u64) -> Result<Value, AppError> {
        self.client.get(&format!("{}/{}", ACTIVITY, activity_id)).await
    }

    pub async fn daily_summary(&self, date: Option<&str>) -> Result<Value, AppError> {
        let date = resolve_date(date);
        let path = self.user_path(USER_SUMMARY).await?;
        self.client
            .get(&format!("{}?calendarDate={}", path, date))
            .await
    }

    pub async fn heart_rate(&self, date: Option<&str>) -> Result<Value, AppError> {
        let date = resolve_date(date);
        let path = self.user_path(HEART_RATE).await?;
        self.client.get(&format!("{}?date={}", path, date)).await
    }

    pub async fn sleep(&self, date: Option<&str>) -> Result<Value, AppError> {
        let date = resolve_date(date);
        let path = self.user_path(SLEEP_DAILY).await?;
        self.client
            .get(&format!(
                "{}?date={}&nonSleepBufferMinutes={}",
                path, date, SLEEP_NON_SLEEP_BUFFER_MINUTES
            ))
            .await
    }

    pub async fn stress(&self, date: Option<&str>) -> Result<Value, AppError> {
        self.client
            .get(&format!("{}/{}", DAILY_STRESS, resolve_date(date)))
            .await
    }

    pub async fn body_battery(&self, start_date: &str, end_date: &str) -> Result<Value, AppError> {
        self.client
            .get(&format!(
                "{}?startDate={}&endDate={}",
                BODY_BATTERY, start_date, end_date
            ))
            .await
    }

    pub async fn respiration(&self, date: Option<&str>) -> Result<Value, AppError> {
        self.client
            .get(&format!("{}/{}", DAILY_RESPIRATION, resolve_date(date)))
            .await
    }

    pub async fn spo2(&self, date: Option<&str>) -> Result<Value, AppError> {
        self.client
            .get(&format!("{}/{}", DAILY_SPO2, resolve_date(date)))
            .await
    }

    pub async fn hrv(&self, date: Option<&str>) -> Result<Value, AppError> {
        self.client
            .get(&format!("{}/{}", HRV, resolve_date(date)))
            .await
    }

    pub async fn training_readiness(&self, date: Option<&str>) -> Result<Value, AppError> {
        self.client
            .get(&format!("{}/{}", TRAINING_READINESS, resolve_date(date)))
            .await
    }

    pub async fn devices(&self) -> Result<Value, AppError> {
        self.client.get(DEVICE_LIST).await
    }

    pub async fn user_settings(&self) -> Result<Value, AppError> {
        self.client.get(USER_SETTINGS).await
    }

    /// Fetch the day's health sections concurrently. A failing section is
    /// reported as `{"error": ...}` and does not fail the snapshot.
    pub async fn daily_snapshot(&self, date: Option<&str>) -> Result<Value, AppError> {
        let date = resolve_date(date);
        // Authenticate once up front so the per-user paths are resolvable
        self.client.login().await?;
        let day = Some(date.as_str());

        let (summary, heart_rate, stress, body_battery, sleep, hrv, respiration, spo2) = futures::join!(
            self.daily_summary(day),
            self.heart_rate(day),
            self.stress(day),
            self.body_battery(&date, &date),
            self.sleep(day),
            self.hrv(day),
            self.respiration(day),
            self.spo2(day),
        );

        let mut sections = Map::new();
        sections.insert("date".to_string(), Value::String(date.clone()));
        for (name, result) in [
            ("summary", summary),
            ("heartRate", heart_rate),
            ("stress", stress),
            ("bodyBattery", body_battery),
            ("sleep", sleep),
            ("hrv", hrv),
            ("respiration", respiration),
            ("spo2", spo2),
        ] {
            let value = match result {
                Ok(value) => value,
                Err(e) => {
                    warn!("Snapshot section {} failed: {}", name, e);
                    json!({ "error": e.to_string() })
                }
            };
            sections.insert(name.to_string(), value);
        }

        debug!("Built daily snapshot for {}", date);
        Ok(Value::Object(sections))
    }

    /// `{base}/{displayName}`, authenticating first if the name is not known yet
    async fn user_path(&self, base: &str) -> Result<String, AppError> {
        let mut name = self.client.display_name();
        if name.is_empty() {
            self.client.login().await?;
            name = self.client.display_name();
        }
        Ok(format!("{}/{}", base, urlencoding::encode(&name)))
    }
}

fn resolve_date(date: Option<&str>) -> String {
    date.map(str::to_string).unwrap_or_else(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_date() {
        assert_eq!(resolve_date(Some("2024-05-01")), "2024-05-01");
        assert_eq!(resolve_date(None), today());
    }
}
