//! Garmin Connect API paths used by the data layer

pub const USER_SUMMARY: &str = "/usersummary-service/usersummary/daily";
pub const HEART_RATE: &str = "/wellness-service/wellness/dailyHeartRate";
pub const DAILY_STRESS: &str = "/wellness-service/wellness/dailyStress";
pub const DAILY_RESPIRATION: &str = "/wellness-service/wellness/daily/respiration";
pub const DAILY_SPO2: &str = "/wellness-service/wellness/daily/spo2";
pub const BODY_BATTERY: &str = "/wellness-service/wellness/bodyBattery/reports/daily";
pub const SLEEP_DAILY: &str = "/wellness-service/wellness/dailySleepData";

pub const TRAINING_READINESS: &str = "/metrics-service/metrics/trainingreadiness";
pub const HRV: &str = "/hrv-service/hrv";

pub const ACTIVITIES_SEARCH: &str = "/activitylist-service/activities/search/activities";
pub const ACTIVITY: &str = "/activity-service/activity";

pub const USER_SETTINGS: &str = "/userprofile-service/userprofile/user-settings";
pub const DEVICE_LIST: &str = "/device-service/deviceregistration/devices";

pub const SLEEP_NON_SLEEP_BUFFER_MINUTES: u32 = 60;
pub const DEFAULT_ACTIVITIES_LIMIT: u32 = 20;
pub const DEFAULT_ACTIVITIES_BY_DATE_LIMIT: u32 = 100;
