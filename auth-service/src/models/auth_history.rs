//! Auth history model - one immutable row per successful login,
//! partitioned by device class.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Coarse client category used as the partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Web,
    Smart,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Web => "web",
            DeviceClass::Smart => "smart",
        }
    }

    /// Classify a client from its User-Agent header. TVs and consoles are
    /// checked before phones since many of them also report Android.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();

        const SMART_MARKERS: [&str; 7] = [
            "smart-tv", "smarttv", "googletv", "appletv", "tizen", "webos", "roku",
        ];
        const MOBILE_MARKERS: [&str; 5] = ["mobile", "android", "iphone", "ipad", "ipod"];

        if SMART_MARKERS.iter().any(|m| ua.contains(m)) || ua.contains(" tv") {
            DeviceClass::Smart
        } else if MOBILE_MARKERS.iter().any(|m| ua.contains(m)) {
            DeviceClass::Mobile
        } else {
            DeviceClass::Web
        }
    }
}

impl std::str::FromStr for DeviceClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mobile" => Ok(DeviceClass::Mobile),
            "web" => Ok(DeviceClass::Web),
            "smart" => Ok(DeviceClass::Smart),
            _ => Err(format!("Invalid device class: {}", s)),
        }
    }
}

/// Auth history entity.
#[derive(Debug, Clone, FromRow)]
pub struct AuthHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_agent: String,
    pub ip_address: Option<String>,
    pub device: String,
    pub created: DateTime<Utc>,
}

impl AuthHistory {
    pub fn new(
        user_id: Uuid,
        user_agent: String,
        ip_address: Option<String>,
        device: DeviceClass,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            user_agent,
            ip_address,
            device: device.as_str().to_string(),
            created: Utc::now(),
        }
    }

    /// Parsed device class; rows written by this crate always parse.
    pub fn device_class(&self) -> Option<DeviceClass> {
        self.device.parse().ok()
    }
}

/// Auth history entry returned to the record owner.
#[derive(Debug, Clone, Serialize)]
pub struct AuthHistoryResponse {
    pub id: Uuid,
    pub user_agent: String,
    pub ip_address: Option<String>,
    pub created: DateTime<Utc>,
}

impl From<AuthHistory> for AuthHistoryResponse {
    fn from(h: AuthHistory) -> Self {
        Self {
            id: h.id,
            user_agent: h.user_agent,
            ip_address: h.ip_address,
            created: h.created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_user_agents() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148";
        let android_tv = "Mozilla/5.0 (Linux; Android 9; BRAVIA 4K GB ATV3) AppleWebKit/537.36 SmartTV";
        let tizen = "Mozilla/5.0 (SMART-TV; Linux; Tizen 6.0) AppleWebKit/537.36";
        let desktop = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0";

        assert_eq!(DeviceClass::from_user_agent(iphone), DeviceClass::Mobile);
        assert_eq!(DeviceClass::from_user_agent(android_tv), DeviceClass::Smart);
        assert_eq!(DeviceClass::from_user_agent(tizen), DeviceClass::Smart);
        assert_eq!(DeviceClass::from_user_agent(desktop), DeviceClass::Web);
        assert_eq!(DeviceClass::from_user_agent(""), DeviceClass::Web);
    }

    #[test]
    fn device_round_trips_through_storage_code() {
        let entry = AuthHistory::new(Uuid::new_v4(), "curl/8.0".to_string(), None, DeviceClass::Smart);
        assert_eq!(entry.device, "smart");
        assert_eq!(entry.device_class(), Some(DeviceClass::Smart));
        assert!("tablet".parse::<DeviceClass>().is_err());
    }
}
