use scrubber_core::settings::lenient_minutes;
use serde::{Deserialize, Serialize};

/// Messages the UI sends to the background
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    UpdateAlarm {
        url: String,
        #[serde(default)]
        scheduled: bool,
        #[serde(default, deserialize_with = "lenient_minutes")]
        interval: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    CheckLockStatus { last_open_time: i64, lock_time: u64 },
    #[serde(rename_all = "camelCase")]
    ResetLockTimer { lock_time: u64, last_open_time: i64 },
    #[serde(rename_all = "camelCase")]
    PopupClosed { used_time: i64, lock_time: u64 },
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::UpdateAlarm { .. } => "updateAlarm",
            Request::CheckLockStatus { .. } => "checkLockStatus",
            Request::ResetLockTimer { .. } => "resetLockTimer",
            Request::PopupClosed { .. } => "popupClosed",
        }
    }
}

/// Replies from the background
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Success {
        success: bool,
    },
    #[serde(rename_all = "camelCase")]
    LockStatus {
        should_lock: bool,
    },
}

impl Response {
    pub fn ok() -> Self {
        Response::Success { success: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_alarm_accepts_string_interval() {
        let request: Request = serde_json::from_value(json!({
            "action": "updateAlarm",
            "url": "https://example.com/",
            "scheduled": true,
            "interval": "15"
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::UpdateAlarm {
                url: "https://example.com/".to_string(),
                scheduled: true,
                interval: Some(15),
            }
        );
        assert_eq!(request.action(), "updateAlarm");
    }

    #[test]
    fn test_lock_messages_use_camel_case_fields() {
        let request: Request = serde_json::from_value(json!({
            "action": "checkLockStatus",
            "lastOpenTime": 1000,
            "lockTime": 300
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::CheckLockStatus {
                last_open_time: 1000,
                lock_time: 300
            }
        );

        let request: Request = serde_json::from_value(json!({
            "action": "popupClosed",
            "usedTime": 5,
            "lockTime": 300
        }))
        .unwrap();
        assert_eq!(request.action(), "popupClosed");
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result: Result<Request, _> = serde_json::from_value(json!({"action": "explode"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_wire_format() {
        assert_eq!(serde_json::to_value(Response::ok()).unwrap(), json!({"success": true}));
        assert_eq!(
            serde_json::to_value(Response::LockStatus { should_lock: true }).unwrap(),
            json!({"shouldLock": true})
        );
    }
}
