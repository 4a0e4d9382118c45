//! JSON frames pushed to observers.

use chrono::Utc;
use serde::Serialize;

use regmon_core::{Alert, AlertLevel};

#[derive(Serialize)]
struct Frame<T: Serialize> {
    #[serde(rename = "type")]
    msg_type: &'static str,
    data: T,
}

fn frame_json<T: Serialize>(msg_type: &'static str, data: T) -> String {
    serde_json::to_string(&Frame { msg_type, data }).unwrap_or_default()
}

pub fn alert_frame(alert: &Alert) -> String {
    frame_json("alert", alert)
}

pub fn device_status_frame(device_id: &str, level: AlertLevel) -> String {
    frame_json(
        "device-status",
        serde_json::json!({
            "deviceId": device_id,
            "status": level,
            "updatedAt": Utc::now(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_status_frame_has_envelope_and_level() {
        let frame = device_status_frame("dev-1", AlertLevel::Critical);
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "device-status");
        assert_eq!(value["data"]["deviceId"], "dev-1");
        assert_eq!(value["data"]["status"], "CRITICAL");
    }
}
