// Copyright 2022 Zinc Labs Inc. and Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

use super::alerts::EntrySummary;
use super::supplies::{FoodDelta, FoodSupply, MedicineDelta, MedicineSupply, SuppliesSnapshot};

/// One request unit, a single JSON object keyed by `message`. Stream
/// carriers deliver it unframed inside a 1024-byte recv; datagram carriers
/// deliver exactly one object per datagram.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "message")]
pub enum Request {
    #[serde(rename = "authenticateme")]
    Authenticate { hostname: String },
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "update")]
    Update {
        #[serde(default)]
        food: Option<FoodDelta>,
        #[serde(default)]
        medicine: Option<MedicineDelta>,
        // datagram carriers authenticate per message
        #[serde(default)]
        hostname: Option<String>,
    },
    #[serde(rename = "summary")]
    Summary,
    #[serde(rename = "request_available_images")]
    RequestAvailableImages,
    #[serde(rename = "image_selection")]
    ImageSelection { image: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "message")]
pub enum Response {
    #[serde(rename = "auth_success")]
    AuthSuccess,
    #[serde(rename = "auth_failure")]
    AuthFailure,
    #[serde(rename = "supplies_response")]
    Supplies {
        food: FoodSupply,
        medicine: MedicineSupply,
    },
    #[serde(rename = "summary_response")]
    Summary {
        alerts: EntrySummary,
        supplies: SuppliesSnapshot,
        last_keepalived: LastKeepalived,
    },
    #[serde(rename = "image_list")]
    ImageList { images: Vec<String> },
    #[serde(rename = "file_size")]
    FileSize { size: u64 },
    #[serde(rename = "zip_ready")]
    ZipReady,
    #[serde(rename = "alert")]
    Alert { alert_description: String },
    #[serde(rename = "disconnect")]
    Disconnect,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LastKeepalived {
    #[serde(rename = "lastEvent")]
    pub last_event: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::json;

    #[test]
    fn test_parse_requests() {
        let req: Request =
            json::from_str(r#"{"message":"authenticateme","hostname":"ubuntu"}"#).unwrap();
        assert!(matches!(req, Request::Authenticate { hostname } if hostname == "ubuntu"));

        let req: Request = json::from_str(r#"{"hostname":"x","message":"status"}"#).unwrap();
        assert!(matches!(req, Request::Status));

        let req: Request =
            json::from_str(r#"{"message":"update","food":{"meat":3,"water":-2}}"#).unwrap();
        match req {
            Request::Update {
                food, hostname, ..
            } => {
                let food = food.unwrap();
                assert_eq!(food.meat, Some(3));
                assert_eq!(food.water, Some(-2));
                assert_eq!(hostname, None);
            }
            other => panic!("unexpected request: {other:?}"),
        }

        let req: Request =
            json::from_str(r#"{"message":"image_selection","image":"x.png"}"#).unwrap();
        assert!(matches!(req, Request::ImageSelection { image } if image == "x.png"));
    }

    #[test]
    fn test_unknown_message_is_rejected() {
        assert!(json::from_str::<Request>(r#"{"message":"reboot"}"#).is_err());
        assert!(json::from_str::<Request>(r#"{"hostname":"ubuntu"}"#).is_err());
        assert!(json::from_str::<Request>("not json at all").is_err());
    }

    #[test]
    fn test_serialize_responses() {
        let text = json::to_string(&Response::AuthSuccess).unwrap();
        assert_eq!(text, r#"{"message":"auth_success"}"#);

        let text = json::to_string(&Response::FileSize { size: 42 }).unwrap();
        assert_eq!(text, r#"{"message":"file_size","size":42}"#);

        let text = json::to_string(&Response::Alert {
            alert_description: "NORTH ENTRY, ALERT, 39.2°C ".to_string(),
        })
        .unwrap();
        let value: json::Value = json::from_str(&text).unwrap();
        assert_eq!(value["message"], "alert");
        assert_eq!(value["alert_description"], "NORTH ENTRY, ALERT, 39.2°C ");
    }
}
