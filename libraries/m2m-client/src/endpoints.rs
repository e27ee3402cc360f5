//! Fixed set of M2M API endpoints.

use crate::types::{ApiRequest, HistoryQuery, API_PREFIX};
use reqwest::Method;

/// A known API call, resolved to a method, path and query parameters.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// Top-level resource listing links to all other resources
    HomeDocument,
    /// Cheap reachability check against the home document
    Ping,
    DeviceDetails { device_id: String },
    DeviceHistory { device_id: String, query: HistoryQuery },
    DeviceRegistration { device_id: String },
}

impl Endpoint {
    pub fn method(&self) -> Method {
        Method::GET
    }

    /// Path relative to the API base URL. `home` is the configured resource
    /// serving the home document.
    pub fn path(&self, home: &str) -> String {
        match self {
            Endpoint::HomeDocument | Endpoint::Ping => {
                format!("{}/{}", API_PREFIX, home.trim_matches('/'))
            }
            Endpoint::DeviceDetails { device_id } => {
                format!("{}/devices/{}", API_PREFIX, path_segment(device_id))
            }
            Endpoint::DeviceHistory { device_id, .. } => {
                format!("{}/devices/{}/history", API_PREFIX, path_segment(device_id))
            }
            Endpoint::DeviceRegistration { device_id } => {
                format!(
                    "{}/devices/{}/registration",
                    API_PREFIX,
                    path_segment(device_id)
                )
            }
        }
    }

    pub fn params(&self) -> Vec<(String, String)> {
        match self {
            Endpoint::DeviceHistory { query, .. } => query.to_params(),
            _ => Vec::new(),
        }
    }

    pub fn to_request(&self, home: &str) -> ApiRequest {
        let mut request = ApiRequest::new(self.method(), self.path(home));
        request.params = self.params();
        request
    }
}

/// Percent-encode a value so it stays a single path segment.
fn path_segment(value: &str) -> String {
    // URL parsing would resolve these away as dot segments.
    if value == "." || value == ".." {
        return value.replace('.', "%2E");
    }

    // Form encoding escapes every reserved character; only the space differs.
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_document_path() {
        assert_eq!(Endpoint::HomeDocument.path("devices"), "/m2m/v1/devices");
        assert_eq!(Endpoint::Ping.path("/devices/"), "/m2m/v1/devices");
    }

    #[test]
    fn device_paths() {
        let id = || "8944100000000000001".to_string();

        assert_eq!(
            Endpoint::DeviceDetails { device_id: id() }.path("devices"),
            "/m2m/v1/devices/8944100000000000001"
        );
        assert_eq!(
            Endpoint::DeviceRegistration { device_id: id() }.path("devices"),
            "/m2m/v1/devices/8944100000000000001/registration"
        );
        assert_eq!(
            Endpoint::DeviceHistory {
                device_id: id(),
                query: HistoryQuery::default()
            }
            .path("devices"),
            "/m2m/v1/devices/8944100000000000001/history"
        );
    }

    #[test]
    fn device_id_is_escaped_as_one_segment() {
        let details = Endpoint::DeviceDetails {
            device_id: "../admin?x=1#y".into(),
        };
        assert_eq!(
            details.path("devices"),
            "/m2m/v1/devices/..%2Fadmin%3Fx%3D1%23y"
        );

        let registration = Endpoint::DeviceRegistration {
            device_id: "a b+c".into(),
        };
        assert_eq!(
            registration.path("devices"),
            "/m2m/v1/devices/a%20b%2Bc/registration"
        );

        let dots = Endpoint::DeviceDetails {
            device_id: "..".into(),
        };
        assert_eq!(dots.path("devices"), "/m2m/v1/devices/%2E%2E");
    }

    #[test]
    fn history_request_carries_params() {
        let endpoint = Endpoint::DeviceHistory {
            device_id: "42".into(),
            query: HistoryQuery {
                page_size: Some(10),
                page_number: Some(2),
                ..Default::default()
            },
        };
        let request = endpoint.to_request("devices");

        assert_eq!(request.method, Method::GET);
        assert!(request.headers.is_none());
        assert!(request.body.is_none());
        assert_eq!(
            request.params,
            vec![
                ("pageSize".to_string(), "10".to_string()),
                ("pageNumber".to_string(), "2".to_string()),
            ]
        );
    }
}
