//! Integration tests for the EFA client against a mock HTTP server.

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use departure_board::domain::LineType;
use departure_board::efa::{EfaClient, EfaConfig, EfaError};

fn client_for(server: &MockServer) -> EfaClient {
    let config = EfaConfig::new().with_base_url(format!("{}/vrr/", server.uri()));
    EfaClient::new(config).unwrap()
}

fn eight_oclock() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

// ============================================================================
// Stop search
// ============================================================================

mod stop_search {
    use super::*;

    #[tokio::test]
    async fn decodes_json_served_as_html() {
        let server = MockServer::start().await;
        let body = json!({
            "stopFinder": {"points": {"point": {
                "name": "Essen, Hauptbahnhof",
                "type": "any",
                "anyType": "stop",
                "stateless": "20009289",
                "ref": {"id": "20009289", "place": "Essen"}
            }}}
        });

        Mock::given(method("GET"))
            .and(path("/vrr/XSLT_STOPFINDER_REQUEST"))
            .and(query_param("outputFormat", "JSON"))
            .and(query_param("type_sf", "any"))
            .and(query_param("name_sf", "Essen Hbf"))
            .and(query_param("coordOutputFormat", "WGS84[DD.ddddd]"))
            .and(query_param("locationServerActive", "1"))
            .and(query_param("odvSugMacro", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
            .expect(1)
            .mount(&server)
            .await;

        let stops = client_for(&server).search_stops("Essen Hbf").await;

        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].id, "20009289");
        assert_eq!(stops[0].locality.as_deref(), Some("Essen"));
    }

    #[tokio::test]
    async fn short_query_sends_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.search_stops("Es").await.is_empty());
        assert!(client.search_stops("").await.is_empty());
    }

    #[tokio::test]
    async fn server_error_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vrr/XSLT_STOPFINDER_REQUEST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        assert!(client_for(&server).search_stops("Essen").await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vrr/XSLT_STOPFINDER_REQUEST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html>maintenance</html>", "text/html"),
            )
            .mount(&server)
            .await;

        assert!(client_for(&server).search_stops("Essen").await.is_empty());
    }
}

// ============================================================================
// Departures
// ============================================================================

mod departures {
    use super::*;

    #[tokio::test]
    async fn sends_date_time_and_fixed_params() {
        let server = MockServer::start().await;
        let body = json!({
            "departureList": [
                {
                    "platform": "2",
                    "countdown": "4",
                    "dateTime": {"hour": "8", "minute": "3"},
                    "realDateTime": {"hour": "8", "minute": "4"},
                    "servingLine": {"number": "U18", "direction": "Mülheim Hbf", "motType": "2"}
                },
                {
                    "platform": "7",
                    "dateTime": {"hour": "8", "minute": "12"},
                    "servingLine": {"number": "RE1", "direction": "Aachen Hbf", "motType": "0"}
                },
                {
                    "dateTime": {"hour": "8", "minute": "15"},
                    "servingLine": {"direction": "no line number"}
                }
            ]
        });

        Mock::given(method("GET"))
            .and(path("/vrr/XSLT_DM_REQUEST"))
            .and(query_param("outputFormat", "JSON"))
            .and(query_param("language", "de"))
            .and(query_param("stateless", "1"))
            .and(query_param("type_dm", "any"))
            .and(query_param("name_dm", "20009289"))
            .and(query_param("itdDateDay", "15"))
            .and(query_param("itdDateMonth", "3"))
            .and(query_param("itdDateYear", "2024"))
            .and(query_param("itdTimeHour", "8"))
            .and(query_param("itdTimeMinute", "0"))
            .and(query_param("mode", "direct"))
            .and(query_param("ptOptionsActive", "1"))
            .and(query_param("deleteAssignedStops_dm", "1"))
            .and(query_param("useProxFootSearch", "0"))
            .and(query_param("useRealtime", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/plain"))
            .expect(1)
            .mount(&server)
            .await;

        let departures = client_for(&server)
            .get_departures_at("20009289", eight_oclock())
            .await
            .unwrap();

        assert_eq!(departures.len(), 2);

        assert_eq!(departures[0].line, "U18");
        assert_eq!(departures[0].line_type, LineType::UBahn);
        assert_eq!(departures[0].minutes_until, 4);
        assert_eq!(departures[0].delay_minutes, 1);

        assert_eq!(departures[1].line_type, LineType::Regional);
        assert_eq!(departures[1].minutes_until, 12);
        assert_eq!(departures[1].delay_minutes, 0);
        assert_eq!(departures[1].scheduled_time, "08:12");
    }

    #[tokio::test]
    async fn single_object_list() {
        let server = MockServer::start().await;
        let body = json!({
            "departureList": {
                "dateTime": {"hour": "8", "minute": "30"},
                "servingLine": {"number": "SB15", "direction": "Essen Hbf"}
            }
        });

        Mock::given(method("GET"))
            .and(path("/vrr/XSLT_DM_REQUEST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let departures = client_for(&server)
            .get_departures_at("20009289", eight_oclock())
            .await
            .unwrap();

        assert_eq!(departures.len(), 1);
        assert_eq!(departures[0].minutes_until, 30);
        assert_eq!(departures[0].line_type, LineType::SBahn);
    }

    #[tokio::test]
    async fn missing_list_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vrr/XSLT_DM_REQUEST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"departureList": null})))
            .mount(&server)
            .await;

        let departures = client_for(&server)
            .get_departures_at("20009289", eight_oclock())
            .await
            .unwrap();

        assert!(departures.is_empty());
    }

    #[tokio::test]
    async fn server_error_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vrr/XSLT_DM_REQUEST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&server)
            .await;

        let result = client_for(&server).get_departures("20009289").await;

        match result {
            Err(EfaError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vrr/XSLT_DM_REQUEST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&server)
            .await;

        let result = client_for(&server).get_departures("20009289").await;

        assert!(matches!(result, Err(EfaError::Json { .. })));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vrr/XSLT_DM_REQUEST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"departureList": []}))
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = EfaConfig::new()
            .with_base_url(format!("{}/vrr", server.uri()))
            .with_timeout(1);
        let client = EfaClient::new(config).unwrap();

        let result = client.get_departures("20009289").await;

        assert!(matches!(result, Err(EfaError::Timeout)));
        assert!(result.unwrap_err().is_retryable());
    }
}
