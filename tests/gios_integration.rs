/// Integration tests for the GIOS API client
///
/// These tests verify:
/// 1. Bodies served over HTTP are parsed into domain records
/// 2. Malformed bodies surface as Parse errors, for every operation
/// 3. Non-2xx responses and refused connections surface as Transport errors,
///    with connectivity loss told apart from other failures
/// 4. (ignored) the live API answers for a known station
///
/// The local tests run against a mockito server. The live tests need
/// internet access:
///   cargo test --test gios_integration -- --ignored

use std::net::TcpListener;

use aqmon_service::ingest::gios::GiosClient;
use aqmon_service::ingest::AirQualitySource;
use aqmon_service::model::{AirQualityError, TransportKind, INDEX_OVERALL, MISSING_VALUE};
use mockito::{Mock, Server, ServerGuard};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Register a single expected JSON GET on `server`.
fn mock_json(server: &mut ServerGuard, path: &str, status: usize, body: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create()
}

/// A local address nothing listens on.
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// ---------------------------------------------------------------------------
// 1. Parsing over HTTP
// ---------------------------------------------------------------------------

#[test]
fn test_list_stations_over_http() {
    let mut server = Server::new();
    let mock = mock_json(
        &mut server,
        "/station/findAll",
        200,
        r#"[{"id": 114, "stationName": "Wrocław - Bartnicza"}, {"id": 117, "stationName": "Wrocław - Korzeniowskiego"}]"#,
    );
    let client = GiosClient::new(server.url()).unwrap();

    let stations = client.list_stations().expect("stations should parse");
    assert_eq!(stations.len(), 2);
    assert_eq!(stations[0].name, "Wrocław - Bartnicza");

    mock.assert();
}

#[test]
fn test_list_sensors_over_http() {
    let mut server = Server::new();
    let mock = mock_json(
        &mut server,
        "/station/sensors/114",
        200,
        r#"[{"id": 642, "param": {"paramName": "dwutlenek azotu", "paramFormula": "NO2"}},
            {"id": 644, "param": {"paramName": "ozon", "paramFormula": null}}]"#,
    );
    let client = GiosClient::new(server.url()).unwrap();

    let sensors = client.list_sensors(114).unwrap();
    assert_eq!(sensors.len(), 2);
    assert_eq!(sensors[0].parameter_formula, "NO2");
    assert_eq!(sensors[1].parameter_formula, "");

    mock.assert();
}

#[test]
fn test_get_measurements_over_http() {
    let mut server = Server::new();
    let mock = mock_json(
        &mut server,
        "/data/getData/660",
        200,
        r#"{"key": "PM10", "values": [{"date": "2024-05-01 13:00:00", "value": null}, {"date": "2024-05-01 12:00:00", "value": 31.2}]}"#,
    );
    let client = GiosClient::new(server.url()).unwrap();

    let series = client.get_measurements(660).unwrap();
    assert_eq!(series[0].value, MISSING_VALUE);
    assert_eq!(series[1].value, 31.2);

    mock.assert();
}

#[test]
fn test_get_air_quality_index_over_http() {
    let mut server = Server::new();
    let mock = mock_json(
        &mut server,
        "/aqindex/getIndex/114",
        200,
        r#"{"id": 114, "stIndexLevel": {"indexLevelName": "Umiarkowany"}, "pm10IndexLevel": null}"#,
    );
    let client = GiosClient::new(server.url()).unwrap();

    let index = client.get_air_quality_index(114).unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index[INDEX_OVERALL], "Umiarkowany");

    mock.assert();
}

#[test]
fn test_trailing_slash_in_base_url_hits_same_path() {
    let mut server = Server::new();
    let mock = mock_json(&mut server, "/station/findAll", 200, "[]");
    let client = GiosClient::new(format!("{}/", server.url())).unwrap();

    assert!(client.list_stations().unwrap().is_empty());
    mock.assert();
}

// ---------------------------------------------------------------------------
// 2. Malformed bodies
// ---------------------------------------------------------------------------

#[test]
fn test_malformed_station_list_is_a_parse_error() {
    let mut server = Server::new();
    let mock = mock_json(&mut server, "/station/findAll", 200, "<html>Service Unavailable</html>");
    let client = GiosClient::new(server.url()).unwrap();

    let result = client.list_stations();
    assert!(matches!(result, Err(AirQualityError::Parse(_))), "got {:?}", result);
    mock.assert();
}

#[test]
fn test_malformed_bodies_are_parse_errors_for_every_operation() {
    let mut server = Server::new();
    let sensors = mock_json(&mut server, "/station/sensors/114", 200, "{\"truncated\": ");
    let data = mock_json(&mut server, "/data/getData/642", 200, "\"not an object\"");
    let index = mock_json(&mut server, "/aqindex/getIndex/114", 200, "");
    let client = GiosClient::new(server.url()).unwrap();

    assert!(matches!(client.list_sensors(114), Err(AirQualityError::Parse(_))));
    assert!(matches!(client.get_measurements(642), Err(AirQualityError::Parse(_))));
    assert!(matches!(client.get_air_quality_index(114), Err(AirQualityError::Parse(_))));

    sensors.assert();
    data.assert();
    index.assert();
}

// ---------------------------------------------------------------------------
// 3. Transport failures
// ---------------------------------------------------------------------------

#[test]
fn test_server_error_is_other_transport_failure() {
    let mut server = Server::new();
    let mock = mock_json(&mut server, "/station/findAll", 500, "Internal Server Error");
    let client = GiosClient::new(server.url()).unwrap();

    let err = client.list_stations().expect_err("500 must not be treated as data");
    match &err {
        AirQualityError::Transport { kind, message } => {
            assert_eq!(*kind, TransportKind::Other);
            assert!(message.contains("500"), "got '{}'", message);
        }
        other => panic!("expected Transport error, got {:?}", other),
    }
    assert!(err.is_offline_trigger());
    mock.assert();
}

#[test]
fn test_not_found_status_is_other_transport_failure() {
    let mut server = Server::new();
    let mock = mock_json(&mut server, "/data/getData/999999", 404, "");
    let client = GiosClient::new(server.url()).unwrap();

    let err = client.get_measurements(999999).expect_err("404 must not be treated as data");
    assert!(!err.is_connectivity());
    assert!(err.is_offline_trigger());
    mock.assert();
}

#[test]
fn test_refused_connection_is_connectivity_failure() {
    let client = GiosClient::new(closed_port_url()).unwrap();

    let err = client.list_stations().expect_err("nothing listens on the port");
    assert!(err.is_connectivity(), "got {:?}", err);
    assert!(err.is_offline_trigger());
}

// ---------------------------------------------------------------------------
// 4. Live API (ignored by default)
// ---------------------------------------------------------------------------

#[test]
#[ignore] // Don't run in CI - depends on external API
fn live_api_lists_stations() {
    let client = GiosClient::new(aqmon_service::config::DEFAULT_API_BASE_URL).unwrap();
    let stations = client.list_stations().expect("live station list");
    assert!(!stations.is_empty(), "GIOS should report at least one station");
    assert!(stations.iter().all(|s| s.id > 0));
}

#[test]
#[ignore] // Don't run in CI - depends on external API
fn live_api_first_station_has_sensors_and_data() {
    let client = GiosClient::new(aqmon_service::config::DEFAULT_API_BASE_URL).unwrap();
    let stations = client.list_stations().expect("live station list");
    let station = stations.first().expect("at least one station");

    let sensors = client.list_sensors(station.id).expect("live sensor list");
    println!("\n🔍 {} ({}): {} sensors", station.name, station.id, sensors.len());

    if let Some(sensor) = sensors.first() {
        let series = client.get_measurements(sensor.id).expect("live measurements");
        println!("   {} → {} readings", sensor.parameter_name, series.len());
    }

    let index = client.get_air_quality_index(station.id).expect("live index");
    println!("   index: {:?}", index);
}
