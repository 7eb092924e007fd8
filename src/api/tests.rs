use super::*;
use crate::models::{Building, Sensor};
use crate::table::TimeSeriesTable;
use axum::body::Body;
use axum::http::Request;
use chrono::NaiveDateTime;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

fn ts(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M").unwrap()
}

fn app() -> Router {
    let table = TimeSeriesTable::from_columns(
        vec![
            Some(ts("2021-06-01 00:00")),
            Some(ts("2021-06-01 00:15")),
            Some(ts("2021-06-01 00:30")),
        ],
        vec![
            ("Temperatur".to_string(), vec![Some(12.0), None, Some(13.0)]),
            ("Wärme Diff".to_string(), vec![Some(0.5), Some(0.25), Some(0.75)]),
        ],
    )
    .unwrap();
    let sensors = vec![
        Sensor::new("Temperatur", "Wetterstation", "°C"),
        Sensor::new("Wärme Diff", "Wärmeenergie Tarif 1", "kWh"),
    ];
    let store = std::iter::once(Building::new("EF 40a", sensors, table)).collect();
    router(QueryEngine::from_store(store))
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_root_lists_routes() {
    let (status, body) = get_json("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), ROUTES.len());
    assert_eq!(body[1]["path"], "/buildings");
    assert_eq!(body[1]["name"], "Buildings");
}

#[tokio::test]
async fn test_buildings_and_sensors() {
    let (status, body) = get_json("/buildings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "buildings": ["EF 40a"] }));

    let (status, body) = get_json("/buildings/EF%2040a/sensors").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["sensors"][0],
        serde_json::json!({ "type": "Temperatur", "desc": "Wetterstation", "unit": "°C" })
    );
}

#[tokio::test]
async fn test_unknown_building_is_404_with_detail() {
    let (status, body) = get_json("/buildings/EF%2099/sensors").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({ "detail": "Building not found" }));
}

#[tokio::test]
async fn test_sensor_data_and_unknown_sensor() {
    let (status, body) = get_json("/buildings/EF%2040a/sensors/Temperatur").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "sensor": [12.0, null, 13.0] }));

    let (status, body) = get_json("/buildings/EF%2040a/sensors/Foo").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Sensor not found");
}

#[tokio::test]
async fn test_timestamps_are_iso() {
    let (_, body) = get_json("/buildings/EF%2040a/timestamps").await;
    assert_eq!(body["timestamps"][0], "2021-06-01T00:00:00");
    assert_eq!(body["timestamps"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_slice_payload() {
    let (status, body) = get_json(
        "/buildings/EF%2040a/slice?start=2021-06-01T00:15:00.000Z&stop=2021-06-01T00:30:00&sensors=Temperatur;W%C3%A4rme%20Diff",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({
            "payload": {
                "Temperatur": { "2021-06-01T00:15:00": null, "2021-06-01T00:30:00": 13.0 },
                "Wärme Diff": { "2021-06-01T00:15:00": 0.25, "2021-06-01T00:30:00": 0.75 }
            }
        })
    );
}

#[tokio::test]
async fn test_slice_accepts_repeated_sensor_parameters() {
    let (status, body) = get_json(
        "/buildings/EF%2040a/slice?start=2021-06-01T00:00:00&stop=2021-06-01T00:00:00&sensors=Temperatur&sensors=W%C3%A4rme%20Diff",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payload"].as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_slice_errors() {
    let (status, body) = get_json(
        "/buildings/EF%2040a/slice?start=2021-01-01T00:00:00&stop=2021-01-02T00:00:00&sensors=Temperatur",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Invalid time span");

    let (status, body) = get_json(
        "/buildings/EF%2040a/slice?start=2021-06-01T00:00:00&stop=2021-06-02T00:00:00&sensors=Temperatur;Foo",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Invalid sensor selection");

    let (status, body) =
        get_json("/buildings/EF%2040a/slice?start=gestern&stop=heute&sensors=Temperatur").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({ "detail": "Internal Server Error" }));

    let (status, _) = get_json("/buildings/EF%2040a/slice?start=2021-06-01T00:00:00").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_building_is_reported_before_timestamps_are_parsed() {
    let (status, body) =
        get_json("/buildings/EF%2099/slice?start=gestern&stop=heute&sensors=Temperatur").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Building not found");
}

#[tokio::test]
async fn test_empty_sensor_name_is_invalid_selection() {
    for sensors in ["", "Temperatur;"] {
        let uri = format!(
            "/buildings/EF%2040a/slice?start=2021-06-01T00:00:00&stop=2021-06-02T00:00:00&sensors={sensors}"
        );
        let (status, body) = get_json(&uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Invalid sensor selection");
    }
}
