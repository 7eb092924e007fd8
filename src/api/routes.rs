use super::ROUTES;
use crate::models::Sensor;
use crate::query::{QueryEngine, QueryError, QueryResult};
use crate::timestamp::{format_timestamp, parse_timestamp};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDateTime;
use serde_json::{Map, Value, json};

pub async fn root() -> Json<Value> {
    Json(json!(ROUTES))
}

pub async fn buildings(State(engine): State<QueryEngine>) -> Json<Value> {
    Json(json!({ "buildings": engine.list_buildings() }))
}

pub async fn sensors(
    State(engine): State<QueryEngine>,
    Path(building): Path<String>,
) -> QueryResult<Json<Value>> {
    let sensors: Vec<Sensor> = engine.list_sensors(&building)?;
    Ok(Json(json!({ "sensors": sensors })))
}

pub async fn sensor_data(
    State(engine): State<QueryEngine>,
    Path((building, sensor)): Path<(String, String)>,
) -> QueryResult<Json<Value>> {
    let values = engine.sensor_column(&building, &sensor)?;
    Ok(Json(json!({ "sensor": values })))
}

pub async fn timestamps(
    State(engine): State<QueryEngine>,
    Path(building): Path<String>,
) -> QueryResult<Json<Value>> {
    let timestamps: Vec<String> = engine
        .timestamps(&building)?
        .iter()
        .map(format_timestamp)
        .collect();
    Ok(Json(json!({ "timestamps": timestamps })))
}

/// `start`, `stop` and `sensors`; `sensors` may repeat and each value may
/// hold several names separated by `;`
pub async fn slice(
    State(engine): State<QueryEngine>,
    Path(building): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> QueryResult<Json<Value>> {
    let param = |name: &str| {
        params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };
    let start = param("start").ok_or(QueryError::MissingParameter("start"))?;
    let stop = param("stop").ok_or(QueryError::MissingParameter("stop"))?;

    let mut sensors = params
        .iter()
        .filter(|(key, _)| key == "sensors")
        .peekable();
    if sensors.peek().is_none() {
        return Err(QueryError::MissingParameter("sensors"));
    }
    let sensors: Vec<String> = sensors
        .flat_map(|(_, value)| value.split(';'))
        .map(str::to_string)
        .collect();

    engine.require_building(&building)?;
    let slices = engine.slice(
        &building,
        request_timestamp(start)?,
        request_timestamp(stop)?,
        &sensors,
    )?;

    let mut payload = Map::with_capacity(slices.len());
    for slice in slices {
        let points: Map<String, Value> = slice
            .points
            .iter()
            .map(|(ts, value)| (format_timestamp(ts), json!(value)))
            .collect();
        payload.insert(slice.sensor, Value::Object(points));
    }
    Ok(Json(json!({ "payload": payload })))
}

fn request_timestamp(text: &str) -> QueryResult<NaiveDateTime> {
    parse_timestamp(text)
        .ok_or_else(|| QueryError::Internal(format!("unparseable timestamp '{text}'")))
}
