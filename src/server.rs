use crate::config::Config;
use crate::data::{
    Adjustment, ClassId, Day, DayState, GroupView, LeaveDetails, PeriodIndex, ResolveInput,
    ResolveOutput, SchoolData, TeacherId,
};
use crate::desk::{self, SubstituteDesk};
use crate::error::DeskError;
use crate::planner::Suggestion;
use crate::store::MemoryStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

type Desk = SubstituteDesk<MemoryStore>;
type AppState = Arc<Mutex<Desk>>;
type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn reject(e: DeskError) -> (StatusCode, String) {
    let status = match &e {
        DeskError::InvalidImportFormat(_) | DeskError::NotASchoolDay(_) => StatusCode::BAD_REQUEST,
        DeskError::UnknownTeacher(_) | DeskError::UnknownGroup { .. } => StatusCode::NOT_FOUND,
        DeskError::NotAbsent(_) | DeskError::AmbiguousGroup { .. } => StatusCode::CONFLICT,
        DeskError::Solver(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DeskError::Serialization(_) | DeskError::SchoolFile(_) | DeskError::Poisoned => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    warn!("Request failed with {}: {}", status, e);
    (status, e.to_string())
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, Desk>, (StatusCode, String)> {
    state.lock().map_err(|_| reject(DeskError::Poisoned))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DayResponse {
    date: NaiveDate,
    day: Option<Day>,
    state: DayState,
    groups: Vec<GroupView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignRequest {
    absent_teacher_id: TeacherId,
    period_index: PeriodIndex,
    #[serde(default)]
    class_id: Option<ClassId>,
    #[serde(default)]
    substitute_teacher_id: TeacherId,
}

async fn resolve_handler(Json(input): Json<ResolveInput>) -> Json<ResolveOutput> {
    Json(desk::resolve(input))
}

async fn get_school(State(state): State<AppState>) -> ApiResult<SchoolData> {
    Ok(Json(lock(&state)?.school().clone()))
}

async fn put_school(
    State(state): State<AppState>,
    Json(school): Json<SchoolData>,
) -> ApiResult<SchoolData> {
    let mut desk = lock(&state)?;
    desk.replace_school(school);
    Ok(Json(desk.school().clone()))
}

fn day_response(desk: &Desk, date: NaiveDate) -> DayResponse {
    DayResponse {
        date,
        day: Day::from_date(date),
        state: desk.day(date),
        groups: desk.day_view(date),
    }
}

async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> ApiResult<DayResponse> {
    let desk = lock(&state)?;
    Ok(Json(day_response(&desk, date)))
}

async fn cancel_day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> ApiResult<DayResponse> {
    let mut desk = lock(&state)?;
    desk.cancel_day(date);
    Ok(Json(day_response(&desk, date)))
}

async fn mark_absent(
    State(state): State<AppState>,
    Path((date, teacher_id)): Path<(NaiveDate, TeacherId)>,
) -> ApiResult<DayResponse> {
    let mut desk = lock(&state)?;
    desk.mark_absent(date, &teacher_id).map_err(reject)?;
    Ok(Json(day_response(&desk, date)))
}

async fn unmark_absent(
    State(state): State<AppState>,
    Path((date, teacher_id)): Path<(NaiveDate, TeacherId)>,
) -> ApiResult<DayResponse> {
    let mut desk = lock(&state)?;
    desk.unmark_absent(date, &teacher_id);
    Ok(Json(day_response(&desk, date)))
}

async fn set_leave(
    State(state): State<AppState>,
    Path((date, teacher_id)): Path<(NaiveDate, TeacherId)>,
    Json(details): Json<LeaveDetails>,
) -> ApiResult<DayResponse> {
    let mut desk = lock(&state)?;
    desk.set_leave(date, &teacher_id, details).map_err(reject)?;
    Ok(Json(day_response(&desk, date)))
}

async fn assign(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<Vec<Adjustment>> {
    info!(
        "Assign {:?} for {} at period index {} on {}",
        request.substitute_teacher_id, request.absent_teacher_id, request.period_index, date
    );
    let mut desk = lock(&state)?;
    desk.assign(
        date,
        &request.absent_teacher_id,
        request.period_index,
        request.class_id.as_deref(),
        &request.substitute_teacher_id,
    )
    .map(Json)
    .map_err(reject)
}

async fn export_adjustments(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> ApiResult<Value> {
    lock(&state)?.export_adjustments(date).map(Json).map_err(reject)
}

async fn import_adjustments(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(raw): Json<Value>,
) -> ApiResult<Vec<Adjustment>> {
    lock(&state)?.import_adjustments(date, raw).map(Json).map_err(reject)
}

async fn auto_assign(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> ApiResult<Vec<Suggestion>> {
    lock(&state)?.auto_assign(date).map(Json).map_err(reject)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/substitutes/resolve", post(resolve_handler))
        .route("/v1/school", get(get_school).put(put_school))
        .route("/v1/days/:date", get(get_day).delete(cancel_day))
        .route(
            "/v1/days/:date/absent/:teacher_id",
            put(mark_absent).delete(unmark_absent),
        )
        .route("/v1/days/:date/leave/:teacher_id", put(set_leave))
        .route("/v1/days/:date/assignments", post(assign))
        .route(
            "/v1/days/:date/adjustments",
            get(export_adjustments).put(import_adjustments),
        )
        .route("/v1/days/:date/auto-assign", post(auto_assign))
        .with_state(state)
}

pub async fn run_server(config: &Config, school: SchoolData) -> std::io::Result<()> {
    let desk = SubstituteDesk::new(school, MemoryStore::new(), config.solver_threads);
    let app = router(Arc::new(Mutex::new(desk)));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{school, slot};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> Router {
        let desk = SubstituteDesk::new(school(), MemoryStore::new(), 1);
        router(Arc::new(Mutex::new(desk)))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn absence_and_assignment_flow() {
        let app = app();
        let (status, day) = send(&app, Method::PUT, "/v1/days/2024-05-13/absent/t1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(day["day"], "monday");
        assert_eq!(day["groups"].as_array().unwrap().len(), 2);
        assert_eq!(
            day["groups"][0]["candidates"][0]["availability"]["status"],
            "IN_CHARGE"
        );

        let (status, adjustments) = send(
            &app,
            Method::POST,
            "/v1/days/2024-05-13/assignments",
            Some(json!({
                "absentTeacherId": "t1",
                "periodIndex": 2,
                "substituteTeacherId": "t3"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(adjustments.as_array().unwrap().len(), 2);
        assert_eq!(adjustments[0]["conflict"]["classNames"]["primary"], "C3");

        let (_, exported) =
            send(&app, Method::GET, "/v1/days/2024-05-13/adjustments", None).await;
        assert_eq!(exported, adjustments);

        let (status, adjustments) = send(
            &app,
            Method::POST,
            "/v1/days/2024-05-13/assignments",
            Some(json!({ "absentTeacherId": "t1", "periodIndex": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(adjustments, json!([]));
    }

    #[tokio::test]
    async fn invalid_import_is_a_bad_request() {
        let app = app();
        let (status, _) = send(
            &app,
            Method::PUT,
            "/v1/days/2024-05-13/adjustments",
            Some(json!({ "adjustments": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let app = app();
        let (status, _) =
            send(&app, Method::PUT, "/v1/days/2024-05-13/absent/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = json!({
            "absentTeacherId": "t1",
            "periodIndex": 0,
            "substituteTeacherId": "t2"
        });
        let monday = "/v1/days/2024-05-13/assignments";
        let (status, _) = send(&app, Method::POST, monday, Some(request.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let saturday = "/v1/days/2024-05-11/assignments";
        let (status, _) = send(&app, Method::POST, saturday, Some(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn assignment_names_a_class_when_lessons_overlap() {
        let mut data = school();
        let monday = data.classes[2].timetable.get_mut(&Day::Monday).unwrap();
        monday[0] = vec![slot("math", "t1", None)];
        let desk = SubstituteDesk::new(data, MemoryStore::new(), 1);
        let app = router(Arc::new(Mutex::new(desk)));
        send(&app, Method::PUT, "/v1/days/2024-05-13/absent/t1", None).await;

        let uri = "/v1/days/2024-05-13/assignments";
        let request = json!({
            "absentTeacherId": "t1",
            "periodIndex": 0,
            "substituteTeacherId": "t2"
        });
        let (status, _) = send(&app, Method::POST, uri, Some(request)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let request = json!({
            "absentTeacherId": "t1",
            "periodIndex": 0,
            "classId": "c3",
            "substituteTeacherId": "t2"
        });
        let (status, adjustments) = send(&app, Method::POST, uri, Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(adjustments[0]["classId"], "c3");
        assert_eq!(adjustments.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn leave_change_and_cancel() {
        let app = app();
        send(&app, Method::PUT, "/v1/days/2024-05-13/absent/t1", None).await;
        let (status, day) = send(
            &app,
            Method::PUT,
            "/v1/days/2024-05-13/leave/t1",
            Some(json!({ "leaveType": "half", "startPeriod": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(day["state"]["leaveDetails"]["t1"]["leaveType"], "half");
        assert_eq!(day["groups"].as_array().unwrap().len(), 1);

        let (_, day) = send(&app, Method::DELETE, "/v1/days/2024-05-13", None).await;
        assert_eq!(day["groups"], json!([]));
        assert_eq!(day["state"]["leaveDetails"], json!({}));
    }

    #[tokio::test]
    async fn school_replacement_rebuilds_bookings() {
        let app = app();
        let (_, mut data) = send(&app, Method::GET, "/v1/school", None).await;
        // t3 gives up the period index 2 lesson in c3
        data["classes"][2]["timetable"]["monday"][2] = json!([]);
        let (status, _) = send(&app, Method::PUT, "/v1/school", Some(data)).await;
        assert_eq!(status, StatusCode::OK);

        send(&app, Method::PUT, "/v1/days/2024-05-13/absent/t1", None).await;
        let (_, day) = send(&app, Method::GET, "/v1/days/2024-05-13", None).await;
        let t3 = day["groups"][1]["candidates"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["teacherId"] == "t3")
            .cloned()
            .unwrap();
        assert_eq!(t3["availability"]["status"], "AVAILABLE");
    }

    #[tokio::test]
    async fn stateless_resolve() {
        let app = app();
        let input = json!({
            "school": serde_json::to_value(school()).unwrap(),
            "date": "2024-05-13",
            "absentTeacherIds": ["t1"],
            "leaveDetails": { "t1": { "leaveType": "half", "startPeriod": 2 } }
        });
        let (status, output) =
            send(&app, Method::POST, "/v1/substitutes/resolve", Some(input)).await;
        assert_eq!(status, StatusCode::OK);
        let groups = output["groups"].as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["group"]["classIds"], json!(["c1", "c2"]));
        assert_eq!(groups[0]["group"]["key"], json!({ "kind": "joint", "id": "j1" }));
    }
}
