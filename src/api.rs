//! REST API for the loading plan service.
//!
//! Provides HTTP endpoints for the dashboard and serves the embedded web UI.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, FleetConfig, OptimizerConfig};
use crate::model::{BoxRecord, LoadingPlan, ValidationError, VehicleCount, VehicleType};
use crate::optimizer::{
    PlanningResult, SingleVehicleRecommendation, enumerate_plans_with_settings,
    recommend_single_vehicle,
};
use crate::types::format_volume;
use crate::volume::{BoxLine, BoxRow, ShipmentSummary, TableError, check_table_columns, summarize_rows};

#[derive(Clone)]
struct ApiState {
    fleet: FleetConfig,
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>load-it-now API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

/// Cheapest plans listed in a response; `total_plans` carries the full count.
const MAX_LISTED_PLANS: usize = 100;

const INCOMPLETE_TABLE_HINT: &str = "Enter order data in all columns before proceeding.";

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Embedded Web Assets (HTML, CSS, JS)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// A vehicle type as entered in the dashboard.
#[derive(Deserialize, Clone, ToSchema)]
pub struct VehicleRequest {
    pub name: Option<String>,
    /// Maximum load volume in m³.
    pub capacity: f64,
    pub cost: f64,
}

impl VehicleRequest {
    fn into_vehicle_type(self, index: usize) -> Result<VehicleType, ValidationError> {
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("Vehicle {}", index + 1));
        VehicleType::new(name, self.capacity, self.cost)
    }
}

/// Request for the plan endpoint.
///
/// `vehicles` falls back to the configured fleet when omitted.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "boxes": [
            { "length": 120, "width": 80, "height": 100, "quantity": 30 },
            { "length": 60, "width": 40, "height": 40, "quantity": 50 }
        ],
        "vehicles": [
            { "name": "20 ft", "capacity": 30.0, "cost": 150.0 },
            { "name": "24 ft", "capacity": 40.0, "cost": 200.0 },
            { "name": "32 ft", "capacity": 60.0, "cost": 300.0 }
        ]
    })
)]
pub struct PlanRequest {
    pub boxes: Vec<BoxRow>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub vehicles: Option<Vec<VehicleRequest>>,
}

/// Request for the volume endpoint.
#[derive(Deserialize, ToSchema)]
pub struct VolumeRequest {
    pub boxes: Vec<BoxRow>,
}

#[derive(Debug)]
struct ValidatedPlanRequest {
    rows: Vec<BoxRow>,
    vehicles: Vec<VehicleType>,
}

#[derive(Debug)]
enum PlanRequestValidationError {
    IncompleteTable(TableError),
    MissingVehicles,
    InvalidVehicle(ValidationError),
}

impl PlanRequest {
    fn into_validated(
        self,
        fleet: &FleetConfig,
    ) -> Result<ValidatedPlanRequest, PlanRequestValidationError> {
        check_table_columns(&self.boxes).map_err(PlanRequestValidationError::IncompleteTable)?;

        let vehicles = match self.vehicles {
            None => fleet.vehicles().to_vec(),
            Some(requested) if requested.is_empty() => {
                return Err(PlanRequestValidationError::MissingVehicles);
            }
            Some(requested) => requested
                .into_iter()
                .enumerate()
                .map(|(idx, spec)| spec.into_vehicle_type(idx))
                .collect::<Result<Vec<_>, ValidationError>>()
                .map_err(PlanRequestValidationError::InvalidVehicle)?,
        };

        Ok(ValidatedPlanRequest {
            rows: self.boxes,
            vehicles,
        })
    }
}

/// One feasible plan as shown in the plan table.
#[derive(Serialize, ToSchema)]
pub struct PlanView {
    /// Position in the cost ranking (1-based)
    pub rank: usize,
    pub vehicles: Vec<VehicleCount>,
    pub summary: String,
    pub vehicle_count: u32,
    pub total_capacity: f64,
    pub total_cost: f64,
    pub spare_capacity: f64,
    pub utilization_percent: f64,
    pub is_recommended: bool,
}

impl PlanView {
    fn from_plan(
        index: usize,
        plan: &LoadingPlan,
        vehicles: &[VehicleType],
        required_volume: f64,
    ) -> Self {
        Self {
            rank: index + 1,
            vehicles: plan.vehicle_counts(vehicles),
            summary: plan.describe(vehicles),
            vehicle_count: plan.vehicle_count(),
            total_capacity: plan.total_capacity,
            total_cost: plan.total_cost,
            spare_capacity: plan.spare_capacity(required_volume),
            utilization_percent: plan.utilization_percent(required_volume),
            is_recommended: index == 0,
        }
    }
}

/// Bar chart point: plan index against total cost.
#[derive(Serialize, ToSchema)]
pub struct ChartPoint {
    pub plan_index: usize,
    pub total_cost: f64,
    pub is_recommended: bool,
}

/// The first vehicle type, in list order, that carries the shipment alone.
#[derive(Serialize, ToSchema)]
pub struct SingleVehicleView {
    pub type_index: usize,
    pub name: String,
    pub capacity: f64,
    pub cost: f64,
}

impl From<SingleVehicleRecommendation> for SingleVehicleView {
    fn from(pick: SingleVehicleRecommendation) -> Self {
        Self {
            type_index: pick.type_index,
            name: pick.vehicle.name,
            capacity: pick.vehicle.capacity,
            cost: pick.vehicle.cost,
        }
    }
}

/// Response of the volume endpoint.
#[derive(Serialize, ToSchema)]
pub struct VolumeResponse {
    pub required_volume: f64,
    pub required_volume_display: String,
    pub accepted_rows: usize,
    pub dropped_rows: usize,
    pub boxes: Vec<BoxLine>,
}

impl VolumeResponse {
    fn from_summary(summary: ShipmentSummary) -> Self {
        Self {
            required_volume: summary.required_volume,
            required_volume_display: format_volume(summary.required_volume),
            accepted_rows: summary.accepted_rows(),
            dropped_rows: summary.dropped_rows,
            boxes: summary.lines,
        }
    }
}

/// Response of the plan endpoint.
#[derive(Serialize, ToSchema)]
pub struct PlanResponse {
    pub required_volume: f64,
    pub required_volume_display: String,
    pub accepted_rows: usize,
    pub dropped_rows: usize,
    pub boxes: Vec<BoxLine>,
    pub vehicles: Vec<VehicleType>,
    /// Per-type count bounds used for the search
    pub bounds: Vec<u32>,
    pub combinations_checked: u64,
    #[schema(nullable = true)]
    pub recommended: Option<PlanView>,
    /// Number of feasible plans found
    pub total_plans: usize,
    /// Cheapest feasible plans, at most `MAX_LISTED_PLANS`
    pub plans: Vec<PlanView>,
    pub chart: Vec<ChartPoint>,
    #[schema(nullable = true)]
    pub single_vehicle: Option<SingleVehicleView>,
    pub status: String,
    /// Explanation when no plan could be recommended
    #[schema(nullable = true)]
    pub message: Option<String>,
}

impl PlanResponse {
    fn from_planning_result(
        summary: ShipmentSummary,
        vehicles: Vec<VehicleType>,
        result: PlanningResult,
        single_vehicle: Option<SingleVehicleRecommendation>,
    ) -> Self {
        let PlanningResult {
            required_volume,
            bounds,
            combinations_checked,
            plans,
            status,
        } = result;

        let total_plans = plans.len();
        let plan_views: Vec<PlanView> = plans
            .iter()
            .take(MAX_LISTED_PLANS)
            .enumerate()
            .map(|(idx, plan)| PlanView::from_plan(idx, plan, &vehicles, required_volume))
            .collect();

        let chart = plan_views
            .iter()
            .enumerate()
            .map(|(idx, view)| ChartPoint {
                plan_index: idx,
                total_cost: view.total_cost,
                is_recommended: view.is_recommended,
            })
            .collect();

        let recommended = plans
            .first()
            .map(|plan| PlanView::from_plan(0, plan, &vehicles, required_volume));

        let message = (!status.is_planned()).then(|| status.to_string());

        Self {
            required_volume,
            required_volume_display: format_volume(required_volume),
            accepted_rows: summary.accepted_rows(),
            dropped_rows: summary.dropped_rows,
            boxes: summary.lines,
            vehicles,
            bounds,
            combinations_checked,
            recommended,
            total_plans,
            plans: plan_views,
            chart,
            single_vehicle: single_vehicle.map(SingleVehicleView::from),
            status: status.code().to_string(),
            message,
        }
    }
}

/// Vehicle types configured on the server.
#[derive(Serialize, ToSchema)]
pub struct FleetResponse {
    pub vehicles: Vec<VehicleType>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn incomplete_table_error(err: TableError) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        INCOMPLETE_TABLE_HINT,
        err.to_string(),
    )
}

fn vehicle_config_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid vehicle configuration",
        details,
    )
}

fn parse_plan_request(
    payload: Result<Json<PlanRequest>, JsonRejection>,
    fleet: &FleetConfig,
) -> Result<ValidatedPlanRequest, Response> {
    let Json(payload) = payload.map_err(json_deserialize_error)?;

    match payload.into_validated(fleet) {
        Ok(validated) => Ok(validated),
        Err(PlanRequestValidationError::IncompleteTable(err)) => Err(incomplete_table_error(err)),
        Err(PlanRequestValidationError::MissingVehicles) => Err(vehicle_config_error(
            "At least one vehicle type must be specified",
        )),
        Err(PlanRequestValidationError::InvalidVehicle(err)) => {
            Err(vehicle_config_error(err.to_string()))
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_plan, handle_volume, handle_fleet),
    components(
        schemas(
            PlanRequest,
            VolumeRequest,
            VehicleRequest,
            BoxRow,
            BoxRecord,
            BoxLine,
            VehicleType,
            VehicleCount,
            PlanResponse,
            PlanView,
            ChartPoint,
            SingleVehicleView,
            VolumeResponse,
            FleetResponse,
            ErrorResponse
        )
    ),
    tags((name = "planning", description = "Endpoints for vehicle loading plans"))
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        // API endpoints
        .route("/plan", post(handle_plan))
        .route("/volume", post(handle_volume))
        .route("/fleet", get(handle_fleet))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Web-UI (embedded)
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_static))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    fleet: FleetConfig,
    optimizer_config: OptimizerConfig,
) {
    let app = router(ApiState {
        fleet,
        optimizer_config,
    });

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    let display_host = config.display_host().to_string();
    println!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("🚚 API Endpoints:");
    println!("   - POST /plan");
    println!("   - POST /volume");
    println!("   - GET /fleet");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");
    println!("🌐 Web-UI: http://{}:{}", display_host, config.port());

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /plan endpoint.
///
/// Aggregates the box table into a shipment volume and ranks every feasible
/// vehicle combination by cost.
#[utoipa::path(
    post,
    path = "/plan",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Shipment volume and ranked loading plans", body = PlanResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request, incomplete order table or vehicle configuration",
            body = ErrorResponse
        )
    ),
    tag = "planning"
)]
async fn handle_plan(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_plan_request(payload, &state.fleet) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let ValidatedPlanRequest { rows, vehicles } = request;

    println!(
        "📥 New plan request: {} rows, {} vehicle types",
        rows.len(),
        vehicles.len()
    );

    let summary = summarize_rows(&rows);
    let settings = state.optimizer_config.settings();
    let result = enumerate_plans_with_settings(summary.required_volume, &vehicles, settings);
    let single_vehicle = if state.optimizer_config.single_vehicle_hint() {
        recommend_single_vehicle(summary.required_volume, &vehicles, &settings)
    } else {
        None
    };

    match result.recommended() {
        Some(best) => println!(
            "📦 Result: {} m³, {} feasible plans, best {} at {:.2}",
            format_volume(summary.required_volume),
            result.plan_count(),
            best.describe(&vehicles),
            best.total_cost
        ),
        None => println!(
            "📦 Result: {} m³, no plan ({})",
            format_volume(summary.required_volume),
            result.status
        ),
    }

    let response = PlanResponse::from_planning_result(summary, vehicles, result, single_vehicle);
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /volume endpoint.
///
/// Only aggregates the box table; no plans are computed.
#[utoipa::path(
    post,
    path = "/volume",
    request_body = VolumeRequest,
    responses(
        (status = 200, description = "Shipment volume and accepted rows", body = VolumeResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or incomplete order table",
            body = ErrorResponse
        )
    ),
    tag = "planning"
)]
async fn handle_volume(payload: Result<Json<VolumeRequest>, JsonRejection>) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };
    if let Err(err) = check_table_columns(&request.boxes) {
        return incomplete_table_error(err);
    }

    let summary = summarize_rows(&request.boxes);
    (StatusCode::OK, Json(VolumeResponse::from_summary(summary))).into_response()
}

/// Handler for GET /fleet endpoint.
#[utoipa::path(
    get,
    path = "/fleet",
    responses(
        (status = 200, description = "Configured default vehicle types", body = FleetResponse)
    ),
    tag = "planning"
)]
async fn handle_fleet(State(state): State<ApiState>) -> impl IntoResponse {
    Json(FleetResponse {
        vehicles: state.fleet.vehicles().to_vec(),
    })
}

/// Serves the index.html main page
async fn serve_index() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serves static assets (JS, CSS, etc.)
async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
