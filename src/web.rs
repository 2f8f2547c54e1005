use std::path::PathBuf;
use std::sync::Mutex;

use actix_files::Files;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{Config, ScheduleConfig};
use crate::error::SchedulerError;
use crate::export::{write_schedule_csv, NamedSchedule};
use crate::parser::LeagueInput;
use crate::schedule::{Problem, RunOptions, RunReport, RunStats, Scheduler};

/// Caps for web runs whose config leaves them unbounded
const WEB_MAX_ATTEMPTS: u64 = 2_000;
const WEB_MAX_BACKTRACKS: u64 = 50_000;

/// Latest generated run, shared between requests
pub struct AppState {
    pub latest: Mutex<Option<GeneratedRun>>,
    pub schedule: ScheduleConfig,
    pub max_rendered: usize,
}

impl AppState {
    pub fn new(schedule: ScheduleConfig, max_rendered: usize) -> Self {
        Self {
            latest: Mutex::new(None),
            schedule,
            max_rendered,
        }
    }
}

pub struct GeneratedRun {
    pub problem: Problem,
    pub report: RunReport,
    pub requested: usize,
    pub complete: bool,
    pub generated_at: String,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub league: LeagueInput,
    pub weeks: usize,
    #[serde(default)]
    pub weeks_between_matchups: usize,
    #[serde(default = "default_num_schedules")]
    pub num_schedules: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_num_schedules() -> usize {
    1
}

#[derive(Serialize)]
pub struct RunResponse {
    success: bool,
    /// False when the attempt budget ran out before `requested` schedules were found
    complete: bool,
    requested: usize,
    generated_at: String,
    stats: RunStats,
    schedules: Vec<NamedSchedule>,
}

impl RunResponse {
    fn new(run: &GeneratedRun) -> Self {
        Self {
            success: true,
            complete: run.complete,
            requested: run.requested,
            generated_at: run.generated_at.clone(),
            stats: run.report.stats.clone(),
            schedules: run
                .report
                .schedules
                .iter()
                .map(|ranked| NamedSchedule::new(&run.problem, ranked))
                .collect(),
        }
    }
}

fn bounded_run_options(schedule: &ScheduleConfig, max_reported: usize) -> RunOptions {
    let mut options = schedule.run_options(max_reported);
    options.max_attempts = Some(options.max_attempts.unwrap_or(WEB_MAX_ATTEMPTS));
    options.limits.max_backtracks =
        Some(options.limits.max_backtracks.unwrap_or(WEB_MAX_BACKTRACKS));
    options
}

fn lock_error<T>(_: T) -> actix_web::Error {
    actix_web::error::ErrorInternalServerError("schedule state is unavailable")
}

// Generate schedules from a JSON league description
async fn generate(
    req: web::Json<GenerateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    if req.num_schedules == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "num_schedules must be at least 1"
        })));
    }

    let problem = match Problem::new(&req.league, req.weeks, req.weeks_between_matchups) {
        Ok(problem) => problem,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e.to_string()
            })))
        }
    };

    let options = bounded_run_options(&state.schedule, state.max_rendered);
    let seed = req.seed.or(state.schedule.seed);
    let requested = req.num_schedules;

    // The search is CPU bound; keep it off the async workers
    let (problem, outcome) = web::block(move || {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let outcome = Scheduler::new(&problem, options, rng).generate(requested);
        (problem, outcome)
    })
    .await
    .map_err(|e| actix_web::error::ErrorInternalServerError(format!("Scheduler failed: {}", e)))?;

    let (report, complete) = match outcome {
        Ok(report) => (report, true),
        Err(SchedulerError::BudgetExhausted { partial, .. }) => {
            warn!(found = partial.schedules.len(), requested, "returning partial results");
            (*partial, false)
        }
        Err(e) => {
            return Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e.to_string()
            })))
        }
    };

    let run = GeneratedRun {
        problem,
        report,
        requested,
        complete,
        generated_at: chrono::Local::now().to_rfc3339(),
    };
    let body = RunResponse::new(&run);
    info!(schedules = body.schedules.len(), complete, "web generation finished");
    *state.latest.lock().map_err(lock_error)? = Some(run);

    if complete {
        Ok(HttpResponse::Ok().json(body))
    } else {
        Ok(HttpResponse::UnprocessableEntity().json(body))
    }
}

// Latest results
async fn get_schedules(state: web::Data<AppState>) -> Result<HttpResponse> {
    let latest = state.latest.lock().map_err(lock_error)?;
    match latest.as_ref() {
        Some(run) => Ok(HttpResponse::Ok().json(RunResponse::new(run))),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No schedules available"}))),
    }
}

// One schedule by id
async fn get_schedule(
    id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let latest = state.latest.lock().map_err(lock_error)?;
    let found = latest.as_ref().and_then(|run| {
        run.report
            .schedules
            .iter()
            .find(|s| s.id == *id)
            .map(|ranked| NamedSchedule::new(&run.problem, ranked))
    });

    match found {
        Some(schedule) => Ok(HttpResponse::Ok().json(schedule)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "Schedule not available"}))),
    }
}

// One schedule as CSV
async fn get_schedule_csv(
    id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let latest = state.latest.lock().map_err(lock_error)?;
    let Some((run, ranked)) = latest.as_ref().and_then(|run| {
        run.report
            .schedules
            .iter()
            .find(|s| s.id == *id)
            .map(|ranked| (run, ranked))
    }) else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "Schedule not available"})));
    };

    let mut body = Vec::new();
    write_schedule_csv(&run.problem, ranked, &mut body)
        .map_err(|e| actix_web::error::ErrorInternalServerError(format!("Failed to render CSV: {}", e)))?;

    Ok(HttpResponse::Ok().content_type("text/csv").body(body))
}

/// API routes, shared by the server and the tests
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/generate", web::post().to(generate))
        .route("/api/schedules", web::get().to(get_schedules))
        .route("/api/schedules/{id}", web::get().to(get_schedule))
        .route("/api/schedules/{id}/csv", web::get().to(get_schedule_csv));
}

pub async fn start_server(port: u16, config: Config) -> std::io::Result<()> {
    let output_path: PathBuf = config.output.path.clone();
    std::fs::create_dir_all(&output_path)?;

    let app_state = web::Data::new(AppState::new(config.schedule, config.output.max_rendered));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .service(Files::new("/output", output_path.clone()).show_files_listing())
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;

    fn round_robin_request(num_schedules: usize) -> serde_json::Value {
        serde_json::json!({
            "league": {
                "entities": ["A", "B", "C", "D"],
                "requirements": {
                    "A": {"B": 1, "C": 1, "D": 1},
                    "B": {"A": 1, "C": 1, "D": 1},
                    "C": {"A": 1, "B": 1, "D": 1},
                    "D": {"A": 1, "B": 1, "C": 1}
                },
                "pinned": {"1": [["A", "B"], ["C", "D"]]}
            },
            "weeks": 3,
            "weeks_between_matchups": 1,
            "num_schedules": num_schedules,
            "seed": 5
        })
    }

    fn state(max_attempts: Option<u64>) -> web::Data<AppState> {
        let schedule = ScheduleConfig {
            max_attempts,
            ..ScheduleConfig::default()
        };
        web::Data::new(AppState::new(schedule, 10))
    }

    #[actix_web::test]
    async fn generate_then_fetch() {
        let app = test::init_service(App::new().app_data(state(Some(500))).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(round_robin_request(2))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["complete"], true);
        assert_eq!(body["schedules"].as_array().unwrap().len(), 2);
        assert_eq!(body["schedules"][0]["weeks"][0]["opponents"]["A"], "B");

        let req = test::TestRequest::get().uri("/api/schedules/B").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["id"], "B");

        let req = test::TestRequest::get().uri("/api/schedules/A/csv").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert!(body.starts_with(b"Score: 0\n"));

        let req = test::TestRequest::get().uri("/api/schedules/Q").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn invalid_league_is_a_bad_request() {
        let app = test::init_service(App::new().app_data(state(Some(10))).configure(routes)).await;

        let mut request = round_robin_request(1);
        request["league"]["pinned"] = serde_json::json!({"1": [["A", "Z"]]});
        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(request)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn budget_exhaustion_returns_partial_results() {
        let app = test::init_service(App::new().app_data(state(Some(50))).configure(routes)).await;

        // Only two schedules exist once week 1 is pinned
        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(round_robin_request(3))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["complete"], false);
        assert_eq!(body["schedules"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn unbounded_config_still_stops() {
        let schedule = ScheduleConfig {
            max_attempts: None,
            max_backtracks: None,
            ..ScheduleConfig::default()
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(schedule, 10)))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(round_robin_request(3))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["stats"]["attempts"], WEB_MAX_ATTEMPTS);
    }

    #[::core::prelude::v1::test]
    fn configured_caps_are_kept() {
        let schedule = ScheduleConfig {
            max_attempts: Some(7),
            max_backtracks: None,
            ..ScheduleConfig::default()
        };
        let options = bounded_run_options(&schedule, 4);

        assert_eq!(options.max_attempts, Some(7));
        assert_eq!(options.limits.max_backtracks, Some(WEB_MAX_BACKTRACKS));
        assert_eq!(options.max_reported, 4);
    }

    #[actix_web::test]
    async fn nothing_generated_yet() {
        let app = test::init_service(App::new().app_data(state(None)).configure(routes)).await;

        let req = test::TestRequest::get().uri("/api/schedules").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
