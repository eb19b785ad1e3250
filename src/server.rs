use actix_cors::Cors;
use actix_web::{http::StatusCode, web, App, HttpResponse, HttpServer, Responder, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::core::PackError;
use crate::pipeline::{PackRequest, Pipeline};

const DEFAULT_WORKER_COUNT: usize = 4;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRepoRequest {
    #[serde(default)]
    pub repo_url: String,
    #[serde(default)]
    pub filter_mode: Option<String>,
    #[serde(default)]
    pub filter_extensions: Option<String>,
}

impl From<FetchRepoRequest> for PackRequest {
    fn from(request: FetchRepoRequest) -> Self {
        PackRequest {
            repo_url: request.repo_url,
            filter_mode: request.filter_mode,
            filter_extensions: request.filter_extensions,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ResponseError for PackError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            detail: self.to_string(),
        })
    }
}

async fn fetch_repo(
    pipeline: web::Data<Pipeline>,
    body: web::Json<FetchRepoRequest>,
) -> Result<HttpResponse, PackError> {
    let request = PackRequest::from(body.into_inner());
    let output = pipeline.run(&request).await?;
    Ok(HttpResponse::Ok().json(output))
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        PackError::InvalidInput(format!("Invalid request body: {err}")).into()
    }))
    .service(web::resource("/fetchRepo").route(web::post().to(fetch_repo)))
    .service(web::resource("/health").route(web::get().to(health_check)));
}

pub async fn run(pipeline: Pipeline, bind_address: &str, port: u16) -> anyhow::Result<()> {
    let pipeline = web::Data::new(pipeline);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(pipeline.clone())
            .wrap(Cors::permissive())
            .configure(app_config)
    })
    .workers(DEFAULT_WORKER_COUNT)
    .bind((bind_address, port))
    .map_err(|e| anyhow::anyhow!("Failed to bind server to {bind_address}:{port}: {e}"))?
    .run();

    info!("Serving on http://{bind_address}:{port}");

    if let Err(e) = server.await {
        error!("Web server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
