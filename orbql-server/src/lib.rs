pub mod config;
pub mod content_negotiation;
pub mod logging;

use std::io::Read;
use std::sync::Arc;

use orbql_core::engine::QueryExecution;
use orbql_core::registry::{Registry, ServiceDescription};
use orbql_core::OrbqlError;
use oxhttp::model::{Body, Method, Request, Response, Status};
use sparesults::{QueryResultsSerializer, QuerySolution};
use spareval::QueryResults;
use url::Url;

use config::ServerConfig;

pub struct AppState {
    pub config: ServerConfig,
    pub registry: Registry,
}

/// Builds the registry declared by the configuration: procedure groups resolved
/// against the fixed table of bundles this binary was compiled with, plus the
/// service-wide self-description returned under the `orb` sentinel.
pub fn build_registry(config: &ServerConfig) -> anyhow::Result<Registry> {
    let mut registry = Registry::new();
    for group in &config.registry_manifest.groups {
        match group.as_str() {
            "math" => orbql_procedures::math::register(&mut registry)?,
            "sequence_fetch" => orbql_procedures::sequence_fetch::register(&mut registry)?,
            other => anyhow::bail!("unknown registry manifest group {other:?}"),
        }
    }
    registry.set_service_description(ServiceDescription {
        author: config.orb_description.author.clone(),
        description: config.orb_description.description.clone(),
        provenance: config.orb_description.provenance.clone(),
        version: config.orb_description.version.clone(),
    });
    Ok(registry)
}

fn extract_query(request: &mut Request) -> Result<String, OrbqlError> {
    let url = Url::parse(&request.uri().to_string())
        .map_err(|e| OrbqlError::RequestMalformed(e.to_string()))?;
    match *request.method() {
        Method::GET => url
            .query_pairs()
            .find(|(k, _)| k == "query")
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| OrbqlError::RequestMalformed("missing query parameter".to_string())),
        Method::POST => {
            let content_type = request
                .header(&oxhttp::model::HeaderName::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let mut body = String::new();
            request
                .body_mut()
                .read_to_string(&mut body)
                .map_err(OrbqlError::Io)?;
            if content_type.starts_with("application/x-www-form-urlencoded") {
                url::form_urlencoded::parse(body.as_bytes())
                    .find(|(k, _)| k == "query")
                    .map(|(_, v)| v.into_owned())
                    .ok_or_else(|| OrbqlError::RequestMalformed("missing query field".to_string()))
            } else if content_type.starts_with("application/sparql-query") {
                Err(OrbqlError::RequestMalformed(
                    "direct POST of application/sparql-query is not implemented".to_string(),
                ))
            } else {
                Err(OrbqlError::RequestMalformed(format!(
                    "unsupported content type {content_type:?}"
                )))
            }
        }
        _ => Err(OrbqlError::RequestMalformed("unsupported HTTP method".to_string())),
    }
}

fn error_response(error: &OrbqlError) -> Response {
    Response::builder(Status::INTERNAL_SERVER_ERROR)
        .with_body(error.to_string())
}

fn serialize_results(results: QueryResults, format: sparesults::QueryResultsFormat) -> Result<Vec<u8>, OrbqlError> {
    let serializer = QueryResultsSerializer::from_format(format);
    let mut buffer = Vec::new();
    match results {
        QueryResults::Boolean(value) => {
            serializer
                .serialize_boolean_to_writer(&mut buffer, value)
                .map_err(|e| OrbqlError::RequestMalformed(e.to_string()))?;
        }
        QueryResults::Solutions(solutions) => {
            let variables = solutions.variables().to_vec();
            let mut writer = serializer
                .serialize_solutions_to_writer(&mut buffer, variables)
                .map_err(|e| OrbqlError::RequestMalformed(e.to_string()))?;
            for solution in solutions {
                let solution: QuerySolution = solution?;
                writer
                    .write(&solution)
                    .map_err(|e| OrbqlError::RequestMalformed(e.to_string()))?;
            }
            writer.finish().map_err(|e| OrbqlError::RequestMalformed(e.to_string()))?;
        }
        QueryResults::Graph(_) => {
            return Err(OrbqlError::ResponseUnacceptable);
        }
    }
    Ok(buffer)
}

pub fn handle_request(request: &mut Request, state: &Arc<AppState>) -> Response {
    let remote_ip = request
        .header(&oxhttp::model::HeaderName::try_from("x-forwarded-for").unwrap())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("127.0.0.1")
        .to_string();

    if !state.config.is_allowed(&remote_ip) {
        tracing::warn!(remote_ip, "rejected by IP allowlist");
        return error_response(&OrbqlError::AccessDenied);
    }

    let accept = request
        .header(&oxhttp::model::HeaderName::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let Some(format) = crate::content_negotiation::negotiate(accept.as_deref()) else {
        return error_response(&OrbqlError::ResponseUnacceptable);
    };

    let query = match extract_query(request) {
        Ok(q) => q,
        Err(e) => return error_response(&e),
    };
    crate::logging::log_request(&state.config.log_directory, &request.method().to_string(), &query, &remote_ip);

    let result = (|| -> Result<Vec<u8>, OrbqlError> {
        let execution = QueryExecution::new(&state.registry, &query)?;
        let results = execution.run()?;
        serialize_results(results, format)
    })();

    match result {
        Ok(body) => {
            crate::logging::log_response(&state.config.log_directory, 200, body.len());
            Response::builder(Status::OK).with_body(Body::from(body))
        }
        Err(e) => {
            crate::logging::log_response(&state.config.log_directory, 500, 0);
            tracing::error!(error = %e, "query failed");
            error_response(&e)
        }
    }
}
