#![cfg(test)]

use std::path::Path;

use actix_web::dev::ServiceResponse;
use actix_web::test::read_body;
use geocat::config::env::FauxEnv;
use geocat::config::file::{Config, ServerState, parse_config};

#[must_use]
pub fn mock_cfg(yaml: &str) -> Config {
    let mut cfg = parse_config(yaml, &FauxEnv::default(), Path::new("test.yaml"))
        .expect("config can be parsed as yaml");
    let res = cfg.finalize().expect("config can be finalized");
    assert!(res.is_empty(), "unrecognized config: {res:?}");
    cfg
}

#[must_use]
pub fn mock_state(yaml: &str) -> ServerState {
    let config = mock_cfg(yaml);
    config.resolve().unwrap_or_else(|e| {
        panic!(
            "Failed to resolve config:\n{config}\nBecause {e}",
            config = serde_yaml::to_string(&config).unwrap()
        )
    })
}

pub async fn assert_response(response: ServiceResponse) -> ServiceResponse {
    if !response.status().is_success() {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = read_body(response).await;
        let body = String::from_utf8_lossy(&bytes);
        panic!("response status: {status}\nresponse headers: {headers:?}\nresponse body: {body}");
    }
    response
}
