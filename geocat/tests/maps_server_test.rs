use std::fs;

use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::test::{TestRequest, call_service, read_body, read_body_json};
use approx::assert_relative_eq;
use indoc::{formatdoc, indoc};
use insta::assert_json_snapshot;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

pub mod utils;
pub use utils::*;

macro_rules! create_app {
    ($state:expr) => {{
        ::actix_web::test::init_service(
            ::actix_web::App::new()
                .app_data(::actix_web::web::Data::new($state))
                .configure(::geocat::srv::router),
        )
        .await
    }};
}

const CATALOG: &str = indoc! {"
    catalog:
      default_workspace: sf
      workspaces:
        - { name: sf, uri: 'http://sf.example.org' }
        - { name: topp }
      styles:
        - { name: one, filename: one.ysld }
        - { name: two, filename: two.ysld }
        - { name: polygon, filename: polygon.ysld }
      layers:
        - name: one
          workspace: sf
          title: Layer One
          default_style: one
          resource:
            name: one_src
            type: vector
            srs: 'EPSG:4326'
            store: { name: shapes, workspace: sf }
            latlon_bbox: { west: -10.0, south: -5.0, east: 10.0, north: 5.0 }
            schema:
              name: one_src
              attributes:
                - { name: the_geom, property: geometry, type: Point, srs: 'EPSG:4326' }
                - { name: label, type: String }
        - name: two
          workspace: sf
          default_style: two
          resource:
            name: two_src
            type: raster
            srs: 'EPSG:3857'
            native_bbox: { west: 0.0, south: 0.0, east: 1000.0, north: 500.0 }
        - name: states
          workspace: topp
          default_style: polygon
          resource: { name: states, type: vector, srs: 'EPSG:4326' }
      maps:
        - name: base
          workspace: sf
          title: Base map
          srs: 'EPSG:3857'
          bounds: { west: -20000.0, south: -10000.0, east: 20000.0, north: 10000.0 }
          layers:
            - layer: two
            - layer: one
        - name: overlay
          workspace: sf
          mode: NAMED
          layers:
            - { layer: states, workspace: topp }
        - name: world
          workspace: sf
          layers:
            - layer: one
            - group: overlay
"};

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap())
        .collect()
}

#[actix_rt::test]
async fn health_is_ok() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::get().uri("/health").to_request();
    let response = assert_response(call_service(&app, req).await).await;
    assert_eq!(read_body(response).await, "OK");
}

#[rstest]
#[case("/api/maps/sf")]
#[case("/api/maps/default")]
#[actix_rt::test]
async fn list_only_single_maps(#[case] path: &str) {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::get().uri(path).to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(names(&body), vec!["base", "world"]);
    assert!(body[0].get("layers").is_none());
    assert_eq!(body[0]["layer_count"], 2);
}

#[actix_rt::test]
async fn list_pages() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::get()
        .uri("/api/maps/sf?page=1&pagesize=1")
        .to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(names(&body), vec!["world"]);

    let req = TestRequest::get().uri("/api/maps/sf?page=3").to_request();
    let body: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(body, json!([]));
}

#[actix_rt::test]
async fn list_rejects_bad_page() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::get().uri("/api/maps/sf?page=first").to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = read_body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("page"), "{body}");
}

#[actix_rt::test]
async fn list_unknown_workspace() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::get().uri("/api/maps/nowhere").to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = read_body_json(response).await;
    assert_eq!(body["message"], "No such workspace nowhere");
}

#[actix_rt::test]
async fn get_map_detail() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::get().uri("/api/maps/default/base").to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_json_snapshot!(body, @r#"
    {
      "name": "base",
      "workspace": "sf",
      "title": "Base map",
      "abstract": null,
      "proj": {
        "srs": "EPSG:3857",
        "type": "projected",
        "unit": "m"
      },
      "bbox": {
        "west": -20000.0,
        "south": -10000.0,
        "east": 20000.0,
        "north": 10000.0,
        "center": [
          0.0,
          0.0
        ]
      },
      "layer_count": 2,
      "layers": [
        {
          "name": "one",
          "title": "Layer One",
          "resource": "one_src",
          "workspace": "sf"
        },
        {
          "name": "two",
          "resource": "two_src",
          "workspace": "sf"
        }
      ]
    }
    "#);
}

#[actix_rt::test]
async fn get_nested_group_member() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::get().uri("/api/maps/sf/world").to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(
        body["layers"][0],
        json!({"name": "overlay", "workspace": "sf", "group": "NAMED", "layer_count": 1})
    );
    assert_eq!(body["layers"][1]["name"], "one");
}

#[actix_rt::test]
async fn get_missing_map() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::get().uri("/api/maps/sf/nope").to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body: Value = read_body_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("sf") && message.contains("nope"), "{message}");
    assert_eq!(body["cause"], json!(["No such map sf:nope"]));
    assert!(body["trace"].as_str().unwrap().contains("NoSuchMap"));
}

#[actix_rt::test]
async fn create_map_defaults_to_wgs84() {
    let state = mock_state(CATALOG);
    let app = create_app!(state.clone());

    let req = TestRequest::post()
        .uri("/api/maps/sf")
        .set_json(json!({
            "name": "fresh",
            "abstract": "Brand new",
            "bbox": {"west": -120.5, "south": 25.5, "east": -70.25, "north": 49.5},
        }))
        .to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = read_body_json(response).await;

    assert_eq!(body["name"], "fresh");
    assert_eq!(body["title"], Value::Null);
    assert_eq!(body["abstract"], "Brand new");
    assert_eq!(
        body["proj"],
        json!({"srs": "EPSG:4326", "type": "geographic", "unit": "degrees"})
    );
    assert_eq!(body["layers"], json!([]));
    assert_eq!(body["created"]["pretty"], "moments ago");
    assert!(body["modified"]["timestamp"].as_str().unwrap().ends_with("GMT"));

    let map = state.catalog.find_map("sf", "fresh").unwrap();
    assert!(map.id.is_some());
    assert_eq!(map.metadata.created, map.metadata.modified);
}

#[actix_rt::test]
async fn create_map_with_proj() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::post()
        .uri("/api/maps/default")
        .set_json(json!({
            "name": "uk",
            "proj": {"srs": "EPSG:27700"},
            "bbox": {"west": 0, "south": 0, "east": 700000, "north": 1300000},
        }))
        .to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(body["workspace"], "sf");
    assert_eq!(body["proj"]["srs"], "EPSG:27700");
    assert_eq!(body["proj"]["unit"], "m");
    assert_eq!(body["bbox"]["center"], json!([350_000.0, 650_000.0]));
}

#[rstest]
#[case::no_bbox(json!({"name": "fresh"}), "Invalid request body")]
#[case::no_name(json!({"bbox": {"west": 0, "south": 0, "east": 1, "north": 1}}), "Invalid request body")]
#[case::not_object(json!(["fresh"]), "Expected a JSON object, got an array")]
#[case::duplicate(
    json!({"name": "base", "bbox": {"west": 0, "south": 0, "east": 1, "north": 1}}),
    "Map sf:base already exists"
)]
#[actix_rt::test]
async fn create_map_failures(#[case] body: Value, #[case] message: &str) {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::post()
        .uri("/api/maps/sf")
        .set_json(body)
        .to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = read_body_json(response).await;
    assert!(
        body["message"].as_str().unwrap().starts_with(message),
        "{body}"
    );
}

#[actix_rt::test]
async fn create_map_in_unknown_workspace() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::post()
        .uri("/api/maps/nowhere")
        .set_json(json!({"name": "x", "bbox": {"west": 0, "south": 0, "east": 1, "north": 1}}))
        .to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn malformed_body_uses_error_envelope() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::put()
        .uri("/api/maps/sf/base")
        .insert_header((CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = read_body_json(response).await;
    assert!(body["message"].is_string());
    assert!(body["cause"].is_array());
    assert!(body["trace"].is_string());
}

#[rstest]
#[case("PATCH")]
#[case("PUT")]
#[actix_rt::test]
async fn update_title_only(#[case] method: &str) {
    let state = mock_state(CATALOG);
    let app = create_app!(state.clone());

    let req = TestRequest::get().uri("/api/maps/sf/base").to_request();
    let mut before: Value = read_body_json(call_service(&app, req).await).await;

    let req = TestRequest::default()
        .method(method.parse().unwrap())
        .uri("/api/maps/sf/base")
        .set_json(json!({"title": "New"}))
        .to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let mut after: Value = read_body_json(response).await;

    assert_eq!(after["title"], "New");
    assert_eq!(after["modified"]["pretty"], "moments ago");
    for key in ["title", "modified"] {
        before.as_object_mut().unwrap().remove(key);
        after.as_object_mut().unwrap().remove(key);
    }
    assert_eq!(before, after);

    let map = state.catalog.find_map("sf", "base").unwrap();
    assert_eq!(map.title.as_deref(), Some("New"));
    assert_eq!(map.metadata.change.as_deref(), Some("modified [title]"));
}

#[actix_rt::test]
async fn update_bounds_round_trip() {
    let app = create_app!(mock_state(CATALOG));

    let bbox = json!({"west": -8.5, "south": 49.75, "east": 2.0, "north": 61.0});
    let req = TestRequest::patch()
        .uri("/api/maps/sf/base")
        .set_json(json!({"proj": "EPSG:4326", "bbox": bbox.clone(), "change": "reframed"}))
        .to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;

    for key in ["west", "south", "east", "north"] {
        assert_eq!(body["bbox"][key], bbox[key], "{key}");
    }
    let center = &body["bbox"]["center"];
    assert_relative_eq!(center[0].as_f64().unwrap(), (-8.5 + 2.0) / 2.0);
    assert_relative_eq!(center[1].as_f64().unwrap(), (49.75 + 61.0) / 2.0);
    assert_eq!(body["proj"]["type"], "geographic");
}

#[actix_rt::test]
async fn rename_map() {
    let state = mock_state(CATALOG);
    let app = create_app!(state.clone());

    let req = TestRequest::put()
        .uri("/api/maps/sf/world")
        .set_json(json!({"name": "earth"}))
        .to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(body["name"], "earth");

    assert!(state.catalog.find_map("sf", "world").is_err());
    assert_eq!(state.catalog.find_map("sf", "earth").unwrap().entries.len(), 2);
}

#[actix_rt::test]
async fn rename_nested_map_keeps_parent() {
    let state = mock_state(CATALOG);
    let app = create_app!(state.clone());

    let req = TestRequest::put()
        .uri("/api/maps/sf/overlay")
        .set_json(json!({"name": "over2"}))
        .to_request();
    assert_response(call_service(&app, req).await).await;

    let req = TestRequest::get().uri("/api/maps/sf/world").to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(names(&body["layers"]), vec!["over2", "one"]);

    let req = TestRequest::get().uri("/api/maps/sf/world/layers").to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(names(&body), vec!["one", "states"]);
}

#[rstest]
#[case::create("POST", "/api/maps/sf", json!({
    "name": "../../x",
    "bbox": {"west": 0, "south": 0, "east": 1, "north": 1},
}))]
#[case::rename("PATCH", "/api/maps/sf/base", json!({"name": ""}))]
#[actix_rt::test]
async fn unsafe_map_names_are_rejected(
    #[case] method: &str,
    #[case] uri: &str,
    #[case] body: Value,
) {
    let state = mock_state(CATALOG);
    let app = create_app!(state.clone());

    let req = TestRequest::default()
        .method(method.parse().unwrap())
        .uri(uri)
        .set_json(body)
        .to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = read_body_json(response).await;
    assert!(
        body["message"].as_str().unwrap().starts_with("Invalid map name"),
        "{body}"
    );
    assert_eq!(state.catalog.maps("sf").len(), 3);
    assert!(state.catalog.find_map("sf", "base").is_ok());
}

#[actix_rt::test]
async fn update_missing_map() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::patch()
        .uri("/api/maps/sf/nope")
        .set_json(json!({"title": "New"}))
        .to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn delete_returns_remaining_maps() {
    let state = mock_state(CATALOG);
    let app = create_app!(state.clone());

    let req = TestRequest::delete().uri("/api/maps/sf/base").to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(names(&body), vec!["world"]);
    assert!(state.catalog.find_map("sf", "base").is_err());

    let req = TestRequest::delete().uri("/api/maps/sf/base").to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn nested_map_cannot_be_deleted() {
    let state = mock_state(CATALOG);
    let app = create_app!(state.clone());

    let req = TestRequest::delete().uri("/api/maps/sf/overlay").to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = read_body_json(response).await;
    assert_eq!(body["message"], "Map sf:overlay is nested in map sf:world");
    assert!(state.catalog.find_map("sf", "overlay").is_ok());

    let req = TestRequest::get().uri("/api/maps/sf/world").to_request();
    assert_response(call_service(&app, req).await).await;

    let req = TestRequest::delete().uri("/api/maps/sf/world").to_request();
    assert_response(call_service(&app, req).await).await;
    let req = TestRequest::delete().uri("/api/maps/sf/overlay").to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(names(&body), vec!["base"]);
}

#[actix_rt::test]
async fn get_layers_flattens_groups() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::get().uri("/api/maps/sf/world/layers").to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(names(&body), vec!["one", "states"]);
    assert_eq!(body[1]["workspace"], "topp");

    let one = &body[0];
    assert_eq!(one["type"], "vector");
    assert_eq!(one["geometry"], "Point");
    assert_eq!(one["title"], "Layer One");
    assert_eq!(one["schema"]["attributes"][1]["name"], "label");
    assert_eq!(one["bbox"]["native"], one["bbox"]["lonlat"]);
}

#[actix_rt::test]
async fn get_layers_of_raster() {
    let app = create_app!(mock_state(CATALOG));

    let req = TestRequest::get().uri("/api/maps/sf/base/layers").to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(names(&body), vec!["two", "one"]);
    assert_eq!(body[0]["geometry"], "raster");
    assert_eq!(body[0]["schema"]["name"], "GridCoverage");
    assert!(body[0]["bbox"].get("lonlat").is_none());
}

#[rstest]
#[case::stored_one_two(["one", "two"])]
#[case::stored_two_one(["two", "one"])]
#[actix_rt::test]
async fn put_layers_stores_reversed_request(#[case] initial: [&str; 2]) {
    let state = mock_state(CATALOG);
    let mut base = state.catalog.find_map("sf", "base").unwrap();
    base.entries
        .sort_by_key(|entry| initial.iter().position(|name| *name == entry.member.name()));
    state.catalog.save_map(&base).unwrap();
    let app = create_app!(state.clone());

    let req = TestRequest::put()
        .uri("/api/maps/sf/base/layers")
        .set_json(json!([{"name": "two"}, {"name": "one"}]))
        .to_request();
    let response = assert_response(call_service(&app, req).await).await;
    assert!(read_body(response).await.is_empty());

    let map = state.catalog.find_map("sf", "base").unwrap();
    let stored: Vec<_> = map
        .entries
        .iter()
        .map(|entry| {
            let style = entry.style.as_deref().unwrap();
            (
                entry.member.name().to_string(),
                state.catalog.style(style).unwrap().filename,
            )
        })
        .collect();
    assert_eq!(
        stored,
        vec![
            ("one".to_string(), "one.ysld".to_string()),
            ("two".to_string(), "two.ysld".to_string()),
        ]
    );
}

#[actix_rt::test]
async fn put_layers_adds_layer_with_default_style() {
    let state = mock_state(CATALOG);
    let app = create_app!(state.clone());

    let req = TestRequest::put()
        .uri("/api/maps/sf/base/layers")
        .set_json(json!([{"name": "states", "workspace": "topp"}, {"name": "one"}]))
        .to_request();
    assert_response(call_service(&app, req).await).await;

    let map = state.catalog.find_map("sf", "base").unwrap();
    let stored: Vec<_> = map
        .entries
        .iter()
        .map(|e| (e.member.to_string(), e.style.clone().unwrap()))
        .collect();
    assert_eq!(
        stored,
        vec![
            ("sf:one".to_string(), "one".to_string()),
            ("topp:states".to_string(), "polygon".to_string()),
        ]
    );

    let req = TestRequest::get().uri("/api/maps/sf/base").to_request();
    let body: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(names(&body["layers"]), vec!["states", "one"]);
}

#[actix_rt::test]
async fn put_layers_rejects_unknown_layer() {
    let state = mock_state(CATALOG);
    let app = create_app!(state.clone());

    let req = TestRequest::put()
        .uri("/api/maps/sf/base/layers")
        .set_json(json!([{"name": "one"}, {"name": "nope"}]))
        .to_request();
    let response = call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = read_body_json(response).await;
    assert_eq!(body["message"], r#"No such layer: {"name":"nope"}"#);

    let map = state.catalog.find_map("sf", "base").unwrap();
    let members: Vec<_> = map.entries.iter().map(|e| e.member.name()).collect();
    assert_eq!(members, vec!["two", "one"]);
}

#[actix_rt::test]
async fn modified_is_read_from_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let groups = dir.path().join("workspaces").join("sf").join("layergroups");
    fs::create_dir_all(&groups).unwrap();
    fs::write(groups.join("base.xml"), "<layerGroup/>").unwrap();

    let yaml = formatdoc! {"
        data_dir: '{}'
        {CATALOG}",
        dir.path().display()
    };
    let app = create_app!(mock_state(&yaml));

    let req = TestRequest::get().uri("/api/maps/sf").to_request();
    let response = assert_response(call_service(&app, req).await).await;
    let body: Value = read_body_json(response).await;
    assert_eq!(body[0]["name"], "base");
    assert_eq!(body[0]["modified"]["pretty"], "moments ago");
    assert!(body[1].get("modified").is_none());
}
