use chrono::{DateTime, Utc};
use geocat_core::catalog::{AttributeDescriptor, FeatureSchema, Layer, Resource, ResourceKind};
use geocat_core::crs::{Crs, CrsRegistry};
use serde::Serialize;

use crate::codec::date::encode_metadata;
use crate::codec::{BoundsJson, DateJson, ProjJson, encode_proj};

/// Full description of a published layer.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerJson {
    pub name: String,
    pub workspace: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: Option<String>,
    pub schema: Option<SchemaJson>,
    pub proj: ProjJson,
    pub bbox: LayerBoundsJson,
    pub created: Option<DateJson>,
    pub modified: Option<DateJson>,
}

/// Bounds of a layer in its native spatial reference and in longitude/latitude.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerBoundsJson {
    pub native: Option<BoundsJson>,
    pub lonlat: Option<BoundsJson>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaJson {
    pub name: String,
    pub namespace: Option<String>,
    pub simple: bool,
    pub attributes: Vec<AttributeJson>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AttributeJson {
    pub name: String,
    pub property: &'static str,
    #[serde(rename = "type")]
    pub binding: String,
    pub proj: Option<ProjJson>,
    /// Only set on the synthetic coverage attribute
    #[serde(rename = "binding")]
    pub coverage_binding: Option<&'static str>,
    pub namespace: Option<String>,
    pub description: Option<String>,
    pub min_occurs: u32,
    pub max_occurs: u32,
    pub nillable: bool,
    pub length: Option<u32>,
    #[serialize_always]
    pub default_value: Option<String>,
    pub validate: Option<Vec<String>>,
}

#[must_use]
pub fn encode_layer(layer: &Layer, registry: &CrsRegistry, now: DateTime<Utc>) -> LayerJson {
    let resource = &layer.resource;
    let (geometry, schema) = match &resource.kind {
        ResourceKind::Vector {
            schema: Some(schema),
        } => {
            let geometry = schema
                .geometry()
                .map_or_else(|| "Vector".to_string(), |g| g.binding.clone());
            (Some(geometry), Some(feature_schema(schema, registry)))
        }
        ResourceKind::Vector { schema: None } | ResourceKind::Resource => (None, None),
        ResourceKind::Raster => (
            Some("raster".to_string()),
            Some(grid_schema(resource.crs.as_ref(), registry)),
        ),
        ResourceKind::Wms => (Some("layer".to_string()), None),
    };
    let (created, modified) = encode_metadata(&layer.metadata, now);

    LayerJson {
        name: layer.name.clone(),
        workspace: layer.workspace.clone(),
        title: layer.title.clone().or_else(|| resource.title.clone()),
        description: layer
            .description
            .clone()
            .or_else(|| resource.description.clone()),
        kind: resource.kind.as_str(),
        geometry,
        schema,
        proj: encode_proj(resource.crs.as_ref(), resource.srs.as_deref(), registry),
        bbox: layer_bounds(resource),
        created,
        modified,
    }
}

fn layer_bounds(resource: &Resource) -> LayerBoundsJson {
    let geographic = resource.crs.as_ref().is_some_and(Crs::is_geographic);
    let native = match (&resource.native_bbox, &resource.latlon_bbox) {
        (Some(native), _) => Some(native),
        (None, Some(lonlat)) if geographic => Some(lonlat),
        (None, _) => None,
    };
    LayerBoundsJson {
        native: native.map(BoundsJson::from),
        lonlat: resource.latlon_bbox.as_ref().map(BoundsJson::from),
    }
}

fn feature_schema(schema: &FeatureSchema, registry: &CrsRegistry) -> SchemaJson {
    SchemaJson {
        name: schema.name.clone(),
        namespace: schema.namespace.clone(),
        simple: schema.simple,
        attributes: schema
            .attributes
            .iter()
            .map(|a| attribute(a, registry))
            .collect(),
    }
}

fn attribute(attr: &AttributeDescriptor, registry: &CrsRegistry) -> AttributeJson {
    AttributeJson {
        name: attr.name.clone(),
        property: attr.property.as_str(),
        binding: attr.binding.clone(),
        proj: attr
            .is_geometry()
            .then(|| encode_proj(None, attr.srs.as_deref(), registry)),
        coverage_binding: None,
        namespace: attr.namespace.clone(),
        description: attr.description.clone(),
        min_occurs: attr.min_occurs,
        max_occurs: attr.max_occurs,
        nillable: attr.nillable,
        length: attr.length,
        default_value: attr.default_value.clone(),
        validate: (!attr.restrictions.is_empty()).then(|| attr.restrictions.clone()),
    }
}

/// The fixed two-attribute schema every coverage is exposed with.
fn grid_schema(crs: Option<&Crs>, registry: &CrsRegistry) -> SchemaJson {
    let synthetic = |name: &str, property, binding: &str| AttributeJson {
        name: name.to_string(),
        property,
        binding: binding.to_string(),
        proj: None,
        coverage_binding: None,
        namespace: None,
        description: None,
        min_occurs: 0,
        max_occurs: 1,
        nillable: true,
        length: None,
        default_value: None,
        validate: None,
    };
    SchemaJson {
        name: "GridCoverage".to_string(),
        namespace: None,
        simple: true,
        attributes: vec![
            AttributeJson {
                proj: crs.map(|crs| encode_proj(Some(crs), None, registry)),
                ..synthetic("geom", "geometry", "Polygon")
            },
            AttributeJson {
                coverage_binding: Some("GridCoverage"),
                ..synthetic("grid", "attribute", "grid")
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use geocat_core::Envelope;
    use geocat_core::catalog::Metadata;
    use indoc::indoc;
    use insta::assert_json_snapshot;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn parse(yaml: &str) -> Layer {
        let mut layer: Layer = serde_yaml::from_str(yaml).unwrap();
        layer.resource.crs = layer
            .resource
            .srs
            .as_deref()
            .map(|srs| CrsRegistry::default().decode(srs).unwrap());
        layer
    }

    #[test]
    fn encode_vector_layer() {
        let mut layer = parse(indoc! {"
            name: roads
            workspace: topp
            resource:
              name: tiger_roads
              title: Roads
              abstract: Road network
              type: vector
              srs: EPSG:4326
              latlon_bbox: { west: -74.5, south: 40.5, east: -73.5, north: 41.5 }
              schema:
                name: tiger_roads
                namespace: http://topp.example.org
                attributes:
                  - { name: the_geom, property: geometry, type: MultiLineString, srs: EPSG:4326 }
                  - name: label
                    type: String
                    length: 40
                    nillable: false
                    restrictions: [\"length(label) < 40\"]
        "});
        layer.metadata = Metadata {
            created: Some(now() - chrono::TimeDelta::days(3)),
            ..Metadata::default()
        };

        assert_json_snapshot!(encode_layer(&layer, &CrsRegistry::default(), now()), @r#"
        {
          "name": "roads",
          "workspace": "topp",
          "title": "Roads",
          "description": "Road network",
          "type": "vector",
          "geometry": "MultiLineString",
          "schema": {
            "name": "tiger_roads",
            "namespace": "http://topp.example.org",
            "simple": true,
            "attributes": [
              {
                "name": "the_geom",
                "property": "geometry",
                "type": "MultiLineString",
                "proj": {
                  "srs": "EPSG:4326",
                  "type": "geographic",
                  "unit": "degrees"
                },
                "min-occurs": 0,
                "max-occurs": 1,
                "nillable": true,
                "default-value": null
              },
              {
                "name": "label",
                "property": "attribute",
                "type": "String",
                "min-occurs": 0,
                "max-occurs": 1,
                "nillable": false,
                "length": 40,
                "default-value": null,
                "validate": [
                  "length(label) < 40"
                ]
              }
            ]
          },
          "proj": {
            "srs": "EPSG:4326",
            "type": "geographic",
            "unit": "degrees"
          },
          "bbox": {
            "native": {
              "west": -74.5,
              "south": 40.5,
              "east": -73.5,
              "north": 41.5,
              "center": [
                -74.0,
                41.0
              ]
            },
            "lonlat": {
              "west": -74.5,
              "south": 40.5,
              "east": -73.5,
              "north": 41.5,
              "center": [
                -74.0,
                41.0
              ]
            }
          },
          "created": {
            "timestamp": "Thu, 07 Mar 2024 12:00:00 GMT",
            "pretty": "3 days ago"
          }
        }
        "#);
    }

    #[test]
    fn layer_title_overrides_resource() {
        let mut layer = parse(indoc! {"
            name: roads
            workspace: topp
            title: Streets
            resource: { name: tiger_roads, title: Roads, type: vector }
        "});
        let json = encode_layer(&layer, &CrsRegistry::default(), now());
        assert_eq!(json.title.as_deref(), Some("Streets"));
        assert_eq!(json.geometry, None);
        assert_eq!(json.schema, None);

        layer.resource.kind = ResourceKind::Vector {
            schema: Some(FeatureSchema {
                name: "tiger_roads".to_string(),
                namespace: None,
                simple: true,
                attributes: Vec::new(),
            }),
        };
        let json = encode_layer(&layer, &CrsRegistry::default(), now());
        assert_eq!(json.geometry.as_deref(), Some("Vector"));
    }

    #[test]
    fn encode_raster_layer() {
        let layer = parse(indoc! {"
            name: dem
            workspace: sf
            resource:
              name: dem
              type: raster
              srs: EPSG:3857
              native_bbox: { west: 0.0, south: 0.0, east: 1000.0, north: 500.0 }
        "});
        let json = encode_layer(&layer, &CrsRegistry::default(), now());
        assert_eq!(json.kind, "raster");
        assert_eq!(json.geometry.as_deref(), Some("raster"));
        assert_eq!(
            json.bbox.native.map(|b| b.to_envelope()),
            Some(Envelope::new(0.0, 1000.0, 0.0, 500.0))
        );
        assert_eq!(json.bbox.lonlat, None);

        assert_json_snapshot!(json.schema, @r#"
        {
          "name": "GridCoverage",
          "simple": true,
          "attributes": [
            {
              "name": "geom",
              "property": "geometry",
              "type": "Polygon",
              "proj": {
                "srs": "EPSG:3857",
                "type": "projected",
                "unit": "m"
              },
              "min-occurs": 0,
              "max-occurs": 1,
              "nillable": true,
              "default-value": null
            },
            {
              "name": "grid",
              "property": "attribute",
              "type": "grid",
              "binding": "GridCoverage",
              "min-occurs": 0,
              "max-occurs": 1,
              "nillable": true,
              "default-value": null
            }
          ]
        }
        "#);
    }

    #[test]
    fn projected_layer_without_native_bounds() {
        let layer = parse(indoc! {"
            name: parcels
            workspace: sf
            resource:
              name: parcels
              type: wms
              srs: EPSG:3857
              latlon_bbox: { west: -1.5, south: -1.5, east: 1.5, north: 1.5 }
        "});
        let json = encode_layer(&layer, &CrsRegistry::default(), now());
        assert_eq!(json.geometry.as_deref(), Some("layer"));
        assert_eq!(json.bbox.native, None);
        assert!(json.bbox.lonlat.is_some());
    }
}
