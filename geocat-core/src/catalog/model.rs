//! Catalog entities.
//!
//! These are plain owned values. The catalog hands out copies, and changes only
//! take effect once they are saved back through the [`Catalog`](super::Catalog).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crs::Crs;
use crate::{Envelope, ReferencedEnvelope};

/// A namespace partitioning catalog entries by name.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique name, also used as the namespace prefix
    pub name: String,
    /// Namespace URI
    pub uri: Option<String>,
}

/// Bookkeeping attached to layers and maps.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// When the entry was created
    pub created: Option<DateTime<Utc>>,
    /// When the entry was last modified
    pub modified: Option<DateTime<Utc>>,
    /// Note describing the last modification
    pub change: Option<String>,
}

/// A style that can be paired with a layer.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    /// Unique style name
    pub name: String,
    /// Style document file name, e.g. `roads.ysld`
    pub filename: String,
    /// Owning workspace, `None` for global styles
    pub workspace: Option<String>,
}

/// Reference to the store a resource is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRef {
    /// Store name
    pub name: String,
    /// Workspace owning the store
    pub workspace: String,
}

/// The kind of property an attribute describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// A geometry column
    Geometry,
    /// A simple attribute
    #[default]
    Attribute,
    /// A reference to another feature
    Association,
    /// Anything else
    Property,
}

impl PropertyKind {
    /// Name used in the JSON API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Geometry => "geometry",
            Self::Attribute => "attribute",
            Self::Association => "association",
            Self::Property => "property",
        }
    }
}

const fn default_max_occurs() -> u32 {
    1
}

const fn default_true() -> bool {
    true
}

/// Description of one attribute of a feature type.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    /// Attribute name
    pub name: String,
    /// Kind of property
    #[serde(default)]
    pub property: PropertyKind,
    /// Binding type name, e.g. `String`, `Integer`, `MultiLineString`
    #[serde(rename = "type")]
    pub binding: String,
    /// Spatial reference identifier of a geometry attribute
    pub srs: Option<String>,
    /// Attribute namespace URI
    pub namespace: Option<String>,
    /// Free text description
    pub description: Option<String>,
    /// Minimum number of occurrences
    #[serde(default)]
    pub min_occurs: u32,
    /// Maximum number of occurrences
    #[serde(default = "default_max_occurs")]
    pub max_occurs: u32,
    /// Whether the attribute accepts nulls
    #[serde(default = "default_true")]
    pub nillable: bool,
    /// Maximum field length, if restricted
    pub length: Option<u32>,
    /// Default value, as text
    pub default_value: Option<String>,
    /// Validation restrictions as CQL expressions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<String>,
}

impl AttributeDescriptor {
    /// True if the attribute holds geometries.
    #[must_use]
    pub fn is_geometry(&self) -> bool {
        self.property == PropertyKind::Geometry
    }
}

/// Schema of a vector resource.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Feature type name
    pub name: String,
    /// Feature type namespace URI
    pub namespace: Option<String>,
    /// Whether the type is a simple (flat) feature type
    #[serde(default = "default_true")]
    pub simple: bool,
    /// Attributes in declaration order
    #[serde(default)]
    pub attributes: Vec<AttributeDescriptor>,
}

impl FeatureSchema {
    /// The first geometry attribute, if any.
    #[must_use]
    pub fn geometry(&self) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.is_geometry())
    }
}

/// What kind of data a layer publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResourceKind {
    /// Vector features, optionally with a known schema
    Vector {
        /// Feature type schema
        #[serde(default)]
        schema: Option<FeatureSchema>,
    },
    /// Gridded coverage
    Raster,
    /// Layer cascaded from a remote WMS
    Wms,
    /// Any other resource
    Resource,
}

impl ResourceKind {
    /// Name used in the JSON API.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vector { .. } => "vector",
            Self::Raster => "raster",
            Self::Wms => "wms",
            Self::Resource => "resource",
        }
    }
}

/// The data behind a layer.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Native resource name
    pub name: String,
    /// Resource title
    pub title: Option<String>,
    /// Resource abstract
    #[serde(rename = "abstract")]
    pub description: Option<String>,
    /// Store the resource is read from
    pub store: Option<StoreRef>,
    /// Declared spatial reference identifier
    pub srs: Option<String>,
    /// Declared spatial reference
    pub crs: Option<Crs>,
    /// Bounds in the native spatial reference
    pub native_bbox: Option<Envelope>,
    /// Bounds in geographic longitude/latitude
    pub latlon_bbox: Option<Envelope>,
    /// Resource kind and kind-specific details
    #[serde(flatten)]
    pub kind: ResourceKind,
}

/// A published layer.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Layer name, unique within its workspace
    pub name: String,
    /// Workspace (namespace prefix) of the layer
    pub workspace: String,
    /// Layer title, overrides the resource title
    pub title: Option<String>,
    /// Layer abstract, overrides the resource abstract
    #[serde(rename = "abstract")]
    pub description: Option<String>,
    /// The published data
    pub resource: Resource,
    /// Name of the style used when nothing else is specified
    pub default_style: Option<String>,
    /// Creation and modification dates
    #[serde(default)]
    pub metadata: Metadata,
}

impl Layer {
    /// `workspace:name`
    #[must_use]
    pub fn prefixed_name(&self) -> String {
        format!("{}:{}", self.workspace, self.name)
    }
}

/// Rendering mode of a layer group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupMode {
    /// Rendered as a single composite map
    #[default]
    Single,
    /// Members are also published individually
    Named,
    /// Grouping only, not rendered itself
    Container,
    /// Earth observation group
    Eo,
}

impl GroupMode {
    /// Name used in the JSON API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "SINGLE",
            Self::Named => "NAMED",
            Self::Container => "CONTAINER",
            Self::Eo => "EO",
        }
    }
}

impl fmt::Display for GroupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a published member of a map, by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberRef {
    /// A leaf layer, `workspace:name`
    Layer {
        /// Layer workspace
        workspace: String,
        /// Layer name
        name: String,
    },
    /// Another map nested in this one
    NestedGroup {
        /// Group workspace
        workspace: String,
        /// Group name
        name: String,
    },
}

impl MemberRef {
    /// Name of the referenced layer or group.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Layer { name, .. } | Self::NestedGroup { name, .. } => name,
        }
    }

    /// Workspace of the referenced layer or group.
    #[must_use]
    pub fn workspace(&self) -> &str {
        match self {
            Self::Layer { workspace, .. } | Self::NestedGroup { workspace, .. } => workspace,
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workspace(), self.name())
    }
}

/// One (layer, style) pair of a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    /// The published member
    pub member: MemberRef,
    /// Name of the style to render it with, `None` for the member default
    pub style: Option<String>,
}

/// A named, ordered collection of (layer, style) pairs, also known as a layer group.
///
/// Entries are stored bottom-most first, in drawing order.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    /// Identifier assigned by the catalog when the map is added
    pub id: Option<String>,
    /// Name, unique within the workspace
    pub name: String,
    /// Owning workspace
    pub workspace: String,
    /// Map title
    pub title: Option<String>,
    /// Map abstract
    pub description: Option<String>,
    /// Rendering mode
    pub mode: GroupMode,
    /// Declared bounds
    pub bounds: ReferencedEnvelope,
    /// Ordered (layer, style) pairs
    pub entries: Vec<MapEntry>,
    /// Creation and modification dates
    pub metadata: Metadata,
}

impl Map {
    /// Creates an empty single-mode map.
    #[must_use]
    pub fn new(workspace: impl Into<String>, name: impl Into<String>, bounds: ReferencedEnvelope) -> Self {
        Self {
            id: None,
            name: name.into(),
            workspace: workspace.into(),
            title: None,
            description: None,
            mode: GroupMode::Single,
            bounds,
            entries: Vec::new(),
            metadata: Metadata::default(),
        }
    }

    /// The first member name listed more than once, if any.
    #[must_use]
    pub fn duplicate_member(&self) -> Option<&str> {
        use itertools::Itertools as _;
        self.entries
            .iter()
            .map(|e| e.member.name())
            .duplicates()
            .next()
    }
}

/// Shared capabilities of everything that can be published in a map.
pub trait PublishedInfo {
    /// Name of the published entry
    fn name(&self) -> &str;
    /// Title, if any
    fn title(&self) -> Option<&str>;
    /// Abstract, if any
    fn description(&self) -> Option<&str>;
}

impl PublishedInfo for Layer {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PublishedInfo for Map {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A resolved map member, owned snapshot of what a [`MemberRef`] points to.
#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    /// A leaf layer
    Layer(Layer),
    /// A nested map
    NestedGroup(Map),
}

impl Published {
    fn info(&self) -> &dyn PublishedInfo {
        match self {
            Self::Layer(layer) => layer,
            Self::NestedGroup(group) => group,
        }
    }
}

impl PublishedInfo for Published {
    fn name(&self) -> &str {
        self.info().name()
    }

    fn title(&self) -> Option<&str> {
        self.info().title()
    }

    fn description(&self) -> Option<&str> {
        self.info().description()
    }
}
