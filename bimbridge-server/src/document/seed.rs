//! Document seeds
//!
//! A seed describes the initial content of a document: levels, element
//! types, the reinforcement catalog, views and pre-placed instances. Seeds
//! are read from JSON; `Document::starter` builds the default template.

use std::collections::BTreeMap;
use std::path::Path;

use bimbridge_utils::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::geometry::Xyz;
use super::model::{
    CatalogEntry, Category, ElementId, ElementType, Family, Level, ModelError, ModelStore,
    StructuralMaterial, View, ViewKind,
};
use super::Document;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSeed {
    pub title: String,
    pub levels: Vec<LevelSeed>,
    pub types: Vec<TypeSeed>,
    pub rebar: RebarSeed,
    pub views: Vec<ViewSeed>,
    /// Name of the active view; the first view when unset
    pub active_view: Option<String>,
    pub instances: Vec<InstanceSeed>,
}

impl Default for DocumentSeed {
    fn default() -> Self {
        Self {
            title: "Untitled".into(),
            levels: Vec::new(),
            types: Vec::new(),
            rebar: RebarSeed::default(),
            views: Vec::new(),
            active_view: None,
            instances: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSeed {
    pub name: String,
    #[serde(default)]
    pub elevation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSeed {
    pub category: Category,
    pub family: String,
    pub name: String,
    #[serde(default)]
    pub material: Option<StructuralMaterial>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RebarSeed {
    pub bar_types: Vec<String>,
    pub shapes: Vec<String>,
    pub hook_types: Vec<String>,
    pub cover_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSeed {
    pub name: String,
    pub kind: ViewKind,
    #[serde(default)]
    pub template: bool,
    #[serde(default)]
    pub perspective: bool,
}

/// An instance placed while seeding, by type and level name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSeed {
    #[serde(rename = "type")]
    pub type_name: String,
    pub category: Category,
    pub level: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

fn default_true() -> bool {
    true
}

impl DocumentSeed {
    /// The default template
    pub fn starter() -> Self {
        fn ty(
            category: Category,
            family: &str,
            name: &str,
            material: Option<StructuralMaterial>,
            dims: Option<(f64, f64)>,
            active: bool,
        ) -> TypeSeed {
            TypeSeed {
                category,
                family: family.into(),
                name: name.into(),
                material,
                width: dims.map(|d| d.0),
                depth: dims.map(|d| d.1),
                active,
            }
        }
        fn view(name: &str, kind: ViewKind) -> ViewSeed {
            ViewSeed {
                name: name.into(),
                kind,
                template: false,
                perspective: false,
            }
        }
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let concrete = Some(StructuralMaterial::Concrete);

        Self {
            title: "Untitled".into(),
            levels: vec![
                LevelSeed {
                    name: "Level 1".into(),
                    elevation: 0.0,
                },
                LevelSeed {
                    name: "Level 2".into(),
                    elevation: 10.0,
                },
            ],
            types: vec![
                ty(Category::Walls, "Basic Wall", "Generic - 200mm", None, None, true),
                ty(Category::Walls, "Basic Wall", "Exterior - Brick on CMU", None, None, true),
                ty(
                    Category::StructuralColumns,
                    "Concrete-Rectangular-Column",
                    "300 x 300mm",
                    concrete,
                    Some((1.0, 1.0)),
                    true,
                ),
                ty(
                    Category::StructuralColumns,
                    "Concrete-Rectangular-Column",
                    "450 x 450mm",
                    concrete,
                    Some((1.5, 1.5)),
                    false,
                ),
                ty(
                    Category::StructuralColumns,
                    "W-Wide Flange-Column",
                    "W10X33",
                    Some(StructuralMaterial::Steel),
                    Some((0.8, 0.8)),
                    false,
                ),
                ty(
                    Category::StructuralFraming,
                    "Concrete-Rectangular Beam",
                    "300 x 600mm",
                    concrete,
                    Some((1.0, 2.0)),
                    true,
                ),
                ty(Category::Doors, "Single-Flush", "0915 x 2134mm", None, Some((3.0, 0.2)), true),
                ty(Category::Windows, "Fixed", "0915 x 1220mm", None, Some((3.0, 0.2)), true),
            ],
            rebar: RebarSeed {
                bar_types: names(&["10M", "15M", "20M"]),
                shapes: names(&["Stirrup", "M_00", "M_T1"]),
                hook_types: names(&["Standard - 90 deg.", "Stirrup/Tie - 135 deg."]),
                cover_types: names(&["Interior (framing, columns)", "Exterior"]),
            },
            views: vec![
                view("Level 1", ViewKind::FloorPlan),
                view("Level 2", ViewKind::FloorPlan),
                view("{3D}", ViewKind::ThreeD),
                view("A101 - Plans", ViewKind::DrawingSheet),
                view("Wall Schedule", ViewKind::Schedule),
            ],
            active_view: Some("Level 1".into()),
            instances: Vec::new(),
        }
    }
}

impl Document {
    /// A document built from the default template
    pub fn starter(title: impl Into<String>) -> Self {
        let mut seed = DocumentSeed::starter();
        seed.title = title.into();
        match Self::from_seed(seed) {
            Ok(doc) => doc,
            Err(e) => unreachable!("starter seed is invalid: {}", e),
        }
    }

    /// Build a document from a seed
    pub fn from_seed(seed: DocumentSeed) -> std::result::Result<Self, ModelError> {
        let mut store = ModelStore::default();

        for level in &seed.levels {
            let id = store.allocate_id();
            store.levels.push(Level {
                id,
                name: level.name.clone(),
                elevation: level.elevation,
            });
        }

        // Families are grouped by (category, family name) in first-seen order
        let mut family_ids: BTreeMap<(String, String), ElementId> = BTreeMap::new();
        for ty in &seed.types {
            let family_id = if ty.category.is_loadable() {
                let key = (ty.category.display_name().to_string(), ty.family.clone());
                let id = match family_ids.get(&key) {
                    Some(id) => *id,
                    None => {
                        let id = store.allocate_id();
                        store.families.push(Family {
                            id,
                            name: ty.family.clone(),
                            category: ty.category,
                            symbol_ids: Vec::new(),
                        });
                        family_ids.insert(key, id);
                        id
                    }
                };
                Some(id)
            } else {
                None
            };

            let id = store.allocate_id();
            store.types.push(ElementType {
                id,
                category: ty.category,
                family_id,
                family_name: ty.family.clone(),
                name: ty.name.clone(),
                is_active: ty.active || family_id.is_none(),
                material: ty.material,
                width: ty.width,
                depth: ty.depth,
            });
            if let Some(fid) = family_id {
                if let Some(family) = store.families.iter_mut().find(|f| f.id == fid) {
                    family.symbol_ids.push(id);
                }
            }
        }

        let catalog = |store: &mut ModelStore, names: &[String]| -> Vec<CatalogEntry> {
            names
                .iter()
                .map(|name| CatalogEntry {
                    id: store.allocate_id(),
                    name: name.clone(),
                })
                .collect()
        };
        store.rebar.bar_types = catalog(&mut store, &seed.rebar.bar_types);
        store.rebar.shapes = catalog(&mut store, &seed.rebar.shapes);
        store.rebar.hook_types = catalog(&mut store, &seed.rebar.hook_types);
        store.rebar.cover_types = catalog(&mut store, &seed.rebar.cover_types);

        for view in &seed.views {
            let id = store.allocate_id();
            store.views.push(View {
                id,
                name: view.name.clone(),
                kind: view.kind,
                is_template: view.template,
                is_perspective: view.perspective,
            });
        }

        store.active_view = match &seed.active_view {
            Some(name) => Some(
                store
                    .views
                    .iter()
                    .find(|v| v.name == *name)
                    .map(|v| v.id)
                    .ok_or_else(|| ModelError::InvalidSeed(format!("no view named {}", name)))?,
            ),
            None => store.views.first().map(|v| v.id),
        };

        for inst in &seed.instances {
            let level_id = store
                .find_level_by_name(&inst.level)
                .map(|l| l.id)
                .ok_or_else(|| ModelError::InvalidSeed(format!("no level named {}", inst.level)))?;
            let symbol_id = store
                .find_type_by_name(inst.category, &inst.type_name)
                .map(|t| t.id)
                .ok_or_else(|| {
                    ModelError::InvalidSeed(format!("no type named {}", inst.type_name))
                })?;
            store.new_family_instance(Xyz::new(inst.x, inst.y, inst.z), symbol_id, level_id)?;
        }

        let mut doc = Document::empty(seed.title);
        doc.store = store;
        Ok(doc)
    }

    /// Parse a JSON seed
    pub fn parse_seed(content: &str) -> std::result::Result<Self, ModelError> {
        let seed: DocumentSeed = serde_json::from_str(content)
            .map_err(|e| ModelError::InvalidSeed(e.to_string()))?;
        Self::from_seed(seed)
    }

    /// Load a JSON seed from disk
    pub fn load_seed(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BridgeError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let doc = Self::parse_seed(&content)
            .map_err(|e| BridgeError::document(format!("{}: {}", path.display(), e)))?;
        info!(
            "Loaded document '{}' from {} ({} elements)",
            doc.title(),
            path.display(),
            doc.model().element_count()
        );
        Ok(doc)
    }
}
