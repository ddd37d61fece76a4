//! Host document model
//!
//! `ModelStore` holds every observable property of the document. Reads are
//! available through [`Document`](super::Document); writes only through an
//! open [`Transaction`](super::Transaction).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::{BoundingBox, GeometryError, Line, Plane, Transform, Xyz};

/// Height given to walls and to columns on the top level
pub const DEFAULT_STOREY_HEIGHT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub i64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure raised by the host while changing the model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("Element {0} does not exist")]
    MissingElement(ElementId),

    #[error("Element {0} cannot host rebar")]
    InvalidHost(ElementId),

    #[error("Curve must be in the plane of the sketch plane")]
    CurveNotInPlane,

    #[error("Rebar must be created from at least one curve")]
    NoCurves,

    #[error("Invalid rebar layout: {0}")]
    InvalidLayout(String),

    #[error("Element type {0} is not a family symbol")]
    NotASymbol(ElementId),

    #[error("Invalid document seed: {0}")]
    InvalidSeed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Walls,
    StructuralColumns,
    StructuralFraming,
    Doors,
    Windows,
    Lines,
    Rebar,
    SketchPlanes,
}

impl Category {
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Walls => "Walls",
            Category::StructuralColumns => "Structural Columns",
            Category::StructuralFraming => "Structural Framing",
            Category::Doors => "Doors",
            Category::Windows => "Windows",
            Category::Lines => "Lines",
            Category::Rebar => "Structural Rebar",
            Category::SketchPlanes => "Sketch Planes",
        }
    }

    /// System families (walls) have types but no loadable family
    pub fn is_loadable(&self) -> bool {
        !matches!(self, Category::Walls | Category::Lines | Category::SketchPlanes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralMaterial {
    Concrete,
    Steel,
    Wood,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: ElementId,
    pub name: String,
    pub elevation: f64,
}

/// An element type; a family symbol when `family_id` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementType {
    pub id: ElementId,
    pub category: Category,
    pub family_id: Option<ElementId>,
    pub family_name: String,
    pub name: String,
    pub is_active: bool,
    pub material: Option<StructuralMaterial>,
    pub width: Option<f64>,
    pub depth: Option<f64>,
}

impl ElementType {
    pub fn is_symbol(&self) -> bool {
        self.family_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: ElementId,
    pub name: String,
    pub category: Category,
    pub symbol_ids: Vec<ElementId>,
}

/// Named entry of the reinforcement catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ElementId,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RebarCatalog {
    pub bar_types: Vec<CatalogEntry>,
    pub shapes: Vec<CatalogEntry>,
    pub hook_types: Vec<CatalogEntry>,
    pub cover_types: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    FloorPlan,
    CeilingPlan,
    Section,
    Elevation,
    Detail,
    Drafting,
    ThreeD,
    DrawingSheet,
    Schedule,
    Legend,
    ProjectBrowser,
    Internal,
}

impl ViewKind {
    /// Host-facing view type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ViewKind::FloorPlan => "FloorPlan",
            ViewKind::CeilingPlan => "CeilingPlan",
            ViewKind::Section => "Section",
            ViewKind::Elevation => "Elevation",
            ViewKind::Detail => "Detail",
            ViewKind::Drafting => "DraftingView",
            ViewKind::ThreeD => "ThreeD",
            ViewKind::DrawingSheet => "DrawingSheet",
            ViewKind::Schedule => "Schedule",
            ViewKind::Legend => "Legend",
            ViewKind::ProjectBrowser => "ProjectBrowser",
            ViewKind::Internal => "Internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub id: ElementId,
    pub name: String,
    pub kind: ViewKind,
    pub is_template: bool,
    pub is_perspective: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub id: ElementId,
    pub type_id: ElementId,
    pub level_id: ElementId,
    pub line: Line,
    pub height: f64,
}

/// A placed family symbol: column, door, window, beam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyInstance {
    pub id: ElementId,
    pub symbol_id: ElementId,
    pub category: Category,
    pub level_id: ElementId,
    pub material: Option<StructuralMaterial>,
    pub transform: Transform,
    /// In instance coordinates; `None` when the symbol has no dimensions
    pub local_bounds: Option<BoundingBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailCurve {
    pub id: ElementId,
    pub view_id: ElementId,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchPlane {
    pub id: ElementId,
    pub plane: Plane,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCurve {
    pub id: ElementId,
    pub sketch_plane_id: ElementId,
    pub line: Line,
}

/// Set layout of a shape-driven rebar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RebarLayout {
    pub max_spacing: f64,
    pub array_length: f64,
    pub count: u32,
}

impl RebarLayout {
    /// Fit as many bars as `max_spacing` allows over `array_length`,
    /// including both ends
    pub fn maximum_spacing(max_spacing: f64, array_length: f64) -> Result<Self, ModelError> {
        if max_spacing.is_nan() || max_spacing <= 0.0 {
            return Err(ModelError::InvalidLayout(format!(
                "spacing must be positive, got {}",
                max_spacing
            )));
        }
        if array_length.is_nan() || array_length <= 0.0 {
            return Err(ModelError::InvalidLayout(format!(
                "array length must be positive, got {:.4}",
                array_length
            )));
        }
        let intervals = (array_length / max_spacing).floor();
        if !intervals.is_finite() || intervals >= f64::from(u32::MAX) {
            return Err(ModelError::InvalidLayout(format!(
                "spacing {} is too small for an array of {:.4}",
                max_spacing, array_length
            )));
        }
        let count = intervals as u32 + 1;
        Ok(Self {
            max_spacing,
            array_length,
            count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rebar {
    pub id: ElementId,
    pub host_id: ElementId,
    pub bar_type_id: ElementId,
    pub shape_id: Option<ElementId>,
    pub normal: Xyz,
    pub curves: Vec<Line>,
    pub layout: Option<RebarLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Wall(Wall),
    FamilyInstance(FamilyInstance),
    DetailCurve(DetailCurve),
    SketchPlane(SketchPlane),
    ModelCurve(ModelCurve),
    Rebar(Rebar),
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Element::Wall(e) => e.id,
            Element::FamilyInstance(e) => e.id,
            Element::DetailCurve(e) => e.id,
            Element::SketchPlane(e) => e.id,
            Element::ModelCurve(e) => e.id,
            Element::Rebar(e) => e.id,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Element::Wall(_) => Category::Walls,
            Element::FamilyInstance(e) => e.category,
            Element::DetailCurve(_) | Element::ModelCurve(_) => Category::Lines,
            Element::SketchPlane(_) => Category::SketchPlanes,
            Element::Rebar(_) => Category::Rebar,
        }
    }
}

/// Name used for lookups: surrounding whitespace is not significant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameKey<'a>(&'a str);

impl<'a> NameKey<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self(raw.trim())
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0 == name.trim()
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }
}

/// Every observable property of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStore {
    next_id: i64,
    pub(crate) levels: Vec<Level>,
    pub(crate) types: Vec<ElementType>,
    pub(crate) families: Vec<Family>,
    pub(crate) rebar: RebarCatalog,
    pub(crate) views: Vec<View>,
    pub(crate) active_view: Option<ElementId>,
    pub(crate) elements: BTreeMap<ElementId, Element>,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self {
            next_id: 1,
            levels: Vec::new(),
            types: Vec::new(),
            families: Vec::new(),
            rebar: RebarCatalog::default(),
            views: Vec::new(),
            active_view: None,
            elements: BTreeMap::new(),
        }
    }
}

impl ModelStore {
    // === Reads ===

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn types(&self) -> &[ElementType] {
        &self.types
    }

    pub fn types_of(&self, category: Category) -> impl Iterator<Item = &ElementType> {
        self.types.iter().filter(move |t| t.category == category)
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    pub fn rebar_catalog(&self) -> &RebarCatalog {
        &self.rebar
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn active_view(&self) -> Option<&View> {
        let id = self.active_view?;
        self.views.iter().find(|v| v.id == id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.elements.values().filter_map(|e| match e {
            Element::Wall(w) => Some(w),
            _ => None,
        })
    }

    pub fn family_instance(&self, id: ElementId) -> Option<&FamilyInstance> {
        match self.elements.get(&id) {
            Some(Element::FamilyInstance(fi)) => Some(fi),
            _ => None,
        }
    }

    pub fn element_type(&self, id: ElementId) -> Option<&ElementType> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn family(&self, id: ElementId) -> Option<&Family> {
        self.families.iter().find(|f| f.id == id)
    }

    pub fn find_level_by_name(&self, name: &str) -> Option<&Level> {
        let key = NameKey::new(name);
        self.levels.iter().find(|l| key.matches(&l.name))
    }

    /// Type of `category` whose family name or type name matches
    pub fn find_type_by_name(&self, category: Category, name: &str) -> Option<&ElementType> {
        let key = NameKey::new(name);
        self.types_of(category)
            .find(|t| key.matches(&t.family_name) || key.matches(&t.name))
    }

    pub fn find_rebar_bar_type(&self, name: &str) -> Option<&CatalogEntry> {
        let key = NameKey::new(name);
        self.rebar.bar_types.iter().find(|b| key.matches(&b.name))
    }

    pub fn find_rebar_shape(&self, name: &str) -> Option<&CatalogEntry> {
        let key = NameKey::new(name);
        self.rebar.shapes.iter().find(|s| key.matches(&s.name))
    }

    /// Level directly above `level`, by elevation
    pub fn level_above(&self, level: &Level) -> Option<&Level> {
        self.levels
            .iter()
            .filter(|l| l.elevation > level.elevation)
            .min_by(|a, b| a.elevation.total_cmp(&b.elevation))
    }

    /// Bounding box of an instance in model coordinates
    pub fn world_bounds(&self, instance: &FamilyInstance) -> Option<BoundingBox> {
        let local = instance.local_bounds?;
        Some(BoundingBox::new(
            instance.transform.of_point(local.min),
            instance.transform.of_point(local.max),
        ))
    }

    // === Writes (reachable only through an open transaction) ===

    pub(crate) fn allocate_id(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, element: Element) -> ElementId {
        let id = element.id();
        self.elements.insert(id, element);
        id
    }

    pub(crate) fn create_wall(
        &mut self,
        line: Line,
        level_id: ElementId,
        type_id: ElementId,
    ) -> Result<ElementId, ModelError> {
        if self.element_type(type_id).is_none() {
            return Err(ModelError::MissingElement(type_id));
        }
        if !self.levels.iter().any(|l| l.id == level_id) {
            return Err(ModelError::MissingElement(level_id));
        }
        let id = self.allocate_id();
        Ok(self.insert(Element::Wall(Wall {
            id,
            type_id,
            level_id,
            line,
            height: DEFAULT_STOREY_HEIGHT,
        })))
    }

    pub(crate) fn activate_symbol(&mut self, symbol_id: ElementId) -> Result<(), ModelError> {
        let symbol = self
            .types
            .iter_mut()
            .find(|t| t.id == symbol_id)
            .ok_or(ModelError::MissingElement(symbol_id))?;
        if !symbol.is_symbol() {
            return Err(ModelError::NotASymbol(symbol_id));
        }
        symbol.is_active = true;
        Ok(())
    }

    /// Place a symbol at `location`, measured from the level's elevation
    pub(crate) fn new_family_instance(
        &mut self,
        location: Xyz,
        symbol_id: ElementId,
        level_id: ElementId,
    ) -> Result<ElementId, ModelError> {
        let symbol = self
            .element_type(symbol_id)
            .ok_or(ModelError::MissingElement(symbol_id))?
            .clone();
        if !symbol.is_symbol() {
            return Err(ModelError::NotASymbol(symbol_id));
        }
        let level = self
            .levels
            .iter()
            .find(|l| l.id == level_id)
            .ok_or(ModelError::MissingElement(level_id))?
            .clone();

        let height = self
            .level_above(&level)
            .map(|above| above.elevation - level.elevation)
            .unwrap_or(DEFAULT_STOREY_HEIGHT);

        let local_bounds = match (symbol.width, symbol.depth) {
            (Some(w), Some(d)) => Some(BoundingBox::new(
                Xyz::new(-w / 2.0, -d / 2.0, 0.0),
                Xyz::new(w / 2.0, d / 2.0, height),
            )),
            _ => None,
        };

        let origin = Xyz::new(location.x, location.y, level.elevation + location.z);
        let id = self.allocate_id();
        Ok(self.insert(Element::FamilyInstance(FamilyInstance {
            id,
            symbol_id,
            category: symbol.category,
            level_id,
            material: symbol.material,
            transform: Transform::translation(origin),
            local_bounds,
        })))
    }

    pub(crate) fn new_detail_curve(
        &mut self,
        view_id: ElementId,
        line: Line,
    ) -> Result<ElementId, ModelError> {
        if !self.views.iter().any(|v| v.id == view_id) {
            return Err(ModelError::MissingElement(view_id));
        }
        let id = self.allocate_id();
        Ok(self.insert(Element::DetailCurve(DetailCurve { id, view_id, line })))
    }

    pub(crate) fn new_sketch_plane(&mut self, plane: Plane) -> ElementId {
        let id = self.allocate_id();
        self.insert(Element::SketchPlane(SketchPlane { id, plane }))
    }

    pub(crate) fn new_model_curve(
        &mut self,
        line: Line,
        sketch_plane_id: ElementId,
    ) -> Result<ElementId, ModelError> {
        let plane = match self.elements.get(&sketch_plane_id) {
            Some(Element::SketchPlane(sp)) => sp.plane,
            _ => return Err(ModelError::MissingElement(sketch_plane_id)),
        };
        if !plane.contains_line(&line) {
            return Err(ModelError::CurveNotInPlane);
        }
        let id = self.allocate_id();
        Ok(self.insert(Element::ModelCurve(ModelCurve {
            id,
            sketch_plane_id,
            line,
        })))
    }

    pub(crate) fn new_rebar(
        &mut self,
        host_id: ElementId,
        bar_type_id: ElementId,
        shape_id: Option<ElementId>,
        normal: Xyz,
        curves: Vec<Line>,
    ) -> Result<ElementId, ModelError> {
        if self.family_instance(host_id).is_none() {
            return Err(ModelError::InvalidHost(host_id));
        }
        if !self.rebar.bar_types.iter().any(|b| b.id == bar_type_id) {
            return Err(ModelError::MissingElement(bar_type_id));
        }
        if let Some(shape) = shape_id {
            if !self.rebar.shapes.iter().any(|s| s.id == shape) {
                return Err(ModelError::MissingElement(shape));
            }
        }
        if curves.is_empty() {
            return Err(ModelError::NoCurves);
        }
        let id = self.allocate_id();
        Ok(self.insert(Element::Rebar(Rebar {
            id,
            host_id,
            bar_type_id,
            shape_id,
            normal,
            curves,
            layout: None,
        })))
    }

    pub(crate) fn set_rebar_layout(
        &mut self,
        rebar_id: ElementId,
        layout: RebarLayout,
    ) -> Result<(), ModelError> {
        match self.elements.get_mut(&rebar_id) {
            Some(Element::Rebar(rebar)) => {
                rebar.layout = Some(layout);
                Ok(())
            }
            _ => Err(ModelError::MissingElement(rebar_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_key_trims() {
        let key = NameKey::new("  Level 1 ");
        assert!(key.matches("Level 1"));
        assert!(key.matches("Level 1  "));
        assert!(!key.matches("level 1"));
        assert_eq!(key.as_str(), "Level 1");
    }

    #[test]
    fn test_rebar_layout_count() {
        let layout = RebarLayout::maximum_spacing(0.2, 1.0).unwrap();
        assert_eq!(layout.count, 6);
    }

    #[test]
    fn test_rebar_layout_rejects_non_positive() {
        assert!(RebarLayout::maximum_spacing(0.0, 1.0).is_err());
        assert!(RebarLayout::maximum_spacing(0.2, -0.5).is_err());
        assert!(RebarLayout::maximum_spacing(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_rebar_layout_rejects_unbounded_count() {
        let err = RebarLayout::maximum_spacing(1e-12, 9.8).unwrap_err();
        assert!(matches!(err, ModelError::InvalidLayout(_)));
        assert!(RebarLayout::maximum_spacing(0.2, f64::INFINITY).is_err());

        // the largest count that still fits
        let layout = RebarLayout::maximum_spacing(1.0, f64::from(u32::MAX - 1)).unwrap();
        assert_eq!(layout.count, u32::MAX);
    }

    #[test]
    fn test_category_loadable() {
        assert!(!Category::Walls.is_loadable());
        assert!(Category::StructuralColumns.is_loadable());
    }

    #[test]
    fn test_view_type_names() {
        assert_eq!(ViewKind::ThreeD.type_name(), "ThreeD");
        assert_eq!(ViewKind::FloorPlan.type_name(), "FloorPlan");
    }
}
