//! Fixed-layout templates: regions, persistence and acquisition.

mod acquisition;

pub use acquisition::{AcquisitionEvent, ClickSignature, ClickStep, TemplateAcquisition, Transition};

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{NoticeError, TemplateError};
use crate::models::notice::Field;

/// A pixel position on the template image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Map a click on a scaled preview back to original image pixels.
    ///
    /// `scale` is `display_width / original_width`.
    pub fn from_display(x: u32, y: u32, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self {
            x: (f64::from(x) / scale).round() as u32,
            y: (f64::from(y) / scale).round() as u32,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangle with `x1 < x2` and `y1 < y2`.
///
/// Persisted as `[x1, y1, x2, y2]`; the invariant is checked on load too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u32; 4]", into = "[u32; 4]")]
pub struct Region {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
}

impl Region {
    /// Create a region from explicit coordinates without reordering them.
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Result<Self, TemplateError> {
        if x1 < x2 && y1 < y2 {
            Ok(Self { x1, y1, x2, y2 })
        } else {
            Err(TemplateError::DegenerateRegion { x1, y1, x2, y2 })
        }
    }

    /// Create a region spanned by two opposite corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Result<Self, TemplateError> {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    pub fn x1(&self) -> u32 {
        self.x1
    }

    pub fn y1(&self) -> u32 {
        self.y1
    }

    pub fn x2(&self) -> u32 {
        self.x2
    }

    pub fn y2(&self) -> u32 {
        self.y2
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn to_array(&self) -> [u32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

impl TryFrom<[u32; 4]> for Region {
    type Error = TemplateError;

    fn try_from([x1, y1, x2, y2]: [u32; 4]) -> Result<Self, Self::Error> {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<Region> for [u32; 4] {
    fn from(region: Region) -> Self {
        region.to_array()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Field regions for one notice layout.
///
/// Fields skipped during acquisition are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Layout this template was captured for.
    pub layout_name: String,

    /// When acquisition finished.
    pub created_at: DateTime<Local>,

    /// Size (width, height) of the image the regions were captured on.
    pub image_size: (u32, u32),

    fields: BTreeMap<Field, Region>,
}

impl Template {
    pub fn new(
        layout_name: impl Into<String>,
        image_size: (u32, u32),
        fields: BTreeMap<Field, Region>,
    ) -> Self {
        Self {
            layout_name: layout_name.into(),
            created_at: Local::now(),
            image_size,
            fields,
        }
    }

    /// Region captured for `field`, if any.
    pub fn region(&self, field: Field) -> Option<&Region> {
        self.fields.get(&field)
    }

    /// Captured regions in field order.
    pub fn regions(&self) -> impl Iterator<Item = (Field, &Region)> {
        self.fields.iter().map(|(f, r)| (*f, r))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// JSON file store for a single template.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
}

impl TemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the stored template; `Ok(None)` when nothing has been saved.
    pub fn load(&self) -> Result<Option<Template>, NoticeError> {
        if !self.path.exists() {
            debug!("No template at {}", self.path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let template: Template = serde_json::from_str(&content)
            .map_err(|e| TemplateError::Parse(e.to_string()))?;

        info!(
            "Loaded template '{}' with {} regions from {}",
            template.layout_name,
            template.len(),
            self.path.display()
        );

        Ok(Some(template))
    }

    /// Persist a finalized template, replacing any previous one.
    pub fn save(&self, template: &Template) -> Result<(), NoticeError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(template)?;
        std::fs::write(&self.path, content)?;

        info!("Saved template '{}' to {}", template.layout_name, self.path.display());
        Ok(())
    }

    /// Delete the stored template. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool, NoticeError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
