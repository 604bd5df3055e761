//! Interactive template acquisition.
//!
//! Regions are captured one field at a time, in [`Field::ALL`] order, from two
//! clicks (top-left, then bottom-right) or a manual coordinate entry. Every
//! input is an [`AcquisitionEvent`]; [`TemplateAcquisition::apply`] holds the
//! whole transition table.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{Point, Region, Template};
use crate::error::TemplateError;
use crate::models::notice::Field;

/// Which corner the next click supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickStep {
    #[default]
    AwaitingTopLeft,
    AwaitingBottomRight { top_left: Point },
}

impl ClickStep {
    fn index(&self) -> u8 {
        match self {
            ClickStep::AwaitingTopLeft => 0,
            ClickStep::AwaitingBottomRight { .. } => 1,
        }
    }
}

/// Identity of a click, used to drop repeated deliveries of the same event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickSignature {
    pub point: Point,
    pub field_index: usize,
    pub step: u8,
}

/// Operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionEvent {
    /// A click, already mapped to original image pixels.
    Click(Point),
    /// Explicit coordinates for the current field. Not reordered.
    Manual { x1: u32, y1: u32, x2: u32, y2: u32 },
    /// Leave the current field without a region.
    Skip,
    /// Drop a pending top-left corner, keeping captured regions.
    SoftReset,
    /// Start over from the first field.
    Reset,
}

/// What an accepted event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// First corner stored; waiting for the second.
    TopLeftStored { field: Field, point: Point },
    /// Region recorded and cursor advanced.
    Committed { field: Field, region: Region },
    /// Field skipped and cursor advanced.
    Skipped(Field),
    /// Pending corner dropped.
    SelectionCleared,
    /// Everything cleared.
    ResetAll,
    /// Same click delivered twice; ignored.
    Duplicate,
}

/// Acquisition session state.
#[derive(Debug, Clone, Default)]
pub struct TemplateAcquisition {
    image_size: Option<(u32, u32)>,
    field_index: usize,
    step: ClickStep,
    regions: BTreeMap<Field, Region>,
    last_click: Option<ClickSignature>,
}

impl TemplateAcquisition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject clicks outside a `width` x `height` image.
    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_size = Some((width, height));
        self
    }

    /// Field the next region belongs to; `None` once complete.
    pub fn current_field(&self) -> Option<Field> {
        Field::ALL.get(self.field_index).copied()
    }

    pub fn field_index(&self) -> usize {
        self.field_index
    }

    pub fn step(&self) -> ClickStep {
        self.step
    }

    pub fn regions(&self) -> &BTreeMap<Field, Region> {
        &self.regions
    }

    pub fn is_complete(&self) -> bool {
        self.field_index >= Field::ALL.len()
    }

    pub fn apply(&mut self, event: AcquisitionEvent) -> Result<Transition, TemplateError> {
        match (self.step, event) {
            (_, AcquisitionEvent::Reset) => Ok(self.reset()),
            (_, AcquisitionEvent::SoftReset) => Ok(self.soft_reset()),
            _ if self.is_complete() => Err(TemplateError::AlreadyComplete),
            (step, AcquisitionEvent::Click(point)) => {
                let signature = ClickSignature {
                    point,
                    field_index: self.field_index,
                    step: step.index(),
                };
                if self.last_click == Some(signature) {
                    debug!("Ignoring duplicate click at {}", point);
                    return Ok(Transition::Duplicate);
                }
                self.last_click = Some(signature);
                self.check_bounds(point)?;

                match step {
                    ClickStep::AwaitingTopLeft => {
                        self.step = ClickStep::AwaitingBottomRight { top_left: point };
                        Ok(Transition::TopLeftStored {
                            field: Field::ALL[self.field_index],
                            point,
                        })
                    }
                    ClickStep::AwaitingBottomRight { top_left } => {
                        let region = Region::from_corners(top_left, point)?;
                        Ok(self.commit(region))
                    }
                }
            }
            (_, AcquisitionEvent::Manual { x1, y1, x2, y2 }) => {
                let region = Region::new(x1, y1, x2, y2)?;
                Ok(self.commit(region))
            }
            (_, AcquisitionEvent::Skip) => {
                let field = Field::ALL[self.field_index];
                self.advance();
                info!("Skipped {}", field);
                Ok(Transition::Skipped(field))
            }
        }
    }

    pub fn click(&mut self, point: Point) -> Result<Transition, TemplateError> {
        self.apply(AcquisitionEvent::Click(point))
    }

    pub fn manual(&mut self, x1: u32, y1: u32, x2: u32, y2: u32) -> Result<Transition, TemplateError> {
        self.apply(AcquisitionEvent::Manual { x1, y1, x2, y2 })
    }

    pub fn skip(&mut self) -> Result<Transition, TemplateError> {
        self.apply(AcquisitionEvent::Skip)
    }

    pub fn soft_reset(&mut self) -> Transition {
        self.step = ClickStep::AwaitingTopLeft;
        Transition::SelectionCleared
    }

    /// Clear every region and the duplicate-click guard.
    pub fn reset(&mut self) -> Transition {
        *self = Self {
            image_size: self.image_size,
            ..Self::default()
        };
        debug!("Acquisition reset");
        Transition::ResetAll
    }

    /// Build the template once every field has been captured or skipped.
    pub fn finalize(&self, layout_name: &str) -> Result<Template, TemplateError> {
        if !self.is_complete() {
            return Err(TemplateError::Incomplete {
                processed: self.field_index,
                total: Field::ALL.len(),
            });
        }

        Ok(Template::new(
            layout_name,
            self.image_size.unwrap_or((0, 0)),
            self.regions.clone(),
        ))
    }

    fn check_bounds(&self, point: Point) -> Result<(), TemplateError> {
        match self.image_size {
            Some((width, height)) if point.x >= width || point.y >= height => {
                Err(TemplateError::OutOfBounds {
                    x: point.x,
                    y: point.y,
                    width,
                    height,
                })
            }
            _ => Ok(()),
        }
    }

    fn commit(&mut self, region: Region) -> Transition {
        let field = Field::ALL[self.field_index];
        self.regions.insert(field, region);
        self.advance();
        info!("Captured {} at {}", field, region);
        Transition::Committed { field, region }
    }

    fn advance(&mut self) {
        self.field_index += 1;
        self.step = ClickStep::AwaitingTopLeft;
        if self.is_complete() {
            info!("All {} fields processed", Field::ALL.len());
        }
    }
}
