//! Native OCR provider backed by `pure-onnx-ocr`.
//!
//! The engine's inference sessions are neither `Send` nor `Sync`, so the
//! engine is built and owned by a single worker thread. Callers on any thread
//! hand it encoded images over a channel and wait for the reply.

use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use image::GenericImageView;
use pure_onnx_ocr::engine::{OcrEngine, OcrEngineBuilder};
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::OcrProvider;

/// Rows closer than this many pixels are read left to right as one line.
const ROW_HEIGHT: f32 = 20.0;

/// One recognition request for the worker thread.
struct Request {
    image: Vec<u8>,
    reply: mpsc::Sender<Result<String, OcrError>>,
}

/// OCR provider backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
///
/// Requests from concurrent callers are served one at a time, in arrival order.
pub struct PureOcrProvider {
    requests: mpsc::Sender<Request>,
}

impl PureOcrProvider {
    /// Load the detection and recognition models named in `config` on a new
    /// worker thread.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let config = config.clone();
        let (requests, inbox) = mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), OcrError>>();

        thread::Builder::new()
            .name("pure-onnx-ocr".to_string())
            .spawn(move || {
                let engine = match load_engine(&config) {
                    Ok(engine) => {
                        let _ = ready_tx.send(Ok(()));
                        engine
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // Ends once every provider handle is dropped.
                while let Ok(request) = inbox.recv() {
                    let result = recognize(&engine, config.keep_unk, &request.image);
                    if request.reply.send(result).is_err() {
                        warn!("OCR caller went away before its result was ready");
                    }
                }

                debug!("OCR worker stopped");
            })
            .map_err(|e| OcrError::ModelLoad(format!("failed to start OCR worker: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| OcrError::ModelLoad("OCR worker exited while loading models".to_string()))??;

        Ok(Self { requests })
    }
}

impl OcrProvider for PureOcrProvider {
    fn text_detect(&self, image: &[u8]) -> Result<String, OcrError> {
        let (reply, result) = mpsc::channel();

        self.requests
            .send(Request {
                image: image.to_vec(),
                reply,
            })
            .map_err(|_| OcrError::Provider("OCR worker is not running".to_string()))?;

        result
            .recv()
            .map_err(|_| OcrError::Provider("OCR worker stopped before replying".to_string()))?
    }

    fn name(&self) -> &str {
        "pure-onnx-ocr"
    }
}

fn load_engine(config: &OcrConfig) -> Result<OcrEngine, OcrError> {
    let engine = OcrEngineBuilder::new()
        .det_model_path(&config.detection_path())
        .rec_model_path(&config.recognition_path())
        .dictionary_path(&config.dictionary_path())
        .build()
        .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

    info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());
    Ok(engine)
}

/// Run detection and recognition on one encoded image, joining the text
/// regions in reading order.
fn recognize(engine: &OcrEngine, keep_unk: bool, image: &[u8]) -> Result<String, OcrError> {
    let start = Instant::now();
    let image = image::load_from_memory(image).map_err(|e| OcrError::InvalidImage(e.to_string()))?;
    let (width, height) = image.dimensions();

    let results = engine
        .run_from_image(&image)
        .map_err(|e| OcrError::Provider(format!("pure-onnx-ocr: {}", e)))?;

    debug!(
        "pure-onnx-ocr returned {} text regions for {}x{} image",
        results.len(),
        width,
        height
    );

    let mut boxes: Vec<((f32, f32), String)> = results
        .iter()
        .map(|r| {
            let text = if keep_unk {
                r.text.clone()
            } else {
                r.text.replace("[UNK]", " ")
            };
            (top_left(&r.bounding_box), text)
        })
        .collect();

    // Reading order: rows top to bottom, then left to right.
    boxes.sort_by(|((ax, ay), _), ((bx, by), _)| {
        let row_a = (ay / ROW_HEIGHT) as i32;
        let row_b = (by / ROW_HEIGHT) as i32;
        if row_a != row_b {
            row_a.cmp(&row_b)
        } else {
            ax.partial_cmp(bx).unwrap_or(std::cmp::Ordering::Equal)
        }
    });

    let text = boxes
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("\n");

    debug!("OCR complete in {}ms", start.elapsed().as_millis());

    Ok(text.trim().to_string())
}

/// Smallest x and y of a detection polygon.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32) {
    polygon
        .exterior()
        .coords()
        .fold((f32::INFINITY, f32::INFINITY), |(x, y), c| {
            (x.min(c.x as f32), y.min(c.y as f32))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_provider<P: OcrProvider + 'static>() {}

    #[test]
    fn test_provider_can_be_shared_across_threads() {
        assert_provider::<PureOcrProvider>();
    }
}
