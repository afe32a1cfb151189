//! ONNX-backed trained model handles

use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

/// A pretrained classifier backed by an ONNX Runtime session.
///
/// Running a session needs exclusive access, so it sits behind an RwLock;
/// the handle itself is shared read-only for the process lifetime once the
/// registry is built.
pub struct TrainedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    session: RwLock<Session>,
    /// Input tensor name
    input_name: String,
    /// Output carrying class probabilities
    output_name: String,
    /// Whether the graph exposes a probability output at all
    has_probability: bool,
}

impl TrainedModel {
    /// Whether the session can produce class probabilities directly.
    pub fn has_probability_output(&self) -> bool {
        self.has_probability
    }

    /// Positive-class probability for one feature vector.
    pub fn predict_proba(&self, features: &[f32]) -> Result<f64> {
        use ort::value::Tensor;

        if !self.has_probability {
            anyhow::bail!("Model {} exposes no probability output", self.name);
        }

        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features.to_vec())).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .write()
            .map_err(|e| anyhow::anyhow!("Session lock error: {}", e))?;
        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        extract_probability(&outputs, &self.output_name, &self.name)
    }

    /// Binary class decision from the session's label output.
    pub fn predict(&self, features: &[f32]) -> Result<i32> {
        use ort::value::Tensor;

        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features.to_vec())).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .write()
            .map_err(|e| anyhow::anyhow!("Session lock error: {}", e))?;
        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        extract_class_label(&outputs, &self.name)
    }
}

/// Loader for ONNX model artifacts
pub struct ModelLoader;

impl ModelLoader {
    /// Initialize the ONNX runtime and create a loader.
    pub fn new() -> Result<Self> {
        ort::init().commit()?;
        Ok(Self)
    }

    /// Load a single ONNX model from file.
    pub fn load_model<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<TrainedModel> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(1)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // Graphs without a probability output fall back to the binary
        // decision interface at inference time.
        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone());
        let has_probability = probability_output.is_some();

        let output_name = probability_output.unwrap_or_else(|| {
            session
                .outputs
                .last()
                .map(|o| o.name.clone())
                .unwrap_or_else(|| "probabilities".to_string())
        });

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            has_probability,
            "Model loaded successfully"
        );

        Ok(TrainedModel {
            name: name.to_string(),
            session: RwLock::new(session),
            input_name,
            output_name,
            has_probability,
        })
    }
}

/// Extract the positive-class probability from session outputs.
/// Handles both tensor outputs and the seq(map) form produced by
/// zipmap-style classifier exports.
fn extract_probability(
    outputs: &ort::session::SessionOutputs,
    output_name: &str,
    model_name: &str,
) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            return Ok(positive_class_from_tensor(&shape, data));
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            if let Ok(prob) = positive_class_from_sequence(output, model_name) {
                return Ok(prob);
            }
        }
    }

    // Some exports name their outputs differently; scan everything but labels.
    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            debug!(model = %model_name, output = %name, "Extracted probability from fallback output");
            return Ok(positive_class_from_tensor(&shape, data));
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            if let Ok(prob) = positive_class_from_sequence(&output, model_name) {
                return Ok(prob);
            }
        }
    }

    anyhow::bail!("Model {} produced no probability output", model_name)
}

/// Extract the positive-class probability from tensor data.
fn positive_class_from_tensor(shape: &ort::tensor::Shape, data: &[f32]) -> f64 {
    let dims: Vec<i64> = shape.iter().copied().collect();

    if dims.len() == 2 {
        let num_classes = dims[1] as usize;
        if num_classes >= 2 {
            // [batch, num_classes] - positive class is index 1
            return data[1] as f64;
        } else if num_classes == 1 {
            // [batch, 1] - single probability
            return data[0] as f64;
        }
    } else if dims.len() == 1 {
        let num_classes = dims[0] as usize;
        if num_classes >= 2 {
            return data[1] as f64;
        } else if num_classes == 1 {
            return data[0] as f64;
        }
    }

    data.last().map(|&v| v as f64).unwrap_or(0.5)
}

/// Extract the positive-class probability from seq(map(int64, float)).
fn positive_class_from_sequence(output: &ort::value::DynValue, model_name: &str) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    if maps.is_empty() {
        anyhow::bail!("Empty sequence output");
    }

    // Batch size is 1; the first map carries the class probabilities.
    let map_value = &maps[0];
    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    for (class_id, prob) in &kv_pairs {
        if *class_id == 1 {
            debug!(model = %model_name, prob = *prob, "Extracted probability from seq(map) output");
            return Ok(*prob as f64);
        }
    }

    // No positive class entry; invert the negative class if present.
    for (class_id, prob) in &kv_pairs {
        if *class_id == 0 {
            return Ok(1.0 - *prob as f64);
        }
    }

    anyhow::bail!("No class probability in map output")
}

/// Extract a 0/1 class decision from the session's label output.
fn extract_class_label(outputs: &ort::session::SessionOutputs, model_name: &str) -> Result<i32> {
    for (name, output) in outputs.iter() {
        if !name.contains("label") {
            continue;
        }

        if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            return Ok(data.first().copied().unwrap_or(0) as i32);
        }

        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            return Ok(data.first().map(|&v| v.round() as i32).unwrap_or(0));
        }
    }

    // No dedicated label output; take the first extractable tensor.
    for (_, output) in outputs.iter() {
        if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            return Ok(data.first().copied().unwrap_or(0) as i32);
        }

        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            return Ok(data.first().map(|&v| v.round() as i32).unwrap_or(0));
        }
    }

    anyhow::bail!("Model {} produced no class label output", model_name)
}
