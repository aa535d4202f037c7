//! JSON result writer for training, evaluation and prediction outputs.

use std::fs;
use std::path::{Path, PathBuf};

use beasiswa_tree::{
    Attribute, CalculationStep, ConfusionMatrix, DecisionTree, Evaluation, Label, PathStep,
    Prediction, TrainedModel, explain,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::{ApplicantId, ExperimentName};
use crate::IoError;

/// Writes training, evaluation and prediction results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_tree.json`,
/// `{experiment}_evaluate.json` and `{experiment}_predict.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    fn artifact_path(&self, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()))
    }

    fn write_json<T: Serialize>(path: &Path, artifact: &T) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write a trained model to `{experiment}_tree.json`.
    ///
    /// The artifact carries the node arena, the flattened IF-THEN rules and
    /// every calculation step, for visualisation.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | The artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_tree(&self, model: &TrainedModel) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("tree");
        let tree = &model.tree;

        let artifact = TreeArtifact {
            experiment: self.experiment.as_str(),
            n_samples: model.n_samples,
            n_nodes: tree.n_nodes(),
            n_leaves: tree.n_leaves(),
            depth: tree.depth(),
            attributes: &model.attributes,
            rules: tree.rules().iter().map(ToString::to_string).collect(),
            tree,
            steps: &model.steps,
        };

        Self::write_json(&path, &artifact)?;
        info!(path = %path.display(), "tree written");
        Ok(path)
    }

    /// Write an evaluation batch to `{experiment}_evaluate.json`.
    ///
    /// Metrics are written on the 0–100 scale next to their fractions.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | The artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_evaluation(&self, evaluation: &Evaluation) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("evaluate");

        let predictions: Vec<EvaluatedEntry> = evaluation
            .predictions
            .iter()
            .enumerate()
            .map(|(index, p)| EvaluatedEntry {
                index,
                actual: p.actual,
                decision: p.prediction.decision,
                correct: p.is_correct(),
                fallback: p.prediction.fallback,
                explanation: explain(&p.prediction.path),
            })
            .collect();

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            n_samples: evaluation.n_samples(),
            accuracy: evaluation.accuracy,
            precision: evaluation.precision,
            recall: evaluation.recall,
            f1: evaluation.f1,
            accuracy_percent: evaluation.accuracy_percent(),
            precision_percent: evaluation.precision_percent(),
            recall_percent: evaluation.recall_percent(),
            f1_percent: evaluation.f1_percent(),
            confusion_matrix: &evaluation.confusion_matrix,
            predictions,
        };

        Self::write_json(&path, &artifact)?;
        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }

    /// Write predictions to `{experiment}_predict.json`.
    ///
    /// `ids[i]` is paired with `predictions[i]`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | The artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_predictions(
        &self,
        ids: &[ApplicantId],
        predictions: &[Prediction],
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("predict");

        let entries: Vec<PredictionEntry> = ids
            .iter()
            .zip(predictions)
            .map(|(id, p)| PredictionEntry {
                id: id.as_str(),
                decision: p.decision,
                explanation: explain(&p.path),
                fallback: p.fallback,
                path: &p.path,
            })
            .collect();
        let n_accept = entries
            .iter()
            .filter(|e| e.decision == Label::Accept)
            .count();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_applicants: entries.len(),
            n_accept,
            predictions: entries,
        };

        Self::write_json(&path, &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(path)
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct TreeArtifact<'a> {
    experiment: &'a str,
    n_samples: usize,
    n_nodes: usize,
    n_leaves: usize,
    depth: usize,
    attributes: &'a [Attribute],
    rules: Vec<String>,
    tree: &'a DecisionTree,
    steps: &'a [CalculationStep],
}

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    n_samples: usize,
    accuracy: f64,
    precision: f64,
    recall: f64,
    f1: f64,
    accuracy_percent: f64,
    precision_percent: f64,
    recall_percent: f64,
    f1_percent: f64,
    confusion_matrix: &'a ConfusionMatrix,
    predictions: Vec<EvaluatedEntry>,
}

#[derive(Serialize)]
struct EvaluatedEntry {
    index: usize,
    actual: Label,
    decision: Label,
    correct: bool,
    fallback: bool,
    explanation: String,
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_applicants: usize,
    n_accept: usize,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    id: &'a str,
    decision: Label,
    explanation: String,
    fallback: bool,
    path: &'a [PathStep],
}
