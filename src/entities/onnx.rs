// Local ONNX named-entity recognizer — the model-based extractor variant.
//
// Runs a token-classification model (BERT-style, BIO tags) on the local CPU
// and maps the spans it finds onto our categories. The dictionary scan still
// runs underneath, so this variant never recognizes less than the default
// one: CVE ids, malware families, sectors and techniques come from the
// dictionary, while the model adds people and resolves locations and
// organizations through the dictionary's alias tables.
//
// Expected files in the model directory:
//   model.onnx      inputs `input_ids` and `attention_mask`, output logits
//                   shaped [batch, seq, labels]
//   tokenizer.json  HuggingFace tokenizer for the same model
//   labels.json     JSON array of tag names indexed by label id
//                   (e.g. ["O", "B-PER", "I-PER", "B-ORG", ...])

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, warn};

use super::dictionary::{normalize_surface, CompiledDictionary};
use super::traits::EntityExtractor;
use super::types::{insert_entity, merge_entities, EntityCategory, EntityMap};

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";
const LABELS_FILE: &str = "labels.json";

/// Longest token sequence fed to the model in one pass.
const MAX_SEQ_LEN: usize = 512;

/// Check whether all three model files exist.
pub fn model_files_present(dir: &Path) -> bool {
    [MODEL_FILE, TOKENIZER_FILE, LABELS_FILE]
        .iter()
        .all(|f| dir.join(f).exists())
}

/// A contiguous run of tokens sharing one entity tag, as byte offsets into
/// the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NerSpan {
    pub kind: String,
    pub start: usize,
    pub end: usize,
}

/// ONNX token-classification extractor layered over the dictionary scan.
pub struct OnnxNerExtractor {
    // ort::Session::run takes &mut self, and the trait needs Send + Sync.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    dictionary: Arc<CompiledDictionary>,
}

impl OnnxNerExtractor {
    /// Load the model, tokenizer and label list from `model_dir`.
    pub fn load(model_dir: &Path, dictionary: Arc<CompiledDictionary>) -> Result<Self> {
        if !model_files_present(model_dir) {
            anyhow::bail!(
                "NER model files not found in {}\n\
                 Set MOSAIC_MODEL_DIR to a directory containing {MODEL_FILE}, \
                 {TOKENIZER_FILE} and {LABELS_FILE}, or use MOSAIC_EXTRACTOR=dictionary.",
                model_dir.display()
            );
        }

        let model_path = model_dir.join(MODEL_FILE);
        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(model_dir.join(TOKENIZER_FILE))
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let labels_raw = std::fs::read_to_string(model_dir.join(LABELS_FILE))
            .context("Failed to read NER label list")?;
        let labels: Vec<String> =
            serde_json::from_str(&labels_raw).context("NER label list must be a JSON array")?;
        if labels.is_empty() {
            anyhow::bail!("NER label list is empty");
        }

        debug!(
            labels = labels.len(),
            "Loaded ONNX NER model from {}",
            model_dir.display()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            dictionary,
        })
    }

    /// Run the model and return the tag of every token with its byte offsets.
    fn tag_tokens(&self, text: &str) -> Result<Vec<(String, (usize, usize))>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
        if seq_len == 0 {
            return Ok(Vec::new());
        }

        let input_ids: Vec<i64> = encoding.get_ids()[..seq_len]
            .iter()
            .map(|&id| id as i64)
            .collect();
        let attention_mask: Vec<i64> = encoding.get_attention_mask()[..seq_len]
            .iter()
            .map(|&m| m as i64)
            .collect();
        let offsets = &encoding.get_offsets()[..seq_len];

        let shape = [1_i64, seq_len as i64];
        let input_ids_tensor = Tensor::from_array((shape, input_ids))
            .context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask))
            .context("Failed to create attention_mask tensor")?;

        let logits = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor
                })
                .context("ONNX inference failed")?;

            // Output shape: [1, seq_len, num_labels]
            let (_out_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract output tensor")?;

            data.to_vec()
        };

        let num_labels = self.labels.len();
        if logits.len() != seq_len * num_labels {
            anyhow::bail!(
                "NER model returned {} logits, expected {} tokens x {} labels",
                logits.len(),
                seq_len,
                num_labels
            );
        }

        Ok(logits
            .chunks(num_labels)
            .zip(offsets)
            .map(|(row, &offset)| (self.labels[argmax(row)].clone(), offset))
            .collect())
    }

    /// Map one decoded span onto a category, if it belongs to one.
    fn classify_span(&self, kind: &str, surface: &str, entities: &mut EntityMap) {
        let normalized = normalize_surface(surface);
        if normalized.is_empty() {
            return;
        }

        match kind {
            "PER" => insert_entity(entities, EntityCategory::Person, normalized),
            "LOC" | "GPE" => {
                if let Some(canonical) = self.dictionary.canonicalize(EntityCategory::Country, surface)
                {
                    insert_entity(entities, EntityCategory::Country, canonical);
                }
            }
            "ORG" => {
                if let Some(canonical) =
                    self.dictionary.canonicalize(EntityCategory::ThreatActor, surface)
                {
                    insert_entity(entities, EntityCategory::ThreatActor, canonical);
                }
            }
            "MISC" => {
                if let Some(canonical) = self.dictionary.canonicalize(EntityCategory::Malware, surface)
                {
                    insert_entity(entities, EntityCategory::Malware, canonical);
                }
            }
            other => debug!(kind = other, "Ignoring unmapped NER tag"),
        }
    }
}

impl EntityExtractor for OnnxNerExtractor {
    fn extract(&self, title: &str, text: &str) -> Result<EntityMap> {
        let combined = format!("{title}\n{text}");
        let mut entities = self.dictionary.scan(&combined);
        if combined.trim().is_empty() {
            return Ok(entities);
        }

        let tagged = self.tag_tokens(&combined)?;
        let mut found = EntityMap::new();
        for span in decode_bio(&tagged) {
            match combined.get(span.start..span.end) {
                Some(surface) => self.classify_span(&span.kind, surface, &mut found),
                None => warn!(
                    start = span.start,
                    end = span.end,
                    "NER span is not on a character boundary, skipping"
                ),
            }
        }
        merge_entities(&mut entities, found);

        Ok(entities)
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

/// Index of the largest value (first one on ties).
fn argmax(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best_i, best), (i, &v)| {
            if v > best {
                (i, v)
            } else {
                (best_i, best)
            }
        })
        .0
}

/// Group per-token BIO tags into spans.
///
/// Special tokens carry an empty (0, 0) offset and are skipped. An `I-` tag
/// with no open span of the same kind starts a new span, and a `B-` tag that
/// continues the open span without a gap (a word piece) extends it.
pub fn decode_bio(tagged: &[(String, (usize, usize))]) -> Vec<NerSpan> {
    let mut spans = Vec::new();
    let mut current: Option<NerSpan> = None;

    for (tag, (start, end)) in tagged {
        if start == end {
            continue;
        }

        let (prefix, kind) = match tag.split_once('-') {
            Some((prefix, kind)) => (prefix, kind),
            None => {
                spans.extend(current.take());
                continue;
            }
        };

        let continues = current.as_ref().is_some_and(|span| {
            span.kind == kind && (prefix == "I" || span.end == *start)
        });

        if continues {
            if let Some(span) = current.as_mut() {
                span.end = *end;
            }
        } else {
            spans.extend(current.take());
            current = Some(NerSpan {
                kind: kind.to_string(),
                start: *start,
                end: *end,
            });
        }
    }

    spans.extend(current);
    spans
}
