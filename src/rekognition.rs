//! # Rekognition Client Module
//!
//! One detection operation per recognition category, each taking the raw
//! image bytes and returning either drawable annotations or a flat list of
//! label names. Response conversion lives in free functions so it can be
//! exercised without network access.

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::{
    BoundingBox, DetectTextFilters, DetectionFilter, Image, Label, ModerationLabel,
    ProtectiveEquipmentPerson, TextDetection, TextTypes,
};
use aws_sdk_rekognition::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::render::{Annotation, NormalizedBox};

/// Confidence floor for word detections, applied in the request filter and
/// again when converting the response
pub const TEXT_MIN_CONFIDENCE: f32 = 80.0;

/// Errors returned by the detection operations
#[derive(Debug, Error)]
pub enum RekognitionError {
    #[error("Rekognition error: {0}")]
    Api(String),
}

/// Shared Rekognition client, cheap to clone across handler invocations
#[derive(Clone)]
pub struct RekognitionService {
    client: Client,
}

impl RekognitionService {
    /// Build a client with static credentials and the configured region
    pub async fn from_config(config: &Config) -> Self {
        let credentials = Credentials::new(
            config.aws_access_key_id.clone(),
            config.aws_secret_access_key.clone(),
            None,
            None,
            "cvbot",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            client: Client::new(&sdk_config),
        }
    }

    /// Detect object categories; each instance with a bounding box becomes
    /// one annotation labeled with its category name
    pub async fn detect_objects(
        &self,
        image_bytes: &[u8],
    ) -> Result<Vec<Annotation>, RekognitionError> {
        let output = self
            .client
            .detect_labels()
            .image(image_input(image_bytes))
            .send()
            .await
            .map_err(|e| RekognitionError::Api(e.to_string()))?;

        debug!(labels = output.labels().len(), "Detect labels completed");

        Ok(object_annotations(output.labels()))
    }

    /// Detect text, keeping only confident word-level detections
    pub async fn detect_text(
        &self,
        image_bytes: &[u8],
    ) -> Result<Vec<Annotation>, RekognitionError> {
        let word_filter = DetectionFilter::builder()
            .min_confidence(TEXT_MIN_CONFIDENCE)
            .build();
        let filters = DetectTextFilters::builder().word_filter(word_filter).build();

        let output = self
            .client
            .detect_text()
            .image(image_input(image_bytes))
            .filters(filters)
            .send()
            .await
            .map_err(|e| RekognitionError::Api(e.to_string()))?;

        debug!(
            detections = output.text_detections().len(),
            "Detect text completed"
        );

        Ok(word_annotations(output.text_detections()))
    }

    /// Detect moderation categories; produces label names, never an image
    pub async fn detect_moderation_labels(
        &self,
        image_bytes: &[u8],
    ) -> Result<Vec<String>, RekognitionError> {
        let output = self
            .client
            .detect_moderation_labels()
            .image(image_input(image_bytes))
            .send()
            .await
            .map_err(|e| RekognitionError::Api(e.to_string()))?;

        debug!(
            labels = output.moderation_labels().len(),
            "Detect moderation labels completed"
        );

        Ok(moderation_label_names(output.moderation_labels()))
    }

    /// Detect protective equipment on persons, flattened into draw order
    pub async fn detect_protective_equipment(
        &self,
        image_bytes: &[u8],
    ) -> Result<Vec<Annotation>, RekognitionError> {
        let output = self
            .client
            .detect_protective_equipment()
            .image(image_input(image_bytes))
            .send()
            .await
            .map_err(|e| RekognitionError::Api(e.to_string()))?;

        debug!(
            persons = output.persons().len(),
            "Detect protective equipment completed"
        );

        Ok(ppe_annotations(output.persons()))
    }
}

/// Build the SDK image payload from raw bytes
fn image_input(image_bytes: &[u8]) -> Image {
    Image::builder().bytes(Blob::new(image_bytes)).build()
}

/// Extract a drawable box, requiring all four coordinates
fn normalized_box(bounding_box: &BoundingBox) -> Option<NormalizedBox> {
    Some(NormalizedBox {
        left: bounding_box.left()?,
        top: bounding_box.top()?,
        width: bounding_box.width()?,
        height: bounding_box.height()?,
    })
}

/// One labeled annotation per label instance that carries a bounding box
pub fn object_annotations(labels: &[Label]) -> Vec<Annotation> {
    let mut annotations = Vec::new();

    for label in labels {
        for instance in label.instances() {
            if let Some(rect) = instance.bounding_box().and_then(normalized_box) {
                annotations.push(Annotation {
                    label: label.name().map(|name| name.to_string()),
                    rect,
                });
            }
        }
    }

    annotations
}

/// Keep only word-level detections at or above the confidence floor
pub fn word_annotations(detections: &[TextDetection]) -> Vec<Annotation> {
    let mut annotations = Vec::new();

    for detection in detections {
        if detection.r#type() != Some(&TextTypes::Word) {
            continue;
        }
        if detection.confidence().unwrap_or(0.0) < TEXT_MIN_CONFIDENCE {
            continue;
        }

        let rect = detection
            .geometry()
            .and_then(|geometry| geometry.bounding_box())
            .and_then(normalized_box);

        if let (Some(text), Some(rect)) = (detection.detected_text(), rect) {
            annotations.push(Annotation {
                label: Some(text.to_string()),
                rect,
            });
        }
    }

    annotations
}

/// Flat list of moderation category names, in response order
pub fn moderation_label_names(labels: &[ModerationLabel]) -> Vec<String> {
    labels
        .iter()
        .filter_map(|label| label.name())
        .map(|name| name.to_string())
        .collect()
}

/// Flatten the person, body part, equipment hierarchy into draw order.
/// Person boxes are unlabeled; within each body part the last equipment box
/// carries the body part name. A part without equipment contributes nothing.
pub fn ppe_annotations(persons: &[ProtectiveEquipmentPerson]) -> Vec<Annotation> {
    let mut annotations = Vec::new();

    for person in persons {
        if let Some(rect) = person.bounding_box().and_then(normalized_box) {
            annotations.push(Annotation { label: None, rect });
        }

        for body_part in person.body_parts() {
            let mut part_boxes: Vec<NormalizedBox> = body_part
                .equipment_detections()
                .iter()
                .filter_map(|equipment| equipment.bounding_box().and_then(normalized_box))
                .collect();

            let labeled = part_boxes.pop();

            for rect in part_boxes {
                annotations.push(Annotation { label: None, rect });
            }

            if let Some(rect) = labeled {
                annotations.push(Annotation {
                    label: body_part.name().map(|name| name.as_str().to_string()),
                    rect,
                });
            }
        }
    }

    annotations
}
