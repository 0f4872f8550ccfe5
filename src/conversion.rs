use log::warn;
use std::collections::HashMap;

use crate::error::TransformError;
use crate::types::{NormalizedAnnotation, RawAnnotation};

/// Convert pixel boxes into YOLO-normalized boxes.
///
/// The position of each category in `categories` is its class index. The first row with an
/// unknown category or a non-positive dimension aborts the conversion; no partial output is
/// returned.
pub fn transform(
    records: &[RawAnnotation],
    categories: &[String],
) -> Result<Vec<NormalizedAnnotation>, TransformError> {
    // A repeated name keeps the index of its first occurrence
    let mut class_map: HashMap<&str, usize> = HashMap::with_capacity(categories.len());
    for (index, name) in categories.iter().enumerate() {
        class_map.entry(name.as_str()).or_insert(index);
    }

    records
        .iter()
        .enumerate()
        .map(|(row, record)| normalize_record(row, record, &class_map))
        .collect()
}

/// Normalize a single row; `row` is only used to identify the record in errors.
pub fn normalize_record(
    row: usize,
    record: &RawAnnotation,
    class_map: &HashMap<&str, usize>,
) -> Result<NormalizedAnnotation, TransformError> {
    let class_index = *class_map.get(record.category.as_str()).ok_or_else(|| {
        TransformError::CategoryNotFound {
            row,
            image_file: record.image_file.clone(),
            category: record.category.clone(),
        }
    })?;

    check_finite(row, record, "box_left", record.box_left)?;
    check_finite(row, record, "box_top", record.box_top)?;
    check_positive(row, record, "box_width", record.box_width)?;
    check_positive(row, record, "box_height", record.box_height)?;
    check_positive(row, record, "img_width", record.img_width)?;
    check_positive(row, record, "img_height", record.img_height)?;

    let (center_x, center_y, norm_width, norm_height) = calculate_bounding_box(record);
    check_finite(row, record, "center_x", center_x)?;
    check_finite(row, record, "center_y", center_y)?;
    check_finite(row, record, "norm_width", norm_width)?;
    check_finite(row, record, "norm_height", norm_height)?;

    if !(0.0..=1.0).contains(&center_x) || !(0.0..=1.0).contains(&center_y) {
        warn!(
            "Row {} ({}): box centre ({:.4}, {:.4}) lies outside the image",
            row, record.image_file, center_x, center_y
        );
    }

    Ok(NormalizedAnnotation {
        image_file: record.image_file.clone(),
        class_index,
        center_x,
        center_y,
        norm_width,
        norm_height,
    })
}

/// Calculate the normalized centre and size of a pixel box
pub fn calculate_bounding_box(record: &RawAnnotation) -> (f64, f64, f64, f64) {
    let x_center = (record.box_left + record.box_width / 2.0) / record.img_width;
    let y_center = (record.box_top + record.box_height / 2.0) / record.img_height;
    let width = record.box_width / record.img_width;
    let height = record.box_height / record.img_height;

    (x_center, y_center, width, height)
}

fn check_finite(
    row: usize,
    record: &RawAnnotation,
    field: &'static str,
    value: f64,
) -> Result<(), TransformError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TransformError::InvalidDimension {
            row,
            image_file: record.image_file.clone(),
            field,
            value,
        })
    }
}

fn check_positive(
    row: usize,
    record: &RawAnnotation,
    field: &'static str,
    value: f64,
) -> Result<(), TransformError> {
    check_finite(row, record, field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(TransformError::InvalidDimension {
            row,
            image_file: record.image_file.clone(),
            field,
            value,
        })
    }
}

/// Serialize one box as `class x_center y_center width height`
pub fn format_yolo_line(annotation: &NormalizedAnnotation) -> String {
    format!(
        "{} {:.4} {:.4} {:.4} {:.4}",
        annotation.class_index,
        annotation.center_x,
        annotation.center_y,
        annotation.norm_width,
        annotation.norm_height
    )
}

/// Convert the boxes of one image to the contents of its YOLO label file
pub fn convert_to_yolo_format<'a, I>(annotations: I) -> String
where
    I: IntoIterator<Item = &'a NormalizedAnnotation>,
{
    let mut yolo_data = String::new();
    for annotation in annotations {
        yolo_data.push_str(&format_yolo_line(annotation));
        yolo_data.push('\n');
    }
    yolo_data
}
