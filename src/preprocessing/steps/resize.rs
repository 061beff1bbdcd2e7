use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Target size for an image that must fit inside `max_dimension`
///
/// Returns `None` when both dimensions already fit. A `max_dimension` of
/// zero is treated as 1.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let max_dimension = max_dimension.max(1);
    if width <= max_dimension && height <= max_dimension {
        return None;
    }

    let scale = (max_dimension as f64 / width as f64).min(max_dimension as f64 / height as f64);
    let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_dimension);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_dimension);
    Some((new_width, new_height))
}

/// Downscale proportionally so neither side exceeds `max_dimension`
///
/// Images that already fit come back as an unmodified copy. Uses a
/// bilinear (triangle) filter.
pub fn apply(image: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = image.dimensions();

    match target_dimensions(width, height, max_dimension) {
        Some((new_width, new_height)) => {
            tracing::debug!(
                "Rescaling {}x{} -> {}x{}",
                width,
                height,
                new_width,
                new_height
            );
            image.resize_exact(new_width, new_height, FilterType::Triangle)
        }
        None => image.clone(),
    }
}
