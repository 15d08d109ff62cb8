use thiserror::Error;

use crate::directory::{Employee, EmployeeDirectory};

/// Pixel size the page asks for by default
pub const DEFAULT_BADGE_SIZE: u32 = 128;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("QR Code tidak valid!")]
    InvalidCode,

    #[cfg(feature = "web")]
    #[error("Failed to encode QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),
}

/// Match text decoded by the browser scanner against the directory.
///
/// Scanners sometimes deliver a trailing newline, so surrounding whitespace
/// is ignored; the id itself must match exactly.
pub fn resolve_scan<'a>(
    directory: &'a EmployeeDirectory,
    decoded_text: &str,
) -> Result<&'a Employee, ScanError> {
    directory
        .find(decoded_text.trim())
        .ok_or(ScanError::InvalidCode)
}

/// Render an employee id as an SVG QR code
///
/// # Arguments
/// * `employee_id` - Text to encode
/// * `size` - Minimum width and height of the image in pixels
///
/// # Returns
/// * `Result<String, ScanError>` - SVG document or an encoding error
#[cfg(feature = "web")]
pub fn badge_svg(employee_id: &str, size: u32) -> Result<String, ScanError> {
    use qrcode::QrCode;
    use qrcode::render::svg;

    let code = QrCode::new(employee_id.as_bytes())?;
    let image = code
        .render::<svg::Color>()
        .min_dimensions(size, size)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_resolves_known_id() {
        let dir = EmployeeDirectory::default();
        assert_eq!(resolve_scan(&dir, "67890").unwrap().name, "Jane Smith");
        assert_eq!(resolve_scan(&dir, "12345\n").unwrap().name, "John Doe");
    }

    #[test]
    fn scan_rejects_unknown_text() {
        let dir = EmployeeDirectory::default();
        let err = resolve_scan(&dir, "https://example.com").unwrap_err();
        assert!(matches!(err, ScanError::InvalidCode));
        assert_eq!(err.to_string(), "QR Code tidak valid!");
    }

    #[cfg(feature = "web")]
    #[test]
    fn badge_is_svg() {
        let svg = badge_svg("12345", DEFAULT_BADGE_SIZE).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#000000"));
    }
}
