use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use qrcode::types::QrError;

/// Render `data` as a standalone SVG QR code.
pub fn qr_svg(data: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)?;
    Ok(code
        .render()
        .min_dimensions(240, 240)
        .quiet_zone(true)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}
