//! Decoding of the base64 payloads accepted by the HTTP surface.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use event_extraction::{ImageInput, WorkflowError};

/// `image_data`: a data URI, an http(s) URL, or bare base64.
pub fn decode_image(data: &str) -> Result<ImageInput, WorkflowError> {
    let data = data.trim();
    if let Ok(input) = ImageInput::parse(data) {
        return Ok(input);
    }
    STANDARD
        .decode(data)
        .map(ImageInput::Bytes)
        .map_err(|_| WorkflowError::InvalidPayload("Invalid image input format".into()))
}

/// `pdf_data`: bare base64 or a `data:application/pdf;base64,` URI.
pub fn decode_pdf(data: &str) -> Result<Vec<u8>, WorkflowError> {
    let data = data.trim();
    let payload = match data.strip_prefix("data:") {
        Some(uri) => uri
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or_else(|| WorkflowError::InvalidPayload("PDF data URI has no payload".into()))?,
        None => data,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| WorkflowError::InvalidPayload(format!("bad base64 PDF payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_image_variants() {
        assert_eq!(
            decode_image("https://cdn.example/a.png").unwrap(),
            ImageInput::Url("https://cdn.example/a.png".to_string())
        );
        assert!(matches!(
            decode_image("data:image/png;base64,aGVsbG8=").unwrap(),
            ImageInput::DataUri(_)
        ));
        assert_eq!(
            decode_image("aGVsbG8=").unwrap(),
            ImageInput::Bytes(b"hello".to_vec())
        );
        assert!(decode_image("not an image!").is_err());
    }

    #[test]
    fn test_decode_pdf() {
        assert_eq!(decode_pdf("JVBERi0=").unwrap(), b"%PDF-".to_vec());
        assert_eq!(
            decode_pdf("data:application/pdf;base64,JVBERi0=").unwrap(),
            b"%PDF-".to_vec()
        );
        assert!(matches!(
            decode_pdf("@@@"),
            Err(WorkflowError::InvalidPayload(_))
        ));
    }
}
