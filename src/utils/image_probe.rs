use image::ImageFormat;
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("unrecognised image format")]
    UnknownFormat,
    #[error("unsupported image format: {0:?}")]
    Unsupported(ImageFormat),
    #[error("failed to read image dimensions: {0}")]
    Decode(#[from] image::ImageError),
}

/// Type and size of an encoded image, read from its header only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub mime_type: &'static str,
    pub extension: &'static str,
    pub width: u32,
    pub height: u32,
}

pub fn probe_image(data: &[u8]) -> Result<ImageInfo, ProbeError> {
    let format = image::guess_format(data).map_err(|_| ProbeError::UnknownFormat)?;

    let (mime_type, extension) = match format {
        ImageFormat::Png => ("image/png", "png"),
        ImageFormat::Jpeg => ("image/jpeg", "jpg"),
        ImageFormat::WebP => ("image/webp", "webp"),
        other => return Err(ProbeError::Unsupported(other)),
    };

    let (width, height) = image::ImageReader::with_format(Cursor::new(data), format)
        .into_dimensions()?;

    Ok(ImageInfo {
        mime_type,
        extension,
        width,
        height,
    })
}
