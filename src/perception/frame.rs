use chrono::{DateTime, Utc};
use image::{ImageReader, RgbImage};
use std::io::Cursor;
use strum_macros::Display;

/// Pixel layout of a raw camera message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelEncoding {
    /// Tightly packed 8-bit RGB rows, row-major.
    Rgb8 { width: u32, height: u32 },
    /// A compressed still (PNG or JPEG), format sniffed from the payload.
    Compressed,
}

/// One timestamped camera sample as delivered by the transport.
///
/// The payload stays encoded until [`CameraFrame::decode`] is called once by
/// the frame pipeline; nothing else ever touches the buffer.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    stamp: DateTime<Utc>,
    encoding: PixelEncoding,
    data: Vec<u8>,
}

impl CameraFrame {
    pub fn rgb8(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { stamp: Utc::now(), encoding: PixelEncoding::Rgb8 { width, height }, data }
    }

    pub fn compressed(data: Vec<u8>) -> Self {
        Self { stamp: Utc::now(), encoding: PixelEncoding::Compressed, data }
    }

    pub fn stamp(&self) -> DateTime<Utc> { self.stamp }

    pub fn encoding(&self) -> PixelEncoding { self.encoding }

    /// Converts the payload into a normalized RGB pixel grid.
    pub fn decode(&self) -> Result<RgbImage, DecodeError> {
        match self.encoding {
            PixelEncoding::Rgb8 { width, height } => {
                let expected = width as usize * height as usize * 3;
                if self.data.len() != expected {
                    return Err(DecodeError::TruncatedBuffer {
                        expected,
                        actual: self.data.len(),
                    });
                }
                RgbImage::from_raw(width, height, self.data.clone())
                    .ok_or(DecodeError::TruncatedBuffer { expected, actual: self.data.len() })
            }
            PixelEncoding::Compressed => {
                let reader = ImageReader::new(Cursor::new(&self.data))
                    .with_guessed_format()
                    .map_err(|e| DecodeError::Malformed(e.to_string()))?;
                Ok(reader.decode().map_err(|e| DecodeError::Malformed(e.to_string()))?.to_rgb8())
            }
        }
    }
}

/// Raised when a camera message cannot be turned into a pixel grid.
/// Transient: the frame is dropped and the stream continues.
#[derive(Debug, Display)]
pub enum DecodeError {
    TruncatedBuffer { expected: usize, actual: usize },
    Malformed(String),
}

impl std::error::Error for DecodeError {}
