//! Compression codec abstraction for the loader.
//!
//! Raw files arrive either gzip-compressed or plain (the archive member is
//! already decompressed by extraction). The codec yields a streaming reader
//! so decoders never need the whole decompressed file in memory.

use std::io::{BufRead, BufReader, Cursor};

use crate::config::CompressionFormat;

/// Error type for decompression operations.
#[derive(Debug)]
pub struct DecompressionError {
    /// Description of the error.
    pub message: String,
}

impl std::fmt::Display for DecompressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DecompressionError {}

impl From<std::io::Error> for DecompressionError {
    fn from(e: std::io::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

/// Trait for compression codecs that can decompress data.
pub trait CompressionCodec: Send + Sync {
    /// Create a streaming reader that decompresses data on-the-fly.
    fn create_reader<'a>(
        &self,
        data: &'a [u8],
    ) -> Result<Box<dyn BufRead + Send + 'a>, DecompressionError>;

    /// Human-readable name of this codec (for logging).
    fn name(&self) -> &'static str;
}

/// Gzip compression codec using flate2.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipCodec;

impl CompressionCodec for GzipCodec {
    fn create_reader<'a>(
        &self,
        data: &'a [u8],
    ) -> Result<Box<dyn BufRead + Send + 'a>, DecompressionError> {
        Ok(Box::new(BufReader::new(flate2::read::GzDecoder::new(data))))
    }

    fn name(&self) -> &'static str {
        "gzip"
    }
}

/// No-op codec for uncompressed data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCodec;

impl CompressionCodec for NoopCodec {
    fn create_reader<'a>(
        &self,
        data: &'a [u8],
    ) -> Result<Box<dyn BufRead + Send + 'a>, DecompressionError> {
        Ok(Box::new(Cursor::new(data)))
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

impl CompressionFormat {
    /// Codec implementing this compression format.
    pub fn codec(self) -> Box<dyn CompressionCodec> {
        match self {
            CompressionFormat::Gzip => Box::new(GzipCodec),
            CompressionFormat::None => Box::new(NoopCodec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::io::Write;

    const TEST_DATA: &[u8] = b"customer_id,is_target\nc1,target\n";

    fn make_gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_gzip_codec_streaming() {
        let compressed = make_gzip(TEST_DATA);
        let codec = GzipCodec;

        let mut reader = codec.create_reader(&compressed).unwrap();
        let mut result = String::new();
        reader.read_to_string(&mut result).unwrap();

        assert_eq!(result.as_bytes(), TEST_DATA);
    }

    #[test]
    fn test_noop_codec_streaming() {
        let codec = NoopCodec;

        let mut reader = codec.create_reader(TEST_DATA).unwrap();
        let mut result = String::new();
        reader.read_to_string(&mut result).unwrap();

        assert_eq!(result.as_bytes(), TEST_DATA);
    }

    #[test]
    fn test_format_codec_dispatch() {
        assert_eq!(CompressionFormat::Gzip.codec().name(), "gzip");
        assert_eq!(CompressionFormat::None.codec().name(), "none");
    }
}
