//! GeoTIFF output.
//!
//! Writes the visited part of a canvas as a single band 8-bit image with
//! one pixel per block. Pixel (0, 0) is the block at (min x, max y) and
//! 0 is declared as no data.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::str::FromStr;

use tiff::encoder::compression::{Compression, Deflate, Lzw, Packbits, Uncompressed};
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;

use crate::error::{Error, Result};
use crate::region::Bounds;
use crate::world::Canvas;

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
const GDAL_NODATA_TAG: u16 = 42113;

/// GeoKey directory: version 1.1.0 with GTRasterTypeGeoKey = RasterPixelIsArea.
const GEO_KEYS: [u16; 8] = [1, 1, 0, 1, 1025, 0, 1, 1];

/// TIFF compression schemes, named as libtiff names them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompressionScheme {
    None,
    CcittRle,
    CcittFax3,
    CcittFax4,
    Lzw,
    OJpeg,
    Jpeg,
    Next,
    CcittRleW,
    PackBits,
    ThunderScan,
    It8CtPad,
    It8Lw,
    It8Mp,
    It8Bl,
    PixarFilm,
    PixarLog,
    #[default]
    Deflate,
    AdobeDeflate,
    Dcs,
    Jbig,
    SgiLog,
    SgiLog24,
    Jp2000,
}

impl CompressionScheme {
    pub const ALL: [CompressionScheme; 24] = [
        Self::None,
        Self::CcittRle,
        Self::CcittFax3,
        Self::CcittFax4,
        Self::Lzw,
        Self::OJpeg,
        Self::Jpeg,
        Self::Next,
        Self::CcittRleW,
        Self::PackBits,
        Self::ThunderScan,
        Self::It8CtPad,
        Self::It8Lw,
        Self::It8Mp,
        Self::It8Bl,
        Self::PixarFilm,
        Self::PixarLog,
        Self::Deflate,
        Self::AdobeDeflate,
        Self::Dcs,
        Self::Jbig,
        Self::SgiLog,
        Self::SgiLog24,
        Self::Jp2000,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::CcittRle => "CCITTRLE",
            Self::CcittFax3 => "CCITTFAX3",
            Self::CcittFax4 => "CCITTFAX4",
            Self::Lzw => "LZW",
            Self::OJpeg => "OJPEG",
            Self::Jpeg => "JPEG",
            Self::Next => "NEXT",
            Self::CcittRleW => "CCITTRLEW",
            Self::PackBits => "PACKBITS",
            Self::ThunderScan => "THUNDERSCAN",
            Self::It8CtPad => "IT8CTPAD",
            Self::It8Lw => "IT8LW",
            Self::It8Mp => "IT8MP",
            Self::It8Bl => "IT8BL",
            Self::PixarFilm => "PIXARFILM",
            Self::PixarLog => "PIXARLOG",
            Self::Deflate => "DEFLATE",
            Self::AdobeDeflate => "ADOBE_DEFLATE",
            Self::Dcs => "DCS",
            Self::Jbig => "JBIG",
            Self::SgiLog => "SGILOG",
            Self::SgiLog24 => "SGILOG24",
            Self::Jp2000 => "JP2000",
        }
    }

    /// Whether 8-bit grayscale images can be written with this scheme.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::None | Self::Lzw | Self::PackBits | Self::Deflate | Self::AdobeDeflate
        )
    }

    /// Parses a name and checks that it can be written.
    ///
    /// Used as the command line value parser, so bad names fail before any
    /// region file is opened.
    pub fn parse_supported(name: &str) -> Result<Self> {
        let scheme: Self = name.parse()?;
        if !scheme.is_supported() {
            return Err(Error::Config(format!(
                "compression scheme '{}' is not supported for 8-bit rasters, use one of NONE, LZW, PACKBITS, DEFLATE, ADOBE_DEFLATE",
                scheme
            )));
        }
        Ok(scheme)
    }
}

impl fmt::Display for CompressionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompressionScheme {
    type Err = Error;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.name() == upper)
            .ok_or_else(|| Error::Config(format!("specified invalid type of compression '{}'", s)))
    }
}

/// Writes the part of `canvas` inside `bounds` to a GeoTIFF file.
///
/// On failure the partially written file is removed.
pub fn write_raster(
    path: &Path,
    canvas: &Canvas,
    bounds: &Bounds,
    compression: CompressionScheme,
) -> Result<()> {
    if bounds.is_empty() {
        return Err(Error::EmptyWorld);
    }
    if !compression.is_supported() {
        return Err(Error::Config(format!(
            "compression scheme '{}' is not supported",
            compression
        )));
    }

    let pixels = crop(canvas, bounds)?;

    log::info!(
        "Writing {}x{} raster with origin ({}, {}) to {} ({})",
        bounds.width(),
        bounds.height(),
        bounds.min_x,
        bounds.max_y,
        path.display(),
        compression
    );

    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let result = encode(&mut writer, &pixels, bounds, compression)
        .and_then(|()| writer.flush().map_err(|e| Error::io(path, e)));
    drop(writer);

    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("Could not remove partial output {}: {}", path.display(), e);
        }
    }
    result
}

/// Row-major samples of the canvas inside `bounds`.
pub fn crop(canvas: &Canvas, bounds: &Bounds) -> Result<Vec<u8>> {
    let (origin_x, origin_y) = canvas.origin();

    // 1-based, relative to the canvas.
    let min_row = origin_y - bounds.max_y + 1;
    let max_row = origin_y - bounds.min_y + 1;
    let min_col = bounds.min_x - origin_x + 1;
    let max_col = bounds.max_x - origin_x + 1;

    if min_row < 1
        || min_col < 1
        || max_row > canvas.height() as i64
        || max_col > canvas.width() as i64
    {
        return Err(Error::IndexOutOfRange {
            index: crate::coords::row_col_index(max_row, max_col, canvas.width() as i64),
            len: canvas.data().len(),
        });
    }

    let mut pixels = Vec::with_capacity(bounds.width() * bounds.height());
    for row in min_row..=max_row {
        let span = canvas.row_span(row as usize, min_col as usize, max_col as usize);
        pixels.extend_from_slice(span);
    }
    Ok(pixels)
}

fn encode<W: Write + Seek>(
    writer: &mut W,
    pixels: &[u8],
    bounds: &Bounds,
    compression: CompressionScheme,
) -> Result<()> {
    let mut tiff = TiffEncoder::new(writer)?;

    match compression {
        CompressionScheme::None => write_image(&mut tiff, pixels, bounds, Uncompressed)?,
        CompressionScheme::Lzw => write_image(&mut tiff, pixels, bounds, Lzw)?,
        CompressionScheme::PackBits => write_image(&mut tiff, pixels, bounds, Packbits)?,
        CompressionScheme::Deflate | CompressionScheme::AdobeDeflate => {
            write_image(&mut tiff, pixels, bounds, Deflate::default())?
        }
        other => {
            return Err(Error::Config(format!(
                "compression scheme '{}' is not supported",
                other
            )));
        }
    }

    Ok(())
}

fn write_image<W: Write + Seek, D: Compression>(
    tiff: &mut TiffEncoder<&mut W>,
    pixels: &[u8],
    bounds: &Bounds,
    compression: D,
) -> Result<()> {
    let mut image = tiff.new_image_with_compression::<colortype::Gray8, D>(
        bounds.width() as u32,
        bounds.height() as u32,
        compression,
    )?;

    let tiepoints = [0.0, 0.0, 0.0, bounds.min_x as f64, bounds.max_y as f64, 0.0];
    let pixel_scale = [1.0, 1.0, 0.0];

    let directory = image.encoder();
    directory.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE_TAG), &pixel_scale[..])?;
    directory.write_tag(Tag::Unknown(MODEL_TIEPOINT_TAG), &tiepoints[..])?;
    directory.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY_TAG), &GEO_KEYS[..])?;
    // GDAL expects the no data value as an ASCII string.
    directory.write_tag(Tag::Unknown(GDAL_NODATA_TAG), "0")?;

    image.write_data(pixels)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::decoder::{Decoder, DecodingResult};

    fn sample_canvas() -> (Canvas, Bounds) {
        let mut canvas = Canvas::new(0, 0, 64, 64);
        for x in 16..32 {
            for y in -47..=-32 {
                canvas.put(x, y, (x - 16) as u8 + 1).unwrap();
            }
        }
        let mut bounds = Bounds::EMPTY;
        bounds.expand_chunk(1, 2);
        (canvas, bounds)
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("deflate".parse::<CompressionScheme>().unwrap(), CompressionScheme::Deflate);
        assert_eq!(
            "Adobe_Deflate".parse::<CompressionScheme>().unwrap(),
            CompressionScheme::AdobeDeflate
        );
        assert_eq!("NONE".parse::<CompressionScheme>().unwrap(), CompressionScheme::None);
        assert_eq!("jp2000".parse::<CompressionScheme>().unwrap(), CompressionScheme::Jp2000);
    }

    #[test]
    fn test_parse_invalid() {
        let err = "zstd".parse::<CompressionScheme>().unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("zstd")));
    }

    #[test]
    fn test_every_name_round_trips() {
        for scheme in CompressionScheme::ALL {
            assert_eq!(scheme.name().parse::<CompressionScheme>().unwrap(), scheme);
        }
    }

    #[test]
    fn test_default_is_deflate() {
        assert_eq!(CompressionScheme::default(), CompressionScheme::Deflate);
        assert!(CompressionScheme::default().is_supported());
    }

    #[test]
    fn test_parse_supported() {
        assert!(CompressionScheme::parse_supported("lzw").is_ok());
        assert!(CompressionScheme::parse_supported("packbits").is_ok());
        assert!(matches!(
            CompressionScheme::parse_supported("jpeg"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_crop() {
        let (canvas, bounds) = sample_canvas();
        let pixels = crop(&canvas, &bounds).unwrap();

        assert_eq!(pixels.len(), 256);
        assert_eq!(&pixels[..16], &(1..=16).collect::<Vec<u8>>()[..]);
        assert!(pixels.chunks(16).all(|row| row[0] == 1 && row[15] == 16));
    }

    #[test]
    fn test_crop_outside_canvas() {
        let canvas = Canvas::new(0, 0, 16, 16);
        let mut bounds = Bounds::EMPTY;
        bounds.expand_chunk(1, 0);

        assert!(matches!(
            crop(&canvas, &bounds),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let (canvas, bounds) = sample_canvas();

        for compression in [
            CompressionScheme::None,
            CompressionScheme::Lzw,
            CompressionScheme::PackBits,
            CompressionScheme::Deflate,
        ] {
            let path = dir.path().join(format!("{}.tif", compression));
            write_raster(&path, &canvas, &bounds, compression).unwrap();

            let mut decoder = Decoder::new(File::open(&path).unwrap()).unwrap();
            assert_eq!(decoder.dimensions().unwrap(), (16, 16));

            match decoder.read_image().unwrap() {
                DecodingResult::U8(pixels) => {
                    assert_eq!(pixels, crop(&canvas, &bounds).unwrap());
                }
                _ => panic!("Expected 8-bit samples"),
            }
        }
    }

    #[test]
    fn test_empty_bounds_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tif");
        let canvas = Canvas::new(0, 0, 512, 512);

        let err = write_raster(&path, &canvas, &Bounds::EMPTY, CompressionScheme::Deflate)
            .unwrap_err();

        assert!(matches!(err, Error::EmptyWorld));
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.tif");
        let (canvas, bounds) = sample_canvas();

        let err = write_raster(&path, &canvas, &bounds, CompressionScheme::None).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
