//! Single-band GeoTIFF read/write.
//!
//! Only band 1 is read; integer and float sample types are converted to f32.
//! Georeferencing is carried as the raw GeoTIFF tags so an output can be
//! written on exactly the same grid as its reference file.
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{bail, Context, Result};
use landslide_core::Raster;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tracing::debug;

/// GeoTIFF tags copied verbatim from a reference raster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoReference {
    pub pixel_scale: Option<Vec<f64>>,
    pub tiepoints: Option<Vec<f64>>,
    pub transformation: Option<Vec<f64>>,
    pub geo_keys: Option<Vec<u16>>,
    pub geo_doubles: Option<Vec<f64>>,
    pub geo_ascii: Option<String>,
    /// GDAL_NODATA as written in the file (ASCII).
    pub nodata: Option<String>,
}

impl GeoReference {
    /// Parsed nodata sentinel, if present and numeric.
    pub fn nodata_value(&self) -> Option<f32> {
        self.nodata.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

fn read_tags<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<GeoReference> {
    let f64s = |d: &mut Decoder<R>, tag| -> Result<Option<Vec<f64>>> {
        Ok(d.find_tag(tag)?.map(|v| v.into_f64_vec()).transpose()?)
    };
    let text = |d: &mut Decoder<R>, tag| -> Result<Option<String>> {
        Ok(d.find_tag(tag)?.map(|v| v.into_string()).transpose()?)
    };

    Ok(GeoReference {
        pixel_scale: f64s(decoder, Tag::ModelPixelScaleTag)?,
        tiepoints: f64s(decoder, Tag::ModelTiepointTag)?,
        transformation: f64s(decoder, Tag::ModelTransformationTag)?,
        geo_keys: decoder
            .find_tag(Tag::GeoKeyDirectoryTag)?
            .map(|v| v.into_u16_vec())
            .transpose()?,
        geo_doubles: f64s(decoder, Tag::GeoDoubleParamsTag)?,
        geo_ascii: text(decoder, Tag::GeoAsciiParamsTag)?,
        nodata: text(decoder, Tag::GdalNodata)?,
    })
}

/// Read band 1 of a GeoTIFF. Nodata cells become NaN.
///
/// Fails with the path in the message if the file does not exist.
pub fn read_raster(path: &Path) -> Result<(Raster, GeoReference)> {
    if !path.exists() {
        bail!("Input raster not found: {}", path.display());
    }
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .with_context(|| format!("Not a valid TIFF: {}", path.display()))?;

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        bail!("Zero-sized raster: {}", path.display());
    }
    let georef = read_tags(&mut decoder).with_context(|| format!("Bad GeoTIFF tags in {}", path.display()))?;

    let image = decoder
        .read_image()
        .with_context(|| format!("read_image failed: {}", path.display()))?;
    let samples: Vec<f32> = match image {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        #[allow(unreachable_patterns)]
        _ => bail!("Unsupported sample format in {}", path.display()),
    };

    let cells = width * height;
    if samples.len() < cells || samples.len() % cells != 0 {
        bail!(
            "{}: {} samples do not fit a {}x{} grid",
            path.display(),
            samples.len(),
            width,
            height
        );
    }
    // Chunky multi-band data: keep the first sample of each pixel.
    let bands = samples.len() / cells;
    let nodata = georef.nodata_value();
    let data: Vec<f32> = samples
        .into_iter()
        .step_by(bands)
        .map(|v| if Some(v) == nodata { f32::NAN } else { v })
        .collect();

    debug!(path = %path.display(), width, height, bands, "read raster");
    Ok((Raster::from_vec(width, height, data), georef))
}

/// Write `raster` as a single-band Float32 GeoTIFF carrying `georef`'s tags.
///
/// NaN cells are flagged with GDAL_NODATA = "nan".
pub fn write_geotiff(path: &Path, raster: &Raster, georef: &GeoReference) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
    let mut tiff = TiffEncoder::new(BufWriter::new(file))?;
    let mut image = tiff.new_image::<colortype::Gray32Float>(raster.width as u32, raster.height as u32)?;

    let dir = image.encoder();
    if let Some(v) = &georef.pixel_scale {
        dir.write_tag(Tag::ModelPixelScaleTag, v.as_slice())?;
    }
    if let Some(v) = &georef.tiepoints {
        dir.write_tag(Tag::ModelTiepointTag, v.as_slice())?;
    }
    if let Some(v) = &georef.transformation {
        dir.write_tag(Tag::ModelTransformationTag, v.as_slice())?;
    }
    if let Some(v) = &georef.geo_keys {
        dir.write_tag(Tag::GeoKeyDirectoryTag, v.as_slice())?;
    }
    if let Some(v) = &georef.geo_doubles {
        dir.write_tag(Tag::GeoDoubleParamsTag, v.as_slice())?;
    }
    if let Some(s) = &georef.geo_ascii {
        dir.write_tag(Tag::GeoAsciiParamsTag, s.as_str())?;
    }
    if raster.data.iter().any(|v| v.is_nan()) {
        dir.write_tag(Tag::GdalNodata, "nan")?;
    }

    image
        .write_data(&raster.data)
        .with_context(|| format!("Write failed: {}", path.display()))?;
    Ok(())
}
