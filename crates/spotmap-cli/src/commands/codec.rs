use crate::cli::{DecodeArgs, EncodeArgs};
use crate::output::OutputWriter;
use crate::output_types::{DecodeOutput, EncodeOutput};
use anyhow::{Context, Result};
use spotmap_core::config::LayeredConfig;
use spotmap_core::models::GeoPoint;
use spotmap_geo::{ensure_valid, PointCodec, RawPoint};

pub fn decode(args: DecodeArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let codec = PointCodec::new(config.srid.value);
    let value = if args.value.trim_start().starts_with('{') {
        serde_json::from_str(&args.value).context("Structured point is not valid JSON")?
    } else {
        serde_json::Value::String(args.value)
    };

    let shape = match RawPoint::classify(&value) {
        Some(RawPoint::Binary(_)) | Some(RawPoint::Hex(_)) => "ewkb",
        Some(RawPoint::Text(_)) => "ewkt",
        Some(RawPoint::Structured(_)) => "structured",
        None => "absent",
    };
    let point = codec.decode_value(&value)?;

    if output.is_json() {
        output.result(DecodeOutput { shape, latitude: point.latitude, longitude: point.longitude })
    } else {
        output.kv("Shape", shape);
        output.kv("Latitude", point.latitude);
        output.kv("Longitude", point.longitude);
        Ok(())
    }
}

pub fn encode(args: EncodeArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let codec = PointCodec::new(config.srid.value);
    let point = GeoPoint::new(args.latitude, args.longitude);
    ensure_valid(&point)?;

    let encoded = EncodeOutput {
        srid: codec.srid(),
        literal: codec.encode(&point),
        hex: codec.encode_hex(&point),
    };

    if output.is_json() {
        output.result(encoded)
    } else if args.hex {
        println!("{}", encoded.hex);
        Ok(())
    } else {
        println!("{}", encoded.literal);
        Ok(())
    }
}
