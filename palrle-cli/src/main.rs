mod emit;

use argh::FromArgs;
use emit::{write_all_or_nothing, Artifact, EmitError};
use image::{GrayImage, ImageFormat};
use log::{error, info, Level};
use palrle::{
    decode::{blob::BlobError, DecodeError},
    encode::{BuildError, EncodeError},
    EncodedImage, EncodedImageRef, PaddedImage,
};
use snafu::{ensure, OptionExt, ResultExt, Snafu};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

/// Palette RLE texture encoder for embedded targets.
#[derive(FromArgs)]
struct Cli {
    /// log progress
    #[argh(switch, short = 'v')]
    verbose: bool,
    /// log debug output
    #[argh(switch)]
    debug: bool,
    /// log everything, including every encoded row
    #[argh(switch)]
    trace: bool,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Encode(Encode),
    Pack(Pack),
    Unpack(Unpack),
}

/// Encodes an image into a C source/header pair.
#[derive(FromArgs)]
#[argh(subcommand, name = "encode")]
struct Encode {
    /// row layout (indexed, padded), defaults to indexed
    #[argh(option, default = "Layout::Indexed")]
    layout: Layout,

    /// the input image (PNG, BMP, TIFF or JPEG)
    #[argh(positional)]
    input: PathBuf,
    /// the output C source file
    #[argh(positional)]
    out_c: PathBuf,
    /// the output C header file
    #[argh(positional)]
    out_h: PathBuf,
    /// base name of the generated symbols
    #[argh(positional)]
    symbol: String,
}

/// Encodes an image into the binary container format.
#[derive(FromArgs)]
#[argh(subcommand, name = "pack")]
struct Pack {
    /// the input image (PNG, BMP, TIFF or JPEG)
    #[argh(positional)]
    input: PathBuf,
    /// the output file
    #[argh(positional)]
    output: PathBuf,
}

/// Decodes a binary container back into a grayscale PNG.
#[derive(FromArgs)]
#[argh(subcommand, name = "unpack")]
struct Unpack {
    /// the input file
    #[argh(positional)]
    input: PathBuf,
    /// the output PNG file
    #[argh(positional)]
    output: PathBuf,
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    Indexed,
    Padded,
}

impl FromStr for Layout {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[rustfmt::skip]
        let Some(layout) = s.eq_ignore_ascii_case("indexed").then_some(Layout::Indexed)
               .or_else(|| s.eq_ignore_ascii_case("padded").then_some(Layout::Padded))
        else { return Err("invalid layout, expected `indexed` or `padded`"); };

        Ok(layout)
    }
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to read image `{}`: {source}", path.display()))]
    InputDecode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[snafu(display("image is {width}x{height}, at most {}x{} is supported", u16::MAX, u16::MAX))]
    TooLarge { width: u32, height: u32 },
    #[snafu(display("failed to encode `{}`: {source}", path.display()))]
    Build { path: PathBuf, source: BuildError },
    #[snafu(display("failed to pack `{}`: {source}", path.display()))]
    BlobEncode { path: PathBuf, source: EncodeError },
    #[snafu(display("{source}"))]
    Emit { source: EmitError },
    #[snafu(display("failed to read `{}`: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("`{}` is not a valid blob: {source}", path.display()))]
    Blob { path: PathBuf, source: BlobError },
    #[snafu(display("`{}` is corrupt: {source}", path.display()))]
    Corrupt { path: PathBuf, source: DecodeError },
    #[snafu(display("decoded samples don't match the image dimensions"))]
    BufferSize,
    #[snafu(display("failed to write image `{}`: {source}", path.display()))]
    OutputEncode {
        path: PathBuf,
        source: image::ImageError,
    },
}

fn main() {
    let Cli {
        verbose,
        debug,
        trace,
        command,
    } = argh::from_env();

    let level = if trace {
        Level::Trace
    } else if debug {
        Level::Debug
    } else if verbose {
        Level::Info
    } else {
        Level::Warn
    };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("failed to initialize logger: {e}");
    }

    let result = match command {
        Command::Encode(options) => encode(options),
        Command::Pack(options) => pack(options),
        Command::Unpack(options) => unpack(options),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

/// Loads an image and reduces it to 8-bit luminance samples.
fn load_samples(path: &Path) -> Result<(u16, u16, Vec<u8>), Error> {
    let image = image::io::Reader::open(path)
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.with_guessed_format().map_err(image::ImageError::IoError))
        .and_then(|reader| reader.decode())
        .context(InputDecodeSnafu { path })?;

    let (width, height) = (image.width(), image.height());
    info!("Read {width}x{height} image from `{}`", path.display());
    ensure!(
        width <= u32::from(u16::MAX) && height <= u32::from(u16::MAX),
        TooLargeSnafu { width, height }
    );

    Ok((width as u16, height as u16, image.into_luma8().into_raw()))
}

fn encode(options: Encode) -> Result<(), Error> {
    let Encode {
        layout,
        input,
        out_c,
        out_h,
        symbol,
    } = options;

    let (width, height, samples) = load_samples(&input)?;

    match layout {
        Layout::Indexed => {
            let image = EncodedImage::from_samples(width, height, &samples)
                .context(BuildSnafu { path: &input })?;
            info!(
                "Encoded {} palette entries, {} bytes of row data",
                image.palette.len(),
                image.data.len()
            );
            Artifact::indexed(&symbol, &image)
                .write(&out_c, &out_h)
                .context(EmitSnafu)?;
        }
        Layout::Padded => {
            let image = PaddedImage::from_samples(width, height, &samples)
                .context(BuildSnafu { path: &input })?;
            info!(
                "Encoded {} palette entries, {} bytes of row data with a stride of {}",
                image.palette.len(),
                image.data.len(),
                image.stride
            );
            Artifact::padded(&symbol, &image)
                .write(&out_c, &out_h)
                .context(EmitSnafu)?;
        }
    }

    info!("Written `{}` and `{}`", out_c.display(), out_h.display());

    Ok(())
}

fn pack(options: Pack) -> Result<(), Error> {
    let Pack { input, output } = options;

    let (width, height, samples) = load_samples(&input)?;
    let image =
        EncodedImage::from_samples(width, height, &samples).context(BuildSnafu { path: &input })?;

    let blob = image.to_blob().context(BlobEncodeSnafu { path: &input })?;
    write_all_or_nothing(&[(output.as_path(), blob.as_slice())]).context(EmitSnafu)?;
    info!("Written {} bytes to `{}`", blob.len(), output.display());

    Ok(())
}

fn unpack(options: Unpack) -> Result<(), Error> {
    let Unpack { input, output } = options;

    let blob = std::fs::read(&input).context(ReadFileSnafu { path: &input })?;
    let image = EncodedImageRef::parse(&blob).context(BlobSnafu { path: &input })?;
    info!(
        "Decoding {}x{} image with {} palette entries",
        image.dims.width,
        image.dims.height,
        image.palette.len()
    );

    let width = usize::from(image.dims.width);
    let mut samples = vec![0; image.dims.pixel_count()];
    for (y, row) in samples.chunks_exact_mut(width).enumerate() {
        image
            .decode_row(y, palrle::decode::LutRowOutput::new(image.palette.as_slice(), row))
            .context(CorruptSnafu { path: &input })?;
    }

    GrayImage::from_raw(image.dims.width.into(), image.dims.height.into(), samples)
        .context(BufferSizeSnafu)?
        .save_with_format(&output, ImageFormat::Png)
        .context(OutputEncodeSnafu { path: &output })?;
    info!("Written {width}x{} image to `{}`", image.dims.height, output.display());

    Ok(())
}
