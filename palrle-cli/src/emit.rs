use palrle::{Dimensions, EncodedImage, PaddedImage, Palette};
use snafu::{ResultExt, Snafu};
use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

#[derive(Debug, Snafu)]
pub enum EmitError {
    #[snafu(display("failed to write `{}`: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// How the rows of the encoded stream are located.
#[derive(Debug)]
pub enum RowIndex<'a> {
    Offsets(&'a [u16]),
    Stride(usize),
}

/// Everything that ends up in the generated source/header pair.
#[derive(Debug)]
pub struct Artifact<'a> {
    pub symbol: String,
    pub dims: Dimensions,
    pub palette: &'a Palette,
    pub rows: RowIndex<'a>,
    pub data: &'a [u8],
}

impl<'a> Artifact<'a> {
    pub fn indexed(symbol: &str, image: &'a EncodedImage) -> Self {
        Self {
            symbol: sanitize_symbol(symbol),
            dims: image.dims,
            palette: &image.palette,
            rows: RowIndex::Offsets(&image.row_offsets),
            data: &image.data,
        }
    }

    pub fn padded(symbol: &str, image: &'a PaddedImage) -> Self {
        Self {
            symbol: sanitize_symbol(symbol),
            dims: image.dims,
            palette: &image.palette,
            rows: RowIndex::Stride(image.stride),
            data: &image.data,
        }
    }

    pub fn render_header(&self) -> String {
        let sym = &self.symbol;
        let mut h = String::new();

        h.push_str("#pragma once\n\n#include <stdint.h>\n\n");
        h.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");

        let _ = writeln!(h, "#define {sym}_WIDTH {}", self.dims.width);
        let _ = writeln!(h, "#define {sym}_HEIGHT {}", self.dims.height);
        let _ = writeln!(h, "#define {sym}_PALETTE_LEN {}", self.palette.len());
        if let RowIndex::Stride(stride) = self.rows {
            let _ = writeln!(h, "#define {sym}_STRIDE {stride}");
        }
        h.push('\n');

        let _ = writeln!(h, "extern const uint8_t {sym}_PALETTE[{sym}_PALETTE_LEN];");
        if let RowIndex::Offsets(_) = self.rows {
            let _ = writeln!(h, "extern const uint16_t {sym}_ROW_OFFSETS[{sym}_HEIGHT];");
        }
        let _ = writeln!(h, "extern const uint8_t {sym}[];");
        let _ = writeln!(h, "extern const uint32_t {sym}_len;\n");

        h.push_str("#ifdef __cplusplus\n}\n#endif\n");
        h
    }

    pub fn render_source(&self, header_name: &str) -> String {
        let sym = &self.symbol;
        let mut c = String::new();

        let _ = writeln!(c, "#include <stdint.h>\n#include \"{header_name}\"\n");

        let _ = writeln!(c, "const uint8_t {sym}_PALETTE[{sym}_PALETTE_LEN] = {{");
        write_array(&mut c, self.palette.as_slice(), 16, |v| format!("{v}"));
        c.push_str("};\n\n");

        if let RowIndex::Offsets(offsets) = self.rows {
            let _ = writeln!(c, "const uint16_t {sym}_ROW_OFFSETS[{sym}_HEIGHT] = {{");
            write_array(&mut c, offsets, 8, |v| format!("0x{v:04x}"));
            c.push_str("};\n\n");
        }

        let _ = writeln!(c, "const uint8_t {sym}[] = {{");
        write_array(&mut c, self.data, 16, |v| format!("0x{v:02x}"));
        c.push_str("};\n\n");

        let _ = writeln!(c, "const uint32_t {sym}_len = {};", self.data.len());
        c
    }

    /// Writes the header and source files, or neither of them.
    pub fn write(&self, out_c: &Path, out_h: &Path) -> Result<(), EmitError> {
        let header_name = out_h
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let header = self.render_header();
        let source = self.render_source(&header_name);

        write_all_or_nothing(&[(out_h, header.as_bytes()), (out_c, source.as_bytes())])
    }
}

fn write_array<T: Copy>(out: &mut String, values: &[T], per_line: usize, f: impl Fn(T) -> String) {
    for line in values.chunks(per_line) {
        let items = line.iter().map(|&v| f(v)).collect::<Vec<_>>();
        let _ = writeln!(out, "  {},", items.join(", "));
    }
}

/// Stages every file next to its destination and only moves them into place once all of them
/// were written. If moving one of them fails, the files already moved are reverted, so either
/// every destination has its new contents or none of them changed.
pub fn write_all_or_nothing(files: &[(&Path, &[u8])]) -> Result<(), EmitError> {
    let staged = files
        .iter()
        .map(|(path, _)| with_suffix(path, ".tmp"))
        .collect::<Vec<_>>();
    let backups = files
        .iter()
        .map(|(path, _)| with_suffix(path, ".bak"))
        .collect::<Vec<_>>();

    let cleanup = |staged: &[PathBuf]| {
        for path in staged {
            let _ = std::fs::remove_file(path);
        }
    };

    for ((path, contents), tmp) in files.iter().zip(&staged) {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(source) = std::fs::create_dir_all(parent) {
                cleanup(&staged);
                return Err(EmitError::WriteFile {
                    path: parent.to_owned(),
                    source,
                });
            }
        }
        if let Err(e) = std::fs::write(tmp, contents).context(WriteFileSnafu { path: *path }) {
            cleanup(&staged);
            return Err(e);
        }
    }

    let mut committed = Vec::with_capacity(files.len());
    for (((path, _), tmp), backup) in files.iter().zip(&staged).zip(&backups) {
        match commit(path, tmp, backup) {
            Ok(backed_up) => committed.push((*path, backup, backed_up)),
            Err(e) => {
                for &(path, backup, backed_up) in committed.iter().rev() {
                    if backed_up {
                        let _ = std::fs::rename(backup, path);
                    } else {
                        let _ = std::fs::remove_file(path);
                    }
                }
                cleanup(&staged);
                return Err(e);
            }
        }
    }

    for (_, backup, backed_up) in committed {
        if backed_up {
            let _ = std::fs::remove_file(backup);
        }
    }

    Ok(())
}

/// Moves `tmp` to `path`. An existing file at `path` is moved to `backup` first.
///
/// Returns whether a backup was made. On error `path` is left as it was.
fn commit(path: &Path, tmp: &Path, backup: &Path) -> Result<bool, EmitError> {
    let backed_up = std::fs::symlink_metadata(path).map_or(false, |meta| meta.is_file());
    if backed_up {
        std::fs::rename(path, backup).context(WriteFileSnafu { path })?;
    }

    if let Err(source) = std::fs::rename(tmp, path) {
        if backed_up {
            let _ = std::fs::rename(backup, path);
        }
        return Err(EmitError::WriteFile {
            path: path.to_owned(),
            source,
        });
    }

    Ok(backed_up)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Turns an arbitrary string into a valid C identifier.
pub fn sanitize_symbol(symbol: &str) -> String {
    let mut sym = symbol
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();

    if !sym.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        sym.insert(0, '_');
    }
    sym
}
