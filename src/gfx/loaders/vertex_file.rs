//! Bootstrap vertex files.
//!
//! A vertex file is a single run of comma-separated floats with no line
//! structure, grouped by three on read. Whitespace around a value is ignored
//! and one trailing separator is tolerated.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::LoadError;
use crate::gfx::scene::Vertices;

/// Parses the float run in `text`, reporting bad tokens against `path`.
pub fn parse_floats(text: &str, path: &Path) -> Result<Vec<f32>, LoadError> {
    let mut floats = Vec::new();
    let mut offset = 0;
    let mut tokens = text.split(',').peekable();

    while let Some(raw) = tokens.next() {
        let token = raw.trim();
        let is_last = tokens.peek().is_none();

        if token.is_empty() && is_last {
            break;
        }

        let value = token.parse::<f32>().map_err(|_| LoadError::Parse {
            path: path.to_path_buf(),
            token: token.to_string(),
            offset: offset + (raw.len() - raw.trim_start().len()),
        })?;
        floats.push(value);
        offset += raw.len() + 1;
    }

    Ok(floats)
}

/// Reads every float from the file at `path`.
pub fn read_floats(path: impl AsRef<Path>) -> Result<Vec<f32>, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let floats = parse_floats(&text, path)?;
    debug!("read {} floats from {}", floats.len(), path.display());
    Ok(floats)
}

/// Reads a position file and a matching normal file into a triangle soup.
pub fn load_vertex_files(
    positions: impl AsRef<Path>,
    normals: impl AsRef<Path>,
) -> Result<Vertices, LoadError> {
    let positions_path = positions.as_ref();
    let position_data = read_floats(positions_path)?;
    let normal_data = read_floats(normals.as_ref())?;

    Vertices::new(position_data, normal_data).map_err(|source| LoadError::Geometry {
        path: positions_path.to_path_buf(),
        source,
    })
}
