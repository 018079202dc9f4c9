use std::fs;
use std::io::{Cursor, ErrorKind, Write};
use std::path::{Path, PathBuf};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use tempfile::{Builder, NamedTempFile};

use crate::color::rgb_to_hex;
use crate::contour::Contour;
use crate::{VectraError, VectraResult};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const OUTPUT_SUFFIX: &str = "converted";
const OUTPUT_EXTENSION: &str = "svg";

/// One filled polygon of the output drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRegion {
    pub contour: Contour,
    /// Fill color as 0-255 RGB.
    pub fill: [u8; 3],
    /// Fill opacity in [0, 1].
    pub opacity: f64,
}

impl VectorRegion {
    /// SVG path data: `M x,y L x,y ... Z` with columns as x and rows as y.
    pub fn path_data(&self) -> String {
        let mut data = String::new();
        for (i, point) in self.contour.points().iter().enumerate() {
            let command = if i == 0 { "M" } else { " L" };
            data.push_str(&format!("{command} {:.2},{:.2}", point.col, point.row));
        }
        data.push_str(" Z");
        data
    }
}

/// A vector drawing sized to the source image, in pixel units.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    width: usize,
    height: usize,
    regions: Vec<VectorRegion>,
}

impl VectorDocument {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            regions: Vec::new(),
        }
    }

    pub fn push(&mut self, region: VectorRegion) {
        self.regions.push(region);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn regions(&self) -> &[VectorRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Serialize the document as an SVG string.
    pub fn to_svg_string(&self) -> VectraResult<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
        )?;

        let width = format!("{}px", self.width);
        let height = format!("{}px", self.height);
        let view_box = format!("0 0 {} {}", self.width, self.height);
        let mut root = BytesStart::new("svg");
        root.push_attribute(("xmlns", SVG_NAMESPACE));
        root.push_attribute(("version", "1.1"));
        root.push_attribute(("baseProfile", "tiny"));
        root.push_attribute(("width", width.as_str()));
        root.push_attribute(("height", height.as_str()));
        root.push_attribute(("viewBox", view_box.as_str()));
        write_event(&mut writer, Event::Start(root))?;

        for region in &self.regions {
            let data = region.path_data();
            let fill = rgb_to_hex(region.fill);
            let opacity = region.opacity.to_string();
            let mut path = BytesStart::new("path");
            path.push_attribute(("d", data.as_str()));
            path.push_attribute(("fill", fill.as_str()));
            path.push_attribute(("fill-opacity", opacity.as_str()));
            path.push_attribute(("stroke", "none"));
            write_event(&mut writer, Event::Empty(path))?;
        }

        write_event(&mut writer, Event::End(BytesEnd::new("svg")))?;

        let mut bytes = writer.into_inner().into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| VectraError::Xml(e.to_string()))
    }

    /// Serialize, then atomically replace `path` with the result.
    ///
    /// The previous file, if any, is left untouched when writing fails.
    pub fn write_to(&self, path: &Path) -> VectraResult<()> {
        let staged = self.stage_beside(path)?;
        staged.persist(path).map_err(|e| VectraError::Io(e.error))?;
        Ok(())
    }

    /// Serialize, then move the result to `path` only if nothing exists there yet.
    pub fn write_new(&self, path: &Path) -> VectraResult<()> {
        let staged = self.stage_beside(path)?;
        staged
            .persist_noclobber(path)
            .map_err(|e| match e.error.kind() {
                ErrorKind::AlreadyExists => VectraError::OutputExists {
                    path: path.to_path_buf(),
                },
                _ => VectraError::Io(e.error),
            })?;
        Ok(())
    }

    /// Write the SVG into a temporary file in the directory of `path`.
    /// Dropping the returned file removes it.
    fn stage_beside(&self, path: &Path) -> VectraResult<NamedTempFile> {
        let svg = self.to_svg_string()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut builder = Builder::new();
        builder.prefix(".vectra-").suffix(".svg.part");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o644));
        }
        let mut staged = builder.tempfile_in(dir)?;
        staged.write_all(svg.as_bytes())?;
        staged.as_file().sync_all()?;
        Ok(staged)
    }
}

fn write_event(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> VectraResult<()> {
    writer
        .write_event(event)
        .map_err(|e| VectraError::Xml(e.to_string()))
}

/// Derive a sibling path `<stem>_<suffix>[_<n>].<extension>`.
fn derive_variant_path(input: &Path, suffix: &str, index: usize, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let filename = match index {
        0 => format!("{stem}_{suffix}.{extension}"),
        n => format!("{stem}_{suffix}_{n}.{extension}"),
    };
    input.with_file_name(filename)
}

/// Candidate output path number `index`: `<stem>_converted.svg` for 0,
/// `<stem>_converted_<index>.svg` otherwise.
pub fn output_candidate(input: &Path, index: usize) -> PathBuf {
    derive_variant_path(input, OUTPUT_SUFFIX, index, OUTPUT_EXTENSION)
}

/// Smallest index `>= from` whose candidate has no directory entry.
/// Dangling symlinks count as taken.
pub fn next_free_index(input: &Path, from: usize) -> usize {
    (from..)
        .find(|&index| fs::symlink_metadata(output_candidate(input, index)).is_err())
        .unwrap_or(from)
}

/// First free `<stem>_converted.svg`, `<stem>_converted_1.svg`, ... next to `input`.
pub fn resolve_output_path(input: &Path) -> PathBuf {
    output_candidate(input, next_free_index(input, 0))
}
