//! Single-page PDF builder on top of `lopdf`
//!
//! Callers place content in a top-left coordinate space (y grows downwards,
//! in points) and the builder translates every draw call into content-stream
//! operations. The output file is opened when the builder is created and is
//! owned by a [`PassWriter`] guard until [`DocumentBuilder::finish`] commits
//! it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use lopdf::{
    content::{Content, Operation},
    dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat,
};

use super::assets::DecodedImage;
use super::RenderError;

/// US Letter
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const PAGE_MARGIN: f32 = 72.0;
/// Width available to text between the side margins
pub const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * PAGE_MARGIN;

const LINE_HEIGHT_FACTOR: f32 = 1.15;
const BASELINE_FACTOR: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    TimesBold,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::TimesBold => "F2",
        }
    }

    /// Advance width of one character in 1/1000 em
    fn char_width(self, c: char) -> u16 {
        let table: &[u16; 95] = match self {
            Font::Helvetica => &HELVETICA_WIDTHS,
            Font::TimesBold => &TIMES_BOLD_WIDTHS,
        };
        match c as u32 {
            code @ 32..=126 => table[(code - 32) as usize],
            _ => match self {
                Font::Helvetica => 556,
                Font::TimesBold => 500,
            },
        }
    }

    pub fn text_width(self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.char_width(c) as f32).sum::<f32>() * size / 1000.0
    }
}

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub f32, pub f32, pub f32);

impl Color {
    pub const BLACK: Color = Color(0.0, 0.0, 0.0);
    pub const BLUE: Color = Color(0.0, 0.0, 1.0);

    fn operands(self) -> Vec<Object> {
        vec![self.0.into(), self.1.into(), self.2.into()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub color: Color,
    pub align: Align,
    pub underline: bool,
}

impl TextStyle {
    pub fn new(font: Font, size: f32) -> Self {
        Self {
            font,
            size,
            color: Color::BLACK,
            align: Align::Left,
            underline: false,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub fn underlined(mut self) -> Self {
        self.underline = true;
        self
    }

    fn line_height(&self) -> f32 {
        self.size * LINE_HEIGHT_FACTOR
    }
}

/// Handle to an image registered in the page resources
#[derive(Debug, Clone)]
pub struct ImageHandle {
    name: String,
    pub width: u32,
    pub height: u32,
}

/// Scale `(width, height)` to fit a `box_width` x `box_height` box, keeping the aspect ratio
pub fn fit(width: u32, height: u32, box_width: f32, box_height: f32) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (0.0, 0.0);
    }
    let scale = (box_width / width as f32).min(box_height / height as f32);
    (width as f32 * scale, height as f32 * scale)
}

/// Output file guard.
///
/// The file is created with create-new semantics. Unless [`PassWriter::commit`]
/// runs, dropping the guard removes whatever was written.
pub struct PassWriter {
    path: PathBuf,
    file: BufWriter<File>,
    committed: bool,
}

impl PassWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
            committed: false,
        })
    }

    /// Flush buffered bytes and sync the file to disk
    pub fn commit(mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.get_ref().sync_all()?;
        self.committed = true;
        Ok(())
    }
}

impl Write for PassWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Drop for PassWriter {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Could not remove partial pass {}: {}", self.path.display(), e);
        }
    }
}

pub struct DocumentBuilder {
    doc: Document,
    operations: Vec<Operation>,
    images: Dictionary,
    cursor_y: f32,
    last_line_height: f32,
    out: PassWriter,
}

impl DocumentBuilder {
    /// Open `path` for writing and start an empty page
    pub fn create(path: &Path) -> Result<Self, RenderError> {
        let out = PassWriter::create(path)?;
        let mut doc = Document::with_version("1.5");
        doc.trailer.set("Creator", Object::string_literal("epass-server"));

        Ok(Self {
            doc,
            operations: Vec::new(),
            images: Dictionary::new(),
            cursor_y: PAGE_MARGIN,
            last_line_height: 12.0 * LINE_HEIGHT_FACTOR,
            out,
        })
    }

    /// Current text cursor, measured from the top of the page
    pub fn cursor_y(&self) -> f32 {
        self.cursor_y
    }

    /// Stroke a rectangle given its top-left corner
    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("RG", color.operands()),
            Operation::new("w", vec![1.into()]),
            Operation::new(
                "re",
                vec![
                    x.into(),
                    (PAGE_HEIGHT - y - height).into(),
                    width.into(),
                    height.into(),
                ],
            ),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Draw `text` at the cursor, wrapped inside the margins, and advance the
    /// cursor below the last line
    pub fn text(&mut self, text: &str, style: TextStyle) {
        for line in wrap_lines(text, style.font, style.size, TEXT_WIDTH) {
            self.line(&line, style);
        }
    }

    fn line(&mut self, text: &str, style: TextStyle) {
        let width = style.font.text_width(text, style.size);
        let x = match style.align {
            Align::Left => PAGE_MARGIN,
            Align::Center => (PAGE_WIDTH - width) / 2.0,
        };
        let baseline = PAGE_HEIGHT - (self.cursor_y + style.size * BASELINE_FACTOR);

        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![style.font.resource_name().into(), style.size.into()],
            ),
            Operation::new("rg", style.color.operands()),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_text(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);

        if style.underline {
            let y = baseline - style.size * 0.1;
            self.operations.extend([
                Operation::new("q", vec![]),
                Operation::new("RG", style.color.operands()),
                Operation::new("w", vec![(style.size / 20.0).into()]),
                Operation::new("m", vec![x.into(), y.into()]),
                Operation::new("l", vec![(x + width).into(), y.into()]),
                Operation::new("S", vec![]),
                Operation::new("Q", vec![]),
            ]);
        }

        self.last_line_height = style.line_height();
        self.cursor_y += self.last_line_height;
    }

    /// Leave one empty line of the most recently used text size
    pub fn move_down(&mut self) {
        self.cursor_y += self.last_line_height;
    }

    /// Register an image so it can be drawn on the page
    pub fn embed_image(&mut self, image: &DecodedImage) -> ImageHandle {
        let name = format!("Im{}", self.images.len());
        let id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.jpeg.clone(),
        ));
        self.images.set(name.clone(), id);

        ImageHandle {
            name,
            width: image.width,
            height: image.height,
        }
    }

    /// Draw an image with its top-left corner at `(x, y)`
    pub fn draw_image(&mut self, image: &ImageHandle, x: f32, y: f32, width: f32, height: f32) {
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    x.into(),
                    (PAGE_HEIGHT - y - height).into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(image.name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Assemble the page, write the document and close the file
    pub fn finish(mut self) -> Result<(), RenderError> {
        let content = Content {
            operations: std::mem::take(&mut self.operations),
        };
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let pages_id: ObjectId = self.doc.new_object_id();
        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => standard_font("Helvetica"),
                "F2" => standard_font("Times-Bold"),
            },
        };
        if !self.images.is_empty() {
            resources.set("XObject", std::mem::take(&mut self.images));
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => content_id,
        });
        self.doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let Self { mut doc, mut out, .. } = self;
        doc.save_to(&mut out)?;
        out.commit()?;
        Ok(())
    }
}

fn standard_font(base: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Break `text` into lines no wider than `max_width`.
///
/// Lines break between words; a word that is wider than a whole line on its
/// own is split between characters. Always returns at least one line.
pub fn wrap_lines(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if font.text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            current.push(c);
            if current.chars().count() > 1 && font.text_width(&current, size) > max_width {
                current.pop();
                lines.push(std::mem::replace(&mut current, c.to_string()));
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Latin-1 bytes for the standard fonts; other characters become `?`
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
