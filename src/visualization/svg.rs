//! Minimal SVG document writer

use crate::error::{BikeTreeError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Horizontal text alignment relative to the anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_str(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Drawable element
#[derive(Debug, Clone, PartialEq)]
pub enum SvgElement {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: String,
        stroke: Option<String>,
        corner_radius: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: String,
        stroke_width: f64,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        font_size: f64,
        anchor: TextAnchor,
        /// Degrees, rotated around (x, y)
        rotation: Option<f64>,
        bold: bool,
    },
}

impl SvgElement {
    pub fn rect(x: f64, y: f64, width: f64, height: f64, fill: &str) -> Self {
        SvgElement::Rect {
            x,
            y,
            width,
            height,
            fill: fill.to_string(),
            stroke: None,
            corner_radius: 0.0,
        }
    }

    pub fn boxed(x: f64, y: f64, width: f64, height: f64, fill: &str, stroke: &str) -> Self {
        SvgElement::Rect {
            x,
            y,
            width,
            height,
            fill: fill.to_string(),
            stroke: Some(stroke.to_string()),
            corner_radius: 4.0,
        }
    }

    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str) -> Self {
        SvgElement::Line {
            x1,
            y1,
            x2,
            y2,
            stroke: stroke.to_string(),
            stroke_width: 1.0,
        }
    }

    pub fn text(
        x: f64,
        y: f64,
        content: impl Into<String>,
        font_size: f64,
        anchor: TextAnchor,
    ) -> Self {
        SvgElement::Text {
            x,
            y,
            content: content.into(),
            font_size,
            anchor,
            rotation: None,
            bold: false,
        }
    }

    /// Rotate a text element around its anchor point
    pub fn rotated(self, degrees: f64) -> Self {
        match self {
            SvgElement::Text {
                x,
                y,
                content,
                font_size,
                anchor,
                bold,
                ..
            } => SvgElement::Text {
                x,
                y,
                content,
                font_size,
                anchor,
                rotation: Some(degrees),
                bold,
            },
            other => other,
        }
    }

    /// Render a text element in bold
    pub fn bold(self) -> Self {
        match self {
            SvgElement::Text {
                x,
                y,
                content,
                font_size,
                anchor,
                rotation,
                ..
            } => SvgElement::Text {
                x,
                y,
                content,
                font_size,
                anchor,
                rotation,
                bold: true,
            },
            other => other,
        }
    }
}

/// An SVG document built element by element
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    width: f64,
    height: f64,
    title: Option<String>,
    font_family: String,
    elements: Vec<SvgElement>,
}

impl SvgDocument {
    /// Create an empty document of the given size in pixels
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            title: None,
            font_family: "DejaVu Sans, Helvetica, Arial, sans-serif".to_string(),
            elements: Vec::new(),
        }
    }

    /// Set the document title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append an element; later elements paint over earlier ones
    pub fn push(&mut self, element: SvgElement) -> &mut Self {
        self.elements.push(element);
        self
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn elements(&self) -> &[SvgElement] {
        &self.elements
    }

    /// Write the document to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            BikeTreeError::RenderError(format!("failed to create {}: {}", path.display(), e))
        })?;
        let mut writer = BufWriter::new(file);

        self.write_to(&mut writer)?;
        writer.flush().map_err(Self::io_err)?;
        Ok(())
    }

    /// Render to a string
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| BikeTreeError::RenderError(format!("Invalid UTF-8: {}", e)))
    }

    /// Write the document as SVG markup
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(BikeTreeError::RenderError(format!(
                "invalid canvas size {}x{}",
                self.width, self.height
            )));
        }

        writeln!(writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>").map_err(Self::io_err)?;
        writeln!(
            writer,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.0}\" height=\"{h:.0}\" \
             viewBox=\"0 0 {w:.0} {h:.0}\" font-family=\"{font}\">",
            w = self.width,
            h = self.height,
            font = Self::escape_xml(&self.font_family)
        )
        .map_err(Self::io_err)?;

        if let Some(ref title) = self.title {
            writeln!(writer, "  <title>{}</title>", Self::escape_xml(title)).map_err(Self::io_err)?;
        }

        writeln!(
            writer,
            "  <rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"white\"/>"
        )
        .map_err(Self::io_err)?;

        for element in &self.elements {
            self.write_element(writer, element)?;
        }

        writeln!(writer, "</svg>").map_err(Self::io_err)?;
        Ok(())
    }

    fn write_element<W: Write>(&self, writer: &mut W, element: &SvgElement) -> Result<()> {
        match element {
            SvgElement::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
                corner_radius,
            } => {
                write!(
                    writer,
                    "  <rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"",
                    x,
                    y,
                    width,
                    height,
                    Self::escape_xml(fill)
                )
                .map_err(Self::io_err)?;
                if let Some(stroke) = stroke {
                    write!(writer, " stroke=\"{}\"", Self::escape_xml(stroke))
                        .map_err(Self::io_err)?;
                }
                if *corner_radius > 0.0 {
                    write!(writer, " rx=\"{:.1}\"", corner_radius).map_err(Self::io_err)?;
                }
                writeln!(writer, "/>").map_err(Self::io_err)?;
            }
            SvgElement::Line {
                x1,
                y1,
                x2,
                y2,
                stroke,
                stroke_width,
            } => {
                writeln!(
                    writer,
                    "  <line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" \
                     stroke=\"{}\" stroke-width=\"{:.1}\"/>",
                    x1,
                    y1,
                    x2,
                    y2,
                    Self::escape_xml(stroke),
                    stroke_width
                )
                .map_err(Self::io_err)?;
            }
            SvgElement::Text {
                x,
                y,
                content,
                font_size,
                anchor,
                rotation,
                bold,
            } => {
                write!(
                    writer,
                    "  <text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{:.1}\" text-anchor=\"{}\"",
                    x,
                    y,
                    font_size,
                    anchor.as_str()
                )
                .map_err(Self::io_err)?;
                if *bold {
                    write!(writer, " font-weight=\"bold\"").map_err(Self::io_err)?;
                }
                if let Some(deg) = rotation {
                    write!(writer, " transform=\"rotate({:.1} {:.2} {:.2})\"", deg, x, y)
                        .map_err(Self::io_err)?;
                }
                writeln!(writer, ">{}</text>", Self::escape_xml(content)).map_err(Self::io_err)?;
            }
        }
        Ok(())
    }

    fn escape_xml(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }

    fn io_err(e: std::io::Error) -> BikeTreeError {
        BikeTreeError::RenderError(format!("IO error: {}", e))
    }
}

/// Rough rendered width of `text` in pixels
pub(crate) fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * 0.6
}

/// Format with at most `precision` decimals, trailing zeros trimmed
pub(crate) fn format_number(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*}", precision, value);
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_elements() {
        let mut doc = SvgDocument::new(200.0, 100.0).with_title("demo");
        doc.push(SvgElement::boxed(10.0, 10.0, 50.0, 20.0, "#ffffff", "#000000"))
            .push(SvgElement::line(0.0, 0.0, 100.0, 50.0, "#333333"))
            .push(SvgElement::text(20.0, 30.0, "temp <= 12.2", 12.0, TextAnchor::Middle));

        let svg = doc.render().unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("<title>demo</title>"));
        assert!(svg.contains("viewBox=\"0 0 200 100\""));
        assert!(svg.contains("rx=\"4.0\""));
        assert!(svg.contains("<line x1=\"0.00\""));
        assert!(svg.contains(">temp &lt;= 12.2</text>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_rotated_bold_text() {
        let mut doc = SvgDocument::new(100.0, 100.0);
        doc.push(
            SvgElement::text(50.0, 60.0, "rain/snow/storm", 10.0, TextAnchor::End)
                .rotated(-90.0)
                .bold(),
        );

        let svg = doc.render().unwrap();
        assert!(svg.contains("transform=\"rotate(-90.0 50.00 60.00)\""));
        assert!(svg.contains("font-weight=\"bold\""));
        assert!(svg.contains("text-anchor=\"end\""));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            SvgDocument::escape_xml("a<b & \"c\" 'd'>"),
            "a&lt;b &amp; &quot;c&quot; &apos;d&apos;&gt;"
        );
    }

    #[test]
    fn test_invalid_canvas() {
        let doc = SvgDocument::new(0.0, 10.0);
        assert!(matches!(doc.render(), Err(BikeTreeError::RenderError(_))));
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.svg");

        let mut doc = SvgDocument::new(10.0, 10.0);
        doc.push(SvgElement::rect(0.0, 0.0, 5.0, 5.0, "steelblue"));
        doc.save(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("fill=\"steelblue\""));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(12.2, 3), "12.2");
        assert_eq!(format_number(4504.34873, 3), "4504.349");
        assert_eq!(format_number(731.0, 3), "731");
        assert_eq!(format_number(-0.0001, 3), "0");
        assert_eq!(format_number(0.25, 0), "0");
    }
}
