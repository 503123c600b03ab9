//! Serializers that turn the shape registry into downloadable documents.
//!
//! Two formats are supported:
//! - a comma-separated table with one row per shape and its measurement
//! - a KML 2.2 document with one placemark per shape
//!
//! Both formatters only borrow the registry and produce byte-identical output for
//! an unchanged registry.

use std::fmt::Write as _;

use thiserror::Error;

use crate::constants::{
    CSV_FILE_NAME, CSV_MIME_TYPE, KML_FILE_NAME, KML_MIME_TYPE, KML_NAMESPACE, NOT_APPLICABLE,
};
use crate::measure::{path_length, ring_area, MeasureError};
use crate::types::{LatLon, Shape, ShapeRegistry};

/// Column headers of the tabular export.
pub const CSV_HEADER: [&str; 6] = [
    "Tipo",
    "Latitud",
    "Longitud",
    "Elevación",
    "Distancia (m)",
    "Área (m²)",
];

/// Errors raised while rendering an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The CSV writer rejected a record
    #[error("failed to write CSV record: {0}")]
    Csv(#[from] csv::Error),
    /// The CSV writer could not be flushed
    #[error("failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),
    /// The rendered bytes were not valid UTF-8
    #[error("export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One line of the tabular export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Shape label (`Marcador`, `Polilínea` or `Polígono`)
    pub kind: &'static str,
    /// Latitude with six decimals, markers only
    pub lat: String,
    /// Longitude with six decimals, markers only
    pub lon: String,
    /// Always `N/A`; the tool has no elevation source
    pub elevation: String,
    /// Path length with two decimals, lines only
    pub distance_meters: String,
    /// Ring area with two decimals, polygons only
    pub area_sq_meters: String,
}

impl Row {
    fn empty(kind: &'static str) -> Self {
        Self {
            kind,
            lat: NOT_APPLICABLE.to_string(),
            lon: NOT_APPLICABLE.to_string(),
            elevation: NOT_APPLICABLE.to_string(),
            distance_meters: NOT_APPLICABLE.to_string(),
            area_sq_meters: NOT_APPLICABLE.to_string(),
        }
    }

    /// Builds the row describing `shape`, measuring it as needed.
    pub fn for_shape(shape: &Shape) -> Result<Self, MeasureError> {
        let mut row = Row::empty(shape.kind().label());
        match shape {
            Shape::Point(p) => {
                if !p.is_finite() {
                    return Err(MeasureError::NonFinite { index: 0 });
                }
                row.lat = format!("{:.6}", p.lat);
                row.lon = format!("{:.6}", p.lon);
            }
            Shape::Line(vertices) => {
                row.distance_meters = format!("{:.2}", path_length(vertices)?);
            }
            Shape::Polygon(ring) => {
                row.area_sq_meters = format!("{:.2}", ring_area(ring)?);
            }
        }
        Ok(row)
    }

    /// Column headers, in field order.
    pub fn header() -> [&'static str; 6] {
        CSV_HEADER
    }

    /// The row's fields, in header order.
    pub fn fields(&self) -> [&str; 6] {
        [
            self.kind,
            &self.lat,
            &self.lon,
            &self.elevation,
            &self.distance_meters,
            &self.area_sq_meters,
        ]
    }
}

/// Tabulates every shape in the registry.
///
/// Shapes that cannot be measured are logged and left out so that one bad
/// shape does not stop the rest of the export.
pub fn to_rows(registry: &ShapeRegistry) -> Vec<Row> {
    let mut rows = Vec::with_capacity(registry.len());
    registry.for_each(|shape| match Row::for_shape(shape) {
        Ok(row) => rows.push(row),
        Err(err) => log::warn!("skipping {} in table export: {err}", shape.kind().label()),
    });
    rows
}

/// Renders the registry as CSV text: the header, then one row per shape.
///
/// Every row, including the last, ends with `\n`. Fields are never quoted.
pub fn to_csv(registry: &ShapeRegistry) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(Row::header())?;
    for row in to_rows(registry) {
        writer.write_record(row.fields())?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Renders the registry as a KML 2.2 document.
///
/// Coordinates are written `lon,lat,0`. Polygon rings are written as stored,
/// without repeating the first vertex.
pub fn to_kml(registry: &ShapeRegistry) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    let _ = writeln!(out, "<kml xmlns=\"{}\">", KML_NAMESPACE);
    let _ = writeln!(out, "  <Document>");

    for shape in registry {
        let _ = writeln!(out, "    <Placemark>");
        let _ = writeln!(out, "      <name>{}</name>", escape_xml(shape.kind().label()));
        match shape {
            Shape::Point(p) => {
                let _ = writeln!(out, "      <Point>");
                let _ = writeln!(out, "        <coordinates>{}</coordinates>", kml_coordinates(std::slice::from_ref(p)));
                let _ = writeln!(out, "      </Point>");
            }
            Shape::Line(vertices) => {
                let _ = writeln!(out, "      <LineString>");
                let _ = writeln!(out, "        <coordinates>{}</coordinates>", kml_coordinates(vertices));
                let _ = writeln!(out, "      </LineString>");
            }
            Shape::Polygon(ring) => {
                let _ = writeln!(out, "      <Polygon>");
                let _ = writeln!(out, "        <outerBoundaryIs>");
                let _ = writeln!(out, "          <LinearRing>");
                let _ = writeln!(out, "            <coordinates>{}</coordinates>", kml_coordinates(ring));
                let _ = writeln!(out, "          </LinearRing>");
                let _ = writeln!(out, "        </outerBoundaryIs>");
                let _ = writeln!(out, "      </Polygon>");
            }
        }
        let _ = writeln!(out, "    </Placemark>");
    }

    let _ = writeln!(out, "  </Document>");
    let _ = writeln!(out, "</kml>");
    out
}

/// Space-separated `lon,lat,0` tuples.
fn kml_coordinates(vertices: &[LatLon]) -> String {
    vertices
        .iter()
        .map(|v| format!("{},{},0", v.lon, v.lat))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}

/// Summary shown next to a shape once it has been drawn.
pub fn popup_text(shape: &Shape) -> Result<String, MeasureError> {
    Ok(match shape {
        Shape::Point(p) if !p.is_finite() => return Err(MeasureError::NonFinite { index: 0 }),
        Shape::Point(p) => format!("Coordenadas: {:.6}, {:.6}", p.lat, p.lon),
        Shape::Line(vertices) => format!("Distancia: {:.2} m", path_length(vertices)?),
        Shape::Polygon(ring) => format!("Área: {:.2} m²", ring_area(ring)?),
    })
}

/// Downloadable document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated table
    Csv,
    /// Keyhole Markup Language
    Kml,
}

impl ExportFormat {
    /// Name the downloaded file is given.
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => CSV_FILE_NAME,
            ExportFormat::Kml => KML_FILE_NAME,
        }
    }

    /// MIME type announced for the download.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => CSV_MIME_TYPE,
            ExportFormat::Kml => KML_MIME_TYPE,
        }
    }

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Kml => "kml",
        }
    }

    /// Renders the registry in this format.
    pub fn render(&self, registry: &ShapeRegistry) -> Result<String, ExportError> {
        match self {
            ExportFormat::Csv => to_csv(registry),
            ExportFormat::Kml => Ok(to_kml(registry)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;
    use quick_xml::Reader;

    fn ll(lat: f64, lon: f64) -> LatLon {
        LatLon::new(lat, lon)
    }

    fn registry_of(shapes: Vec<Shape>) -> ShapeRegistry {
        let mut registry = ShapeRegistry::new();
        for shape in shapes {
            registry.add(shape);
        }
        registry
    }

    fn csv_lines(csv: &str) -> Vec<&str> {
        csv.lines().collect()
    }

    /// Pulls the text of every `<coordinates>` element out of a KML document.
    fn parse_kml_coordinates(kml: &str) -> Vec<Vec<LatLon>> {
        let mut reader = Reader::from_str(kml);
        reader.config_mut().trim_text(true);
        let mut inside = false;
        let mut placemarks = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == b"coordinates" => inside = true,
                Event::End(e) if e.name().as_ref() == b"coordinates" => inside = false,
                Event::Text(t) if inside => {
                    let text = t.unescape().unwrap().into_owned();
                    let vertices = text
                        .split_whitespace()
                        .map(|tuple| {
                            let parts: Vec<f64> =
                                tuple.split(',').map(|v| v.parse().unwrap()).collect();
                            assert_eq!(parts.len(), 3);
                            assert_eq!(parts[2], 0.0);
                            ll(parts[1], parts[0])
                        })
                        .collect();
                    placemarks.push(vertices);
                }
                Event::Eof => break,
                _ => {}
            }
        }
        placemarks
    }

    fn count_tags(kml: &str, tag: &[u8]) -> usize {
        let mut reader = Reader::from_str(kml);
        let mut count = 0;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == tag => count += 1,
                Event::Eof => break,
                _ => {}
            }
        }
        count
    }

    #[test]
    fn test_marker_row() {
        let registry = registry_of(vec![Shape::point(ll(40.0, -3.0))]);
        let csv = to_csv(&registry).unwrap();
        assert_eq!(
            csv_lines(&csv),
            vec![
                "Tipo,Latitud,Longitud,Elevación,Distancia (m),Área (m²)",
                "Marcador,40.000000,-3.000000,N/A,N/A,N/A",
            ]
        );
    }

    #[test]
    fn test_polyline_row_has_distance_only() {
        let registry = registry_of(vec![Shape::Line(vec![ll(0.0, 0.0), ll(0.0, 1.0)])]);
        let rows = to_rows(&registry);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.kind, "Polilínea");
        assert_eq!(row.lat, "N/A");
        assert_eq!(row.lon, "N/A");
        assert_eq!(row.elevation, "N/A");
        assert_eq!(row.area_sq_meters, "N/A");

        let distance: f64 = row.distance_meters.parse().unwrap();
        assert!((distance - 111_195.0).abs() < 100.0);
        let decimals = row.distance_meters.split('.').nth(1).unwrap();
        assert_eq!(decimals.len(), 2);
    }

    #[test]
    fn test_polygon_row_has_area_only() {
        let registry = registry_of(vec![Shape::Polygon(vec![
            ll(0.0, 0.0),
            ll(0.0, 1.0),
            ll(1.0, 1.0),
            ll(1.0, 0.0),
        ])]);
        let rows = to_rows(&registry);
        assert_eq!(rows[0].kind, "Polígono");
        assert_eq!(rows[0].distance_meters, "N/A");
        let area: f64 = rows[0].area_sq_meters.parse().unwrap();
        assert!(area > 0.0);
    }

    #[test]
    fn test_empty_registry_has_header_only() {
        let registry = ShapeRegistry::new();
        let csv = to_csv(&registry).unwrap();
        assert_eq!(csv, format!("{}\n", CSV_HEADER.join(",")));

        let kml = to_kml(&registry);
        assert_eq!(count_tags(&kml, b"Document"), 1);
        assert_eq!(count_tags(&kml, b"Placemark"), 0);
    }

    #[test]
    fn test_csv_rows_follow_registry_order() {
        let registry = registry_of(vec![
            Shape::Polygon(vec![ll(0.0, 0.0), ll(0.0, 1.0), ll(1.0, 1.0)]),
            Shape::point(ll(1.0, 2.0)),
            Shape::Line(vec![ll(0.0, 0.0), ll(1.0, 1.0)]),
        ]);
        let csv = to_csv(&registry).unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv.as_bytes());
        let kinds: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(kinds, vec!["Polígono", "Marcador", "Polilínea"]);
        assert!(csv.ends_with('\n'));
        assert!(!csv.contains('"'));
    }

    #[test]
    fn test_unmeasurable_shape_is_skipped() {
        let registry = registry_of(vec![
            Shape::Line(vec![ll(0.0, 0.0)]),
            Shape::point(ll(5.0, 5.0)),
        ]);
        let rows = to_rows(&registry);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "Marcador");
    }

    #[test]
    fn test_non_finite_marker_is_skipped() {
        let bad = ll(f64::NAN, 1.0);
        assert_eq!(
            Row::for_shape(&Shape::point(bad)),
            Err(MeasureError::NonFinite { index: 0 })
        );
        assert!(popup_text(&Shape::point(bad)).is_err());

        let registry = registry_of(vec![Shape::point(bad), Shape::point(ll(5.0, 5.0))]);
        let csv = to_csv(&registry).unwrap();
        assert!(!csv.contains("NaN"));
        assert_eq!(to_rows(&registry).len(), 1);
    }

    #[test]
    fn test_kml_round_trip_recovers_coordinates() {
        let marker = ll(40.4165, -3.7026);
        let path = vec![ll(0.0, 0.0), ll(0.5, 1.25), ll(-12.345678, 100.0)];
        let ring = vec![ll(10.0, 10.0), ll(10.0, 11.0), ll(11.0, 11.0), ll(11.0, 10.0)];
        let registry = registry_of(vec![
            Shape::point(marker),
            Shape::Line(path.clone()),
            Shape::Polygon(ring.clone()),
        ]);

        let parsed = parse_kml_coordinates(&to_kml(&registry));
        assert_eq!(parsed.len(), 3);
        for (got, expected) in parsed.iter().zip([vec![marker], path, ring]) {
            assert_eq!(got.len(), expected.len());
            for (a, b) in got.iter().zip(expected.iter()) {
                assert!((a.lat - b.lat).abs() < 1e-9);
                assert!((a.lon - b.lon).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_kml_uses_lon_lat_order_and_names() {
        let registry = registry_of(vec![Shape::point(ll(40.0, -3.0))]);
        let kml = to_kml(&registry);
        assert!(kml.contains("<coordinates>-3,40,0</coordinates>"));
        assert!(kml.contains("<name>Marcador</name>"));
        assert!(kml.contains("xmlns=\"http://www.opengis.net/kml/2.2\""));
    }

    #[test]
    fn test_kml_polygon_is_not_auto_closed() {
        let registry = registry_of(vec![Shape::Polygon(vec![
            ll(0.0, 0.0),
            ll(0.0, 1.0),
            ll(1.0, 1.0),
        ])]);
        let parsed = parse_kml_coordinates(&to_kml(&registry));
        assert_eq!(parsed[0].len(), 3);
        assert_eq!(count_tags(&to_kml(&registry), b"LinearRing"), 1);
    }

    #[test]
    fn test_formatters_are_idempotent() {
        let registry = registry_of(vec![
            Shape::point(ll(1.0, 2.0)),
            Shape::Line(vec![ll(0.0, 0.0), ll(1.0, 1.0)]),
            Shape::Polygon(vec![ll(0.0, 0.0), ll(0.0, 1.0), ll(1.0, 1.0)]),
        ]);
        let snapshot = registry.clone();
        assert_eq!(to_csv(&registry).unwrap(), to_csv(&registry).unwrap());
        assert_eq!(to_kml(&registry), to_kml(&registry));
        assert_eq!(registry, snapshot);
    }

    #[test]
    fn test_popup_text() {
        assert_eq!(
            popup_text(&Shape::point(ll(40.0, -3.0))).unwrap(),
            "Coordenadas: 40.000000, -3.000000"
        );
        let line = popup_text(&Shape::Line(vec![ll(0.0, 0.0), ll(0.0, 0.0)])).unwrap();
        assert_eq!(line, "Distancia: 0.00 m");
        let area = popup_text(&Shape::Polygon(vec![ll(0.0, 0.0), ll(0.0, 1.0), ll(1.0, 1.0)]))
            .unwrap();
        assert!(area.starts_with("Área: ") && area.ends_with(" m²"));
        assert!(popup_text(&Shape::Polygon(vec![ll(0.0, 0.0)])).is_err());
    }

    #[test]
    fn test_export_format_metadata() {
        assert_eq!(ExportFormat::Csv.file_name(), "coordenadas.csv");
        assert_eq!(ExportFormat::Kml.file_name(), "coordenadas.kml");
        assert_eq!(
            ExportFormat::Kml.mime_type(),
            "application/vnd.google-earth.kml+xml"
        );
        let registry = registry_of(vec![Shape::point(ll(1.0, 1.0))]);
        assert_eq!(
            ExportFormat::Kml.render(&registry).unwrap(),
            to_kml(&registry)
        );
    }
}
