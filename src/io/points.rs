use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{GeocodeError, Result};
use crate::models::{parse_coordinate, PointRecord, PointTable, ResolvedRecord, RESOLVED_COLUMNS};

/// Load the point table from a CSV file.
///
/// Every column is kept as a passthrough field. Coordinate cells are
/// trimmed and parsed; unparseable cells become missing coordinates.
pub fn read_points(path: &Path, latitude_field: &str, longitude_field: &str) -> Result<PointTable> {
    info!("Loading points from {}", path.display());
    let file = File::open(path)?;
    let table = read_point_table(file, latitude_field, longitude_field)?;
    info!(
        "Loaded {} points ({} with valid coordinates)",
        table.len(),
        table.valid_count()
    );
    Ok(table)
}

fn read_point_table<R: Read>(
    reader: R,
    latitude_field: &str,
    longitude_field: &str,
) -> Result<PointTable> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

    // Find column indices
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| GeocodeError::MissingCoordinateField(name.to_string()))
    };
    let latitude_idx = column(latitude_field)?;
    let longitude_idx = column(longitude_field)?;

    let mut records = Vec::new();
    for (id, result) in csv_reader.records().enumerate() {
        let record = result?;
        let latitude = record.get(latitude_idx).and_then(parse_coordinate);
        let longitude = record.get(longitude_idx).and_then(parse_coordinate);
        let fields = record.iter().map(str::to_string).collect();
        records.push(PointRecord::new(id, latitude, longitude, fields));
    }

    Ok(PointTable { headers, records })
}

/// Write the augmented table as CSV: input columns, then the resolved
/// columns. Null values are written as empty cells.
pub fn write_records<W: Write>(
    writer: W,
    table: &PointTable,
    resolved: &[ResolvedRecord],
    postal_column: &str,
) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().flexible(true).from_writer(writer);

    let mut header: Vec<&str> = table.headers.iter().map(String::as_str).collect();
    header.extend(RESOLVED_COLUMNS);
    header.push(postal_column);
    csv_writer.write_record(&header)?;

    for (record, result) in table.records.iter().zip(resolved) {
        debug_assert_eq!(record.id, result.id);
        let row = record
            .fields
            .iter()
            .map(String::as_str)
            .chain(result.values().into_iter().map(|v| v.unwrap_or("")));
        csv_writer.write_record(row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the output file atomically.
///
/// Rows are written to a temporary file next to `path` and moved into place
/// only once complete, so a failed run never leaves a partial output.
pub fn write_output(
    path: &Path,
    table: &PointTable,
    resolved: &[ResolvedRecord],
    postal_column: &str,
) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    write_records(tmp.as_file_mut(), table, resolved, postal_column)?;
    tmp.persist(path).map_err(|e| e.error)?;

    info!("Wrote {} rows to {}", resolved.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = "\
name,latitude,longitude
Connaught Place, 28.6 ,77.2
North Pole,91,0
Blank,,
Garbage,abc,77.2
";

    #[test]
    fn test_read_points_validates_rows() {
        let table = read_point_table(INPUT.as_bytes(), "latitude", "longitude").unwrap();
        assert_eq!(table.headers, vec!["name", "latitude", "longitude"]);
        assert_eq!(table.len(), 4);

        let cp = &table.records[0];
        assert!(cp.is_valid());
        assert_eq!(cp.latitude, Some(28.6));
        assert_eq!(cp.fields[1], " 28.6 ");

        assert!(!table.records[1].is_valid());
        assert_eq!(table.records[1].latitude, Some(91.0));
        assert!(!table.records[2].is_valid());
        assert_eq!(table.records[3].latitude, None);
        assert_eq!(table.valid_count(), 1);
    }

    #[test]
    fn test_missing_coordinate_column() {
        let err = read_point_table("name,lat,longitude\nx,1,2\n".as_bytes(), "latitude", "longitude")
            .unwrap_err();
        assert!(err.is_input());
        assert!(matches!(err, GeocodeError::MissingCoordinateField(ref c) if c == "latitude"));
    }

    #[test]
    fn test_write_records_appends_columns() {
        let table = read_point_table(INPUT.as_bytes(), "latitude", "longitude").unwrap();
        let resolved: Vec<ResolvedRecord> = table
            .records
            .iter()
            .map(|r| {
                let mut out = ResolvedRecord::unresolved(r.id, r.is_valid());
                if r.is_valid() {
                    out.state = Some("DELHI".into());
                    out.postal_code = Some("110001".into());
                }
                out
            })
            .collect();

        let mut buf = Vec::new();
        write_records(&mut buf, &table, &resolved, "Pincode").unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "name,latitude,longitude,state,district,subdistrict,district_hq,state_capital,Pincode"
        );
        assert_eq!(lines[1], "Connaught Place, 28.6 ,77.2,DELHI,,,,,110001");
        assert_eq!(lines[2], "North Pole,91,0,,,,,,");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_write_output_persists_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = read_point_table(INPUT.as_bytes(), "latitude", "longitude").unwrap();
        let resolved: Vec<ResolvedRecord> = table
            .records
            .iter()
            .map(|r| ResolvedRecord::unresolved(r.id, r.is_valid()))
            .collect();

        write_output(&path, &table, &resolved, "Pincode").unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("name,latitude,longitude,state"));
        // Only the output file remains in the directory
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
