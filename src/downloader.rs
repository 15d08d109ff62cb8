use crate::attendance::{AttendanceLog, AttendanceRecord};
use std::error::Error;

/// Column headers of the exported sheet, in order
pub const EXPORT_HEADERS: [&str; 4] = ["id_karyawan", "nama", "waktu", "jenis_absen"];

/// Worksheet name used in the XLSX export
pub const SHEET_NAME: &str = "Absensi";

/// File name offered to the browser, without extension
pub const EXPORT_FILE_STEM: &str = "data_absen";

fn row_values(record: &AttendanceRecord) -> [&str; 4] {
    [
        record.employee_id.as_str(),
        record.name.as_str(),
        record.time.as_str(),
        record.kind.label(),
    ]
}

fn push_csv_field(out: &mut String, value: &str) {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        let escaped = value.replace('"', "\"\"");
        out.push_str(&format!("\"{}\"", escaped));
    } else {
        out.push_str(value);
    }
}

/// Convert the attendance log to CSV format
///
/// The first line holds the column headers; every record follows in the
/// order it was logged. Fields containing commas, quotes or newlines are
/// quoted. The default time format contains a comma, so the `waktu`
/// column is always quoted.
///
/// # Arguments
/// * `log` - Reference to the log to convert
///
/// # Returns
/// * `Result<String, Box<dyn Error>>` - CSV content as a string or an error
pub fn to_csv(log: &AttendanceLog) -> Result<String, Box<dyn Error>> {
    let mut csv_content = String::new();

    csv_content.push_str(&EXPORT_HEADERS.join(","));
    csv_content.push('\n');

    for record in log.records() {
        for (i, value) in row_values(record).iter().enumerate() {
            if i > 0 {
                csv_content.push(',');
            }
            push_csv_field(&mut csv_content, value);
        }
        csv_content.push('\n');
    }

    Ok(csv_content)
}

/// Convert the attendance log to XLSX format
///
/// Writes a single worksheet named `Absensi` with a header row followed by
/// one row per record, using the rust_xlsxwriter library. All cells are
/// written as strings so ids keep their leading zeros.
///
/// # Arguments
/// * `log` - Reference to the log to convert
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
#[cfg(feature = "web")]
pub fn to_xlsx(log: &AttendanceLog) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, record) in log.records().iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, value) in row_values(record).iter().enumerate() {
            worksheet.write_string(row, col as u16, *value)?;
        }
    }

    workbook.push_worksheet(worksheet);

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::AttendanceKind;
    use crate::directory::Employee;
    use chrono::{Local, TimeZone};

    fn sample_log() -> AttendanceLog {
        let mut log = AttendanceLog::new();
        let at = Local.with_ymd_and_hms(2024, 5, 2, 7, 45, 0).unwrap();
        log.record(
            &Employee {
                employee_id: "12345".into(),
                name: "John Doe".into(),
            },
            AttendanceKind::Arrival,
            at,
        );
        log.record(
            &Employee {
                employee_id: "9".into(),
                name: "Said \"Bo\" Umar".into(),
            },
            AttendanceKind::Departure,
            at,
        );
        log
    }

    #[test]
    fn csv_has_header_and_quoted_fields() {
        let csv = to_csv(&sample_log()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "id_karyawan,nama,waktu,jenis_absen");
        assert_eq!(lines[1], "12345,John Doe,\"02/05/2024, 07:45:00\",datang");
        assert_eq!(
            lines[2],
            "9,\"Said \"\"Bo\"\" Umar\",\"02/05/2024, 07:45:00\",pulang"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn csv_of_empty_log_is_only_header() {
        let csv = to_csv(&AttendanceLog::new()).unwrap();
        assert_eq!(csv, "id_karyawan,nama,waktu,jenis_absen\n");
    }

    #[cfg(feature = "web")]
    fn xlsx_part(bytes: &[u8], name: &str) -> String {
        use std::io::Read;

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    // Text of every <t> element, in shared string index order.
    #[cfg(feature = "web")]
    fn shared_strings(xml: &str) -> Vec<String> {
        xml.split("<t")
            .skip(1)
            .filter_map(|chunk| {
                let start = chunk.find('>')? + 1;
                let end = chunk.find("</t>")?;
                Some(chunk[start..end].to_string())
            })
            .collect()
    }

    #[cfg(feature = "web")]
    #[test]
    fn xlsx_has_named_sheet_header_and_rows() {
        let bytes = to_xlsx(&sample_log()).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let workbook = xlsx_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains("name=\"Absensi\""), "{workbook}");

        let strings = shared_strings(&xlsx_part(&bytes, "xl/sharedStrings.xml"));
        assert_eq!(
            strings[..7],
            [
                "id_karyawan",
                "nama",
                "waktu",
                "jenis_absen",
                "12345",
                "John Doe",
                "02/05/2024, 07:45:00",
            ]
        );
        assert!(strings.iter().any(|s| s == "datang"));
        assert!(strings.iter().any(|s| s == "pulang"));

        let sheet = xlsx_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("<row r=\"1\""));
        assert!(sheet.contains("<row r=\"3\""));
        assert!(!sheet.contains("<row r=\"4\""));
    }
}
